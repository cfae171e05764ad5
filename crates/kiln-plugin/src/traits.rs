//! Traits and builders for writing plugin code.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use kiln_core::result::AppResult;

use crate::api::context::PluginContext;

/// A hook method implementation.
///
/// Returning a falsy value (`null`, `false`, `0`, `""`, `"0"`, empty array
/// or object) means "no contribution" to the aggregated hook result.
#[async_trait]
pub trait HookHandler: Send + Sync + std::fmt::Debug {
    /// Handles one invocation of the hook.
    async fn handle(&self, ctx: &PluginContext, params: &Value) -> AppResult<Value>;
}

type BoxedHandlerFn = Arc<
    dyn Fn(PluginContext, Value) -> Pin<Box<dyn Future<Output = AppResult<Value>> + Send>>
        + Send
        + Sync,
>;

/// A closure-based hook handler for quick handler creation.
#[derive(Clone)]
pub struct ClosureHandler {
    /// Handler function.
    handler: BoxedHandlerFn,
}

impl std::fmt::Debug for ClosureHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureHandler")
            .field("handler", &"<closure>")
            .finish()
    }
}

impl ClosureHandler {
    /// Creates a new closure-based handler.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(PluginContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Value>> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |ctx, params| Box::pin(handler(ctx, params))),
        }
    }
}

#[async_trait]
impl HookHandler for ClosureHandler {
    async fn handle(&self, ctx: &PluginContext, params: &Value) -> AppResult<Value> {
        (self.handler)(ctx.clone(), params.clone()).await
    }
}

/// A plugin handler class: a name, an optional parent class and the hook
/// methods the class itself declares.
///
/// Inherited methods are not listed here; the [`ClassTable`](crate::ClassTable)
/// resolves them from the parent chain when classes are registered.
#[derive(Debug, Clone)]
pub struct PluginClass {
    name: String,
    extends: Option<String>,
    methods: HashMap<String, Arc<dyn HookHandler>>,
}

impl PluginClass {
    /// Declares a class with no methods.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            methods: HashMap::new(),
        }
    }

    /// Sets the parent class.
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        let parent = parent.into();
        self.extends = (!parent.is_empty()).then_some(parent);
        self
    }

    /// Declares a hook method.
    pub fn on(mut self, hook: impl Into<String>, handler: Arc<dyn HookHandler>) -> Self {
        self.methods.insert(hook.into(), handler);
        self
    }

    /// Declares a hook method from a closure.
    pub fn on_fn<F, Fut>(self, hook: impl Into<String>, handler: F) -> Self
    where
        F: Fn(PluginContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Value>> + Send + 'static,
    {
        self.on(hook, Arc::new(ClosureHandler::new(handler)))
    }

    /// Class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent class name, if any.
    pub fn parent(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    /// The method this class itself declares for `hook`.
    pub fn own_method(&self, hook: &str) -> Option<&Arc<dyn HookHandler>> {
        self.methods.get(hook)
    }

    /// Hooks this class itself declares.
    pub fn declared_hooks(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}
