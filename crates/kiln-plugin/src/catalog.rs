//! Class table: plugin class name → declared class and its resolved hook
//! methods.
//!
//! Method origin (which class in an override chain provides a hook) is
//! resolved when classes are registered, not at call time. Registering a
//! parent after its children re-resolves those children.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, error};

use crate::traits::{HookHandler, PluginClass};

/// A resolved hook method and the class that declares it.
#[derive(Debug, Clone)]
pub struct MethodBinding {
    /// Class in the override chain that declares the method.
    pub origin: String,
    /// The implementation.
    pub handler: Arc<dyn HookHandler>,
}

/// An instantiated handler class, ready to dispatch hooks.
#[derive(Debug, Clone)]
pub struct PluginInstance {
    class: String,
    methods: Arc<HashMap<String, MethodBinding>>,
}

impl PluginInstance {
    /// Class name of the instance.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// The method for `hook`, own or inherited.
    pub fn method(&self, hook: &str) -> Option<&MethodBinding> {
        self.methods.get(hook)
    }
}

/// Registry of loaded plugin classes.
#[derive(Debug, Default)]
pub struct ClassTable {
    /// Class name → class as declared.
    declared: DashMap<String, Arc<PluginClass>>,
    /// Class name → hook → resolved method.
    resolved: DashMap<String, Arc<HashMap<String, MethodBinding>>>,
}

impl ClassTable {
    /// Creates an empty class table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a class and re-resolves every class whose
    /// chain passes through it.
    pub fn register(&self, class: PluginClass) {
        let name = class.name().to_string();
        debug!(class = %name, parent = ?class.parent(), "Registering plugin class");
        self.declared.insert(name.clone(), Arc::new(class));

        // Collect names first; the chain walk re-enters the map.
        let names: Vec<String> = self.declared.iter().map(|e| e.key().clone()).collect();
        let affected: Vec<String> = names
            .into_iter()
            .filter(|candidate| self.chain(candidate).contains(&name))
            .collect();

        for class_name in affected {
            let methods = self.resolve_methods(&class_name);
            self.resolved.insert(class_name, Arc::new(methods));
        }
    }

    /// Whether a class is registered.
    pub fn contains(&self, class: &str) -> bool {
        self.declared.contains_key(class)
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.declared.len()
    }

    /// Whether no class is registered.
    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    /// Instantiates a registered class by name.
    pub fn instantiate(&self, class: &str) -> Option<PluginInstance> {
        let methods = self.resolved.get(class)?.value().clone();
        Some(PluginInstance {
            class: class.to_string(),
            methods,
        })
    }

    /// The class that provides `hook` for `class`, walking up the chain.
    pub fn method_origin(&self, class: &str, hook: &str) -> Option<String> {
        self.resolved
            .get(class)
            .and_then(|methods| methods.get(hook).map(|m| m.origin.clone()))
    }

    /// Registered classes from `class` up to its root. Stops at the first
    /// unregistered ancestor or at a cycle.
    fn chain(&self, class: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(class.to_string());

        while let Some(name) = current.take() {
            if !seen.insert(name.clone()) {
                error!(class = %class, repeated = %name, "Class override chain contains a cycle");
                break;
            }
            let Some(declared) = self.declared.get(&name).map(|c| c.value().clone()) else {
                break;
            };
            current = declared.parent().map(str::to_string);
            chain.push(name);
        }
        chain
    }

    /// Methods visible on `class`: its own, then inherited ones it does not
    /// override, nearest ancestor first.
    fn resolve_methods(&self, class: &str) -> HashMap<String, MethodBinding> {
        let mut methods = HashMap::new();
        for name in self.chain(class) {
            let Some(declared) = self.declared.get(&name).map(|c| c.value().clone()) else {
                continue;
            };
            for hook in declared.declared_hooks() {
                if methods.contains_key(hook) {
                    continue;
                }
                if let Some(handler) = declared.own_method(hook) {
                    methods.insert(
                        hook.to_string(),
                        MethodBinding {
                            origin: name.clone(),
                            handler: handler.clone(),
                        },
                    );
                }
            }
        }
        methods
    }
}
