//! Hook system: candidate resolution, invocation and the dispatch loop.

pub mod definitions;
pub mod dispatcher;
pub mod invoker;
pub mod resolver;

pub use definitions::{DispatchTarget, HookResults, is_truthy, result_key};
pub use dispatcher::HookDispatcher;
pub use invoker::HookInvoker;
pub use resolver::HookResolver;
