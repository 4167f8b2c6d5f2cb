//! Wire handles and their property resolution
//!
//! Reading a property on a [`WireHandle`] walks a fixed chain, first match
//! wins:
//! 1. `__instance` - the owning component
//! 2. bare aliases (`get`, `set`, ...) onto registered `$` capabilities
//! 3. registered capabilities, builtin or user supplied
//! 4. keys of the handle's state view
//! 5. `then` - resolves to nothing
//! 6. everything else - a remote call through the [`Fallback`] resolver
pub mod builtins;
mod fallback;
mod handle;
mod registry;
mod runtime;
mod value;
mod watch;

pub use fallback::*;
pub use handle::*;
pub use registry::*;
pub use runtime::*;
pub use value::*;
pub use watch::*;

#[cfg(test)]
mod watch_test;
