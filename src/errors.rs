//! Wire Dispatch Error Hierarchy
//!
//! Unresolved reads and writes to unknown state keys are never errors: the
//! former fall through to remote dispatch, the latter are dropped. What is
//! left are transport failures, malformed invocations and configuration
//! problems.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Commit/call channel failures, surfaced untouched to the awaiting caller
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Invocation shape problems detected while dispatching a wire property
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Failures raised by caller supplied code (overrides, collaborators)
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Server rejected or failed to apply a commit
    #[error("Commit for component {component} failed: {reason}")]
    CommitFailed { component: String, reason: String },

    /// Server side method invocation failed
    #[error("Call {method} on component {component} failed: {reason}")]
    CallFailed {
        component: String,
        method: String,
        reason: String,
    },

    /// The host side of a channel transport went away
    #[error("Transport channel closed")]
    ChannelClosed,

    /// The host dropped a request without replying
    #[error("Transport reply dropped")]
    ReplyDropped,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Property resolved to a plain value but was invoked
    #[error("Property {property} is not callable")]
    NotCallable { property: String },

    #[error("{capability} expects an argument at position {index}")]
    MissingArgument {
        capability: &'static str,
        index: usize,
    },

    #[error("{capability} expects {expected} at position {index}")]
    InvalidArgument {
        capability: &'static str,
        index: usize,
        expected: &'static str,
    },

    /// Callbacks cannot travel to the server
    #[error("Argument {index} of remote call {method} cannot be serialized")]
    UnserializableArgument { method: String, index: usize },

    /// A synchronous result was requested from an asynchronous capability
    #[error("Property {property} did not resolve synchronously")]
    Pending { property: String },

    /// No collaborator was wired for this service
    #[error("Service {service} is not available")]
    ServiceUnavailable { service: &'static str },
}
