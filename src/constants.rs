// -
// Reserved wire properties

/// Returns the owning component, never intercepted further
pub const INSTANCE_PROPERTY: &str = "__instance";

/// Never resolved, so generic code cannot mistake a handle for an awaitable
pub const THENABLE_PROPERTY: &str = "then";

// -
// Canonical capability names

pub const GET: &str = "$get";
pub const SET: &str = "$set";
pub const CALL: &str = "$call";
pub const COMMIT: &str = "$commit";
pub const REFRESH: &str = "$refresh";
pub const TOGGLE: &str = "$toggle";
pub const WATCH: &str = "$watch";
pub const ENTANGLE: &str = "$entangle";
pub const PARENT: &str = "$parent";
pub const ON: &str = "$on";
pub const DISPATCH: &str = "$dispatch";
pub const DISPATCH_SELF: &str = "$dispatchSelf";
pub const DISPATCH_TO: &str = "$dispatchTo";
pub const UPLOAD: &str = "$upload";
pub const UPLOAD_MULTIPLE: &str = "$uploadMultiple";
pub const REMOVE_UPLOAD: &str = "$removeUpload";

/// Short names kept for backwards compatibility, mapped onto canonical names
pub const ALIASES: &[(&str, &str)] = &[
    ("get", GET),
    ("set", SET),
    ("call", CALL),
    ("commit", COMMIT),
    ("watch", WATCH),
    ("entangle", ENTANGLE),
    ("dispatch", DISPATCH),
    ("dispatchTo", DISPATCH_TO),
    ("dispatchSelf", DISPATCH_SELF),
    ("upload", UPLOAD),
    ("uploadMultiple", UPLOAD_MULTIPLE),
    ("removeUpload", REMOVE_UPLOAD),
];

// -
// Config

pub(crate) const ENV_PREFIX: &str = "WIRE";
pub(crate) const DEFAULT_MAX_FLUSH_TASKS: usize = 10_000;

/// Most `Null` slots a single array write may pad with
pub(crate) const MAX_ARRAY_PADDING: usize = 10_000;
