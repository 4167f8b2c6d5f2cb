use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Property resolution switches
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DispatchConfig {
    /// Resolve bare names (`get`, `set`, ...) onto their `$`-prefixed capability
    ///
    /// Default: true
    #[serde(default = "default_true")]
    pub enable_aliases: bool,

    /// Drop a lone UI event argument before remote dispatch, so handlers
    /// bound without parentheses behave like zero-argument calls
    ///
    /// Default: true
    #[serde(default = "default_true")]
    pub strip_event_argument: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            enable_aliases: true,
            strip_event_argument: true,
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}

fn default_true() -> bool {
    true
}
