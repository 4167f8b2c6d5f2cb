use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_MAX_FLUSH_TASKS;
use crate::Error;
use crate::Result;

/// Watch engine configuration
///
/// # Examples
///
/// ```rust
/// use d_wire::WatchConfig;
///
/// let config = WatchConfig::default();
/// assert!(config.deep);
/// assert_eq!(config.max_flush_tasks, 10_000);
/// ```
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WatchConfig {
    /// Traverse the watched value so nested mutations retrigger the watcher
    ///
    /// - `true`: every nested field reachable from the path is a dependency
    /// - `false`: only the path itself (and its prefixes) are dependencies
    ///
    /// Default: true
    #[serde(default = "default_deep")]
    pub deep: bool,

    /// Upper bound of tasks run by a single scheduler drain
    ///
    /// A watcher whose callback writes its own path keeps requeueing itself;
    /// once this many tasks ran in one drain the rest stay queued.
    ///
    /// Default: 10000
    #[serde(default = "default_max_flush_tasks")]
    pub max_flush_tasks: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            deep: default_deep(),
            max_flush_tasks: default_max_flush_tasks(),
        }
    }
}

impl WatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_flush_tasks == 0 {
            return Err(Error::Config(ConfigError::Message(
                "watch.max_flush_tasks must be greater than 0".into(),
            )));
        }
        Ok(())
    }
}

fn default_deep() -> bool {
    true
}
fn default_max_flush_tasks() -> usize {
    DEFAULT_MAX_FLUSH_TASKS
}
