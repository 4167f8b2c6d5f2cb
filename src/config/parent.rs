use serde::Deserialize;
use serde::Serialize;

/// Where a resolved `$parent` is remembered
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParentMemoScope {
    /// One slot for the whole runtime: the first parent resolved by any
    /// component is returned for every later `$parent` read
    #[default]
    Global,
    /// Each component remembers its own parent
    Component,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ParentConfig {
    #[serde(default)]
    pub memo: ParentMemoScope,
}
