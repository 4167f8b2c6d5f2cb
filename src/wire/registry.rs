use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;
use tracing::warn;

use crate::constants::ALIASES;
use crate::WireHandle;
use crate::WireValue;

/// Builds a capability's implementation for one component's handle
pub type PropertyFactory = Arc<dyn Fn(&WireHandle) -> WireValue + Send + Sync>;

/// How a registry name was matched
#[derive(Clone)]
pub enum Lookup {
    /// Bare alias redirected to its canonical entry
    Alias {
        canonical: String,
        factory: PropertyFactory,
    },
    /// Direct hit on a registered name
    Capability(PropertyFactory),
}

impl Lookup {
    pub fn factory(&self) -> &PropertyFactory {
        match self {
            Lookup::Alias { factory, .. } => factory,
            Lookup::Capability(factory) => factory,
        }
    }
}

/// Name → factory table behind every wire handle
///
/// Cloning shares the table. Registration is last write wins.
#[derive(Clone)]
pub struct PropertyRegistry {
    properties: Arc<DashMap<String, PropertyFactory>>,
    aliases: Arc<HashMap<String, String>>,
}

impl std::fmt::Debug for PropertyRegistry {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("PropertyRegistry")
            .field("properties", &self.names())
            .field("aliases", &self.aliases.len())
            .finish()
    }
}

impl Default for PropertyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyRegistry {
    /// Empty registry with the standard alias table.
    pub fn new() -> Self {
        Self::with_aliases(ALIASES.iter().copied())
    }

    /// Empty registry without aliases.
    pub fn without_aliases() -> Self {
        Self::with_aliases(std::iter::empty())
    }

    pub fn with_aliases<'a>(aliases: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            properties: Arc::new(DashMap::new()),
            aliases: Arc::new(
                aliases
                    .into_iter()
                    .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
                    .collect(),
            ),
        }
    }

    /// Registry pre-populated with the builtin capabilities.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        super::builtins::install(&registry);
        registry
    }

    pub fn register(
        &self,
        name: impl Into<String>,
        factory: PropertyFactory,
    ) {
        let name = name.into();
        if self.properties.insert(name.clone(), factory).is_some() {
            debug!(name = %name, "wire property replaced");
        }
    }

    pub fn register_fn<F>(
        &self,
        name: impl Into<String>,
        factory: F,
    ) where
        F: Fn(&WireHandle) -> WireValue + Send + Sync + 'static,
    {
        self.register(name, Arc::new(factory));
    }

    pub fn unregister(
        &self,
        name: &str,
    ) -> bool {
        self.properties.remove(name).is_some()
    }

    /// Drop every registered property. Aliases stay.
    pub fn clear(&self) {
        self.properties.clear();
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.properties.contains_key(name)
    }

    pub fn canonical_name(
        &self,
        alias: &str,
    ) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.properties.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Match `name` against the alias table first, then registered names.
    ///
    /// An alias whose target is not registered does not match as an alias;
    /// lookup continues with the bare name.
    pub fn lookup(
        &self,
        name: &str,
    ) -> Option<Lookup> {
        if let Some(canonical) = self.aliases.get(name) {
            match self.properties.get(canonical) {
                Some(factory) => {
                    return Some(Lookup::Alias {
                        canonical: canonical.clone(),
                        factory: factory.value().clone(),
                    })
                }
                None => warn!(alias = name, canonical = %canonical, "alias target is not registered"),
            }
        }

        self.properties
            .get(name)
            .map(|factory| Lookup::Capability(factory.value().clone()))
    }

    /// Build the implementation of `name` for `handle`, if registered.
    pub fn resolve(
        &self,
        name: &str,
        handle: &WireHandle,
    ) -> Option<WireValue> {
        self.lookup(name).map(|lookup| (lookup.factory())(handle))
    }
}
