//! Explicit factory tables replacing by-name dynamic discovery.
//!
//! A capability identifier maps to a factory function registered at process
//! initialization. Filters and listeners are looked up here after their ids
//! are read from the candidate manifest; factories close over whatever
//! collaborators they need, so constructed values require no further wiring.

use indexmap::IndexMap;

pub type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

pub struct FactoryRegistry<T> {
    factories: IndexMap<String, Factory<T>>,
}

impl<T> Default for FactoryRegistry<T> {
    fn default() -> Self {
        Self {
            factories: IndexMap::new(),
        }
    }
}

impl<T> FactoryRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        id: impl Into<String>,
        factory: impl Fn() -> T + Send + Sync + 'static,
    ) {
        self.factories.insert(id.into(), Box::new(factory));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn create(&self, id: &str) -> Option<T> {
        self.factories.get(id).map(|factory| factory())
    }

    /// Instantiate every registered id in `ids`, preserving order.
    /// Unregistered ids are skipped with a debug log rather than failing;
    /// they are assumed to belong to a different module set.
    pub fn create_all<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> Vec<T> {
        let mut out = Vec::new();
        for id in ids {
            match self.create(id) {
                Some(value) => out.push(value),
                None => log::debug!("no factory registered for '{id}', skipping"),
            }
        }
        out
    }
}

/// Resolvability oracle: whether an identifier is known to the loader at
/// all. Exclusion validation only rejects excludes for identifiers that are
/// resolvable yet absent from the candidate list.
pub trait Resolvable {
    fn is_resolvable(&self, id: &str) -> bool;
}

impl<T> Resolvable for FactoryRegistry<T> {
    fn is_resolvable(&self, id: &str) -> bool {
        self.contains(id)
    }
}

impl Resolvable for indexmap::IndexSet<String> {
    fn is_resolvable(&self, id: &str) -> bool {
        self.contains(id)
    }
}

impl Resolvable for std::collections::HashSet<String> {
    fn is_resolvable(&self, id: &str) -> bool {
        self.contains(id)
    }
}
