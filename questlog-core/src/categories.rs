//! Append-only category registries for missions and guides.
use crate::error::{TrackerResult, require_name};
use crate::storage::{self, KeyValueStore, keys};

pub const DEFAULT_MISSION_CATEGORIES: [&str; 6] = [
    "World Quest",
    "Lore",
    "Lorewalking",
    "Dungeon",
    "Resource",
    "Generic",
];

pub const DEFAULT_GUIDE_CATEGORIES: [&str; 6] = [
    "Beginner",
    "Advanced",
    "Lore",
    "Dungeon",
    "Resource",
    "Achievement",
];

/// Read a category list, seeding the defaults when the key is absent or
/// unreadable.
pub(crate) fn load_names<S>(store: &S, key: &str, defaults: &[&str]) -> Vec<String>
where
    S: KeyValueStore + ?Sized,
{
    storage::load_json_or(store, key, || {
        defaults.iter().map(|name| (*name).to_string()).collect()
    })
}

/// Ordered set of category names. Names are never removed, even when no
/// record uses them any more.
#[derive(Debug, Clone)]
pub struct CategoryRegistry<S> {
    key: &'static str,
    defaults: &'static [&'static str],
    names: Vec<String>,
    store: S,
}

impl<S: KeyValueStore> CategoryRegistry<S> {
    pub fn missions(store: S) -> Self {
        Self::open(store, keys::MISSION_CATEGORIES, &DEFAULT_MISSION_CATEGORIES)
    }

    pub fn guides(store: S) -> Self {
        Self::open(store, keys::GUIDE_CATEGORIES, &DEFAULT_GUIDE_CATEGORIES)
    }

    fn open(store: S, key: &'static str, defaults: &'static [&'static str]) -> Self {
        let names = load_names(&store, key, defaults);
        Self {
            key,
            defaults,
            names,
            store,
        }
    }

    pub fn reload(&mut self) {
        self.names = load_names(&self.store, self.key, self.defaults);
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|known| known == name.trim())
    }

    /// Register a category. Returns `false` when it was already known.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, or a storage error.
    pub fn add(&mut self, name: &str) -> TrackerResult<bool> {
        require_name("category", name)?;
        if self.contains(name) {
            return Ok(false);
        }
        self.names.push(name.trim().to_string());
        storage::save_json(&self.store, self.key, &self.names)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn absent_registry_starts_with_defaults() {
        let registry = CategoryRegistry::missions(MemoryStore::new());
        assert_eq!(registry.names().len(), DEFAULT_MISSION_CATEGORIES.len());
        assert!(registry.contains("Lorewalking"));
    }

    #[test]
    fn duplicates_are_ignored_and_blank_rejected() {
        let store = MemoryStore::new();
        let mut registry = CategoryRegistry::guides(store.clone());
        assert!(registry.add("Raids").unwrap());
        assert!(!registry.add("Raids").unwrap());
        assert!(registry.add("   ").is_err());
        let reopened = CategoryRegistry::guides(store);
        assert_eq!(
            reopened.names().iter().filter(|n| n.as_str() == "Raids").count(),
            1
        );
    }

    #[test]
    fn stored_lists_replace_defaults() {
        let store = MemoryStore::new();
        store.set(keys::MISSION_CATEGORIES, r#"["Only"]"#).unwrap();
        let registry = CategoryRegistry::missions(store);
        assert_eq!(registry.names(), &["Only".to_string()]);
    }
}
