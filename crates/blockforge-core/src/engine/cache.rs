use crate::core::models::building_block::{BuildingBlock, normalized_names};
use crate::core::models::molecule::Molecule;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::trace;

/// Identity of a construction request: the structure plus the sorted,
/// de-duplicated functional group names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    structure: String,
    functional_group_names: Vec<String>,
}

impl CacheKey {
    pub fn new<S: AsRef<str>>(molecule: &Molecule, functional_group_names: &[S]) -> Self {
        Self {
            structure: molecule.structural_key(),
            functional_group_names: normalized_names(functional_group_names),
        }
    }
}

/// Shared building block instances keyed by [`CacheKey`].
///
/// Entries are never evicted; the cache lives as long as its owner.
#[derive(Debug, Default)]
pub struct MoleculeCache {
    entries: Mutex<HashMap<CacheKey, Arc<BuildingBlock>>>,
}

impl MoleculeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<BuildingBlock>> {
        self.lock().get(key).cloned()
    }

    /// Returns the cached instance for `key`, building and inserting it with
    /// `build` if absent.
    ///
    /// `build` runs without the lock held. If another caller inserts the same
    /// key meanwhile, its instance is returned and the fresh one discarded, so
    /// every caller observes a single instance per key.
    pub fn get_or_try_insert_with<E, F>(&self, key: CacheKey, build: F) -> Result<Arc<BuildingBlock>, E>
    where
        F: FnOnce() -> Result<BuildingBlock, E>,
    {
        if let Some(existing) = self.get(&key) {
            trace!("Cache hit.");
            return Ok(existing);
        }

        let built = Arc::new(build()?);
        let mut entries = self.lock();
        Ok(Arc::clone(entries.entry(key).or_insert(built)))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, Arc<BuildingBlock>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::smiles;
    use crate::core::topology::registry::MotifRegistry;
    use std::convert::Infallible;

    fn block(text: &str, names: &[&str]) -> BuildingBlock {
        BuildingBlock::new(smiles::parse(text).unwrap(), names, &MotifRegistry::builtin()).unwrap()
    }

    #[test]
    fn key_ignores_name_order_and_duplicates() {
        let molecule = smiles::parse("NCCCN").unwrap();
        assert_eq!(
            CacheKey::new(&molecule, &["amine", "aldehyde", "amine"]),
            CacheKey::new(&molecule, &["aldehyde", "amine"])
        );
        assert_ne!(
            CacheKey::new(&molecule, &["amine"]),
            CacheKey::new(&molecule, &["aldehyde"])
        );
    }

    #[test]
    fn same_key_returns_the_same_instance() {
        let cache = MoleculeCache::new();
        let molecule = smiles::parse("NCCCN").unwrap();
        let key = CacheKey::new(&molecule, &["amine"]);

        let first = cache
            .get_or_try_insert_with(key.clone(), || Ok::<_, Infallible>(block("NCCCN", &["amine"])))
            .unwrap();
        let second = cache
            .get_or_try_insert_with(key, || -> Result<BuildingBlock, Infallible> {
                panic!("cached entry must be reused")
            })
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_builds_are_not_cached() {
        let cache = MoleculeCache::new();
        let molecule = smiles::parse("C").unwrap();
        let key = CacheKey::new(&molecule, &[] as &[&str]);

        let result = cache.get_or_try_insert_with(key.clone(), || Err("boom"));
        assert_eq!(result.unwrap_err(), "boom");
        assert!(cache.is_empty());
        assert!(cache.get(&key).is_none());
    }
}
