use crate::core::conformer;
use crate::core::io::dump;
use crate::core::io::molfile::MolFile;
use crate::core::io::smiles;
use crate::core::io::traits::MolecularFile;
use crate::core::models::building_block::BuildingBlock;
use crate::core::models::molecule::Molecule;
use crate::core::topology::registry::MotifRegistry;
use crate::engine::cache::{CacheKey, MoleculeCache};
use crate::engine::config::{BuildConfig, MotifSource};
use crate::engine::error::EngineError;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Owns everything needed to construct building blocks: the motif registry,
/// the build configuration and the identity cache.
///
/// A context is `Sync`; one instance can serve many threads, and every cached
/// request made through it shares the same [`MoleculeCache`].
#[derive(Debug)]
pub struct BuildContext {
    registry: MotifRegistry,
    config: BuildConfig,
    cache: MoleculeCache,
}

impl BuildContext {
    /// Creates a context, loading the motif registry named by `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - Motif source, coordinate generation switch and embedding parameters.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Registry`] if a motif file is configured and cannot be loaded.
    pub fn new(config: BuildConfig) -> Result<Self, EngineError> {
        let registry = match &config.motif_source {
            MotifSource::Builtin => MotifRegistry::builtin(),
            MotifSource::File(path) => MotifRegistry::load(path)?,
        };
        info!(motifs = registry.len(), "Motif registry ready.");
        Ok(Self::with_registry(registry, config))
    }

    /// Creates a context around an already loaded registry.
    pub fn with_registry(registry: MotifRegistry, config: BuildConfig) -> Self {
        Self {
            registry,
            config,
            cache: MoleculeCache::new(),
        }
    }

    pub fn registry(&self) -> &MotifRegistry {
        &self.registry
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn cache(&self) -> &MoleculeCache {
        &self.cache
    }

    /// Builds a block from SMILES with explicit hydrogens and, unless disabled
    /// in the configuration, generated coordinates.
    ///
    /// With `use_cache`, requests for the same structure and the same set of
    /// functional group names return the same instance.
    ///
    /// # Arguments
    ///
    /// * `smiles` - The structure to build.
    /// * `functional_group_names` - Motifs to perceive; order and duplicates are irrelevant.
    /// * `use_cache` - Whether to share instances through the context cache.
    ///
    /// # Return
    ///
    /// Returns the building block, shared with earlier cached calls when `use_cache` is set.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidStructure`] for unparsable SMILES,
    /// [`EngineError::Match`] for an unknown motif name, and
    /// [`EngineError::Conformer`] if coordinate generation is misconfigured.
    /// Failed builds are never cached.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockforge::engine::config::BuildConfig;
    /// use blockforge::workflows::build::BuildContext;
    /// use std::sync::Arc;
    ///
    /// let context = BuildContext::new(BuildConfig::default()).unwrap();
    /// let first = context.from_smiles("NCCCN", &["amine"], true).unwrap();
    /// let second = context.from_smiles("NCCCN", &["amine"], true).unwrap();
    /// assert_eq!(first.num_functional_groups(), 2);
    /// assert!(Arc::ptr_eq(&first, &second));
    /// ```
    #[instrument(skip(self, functional_group_names), name = "build_from_smiles")]
    pub fn from_smiles<S: AsRef<str>>(
        &self,
        smiles: &str,
        functional_group_names: &[S],
        use_cache: bool,
    ) -> Result<Arc<BuildingBlock>, EngineError> {
        let molecule = smiles::parse(smiles)?;
        self.build(molecule, functional_group_names, use_cache, true)
    }

    /// Builds a block from an MDL molfile, keeping the coordinates it contains.
    ///
    /// # Arguments
    ///
    /// * `path` - The molfile to read.
    /// * `functional_group_names` - Motifs to perceive.
    /// * `use_cache` - Whether to share instances through the context cache.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MolFile`] if the file cannot be read or parsed,
    /// and [`EngineError::Match`] for an unknown motif name.
    #[instrument(skip(self, functional_group_names), name = "build_from_molfile", fields(path = %path.display()))]
    pub fn from_molfile<S: AsRef<str>>(
        &self,
        path: &Path,
        functional_group_names: &[S],
        use_cache: bool,
    ) -> Result<Arc<BuildingBlock>, EngineError> {
        let (molecule, metadata) = MolFile::read_from_path(path)?;
        debug!(name = %metadata.name, atoms = molecule.atom_count(), "Molfile read.");
        self.build(molecule, functional_group_names, use_cache, false)
    }

    /// Builds a block from an existing molecule, keeping its coordinates.
    ///
    /// The cache key ignores coordinates, so a cached call may return a block
    /// built earlier from another source of the same graph.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Match`] for an unknown motif name.
    pub fn from_molecule<S: AsRef<str>>(
        &self,
        molecule: Molecule,
        functional_group_names: &[S],
        use_cache: bool,
    ) -> Result<Arc<BuildingBlock>, EngineError> {
        self.build(molecule, functional_group_names, use_cache, false)
    }

    /// Loads a dumped block. With `use_cache`, the load goes through the same
    /// cache as every other constructor of this context.
    ///
    /// # Arguments
    ///
    /// * `path` - A file written by [`BuildingBlock::dump`].
    /// * `use_cache` - Whether to share instances through the context cache.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Dump`] if the file cannot be read or is inconsistent.
    #[instrument(skip(self), name = "load_dump", fields(path = %path.display()))]
    pub fn load(&self, path: &Path, use_cache: bool) -> Result<Arc<BuildingBlock>, EngineError> {
        let block = dump::read(path)?;
        if !use_cache {
            return Ok(Arc::new(block));
        }
        let key = CacheKey::new(block.molecule(), block.functional_group_names());
        self.cache
            .get_or_try_insert_with(key, || Ok::<_, EngineError>(block))
    }

    fn build<S: AsRef<str>>(
        &self,
        molecule: Molecule,
        functional_group_names: &[S],
        use_cache: bool,
        embed: bool,
    ) -> Result<Arc<BuildingBlock>, EngineError> {
        let construct = |mut molecule: Molecule| -> Result<BuildingBlock, EngineError> {
            if embed && self.config.generate_coordinates {
                conformer::embed(&mut molecule, &self.config.embedding)?;
            }
            let block = BuildingBlock::new(molecule, functional_group_names, &self.registry)?;
            debug!(
                groups = block.num_functional_groups(),
                atoms = block.molecule().atom_count(),
                "Building block constructed."
            );
            Ok(block)
        };

        if !use_cache {
            return construct(molecule).map(Arc::new);
        }
        // The key only depends on the graph, which construction leaves intact.
        let key = CacheKey::new(&molecule, functional_group_names);
        self.cache.get_or_try_insert_with(key, || construct(molecule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn context() -> BuildContext {
        BuildContext::new(BuildConfig::default()).unwrap()
    }

    #[test]
    fn caching_shares_instances_only_for_identical_requests() {
        let context = context();

        let mol0 = context.from_smiles("NCCCN", &["amine"], false).unwrap();
        let mol1 = context.from_smiles("NCCCN", &["amine"], false).unwrap();
        assert!(!Arc::ptr_eq(&mol0, &mol1));
        assert_eq!(*mol0, *mol1);

        let mol2 = context.from_smiles("NCCCN", &["amine"], true).unwrap();
        let mol3 = context.from_smiles("NCCCN", &["amine"], true).unwrap();
        assert!(!Arc::ptr_eq(&mol0, &mol2));
        assert!(!Arc::ptr_eq(&mol1, &mol2));
        assert!(Arc::ptr_eq(&mol2, &mol3));

        let mol4 = context.from_smiles("NCCCN", &["aldehyde"], true).unwrap();
        assert!(!Arc::ptr_eq(&mol3, &mol4));
        assert_eq!(mol4.num_functional_groups(), 0);

        assert_eq!(context.cache().len(), 2);
    }

    #[test]
    fn name_order_does_not_split_the_cache() {
        let context = context();
        let a = context
            .from_smiles("NCCC=O", &["amine", "aldehyde"], true)
            .unwrap();
        let b = context
            .from_smiles("NCCC=O", &["aldehyde", "amine", "amine"], true)
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn cached_loads_share_one_instance() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mol.dump");
        let context = context();

        let mol2 = context.from_smiles("NCCCN", &["amine"], false).unwrap();
        mol2.dump(&path, &[] as &[&str]).unwrap();

        let mol3 = context.load(&path, true).unwrap();
        assert!(!Arc::ptr_eq(&mol2, &mol3));
        let mol4 = context.load(&path, true).unwrap();
        assert!(Arc::ptr_eq(&mol3, &mol4));

        let mol5 = context.load(&path, false).unwrap();
        assert!(!Arc::ptr_eq(&mol4, &mol5));
        assert_eq!(mol5.functional_groups(), mol2.functional_groups());
    }

    #[test]
    fn molecules_share_the_cache_with_smiles_of_the_same_graph() {
        let context = context();
        let molecule = smiles::parse("NCCCN").unwrap();

        let uncached = context.from_molecule(molecule.clone(), &["amine"], false).unwrap();
        assert!(uncached.position_matrix().iter().all(|p| p.coords.norm() == 0.0));
        assert_eq!(uncached.num_functional_groups(), 2);

        let from_smiles = context.from_smiles("NCCCN", &["amine"], true).unwrap();
        let from_molecule = context.from_molecule(molecule, &["amine"], true).unwrap();
        assert!(Arc::ptr_eq(&from_smiles, &from_molecule));
        assert!(!Arc::ptr_eq(&uncached, &from_molecule));
        assert_eq!(context.cache().len(), 1);
    }

    #[test]
    fn invalid_smiles_is_reported_and_not_cached() {
        let context = context();
        let error = context.from_smiles("C(C", &["amine"], true).unwrap_err();
        assert!(matches!(error, EngineError::InvalidStructure(_)));
        assert!(context.cache().is_empty());
    }

    #[test]
    fn unknown_motif_is_reported() {
        let context = context();
        let error = context.from_smiles("NCCCN", &["nitrene"], false).unwrap_err();
        assert!(error.to_string().contains("nitrene"));
    }

    #[test]
    fn generated_coordinates_can_be_disabled() {
        let config = BuildConfig {
            generate_coordinates: false,
            ..BuildConfig::default()
        };
        let context = BuildContext::new(config).unwrap();
        let block = context.from_smiles("O=CC(C=O)C=O", &["aldehyde"], false).unwrap();
        assert!(block.position_matrix().iter().all(|p| p.coords.norm() == 0.0));
        for centroid in block.bonder_centroids() {
            assert!(centroid.coords.norm() < 1e-6);
        }
        assert_eq!(block.bonder_centroids().count(), 3);
    }

    #[test]
    fn molfiles_keep_their_coordinates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("amine.mol");
        let context = context();

        let source = context.from_smiles("NCCCN", &["amine"], false).unwrap();
        MolFile::write_molecule_to_path(source.molecule(), &path).unwrap();

        let block = context.from_molfile(&path, &["amine"], false).unwrap();
        assert_eq!(block.functional_groups(), source.functional_groups());
        for (a, b) in block.position_matrix().iter().zip(source.position_matrix()) {
            assert!((a - b).norm() < 1e-3);
        }
    }

    #[test]
    fn registry_file_is_loaded_from_the_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("motifs.toml");
        std::fs::write(
            &path,
            "[hydroxyl]\nelement = \"O\"\nrole = \"deleter\"\nneighbors = [{ element = \"C\", role = \"bonder\" }]\n",
        )
        .unwrap();
        let config = BuildConfig {
            motif_source: MotifSource::File(path),
            ..BuildConfig::default()
        };
        let context = BuildContext::new(config).unwrap();
        assert_eq!(context.registry().names(), vec!["hydroxyl"]);

        let block = context.from_smiles("OCCO", &["hydroxyl"], false).unwrap();
        assert_eq!(block.num_functional_groups(), 2);
    }
}
