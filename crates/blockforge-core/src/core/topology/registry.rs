use crate::core::models::element::Element;
use crate::core::models::topology::BondOrder;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const BUILTIN_MOTIFS: &str = include_str!("../../../data/functional_groups.toml");

/// The part an atom plays when its functional group reacts.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AtomRole {
    /// Forms the new bond during assembly.
    Bonder,
    /// Removed when the group reacts.
    Deleter,
    /// Belongs to the group without bonding or leaving.
    #[default]
    Member,
}

/// Element constraint of a pattern atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementPattern {
    Any,
    Exactly(Element),
}

impl ElementPattern {
    pub fn accepts(&self, element: Element) -> bool {
        match self {
            Self::Any => true,
            Self::Exactly(expected) => *expected == element,
        }
    }
}

impl<'de> Deserialize<'de> for ElementPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        if symbol.trim() == "*" {
            return Ok(Self::Any);
        }
        symbol
            .parse()
            .map(Self::Exactly)
            .map_err(serde::de::Error::custom)
    }
}

/// A neighbor atom required by a motif, relative to the atom it hangs off.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AtomPattern {
    pub element: ElementPattern,
    /// Required order of the bond to the parent atom; any order when absent.
    #[serde(default)]
    pub bond: Option<BondOrder>,
    #[serde(default)]
    pub role: AtomRole,
    #[serde(default)]
    pub neighbors: Vec<AtomPattern>,
}

/// A locally rooted motif: an anchor atom plus a tree of required neighbors.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MotifDefinition {
    #[serde(default)]
    pub description: String,
    /// Element of the anchor atom, which defines the occurrence.
    pub element: ElementPattern,
    #[serde(default)]
    pub role: AtomRole,
    #[serde(default)]
    pub neighbors: Vec<AtomPattern>,
}

impl MotifDefinition {
    /// Whether any atom of the motif is a bonder.
    pub fn has_bonder(&self) -> bool {
        fn any_bonder(patterns: &[AtomPattern]) -> bool {
            patterns
                .iter()
                .any(|p| p.role == AtomRole::Bonder || any_bonder(&p.neighbors))
        }
        self.role == AtomRole::Bonder || any_bonder(&self.neighbors)
    }
}

/// Name-keyed table of functional group motifs.
#[derive(Debug, Clone)]
pub struct MotifRegistry {
    registry: HashMap<String, MotifDefinition>,
}

impl MotifRegistry {
    /// Loads a motif table from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to a TOML file with one table per motif name.
    ///
    /// # Return
    ///
    /// Returns the registry holding every motif of the file.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryLoadError::Io`] if the file cannot be read,
    /// [`RegistryLoadError::Toml`] if it is not a valid motif table, and
    /// [`RegistryLoadError::NoBonder`] if a motif has no bonder atom.
    pub fn load(path: &Path) -> Result<Self, RegistryLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| RegistryLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::parse(&content, &path.to_string_lossy())
    }

    /// Parses a motif table from TOML text.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), minus I/O failures.
    pub fn from_toml_str(content: &str) -> Result<Self, RegistryLoadError> {
        Self::parse(content, "<string>")
    }

    /// The motif table shipped with the library.
    pub fn builtin() -> Self {
        Self::parse(BUILTIN_MOTIFS, "<builtin>").expect("built-in motif table is valid")
    }

    fn parse(content: &str, origin: &str) -> Result<Self, RegistryLoadError> {
        let registry: HashMap<String, MotifDefinition> =
            toml::from_str(content).map_err(|e| RegistryLoadError::Toml {
                path: origin.to_string(),
                source: e,
            })?;
        if let Some(name) = registry
            .iter()
            .find(|(_, motif)| !motif.has_bonder())
            .map(|(name, _)| name.clone())
        {
            return Err(RegistryLoadError::NoBonder(name));
        }
        Ok(Self { registry })
    }

    /// Looks up a motif by name.
    ///
    /// # Return
    ///
    /// Returns `Some(&MotifDefinition)` if the name is known, otherwise `None`.
    pub fn get(&self, name: &str) -> Option<&MotifDefinition> {
        self.registry.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    /// Motif names in ascending order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.registry.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

impl Default for MotifRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Error)]
pub enum RegistryLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Motif '{0}' declares no bonder atom")]
    NoBonder(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn builtin_table_parses_and_has_expected_motifs() {
        let registry = MotifRegistry::builtin();
        for name in [
            "amine",
            "aldehyde",
            "carboxylic_acid",
            "amide",
            "thioacid",
            "alcohol",
            "thiol",
            "bromine",
            "iodine",
            "boronic_acid",
            "terminal_alkyne",
        ] {
            assert!(registry.contains(name), "missing motif {name}");
        }
        assert_eq!(registry.len(), 11);
    }

    #[test]
    fn builtin_amine_is_nitrogen_with_two_leaving_hydrogens() {
        let registry = MotifRegistry::default();
        let amine = registry.get("amine").unwrap();
        assert_eq!(amine.element, ElementPattern::Exactly(Element::N));
        assert_eq!(amine.role, AtomRole::Bonder);
        assert_eq!(amine.neighbors.len(), 2);
        assert!(amine
            .neighbors
            .iter()
            .all(|n| n.role == AtomRole::Deleter && n.element == ElementPattern::Exactly(Element::H)));
    }

    #[test]
    fn wildcard_element_accepts_everything() {
        let bromine = MotifRegistry::builtin();
        let bromine = bromine.get("bromine").unwrap();
        assert_eq!(bromine.neighbors[0].element, ElementPattern::Any);
        assert!(ElementPattern::Any.accepts(Element::C));
        assert!(!ElementPattern::Exactly(Element::N).accepts(Element::C));
    }

    #[test]
    fn names_are_sorted() {
        let registry = MotifRegistry::builtin();
        let names = registry.names();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn from_toml_str_parses_nested_patterns() {
        let registry = MotifRegistry::from_toml_str(
            r#"
            [ester_precursor]
            element = "C"
            role = "bonder"
            neighbors = [
                { element = "O", bond = "double" },
                { element = "O", bond = "single", role = "deleter", neighbors = [ { element = "H", role = "deleter" } ] },
            ]
            "#,
        )
        .unwrap();
        let motif = registry.get("ester_precursor").unwrap();
        assert_eq!(motif.neighbors[0].bond, Some(BondOrder::Double));
        assert_eq!(motif.neighbors[1].neighbors.len(), 1);
        assert_eq!(motif.description, "");
    }

    #[test]
    fn motif_without_bonder_is_rejected() {
        let result = MotifRegistry::from_toml_str(
            r#"
            [inert]
            element = "C"
            neighbors = [ { element = "H", role = "deleter" } ]
            "#,
        );
        assert!(matches!(result, Err(RegistryLoadError::NoBonder(name)) if name == "inert"));
    }

    #[test]
    fn unknown_fields_and_elements_are_rejected() {
        assert!(matches!(
            MotifRegistry::from_toml_str("[x]\nelement = \"C\"\nrole = \"bonder\"\ncolour = 1\n"),
            Err(RegistryLoadError::Toml { .. })
        ));
        assert!(matches!(
            MotifRegistry::from_toml_str("[x]\nelement = \"Qq\"\nrole = \"bonder\"\n"),
            Err(RegistryLoadError::Toml { .. })
        ));
    }

    #[test]
    fn load_reads_from_file_and_reports_missing_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("motifs.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(
            file,
            "[azide]\nelement = \"N\"\nrole = \"bonder\"\nneighbors = [ {{ element = \"N\", bond = \"double\" }} ]"
        )
        .unwrap();

        let registry = MotifRegistry::load(&file_path).unwrap();
        assert_eq!(registry.names(), vec!["azide"]);

        let missing = MotifRegistry::load(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(RegistryLoadError::Io { .. })));
    }
}
