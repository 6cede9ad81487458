use super::element::Element;
use serde::{Deserialize, Serialize};

/// An atom of a molecule.
///
/// Atoms carry no identifier of their own: an atom's id is its zero-based
/// position in the owning molecule's atom sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Atom {
    /// The chemical element of the atom.
    pub element: Element,
    /// The formal charge in elementary charge units.
    #[serde(default)]
    pub charge: i8,
}

impl Atom {
    /// Creates a neutral atom of the given element.
    pub fn new(element: Element) -> Self {
        Self { element, charge: 0 }
    }

    pub fn with_charge(element: Element, charge: i8) -> Self {
        Self { element, charge }
    }
}
