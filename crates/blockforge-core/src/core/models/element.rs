use phf::{Map, phf_map};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Static per-element data used for valence perception, conformer generation
/// and mass-weighted geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementData {
    pub symbol: &'static str,
    /// Standard atomic weight in g/mol.
    pub mass: f64,
    /// Single-bond covalent radius in Angstroms.
    pub covalent_radius: f64,
    /// Allowed valences of the neutral atom, ascending. Empty for elements
    /// that never receive implicit hydrogens.
    pub valences: &'static [u8],
}

const fn data(
    symbol: &'static str,
    mass: f64,
    covalent_radius: f64,
    valences: &'static [u8],
) -> ElementData {
    ElementData {
        symbol,
        mass,
        covalent_radius,
        valences,
    }
}

// Indexed by atomic number - 1.
static ELEMENT_DATA: [ElementData; 54] = [
    data("H", 1.008, 0.31, &[1]),
    data("He", 4.0026, 0.28, &[]),
    data("Li", 6.94, 1.28, &[]),
    data("Be", 9.0122, 0.96, &[]),
    data("B", 10.81, 0.84, &[3]),
    data("C", 12.011, 0.76, &[4]),
    data("N", 14.007, 0.71, &[3, 5]),
    data("O", 15.999, 0.66, &[2]),
    data("F", 18.998, 0.57, &[1]),
    data("Ne", 20.180, 0.58, &[]),
    data("Na", 22.990, 1.66, &[]),
    data("Mg", 24.305, 1.41, &[]),
    data("Al", 26.982, 1.21, &[]),
    data("Si", 28.085, 1.11, &[]),
    data("P", 30.974, 1.07, &[3, 5]),
    data("S", 32.06, 1.05, &[2, 4, 6]),
    data("Cl", 35.45, 1.02, &[1]),
    data("Ar", 39.948, 1.06, &[]),
    data("K", 39.098, 2.03, &[]),
    data("Ca", 40.078, 1.76, &[]),
    data("Sc", 44.956, 1.70, &[]),
    data("Ti", 47.867, 1.60, &[]),
    data("V", 50.942, 1.53, &[]),
    data("Cr", 51.996, 1.39, &[]),
    data("Mn", 54.938, 1.39, &[]),
    data("Fe", 55.845, 1.32, &[]),
    data("Co", 58.933, 1.26, &[]),
    data("Ni", 58.693, 1.24, &[]),
    data("Cu", 63.546, 1.32, &[]),
    data("Zn", 65.38, 1.22, &[]),
    data("Ga", 69.723, 1.22, &[]),
    data("Ge", 72.630, 1.20, &[]),
    data("As", 74.922, 1.19, &[]),
    data("Se", 78.971, 1.20, &[]),
    data("Br", 79.904, 1.20, &[1]),
    data("Kr", 83.798, 1.16, &[]),
    data("Rb", 85.468, 2.20, &[]),
    data("Sr", 87.62, 1.95, &[]),
    data("Y", 88.906, 1.90, &[]),
    data("Zr", 91.224, 1.75, &[]),
    data("Nb", 92.906, 1.64, &[]),
    data("Mo", 95.95, 1.54, &[]),
    data("Tc", 98.0, 1.47, &[]),
    data("Ru", 101.07, 1.46, &[]),
    data("Rh", 102.91, 1.42, &[]),
    data("Pd", 106.42, 1.39, &[]),
    data("Ag", 107.87, 1.45, &[]),
    data("Cd", 112.41, 1.44, &[]),
    data("In", 114.82, 1.42, &[]),
    data("Sn", 118.71, 1.39, &[]),
    data("Sb", 121.76, 1.39, &[]),
    data("Te", 127.60, 1.38, &[]),
    data("I", 126.90, 1.39, &[1]),
    data("Xe", 131.29, 1.40, &[]),
];

static SYMBOL_TO_NUMBER: Map<&'static str, u8> = phf_map! {
    "H" => 1, "He" => 2, "Li" => 3, "Be" => 4, "B" => 5, "C" => 6, "N" => 7, "O" => 8,
    "F" => 9, "Ne" => 10, "Na" => 11, "Mg" => 12, "Al" => 13, "Si" => 14, "P" => 15,
    "S" => 16, "Cl" => 17, "Ar" => 18, "K" => 19, "Ca" => 20, "Sc" => 21, "Ti" => 22,
    "V" => 23, "Cr" => 24, "Mn" => 25, "Fe" => 26, "Co" => 27, "Ni" => 28, "Cu" => 29,
    "Zn" => 30, "Ga" => 31, "Ge" => 32, "As" => 33, "Se" => 34, "Br" => 35, "Kr" => 36,
    "Rb" => 37, "Sr" => 38, "Y" => 39, "Zr" => 40, "Nb" => 41, "Mo" => 42, "Tc" => 43,
    "Ru" => 44, "Rh" => 45, "Pd" => 46, "Ag" => 47, "Cd" => 48, "In" => 49, "Sn" => 50,
    "Sb" => 51, "Te" => 52, "I" => 53, "Xe" => 54,
};

/// A chemical element, identified by its atomic number.
///
/// Only elements present in the static table can be constructed, so every
/// accessor is infallible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Element(u8);

impl Element {
    pub const H: Element = Element(1);
    pub const B: Element = Element(5);
    pub const C: Element = Element(6);
    pub const N: Element = Element(7);
    pub const O: Element = Element(8);
    pub const F: Element = Element(9);
    pub const P: Element = Element(15);
    pub const S: Element = Element(16);
    pub const CL: Element = Element(17);
    pub const BR: Element = Element(35);
    pub const I: Element = Element(53);

    /// Looks up an element by atomic number.
    pub fn from_atomic_number(number: u8) -> Option<Self> {
        if (1..=ELEMENT_DATA.len() as u8).contains(&number) {
            Some(Self(number))
        } else {
            None
        }
    }

    pub fn atomic_number(self) -> u8 {
        self.0
    }

    fn data(self) -> &'static ElementData {
        &ELEMENT_DATA[(self.0 - 1) as usize]
    }

    pub fn symbol(self) -> &'static str {
        self.data().symbol
    }

    pub fn mass(self) -> f64 {
        self.data().mass
    }

    pub fn covalent_radius(self) -> f64 {
        self.data().covalent_radius
    }

    pub fn default_valences(self) -> &'static [u8] {
        self.data().valences
    }

    pub fn is_hydrogen(self) -> bool {
        self.0 == 1
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown element symbol '{0}'")]
pub struct UnknownElementError(pub String);

impl FromStr for Element {
    type Err = UnknownElementError;

    /// Parses a case-sensitive element symbol (e.g. "C", "Cl").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SYMBOL_TO_NUMBER
            .get(s.trim())
            .map(|&n| Element(n))
            .ok_or_else(|| UnknownElementError(s.to_string()))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        symbol.parse().map_err(serde::de::Error::custom)
    }
}
