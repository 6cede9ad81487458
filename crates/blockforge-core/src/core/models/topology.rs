use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Bond order counted in half-bonds, so that aromatic bonds (1.5) stay integral.
    pub fn half_bonds(self) -> u8 {
        match self {
            Self::Single => 2,
            Self::Double => 4,
            Self::Triple => 6,
            Self::Aromatic => 3,
        }
    }

    /// The MDL molfile bond type code.
    pub fn molfile_code(self) -> u8 {
        match self {
            Self::Single => 1,
            Self::Double => 2,
            Self::Triple => 3,
            Self::Aromatic => 4,
        }
    }

    pub fn from_molfile_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Single),
            2 => Some(Self::Double),
            3 => Some(Self::Triple),
            4 => Some(Self::Aromatic),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid bond order string")]
pub struct ParseBondOrderError;

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "s" | "single" => Ok(Self::Single),
            "2" | "d" | "double" => Ok(Self::Double),
            "3" | "t" | "triple" => Ok(Self::Triple),
            "ar" | "aromatic" => Ok(Self::Aromatic),
            _ => Err(ParseBondOrderError),
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Single => "Single",
                Self::Double => "Double",
                Self::Triple => "Triple",
                Self::Aromatic => "Aromatic",
            }
        )
    }
}

/// An unordered bond between two atoms, referenced by atom index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bond {
    pub atom1: usize,
    pub atom2: usize,
    #[serde(default)]
    pub order: BondOrder,
}

impl Bond {
    pub fn new(atom1: usize, atom2: usize, order: BondOrder) -> Self {
        Self {
            atom1,
            atom2,
            order,
        }
    }

    pub fn contains(&self, atom: usize) -> bool {
        self.atom1 == atom || self.atom2 == atom
    }

    /// Returns the partner of `atom` in this bond, if `atom` takes part in it.
    pub fn other(&self, atom: usize) -> Option<usize> {
        if self.atom1 == atom {
            Some(self.atom2)
        } else if self.atom2 == atom {
            Some(self.atom1)
        } else {
            None
        }
    }

    /// The atom pair with the lower index first.
    pub fn ordered_pair(&self) -> (usize, usize) {
        (self.atom1.min(self.atom2), self.atom1.max(self.atom2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bond_order_from_str_parses_valid_strings() {
        assert_eq!("1".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("single".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("D".parse::<BondOrder>().unwrap(), BondOrder::Double);
        assert_eq!("triple".parse::<BondOrder>().unwrap(), BondOrder::Triple);
        assert_eq!(
            "aromatic".parse::<BondOrder>().unwrap(),
            BondOrder::Aromatic
        );
    }

    #[test]
    fn bond_order_from_str_rejects_invalid_strings() {
        assert!("".parse::<BondOrder>().is_err());
        assert!("quadruple".parse::<BondOrder>().is_err());
        assert!("0".parse::<BondOrder>().is_err());
    }

    #[test]
    fn molfile_codes_map_both_ways() {
        for order in [
            BondOrder::Single,
            BondOrder::Double,
            BondOrder::Triple,
            BondOrder::Aromatic,
        ] {
            assert_eq!(BondOrder::from_molfile_code(order.molfile_code()), Some(order));
        }
        assert_eq!(BondOrder::from_molfile_code(8), None);
    }

    #[test]
    fn aromatic_bond_counts_three_half_bonds() {
        assert_eq!(BondOrder::Aromatic.half_bonds(), 3);
        assert_eq!(BondOrder::Double.half_bonds(), 4);
    }

    #[test]
    fn bond_other_returns_partner_or_none() {
        let bond = Bond::new(3, 7, BondOrder::Single);
        assert_eq!(bond.other(3), Some(7));
        assert_eq!(bond.other(7), Some(3));
        assert_eq!(bond.other(5), None);
        assert!(bond.contains(7));
        assert!(!bond.contains(4));
    }

    #[test]
    fn ordered_pair_puts_lower_index_first() {
        assert_eq!(Bond::new(9, 2, BondOrder::Double).ordered_pair(), (2, 9));
    }
}
