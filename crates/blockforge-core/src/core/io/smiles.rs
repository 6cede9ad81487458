//! SMILES parsing into a molecular graph with explicit hydrogens.
//!
//! The supported grammar covers the organic subset, bracket atoms, bonds,
//! branches, ring closures and dot-separated fragments. Stereochemistry
//! (`@`, `/`, `\`) is accepted and discarded. Implicit hydrogens are made
//! explicit: they are appended after all parsed atoms, grouped by parent atom
//! in parent order.

use crate::core::models::atom::Atom;
use crate::core::models::element::Element;
use crate::core::models::molecule::{Molecule, MoleculeError};
use crate::core::models::topology::{Bond, BondOrder};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid SMILES at position {position}: {kind}")]
pub struct SmilesError {
    /// Byte offset into the input where the problem was detected.
    pub position: usize,
    pub kind: SmilesErrorKind,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SmilesErrorKind {
    #[error("empty input")]
    Empty,
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),
    #[error("unknown element '{0}'")]
    UnknownElement(String),
    #[error("unterminated bracket atom")]
    UnclosedBracket,
    #[error("branch opened here is never closed")]
    UnclosedBranch,
    #[error("')' without a matching '('")]
    UnmatchedBranchClose,
    #[error("branch or bond without a preceding atom")]
    MissingAtom,
    #[error("ring bond {0} is never closed")]
    UnclosedRing(u16),
    #[error("ring bond {0} has conflicting bond orders")]
    ConflictingRingBond(u16),
    #[error("bond symbol is not followed by an atom")]
    DanglingBond,
    #[error("formal charge is out of range")]
    ChargeOutOfRange,
    #[error("molecular graph is invalid: {0}")]
    Graph(MoleculeError),
}

#[derive(Debug, Clone)]
struct ParsedAtom {
    element: Element,
    charge: i8,
    aromatic: bool,
    /// Hydrogen count given in brackets; `None` for organic-subset atoms.
    bracket_hydrogens: Option<u8>,
}

#[derive(Debug, Clone, Copy)]
struct PendingBond {
    order: BondOrder,
    explicit: bool,
}

struct SmilesParser<'a> {
    input: &'a [u8],
    pos: usize,
    atoms: Vec<ParsedAtom>,
    bonds: Vec<(usize, usize, Option<BondOrder>)>,
    branch_stack: Vec<(usize, usize)>,
    prev_atom: Option<usize>,
    pending_bond: Option<(PendingBond, usize)>,
    ring_closures: BTreeMap<u16, (usize, Option<BondOrder>, usize)>,
}

/// Parses a SMILES string into a molecule whose positions are all at the origin.
pub fn parse(smiles: &str) -> Result<Molecule, SmilesError> {
    let mut parser = SmilesParser::new(smiles.trim());
    parser.parse()?;
    parser.into_molecule()
}

impl<'a> SmilesParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            atoms: Vec::new(),
            bonds: Vec::new(),
            branch_stack: Vec::new(),
            prev_atom: None,
            pending_bond: None,
            ring_closures: BTreeMap::new(),
        }
    }

    fn error(&self, position: usize, kind: SmilesErrorKind) -> SmilesError {
        SmilesError { position, kind }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn parse(&mut self) -> Result<(), SmilesError> {
        if self.input.is_empty() {
            return Err(self.error(0, SmilesErrorKind::Empty));
        }

        while let Some(ch) = self.peek() {
            match ch {
                b'(' => {
                    let Some(prev) = self.prev_atom else {
                        return Err(self.error(self.pos, SmilesErrorKind::MissingAtom));
                    };
                    self.branch_stack.push((prev, self.pos));
                    self.advance();
                }
                b')' => {
                    let Some((atom, _)) = self.branch_stack.pop() else {
                        return Err(self.error(self.pos, SmilesErrorKind::UnmatchedBranchClose));
                    };
                    if let Some((_, at)) = self.pending_bond {
                        return Err(self.error(at, SmilesErrorKind::DanglingBond));
                    }
                    self.prev_atom = Some(atom);
                    self.advance();
                }
                b'-' | b'/' | b'\\' => self.set_bond(BondOrder::Single)?,
                b'=' => self.set_bond(BondOrder::Double)?,
                b'#' => self.set_bond(BondOrder::Triple)?,
                b':' => self.set_bond(BondOrder::Aromatic)?,
                b'.' => {
                    if let Some((_, at)) = self.pending_bond {
                        return Err(self.error(at, SmilesErrorKind::DanglingBond));
                    }
                    self.prev_atom = None;
                    self.advance();
                }
                b'%' => {
                    let start = self.pos;
                    self.advance();
                    let (Some(d1), Some(d2)) = (self.peek(), self.peek_at(1)) else {
                        return Err(self.error(start, SmilesErrorKind::UnexpectedCharacter('%')));
                    };
                    if !d1.is_ascii_digit() || !d2.is_ascii_digit() {
                        return Err(self.error(start, SmilesErrorKind::UnexpectedCharacter('%')));
                    }
                    self.pos += 2;
                    let number = u16::from(d1 - b'0') * 10 + u16::from(d2 - b'0');
                    self.ring_bond(number, start)?;
                }
                b'0'..=b'9' => {
                    let start = self.pos;
                    self.advance();
                    self.ring_bond(u16::from(ch - b'0'), start)?;
                }
                b'[' => {
                    let atom = self.parse_bracket_atom()?;
                    self.add_atom(atom);
                }
                _ => {
                    let atom = self.parse_organic_atom()?;
                    self.add_atom(atom);
                }
            }
        }

        if let Some(&(_, at)) = self.branch_stack.last() {
            return Err(self.error(at, SmilesErrorKind::UnclosedBranch));
        }
        if let Some((_, at)) = self.pending_bond {
            return Err(self.error(at, SmilesErrorKind::DanglingBond));
        }
        if let Some((&number, &(_, _, at))) = self.ring_closures.iter().next() {
            return Err(self.error(at, SmilesErrorKind::UnclosedRing(number)));
        }
        Ok(())
    }

    fn set_bond(&mut self, order: BondOrder) -> Result<(), SmilesError> {
        if self.prev_atom.is_none() {
            return Err(self.error(self.pos, SmilesErrorKind::MissingAtom));
        }
        self.pending_bond = Some((
            PendingBond {
                order,
                explicit: true,
            },
            self.pos,
        ));
        self.advance();
        Ok(())
    }

    fn take_pending_order(&mut self) -> Option<BondOrder> {
        self.pending_bond
            .take()
            .filter(|(bond, _)| bond.explicit)
            .map(|(bond, _)| bond.order)
    }

    fn add_atom(&mut self, atom: ParsedAtom) {
        let index = self.atoms.len();
        self.atoms.push(atom);
        let order = self.take_pending_order();
        if let Some(prev) = self.prev_atom {
            self.bonds.push((prev, index, order));
        }
        self.prev_atom = Some(index);
    }

    fn ring_bond(&mut self, number: u16, start: usize) -> Result<(), SmilesError> {
        let Some(current) = self.prev_atom else {
            return Err(self.error(start, SmilesErrorKind::MissingAtom));
        };
        let order = self.take_pending_order();
        match self.ring_closures.remove(&number) {
            Some((opener, opening_order, _)) => {
                let order = match (opening_order, order) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(self.error(start, SmilesErrorKind::ConflictingRingBond(number)));
                    }
                    (a, b) => a.or(b),
                };
                self.bonds.push((opener, current, order));
            }
            None => {
                self.ring_closures.insert(number, (current, order, start));
            }
        }
        Ok(())
    }

    fn parse_organic_atom(&mut self) -> Result<ParsedAtom, SmilesError> {
        let start = self.pos;
        let ch = self.advance().unwrap_or(b' ');

        let (element, aromatic) = match ch {
            b'C' if self.peek() == Some(b'l') => {
                self.advance();
                (Element::CL, false)
            }
            b'B' if self.peek() == Some(b'r') => {
                self.advance();
                (Element::BR, false)
            }
            b'B' => (Element::B, false),
            b'C' => (Element::C, false),
            b'N' => (Element::N, false),
            b'O' => (Element::O, false),
            b'P' => (Element::P, false),
            b'S' => (Element::S, false),
            b'F' => (Element::F, false),
            b'I' => (Element::I, false),
            b'b' => (Element::B, true),
            b'c' => (Element::C, true),
            b'n' => (Element::N, true),
            b'o' => (Element::O, true),
            b'p' => (Element::P, true),
            b's' => (Element::S, true),
            b'*' => {
                return Err(self.error(start, SmilesErrorKind::UnknownElement("*".into())));
            }
            other => {
                return Err(self.error(start, SmilesErrorKind::UnexpectedCharacter(other as char)));
            }
        };

        Ok(ParsedAtom {
            element,
            charge: 0,
            aromatic,
            bracket_hydrogens: None,
        })
    }

    fn parse_bracket_atom(&mut self) -> Result<ParsedAtom, SmilesError> {
        let open = self.pos;
        self.advance();

        // Isotope is accepted and ignored.
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        let (element, aromatic) = self.parse_bracket_symbol(open)?;

        // Chirality (@, @@, @TH1, ...) is accepted and ignored.
        while self.peek() == Some(b'@') {
            self.advance();
        }
        if self.peek().is_some_and(|c| c.is_ascii_uppercase())
            && self.peek_at(1).is_some_and(|c| c.is_ascii_uppercase())
            && self.input[self.pos - 1] == b'@'
        {
            self.pos += 2;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let mut hydrogens = 0u8;
        if self.peek() == Some(b'H') {
            self.advance();
            hydrogens = 1;
            if let Some(d) = self.peek().filter(u8::is_ascii_digit) {
                self.advance();
                hydrogens = d - b'0';
            }
        }

        let mut charge = 0i8;
        if let Some(sign @ (b'+' | b'-')) = self.peek() {
            self.advance();
            let unit: i8 = if sign == b'+' { 1 } else { -1 };
            if let Some(d) = self.peek().filter(u8::is_ascii_digit) {
                self.advance();
                charge = unit * (d - b'0') as i8;
            } else {
                charge = unit;
                while self.peek() == Some(sign) {
                    let at = self.pos;
                    self.advance();
                    charge = charge
                        .checked_add(unit)
                        .ok_or_else(|| self.error(at, SmilesErrorKind::ChargeOutOfRange))?;
                }
            }
        }

        // Atom class is accepted and ignored.
        if self.peek() == Some(b':') {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        match self.advance() {
            Some(b']') => Ok(ParsedAtom {
                element,
                charge,
                aromatic,
                bracket_hydrogens: Some(hydrogens),
            }),
            Some(other) => Err(self.error(
                self.pos - 1,
                SmilesErrorKind::UnexpectedCharacter(other as char),
            )),
            None => Err(self.error(open, SmilesErrorKind::UnclosedBracket)),
        }
    }

    fn parse_bracket_symbol(&mut self, open: usize) -> Result<(Element, bool), SmilesError> {
        let start = self.pos;
        let Some(first) = self.peek() else {
            return Err(self.error(open, SmilesErrorKind::UnclosedBracket));
        };

        if first.is_ascii_lowercase() {
            // Aromatic symbols: two-letter forms first.
            for (symbol, element) in [("se", "Se"), ("as", "As")] {
                if self.input[self.pos..].starts_with(symbol.as_bytes()) {
                    self.pos += 2;
                    return Ok((self.lookup(element, start)?, true));
                }
            }
            self.advance();
            let upper = (first as char).to_ascii_uppercase().to_string();
            return match first {
                b'b' | b'c' | b'n' | b'o' | b'p' | b's' => Ok((self.lookup(&upper, start)?, true)),
                _ => Err(self.error(start, SmilesErrorKind::UnknownElement(upper.to_lowercase()))),
            };
        }

        if !first.is_ascii_uppercase() {
            return Err(self.error(start, SmilesErrorKind::UnexpectedCharacter(first as char)));
        }
        self.advance();

        if let Some(second) = self.peek().filter(u8::is_ascii_lowercase) {
            let two = format!("{}{}", first as char, second as char);
            if let Ok(element) = two.parse::<Element>() {
                self.advance();
                return Ok((element, false));
            }
        }
        let one = (first as char).to_string();
        Ok((self.lookup(&one, start)?, false))
    }

    fn lookup(&self, symbol: &str, start: usize) -> Result<Element, SmilesError> {
        symbol
            .parse()
            .map_err(|_| self.error(start, SmilesErrorKind::UnknownElement(symbol.to_string())))
    }

    fn into_molecule(self) -> Result<Molecule, SmilesError> {
        let resolved: Vec<Bond> = self
            .bonds
            .iter()
            .map(|&(a, b, order)| {
                let order = order.unwrap_or_else(|| {
                    if self.atoms[a].aromatic && self.atoms[b].aromatic {
                        BondOrder::Aromatic
                    } else {
                        BondOrder::Single
                    }
                });
                Bond::new(a, b, order)
            })
            .collect();

        let mut seen = HashSet::with_capacity(resolved.len());
        for bond in &resolved {
            let pair = bond.ordered_pair();
            if pair.0 == pair.1 || !seen.insert(pair) {
                let kind = if pair.0 == pair.1 {
                    MoleculeError::SelfBond(pair.0)
                } else {
                    MoleculeError::DuplicateBond(pair.0, pair.1)
                };
                return Err(self.error(self.input.len(), SmilesErrorKind::Graph(kind)));
            }
        }

        let mut half_bonds = vec![0u32; self.atoms.len()];
        for bond in &resolved {
            half_bonds[bond.atom1] += u32::from(bond.order.half_bonds());
            half_bonds[bond.atom2] += u32::from(bond.order.half_bonds());
        }

        let mut atoms: Vec<Atom> = self
            .atoms
            .iter()
            .map(|a| Atom::with_charge(a.element, a.charge))
            .collect();
        let mut bonds = resolved;

        for (index, parsed) in self.atoms.iter().enumerate() {
            let count = match parsed.bracket_hydrogens {
                Some(n) => n,
                None => implicit_hydrogens(parsed.element, half_bonds[index]),
            };
            for _ in 0..count {
                let h = atoms.len();
                atoms.push(Atom::new(Element::H));
                bonds.push(Bond::new(index, h, BondOrder::Single));
            }
        }

        Molecule::from_topology(atoms, bonds)
            .map_err(|e| SmilesError {
                position: self.input.len(),
                kind: SmilesErrorKind::Graph(e),
            })
    }
}

/// Hydrogens needed to reach the smallest default valence not below the
/// current bond valence (aromatic bonds count 1.5, rounded up).
fn implicit_hydrogens(element: Element, half_bonds: u32) -> u8 {
    let valence = half_bonds.div_ceil(2);
    element
        .default_valences()
        .iter()
        .map(|&v| u32::from(v))
        .find(|&v| v >= valence)
        .map_or(0, |v| (v - valence) as u8)
}
