//! Data model for a single SDF record: atoms, bonds, and the record's data fields.
//! Kept deliberately small; we don't model chains, residues, or protein-specific roles.

use std::{io, io::ErrorKind};

use lin_alg::f64::Vec3;

use crate::element::Element;

#[derive(Clone, Debug)]
pub struct Atom {
    /// 1-based, as in the SDF atom block.
    pub serial_number: u32,
    pub posit: Vec3,
    pub element: Element,
    /// Elementary charge units. From the atom-block charge code, or an `M  CHG` line.
    pub formal_charge: i8,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum BondType {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondType {
    /// From the bond-order column of a V2000 bond line.
    pub fn from_sdf(v: &str) -> io::Result<Self> {
        match v {
            "1" => Ok(Self::Single),
            "2" => Ok(Self::Double),
            "3" => Ok(Self::Triple),
            "4" => Ok(Self::Aromatic),
            _ => Err(io::Error::new(
                ErrorKind::InvalidData,
                format!("Invalid bond type: {v}"),
            )),
        }
    }

    pub fn to_sdf(&self) -> u8 {
        match self {
            Self::Single => 1,
            Self::Double => 2,
            Self::Triple => 3,
            Self::Aromatic => 4,
        }
    }

    pub fn order(&self) -> f32 {
        match self {
            Self::Single => 1.,
            Self::Double => 2.,
            Self::Triple => 3.,
            Self::Aromatic => 1.5,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Bond {
    pub bond_type: BondType,
    /// Index
    pub atom_0: usize,
    /// Index
    pub atom_1: usize,
}

/// One molecule, as read from (and written back to) an SDF record. `metadata` holds the
/// record's data fields, in file order, so they round-trip; score annotations append to it.
#[derive(Clone, Debug, Default)]
pub struct Molecule {
    pub ident: String,
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
    /// A fast lookup for finding atoms, by index, covalently bonded to each atom.
    pub adjacency_list: Vec<Vec<usize>>,
    pub metadata: Vec<(String, String)>,
}

impl Molecule {
    pub fn new(
        ident: String,
        atoms: Vec<Atom>,
        bonds: Vec<Bond>,
        metadata: Vec<(String, String)>,
    ) -> Self {
        let adjacency_list = build_adjacency_list(&bonds, atoms.len());

        Self {
            ident,
            atoms,
            bonds,
            adjacency_list,
            metadata,
        }
    }

    /// Set a data field, replacing any existing value under the same key.
    pub fn set_prop(&mut self, key: &str, val: String) {
        for (k, v) in &mut self.metadata {
            if k == key {
                *v = val;
                return;
            }
        }
        self.metadata.push((key.to_string(), val));
    }

    pub fn heavy_atom_count(&self) -> usize {
        self.atoms
            .iter()
            .filter(|a| a.element != Element::Hydrogen)
            .count()
    }

    /// Hydrogens implied but not present as explicit atoms, inferred from typical valence
    /// minus the bond orders at this atom. Charge shifts the valence for N and O
    /// (e.g. protonated amine N carries 4 bonds, alkoxide O carries 1).
    pub fn implicit_hydrogens(&self, i: usize) -> usize {
        let atom = &self.atoms[i];
        if atom.element == Element::Hydrogen {
            return 0;
        }

        let mut order_sum = 0.;
        for bond in &self.bonds {
            if bond.atom_0 == i || bond.atom_1 == i {
                order_sum += bond.bond_type.order();
            }
        }

        let valence = atom.element.valence_typical() as i32
            + match atom.element {
                Element::Nitrogen | Element::Oxygen | Element::Sulfur => atom.formal_charge as i32,
                _ => 0,
            };

        (valence - order_sum.round() as i32).max(0) as usize
    }
}

pub fn build_adjacency_list(bonds: &[Bond], atoms_len: usize) -> Vec<Vec<usize>> {
    let mut result = vec![Vec::new(); atoms_len];

    // For each bond, record its atoms as neighbors of each other
    for bond in bonds {
        result[bond.atom_0].push(bond.atom_1);
        result[bond.atom_1].push(bond.atom_0);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(sn: u32, x: f64, element: Element) -> Atom {
        Atom {
            serial_number: sn,
            posit: Vec3::new(x, 0., 0.),
            element,
            formal_charge: 0,
        }
    }

    fn bond(a: usize, b: usize, bond_type: BondType) -> Bond {
        Bond {
            bond_type,
            atom_0: a,
            atom_1: b,
        }
    }

    /// Ethanol heavy atoms only: C-C-O. The O should infer one implicit H, the terminal C three.
    #[test]
    fn implicit_h_from_valence() {
        let mol = Molecule::new(
            "ethanol".to_string(),
            vec![
                atom(1, 0., Element::Carbon),
                atom(2, 1.5, Element::Carbon),
                atom(3, 2.9, Element::Oxygen),
            ],
            vec![
                bond(0, 1, BondType::Single),
                bond(1, 2, BondType::Single),
            ],
            Vec::new(),
        );

        assert_eq!(mol.implicit_hydrogens(0), 3);
        assert_eq!(mol.implicit_hydrogens(1), 2);
        assert_eq!(mol.implicit_hydrogens(2), 1);
        assert_eq!(mol.heavy_atom_count(), 3);
    }

    #[test]
    fn charge_shifts_valence() {
        // Alkoxide O with a single bond: no implicit H.
        let mol = Molecule::new(
            "methoxide".to_string(),
            vec![atom(1, 0., Element::Carbon), {
                let mut a = atom(2, 1.4, Element::Oxygen);
                a.formal_charge = -1;
                a
            }],
            vec![bond(0, 1, BondType::Single)],
            Vec::new(),
        );

        assert_eq!(mol.implicit_hydrogens(1), 0);
    }

    #[test]
    fn adjacency() {
        let mol = Molecule::new(
            "m".to_string(),
            vec![
                atom(1, 0., Element::Carbon),
                atom(2, 1.5, Element::Carbon),
                atom(3, 2.9, Element::Oxygen),
            ],
            vec![
                bond(0, 1, BondType::Single),
                bond(1, 2, BondType::Single),
            ],
            Vec::new(),
        );

        assert_eq!(mol.adjacency_list[0], vec![1]);
        assert_eq!(mol.adjacency_list[1], vec![0, 2]);
        assert_eq!(mol.adjacency_list[2], vec![1]);
    }

    #[test]
    fn set_prop_replaces() {
        let mut mol = Molecule::default();
        mol.set_prop("Score", "0.5".to_string());
        mol.set_prop("Score", "0.7".to_string());

        assert_eq!(mol.metadata, vec![("Score".to_string(), "0.7".to_string())]);
    }
}
