//! Volumetric shape overlap on a discrete grid. Both molecules of a pair are voxelized
//! over one shared bounding box, so intersection and union are exact voxel-set operations.
//! Hydrogens are ignored; spheres use scaled van der Waals radii.

use itertools::iproduct;
use lin_alg::f64::Vec3;

use crate::{element::Element, molecule::Molecule};

pub const GRID_SPACING: f64 = 0.5; // Å
pub const VDW_SCALE: f64 = 0.8;
pub const GRID_PADDING: f64 = 2.0; // Å, beyond the scaled spheres

pub struct ShapeGrid {
    dims: (usize, usize, usize),
    cells: Vec<bool>,
}

impl ShapeGrid {
    fn index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        (ix * self.dims.1 + iy) * self.dims.2 + iz
    }

    /// Number of occupied voxels.
    pub fn volume(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Occupied voxels shared with `other`. Only meaningful for grids from the same
    /// `encode_pair` call; extents match there by construction.
    pub fn overlap_volume(&self, other: &Self) -> usize {
        debug_assert_eq!(self.dims, other.dims);

        self.cells
            .iter()
            .zip(&other.cells)
            .filter(|&(&a, &b)| a && b)
            .count()
    }

    fn encode(mol: &Molecule, origin: Vec3, dims: (usize, usize, usize)) -> Self {
        let mut grid = Self {
            dims,
            cells: vec![false; dims.0 * dims.1 * dims.2],
        };

        for atom in &mol.atoms {
            if atom.element == Element::Hydrogen {
                continue;
            }

            let r = atom.element.vdw_radius() as f64 * VDW_SCALE;
            let r2 = r * r;
            let rel = atom.posit - origin;

            let lo = |v: f64| (((v - r) / GRID_SPACING).floor().max(0.)) as usize;
            let hi = |v: f64, dim: usize| {
                ((((v + r) / GRID_SPACING).ceil()) as usize).min(dim.saturating_sub(1))
            };

            let (x0, x1) = (lo(rel.x), hi(rel.x, dims.0));
            let (y0, y1) = (lo(rel.y), hi(rel.y, dims.1));
            let (z0, z1) = (lo(rel.z), hi(rel.z, dims.2));

            for (ix, iy, iz) in iproduct!(x0..=x1, y0..=y1, z0..=z1) {
                let p = Vec3::new(
                    ix as f64 * GRID_SPACING,
                    iy as f64 * GRID_SPACING,
                    iz as f64 * GRID_SPACING,
                );
                if (p - rel).magnitude_squared() <= r2 {
                    let idx = grid.index(ix, iy, iz);
                    grid.cells[idx] = true;
                }
            }
        }

        grid
    }

    /// Voxelize two molecules over their shared padded bounding box.
    pub fn encode_pair(a: &Molecule, b: &Molecule) -> (Self, Self) {
        let mut min = Vec3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let mut max = Vec3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        let mut any = false;

        for atom in a.atoms.iter().chain(&b.atoms) {
            if atom.element == Element::Hydrogen {
                continue;
            }
            any = true;

            let r = atom.element.vdw_radius() as f64 * VDW_SCALE;
            min.x = min.x.min(atom.posit.x - r);
            min.y = min.y.min(atom.posit.y - r);
            min.z = min.z.min(atom.posit.z - r);
            max.x = max.x.max(atom.posit.x + r);
            max.y = max.y.max(atom.posit.y + r);
            max.z = max.z.max(atom.posit.z + r);
        }

        if !any {
            fn empty() -> ShapeGrid {
                ShapeGrid {
                    dims: (0, 0, 0),
                    cells: Vec::new(),
                }
            }
            return (empty(), empty());
        }

        let origin = Vec3::new(
            min.x - GRID_PADDING,
            min.y - GRID_PADDING,
            min.z - GRID_PADDING,
        );
        let span = |lo: f64, hi: f64| (((hi + GRID_PADDING - lo) / GRID_SPACING).ceil()) as usize + 1;
        let dims = (
            span(origin.x, max.x),
            span(origin.y, max.y),
            span(origin.z, max.z),
        );

        (Self::encode(a, origin, dims), Self::encode(b, origin, dims))
    }
}

/// Fraction of the reference volume the query fails to cover, in [0, 1].
/// An empty reference protrudes completely by convention.
pub fn protrude_dist(ref_mol: &Molecule, query_mol: &Molecule) -> f64 {
    let (ref_grid, query_grid) = ShapeGrid::encode_pair(ref_mol, query_mol);

    let v_ref = ref_grid.volume();
    if v_ref == 0 {
        return 1.;
    }

    let common = ref_grid.overlap_volume(&query_grid);
    (((v_ref - common) as f64) / v_ref as f64).clamp(0., 1.)
}

/// 1 − Tanimoto coefficient of the two voxel sets, in [0, 1].
pub fn tanimoto_dist(a: &Molecule, b: &Molecule) -> f64 {
    let (grid_a, grid_b) = ShapeGrid::encode_pair(a, b);

    let v_a = grid_a.volume();
    let v_b = grid_b.volume();
    let common = grid_a.overlap_volume(&grid_b);

    let union = v_a + v_b - common;
    if union == 0 {
        return 1.;
    }

    (1. - common as f64 / union as f64).clamp(0., 1.)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::{Atom, BondType, Bond};

    fn mol(positions: &[(f64, f64, f64)]) -> Molecule {
        let atoms = positions
            .iter()
            .enumerate()
            .map(|(i, &(x, y, z))| Atom {
                serial_number: i as u32 + 1,
                posit: Vec3::new(x, y, z),
                element: Element::Carbon,
                formal_charge: 0,
            })
            .collect();

        let bonds: Vec<Bond> = (1..positions.len())
            .map(|i| Bond {
                bond_type: BondType::Single,
                atom_0: i - 1,
                atom_1: i,
            })
            .collect();

        Molecule::new("m".to_string(), atoms, bonds, Vec::new())
    }

    #[test]
    fn self_overlap_is_total() {
        let m = mol(&[(0., 0., 0.), (1.5, 0., 0.), (3., 0., 0.)]);

        assert_eq!(protrude_dist(&m, &m), 0.);
        assert_eq!(tanimoto_dist(&m, &m), 0.);
    }

    #[test]
    fn disjoint_molecules_fully_protrude() {
        let a = mol(&[(0., 0., 0.)]);
        let b = mol(&[(25., 0., 0.)]);

        assert_eq!(protrude_dist(&a, &b), 1.);
        assert_eq!(tanimoto_dist(&a, &b), 1.);
    }

    #[test]
    fn partial_overlap_is_between() {
        let a = mol(&[(0., 0., 0.)]);
        let b = mol(&[(1., 0., 0.)]);

        let d = protrude_dist(&a, &b);
        assert!(d > 0. && d < 1., "got {d}");
    }

    #[test]
    fn hydrogens_ignored() {
        let a = mol(&[(0., 0., 0.)]);
        let mut with_h = a.clone();
        with_h.atoms.push(Atom {
            serial_number: 2,
            posit: Vec3::new(1.1, 0., 0.),
            element: Element::Hydrogen,
            formal_charge: 0,
        });

        assert_eq!(protrude_dist(&a, &with_h), 0.);
        assert_eq!(protrude_dist(&with_h, &a), 0.);
    }

    #[test]
    fn empty_reference_protrudes() {
        let empty = Molecule::default();
        let b = mol(&[(0., 0., 0.)]);

        assert_eq!(protrude_dist(&empty, &b), 1.);
        assert_eq!(tanimoto_dist(&empty, &empty), 1.);
    }
}
