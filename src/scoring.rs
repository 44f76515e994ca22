//! The SuCOS score: an equal-weight blend of feature-map overlap and shape overlap
//! between a reference hit and a query molecule, both in fixed poses.

use crate::{
    feature_map::{FeatMapParams, feature_map_score},
    mol_features::Feature,
    molecule::Molecule,
    shape,
};

/// Which shape comparison feeds the score. Protrude (the default) rewards the query for
/// covering the reference's volume; Tanimoto symmetrically compares both volumes.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub enum ShapeMetric {
    #[default]
    Protrude,
    Tanimoto,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SucosScores {
    pub sucos: f64,
    pub feature_map: f64,
    pub shape: f64,
}

/// Score one (reference, query) pair. Features are passed in so callers scoring the same
/// molecule against many partners extract them once.
pub fn sucos_score(
    ref_mol: &Molecule,
    query_mol: &Molecule,
    ref_feats: &[Feature],
    query_feats: &[Feature],
    metric: ShapeMetric,
) -> SucosScores {
    let params = FeatMapParams::default();
    let fm = feature_map_score(ref_feats, query_feats, &params);

    let shape = match metric {
        ShapeMetric::Protrude => 1. - shape::protrude_dist(ref_mol, query_mol),
        ShapeMetric::Tanimoto => 1. - shape::tanimoto_dist(ref_mol, query_mol),
    }
    .clamp(0., 1.);

    SucosScores {
        sucos: 0.5 * fm + 0.5 * shape,
        feature_map: fm,
        shape,
    }
}

#[cfg(test)]
mod tests {
    use lin_alg::f64::Vec3;

    use super::*;
    use crate::{
        element::Element,
        mol_features::extract_features,
        molecule::{Atom, Bond, BondType},
    };

    fn ethanol_at(x: f64) -> Molecule {
        let atoms = vec![
            (Element::Carbon, x),
            (Element::Carbon, x + 1.5),
            (Element::Oxygen, x + 2.9),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, (element, ax))| Atom {
            serial_number: i as u32 + 1,
            posit: Vec3::new(ax, 0., 0.),
            element,
            formal_charge: 0,
        })
        .collect();

        let bonds = vec![
            Bond {
                bond_type: BondType::Single,
                atom_0: 0,
                atom_1: 1,
            },
            Bond {
                bond_type: BondType::Single,
                atom_0: 1,
                atom_1: 2,
            },
        ];

        Molecule::new("ethanol".to_string(), atoms, bonds, Vec::new())
    }

    #[test]
    fn self_score_is_one() {
        let m = ethanol_at(0.);
        let feats = extract_features(&m).unwrap();

        for metric in [ShapeMetric::Protrude, ShapeMetric::Tanimoto] {
            let s = sucos_score(&m, &m, &feats, &feats, metric);
            assert_eq!(s.sucos, 1.);
            assert_eq!(s.feature_map, 1.);
            assert_eq!(s.shape, 1.);
        }
    }

    #[test]
    fn disjoint_scores_zero() {
        let a = ethanol_at(0.);
        let b = ethanol_at(40.);
        let fa = extract_features(&a).unwrap();
        let fb = extract_features(&b).unwrap();

        let s = sucos_score(&a, &b, &fa, &fb, ShapeMetric::Protrude);
        assert_eq!(s.sucos, 0.);
        assert_eq!(s.feature_map, 0.);
        assert_eq!(s.shape, 0.);
    }

    #[test]
    fn protrude_is_asymmetric() {
        // A small reference inside a larger query scores better than the reverse.
        let small = ethanol_at(0.);

        let atoms = (0..6)
            .map(|i| Atom {
                serial_number: i as u32 + 1,
                posit: Vec3::new(i as f64 * 1.5, 0., 0.),
                element: Element::Carbon,
                formal_charge: 0,
            })
            .collect();
        let bonds = (1..6)
            .map(|i| Bond {
                bond_type: BondType::Single,
                atom_0: i - 1,
                atom_1: i,
            })
            .collect();
        let large = Molecule::new("hexane".to_string(), atoms, bonds, Vec::new());

        let fs = extract_features(&small).unwrap();
        let fl = extract_features(&large).unwrap();

        let covered = sucos_score(&small, &large, &fs, &fl, ShapeMetric::Protrude);
        let covering = sucos_score(&large, &small, &fl, &fs, ShapeMetric::Protrude);

        assert!(covered.shape > covering.shape);
    }
}
