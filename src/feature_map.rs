//! Feature-map comparison: Gaussian-weighted overlap between two pharmacophore feature
//! sets, accumulated over every same-family pair within a cutoff radius and normalized by
//! the smaller set's size.

use itertools::iproduct;

use crate::mol_features::Feature;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FeatProfile {
    Gaussian,
    Triangle,
    Box,
}

#[derive(Clone, Copy, Debug)]
pub struct FeatMapParams {
    /// Cutoff, in Å. Feature pairs farther apart than this contribute nothing.
    pub radius: f64,
    pub width: f64,
    pub profile: FeatProfile,
}

impl Default for FeatMapParams {
    fn default() -> Self {
        Self {
            radius: 2.5,
            width: 1.0,
            profile: FeatProfile::Gaussian,
        }
    }
}

/// Score a single feature pair. 0 for mismatched families or beyond the cutoff.
pub fn feat_feat_score(a: &Feature, b: &Feature, params: &FeatMapParams) -> f64 {
    if a.family != b.family {
        return 0.;
    }

    let d2 = (a.posit - b.posit).magnitude_squared();
    if d2 > params.radius * params.radius {
        return 0.;
    }

    match params.profile {
        FeatProfile::Gaussian => (-d2 / params.width).exp(),
        FeatProfile::Triangle => {
            let d = d2.sqrt();
            if d < params.width {
                1. - d / params.width
            } else {
                0.
            }
        }
        FeatProfile::Box => 1.,
    }
}

/// Sum of pair scores over all (reference, query) feature pairs.
pub fn score_feats(ref_feats: &[Feature], query_feats: &[Feature], params: &FeatMapParams) -> f64 {
    iproduct!(ref_feats, query_feats)
        .map(|(a, b)| feat_feat_score(a, b, params))
        .sum()
}

/// The normalized feature-map score used by SuCOS: total pair score over
/// `min(n_ref, n_query)`, clamped to [0, 1]. Either side empty scores 0.
pub fn feature_map_score(
    ref_feats: &[Feature],
    query_feats: &[Feature],
    params: &FeatMapParams,
) -> f64 {
    let denom = ref_feats.len().min(query_feats.len());
    if denom == 0 {
        return 0.;
    }

    (score_feats(ref_feats, query_feats, params) / denom as f64).clamp(0., 1.)
}
