use rayon::prelude::*;

use super::features::Descriptor;

/// A query/train descriptor pair and its Hamming distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeatureMatch {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: u32,
}

/// Brute-force Hamming matching with a cross-check: a pair is kept only when
/// each descriptor is the other's nearest neighbour.
///
/// Matches are returned sorted by distance, ascending.
pub fn match_cross_checked(query: &[Descriptor], train: &[Descriptor]) -> Vec<FeatureMatch> {
    if query.is_empty() || train.is_empty() {
        return Vec::new();
    }

    let forward: Vec<(usize, u32)> = query.par_iter().map(|q| nearest(q, train)).collect();
    let backward: Vec<usize> = train.par_iter().map(|t| nearest(t, query).0).collect();

    let mut matches: Vec<FeatureMatch> = forward
        .into_iter()
        .enumerate()
        .filter(|&(query_idx, (train_idx, _))| backward[train_idx] == query_idx)
        .map(|(query_idx, (train_idx, distance))| FeatureMatch {
            query_idx,
            train_idx,
            distance,
        })
        .collect();

    matches.sort_by_key(|m| (m.distance, m.query_idx));
    matches
}

/// Index and distance of the closest descriptor in `candidates` (first wins on ties).
fn nearest(desc: &Descriptor, candidates: &[Descriptor]) -> (usize, u32) {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (i, desc.hamming_distance(c)))
        .min_by_key(|&(i, d)| (d, i))
        .unwrap_or((0, u32::MAX))
}
