// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Choosing which photons are observed.

use rand::{seq::SliceRandom, Rng};

use crate::photons::PhotonSample;

/// Draw `target` distinct photon indices out of `0..total`, without
/// replacement. The indices are the first `target` elements of a uniformly
/// random permutation. If every photon is wanted, the indices are simply
/// `0..total` in order and no random numbers are drawn.
pub fn sample_indices<R: Rng + ?Sized>(total: usize, target: usize, rng: &mut R) -> Vec<usize> {
    debug_assert!(target <= total);
    let mut indices: Vec<usize> = (0..total).collect();
    if target >= total {
        return indices;
    }

    let (chosen, _) = indices.partial_shuffle(rng, target);
    chosen.to_vec()
}

/// The emitter owning each photon index.
pub fn owners(sample: &PhotonSample, indices: &[usize]) -> Vec<usize> {
    indices.iter().map(|&j| sample.owner_of(j)).collect()
}
