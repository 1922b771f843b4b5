// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Shifting rest-frame photon energies into the observer's frame.

use super::geometry::Projector;
use crate::{constants::VEL_C_KMS, photons::PhotonSample};

/// The relativistic Doppler factor for a line-of-sight velocity \[km/s\].
/// Receding emitters (positive velocity) are redshifted.
pub fn doppler_shift(v_los: f64) -> f64 {
    let beta = v_los / VEL_C_KMS;
    ((1.0 - beta) / (1.0 + beta)).sqrt()
}

/// Observed energies of the photons at `indices`, owned by the emitters at
/// `owners`. Every energy is multiplied by `scale_factor`; unless
/// `no_shifting` is set, each is also Doppler shifted by its emitter's
/// line-of-sight velocity.
pub fn observed_energies(
    sample: &PhotonSample,
    indices: &[usize],
    owners: &[usize],
    projector: &Projector,
    no_shifting: bool,
    scale_factor: f64,
) -> Vec<f64> {
    let energies = sample.energies();
    if no_shifting {
        return indices.iter().map(|&j| energies[j] * scale_factor).collect();
    }

    // One shift per emitter.
    let shifts: Vec<f64> = sample
        .velocities()
        .iter()
        .map(|v| doppler_shift(projector.line_of_sight(v)))
        .collect();
    indices
        .iter()
        .zip(owners)
        .map(|(&j, &owner)| energies[j] * shifts[owner] * scale_factor)
        .collect()
}
