// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helpful functions for tests.

use crate::{
    coord::XYZ,
    cosmology::Cosmology,
    photons::{EmitterKind, FiducialParameters, PhotonColumns, PhotonSample},
};

pub(crate) fn fiducial(emitter_kind: EmitterKind) -> FiducialParameters {
    FiducialParameters {
        area: 1000.0,
        exposure_time: 1e5,
        redshift: 0.05,
        angular_diameter_distance: 199.0,
        dimension: 64,
        width: 640.0,
        cosmology: Cosmology::default(),
        emitter_kind,
    }
}

/// Ten emitters with 100 photons between them. Emitter `i` has `2i + 1`
/// photons, except emitter 4 which has none and emitter 9 which picks up the
/// slack. All energies are distinct.
pub(crate) fn get_sample(emitter_kind: EmitterKind) -> PhotonSample {
    let mut photon_counts: Vec<usize> = (0..10).map(|i| 2 * i + 1).collect();
    photon_counts[4] = 0;
    photon_counts[9] = 0;
    photon_counts[9] = 100 - photon_counts.iter().sum::<usize>();

    let positions = (0..10)
        .map(|i| {
            let i = i as f64;
            XYZ::new(10.0 * i - 45.0, 3.0 * i, -2.0 * i + 5.0)
        })
        .collect();
    let velocities = (0..10)
        .map(|i| {
            let i = i as f64;
            XYZ::new(100.0 * i - 450.0, -50.0 * i, 25.0 * i + 10.0)
        })
        .collect();
    let widths = vec![10.0; 10];
    let energies = (0..100).map(|j| 0.5 + 0.05 * j as f64).collect();

    PhotonSample::new(
        PhotonColumns {
            positions,
            velocities,
            widths,
            photon_counts,
            energies,
        },
        fiducial(emitter_kind),
    )
    .unwrap()
}
