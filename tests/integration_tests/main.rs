// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod arg_files;
mod no_stderr;
mod pipeline;

use std::{
    path::{Path, PathBuf},
    process::Output,
    str::from_utf8,
};

use assert_cmd::{output::OutputError, Command};

use photon_simulator::{
    coord::XYZ,
    cosmology::Cosmology,
    io::write_photon_sample,
    photons::{EmitterKind, FiducialParameters, PhotonColumns, PhotonSample},
};

fn photon_sim() -> Command {
    Command::cargo_bin("photon-sim").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

/// The number of photons in the file made by [`write_photons`].
const NUM_PHOTONS: usize = 500;

/// Write a photon file of 50 particles with 10 photons each to `dir`.
fn write_photons(dir: &Path) -> PathBuf {
    let num_emitters = NUM_PHOTONS / 10;
    let columns = PhotonColumns {
        positions: (0..num_emitters)
            .map(|i| {
                let i = i as f64;
                XYZ::new(4.0 * i - 100.0, 50.0 - 2.0 * i, (i * 0.7).sin() * 60.0)
            })
            .collect(),
        velocities: (0..num_emitters)
            .map(|i| {
                let i = i as f64;
                XYZ::new(20.0 * i - 500.0, 0.0, 300.0 - 12.0 * i)
            })
            .collect(),
        widths: vec![5.0; num_emitters],
        photon_counts: vec![10; num_emitters],
        energies: (0..NUM_PHOTONS)
            .map(|j| 0.5 + 4.5 * j as f64 / NUM_PHOTONS as f64)
            .collect(),
    };
    let sample = PhotonSample::new(
        columns,
        FiducialParameters {
            area: 1000.0,
            exposure_time: 1e5,
            redshift: 0.05,
            angular_diameter_distance: 199.0,
            dimension: 128,
            width: 256.0,
            cosmology: Cosmology::default(),
            emitter_kind: EmitterKind::Particles,
        },
    )
    .unwrap();

    let file = dir.join("photons.json");
    write_photon_sample(&file, &sample, false).unwrap();
    file
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
