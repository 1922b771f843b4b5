// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests to ensure there is no stderr output for successful commands.

use tempfile::TempDir;

use crate::{display, get_cmd_output, photon_sim, write_photons};

#[test]
fn test_project_no_stderr() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let photons = write_photons(tmp_dir.path());
    let events = tmp_dir.path().join("events.json");

    #[rustfmt::skip]
    let cmd = photon_sim()
        .args([
            "project",
            "-p", &display(&photons),
            "-o", &display(&events),
            "--psf-sigma", "0.001",
            "-j", "2",
            "-v",
        ])
        .ok();
    assert!(
        cmd.is_ok(),
        "project failed on simple test data: {}",
        cmd.err().unwrap()
    );
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}

#[test]
fn test_image_no_stderr() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let photons = write_photons(tmp_dir.path());
    let events = tmp_dir.path().join("events.json");
    let image = tmp_dir.path().join("image.json");

    let cmd = photon_sim()
        .args(["project", "-p", &display(&photons), "-o", &display(&events)])
        .ok();
    assert!(cmd.is_ok(), "project failed: {}", cmd.err().unwrap());

    #[rustfmt::skip]
    let cmd = photon_sim()
        .args([
            "image", &display(&events),
            "-o", &display(&image),
            "--emin", "1",
            "--emax", "3",
        ])
        .ok();
    assert!(
        cmd.is_ok(),
        "image failed on simple test data: {}",
        cmd.err().unwrap()
    );
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}
