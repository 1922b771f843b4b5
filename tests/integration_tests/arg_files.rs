// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests of `project` arguments given in files.

use std::fs;

use tempfile::TempDir;

use photon_simulator::io::read_event_list;

use crate::{display, photon_sim, write_photons};

#[test]
fn test_saved_toml_reproduces_run() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let photons = write_photons(tmp_dir.path());
    let events = tmp_dir.path().join("events.json");
    let toml = tmp_dir.path().join("project.toml");

    #[rustfmt::skip]
    let cmd = photon_sim()
        .args([
            "project",
            "-p", &display(&photons),
            "-o", &display(&events),
            "--normal", "1", "-1", "0.5",
            "--area", "300",
            "--seed", "99",
            "--save-toml", &display(&toml),
        ])
        .ok();
    assert!(cmd.is_ok(), "project failed: {}", cmd.err().unwrap());
    assert!(toml.exists());
    let first = read_event_list(&events).unwrap();

    // Use the saved arguments, overwriting the first event file.
    let cmd = photon_sim()
        .args(["project", &display(&toml), "--clobber"])
        .ok();
    assert!(cmd.is_ok(), "project failed: {}", cmd.err().unwrap());
    let second = read_event_list(&events).unwrap();
    assert_eq!(first.xpix(), second.xpix());
    assert_eq!(first.ypix(), second.ypix());
    assert_eq!(first.energies(), second.energies());
}

#[test]
fn test_json_arg_file() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let photons = write_photons(tmp_dir.path());
    let events = tmp_dir.path().join("events.json");
    let arg_file = tmp_dir.path().join("project.json");
    fs::write(
        &arg_file,
        format!(
            r#"{{"photons": {:?}, "output": {:?}, "axis": "y", "exposure_time": 2e4}}"#,
            display(&photons),
            display(&events)
        ),
    )
    .unwrap();

    let cmd = photon_sim().args(["project", &display(&arg_file)]).ok();
    assert!(cmd.is_ok(), "project failed: {}", cmd.err().unwrap());
    let events = read_event_list(&events).unwrap();
    assert_eq!(events.parameters().exposure_time, 2e4);
}

#[test]
fn test_bad_arg_file() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let arg_file = tmp_dir.path().join("project.toml");
    fs::write(&arg_file, "photons = [").unwrap();

    let cmd = photon_sim().args(["project", &display(&arg_file)]).ok();
    assert!(cmd.is_err());
}
