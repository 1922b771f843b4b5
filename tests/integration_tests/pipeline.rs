// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests that run the subcommands one after another, like a user would.

use std::fs;

use tempfile::TempDir;

use photon_simulator::io::{read_event_list, read_image, read_spectrum};

use crate::{display, get_cmd_output, photon_sim, write_photons, NUM_PHOTONS};

#[test]
fn test_project_then_bin() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let photons = write_photons(tmp_dir.path());
    let events = tmp_dir.path().join("events.json");
    let image = tmp_dir.path().join("image.json");
    let spectrum = tmp_dir.path().join("spectrum.json");

    #[rustfmt::skip]
    let cmd = photon_sim()
        .args([
            "project",
            "-p", &display(&photons),
            "-o", &display(&events),
            "-a", "x",
            "--seed", "10",
        ])
        .ok();
    assert!(cmd.is_ok(), "project failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("photon-sim project"), "{stdout}");
    let event_list = read_event_list(&events).unwrap();
    assert_eq!(event_list.num_events(), NUM_PHOTONS);

    let cmd = photon_sim()
        .args(["image", &display(&events), "-o", &display(&image)])
        .ok();
    assert!(cmd.is_ok(), "image failed: {}", cmd.err().unwrap());
    let (counts, parameters) = read_image(&image).unwrap();
    assert_eq!(counts.dim(), (128, 128));
    assert_eq!(&parameters, event_list.parameters());
    assert_eq!(counts.sum() as usize, NUM_PHOTONS);

    #[rustfmt::skip]
    let cmd = photon_sim()
        .args([
            "spectrum", &display(&events),
            "-o", &display(&spectrum),
            "--emin", "0.1",
            "--emax", "10",
            "-n", "50",
        ])
        .ok();
    assert!(cmd.is_ok(), "spectrum failed: {}", cmd.err().unwrap());
    let spectrum = read_spectrum(&spectrum).unwrap();
    assert_eq!(spectrum.counts.len(), 50);
    assert_eq!(spectrum.total_counts() as usize, NUM_PHOTONS);
}

#[test]
fn test_spectrum_with_ebounds() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let photons = write_photons(tmp_dir.path());
    let events = tmp_dir.path().join("events.json");
    let ebounds = tmp_dir.path().join("ebounds.json");
    let spectrum = tmp_dir.path().join("spectrum.json");
    fs::write(
        &ebounds,
        r#"{"channel": [1, 2, 3, 4], "e_min": [0.0, 1.0, 2.0, 4.0], "e_max": [1.0, 2.0, 4.0, 12.0]}"#,
    )
    .unwrap();

    let cmd = photon_sim()
        .args(["project", "-p", &display(&photons), "-o", &display(&events)])
        .ok();
    assert!(cmd.is_ok(), "project failed: {}", cmd.err().unwrap());

    #[rustfmt::skip]
    let cmd = photon_sim()
        .args([
            "spectrum", &display(&events),
            "-o", &display(&spectrum),
            "-m", "channel",
            "--ebounds", &display(&ebounds),
            "--channel-type", "PHA",
        ])
        .ok();
    assert!(cmd.is_ok(), "spectrum failed: {}", cmd.err().unwrap());
    let spectrum = read_spectrum(&spectrum).unwrap();
    assert_eq!(spectrum.channels, vec![1, 2, 3, 4]);
    assert_eq!(spectrum.total_counts() as usize, NUM_PHOTONS);
}

#[test]
fn test_merge_event_files() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let photons = write_photons(tmp_dir.path());
    let mut event_files = vec![];
    for seed in ["1", "2"] {
        let events = tmp_dir.path().join(format!("events_{seed}.json"));
        #[rustfmt::skip]
        let cmd = photon_sim()
            .args([
                "project",
                "-p", &display(&photons),
                "-o", &display(&events),
                "--area", "500",
                "--seed", seed,
            ])
            .ok();
        assert!(cmd.is_ok(), "project failed: {}", cmd.err().unwrap());
        event_files.push(events);
    }

    let merged = tmp_dir.path().join("merged.json");
    let cmd = photon_sim()
        .arg("merge")
        .args(event_files.iter().map(|f| display(f)))
        .args(["-o", &display(&merged)])
        .ok();
    assert!(cmd.is_ok(), "merge failed: {}", cmd.err().unwrap());

    let total: usize = event_files
        .iter()
        .map(|f| read_event_list(f).unwrap().num_events())
        .sum();
    assert_eq!(read_event_list(&merged).unwrap().num_events(), total);

    // Merging again without --clobber must fail and leave the file alone.
    let cmd = photon_sim()
        .arg("merge")
        .args(event_files.iter().map(|f| display(f)))
        .args(["-o", &display(&merged)])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Error"), "{stderr}");
    assert_eq!(read_event_list(&merged).unwrap().num_events(), total);
}

#[test]
fn test_budget_exceeded_is_reported() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let photons = write_photons(tmp_dir.path());
    let events = tmp_dir.path().join("events.json");

    #[rustfmt::skip]
    let cmd = photon_sim()
        .args([
            "project",
            "-p", &display(&photons),
            "-o", &display(&events),
            "--area", "5000",
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("more photons"), "{stderr}");
    assert!(!events.exists());
}

#[test]
fn test_dry_run_writes_nothing() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let photons = write_photons(tmp_dir.path());
    let events = tmp_dir.path().join("events.json");

    #[rustfmt::skip]
    let cmd = photon_sim()
        .args([
            "project",
            "-p", &display(&photons),
            "-o", &display(&events),
            "--dry-run",
        ])
        .ok();
    assert!(cmd.is_ok(), "project failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Dry run"), "{stdout}");
    assert!(!events.exists());
}
