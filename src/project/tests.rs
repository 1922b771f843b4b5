// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use approx::{assert_abs_diff_eq, assert_relative_eq};
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::*;
use crate::{
    coord::{Axis, XYZ},
    events::Area,
    parallel::SingleProcess,
    photons::EmitterKind,
    tests::{fiducial, get_sample},
};

fn project(params: &ProjectionParams, seed: u64) -> Result<EventList, ProjectionError> {
    let sample = get_sample(EmitterKind::Cells);
    let mut rng = StdRng::seed_from_u64(seed);
    project_photons(&sample, params, &SingleProcess, &mut rng)
}

#[test]
fn test_rescaling_identity() {
    let fid = fiducial(EmitterKind::Cells);
    let r = Rescaling::new(&fid, None, None, None).unwrap();
    assert!(r.is_identity);
    assert_eq!(r.fraction, 1.0);
    assert_eq!(r.redshift, fid.redshift);
    assert_eq!(r.angular_diameter_distance, fid.angular_diameter_distance);
    assert_eq!(r.target_count(123), 123);
}

#[test]
fn test_rescaling_area_and_time() {
    let fid = fiducial(EmitterKind::Cells);
    let r = Rescaling::new(&fid, Some(500.0), Some(5e4), None).unwrap();
    assert!(!r.is_identity);
    assert_abs_diff_eq!(r.area_ratio, 0.5);
    assert_abs_diff_eq!(r.time_ratio, 0.5);
    assert_abs_diff_eq!(r.distance_ratio, 1.0);
    assert_abs_diff_eq!(r.fraction, 0.25);
    assert_eq!(r.scale_factor, 1.0);
    assert_eq!(r.target_count(100), 25);
    // Floors.
    assert_eq!(r.target_count(7), 1);
}

#[test]
fn test_rescaling_redshift() {
    let fid = fiducial(EmitterKind::Cells);
    let r = Rescaling::new(&fid, None, None, Some(Distance::Redshift(0.1))).unwrap();
    let d_a = fid.cosmology.angular_diameter_distance(0.1).unwrap();
    assert_abs_diff_eq!(r.angular_diameter_distance, d_a);
    assert_abs_diff_eq!(r.redshift, 0.1);
    assert_abs_diff_eq!(r.scale_factor, 1.05 / 1.1, epsilon = 1e-14);
    let expected = (199.0 * 199.0 * 1.05_f64.powi(3)) / (d_a * d_a * 1.1_f64.powi(3));
    assert_relative_eq!(r.distance_ratio, expected, max_relative = 1e-12);
    assert!(r.fraction < 1.0);
}

#[test]
fn test_rescaling_nearby_distance() {
    let fid = fiducial(EmitterKind::Particles);
    let r = Rescaling::new(
        &fid,
        None,
        None,
        Some(Distance::AngularDiameterDistance(400.0)),
    )
    .unwrap();
    assert_eq!(r.redshift, 0.0);
    assert_eq!(r.angular_diameter_distance, 400.0);
    assert_eq!(r.scale_factor, 1.0);
    let expected = 199.0 * 199.0 * 1.05_f64.powi(3) / (400.0 * 400.0);
    assert_relative_eq!(r.distance_ratio, expected, max_relative = 1e-12);
}

#[test]
fn test_rescaling_rejects_bad_overrides() {
    let fid = fiducial(EmitterKind::Cells);
    let result = Rescaling::new(&fid, Some(-1.0), None, None);
    assert!(matches!(
        result,
        Err(ProjectionError::NonPositive { param: "area", .. })
    ));
    let result = Rescaling::new(&fid, None, Some(0.0), None);
    assert!(matches!(
        result,
        Err(ProjectionError::NonPositive {
            param: "exposure time",
            ..
        })
    ));
    let result = Rescaling::new(&fid, None, None, Some(Distance::Redshift(f64::NAN)));
    assert!(matches!(result, Err(ProjectionError::NonPositive { .. })));
}

#[test]
fn test_budget_exceeded() {
    let fid = fiducial(EmitterKind::Cells);
    let result = Rescaling::new(&fid, Some(2000.0), None, None);
    match result {
        Err(e @ ProjectionError::BudgetExceeded { .. }) => {
            assert!(e.to_string().contains("100.000% more photons"));
        }
        _ => panic!("expected the photon budget to be exceeded"),
    }
}

#[test]
fn test_budget_exceeded_doesnt_touch_rng() {
    let sample = get_sample(EmitterKind::Cells);
    let mut params = ProjectionParams::new(LineOfSight::Axis(Axis::Z));
    params.exposure_time = Some(2e5);
    let mut rng = StdRng::seed_from_u64(1);
    let result = project_photons(&sample, &params, &SingleProcess, &mut rng);
    assert!(matches!(
        result,
        Err(ProjectionError::BudgetExceeded { .. })
    ));
    assert_eq!(rng.gen::<u64>(), StdRng::seed_from_u64(1).gen::<u64>());
}

#[test]
fn test_sample_indices_identity() {
    let mut rng = StdRng::seed_from_u64(5);
    let indices = sample_indices(10, 10, &mut rng);
    assert_eq!(indices, (0..10).collect::<Vec<_>>());
    // No random numbers were drawn.
    assert_eq!(rng.gen::<u64>(), StdRng::seed_from_u64(5).gen::<u64>());
}

#[test]
fn test_sample_indices_are_distinct() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut indices = sample_indices(100, 37, &mut rng);
    assert_eq!(indices.len(), 37);
    assert!(indices.iter().all(|&i| i < 100));
    indices.sort_unstable();
    indices.dedup();
    assert_eq!(indices.len(), 37);
}

#[test]
fn test_owners() {
    let sample = get_sample(EmitterKind::Cells);
    // Emitter 4 has no photons.
    let o = owners(&sample, &[0, 1, 3, 4, 15, 16, 27, 99]);
    assert_eq!(o, vec![0, 1, 1, 2, 3, 5, 6, 9]);
}

#[test]
fn test_default_north_matches_axes() {
    for axis in [Axis::X, Axis::Y, Axis::Z] {
        let basis = SkyBasis::new(axis.unit(), None).unwrap();
        let (a, b) = axis.sky_axes();
        assert_abs_diff_eq!(basis.x_hat.dot(&a.unit()), 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(basis.y_hat.dot(&b.unit()), 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(basis.z_hat.dot(&axis.unit()), 1.0, epsilon = 1e-15);
    }
}

#[test]
fn test_sky_basis_is_orthonormal() {
    let basis = SkyBasis::new(XYZ::new(1.0, -2.0, 0.5), Some(XYZ::new(0.3, 0.1, 1.0))).unwrap();
    assert_abs_diff_eq!(basis.x_hat.norm(), 1.0, epsilon = 1e-14);
    assert_abs_diff_eq!(basis.y_hat.norm(), 1.0, epsilon = 1e-14);
    assert_abs_diff_eq!(basis.x_hat.dot(&basis.y_hat), 0.0, epsilon = 1e-14);
    assert_abs_diff_eq!(basis.y_hat.dot(&basis.z_hat), 0.0, epsilon = 1e-14);
    let z = basis.x_hat.cross(&basis.y_hat);
    assert_abs_diff_eq!(z.dot(&basis.z_hat), 1.0, epsilon = 1e-14);
}

#[test]
fn test_sky_basis_errors() {
    assert!(matches!(
        SkyBasis::new(XYZ::default(), None),
        Err(ProjectionError::DegenerateDirection { .. })
    ));
    assert!(matches!(
        SkyBasis::new(XYZ::new(0.0, 0.0, 2.0), Some(XYZ::new(0.0, 0.0, -1.0))),
        Err(ProjectionError::NorthParallelToLineOfSight)
    ));
}

#[test]
fn test_draw_offsets() {
    let widths = [1.0, 2.0, 4.0, 0.0];
    let mut rng = StdRng::seed_from_u64(9);
    let offsets = draw_offsets(EmitterKind::Cells, &widths, &mut rng);
    assert_eq!(offsets.dim(), (4, 3));
    for (row, w) in offsets.rows().into_iter().zip(widths) {
        for &o in row {
            assert!(o >= -0.5 * w && o <= 0.5 * w);
        }
    }
    assert!(offsets.row(3).iter().all(|&o| o == 0.0));
}

#[test]
fn test_draw_particle_offsets() {
    // Particle offsets are Gaussian, with the smoothing width as sigma.
    let widths = vec![2.0; 20_000];
    let mut rng = StdRng::seed_from_u64(10);
    let offsets = draw_offsets(EmitterKind::Particles, &widths, &mut rng);
    assert_eq!(offsets.dim(), (20_000, 3));

    let n = offsets.len() as f64;
    let mean = offsets.sum() / n;
    let std = (offsets.mapv(|o| (o - mean).powi(2)).sum() / n).sqrt();
    assert_abs_diff_eq!(mean, 0.0, epsilon = 0.03);
    assert_abs_diff_eq!(std, 2.0, epsilon = 0.03);
    // About a third of the draws land beyond one sigma.
    let beyond = offsets.iter().filter(|o| o.abs() > 2.0).count() as f64 / n;
    assert_abs_diff_eq!(beyond, 0.3173, epsilon = 0.01);
}

#[test]
fn test_project_positions_without_offsets() {
    let sample = get_sample(EmitterKind::Cells);
    let projector = Projector::new(&LineOfSight::Axis(Axis::X)).unwrap();
    let owners = [0, 9, 3];
    let offsets = ndarray::Array2::zeros((3, 3));
    let (x, y) = project_positions(&projector, &sample, &owners, offsets.view());
    // Looking along x, the sky is (y, z).
    assert_eq!(x, vec![0.0, 27.0, 9.0]);
    assert_eq!(y, vec![5.0, -13.0, -1.0]);
}

#[test]
fn test_axis_and_direction_agree() {
    let mut axis = ProjectionParams::new(LineOfSight::Axis(Axis::Y));
    axis.area = Some(300.0.into());
    let mut direction = axis.clone();
    direction.line_of_sight = LineOfSight::Direction {
        normal: XYZ::new(0.0, 1.0, 0.0),
        north: None,
    };

    let a = project(&axis, 77).unwrap();
    let b = project(&direction, 77).unwrap();
    assert_eq!(a.num_events(), 30);
    assert_eq!(a.num_events(), b.num_events());
    for (x1, x2) in a.xpix().iter().zip(b.xpix()) {
        assert_abs_diff_eq!(x1, x2, epsilon = 1e-10);
    }
    for (y1, y2) in a.ypix().iter().zip(b.ypix()) {
        assert_abs_diff_eq!(y1, y2, epsilon = 1e-10);
    }
    for (e1, e2) in a.energies().iter().zip(b.energies()) {
        assert_abs_diff_eq!(e1, e2, epsilon = 1e-12);
    }
}

#[test]
fn test_doppler_shift() {
    assert_eq!(doppler_shift(0.0), 1.0);
    // Receding is redshifted.
    assert!(doppler_shift(1000.0) < 1.0);
    assert!(doppler_shift(-1000.0) > 1.0);
    assert_abs_diff_eq!(doppler_shift(1000.0) * doppler_shift(-1000.0), 1.0, epsilon = 1e-15);
}

#[test]
fn test_observed_energies() {
    let sample = get_sample(EmitterKind::Particles);
    let projector = Projector::new(&LineOfSight::Axis(Axis::Z)).unwrap();
    let indices = [0, 99];
    let o = owners(&sample, &indices);

    let unshifted = observed_energies(&sample, &indices, &o, &projector, true, 0.5);
    assert_abs_diff_eq!(unshifted[0], 0.25);
    assert_abs_diff_eq!(unshifted[1], 0.5 * (0.5 + 0.05 * 99.0), epsilon = 1e-14);

    let shifted = observed_energies(&sample, &indices, &o, &projector, false, 1.0);
    // Emitter 0 recedes at 10 km/s along z, emitter 9 at 235 km/s.
    assert_abs_diff_eq!(shifted[0], 0.5 * doppler_shift(10.0), epsilon = 1e-14);
    assert_abs_diff_eq!(
        shifted[1],
        (0.5 + 0.05 * 99.0) * doppler_shift(235.0),
        epsilon = 1e-14
    );
}

#[test]
fn test_half_the_area_keeps_half_the_photons() {
    let sample = get_sample(EmitterKind::Cells);
    let mut params = ProjectionParams::new(LineOfSight::Axis(Axis::Z));
    params.area = Some(500.0.into());
    params.no_shifting = true;
    let events = project(&params, 0).unwrap();

    assert_eq!(events.num_events(), 50);
    let mut energies = events.energies().to_vec();
    for e in &energies {
        assert!(sample.energies().contains(e));
    }
    energies.sort_by(|a, b| a.total_cmp(b));
    energies.dedup();
    assert_eq!(energies.len(), 50);

    let parameters = events.parameters();
    assert_eq!(parameters.area, Area::Constant(500.0));
    assert_eq!(parameters.exposure_time, 1e5);
    assert_eq!(parameters.redshift, 0.05);
}

#[test]
fn test_identity_projection_keeps_everything() {
    let events = project(&ProjectionParams::new(LineOfSight::Axis(Axis::X)), 3).unwrap();
    assert_eq!(events.num_events(), 100);
    assert_eq!(events.parameters().area, Area::Constant(1000.0));
}

#[test]
fn test_event_parameters() {
    let mut params = ProjectionParams::new(LineOfSight::Axis(Axis::Z));
    params.area = Some(100.0.into());
    let events = project(&params, 0).unwrap();
    let p = events.parameters();
    assert_eq!(p.pix_center, [32.5, 32.5]);
    assert_abs_diff_eq!(p.dtheta, (10.0_f64 / 199_000.0).to_degrees(), epsilon = 1e-15);
    assert_eq!(p.sky_center, [30.0, 45.0]);
    assert!(p.arf.is_none());

    params.sky_center = Some(RADec::from_degrees(10.0, -20.0));
    let events = project(&params, 0).unwrap();
    let [ra, dec] = events.parameters().sky_center;
    assert_abs_diff_eq!(ra, 10.0, epsilon = 1e-12);
    assert_abs_diff_eq!(dec, -20.0, epsilon = 1e-12);
}

#[test]
fn test_cell_photons_stay_in_their_cells() {
    // All photons; emitters are 10 kpc cells which are 1 pixel wide.
    let sample = get_sample(EmitterKind::Cells);
    let events = project(&ProjectionParams::new(LineOfSight::Axis(Axis::Z)), 11).unwrap();
    for (j, (x, y)) in events.xpix().iter().zip(events.ypix()).enumerate() {
        let owner = sample.positions()[sample.owner_of(j)];
        assert!((x - (owner.x / 10.0 + 32.5)).abs() <= 0.5);
        assert!((y - (owner.y / 10.0 + 32.5)).abs() <= 0.5);
    }
}

#[test]
fn test_tabulated_curve() {
    let curve = TabulatedCurve::new(vec![1.0, 2.0, 4.0], vec![0.0, 2.0, 1.0]).unwrap();
    assert_eq!(curve.max(), 2.0);
    assert_abs_diff_eq!(curve.interpolate(1.5), 1.0);
    assert_abs_diff_eq!(curve.interpolate(3.0), 1.5);
    assert_eq!(curve.interpolate(4.0), 1.0);
    assert_eq!(curve.interpolate(0.5), 0.0);
    assert_eq!(curve.interpolate(4.5), 0.0);
    assert_eq!(curve.interpolate(f64::NAN), 0.0);

    assert!(TabulatedCurve::new(vec![], vec![]).is_err());
    assert!(TabulatedCurve::new(vec![1.0, 1.0], vec![1.0, 1.0]).is_err());
    assert!(TabulatedCurve::new(vec![1.0, 2.0], vec![1.0, -1.0]).is_err());
    assert!(TabulatedCurve::new(vec![1.0, 2.0], vec![1.0]).is_err());
}

#[derive(Debug)]
struct CountingModel {
    curve: Option<TabulatedCurve>,
    cleanups: AtomicUsize,
}

impl AbsorptionModel for CountingModel {
    fn prepare(&self) -> Result<TabulatedCurve, AttenuationError> {
        self.curve
            .clone()
            .ok_or_else(|| AttenuationError::Prepare("no curve".to_string()))
    }

    fn cleanup(&self) {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_absorption_rate() {
    // Half of the maximum at 5 keV.
    let model = CountingModel {
        curve: Some(TabulatedCurve::new(vec![0.0, 10.0], vec![1.0, 0.0]).unwrap()),
        cleanups: AtomicUsize::new(0),
    };
    let energies = vec![5.0; 20_000];
    let mut rng = StdRng::seed_from_u64(2);
    let kept = absorb(&model, &energies, &mut rng).unwrap();
    let rate = kept.iter().filter(|&&k| k).count() as f64 / energies.len() as f64;
    assert_abs_diff_eq!(rate, 0.5, epsilon = 0.02);
    assert_eq!(model.cleanups.load(Ordering::SeqCst), 1);

    // Nothing gets through beyond the curve.
    let kept = absorb(&model, &[20.0; 100], &mut rng).unwrap();
    assert!(kept.iter().all(|&k| !k));
}

#[test]
fn test_absorption_rate_over_a_spectrum() {
    let model = CountingModel {
        curve: Some(TabulatedCurve::new(vec![0.0, 10.0], vec![1.0, 0.0]).unwrap()),
        cleanups: AtomicUsize::new(0),
    };
    let mut rng = StdRng::seed_from_u64(4);

    // Uniform energies over 0-5 keV: the mean of 1 - E/10 is 0.75.
    let energies: Vec<f64> = (0..40_000).map(|_| rng.gen_range(0.0..5.0)).collect();
    let kept = absorb(&model, &energies, &mut rng).unwrap();
    let rate = kept.iter().filter(|&&k| k).count() as f64 / energies.len() as f64;
    assert_abs_diff_eq!(rate, 0.75, epsilon = 0.015);

    // Over 0-20 keV, half of the energies are beyond the curve: 0.5 * 0.5.
    let energies: Vec<f64> = (0..40_000).map(|_| rng.gen_range(0.0..20.0)).collect();
    let kept = absorb(&model, &energies, &mut rng).unwrap();
    let rate = kept.iter().filter(|&&k| k).count() as f64 / energies.len() as f64;
    assert_abs_diff_eq!(rate, 0.25, epsilon = 0.015);
    assert_eq!(model.cleanups.load(Ordering::SeqCst), 2);
}

#[test]
fn test_absorption_cleanup_after_failure() {
    let model = CountingModel {
        curve: None,
        cleanups: AtomicUsize::new(0),
    };
    let mut rng = StdRng::seed_from_u64(2);
    let result = absorb(&model, &[1.0], &mut rng);
    assert!(matches!(result, Err(AttenuationError::Prepare(_))));
    assert_eq!(model.cleanups.load(Ordering::SeqCst), 1);
}

#[test]
fn test_auxiliary_response() {
    let response = AuxiliaryResponse::new(
        "flat.arf".to_string(),
        &[0.0, 1.0, 2.0],
        &[1.0, 2.0, 3.0],
        vec![100.0, 100.0, 50.0],
        None,
    )
    .unwrap();
    assert_eq!(response.max_area(), 100.0);
    assert_eq!(response.curve().grid(), &[0.5, 1.5, 2.5]);

    let mut rng = StdRng::seed_from_u64(4);
    // Photons where the area is largest are always detected; those off the
    // grid never are.
    let detected = response.detect(&[0.5, 1.0, 1.5, 0.1, 3.0], &mut rng);
    assert_eq!(detected, vec![true, true, true, false, false]);

    let result = AuxiliaryResponse::new(
        "empty.arf".to_string(),
        &[0.0],
        &[1.0],
        vec![0.0],
        None,
    );
    assert!(matches!(result, Err(AttenuationError::NoArea { .. })));
}

#[test]
fn test_projection_with_response() {
    let response = AuxiliaryResponse::new(
        "flat.arf".to_string(),
        &[0.0, 9.0],
        &[0.2, 10.0],
        vec![500.0, 500.0],
        Some("flat.rmf".to_string()),
    )
    .unwrap();
    let mut params = ProjectionParams::new(LineOfSight::Axis(Axis::Z));
    params.area = Some(AreaOverride::Response(Arc::new(response)));
    params.no_shifting = true;
    let events = project(&params, 8).unwrap();

    // A flat response detects every sampled photon.
    assert_eq!(events.num_events(), 50);
    let p = events.parameters();
    assert_eq!(p.area, Area::Response("flat.arf".to_string()));
    assert_eq!(p.arf.as_deref(), Some("flat.arf"));
    assert_eq!(p.rmf.as_deref(), Some("flat.rmf"));
}

#[test]
fn test_projection_with_absorption() {
    let mut params = ProjectionParams::new(LineOfSight::Axis(Axis::Z));
    params.no_shifting = true;
    // Photons above 3 keV are absorbed.
    params.absorption = Some(Arc::new(TableAbsorption::new(
        "step".to_string(),
        TabulatedCurve::new(vec![0.0, 2.999, 3.0], vec![1.0, 1.0, 0.0]).unwrap(),
    )));
    let events = project(&params, 8).unwrap();
    assert!(events.energies().iter().all(|&e| e < 3.0));
    // 0.5 + 0.05j < 2.999 for j < 50.
    assert_eq!(events.num_events(), 50);
}
