// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::num::NonZeroUsize;

use criterion::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

use photon_simulator::{
    coord::{Axis, XYZ},
    cosmology::Cosmology,
    parallel::{project_photons_parallel, SingleProcess},
    photons::{EmitterKind, FiducialParameters, PhotonColumns, PhotonSample},
    project::{project_photons, AreaOverride, LineOfSight, ProjectionParams},
};

/// A 32³ grid of cells with 10 photons each.
fn get_sample() -> PhotonSample {
    let dimension = 32;
    let width = 320.0;
    let dx = width / dimension as f64;
    let mut rng = StdRng::seed_from_u64(0);

    let mut columns = PhotonColumns::default();
    for i in 0..dimension {
        for j in 0..dimension {
            for k in 0..dimension {
                let centre = |n: usize| (n as f64 + 0.5) * dx - 0.5 * width;
                columns
                    .positions
                    .push(XYZ::new(centre(i), centre(j), centre(k)));
                columns.velocities.push(XYZ::new(
                    rng.gen_range(-500.0..500.0),
                    rng.gen_range(-500.0..500.0),
                    rng.gen_range(-500.0..500.0),
                ));
                columns.widths.push(dx);
                columns.photon_counts.push(10);
                for _ in 0..10 {
                    columns.energies.push(rng.gen_range(0.1..10.0));
                }
            }
        }
    }

    PhotonSample::new(
        columns,
        FiducialParameters {
            area: 2000.0,
            exposure_time: 1e5,
            redshift: 0.05,
            angular_diameter_distance: 199.0,
            dimension,
            width,
            cosmology: Cosmology::default(),
            emitter_kind: EmitterKind::Cells,
        },
    )
    .unwrap()
}

fn projection(c: &mut Criterion) {
    let sample = get_sample();

    let mut params = ProjectionParams::new(LineOfSight::Axis(Axis::Z));
    params.area = Some(AreaOverride::Constant(500.0));
    c.bench_function("project along an axis", |b| {
        let mut rng = StdRng::seed_from_u64(1);
        b.iter(|| project_photons(&sample, &params, &SingleProcess, &mut rng).unwrap())
    });

    params.line_of_sight = LineOfSight::Direction {
        normal: XYZ::new(1.0, 1.0, 1.0),
        north: None,
    };
    c.bench_function("project along a direction", |b| {
        let mut rng = StdRng::seed_from_u64(1);
        b.iter(|| project_photons(&sample, &params, &SingleProcess, &mut rng).unwrap())
    });

    let num_workers = NonZeroUsize::new(4).unwrap();
    c.bench_function("project with 4 workers", |b| {
        b.iter(|| project_photons_parallel(&sample, &params, num_workers, 2).unwrap())
    });
}

fn binning(c: &mut Criterion) {
    let sample = get_sample();
    let params = ProjectionParams::new(LineOfSight::Axis(Axis::X));
    let mut rng = StdRng::seed_from_u64(3);
    let events = project_photons(&sample, &params, &SingleProcess, &mut rng).unwrap();

    c.bench_function("bin image", |b| {
        b.iter(|| events.bin_image(Some(0.5), Some(7.0)))
    });
}

criterion_group!(benches, projection, binning);
criterion_main!(benches);
