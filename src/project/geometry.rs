// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Projecting emission sites onto the plane of the sky.

use ndarray::{Array2, ArrayView1, ArrayView2, Zip};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal, Uniform};
use serde::{Deserialize, Serialize};

use super::ProjectionError;
use crate::{
    coord::{Axis, XYZ},
    photons::{EmitterKind, PhotonSample},
};

/// The direction we look through a simulation volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineOfSight {
    /// Along a principal axis.
    Axis(Axis),

    /// Along an arbitrary direction. `north` sets which way is "up" in the
    /// image; if it isn't given, a principal axis is chosen.
    Direction { normal: XYZ, north: Option<XYZ> },
}

/// An orthonormal basis with `z_hat` along the line of sight (pointing away
/// from the observer) and `x_hat`, `y_hat` spanning the sky. `x_hat = y_hat
/// × z_hat`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyBasis {
    pub x_hat: XYZ,
    pub y_hat: XYZ,
    pub z_hat: XYZ,
}

impl SkyBasis {
    pub fn new(normal: XYZ, north: Option<XYZ>) -> Result<SkyBasis, ProjectionError> {
        let z_hat = normal
            .normalise()
            .ok_or(ProjectionError::DegenerateDirection {
                what: "the normal vector",
            })?;
        let north = match north {
            Some(n) => n.normalise().ok_or(ProjectionError::DegenerateDirection {
                what: "the north vector",
            })?,
            None => default_north(&z_hat).unit(),
        };
        // Remove the line-of-sight component of north.
        let y_hat = north - z_hat.scale(north.dot(&z_hat));
        if y_hat.norm() < 1e-10 {
            return Err(ProjectionError::NorthParallelToLineOfSight);
        }
        let y_hat = y_hat.scale(1.0 / y_hat.norm());
        let x_hat = y_hat.cross(&z_hat);
        Ok(SkyBasis {
            x_hat,
            y_hat,
            z_hat,
        })
    }
}

/// The principal axis least aligned with `z_hat`. Ties go to the axis
/// cyclically preceding `z_hat`'s dominant axis, so that looking along a
/// principal axis gives the same sky axes as [`Axis::sky_axes`].
fn default_north(z_hat: &XYZ) -> Axis {
    let abs = z_hat.to_array().map(f64::abs);
    let axes = [Axis::X, Axis::Y, Axis::Z];
    let dominant = (0..3)
        .reduce(|best, i| if abs[i] > abs[best] { i } else { best })
        .unwrap_or(2);
    let preceding = (dominant + 2) % 3;
    let following = (dominant + 1) % 3;
    if abs[preceding] <= abs[following] {
        axes[preceding]
    } else {
        axes[following]
    }
}

/// A resolved [`LineOfSight`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projector {
    Axis(Axis),
    Basis(SkyBasis),
}

impl Projector {
    pub fn new(line_of_sight: &LineOfSight) -> Result<Projector, ProjectionError> {
        match *line_of_sight {
            LineOfSight::Axis(axis) => Ok(Projector::Axis(axis)),
            LineOfSight::Direction { normal, north } => {
                SkyBasis::new(normal, north).map(Projector::Basis)
            }
        }
    }

    /// Sky-plane coordinates of a point.
    pub fn sky(&self, point: &XYZ) -> (f64, f64) {
        match self {
            Projector::Axis(axis) => {
                let (a, b) = axis.sky_axes();
                (point.component(a), point.component(b))
            }
            Projector::Basis(basis) => (point.dot(&basis.x_hat), point.dot(&basis.y_hat)),
        }
    }

    /// The component of a velocity along the line of sight; positive is
    /// receding.
    pub fn line_of_sight(&self, velocity: &XYZ) -> f64 {
        match self {
            Projector::Axis(axis) => velocity.component(*axis),
            Projector::Basis(basis) => velocity.dot(&basis.z_hat),
        }
    }
}

/// Offsets of photons from their emitter's centre, one row of (x, y, z) per
/// photon. Cell photons are spread uniformly across their cell; particle
/// photons are Gaussian distributed with the particle's smoothing length.
/// Three values are always drawn per photon.
pub fn draw_offsets<R: Rng + ?Sized>(
    kind: EmitterKind,
    widths: &[f64],
    rng: &mut R,
) -> Array2<f64> {
    let n = widths.len();
    let mut offsets = match kind {
        EmitterKind::Cells => {
            let uniform = Uniform::new(-0.5, 0.5);
            Array2::from_shape_simple_fn((n, 3), || uniform.sample(rng))
        }
        EmitterKind::Particles => {
            Array2::from_shape_simple_fn((n, 3), || StandardNormal.sample(rng))
        }
    };
    offsets
        .rows_mut()
        .into_iter()
        .zip(widths)
        .for_each(|(mut row, &w)| row *= w);
    offsets
}

/// Sky-plane positions \[kpc\] of the photons owned by `owners`, displaced
/// by `offsets`.
pub fn project_positions(
    projector: &Projector,
    sample: &PhotonSample,
    owners: &[usize],
    offsets: ArrayView2<f64>,
) -> (Vec<f64>, Vec<f64>) {
    let positions = sample.positions();
    let mut sky = Array2::zeros((owners.len(), 2));
    Zip::from(sky.rows_mut())
        .and(offsets.rows())
        .and(ArrayView1::from(owners))
        .par_for_each(|mut out, offset, &owner| {
            let point = positions[owner] + XYZ::new(offset[0], offset[1], offset[2]);
            let (x, y) = projector.sky(&point);
            out[0] = x;
            out[1] = y;
        });
    (sky.column(0).to_vec(), sky.column(1).to_vec())
}
