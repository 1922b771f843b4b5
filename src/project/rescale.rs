// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! How many photons of a sample are observed under new observing conditions.

use log::debug;
use serde::{Deserialize, Serialize};

use super::ProjectionError;
use crate::photons::FiducialParameters;

/// Where the source is observed from, if not at its fiducial distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distance {
    /// A cosmological redshift; the angular-diameter distance follows from
    /// the sample's cosmology.
    Redshift(f64),

    /// An angular-diameter distance \[Mpc\] for a nearby source, which is then
    /// treated as having no redshift.
    AngularDiameterDistance(f64),
}

/// The result of comparing requested observing conditions against the
/// fiducial ones of a photon sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rescaling {
    pub area_ratio: f64,
    pub time_ratio: f64,
    pub distance_ratio: f64,

    /// The product of the ratios; never more than 1.
    pub fraction: f64,

    /// The redshift of the observation.
    pub redshift: f64,

    /// The angular-diameter distance of the observation \[Mpc\].
    pub angular_diameter_distance: f64,

    /// Energies are multiplied by this to account for a change in redshift.
    pub scale_factor: f64,

    /// True if nothing was overridden; every photon is kept.
    pub is_identity: bool,
}

impl Rescaling {
    /// Compare the requested `area` \[cm²\], `exposure_time` \[s\] and
    /// `distance` against the fiducial parameters. Anything not requested
    /// keeps its fiducial value.
    ///
    /// Fails with [`ProjectionError::BudgetExceeded`] if more photons would be
    /// needed than the sample has.
    pub fn new(
        fiducial: &FiducialParameters,
        area: Option<f64>,
        exposure_time: Option<f64>,
        distance: Option<Distance>,
    ) -> Result<Rescaling, ProjectionError> {
        let z0 = fiducial.redshift;
        let d_a0 = fiducial.angular_diameter_distance;

        if area.is_none() && exposure_time.is_none() && distance.is_none() {
            return Ok(Rescaling {
                area_ratio: 1.0,
                time_ratio: 1.0,
                distance_ratio: 1.0,
                fraction: 1.0,
                redshift: z0,
                angular_diameter_distance: d_a0,
                scale_factor: 1.0,
                is_identity: true,
            });
        }

        let area_ratio = match area {
            Some(a) => check_positive("area", a)? / fiducial.area,
            None => 1.0,
        };
        let time_ratio = match exposure_time {
            Some(t) => check_positive("exposure time", t)? / fiducial.exposure_time,
            None => 1.0,
        };

        let (redshift, d_a, scale_factor) = match distance {
            None => (z0, d_a0, 1.0),
            Some(Distance::AngularDiameterDistance(d)) => {
                (0.0, check_positive("angular-diameter distance", d)?, 1.0)
            }
            Some(Distance::Redshift(z)) => {
                check_positive("redshift", z)?;
                let d_a = fiducial.cosmology.angular_diameter_distance(z)?;
                (z, d_a, (1.0 + z0) / (1.0 + z))
            }
        };
        let distance_ratio = if distance.is_some() {
            (d_a0 * d_a0 * (1.0 + z0).powi(3)) / (d_a * d_a * (1.0 + redshift).powi(3))
        } else {
            1.0
        };

        let fraction = area_ratio * time_ratio * distance_ratio;
        debug!(
            "Rescaling ratios: area {area_ratio}, time {time_ratio}, distance {distance_ratio}"
        );
        if fraction > 1.0 {
            return Err(ProjectionError::BudgetExceeded { fraction });
        }

        Ok(Rescaling {
            area_ratio,
            time_ratio,
            distance_ratio,
            fraction,
            redshift,
            angular_diameter_distance: d_a,
            scale_factor,
            is_identity: false,
        })
    }

    /// The number of a sample's `total_photons` that are observed.
    pub fn target_count(&self, total_photons: usize) -> usize {
        if self.is_identity {
            total_photons
        } else {
            ((total_photons as f64 * self.fraction).floor() as usize).min(total_photons)
        }
    }
}

fn check_positive(param: &'static str, value: f64) -> Result<f64, ProjectionError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(ProjectionError::NonPositive { param, value })
    }
}
