// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Pre-generated photon populations.

A [`PhotonSample`] holds every emitter (a grid cell or a particle) of a
simulation volume alongside the rest-frame energies of the photons each emitter
produced. The energies of all emitters are stored flat; emitter *i* owns the
half-open range `cumulative_index[i]..cumulative_index[i + 1]`.

Samples are never mutated after construction. Partitioning and merging return
new samples.
 */

mod error;

pub use error::PhotonSampleError;

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::{coord::XYZ, cosmology::Cosmology};

/// What kind of emitters a sample was generated from. This decides how
/// photons are scattered about their emitter's centre when they're projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EmitterKind {
    /// Uniform grid cells; photons are uniformly distributed across the cell.
    Cells,

    /// Point particles with a smoothing length; photons are Gaussian
    /// distributed about the particle.
    Particles,
}

/// The observing conditions a photon sample was generated for. Rescaling
/// ratios are computed against these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiducialParameters {
    /// Collecting area \[cm²\]
    pub area: f64,

    /// Exposure time \[s\]
    pub exposure_time: f64,

    pub redshift: f64,

    /// \[Mpc\]
    pub angular_diameter_distance: f64,

    /// The number of resolution elements across the simulation volume.
    pub dimension: usize,

    /// The width of the simulation volume \[kpc\].
    pub width: f64,

    #[serde(default)]
    pub cosmology: Cosmology,

    pub emitter_kind: EmitterKind,
}

impl FiducialParameters {
    pub(crate) fn validate(&self) -> Result<(), PhotonSampleError> {
        for (param, value) in [
            ("area", self.area),
            ("exposure time", self.exposure_time),
            ("angular-diameter distance", self.angular_diameter_distance),
            ("width", self.width),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(PhotonSampleError::NonPositive { param, value });
            }
        }
        if !(self.redshift >= 0.0 && self.redshift.is_finite()) {
            return Err(PhotonSampleError::NonPositive {
                param: "redshift",
                value: self.redshift,
            });
        }
        if self.dimension == 0 {
            return Err(PhotonSampleError::ZeroDimension);
        }
        Ok(())
    }

    /// The size of one resolution element \[kpc\].
    pub fn resolution(&self) -> f64 {
        self.width / self.dimension as f64
    }
}

/// The per-emitter columns of a photon sample, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotonColumns {
    /// Emitter centres \[kpc\]
    pub positions: Vec<XYZ>,
    /// Emitter bulk velocities \[km/s\]
    pub velocities: Vec<XYZ>,
    /// Cell widths or particle smoothing lengths \[kpc\]
    pub widths: Vec<f64>,
    pub photon_counts: Vec<usize>,
    /// Rest-frame photon energies \[keV\]
    pub energies: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhotonSample {
    columns: PhotonColumns,

    /// One longer than the number of emitters; the first element is 0 and the
    /// last is the total number of photons.
    cumulative_index: Vec<usize>,

    fiducial: FiducialParameters,
}

impl PhotonSample {
    pub fn new(
        columns: PhotonColumns,
        fiducial: FiducialParameters,
    ) -> Result<PhotonSample, PhotonSampleError> {
        fiducial.validate()?;

        let num_emitters = columns.photon_counts.len();
        for (field, actual) in [
            ("positions", columns.positions.len()),
            ("velocities", columns.velocities.len()),
            ("widths", columns.widths.len()),
        ] {
            if actual != num_emitters {
                return Err(PhotonSampleError::LengthMismatch {
                    field,
                    expected: num_emitters,
                    actual,
                });
            }
        }

        let mut cumulative_index = Vec::with_capacity(num_emitters + 1);
        cumulative_index.push(0);
        let mut total = 0;
        for &count in &columns.photon_counts {
            total += count;
            cumulative_index.push(total);
        }
        if total != columns.energies.len() {
            return Err(PhotonSampleError::EnergyCountMismatch {
                expected: total,
                actual: columns.energies.len(),
            });
        }

        Ok(PhotonSample {
            columns,
            cumulative_index,
            fiducial,
        })
    }

    pub fn num_emitters(&self) -> usize {
        self.columns.photon_counts.len()
    }

    pub fn num_photons(&self) -> usize {
        self.columns.energies.len()
    }

    pub fn positions(&self) -> &[XYZ] {
        &self.columns.positions
    }

    pub fn velocities(&self) -> &[XYZ] {
        &self.columns.velocities
    }

    pub fn widths(&self) -> &[f64] {
        &self.columns.widths
    }

    pub fn photon_counts(&self) -> &[usize] {
        &self.columns.photon_counts
    }

    pub fn energies(&self) -> &[f64] {
        &self.columns.energies
    }

    pub fn cumulative_index(&self) -> &[usize] {
        &self.cumulative_index
    }

    pub fn fiducial(&self) -> &FiducialParameters {
        &self.fiducial
    }

    pub fn columns(&self) -> &PhotonColumns {
        &self.columns
    }

    /// Consume the sample, returning its columns and fiducial parameters.
    pub fn into_parts(self) -> (PhotonColumns, FiducialParameters) {
        (self.columns, self.fiducial)
    }

    /// The index of the emitter that produced the photon with index `photon`,
    /// i.e. the largest `i` with `cumulative_index[i] <= photon`.
    ///
    /// Emitters with no photons are never returned for a valid photon index.
    /// `photon` must be less than [`PhotonSample::num_photons`].
    pub fn owner_of(&self, photon: usize) -> usize {
        debug_assert!(photon < self.num_photons());
        self.cumulative_index.partition_point(|&c| c <= photon) - 1
    }

    /// The rest-frame energies of the photons belonging to `emitter`.
    pub fn emitter_energies(&self, emitter: usize) -> &[f64] {
        &self.columns.energies[self.cumulative_index[emitter]..self.cumulative_index[emitter + 1]]
    }

    /// Get the `rank`-th of `size` contiguous partitions of this sample. The
    /// emitters are split as evenly as possible (emitter range
    /// `rank·n/size..(rank+1)·n/size`) and each partition takes its emitters'
    /// photons with it.
    pub fn partition(
        &self,
        rank: usize,
        size: NonZeroUsize,
    ) -> Result<PhotonSample, PhotonSampleError> {
        let size = size.get();
        if rank >= size {
            return Err(PhotonSampleError::BadPartition { rank, size });
        }
        let n = self.num_emitters();
        let start_c = rank * n / size;
        let end_c = (rank + 1) * n / size;
        let start_e = self.cumulative_index[start_c];
        let end_e = self.cumulative_index[end_c];

        let columns = PhotonColumns {
            positions: self.columns.positions[start_c..end_c].to_vec(),
            velocities: self.columns.velocities[start_c..end_c].to_vec(),
            widths: self.columns.widths[start_c..end_c].to_vec(),
            photon_counts: self.columns.photon_counts[start_c..end_c].to_vec(),
            energies: self.columns.energies[start_e..end_e].to_vec(),
        };
        PhotonSample::new(columns, self.fiducial.clone())
    }

    /// Concatenate two samples generated with the same fiducial parameters.
    /// Exposure times may differ only if `add_exposure_times` is set, in which
    /// case the result's exposure time is their sum.
    pub fn merge(
        &self,
        other: &PhotonSample,
        add_exposure_times: bool,
    ) -> Result<PhotonSample, PhotonSampleError> {
        let mut fiducial = self.fiducial.clone();
        check_fiducials_match(&self.fiducial, &other.fiducial)?;
        if add_exposure_times {
            fiducial.exposure_time += other.fiducial.exposure_time;
        } else if self.fiducial.exposure_time != other.fiducial.exposure_time {
            return Err(PhotonSampleError::ParameterMismatch {
                param: "exposure_time",
            });
        }

        let mut columns = self.columns.clone();
        columns.positions.extend_from_slice(&other.columns.positions);
        columns
            .velocities
            .extend_from_slice(&other.columns.velocities);
        columns.widths.extend_from_slice(&other.columns.widths);
        columns
            .photon_counts
            .extend_from_slice(&other.columns.photon_counts);
        columns.energies.extend_from_slice(&other.columns.energies);
        PhotonSample::new(columns, fiducial)
    }
}

/// Everything but the exposure time must agree.
fn check_fiducials_match(
    a: &FiducialParameters,
    b: &FiducialParameters,
) -> Result<(), PhotonSampleError> {
    let param = if a.area != b.area {
        "area"
    } else if a.redshift != b.redshift {
        "redshift"
    } else if a.angular_diameter_distance != b.angular_diameter_distance {
        "angular_diameter_distance"
    } else if a.dimension != b.dimension {
        "dimension"
    } else if a.width != b.width {
        "width"
    } else if a.cosmology != b.cosmology {
        "cosmology"
    } else if a.emitter_kind != b.emitter_kind {
        "emitter_kind"
    } else {
        return Ok(());
    };
    Err(PhotonSampleError::ParameterMismatch { param })
}
