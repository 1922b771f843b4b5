// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with photon samples.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhotonSampleError {
    #[error("Expected {expected} values for '{field}' (one per emitter), but got {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("The photon counts sum to {expected}, but {actual} energies were supplied")]
    EnergyCountMismatch { expected: usize, actual: usize },

    #[error("The fiducial {param} must be positive and finite, but got {value}")]
    NonPositive { param: &'static str, value: f64 },

    #[error("The fiducial dimension must be at least 1")]
    ZeroDimension,

    #[error("Cannot take partition {rank} of {size}")]
    BadPartition { rank: usize, size: usize },

    #[error("Cannot merge photon samples; their '{param}' parameters differ")]
    ParameterMismatch { param: &'static str },
}
