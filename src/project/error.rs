// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with projecting photons.

use thiserror::Error;

use crate::{
    cosmology::CosmologyError, events::EventListError, parallel::CollectiveError,
    photons::PhotonSampleError,
};

#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error("This combination of requested parameters results in {:.3}% more photons collected than are available in the sample. Please reduce the collecting area or exposure time, or increase the distance/redshift of the object. Alternatively, generate a larger sample of photons.", excess_percent(.fraction))]
    BudgetExceeded { fraction: f64 },

    #[error("The requested {param} must be positive and finite, but got {value}")]
    NonPositive { param: &'static str, value: f64 },

    #[error("Cannot project along {what}; it has no direction")]
    DegenerateDirection { what: &'static str },

    #[error("The north vector is parallel to the line of sight")]
    NorthParallelToLineOfSight,

    #[error(transparent)]
    Cosmology(#[from] CosmologyError),

    #[error(transparent)]
    Attenuation(#[from] AttenuationError),

    #[error(transparent)]
    Collective(#[from] CollectiveError),

    #[error(transparent)]
    EventList(#[from] EventListError),

    #[error(transparent)]
    PhotonSample(#[from] PhotonSampleError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttenuationError {
    #[error("Invalid tabulated curve: {0}")]
    InvalidCurve(&'static str),

    #[error("The effective area '{name}' has no positive area")]
    NoArea { name: String },

    #[error("Couldn't prepare the absorption model: {0}")]
    Prepare(String),
}

fn excess_percent(fraction: &f64) -> f64 {
    100.0 * (fraction - 1.0)
}
