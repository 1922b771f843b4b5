// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all photon-sim-related errors. This should be the *only*
//! error enum that is publicly visible from the command line.

use thiserror::Error;

use super::{products::ProductsArgsError, project::ProjectArgsError};
use crate::{
    events::EventListError,
    io::IoError,
    params::{ProductsError, ProjectError},
    project::ProjectionError,
};

/// The *only* publicly visible error from photon-sim.
#[derive(Error, Debug)]
pub enum PhotonSimError {
    /// An error related to the arguments of `project`.
    #[error("{0}\n\nSee `photon-sim project --help` for the available arguments")]
    ProjectArgs(String),

    /// An error related to the arguments of `merge`, `image` or `spectrum`.
    #[error("{0}")]
    ProductsArgs(String),

    /// An error from projecting photons.
    #[error("{0}")]
    Projection(String),

    /// More photons were requested than a sample has.
    #[error("{0}\n\nThe sample must be regenerated with a larger area, exposure time or a closer source to be observed like this")]
    Budget(String),

    /// An error related to event lists.
    #[error("{0}")]
    Events(String),

    /// An error related to reading or writing photon-sim files.
    #[error("{0}")]
    File(String),

    /// An error related to argument files.
    #[error("{0}\n\nArgument files may be toml or json and have the same keys as the long command-line arguments")]
    ArgFile(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

impl From<ProjectArgsError> for PhotonSimError {
    fn from(e: ProjectArgsError) -> Self {
        Self::ProjectArgs(e.to_string())
    }
}

impl From<ProductsArgsError> for PhotonSimError {
    fn from(e: ProductsArgsError) -> Self {
        Self::ProductsArgs(e.to_string())
    }
}

impl From<ProjectionError> for PhotonSimError {
    fn from(e: ProjectionError) -> Self {
        let s = e.to_string();
        match e {
            ProjectionError::BudgetExceeded { .. } => Self::Budget(s),
            ProjectionError::EventList(_) => Self::Events(s),
            ProjectionError::NonPositive { .. }
            | ProjectionError::DegenerateDirection { .. }
            | ProjectionError::NorthParallelToLineOfSight
            | ProjectionError::Cosmology(_)
            | ProjectionError::Attenuation(_)
            | ProjectionError::Collective(_)
            | ProjectionError::PhotonSample(_) => Self::Projection(s),
        }
    }
}

impl From<EventListError> for PhotonSimError {
    fn from(e: EventListError) -> Self {
        Self::Events(e.to_string())
    }
}

impl From<IoError> for PhotonSimError {
    fn from(e: IoError) -> Self {
        Self::File(e.to_string())
    }
}

impl From<ProjectError> for PhotonSimError {
    fn from(e: ProjectError) -> Self {
        match e {
            ProjectError::Projection(e) => Self::from(e),
            ProjectError::EventList(e) => Self::from(e),
            ProjectError::Io(e) => Self::from(e),
        }
    }
}

impl From<ProductsError> for PhotonSimError {
    fn from(e: ProductsError) -> Self {
        match e {
            ProductsError::EventList(e) => Self::from(e),
            ProductsError::Io(e) => Self::from(e),
        }
    }
}

impl From<std::io::Error> for PhotonSimError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<toml::ser::Error> for PhotonSimError {
    fn from(e: toml::ser::Error) -> Self {
        Self::Generic(format!("Couldn't serialise arguments to toml: {e}"))
    }
}
