// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with event lists.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventListError {
    #[error("Cannot combine event lists with different detector geometry; their {what} differ")]
    GeometryMismatch { what: &'static str },

    #[error("Cannot combine event lists; their '{param}' parameters differ")]
    ParameterMismatch { param: &'static str },

    #[error("No events are inside this region!")]
    EmptySelection,

    #[error("{0}")]
    UnsupportedConfiguration(String),

    #[error("Expected the '{column}' column to have {expected} events, but it has {actual}")]
    ColumnLengthMismatch {
        column: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Event lists either all have a channel column or none do")]
    ChannelMismatch,

    #[error("The event parameters describe channels, but there is no channel column")]
    MissingChannels,

    #[error("Invalid binning: {0}")]
    InvalidBinning(String),

    #[error("The PSF width must be positive and finite, but got {0} degrees")]
    InvalidPsf(f64),

    #[error("Invalid channel energy bounds: {0}")]
    InvalidEbounds(&'static str),

    #[error("The pixel scale must be positive and finite, but got {0} degrees")]
    InvalidPixelScale(f64),
}
