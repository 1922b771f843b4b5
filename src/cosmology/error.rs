// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with cosmological distances.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CosmologyError {
    #[error("The Hubble constant must be positive, but got h = {0}")]
    BadHubbleConstant(f64),

    #[error("Cannot compute a distance for redshift {0}; redshifts must be finite and non-negative")]
    BadRedshift(f64),
}
