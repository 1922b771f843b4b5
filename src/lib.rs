// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Synthetic X-ray observations of simulated astrophysical plasmas.

A [`photons::PhotonSample`] of a simulation volume is observed by
[`project::project_photons`] (or [`parallel::project_photons_parallel`]) to
make an [`events::EventList`], which can be merged, filtered and binned into
images and spectra.
 */

mod cli;
pub mod constants;
pub mod coord;
pub mod cosmology;
pub mod events;
pub mod io;
pub mod parallel;
mod params;
pub mod photons;
pub mod project;

#[cfg(test)]
mod tests;

// Re-exports.
pub use cli::{PhotonSim, PhotonSimError};
pub use events::EventList;
pub use photons::PhotonSample;
