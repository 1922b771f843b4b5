// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{num::NonZeroUsize, path::PathBuf};

use log::info;
use rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;

use crate::{
    events::{EventList, EventListError},
    io::{read_photon_sample, write_event_list, IoError},
    parallel::{project_photons_parallel, SingleProcess},
    project::{project_photons, ProjectionError, ProjectionParams},
};

#[derive(Debug)]
pub(crate) struct ProjectParams {
    pub(crate) photons_file: PathBuf,
    pub(crate) output: PathBuf,
    pub(crate) clobber: bool,
    pub(crate) projection: ProjectionParams,

    /// Blur events with a Gaussian PSF of this width \[degrees\].
    pub(crate) psf_sigma: Option<f64>,

    pub(crate) num_workers: NonZeroUsize,
    pub(crate) seed: u64,
}

impl ProjectParams {
    pub(crate) fn run(&self) -> Result<EventList, ProjectError> {
        let ProjectParams {
            photons_file,
            output,
            clobber,
            projection,
            psf_sigma,
            num_workers,
            seed,
        } = self;

        let sample = read_photon_sample(photons_file)?;
        info!(
            "Read {} photons from {} emitters",
            sample.num_photons(),
            sample.num_emitters()
        );

        let mut events = if num_workers.get() == 1 {
            let mut rng = StdRng::seed_from_u64(*seed);
            project_photons(&sample, projection, &SingleProcess, &mut rng)?
        } else {
            project_photons_parallel(&sample, projection, *num_workers, *seed)?
        };

        if let Some(sigma) = psf_sigma {
            info!("Convolving events with a {sigma}° PSF");
            // Don't reuse any worker's stream of random numbers.
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(num_workers.get() as u64));
            events = events.convolve_with_psf(*sigma, &mut rng)?;
        }

        write_event_list(output, &events, *clobber)?;
        info!("Wrote {} events to {}", events.num_events(), output.display());
        Ok(events)
    }
}

#[derive(Error, Debug)]
pub(crate) enum ProjectError {
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    EventList(#[from] EventListError),

    #[error(transparent)]
    Io(#[from] IoError),
}
