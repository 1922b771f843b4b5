// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Projecting photons onto a detector.

[`project_photons`] turns (a worker's partition of) a [`PhotonSample`] into an
[`EventList`]:

1. the requested observing conditions decide how many photons are observed
   ([`Rescaling`]);
2. that many photons are drawn without replacement;
3. each is placed somewhere inside its emitter and projected onto the sky;
4. its energy is Doppler shifted by its emitter's line-of-sight velocity;
5. absorption and the detector's effective area remove some photons;
6. the surviving events of all workers are gathered.

Every random number comes from the generator handed in.
 */

pub mod attenuation;
mod doppler;
mod error;
mod geometry;
mod rescale;
mod sampling;
#[cfg(test)]
mod tests;

pub use attenuation::{
    absorb, AbsorptionModel, AuxiliaryResponse, EffectiveArea, TableAbsorption, TabulatedCurve,
};
pub use doppler::{doppler_shift, observed_energies};
pub use error::{AttenuationError, ProjectionError};
pub use geometry::{draw_offsets, project_positions, LineOfSight, Projector, SkyBasis};
pub use rescale::{Distance, Rescaling};
pub use sampling::{owners, sample_indices};

use std::sync::Arc;

use log::{debug, info};
use rand::Rng;

use crate::{
    constants::{DEFAULT_SKY_CENTER_DEG, KPC_PER_MPC},
    coord::RADec,
    events::{Area, EventColumns, EventList, EventParameters},
    parallel::Communicator,
    photons::PhotonSample,
};

/// The collecting area to observe with, if not the fiducial one.
#[derive(Debug, Clone)]
pub enum AreaOverride {
    /// A constant area \[cm²\].
    Constant(f64),

    /// An energy-dependent effective area. Rescaling uses its maximum area
    /// and detection is delegated to it.
    Response(Arc<dyn EffectiveArea>),
}

impl From<f64> for AreaOverride {
    fn from(area: f64) -> Self {
        AreaOverride::Constant(area)
    }
}

impl AreaOverride {
    fn value(&self) -> f64 {
        match self {
            AreaOverride::Constant(a) => *a,
            AreaOverride::Response(r) => r.max_area(),
        }
    }
}

/// Everything about how photons are projected.
#[derive(Debug, Clone)]
pub struct ProjectionParams {
    pub line_of_sight: LineOfSight,
    pub area: Option<AreaOverride>,
    /// \[s\]
    pub exposure_time: Option<f64>,
    pub distance: Option<Distance>,
    pub absorption: Option<Arc<dyn AbsorptionModel>>,
    /// The (RA, Dec) of the image centre. Defaults to
    /// [`DEFAULT_SKY_CENTER_DEG`].
    pub sky_center: Option<RADec>,
    /// Don't Doppler shift energies.
    pub no_shifting: bool,
}

impl ProjectionParams {
    /// Projection along `line_of_sight` with the fiducial observing
    /// conditions.
    pub fn new(line_of_sight: LineOfSight) -> ProjectionParams {
        ProjectionParams {
            line_of_sight,
            area: None,
            exposure_time: None,
            distance: None,
            absorption: None,
            sky_center: None,
            no_shifting: false,
        }
    }
}

/// Project `sample` onto a detector. With more than one worker in `comm`,
/// `sample` is this worker's partition and every worker gets all of the
/// events.
///
/// Nothing random happens before the observing conditions are validated, so
/// a [`ProjectionError::BudgetExceeded`] leaves `rng` untouched.
pub fn project_photons<C, R>(
    sample: &PhotonSample,
    params: &ProjectionParams,
    comm: &C,
    rng: &mut R,
) -> Result<EventList, ProjectionError>
where
    C: Communicator + ?Sized,
    R: Rng,
{
    let fiducial = sample.fiducial();
    let response = match &params.area {
        Some(AreaOverride::Response(r)) => {
            info!("Using energy-dependent effective area: {}", r.name());
            Some(r)
        }
        Some(AreaOverride::Constant(_)) => {
            info!("Using constant effective area");
            None
        }
        None => None,
    };
    let rescaling = Rescaling::new(
        fiducial,
        params.area.as_ref().map(AreaOverride::value),
        params.exposure_time,
        params.distance,
    )?;
    let projector = Projector::new(&params.line_of_sight)?;

    let n_photons = sample.num_photons();
    let n_obs = rescaling.target_count(n_photons);
    let n_obs_all = comm.all_reduce_sum(n_obs)?;
    if comm.rank() == 0 {
        info!("Total number of photons to use: {n_obs_all}");
    }

    let indices = sample_indices(n_photons, n_obs, rng);
    let owners = owners(sample, &indices);
    let widths: Vec<f64> = owners.iter().map(|&o| sample.widths()[o]).collect();
    let offsets = draw_offsets(fiducial.emitter_kind, &widths, rng);
    let (xsky, ysky) = project_positions(&projector, sample, &owners, offsets.view());
    let energies = observed_energies(
        sample,
        &indices,
        &owners,
        &projector,
        params.no_shifting,
        rescaling.scale_factor,
    );

    let mut detected = match &params.absorption {
        Some(model) => {
            info!("Absorbing");
            absorb(model.as_ref(), &energies, rng)?
        }
        None => vec![true; energies.len()],
    };
    if let Some(response) = response {
        info!("Applying energy-dependent effective area");
        let in_area = response.detect(&energies, rng);
        detected
            .iter_mut()
            .zip(in_area)
            .for_each(|(d, a)| *d = *d && a);
    }
    debug!(
        "{} of {} sampled photons were detected",
        detected.iter().filter(|&&d| d).count(),
        detected.len()
    );

    // Sky-plane distances to pixels.
    let dx_min = fiducial.resolution();
    let pix_center = 0.5 * (fiducial.dimension as f64 + 1.0);
    let to_pixel = |s: &f64| s / dx_min + pix_center;
    let local = EventColumns {
        xpix: xsky.iter().map(to_pixel).collect(),
        ypix: ysky.iter().map(to_pixel).collect(),
        energy: energies,
        channel: None,
    }
    .select(&detected);

    let events = comm.gather_events(local)?;
    if comm.rank() == 0 {
        info!("Total number of observed photons: {}", events.len());
    }

    let dtheta = (dx_min / (rescaling.angular_diameter_distance * KPC_PER_MPC)).to_degrees();
    let sky_center = match params.sky_center {
        Some(radec) => {
            let (ra, dec) = radec.to_degrees();
            [ra, dec]
        }
        None => [DEFAULT_SKY_CENTER_DEG.0, DEFAULT_SKY_CENTER_DEG.1],
    };
    let (area, arf, rmf) = match &params.area {
        None => (Area::Constant(fiducial.area), None, None),
        Some(AreaOverride::Constant(a)) => (Area::Constant(*a), None, None),
        Some(AreaOverride::Response(r)) => (
            Area::Response(r.name().to_string()),
            Some(r.name().to_string()),
            r.rmf().map(|s| s.to_string()),
        ),
    };
    let parameters = EventParameters {
        exposure_time: params.exposure_time.unwrap_or(fiducial.exposure_time),
        area,
        redshift: rescaling.redshift,
        angular_diameter_distance: rescaling.angular_diameter_distance,
        sky_center,
        pix_center: [pix_center; 2],
        dtheta,
        arf,
        rmf,
        channel: None,
        mission: None,
        telescope: None,
        instrument: None,
    };
    Ok(EventList::new(events, parameters)?)
}
