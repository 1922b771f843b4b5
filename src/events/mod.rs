// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Detected events.

An [`EventList`] is what a projection produces: pixel positions and observed
energies of every detected photon, together with the detector geometry needed
to interpret them. Event lists are immutable; every transformation returns a
new list.
 */

mod binning;
mod channels;
mod error;
mod region;

pub use binning::{Spectrum, SpectrumContent, SpectrumMode};
pub use channels::{ChannelInfo, ChannelType, Ebounds};
pub use error::EventListError;
pub use region::{Circle, Polygon, Rectangle, Region};

use std::sync::OnceLock;

use log::debug;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{constants::ERG_PER_KEV, coord::RADec};

/// The per-event columns of an event list. All columns have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventColumns {
    /// 1-indexed pixel x coordinates.
    pub xpix: Vec<f64>,
    /// 1-indexed pixel y coordinates.
    pub ypix: Vec<f64>,
    /// Observed energies \[keV\]
    pub energy: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Vec<i64>>,
}

impl EventColumns {
    pub fn len(&self) -> usize {
        self.xpix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xpix.is_empty()
    }

    fn validate(&self) -> Result<(), EventListError> {
        let expected = self.xpix.len();
        let mut lengths = vec![("ypix", self.ypix.len()), ("energy", self.energy.len())];
        if let Some(channel) = &self.channel {
            lengths.push(("channel", channel.len()));
        }
        for (column, actual) in lengths {
            if actual != expected {
                return Err(EventListError::ColumnLengthMismatch {
                    column,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Append `other`'s events after these ones.
    pub fn append(&mut self, other: &EventColumns) -> Result<(), EventListError> {
        match (&mut self.channel, &other.channel) {
            (Some(mine), Some(theirs)) => mine.extend_from_slice(theirs),
            (None, None) => (),
            _ => return Err(EventListError::ChannelMismatch),
        }
        self.xpix.extend_from_slice(&other.xpix);
        self.ypix.extend_from_slice(&other.ypix);
        self.energy.extend_from_slice(&other.energy);
        Ok(())
    }

    /// Keep only the events where `mask` is true.
    pub fn select(&self, mask: &[bool]) -> EventColumns {
        fn keep<T: Copy>(column: &[T], mask: &[bool]) -> Vec<T> {
            column
                .iter()
                .zip(mask)
                .filter_map(|(&v, &m)| m.then_some(v))
                .collect()
        }

        EventColumns {
            xpix: keep(&self.xpix, mask),
            ypix: keep(&self.ypix, mask),
            energy: keep(&self.energy, mask),
            channel: self.channel.as_deref().map(|c| keep(c, mask)),
        }
    }
}

/// The collecting area behind an event list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Area {
    /// A constant area \[cm²\].
    Constant(f64),

    /// An energy-dependent effective area, referred to by name (e.g. the ARF
    /// file it came from).
    Response(String),
}

impl std::fmt::Display for Area {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Area::Constant(a) => write!(f, "{a} cm²"),
            Area::Response(name) => write!(f, "{name}"),
        }
    }
}

/// Everything needed to interpret the events of an event list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventParameters {
    /// \[s\]
    pub exposure_time: f64,

    pub area: Area,

    pub redshift: f64,

    /// \[Mpc\]
    pub angular_diameter_distance: f64,

    /// The (RA, Dec) of the reference pixel \[degrees\].
    pub sky_center: [f64; 2],

    /// The 1-indexed reference pixel, in the centre of the image.
    pub pix_center: [f64; 2],

    /// The size of a pixel \[degrees\].
    pub dtheta: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arf: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rmf: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChannelInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mission: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telescope: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
}

impl EventParameters {
    fn sky_center_radec(&self) -> RADec {
        RADec::from_degrees(self.sky_center[0], self.sky_center[1])
    }

    /// Detector geometry must be identical before events can be combined.
    fn check_same_geometry(&self, other: &EventParameters) -> Result<(), EventListError> {
        let what = if self.pix_center != other.pix_center {
            "reference pixels"
        } else if self.sky_center != other.sky_center {
            "sky centres"
        } else if self.dtheta != other.dtheta {
            "pixel scales"
        } else if self.arf != other.arf {
            "ARFs"
        } else if self.rmf != other.rmf {
            "RMFs"
        } else {
            return Ok(());
        };
        Err(EventListError::GeometryMismatch { what })
    }

    /// The remaining parameters must also agree, except for the exposure time
    /// when `add_exposure_times` is set.
    fn combine(
        &self,
        other: &EventParameters,
        add_exposure_times: bool,
    ) -> Result<EventParameters, EventListError> {
        self.check_same_geometry(other)?;

        let param = if self.area != other.area {
            Some("area")
        } else if self.redshift != other.redshift {
            Some("redshift")
        } else if self.angular_diameter_distance != other.angular_diameter_distance {
            Some("angular_diameter_distance")
        } else if self.channel != other.channel {
            Some("channel")
        } else if self.mission != other.mission {
            Some("mission")
        } else if self.telescope != other.telescope {
            Some("telescope")
        } else if self.instrument != other.instrument {
            Some("instrument")
        } else if !add_exposure_times && self.exposure_time != other.exposure_time {
            Some("exposure_time")
        } else {
            None
        };
        if let Some(param) = param {
            return Err(EventListError::ParameterMismatch { param });
        }

        let mut combined = self.clone();
        if add_exposure_times {
            combined.exposure_time += other.exposure_time;
        }
        Ok(combined)
    }
}

/// Sky positions of events \[degrees\].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyCoordinates {
    pub ra: Vec<f64>,
    pub dec: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct EventList {
    columns: EventColumns,
    parameters: EventParameters,

    /// Derived from the pixel coordinates on first use.
    sky: OnceLock<SkyCoordinates>,
}

impl EventList {
    pub fn new(
        columns: EventColumns,
        parameters: EventParameters,
    ) -> Result<EventList, EventListError> {
        columns.validate()?;
        if parameters.channel.is_some() && columns.channel.is_none() {
            return Err(EventListError::MissingChannels);
        }
        if !(parameters.dtheta > 0.0 && parameters.dtheta.is_finite()) {
            return Err(EventListError::InvalidPixelScale(parameters.dtheta));
        }
        Ok(EventList {
            columns,
            parameters,
            sky: OnceLock::new(),
        })
    }

    pub fn num_events(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &EventColumns {
        &self.columns
    }

    pub fn parameters(&self) -> &EventParameters {
        &self.parameters
    }

    pub fn xpix(&self) -> &[f64] {
        &self.columns.xpix
    }

    pub fn ypix(&self) -> &[f64] {
        &self.columns.ypix
    }

    pub fn energies(&self) -> &[f64] {
        &self.columns.energy
    }

    pub fn channels(&self) -> Option<&[i64]> {
        self.columns.channel.as_deref()
    }

    pub fn into_parts(self) -> (EventColumns, EventParameters) {
        (self.columns, self.parameters)
    }

    /// The (RA, Dec) of every event. Pixel coordinates are deprojected with a
    /// gnomonic projection about the reference pixel; RA increases to lower
    /// x. The result is computed on the first call and cached.
    pub fn to_sky_coordinates(&self) -> &SkyCoordinates {
        self.sky.get_or_init(|| {
            debug!("Deprojecting {} events to sky coordinates", self.num_events());
            let centre = self.parameters.sky_center_radec();
            let [crpix_x, crpix_y] = self.parameters.pix_center;
            let dtheta = self.parameters.dtheta;
            let (ra, dec) = self
                .columns
                .xpix
                .par_iter()
                .zip(self.columns.ypix.par_iter())
                .map(|(&x, &y)| {
                    let xi = (-dtheta * (x - crpix_x)).to_radians();
                    let eta = (dtheta * (y - crpix_y)).to_radians();
                    RADec::from_tangent_plane(xi, eta, centre).to_degrees()
                })
                .unzip();
            SkyCoordinates { ra, dec }
        })
    }

    /// Concatenate the events of two lists. Their parameters must match
    /// exactly.
    pub fn merge(&self, other: &EventList) -> Result<EventList, EventListError> {
        self.merge_with(other, false)
    }

    /// Concatenate the events of two lists. Their detector geometry must
    /// match; if `add_exposure_times` is set, the exposure times may differ
    /// and are summed in the result.
    pub fn merge_with(
        &self,
        other: &EventList,
        add_exposure_times: bool,
    ) -> Result<EventList, EventListError> {
        let parameters = self
            .parameters
            .combine(&other.parameters, add_exposure_times)?;
        let mut columns = self.columns.clone();
        columns.append(&other.columns)?;
        EventList::new(columns, parameters)
    }

    /// Keep only the events inside `region`.
    pub fn filter<R: Region + ?Sized>(&self, region: &R) -> Result<EventList, EventListError> {
        let mask: Vec<bool> = self
            .columns
            .xpix
            .iter()
            .zip(&self.columns.ypix)
            .map(|(&x, &y)| region.contains(x, y))
            .collect();
        if !mask.iter().any(|&m| m) {
            return Err(EventListError::EmptySelection);
        }
        EventList::new(self.columns.select(&mask), self.parameters.clone())
    }

    /// Scatter event positions with a circular Gaussian point-spread function
    /// of width `sigma` \[degrees\].
    pub fn convolve_with_psf<R: Rng + ?Sized>(
        &self,
        sigma: f64,
        rng: &mut R,
    ) -> Result<EventList, EventListError> {
        if !(sigma > 0.0 && sigma.is_finite()) {
            return Err(EventListError::InvalidPsf(sigma));
        }
        let normal = Normal::new(0.0, sigma / self.parameters.dtheta)
            .map_err(|_| EventListError::InvalidPsf(sigma))?;

        let mut columns = self.columns.clone();
        for x in columns.xpix.iter_mut() {
            *x += normal.sample(rng);
        }
        for y in columns.ypix.iter_mut() {
            *y += normal.sample(rng);
        }
        EventList::new(columns, self.parameters.clone())
    }

    /// Give every event a detector channel, assuming a perfectly diagonal
    /// response with the given channel energy bounds.
    pub fn assign_channels(
        &self,
        ebounds: &Ebounds,
        channel_type: ChannelType,
    ) -> Result<EventList, EventListError> {
        let mut columns = self.columns.clone();
        columns.channel = Some(
            columns
                .energy
                .iter()
                .map(|&e| ebounds.channel_for(e))
                .collect(),
        );
        let mut parameters = self.parameters.clone();
        parameters.channel = Some(ebounds.info(channel_type));
        EventList::new(columns, parameters)
    }

    /// The energy flux \[erg/s/cm²\] of the events with energies inside
    /// `[emin, emax]` \[keV\]. The bounds default to the smallest and largest
    /// event energies.
    ///
    /// Only possible when the collecting area is a constant.
    pub fn energy_flux(
        &self,
        emin: Option<f64>,
        emax: Option<f64>,
    ) -> Result<f64, EventListError> {
        let area = match &self.parameters.area {
            Area::Constant(a) => *a,
            Area::Response(name) => {
                return Err(EventListError::UnsupportedConfiguration(format!(
                    "Fluxes need a constant collecting area, but these events were detected with the response '{name}'"
                )))
            }
        };
        let energies = &self.columns.energy;
        let emin = emin.unwrap_or_else(|| energies.iter().copied().fold(f64::INFINITY, f64::min));
        let emax = emax.unwrap_or_else(|| {
            energies
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max)
        });

        let total_energy: f64 = energies
            .iter()
            .filter(|&&e| e >= emin && e <= emax)
            .sum();
        Ok(total_energy * ERG_PER_KEV / self.parameters.exposure_time / area)
    }
}
