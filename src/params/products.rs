// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Things made from photon and event files: merged files, images and spectra.

use std::path::PathBuf;

use log::{debug, info};
use thiserror::Error;

use crate::{
    events::{ChannelType, EventListError, Spectrum, SpectrumMode},
    io::{
        merge_files, read_ebounds, read_event_list, write_image, write_spectrum, FileKind,
        IoError,
    },
};

pub(crate) struct MergeParams {
    pub(crate) inputs: Vec<PathBuf>,
    pub(crate) output: PathBuf,
    pub(crate) clobber: bool,
    pub(crate) add_exposure_times: bool,
}

impl MergeParams {
    pub(crate) fn run(&self) -> Result<FileKind, ProductsError> {
        let kind = merge_files(
            &self.inputs,
            &self.output,
            self.clobber,
            self.add_exposure_times,
        )?;
        info!("Wrote merged {kind} to {}", self.output.display());
        Ok(kind)
    }
}

pub(crate) struct ImageParams {
    pub(crate) events_file: PathBuf,
    pub(crate) output: PathBuf,
    pub(crate) clobber: bool,
    /// \[keV\]
    pub(crate) emin: Option<f64>,
    /// \[keV\]
    pub(crate) emax: Option<f64>,
}

impl ImageParams {
    pub(crate) fn run(&self) -> Result<u64, ProductsError> {
        let events = read_event_list(&self.events_file)?;
        let image = events.bin_image(self.emin, self.emax);
        let total = image.sum();
        debug!("Image shape: {:?}", image.dim());
        write_image(&self.output, &image, events.parameters(), self.clobber)?;
        info!(
            "Binned {total} of {} events into {}",
            events.num_events(),
            self.output.display()
        );
        Ok(total)
    }
}

pub(crate) struct SpectrumParams {
    pub(crate) events_file: PathBuf,
    pub(crate) output: PathBuf,
    pub(crate) clobber: bool,
    pub(crate) mode: SpectrumMode,
    /// \[keV\]
    pub(crate) emin: f64,
    /// \[keV\]
    pub(crate) emax: f64,
    pub(crate) nbins: usize,

    /// Assign channels from these channel energy bounds before binning.
    pub(crate) ebounds: Option<(PathBuf, ChannelType)>,
}

impl SpectrumParams {
    pub(crate) fn run(&self) -> Result<Spectrum, ProductsError> {
        let mut events = read_event_list(&self.events_file)?;
        if let Some((file, channel_type)) = &self.ebounds {
            let ebounds = read_ebounds(file)?;
            info!(
                "Assigning {channel_type} channels {}..={}",
                ebounds.first_channel(),
                ebounds.first_channel() + ebounds.len() as i64 - 1
            );
            events = events.assign_channels(&ebounds, *channel_type)?;
        }

        match events.energy_flux(Some(self.emin), Some(self.emax)) {
            Ok(flux) => info!(
                "Energy flux in {}-{} keV: {flux:e} erg/s/cm²",
                self.emin, self.emax
            ),
            Err(e) => debug!("Not reporting an energy flux: {e}"),
        }

        let spectrum = events.bin_spectrum(self.mode, self.emin, self.emax, self.nbins)?;
        write_spectrum(&self.output, &spectrum, self.clobber)?;
        info!(
            "Wrote a spectrum of {} counts in {} bins to {}",
            spectrum.total_counts(),
            spectrum.counts.len(),
            self.output.display()
        );
        Ok(spectrum)
    }
}

#[derive(Error, Debug)]
pub(crate) enum ProductsError {
    #[error(transparent)]
    EventList(#[from] EventListError),

    #[error(transparent)]
    Io(#[from] IoError),
}
