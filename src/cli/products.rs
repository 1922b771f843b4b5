// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Utilities that work on photon and event files after they've been made.

use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use log::info;
use thiserror::Error;

use super::common::{display_warnings, InfoPrinter, Warn, SPECTRUM_MODE_HELP};
use crate::{
    events::{ChannelType, SpectrumMode},
    params::{ImageParams, MergeParams, SpectrumParams},
    PhotonSimError,
};

const DEFAULT_SPECTRUM_EMIN: f64 = 0.1;
const DEFAULT_SPECTRUM_EMAX: f64 = 10.0;
const DEFAULT_SPECTRUM_NBINS: usize = 1000;

lazy_static::lazy_static! {
    static ref SPECTRUM_EMIN_HELP: String =
        format!("The lower energy bound of the spectrum [keV]. Default: {DEFAULT_SPECTRUM_EMIN}");

    static ref SPECTRUM_EMAX_HELP: String =
        format!("The upper energy bound of the spectrum [keV]. Default: {DEFAULT_SPECTRUM_EMAX}");

    static ref SPECTRUM_NBINS_HELP: String =
        format!("The number of spectral bins. Not used when binning on assigned channels. Default: {DEFAULT_SPECTRUM_NBINS}");
}

/// Merge photon files or event files into a single file.
///
/// All of the files must contain the same kind of data, and their parameters
/// must agree.
#[derive(Parser, Debug)]
pub(super) struct MergeArgs {
    /// Paths to the files to be merged.
    #[clap(name = "INPUTS", parse(from_os_str), required = true)]
    inputs: Vec<PathBuf>,

    /// Path to the merged file.
    #[clap(short, long, parse(from_os_str))]
    output: PathBuf,

    /// Allow the exposure times of the inputs to differ; the merged file's
    /// exposure time is their sum.
    #[clap(long)]
    add_exposure_times: bool,

    /// Overwrite the output file if it already exists.
    #[clap(long)]
    clobber: bool,
}

impl MergeArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), PhotonSimError> {
        let Self {
            inputs,
            output,
            add_exposure_times,
            clobber,
        } = self;

        let mut printer = InfoPrinter::new("Merging files".into());
        printer.push_block(
            inputs
                .iter()
                .map(|i| i.display().to_string().into())
                .collect(),
        );
        printer.push_line(format!("into {}", output.display()).into());
        if add_exposure_times {
            printer.push_line("Exposure times will be summed".into());
        }
        printer.display();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        MergeParams {
            inputs,
            output,
            clobber,
            add_exposure_times,
        }
        .run()?;
        Ok(())
    }
}

/// Bin the events of an event file into an image.
#[derive(Parser, Debug)]
pub(super) struct ImageArgs {
    /// Path to the event file.
    #[clap(name = "EVENTS", parse(from_os_str))]
    events: PathBuf,

    /// Path to the image file to write.
    #[clap(short, long, parse(from_os_str))]
    output: PathBuf,

    /// Only use events with energies above this [keV].
    #[clap(long)]
    emin: Option<f64>,

    /// Only use events with energies below this [keV].
    #[clap(long)]
    emax: Option<f64>,

    /// Overwrite the output file if it already exists.
    #[clap(long)]
    clobber: bool,
}

impl ImageArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), PhotonSimError> {
        let Self {
            events,
            output,
            emin,
            emax,
            clobber,
        } = self;
        if let (Some(lo), Some(hi)) = (emin, emax) {
            if lo >= hi {
                return Err(ProductsArgsError::BadEnergyRange { emin: lo, emax: hi }.into());
            }
        }

        let mut printer = InfoPrinter::new("Binning an image".into());
        printer.push_block(vec![
            format!("Events: {}", events.display()).into(),
            format!("Image:  {}", output.display()).into(),
        ]);
        match (emin, emax) {
            (None, None) => (),
            (lo, hi) => printer.push_line(
                format!(
                    "Energies between {} and {} keV",
                    lo.map(|e| e.to_string()).unwrap_or_else(|| "0".into()),
                    hi.map(|e| e.to_string()).unwrap_or_else(|| "∞".into())
                )
                .into(),
            ),
        }
        printer.display();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        ImageParams {
            events_file: events,
            output,
            clobber,
            emin,
            emax,
        }
        .run()?;
        Ok(())
    }
}

/// Bin the events of an event file into a spectrum.
#[derive(Parser, Debug)]
pub(super) struct SpectrumArgs {
    /// Path to the event file.
    #[clap(name = "EVENTS", parse(from_os_str))]
    events: PathBuf,

    /// Path to the spectrum file to write.
    #[clap(short, long, parse(from_os_str))]
    output: PathBuf,

    #[clap(short, long, help = SPECTRUM_MODE_HELP.as_str())]
    mode: Option<String>,

    #[clap(long, help = SPECTRUM_EMIN_HELP.as_str())]
    emin: Option<f64>,

    #[clap(long, help = SPECTRUM_EMAX_HELP.as_str())]
    emax: Option<f64>,

    #[clap(short, long, help = SPECTRUM_NBINS_HELP.as_str())]
    nbins: Option<usize>,

    /// Path to a table of channel energy bounds. If given, events are assigned
    /// channels from it before binning.
    #[clap(long, parse(from_os_str))]
    ebounds: Option<PathBuf>,

    /// The type of the channels assigned with --ebounds (PHA or PI).
    /// Default: PI
    #[clap(long)]
    channel_type: Option<String>,

    /// Overwrite the output file if it already exists.
    #[clap(long)]
    clobber: bool,
}

impl SpectrumArgs {
    fn parse(self) -> Result<SpectrumParams, ProductsArgsError> {
        let Self {
            events,
            output,
            mode,
            emin,
            emax,
            nbins,
            ebounds,
            channel_type,
            clobber,
        } = self;

        let mode = match mode {
            Some(m) => SpectrumMode::from_str(&m.to_lowercase())
                .map_err(|_| ProductsArgsError::BadSpectrumMode(m))?,
            None => SpectrumMode::Energy,
        };
        let emin = emin.unwrap_or(DEFAULT_SPECTRUM_EMIN);
        let emax = emax.unwrap_or(DEFAULT_SPECTRUM_EMAX);
        if emin >= emax {
            return Err(ProductsArgsError::BadEnergyRange { emin, emax });
        }
        let nbins = nbins.unwrap_or(DEFAULT_SPECTRUM_NBINS);
        if nbins == 0 {
            return Err(ProductsArgsError::ZeroBins);
        }
        let channel_type = match channel_type {
            Some(c) => {
                ChannelType::from_str(&c).map_err(|_| ProductsArgsError::BadChannelType(c))?
            }
            None => ChannelType::Pi,
        };
        if ebounds.is_none() && mode == SpectrumMode::Channel {
            "No --ebounds were given; events without channels are binned as PI channels".warn();
        }

        let mut printer = InfoPrinter::new("Binning a spectrum".into());
        printer.push_block(vec![
            format!("Events:   {}", events.display()).into(),
            format!("Spectrum: {}", output.display()).into(),
        ]);
        let mut block = vec![format!("Binning on {mode} from {emin} to {emax} keV").into()];
        if let Some(e) = &ebounds {
            block.push(format!("{channel_type} channels from {}", e.display()).into());
        } else {
            block.push(format!("{nbins} bins").into());
        }
        printer.push_block(block);
        printer.display();
        display_warnings();

        Ok(SpectrumParams {
            events_file: events,
            output,
            clobber,
            mode,
            emin,
            emax,
            nbins,
            ebounds: ebounds.map(|e| (e, channel_type)),
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), PhotonSimError> {
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()?;
        Ok(())
    }
}

#[derive(Error, Debug)]
pub(super) enum ProductsArgsError {
    #[error("'{0}' is not a spectrum mode")]
    BadSpectrumMode(String),

    #[error("'{0}' is not a channel type; use PHA or PI")]
    BadChannelType(String),

    #[error("The energy range {emin}-{emax} keV is empty")]
    BadEnergyRange { emin: f64, emax: f64 },

    #[error("A spectrum needs at least one bin")]
    ZeroBins,
}
