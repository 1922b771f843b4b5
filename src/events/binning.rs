// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Binning events into images and spectra.

use log::info;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use super::{ChannelType, EventList, EventListError};

/// How to bin a spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SpectrumMode {
    /// Use the events' detector channels. Falls back to [`SpectrumMode::Pi`]
    /// if channels haven't been assigned.
    Channel,

    /// Bin on observed energy.
    Energy,

    /// Bin on observed energy, labelling bins as PI channels starting from 1.
    Pi,
}

/// What the bins of a [`Spectrum`] are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SpectrumContent {
    Pha,
    Pi,
    Energy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    pub content: SpectrumContent,

    /// Channel numbers.
    pub channels: Vec<i64>,

    /// The value each bin represents; bin-centre energies \[keV\] for energy
    /// spectra, otherwise the channel numbers.
    pub bins: Vec<f64>,

    pub counts: Vec<u64>,

    /// \[s\]
    pub exposure_time: f64,
}

impl Spectrum {
    /// Counts per second in each bin.
    pub fn count_rate(&self) -> Vec<f64> {
        self.counts
            .iter()
            .map(|&c| c as f64 / self.exposure_time)
            .collect()
    }

    pub fn total_counts(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// The 0-indexed bin of a 1-indexed pixel coordinate on an axis of `n`
/// pixels. Bin edges are at 0.5, 1.5, ..., n + 0.5; the last edge is
/// inclusive.
fn pixel_bin(p: f64, n: usize) -> Option<usize> {
    if n == 0 || !(p >= 0.5 && p <= n as f64 + 0.5) {
        return None;
    }
    Some(((p - 0.5).floor() as usize).min(n - 1))
}

/// Histogram `values` into `nbins` equal bins spanning `[lo, hi]`. The last
/// bin includes `hi`; values outside the range are ignored.
fn histogram(values: &[f64], lo: f64, hi: f64, nbins: usize) -> Vec<u64> {
    let mut counts = vec![0; nbins];
    let scale = nbins as f64 / (hi - lo);
    for &v in values {
        if !(v >= lo && v <= hi) {
            continue;
        }
        let bin = (((v - lo) * scale) as usize).min(nbins - 1);
        counts[bin] += 1;
    }
    counts
}

impl EventList {
    /// Bin events into a `(2·pix_center − 1)²` image, indexed `[y, x]`.
    /// Events outside the image are dropped. If given, only events with
    /// energies strictly between `emin` and `emax` \[keV\] are used.
    pub fn bin_image(&self, emin: Option<f64>, emax: Option<f64>) -> Array2<u64> {
        let [cx, cy] = self.parameters.pix_center;
        let nx = (2.0 * cx - 1.0).round().max(0.0) as usize;
        let ny = (2.0 * cy - 1.0).round().max(0.0) as usize;
        let mut image = Array2::zeros((ny, nx));

        for ((&x, &y), &e) in self
            .xpix()
            .iter()
            .zip(self.ypix())
            .zip(self.energies())
        {
            if emin.map_or(false, |lo| e <= lo) || emax.map_or(false, |hi| e >= hi) {
                continue;
            }
            if let (Some(ix), Some(iy)) = (pixel_bin(x, nx), pixel_bin(y, ny)) {
                image[(iy, ix)] += 1;
            }
        }
        image
    }

    /// Bin events into a spectrum. Energy and PI spectra have `nbins` bins
    /// over `[emin, emax]` \[keV\]; channel spectra use the channels assigned
    /// to the events and ignore the other arguments.
    pub fn bin_spectrum(
        &self,
        mode: SpectrumMode,
        emin: f64,
        emax: f64,
        nbins: usize,
    ) -> Result<Spectrum, EventListError> {
        let exposure_time = self.parameters.exposure_time;

        if mode == SpectrumMode::Channel {
            if let (Some(info), Some(channels)) = (self.parameters.channel, self.channels()) {
                let mut counts = vec![0; info.num_channels];
                for &c in channels {
                    let i = c - info.first_channel;
                    if i >= 0 && (i as usize) < info.num_channels {
                        counts[i as usize] += 1;
                    }
                }
                let channels: Vec<i64> = (0..info.num_channels as i64)
                    .map(|i| i + info.first_channel)
                    .collect();
                return Ok(Spectrum {
                    content: match info.channel_type {
                        ChannelType::Pha => SpectrumContent::Pha,
                        ChannelType::Pi => SpectrumContent::Pi,
                    },
                    bins: channels.iter().map(|&c| c as f64).collect(),
                    channels,
                    counts,
                    exposure_time,
                });
            }
            info!(
                "Events haven't been assigned channels, so assuming a perfect response and {nbins} PI channels"
            );
        }

        if nbins == 0 {
            return Err(EventListError::InvalidBinning(
                "there must be at least one bin".to_string(),
            ));
        }
        if !(emin < emax && emin.is_finite() && emax.is_finite()) {
            return Err(EventListError::InvalidBinning(format!(
                "the energy range [{emin}, {emax}] keV is empty"
            )));
        }

        let counts = histogram(self.energies(), emin, emax, nbins);
        let channels: Vec<i64> = (1..=nbins as i64).collect();
        let (content, bins) = if mode == SpectrumMode::Energy {
            let width = (emax - emin) / nbins as f64;
            let centres = (0..nbins)
                .map(|i| emin + (i as f64 + 0.5) * width)
                .collect();
            (SpectrumContent::Energy, centres)
        } else {
            (
                SpectrumContent::Pi,
                channels.iter().map(|&c| c as f64).collect(),
            )
        };
        Ok(Spectrum {
            content,
            channels,
            bins,
            counts,
            exposure_time,
        })
    }
}
