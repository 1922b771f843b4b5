// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Detector channels.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use super::EventListError;

/// The kind of channels recorded against events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum ChannelType {
    /// Pulse-height amplitude.
    #[serde(rename = "PHA")]
    #[strum(to_string = "PHA", serialize = "pha")]
    Pha,

    /// Pulse-height invariant.
    #[serde(rename = "PI")]
    #[strum(to_string = "PI", serialize = "pi")]
    Pi,
}

/// Describes the channel column of an event list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub channel_type: ChannelType,
    pub num_channels: usize,
    /// The lowest channel number (usually 0 or 1).
    pub first_channel: i64,
}

/// The energy bounds of consecutive detector channels, as found in the
/// EBOUNDS table of a response matrix. All energies are in keV.
#[derive(Debug, Clone, PartialEq)]
pub struct Ebounds {
    channels: Vec<i64>,
    e_min: Vec<f64>,
    e_max: Vec<f64>,
}

impl Ebounds {
    pub fn new(
        channels: Vec<i64>,
        e_min: Vec<f64>,
        e_max: Vec<f64>,
    ) -> Result<Ebounds, EventListError> {
        if channels.is_empty() {
            return Err(EventListError::InvalidEbounds("there are no channels"));
        }
        if channels.len() != e_min.len() || channels.len() != e_max.len() {
            return Err(EventListError::InvalidEbounds(
                "the channel and energy columns have different lengths",
            ));
        }
        if channels.windows(2).any(|w| w[1] != w[0] + 1) {
            return Err(EventListError::InvalidEbounds("channels must be consecutive"));
        }
        if e_min.iter().zip(&e_max).any(|(lo, hi)| !(lo < hi)) {
            return Err(EventListError::InvalidEbounds(
                "each channel's lower energy must be below its upper energy",
            ));
        }
        if e_min.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(EventListError::InvalidEbounds("channel energies must increase"));
        }
        Ok(Ebounds {
            channels,
            e_min,
            e_max,
        })
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn first_channel(&self) -> i64 {
        self.channels[0]
    }

    /// The channel an energy lands in, assuming a perfectly diagonal
    /// response. Energies below (above) the bounds go to the first (last)
    /// channel.
    pub fn channel_for(&self, energy: f64) -> i64 {
        let i = self.e_min.partition_point(|&e| e <= energy);
        self.channels[i.saturating_sub(1)]
    }

    pub(super) fn info(&self, channel_type: ChannelType) -> ChannelInfo {
        ChannelInfo {
            channel_type,
            num_channels: self.len(),
            first_channel: self.first_channel(),
        }
    }
}
