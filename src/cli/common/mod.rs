// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Common things for command-line interfaces, e.g. argument files and help
//! texts.

mod printers;

pub(super) use printers::InfoPrinter;
pub(crate) use printers::{display_warnings, Warn};

use itertools::Itertools;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    constants::DEFAULT_SKY_CENTER_DEG,
    coord::{Axis, XYZ},
    events::SpectrumMode,
};

lazy_static::lazy_static! {
    pub(super) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");

    pub(super) static ref ARG_FILE_HELP: String =
        format!("All arguments may be specified in a file. Any CLI arguments override arguments set in the file. Supported formats: {}", *ARG_FILE_TYPES_COMMA_SEPARATED);

    pub(super) static ref AXIS_HELP: String =
        format!("Project along this principal axis of the simulation volume. Supported axes: {}. Default: z", Axis::iter().join(", "));

    pub(super) static ref SKY_CENTER_HELP: String =
        format!("The RA and Dec of the image centre [degrees]. Default: ({}°, {}°)", DEFAULT_SKY_CENTER_DEG.0, DEFAULT_SKY_CENTER_DEG.1);

    pub(super) static ref SPECTRUM_MODE_HELP: String =
        format!("What to bin events by. Supported modes: {}. Default: energy", SpectrumMode::iter().join(", "));
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub(super) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

macro_rules! unpack_arg_file {
    ($arg_file:expr) => ({
        use std::{fs::File, io::Read, str::FromStr};

        use crate::cli::common::{ArgFileTypes, ARG_FILE_TYPES_COMMA_SEPARATED};

        debug!("Attempting to parse argument file {}", $arg_file.display());

        let mut contents = String::new();
        let arg_file_type = $arg_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());

        match arg_file_type {
            Some(ArgFileTypes::Toml) => {
                debug!("Parsing toml file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match toml::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(PhotonSimError::ArgFile(format!(
                            "Couldn't decode toml structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }
            Some(ArgFileTypes::Json) => {
                debug!("Parsing json file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match serde_json::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(PhotonSimError::ArgFile(format!(
                            "Couldn't decode json structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }

            _ => {
                return Err(PhotonSimError::ArgFile(format!(
                    "Argument file '{:?}' doesn't have a recognised file extension! Valid extensions are: {}", $arg_file, *ARG_FILE_TYPES_COMMA_SEPARATED)
                ))
            }
        }
    });
}

/// Turn three user-supplied numbers into a vector. `None` is returned if there
/// aren't exactly three.
pub(super) fn parse_vec3(values: &[f64]) -> Option<XYZ> {
    match values {
        &[x, y, z] => Some(XYZ::new(x, y, z)),
        _ => None,
    }
}
