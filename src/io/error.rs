// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with reading and writing files.

use thiserror::Error;

use super::FileKind;
use crate::{events::EventListError, photons::PhotonSampleError, project::AttenuationError};

#[derive(Error, Debug)]
pub enum IoError {
    #[error("{file} already exists; refusing to overwrite it without clobbering")]
    FileExists { file: String },

    #[error("{file} contains {found}, but {expected} were expected")]
    WrongContents {
        file: String,
        expected: FileKind,
        found: FileKind,
    },

    #[error("Couldn't decode {file}: {err}")]
    Decode {
        file: String,
        err: serde_json::Error,
    },

    #[error("Couldn't encode {file}: {err}")]
    Encode {
        file: String,
        err: serde_json::Error,
    },

    #[error("No files were given to merge")]
    NothingToMerge,

    #[error("Couldn't merge {file}: {err}")]
    Merge { file: String, err: String },

    #[error("{file}: {err}")]
    PhotonSample {
        file: String,
        err: PhotonSampleError,
    },

    #[error("{file}: {err}")]
    EventList { file: String, err: EventListError },

    #[error("{file}: {err}")]
    Table {
        file: String,
        err: AttenuationError,
    },

    #[error("{file}: {err}")]
    IO { file: String, err: std::io::Error },
}
