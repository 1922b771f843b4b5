// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Reading and writing files.

Photon samples and event lists are stored as JSON documents with a `kind`
tag, a `parameters` group and a `data` group:

```json
{"kind": "photons", "parameters": {...}, "data": {"positions": [...], ...}}
{"kind": "events", "parameters": {...}, "data": {"xpix": [...], "ra": [...], ...}}
```

Event files also carry the sky coordinates of their events, but these are
derived and are ignored on reading. Spectra and images are written in the same
manner. Effective areas, channel bounds and absorption curves are read from
JSON tables.
 */

mod error;

pub use error::IoError;

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    num::NonZeroUsize,
    path::Path,
};

use log::{debug, info, trace};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::{
    events::{Ebounds, EventColumns, EventList, EventParameters, Spectrum},
    photons::{FiducialParameters, PhotonColumns, PhotonSample},
    project::{AuxiliaryResponse, TableAbsorption, TabulatedCurve},
};

/// The kinds of container this module reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FileKind {
    #[strum(serialize = "photons")]
    Photons,
    #[strum(serialize = "events")]
    Events,
    #[strum(serialize = "a spectrum")]
    Spectrum,
    #[strum(serialize = "an image")]
    Image,
}

#[derive(Deserialize)]
struct EventData {
    #[serde(flatten)]
    columns: EventColumns,
}

#[derive(Serialize)]
struct EventDataRef<'a> {
    #[serde(flatten)]
    columns: &'a EventColumns,
    ra: &'a [f64],
    dec: &'a [f64],
}

/// What's read from a file.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Container {
    Photons {
        parameters: FiducialParameters,
        data: PhotonColumns,
    },
    Events {
        parameters: EventParameters,
        data: EventData,
    },
    Spectrum {
        data: Spectrum,
    },
    Image {
        parameters: EventParameters,
        data: Array2<u64>,
    },
}

impl Container {
    fn kind(&self) -> FileKind {
        match self {
            Container::Photons { .. } => FileKind::Photons,
            Container::Events { .. } => FileKind::Events,
            Container::Spectrum { .. } => FileKind::Spectrum,
            Container::Image { .. } => FileKind::Image,
        }
    }
}

/// What's written to a file. Borrows instead of owning.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum ContainerRef<'a> {
    Photons {
        parameters: &'a FiducialParameters,
        data: &'a PhotonColumns,
    },
    Events {
        parameters: &'a EventParameters,
        data: EventDataRef<'a>,
    },
    Spectrum {
        data: &'a Spectrum,
    },
    Image {
        parameters: &'a EventParameters,
        data: &'a Array2<u64>,
    },
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, IoError> {
    trace!("Reading {}", path.display());
    let file = File::open(path).map_err(|err| IoError::IO {
        file: display(path),
        err,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|err| IoError::Decode {
        file: display(path),
        err,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T, clobber: bool) -> Result<(), IoError> {
    if path.exists() && !clobber {
        return Err(IoError::FileExists {
            file: display(path),
        });
    }
    trace!("Writing {}", path.display());
    let file = File::create(path).map_err(|err| IoError::IO {
        file: display(path),
        err,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|err| IoError::Encode {
        file: display(path),
        err,
    })?;
    writer.flush().map_err(|err| IoError::IO {
        file: display(path),
        err,
    })
}

fn read_container(path: &Path) -> Result<Container, IoError> {
    read_json(path)
}

fn wrong_contents(path: &Path, expected: FileKind, found: FileKind) -> IoError {
    IoError::WrongContents {
        file: display(path),
        expected,
        found,
    }
}

pub fn write_photon_sample(
    path: &Path,
    sample: &PhotonSample,
    clobber: bool,
) -> Result<(), IoError> {
    write_json(
        path,
        &ContainerRef::Photons {
            parameters: sample.fiducial(),
            data: sample.columns(),
        },
        clobber,
    )?;
    debug!(
        "Wrote {} photons from {} emitters to {}",
        sample.num_photons(),
        sample.num_emitters(),
        path.display()
    );
    Ok(())
}

pub fn read_photon_sample(path: &Path) -> Result<PhotonSample, IoError> {
    match read_container(path)? {
        Container::Photons { parameters, data } => {
            PhotonSample::new(data, parameters).map_err(|err| IoError::PhotonSample {
                file: display(path),
                err,
            })
        }
        other => Err(wrong_contents(path, FileKind::Photons, other.kind())),
    }
}

/// Read the `rank`-th of `size` partitions of the photon sample in `path`.
/// See [`PhotonSample::partition`].
pub fn read_photon_sample_partition(
    path: &Path,
    rank: usize,
    size: NonZeroUsize,
) -> Result<PhotonSample, IoError> {
    let sample = read_photon_sample(path)?;
    sample
        .partition(rank, size)
        .map_err(|err| IoError::PhotonSample {
            file: display(path),
            err,
        })
}

/// Write an event list along with the sky coordinates of its events.
pub fn write_event_list(path: &Path, events: &EventList, clobber: bool) -> Result<(), IoError> {
    let sky = events.to_sky_coordinates();
    write_json(
        path,
        &ContainerRef::Events {
            parameters: events.parameters(),
            data: EventDataRef {
                columns: events.columns(),
                ra: &sky.ra,
                dec: &sky.dec,
            },
        },
        clobber,
    )?;
    debug!("Wrote {} events to {}", events.num_events(), path.display());
    Ok(())
}

pub fn read_event_list(path: &Path) -> Result<EventList, IoError> {
    match read_container(path)? {
        Container::Events { parameters, data } => {
            EventList::new(data.columns, parameters).map_err(|err| IoError::EventList {
                file: display(path),
                err,
            })
        }
        other => Err(wrong_contents(path, FileKind::Events, other.kind())),
    }
}

pub fn write_spectrum(path: &Path, spectrum: &Spectrum, clobber: bool) -> Result<(), IoError> {
    write_json(path, &ContainerRef::Spectrum { data: spectrum }, clobber)
}

pub fn read_spectrum(path: &Path) -> Result<Spectrum, IoError> {
    match read_container(path)? {
        Container::Spectrum { data } => Ok(data),
        other => Err(wrong_contents(path, FileKind::Spectrum, other.kind())),
    }
}

/// Write an image binned from an event list, with the list's parameters so
/// that the image can be placed on the sky.
pub fn write_image(
    path: &Path,
    image: &Array2<u64>,
    parameters: &EventParameters,
    clobber: bool,
) -> Result<(), IoError> {
    write_json(
        path,
        &ContainerRef::Image {
            parameters,
            data: image,
        },
        clobber,
    )
}

pub fn read_image(path: &Path) -> Result<(Array2<u64>, EventParameters), IoError> {
    match read_container(path)? {
        Container::Image { parameters, data } => Ok((data, parameters)),
        other => Err(wrong_contents(path, FileKind::Image, other.kind())),
    }
}

/// Merge photon or event files into `output`. All inputs must hold the same
/// kind of data, and their parameters must agree, except for their exposure
/// times which are summed if `add_exposure_times` is set. Returns the kind of
/// the merged files.
pub fn merge_files<P: AsRef<Path>>(
    inputs: &[P],
    output: &Path,
    clobber: bool,
    add_exposure_times: bool,
) -> Result<FileKind, IoError> {
    let (first, rest) = inputs.split_first().ok_or(IoError::NothingToMerge)?;
    let first = first.as_ref();
    // Fail before doing any work.
    if output.exists() && !clobber {
        return Err(IoError::FileExists {
            file: display(output),
        });
    }

    let container = read_container(first)?;
    let kind = container.kind();
    info!("Merging {} {kind} files into {}", inputs.len(), output.display());
    match container {
        Container::Photons { parameters, data } => {
            let mut merged =
                PhotonSample::new(data, parameters).map_err(|err| IoError::PhotonSample {
                    file: display(first),
                    err,
                })?;
            for input in rest {
                let input = input.as_ref();
                let sample = read_photon_sample(input)?;
                merged = merged
                    .merge(&sample, add_exposure_times)
                    .map_err(|err| IoError::Merge {
                        file: display(input),
                        err: err.to_string(),
                    })?;
            }
            write_photon_sample(output, &merged, clobber)?;
        }

        Container::Events { parameters, data } => {
            let mut merged =
                EventList::new(data.columns, parameters).map_err(|err| IoError::EventList {
                    file: display(first),
                    err,
                })?;
            for input in rest {
                let input = input.as_ref();
                let events = read_event_list(input)?;
                merged = merged
                    .merge_with(&events, add_exposure_times)
                    .map_err(|err| IoError::Merge {
                        file: display(input),
                        err: err.to_string(),
                    })?;
            }
            write_event_list(output, &merged, clobber)?;
        }

        Container::Spectrum { .. } | Container::Image { .. } => {
            return Err(IoError::Merge {
                file: display(first),
                err: format!("only photon and event files can be merged, not {kind}"),
            })
        }
    }
    Ok(kind)
}

#[derive(Debug, Serialize, Deserialize)]
struct ArfTable {
    energ_lo: Vec<f64>,
    energ_hi: Vec<f64>,
    /// \[cm²\]
    specresp: Vec<f64>,
    #[serde(default)]
    rmf: Option<String>,
}

/// The name a table is referred to by: its file name.
fn table_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| display(path))
}

/// Read an effective-area table with `energ_lo` and `energ_hi` bin bounds
/// \[keV\], `specresp` areas \[cm²\] and optionally the name of a response
/// matrix.
pub fn read_arf(path: &Path) -> Result<AuxiliaryResponse, IoError> {
    let table: ArfTable = read_json(path)?;
    AuxiliaryResponse::new(
        table_name(path),
        &table.energ_lo,
        &table.energ_hi,
        table.specresp,
        table.rmf,
    )
    .map_err(|err| IoError::Table {
        file: display(path),
        err,
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct EboundsTable {
    channel: Vec<i64>,
    e_min: Vec<f64>,
    e_max: Vec<f64>,
}

/// Read the channel energy bounds \[keV\] of a response matrix.
pub fn read_ebounds(path: &Path) -> Result<Ebounds, IoError> {
    let table: EboundsTable = read_json(path)?;
    Ebounds::new(table.channel, table.e_min, table.e_max).map_err(|err| IoError::EventList {
        file: display(path),
        err,
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct AbsorptionTable {
    /// \[keV\]
    energy: Vec<f64>,
    /// The fraction of photons transmitted at each energy.
    transmission: Vec<f64>,
}

/// Read an absorption curve tabulated as `energy` \[keV\] against
/// `transmission`.
pub fn read_absorption_table(path: &Path) -> Result<TableAbsorption, IoError> {
    let table: AbsorptionTable = read_json(path)?;
    let curve =
        TabulatedCurve::new(table.energy, table.transmission).map_err(|err| IoError::Table {
            file: display(path),
            err,
        })?;
    Ok(TableAbsorption::new(table_name(path), curve))
}
