// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.


use std::{borrow::Cow, num::NonZeroUsize, path::PathBuf, str::FromStr, sync::Arc};

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{
    display_warnings, parse_vec3, InfoPrinter, Warn, ARG_FILE_HELP, AXIS_HELP, SKY_CENTER_HELP,
};
use crate::{
    coord::{Axis, RADec},
    io::{read_absorption_table, read_arf},
    params::ProjectParams,
    project::{AbsorptionModel, AreaOverride, Distance, LineOfSight, ProjectionParams},
    PhotonSimError,
};

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct ProjectArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    /// Path to the photon file to project.
    #[clap(short, long, help_heading = "INPUT AND OUTPUT")]
    pub(super) photons: Option<PathBuf>,

    /// Path to the event file to write.
    #[clap(short, long, help_heading = "INPUT AND OUTPUT")]
    pub(super) output: Option<PathBuf>,

    /// Overwrite the output file if it already exists.
    #[clap(long, help_heading = "INPUT AND OUTPUT")]
    #[serde(default)]
    pub(super) clobber: bool,

    #[clap(short, long, help = AXIS_HELP.as_str(), help_heading = "LINE OF SIGHT")]
    pub(super) axis: Option<String>,

    /// Project along this direction (x y z) instead of a principal axis.
    #[clap(
        long, help_heading = "LINE OF SIGHT",
        number_of_values = 3,
        allow_hyphen_values = true,
        value_names = &["X", "Y", "Z"]
    )]
    pub(super) normal: Option<Vec<f64>>,

    /// The direction (x y z) that is "up" in the image when projecting along
    /// --normal. If not given, a principal axis is used.
    #[clap(
        long, help_heading = "LINE OF SIGHT",
        number_of_values = 3,
        allow_hyphen_values = true,
        value_names = &["X", "Y", "Z"]
    )]
    pub(super) north: Option<Vec<f64>>,

    /// A constant collecting area [cm²]. Default: the photon sample's area.
    #[clap(long, help_heading = "OBSERVATION")]
    pub(super) area: Option<f64>,

    /// Path to an effective-area table to detect photons with, instead of a
    /// constant area.
    #[clap(long, help_heading = "OBSERVATION")]
    pub(super) arf: Option<PathBuf>,

    /// The exposure time [s]. Default: the photon sample's exposure time.
    #[clap(short, long, help_heading = "OBSERVATION")]
    pub(super) exposure_time: Option<f64>,

    /// Observe the source at this redshift.
    #[clap(short = 'z', long, help_heading = "OBSERVATION")]
    pub(super) redshift: Option<f64>,

    /// Observe a nearby source at this angular-diameter distance [Mpc]. The
    /// source is then treated as having no redshift.
    #[clap(long, help_heading = "OBSERVATION")]
    pub(super) distance: Option<f64>,

    /// Path to an absorption table, e.g. of Galactic absorption.
    #[clap(long, help_heading = "OBSERVATION")]
    pub(super) absorption: Option<PathBuf>,

    /// Don't Doppler shift photon energies by emitter velocities.
    #[clap(long, help_heading = "OBSERVATION")]
    #[serde(default)]
    pub(super) no_shifting: bool,

    #[clap(
        long, help = SKY_CENTER_HELP.as_str(), help_heading = "EVENTS",
        number_of_values = 2,
        allow_hyphen_values = true,
        value_names = &["RA_DEG", "DEC_DEG"]
    )]
    pub(super) sky_center: Option<Vec<f64>>,

    /// Blur event positions with a Gaussian point-spread function of this
    /// width [degrees].
    #[clap(long, help_heading = "EVENTS")]
    pub(super) psf_sigma: Option<f64>,

    /// The number of workers to split the photon sample between. Default: 1
    #[clap(short = 'j', long, help_heading = "RUNTIME")]
    pub(super) num_workers: Option<usize>,

    /// Seed the random number generator so that projections can be
    /// reproduced. Default: a random seed, which is reported.
    #[clap(long, help_heading = "RUNTIME")]
    pub(super) seed: Option<u64>,
}

impl ProjectArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    ///
    /// This function should only ever merge arguments, and not try to make
    /// sense of them.
    pub(super) fn merge(self) -> Result<ProjectArgs, PhotonSimError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Read in the file arguments. Ensure all of the file args are
            // accounted for by pattern matching.
            let ProjectArgs {
                args_file: _,
                photons,
                output,
                clobber,
                axis,
                normal,
                north,
                area,
                arf,
                exposure_time,
                redshift,
                distance,
                absorption,
                no_shifting,
                sky_center,
                psf_sigma,
                num_workers,
                seed,
            } = unpack_arg_file!(arg_file);

            // Merge all the arguments, preferring the CLI args when available.
            Ok(ProjectArgs {
                args_file: None,
                photons: cli_args.photons.or(photons),
                output: cli_args.output.or(output),
                clobber: cli_args.clobber || clobber,
                axis: cli_args.axis.or(axis),
                normal: cli_args.normal.or(normal),
                north: cli_args.north.or(north),
                area: cli_args.area.or(area),
                arf: cli_args.arf.or(arf),
                exposure_time: cli_args.exposure_time.or(exposure_time),
                redshift: cli_args.redshift.or(redshift),
                distance: cli_args.distance.or(distance),
                absorption: cli_args.absorption.or(absorption),
                no_shifting: cli_args.no_shifting || no_shifting,
                sky_center: cli_args.sky_center.or(sky_center),
                psf_sigma: cli_args.psf_sigma.or(psf_sigma),
                num_workers: cli_args.num_workers.or(num_workers),
                seed: cli_args.seed.or(seed),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn parse(self) -> Result<ProjectParams, PhotonSimError> {
        debug!("{:#?}", self);

        let Self {
            args_file: _,
            photons,
            output,
            clobber,
            axis,
            normal,
            north,
            area,
            arf,
            exposure_time,
            redshift,
            distance,
            absorption,
            no_shifting,
            sky_center,
            psf_sigma,
            num_workers,
            seed,
        } = self;

        let photons_file = photons.ok_or(ProjectArgsError::NoPhotons)?;
        let output = output.ok_or(ProjectArgsError::NoOutput)?;
        if output.exists() {
            if clobber {
                format!("{} will be overwritten", output.display()).warn();
            } else {
                return Err(ProjectArgsError::OutputExists(output).into());
            }
        }

        let mut printer = InfoPrinter::new("Projecting photons".into());
        printer.push_block(vec![
            format!("Photons: {}", photons_file.display()).into(),
            format!("Events:  {}", output.display()).into(),
        ]);

        let line_of_sight = match (axis, normal) {
            (Some(_), Some(_)) => return Err(ProjectArgsError::AxisAndNormal.into()),
            (axis, None) => {
                let axis = match axis {
                    Some(a) => Axis::from_str(&a.to_lowercase())
                        .map_err(|_| ProjectArgsError::BadAxis(a))?,
                    None => Axis::Z,
                };
                if north.is_some() {
                    "--north is only used with --normal; ignoring it".warn();
                }
                printer.push_line(format!("Looking along the {axis} axis").into());
                LineOfSight::Axis(axis)
            }
            (None, Some(normal)) => {
                let normal = parse_vec3(&normal).ok_or(ProjectArgsError::NotAVector {
                    arg: "normal",
                    num: normal.len(),
                })?;
                let north = match north {
                    Some(n) => Some(parse_vec3(&n).ok_or(ProjectArgsError::NotAVector {
                        arg: "north",
                        num: n.len(),
                    })?),
                    None => None,
                };
                let mut block: Vec<Cow<'static, str>> = vec![format!(
                    "Looking along ({}, {}, {})",
                    normal.x, normal.y, normal.z
                )
                .into()];
                if let Some(n) = north {
                    block.push(format!("North: ({}, {}, {})", n.x, n.y, n.z).into());
                }
                printer.push_block(block);
                LineOfSight::Direction { normal, north }
            }
        };

        let mut observation: Vec<Cow<'static, str>> = vec![];
        let area = match (area, arf) {
            (Some(_), Some(_)) => return Err(ProjectArgsError::AreaAndArf.into()),
            (Some(a), None) => {
                observation.push(format!("Area: {a} cm²").into());
                Some(AreaOverride::Constant(a))
            }
            (None, Some(arf)) => {
                let response = read_arf(&arf)?;
                observation.push(format!("Effective area: {}", arf.display()).into());
                Some(AreaOverride::Response(Arc::new(response)))
            }
            (None, None) => None,
        };
        if let Some(t) = exposure_time {
            observation.push(format!("Exposure time: {t} s").into());
        }
        let distance = match (redshift, distance) {
            (Some(_), Some(_)) => return Err(ProjectArgsError::RedshiftAndDistance.into()),
            (Some(z), None) => {
                observation.push(format!("Redshift: {z}").into());
                Some(Distance::Redshift(z))
            }
            (None, Some(d)) => {
                observation.push(format!("Angular-diameter distance: {d} Mpc").into());
                Some(Distance::AngularDiameterDistance(d))
            }
            (None, None) => None,
        };
        let absorption = match absorption {
            Some(file) => {
                observation.push(format!("Absorption: {}", file.display()).into());
                let model = read_absorption_table(&file)?;
                Some(Arc::new(model) as Arc<dyn AbsorptionModel>)
            }
            None => None,
        };
        if no_shifting {
            observation.push("Not Doppler shifting".into());
        }
        if observation.is_empty() {
            observation.push("Using the photon sample's observing conditions".into());
        }
        printer.push_block(observation);

        let sky_center = match sky_center {
            Some(radec) => match radec.as_slice() {
                &[ra, dec] => Some(RADec::from_degrees(ra, dec)),
                _ => return Err(ProjectArgsError::BadSkyCenter(radec.len()).into()),
            },
            None => None,
        };

        let num_workers = match num_workers {
            Some(n) => NonZeroUsize::new(n).ok_or(ProjectArgsError::ZeroWorkers)?,
            None => NonZeroUsize::MIN,
        };
        let seed = seed.unwrap_or_else(rand::random);
        printer.push_line(format!("{num_workers} worker(s), random seed {seed}").into());

        printer.display();
        display_warnings();

        Ok(ProjectParams {
            photons_file,
            output,
            clobber,
            projection: ProjectionParams {
                line_of_sight,
                area,
                exposure_time,
                distance,
                absorption,
                sky_center,
                no_shifting,
            },
            psf_sigma,
            num_workers,
            seed,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), PhotonSimError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()?;
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub(super) enum ProjectArgsError {
    #[error("No photon file was specified")]
    NoPhotons,

    #[error("No output event file was specified")]
    NoOutput,

    #[error("{} already exists; use --clobber to overwrite it", .0.display())]
    OutputExists(PathBuf),

    #[error("'{0}' is not a principal axis")]
    BadAxis(String),

    #[error("Projecting along both an axis and a normal vector doesn't make sense; choose one")]
    AxisAndNormal,

    #[error("--{arg} needs 3 values (x y z), but {num} were given")]
    NotAVector { arg: &'static str, num: usize },

    #[error("A constant area and an effective-area table can't both be used")]
    AreaAndArf,

    #[error("A redshift and a distance can't both be used; nearby sources have no redshift")]
    RedshiftAndDistance,

    #[error("--sky-center needs 2 values (RA Dec), but {0} were given")]
    BadSkyCenter(usize),

    #[error("The number of workers must be at least 1")]
    ZeroWorkers,
}
