// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command-line interface code. More specific options for `photon-sim`
//! subcommands are contained in modules.
//!
//! All booleans in argument structs that can be read from files must have
//! `#[serde(default)]` annotated, and anything that isn't a boolean must be
//! optional. This allows all arguments to be optional *and* usable in an
//! arguments file.
//!
//! Only 3 things should be public in this module: `PhotonSim`,
//! `PhotonSim::run`, and `PhotonSimError`.

#[macro_use]
mod common;
mod error;
mod products;
mod project;

pub use error::PhotonSimError;

use std::path::PathBuf;

use clap::{AppSettings, Args, Parser, Subcommand};
use log::info;

// Add build-time information from the "built" crate.
include!(concat!(env!("OUT_DIR"), "/built.rs"));

#[derive(Debug, Parser)]
#[clap(
    version,
    author,
    about = r#"Synthetic X-ray observations of simulated astrophysical plasmas.
Photon samples are projected onto a sky-plane detector to make event lists,
which can then be merged and binned into images and spectra."#
)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(disable_help_subcommand = true)]
#[clap(infer_subcommands = true)]
#[clap(propagate_version = true)]
#[clap(infer_long_args = true)]
pub struct PhotonSim {
    #[clap(flatten)]
    global_opts: GlobalArgs,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    #[clap(global = true)]
    verbosity: u8,

    /// Only verify that arguments were correctly ingested and print out
    /// high-level information.
    #[clap(long)]
    #[clap(global = true)]
    dry_run: bool,

    /// Save the input arguments into a new TOML file that can be used to
    /// reproduce this run. Only used by `project`.
    #[clap(long)]
    #[clap(global = true)]
    save_toml: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
#[clap(arg_required_else_help = true)]
enum Command {
    #[clap(alias = "observe")]
    #[clap(about = r#"Project a photon sample onto the sky to make an event list.
The sample can be observed along any direction, at a new distance, with a new
collecting area and exposure time."#)]
    Project(project::ProjectArgs),

    Merge(products::MergeArgs),

    Image(products::ImageArgs),

    Spectrum(products::SpectrumArgs),
}

impl PhotonSim {
    pub fn run(self) -> Result<(), PhotonSimError> {
        // Set up logging.
        let GlobalArgs {
            verbosity,
            dry_run,
            save_toml,
        } = self.global_opts;
        setup_logging(verbosity).expect("Failed to initialise logging.");

        // Print the version of photon-sim and its build-time information.
        let sub_command = match &self.command {
            Command::Project(_) => "project",
            Command::Merge(_) => "merge",
            Command::Image(_) => "image",
            Command::Spectrum(_) => "spectrum",
        };
        info!("photon-sim {} {}", sub_command, env!("CARGO_PKG_VERSION"));
        display_build_info();

        macro_rules! merge_save_run {
            ($args:expr) => {{
                let args = $args.merge()?;
                if let Some(toml) = save_toml {
                    use std::{
                        fs::File,
                        io::{BufWriter, Write},
                    };

                    let mut f = BufWriter::new(File::create(toml)?);
                    let toml_str = toml::to_string(&args)?;
                    f.write_all(toml_str.as_bytes())?;
                }
                args.run(dry_run)?;
            }};
        }

        match self.command {
            Command::Project(args) => {
                merge_save_run!(args)
            }

            // Products of event files.
            Command::Merge(args) => args.run(dry_run)?,
            Command::Image(args) => args.run(dry_run)?,
            Command::Spectrum(args) => args.run(dry_run)?,
        }

        info!("photon-sim {} complete.", sub_command);
        Ok(())
    }
}

/// Activate a logger. All log messages are put onto `stdout`. `env_logger`
/// automatically only uses colours and fancy symbols if we're on a tty (e.g. a
/// terminal); piped output will be formatted sensibly. Source code lines are
/// displayed in log messages when verbosity >= 3.
fn setup_logging(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        2 => builder.filter_level(log::LevelFilter::Trace),
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
            builder.format(|buf, record| {
                use std::io::Write;

                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    builder.try_init()
}

/// Write info-level log lines of how this executable was compiled.
fn display_build_info() {
    info!("Compiled {}", BUILT_TIME_UTC);
    info!("    with {}", RUSTC_VERSION);
    info!("");
}
