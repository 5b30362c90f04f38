//! Command line interface

use crate::config::DevConfig;
use crate::doctor;
use crate::packager::{NativePackager, PackagerConfig, PyInstaller};
use crate::pipeline::{BuildOptions, BuildResult, Pipeline};
use crate::progress::{self, ProgressExt};
use crate::{PackError, PackResult};
use clap::error::ErrorKind;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Convert HTML projects to Windows executables
#[derive(Parser, Debug)]
#[command(
    name = "html2exe",
    version,
    about = "Convert HTML projects to Windows executables",
    long_about = "Bundles an HTML file (with the assets next to it) or a directory containing \
index.html into a single windowed executable built by PyInstaller.

Exit code 0 = the executable exists at the output path (or, with --check, would be built).
Exit code 1 = any failure, including invalid arguments."
)]
pub struct Args {
    /// Input HTML file or directory containing index.html
    #[arg(short, long, value_name = "PATH", required_unless_present = "doctor")]
    pub input: Option<PathBuf>,

    /// Output executable path
    #[arg(short, long, value_name = "PATH", required_unless_present = "doctor")]
    pub output: Option<PathBuf>,

    /// Window title (defaults to the input name)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Window width in pixels [default: 1024]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: Option<u32>,

    /// Window height in pixels [default: 768]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub height: Option<u32>,

    /// Validate inputs and show what would be built without building
    #[arg(long, visible_alias = "dry-run")]
    pub check: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Application icon (.ico, .png, .jpg)
    #[arg(long, value_name = "PATH")]
    pub icon: Option<PathBuf>,

    /// PyInstaller command, e.g. "python -m PyInstaller"
    #[arg(long, value_name = "COMMAND", default_value = "pyinstaller")]
    pub pyinstaller: String,

    /// Give up on the packager after this many seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Developer config file [default: ~/.html2exe/config.toml]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the build result as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Check the packager and platform, then exit
    #[arg(long)]
    pub doctor: bool,
}

impl Args {
    /// Packager settings from `--pyinstaller` and `--timeout`
    pub fn packager_config(&self) -> PackagerConfig {
        let mut parts = self.pyinstaller.split_whitespace();
        let program = parts.next().unwrap_or("pyinstaller");
        let prefix: Vec<&str> = parts.collect();

        PackagerConfig::default()
            .with_program(program, &prefix)
            .with_timeout(self.timeout.map(Duration::from_secs))
    }

    /// Build options, taking unset window settings from `config`
    pub fn build_options(&self, config: &DevConfig) -> BuildOptions {
        let mut options = BuildOptions::new()
            .with_size(
                self.width.unwrap_or_else(|| config.window_width()),
                self.height.unwrap_or_else(|| config.window_height()),
            )
            .with_dry_run(self.check)
            .with_debug(config.debug());

        if let Some(ref title) = self.title {
            options = options.with_title(title);
        }
        if let Some(ref icon) = self.icon {
            options = options.with_icon(icon);
        }
        options
    }

    /// Input and output paths of a build
    pub fn build_paths(&self) -> PackResult<(&Path, &Path)> {
        match (self.input.as_deref(), self.output.as_deref()) {
            (Some(input), Some(output)) => Ok((input, output)),
            _ => Err(PackError::Config(
                "--input and --output are required".to_string(),
            )),
        }
    }

    fn dev_config(&self) -> DevConfig {
        match self.config {
            Some(ref path) => DevConfig::load_from(path),
            None => DevConfig::load(),
        }
    }
}

/// Install the tracing subscriber. `RUST_LOG` overrides the default level.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the build described by `args`
pub fn execute(args: &Args) -> PackResult<BuildResult> {
    let (input, output) = args.build_paths()?;
    let dev_config = args.dev_config();
    if let Some(path) = dev_config.path() {
        tracing::debug!("Config file: {}", path.display());
    }
    let options = args.build_options(&dev_config);

    let packager = PyInstaller::new(args.packager_config());
    if args.verbose && !args.check {
        match packager.check_available() {
            Ok(version) => tracing::debug!("Using PyInstaller {}", version),
            Err(e) => tracing::warn!("{}", e),
        }
    }

    let show_spinner = !args.verbose && console::Term::stderr().is_term();
    let pb = if show_spinner {
        progress::spinner(&format!("Packaging {}", input.display()))
    } else {
        progress::hidden()
    };

    let result = Pipeline::with_packager(packager).run(input, output, &options);

    match result {
        Ok(ref r) if r.would_build => {
            pb.finish_success(&format!("Would build {}", r.output_path.display()))
        }
        Ok(ref r) => pb.finish_success(&format!("Built {}", r.output_path.display())),
        Err(_) => pb.finish_error("Build failed"),
    }

    result
}

/// Exit code for an argument parsing outcome: 0 for `--help` and `--version`, 1 otherwise
pub fn usage_exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

/// Single-line error report. Non-input errors point at `--verbose` unless
/// it is already on.
pub fn error_message(err: &PackError, verbose: bool) -> String {
    let text = err.to_string();
    let first = text.lines().next().unwrap_or_default().trim_end_matches(':');
    if !verbose && !err.is_input_error() {
        format!("{} (re-run with --verbose for details)", first)
    } else {
        first.to_string()
    }
}

/// Run `--doctor` and return the process exit code
pub fn run_doctor(args: &Args) -> i32 {
    let packager = PyInstaller::new(args.packager_config());
    let report = doctor::diagnose(&packager, &args.dev_config());

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("{} {}", console::style("Error:").red().bold(), e);
                return 1;
            }
        }
    } else {
        print!("{}", report.render());
    }

    if report.is_ok() {
        0
    } else {
        1
    }
}

/// Run the CLI and return the process exit code
pub fn run(args: &Args) -> i32 {
    if args.doctor {
        return run_doctor(args);
    }

    match execute(args) {
        Ok(result) => {
            if args.json {
                match serde_json::to_string_pretty(&result) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("{} {}", console::style("Error:").red().bold(), e);
                        return 1;
                    }
                }
            }
            0
        }
        Err(e) => {
            eprintln!(
                "{} {}",
                console::style("Error:").red().bold(),
                error_message(&e, args.verbose)
            );
            1
        }
    }
}
