//! Native packager integration
//!
//! The shell and the asset bundle are handed to an external single-file
//! packager. [`PyInstaller`] is the implementation used by the CLI; anything
//! that implements [`NativePackager`] can stand in for it.

use crate::pipeline::BuildResult;
use crate::{PackError, PackResult};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Interval between exit checks while a timeout is armed
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Packager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagerConfig {
    /// Program to run (or "pyinstaller" to use from PATH)
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments placed before the generated ones, e.g. `["-m", "PyInstaller"]`
    /// when `program` is a Python interpreter
    #[serde(default)]
    pub prefix_args: Vec<String>,

    /// Kill the packager after this many seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_program() -> String {
    "pyinstaller".to_string()
}

impl Default for PackagerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            prefix_args: Vec::new(),
            timeout_secs: None,
        }
    }
}

impl PackagerConfig {
    /// Use `program` with `prefix_args` in front of the generated arguments
    pub fn with_program(mut self, program: impl Into<String>, prefix_args: &[&str]) -> Self {
        self.program = program.into();
        self.prefix_args = prefix_args.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout_secs = timeout.map(|t| t.as_secs().max(1));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Auxiliary data directory attached to the executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataMapping {
    /// Directory on disk
    pub source: PathBuf,
    /// Logical name the packaged program reads it under
    pub target: String,
}

/// Everything the packager needs for one build
#[derive(Debug, Clone)]
pub struct PackageRequest {
    /// Program entry point (the viewer shell)
    pub entry_script: PathBuf,
    /// Data directories to attach
    pub data_dirs: Vec<DataMapping>,
    /// Directory the executable is written to
    pub dist_dir: PathBuf,
    /// Executable base name, without extension
    pub name: String,
    /// Scratch directory for intermediate build state
    pub work_dir: PathBuf,
    /// Directory for the generated spec file
    pub spec_dir: PathBuf,
    /// Optional `.ico` to embed
    pub icon: Option<PathBuf>,
    /// Produce a single file instead of a directory
    pub onefile: bool,
    /// No console window
    pub windowed: bool,
    /// Discard cached build state first
    pub clean: bool,
}

impl PackageRequest {
    /// Create a single-file, windowed, clean build request
    pub fn new(
        entry_script: impl Into<PathBuf>,
        dist_dir: impl Into<PathBuf>,
        name: impl Into<String>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        let work_dir = work_dir.into();
        Self {
            entry_script: entry_script.into(),
            data_dirs: Vec::new(),
            dist_dir: dist_dir.into(),
            name: name.into(),
            spec_dir: work_dir.clone(),
            work_dir,
            icon: None,
            onefile: true,
            windowed: true,
            clean: true,
        }
    }

    /// Attach `source` under the logical name `target`
    pub fn add_data(mut self, source: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        self.data_dirs.push(DataMapping {
            source: source.into(),
            target: target.into(),
        });
        self
    }

    /// Put the generated spec file in `dir`
    pub fn spec_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spec_dir = dir.into();
        self
    }

    /// Embed an icon
    pub fn icon(mut self, icon: impl Into<PathBuf>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Path the packager writes the executable to
    pub fn expected_output(&self) -> PathBuf {
        self.dist_dir
            .join(format!("{}{}", self.name, std::env::consts::EXE_SUFFIX))
    }
}

/// Exit status and captured output of a packager run
#[derive(Debug, Clone, Default)]
pub struct PackagerOutput {
    pub success: bool,
    /// Exit code, if the process exited normally
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// The process was killed after the configured timeout
    pub timed_out: bool,
}

impl PackagerOutput {
    /// stdout and stderr joined for error reports
    pub fn combined(&self) -> String {
        let mut text = String::new();
        for part in [self.stdout.trim_end(), self.stderr.trim_end()] {
            if part.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(part);
        }
        text
    }
}

/// External single-file packager
pub trait NativePackager {
    /// Display name used in logs and errors
    fn name(&self) -> &str;

    /// Check that the packager can be run and return its version
    fn check_available(&self) -> PackResult<String>;

    /// Run one build
    fn package(&self, request: &PackageRequest) -> PackResult<PackagerOutput>;
}

/// PyInstaller driven through its command line
#[derive(Debug, Clone, Default)]
pub struct PyInstaller {
    config: PackagerConfig,
}

impl PyInstaller {
    pub fn new(config: PackagerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PackagerConfig {
        &self.config
    }

    /// Command-line arguments for `request`, after the configured prefix
    pub fn command_args(&self, request: &PackageRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.config.prefix_args.iter().map(OsString::from).collect();

        args.push("--noconfirm".into());
        args.push(if request.onefile { "--onefile" } else { "--onedir" }.into());
        args.push(if request.windowed { "--windowed" } else { "--console" }.into());
        if request.clean {
            args.push("--clean".into());
        }

        args.push("--distpath".into());
        args.push(request.dist_dir.clone().into());
        args.push("--workpath".into());
        args.push(request.work_dir.clone().into());
        args.push("--specpath".into());
        args.push(request.spec_dir.clone().into());
        args.push("--name".into());
        args.push(request.name.clone().into());

        if let Some(ref icon) = request.icon {
            args.push("--icon".into());
            args.push(icon.clone().into());
        }

        for data in &request.data_dirs {
            let mut mapping = OsString::from(data.source.as_os_str());
            mapping.push(data_separator());
            mapping.push(&data.target);
            args.push("--add-data".into());
            args.push(mapping);
        }

        args.push(request.entry_script.clone().into());
        args
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.prefix_args);
        cmd
    }
}

impl NativePackager for PyInstaller {
    fn name(&self) -> &str {
        "PyInstaller"
    }

    fn check_available(&self) -> PackResult<String> {
        let output = self.command().arg("--version").output().map_err(|e| {
            PackError::PackagingFailed(format!(
                "PyInstaller not found at '{}': {}. Install with: pip install pyinstaller",
                self.config.program, e
            ))
        })?;

        if !output.status.success() {
            return Err(PackError::PackagingFailed(
                "PyInstaller version check failed".to_string(),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn package(&self, request: &PackageRequest) -> PackResult<PackagerOutput> {
        let args = self.command_args(request);
        tracing::debug!(
            "PyInstaller command: {} {}",
            self.config.program,
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let mut cmd = Command::new(&self.config.program);
        cmd.args(&args);

        run_captured(&mut cmd, self.config.timeout()).map_err(|e| {
            PackError::PackagingFailed(format!(
                "Failed to run '{}': {}",
                self.config.program, e
            ))
        })
    }
}

/// Separator between source and target in `--add-data`
fn data_separator() -> &'static str {
    if cfg!(windows) {
        ";"
    } else {
        ":"
    }
}

/// Run `cmd` to completion, capturing stdout and stderr
fn run_captured(cmd: &mut Command, timeout: Option<Duration>) -> std::io::Result<PackagerOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn()?;
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status = match timeout {
        None => Some(child.wait()?),
        Some(limit) => {
            let started = Instant::now();
            loop {
                if let Some(status) = child.try_wait()? {
                    break Some(status);
                }
                if started.elapsed() >= limit {
                    tracing::warn!("Packager exceeded {:?}, killing it", limit);
                    let _ = child.kill();
                    let _ = child.wait();
                    break None;
                }
                thread::sleep(POLL_INTERVAL);
            }
        }
    };

    let Some(status) = status else {
        // Readers may stay blocked on pipes inherited by grandchildren; leave them detached
        return Ok(PackagerOutput {
            timed_out: true,
            ..Default::default()
        });
    };

    Ok(PackagerOutput {
        success: status.success(),
        code: status.code(),
        stdout: collect(stdout),
        stderr: collect(stderr),
        timed_out: false,
    })
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Name of a set-aside file inside its backup directory
const SET_ASIDE_FILE: &str = "previous";

/// Build outputs that already existed, moved out of the packager's way.
///
/// Each file is renamed into a hidden temp directory next to it, so the
/// move stays on one file system. [`SetAside::restore`] removes whatever the
/// failed run left at the original paths and moves the old files back;
/// [`SetAside::discard`] drops them after a successful build.
struct SetAside {
    targets: Vec<PathBuf>,
    moved: Vec<(PathBuf, TempDir)>,
}

impl SetAside {
    fn new(targets: &[&Path]) -> PackResult<Self> {
        let mut guard = Self {
            targets: Vec::new(),
            moved: Vec::new(),
        };
        for target in targets {
            if !guard.targets.iter().any(|t| t == target) {
                guard.targets.push(target.to_path_buf());
            }
        }

        for target in guard.targets.clone() {
            if !target.is_file() {
                continue;
            }
            match Self::move_aside(&target) {
                Ok(dir) => guard.moved.push((target, dir)),
                Err(e) => {
                    guard.put_back();
                    return Err(PackError::PackagingFailed(format!(
                        "Failed to set aside existing {}: {}",
                        target.display(),
                        e
                    )));
                }
            }
        }
        Ok(guard)
    }

    fn move_aside(target: &Path) -> std::io::Result<TempDir> {
        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let dir = tempfile::Builder::new()
            .prefix(".html2exe_previous_")
            .tempdir_in(parent)?;
        fs::rename(target, dir.path().join(SET_ASIDE_FILE))?;
        tracing::debug!("Set aside existing output: {}", target.display());
        Ok(dir)
    }

    /// Remove partial output and put the previous files back
    fn restore(self) {
        for target in &self.targets {
            if target.is_file() {
                tracing::debug!("Removing partial output: {}", target.display());
                if let Err(e) = fs::remove_file(target) {
                    tracing::warn!("Failed to remove {}: {}", target.display(), e);
                }
            }
        }
        self.put_back();
    }

    fn put_back(self) {
        for (target, dir) in self.moved {
            let saved = dir.path().join(SET_ASIDE_FILE);
            if let Err(e) = fs::rename(&saved, &target) {
                let kept = dir.keep().join(SET_ASIDE_FILE);
                tracing::warn!(
                    "Failed to restore {}: {}; previous build kept at {}",
                    target.display(),
                    e,
                    kept.display()
                );
            }
        }
    }

    /// Keep the new output and delete the previous files
    fn discard(self) {
        for (target, dir) in self.moved {
            if let Err(e) = dir.close() {
                tracing::warn!("Failed to remove previous {}: {}", target.display(), e);
            }
        }
    }
}

/// Hand the request to `packager`, or only report what would be built.
///
/// A real run invokes the packager exactly once. The build succeeds only
/// when the packager exits with status zero and the executable exists
/// afterwards; it is then moved to `output_path` if the packager named it
/// differently. A failed run leaves the output paths as they were before it
/// started: new files are removed and earlier builds are put back.
pub fn invoke(
    packager: &dyn NativePackager,
    request: &PackageRequest,
    output_path: &Path,
    dry_run: bool,
) -> PackResult<BuildResult> {
    if dry_run {
        tracing::info!(
            "CHECK MODE: Would create {} from {}",
            output_path.display(),
            request.entry_script.display()
        );
        for data in &request.data_dirs {
            tracing::info!(
                "Assets directory: {} (as {})",
                data.source.display(),
                data.target
            );
        }
        return Ok(BuildResult::would_build(output_path));
    }

    let expected = request.expected_output();
    let previous = SetAside::new(&[expected.as_path(), output_path])?;

    tracing::info!("Building executable: {}", output_path.display());

    let output = match packager.package(request) {
        Ok(output) => output,
        Err(e) => {
            previous.restore();
            return Err(e);
        }
    };

    if output.timed_out {
        previous.restore();
        return Err(PackError::PackagingFailed(format!(
            "{} timed out",
            packager.name()
        )));
    }

    if !output.success {
        tracing::debug!("{} output:\n{}", packager.name(), output.combined());
        previous.restore();
        let code = output
            .code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        return Err(PackError::PackagingFailed(format!(
            "{} exited with status {}:\n{}",
            packager.name(),
            code,
            output.combined()
        )));
    }

    tracing::debug!("{} output:\n{}", packager.name(), output.combined());

    if !expected.is_file() {
        previous.restore();
        return Err(PackError::PackagingFailed(format!(
            "Executable was not created: {}",
            expected.display()
        )));
    }

    if expected != output_path {
        if let Err(e) = fs::rename(&expected, output_path) {
            previous.restore();
            return Err(PackError::PackagingFailed(format!(
                "Failed to move {} to {}: {}",
                expected.display(),
                output_path.display(),
                e
            )));
        }
    }
    previous.discard();

    let size = fs::metadata(output_path)?.len();
    tracing::info!(
        "Successfully created: {} ({:.2} MB)",
        output_path.display(),
        size as f64 / (1024.0 * 1024.0)
    );

    Ok(BuildResult::built(output_path, size))
}
