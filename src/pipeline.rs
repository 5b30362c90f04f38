//! Build pipeline: validate, bundle, generate the shell, package

use crate::bundle::{self, BUNDLE_DIR};
use crate::icon;
use crate::input;
use crate::packager::{self, NativePackager, PackageRequest, PyInstaller};
use crate::preflight;
use crate::shell::ShellGenerator;
use crate::workspace::Workspace;
use crate::{PackError, PackResult};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default window width
pub const DEFAULT_WIDTH: u32 = 1024;

/// Default window height
pub const DEFAULT_HEIGHT: u32 = 768;

/// Caller-supplied build parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Window title, defaults to the input's base name
    pub title: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Validate and bundle, but do not run the packager
    pub dry_run: bool,
    /// Enable webview developer tools in the packaged app
    pub debug: bool,
    /// Icon to embed (PNG, JPEG or ICO)
    pub icon: Option<PathBuf>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            title: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            dry_run: false,
            debug: false,
            icon: None,
        }
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<PathBuf>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Outcome of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildResult {
    /// Requested executable path
    pub output_path: PathBuf,
    /// The executable was built
    pub succeeded: bool,
    /// Dry run: everything checked out, nothing was built
    pub would_build: bool,
    /// Number of bundled asset files
    pub asset_count: usize,
    /// Size of the built executable in bytes
    pub size: Option<u64>,
    /// Preflight warnings about references that may not resolve in the app
    pub warnings: Vec<String>,
}

impl BuildResult {
    /// Result of a successful build
    pub fn built(output_path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            output_path: output_path.into(),
            succeeded: true,
            would_build: false,
            asset_count: 0,
            size: Some(size),
            warnings: Vec::new(),
        }
    }

    /// Result of a successful dry run
    pub fn would_build(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            succeeded: false,
            would_build: true,
            asset_count: 0,
            size: None,
            warnings: Vec::new(),
        }
    }
}

/// Sequences the build stages for one input
pub struct Pipeline<P: NativePackager = PyInstaller> {
    packager: P,
    workspace_parent: Option<PathBuf>,
}

impl Pipeline<PyInstaller> {
    /// Create a pipeline that packages with PyInstaller from PATH
    pub fn new() -> Self {
        Self::with_packager(PyInstaller::default())
    }
}

impl Default for Pipeline<PyInstaller> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: NativePackager> Pipeline<P> {
    /// Create a pipeline around `packager`
    pub fn with_packager(packager: P) -> Self {
        Self {
            packager,
            workspace_parent: None,
        }
    }

    /// Create workspaces below `dir` instead of the system temp directory
    pub fn with_workspace_parent(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workspace_parent = Some(dir.into());
        self
    }

    pub fn packager(&self) -> &P {
        &self.packager
    }

    /// Package `input` into the executable at `output`.
    ///
    /// Preflight findings are logged and returned in the result; they never
    /// fail the run. The first failing stage aborts the run. The workspace is removed on
    /// every path out of this function.
    pub fn run(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        options: &BuildOptions,
    ) -> PackResult<BuildResult> {
        let input = input.as_ref();
        let output_path = output.as_ref();

        tracing::info!(
            "Converting {} to {}",
            input.display(),
            output_path.display()
        );

        let spec = input::validate(input)?;
        let report = preflight::check(&spec);
        report.log();
        let title = options
            .title
            .clone()
            .unwrap_or_else(|| spec.default_title());

        let name = output_path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                PackError::Config(format!(
                    "Output path has no file name: {}",
                    output_path.display()
                ))
            })?;
        let dist_dir = output_dir(output_path);

        // Dry runs leave the file system outside the workspace untouched
        if !options.dry_run {
            fs::create_dir_all(&dist_dir).map_err(|source| PackError::OutputDir {
                path: dist_dir.clone(),
                source,
            })?;
        }

        let workspace = match self.workspace_parent {
            Some(ref parent) => Workspace::new_in(parent)?,
            None => Workspace::new()?,
        };

        let bundle = bundle::resolve(&spec, workspace.root())?;

        let icon = options
            .icon
            .as_deref()
            .map(|path| icon::prepare_icon(path, workspace.root()))
            .transpose()?;

        let shell = ShellGenerator::new(&title, options.width, options.height)
            .debug(options.debug)
            .write(workspace.root())?;

        let mut request = PackageRequest::new(shell, dist_dir, name, workspace.join("build"))
            .spec_dir(workspace.root())
            .add_data(bundle.root(), BUNDLE_DIR);
        if let Some(icon) = icon {
            request = request.icon(icon);
        }

        let mut result = packager::invoke(&self.packager, &request, output_path, options.dry_run)?;
        result.asset_count = bundle.len();
        result.warnings = report.warnings;

        if let Err(e) = workspace.close() {
            tracing::warn!("Failed to remove workspace: {}", e);
        }

        if options.dry_run {
            tracing::info!("Check completed - all inputs valid");
        } else {
            tracing::info!("Conversion completed successfully");
        }

        Ok(result)
    }
}

/// Directory the executable is written to
fn output_dir(output_path: &Path) -> PathBuf {
    match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Package `input` into `output` with PyInstaller from PATH
pub fn run(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &BuildOptions,
) -> PackResult<BuildResult> {
    Pipeline::new().run(input, output, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = BuildOptions::default();
        assert_eq!(options.width, 1024);
        assert_eq!(options.height, 768);
        assert!(options.title.is_none());
        assert!(!options.dry_run);
    }

    #[test]
    fn test_output_dir() {
        assert_eq!(output_dir(Path::new("app.exe")), PathBuf::from("."));
        assert_eq!(output_dir(Path::new("dist/app.exe")), PathBuf::from("dist"));
    }

    #[test]
    fn test_result_constructors() {
        let built = BuildResult::built("out/app.exe", 42);
        assert!(built.succeeded && !built.would_build);
        assert_eq!(built.size, Some(42));

        let dry = BuildResult::would_build("out/app.exe");
        assert!(dry.would_build && !dry.succeeded);
        assert_eq!(dry.size, None);
    }
}
