//! html2exe - package HTML/CSS/JS projects into single-file executables
//!
//! The pipeline takes an HTML file or a directory containing `index.html`,
//! bundles the web assets, generates a small pywebview viewer program and
//! hands both to PyInstaller, which produces one windowed executable.
//!
//! # Quick Start
//!
//! ```bash
//! # Single page with its stylesheets and images next to it
//! html2exe --input ./page.html --output dist/page.exe
//!
//! # Whole project directory
//! html2exe --input ./site --output dist/site.exe --title "My Site" --width 1280 --height 800
//!
//! # Show what would be built
//! html2exe --input ./site --output dist/site.exe --check
//! ```
//!
//! # Stages
//!
//! ```text
//! validate      input path -> InputSpec (file | directory)
//! preflight     InputSpec  -> warnings about references (logged only)
//! resolve       InputSpec  -> <workspace>/html_assets
//! generate      title/size -> <workspace>/viewer.py
//! invoke        viewer.py + html_assets -> <output dir>/<name>.exe
//! ```
//!
//! Every run owns a temporary workspace that is removed when the run ends,
//! whatever the outcome.
//!
//! # Asset discovery
//!
//! A directory input is copied as-is. For a single HTML file only these
//! siblings are bundled:
//!
//! - files ending in `.css`, `.js`, `.png`, `.jpg`, `.jpeg`, `.gif`, `.svg`, `.ico`
//! - directories named `css`, `js`, `images`, `img`, `assets`, `static`

mod bundle;
pub mod cli;
mod config;
pub mod doctor;
mod error;
pub mod icon;
mod input;
mod packager;
mod pipeline;
pub mod preflight;
pub mod progress;
mod shell;
mod workspace;

// Re-export public API
pub use bundle::{
    resolve, AssetBundle, AssetEntry, BundleBuilder, ASSET_EXTENSIONS, ASSET_FOLDERS, BUNDLE_DIR,
};
pub use config::{DevConfig, CONFIG_DIR, CONFIG_FILE};
pub use error::{PackError, PackResult};
pub use input::{is_html_file, validate, InputKind, InputSpec, ENTRY_FILE, FALLBACK_TITLE};
pub use packager::{
    invoke, DataMapping, NativePackager, PackageRequest, PackagerConfig, PackagerOutput,
    PyInstaller,
};
pub use preflight::PreflightReport;
pub use pipeline::{
    run, BuildOptions, BuildResult, Pipeline, DEFAULT_HEIGHT, DEFAULT_WIDTH,
};
pub use shell::{generate, ShellGenerator, SHELL_FILE};
pub use workspace::{Workspace, WORKSPACE_PREFIX};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
