//! Input classification

use crate::{PackError, PackResult};
use std::path::{Path, PathBuf};

/// Fixed name of the entry document inside a project directory
pub const ENTRY_FILE: &str = "index.html";

/// Window title used when the input path has no usable base name
pub const FALLBACK_TITLE: &str = "HTML2exe Application";

/// What kind of project the input path points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A single `.html` file
    File,
    /// A directory containing `index.html`
    Directory,
}

/// A validated input path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    path: PathBuf,
    kind: InputKind,
}

impl InputSpec {
    /// The input path as given by the caller
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> InputKind {
        self.kind
    }

    /// The HTML document that becomes `index.html` in the bundle
    pub fn entry_file(&self) -> PathBuf {
        match self.kind {
            InputKind::File => self.path.clone(),
            InputKind::Directory => self.path.join(ENTRY_FILE),
        }
    }

    /// Window title used when none is given: the input's base name
    pub fn default_title(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(FALLBACK_TITLE)
            .to_string()
    }
}

/// Check whether `path` has the `.html` extension, ignoring case
pub fn is_html_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html"))
}

/// Classify `path` as an HTML file or a project directory
pub fn validate(path: impl AsRef<Path>) -> PackResult<InputSpec> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(PackError::InvalidInputKind(path.to_path_buf()));
    }

    let kind = if path.is_file() {
        if !is_html_file(path) {
            return Err(PackError::NotHtmlFile(path.to_path_buf()));
        }
        InputKind::File
    } else if path.is_dir() {
        if !path.join(ENTRY_FILE).is_file() {
            return Err(PackError::MissingEntryFile(path.to_path_buf()));
        }
        InputKind::Directory
    } else {
        return Err(PackError::InvalidInputKind(path.to_path_buf()));
    };

    tracing::debug!("Input {} classified as {:?}", path.display(), kind);

    Ok(InputSpec {
        path: path.to_path_buf(),
        kind,
    })
}
