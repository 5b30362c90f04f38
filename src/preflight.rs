//! Preflight checks on the input project
//!
//! The HTML documents of the input are scanned for `href`/`src` references
//! that will not resolve inside the packaged app: absolute paths, links to
//! missing files, and (for a single-file input) files that exist but are
//! not picked up by the asset rules. Findings are advisory. They are logged
//! and reported with the build result, and never change the bundle.

use crate::bundle::{has_asset_extension, is_asset_folder};
use crate::input::{InputKind, InputSpec};
use regex::Regex;
use std::fs;
use std::path::{Component, Path};
use std::sync::OnceLock;
use walkdir::WalkDir;

/// Project manifest looked for at the root of a directory input
const PACKAGE_JSON: &str = "package.json";

/// Findings of a preflight run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreflightReport {
    /// Problems likely to break the packaged app
    pub warnings: Vec<String>,
    /// Informational findings
    pub notes: Vec<String>,
}

impl PreflightReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Emit the findings through `tracing`
    pub fn log(&self) {
        for warning in &self.warnings {
            tracing::warn!("{}", warning);
        }
        for note in &self.notes {
            tracing::info!("{}", note);
        }
    }
}

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?is)<(?:a|link|img|script|source)\b[^>]*?\s(?:href|src)\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
        )
        .expect("invalid link regex")
    })
}

fn scheme_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("invalid scheme regex"))
}

fn drive_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z]:[\\/]").expect("invalid drive regex"))
}

/// Check the documents of `spec`
pub fn check(spec: &InputSpec) -> PreflightReport {
    let mut report = PreflightReport::default();

    match spec.kind() {
        InputKind::File => {
            let name = spec
                .path()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            scan_document(spec, spec.path(), &name, &mut report);
        }
        InputKind::Directory => {
            check_package_json(spec.path(), &mut report);
            for document in html_documents(spec.path()) {
                let name = document
                    .strip_prefix(spec.path())
                    .unwrap_or(&document)
                    .to_string_lossy()
                    .replace('\\', "/");
                scan_document(spec, &document, &name, &mut report);
            }
        }
    }

    tracing::debug!(
        "Preflight: {} warnings, {} notes",
        report.warnings.len(),
        report.notes.len()
    );
    report
}

/// HTML documents below `root`, in sorted order. Traversal errors are left
/// to the asset resolver.
fn html_documents(root: &Path) -> Vec<std::path::PathBuf> {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|x| x.to_str())
                .is_some_and(|x| x.eq_ignore_ascii_case("html") || x.eq_ignore_ascii_case("htm"))
        })
        .map(|e| e.into_path())
        .collect()
}

fn check_package_json(root: &Path, report: &mut PreflightReport) {
    let path = root.join(PACKAGE_JSON);
    let Ok(content) = fs::read_to_string(&path) else {
        return;
    };

    match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(manifest) => {
            let name = manifest
                .get("name")
                .and_then(|n| n.as_str())
                .unwrap_or("unnamed");
            report.notes.push(format!(
                "Found {} for project '{}'; html2exe bundles files as they are and does not run a build step",
                PACKAGE_JSON, name
            ));
        }
        Err(e) => report
            .warnings
            .push(format!("{} is present but is not valid JSON: {}", PACKAGE_JSON, e)),
    }
}

fn scan_document(spec: &InputSpec, document: &Path, name: &str, report: &mut PreflightReport) {
    let content = match fs::read(document) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            report
                .warnings
                .push(format!("Could not read {}: {}", document.display(), e));
            return;
        }
    };
    let base = document.parent().unwrap_or(Path::new("."));

    for caps in link_pattern().captures_iter(&content) {
        let Some(reference) = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().trim()) else {
            continue;
        };
        let Some(target) = local_target(reference) else {
            continue;
        };

        if is_absolute_reference(&target) {
            report.warnings.push(format!(
                "Absolute path in {}: '{}' will not resolve inside the executable",
                name, reference
            ));
            continue;
        }

        if !base.join(&target).exists() {
            report
                .warnings
                .push(format!("Broken link in {}: '{}' not found", name, reference));
            continue;
        }

        if spec.kind() == InputKind::File && !single_file_bundles(Path::new(&target)) {
            report.warnings.push(format!(
                "'{}' referenced in {} exists but is not bundled with a single-file input",
                reference, name
            ));
        }
    }
}

/// File path part of a reference that points into the local file system
fn local_target(reference: &str) -> Option<String> {
    if reference.is_empty() || reference.starts_with('#') || reference.starts_with("//") {
        return None;
    }
    if scheme_pattern().is_match(reference) && !drive_pattern().is_match(reference) {
        return None;
    }

    let path = reference
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    if path.is_empty() {
        return None;
    }
    Some(percent_decode(path))
}

fn is_absolute_reference(target: &str) -> bool {
    target.starts_with('/') || target.starts_with('\\') || drive_pattern().is_match(target)
}

/// Whether the single-file asset rules copy a sibling at `relative`
fn single_file_bundles(relative: &Path) -> bool {
    let parts: Vec<Component> = relative
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    match parts.as_slice() {
        [Component::Normal(_)] => has_asset_extension(relative),
        [Component::Normal(first), _, ..] => {
            is_asset_folder(first) && parts.iter().all(|c| matches!(c, Component::Normal(_)))
        }
        _ => false,
    }
}

/// Decode `%XX` escapes, leaving malformed ones as they are
fn percent_decode(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}
