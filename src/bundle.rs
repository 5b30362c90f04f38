//! Asset resolution: decides which files ship with the app and copies them
//! under the bundle root.

use crate::input::{InputKind, InputSpec, ENTRY_FILE};
use crate::{PackError, PackResult};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory name of the bundle root inside the workspace.
///
/// The packaged app looks the assets up under the same name at runtime.
pub const BUNDLE_DIR: &str = "html_assets";

/// Sibling file extensions pulled in next to a single HTML file
pub const ASSET_EXTENSIONS: &[&str] = &["css", "js", "png", "jpg", "jpeg", "gif", "svg", "ico"];

/// Sibling folder names pulled in next to a single HTML file
pub const ASSET_FOLDERS: &[&str] = &["css", "js", "images", "img", "assets", "static"];

/// One bundled file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    /// Path relative to the bundle root, `/`-separated, for display and lookup
    pub relative_path: String,
    /// Path relative to the bundle root exactly as written on disk
    pub path: PathBuf,
    /// Where the file was copied from
    pub source: PathBuf,
    /// Size in bytes
    pub size: u64,
}

/// Collection of assets materialized under a bundle root
#[derive(Debug)]
pub struct AssetBundle {
    root: PathBuf,
    entries: Vec<AssetEntry>,
    total_size: u64,
}

impl AssetBundle {
    /// Create an empty bundle rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: Vec::new(),
            total_size: 0,
        }
    }

    /// Record an asset. A later entry with the same on-disk path replaces the earlier one.
    fn add(&mut self, path: PathBuf, source: PathBuf, size: u64) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.path == path) {
            self.total_size = self.total_size - existing.size + size;
            existing.source = source;
            existing.size = size;
            return;
        }
        self.total_size += size;
        self.entries.push(AssetEntry {
            relative_path: slash_path(&path),
            path,
            source,
            size,
        });
    }

    /// Bundle root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All assets in the order they were added
    pub fn entries(&self) -> &[AssetEntry] {
        &self.entries
    }

    /// Look up an asset by its relative path
    pub fn get(&self, relative_path: &str) -> Option<&AssetEntry> {
        self.entries
            .iter()
            .find(|e| e.relative_path == relative_path)
    }

    /// Check whether the bundle has an asset at `relative_path`
    pub fn contains(&self, relative_path: &str) -> bool {
        self.get(relative_path).is_some()
    }

    /// Relative paths of all assets
    pub fn relative_paths(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|e| e.relative_path.as_str())
            .collect()
    }

    /// Get the number of assets
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the bundle is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get total size in bytes
    pub fn total_size(&self) -> u64 {
        self.total_size
    }
}

/// Builder that resolves and copies the assets for one input
pub struct BundleBuilder<'a> {
    spec: &'a InputSpec,
    root: PathBuf,
}

impl<'a> BundleBuilder<'a> {
    /// Prepare a bundle for `spec` under `<workspace_root>/html_assets`
    pub fn new(spec: &'a InputSpec, workspace_root: impl AsRef<Path>) -> Self {
        Self {
            spec,
            root: workspace_root.as_ref().join(BUNDLE_DIR),
        }
    }

    /// Copy the assets and return the resulting bundle
    pub fn build(&self) -> PackResult<AssetBundle> {
        fs::create_dir_all(&self.root).map_err(|e| PackError::asset_io(&self.root, e))?;

        let mut bundle = AssetBundle::new(&self.root);

        match self.spec.kind() {
            InputKind::Directory => {
                self.copy_tree(&mut bundle, self.spec.path(), None)?;
            }
            InputKind::File => {
                self.copy_file(&mut bundle, self.spec.path(), Path::new(ENTRY_FILE))?;
                self.collect_siblings(&mut bundle)?;
            }
        }

        if !bundle.entries().iter().any(|e| e.path == Path::new(ENTRY_FILE)) {
            return Err(PackError::MissingEntryFile(self.spec.path().to_path_buf()));
        }

        tracing::info!(
            "Bundle created: {} files, {} bytes total",
            bundle.len(),
            bundle.total_size()
        );

        Ok(bundle)
    }

    /// Pull in the recognized assets that sit next to a single HTML file
    fn collect_siblings(&self, bundle: &mut AssetBundle) -> PackResult<()> {
        let input = self.spec.path();
        let parent = match input.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let input_name = input.file_name();

        let mut siblings = fs::read_dir(parent)
            .map_err(|e| PackError::asset_io(parent, e))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PackError::asset_io(parent, e))?;
        siblings.sort();

        for path in siblings {
            let Some(name) = path.file_name() else {
                continue;
            };

            if path.is_file() {
                if Some(name) == input_name {
                    continue;
                }
                if has_asset_extension(&path) {
                    self.copy_file(bundle, &path, Path::new(name))?;
                }
            } else if path.is_dir() && is_asset_folder(name) {
                self.copy_tree(bundle, &path, Some(Path::new(name)))?;
            } else {
                tracing::debug!("Not bundled: {}", path.display());
            }
        }

        Ok(())
    }

    /// Mirror `dir` under the bundle root, optionally below `prefix`.
    ///
    /// Names are carried over as raw path components, so the copy keeps
    /// every file name the platform allows.
    fn copy_tree(
        &self,
        bundle: &mut AssetBundle,
        dir: &Path,
        prefix: Option<&Path>,
    ) -> PackResult<()> {
        for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(dir).to_path_buf();
                PackError::asset_io(path, e.into())
            })?;

            let relative = entry
                .path()
                .strip_prefix(dir)
                .map_err(|e| PackError::asset_io(entry.path(), std::io::Error::other(e)))?;
            let relative = match prefix {
                Some(p) => p.join(relative),
                None => relative.to_path_buf(),
            };

            if entry.file_type().is_dir() {
                let dest = self.root.join(&relative);
                fs::create_dir_all(&dest).map_err(|e| PackError::asset_io(entry.path(), e))?;
                continue;
            }

            self.copy_file(bundle, entry.path(), &relative)?;
        }

        Ok(())
    }

    fn copy_file(&self, bundle: &mut AssetBundle, source: &Path, relative: &Path) -> PackResult<()> {
        let dest = self.root.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| PackError::asset_io(parent, e))?;
        }
        let size = fs::copy(source, &dest).map_err(|e| PackError::asset_io(source, e))?;

        tracing::debug!("Adding asset: {} ({} bytes)", relative.display(), size);
        bundle.add(relative.to_path_buf(), source.to_path_buf(), size);
        Ok(())
    }
}

/// `/`-separated form of a bundle-relative path
fn slash_path(path: &Path) -> String {
    let text = path.to_string_lossy();
    if cfg!(windows) {
        text.replace('\\', "/")
    } else {
        text.into_owned()
    }
}

/// Check whether a sibling directory name is one of the recognized asset folders
pub(crate) fn is_asset_folder(name: &OsStr) -> bool {
    name.to_str().is_some_and(|n| ASSET_FOLDERS.contains(&n))
}

/// Check whether a sibling file's extension marks it as a web asset
pub(crate) fn has_asset_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| ASSET_EXTENSIONS.contains(&e.as_str()))
}

/// Resolve and copy the assets for `spec` into `<workspace_root>/html_assets`
pub fn resolve(spec: &InputSpec, workspace_root: impl AsRef<Path>) -> PackResult<AssetBundle> {
    BundleBuilder::new(spec, workspace_root).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_extension_is_case_insensitive() {
        assert!(has_asset_extension(Path::new("style.css")));
        assert!(has_asset_extension(Path::new("LOGO.PNG")));
        assert!(has_asset_extension(Path::new("favicon.Ico")));
        assert!(!has_asset_extension(Path::new("notes.txt")));
        assert!(!has_asset_extension(Path::new("other.html")));
        assert!(!has_asset_extension(Path::new("Makefile")));
    }

    #[test]
    fn test_add_replaces_same_path() {
        let mut bundle = AssetBundle::new("/tmp/root");
        bundle.add(PathBuf::from("a.css"), PathBuf::from("/src/a.css"), 10);
        bundle.add(PathBuf::from("b.css"), PathBuf::from("/src/b.css"), 5);
        bundle.add(PathBuf::from("a.css"), PathBuf::from("/other/a.css"), 3);

        assert_eq!(bundle.len(), 2);
        assert_eq!(bundle.total_size(), 8);
        assert_eq!(
            bundle.get("a.css").map(|e| e.source.clone()),
            Some(PathBuf::from("/other/a.css"))
        );
    }

    #[test]
    fn test_slash_path() {
        assert_eq!(slash_path(Path::new("css/a.css")), "css/a.css");
        #[cfg(unix)]
        assert_eq!(slash_path(Path::new("a\\b.css")), "a\\b.css");
    }

    #[test]
    fn test_asset_folder_names() {
        assert!(is_asset_folder(OsStr::new("static")));
        assert!(!is_asset_folder(OsStr::new("Static")));
        assert!(!is_asset_folder(OsStr::new("node_modules")));
    }
}
