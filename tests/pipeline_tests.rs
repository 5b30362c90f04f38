//! Tests for the html2exe pipeline, using an in-process packager

use html2exe::{
    BuildOptions, NativePackager, PackError, PackResult, PackageRequest, PackagerOutput, Pipeline,
    BUNDLE_DIR,
};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    /// Write the executable and exit 0
    Succeed,
    /// Write a partial executable and exit 1
    Fail,
    /// Exit 0 without writing anything
    NoOutput,
}

/// What the packager saw when it was called
#[derive(Debug, Clone)]
struct Call {
    request: PackageRequest,
    assets: Vec<String>,
    shell: String,
}

struct FakePackager {
    behavior: Behavior,
    calls: RefCell<Vec<Call>>,
}

impl FakePackager {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl NativePackager for FakePackager {
    fn name(&self) -> &str {
        "fake"
    }

    fn check_available(&self) -> PackResult<String> {
        Ok("1.0".to_string())
    }

    fn package(&self, request: &PackageRequest) -> PackResult<PackagerOutput> {
        let assets = files_under(&request.data_dirs[0].source);
        let shell = fs::read_to_string(&request.entry_script)?;
        self.calls.borrow_mut().push(Call {
            request: request.clone(),
            assets,
            shell,
        });

        match self.behavior {
            Behavior::Succeed => {
                fs::write(request.expected_output(), b"MZ-binary")?;
                Ok(PackagerOutput {
                    success: true,
                    code: Some(0),
                    stdout: "Building EXE".to_string(),
                    ..Default::default()
                })
            }
            Behavior::Fail => {
                fs::write(request.expected_output(), b"MZ")?;
                Ok(PackagerOutput {
                    success: false,
                    code: Some(1),
                    stderr: "ERROR: module not found".to_string(),
                    ..Default::default()
                })
            }
            Behavior::NoOutput => Ok(PackagerOutput {
                success: true,
                code: Some(0),
                ..Default::default()
            }),
        }
    }
}

fn files_under(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

fn is_empty_dir(dir: &Path) -> bool {
    fs::read_dir(dir).unwrap().next().is_none()
}

/// Source tree with `app.html` and `style.css`
fn single_file_project() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let html = temp.path().join("app.html");
    fs::write(&html, "<html></html>").unwrap();
    fs::write(temp.path().join("style.css"), "body { }").unwrap();
    (temp, html)
}

fn pipeline(behavior: Behavior, workspaces: &TempDir) -> Pipeline<FakePackager> {
    Pipeline::with_packager(FakePackager::new(behavior)).with_workspace_parent(workspaces.path())
}

#[test]
fn test_successful_build() {
    let (_src, html) = single_file_project();
    let out = TempDir::new().unwrap();
    let workspaces = TempDir::new().unwrap();
    let output = out.path().join("dist").join("app.exe");

    let pipeline = pipeline(Behavior::Succeed, &workspaces);
    let result = pipeline.run(&html, &output, &BuildOptions::default()).unwrap();

    assert!(result.succeeded);
    assert!(!result.would_build);
    assert_eq!(result.output_path, output);
    assert_eq!(result.asset_count, 2);
    assert_eq!(result.size, Some(9));
    assert_eq!(fs::read(&output).unwrap(), b"MZ-binary");
    assert_eq!(files_under(&out.path().join("dist")), vec!["app.exe"]);

    let calls = pipeline.packager().calls();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.assets, vec!["index.html", "style.css"]);
    assert_eq!(call.request.name, "app");
    assert_eq!(call.request.dist_dir, out.path().join("dist"));
    assert_eq!(call.request.data_dirs.len(), 1);
    assert_eq!(call.request.data_dirs[0].target, BUNDLE_DIR);
    assert!(call.request.onefile && call.request.windowed && call.request.clean);
    assert!(call.request.icon.is_none());
    assert!(result.warnings.is_empty());

    assert!(is_empty_dir(workspaces.path()));
}

#[test]
fn test_title_defaults_to_input_name() {
    let (_src, html) = single_file_project();
    let out = TempDir::new().unwrap();
    let workspaces = TempDir::new().unwrap();

    let pipeline = pipeline(Behavior::Succeed, &workspaces);
    pipeline
        .run(&html, out.path().join("x.exe"), &BuildOptions::default())
        .unwrap();
    pipeline
        .run(
            &html,
            out.path().join("y.exe"),
            &BuildOptions::new().with_title("Custom").with_size(640, 480),
        )
        .unwrap();

    let calls = pipeline.packager().calls();
    assert!(calls[0].shell.contains("title=\"app\""));
    assert!(calls[0].shell.contains("width=1024"));
    assert!(calls[0].shell.contains("height=768"));
    assert!(calls[1].shell.contains("title=\"Custom\""));
    assert!(calls[1].shell.contains("width=640"));
    assert!(calls[1].shell.contains("debug=False"));
}

#[test]
fn test_directory_input_bundles_whole_tree() {
    let src = TempDir::new().unwrap();
    fs::write(src.path().join("index.html"), "<html></html>").unwrap();
    fs::create_dir(src.path().join("css")).unwrap();
    fs::write(src.path().join("css/a.css"), "a { }").unwrap();
    fs::write(src.path().join("notes.txt"), "notes").unwrap();
    let out = TempDir::new().unwrap();
    let workspaces = TempDir::new().unwrap();

    let pipeline = pipeline(Behavior::Succeed, &workspaces);
    let result = pipeline
        .run(src.path(), out.path().join("site.exe"), &BuildOptions::default())
        .unwrap();

    assert_eq!(result.asset_count, 3);
    assert_eq!(
        pipeline.packager().calls()[0].assets,
        vec!["css/a.css", "index.html", "notes.txt"]
    );
}

#[test]
fn test_preflight_warnings_do_not_change_bundle() {
    let src = TempDir::new().unwrap();
    fs::write(
        src.path().join("index.html"),
        r#"<script src="missing.js"></script><img src="/abs/logo.png">"#,
    )
    .unwrap();
    fs::write(src.path().join("package.json"), r#"{"name": "site"}"#).unwrap();
    let out = TempDir::new().unwrap();
    let workspaces = TempDir::new().unwrap();

    let pipeline = pipeline(Behavior::Succeed, &workspaces);
    let result = pipeline
        .run(src.path(), out.path().join("site.exe"), &BuildOptions::default())
        .unwrap();

    assert!(result.succeeded);
    assert_eq!(result.warnings.len(), 2);
    assert_eq!(
        pipeline.packager().calls()[0].assets,
        vec!["index.html", "package.json"]
    );
}

#[test]
fn test_dry_run_skips_packager_and_output_dir() {
    let (_src, html) = single_file_project();
    let out = TempDir::new().unwrap();
    let workspaces = TempDir::new().unwrap();
    let missing_dir = out.path().join("not").join("there");
    let output = missing_dir.join("app.exe");

    let pipeline = pipeline(Behavior::Succeed, &workspaces);
    let result = pipeline
        .run(&html, &output, &BuildOptions::new().with_dry_run(true))
        .unwrap();

    assert!(result.would_build);
    assert!(!result.succeeded);
    assert_eq!(result.asset_count, 2);
    assert!(pipeline.packager().calls().is_empty());
    assert!(!output.exists());
    assert!(!missing_dir.exists());
    assert!(is_empty_dir(workspaces.path()));
}

#[test]
fn test_dry_run_leaves_existing_output_untouched() {
    let (_src, html) = single_file_project();
    let out = TempDir::new().unwrap();
    let workspaces = TempDir::new().unwrap();
    let output = out.path().join("app.exe");
    fs::write(&output, "previous build").unwrap();

    pipeline(Behavior::Succeed, &workspaces)
        .run(&html, &output, &BuildOptions::new().with_dry_run(true))
        .unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), "previous build");
}

#[test]
fn test_packager_failure_leaves_no_output() {
    let (_src, html) = single_file_project();
    let out = TempDir::new().unwrap();
    let workspaces = TempDir::new().unwrap();
    let output = out.path().join("app.exe");

    let pipeline = pipeline(Behavior::Fail, &workspaces);
    let err = pipeline
        .run(&html, &output, &BuildOptions::default())
        .unwrap_err();

    match err {
        PackError::PackagingFailed(ref msg) => {
            assert!(msg.contains("exited with status 1"));
            assert!(msg.contains("module not found"));
        }
        ref other => panic!("unexpected error: {other}"),
    }
    assert!(!output.exists());
    assert!(files_under(out.path()).is_empty());
    assert!(is_empty_dir(workspaces.path()));
    assert_eq!(pipeline.packager().calls().len(), 1);
}

#[test]
fn test_failed_rebuild_restores_previous_output() {
    let (_src, html) = single_file_project();
    let out = TempDir::new().unwrap();
    let workspaces = TempDir::new().unwrap();
    let output = out.path().join("app.exe");
    fs::write(&output, "previous build").unwrap();

    let err = pipeline(Behavior::Fail, &workspaces)
        .run(&html, &output, &BuildOptions::default())
        .unwrap_err();

    assert!(matches!(err, PackError::PackagingFailed(_)));
    assert_eq!(fs::read_to_string(&output).unwrap(), "previous build");
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 1);
    assert!(is_empty_dir(workspaces.path()));
}

#[test]
fn test_missing_output_after_success_is_failure() {
    let (_src, html) = single_file_project();
    let out = TempDir::new().unwrap();
    let workspaces = TempDir::new().unwrap();

    let err = pipeline(Behavior::NoOutput, &workspaces)
        .run(&html, out.path().join("app.exe"), &BuildOptions::default())
        .unwrap_err();

    assert!(matches!(err, PackError::PackagingFailed(ref m) if m.contains("not created")));
    assert!(is_empty_dir(workspaces.path()));
}

#[test]
fn test_output_renamed_to_requested_path() {
    let (_src, html) = single_file_project();
    let out = TempDir::new().unwrap();
    let workspaces = TempDir::new().unwrap();
    let output = out.path().join("app.bin");

    let pipeline = pipeline(Behavior::Succeed, &workspaces);
    pipeline.run(&html, &output, &BuildOptions::default()).unwrap();

    assert!(output.is_file());
    assert_eq!(files_under(out.path()), vec!["app.bin"]);
}

#[test]
fn test_validation_failures_do_not_reach_packager() {
    let out = TempDir::new().unwrap();
    let workspaces = TempDir::new().unwrap();
    let src = TempDir::new().unwrap();
    let txt = src.path().join("readme.txt");
    fs::write(&txt, "text").unwrap();

    let pipeline = pipeline(Behavior::Succeed, &workspaces);
    let output = out.path().join("dist").join("app.exe");

    let err = pipeline
        .run(src.path().join("missing.html"), &output, &BuildOptions::default())
        .unwrap_err();
    assert!(matches!(err, PackError::InvalidInputKind(_)));

    let err = pipeline
        .run(&txt, &output, &BuildOptions::default())
        .unwrap_err();
    assert!(matches!(err, PackError::NotHtmlFile(_)));

    let err = pipeline
        .run(src.path(), &output, &BuildOptions::default())
        .unwrap_err();
    assert!(matches!(err, PackError::MissingEntryFile(_)));

    assert!(pipeline.packager().calls().is_empty());
    assert!(!out.path().join("dist").exists());
    assert!(is_empty_dir(workspaces.path()));
}

#[test]
fn test_invalid_dimensions_fail_in_generator() {
    let (_src, html) = single_file_project();
    let out = TempDir::new().unwrap();
    let workspaces = TempDir::new().unwrap();

    let pipeline = pipeline(Behavior::Succeed, &workspaces);
    let err = pipeline
        .run(
            &html,
            out.path().join("app.exe"),
            &BuildOptions::new().with_size(0, 768),
        )
        .unwrap_err();

    assert!(matches!(err, PackError::InvalidDimensions { width: 0, .. }));
    assert!(pipeline.packager().calls().is_empty());
    assert!(is_empty_dir(workspaces.path()));
}

#[test]
fn test_output_dir_error() {
    let (_src, html) = single_file_project();
    let out = TempDir::new().unwrap();
    let workspaces = TempDir::new().unwrap();
    let blocker = out.path().join("blocker");
    fs::write(&blocker, "a file, not a directory").unwrap();

    let err = pipeline(Behavior::Succeed, &workspaces)
        .run(&html, blocker.join("app.exe"), &BuildOptions::default())
        .unwrap_err();

    assert!(matches!(err, PackError::OutputDir { .. }));
    assert!(is_empty_dir(workspaces.path()));
}

#[test]
fn test_bad_icon_fails_before_packaging() {
    let (src, html) = single_file_project();
    let out = TempDir::new().unwrap();
    let workspaces = TempDir::new().unwrap();
    let icon = src.path().join("icon.png");
    fs::write(&icon, "not really a png").unwrap();

    let pipeline = pipeline(Behavior::Succeed, &workspaces);
    let err = pipeline
        .run(
            &html,
            out.path().join("app.exe"),
            &BuildOptions::new().with_icon(&icon),
        )
        .unwrap_err();

    assert!(matches!(err, PackError::Icon(_)));
    assert!(pipeline.packager().calls().is_empty());
    assert!(is_empty_dir(workspaces.path()));
}

#[cfg(unix)]
#[test]
fn test_resolver_failure_cleans_workspace() {
    let src = TempDir::new().unwrap();
    fs::write(src.path().join("index.html"), "<html></html>").unwrap();
    std::os::unix::fs::symlink(src.path().join("gone"), src.path().join("broken.js")).unwrap();
    let out = TempDir::new().unwrap();
    let workspaces = TempDir::new().unwrap();

    let pipeline = pipeline(Behavior::Succeed, &workspaces);
    let err = pipeline
        .run(src.path(), out.path().join("app.exe"), &BuildOptions::default())
        .unwrap_err();

    assert!(matches!(err, PackError::AssetIo { .. }));
    assert!(pipeline.packager().calls().is_empty());
    assert!(is_empty_dir(workspaces.path()));
}
