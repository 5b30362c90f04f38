//! Viewer shell generation
//!
//! The shell is a small pywebview program that the packager turns into the
//! final executable. At startup it copies the bundled `html_assets` tree to
//! a fresh temp directory and opens a native window on the extracted
//! `index.html`. Startup failures are shown in a modal dialog.

use crate::bundle::BUNDLE_DIR;
use crate::input::ENTRY_FILE;
use crate::{PackError, PackResult};
use std::path::{Path, PathBuf};

/// File name of the generated shell inside the workspace
pub const SHELL_FILE: &str = "viewer.py";

/// Title shown in the error dialog of the packaged app
const ERROR_DIALOG_TITLE: &str = "HTML2exe Error";

/// Builder for the viewer shell program
#[derive(Debug, Clone)]
pub struct ShellGenerator {
    title: String,
    width: u32,
    height: u32,
    debug: bool,
}

impl ShellGenerator {
    /// Create a generator for a window of the given title and size
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            debug: false,
        }
    }

    /// Enable the webview developer tools in the packaged app
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Render the shell program text
    pub fn render(&self) -> PackResult<String> {
        if self.width == 0 || self.height == 0 {
            return Err(PackError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        let mut script = String::new();

        script.push_str("\"\"\"Generated by html2exe. Displays the bundled HTML in a native window.\"\"\"\n\n");
        script.push_str("import shutil\nimport sys\nimport tempfile\nfrom pathlib import Path\n\n");

        // Asset extraction
        script.push_str(&format!(
            r#"ASSETS_DIR = "{assets}"
ENTRY_FILE = "{entry}"


def bundle_dir():
    if hasattr(sys, "_MEIPASS"):
        return Path(sys._MEIPASS)
    return Path(__file__).resolve().parent


def extract_assets():
    source = bundle_dir() / ASSETS_DIR
    if not source.exists():
        raise RuntimeError(f"HTML assets not found: {{source}}")

    target = Path(tempfile.mkdtemp(prefix="html2exe_")) / ASSETS_DIR
    shutil.copytree(source, target)
    return target


"#,
            assets = BUNDLE_DIR,
            entry = ENTRY_FILE,
        ));

        // Error dialog
        script.push_str(&format!(
            r#"def show_error(message):
    try:
        import tkinter
        from tkinter import messagebox

        root = tkinter.Tk()
        root.withdraw()
        messagebox.showerror({dialog_title}, f"Failed to start application:\n\n{{message}}")
        root.destroy()
    except Exception:
        print(f"Failed to start application: {{message}}", file=sys.stderr)


"#,
            dialog_title = python_string(ERROR_DIALOG_TITLE),
        ));

        // Window
        script.push_str(&format!(
            r#"def main():
    try:
        import webview

        assets = extract_assets()
        index_html = assets / ENTRY_FILE
        if not index_html.exists():
            raise RuntimeError(f"{{ENTRY_FILE}} not found in assets: {{assets}}")

        webview.create_window(
            title={title},
            url=str(index_html),
            width={width},
            height={height},
            resizable=True,
            shadow=True,
        )
        webview.start(debug={debug})
    except Exception as exc:
        show_error(str(exc))
        sys.exit(1)


if __name__ == "__main__":
    main()
"#,
            title = python_string(&self.title),
            width = self.width,
            height = self.height,
            debug = if self.debug { "True" } else { "False" },
        ));

        Ok(script)
    }

    /// Write the shell into `workspace_root` and return its path
    pub fn write(&self, workspace_root: &Path) -> PackResult<PathBuf> {
        let script = self.render()?;
        let path = workspace_root.join(SHELL_FILE);
        std::fs::write(&path, script)?;
        tracing::debug!("Generated viewer shell: {}", path.display());
        Ok(path)
    }
}

/// Generate the viewer shell for a window of `title`, `width` x `height`
pub fn generate(workspace_root: &Path, title: &str, width: u32, height: u32) -> PackResult<PathBuf> {
    ShellGenerator::new(title, width, height).write(workspace_root)
}

/// Quote `value` as a double-quoted Python string literal
fn python_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_string_escapes() {
        assert_eq!(python_string("My App"), "\"My App\"");
        assert_eq!(python_string("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(python_string("C:\\apps"), "\"C:\\\\apps\"");
        assert_eq!(python_string("a\nb"), "\"a\\nb\"");
        assert_eq!(python_string("\u{1}"), "\"\\u0001\"");
    }

    #[test]
    fn test_render_rejects_zero_size() {
        let err = ShellGenerator::new("App", 0, 600).render().unwrap_err();
        assert!(matches!(
            err,
            PackError::InvalidDimensions {
                width: 0,
                height: 600
            }
        ));
        assert!(ShellGenerator::new("App", 800, 0).render().is_err());
    }
}
