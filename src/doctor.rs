//! Environment diagnostics
//!
//! `html2exe --doctor` reports whether the packager can be run, which
//! platform the executable would be built for, and where the developer
//! config is read from.

use crate::config::DevConfig;
use crate::packager::NativePackager;
use serde::Serialize;

/// One diagnostic line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    pub component: String,
    /// `false` when the component blocks a build
    pub ok: bool,
    pub detail: String,
}

impl Check {
    fn ok(component: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            ok: true,
            detail: detail.into(),
        }
    }

    fn failed(component: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            ok: false,
            detail: detail.into(),
        }
    }
}

/// Result of a diagnostics run
#[derive(Debug, Clone, Default, Serialize)]
pub struct DoctorReport {
    pub checks: Vec<Check>,
}

impl DoctorReport {
    /// Whether nothing blocks a build
    pub fn is_ok(&self) -> bool {
        self.checks.iter().all(|c| c.ok)
    }

    pub fn get(&self, component: &str) -> Option<&Check> {
        self.checks.iter().find(|c| c.component == component)
    }

    /// Human readable report, one check per line
    pub fn render(&self) -> String {
        let width = self
            .checks
            .iter()
            .map(|c| c.component.len())
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        for check in &self.checks {
            let mark = if check.ok {
                console::style("✓").green()
            } else {
                console::style("✗").red()
            };
            out.push_str(&format!(
                "{} {:width$}  {}\n",
                mark,
                check.component,
                check.detail,
                width = width
            ));
        }

        if self.is_ok() {
            out.push_str("All checks passed\n");
        } else {
            out.push_str("Install PyInstaller and pywebview with: pip install pyinstaller pywebview\n");
        }
        out
    }
}

/// Run the diagnostics for `packager` and `config`
pub fn diagnose(packager: &dyn NativePackager, config: &DevConfig) -> DoctorReport {
    let mut report = DoctorReport::default();

    report
        .checks
        .push(Check::ok("html2exe", crate::VERSION));

    report.checks.push(match packager.check_available() {
        Ok(version) if version.is_empty() => Check::ok(packager.name(), "available"),
        Ok(version) => Check::ok(packager.name(), version),
        Err(e) => Check::failed(packager.name(), e.to_string()),
    });

    report
        .checks
        .push(Check::ok("Platform", std::env::consts::OS));
    report.checks.push(Check::ok(
        "Architecture",
        format!("{} ({}-bit)", std::env::consts::ARCH, usize::BITS),
    ));

    let config_detail = match config.path() {
        Some(path) if path.is_file() => path.display().to_string(),
        Some(path) => format!("{} (not found, using defaults)", path.display()),
        None => "no home directory, using defaults".to_string(),
    };
    report.checks.push(Check::ok("Config", config_detail));

    if !cfg!(windows) {
        report.checks.push(Check::ok(
            "Target",
            "executables are built for the current platform; build on Windows for .exe",
        ));
    }

    tracing::debug!("Doctor: {} checks, ok = {}", report.checks.len(), report.is_ok());
    report
}
