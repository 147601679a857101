//! # PDF Rendering
//!
//! Rendering goes through the narrow [`Renderer`] capability: HTML markup and
//! page options in, PDF bytes out. The production implementation drives the
//! external `wkhtmltopdf` binary; tests use the fakes in [`fake`].
//!
//! ## Engine discovery
//!
//! [`Wkhtmltopdf::probe`] runs once at startup:
//!
//! 1. Locate the binary: the configured path, then `PATH`, then the usual
//!    Windows install locations.
//! 2. Ask it for `--version`. A binary that cannot answer is treated as not
//!    installed.
//! 3. Render a tiny page as a functional self-test.
//!
//! The result is kept as an immutable [`EngineStatus`]. When the startup
//! self-test failed, every render re-runs it before giving up, so an engine
//! whose display came up late still gets used.

use crate::config::EngineConfig;
use common::model::report::ReportKind;
use log::{error, info, warn};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

const BINARY_NAME: &str = "wkhtmltopdf";
const WINDOWS_INSTALL_PATHS: [&str; 2] = [
    r"C:\Program Files\wkhtmltopdf\bin\wkhtmltopdf.exe",
    r"C:\Program Files (x86)\wkhtmltopdf\bin\wkhtmltopdf.exe",
];
const SELF_TEST_HTML: &str = "<html><body><h1>Test</h1></body></html>";

#[derive(Debug, Error)]
pub enum RenderError {
    /// The engine is missing or does not pass its self-test.
    #[error("{0}")]
    Unavailable(String),

    /// The engine was invoked and failed.
    #[error("PDF rendering failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    fn as_arg(self) -> &'static str {
        match self {
            Orientation::Portrait => "Portrait",
            Orientation::Landscape => "Landscape",
        }
    }
}

/// Page setup handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageOptions {
    pub page_size: &'static str,
    pub orientation: Option<Orientation>,
    /// Applied to all four sides; `None` keeps the engine default.
    pub margin: Option<&'static str>,
    pub encoding: Option<&'static str>,
    pub enable_local_file_access: bool,
    pub quiet: bool,
}

impl PageOptions {
    /// Letter, portrait, UTF-8 with local file access. Fuel reports get
    /// 0.2in margins, timesheets 0.3in.
    pub fn for_report(kind: ReportKind) -> Self {
        let margin = match kind {
            ReportKind::Fuel => "0.2in",
            ReportKind::Timesheet => "0.3in",
        };
        Self {
            page_size: "Letter",
            orientation: Some(Orientation::Portrait),
            margin: Some(margin),
            encoding: Some("UTF-8"),
            enable_local_file_access: true,
            quiet: true,
        }
    }

    /// Minimal options for the functional self-test.
    pub fn self_test() -> Self {
        Self {
            page_size: "A4",
            orientation: None,
            margin: None,
            encoding: None,
            enable_local_file_access: false,
            quiet: true,
        }
    }

    /// Command-line flags for wkhtmltopdf.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.quiet {
            args.push("--quiet".to_string());
        }
        args.push("--page-size".to_string());
        args.push(self.page_size.to_string());
        if let Some(orientation) = self.orientation {
            args.push("--orientation".to_string());
            args.push(orientation.as_arg().to_string());
        }
        if let Some(margin) = self.margin {
            for side in ["top", "right", "bottom", "left"] {
                args.push(format!("--margin-{}", side));
                args.push(margin.to_string());
            }
        }
        if let Some(encoding) = self.encoding {
            args.push("--encoding".to_string());
            args.push(encoding.to_string());
        }
        if self.enable_local_file_access {
            args.push("--enable-local-file-access".to_string());
        }
        args
    }
}

/// What the startup probe found out about the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineStatus {
    pub installed: bool,
    pub functional: bool,
    pub version: Option<String>,
    pub binary: Option<PathBuf>,
}

pub trait Renderer: Send + Sync {
    /// Renders `markup` to PDF bytes.
    fn render(&self, markup: &str, options: &PageOptions) -> Result<Vec<u8>, RenderError>;

    /// Renders a tiny page and checks that something came out.
    fn self_test(&self) -> Result<(), RenderError>;

    fn status(&self) -> EngineStatus;
}

/// Renderer backed by the `wkhtmltopdf` binary.
pub struct Wkhtmltopdf {
    display: Option<String>,
    status: EngineStatus,
}

impl Wkhtmltopdf {
    pub fn probe(config: &EngineConfig) -> Self {
        let mut renderer = Self {
            display: config.display.clone(),
            status: EngineStatus::default(),
        };

        let Some((binary, version)) = locate(config.binary.as_deref()) else {
            error!("wkhtmltopdf not found; PDF generation is unavailable");
            return renderer;
        };
        info!("wkhtmltopdf found at {}: {}", binary.display(), version);
        renderer.status = EngineStatus {
            installed: true,
            functional: false,
            version: Some(version),
            binary: Some(binary),
        };

        match renderer.self_test() {
            Ok(()) => {
                info!("wkhtmltopdf functionality test passed");
                renderer.status.functional = true;
            }
            Err(e) => warn!(
                "wkhtmltopdf found but not functional, PDF generation may fail: {}",
                e
            ),
        }
        renderer
    }

    fn binary(&self) -> Result<&Path, RenderError> {
        self.status.binary.as_deref().ok_or_else(|| {
            RenderError::Unavailable(
                "wkhtmltopdf is not installed. Please check Docker image setup.".to_string(),
            )
        })
    }

    fn run(&self, binary: &Path, markup: &str, options: &PageOptions) -> Result<Vec<u8>, RenderError> {
        let mut cmd = Command::new(binary);
        cmd.args(options.to_args())
            // Read the page from stdin, write the PDF to stdout.
            .arg("-")
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(display) = &self.display {
            cmd.env("DISPLAY", display);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| RenderError::Failed(format!("could not start {}: {}", binary.display(), e)))?;

        // Feed stdin from another thread so a chatty child cannot deadlock us.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RenderError::Failed("engine stdin was not captured".to_string()))?;
        let input = markup.to_owned();
        let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child
            .wait_with_output()
            .map_err(|e| RenderError::Failed(format!("waiting for engine: {}", e)))?;
        let written = writer.join();

        // A failing engine may close stdin early; its exit status explains more
        // than the broken pipe does.
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::Failed(format!(
                "engine exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(RenderError::Failed(format!("writing markup: {}", e))),
            Err(_) => return Err(RenderError::Failed("markup writer panicked".to_string())),
        }
        if output.stdout.is_empty() {
            return Err(RenderError::Failed("engine produced an empty document".to_string()));
        }
        Ok(output.stdout)
    }
}

impl Renderer for Wkhtmltopdf {
    fn render(&self, markup: &str, options: &PageOptions) -> Result<Vec<u8>, RenderError> {
        let binary = self.binary()?;
        if !self.status.functional {
            self.self_test().map_err(|e| {
                RenderError::Unavailable(format!(
                    "wkhtmltopdf is installed but not functional. Check container environment. ({})",
                    e
                ))
            })?;
        }
        self.run(binary, markup, options)
    }

    fn self_test(&self) -> Result<(), RenderError> {
        let binary = self.binary()?;
        self.run(binary, SELF_TEST_HTML, &PageOptions::self_test())
            .map(|_| ())
    }

    fn status(&self) -> EngineStatus {
        self.status.clone()
    }
}

/// Finds a wkhtmltopdf binary that answers `--version`.
fn locate(configured: Option<&Path>) -> Option<(PathBuf, String)> {
    if let Some(path) = configured {
        return version_of(path).map(|v| (path.to_path_buf(), v));
    }
    if let Some(version) = version_of(Path::new(BINARY_NAME)) {
        return Some((PathBuf::from(BINARY_NAME), version));
    }
    WINDOWS_INSTALL_PATHS
        .iter()
        .map(Path::new)
        .filter(|path| path.exists())
        .find_map(|path| version_of(path).map(|v| (path.to_path_buf(), v)))
}

/// Runs `<binary> --version` and returns the version token.
fn version_of(binary: &Path) -> Option<String> {
    let output = Command::new(binary).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Some(
        stdout
            .split_whitespace()
            .nth(1)
            .unwrap_or("version unknown")
            .to_string(),
    )
}

#[cfg(test)]
pub mod fake {
    //! Renderers for tests that must not depend on wkhtmltopdf.

    use super::*;
    use std::sync::Mutex;

    /// Always returns the same bytes and remembers what it was asked to render.
    pub struct FixedRenderer {
        bytes: Vec<u8>,
        pub calls: Mutex<Vec<(String, PageOptions)>>,
    }

    impl FixedRenderer {
        pub fn new(bytes: &[u8]) -> Self {
            Self {
                bytes: bytes.to_vec(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl Renderer for FixedRenderer {
        fn render(&self, markup: &str, options: &PageOptions) -> Result<Vec<u8>, RenderError> {
            self.calls
                .lock()
                .unwrap()
                .push((markup.to_string(), options.clone()));
            Ok(self.bytes.clone())
        }

        fn self_test(&self) -> Result<(), RenderError> {
            Ok(())
        }

        fn status(&self) -> EngineStatus {
            EngineStatus {
                installed: true,
                functional: true,
                version: Some("fake".to_string()),
                binary: None,
            }
        }
    }

    /// Behaves like a host without the engine.
    pub struct MissingRenderer;

    impl Renderer for MissingRenderer {
        fn render(&self, _markup: &str, _options: &PageOptions) -> Result<Vec<u8>, RenderError> {
            Err(RenderError::Unavailable(
                "wkhtmltopdf is not installed. Please check Docker image setup.".to_string(),
            ))
        }

        fn self_test(&self) -> Result<(), RenderError> {
            self.render(SELF_TEST_HTML, &PageOptions::self_test()).map(|_| ())
        }

        fn status(&self) -> EngineStatus {
            EngineStatus::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_options_differ_only_in_margins() {
        let fuel = PageOptions::for_report(ReportKind::Fuel);
        let timesheet = PageOptions::for_report(ReportKind::Timesheet);

        assert_eq!(fuel.margin, Some("0.2in"));
        assert_eq!(timesheet.margin, Some("0.3in"));
        for options in [&fuel, &timesheet] {
            assert_eq!(options.page_size, "Letter");
            assert_eq!(options.orientation, Some(Orientation::Portrait));
            assert_eq!(options.encoding, Some("UTF-8"));
            assert!(options.enable_local_file_access);
        }
    }

    #[test]
    fn args_spell_out_every_margin() {
        let args = PageOptions::for_report(ReportKind::Timesheet).to_args();
        let joined = args.join(" ");
        assert!(joined.starts_with("--quiet --page-size Letter --orientation Portrait"));
        for side in ["top", "right", "bottom", "left"] {
            assert!(joined.contains(&format!("--margin-{} 0.3in", side)));
        }
        assert!(joined.ends_with("--encoding UTF-8 --enable-local-file-access"));
    }

    #[test]
    fn self_test_args_are_minimal() {
        assert_eq!(
            PageOptions::self_test().to_args(),
            vec!["--quiet", "--page-size", "A4"]
        );
    }

    #[test]
    fn missing_binary_is_reported_unavailable() {
        let config = EngineConfig {
            binary: Some(PathBuf::from("/nonexistent/wkhtmltopdf")),
            display: None,
        };
        let renderer = Wkhtmltopdf::probe(&config);
        assert!(!renderer.status().installed);

        let err = renderer
            .render("<p>hi</p>", &PageOptions::for_report(ReportKind::Fuel))
            .unwrap_err();
        assert!(matches!(err, RenderError::Unavailable(_)));
        assert!(err.to_string().contains("not installed"));
    }

    #[cfg(unix)]
    mod script_engine {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::sync::Mutex;

        // Writing an executable while another test forks can yield ETXTBSY.
        static SPAWN_LOCK: Mutex<()> = Mutex::new(());

        fn write_engine(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("wkhtmltopdf");
            let script = format!(
                "#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then echo 'wkhtmltopdf 0.12.6 (with patched qt)'; exit 0; fi\n{}\n",
                body
            );
            std::fs::write(&path, script).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn working_engine_streams_stdout_back() {
            let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            let dir = tempfile::tempdir().unwrap();
            let binary = write_engine(dir.path(), "cat");

            let renderer = Wkhtmltopdf::probe(&EngineConfig {
                binary: Some(binary),
                display: Some(":99".to_string()),
            });
            let status = renderer.status();
            assert!(status.installed);
            assert!(status.functional);
            assert_eq!(status.version.as_deref(), Some("0.12.6"));

            let pdf = renderer
                .render("<p>hello</p>", &PageOptions::for_report(ReportKind::Fuel))
                .unwrap();
            assert_eq!(pdf, b"<p>hello</p>");
        }

        #[test]
        fn broken_engine_is_unavailable_after_retest() {
            let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            let dir = tempfile::tempdir().unwrap();
            let binary = write_engine(dir.path(), "echo 'cannot connect to X server' >&2\nexit 1");

            let renderer = Wkhtmltopdf::probe(&EngineConfig {
                binary: Some(binary),
                display: None,
            });
            assert!(renderer.status().installed);
            assert!(!renderer.status().functional);

            let err = renderer
                .render("<p>x</p>", &PageOptions::for_report(ReportKind::Timesheet))
                .unwrap_err();
            assert!(matches!(err, RenderError::Unavailable(_)));
            assert!(err.to_string().contains("cannot connect to X server"));
        }

        #[test]
        fn empty_output_is_a_render_failure() {
            let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            let dir = tempfile::tempdir().unwrap();
            let binary = write_engine(dir.path(), "cat > /dev/null");

            let renderer = Wkhtmltopdf::probe(&EngineConfig {
                binary: Some(binary.clone()),
                display: None,
            });
            let err = renderer
                .run(&binary, "<p>x</p>", &PageOptions::self_test())
                .unwrap_err();
            assert!(matches!(err, RenderError::Failed(_)));
            assert!(err.to_string().contains("empty document"));
        }
    }
}
