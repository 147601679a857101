//! # Service Configuration
//!
//! Everything the service needs to know about its environment is read once in
//! `main` through [`AppConfig::from_env`] and then handed to the pipeline and
//! the handlers as plain values. Nothing here is mutated after startup.
//!
//! ## Variables
//!
//! | variable                  | default                 |
//! |---------------------------|-------------------------|
//! | `FUELTIME_HOST`           | `0.0.0.0`               |
//! | `FUELTIME_PORT`           | `5000`                  |
//! | `FUELTIME_TEMP_DIR`       | see [`resolve_temp_dir`]|
//! | `FUELTIME_CONTAINER_ROOT` | `/app`                  |
//! | `FUELTIME_WKHTMLTOPDF`    | looked up on `PATH`     |
//! | `FUELTIME_STATIC_DIR`     | `static`                |
//! | `DISPLAY`                 | `:99` in container mode |

use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_CONTAINER_ROOT: &str = "/app";
const DEFAULT_STATIC_DIR: &str = "static";
const CONTAINER_DISPLAY: &str = ":99";
const WRITE_PROBE_FILE: &str = "test_write.tmp";

/// JSON request bodies above this size are rejected by actix.
pub const JSON_LIMIT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Scratch directory for rendered artifacts.
    pub temp_dir: PathBuf,
    /// True when the container root exists, i.e. we run inside the image.
    pub container_mode: bool,
    pub static_dir: PathBuf,
    pub engine: EngineConfig,
}

/// Where to find the rendering engine and what display to give it.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Explicit path to the wkhtmltopdf binary; `None` means search for it.
    pub binary: Option<PathBuf>,
    /// `DISPLAY` value passed to the engine child process.
    pub display: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let container_root = std::env::var("FUELTIME_CONTAINER_ROOT")
            .unwrap_or_else(|_| DEFAULT_CONTAINER_ROOT.to_string());
        let container_mode = Path::new(&container_root).exists();

        let temp_dir = match std::env::var("FUELTIME_TEMP_DIR") {
            Ok(dir) => ensure_writable_or_fallback(PathBuf::from(dir)),
            Err(_) => resolve_temp_dir(Path::new(&container_root), container_mode),
        };

        let port = match std::env::var("FUELTIME_PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Ignoring invalid FUELTIME_PORT {:?}, using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            Err(_) => DEFAULT_PORT,
        };

        let display = std::env::var("DISPLAY")
            .ok()
            .or_else(|| container_mode.then(|| CONTAINER_DISPLAY.to_string()));

        Self {
            host: std::env::var("FUELTIME_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port,
            temp_dir,
            container_mode,
            static_dir: std::env::var("FUELTIME_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATIC_DIR)),
            engine: EngineConfig {
                binary: std::env::var("FUELTIME_WKHTMLTOPDF").ok().map(PathBuf::from),
                display,
            },
        }
    }

    /// Path of the organization logo embedded in reports.
    pub fn logo_path(&self) -> PathBuf {
        self.static_dir.join("logo.png")
    }
}

/// Picks the scratch directory: `<container_root>/temp` inside the container,
/// `./temp` otherwise, falling back to the system temp dir if the chosen
/// directory cannot be written.
pub fn resolve_temp_dir(container_root: &Path, container_mode: bool) -> PathBuf {
    let preferred = if container_mode {
        container_root.join("temp")
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("temp")
    };
    ensure_writable_or_fallback(preferred)
}

fn ensure_writable_or_fallback(dir: PathBuf) -> PathBuf {
    match probe_writable(&dir) {
        Ok(()) => {
            info!("Temp directory configured: {}", dir.display());
            dir
        }
        Err(e) => {
            let fallback = std::env::temp_dir();
            warn!(
                "Temp directory {} may not be writable ({}), falling back to {}",
                dir.display(),
                e,
                fallback.display()
            );
            fallback
        }
    }
}

/// Creates `dir` if needed and checks a file can be written and removed in it.
pub fn probe_writable(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    let probe = dir.join(WRITE_PROBE_FILE);
    fs::write(&probe, b"test")?;
    fs::remove_file(&probe)
}
