//! # Artifact Store
//!
//! Rendered reports are kept on disk in the scratch directory until someone
//! downloads them. Storing goes through a scratch file with a generated,
//! timestamped name which is then copied to the caller-visible download
//! name and removed.
//!
//! Retrieval only accepts names made of word characters, `-`, `.` and
//! spaces, and never a name containing `..`. The check runs before the
//! filesystem is touched. Stored files are not cleaned up; retention belongs
//! behind this interface when it is needed.

use chrono::Local;
use common::model::report::ReportKind;
use log::{error, info};
use regex::Regex;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

static SAFE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w\-. ]+$").expect("safe name pattern is valid"));
static UNSAFE_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\-. ]").expect("unsafe char pattern is valid"));

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Invalid filename: {0}")]
    InvalidName(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("File not accessible: {0}")]
    Forbidden(String),

    #[error("artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A report persisted under its download name.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredArtifact {
    pub name: String,
    pub path: PathBuf,
}

impl StoredArtifact {
    pub fn download_url(&self) -> String {
        format!("/download/{}", self.name)
    }
}

pub trait ArtifactStore: Send + Sync {
    /// Persists `bytes` under `download_name`, going through a scratch file.
    fn store(
        &self,
        kind: ReportKind,
        bytes: &[u8],
        download_name: &str,
    ) -> Result<StoredArtifact, ArtifactError>;

    /// Maps a download name to a readable file path.
    fn resolve(&self, name: &str) -> Result<PathBuf, ArtifactError>;

    fn read(&self, name: &str) -> Result<Vec<u8>, ArtifactError> {
        let path = self.resolve(name)?;
        Ok(fs::read(path)?)
    }

    /// Names of the files currently in the store.
    fn list(&self) -> Result<Vec<String>, ArtifactError>;

    fn base_dir(&self) -> &Path;
}

/// True when `name` may be used to retrieve an artifact.
pub fn is_safe_name(name: &str) -> bool {
    SAFE_NAME.is_match(name) && !name.contains("..")
}

/// Turns arbitrary text into a name that passes [`is_safe_name`]: unsafe
/// characters become `_` and runs of dots collapse to one.
pub fn sanitize_name(raw: &str) -> String {
    let mut name = UNSAFE_CHAR.replace_all(raw, "_").into_owned();
    while name.contains("..") {
        name = name.replace("..", ".");
    }
    if name.trim_matches(|c: char| c == '.' || c.is_whitespace()).is_empty() {
        name = "report".to_string();
    }
    name
}

/// Store rooted at a local directory.
pub struct LocalArtifactStore {
    base_dir: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn scratch_prefix(kind: ReportKind) -> String {
        format!(
            "{}_{}_",
            kind.scratch_prefix(),
            Local::now().format("%Y%m%d_%H%M%S")
        )
    }
}

impl ArtifactStore for LocalArtifactStore {
    fn store(
        &self,
        kind: ReportKind,
        bytes: &[u8],
        download_name: &str,
    ) -> Result<StoredArtifact, ArtifactError> {
        if !is_safe_name(download_name) {
            return Err(ArtifactError::InvalidName(download_name.to_string()));
        }
        fs::create_dir_all(&self.base_dir)?;

        // The random suffix keeps two renders in the same second apart.
        let mut scratch = tempfile::Builder::new()
            .prefix(&Self::scratch_prefix(kind))
            .suffix(".pdf")
            .tempfile_in(&self.base_dir)?;
        scratch.write_all(bytes)?;
        scratch.flush()?;

        let path = self.base_dir.join(download_name);
        fs::copy(scratch.path(), &path)?;
        scratch.close()?;

        info!("Stored {} at {}", download_name, path.display());
        Ok(StoredArtifact {
            name: download_name.to_string(),
            path,
        })
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        if !is_safe_name(name) {
            error!("Invalid filename attempted: {}", name);
            return Err(ArtifactError::InvalidName(name.to_string()));
        }

        let path = self.base_dir.join(name);
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(ArtifactError::NotFound(name.to_string())),
            Err(e) => return Err(classify_open_error(name, e)),
        }
        fs::File::open(&path).map_err(|e| classify_open_error(name, e))?;
        Ok(path)
    }

    fn list(&self) -> Result<Vec<String>, ArtifactError> {
        let entries = match fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names = Vec::new();
        for entry in entries {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

fn classify_open_error(name: &str, err: std::io::Error) -> ArtifactError {
    match err.kind() {
        ErrorKind::NotFound => ArtifactError::NotFound(name.to_string()),
        ErrorKind::PermissionDenied => ArtifactError::Forbidden(name.to_string()),
        _ => ArtifactError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_then_read_returns_same_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path());
        let bytes = b"%PDF-1.4 fake body \x00\x01\x02";

        let artifact = store
            .store(ReportKind::Fuel, bytes, "FuelReport_Doe_March_2025.pdf")
            .unwrap();
        assert_eq!(artifact.download_url(), "/download/FuelReport_Doe_March_2025.pdf");
        assert_eq!(store.read(&artifact.name).unwrap(), bytes);
    }

    #[test]
    fn scratch_file_is_removed_after_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path());

        store
            .store(ReportKind::Timesheet, b"pdf", "Timesheet_Doe_Week_1.pdf")
            .unwrap();
        assert_eq!(store.list().unwrap(), vec!["Timesheet_Doe_Week_1.pdf".to_string()]);
    }

    #[test]
    fn store_creates_missing_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path().join("nested").join("temp"));
        store.store(ReportKind::Fuel, b"pdf", "a.pdf").unwrap();
        assert!(store.base_dir().join("a.pdf").is_file());
    }

    #[test]
    fn unsafe_names_are_rejected_even_if_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path().join("temp"));
        fs::create_dir_all(store.base_dir()).unwrap();
        fs::write(dir.path().join("secret.txt"), b"secret").unwrap();
        fs::write(store.base_dir().join("a..b.pdf"), b"x").unwrap();

        for name in ["../secret.txt", "../../etc/passwd", "a..b.pdf", "x/y.pdf", "", "r;m.pdf"] {
            assert!(
                matches!(store.resolve(name), Err(ArtifactError::InvalidName(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path());
        assert!(matches!(
            store.resolve("nothing here.pdf"),
            Err(ArtifactError::NotFound(_))
        ));
    }

    #[test]
    fn directories_are_not_served() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let store = LocalArtifactStore::new(dir.path());
        assert!(matches!(store.resolve("sub"), Err(ArtifactError::NotFound(_))));
    }

    #[test]
    fn permission_errors_map_to_forbidden() {
        let err = std::io::Error::new(ErrorKind::PermissionDenied, "denied");
        assert!(matches!(
            classify_open_error("a.pdf", err),
            ArtifactError::Forbidden(_)
        ));
        let err = std::io::Error::new(ErrorKind::Other, "boom");
        assert!(matches!(classify_open_error("a.pdf", err), ArtifactError::Io(_)));
    }

    #[test]
    fn store_refuses_unsafe_download_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path());
        assert!(matches!(
            store.store(ReportKind::Fuel, b"pdf", "../escape.pdf"),
            Err(ArtifactError::InvalidName(_))
        ));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn safe_names() {
        assert!(is_safe_name("Timesheet_Jane Doe_01_2025.pdf"));
        assert!(is_safe_name("Fuel-Report.pdf"));
        assert!(is_safe_name("Überstunden_März.pdf"));
        assert!(!is_safe_name("a/b.pdf"));
        assert!(!is_safe_name("..pdf"));
        assert!(!is_safe_name("a\\b.pdf"));
    }

    #[test]
    fn sanitize_produces_safe_names() {
        assert_eq!(sanitize_name("FuelReport_O'Neil_3/2025.pdf"), "FuelReport_O_Neil_3_2025.pdf");
        assert_eq!(sanitize_name("Timesheet_../../etc.pdf"), "Timesheet_._._etc.pdf");
        assert_eq!(sanitize_name("a...pdf"), "a.pdf");
        assert_eq!(sanitize_name("...."), "report");
        for raw in ["../../x", "a\0b", "<>:|?*", "...."] {
            assert!(is_safe_name(&sanitize_name(raw)), "{raw:?}");
        }
    }

    #[test]
    fn list_of_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path().join("absent"));
        assert!(store.list().unwrap().is_empty());
    }
}
