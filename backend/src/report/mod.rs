//! # Report Pipeline
//!
//! Turns a form submission into a PDF:
//!
//! 1. **Aggregate**: timesheets get `total_days` and `total_hours_all`
//!    computed from their weekday cells (`aggregate`).
//! 2. **Merge**: the submission, the generated table rows and the logo are
//!    merged into the embedded HTML template for the report kind (`template`).
//! 3. **Render**: the markup goes through the `Renderer` with the page
//!    options of the report kind (`renderer`).
//! 4. **Store** (submit only): the bytes are written to the `ArtifactStore`
//!    under a sanitized download name (`artifact`).
//!
//! Everything here is synchronous and blocking; handlers run it on the
//! blocking thread pool.

pub mod aggregate;
pub mod artifact;
pub mod renderer;
pub mod template;

use crate::error::ReportError;
use artifact::{sanitize_name, ArtifactStore, StoredArtifact};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Local;
use common::model::report::ReportKind;
use common::model::submission::Submission;
use log::{info, warn};
use renderer::{PageOptions, Renderer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use template::{fuel_rows, timesheet_rows, TemplateContext, Templates};

/// A rendered report that has not been stored.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub download_name: String,
    pub bytes: Vec<u8>,
}

pub struct ReportPipeline {
    renderer: Arc<dyn Renderer>,
    store: Arc<dyn ArtifactStore>,
    templates: Templates,
    logo_path: PathBuf,
}

impl ReportPipeline {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        store: Arc<dyn ArtifactStore>,
        logo_path: PathBuf,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            renderer,
            store,
            templates: Templates::new()?,
            logo_path,
        })
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub fn store(&self) -> &dyn ArtifactStore {
        self.store.as_ref()
    }

    pub fn logo_path(&self) -> &Path {
        &self.logo_path
    }

    /// Adds the derived fields the report kind needs.
    pub fn prepare(&self, kind: ReportKind, mut submission: Submission) -> Submission {
        if kind == ReportKind::Timesheet {
            aggregate::aggregate(&submission).apply_to(&mut submission);
        }
        submission
    }

    /// Builds the HTML for a prepared submission.
    pub fn markup(&self, kind: ReportKind, submission: &Submission) -> Result<String, ReportError> {
        let mut ctx = TemplateContext::from_submission(submission);
        match kind {
            ReportKind::Fuel => ctx.insert_markup("fuel_rows", fuel_rows(submission)),
            ReportKind::Timesheet => ctx.insert_markup("timesheet_rows", timesheet_rows(submission)),
        }

        let logo = logo_data_url(&self.logo_path);
        ctx.insert_markup(
            "logo_img",
            logo.as_ref()
                .map(|url| format!(r#"<img class="logo" src="{}" alt="logo">"#, url))
                .unwrap_or_default(),
        );
        ctx.insert_text("logo_base64", logo.as_deref().unwrap_or_default());
        ctx.insert_text(
            "generated_at",
            &Local::now().format("%Y-%m-%d %H:%M").to_string(),
        );
        ctx.insert_text("version", env!("CARGO_PKG_VERSION"));

        self.templates.render(kind, &ctx)
    }

    /// Aggregates, merges and renders without touching the store.
    pub fn render(&self, kind: ReportKind, submission: Submission) -> Result<RenderedReport, ReportError> {
        let submission = self.prepare(kind, submission);
        let markup = self.markup(kind, &submission)?;
        let bytes = self
            .renderer
            .render(&markup, &PageOptions::for_report(kind))?;
        info!("{} PDF generated ({} bytes)", kind.label(), bytes.len());

        Ok(RenderedReport {
            download_name: download_name(kind, &submission),
            bytes,
        })
    }

    /// Renders and stores the report under its download name.
    pub fn submit(&self, kind: ReportKind, submission: Submission) -> Result<StoredArtifact, ReportError> {
        let report = self.render(kind, submission)?;
        Ok(self
            .store
            .store(kind, &report.bytes, &report.download_name)?)
    }
}

/// The caller-visible file name, e.g. `FuelReport_Doe_March_2025.pdf` or
/// `Timesheet_Doe_01_01_2025_-_01_31_2025.pdf`. Always a safe name.
pub fn download_name(kind: ReportKind, submission: &Submission) -> String {
    let subject = submission.get_or(kind.subject_field(), "Unknown");
    let raw = match kind {
        ReportKind::Fuel => format!(
            "FuelReport_{}_{}_{}.pdf",
            subject,
            submission.get_or("month", ""),
            submission.get_or("year", "")
        ),
        ReportKind::Timesheet => format!(
            "Timesheet_{}_{}.pdf",
            subject,
            submission
                .get_or("time_period", "")
                .replace('/', "_")
                .replace(' ', "_")
        ),
    };
    sanitize_name(&raw)
}

/// Reads the logo and encodes it as a `data:` URL for embedding.
pub fn logo_data_url(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(format!("data:image/png;base64,{}", BASE64.encode(bytes))),
        Err(e) => {
            warn!("Error loading logo {}: {}", path.display(), e);
            None
        }
    }
}
