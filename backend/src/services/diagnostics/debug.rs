use crate::report::aggregate::{aggregate, CellHours};
use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder};
use common::model::submission::Submission;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

const FORM_SAMPLE_SIZE: usize = 10;

#[derive(Debug, Serialize)]
pub struct TempStatus {
    pub temp_dir: String,
    pub exists: bool,
    pub writable: bool,
    pub files: Vec<String>,
    pub wkhtmltopdf_installed: bool,
    pub wkhtmltopdf_functional: bool,
    pub wkhtmltopdf_version: Option<String>,
    pub wkhtmltopdf_error: Option<String>,
    pub display_env: String,
    pub container_mode: bool,
    pub xvfb_running: bool,
    pub fonts_available: usize,
}

#[derive(Debug, Serialize)]
pub struct EnvironmentInfo {
    pub platform: String,
    pub container_mode: bool,
    pub display_env: String,
    pub temp_dir: String,
    pub wkhtmltopdf_installed: bool,
    pub timezone: String,
    /// Output of `node --version`, or `false` when node is missing.
    pub node_available: Value,
}

#[derive(Debug, Serialize)]
pub struct TimesheetTrace {
    pub success: bool,
    pub total_days: u32,
    pub total_hours: f64,
    pub hours_breakdown: BTreeMap<String, Value>,
    pub form_data_sample: BTreeMap<String, String>,
    pub total_form_fields: usize,
}

/// Host facts gathered by shelling out; collected on the blocking pool.
struct HostProbe {
    self_test_error: Option<String>,
    xvfb_running: bool,
    fonts_available: usize,
}

pub async fn temp(state: web::Data<AppState>) -> impl Responder {
    let store = state.pipeline.store();
    let temp_dir = store.base_dir().to_path_buf();
    let engine = state.pipeline.renderer().status();

    let files = store.list().unwrap_or_else(|e| {
        warn!("Could not list {}: {}", temp_dir.display(), e);
        Vec::new()
    });

    let pipeline = state.pipeline.clone();
    let installed = engine.installed;
    let probe = tokio::task::spawn_blocking(move || HostProbe {
        self_test_error: installed
            .then(|| pipeline.renderer().self_test().err().map(|e| e.to_string()))
            .flatten(),
        xvfb_running: xvfb_running(),
        fonts_available: count_fonts(),
    })
    .await;
    let probe = match probe {
        Ok(probe) => probe,
        Err(e) => HostProbe {
            self_test_error: Some(format!("Task join error: {}", e)),
            xvfb_running: false,
            fonts_available: 0,
        },
    };

    HttpResponse::Ok().json(TempStatus {
        temp_dir: temp_dir.display().to_string(),
        exists: temp_dir.exists(),
        writable: is_writable(&temp_dir),
        files,
        wkhtmltopdf_installed: engine.installed,
        wkhtmltopdf_functional: engine.functional,
        wkhtmltopdf_version: engine.version,
        wkhtmltopdf_error: probe.self_test_error,
        display_env: display_env(&state),
        container_mode: state.config.container_mode,
        xvfb_running: probe.xvfb_running,
        fonts_available: probe.fonts_available,
    })
}

pub async fn environment(state: web::Data<AppState>) -> impl Responder {
    let node = tokio::task::spawn_blocking(node_version)
        .await
        .ok()
        .flatten();

    HttpResponse::Ok().json(EnvironmentInfo {
        platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
        container_mode: state.config.container_mode,
        display_env: display_env(&state),
        temp_dir: state.config.temp_dir.display().to_string(),
        wkhtmltopdf_installed: state.pipeline.renderer().status().installed,
        timezone: std::env::var("TZ").unwrap_or_else(|_| "Not set".to_string()),
        node_available: node.map(Value::String).unwrap_or(Value::Bool(false)),
    })
}

pub async fn test_timesheet_data(payload: web::Json<Submission>) -> impl Responder {
    let submission = payload.into_inner();
    debug!(
        "Received timesheet fields: {:?}",
        submission.iter().map(|(k, _)| k).collect::<Vec<_>>()
    );

    let agg = aggregate(&submission);
    let hours_breakdown = agg
        .breakdown
        .iter()
        .filter_map(|(key, cell)| {
            let value = match cell {
                CellHours::Counted(hours) => Value::from(*hours),
                CellHours::Invalid(raw) => Value::String(format!("INVALID: {}", raw)),
                CellHours::NotPositive(_) => return None,
            };
            Some((key.clone(), value))
        })
        .collect();

    HttpResponse::Ok().json(TimesheetTrace {
        success: true,
        total_days: agg.total_days,
        total_hours: agg.total_hours,
        hours_breakdown,
        form_data_sample: submission
            .iter()
            .take(FORM_SAMPLE_SIZE)
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        total_form_fields: submission.len(),
    })
}

fn display_env(state: &AppState) -> String {
    state
        .config
        .engine
        .display
        .clone()
        .unwrap_or_else(|| "Not set".to_string())
}

fn is_writable(dir: &Path) -> bool {
    std::fs::metadata(dir)
        .map(|meta| meta.is_dir() && !meta.permissions().readonly())
        .unwrap_or(false)
}

fn xvfb_running() -> bool {
    Command::new("pgrep")
        .arg("Xvfb")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn count_fonts() -> usize {
    match Command::new("fc-list").output() {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .count(),
        _ => 0,
    }
}

fn node_version() -> Option<String> {
    let out = Command::new("node").arg("--version").output().ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).trim().to_string())
}
