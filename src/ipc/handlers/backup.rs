use crate::backup;
use crate::ipc::helpers::{get_required_str, respond, store_mut, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::Dataset;
use crate::session::Session;
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

fn backup_err(e: anyhow::Error) -> HandlerErr {
    HandlerErr::new("backup_failed", format!("{e:#}"))
}

fn handle_export(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let out_path = PathBuf::from(get_required_str(&req.params, "outPath")?);
    let data = store_mut(state)?.load()?;
    let text = serde_json::to_string(&data)
        .map_err(|e| HandlerErr::new("backup_failed", e.to_string()))?;
    let summary = backup::export_dataset_bundle(&text, &out_path).map_err(backup_err)?;
    info!(out = %out_path.to_string_lossy(), sha256 = %summary.sha256, "workspace exported");
    Ok(json!({
        "bundleFormat": summary.bundle_format,
        "entryCount": summary.entry_count,
        "sha256": summary.sha256,
    }))
}

fn handle_import(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let in_path = PathBuf::from(get_required_str(&req.params, "inPath")?);
    let store = store_mut(state)?;
    let bundle = backup::import_dataset_bundle(&in_path).map_err(backup_err)?;
    let mut data: Dataset = serde_json::from_str(&bundle.dataset_json)
        .map_err(|e| HandlerErr::new("backup_failed", format!("bundle dataset is invalid: {e}")))?;
    let problems = data.repair();
    if !problems.is_empty() {
        warn!(?problems, "repaired inconsistent dataset from imported bundle");
    }
    store.save(&data)?;
    state.session = Session::default();
    info!(
        input = %in_path.to_string_lossy(),
        format = %bundle.bundle_format_detected,
        students = data.students.len(),
        "workspace imported"
    );
    Ok(json!({
        "bundleFormatDetected": bundle.bundle_format_detected,
        "students": data.students.len(),
        "seats": data.seats.len(),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "backup.exportWorkspace" => handle_export(state, req),
        "backup.importWorkspace" => handle_import(state, req),
        _ => return None,
    };
    Some(respond(&req.id, res))
}
