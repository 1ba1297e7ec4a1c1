use crate::error::StoreError;
use crate::ipc::helpers::{get_optional_str, get_required_str, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::session::{EditorMode, Session};
use crate::storage::{self, Backend};
use crate::store::Store;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

fn dataset_state(store: &Store) -> &'static str {
    match store.try_load() {
        Ok(Some(_)) => "ok",
        Ok(None) => "empty",
        Err(StoreError::CorruptState { .. }) => "corrupt",
        Err(_) => "unreadable",
    }
}

fn handle_health(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let editor = state.session.editor().map(|mode| match mode {
        EditorMode::Create => json!({ "mode": "create" }),
        EditorMode::Edit(id) => json!({ "mode": "edit", "studentId": id }),
    });
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
        "backend": state.backend.as_str(),
        "storage": state.store.as_ref().map(|s| s.describe()),
        "datasetState": state.store.as_ref().map(dataset_state),
        "session": {
            "editor": editor,
            "pickerSeat": state.session.picker_seat(),
            "dragging": state.session.dragged(),
        },
    }))
}

/// Opens `path` with `backend`, seeding it if empty, and makes it the active workspace.
pub fn select_workspace(
    state: &mut AppState,
    path: &Path,
    backend: Backend,
) -> Result<(), HandlerErr> {
    let storage = storage::open_storage(backend, path)
        .map_err(|e| HandlerErr::new("workspace_open_failed", format!("{e:#}")))?;
    let mut store = Store::new(storage);
    let data = store.load()?;
    info!(
        workspace = %path.to_string_lossy(),
        backend = %backend,
        students = data.students.len(),
        seats = data.seats.len(),
        "workspace opened"
    );
    state.workspace = Some(path.to_path_buf());
    state.backend = backend;
    state.store = Some(store);
    state.session = Session::default();
    Ok(())
}

fn handle_workspace_select(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let path = PathBuf::from(get_required_str(&req.params, "path")?);
    let backend = match get_optional_str(&req.params, "backend") {
        Some(b) => b
            .parse::<Backend>()
            .map_err(|e| HandlerErr::new("bad_params", e))?,
        None => state.backend,
    };
    select_workspace(state, &path, backend)?;
    Ok(json!({
        "workspacePath": path.to_string_lossy(),
        "backend": backend.as_str(),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(respond(&req.id, handle_health(state))),
        "workspace.select" => Some(respond(&req.id, handle_workspace_select(state, req))),
        _ => None,
    }
}
