use crate::ipc::helpers::{respond, store_mut, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::Dataset;
use serde_json::json;

fn handle_load(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let data = store_mut(state)?.load()?;
    Ok(json!(data))
}

fn handle_save(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let raw = req
        .params
        .get("dataset")
        .cloned()
        .ok_or_else(|| HandlerErr::new("bad_params", "missing dataset"))?;
    let data: Dataset = serde_json::from_value(raw)
        .map_err(|e| HandlerErr::new("bad_params", format!("invalid dataset: {e}")))?;
    store_mut(state)?.save(&data)?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dataset.load" => Some(respond(&req.id, handle_load(state))),
        "dataset.save" => Some(respond(&req.id, handle_save(state, req))),
        _ => None,
    }
}
