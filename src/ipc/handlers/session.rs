use crate::ipc::handlers::students::student_json;
use crate::ipc::helpers::{
    get_optional_str, get_required_str, parse_params, respond, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::NewStudent;
use crate::session::Session;
use crate::store::Store;
use serde_json::json;

fn parts(state: &mut AppState) -> Result<(&mut Session, &mut Store), HandlerErr> {
    let AppState { store, session, .. } = state;
    let store = store
        .as_mut()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))?;
    Ok((session, store))
}

fn handle_editor_open(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_optional_str(&req.params, "studentId");
    let (session, store) = parts(state)?;
    let prefill = session.open_editor(store, student_id.as_deref())?;
    Ok(json!(prefill))
}

fn handle_editor_submit(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let fields: NewStudent = parse_params(&req.params)?;
    let (session, store) = parts(state)?;
    let student_id = session.submit_editor(store, fields)?;
    Ok(json!({ "studentId": student_id }))
}

fn handle_picker_open(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let seat_key = get_required_str(&req.params, "seatKey")?;
    let (session, store) = parts(state)?;
    session.open_picker(&seat_key);
    let data = store.load()?;
    let candidates: Vec<serde_json::Value> =
        data.students.iter().map(|s| student_json(s, &data)).collect();
    Ok(json!({ "seatKey": seat_key, "candidates": candidates }))
}

fn handle_picker_candidates(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let search = get_optional_str(&req.params, "search").unwrap_or_default();
    let (session, store) = parts(state)?;
    let students = session.picker_candidates(store, &search)?;
    let data = store.load()?;
    let candidates: Vec<serde_json::Value> =
        students.iter().map(|s| student_json(s, &data)).collect();
    Ok(json!({ "candidates": candidates }))
}

fn handle_picker_choose(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(&req.params, "studentId")?;
    let (session, store) = parts(state)?;
    let seat_key = session.choose_from_picker(store, &student_id)?;
    Ok(json!({ "seatKey": seat_key, "seats": store.load()?.seats }))
}

fn handle_drag_start(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(&req.params, "studentId")?;
    let (session, store) = parts(state)?;
    session.start_drag(store, &student_id)?;
    Ok(json!({ "studentId": student_id }))
}

fn handle_drag_drop(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let seat_key = get_required_str(&req.params, "seatKey")?;
    let (session, store) = parts(state)?;
    let assigned = session.drop_on(store, &seat_key)?;
    Ok(json!({
        "assigned": assigned.is_some(),
        "studentId": assigned,
        "seats": store.load()?.seats,
    }))
}

fn closed() -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "session.editor.open" => handle_editor_open(state, req),
        "session.editor.submit" => handle_editor_submit(state, req),
        "session.editor.close" => {
            state.session.close_editor();
            closed()
        }
        "session.picker.open" => handle_picker_open(state, req),
        "session.picker.candidates" => handle_picker_candidates(state, req),
        "session.picker.choose" => handle_picker_choose(state, req),
        "session.picker.close" => {
            state.session.close_picker();
            closed()
        }
        "session.drag.start" => handle_drag_start(state, req),
        "session.drag.drop" => handle_drag_drop(state, req),
        "session.drag.end" => {
            state.session.end_drag();
            closed()
        }
        _ => return None,
    };
    Some(respond(&req.id, res))
}
