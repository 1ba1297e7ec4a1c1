use crate::ipc::helpers::{get_required_str, respond, store_mut, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_get(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let layout = state.layout;
    let data = store_mut(state)?.load()?;
    let outside: Vec<&String> = data.seats.keys().filter(|k| !layout.contains(k)).collect();
    Ok(json!({
        "seats": &data.seats,
        "seatKeys": layout.seat_keys(),
        "classrooms": layout.board(&data),
        "outsideLayout": outside,
    }))
}

fn handle_assign(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(&req.params, "studentId")?;
    let seat_key = get_required_str(&req.params, "seatKey")?;
    let store = store_mut(state)?;
    store.assign_seat(&student_id, &seat_key)?;
    Ok(json!({ "seats": store.load()?.seats }))
}

fn handle_unassign(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let seat_key = get_required_str(&req.params, "seatKey")?;
    let store = store_mut(state)?;
    store.unassign_seat(&seat_key)?;
    Ok(json!({ "seats": store.load()?.seats }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "seating.get" => handle_get(state),
        "seating.assign" => handle_assign(state, req),
        "seating.unassign" => handle_unassign(state, req),
        _ => return None,
    };
    Some(respond(&req.id, res))
}
