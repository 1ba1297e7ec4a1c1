use crate::ipc::helpers::{
    get_optional_str, get_required_str, parse_params, respond, store_mut, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{Dataset, NewStudent, Student, StudentPatch};
use serde_json::json;

/// Student as the host renders it: stored fields plus resolved photo and seat.
pub fn student_json(s: &Student, data: &Dataset) -> serde_json::Value {
    json!({
        "id": s.id,
        "name": s.name,
        "age": s.age,
        "note": s.note,
        "photo": s.photo,
        "photoUrl": s.photo_url(),
        "languages": s.languages,
        "seatKey": data.seat_of(&s.id),
    })
}

fn handle_list(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let search = get_optional_str(&req.params, "search").unwrap_or_default();
    let data = store_mut(state)?.load()?;
    let students: Vec<serde_json::Value> = data
        .filter_by_name(&search)
        .iter()
        .map(|s| student_json(s, &data))
        .collect();
    Ok(json!({ "students": students }))
}

fn handle_get(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(&req.params, "studentId")?;
    let data = store_mut(state)?.load()?;
    let Some(student) = data.student(&student_id) else {
        return Err(crate::error::StoreError::not_found(student_id).into());
    };
    Ok(student_json(student, &data))
}

fn handle_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let fields: NewStudent = parse_params(&req.params)?;
    let student_id = store_mut(state)?.create_student(fields)?;
    Ok(json!({ "studentId": student_id }))
}

fn handle_update(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(&req.params, "studentId")?;
    let patch: StudentPatch = parse_params(&req.params)?;
    store_mut(state)?.update_student(&student_id, patch)?;
    Ok(json!({ "ok": true }))
}

fn handle_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(&req.params, "studentId")?;
    store_mut(state)?.delete_student(&student_id)?;
    Ok(json!({ "ok": true }))
}

fn handle_add_language(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(&req.params, "studentId")?;
    let language = get_required_str(&req.params, "language")?;
    let languages = store_mut(state)?.add_language(&student_id, &language)?;
    Ok(json!({ "languages": languages }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "students.list" => handle_list(state, req),
        "students.get" => handle_get(state, req),
        "students.create" => handle_create(state, req),
        "students.update" => handle_update(state, req),
        "students.delete" => handle_delete(state, req),
        "students.addLanguage" => handle_add_language(state, req),
        _ => return None,
    };
    Some(respond(&req.id, res))
}
