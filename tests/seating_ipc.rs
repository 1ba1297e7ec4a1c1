use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rosterd");
    let mut child = Command::new(exe)
        .env_remove("ROSTERD_WORKSPACE")
        .env_remove("ROSTERD_BACKEND")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rosterd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn open_workspace(prefix: &str) -> (PathBuf, Child, ChildStdin, BufReader<ChildStdout>) {
    let workspace = temp_dir(prefix);
    let (child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    (workspace, child, stdin, reader)
}

fn seats(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>, id: &str) -> serde_json::Value {
    request_ok(stdin, reader, id, "seating.get", json!({}))
        .get("seats")
        .cloned()
        .unwrap_or_else(|| json!({}))
}

#[test]
fn moving_a_student_vacates_previous_seat() {
    let (workspace, _child, mut stdin, mut reader) = open_workspace("rosterd-seating-move");

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.create",
        json!({ "name": "Amina", "age": 22 }),
    );
    let x = created
        .get("studentId")
        .and_then(|v| v.as_str())
        .expect("studentId")
        .to_string();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "seating.assign",
        json!({ "studentId": x, "seatKey": "c1_t0" }),
    );
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "seating.assign",
        json!({ "studentId": x, "seatKey": "c2_t1" }),
    );
    assert_eq!(res.get("seats"), Some(&json!({ "c2_t1": x })));
    assert_eq!(seats(&mut stdin, &mut reader, "4"), json!({ "c2_t1": x }));

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn assigning_unknown_student_is_rejected() {
    let (workspace, _child, mut stdin, mut reader) = open_workspace("rosterd-seating-unknown");

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "seating.assign",
        json!({ "studentId": "nobody", "seatKey": "c1_t0" }),
    );
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        resp.get("error").and_then(|e| e.get("code")).and_then(|v| v.as_str()),
        Some("not_found")
    );
    assert_eq!(seats(&mut stdin, &mut reader, "2"), json!({}));

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn unassign_is_idempotent() {
    let (workspace, _child, mut stdin, mut reader) = open_workspace("rosterd-seating-unassign");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "seating.assign",
        json!({ "studentId": "s2", "seatKey": "c3_t3" }),
    );
    let once = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "seating.unassign",
        json!({ "seatKey": "c3_t3" }),
    );
    let twice = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "seating.unassign",
        json!({ "seatKey": "c3_t3" }),
    );
    assert_eq!(once, twice);
    assert_eq!(once.get("seats"), Some(&json!({})));

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn board_reports_layout_and_foreign_keys() {
    let (workspace, _child, mut stdin, mut reader) = open_workspace("rosterd-seating-board");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "seating.assign",
        json!({ "studentId": "s3", "seatKey": "c2_t3" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "seating.assign",
        json!({ "studentId": "s1", "seatKey": "library" }),
    );

    let board = request_ok(&mut stdin, &mut reader, "3", "seating.get", json!({}));
    let classrooms = board
        .get("classrooms")
        .and_then(|v| v.as_array())
        .expect("classrooms");
    assert_eq!(classrooms.len(), 3);
    let tables = classrooms[1]
        .get("tables")
        .and_then(|v| v.as_array())
        .expect("tables");
    assert_eq!(tables.len(), 4);
    assert_eq!(tables[3].get("seatKey").and_then(|v| v.as_str()), Some("c2_t3"));
    assert_eq!(
        tables[3]
            .get("occupant")
            .and_then(|o| o.get("name"))
            .and_then(|v| v.as_str()),
        Some("Sarah")
    );
    assert!(tables[0].get("occupant").map(|v| v.is_null()).unwrap_or(false));
    assert_eq!(board.get("outsideLayout"), Some(&json!(["library"])));
    assert_eq!(
        board.get("seatKeys").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(12)
    );

    let _ = std::fs::remove_dir_all(workspace);
}
