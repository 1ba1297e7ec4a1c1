#[path = "../src/backup.rs"]
mod backup;

use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;
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

const DATASET: &str = r#"{"students":[{"id":"s1","name":"Amina","age":22,"note":"","photo":"","languages":["Rust"]}],"seats":{"c1_t0":"s1"}}"#;

#[test]
fn zip_export_and_import_roundtrip() {
    let out_dir = temp_dir("rosterd-backup-out");
    let bundle_path = out_dir.join("roster.rosterbackup.zip");

    let export = backup::export_dataset_bundle(DATASET, &bundle_path).expect("export bundle");
    assert_eq!(export.bundle_format, backup::BUNDLE_FORMAT_V1);
    assert_eq!(export.entry_count, 2);
    assert_eq!(export.sha256, backup::sha256_hex(DATASET.as_bytes()));
    assert_eq!(export.sha256.len(), 64);

    let f = File::open(&bundle_path).expect("open bundle");
    let mut archive = zip::ZipArchive::new(f).expect("open zip archive");
    let mut manifest = String::new();
    archive
        .by_name("manifest.json")
        .expect("manifest entry")
        .read_to_string(&mut manifest)
        .expect("read manifest");
    assert!(manifest.contains(backup::BUNDLE_FORMAT_V1));
    assert!(manifest.contains(&export.sha256));
    archive
        .by_name("data/classroomData.json")
        .expect("dataset entry in bundle");

    let import = backup::import_dataset_bundle(&bundle_path).expect("import bundle");
    assert_eq!(import.bundle_format_detected, backup::BUNDLE_FORMAT_V1);
    assert_eq!(import.dataset_json, DATASET);

    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn plain_json_import_is_supported() {
    let out_dir = temp_dir("rosterd-backup-plain");
    let plain = out_dir.join("classroomData.json");
    std::fs::write(&plain, DATASET).expect("write plain export");

    let import = backup::import_dataset_bundle(&plain).expect("import plain json");
    assert_eq!(import.bundle_format_detected, backup::PLAIN_JSON_FORMAT);
    assert_eq!(import.dataset_json, DATASET);

    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn tampered_dataset_entry_is_rejected() {
    let out_dir = temp_dir("rosterd-backup-tampered");
    let bundle_path = out_dir.join("tampered.zip");

    let manifest = serde_json::json!({
        "format": backup::BUNDLE_FORMAT_V1,
        "version": 1,
        "datasetSha256": backup::sha256_hex(b"something else"),
    });
    {
        let f = File::create(&bundle_path).expect("create bundle");
        let mut zip = zip::ZipWriter::new(f);
        let opts = zip::write::FileOptions::default();
        zip.start_file("manifest.json", opts).expect("manifest entry");
        zip.write_all(manifest.to_string().as_bytes())
            .expect("write manifest");
        zip.start_file("data/classroomData.json", opts)
            .expect("dataset entry");
        zip.write_all(DATASET.as_bytes()).expect("write dataset");
        zip.finish().expect("finish zip");
    }

    let err = backup::import_dataset_bundle(&bundle_path).expect_err("checksum mismatch");
    assert!(err.to_string().contains("checksum mismatch"), "{err:#}");

    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn unknown_bundle_format_is_rejected() {
    let out_dir = temp_dir("rosterd-backup-format");
    let bundle_path = out_dir.join("other.zip");
    {
        let f = File::create(&bundle_path).expect("create bundle");
        let mut zip = zip::ZipWriter::new(f);
        zip.start_file("manifest.json", zip::write::FileOptions::default())
            .expect("manifest entry");
        zip.write_all(br#"{"format":"markbook-workspace-v2"}"#)
            .expect("write manifest");
        zip.finish().expect("finish zip");
    }

    let err = backup::import_dataset_bundle(&bundle_path).expect_err("bad format");
    assert!(err.to_string().contains("unsupported bundle format"));

    let _ = std::fs::remove_dir_all(out_dir);
}
