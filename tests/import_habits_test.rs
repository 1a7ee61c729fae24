use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::{TempDir, tempdir};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const BACKUP_ENTRY: &str = "backup.daylio";

fn goal(id: i64, name: &str, created_at: i64, tag_id: Option<i64>) -> Value {
    let mut goal = json!({
        "goal_id": id,
        "name": name,
        "created_at": created_at,
        "id_avatar": 1,
        "id_challenge": 0,
        "id_icon": 7,
        "order_number": id,
        "reminder_enabled": true,
        "reminder_hour": 21,
        "reminder_minute": 30,
        "repeat_type": 1,
        "repeat_value": 7,
        "state": 0
    });
    if let Some(tag_id) = tag_id {
        goal["id_tag"] = json!(tag_id);
    }
    goal
}

fn backup_document() -> Value {
    json!({
        "version": 15,
        "isReminderOn": true,
        "dayEntries": [],
        "tags": [{ "id": 5, "name": "Meditate", "createdAt": 0, "icon": 1, "order": 1, "state": 0 }],
        "goals": [
            // 2030-01-01, later than any habit date
            goal(1, "Running", 1_893_456_000_000, None),
            goal(2, "Mindfulness", 0, Some(5))
        ],
        "goalEntries": [],
        "goalSuccessWeeks": [],
        "achievements": [{ "name": "AC_FIRST_ENTRY", "AC_FIRST_ENTRY_SEEN": true }]
    })
}

fn write_backup(path: &Path, doc: &Value) {
    let file = fs::File::create(path).expect("create archive");
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    writer.start_file(BACKUP_ENTRY, options).expect("start");
    let payload = STANDARD.encode(serde_json::to_vec(doc).expect("json"));
    writer.write_all(payload.as_bytes()).expect("write");
    writer.start_file("assets/pixel.png", options).expect("start");
    writer.write_all(b"\x89PNG").expect("write");
    writer.finish().expect("finish");
}

fn read_entry(path: &Path, name: &str) -> Vec<u8> {
    let file = fs::File::open(path).expect("open archive");
    let mut archive = zip::ZipArchive::new(file).expect("zip");
    let mut entry = archive.by_name(name).expect("entry");
    let mut out = Vec::new();
    entry.read_to_end(&mut out).expect("read entry");
    out
}

fn read_document(path: &Path) -> Value {
    let payload = read_entry(path, BACKUP_ENTRY);
    let json = STANDARD.decode(payload).expect("base64");
    serde_json::from_slice(&json).expect("json")
}

struct Fixture {
    tmp: TempDir,
}

impl Fixture {
    fn new(csv: &str) -> Self {
        let tmp = tempdir().expect("tempdir");
        write_backup(&tmp.path().join("in.daylio"), &backup_document());
        fs::write(tmp.path().join("habits.csv"), csv).expect("write csv");
        Self { tmp }
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.tmp.path().join(name)
    }

    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("daylio-habit-import");
        cmd.current_dir(self.tmp.path())
            .env("DAYLIO_IMPORT_HOME", self.tmp.path())
            .env("DAYLIO_IMPORT_CONFIG", self.path("missing-config.toml"))
            .env_remove("DAYLIO_ENTRY_ORDER")
            .env_remove("DAYLIO_CREATED_AT_POLICY")
            .env_remove("DAYLIO_SUCCESS_WEEKS")
            .arg("--daylio-file-path")
            .arg(self.path("in.daylio"))
            .arg("--habit-file-path")
            .arg(self.path("habits.csv"));
        cmd
    }
}

fn full_week_csv() -> String {
    let mut csv = String::from("Date,Habit,Notes\n");
    for day in 1..=7 {
        csv.push_str(&format!("2024-01-{day:02},Running,\n"));
    }
    csv.push_str("2024-01-03,Meditate,calm\n");
    csv
}

#[test]
fn import_writes_goal_entries_and_keeps_everything_else() {
    let fx = Fixture::new(&full_week_csv());
    let out = fx.path("out.daylio");

    fx.cmd()
        .arg("--output-file-path")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("goal_entries=8"))
        .stdout(predicate::str::contains(
            "habit \"Meditate\" -> goal 2 via tag 5",
        ));

    let doc = read_document(&out);
    let entries = doc["goalEntries"].as_array().expect("entries");
    assert_eq!(entries.len(), 8);
    // newest first: 2024-01-07 23:00 UTC
    assert_eq!(entries[0]["createdAt"], json!(1_704_668_400_000i64));
    assert_eq!(entries[0]["hour"], json!(23));
    let mut ids: Vec<i64> = entries
        .iter()
        .map(|e| e["id"].as_i64().expect("id"))
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=8).collect::<Vec<_>>());

    assert_eq!(
        doc["goalSuccessWeeks"],
        json!([{
            "create_at_day": 7,
            "create_at_month": 1,
            "create_at_year": 2024,
            "goal_id": 1,
            "week": 1,
            "year": 2024
        }])
    );

    // Running starts 2024-01-01; Mindfulness already started earlier.
    assert_eq!(doc["goals"][0]["created_at"], json!(1_704_067_200_000i64));
    assert_eq!(doc["goals"][1]["created_at"], json!(0));

    let original = backup_document();
    for key in ["version", "isReminderOn", "tags", "achievements", "dayEntries"] {
        assert_eq!(doc[key], original[key], "{key} changed");
    }
    assert_eq!(read_entry(&out, "assets/pixel.png"), b"\x89PNG");
}

#[test]
fn no_output_path_is_a_dry_run() {
    let fx = Fixture::new(&full_week_csv());

    fx.cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("dry-run"))
        .stdout(predicate::str::contains("goal_success_weeks=1"));

    let files: Vec<_> = fs::read_dir(fx.tmp.path())
        .expect("read dir")
        .map(|e| e.expect("entry").file_name())
        .collect();
    assert_eq!(files.len(), 2);
}

#[test]
fn unresolved_habit_fails_without_writing_output() {
    let fx = Fixture::new("Habit,Date\nRunning,2024-01-01\nSwimming,2024-01-02\n");
    let out = fx.path("out.daylio");

    fx.cmd()
        .arg("--output-file-path")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Swimming"));

    assert!(!out.exists());
}

#[test]
fn missing_csv_column_is_reported() {
    let fx = Fixture::new("Habit,Day\nRunning,2024-01-01\n");

    fx.cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required column(s): Date"));
}

#[test]
fn missing_backup_file_names_the_path() {
    let fx = Fixture::new(&full_week_csv());
    fs::remove_file(fx.path("in.daylio")).expect("remove");

    fx.cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("in.daylio"));
}

#[test]
fn flags_and_env_toggle_ordering_and_success_weeks() {
    let fx = Fixture::new(&full_week_csv());
    let out = fx.path("out.daylio");
    let mut before = backup_document();
    before["goalSuccessWeeks"] = json!([{
        "create_at_day": 3,
        "create_at_month": 3,
        "create_at_year": 2019,
        "goal_id": 2,
        "week": 9,
        "year": 2019
    }]);
    write_backup(&fx.path("in.daylio"), &before);

    fx.cmd()
        .env("DAYLIO_ENTRY_ORDER", "oldest-first")
        .arg("--no-success-weeks")
        .arg("--output-file-path")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("goal_success_weeks=unchanged"));

    let doc = read_document(&out);
    // oldest first: 2024-01-01 23:00 UTC
    assert_eq!(doc["goalEntries"][0]["createdAt"], json!(1_704_150_000_000i64));
    assert_eq!(doc["goalSuccessWeeks"], before["goalSuccessWeeks"]);
}

#[test]
fn invalid_config_value_is_fatal() {
    let fx = Fixture::new(&full_week_csv());

    fx.cmd()
        .env("DAYLIO_CREATED_AT_POLICY", "sometimes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid created-at policy"));
}

#[test]
fn json_report_is_machine_readable() {
    let fx = Fixture::new(&full_week_csv());

    let output = fx.cmd().arg("--json").output().expect("run");
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["command"], json!("import-habits"));
    assert_eq!(report["warnings"], json!([]));
    assert!(
        report["details"]
            .as_array()
            .expect("details")
            .contains(&json!("goal_entries=8"))
    );
}
