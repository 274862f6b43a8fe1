//! End-to-end runs of the migrator against a throwaway file share

use home_migrate::{Migrator, Settings};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// In-memory sink for the fmt subscriber
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn lines_at(&self, level: &str) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter(|line| line.trim_start().starts_with(level))
            .map(str::to_string)
            .collect()
    }
}

fn with_captured_logs<R>(f: impl FnOnce() -> R) -> (R, CapturedLogs) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, logs)
}

/// Creates a legacy share with two home folders and a settings file
fn create_legacy_share() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    let alice = root.join("home").join("alice1");
    fs::create_dir_all(alice.join("Documents")).unwrap();
    fs::write(alice.join("todo.txt"), "buy milk").unwrap();
    fs::write(alice.join("Documents").join("report.docx"), "q3 numbers").unwrap();

    let bob = root.join("home").join("bob2");
    fs::create_dir_all(&bob).unwrap();
    fs::write(bob.join("secret.txt"), "bob's file").unwrap();

    fs::create_dir_all(root.join("profiles")).unwrap();

    fs::write(
        root.join("users.csv"),
        "Email,ShadowAccount\nalice@x.com,alice1\n",
    )
    .unwrap();

    let settings = format!(
        r#"{{
            "SourcePath": {:?},
            "RProfilesPath": {:?},
            "DestinationPath": {:?},
            "CsvFilePath": {:?},
            "UserHomeFolderName": "Home",
            "TrimToken": "_adm"
        }}"#,
        root.join("home"),
        root.join("profiles"),
        root.join("dest"),
        root.join("users.csv"),
    );
    fs::write(root.join("appsettings.json"), settings).unwrap();

    temp
}

fn load_settings(root: &Path) -> Settings {
    Settings::load(root.join("appsettings.json")).unwrap()
}

#[test]
fn test_mapped_user_is_migrated_and_unmapped_user_is_skipped() {
    let temp = create_legacy_share();
    let root = temp.path();

    let (report, logs) = with_captured_logs(|| {
        Migrator::prepare(load_settings(root))
            .unwrap()
            .run()
            .unwrap()
    });

    let warnings = logs.lines_at("WARN");
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("bob2"));

    // alice@x.com has no "atsym" placeholder, so the email is the folder name
    let alice_home = root.join("dest").join("alice@x.com").join("Home");
    assert_eq!(
        fs::read_to_string(alice_home.join("todo.txt")).unwrap(),
        "buy milk"
    );
    assert_eq!(
        fs::read_to_string(alice_home.join("Documents").join("report.docx")).unwrap(),
        "q3 numbers"
    );

    let dest_entries: Vec<_> = fs::read_dir(root.join("dest"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(dest_entries, vec!["alice@x.com".to_string()]);

    assert_eq!(report.units_seen, 2);
    assert_eq!(report.migrated, 1);
    assert_eq!(report.skipped_unmapped, 1);
    assert_eq!(report.profiles_missing, 1);
    assert_eq!(report.failed, 0);
}

#[test]
fn test_placeholder_email_uses_trimmed_account_and_profile() {
    let temp = create_legacy_share();
    let root = temp.path();

    let carol = root.join("home").join("carol_adm");
    fs::create_dir_all(&carol).unwrap();
    fs::write(carol.join("a.txt"), "home a").unwrap();

    let profile = root.join("profiles").join("carol_adm.V2");
    fs::create_dir_all(profile.join("Desktop")).unwrap();
    fs::write(profile.join("Desktop").join("link.url"), "profile link").unwrap();

    fs::write(
        root.join("users.csv"),
        "Email,ShadowAccount\ncarolATSYMcorp.com,CAROL_ADM\ncarol.other@corp.com,carol_adm\n",
    )
    .unwrap();

    let report = Migrator::prepare(load_settings(root))
        .unwrap()
        .run()
        .unwrap();

    let carol_root = root.join("dest").join("carol");
    assert_eq!(
        fs::read_to_string(carol_root.join("Home").join("a.txt")).unwrap(),
        "home a"
    );
    assert_eq!(
        fs::read_to_string(carol_root.join("Desktop").join("link.url")).unwrap(),
        "profile link"
    );
    assert_eq!(report.migrated, 1);
    assert_eq!(report.profiles_copied, 1);
    // alice1 and bob2 are no longer in the mapping
    assert_eq!(report.skipped_unmapped, 2);
}

#[test]
fn test_rerun_overwrites_destination_files() {
    let temp = create_legacy_share();
    let root = temp.path();

    Migrator::prepare(load_settings(root)).unwrap().run().unwrap();

    let migrated = root
        .join("dest")
        .join("alice@x.com")
        .join("Home")
        .join("todo.txt");
    fs::write(&migrated, "edited after migration").unwrap();

    Migrator::prepare(load_settings(root)).unwrap().run().unwrap();

    assert_eq!(fs::read_to_string(&migrated).unwrap(), "buy milk");
}

#[test]
fn test_missing_csv_aborts_before_touching_destination() {
    let temp = create_legacy_share();
    let root = temp.path();
    fs::remove_file(root.join("users.csv")).unwrap();

    let err = Migrator::prepare(load_settings(root)).err().unwrap();

    assert!(err.to_string().contains("CSV file not found"));
    assert!(!root.join("dest").exists());
}
