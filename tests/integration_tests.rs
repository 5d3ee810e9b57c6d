/// Integration tests for tidyup
///
/// These tests drive whole runs against temporary trees: plan, apply, undo,
/// and the command-line entry point.
///
/// Test categories:
/// 1. Organizer workflows
/// 2. Renamer workflows
/// 3. Undo
/// 4. Command line and configuration
/// 5. Edge cases and error scenarios
use clap::Parser;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tidyup::audit_log::{ItemStatus, read_log};
use tidyup::cli::{Cli, run_cli};
use tidyup::config::FilterRules;
use tidyup::error::OrganizeError;
use tidyup::file_organizer::FileOrganizer;
use tidyup::plan::{
    OrganizeOptions, RenameOptions, UnclassifiedPolicy, build_organize_plan, build_rename_plan,
};
use tidyup::timestamp::{NameFormat, StampOrigin, Timestamp, TimestampSource};
use tidyup::undo::{UndoManager, UndoOutcome};
use tidyup::CompiledFilters;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary directory with helpers for building and checking trees.
///
/// The root is canonicalized so it compares equal to the paths plans hold.
struct TestFixture {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = fs::canonicalize(temp_dir.path()).expect("Failed to canonicalize temp dir");
        TestFixture {
            _temp_dir: temp_dir,
            root,
        }
    }

    fn path(&self) -> &Path {
        &self.root
    }

    /// Create a file, including any missing parent folders.
    fn create_file(&self, name: &str, content: &[u8]) {
        let file_path = self.path().join(name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
    }

    fn create_text_file(&self, name: &str, content: &str) {
        self.create_file(name, content.as_bytes());
    }

    fn create_files(&self, names: &[&str]) {
        for name in names {
            self.create_text_file(name, name);
        }
    }

    fn read(&self, rel_path: &str) -> String {
        fs::read_to_string(self.path().join(rel_path)).expect("Failed to read file")
    }

    fn assert_dir_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_dir(), "Directory should exist: {}", path.display());
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    /// Every regular file under the root, as sorted relative paths, with content.
    fn snapshot(&self) -> Vec<(String, String)> {
        let mut files = Vec::new();
        collect_files(self.path(), self.path(), &mut files);
        files.sort();
        files
    }

    /// Same as [`TestFixture::snapshot`] but ignoring the result folder.
    fn snapshot_outside(&self, result_dir: &str) -> Vec<(String, String)> {
        self.snapshot()
            .into_iter()
            .filter(|(path, _)| !path.starts_with(&format!("{result_dir}/")))
            .collect()
    }

    /// Write an empty config so runs never pick up a user's settings.
    fn config_path(&self) -> PathBuf {
        let path = self.path().join(".tidyuprc.toml");
        if !path.exists() {
            fs::write(&path, "").expect("Failed to write config");
        }
        path
    }
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<(String, String)>) {
    for entry in fs::read_dir(dir).expect("Failed to read directory") {
        let path = entry.expect("Failed to read entry").path();
        if path.is_dir() {
            collect_files(root, &path, out);
        } else {
            let rel = path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
            let content = fs::read_to_string(&path).unwrap_or_default();
            out.push((rel, content));
        }
    }
}

fn no_filters() -> CompiledFilters {
    FilterRules::default()
        .compile()
        .expect("Failed to compile filters")
}

fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).expect("Failed to parse arguments")
}

/// Timestamps keyed by file name.
struct FixedTimes {
    stamps: HashMap<String, i64>,
    default: i64,
}

impl FixedTimes {
    fn all(millis: i64) -> Self {
        FixedTimes {
            stamps: HashMap::new(),
            default: millis,
        }
    }

    fn with(mut self, name: &str, millis: i64) -> Self {
        self.stamps.insert(name.to_string(), millis);
        self
    }
}

impl TimestampSource for FixedTimes {
    fn timestamp(&self, path: &Path) -> io::Result<Timestamp> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let millis = self.stamps.get(&name).copied().unwrap_or(self.default);
        Ok(Timestamp::new(millis, StampOrigin::Birthtime))
    }
}

fn epoch_rename() -> RenameOptions {
    RenameOptions {
        format: NameFormat::EpochMs,
        ..Default::default()
    }
}

fn folder_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

// ============================================================================
// Organizer Workflows
// ============================================================================

#[test]
fn test_organize_moves_by_category() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.PDF", "b.tar.lz4", "note"]);
    let log_path = fixture.path().join("run.csv");

    let plan = build_organize_plan(fixture.path(), &OrganizeOptions::default(), &no_filters())
        .expect("Failed to build plan");
    let report = FileOrganizer::apply(&plan, &log_path).expect("Failed to apply plan");

    assert_eq!(report.moved, 3);
    fixture.assert_file_exists("sorted/documents/a.PDF");
    fixture.assert_file_exists("sorted/archives/b.tar.lz4");
    fixture.assert_file_exists("sorted/other/note");
    fixture.assert_file_not_exists("a.PDF");
    assert_eq!(fixture.read("sorted/archives/b.tar.lz4"), "b.tar.lz4");

    let contents = read_log(&log_path).expect("Failed to read log");
    assert_eq!(contents.records.len(), 3);
    assert!(contents
        .records
        .iter()
        .all(|r| r.status == Some(ItemStatus::Moved)));
}

#[test]
fn test_organize_report_policy_leaves_unclassified() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.PDF", "b.tar.lz4", "note"]);
    let options = OrganizeOptions {
        unclassified: UnclassifiedPolicy::Report,
        ..Default::default()
    };

    let plan = build_organize_plan(fixture.path(), &options, &no_filters())
        .expect("Failed to build plan");
    assert_eq!(plan.unclassified, vec![fixture.path().join("note")]);

    FileOrganizer::apply(&plan, &fixture.path().join("run.csv")).expect("Failed to apply plan");
    fixture.assert_file_exists("note");
    fixture.assert_dir_exists("sorted/documents");
}

#[test]
fn test_dry_run_plan_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_files(&["x.jpg", "y.mp3", "sub/z.docx"]);
    let before = fixture.snapshot();

    let options = OrganizeOptions {
        recursive: true,
        ..Default::default()
    };
    let plan = build_organize_plan(fixture.path(), &options, &no_filters())
        .expect("Failed to build plan");

    assert_eq!(plan.len(), 3);
    assert_eq!(fixture.snapshot(), before);
    fixture.assert_file_not_exists("sorted");
}

#[test]
fn test_organize_rerun_is_empty() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.png", "b.csv", "c.rs", "sub/d.zip"]);
    let options = OrganizeOptions {
        recursive: true,
        ..Default::default()
    };

    let plan = build_organize_plan(fixture.path(), &options, &no_filters()).unwrap();
    let log = plan.default_log_path("20250101-000000");
    FileOrganizer::apply(&plan, &log).expect("Failed to apply plan");

    let again = build_organize_plan(fixture.path(), &options, &no_filters()).unwrap();
    assert!(again.is_empty(), "second run planned {:?}", again.items);
    fixture.assert_file_exists("sorted/_logs/sort-log-20250101-000000.csv");
}

#[test]
fn test_recursive_scan_skips_result_dir_with_keep_structure() {
    let fixture = TestFixture::new();
    fixture.create_files(&["docs/a.pdf", "sorted/documents/old.pdf"]);
    let options = OrganizeOptions {
        recursive: true,
        keep_structure: true,
        ..Default::default()
    };

    let plan = build_organize_plan(fixture.path(), &options, &no_filters()).unwrap();

    assert_eq!(plan.len(), 1);
    assert_eq!(
        plan.items[0].destination,
        fixture.path().join("sorted/documents/docs/a.pdf")
    );
}

#[test]
fn test_name_clash_with_previous_run_gets_suffix() {
    let fixture = TestFixture::new();
    fixture.create_text_file("report.pdf", "first");
    let options = OrganizeOptions::default();

    let plan = build_organize_plan(fixture.path(), &options, &no_filters()).unwrap();
    FileOrganizer::apply(&plan, &fixture.path().join("one.csv")).unwrap();
    fixture.create_text_file("report.pdf", "second");
    let plan = build_organize_plan(fixture.path(), &options, &no_filters()).unwrap();
    FileOrganizer::apply(&plan, &fixture.path().join("two.csv")).unwrap();

    assert_eq!(fixture.read("sorted/documents/report.pdf"), "first");
    assert_eq!(fixture.read("sorted/documents/report_001.pdf"), "second");
}

#[test]
fn test_partial_failure_logs_every_attempt() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.txt", "b.txt", "c.txt"]);
    let plan = build_organize_plan(fixture.path(), &OrganizeOptions::default(), &no_filters())
        .unwrap();
    // vanishes between planning and applying
    fs::remove_file(fixture.path().join("b.txt")).unwrap();
    let log_path = fixture.path().join("run.csv");

    let report = FileOrganizer::apply(&plan, &log_path).expect("Failed to apply plan");

    assert_eq!(report.moved, 2);
    assert_eq!(report.failures.len(), 1);
    let contents = read_log(&log_path).unwrap();
    assert_eq!(contents.records.len(), plan.len());
    let failed: Vec<_> = contents
        .records
        .iter()
        .filter(|r| r.status == Some(ItemStatus::Failed))
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].old_path, fixture.path().join("b.txt"));
    assert!(!failed[0].error.is_empty());
}

#[test]
fn test_packages_move_as_a_unit() {
    let fixture = TestFixture::new();
    fixture.create_files(&["Deck.key/Data/slide1.xml", "Deck.key/preview.jpg"]);
    let options = OrganizeOptions {
        recursive: true,
        include_packages: true,
        ..Default::default()
    };

    let plan = build_organize_plan(fixture.path(), &options, &no_filters()).unwrap();
    assert_eq!(plan.len(), 1);
    FileOrganizer::apply(&plan, &fixture.path().join("run.csv")).unwrap();

    fixture.assert_file_exists("sorted/presentations/Deck.key/Data/slide1.xml");
    fixture.assert_file_exists("sorted/presentations/Deck.key/preview.jpg");
    fixture.assert_file_not_exists("Deck.key");
}

#[test]
fn test_packages_ignored_by_default() {
    let fixture = TestFixture::new();
    fixture.create_files(&["Deck.key/preview.jpg", "photo.jpg"]);
    let options = OrganizeOptions {
        recursive: true,
        ..Default::default()
    };

    let plan = build_organize_plan(fixture.path(), &options, &no_filters()).unwrap();

    assert_eq!(plan.len(), 1);
    assert_eq!(plan.items[0].source, fixture.path().join("photo.jpg"));
}

// ============================================================================
// Renamer Workflows
// ============================================================================

#[test]
fn test_rename_equal_timestamps() {
    let fixture = TestFixture::new();
    fixture.create_files(&["Photos/a.jpg", "Photos/b.jpg"]);
    let photos = fixture.path().join("Photos");

    let plan = build_rename_plan(&photos, &epoch_rename(), &FixedTimes::all(1_000), &no_filters())
        .expect("Failed to build plan");
    FileOrganizer::apply(&plan, &fixture.path().join("rename-log.csv"))
        .expect("Failed to apply plan");

    assert_eq!(fixture.read("Photos/Photos_0000000001000.jpg"), "Photos/a.jpg");
    assert_eq!(fixture.read("Photos/Photos_0000000001000_001.jpg"), "Photos/b.jpg");
    fixture.assert_file_not_exists("Photos/a.jpg");

    let contents = read_log(&fixture.path().join("rename-log.csv")).unwrap();
    assert_eq!(contents.records.len(), 2);
    assert_eq!(contents.records[0].label, "birthtime");
}

#[test]
fn test_rename_orders_by_timestamp() {
    let fixture = TestFixture::new();
    fixture.create_files(&["late.png", "early.png"]);
    let times = FixedTimes::all(0).with("late.png", 2_000).with("early.png", 1_000);
    let options = RenameOptions {
        folder_prefix: false,
        ..epoch_rename()
    };

    let plan = build_rename_plan(fixture.path(), &options, &times, &no_filters()).unwrap();

    let sources: Vec<_> = plan.items.iter().map(|i| folder_name(&i.source)).collect();
    assert_eq!(sources, vec!["early.png", "late.png"]);
    assert_eq!(
        plan.items[1].destination,
        fixture.path().join("0000000002000.png")
    );
}

#[test]
fn test_rename_rerun_is_empty() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.jpg", "c.heic"]);
    let times = FixedTimes::all(5_000);

    let plan = build_rename_plan(fixture.path(), &epoch_rename(), &times, &no_filters()).unwrap();
    assert_eq!(plan.len(), 3);
    FileOrganizer::apply(&plan, &fixture.path().join("rename-log.csv")).unwrap();

    let again = build_rename_plan(fixture.path(), &epoch_rename(), &times, &no_filters()).unwrap();
    assert!(again.is_empty(), "second run planned {:?}", again.items);
    assert_eq!(again.unchanged, 3);
}

#[test]
fn test_rename_recursive_stays_in_each_folder() {
    let fixture = TestFixture::new();
    fixture.create_files(&["Trip/x.jpg", "Home/y.jpg", "readme.txt"]);
    let options = RenameOptions {
        recursive: true,
        ..epoch_rename()
    };

    let plan = build_rename_plan(fixture.path(), &options, &FixedTimes::all(7), &no_filters())
        .unwrap();
    FileOrganizer::apply(&plan, &fixture.path().join("log.csv")).unwrap();

    fixture.assert_file_exists("Trip/Trip_0000000000007.jpg");
    fixture.assert_file_exists("Home/Home_0000000000007.jpg");
    fixture.assert_file_exists("readme.txt");
}

// ============================================================================
// Undo
// ============================================================================

#[test]
fn test_undo_restores_organized_tree() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.pdf", "b.png", "sub/c.mp4", "sub/deep/d.ttf", "e"]);
    let before = fixture.snapshot();
    let options = OrganizeOptions {
        recursive: true,
        ..Default::default()
    };

    let plan = build_organize_plan(fixture.path(), &options, &no_filters()).unwrap();
    let log = plan.default_log_path("20250101-000000");
    let applied = FileOrganizer::apply(&plan, &log).unwrap();
    assert_eq!(applied.moved, 5);

    let report = UndoManager::undo(&applied.log_path, true).expect("Failed to undo");

    assert_eq!(report.changed(), 5);
    assert!(report.is_complete_success());
    assert_eq!(fixture.snapshot_outside("sorted"), before);
}

#[test]
fn test_undo_restores_names_with_surrounding_spaces() {
    let fixture = TestFixture::new();
    fixture.create_files(&["notes ", " draft.txt"]);
    let before = fixture.snapshot();

    let plan = build_organize_plan(fixture.path(), &OrganizeOptions::default(), &no_filters())
        .unwrap();
    let log_path = fixture.path().join("run.csv");
    FileOrganizer::apply(&plan, &log_path).unwrap();
    fixture.assert_file_exists("sorted/other/notes ");
    fixture.assert_file_exists("sorted/documents/ draft.txt");

    let contents = read_log(&log_path).unwrap();
    assert!(contents
        .records
        .iter()
        .any(|r| r.old_path == fixture.path().join("notes ")));

    let report = UndoManager::undo(&log_path, true).expect("Failed to undo");

    assert_eq!(report.changed(), 2);
    assert!(report.is_complete_success());
    fixture.assert_file_exists("notes ");
    fixture.assert_file_exists(" draft.txt");
    assert_eq!(
        fixture
            .snapshot_outside("sorted")
            .into_iter()
            .filter(|(path, _)| path != "run.csv")
            .collect::<Vec<_>>(),
        before
    );
}

#[test]
fn test_undo_dry_run_then_apply_then_noop() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.pdf"]);
    let plan = build_organize_plan(fixture.path(), &OrganizeOptions::default(), &no_filters())
        .unwrap();
    let log_path = fixture.path().join("run.csv");
    FileOrganizer::apply(&plan, &log_path).unwrap();

    let preview = UndoManager::undo(&log_path, false).unwrap();
    assert_eq!(preview.entries[0].outcome, UndoOutcome::WouldRestore);
    fixture.assert_file_not_exists("a.pdf");

    let applied = UndoManager::undo(&log_path, true).unwrap();
    assert_eq!(applied.changed(), 1);
    fixture.assert_file_exists("a.pdf");

    let again = UndoManager::undo(&log_path, true).unwrap();
    assert_eq!(again.changed(), 0);
    assert_eq!(
        again.entries[0].outcome,
        UndoOutcome::SkippedMissingDestination
    );
}

#[test]
fn test_undo_after_partial_failure_restores_moved_only() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.txt", "b.txt"]);
    let plan = build_organize_plan(fixture.path(), &OrganizeOptions::default(), &no_filters())
        .unwrap();
    fs::remove_file(fixture.path().join("a.txt")).unwrap();
    let log_path = fixture.path().join("run.csv");
    FileOrganizer::apply(&plan, &log_path).unwrap();

    let report = UndoManager::undo(&log_path, true).unwrap();

    assert_eq!(report.changed(), 1);
    assert_eq!(report.ignored_rows, 1);
    fixture.assert_file_exists("b.txt");
    fixture.assert_file_not_exists("a.txt");
}

#[test]
fn test_undo_rename_restores_names() {
    let fixture = TestFixture::new();
    fixture.create_files(&["IMG_0001.JPG", "IMG_0002.JPG"]);
    let before = fixture.snapshot();

    let plan = build_rename_plan(
        fixture.path(),
        &epoch_rename(),
        &FixedTimes::all(42),
        &no_filters(),
    )
    .unwrap();
    let applied = FileOrganizer::apply(&plan, &fixture.path().join("rename-log.csv")).unwrap();
    let report = UndoManager::undo(&applied.log_path, true).unwrap();

    assert_eq!(report.changed(), 2);
    let after: Vec<_> = fixture
        .snapshot()
        .into_iter()
        .filter(|(path, _)| !path.ends_with(".csv"))
        .collect();
    assert_eq!(after, before);
}

// ============================================================================
// Command Line and Configuration
// ============================================================================

#[test]
fn test_cli_organize_preview_then_apply_then_undo() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.pdf", "b.png"]);
    let root = fixture.path().to_string_lossy().into_owned();
    let config = fixture.config_path().to_string_lossy().into_owned();
    let log = fixture.path().join("cli-log.csv").to_string_lossy().into_owned();

    let preview = run_cli(&cli(&["tidyup", "--config", &config, "organize", &root]))
        .expect("Preview failed");
    assert_eq!(preview.changed, 2);
    fixture.assert_file_exists("a.pdf");

    let applied = run_cli(&cli(&[
        "tidyup", "--config", &config, "organize", &root, "--log", &log, "--apply",
    ]))
    .expect("Apply failed");
    assert_eq!(applied.changed, 2);
    assert_eq!(applied.failed, 0);
    fixture.assert_file_exists("sorted/images/b.png");

    let undone = run_cli(&cli(&["tidyup", "--config", &config, "undo", &log, "--apply"]))
        .expect("Undo failed");
    assert_eq!(undone.changed, 2);
    fixture.assert_file_exists("a.pdf");
    fixture.assert_file_exists("b.png");
}

#[test]
fn test_cli_rename_preview_writes_plan_file() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.txt"]);
    let root = fixture.path().to_string_lossy().into_owned();
    let config = fixture.config_path().to_string_lossy().into_owned();
    let plan_file = fixture.path().join("plan.csv");
    let plan_arg = plan_file.to_string_lossy().into_owned();

    let outcome = run_cli(&cli(&[
        "tidyup",
        "--config",
        &config,
        "rename",
        &root,
        "--time-source",
        "mtime",
        "--log",
        &plan_arg,
    ]))
    .expect("Preview failed");

    assert_eq!(outcome.changed, 1);
    fixture.assert_file_exists("a.jpg");
    let content = fs::read_to_string(&plan_file).expect("Plan file missing");
    assert!(content.starts_with("old_path,new_path,timestamp_ms,source\n"));
    assert_eq!(content.lines().count(), 2);
}

#[test]
fn test_cli_config_filters_and_settings() {
    let fixture = TestFixture::new();
    fixture.create_files(&["keep.pdf", "skip.tmp", "Thumbs.db", "sub/deep.pdf"]);
    let config_path = fixture.path().join(".custom.toml");
    fs::write(
        &config_path,
        r#"
        [filters.exclude]
        filenames = ["Thumbs.db"]
        extensions = ["tmp"]

        [organize]
        result_dir_name = "Tidy"
        recursive = true
        unclassified = "report"
        "#,
    )
    .unwrap();
    let root = fixture.path().to_string_lossy().into_owned();
    let config = config_path.to_string_lossy().into_owned();

    let outcome = run_cli(&cli(&[
        "tidyup", "--config", &config, "organize", &root, "--apply",
    ]))
    .expect("Apply failed");

    assert_eq!(outcome.changed, 2);
    fixture.assert_file_exists("Tidy/documents/keep.pdf");
    fixture.assert_file_exists("Tidy/documents/deep.pdf");
    fixture.assert_file_exists("skip.tmp");
    fixture.assert_file_exists("Thumbs.db");
}

#[test]
fn test_cli_undo_skips_unsafe_rows() {
    let fixture = TestFixture::new();
    let config = fixture.config_path().to_string_lossy().into_owned();
    let log = fixture.path().join("handmade.csv");
    let log_arg = log.to_string_lossy().into_owned();
    // a log whose destination vanished and whose origin is occupied
    fixture.create_files(&["taken.pdf", "sorted/documents/taken.pdf"]);
    fs::write(
        &log,
        format!(
            "category,old_path,new_path,status,error\n\
             documents,{0}/taken.pdf,{0}/sorted/documents/taken.pdf,moved,\n\
             documents,{0}/gone.pdf,{0}/sorted/documents/gone.pdf,moved,\n",
            fixture.path().display()
        ),
    )
    .unwrap();

    let outcome = run_cli(&cli(&[
        "tidyup",
        "--config",
        &config,
        "undo",
        &log_arg,
        "--apply",
    ]))
    .expect("Undo failed");

    assert_eq!(outcome.changed, 0);
    assert_eq!(outcome.failed, 0);
    fixture.assert_file_exists("sorted/documents/taken.pdf");
}

// ============================================================================
// Edge Cases and Error Scenarios
// ============================================================================

#[test]
fn test_missing_root_is_fatal() {
    let fixture = TestFixture::new();
    let result = build_organize_plan(
        &fixture.path().join("nope"),
        &OrganizeOptions::default(),
        &no_filters(),
    );
    assert!(matches!(result, Err(OrganizeError::RootNotFound(_))));
}

#[test]
fn test_cli_missing_log_is_fatal() {
    let fixture = TestFixture::new();
    let config = fixture.config_path().to_string_lossy().into_owned();
    let missing = fixture.path().join("nope.csv").to_string_lossy().into_owned();

    let result = run_cli(&cli(&["tidyup", "--config", &config, "undo", &missing]));
    assert!(matches!(result, Err(OrganizeError::LogNotFound(_))));
}

#[test]
fn test_cli_invalid_config_is_fatal() {
    let fixture = TestFixture::new();
    let config_path = fixture.path().join("bad.toml");
    fs::write(&config_path, "[filters.exclude]\nregex = [\"[unclosed\"]\n").unwrap();
    let root = fixture.path().to_string_lossy().into_owned();
    let config = config_path.to_string_lossy().into_owned();

    let result = run_cli(&cli(&[
        "tidyup",
        "--config",
        &config,
        "organize",
        &root,
    ]));
    assert!(matches!(result, Err(OrganizeError::Config(_))));
}

#[test]
fn test_hidden_files_never_planned() {
    let fixture = TestFixture::new();
    fixture.create_files(&[".env", ".cache/blob.zip", "visible.zip"]);
    let options = OrganizeOptions {
        recursive: true,
        ..Default::default()
    };

    let plan = build_organize_plan(fixture.path(), &options, &no_filters()).unwrap();

    assert_eq!(plan.len(), 1);
    assert_eq!(plan.items[0].source, fixture.path().join("visible.zip"));
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_at_destination_is_not_overwritten() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.pdf"]);
    let link = fixture.path().join("sorted/documents/a.pdf");
    fs::create_dir_all(link.parent().unwrap()).unwrap();
    std::os::unix::fs::symlink("/nonexistent/target", &link).expect("Failed to create symlink");

    let plan = build_organize_plan(fixture.path(), &OrganizeOptions::default(), &no_filters())
        .unwrap();
    assert_eq!(
        plan.items[0].destination,
        fixture.path().join("sorted/documents/a_001.pdf")
    );
    let report = FileOrganizer::apply(&plan, &fixture.path().join("run.csv")).unwrap();

    assert_eq!(report.moved, 1);
    assert_eq!(report.rerouted, 0);
    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(fixture.read("sorted/documents/a_001.pdf"), "a.pdf");
}

#[test]
fn test_empty_directory_plans_nothing() {
    let fixture = TestFixture::new();
    let plan = build_organize_plan(fixture.path(), &OrganizeOptions::default(), &no_filters())
        .unwrap();
    assert!(plan.is_empty());
    assert!(plan.directories.is_empty());
}
