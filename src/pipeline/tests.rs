// Pipeline scenarios against a temp mapping directory and database

use super::*;
use crate::constants::{ELEMENT_MAPPING_FILENAME, SET_MAPPING_FILENAME};
use crate::db::label_sets::tests::setup_label_sets_db;
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const VALID_CSV: &str = "\
id,set_label,element_label,color
0,Three_Turn,RFO_Three_Turn,
1,Twizzle,Twizzle_Forward,#ff0000
2,Three_Turn,LFI_Three_Turn,
3,Spiral,Spiral,
";

/// Temp workspace with a mapping dir, a label_sets database and a CSV.
struct Fixture {
    _tmp: TempDir,
    config: PipelineConfig,
}

impl Fixture {
    fn new(csv: &str) -> Self {
        let tmp = TempDir::new().unwrap();
        let mapping_dir = tmp.path().join("mapping");
        fs::create_dir_all(&mapping_dir).unwrap();
        let db_path = setup_label_sets_db(tmp.path());
        let csv_path = tmp.path().join("labels.csv");
        fs::write(&csv_path, csv).unwrap();

        let mut config = PipelineConfig::new(csv_path);
        config.mapping_dir = mapping_dir;
        config.db_path = db_path;
        config.project = "default".to_string();

        Fixture { _tmp: tmp, config }
    }

    fn mapping_file(&self, name: &str) -> PathBuf {
        self.config.mapping_dir.join(name)
    }

    fn mapping_dir_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.config.mapping_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    fn db_rows(&self) -> Vec<(i64, String)> {
        let conn = Connection::open(&self.config.db_path).unwrap();
        let mut stmt = conn
            .prepare("SELECT version, items_json FROM label_sets WHERE project = 'default' ORDER BY version")
            .unwrap();
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap();
        rows
    }
}

fn file_bytes(path: &Path) -> Vec<u8> {
    fs::read(path).unwrap()
}

#[test]
fn test_persisting_run_writes_files_and_version() {
    let fx = Fixture::new(VALID_CSV);

    let report = run(&fx.config).unwrap();

    assert_eq!(report.elements, 4);
    assert_eq!(report.categories(), 3);
    assert_eq!(report.version(), Some(1));
    assert_eq!(
        fs::read_to_string(fx.mapping_file(ELEMENT_MAPPING_FILENAME)).unwrap(),
        "0 RFO_Three_Turn\n1 Twizzle_Forward\n2 LFI_Three_Turn\n3 Spiral\n"
    );
    assert_eq!(
        fs::read_to_string(fx.mapping_file(SET_MAPPING_FILENAME)).unwrap(),
        "0 Three_Turn\n1 Twizzle\n2 Spiral\n"
    );
    match report.outcome {
        Outcome::Persisted { ref backups, .. } => assert!(backups.is_empty()),
        ref other => panic!("expected persisted outcome, got {:?}", other),
    }
}

#[test]
fn test_rerun_appends_identical_version() {
    let fx = Fixture::new(VALID_CSV);

    run(&fx.config).unwrap();
    let second = run(&fx.config).unwrap();

    assert_eq!(second.version(), Some(2));
    let rows = fx.db_rows();
    assert_eq!(rows.iter().map(|r| r.0).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(rows[0].1, rows[1].1);

    // second run backed up the files written by the first
    match second.outcome {
        Outcome::Persisted { ref backups, .. } => {
            assert_eq!(backups.len(), 2);
            for entry in backups {
                assert_eq!(file_bytes(&entry.backup), file_bytes(&entry.target));
            }
        }
        ref other => panic!("expected persisted outcome, got {:?}", other),
    }
}

#[test]
fn test_category_ids_follow_first_appearance() {
    let fx = Fixture::new("id,set_label,element_label\n0,Mohawk,m1\n1,Chasse,c1\n2,Mohawk,m2\n3,Arabesque,a1\n");

    let report = run(&fx.config).unwrap();

    let sets: Vec<(usize, &str)> = report.sets.iter().map(|s| (s.id, s.name.as_str())).collect();
    assert_eq!(sets, vec![(0, "Mohawk"), (1, "Chasse"), (2, "Arabesque")]);
}

#[test]
fn test_validation_failure_writes_nothing() {
    let fx = Fixture::new("\
id,set_label,element_label
0,Spiral,Spiral
1,Spiral,Arabesque
2,Spiral,Spiral
2,Twizzle,Twizzle
");

    let failure = run(&fx.config).unwrap_err();

    assert_eq!(failure.stage, Stage::Validating);
    let problems = failure.problems();
    assert!(problems.iter().any(|p| p == "Duplicate ID 2 appears 2 times"));
    assert!(problems.iter().any(|p| p == "Duplicate element_label 'Spiral' appears 2 times"));
    assert!(fx.mapping_dir_entries().is_empty());
    assert!(fx.db_rows().is_empty());
}

#[test]
fn test_database_failure_restores_existing_files() {
    let mut fx = Fixture::new(VALID_CSV);
    fs::write(fx.mapping_file(ELEMENT_MAPPING_FILENAME), "0 Old_Element\n").unwrap();
    fs::write(fx.mapping_file(SET_MAPPING_FILENAME), "0 Old_Set\n").unwrap();
    let element_before = file_bytes(&fx.mapping_file(ELEMENT_MAPPING_FILENAME));
    let set_before = file_bytes(&fx.mapping_file(SET_MAPPING_FILENAME));

    // database exists but has no label_sets table
    let broken_db = fx.config.mapping_dir.parent().unwrap().join("broken.db");
    Connection::open(&broken_db).unwrap().execute_batch("CREATE TABLE other (x INTEGER);").unwrap();
    fx.config.db_path = broken_db;

    let failure = run(&fx.config).unwrap_err();

    assert_eq!(failure.stage, Stage::UpdatingDatabase);
    assert!(matches!(failure.error, LabelError::Persistence(_)));
    match failure.rollback {
        Rollback::Restored(ref touched) => assert_eq!(touched.len(), 2),
        ref other => panic!("expected restored rollback, got {:?}", other),
    }
    assert_eq!(file_bytes(&fx.mapping_file(ELEMENT_MAPPING_FILENAME)), element_before);
    assert_eq!(file_bytes(&fx.mapping_file(SET_MAPPING_FILENAME)), set_before);
}

#[test]
fn test_database_failure_removes_new_files() {
    let mut fx = Fixture::new(VALID_CSV);
    fx.config.db_path = fx.config.mapping_dir.join("missing.db");

    let failure = run(&fx.config).unwrap_err();

    assert_eq!(failure.stage, Stage::UpdatingDatabase);
    assert!(matches!(failure.error, LabelError::NotFound { .. }));
    assert!(fx.mapping_dir_entries().is_empty());
}

#[test]
fn test_skip_db_only_writes_files() {
    let mut fx = Fixture::new(VALID_CSV);
    fx.config.skip_db = true;
    fx.config.db_path = fx.config.mapping_dir.join("missing.db");

    let report = run(&fx.config).unwrap();

    assert_eq!(report.version(), None);
    assert_eq!(
        fx.mapping_dir_entries(),
        vec![ELEMENT_MAPPING_FILENAME.to_string(), SET_MAPPING_FILENAME.to_string()]
    );
}

#[test]
fn test_preview_touches_nothing() {
    let mut fx = Fixture::new(VALID_CSV);
    fs::write(fx.mapping_file(SET_MAPPING_FILENAME), "0 Old_Set\n").unwrap();
    fx.config.dry_run = true;

    let report = run(&fx.config).unwrap();

    match report.outcome {
        Outcome::Preview(ref preview) => {
            assert_eq!(preview.contents.set, "0 Three_Turn\n1 Twizzle\n2 Spiral\n");
            let (head, remaining) = preview.element_head(3);
            assert_eq!(head, vec!["0 RFO_Three_Turn", "1 Twizzle_Forward", "2 LFI_Three_Turn"]);
            assert_eq!(remaining, 1);
            let db = preview.database.as_ref().unwrap();
            assert_eq!(db.items, 4);
            assert_eq!(db.project, "default");
        }
        ref other => panic!("expected preview outcome, got {:?}", other),
    }
    assert_eq!(fx.mapping_dir_entries(), vec![SET_MAPPING_FILENAME.to_string()]);
    assert_eq!(fs::read_to_string(fx.mapping_file(SET_MAPPING_FILENAME)).unwrap(), "0 Old_Set\n");
    assert!(fx.db_rows().is_empty());
}

#[test]
fn test_preview_with_invalid_input_reports_only() {
    let mut fx = Fixture::new("id,set_label,element_label,color\n1,A,a,red\n");
    fx.config.dry_run = true;

    let failure = run(&fx.config).unwrap_err();

    assert_eq!(failure.stage, Stage::Validating);
    assert_eq!(failure.problems().len(), 2);
    assert!(fx.mapping_dir_entries().is_empty());
}

#[test]
fn test_reading_failure_names_stage() {
    let mut fx = Fixture::new(VALID_CSV);
    fx.config.csv_path = fx.config.mapping_dir.join("nope.csv");

    let failure = run(&fx.config).unwrap_err();

    assert_eq!(failure.stage, Stage::Reading);
    assert!(failure.to_string().starts_with("Reading CSV failed: CSV file not found"));
}

#[cfg(unix)]
#[test]
fn test_write_failure_restores_earlier_file() {
    let fx = Fixture::new(VALID_CSV);
    fs::write(fx.mapping_file(ELEMENT_MAPPING_FILENAME), "0 Old\n").unwrap();
    // set mapping path points into a directory that does not exist
    let dangling = fx.config.mapping_dir.parent().unwrap().join("missing_dir").join("x.txt");
    std::os::unix::fs::symlink(&dangling, fx.mapping_file(SET_MAPPING_FILENAME)).unwrap();

    let failure = run(&fx.config).unwrap_err();

    assert_eq!(failure.stage, Stage::WritingFiles);
    assert!(matches!(failure.error, LabelError::Io(_)));
    match failure.rollback {
        Rollback::Restored(ref touched) => {
            assert_eq!(touched, &vec![fx.mapping_file(ELEMENT_MAPPING_FILENAME)]);
        }
        ref other => panic!("expected restored rollback, got {:?}", other),
    }
    assert_eq!(file_bytes(&fx.mapping_file(ELEMENT_MAPPING_FILENAME)), b"0 Old\n");
    assert!(fx.db_rows().is_empty());
}
