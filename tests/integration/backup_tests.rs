use itemdedup::actions::{backup_path, create_backup, rotated_backup_path};
use itemdedup::batch::{Batch, BatchOptions};
use itemdedup::output::{Reporter, ReporterConfig};
use std::fs;
use std::io;
use std::path::Path;
use tempfile::tempdir;

const ORIGINAL: &str =
    "<?xml version=\"1.0\"?>\n<Root>\n  <Item id=\"a\" />\n  <Item id=\"a\" text=\"kept\" />\n</Root>";

fn silent() -> Reporter {
    Reporter::with_writers(
        ReporterConfig::default(),
        Box::new(io::sink()),
        Box::new(io::sink()),
    )
}

fn run(path: &Path) {
    let reporter = silent();
    let result = Batch::new(BatchOptions::default(), &reporter)
        .run(&[path.to_path_buf()], None)
        .unwrap();
    assert_eq!(result.success, 1);
}

#[test]
fn test_first_run_creates_backup_of_original() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("strings.xml");
    fs::write(&file, ORIGINAL).unwrap();

    run(&file);

    assert_eq!(fs::read_to_string(backup_path(&file)).unwrap(), ORIGINAL);
    assert!(!rotated_backup_path(&file).exists());
    assert_ne!(fs::read_to_string(&file).unwrap(), ORIGINAL);
}

#[test]
fn test_existing_backup_is_rotated_once() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("strings.xml");
    fs::write(&file, ORIGINAL).unwrap();
    fs::write(backup_path(&file), "generation 1").unwrap();

    let outcome = create_backup(&file).unwrap();
    assert_eq!(outcome.rotated, Some(rotated_backup_path(&file)));
    assert_eq!(outcome.size, ORIGINAL.len() as u64);
    assert_eq!(
        fs::read_to_string(rotated_backup_path(&file)).unwrap(),
        "generation 1"
    );
    assert_eq!(fs::read_to_string(backup_path(&file)).unwrap(), ORIGINAL);
}

#[test]
fn test_rotated_backup_is_never_overwritten() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("strings.xml");
    fs::write(&file, ORIGINAL).unwrap();
    fs::write(backup_path(&file), "generation 2").unwrap();
    fs::write(rotated_backup_path(&file), "generation 1").unwrap();

    let outcome = create_backup(&file).unwrap();
    assert_eq!(outcome.rotated, None);
    assert_eq!(
        fs::read_to_string(rotated_backup_path(&file)).unwrap(),
        "generation 1"
    );
    assert_eq!(fs::read_to_string(backup_path(&file)).unwrap(), ORIGINAL);
}

#[test]
fn test_three_runs_keep_two_generations() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("strings.xml");
    fs::write(&file, ORIGINAL).unwrap();

    run(&file);
    let after_first = fs::read_to_string(&file).unwrap();
    run(&file);
    run(&file);

    assert_eq!(fs::read_to_string(rotated_backup_path(&file)).unwrap(), ORIGINAL);
    assert_eq!(fs::read_to_string(backup_path(&file)).unwrap(), after_first);
}

#[test]
fn test_no_backup_option() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("strings.xml");
    fs::write(&file, ORIGINAL).unwrap();

    let reporter = silent();
    let options = BatchOptions {
        backup: false,
        ..BatchOptions::default()
    };
    Batch::new(options, &reporter).run(&[file.clone()], None).unwrap();

    assert!(!backup_path(&file).exists());
}

#[test]
fn test_backup_path_appends_suffix() {
    let path = Path::new("/res/values.de.xml");
    assert_eq!(backup_path(path), Path::new("/res/values.de.xml.bak"));
    assert_eq!(rotated_backup_path(path), Path::new("/res/values.de.xml.bak~"));
}
