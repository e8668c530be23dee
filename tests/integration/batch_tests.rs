use itemdedup::actions::InputHandle;
use itemdedup::batch::{Batch, BatchOptions, STDIN_PIPE_NAME};
use itemdedup::output::{Reporter, ReporterConfig, SharedBuffer};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::TempDir;

const DUPED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Root>
  <Item id="a" text="first" />
  <Item id="b" text="only" />
  <Item id="a" text="second" />
</Root>"#;

const DEDUPED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Root>
  <Item id="b" text="only" />
  <Item id="a" text="second" />
</Root>"#;

fn capture() -> (Reporter, SharedBuffer, SharedBuffer) {
    let out = SharedBuffer::new();
    let err = SharedBuffer::new();
    let reporter = Reporter::with_writers(
        ReporterConfig::default(),
        Box::new(out.clone()),
        Box::new(err.clone()),
    );
    (reporter, out, err)
}

fn no_backup() -> BatchOptions {
    BatchOptions {
        backup: false,
        ..BatchOptions::default()
    }
}

fn write_files(dir: &TempDir, count: usize, content: &str) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let path = dir.path().join(format!("res_{i:03}.xml"));
            fs::write(&path, content).unwrap();
            path
        })
        .collect()
}

#[test]
fn test_one_malformed_file_does_not_affect_the_rest() {
    let dir = TempDir::new().unwrap();
    let mut files = write_files(&dir, 20, DUPED);
    let broken = dir.path().join("broken.xml");
    fs::write(&broken, "<?xml version=\"1.0\"?>\n<Root><Item id=\"a\"></Root>").unwrap();
    files.push(broken.clone());
    files.sort();

    let (reporter, out, err) = capture();
    let result = Batch::new(no_backup(), &reporter).run(&files, None).unwrap();

    assert_eq!(result.success, 20);
    assert_eq!(result.failure, 1);
    assert!(!result.all_succeeded());

    for file in files.iter().filter(|f| **f != broken) {
        assert_eq!(fs::read_to_string(file).unwrap(), DEDUPED);
    }
    assert_eq!(out.contents().matches("[ OK ] ").count(), 20);

    let err = err.contents();
    assert_eq!(err.lines().count(), 1);
    assert!(err.starts_with(&format!("[FAIL] {} - ", broken.display())));
}

#[test]
fn test_dry_run_leaves_files_untouched() {
    let dir = TempDir::new().unwrap();
    let files = write_files(&dir, 3, DUPED);

    let (reporter, _, _) = capture();
    let options = BatchOptions {
        dry_run: true,
        ..BatchOptions::default()
    };
    let result = Batch::new(options, &reporter).run(&files, None).unwrap();

    assert_eq!((result.success, result.failure), (3, 0));
    for file in &files {
        assert_eq!(fs::read_to_string(file).unwrap(), DUPED);
    }
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .filter(|n| n.to_string_lossy().contains(".bak"))
        .collect();
    assert!(leftovers.is_empty(), "dry run created {leftovers:?}");
}

#[test]
fn test_counters_are_fresh_for_each_run() {
    let dir = TempDir::new().unwrap();
    let files = write_files(&dir, 4, DUPED);

    for _ in 0..3 {
        let (reporter, out, _) = capture();
        let result = Batch::new(no_backup(), &reporter).run(&files, None).unwrap();
        reporter.summary(result.elapsed);

        assert_eq!((result.success, result.failure), (4, 0));
        assert!(out.contents().contains("SUCCESS: 4    FAIL: 0    COST: "));
    }
    // second and third passes see already-clean files
    for file in &files {
        assert_eq!(fs::read_to_string(file).unwrap(), DEDUPED);
    }
}

#[test]
fn test_single_worker_thread() {
    let dir = TempDir::new().unwrap();
    let files = write_files(&dir, 5, DUPED);

    let (reporter, _, _) = capture();
    let options = BatchOptions {
        threads: Some(1),
        ..no_backup()
    };
    let result = Batch::new(options, &reporter).run(&files, None).unwrap();
    assert_eq!(result.success, 5);
}

#[test]
fn test_files_and_piped_document_together() {
    let dir = TempDir::new().unwrap();
    let files = write_files(&dir, 2, DUPED);

    let (reporter, out, _) = capture();
    let piped = InputHandle::stream(io::Cursor::new(DUPED.as_bytes().to_vec()));
    let result = Batch::new(no_backup(), &reporter)
        .run(&files, Some(piped))
        .unwrap();

    assert_eq!((result.success, result.failure), (3, 0));
    let out = out.contents();
    // the piped document is processed last, after the parallel phase
    assert!(out.trim_end().ends_with(&format!("[ OK ] {STDIN_PIPE_NAME}")));
}

#[test]
fn test_interrupted_batch_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let files = write_files(&dir, 6, DUPED);

    let (reporter, out, _) = capture();
    let result = Batch::new(BatchOptions::default(), &reporter)
        .with_shutdown_flag(Arc::new(AtomicBool::new(true)))
        .run(&files, None)
        .unwrap();

    assert_eq!(result.skipped, 6);
    assert_eq!((result.success, result.failure), (0, 0));
    assert!(out.contents().is_empty());
    for file in &files {
        assert_eq!(fs::read_to_string(file).unwrap(), DUPED);
    }
}

#[test]
fn test_verbose_records_go_to_log_file() {
    let dir = TempDir::new().unwrap();
    let files = write_files(&dir, 1, DUPED);
    let log = SharedBuffer::new();

    let out = SharedBuffer::new();
    let reporter = Reporter::with_writers(
        ReporterConfig::default(),
        Box::new(out.clone()),
        Box::new(io::sink()),
    )
    .with_log(Box::new(log.clone()));
    Batch::new(no_backup(), &reporter).run(&files, None).unwrap();

    let name = files[0].display().to_string();
    let log = log.contents();
    assert!(log.contains(&format!("{name} -  Removed Item: id: a text: first")));
    assert!(log.contains(&format!("{name} - Reserved Item: id: a text: second")));
    assert!(!out.contents().contains("Removed Item"));
}
