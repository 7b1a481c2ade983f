//! Parallel, de-duplicated loading of license metadata into a [`LicenseGraph`].
//!
//! A fixed pool of reader threads consumes a task queue of metadata paths.
//! Each parsed file may discover new dependencies; a mutex-guarded seen-set
//! guarantees every file is read at most once regardless of in-degree. The
//! bounded result channel (buffer = pool size) applies back-pressure so the
//! number of open files never exceeds the pool size.
//!
//! The load either publishes a complete graph or fails with the first error;
//! no partial graph escapes.

use crate::error::{GraphError, Result};
use crate::graph::{canonical_meta_path, LicenseGraph};
use crate::metadata::{parse_license_metadata, LicenseMetadata};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use rustc_hash::FxHashSet;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, error, info};

/// Size of the reader task pool, limiting resource usage e.g. open files.
pub const CONCURRENT_READERS: usize = 5;

struct ParsedFile {
    name: String,
    meta: LicenseMetadata,
}

/// Scheduling state shared by the reader pool, guarded by one mutex.
struct Scheduler {
    /// Every metadata path ever scheduled; doubles as the de-dup set.
    seen: FxHashSet<String>,
    /// Scheduled tasks not yet fully processed.
    pending: usize,
    /// Dropping the sender closes the task queue and stops the pool.
    task_tx: Option<Sender<String>>,
}

impl Scheduler {
    fn schedule(&mut self, file: String) {
        if self.seen.contains(&file) {
            return;
        }
        self.seen.insert(file.clone());
        self.pending += 1;
        if let Some(tx) = &self.task_tx {
            // the task queue is unbounded; this never blocks under the lock
            let _ = tx.send(file);
        }
    }

    fn task_done(&mut self) {
        self.pending -= 1;
        if self.pending == 0 {
            self.task_tx.take();
        }
    }
}

/// Reads and parses `files` and their transitive dependencies into a
/// [`LicenseGraph`] rooted at `files`, resolving paths against `root`.
pub fn read_license_graph<P: AsRef<str>>(root: &Path, files: &[P]) -> Result<LicenseGraph> {
    read_license_graph_with_readers(root, files, CONCURRENT_READERS)
}

/// As [`read_license_graph`] with an explicit reader-pool size.
pub fn read_license_graph_with_readers<P: AsRef<str>>(
    root: &Path,
    files: &[P],
    readers: usize,
) -> Result<LicenseGraph> {
    if files.is_empty() {
        return Err(GraphError::EmptyInput);
    }
    let readers = readers.max(1);

    let root_files: Vec<String> =
        files.iter().map(|f| canonical_meta_path(f.as_ref())).collect();

    let (task_tx, task_rx) = unbounded::<String>();
    let (result_tx, result_rx) = bounded::<Result<ParsedFile>>(readers);

    let scheduler = Mutex::new(Scheduler {
        seen: FxHashSet::default(),
        pending: 0,
        task_tx: Some(task_tx),
    });
    {
        let mut sched = scheduler.lock().unwrap();
        for f in &root_files {
            sched.schedule(f.clone());
        }
    }

    let mut parsed: Vec<ParsedFile> = Vec::new();
    let mut first_err: Option<GraphError> = None;

    std::thread::scope(|scope| {
        for _ in 0..readers {
            let task_rx: Receiver<String> = task_rx.clone();
            let result_tx = result_tx.clone();
            let scheduler = &scheduler;
            scope.spawn(move || {
                for file in task_rx.iter() {
                    let result = read_file(root, &file);
                    let deps: Vec<String> = match &result {
                        Ok(p) => p
                            .meta
                            .deps
                            .iter()
                            .filter(|d| !d.file.is_empty())
                            .map(|d| d.file.clone())
                            .collect(),
                        Err(_) => Vec::new(),
                    };
                    // blocks when the coordinator is behind; that throttles
                    // further file opens to the pool size
                    if result_tx.send(result).is_err() {
                        break;
                    }
                    let mut sched = scheduler.lock().unwrap();
                    for dep in deps {
                        sched.schedule(dep);
                    }
                    sched.task_done();
                }
            });
        }
        // the pool holds all remaining clones
        drop(result_tx);
        drop(task_rx);

        for result in result_rx.iter() {
            if first_err.is_some() {
                // fail-fast: drain so no reader blocks, discard the rest
                continue;
            }
            match result {
                Ok(p) => {
                    debug!(file = %p.name, "loaded license metadata");
                    parsed.push(p);
                }
                Err(e) => {
                    error!("{e}");
                    first_err = Some(e);
                }
            }
        }
    });

    if let Some(e) = first_err {
        return Err(e);
    }

    // single-threaded assembly: indices follow parse-completion order
    let mut graph = LicenseGraph::new(root_files);
    for p in parsed {
        graph.add_target(p.name, p.meta);
    }
    graph.index_roots()?;
    graph.seed_license_conditions()?;
    graph.index_dependencies()?;

    info!(
        targets = graph.len(),
        edges = graph.edges().count(),
        roots = graph.root_files().len(),
        "license graph loaded"
    );
    Ok(graph)
}

/// One reader task: open, read, and parse a single metadata file.
fn read_file(root: &Path, file: &str) -> Result<ParsedFile> {
    let path = root.join(file);
    let data = match fs::read_to_string(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(GraphError::open_failed(file, e))
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(GraphError::open_failed(file, e))
        }
        Err(e) => return Err(GraphError::read_failed(file, e)),
    };
    let meta = parse_license_metadata(&data)
        .map_err(|e| GraphError::parse_failed(file, e.line, e.message))?;
    Ok(ParsedFile { name: file.to_string(), meta })
}
