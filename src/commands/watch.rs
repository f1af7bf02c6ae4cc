//! @dose
//! purpose: Implements the watch command that monitors the components directory and
//!     prefab.toml and rewrites the manifest after a burst of changes settles.
//!
//! when-editing:
//!     - !Debouncing is critical for handling rapid file changes (IDE saves)
//!     - !The manifest file itself must never trigger a rebuild
//!     - Uses notify crate for cross-platform file system watching
//!
//! invariants:
//!     - Initial generation must complete before watching starts
//!     - Every rebuild reloads prefab.toml, so config edits apply on the next rebuild
//!     - A failed rebuild is logged and watching continues
//!
//! gotchas:
//!     - Changing components_dir in prefab.toml does not move the watch; restart to pick it up
//!
//! flows:
//!     - Initial: generate once
//!     - Watch: Receive notify events, keep the relevant paths, debounce
//!     - Update: rebuild and rewrite the whole manifest

use crate::cli::WatchArgs;
use crate::commands::{generate_manifest, summary_line};
use crate::component::{is_story_file, SIBLING_EXTENSIONS};
use crate::config::{Config, CONFIG_FILE};
use crate::exclusion::{build_exclude_globset, in_default_excluded_dir};
use anyhow::{Context, Result};
use globset::GlobSet;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// The kind of change detected for a file
#[derive(Clone, Copy, PartialEq, Debug)]
enum ChangeKind {
    Create,
    Modify,
    Delete,
}

impl ChangeKind {
    fn label(&self) -> &'static str {
        match self {
            ChangeKind::Create => "Created",
            ChangeKind::Modify => "Modified",
            ChangeKind::Delete => "Deleted",
        }
    }
}

/// Decides which changed paths should trigger a rebuild
struct ChangeFilter {
    components_dir: PathBuf,
    config_path: PathBuf,
    output: PathBuf,
    excluded: Option<GlobSet>,
}

impl ChangeFilter {
    fn is_relevant(&self, path: &Path) -> bool {
        if path == self.output {
            return false;
        }
        if path == self.config_path {
            return true;
        }

        let Ok(relative) = path.strip_prefix(&self.components_dir) else {
            return false;
        };
        if in_default_excluded_dir(relative) {
            return false;
        }
        if let Some(excluded) = &self.excluded {
            if excluded.is_match(relative) {
                return false;
            }
        }

        let is_sibling = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| SIBLING_EXTENSIONS.contains(&e));
        // A renamed or deleted component directory
        let is_directory = path.extension().is_none();

        is_story_file(path) || is_sibling || is_directory
    }
}

pub fn run_watch(args: &WatchArgs, root: &Path) -> Result<()> {
    // notify reports absolute paths
    let root_canon = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let root = root_canon.as_path();
    let config = Config::load(root);
    let options = args.common.assemble_options(root, &config);
    let output = args.common.output_path(root, &config);

    println!("Running initial generation...");
    let report = generate_manifest(&options, &output)?;
    println!("{}", summary_line(&report));

    let filter = ChangeFilter {
        components_dir: options.components_dir.clone(),
        config_path: root.join(CONFIG_FILE),
        output: output.clone(),
        excluded: build_exclude_globset(&options.exclusion.patterns),
    };

    let (tx, rx) = mpsc::channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        },
        notify::Config::default(),
    )?;

    watcher
        .watch(&options.components_dir, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", options.components_dir.display()))?;
    // prefab.toml may not exist yet, so watch its directory
    watcher
        .watch(root, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", root.display()))?;
    debug!(dir = %options.components_dir.display(), "watching");

    println!("Watching for changes... (press Ctrl+C to stop)");

    let mut pending: HashMap<PathBuf, ChangeKind> = HashMap::new();
    let mut last_event = Instant::now();
    let debounce = Duration::from_millis(args.debounce);
    let poll_interval = Duration::from_millis(50);

    loop {
        match rx.recv_timeout(poll_interval) {
            Ok(event) => {
                if process_event(&event, &mut pending, &filter) {
                    last_event = Instant::now();
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if !pending.is_empty() && last_event.elapsed() >= debounce {
                    if args.clear {
                        print!("\x1B[2J\x1B[1;1H");
                    }
                    rebuild(args, root, &mut pending);
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                println!("Watcher disconnected");
                break;
            }
        }
    }

    Ok(())
}

/// Record relevant paths of a notify event. Returns whether anything was recorded.
fn process_event(
    event: &Event,
    pending: &mut HashMap<PathBuf, ChangeKind>,
    filter: &ChangeFilter,
) -> bool {
    let kind = match &event.kind {
        EventKind::Create(_) => ChangeKind::Create,
        EventKind::Modify(_) => ChangeKind::Modify,
        EventKind::Remove(_) => ChangeKind::Delete,
        _ => return false,
    };

    let mut recorded = false;
    for path in event.paths.iter().filter(|p| filter.is_relevant(p)) {
        recorded = true;
        // Coalesce events: Create + Modify = Create, Modify + Delete = Delete
        pending
            .entry(path.clone())
            .and_modify(|existing| {
                *existing = match (*existing, kind) {
                    (ChangeKind::Create, ChangeKind::Modify) => ChangeKind::Create,
                    (_, new) => new,
                };
            })
            .or_insert(kind);
    }
    recorded
}

fn rebuild(args: &WatchArgs, root: &Path, pending: &mut HashMap<PathBuf, ChangeKind>) {
    let mut changes: Vec<_> = pending.drain().collect();
    changes.sort_by(|a, b| a.0.cmp(&b.0));
    for (path, kind) in &changes {
        let rel = path.strip_prefix(root).unwrap_or(path);
        println!("{}: {}", kind.label(), rel.display());
    }

    let config = Config::load(root);
    let options = args.common.assemble_options(root, &config);
    let output = args.common.output_path(root, &config);

    match generate_manifest(&options, &output) {
        Ok(report) => {
            info!(changes = changes.len(), "manifest rebuilt");
            println!("{}", summary_line(&report));
        }
        Err(e) => error!("rebuild failed: {:#}", e),
    }
}
