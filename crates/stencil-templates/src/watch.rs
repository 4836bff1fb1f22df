//! Live template change notification
//!
//! A [`TemplateWatcher`] owns a recursive `notify` watcher plus a translation
//! task. Raw filesystem events flow through a bounded channel into the task,
//! which turns them into [`TemplateChange`] values on a second bounded
//! channel. A slow consumer therefore stalls the task instead of growing an
//! unbounded queue.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;

use crate::discovery::{resolve_root, TemplateDiscovery};
use crate::error::CatalogResult;
use crate::models::TemplateMetadata;

/// Capacity of the raw-event and change channels
pub const WATCH_CHANNEL_CAPACITY: usize = 100;

/// Kind of change observed on a template file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// A template appeared
    Created,
    /// A template's content changed
    Modified,
    /// A template disappeared
    Deleted,
}

/// One change delivered to a watcher
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateChange {
    /// What happened
    pub kind: ChangeKind,
    /// Absolute path of the affected file
    pub path: PathBuf,
    /// Fresh metadata for created/modified files, last known metadata for
    /// deleted ones (if the watcher had seen the file)
    pub template: Option<TemplateMetadata>,
}

/// Map a raw event kind onto a change kind
///
/// Renames report the old and new names as separate paths, so `exists`
/// decides whether a renamed path appeared or vanished. Access and
/// unclassified events are ignored.
pub fn classify(kind: &EventKind, exists: bool) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(ModifyKind::Name(_)) if exists => Some(ChangeKind::Created),
        EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Deleted),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Deleted),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}

/// Stops the OS watch and the translation task when dropped
struct WatchGuard {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl fmt::Debug for WatchGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchGuard")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Handle to a running directory watch
///
/// Watchers are independent of each other: each one keeps its own view of
/// known templates, and closing one does not affect others on the same
/// directory.
#[derive(Debug)]
pub struct TemplateWatcher {
    root: PathBuf,
    receiver: mpsc::Receiver<TemplateChange>,
    guard: WatchGuard,
}

impl TemplateWatcher {
    /// Start watching `root` recursively
    ///
    /// `known` seeds the metadata reported for deletions of files the caller
    /// had already indexed.
    pub async fn start(
        root: &Path,
        discovery: Arc<TemplateDiscovery>,
        known: HashMap<PathBuf, TemplateMetadata>,
    ) -> CatalogResult<Self> {
        let root = resolve_root(root).await?;
        let (raw_tx, raw_rx) = mpsc::channel::<Event>(WATCH_CHANNEL_CAPACITY);
        let (tx, receiver) = mpsc::channel(WATCH_CHANNEL_CAPACITY);

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    // Receiver gone means the watch is shutting down
                    let _ = raw_tx.blocking_send(event);
                }
                Err(e) => tracing::warn!(error = %e, "template watch error"),
            },
            notify::Config::default(),
        )?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        let task = tokio::spawn(translate(root.clone(), discovery, known, raw_rx, tx));
        tracing::info!(root = %root.display(), "watching template directory");

        Ok(Self {
            root,
            receiver,
            guard: WatchGuard {
                _watcher: watcher,
                task,
            },
        })
    }

    /// Watched directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Wait for the next change; `None` once the watch has stopped
    pub async fn recv(&mut self) -> Option<TemplateChange> {
        self.receiver.recv().await
    }

    /// Take a pending change without waiting
    pub fn try_recv(&mut self) -> Option<TemplateChange> {
        self.receiver.try_recv().ok()
    }

    /// Consume the handle into a stream of changes
    pub fn into_stream(self) -> TemplateChangeStream {
        TemplateChangeStream {
            inner: ReceiverStream::new(self.receiver),
            _guard: self.guard,
        }
    }

    /// Stop watching
    pub fn close(self) {
        tracing::debug!(root = %self.root.display(), "closing template watch");
    }
}

/// Stream of changes from a [`TemplateWatcher`]; dropping it stops the watch
#[derive(Debug)]
pub struct TemplateChangeStream {
    inner: ReceiverStream<TemplateChange>,
    _guard: WatchGuard,
}

impl Stream for TemplateChangeStream {
    type Item = TemplateChange;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

async fn translate(
    root: PathBuf,
    discovery: Arc<TemplateDiscovery>,
    mut known: HashMap<PathBuf, TemplateMetadata>,
    mut raw_rx: mpsc::Receiver<Event>,
    tx: mpsc::Sender<TemplateChange>,
) {
    while let Some(event) = raw_rx.recv().await {
        let is_create = matches!(event.kind, EventKind::Create(_));
        let is_rename = matches!(event.kind, EventKind::Modify(ModifyKind::Name(_)));

        for path in event.paths {
            let exists = (is_create || is_rename) && tokio::fs::try_exists(&path).await.unwrap_or(false);
            let Some(kind) = classify(&event.kind, is_rename && exists) else {
                continue;
            };
            let is_dir = exists && tokio::fs::metadata(&path).await.map(|m| m.is_dir()).unwrap_or(false);

            let changes = match kind {
                ChangeKind::Deleted => deleted_under(&mut known, &path, discovery.is_recognized(&path)),
                ChangeKind::Created if is_dir => created_under(&root, &discovery, &mut known, &path).await,
                ChangeKind::Created | ChangeKind::Modified if discovery.is_recognized(&path) => {
                    loaded(&root, &discovery, &mut known, path, is_create).await.into_iter().collect()
                }
                _ => Vec::new(),
            };

            for change in changes {
                if tx.send(change).await.is_err() {
                    return;
                }
            }
        }
    }
}

/// Deletions for `path` and, when it was a directory, every known template
/// below it
fn deleted_under(
    known: &mut HashMap<PathBuf, TemplateMetadata>,
    path: &Path,
    recognized: bool,
) -> Vec<TemplateChange> {
    let mut gone: Vec<PathBuf> = known
        .keys()
        .filter(|known_path| known_path.starts_with(path))
        .cloned()
        .collect();
    gone.sort();

    if gone.is_empty() && recognized {
        return vec![TemplateChange {
            kind: ChangeKind::Deleted,
            path: path.to_path_buf(),
            template: None,
        }];
    }

    gone.into_iter()
        .map(|path| TemplateChange {
            kind: ChangeKind::Deleted,
            template: known.remove(&path),
            path,
        })
        .collect()
}

/// Creations for every recognized template inside a directory that appeared
async fn created_under(
    root: &Path,
    discovery: &TemplateDiscovery,
    known: &mut HashMap<PathBuf, TemplateMetadata>,
    dir: &Path,
) -> Vec<TemplateChange> {
    let files = match discovery.recognized_files(dir).await {
        Ok(files) => files,
        Err(e) => {
            tracing::debug!(path = %dir.display(), error = %e, "cannot walk new directory");
            return Vec::new();
        }
    };

    let mut changes = Vec::with_capacity(files.len());
    for file in files {
        changes.extend(loaded(root, discovery, known, file, true).await);
    }
    changes
}

/// Parse a created or modified file and record it as known
///
/// A creation event for a file already known with the same modification
/// time and size is a duplicate of an earlier directory walk and yields
/// nothing.
async fn loaded(
    root: &Path,
    discovery: &TemplateDiscovery,
    known: &mut HashMap<PathBuf, TemplateMetadata>,
    path: PathBuf,
    is_create: bool,
) -> Option<TemplateChange> {
    let template = match discovery.load_template(root, &path).await {
        Ok(template) => template,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "ignoring unparseable change");
            return None;
        }
    };

    let previous = known.insert(path.clone(), template.clone());
    let kind = match previous {
        Some(prev) if is_create && prev.last_modified == template.last_modified && prev.size == template.size => {
            return None;
        }
        Some(_) => ChangeKind::Modified,
        None => ChangeKind::Created,
    };

    Some(TemplateChange {
        kind,
        path,
        template: Some(template),
    })
}
