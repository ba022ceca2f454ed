// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Hot reload of a copedent library file.
//!
//! Modifications are debounced, then the file is reloaded and validated on
//! a background thread. A file that fails to parse produces an error event
//! and leaves the caller's current library untouched.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use super::CopedentLibrary;

/// Events emitted by the library watcher
#[derive(Debug, Clone)]
pub enum LibraryEvent {
    /// The file changed and loaded cleanly
    Reloaded(Box<CopedentLibrary>),
    /// The file changed but failed to load
    Error(String),
    /// The file was removed
    FileDeleted(PathBuf),
}

/// Debounced watcher over one library file
pub struct LibraryWatcher {
    _watcher: RecommendedWatcher,
    event_receiver: Receiver<LibraryEvent>,
    watched_path: PathBuf,
}

fn reload(path: &Path) -> LibraryEvent {
    match CopedentLibrary::load(path) {
        Ok(library) => {
            debug!(path = ?path, copedents = library.copedents.len(), "library reloaded");
            LibraryEvent::Reloaded(Box::new(library))
        }
        Err(e) => {
            warn!(path = ?path, error = %e, "library reload failed");
            LibraryEvent::Error(format!("Failed to load {:?}: {:#}", path, e))
        }
    }
}

impl LibraryWatcher {
    /// Watch `path`, reloading after `debounce_ms` (default 500) of quiet
    pub fn new<P: AsRef<Path>>(path: P, debounce_ms: Option<u64>) -> Result<Self> {
        let watched_path = path.as_ref().to_path_buf();
        let debounce_duration = Duration::from_millis(debounce_ms.unwrap_or(500));

        let (event_tx, event_rx): (Sender<LibraryEvent>, Receiver<LibraryEvent>) = mpsc::channel();
        let (notify_tx, notify_rx): (Sender<Event>, Receiver<Event>) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = notify_tx.send(event);
                }
            },
            Config::default(),
        )
        .map_err(|e| anyhow!("Failed to create file watcher: {}", e))?;

        // Editors often replace the file, so watch its directory
        let watch_dir = match watched_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| anyhow!("Failed to watch path {:?}: {}", watch_dir, e))?;

        let file_name = watched_path.file_name().map(|n| n.to_os_string());
        let reload_path = watched_path.clone();
        std::thread::spawn(move || {
            let mut last_event_time: Option<Instant> = None;
            let is_ours = |p: &Path| p.file_name().map(|n| n.to_os_string()) == file_name;

            loop {
                match notify_rx.recv_timeout(Duration::from_millis(100)) {
                    Ok(event) => {
                        let ours: Vec<PathBuf> =
                            event.paths.into_iter().filter(|p| is_ours(p)).collect();
                        if ours.is_empty() {
                            continue;
                        }
                        match event.kind {
                            EventKind::Remove(_) => {
                                last_event_time = None;
                                for path in ours {
                                    let _ = event_tx.send(LibraryEvent::FileDeleted(path));
                                }
                            }
                            EventKind::Create(_) | EventKind::Modify(_) => {
                                last_event_time = Some(Instant::now());
                            }
                            _ => {}
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        if let Some(last_time) = last_event_time {
                            if last_time.elapsed() >= debounce_duration {
                                last_event_time = None;
                                if event_tx.send(reload(&reload_path)).is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Ok(Self {
            _watcher: watcher,
            event_receiver: event_rx,
            watched_path,
        })
    }

    /// Next event, if one is waiting
    pub fn try_recv(&self) -> Option<LibraryEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Drain all waiting events
    pub fn recv_all(&self) -> Vec<LibraryEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }

    /// Block until the next event
    pub fn recv(&self) -> Option<LibraryEvent> {
        self.event_receiver.recv().ok()
    }

    pub fn watched_path(&self) -> &Path {
        &self.watched_path
    }
}

/// Load and validate a library without applying it
pub fn validate_library<P: AsRef<Path>>(path: P) -> Result<CopedentLibrary> {
    CopedentLibrary::load(path)
}
