// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Deklaracije-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deklaracije and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Single-slot debounced autosave.
//!
//! Every aggregate mutation schedules a durable write of the latest snapshot
//! after a quiet interval; a newer snapshot before the interval elapses
//! replaces the pending one, so intermediate states are never persisted.
//! `cancel` waits out an in-flight write before returning; callers clearing
//! storage rely on that ordering to keep a stale flush from resurrecting
//! deleted data.

use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::store::{PersistedState, StateFolder};

pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Default)]
struct AutosaveState {
    pending: Option<PersistedState>,
    deadline: Option<Instant>,
    writing: bool,
    shutdown: bool,
}

#[derive(Debug)]
struct AutosaveInner {
    state: Mutex<AutosaveState>,
    cv: Condvar,
    folder: StateFolder,
}

#[derive(Debug)]
pub struct AutosaveManager {
    inner: Arc<AutosaveInner>,
    quiet_interval: Duration,
    worker: Option<JoinHandle<()>>,
}

impl AutosaveManager {
    pub fn new(folder: StateFolder) -> Self {
        let inner = Arc::new(AutosaveInner {
            state: Mutex::new(AutosaveState::default()),
            cv: Condvar::new(),
            folder,
        });

        let worker = std::thread::Builder::new()
            .name("deklaracije-autosave".to_owned())
            .spawn({
                let inner = inner.clone();
                move || Self::run_worker(inner)
            })
            .expect("spawn autosave worker thread");

        Self {
            inner,
            quiet_interval: DEFAULT_QUIET_INTERVAL,
            worker: Some(worker),
        }
    }

    pub fn with_quiet_interval(mut self, quiet_interval: Duration) -> Self {
        self.quiet_interval = quiet_interval;
        self
    }

    pub fn quiet_interval(&self) -> Duration {
        self.quiet_interval
    }

    /// Replaces the pending snapshot and restarts the quiet interval.
    pub fn schedule(&self, snapshot: PersistedState) {
        let mut state = self.inner.state.lock().expect("autosave lock poisoned");
        if state.shutdown {
            return;
        }
        state.pending = Some(snapshot);
        state.deadline = Some(Instant::now() + self.quiet_interval);
        self.inner.cv.notify_one();
    }

    /// Discards the pending snapshot and waits out any write already in
    /// flight. After this returns, no previously scheduled state can land in
    /// the store.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock().expect("autosave lock poisoned");
        state.pending = None;
        state.deadline = None;
        while state.writing {
            state = self.inner.cv.wait(state).expect("autosave cv poisoned");
        }
    }

    /// Forces the pending snapshot (if any) to disk and waits until the
    /// store is quiescent.
    pub fn flush(&self) {
        let mut state = self.inner.state.lock().expect("autosave lock poisoned");
        if state.pending.is_some() {
            state.deadline = Some(Instant::now());
            self.inner.cv.notify_one();
        }
        while state.pending.is_some() || state.writing {
            state = self.inner.cv.wait(state).expect("autosave cv poisoned");
        }
    }

    /// Whether a snapshot is waiting for its quiet interval to elapse.
    pub fn has_pending(&self) -> bool {
        let state = self.inner.state.lock().expect("autosave lock poisoned");
        state.pending.is_some()
    }

    fn run_worker(inner: Arc<AutosaveInner>) {
        loop {
            let snapshot = {
                let mut state = inner.state.lock().expect("autosave lock poisoned");

                loop {
                    if state.shutdown {
                        // Drain the last snapshot before exiting.
                        match state.pending.take() {
                            Some(snapshot) => {
                                state.deadline = None;
                                state.writing = true;
                                break snapshot;
                            }
                            None => return,
                        }
                    }

                    match (state.deadline, state.pending.is_some()) {
                        (Some(deadline), true) => {
                            let now = Instant::now();
                            if now >= deadline {
                                let snapshot =
                                    state.pending.take().expect("pending checked above");
                                state.deadline = None;
                                state.writing = true;
                                break snapshot;
                            }
                            let wait = deadline.saturating_duration_since(now);
                            let (next, _) = inner
                                .cv
                                .wait_timeout(state, wait)
                                .expect("autosave cv poisoned");
                            state = next;
                        }
                        _ => {
                            state.deadline = None;
                            state = inner.cv.wait(state).expect("autosave cv poisoned");
                        }
                    }
                }
            };

            if let Err(err) = inner.folder.save_state(&snapshot) {
                tracing::warn!(error = %err, "autosave flush failed; state remains in memory");
            }

            let mut state = inner.state.lock().expect("autosave lock poisoned");
            state.writing = false;
            inner.cv.notify_all();
        }
    }
}

impl Drop for AutosaveManager {
    fn drop(&mut self) {
        {
            let mut state = self.inner.state.lock().expect("autosave lock poisoned");
            state.shutdown = true;
            self.inner.cv.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use super::AutosaveManager;
    use crate::store::{PersistedState, StateFolder};

    static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

    struct TempDir {
        path: std::path::PathBuf,
    }

    impl TempDir {
        fn new(prefix: &str) -> Self {
            let nanos =
                SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
            let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
            let mut path = env::temp_dir();
            path.push(format!(
                "deklaracije-{prefix}-{}-{nanos}-{counter}",
                std::process::id()
            ));
            std::fs::create_dir_all(&path).unwrap();
            Self { path }
        }

        fn path(&self) -> &std::path::Path {
            &self.path
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }

    fn snapshot(institution_name: &str) -> PersistedState {
        PersistedState {
            institution_name: institution_name.to_owned(),
            rows: Vec::new(),
            binaries: Vec::new(),
        }
    }

    #[test]
    fn schedule_then_flush_writes_the_snapshot() {
        let tmp = TempDir::new("autosave-flush");
        let folder = StateFolder::new(tmp.path().join("state"));
        let autosave = AutosaveManager::new(folder.clone())
            .with_quiet_interval(Duration::from_millis(20));

        autosave.schedule(snapshot("Vrtić"));
        autosave.flush();

        let meta = folder.get_metadata().unwrap().expect("metadata stored");
        assert_eq!(meta.institution_name, "Vrtić");
    }

    #[test]
    fn rapid_mutations_coalesce_to_the_latest_snapshot() {
        let tmp = TempDir::new("autosave-coalesce");
        let folder = StateFolder::new(tmp.path().join("state"));
        let autosave = AutosaveManager::new(folder.clone())
            .with_quiet_interval(Duration::from_millis(50));

        autosave.schedule(snapshot("prvi"));
        autosave.schedule(snapshot("drugi"));
        autosave.schedule(snapshot("treći"));
        autosave.flush();

        let meta = folder.get_metadata().unwrap().expect("metadata stored");
        assert_eq!(meta.institution_name, "treći");
    }

    #[test]
    fn cancel_suppresses_a_pending_write() {
        let tmp = TempDir::new("autosave-cancel");
        let folder = StateFolder::new(tmp.path().join("state"));
        let autosave = AutosaveManager::new(folder.clone())
            .with_quiet_interval(Duration::from_millis(30));

        autosave.schedule(snapshot("obrisano"));
        autosave.cancel();
        assert!(!autosave.has_pending());

        // Wait well past the quiet interval; nothing may land.
        std::thread::sleep(Duration::from_millis(120));
        assert!(!folder.has_stored_data());
    }

    #[test]
    fn elapsed_quiet_interval_writes_without_an_explicit_flush() {
        let tmp = TempDir::new("autosave-elapsed");
        let folder = StateFolder::new(tmp.path().join("state"));
        let autosave = AutosaveManager::new(folder.clone())
            .with_quiet_interval(Duration::from_millis(20));

        autosave.schedule(snapshot("Vrtić"));
        for _ in 0..100 {
            if folder.has_stored_data() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(folder.has_stored_data());
        drop(autosave);
    }

    #[test]
    fn drop_drains_the_pending_snapshot() {
        let tmp = TempDir::new("autosave-drop");
        let folder = StateFolder::new(tmp.path().join("state"));
        let autosave = AutosaveManager::new(folder.clone())
            .with_quiet_interval(Duration::from_secs(60));

        autosave.schedule(snapshot("na kraju"));
        drop(autosave);

        let meta = folder.get_metadata().unwrap().expect("metadata stored");
        assert_eq!(meta.institution_name, "na kraju");
    }
}
