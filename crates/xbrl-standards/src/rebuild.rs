#![deny(unsafe_code)]

//! Background baseline construction.
//!
//! Jobs go through a work queue to a dedicated worker thread. Each key has
//! a result slot holding its [`RebuildState`]; callers poll the slot instead
//! of blocking on the build.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossbeam_channel::{Sender, unbounded};
use xbrl_model::RebuildPhase;

use crate::baseline::{BaselineKey, BaselineSnapshot, BaselineStore};
use crate::cache::BaselineCache;
use crate::error::StandardsError;
use crate::source::BaselineSource;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub enum RebuildState {
    Queued,
    Running,
    Ready(Arc<BaselineSnapshot>),
    Failed(String),
}

impl RebuildState {
    pub fn phase(&self) -> RebuildPhase {
        match self {
            RebuildState::Queued => RebuildPhase::Queued,
            RebuildState::Running => RebuildPhase::Running,
            RebuildState::Ready(_) => RebuildPhase::Ready,
            RebuildState::Failed(_) => RebuildPhase::Failed,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, RebuildState::Ready(_) | RebuildState::Failed(_))
    }
}

type Slots = Arc<RwLock<HashMap<BaselineKey, RebuildState>>>;

fn set_slot(slots: &Slots, key: &BaselineKey, state: RebuildState) {
    let mut slots = slots.write().unwrap_or_else(PoisonError::into_inner);
    slots.insert(key.clone(), state);
}

pub struct BaselineRebuilder {
    sender: Option<Sender<BaselineKey>>,
    slots: Slots,
    worker: Option<JoinHandle<()>>,
}

impl BaselineRebuilder {
    /// Starts the worker thread. Finished snapshots are saved to `store`
    /// and swapped into `cache`.
    pub fn spawn(
        source: Arc<dyn BaselineSource>,
        store: BaselineStore,
        cache: Arc<BaselineCache>,
    ) -> Result<Self, StandardsError> {
        let (sender, receiver) = unbounded::<BaselineKey>();
        let slots: Slots = Arc::default();
        let worker_slots = Arc::clone(&slots);
        let worker = std::thread::Builder::new()
            .name("baseline-rebuild".to_string())
            .spawn(move || {
                for key in receiver {
                    set_slot(&worker_slots, &key, RebuildState::Running);
                    let state = match build(source.as_ref(), &store, &cache, &key) {
                        Ok(snapshot) => RebuildState::Ready(snapshot),
                        Err(err) => {
                            tracing::warn!(baseline = %key, error = %err, "baseline rebuild failed");
                            RebuildState::Failed(err.to_string())
                        }
                    };
                    set_slot(&worker_slots, &key, state);
                }
            })
            .map_err(|e| StandardsError::Worker {
                message: e.to_string(),
            })?;
        Ok(Self {
            sender: Some(sender),
            slots,
            worker: Some(worker),
        })
    }

    /// Queues a rebuild unless one is already queued or running.
    pub fn schedule(&self, key: &BaselineKey) -> RebuildPhase {
        {
            let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(state) = slots.get(key)
                && !state.is_finished()
            {
                return state.phase();
            }
            slots.insert(key.clone(), RebuildState::Queued);
        }
        let sent = self
            .sender
            .as_ref()
            .is_some_and(|sender| sender.send(key.clone()).is_ok());
        if sent {
            tracing::info!(baseline = %key, "baseline rebuild scheduled");
            RebuildPhase::Queued
        } else {
            set_slot(
                &self.slots,
                key,
                RebuildState::Failed("rebuild queue closed".to_string()),
            );
            RebuildPhase::Failed
        }
    }

    pub fn poll(&self, key: &BaselineKey) -> Option<RebuildState> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.get(key).cloned()
    }

    pub fn phase(&self, key: &BaselineKey) -> RebuildPhase {
        self.poll(key)
            .map_or(RebuildPhase::NotScheduled, |state| state.phase())
    }

    /// Polls until the job for `key` finishes or `timeout` elapses.
    pub fn wait_for(&self, key: &BaselineKey, timeout: Duration) -> Option<RebuildState> {
        let deadline = Instant::now() + timeout;
        loop {
            let state = self.poll(key)?;
            if state.is_finished() || Instant::now() >= deadline {
                return Some(state);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Drop for BaselineRebuilder {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::error!("baseline rebuild worker panicked");
        }
    }
}

fn build(
    source: &dyn BaselineSource,
    store: &BaselineStore,
    cache: &BaselineCache,
    key: &BaselineKey,
) -> Result<Arc<BaselineSnapshot>, StandardsError> {
    let started = Instant::now();
    let census = source.enumerate(key)?;
    let snapshot = BaselineSnapshot::from_census(key, census, Utc::now());
    let path = store.save(&snapshot)?;
    tracing::info!(
        baseline = %key,
        present_count = snapshot.present_count,
        path = %path.display(),
        duration_ms = started.elapsed().as_millis(),
        "baseline rebuilt"
    );
    Ok(cache.swap(key.clone(), snapshot))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::baseline::RuleCensus;

    struct FixedSource;

    impl BaselineSource for FixedSource {
        fn enumerate(&self, key: &BaselineKey) -> Result<RuleCensus, StandardsError> {
            if key.entrypoint_id == "broken" {
                return Err(StandardsError::InvalidKey {
                    message: "no taxonomy".to_string(),
                });
            }
            Ok(RuleCensus {
                counts: BTreeMap::from([("v1".to_string(), 1), ("v2".to_string(), 3)]),
                content_hash: "abc".to_string(),
            })
        }
    }

    #[test]
    fn rebuild_publishes_into_cache_and_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = BaselineStore::new(dir.path());
        let cache = Arc::new(BaselineCache::new());
        let rebuilder =
            BaselineRebuilder::spawn(Arc::new(FixedSource), store.clone(), Arc::clone(&cache))
                .unwrap();
        let key = BaselineKey::new("corep_of", "3.4").unwrap();
        assert_eq!(rebuilder.phase(&key), RebuildPhase::NotScheduled);

        rebuilder.schedule(&key);
        let state = rebuilder.wait_for(&key, Duration::from_secs(10)).unwrap();
        assert_eq!(state.phase(), RebuildPhase::Ready);
        assert_eq!(cache.get(&key).unwrap().present_count, 2);
        assert!(store.load(&key).unwrap().is_some());
    }

    #[test]
    fn failures_are_observable() {
        let dir = tempfile::tempdir().unwrap();
        let rebuilder = BaselineRebuilder::spawn(
            Arc::new(FixedSource),
            BaselineStore::new(dir.path()),
            Arc::new(BaselineCache::new()),
        )
        .unwrap();
        let key = BaselineKey::new("broken", "3.4").unwrap();
        rebuilder.schedule(&key);
        let state = rebuilder.wait_for(&key, Duration::from_secs(10)).unwrap();
        assert!(matches!(state, RebuildState::Failed(message) if message.contains("no taxonomy")));
    }
}
