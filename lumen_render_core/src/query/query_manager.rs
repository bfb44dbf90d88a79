/// QueryManager - creation, per-frame polling and deferred deletion of queries
///
/// Deleting a query never destroys it on the spot: the GPU may still write to
/// it. Deleted queries are parked in a queue and released by
/// `process_deleted_queue()` (run at the start of every `update()`) once they
/// are no longer in flight. A query deleted while recording is ended on the
/// spot so the GPU completes it even if its owner never does.

use std::sync::{Arc, Mutex};
use slotmap::{new_key_type, SlotMap};
use crate::device::{QueryKind, RenderBackend};
use crate::error::Result;
use crate::query::{Query, QueryState};
use crate::utils::lock;
use crate::{engine_debug, engine_trace, engine_warn};

new_key_type! {
    /// Stable key of a query inside its manager
    pub struct QueryKey;
}

/// Render-thread query registry
pub struct QueryManager {
    backend: Arc<Mutex<dyn RenderBackend>>,
    queries: SlotMap<QueryKey, Arc<Query>>,
    /// Queries still polled by `update()`, in creation order
    live: Vec<QueryKey>,
    /// Deleted queries waiting for the GPU, in deletion order
    deleted: Vec<QueryKey>,
    frame: u64,
}

impl QueryManager {
    pub fn new(backend: Arc<Mutex<dyn RenderBackend>>) -> Self {
        Self {
            backend,
            queries: SlotMap::with_key(),
            live: Vec::new(),
            deleted: Vec::new(),
            frame: 0,
        }
    }

    // ===== CREATION =====

    fn create(&mut self, kind: QueryKind, device_idx: u32) -> Result<Arc<Query>> {
        let backend_query = lock(&self.backend).create_query(kind, device_idx)?;
        let key = self.queries.insert_with_key(|key| {
            Arc::new(Query::new(key, kind, device_idx, backend_query))
        });
        self.live.push(key);
        engine_trace!("lumen::QueryManager", "Created {:?} query on device {}", kind, device_idx);
        Ok(self.queries[key].clone())
    }

    /// New event query on GPU `device_idx`
    pub fn create_event_query(&mut self, device_idx: u32) -> Result<Arc<Query>> {
        self.create(QueryKind::Event, device_idx)
    }

    /// New timer query on GPU `device_idx`
    pub fn create_timer_query(&mut self, device_idx: u32) -> Result<Arc<Query>> {
        self.create(QueryKind::Timer, device_idx)
    }

    /// New occlusion query on GPU `device_idx`
    ///
    /// A binary query only tells whether any sample passed and may complete
    /// earlier than a precise one.
    pub fn create_occlusion_query(&mut self, binary: bool, device_idx: u32) -> Result<Arc<Query>> {
        self.create(QueryKind::Occlusion { binary }, device_idx)
    }

    // ===== DELETION =====

    fn delete(&mut self, query: &Query, expected: &str, matches_kind: bool) {
        if !matches_kind {
            engine_warn!("lumen::QueryManager",
                "{:?} query deleted as {} query", query.kind(), expected);
        }
        let Some(position) = self.live.iter().position(|&key| key == query.key()) else {
            engine_warn!("lumen::QueryManager",
                "{:?} query deleted twice or not owned by this manager", query.kind());
            return;
        };
        self.live.remove(position);
        if query.state() == QueryState::Active {
            engine_debug!("lumen::QueryManager",
                "{:?} query deleted while recording, ended now", query.kind());
            query.end();
        }
        self.deleted.push(query.key());
    }

    /// Schedule an event query for destruction
    pub fn delete_event_query(&mut self, query: &Query) {
        self.delete(query, "event", query.kind() == QueryKind::Event);
    }

    /// Schedule a timer query for destruction
    pub fn delete_timer_query(&mut self, query: &Query) {
        self.delete(query, "timer", query.kind() == QueryKind::Timer);
    }

    /// Schedule an occlusion query for destruction
    pub fn delete_occlusion_query(&mut self, query: &Query) {
        self.delete(query, "occlusion", matches!(query.kind(), QueryKind::Occlusion { .. }));
    }

    /// Release every deleted query the GPU is done with
    ///
    /// Returns the number of queries released.
    pub fn process_deleted_queue(&mut self) -> usize {
        let queries = &mut self.queries;
        let before = self.deleted.len();
        self.deleted.retain(|&key| {
            let Some(query) = queries.get(key) else { return false };
            if query.poll_in_flight() {
                return true;
            }
            query.release();
            queries.remove(key);
            false
        });
        let released = before - self.deleted.len();
        if released > 0 {
            engine_debug!("lumen::QueryManager",
                "Released {} queries, {} still in flight", released, self.deleted.len());
        }
        released
    }

    // ===== PER FRAME =====

    /// Once per frame: release finished deleted queries, then poll live ones
    ///
    /// Completed queries are finalized in creation order and their callback
    /// fires exactly once.
    /// Returns the number of queries finalized.
    pub fn update(&mut self) -> usize {
        self.process_deleted_queue();

        let mut finalized = 0;
        for &key in &self.live {
            if let Some(query) = self.queries.get(key) {
                if query.update() {
                    finalized += 1;
                }
            }
        }
        self.frame += 1;
        finalized
    }

    // ===== QUERIES =====

    /// Queries created and not deleted
    pub fn live_query_count(&self) -> usize {
        self.live.len()
    }

    /// Deleted queries not released yet
    pub fn pending_deletion_count(&self) -> usize {
        self.deleted.len()
    }

    /// Number of `update()` calls so far
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl Drop for QueryManager {
    fn drop(&mut self) {
        if !self.deleted.is_empty() {
            engine_warn!("lumen::QueryManager",
                "{} deleted queries still in flight at shutdown", self.deleted.len());
        }
        for (_, query) in self.queries.drain() {
            query.release();
        }
    }
}

#[cfg(test)]
#[path = "query_manager_tests.rs"]
mod tests;
