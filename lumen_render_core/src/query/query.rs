/// Query - one event, timer or occlusion query
///
/// State machine:
///
/// ```text
/// Idle --begin()--> Active --end()--> Pending --GPU done--> Ready --update()--> Finalized
///                     (event queries: begin() goes straight to Pending)
/// ```
///
/// A Ready or Finalized query may be begun again. Results are captured when
/// the query becomes Ready; the completion callback fires from
/// `QueryManager::update()` when it is finalized.

use std::sync::Mutex;
use crate::device::{BackendQuery, QueryKind, QueryResult};
use crate::query::QueryKey;
use crate::utils::lock;
use crate::engine_warn;

/// Completion callback, called once per completed begin/end cycle
pub type QueryCallback = Box<dyn FnMut(&QueryResult) + Send>;

/// Lifecycle state of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    /// Recording between begin() and end()
    Active,
    /// Ended, waiting for the GPU
    Pending,
    /// GPU done, result captured
    Ready,
    /// Result delivered to the callback
    Finalized,
}

impl QueryState {
    /// True while the GPU may still write to the query
    pub fn is_in_flight(self) -> bool {
        matches!(self, QueryState::Active | QueryState::Pending)
    }
}

struct QueryInner {
    state: QueryState,
    /// None once the manager released the query
    backend: Option<Box<dyn BackendQuery>>,
    result: Option<QueryResult>,
    callback: Option<QueryCallback>,
}

/// Render-thread GPU query
pub struct Query {
    key: QueryKey,
    kind: QueryKind,
    device_idx: u32,
    inner: Mutex<QueryInner>,
}

impl Query {
    pub(crate) fn new(key: QueryKey, kind: QueryKind, device_idx: u32, backend: Box<dyn BackendQuery>) -> Self {
        Self {
            key,
            kind,
            device_idx,
            inner: Mutex::new(QueryInner {
                state: QueryState::Idle,
                backend: Some(backend),
                result: None,
                callback: None,
            }),
        }
    }

    pub fn key(&self) -> QueryKey {
        self.key
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    pub fn device_idx(&self) -> u32 {
        self.device_idx
    }

    pub fn state(&self) -> QueryState {
        lock(&self.inner).state
    }

    /// Start recording
    ///
    /// An event query is signaled right away and goes to Pending. Ignored
    /// (with a warning) while the query is in flight or released.
    pub fn begin(&self) {
        let mut inner = lock(&self.inner);
        if inner.state.is_in_flight() {
            engine_warn!("lumen::Query", "begin() on a {:?} query in state {:?}", self.kind, inner.state);
            return;
        }
        let Some(backend) = inner.backend.as_mut() else {
            engine_warn!("lumen::Query", "begin() on a released {:?} query", self.kind);
            return;
        };
        backend.begin();
        let state = match self.kind {
            QueryKind::Event => {
                backend.end();
                QueryState::Pending
            }
            _ => QueryState::Active,
        };
        inner.state = state;
        inner.result = None;
    }

    /// Stop recording; the GPU completes the query later
    pub fn end(&self) {
        let mut inner = lock(&self.inner);
        if inner.state != QueryState::Active {
            engine_warn!("lumen::Query", "end() on a {:?} query in state {:?}", self.kind, inner.state);
            return;
        }
        if let Some(backend) = inner.backend.as_mut() {
            backend.end();
            inner.state = QueryState::Pending;
        }
    }

    /// True once the GPU completed the query
    ///
    /// Polls the backend when Pending. Not ready is a status, not an error.
    pub fn is_ready(&self) -> bool {
        let mut inner = lock(&self.inner);
        Self::poll(&mut inner);
        matches!(inner.state, QueryState::Ready | QueryState::Finalized)
    }

    /// Measured GPU time, once a timer query is ready
    pub fn elapsed_ms(&self) -> Option<f32> {
        match self.result()? {
            QueryResult::Timer { elapsed_ms } => Some(elapsed_ms),
            _ => None,
        }
    }

    /// Samples that passed, once an occlusion query is ready
    ///
    /// Binary occlusion queries only report 0 or 1.
    pub fn num_samples(&self) -> Option<u64> {
        match self.result()? {
            QueryResult::Occlusion { num_samples } => Some(num_samples),
            _ => None,
        }
    }

    /// Captured result (None until the query is ready)
    pub fn result(&self) -> Option<QueryResult> {
        let mut inner = lock(&self.inner);
        Self::poll(&mut inner);
        inner.result
    }

    /// Install the completion callback, replacing any previous one
    pub fn on_complete<F>(&self, callback: F)
    where
        F: FnMut(&QueryResult) + Send + 'static,
    {
        lock(&self.inner).callback = Some(Box::new(callback));
    }

    /// True once the manager dropped the backend query
    pub fn is_released(&self) -> bool {
        lock(&self.inner).backend.is_none()
    }

    // ===== MANAGER HOOKS =====

    fn poll(inner: &mut QueryInner) {
        if inner.state != QueryState::Pending {
            return;
        }
        let Some(backend) = inner.backend.as_ref() else { return };
        if backend.is_ready() {
            inner.result = Some(backend.result());
            inner.state = QueryState::Ready;
        }
    }

    /// Poll the GPU; finalize and run the callback if the query completed
    ///
    /// Returns true if the query was finalized by this call.
    pub(crate) fn update(&self) -> bool {
        let (result, callback) = {
            let mut inner = lock(&self.inner);
            Self::poll(&mut inner);
            if inner.state != QueryState::Ready {
                return false;
            }
            inner.state = QueryState::Finalized;
            let Some(result) = inner.result else { return true };
            (result, inner.callback.take())
        };

        // Callback runs unlocked so it may inspect the query
        if let Some(mut callback) = callback {
            callback(&result);
            let mut inner = lock(&self.inner);
            if inner.callback.is_none() {
                inner.callback = Some(callback);
            }
        }
        true
    }

    /// Poll the GPU and report whether the query is still in flight
    pub(crate) fn poll_in_flight(&self) -> bool {
        let mut inner = lock(&self.inner);
        Self::poll(&mut inner);
        inner.state.is_in_flight()
    }

    /// Drop the backend query and the callback
    pub(crate) fn release(&self) {
        let mut inner = lock(&self.inner);
        inner.backend = None;
        inner.callback = None;
    }
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("kind", &self.kind)
            .field("device_idx", &self.device_idx)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
