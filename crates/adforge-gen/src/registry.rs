//! Bounded registry of in-flight and recently finished generation requests.
//!
//! Keyed by generated request id, LRU-bounded, with real cancellation: a
//! cancelled entry's [`AbortHandle`] stops the in-flight future, and the
//! terminal status is recorded so a late result is recognizably void.

use futures_util::future::{AbortHandle, AbortRegistration};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

/// Maximum entries kept before finished ones are evicted oldest-first.
pub const REGISTRY_CAPACITY: usize = 64;
/// Age after which finished entries are dropped by a purge.
pub const ENTRY_MAX_AGE: Duration = Duration::from_secs(5 * 60);

/// Opaque id for one generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a tracked request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Processing,
    Completed,
    Error,
}

struct RequestEntry {
    status: RequestStatus,
    created_at: Instant,
    updated_at: Instant,
    error: Option<String>,
    abort: AbortHandle,
}

/// Bounded, LRU-evicted request registry.
pub struct RequestRegistry {
    entries: HashMap<RequestId, RequestEntry>,
    order: VecDeque<RequestId>,
    capacity: usize,
    max_age: Duration,
}

impl Default for RequestRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::with_limits(REGISTRY_CAPACITY, ENTRY_MAX_AGE)
    }

    pub fn with_limits(capacity: usize, max_age: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            max_age,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Track a new request. Returns its id and the abort registration to
    /// wrap around the request future.
    pub fn begin(&mut self) -> (RequestId, AbortRegistration) {
        let (abort, registration) = AbortHandle::new_pair();
        let id = RequestId::new();
        let now = Instant::now();
        self.entries.insert(
            id,
            RequestEntry {
                status: RequestStatus::Processing,
                created_at: now,
                updated_at: now,
                error: None,
                abort,
            },
        );
        self.order.push_back(id);
        self.evict_over_capacity();
        (id, registration)
    }

    /// Evict finished entries oldest-first until within capacity. In-flight
    /// entries are never dropped, so the registry can briefly exceed its
    /// bound when everything is still processing.
    fn evict_over_capacity(&mut self) {
        while self.entries.len() > self.capacity {
            let victim = self
                .order
                .iter()
                .copied()
                .find(|id| {
                    self.entries
                        .get(id)
                        .is_some_and(|e| e.status != RequestStatus::Processing)
                });
            match victim {
                Some(id) => {
                    debug!(request = %id, "evicting finished generation entry");
                    self.remove(id);
                }
                None => break,
            }
        }
    }

    fn remove(&mut self, id: RequestId) {
        self.entries.remove(&id);
        self.order.retain(|entry| *entry != id);
    }

    fn finish(&mut self, id: RequestId, status: RequestStatus, error: Option<String>) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.status = status;
                entry.error = error;
                entry.updated_at = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Mark a request completed.
    pub fn complete(&mut self, id: RequestId) -> bool {
        self.finish(id, RequestStatus::Completed, None)
    }

    /// Mark a request failed with its error message.
    pub fn fail(&mut self, id: RequestId, message: impl Into<String>) -> bool {
        self.finish(id, RequestStatus::Error, Some(message.into()))
    }

    /// Cancel an in-flight request: aborts the future and records a terminal
    /// error status. Returns false when the request is unknown or already
    /// finished.
    pub fn cancel(&mut self, id: RequestId) -> bool {
        match self.entries.get(&id) {
            Some(entry) if entry.status == RequestStatus::Processing => {
                entry.abort.abort();
                self.finish(id, RequestStatus::Error, Some("cancelled".into()))
            }
            _ => false,
        }
    }

    pub fn status(&self, id: RequestId) -> Option<RequestStatus> {
        self.entries.get(&id).map(|entry| entry.status)
    }

    pub fn error_message(&self, id: RequestId) -> Option<&str> {
        self.entries.get(&id).and_then(|entry| entry.error.as_deref())
    }

    /// Seconds-resolution age of an entry since it was created.
    pub fn age(&self, id: RequestId) -> Option<Duration> {
        self.entries.get(&id).map(|entry| entry.created_at.elapsed())
    }

    /// Drop finished entries not updated within the max age. Returns how
    /// many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let expired: Vec<RequestId> = self
            .entries
            .iter()
            .filter(|(_, entry)| {
                entry.status != RequestStatus::Processing
                    && now.saturating_duration_since(entry.updated_at) >= self.max_age
            })
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            self.remove(*id);
        }
        if !expired.is_empty() {
            debug!(count = expired.len(), "purged expired generation entries");
        }
        expired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lifecycle_processing_to_completed() {
        let mut registry = RequestRegistry::new();
        let (id, _registration) = registry.begin();
        assert_eq!(registry.status(id), Some(RequestStatus::Processing));

        assert!(registry.complete(id));
        assert_eq!(registry.status(id), Some(RequestStatus::Completed));
        assert_eq!(registry.error_message(id), None);
    }

    #[tokio::test]
    async fn test_fail_records_message() {
        let mut registry = RequestRegistry::new();
        let (id, _registration) = registry.begin();
        assert!(registry.fail(id, "503 Service Unavailable"));
        assert_eq!(registry.status(id), Some(RequestStatus::Error));
        assert_eq!(registry.error_message(id), Some("503 Service Unavailable"));
    }

    #[tokio::test]
    async fn test_cancel_aborts_the_wrapped_future() {
        use futures_util::future::{Abortable, Aborted};

        let mut registry = RequestRegistry::new();
        let (id, registration) = registry.begin();
        let fut = Abortable::new(std::future::pending::<()>(), registration);

        assert!(registry.cancel(id));
        assert_eq!(registry.status(id), Some(RequestStatus::Error));
        assert_eq!(registry.error_message(id), Some("cancelled"));
        assert_eq!(fut.await, Err(Aborted));

        // A second cancel is a no-op on a finished entry.
        assert!(!registry.cancel(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_drops_old_finished_entries_only() {
        let mut registry = RequestRegistry::new();
        let (done, _r1) = registry.begin();
        registry.complete(done);
        let (in_flight, _r2) = registry.begin();

        tokio::time::advance(ENTRY_MAX_AGE + Duration::from_secs(1)).await;
        let (fresh, _r3) = registry.begin();
        registry.complete(fresh);

        assert_eq!(registry.purge_expired(), 1);
        assert_eq!(registry.status(done), None);
        assert_eq!(registry.status(in_flight), Some(RequestStatus::Processing));
        assert_eq!(registry.status(fresh), Some(RequestStatus::Completed));
    }

    #[tokio::test]
    async fn test_capacity_evicts_finished_oldest_first() {
        let mut registry = RequestRegistry::with_limits(2, ENTRY_MAX_AGE);
        let (a, _ra) = registry.begin();
        registry.complete(a);
        let (b, _rb) = registry.begin();
        registry.complete(b);
        let (c, _rc) = registry.begin();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.status(a), None);
        assert_eq!(registry.status(b), Some(RequestStatus::Completed));
        assert_eq!(registry.status(c), Some(RequestStatus::Processing));
    }

    #[tokio::test]
    async fn test_in_flight_entries_are_never_evicted() {
        let mut registry = RequestRegistry::with_limits(1, ENTRY_MAX_AGE);
        let (a, _ra) = registry.begin();
        let (b, _rb) = registry.begin();

        // Both still processing: the bound is exceeded rather than dropping
        // a live request.
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.status(a), Some(RequestStatus::Processing));
        assert_eq!(registry.status(b), Some(RequestStatus::Processing));
    }
}
