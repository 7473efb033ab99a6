//! Generation service: the retrying client plus request tracking, behind one
//! cheaply clonable handle.

use crate::client::{BackgroundClient, GenerateRequest, GenerateResponse, GenerateTransport};
use crate::error::{GenerateError, GenerateResult};
use crate::registry::{RequestId, RequestRegistry, RequestStatus};
use futures_util::future::Abortable;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct Inner<T> {
    client: BackgroundClient<T>,
    registry: Mutex<RequestRegistry>,
}

/// Tracked background generation.
///
/// Every call gets a request id up front; the returned future runs the
/// retrying client, records the terminal status in the registry, and can be
/// cancelled mid-flight through [`GenerationService::cancel`]. A cancelled
/// request is logically void: its future resolves to
/// [`GenerateError::Cancelled`] and any late service result is ignored.
pub struct GenerationService<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for GenerationService<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: GenerateTransport + 'static> GenerationService<T> {
    pub fn new(client: BackgroundClient<T>) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                registry: Mutex::new(RequestRegistry::new()),
            }),
        }
    }

    fn registry(&self) -> MutexGuard<'_, RequestRegistry> {
        self.inner.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a tracked generation. Returns the request id immediately plus
    /// the future that drives the call; awaiting it yields the result.
    pub fn begin(
        &self,
        request: GenerateRequest,
    ) -> (
        RequestId,
        impl Future<Output = GenerateResult<GenerateResponse>> + Send + use<T>,
    ) {
        let (id, registration) = self.registry().begin();
        let inner = Arc::clone(&self.inner);
        let future = async move {
            let outcome = Abortable::new(inner.client.generate(&request), registration).await;
            let mut registry = inner.registry.lock().unwrap_or_else(PoisonError::into_inner);
            match outcome {
                Ok(Ok(response)) => {
                    registry.complete(id);
                    Ok(response)
                }
                Ok(Err(err)) => {
                    registry.fail(id, err.to_string());
                    Err(err)
                }
                // cancel() already recorded the terminal status.
                Err(_aborted) => Err(GenerateError::Cancelled),
            }
        };
        (id, future)
    }

    /// Cancel an in-flight request, aborting its future.
    pub fn cancel(&self, id: RequestId) -> bool {
        self.registry().cancel(id)
    }

    pub fn status(&self, id: RequestId) -> Option<RequestStatus> {
        self.registry().status(id)
    }

    pub fn error_message(&self, id: RequestId) -> Option<String> {
        self.registry().error_message(id).map(str::to_string)
    }

    /// Drop finished registry entries older than the max age.
    pub fn purge_expired(&self) -> usize {
        self.registry().purge_expired()
    }
}
