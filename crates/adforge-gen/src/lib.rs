//! AdForge background generation
//!
//! Client for the external AI background-generation service: wire contract,
//! validation, retry with exponential backoff on transient failures, and a
//! bounded request registry with real cancellation.

pub mod client;
pub mod error;
pub mod registry;
pub mod service;

pub use client::{
    BACKOFF_BASE_DELAY, BackgroundClient, GenerateRequest, GenerateResponse, GenerateTransport,
    GeneratedImage, MAX_ATTEMPTS,
};
#[cfg(feature = "http-client")]
pub use client::HttpTransport;
pub use error::{GenerateError, GenerateResult};
pub use registry::{ENTRY_MAX_AGE, REGISTRY_CAPACITY, RequestId, RequestRegistry, RequestStatus};
pub use service::GenerationService;
