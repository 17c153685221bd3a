//! # NarrativeGenerator Trait
//!
//! The capability interface for the external text-generation collaborator.
//! The pipeline depends only on this trait; the Gemini-backed implementation
//! lives in `feedback::gemini`, and callers inject alternatives for testing
//! or offline operation.
//!
//! The contract is deliberately small: one free-text prompt in, one free-text
//! response out. The caller decides what the text means (a markdown feedback
//! document, a JSON chapter listing) and recovers locally when the call
//! fails; a failing generator must be treated as routine, not exceptional.

use async_trait::async_trait;

use crate::error::ReportError;

/// A pluggable text-generation strategy.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// Sends one prompt to the service and returns its raw text response.
    ///
    /// # Errors
    ///
    /// [`ReportError::NarrativeError`] on transport failure, a missing API
    /// key, or an empty/undecodable response.
    async fn generate(&self, prompt: &str) -> Result<String, ReportError>;
}
