//! The document-analysis collaborator.

use crate::error::AnalysisError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Structured fields extracted from a document. Opaque to the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentAnalysis(pub serde_json::Value);

/// Remote service that turns a scanned document into structured data.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        payload: &[u8],
        mime_type: &str,
    ) -> Result<DocumentAnalysis, AnalysisError>;
}
