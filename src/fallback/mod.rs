//! Real-or-synthetic input for stages whose data source may be down.

pub mod logs;
pub mod parser;
pub mod synthetic;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub use logs::KubectlLogSource;
pub use parser::LogLineParser;
pub use synthetic::{generate_logs, SyntheticLogPolicy};

/// The real source could not supply usable data.
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct Unavailable {
    pub reason: String,
}

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Where a stage's input came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    Cluster,
    Synthetic,
}

impl DataOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cluster => "cluster",
            Self::Synthetic => "synthetic",
        }
    }
}

/// A data source with a schema-valid synthetic substitute.
#[async_trait]
pub trait FallbackDataSource: Send + Sync {
    type Data: Send;

    fn name(&self) -> &str;

    /// Errors, empty results and malformed content all count as unavailable.
    async fn fetch_real(&self) -> Result<Self::Data, Unavailable>;

    fn generate_synthetic(&self) -> Self::Data;
}

/// Data plus its provenance.
#[derive(Debug, Clone)]
pub struct Sourced<T> {
    pub data: T,
    pub origin: DataOrigin,
    /// Why the real source was skipped, if it was.
    pub fallback_reason: Option<String>,
}

pub async fn fetch_or_synthesize<S>(source: &S) -> Sourced<S::Data>
where
    S: FallbackDataSource + ?Sized,
{
    match source.fetch_real().await {
        Ok(data) => {
            info!(source = source.name(), "Using real data");
            Sourced {
                data,
                origin: DataOrigin::Cluster,
                fallback_reason: None,
            }
        }
        Err(unavailable) => {
            warn!(
                source = source.name(),
                reason = %unavailable,
                "Real data unavailable, falling back to synthetic data"
            );
            Sourced {
                data: source.generate_synthetic(),
                origin: DataOrigin::Synthetic,
                fallback_reason: Some(unavailable.reason),
            }
        }
    }
}
