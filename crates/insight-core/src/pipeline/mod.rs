//! Pipelines
//!
//! Each pipeline runs start to finish inside one request. The public entry
//! points wrap the run in a single recovery boundary: caller errors pass
//! through, every other error or panic becomes the pipeline's canned record
//! with [`Degradation::InternalFault`].

mod insight;
mod strategy;

pub use insight::{InsightPipeline, InsightRequest};
pub use strategy::{StrategyPipeline, StrategyRequest};

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::Instrument;

use crate::completion::{Degradation, Generated};
use crate::error::Result;

async fn guarded<T, Fut>(pipeline: &'static str, run: Fut, canned: impl FnOnce() -> T) -> Result<Generated<T>>
where
    Fut: Future<Output = Result<Generated<T>>>,
{
    let span = tracing::info_span!("pipeline", name = pipeline, request_id = %uuid::Uuid::new_v4());

    match AssertUnwindSafe(run.instrument(span)).catch_unwind().await {
        Ok(Ok(generated)) => Ok(generated),
        Ok(Err(err)) if err.is_caller_error() => Err(err),
        Ok(Err(err)) => {
            tracing::error!(pipeline, error = %err, "Pipeline fault; returning canned record");
            Ok(Generated::degraded(canned(), Degradation::InternalFault))
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".into());
            tracing::error!(pipeline, panic = %message, "Pipeline panicked; returning canned record");
            Ok(Generated::degraded(canned(), Degradation::InternalFault))
        }
    }
}
