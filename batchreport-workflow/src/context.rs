//! Workflow-side view of the engine: the activity call capability and its typed wrapper.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::activity::ActivityOptions;
use crate::error::{ActivityFailure, FailureKind};

/// What a workflow may ask of the engine while it runs.
///
/// The only suspension point a workflow has is an activity call; everything
/// else it does must be deterministic so a replayed run takes the same path.
#[async_trait]
pub trait WorkflowContext: Send + Sync {
    fn run_id(&self) -> &str;

    /// Invoke the activity registered as `name` and wait for its single
    /// logical result (retries happen inside).
    async fn execute_activity_json(
        &self,
        name: &str,
        options: &ActivityOptions,
        input: Value,
    ) -> Result<Value, ActivityFailure>;
}

/// Typed wrapper around [`WorkflowContext::execute_activity_json`].
pub async fn execute_activity<C, P, O>(
    ctx: &C,
    name: &str,
    options: &ActivityOptions,
    params: &P,
) -> Result<O, ActivityFailure>
where
    C: WorkflowContext + ?Sized,
    P: Serialize + Sync + ?Sized,
    O: DeserializeOwned,
{
    let input = serde_json::to_value(params).map_err(|e| {
        ActivityFailure::new(name, FailureKind::Codec, format!("encode params: {e}"), 0)
    })?;
    let output = ctx.execute_activity_json(name, options, input).await?;
    serde_json::from_value(output).map_err(|e| {
        ActivityFailure::new(name, FailureKind::Codec, format!("decode output: {e}"), 0)
    })
}
