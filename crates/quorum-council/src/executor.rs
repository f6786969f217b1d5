use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use quorum_ai::{ChatMessage, ModelClient};

use crate::Stage1Response;

/// Queries every model concurrently and returns the successful responses in
/// council order.
///
/// A failing model is logged and omitted; it never aborts sibling
/// invocations and never surfaces an error here. If every model fails the
/// result is simply empty; escalating that is the orchestrator's call.
/// Cancelling the token aborts the in-flight invocations.
pub async fn query_models_parallel(
    client: Arc<dyn ModelClient>,
    models: &[String],
    messages: &[ChatMessage],
    timeout: Duration,
    cancel: &CancellationToken,
) -> Vec<Stage1Response> {
    let messages: Arc<[ChatMessage]> = messages.into();
    let mut tasks = JoinSet::new();

    for (index, model) in models.iter().enumerate() {
        let client = Arc::clone(&client);
        let messages = Arc::clone(&messages);
        let model = model.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(model = %model, "model query cancelled");
                    None
                }
                result = client.complete(&model, &messages, timeout) => match result {
                    Ok(text) => Some(text),
                    Err(error) => {
                        tracing::warn!(model = %model, error = %error, "model query failed");
                        None
                    }
                },
            };
            (index, model, outcome)
        });
    }

    // Reassemble in fan-out order so the anonymization traversal downstream
    // is reproducible within the run.
    let mut slots: Vec<Option<Stage1Response>> = models.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, model, Some(text))) => {
                slots[index] = Some(Stage1Response {
                    model,
                    response: text,
                });
            }
            Ok((_, _, None)) => {}
            Err(join_error) => {
                tracing::warn!(error = %join_error, "model query task aborted");
            }
        }
    }

    slots.into_iter().flatten().collect()
}
