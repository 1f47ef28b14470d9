//! Processor selection for subtasks.

use std::sync::Arc;

use heydav_core::{CommandProcessor, Intent, ProcessorFactory, Result, TaskExecutionRequest};
use tracing::debug;

/// Processor type preferred for an intent.
pub fn processor_type_for(intent: Intent) -> &'static str {
    match intent {
        Intent::Create | Intent::Update | Intent::Delete => "todo",
        Intent::Schedule => "schedule",
        _ => "general",
    }
}

/// Picks the processor for a request.
///
/// An explicit processor type on the originating command wins; otherwise the
/// intent route is tried, then the factory's best match for the description.
///
/// # Errors
/// Returns an error when the factory has no processor for the description.
pub fn select_processor(
    factory: &dyn ProcessorFactory,
    request: &TaskExecutionRequest,
) -> Result<Arc<dyn CommandProcessor>> {
    let preferred = request
        .command
        .processor_type
        .as_deref()
        .unwrap_or_else(|| processor_type_for(request.task.intent));

    factory.get_processor(preferred).or_else(|error| {
        debug!(
            "{} for task {}, falling back to best match",
            error, request.id
        );
        factory.get_best_processor(&request.task.description)
    })
}
