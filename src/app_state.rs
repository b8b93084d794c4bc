use crate::aggregate::spatial::ZoomThresholds;
use crate::cli::CommandLineArgs;
use crate::dataset::Dataset;
use crate::resource_manager::ResourceManager;

use std::sync::Arc;

/// Shared application state passed to each request handler.
pub struct AppState {
    /// Command line arguments.
    pub args: CommandLineArgs,

    /// Resource manager.
    pub resource_manager: ResourceManager,

    /// Cleaned incident dataset. Read-only once loaded.
    pub dataset: Arc<Dataset>,

    /// Zoom levels at which map grouping becomes finer.
    pub thresholds: ZoomThresholds,
}

impl AppState {
    /// Create and return an [AppState].
    pub fn new(args: &CommandLineArgs, dataset: Dataset) -> Self {
        let task_limit = args
            .thread_limit
            .or_else(|| Some(num_cpus::get().saturating_sub(1).max(1)));
        let resource_manager = ResourceManager::new(task_limit);

        Self {
            args: args.clone(),
            resource_manager,
            dataset: Arc::new(dataset),
            thresholds: args.zoom_thresholds(),
        }
    }
}

/// AppState wrapped in an Atomic Reference Count (Arc) to allow multiple references.
pub type SharedAppState = Arc<AppState>;
