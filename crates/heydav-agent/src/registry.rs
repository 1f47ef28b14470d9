use std::sync::Arc;

use async_trait::async_trait;
use heydav_core::{CommandProcessor, Error, Plugin, PluginManager, ProcessorFactory, Result};

type ProcessorList = Arc<Vec<Arc<dyn CommandProcessor>>>;

/// Processor factory over a fixed list of processors.
///
/// Best-match lookup prefers the longest matching command pattern (earliest
/// registration on ties), then the fallback type, then the first registered
/// processor.
#[derive(Clone)]
pub struct ProcessorRegistry {
    processors: ProcessorList,
    fallback_type: String,
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self {
            processors: Arc::new(Vec::new()),
            fallback_type: "general".to_owned(),
        }
    }
}

impl ProcessorRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a processor to the registry
    #[must_use]
    pub fn with_processor(mut self, processor: Arc<dyn CommandProcessor>) -> Self {
        Arc::make_mut(&mut self.processors).push(processor);
        self
    }

    /// Processor type used when no pattern matches
    #[must_use]
    pub fn with_fallback(mut self, processor_type: impl Into<String>) -> Self {
        self.fallback_type = processor_type.into();
        self
    }

    /// Number of registered processors
    #[must_use]
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl ProcessorFactory for ProcessorRegistry {
    fn get_processor(&self, processor_type: &str) -> Result<Arc<dyn CommandProcessor>> {
        self.processors
            .iter()
            .find(|processor| processor.processor_type().eq_ignore_ascii_case(processor_type))
            .cloned()
            .ok_or_else(|| Error::ProcessorNotFound(processor_type.to_owned()))
    }

    fn get_best_processor(&self, command: &str) -> Result<Arc<dyn CommandProcessor>> {
        let best = self
            .processors
            .iter()
            .rev()
            .filter_map(|processor| {
                processor
                    .capabilities()
                    .match_strength(command)
                    .map(|strength| (strength, processor))
            })
            .max_by_key(|(strength, _)| *strength)
            .map(|(_, processor)| Arc::clone(processor));

        best.or_else(|| self.get_processor(&self.fallback_type).ok())
            .or_else(|| self.processors.first().cloned())
            .ok_or_else(|| Error::NoProcessorAvailable(command.to_owned()))
    }

    fn all_processors(&self) -> Vec<Arc<dyn CommandProcessor>> {
        self.processors.iter().cloned().collect()
    }
}

/// Plugin manager over an in-memory plugin list.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistry {
    /// Add a loaded plugin
    #[must_use]
    pub fn with_plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }
}

#[async_trait]
impl PluginManager for PluginRegistry {
    async fn loaded_plugins(&self) -> Vec<Arc<dyn Plugin>> {
        self.plugins.clone()
    }
}
