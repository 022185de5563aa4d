use std::time::Duration;

use taskboard_model::DEFAULT_PAGE_SIZE;

/// Quiet window applied to search text before it reaches the filter.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Quiet window of the search debouncer.
    pub debounce: Duration,
    /// Page size of the initial pagination window.
    pub page_size: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
