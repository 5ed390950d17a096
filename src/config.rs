/// Events kept in a document's log before the oldest are dropped
pub const DEFAULT_EVENT_LOG_LIMIT: usize = 1000;

/// Global slot the helper installs itself under
pub const DEFAULT_SLOT: &str = "_pageProbe";

/// Options for a [`Window`](crate::Window)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowOptions {
    /// Name of the global slot holding the helper
    pub slot: String,

    /// Maximum number of recorded events
    pub event_log_limit: usize,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            slot: DEFAULT_SLOT.to_string(),
            event_log_limit: DEFAULT_EVENT_LOG_LIMIT,
        }
    }
}

impl WindowOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the slot name
    pub fn slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = slot.into();
        self
    }

    /// Set the event log limit
    pub fn event_log_limit(mut self, limit: usize) -> Self {
        self.event_log_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_options_builder() {
        let opts = WindowOptions::new().slot("_biloba").event_log_limit(10);

        assert_eq!(opts.slot, "_biloba");
        assert_eq!(opts.event_log_limit, 10);
    }

    #[test]
    fn test_window_options_default() {
        let opts = WindowOptions::default();

        assert_eq!(opts.slot, DEFAULT_SLOT);
        assert_eq!(opts.event_log_limit, DEFAULT_EVENT_LOG_LIMIT);
    }
}
