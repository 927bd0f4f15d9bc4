//! Runtime configuration options

/// Configuration options for the pzero runtime
#[derive(Clone, Debug, Default)]
pub struct RuntimeConfig {
    pub trace: bool,
    pub list_code: bool,
}

impl RuntimeConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable per-instruction execution tracing
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Enable or disable printing the code listing before execution
    pub fn with_list_code(mut self, list_code: bool) -> Self {
        self.list_code = list_code;
        self
    }
}
