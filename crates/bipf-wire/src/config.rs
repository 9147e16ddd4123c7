/// Default maximum nesting depth for decoding.
pub const DEFAULT_MAX_DEPTH: usize = 10_000;

/// Default number of bytes shown on each side of a decode failure.
pub const DEFAULT_ANNOTATE_WINDOW: usize = 10;

/// Default number of bytes of wider context shown on each side of a decode failure.
pub const DEFAULT_CONTEXT_WINDOW: usize = 50;

/// Default initial buffer size for a writer.
pub const DEFAULT_INITIAL_CAPACITY: usize = 512;

/// Reader configuration.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Maximum composite nesting depth. Default: 10,000.
    pub max_depth: usize,
    /// Bytes shown on each side of the failure offset in error messages.
    pub annotate_window: usize,
    /// Bytes of wider context shown on each side of the failure offset.
    pub context_window: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            annotate_window: DEFAULT_ANNOTATE_WINDOW,
            context_window: DEFAULT_CONTEXT_WINDOW,
        }
    }
}

/// Writer configuration.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Initial capacity of the output buffer.
    pub initial_capacity: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}
