//! Blocking options.

/// Options for driving a blocking strategy over a series of images.
///
/// The default values are:
/// - `concurrent_target`: number of threads available to Rayon
#[derive(Debug, Clone, Copy)]
pub struct BlockingOptions {
    concurrent_target: usize,
}

impl Default for BlockingOptions {
    fn default() -> Self {
        Self {
            concurrent_target: rayon::current_num_threads(),
        }
    }
}

impl BlockingOptions {
    /// Return the concurrent target.
    #[must_use]
    pub fn concurrent_target(&self) -> usize {
        self.concurrent_target
    }

    /// Set the concurrent target.
    ///
    /// A value of zero is treated as one.
    pub fn set_concurrent_target(&mut self, concurrent_target: usize) -> &mut Self {
        self.concurrent_target = concurrent_target;
        self
    }

    /// Set the concurrent target.
    ///
    /// A value of zero is treated as one.
    #[must_use]
    pub fn with_concurrent_target(mut self, concurrent_target: usize) -> Self {
        self.concurrent_target = concurrent_target;
        self
    }

    pub(crate) fn concurrent_limit(&self) -> usize {
        self.concurrent_target.max(1)
    }
}
