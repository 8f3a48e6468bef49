//! Upsert engine configuration.

/// What a batch write does with records that carry no id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// Leave them out; batches only update pre-identified records.
    #[default]
    SkipUnidentified,
    /// Insert them under a generated id, like a single write would.
    ///
    /// Generated ids are `"{now}-{index}"` so records of one batch never
    /// collide with each other.
    InsertUnidentified,
}

/// Configuration for the upsert engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Handling of unidentified records in batch writes.
    pub batch_policy: BatchPolicy,
    /// Maximum number of records per batch write.
    pub max_batch: usize,
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            batch_policy: BatchPolicy::default(),
            max_batch: 500,
        }
    }

    /// Sets the batch policy.
    pub fn with_batch_policy(mut self, policy: BatchPolicy) -> Self {
        self.batch_policy = policy;
        self
    }

    /// Sets the maximum batch size.
    pub fn with_max_batch(mut self, max: usize) -> Self {
        self.max_batch = max;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
