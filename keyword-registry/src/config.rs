//! Configuration for dynamic keyword cores.

/// Options applied when a [`DynamicCore`](crate::DynamicCore) is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoreConfig {
    tags_supported: bool,
}

impl CoreConfig {
    /// Creates the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tags_supported: false,
        }
    }

    /// Declares up front that the host queries tags separately, so tags are
    /// never appended to documentation.
    #[must_use]
    pub const fn with_tags_supported(mut self, supported: bool) -> Self {
        self.tags_supported = supported;
        self
    }

    /// Initial value of the tag-support flag.
    #[must_use]
    pub const fn tags_supported(self) -> bool {
        self.tags_supported
    }
}
