#![forbid(unsafe_code)]

//! Construction-time configuration for [`FlagStore`](crate::FlagStore).

/// Configuration fixed when a store is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagStoreConfig {
    /// Merge mode used by [`FlagStore::set_flags`](crate::FlagStore::set_flags):
    /// `true` rebuilds from the initial flags, `false` merges into the
    /// current flags.
    pub default_reset: bool,
    /// Reject keys outside the initial key set with
    /// [`FlagError::UnknownKey`](crate::FlagError::UnknownKey). When
    /// disabled, such keys are silently dropped.
    pub validate_keys: bool,
}

impl Default for FlagStoreConfig {
    fn default() -> Self {
        Self {
            default_reset: true,
            validate_keys: true,
        }
    }
}

impl FlagStoreConfig {
    /// Create the default configuration (reset on bulk update, strict keys).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default merge mode for bulk updates.
    #[must_use]
    pub fn with_default_reset(mut self, default_reset: bool) -> Self {
        self.default_reset = default_reset;
        self
    }

    /// Enable or disable unknown-key validation.
    #[must_use]
    pub fn with_validate_keys(mut self, validate_keys: bool) -> Self {
        self.validate_keys = validate_keys;
        self
    }

    /// Merge into current flags by default, keeping strict key validation.
    #[must_use]
    pub fn merging() -> Self {
        Self::default().with_default_reset(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FlagStoreConfig::default();
        assert!(config.default_reset);
        assert!(config.validate_keys);
        assert_eq!(config, FlagStoreConfig::new());
    }

    #[test]
    fn builders() {
        let config = FlagStoreConfig::new()
            .with_default_reset(false)
            .with_validate_keys(false);
        assert!(!config.default_reset);
        assert!(!config.validate_keys);
        assert!(!FlagStoreConfig::merging().default_reset);
        assert!(FlagStoreConfig::merging().validate_keys);
    }
}
