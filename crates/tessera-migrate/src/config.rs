//! Migrator configuration.

use serde::{Deserialize, Serialize};

/// Options that change which statements the migrator emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigratorConfig {
    /// Create indexes with separate `CREATE INDEX` statements after
    /// `CREATE TABLE`, even where the dialect accepts inline definitions.
    pub create_index_after_create_table: bool,
    /// During `auto_migrate`, create tables without inline foreign keys and
    /// add them with `ALTER TABLE ... ADD CONSTRAINT` once the whole batch
    /// exists.
    pub allow_deferred_constraints_when_auto_migrate: bool,
}

impl MigratorConfig {
    /// Creates the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            create_index_after_create_table: false,
            allow_deferred_constraints_when_auto_migrate: false,
        }
    }

    /// Sets [`Self::create_index_after_create_table`].
    #[must_use]
    pub const fn create_index_after_create_table(mut self, enabled: bool) -> Self {
        self.create_index_after_create_table = enabled;
        self
    }

    /// Sets [`Self::allow_deferred_constraints_when_auto_migrate`].
    #[must_use]
    pub const fn deferred_constraints(mut self, enabled: bool) -> Self {
        self.allow_deferred_constraints_when_auto_migrate = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: MigratorConfig =
            serde_json::from_str(r#"{"create_index_after_create_table": true}"#).unwrap();
        assert!(config.create_index_after_create_table);
        assert!(!config.allow_deferred_constraints_when_auto_migrate);
        assert_eq!(serde_json::from_str::<MigratorConfig>("{}").unwrap(), MigratorConfig::new());
    }
}
