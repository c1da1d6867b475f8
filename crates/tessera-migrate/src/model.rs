//! The metadata-parser interface.
//!
//! The migrator never inspects model values itself. Anything that can
//! describe its table as a [`Schema`] is a model: a hand-built schema, a
//! manifest entry, or a type generated elsewhere.

use std::fmt::Debug;
use std::sync::Arc;

use crate::error::Result;
use crate::schema::Schema;

/// A value that can be parsed into a schema descriptor.
pub trait Model: Debug + Send + Sync {
    /// Returns the table name without parsing the full schema.
    fn table_name(&self) -> &str;

    /// Parses the schema descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::ParseFailed`](crate::error::MigrateError::ParseFailed)
    /// if the value does not describe a valid model.
    fn schema(&self) -> Result<Schema>;
}

/// A shared model handle.
pub type ModelRef = Arc<dyn Model>;

impl Model for Schema {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn schema(&self) -> Result<Schema> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DataType, Field};

    #[test]
    fn test_schema_is_its_own_model() {
        let model: ModelRef = Arc::new(
            Schema::new("tags").field(Field::new("id", DataType::Int).primary_key()),
        );
        assert_eq!(model.table_name(), "tags");
        assert_eq!(model.schema().unwrap().fields.len(), 1);
    }
}
