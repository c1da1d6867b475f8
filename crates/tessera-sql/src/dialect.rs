//! SQL dialect support.
//!
//! A dialect decides how identifiers are quoted, how placeholders are
//! spelled, and whether a clause renders differently from the default slot
//! layout.

use crate::clause::ClauseBuilder;

/// Dialect-specific rendering rules.
pub trait Dialect {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Returns the placeholder for the bound value at `index` (1-based).
    fn placeholder(&self, index: usize) -> String {
        let _ = index;
        String::from("?")
    }

    /// Quotes an identifier, doubling embedded quote characters.
    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        let mut quoted = String::with_capacity(name.len() + 2);
        quoted.push(quote);
        for ch in name.chars() {
            if ch == quote {
                quoted.push(quote);
            }
            quoted.push(ch);
        }
        quoted.push(quote);
        quoted
    }

    /// Returns a custom renderer for the clause named `name`, if any.
    fn clause_builder(&self, name: &str) -> Option<ClauseBuilder> {
        let _ = name;
        None
    }
}

/// ANSI SQL: double-quoted identifiers and `?` placeholders.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericDialect;

impl GenericDialect {
    /// Creates a new generic dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }
}
