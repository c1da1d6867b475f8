//! `LIMIT` / `OFFSET`.

use super::{Clause, ClauseKind};
use crate::statement::Builder;

/// Row limit and offset; zero means unset.
///
/// Renders its own keywords, and nothing at all without a limit, so the
/// live clause's name token is cleared on merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Limit {
    /// Maximum number of rows.
    pub limit: u64,
    /// Rows to skip.
    pub offset: u64,
}

impl Limit {
    /// Creates a limit without offset.
    #[must_use]
    pub const fn new(limit: u64) -> Self {
        Self { limit, offset: 0 }
    }

    /// Creates an offset without limit.
    #[must_use]
    pub const fn offset(offset: u64) -> Self {
        Self { limit: 0, offset }
    }

    pub(crate) fn build(&self, builder: &mut dyn Builder) {
        if self.limit > 0 {
            builder.write_str("LIMIT ");
            builder.write_str(&self.limit.to_string());

            if self.offset > 0 {
                builder.write_str(" OFFSET ");
                builder.write_str(&self.offset.to_string());
            }
        }
    }

    /// The incoming limit keeps its set fields; unset ones are filled from
    /// the live `LIMIT`.
    pub(crate) fn merge_into(mut self, clause: &mut Clause) {
        clause.name.clear();

        if let Some(ClauseKind::Limit(live)) = &clause.expression {
            if self.limit == 0 && live.limit > 0 {
                self.limit = live.limit;
            }
            if self.offset == 0 && live.offset > 0 {
                self.offset = live.offset;
            }
        }

        clause.expression = Some(ClauseKind::Limit(self));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged(steps: &[Limit]) -> Limit {
        let mut clause = Clause::named("LIMIT");
        for step in steps {
            step.merge_into(&mut clause);
        }
        match clause.expression {
            Some(ClauseKind::Limit(limit)) => limit,
            other => panic!("expected LIMIT, got {other:?}"),
        }
    }

    #[test]
    fn test_offset_fills_gap_left_by_limit() {
        let limit = merged(&[Limit::new(10), Limit::offset(5)]);
        assert_eq!(limit, Limit { limit: 10, offset: 5 });
    }

    #[test]
    fn test_new_limit_wins_over_old() {
        let limit = merged(&[Limit::new(10), Limit::new(20)]);
        assert_eq!(limit, Limit::new(20));
    }

    #[test]
    fn test_old_fields_fill_in_either_direction() {
        let limit = merged(&[Limit::offset(5), Limit::new(10)]);
        assert_eq!(limit, Limit { limit: 10, offset: 5 });
    }

    #[test]
    fn test_merge_clears_name() {
        let mut clause = Clause::named("LIMIT");
        Limit::new(1).merge_into(&mut clause);
        assert!(clause.name.is_empty());
    }
}
