//! Integration tests for clause composition and merging.

use tessera_sql::clause::{FromClause, Limit, OrderBy, Select, Where};
use tessera_sql::{Builder, Clause, ClauseBuilder, ClauseKind, Column, Dialect, Expr, Expression};
use tessera_sql::{GenericDialect, Statement, Table};

fn limit_of(stmt: &Statement<'_>) -> Limit {
    match stmt.clause("LIMIT").and_then(|c| c.expression.as_ref()) {
        Some(ClauseKind::Limit(limit)) => *limit,
        other => panic!("expected a live LIMIT clause, got {other:?}"),
    }
}

#[test]
fn test_limit_then_offset_combine() {
    let dialect = GenericDialect::new();
    let mut stmt = Statement::new(&dialect);
    stmt.add_clause(Limit { limit: 10, offset: 0 });
    stmt.add_clause(Limit { limit: 0, offset: 5 });

    assert_eq!(limit_of(&stmt), Limit { limit: 10, offset: 5 });
}

#[test]
fn test_later_limit_wins() {
    let dialect = GenericDialect::new();
    let mut stmt = Statement::new(&dialect);
    stmt.add_clause(Limit::new(10));
    stmt.add_clause(Limit::new(20));

    assert_eq!(limit_of(&stmt), Limit::new(20));
    assert_eq!(stmt.clause("LIMIT").map(|c| c.name.as_str()), Some(""));
    stmt.build(&["LIMIT"]);
    assert_eq!(stmt.sql(), "LIMIT 20");
}

#[test]
fn test_zero_limit_renders_nothing() {
    let dialect = GenericDialect::new();
    let mut stmt = Statement::new(&dialect);
    stmt.add_clause(Limit::offset(5));
    stmt.build(&["LIMIT"]);
    assert_eq!(stmt.sql(), "");
}

#[test]
fn test_generic_clauses_keep_last_write() {
    let dialect = GenericDialect::new();
    let mut stmt = Statement::new(&dialect);
    stmt.add_clause(Select::new().column(Column::new("id")));
    stmt.add_clause(Select::new().column(Column::new("name")));
    stmt.add_clause(FromClause::new(Table::new("users")));
    stmt.add_clause(OrderBy::new().asc(Column::new("id")));
    stmt.add_clause(OrderBy::new().desc(Column::new("name")));
    assert_eq!(stmt.clause("SELECT").map(|c| c.name.as_str()), Some("SELECT"));
    assert_eq!(stmt.clause("ORDER BY").map(|c| c.name.as_str()), Some("ORDER BY"));
    stmt.build_all();

    assert_eq!(
        stmt.sql(),
        "SELECT \"name\" FROM \"users\" ORDER BY \"name\" DESC"
    );
}

#[test]
fn test_where_conditions_accumulate() {
    let dialect = GenericDialect::new();
    let mut stmt = Statement::new(&dialect).table("users");
    stmt.add_clause(Select::new().column(Expr::new("count(*)")));
    stmt.add_clause(FromClause::new(Table::current()));
    stmt.add_clause(Where::new([Expr::new("active = ?").var(Expression::value(true))]));
    stmt.add_clause(Where::new([Expr::new("age > ?").var(Expression::value(18))]));
    stmt.build(&["SELECT", "FROM", "WHERE"]);

    let (sql, vars) = stmt.into_parts();
    assert_eq!(
        sql,
        "SELECT count(*) FROM \"users\" WHERE active = ? AND age > ?"
    );
    assert_eq!(vars.len(), 2);
}

struct FetchFirst;

impl Dialect for FetchFirst {
    fn name(&self) -> &'static str {
        "fetch-first"
    }

    fn clause_builder(&self, name: &str) -> Option<ClauseBuilder> {
        fn offset_fetch(clause: &Clause, builder: &mut dyn Builder) {
            if let Some(ClauseKind::Limit(limit)) = &clause.expression {
                builder.write_str(&format!(
                    "OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
                    limit.offset, limit.limit
                ));
            }
        }

        (name == "LIMIT").then_some(offset_fetch as ClauseBuilder)
    }
}

#[test]
fn test_dialect_builder_overrides_limit_rendering() {
    let dialect = FetchFirst;
    let mut stmt = Statement::new(&dialect);
    stmt.add_clause(Select::new());
    stmt.add_clause(FromClause::new(Table::new("t")));
    stmt.add_clause(Limit::new(10));
    stmt.add_clause(Limit::offset(20));
    stmt.build_all();

    assert_eq!(
        stmt.sql(),
        "SELECT * FROM \"t\" OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
    );
}
