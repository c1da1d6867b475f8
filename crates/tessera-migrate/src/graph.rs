//! Dependency ordering of models.
//!
//! Foreign keys define the edges: a model depends on every model its
//! constraints reference, self references excluded. Models are placed so
//! that each referenced table comes before the tables referencing it. The
//! depth-first insertion runs on an explicit stack, so deep chains cannot
//! overflow and cycles terminate on the visited set.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::model::ModelRef;
use crate::schema::Schema;

/// A parsed model and the models it references.
#[derive(Debug)]
pub struct Node {
    /// The model as supplied.
    pub model: ModelRef,
    /// Its parsed schema.
    pub schema: Schema,
    /// Referenced models, deduplicated, in constraint order.
    pub depends_on: Vec<ModelRef>,
}

/// Dependency graph built for a single ordering call.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: HashMap<String, Node>,
    roots: Vec<String>,
}

struct Frame {
    table: String,
    next: usize,
}

impl DependencyGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a model and records its dependencies.
    ///
    /// `root` marks a directly supplied model; roots are placed in the order
    /// they were inserted. Inserting a table twice keeps the first model.
    ///
    /// # Errors
    ///
    /// Propagates the model's parse failure.
    pub fn insert(&mut self, model: ModelRef, root: bool) -> Result<()> {
        let table = model.table_name().to_owned();
        if root && !self.roots.contains(&table) {
            self.roots.push(table.clone());
        }
        if self.nodes.contains_key(&table) {
            return Ok(());
        }

        let schema = model.schema()?;
        let mut seen = HashSet::new();
        let depends_on = schema
            .constraints()
            .filter(|constraint| constraint.reference_table != schema.table)
            .filter(|constraint| seen.insert(constraint.reference_table.clone()))
            .map(|constraint| Arc::clone(&constraint.reference))
            .collect();

        self.nodes.insert(
            table,
            Node {
                model,
                schema,
                depends_on,
            },
        );
        Ok(())
    }

    /// Returns the node recorded for `table`.
    #[must_use]
    pub fn node(&self, table: &str) -> Option<&Node> {
        self.nodes.get(table)
    }

    /// Orders the roots and their dependencies.
    ///
    /// Dependencies that were not inserted are parsed and placed when
    /// `auto_add` is set, and skipped otherwise (assumed to exist already).
    ///
    /// # Errors
    ///
    /// Propagates the parse failure of an auto-added model.
    pub fn sort(&mut self, auto_add: bool) -> Result<Vec<ModelRef>> {
        let mut ordered = Vec::with_capacity(self.nodes.len());
        let mut entered: HashSet<String> = HashSet::new();

        for root in self.roots.clone() {
            if !entered.insert(root.clone()) {
                continue;
            }
            let mut stack = vec![Frame {
                table: root,
                next: 0,
            }];

            while let Some(frame) = stack.last_mut() {
                let next = self
                    .nodes
                    .get(&frame.table)
                    .and_then(|node| node.depends_on.get(frame.next).cloned());

                let Some(dependency) = next else {
                    if let Some(node) = self.nodes.get(&frame.table) {
                        ordered.push(Arc::clone(&node.model));
                    }
                    stack.pop();
                    continue;
                };
                frame.next += 1;

                let table = dependency.table_name().to_owned();
                if entered.contains(&table) {
                    continue;
                }
                if !self.nodes.contains_key(&table) {
                    if !auto_add {
                        continue;
                    }
                    debug!(table = %table, "Auto-adding referenced model");
                    self.insert(dependency, false)?;
                }
                entered.insert(table.clone());
                stack.push(Frame { table, next: 0 });
            }
        }

        debug!(
            tables = ?ordered.iter().map(|model| model.table_name()).collect::<Vec<_>>(),
            "Ordered models"
        );
        Ok(ordered)
    }
}

/// Orders models so that referenced tables come first.
///
/// # Errors
///
/// Propagates the first model parse failure.
pub fn reorder_models(models: &[ModelRef], auto_add: bool) -> Result<Vec<ModelRef>> {
    let mut graph = DependencyGraph::new();
    for model in models {
        graph.insert(Arc::clone(model), true)?;
    }
    graph.sort(auto_add)
}
