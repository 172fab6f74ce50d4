//! SQL generation: assembles a full migration script from a diff result.

mod ddl;
mod dml;

pub use ddl::DdlRenderer;
pub use dml::DmlRenderer;

use crate::diff::DiffResult;
use crate::dialect::SqlDialect;

/// Renders a complete migration script for the given dialect.
///
/// Structural statements for every table come first, then row statements,
/// each group ordered by table name. Statements end with a semicolon and
/// are separated by newlines; table blocks are separated by a blank line.
/// An empty diff yields an empty string.
#[must_use]
pub fn generate_sql(diff: &DiffResult, dialect: &dyn SqlDialect) -> String {
    let mut blocks = Vec::new();

    let ddl = DdlRenderer::new(dialect);
    for schema_diff in diff.schema_diffs.values() {
        let statements = ddl.render(schema_diff);
        if !statements.is_empty() {
            blocks.push(join_statements(&statements));
        }
    }

    let dml = DmlRenderer::new(dialect);
    for data_diff in diff.data_diffs.values() {
        let statements = dml.render(data_diff);
        if !statements.is_empty() {
            blocks.push(join_statements(&statements));
        }
    }

    blocks.join("\n\n")
}

fn join_statements(statements: &[String]) -> String {
    statements
        .iter()
        .map(|statement| format!("{statement};"))
        .collect::<Vec<_>>()
        .join("\n")
}
