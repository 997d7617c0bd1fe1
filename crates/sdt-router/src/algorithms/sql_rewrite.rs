//! # SQL Table Rewriter
//!
//! Renames physical table references to their partition names
//! (`orders` -> `orders_002`).
//!
//! ## Paths
//!
//! 1. **Structural**: parse with `sqlparser`, visit every relation of a
//!    SELECT/INSERT/UPDATE/DELETE statement wherever it appears (joins,
//!    derived tables, CTEs, subqueries in any expression position) and
//!    rename qualifying identifiers. The
//!    new names are spliced into the original text at the parser's token
//!    locations, so whitespace, comments and casing survive. If a location
//!    cannot be verified the mutated tree is re-serialized instead.
//! 2. **Fallback**: when parsing fails, a single regex pass renames a name
//!    directly following `FROM`, `INTO`, `UPDATE` or `JOIN`. Everything else
//!    is copied verbatim.
//!
//! A reference qualifies iff its (unqualified, case-sensitive) name is a key
//! of the table map with a shard count above one. Rewriting is idempotent:
//! a renamed table is no longer a key.

use crate::domain::RewriteError;
use regex::{Captures, Regex};
use sqlparser::ast::{visit_relations_mut, Ident, ObjectName, ObjectNamePart, Statement};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use std::collections::BTreeMap;
use std::ops::ControlFlow;
use tracing::{debug, warn};

/// Table name -> shard count.
pub type TableShardCounts = BTreeMap<String, u32>;

/// Keyword-anchored table pattern used when structural parsing fails.
pub const FALLBACK_PATTERN: &str = r"(?i)\b(from|into|update|join)(\s+)(\w+)\b";

/// Which path produced a rewrite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RewritePath {
    /// Parsed and rewritten structurally.
    Structural,
    /// Parse failed; the keyword pattern was applied.
    Fallback,
    /// Nothing qualified for renaming.
    Unchanged,
}

impl RewritePath {
    /// Label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::Fallback => "fallback",
            Self::Unchanged => "unchanged",
        }
    }
}

/// Result of [`SqlTableRewriter::rewrite_detailed`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// Output SQL.
    pub sql: String,
    /// Path taken.
    pub path: RewritePath,
    /// Original names of the renamed tables, in encounter order.
    pub renamed: Vec<String>,
}

impl RewriteOutcome {
    fn unchanged(sql: &str) -> Self {
        Self {
            sql: sql.to_string(),
            path: RewritePath::Unchanged,
            renamed: Vec::new(),
        }
    }

    /// True when at least one table was renamed.
    pub fn is_changed(&self) -> bool {
        !self.renamed.is_empty()
    }
}

/// SQL table rewriter.
#[derive(Clone, Debug)]
pub struct SqlTableRewriter {
    fallback: Regex,
}

impl SqlTableRewriter {
    /// Compile the fallback pattern.
    pub fn new() -> Result<Self, RewriteError> {
        let fallback =
            Regex::new(FALLBACK_PATTERN).map_err(|e| RewriteError::Pattern(e.to_string()))?;
        Ok(Self { fallback })
    }

    /// Rewrite `sql`, returning the output text only.
    pub fn rewrite(&self, sql: &str, tables: &TableShardCounts, suffix: &str) -> String {
        self.rewrite_detailed(sql, tables, suffix).sql
    }

    /// Rewrite `sql` and report the path taken.
    pub fn rewrite_detailed(
        &self,
        sql: &str,
        tables: &TableShardCounts,
        suffix: &str,
    ) -> RewriteOutcome {
        if sql.trim().is_empty() || !tables.values().any(|count| *count > 1) {
            return RewriteOutcome::unchanged(sql);
        }

        match self.rewrite_structural(sql, tables, suffix) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("[sdt] {}; using keyword fallback", err);
                self.rewrite_fallback(sql, tables, suffix)
            }
        }
    }

    /// Structural path only. Fails with [`RewriteError::Parse`] on
    /// unparseable input.
    pub fn rewrite_structural(
        &self,
        sql: &str,
        tables: &TableShardCounts,
        suffix: &str,
    ) -> Result<RewriteOutcome, RewriteError> {
        let mut statements = Parser::parse_sql(&GenericDialect {}, sql)
            .map_err(|e| RewriteError::Parse(e.to_string()))?;

        let mut renamer = TableRenamer::new(tables, suffix);
        for statement in &mut statements {
            renamer.statement(statement);
        }

        if renamer.edits.is_empty() {
            return Ok(RewriteOutcome::unchanged(sql));
        }

        let output = match splice(sql, &renamer.edits) {
            Some(spliced) => spliced,
            None => {
                debug!("[sdt] token locations unusable, re-serializing statement");
                statements
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ")
            }
        };

        debug!("[sdt] structural rewrite: {} -> {}", sql, output);
        Ok(RewriteOutcome {
            sql: output,
            path: RewritePath::Structural,
            renamed: renamer.edits.into_iter().map(|edit| edit.table).collect(),
        })
    }

    /// Keyword-pattern path only.
    pub fn rewrite_fallback(
        &self,
        sql: &str,
        tables: &TableShardCounts,
        suffix: &str,
    ) -> RewriteOutcome {
        let mut renamed = Vec::new();
        let output = self.fallback.replace_all(sql, |caps: &Captures<'_>| {
            let table = &caps[3];
            match tables.get(table) {
                Some(count) if *count > 1 => {
                    renamed.push(table.to_string());
                    format!("{}{}{}_{}", &caps[1], &caps[2], table, suffix)
                }
                _ => caps[0].to_string(),
            }
        });

        debug!("[sdt] fallback rewrite renamed {:?}", renamed);
        RewriteOutcome {
            sql: output.into_owned(),
            path: RewritePath::Fallback,
            renamed,
        }
    }
}

// =============================================================================
// Structural walk
// =============================================================================

#[derive(Debug)]
struct RenameEdit {
    table: String,
    line: u64,
    column: u64,
    original: String,
    replacement: String,
}

struct TableRenamer<'a> {
    tables: &'a TableShardCounts,
    suffix: &'a str,
    edits: Vec<RenameEdit>,
}

impl<'a> TableRenamer<'a> {
    fn new(tables: &'a TableShardCounts, suffix: &'a str) -> Self {
        Self {
            tables,
            suffix,
            edits: Vec::new(),
        }
    }

    /// Rename every relation of a DML statement. Other statements are left
    /// alone.
    fn statement(&mut self, statement: &mut Statement) {
        match statement {
            Statement::Query(_) | Statement::Insert(_) | Statement::Update { .. } => {}
            // Multi-table DELETE targets are plain names, not relations.
            Statement::Delete(delete) => {
                for name in &mut delete.tables {
                    self.object_name(name);
                }
            }
            _ => return,
        }

        let _ = visit_relations_mut(statement, |name| {
            self.object_name(name);
            ControlFlow::<()>::Continue(())
        });
    }

    /// Rename the last part of a possibly schema-qualified name.
    fn object_name(&mut self, name: &mut ObjectName) {
        let Some(last) = name.0.last_mut() else {
            return;
        };
        match last {
            ObjectNamePart::Identifier(ident) => self.ident(ident),
            #[allow(unreachable_patterns)]
            _ => {}
        }
    }

    fn ident(&mut self, ident: &mut Ident) {
        match self.tables.get(&ident.value) {
            Some(count) if *count > 1 => {}
            _ => return,
        }

        let table = ident.value.clone();
        let original = ident.to_string();
        ident.value = format!("{}_{}", table, self.suffix);

        self.edits.push(RenameEdit {
            line: ident.span.start.line,
            column: ident.span.start.column,
            replacement: ident.to_string(),
            original,
            table,
        });
    }
}

// =============================================================================
// Text splicing
// =============================================================================

/// Apply edits at their token locations. `None` if any location is missing,
/// does not hold the expected identifier, or overlaps another edit.
fn splice(sql: &str, edits: &[RenameEdit]) -> Option<String> {
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(sql.match_indices('\n').map(|(i, _)| i + 1))
        .collect();

    let mut located = edits
        .iter()
        .map(|edit| {
            let start = byte_offset(sql, &line_starts, edit.line, edit.column)?;
            sql[start..].starts_with(&edit.original).then_some((start, edit))
        })
        .collect::<Option<Vec<_>>>()?;
    located.sort_by_key(|(start, _)| *start);

    let mut output = String::with_capacity(sql.len() + edits.len() * 8);
    let mut cursor = 0;
    for (start, edit) in located {
        if start < cursor {
            return None;
        }
        output.push_str(&sql[cursor..start]);
        output.push_str(&edit.replacement);
        cursor = start + edit.original.len();
    }
    output.push_str(&sql[cursor..]);
    Some(output)
}

/// Byte offset of a 1-based (line, character column) location.
fn byte_offset(sql: &str, line_starts: &[usize], line: u64, column: u64) -> Option<usize> {
    let line_index = usize::try_from(line.checked_sub(1)?).ok()?;
    let column_index = usize::try_from(column.checked_sub(1)?).ok()?;
    let line_start = *line_starts.get(line_index)?;

    sql[line_start..]
        .char_indices()
        .nth(column_index)
        .map(|(offset, _)| line_start + offset)
}
