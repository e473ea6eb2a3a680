use std::collections::HashMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::ast::{
    Expr, JoinKind, OrderTerm, Predicate, Select, UnionProjection, UnionQuery,
};
use super::params::{ParamSet, SqlValue};
use crate::error::{QueryError, Result};

/// Target store dialect. Placeholder syntax and timestamp comparison differ;
/// everything else the renderer emits is portable between the two.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    Sqlite,
}

impl Dialect {
    fn placeholder(&self, position: usize) -> String {
        match self {
            Dialect::Postgres => format!("${position}"),
            Dialect::Sqlite => format!("?{position}"),
        }
    }
}

/// Rendered SQL plus positional parameter values, ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Renders IR trees to SQL text.
///
/// Placeholders are numbered in order of first use, so every value in
/// [`CompiledQuery::params`] is referenced and a shared parameter keeps a
/// single position no matter how many predicates mention it.
#[derive(Debug)]
pub struct Renderer<'a> {
    dialect: Dialect,
    params: &'a ParamSet,
    out: String,
    positions: HashMap<String, usize>,
    bound: Vec<SqlValue>,
}

impl<'a> Renderer<'a> {
    pub fn new(dialect: Dialect, params: &'a ParamSet) -> Self {
        Self {
            dialect,
            params,
            out: String::with_capacity(1024),
            positions: HashMap::new(),
            bound: Vec::with_capacity(params.len()),
        }
    }

    pub fn render_select(mut self, select: &Select) -> Result<CompiledQuery> {
        self.select(select)?;
        Ok(self.finish())
    }

    pub fn render_union(mut self, query: &UnionQuery) -> Result<CompiledQuery> {
        match query.projection {
            UnionProjection::All => self.out.push_str("SELECT * FROM ("),
            UnionProjection::Count => {
                self.out.push_str("SELECT COUNT(*) AS total FROM (")
            }
        }
        for (index, branch) in query.branches.iter().enumerate() {
            if index > 0 {
                self.out.push_str(" UNION ");
            }
            self.select(branch)?;
        }
        let _ = write!(self.out, ") AS {}", UnionQuery::ALIAS);

        if !query.order_by.is_empty() {
            self.out.push_str(" ORDER BY ");
            for (index, term) in query.order_by.iter().enumerate() {
                if index > 0 {
                    self.out.push_str(", ");
                }
                self.order_term(term)?;
            }
        }
        if let Some(limit) = &query.limit {
            self.out.push_str(" LIMIT ");
            self.expr(limit)?;
        }
        if let Some(offset) = &query.offset {
            self.out.push_str(" OFFSET ");
            self.expr(offset)?;
        }
        Ok(self.finish())
    }

    fn finish(self) -> CompiledQuery {
        CompiledQuery {
            sql: self.out,
            params: self.bound,
        }
    }

    fn order_term(&mut self, term: &OrderTerm) -> Result<()> {
        self.expr(&term.expr)?;
        self.out.push(' ');
        self.out.push_str(term.order.keyword());
        if term.nulls_last {
            self.out.push_str(" NULLS LAST");
        }
        Ok(())
    }

    fn select(&mut self, select: &Select) -> Result<()> {
        self.out.push_str("SELECT ");
        if select.distinct {
            self.out.push_str("DISTINCT ");
        }
        for (index, projection) in select.projection.iter().enumerate() {
            if index > 0 {
                self.out.push_str(", ");
            }
            self.expr(&projection.expr)?;
            if let Some(alias) = projection.alias {
                let _ = write!(self.out, " AS {alias}");
            }
        }
        let _ = write!(
            self.out,
            " FROM {} {}",
            select.from.table, select.from.alias
        );
        for join in &select.joins {
            let keyword = match join.kind {
                JoinKind::Inner => "JOIN",
                JoinKind::Left => "LEFT JOIN",
            };
            let _ = write!(
                self.out,
                " {keyword} {} {} ON ",
                join.table.table, join.table.alias
            );
            self.predicate(&join.on)?;
        }
        if !select.filter.is_empty() {
            self.out.push_str(" WHERE ");
            self.conjunction(&select.filter)?;
        }
        if !select.group_by.is_empty() {
            self.out.push_str(" GROUP BY ");
            for (index, expr) in select.group_by.iter().enumerate() {
                if index > 0 {
                    self.out.push_str(", ");
                }
                self.expr(expr)?;
            }
        }
        if !select.having.is_empty() {
            self.out.push_str(" HAVING ");
            self.conjunction(&select.having)?;
        }
        Ok(())
    }

    fn conjunction(&mut self, predicates: &[Predicate]) -> Result<()> {
        for (index, predicate) in predicates.iter().enumerate() {
            if index > 0 {
                self.out.push_str(" AND ");
            }
            self.predicate(predicate)?;
        }
        Ok(())
    }

    fn param(&mut self, name: &str) -> Result<()> {
        let position = match self.positions.get(name) {
            Some(position) => *position,
            None => {
                let value = self.params.get(name).ok_or_else(|| {
                    QueryError::UnboundParameter(name.to_string())
                })?;
                self.bound.push(value.clone());
                let position = self.bound.len();
                self.positions.insert(name.to_string(), position);
                position
            }
        };
        let placeholder = self.dialect.placeholder(position);
        self.out.push_str(&placeholder);
        Ok(())
    }

    fn expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Column(column) => {
                let _ =
                    write!(self.out, "{}.{}", column.qualifier, column.name);
            }
            Expr::Param(name) => self.param(name)?,
            Expr::Null(ty) => {
                let _ = write!(self.out, "CAST(NULL AS {})", ty.name());
            }
            Expr::Int(value) => {
                let _ = write!(self.out, "{value}");
            }
            Expr::Decimal(value) => self.out.push_str(value),
            Expr::Text(value) => {
                self.out.push('\'');
                self.out.push_str(&value.replace('\'', "''"));
                self.out.push('\'');
            }
            Expr::Bool(value) => {
                self.out.push_str(if *value { "TRUE" } else { "FALSE" })
            }
            Expr::Func(name, args) => {
                self.out.push_str(name);
                self.out.push('(');
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        self.out.push_str(", ");
                    }
                    self.expr(arg)?;
                }
                self.out.push(')');
            }
            Expr::CountAll => self.out.push_str("COUNT(*)"),
            Expr::Binary(lhs, op, rhs) => {
                self.out.push('(');
                self.expr(lhs)?;
                let _ = write!(self.out, " {} ", op.symbol());
                self.expr(rhs)?;
                self.out.push(')');
            }
            Expr::Case {
                when,
                then,
                otherwise,
            } => {
                self.out.push_str("CASE WHEN ");
                self.predicate(when)?;
                self.out.push_str(" THEN ");
                self.expr(then)?;
                self.out.push_str(" ELSE ");
                self.expr(otherwise)?;
                self.out.push_str(" END");
            }
            Expr::Condition(predicate) => {
                self.out.push('(');
                self.predicate(predicate)?;
                self.out.push(')');
            }
            Expr::Subquery(select) => {
                self.out.push('(');
                self.select(select)?;
                self.out.push(')');
            }
            Expr::Instant(inner) => match self.dialect {
                Dialect::Postgres => self.expr(inner)?,
                Dialect::Sqlite => {
                    self.out.push_str("datetime(");
                    self.expr(inner)?;
                    self.out.push(')');
                }
            },
        }
        Ok(())
    }

    fn list(&mut self, items: &[Expr]) -> Result<()> {
        self.out.push('(');
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                self.out.push_str(", ");
            }
            self.expr(item)?;
        }
        self.out.push(')');
        Ok(())
    }

    fn predicate(&mut self, predicate: &Predicate) -> Result<()> {
        match predicate {
            Predicate::Compare(lhs, op, rhs) => {
                self.expr(lhs)?;
                let _ = write!(self.out, " {} ", op.symbol());
                self.expr(rhs)?;
            }
            Predicate::IsNull(expr) => {
                self.expr(expr)?;
                self.out.push_str(" IS NULL");
            }
            Predicate::IsNotNull(expr) => {
                self.expr(expr)?;
                self.out.push_str(" IS NOT NULL");
            }
            Predicate::Between(expr, low, high) => {
                self.expr(expr)?;
                self.out.push_str(" BETWEEN ");
                self.expr(low)?;
                self.out.push_str(" AND ");
                self.expr(high)?;
            }
            // An empty list can never match; spell that out instead of
            // emitting `IN ()`, which neither store accepts.
            Predicate::InList(_, items) if items.is_empty() => {
                self.out.push_str("1 = 0")
            }
            Predicate::NotInList(_, items) if items.is_empty() => {
                self.out.push_str("1 = 1")
            }
            Predicate::InList(expr, items) => {
                self.expr(expr)?;
                self.out.push_str(" IN ");
                self.list(items)?;
            }
            Predicate::NotInList(expr, items) => {
                self.expr(expr)?;
                self.out.push_str(" NOT IN ");
                self.list(items)?;
            }
            Predicate::Like(expr, pattern) => {
                self.expr(expr)?;
                self.out.push_str(" LIKE ");
                self.expr(pattern)?;
                self.out.push_str(" ESCAPE '\\'");
            }
            Predicate::Exists(select) => {
                self.out.push_str("EXISTS (");
                self.select(select)?;
                self.out.push(')');
            }
            Predicate::NotExists(select) => {
                self.out.push_str("NOT EXISTS (");
                self.select(select)?;
                self.out.push(')');
            }
            Predicate::And(items) if items.is_empty() => {
                self.out.push_str("1 = 1")
            }
            Predicate::Or(items) if items.is_empty() => {
                self.out.push_str("1 = 0")
            }
            Predicate::And(items) | Predicate::Or(items) => {
                let joiner = if matches!(predicate, Predicate::And(_)) {
                    " AND "
                } else {
                    " OR "
                };
                self.out.push('(');
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        self.out.push_str(joiner);
                    }
                    self.predicate(item)?;
                }
                self.out.push(')');
            }
            Predicate::Not(inner) => {
                self.out.push_str("NOT (");
                self.predicate(inner)?;
                self.out.push(')');
            }
        }
        Ok(())
    }
}
