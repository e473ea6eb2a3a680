use std::collections::HashMap;

use marquee_model::SortOrder;

/// Column types used when a fragment projects a typed NULL placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    BigInt,
    Integer,
    Text,
    Boolean,
    Date,
    Timestamp,
}

impl SqlType {
    pub const fn name(&self) -> &'static str {
        match self {
            SqlType::BigInt => "BIGINT",
            SqlType::Integer => "INTEGER",
            SqlType::Text => "TEXT",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Date => "DATE",
            SqlType::Timestamp => "TIMESTAMPTZ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub qualifier: &'static str,
    pub name: &'static str,
}

/// Shorthand for a qualified column expression.
pub const fn col(qualifier: &'static str, name: &'static str) -> Expr {
    Expr::Column(ColumnRef { qualifier, name })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CmpOp {
    pub const fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::NotEq => "<>",
            CmpOp::Lt => "<",
            CmpOp::LtEq => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtEq => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub const fn symbol(&self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(ColumnRef),
    /// Named bound parameter, resolved to a positional placeholder at render.
    Param(String),
    Null(SqlType),
    Int(i64),
    /// Decimal literal kept as text so rendering is exact (`10.0`).
    Decimal(&'static str),
    Text(&'static str),
    Bool(bool),
    Func(&'static str, Vec<Expr>),
    CountAll,
    Binary(Box<Expr>, ArithOp, Box<Expr>),
    Case {
        when: Box<Predicate>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// A predicate used as a boolean value.
    Condition(Box<Predicate>),
    Subquery(Box<Select>),
    /// A timestamp in the store's canonical comparable form. SQLite keeps
    /// timestamps as text in more than one layout and compares them through
    /// `datetime()`; Postgres compares the value as is.
    Instant(Box<Expr>),
}

impl Expr {
    pub fn func(name: &'static str, args: Vec<Expr>) -> Expr {
        Expr::Func(name, args)
    }

    pub fn lower(self) -> Expr {
        Expr::Func("LOWER", vec![self])
    }

    pub fn arith(self, op: ArithOp, rhs: Expr) -> Expr {
        Expr::Binary(Box::new(self), op, Box::new(rhs))
    }

    pub fn subquery(select: Select) -> Expr {
        Expr::Subquery(Box::new(select))
    }

    pub fn instant(self) -> Expr {
        Expr::Instant(Box::new(self))
    }

    pub fn cmp(self, op: CmpOp, rhs: Expr) -> Predicate {
        Predicate::Compare(self, op, rhs)
    }

    pub fn eq(self, rhs: Expr) -> Predicate {
        self.cmp(CmpOp::Eq, rhs)
    }

    pub fn not_eq(self, rhs: Expr) -> Predicate {
        self.cmp(CmpOp::NotEq, rhs)
    }

    pub fn is_null(self) -> Predicate {
        Predicate::IsNull(self)
    }

    pub fn is_not_null(self) -> Predicate {
        Predicate::IsNotNull(self)
    }

    pub fn between(self, low: Expr, high: Expr) -> Predicate {
        Predicate::Between(self, low, high)
    }

    pub fn in_list(self, items: Vec<Expr>) -> Predicate {
        Predicate::InList(self, items)
    }

    pub fn not_in_list(self, items: Vec<Expr>) -> Predicate {
        Predicate::NotInList(self, items)
    }

    pub fn like(self, pattern: Expr) -> Predicate {
        Predicate::Like(self, pattern)
    }

    /// `LOWER(self) = LOWER(rhs)`. Both sides fold through the store's own
    /// `LOWER` so they agree on which characters fold.
    pub fn eq_ignore_case(self, rhs: Expr) -> Predicate {
        self.lower().eq(rhs.lower())
    }

    /// `LOWER(self) LIKE LOWER(pattern)`.
    pub fn like_ignore_case(self, pattern: Expr) -> Predicate {
        self.lower().like(pattern.lower())
    }

    fn visit_params(&mut self, f: &mut dyn FnMut(&mut String)) {
        match self {
            Expr::Param(name) => f(name),
            Expr::Func(_, args) => {
                for arg in args {
                    arg.visit_params(f);
                }
            }
            Expr::Binary(lhs, _, rhs) => {
                lhs.visit_params(f);
                rhs.visit_params(f);
            }
            Expr::Case {
                when,
                then,
                otherwise,
            } => {
                when.visit_params(f);
                then.visit_params(f);
                otherwise.visit_params(f);
            }
            Expr::Condition(predicate) => predicate.visit_params(f),
            Expr::Subquery(select) => select.visit_params(f),
            Expr::Instant(inner) => inner.visit_params(f),
            Expr::Column(_)
            | Expr::Null(_)
            | Expr::Int(_)
            | Expr::Decimal(_)
            | Expr::Text(_)
            | Expr::Bool(_)
            | Expr::CountAll => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare(Expr, CmpOp, Expr),
    IsNull(Expr),
    IsNotNull(Expr),
    Between(Expr, Expr, Expr),
    InList(Expr, Vec<Expr>),
    NotInList(Expr, Vec<Expr>),
    /// Case-sensitive `LIKE` with `\` as the escape character.
    Like(Expr, Expr),
    Exists(Box<Select>),
    NotExists(Box<Select>),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn exists(select: Select) -> Predicate {
        Predicate::Exists(Box::new(select))
    }

    pub fn not_exists(select: Select) -> Predicate {
        Predicate::NotExists(Box::new(select))
    }

    pub fn and(self, other: Predicate) -> Predicate {
        match self {
            Predicate::And(mut items) => {
                items.push(other);
                Predicate::And(items)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Predicate) -> Predicate {
        match self {
            Predicate::Or(mut items) => {
                items.push(other);
                Predicate::Or(items)
            }
            first => Predicate::Or(vec![first, other]),
        }
    }

    pub fn negate(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }

    pub fn into_expr(self) -> Expr {
        Expr::Condition(Box::new(self))
    }

    fn visit_params(&mut self, f: &mut dyn FnMut(&mut String)) {
        match self {
            Predicate::Compare(lhs, _, rhs) | Predicate::Like(lhs, rhs) => {
                lhs.visit_params(f);
                rhs.visit_params(f);
            }
            Predicate::IsNull(expr) | Predicate::IsNotNull(expr) => {
                expr.visit_params(f)
            }
            Predicate::Between(expr, low, high) => {
                expr.visit_params(f);
                low.visit_params(f);
                high.visit_params(f);
            }
            Predicate::InList(expr, items)
            | Predicate::NotInList(expr, items) => {
                expr.visit_params(f);
                for item in items {
                    item.visit_params(f);
                }
            }
            Predicate::Exists(select) | Predicate::NotExists(select) => {
                select.visit_params(f)
            }
            Predicate::And(items) | Predicate::Or(items) => {
                for item in items {
                    item.visit_params(f);
                }
            }
            Predicate::Not(inner) => inner.visit_params(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef {
    pub table: &'static str,
    pub alias: &'static str,
}

impl TableRef {
    pub const fn new(table: &'static str, alias: &'static str) -> Self {
        Self { table, alias }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: TableRef,
    pub on: Predicate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub expr: Expr,
    pub alias: Option<&'static str>,
}

/// One `SELECT` block: a union branch, a correlated subquery or a scalar
/// subquery.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub distinct: bool,
    pub projection: Vec<Projection>,
    pub from: TableRef,
    pub joins: Vec<Join>,
    pub filter: Vec<Predicate>,
    pub group_by: Vec<Expr>,
    pub having: Vec<Predicate>,
}

impl Select {
    pub fn from(table: &'static str, alias: &'static str) -> Self {
        Self {
            distinct: false,
            projection: Vec::new(),
            from: TableRef::new(table, alias),
            joins: Vec::new(),
            filter: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
        }
    }

    pub fn column(mut self, expr: Expr, alias: &'static str) -> Self {
        self.projection.push(Projection {
            expr,
            alias: Some(alias),
        });
        self
    }

    /// `SELECT 1`, the body of an existence check.
    pub fn select_one(mut self) -> Self {
        self.projection.push(Projection {
            expr: Expr::Int(1),
            alias: None,
        });
        self
    }

    pub fn value(mut self, expr: Expr) -> Self {
        self.projection.push(Projection { expr, alias: None });
        self
    }

    pub fn join(
        mut self,
        table: &'static str,
        alias: &'static str,
        on: Predicate,
    ) -> Self {
        self.joins.push(Join {
            kind: JoinKind::Inner,
            table: TableRef::new(table, alias),
            on,
        });
        self
    }

    pub fn left_join(
        mut self,
        table: &'static str,
        alias: &'static str,
        on: Predicate,
    ) -> Self {
        self.joins.push(Join {
            kind: JoinKind::Left,
            table: TableRef::new(table, alias),
            on,
        });
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter.push(predicate);
        self
    }

    pub fn group_by(mut self, expr: Expr) -> Self {
        self.group_by.push(expr);
        self
    }

    pub fn having(mut self, predicate: Predicate) -> Self {
        self.having.push(predicate);
        self
    }

    /// Names of every parameter referenced anywhere in this tree, in visit
    /// order (duplicates included).
    pub fn param_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.clone().visit_params(&mut |name| names.push(name.clone()));
        names
    }

    /// Rewrites parameter references in one pass, so chained renames
    /// (`a -> b`, `b -> c`) never cascade.
    pub fn rename_params(&mut self, renames: &HashMap<String, String>) {
        if renames.is_empty() {
            return;
        }
        self.visit_params(&mut |name| {
            if let Some(renamed) = renames.get(name.as_str()) {
                *name = renamed.clone();
            }
        });
    }

    fn visit_params(&mut self, f: &mut dyn FnMut(&mut String)) {
        for projection in &mut self.projection {
            projection.expr.visit_params(f);
        }
        for join in &mut self.joins {
            join.on.visit_params(f);
        }
        for predicate in self.filter.iter_mut().chain(self.having.iter_mut()) {
            predicate.visit_params(f);
        }
        for expr in &mut self.group_by {
            expr.visit_params(f);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
    pub expr: Expr,
    pub order: SortOrder,
    pub nulls_last: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionProjection {
    /// `SELECT *` over the union.
    All,
    /// `SELECT COUNT(*)` over the union.
    Count,
}

/// Set union of branches wrapped in a derived table aliased `u`, so ordering
/// and paging can use arbitrary expressions over the output columns.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionQuery {
    pub branches: Vec<Select>,
    pub projection: UnionProjection,
    pub order_by: Vec<OrderTerm>,
    pub limit: Option<Expr>,
    pub offset: Option<Expr>,
}

impl UnionQuery {
    pub const ALIAS: &'static str = "u";

    pub fn new(branches: Vec<Select>) -> Self {
        Self {
            branches,
            projection: UnionProjection::All,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Reference to an output column of the union.
    pub const fn output(name: &'static str) -> Expr {
        col(Self::ALIAS, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_params_reaches_nested_subqueries() {
        let inner = Select::from("genre", "g")
            .select_one()
            .filter(col("g", "name").eq(Expr::Param("genre".into())));
        let mut outer = Select::from("videodata", "vd")
            .column(col("vd", "id"), "id")
            .filter(Predicate::exists(inner))
            .filter(col("vd", "year").eq(Expr::Param("year".into())));

        let renames = HashMap::from([
            ("genre".to_string(), "movie_genre".to_string()),
            ("year".to_string(), "genre".to_string()),
        ]);
        outer.rename_params(&renames);

        assert_eq!(outer.param_names(), vec!["movie_genre", "genre"]);
    }

    #[test]
    fn and_flattens_chained_conjunctions() {
        let predicate = col("a", "x")
            .is_null()
            .and(col("a", "y").is_null())
            .and(col("a", "z").is_null());
        match predicate {
            Predicate::And(items) => assert_eq!(items.len(), 3),
            other => panic!("expected conjunction, got {other:?}"),
        }
    }
}
