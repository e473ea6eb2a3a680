use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use super::ast::Expr;

/// A typed value bound to a query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SqlValue {
    Int(i64),
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(i64::from(value))
    }
}

impl From<u32> for SqlValue {
    fn from(value: u32) -> Self {
        SqlValue::Int(i64::from(value))
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(value)
    }
}

/// Name-keyed bound parameters of one fragment or one composed query.
///
/// Names are unique within a set. Binding a name that already holds the same
/// value reuses it, so a conceptual parameter shared by several predicates is
/// bound once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSet {
    entries: Vec<(String, SqlValue)>,
}

/// Result of merging a fragment's parameters into an accumulated set.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamMerge {
    pub params: ParamSet,
    /// Incoming names that had to be namespaced, `old -> new`. Apply them to
    /// the incoming fragment with [`Select::rename_params`].
    ///
    /// [`Select::rename_params`]: super::ast::Select::rename_params
    pub renames: HashMap<String, String>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Binds `value` under `name` and returns the parameter expression.
    ///
    /// A name already bound to a different value gets a numeric suffix
    /// (`genre_1`, `genre_2`, ...), so callers can bind list elements under
    /// one logical name.
    pub fn bind(&mut self, name: &str, value: impl Into<SqlValue>) -> Expr {
        let value = value.into();
        if let Some(existing) = self.get(name) {
            if *existing == value {
                return Expr::Param(name.to_string());
            }
        } else {
            self.entries.push((name.to_string(), value));
            return Expr::Param(name.to_string());
        }

        let mut suffix = 1usize;
        loop {
            let candidate = format!("{name}_{suffix}");
            match self.get(&candidate) {
                Some(existing) if *existing == value => {
                    return Expr::Param(candidate);
                }
                Some(_) => suffix += 1,
                None => {
                    self.entries.push((candidate.clone(), value));
                    return Expr::Param(candidate);
                }
            }
        }
    }

    /// Merges `incoming` into a copy of `self`.
    ///
    /// Identical name/value pairs are shared. A name bound to a different
    /// value on each side is namespaced as `{namespace}_{name}` (plus a
    /// numeric suffix if that is taken too); the returned renames must be
    /// applied to the fragment that owns `incoming`.
    pub fn merge(&self, incoming: &ParamSet, namespace: &str) -> ParamMerge {
        let mut params = self.clone();
        let mut renames = HashMap::new();
        let incoming_names: HashSet<&str> =
            incoming.entries.iter().map(|(name, _)| name.as_str()).collect();

        for (name, value) in &incoming.entries {
            let existing = params.get(name).cloned();
            match existing {
                Some(existing) if existing == *value => {}
                None if !renames.values().any(|taken| taken == name) => {
                    params.entries.push((name.clone(), value.clone()));
                }
                _ => {
                    let renamed =
                        params.fresh_name(namespace, name, &incoming_names);
                    params.entries.push((renamed.clone(), value.clone()));
                    renames.insert(name.clone(), renamed);
                }
            }
        }

        ParamMerge { params, renames }
    }

    fn fresh_name(
        &self,
        namespace: &str,
        name: &str,
        reserved: &HashSet<&str>,
    ) -> String {
        let base = format!("{namespace}_{name}");
        let is_free = |candidate: &str| {
            !self.contains(candidate) && !reserved.contains(candidate)
        };
        if is_free(base.as_str()) {
            return base;
        }
        (1usize..)
            .map(|suffix| format!("{base}_{suffix}"))
            .find(|candidate| is_free(candidate.as_str()))
            .unwrap_or(base)
    }
}
