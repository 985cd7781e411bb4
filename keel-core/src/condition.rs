use crate::{AsValue, Value};
use std::fmt::Debug;

/// Predicate fragment merged into a `WHERE` clause (conditions are joined with `AND`).
pub trait Condition: Debug + Send + Sync {
    /// Fragment with `?` placeholders.
    fn sql(&self) -> String;

    /// Parameters filling the placeholders of [`Condition::sql`], in order.
    fn values(&self) -> Vec<Value>;
}

/// Fragment built from a column or an expression plus one value.
///
/// - A bare column (no space) compares for equality: `name` becomes `name = ?`.
/// - A fragment containing ` IN` expands the value into one placeholder per
///   element: `id IN` with three ids becomes `id IN (?, ?, ?)`. An empty list
///   becomes `id IN (NULL)`, which matches no row.
/// - A fragment without placeholder gets one appended: `age >` becomes `age > ?`.
/// - Anything else is used as is.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleCondition {
    pub sql: String,
    pub value: Value,
}

impl SimpleCondition {
    pub fn new(sql: impl Into<String>, value: impl AsValue) -> Self {
        Self {
            sql: sql.into(),
            value: value.as_value(),
        }
    }

    fn is_in(&self) -> bool {
        self.sql.contains(" IN")
    }
}

impl Condition for SimpleCondition {
    fn sql(&self) -> String {
        if !self.sql.contains(' ') {
            return format!("{} = ?", self.sql);
        }
        if self.is_in() {
            let len = self.value.elements_len();
            if len == 0 {
                return format!("{} (NULL)", self.sql);
            }
            let mut placeholders = String::with_capacity(len * 3);
            for i in 0..len {
                if i > 0 {
                    placeholders.push_str(", ");
                }
                placeholders.push('?');
            }
            return format!("{} ({})", self.sql, placeholders);
        }
        if !self.sql.contains('?') {
            return format!("{} ?", self.sql);
        }
        self.sql.clone()
    }

    fn values(&self) -> Vec<Value> {
        if self.sql.contains(' ') && self.is_in() {
            return self.value.clone().into_elements();
        }
        vec![self.value.clone()]
    }
}

/// Equality between a value stored inside a JSON column and a parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonCondition {
    pub column: String,
    pub path: String,
    pub value: Value,
}

/// Checks that the JSON document in `column` holds `value` at `path`,
/// e.g. `compare_json("data", "$.kind", "admin")`.
pub fn compare_json(
    column: impl Into<String>,
    path: impl Into<String>,
    value: impl AsValue,
) -> JsonCondition {
    JsonCondition {
        column: column.into(),
        path: path.into(),
        value: value.as_value(),
    }
}

impl Condition for JsonCondition {
    fn sql(&self) -> String {
        format!(
            "JSON_EXTRACT({}, '{}') = ?",
            self.column,
            self.path.replace('\'', "''")
        )
    }

    fn values(&self) -> Vec<Value> {
        vec![self.value.clone()]
    }
}

/// Raw fragment with explicit values, no rewriting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectCondition {
    pub sql: String,
    pub values: Vec<Value>,
}

impl DirectCondition {
    pub fn new(sql: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            values,
        }
    }
}

impl Condition for DirectCondition {
    fn sql(&self) -> String {
        self.sql.clone()
    }

    fn values(&self) -> Vec<Value> {
        self.values.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_column() {
        let cond = SimpleCondition::new("name", "foo");
        assert_eq!(cond.sql(), "name = ?");
        assert_eq!(cond.values(), vec![Value::Varchar(Some("foo".into()))]);
    }

    #[test]
    fn operator_without_placeholder() {
        let cond = SimpleCondition::new("age >", 18);
        assert_eq!(cond.sql(), "age > ?");
        assert_eq!(cond.values(), vec![Value::Int32(Some(18))]);
    }

    #[test]
    fn passthrough() {
        let cond = SimpleCondition::new("name LIKE ?", "a%");
        assert_eq!(cond.sql(), "name LIKE ?");
        assert_eq!(cond.values().len(), 1);
    }

    #[test]
    fn in_list() {
        let cond = SimpleCondition::new("id IN", vec![1, 2, 3]);
        assert_eq!(cond.sql(), "id IN (?, ?, ?)");
        assert_eq!(
            cond.values(),
            vec![
                Value::Int32(Some(1)),
                Value::Int32(Some(2)),
                Value::Int32(Some(3))
            ]
        );

        let cond = SimpleCondition::new("code NOT IN", ["a"]);
        assert_eq!(cond.sql(), "code NOT IN (?)");
        assert_eq!(cond.values(), vec![Value::Varchar(Some("a".into()))]);
    }

    #[test]
    fn in_empty_list() {
        let cond = SimpleCondition::new("id IN", Vec::<i64>::new());
        assert_eq!(cond.sql(), "id IN (NULL)");
        assert!(cond.values().is_empty());
    }

    #[test]
    fn json() {
        let cond = compare_json("data", "$.owner's", 7);
        assert_eq!(cond.sql(), "JSON_EXTRACT(data, '$.owner''s') = ?");
        assert_eq!(cond.values(), vec![Value::Int32(Some(7))]);
    }

    #[test]
    fn direct() {
        let cond = DirectCondition::new("a = b", vec![]);
        assert_eq!(cond.sql(), "a = b");
        assert!(cond.values().is_empty());
    }
}
