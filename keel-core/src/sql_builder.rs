use crate::{Condition, Query, Value, separated_by};
use std::{fmt::Write, sync::Arc};

/// Compiles statement text and parameters from a collection state.
///
/// Identifiers are expected already quoted: `table` and `columns` come from
/// [`ModelMeta`](crate::ModelMeta). Conditions and orders are written as
/// given. `values` pairs with `columns` in inserts and updates.
#[derive(Default, Debug, Clone)]
pub struct SqlBuilder<'a> {
    pub table: &'a str,
    pub alias: Option<&'a str>,
    pub conditions: Vec<Arc<dyn Condition>>,
    pub columns: Vec<&'a str>,
    pub values: Vec<Value>,
    pub orders: &'a [String],
    pub offset: u64,
    pub limit: u64,
}

impl<'a> SqlBuilder<'a> {
    pub fn new(table: &'a str) -> Self {
        Self {
            table,
            ..Default::default()
        }
    }

    pub fn select_sql(&self) -> Query {
        let mut cols = String::with_capacity(self.columns.len() * 12);
        separated_by(
            &mut cols,
            &self.columns,
            |out, v| out.push_str(v),
            ", ",
        );
        self.select_sql_cols(&cols)
    }

    pub fn select_sql_cols(&self, cols: &str) -> Query {
        let mut sql = String::with_capacity(128);
        sql.push_str("SELECT ");
        sql.push_str(cols);
        sql.push_str(" FROM ");
        sql.push_str(self.table);
        if let Some(alias) = self.alias {
            sql.push_str(" AS ");
            sql.push_str(alias);
        }
        let params = self.write_where(&mut sql);
        if !self.orders.is_empty() {
            sql.push_str(" ORDER BY ");
            separated_by(&mut sql, self.orders, |out, v| out.push_str(v), ", ");
        }
        if self.limit > 0 {
            let _ = write!(sql, " LIMIT {},{}", self.offset, self.limit);
        }
        Query::new(sql, params)
    }

    pub fn insert_sql(&self) -> Query {
        let mut sql = String::with_capacity(64 + self.columns.len() * 16);
        sql.push_str("INSERT INTO ");
        sql.push_str(self.table);
        sql.push('(');
        separated_by(&mut sql, &self.columns, |out, v| out.push_str(v), ", ");
        sql.push_str(") VALUES(");
        separated_by(&mut sql, &self.columns, |out, _| out.push('?'), ", ");
        sql.push(')');
        Query::new(sql, self.values.clone())
    }

    /// `UPDATE` of `columns` under every condition, the caller supplies the key and revision ones.
    pub fn update_sql(&self) -> Query {
        let mut sql = String::with_capacity(64 + self.columns.len() * 16);
        sql.push_str("UPDATE ");
        sql.push_str(self.table);
        sql.push_str(" SET ");
        separated_by(
            &mut sql,
            &self.columns,
            |out, v| {
                out.push_str(v);
                out.push_str(" = ?");
            },
            ", ",
        );
        let mut params = self.values.clone();
        params.extend(self.write_where(&mut sql));
        Query::new(sql, params)
    }

    pub fn delete_sql(&self) -> Query {
        let mut sql = String::with_capacity(64);
        sql.push_str("DELETE FROM ");
        sql.push_str(self.table);
        let params = self.write_where(&mut sql);
        if self.limit > 0 {
            sql.push_str(" LIMIT ");
            if self.offset > 0 {
                sql.push_str(itoa::Buffer::new().format(self.offset));
                sql.push(',');
            }
            sql.push_str(itoa::Buffer::new().format(self.limit));
        }
        Query::new(sql, params)
    }

    pub fn truncate_sql(&self) -> Query {
        Query::new(format!("TRUNCATE TABLE {}", self.table), Vec::new())
    }

    pub fn reset_auto_increment_sql(&self) -> Query {
        Query::new(
            format!("ALTER TABLE {} AUTO_INCREMENT = 1", self.table),
            Vec::new(),
        )
    }

    fn write_where(&self, sql: &mut String) -> Vec<Value> {
        let mut params = Vec::new();
        if self.conditions.is_empty() {
            return params;
        }
        sql.push_str(" WHERE ");
        separated_by(
            sql,
            &self.conditions,
            |out, cond| {
                out.push_str(&cond.sql());
                params.extend(cond.values());
            },
            " AND ",
        );
        params
    }
}
