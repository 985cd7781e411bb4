use crate::{
    AsValue, Condition, Context, Cursor, Database, DbError, DirectCondition, Error, Executor,
    Hooks, Model, ModelMeta, MultiError, Property, Result, SimpleCondition, Slot, SqlBuilder, Value,
    quote_identifier,
};
use futures::StreamExt;
use std::{collections::HashMap, pin::pin, sync::Arc};
use uuid::Uuid;

/// Fluent query over the table of one model type.
///
/// Builder methods consume and return the collection, clone it to branch:
/// ```ignore
/// let adults = db.collection::<User>()?.filter("age >=", 18);
/// let first_page = adults.clone().order("-created").limit(20);
/// let total = adults.count().await?;
/// ```
pub struct Collection<'d, E: Executor, M: Model> {
    database: &'d Database<E>,
    meta: &'static ModelMeta,
    hooks: Hooks<M>,
    conditions: Vec<Arc<dyn Condition>>,
    orders: Vec<String>,
    offset: u64,
    limit: u64,
    alias: Option<String>,
}

impl<'d, E: Executor, M: Model> Clone for Collection<'d, E, M> {
    fn clone(&self) -> Self {
        Self {
            database: self.database,
            meta: self.meta,
            hooks: self.hooks,
            conditions: self.conditions.clone(),
            orders: self.orders.clone(),
            offset: self.offset,
            limit: self.limit,
            alias: self.alias.clone(),
        }
    }
}

impl<'d, E: Executor, M: Model> Collection<'d, E, M> {
    pub(crate) fn new(database: &'d Database<E>, meta: &'static ModelMeta) -> Self {
        Self {
            database,
            meta,
            hooks: M::hooks(),
            conditions: Vec::new(),
            orders: Vec::new(),
            offset: 0,
            limit: 0,
            alias: None,
        }
    }

    pub fn meta(&self) -> &'static ModelMeta {
        self.meta
    }

    pub fn conditions(&self) -> &[Arc<dyn Condition>] {
        &self.conditions
    }

    pub fn orders(&self) -> &[String] {
        &self.orders
    }

    /// Adds a condition from a column or fragment and a value, see [`SimpleCondition`].
    pub fn filter(self, sql: impl Into<String>, value: impl AsValue) -> Self {
        self.filter_cond(SimpleCondition::new(sql, value))
    }

    pub fn filter_cond(mut self, condition: impl Condition + 'static) -> Self {
        self.conditions.push(Arc::new(condition));
        self
    }

    /// Sorts by one column, ascending, or descending when prefixed with `-`.
    ///
    /// # Panics
    /// When `column` contains a space: call `order` once per column instead.
    pub fn order(mut self, column: &str) -> Self {
        if column.contains(' ') {
            panic!("Call `order` once per column, received `{column}`");
        }
        let order = match column.strip_prefix('-') {
            Some(column) => format!("{column} DESC"),
            None => format!("{column} ASC"),
        };
        self.orders.push(order);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Maximum number of rows, `0` means no limit.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Renames the table reference, used to correlate self joins.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Keeps the rows for which `sub`, restricted by the `join` fragment, has at least one row.
    ///
    /// The join relates both tables structurally, for example
    /// `"comments.post_id = p.id"` with this collection aliased as `p`.
    /// Placeholders are not allowed in `join`, values belong to `sub` filters.
    ///
    /// # Panics
    /// When `join` is empty.
    pub fn filter_exists<F: Executor, S: Model>(self, sub: &Collection<'_, F, S>, join: &str) -> Self {
        if join.trim().is_empty() {
            panic!("`filter_exists` requires a join condition");
        }
        let sub = sub.clone().filter_cond(DirectCondition::new(join, Vec::new()));
        let query = sub.select_builder().select_sql_cols("NULL");
        self.filter_cond(DirectCondition::new(
            format!("EXISTS({})", query.sql),
            query.params,
        ))
    }

    fn select_builder(&self) -> SqlBuilder<'_> {
        SqlBuilder {
            table: &self.meta.table,
            alias: self.alias.as_deref(),
            conditions: self.conditions.clone(),
            columns: self.meta.properties.iter().map(|v| v.name.as_str()).collect(),
            values: Vec::new(),
            orders: &self.orders,
            offset: self.offset,
            limit: self.limit,
        }
    }

    fn primary_key_conditions(&self, model: &M) -> Result<Vec<Arc<dyn Condition>>> {
        Ok(self
            .meta
            .bind(model)?
            .into_iter()
            .filter(|v| v.is_primary_key())
            .map(|v| {
                Arc::new(SimpleCondition {
                    sql: v.name().to_string(),
                    value: v.value,
                }) as Arc<dyn Condition>
            })
            .collect())
    }

    /// Loads the row matching the primary key of `model`, under the collection filters.
    ///
    /// Fails with [`DbError::NotFound`] when nothing matches, leaving `model` untouched.
    pub async fn get(&self, model: &mut M) -> Result<()> {
        let mut builder = self.select_builder();
        builder.orders = &[];
        builder.offset = 0;
        builder.limit = 0;
        builder.conditions.extend(self.primary_key_conditions(model)?);
        let query = builder.select_sql();
        self.database.trace("Get", &query);
        let row = {
            let mut rows = pin!(self.database.executor().fetch(query));
            rows.next().await
        };
        match row {
            None => Err(DbError::NotFound.into()),
            Some(Err(e)) => {
                Err(e.context(format!("While getting a row from {}", self.meta.table)))
            }
            Some(Ok(row)) => {
                self.meta.scan(model, row.values.into_vec())?;
                model.tracking_mut().after_get();
                Ok(())
            }
        }
    }

    /// Inserts a new instance or updates a stored one.
    ///
    /// Updates match the primary key and the revision the instance last
    /// observed, when another writer advanced it the update affects no row and
    /// [`DbError::ConcurrentTransaction`] is returned.
    pub async fn put(&self, model: &mut M) -> Result<()> {
        self.hooks.run_before_put(model)?;
        let properties = self.meta.bind(model)?;
        let inserted = model.tracking().is_inserted();
        let mut builder = SqlBuilder::new(&self.meta.table);
        let query = if inserted {
            builder.conditions = self.conditions.clone();
            for property in &properties {
                if property.is_primary_key() {
                    builder.conditions.push(Arc::new(SimpleCondition {
                        sql: property.name().to_string(),
                        value: property.value.clone(),
                    }));
                } else if !property.is_omitted() {
                    builder.columns.push(property.name());
                    builder.values.push(property.value.clone());
                }
            }
            builder.conditions.push(Arc::new(SimpleCondition::new(
                quote_identifier("revision"),
                model.tracking().stored_revision(),
            )));
            builder.update_sql()
        } else {
            for property in properties.iter().filter(|v| !v.is_omitted()) {
                builder.columns.push(property.name());
                builder.values.push(property.value.clone());
            }
            builder.insert_sql()
        };
        self.database.trace("Put", &query);
        let result = self
            .database
            .executor()
            .execute(query)
            .await
            .with_context(|| format!("While putting a row into {}", self.meta.table))?;
        if inserted {
            if result.rows_affected == 0 {
                return Err(DbError::ConcurrentTransaction.into());
            }
        } else {
            self.recover_id(model, &properties, result.last_affected_id)?;
        }
        model.tracking_mut().after_put();
        self.hooks.run_after_put(model)?;
        Ok(())
    }

    fn recover_id(
        &self,
        model: &mut M,
        properties: &[Property],
        id: Option<i64>,
    ) -> Result<()> {
        let mut keys = properties.iter().filter(|v| v.is_primary_key());
        let (Some(key), None) = (keys.next(), keys.next()) else {
            return Ok(());
        };
        let (Slot::Field(index), true, Some(id)) = (key.def.slot, key.value.is_integer(), id)
        else {
            return Ok(());
        };
        if id == 0 {
            return Ok(());
        }
        model
            .set_field_value(index, Value::Int64(Some(id)))
            .with_context(|| format!("Could not store the generated id {id} in `{}`", key.field()))
    }

    /// Deletes the row matching the primary key of `model`, under the collection filters.
    ///
    /// MySQL accepts only a row count in `DELETE ... LIMIT`, a collection
    /// with an offset is rejected before reaching the server.
    pub async fn delete(&self, model: &mut M) -> Result<()> {
        if self.offset > 0 {
            return Err(Error::msg(format!(
                "Cannot delete from {} with offset {}, MySQL does not support offsets in DELETE",
                self.meta.table, self.offset
            )));
        }
        let mut builder = SqlBuilder::new(&self.meta.table);
        builder.conditions = self.conditions.clone();
        builder.conditions.extend(self.primary_key_conditions(model)?);
        builder.limit = 1;
        let query = builder.delete_sql();
        self.database.trace("Delete", &query);
        let result = self
            .database
            .executor()
            .execute(query)
            .await
            .with_context(|| format!("While deleting a row from {}", self.meta.table))?;
        if result.rows_affected == 0 {
            log::info!("keel [Delete]: no row of {} matched", self.meta.table);
        }
        model.tracking_mut().after_delete();
        Ok(())
    }

    /// Streams the rows of the current view.
    pub fn iterator(&self) -> Cursor<'d, M> {
        let query = self.select_builder().select_sql();
        self.database.trace("Iterator", &query);
        let database: &'d Database<E> = self.database;
        Cursor::new(database.executor().fetch(query), self.meta)
    }

    /// Replaces the content of `models` with every row of the current view.
    pub async fn get_all(&self, models: &mut Vec<M>) -> Result<()>
    where
        M: Default,
    {
        let mut cursor = self.iterator();
        let mut result = Vec::new();
        loop {
            let mut model = M::default();
            match cursor.next(&mut model).await {
                Ok(true) => result.push(model),
                Ok(false) => break,
                Err(e) => {
                    cursor.close();
                    return Err(e);
                }
            }
        }
        cursor.close();
        *models = result;
        Ok(())
    }

    /// Loads the first row of the current view into `model`.
    pub async fn first(&self, model: &mut M) -> Result<()> {
        let mut cursor = self.clone().limit(1).iterator();
        let found = cursor.next(model).await?;
        cursor.close();
        if found {
            Ok(())
        } else {
            Err(DbError::NotFound.into())
        }
    }

    /// Number of rows matching the filters, ignoring order and pagination.
    pub async fn count(&self) -> Result<i64> {
        let mut builder = self.select_builder();
        builder.orders = &[];
        builder.offset = 0;
        builder.limit = 0;
        let query = builder.select_sql_cols("COUNT(*)");
        self.database.trace("Count", &query);
        let row = {
            let mut rows = pin!(self.database.executor().fetch(query));
            rows.next().await
        };
        let row = row
            .ok_or_else(|| Error::msg("COUNT(*) returned no row"))?
            .with_context(|| format!("While counting the rows of {}", self.meta.table))?;
        let value = row
            .values
            .into_vec()
            .into_iter()
            .next()
            .ok_or_else(|| Error::msg("COUNT(*) returned no column"))?;
        i64::try_from_value(value)
    }

    /// Loads one instance per key with a single `IN` query.
    ///
    /// `models` is replaced by one entry per key, in the order of `keys`.
    /// Missing keys leave `M::default()` in their position and make the call
    /// fail with a [`MultiError`] holding [`DbError::NotFound`] at the same
    /// index. Empty `keys` succeed with an empty `models`.
    ///
    /// # Panics
    /// When the model does not have exactly one primary key.
    pub async fn get_multi<K: AsValue>(
        &self,
        keys: impl IntoIterator<Item = K>,
        models: &mut Vec<M>,
    ) -> Result<()>
    where
        M: Default + Clone,
    {
        let mut primary_keys = self.meta.primary_keys();
        let (Some(key_def), None) = (primary_keys.next(), primary_keys.next()) else {
            panic!(
                "`get_multi` requires exactly one primary key on {}",
                self.meta.table
            );
        };
        let keys: Vec<Value> = keys.into_iter().map(AsValue::as_value).collect();
        models.clear();
        if keys.is_empty() {
            return Ok(());
        }
        let Slot::Field(key_index) = key_def.slot else {
            panic!("`get_multi` requires a column primary key");
        };
        let condition = SimpleCondition {
            sql: format!("{} IN", key_def.name),
            value: Value::List(Some(keys.clone())),
        };
        let mut cursor = self.clone().filter_cond(condition).iterator();
        let mut found = HashMap::<Key, M>::new();
        loop {
            let mut model = M::default();
            if !cursor.next(&mut model).await? {
                break;
            }
            let key = Key::from(&model.field_value(key_index)?);
            found.insert(key, model);
        }
        cursor.close();
        let mut errors = Vec::with_capacity(keys.len());
        models.reserve(keys.len());
        for key in &keys {
            match found.get(&Key::from(key)) {
                Some(model) => {
                    models.push(model.clone());
                    errors.push(None);
                }
                None => {
                    models.push(M::default());
                    errors.push(Some(Error::new(DbError::NotFound)));
                }
            }
        }
        let errors = MultiError::new(errors);
        if errors.has_error() {
            return Err(errors.into());
        }
        Ok(())
    }

    /// Removes every row and resets the auto increment counter.
    pub async fn truncate(&self) -> Result<()> {
        let builder = SqlBuilder::new(&self.meta.table);
        for query in [builder.truncate_sql(), builder.reset_auto_increment_sql()] {
            self.database.trace("Truncate", &query);
            self.database
                .executor()
                .execute(query)
                .await
                .with_context(|| format!("While truncating {}", self.meta.table))?;
        }
        Ok(())
    }
}

/// Primary key value normalized so that keys of different integer widths match.
///
/// Text holding a UUID becomes [`Key::Uuid`], so textual keys match `Uuid` fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    Integer(i128),
    Text(String),
    Uuid(Uuid),
    Other(String),
}

impl Key {
    fn text(value: &str) -> Self {
        match Uuid::try_parse(value) {
            Ok(v) => Key::Uuid(v),
            Err(..) => Key::Text(value.to_string()),
        }
    }
}

impl From<&Value> for Key {
    fn from(value: &Value) -> Self {
        if let Some(v) = value.as_i128() {
            return Key::Integer(v);
        }
        match value {
            Value::Varchar(Some(v)) => Key::text(v),
            Value::Blob(Some(v)) => match std::str::from_utf8(v) {
                Ok(v) => Key::text(v),
                Err(..) => Key::Other(value.to_string()),
            },
            Value::Uuid(Some(v)) => Key::Uuid(*v),
            _ => Key::Other(value.to_string()),
        }
    }
}
