use crate::{Collection, Config, Executor, Model, Query, Result, RowsAffected, Value, introspect};

/// Entry point binding an [`Executor`] to its [`Config`].
///
/// Collections borrow the handle, so every collection of one database
/// shares the same executor (and connection pool).
#[derive(Debug)]
pub struct Database<E: Executor> {
    executor: E,
    config: Config,
}

impl<E: Executor> Database<E> {
    pub fn new(executor: E, config: Config) -> Self {
        Self { executor, config }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    /// New unfiltered collection over the table of `M`.
    pub fn collection<M: Model>(&self) -> Result<Collection<'_, E, M>> {
        Ok(Collection::new(self, introspect::<M>()?))
    }

    /// Runs a raw statement, for example a schema change.
    pub async fn execute(&self, sql: impl Into<String>, params: Vec<Value>) -> Result<RowsAffected> {
        let query = Query::new(sql, params);
        self.trace("Execute", &query);
        self.executor.execute(query).await
    }

    pub(crate) fn trace(&self, operation: &str, query: &Query) {
        if self.config.trace {
            log::debug!("keel [{operation}]: {query}");
        }
    }
}
