use crate::{RowWrap, ValueWrap};
use async_stream::try_stream;
use keel_core::{
    Config, Context, Error, Executor, Query, QueryResult, Result, RowsAffected,
    stream::{Stream, StreamExt, TryStreamExt},
    truncate_long,
};
use mysql_async::{
    Opts, OptsBuilder, Params, Pool, PoolConstraints, PoolOpts, prelude::Queryable,
};
use std::{sync::Arc, time::Duration};
use url::Url;

/// Pooled MySQL executor.
///
/// Connections are checked out per statement, idle ones are closed instead
/// of being kept around.
#[derive(Debug, Clone)]
pub struct MySQLConnection {
    pub(crate) pool: Pool,
}

impl MySQLConnection {
    pub const PREFIX: &'static str = "mysql://";

    /// Opens the pool and checks the server answers.
    pub async fn connect(url: &str, config: &Config) -> Result<MySQLConnection> {
        let context = || format!("While trying to connect to `{}`", truncate_long!(url));
        if !url.starts_with(Self::PREFIX) {
            let error = Error::msg(format!(
                "MySQL connection url must start with `{}`",
                Self::PREFIX
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let url = Url::parse(url).with_context(context)?;
        let opts = Opts::from_url(url.as_str()).with_context(context)?;
        let constraints = PoolConstraints::new(0, config.max_connections.max(1))
            .ok_or_else(|| Error::msg("Invalid connection pool bounds"))
            .with_context(context)?;
        let pool_opts = PoolOpts::default()
            .with_constraints(constraints)
            .with_inactive_connection_ttl(Duration::ZERO);
        let pool = Pool::new(OptsBuilder::from_opts(opts).pool_opts(pool_opts));
        let connection = MySQLConnection { pool };
        if let Err(e) = connection.ping().await {
            let error = e.context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(connection)
    }

    pub async fn ping(&self) -> Result<()> {
        let mut connection = self.pool.get_conn().await?;
        let result: Option<i64> = connection.query_first("SELECT 1 = 1").await?;
        match result {
            Some(1) => Ok(()),
            v => Err(Error::msg(format!("Unexpected ping result: {v:?}"))),
        }
    }

    /// Waits for checked out connections and closes the pool.
    pub async fn disconnect(self) -> Result<()> {
        self.pool.disconnect().await?;
        Ok(())
    }
}

impl Executor for MySQLConnection {
    fn run<'s>(&'s self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        let context = Arc::new(format!("While running the query:\n{}", query));
        try_stream! {
            let mut connection = self.pool.get_conn().await?;
            let Query { sql, params } = query;
            let mut rows = 0;
            if params.is_empty() {
                let mut result = connection.query_iter(sql).await?;
                while let Some(mut stream) = result.stream::<RowWrap>().await? {
                    while let Some(row) = stream.next().await.transpose()? {
                        rows += 1;
                        yield QueryResult::Row(row.0)
                    }
                }
                if rows == 0 {
                    yield QueryResult::Affected(RowsAffected {
                        rows_affected: result.affected_rows(),
                        last_affected_id: result.last_insert_id().map(|v| v as _),
                    });
                }
            } else {
                let params = Params::Positional(
                    params
                        .into_iter()
                        .map(|v| ValueWrap(v).try_into())
                        .collect::<Result<_>>()?,
                );
                let mut result = connection.exec_iter(sql, params).await?;
                while let Some(mut stream) = result.stream::<RowWrap>().await? {
                    while let Some(row) = stream.next().await.transpose()? {
                        rows += 1;
                        yield QueryResult::Row(row.0)
                    }
                }
                if rows == 0 {
                    yield QueryResult::Affected(RowsAffected {
                        rows_affected: result.affected_rows(),
                        last_affected_id: result.last_insert_id().map(|v| v as _),
                    });
                }
            }
        }
        .map_err(move |e: Error| {
            let e = e.context(context.clone());
            log::error!("{:#}", e);
            e
        })
    }
}
