use crate::{
    Query, QueryResult, Result, RowLabeled, RowsAffected,
    stream::{Stream, StreamExt, TryStreamExt},
};
use std::future::Future;

/// Backend contract: run a parameterized statement, report affected rows or stream rows back.
///
/// The executor is shared by every collection of a database handle, so it is
/// taken by reference. Drivers own pooling and connection checkout.
pub trait Executor: Send + Sync {
    /// General method to send any query and return any result type (either row or count).
    fn run<'s>(&'s self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send + 's;

    /// Execute the query and returns the rows.
    fn fetch<'s>(&'s self, query: Query) -> impl Stream<Item = Result<RowLabeled>> + Send + 's {
        self.run(query).filter_map(|v| async move {
            match v {
                Ok(QueryResult::Row(v)) => Some(Ok(v)),
                Err(e) => Some(Err(e)),
                _ => None,
            }
        })
    }

    /// Execute the query and return the total number of rows affected.
    fn execute(&self, query: Query) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.run(query)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Affected(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .try_collect()
    }
}
