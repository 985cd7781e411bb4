//! MySQL backend for Keel, built on the `mysql_async` connection pool.
mod connection;
mod row_wrap;
mod value_wrap;

pub use connection::*;
pub(crate) use row_wrap::*;
pub(crate) use value_wrap::*;
