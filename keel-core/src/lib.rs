mod as_value;
mod collection;
mod column;
mod condition;
mod config;
mod cursor;
mod database;
mod error;
mod executor;
mod introspect;
mod model;
mod query;
mod sql_builder;
mod tracking;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use collection::*;
pub use column::*;
pub use condition::*;
pub use config::*;
pub use cursor::*;
pub use database::*;
pub use error::*;
pub use executor::*;
pub use introspect::*;
pub use model::*;
pub use query::*;
pub use sql_builder::*;
pub use tracking::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
