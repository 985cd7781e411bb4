//! Scenarios every Keel driver is expected to pass against a live database.
mod concurrency;
mod exists;
mod multiple;
mod queries;
mod simple;
mod truncate;

use concurrency::concurrency;
use exists::exists;
use keel::{Database, Executor};
use log::LevelFilter;
use multiple::multiple;
use queries::queries;
use simple::simple;
use std::env;
use truncate::truncate;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

pub async fn execute_tests<E: Executor>(database: &Database<E>) {
    simple(database).await;
    concurrency(database).await;
    multiple(database).await;
    queries(database).await;
    exists(database).await;
    truncate(database).await;
}
