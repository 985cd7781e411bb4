use keel::{
    Error, Executor, Query, QueryResult, Result, RowLabeled, RowNames, RowsAffected, Value,
    stream::{self, Stream},
};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

/// Scripted reply to the next statement.
pub enum Response {
    Affected(RowsAffected),
    Rows(RowNames, Vec<Vec<Value>>),
    Error(String),
}

#[derive(Default)]
struct State {
    queries: Vec<Query>,
    responses: VecDeque<Response>,
}

/// Executor recording every statement and answering from a queue of responses.
///
/// Statements without a scripted response get no rows and zero affected rows.
#[derive(Default, Clone)]
pub struct MockExecutor {
    state: Arc<Mutex<State>>,
}

#[allow(dead_code)]
impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, response: Response) {
        self.state.lock().unwrap().responses.push_back(response);
    }

    pub fn affected(&self, rows_affected: u64, last_affected_id: Option<i64>) {
        self.respond(Response::Affected(RowsAffected {
            rows_affected,
            last_affected_id,
        }));
    }

    pub fn rows(&self, labels: &[&str], rows: Vec<Vec<Value>>) {
        let labels: RowNames = labels.iter().map(|v| v.to_string()).collect();
        self.respond(Response::Rows(labels, rows));
    }

    pub fn fail(&self, message: &str) {
        self.respond(Response::Error(message.into()));
    }

    pub fn queries(&self) -> Vec<Query> {
        self.state.lock().unwrap().queries.clone()
    }

    pub fn sql(&self) -> Vec<String> {
        self.queries().into_iter().map(|v| v.sql).collect()
    }

    pub fn last_query(&self) -> Query {
        self.state
            .lock()
            .unwrap()
            .queries
            .last()
            .cloned()
            .expect("No statement was executed")
    }
}

impl Executor for MockExecutor {
    fn run<'s>(&'s self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        let response = {
            let mut state = self.state.lock().unwrap();
            state.queries.push(query);
            state.responses.pop_front()
        };
        let items: Vec<Result<QueryResult>> = match response {
            None => Vec::new(),
            Some(Response::Affected(v)) => vec![Ok(v.into())],
            Some(Response::Rows(labels, rows)) => rows
                .into_iter()
                .map(|v| Ok(RowLabeled::new(labels.clone(), v.into()).into()))
                .collect(),
            Some(Response::Error(e)) => vec![Err(Error::msg(e))],
        };
        stream::iter(items)
    }
}
