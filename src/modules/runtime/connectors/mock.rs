//! In-memory transport for tests

use async_trait::async_trait;
use cqlbridge_core::error::Result;
use cqlbridge_core::{ConnectorConfig, CqlError};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{RawConnection, Response, Rows, Transport};

#[derive(Default)]
pub(crate) struct MockState {
    pub connects: usize,
    pub shutdowns: usize,
    pub statements: Vec<(String, Vec<Value>)>,
    pub fail_connect: bool,
    pub fail_shutdown: bool,
    pub responses: VecDeque<Result<Response>>,
}

/// Records every call; statements answer with scripted responses in order,
/// or with an empty response once the script runs out
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn push_rows(&self, rows: Rows) {
        self.state().responses.push_back(Ok(Response::with_rows(rows)));
    }

    pub fn push_response(&self, response: Response) {
        self.state().responses.push_back(Ok(response));
    }

    pub fn push_error(&self, message: &str) {
        self.state()
            .responses
            .push_back(Err(CqlError::Transport(message.to_string())));
    }

    pub fn connects(&self) -> usize {
        self.state().connects
    }

    pub fn shutdowns(&self) -> usize {
        self.state().shutdowns
    }

    pub fn statements(&self) -> Vec<String> {
        self.state().statements.iter().map(|(cql, _)| cql.clone()).collect()
    }

    pub fn params(&self, index: usize) -> Vec<Value> {
        self.state().statements[index].1.clone()
    }
}

struct MockConnection {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl RawConnection for MockConnection {
    async fn execute(&self, cql: &str, params: &[Value]) -> Result<Response> {
        let mut state = self.state.lock().unwrap();
        state.statements.push((cql.to_string(), params.to_vec()));
        state.responses.pop_front().unwrap_or_else(|| Ok(Response::default()))
    }

    async fn shutdown(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.shutdowns += 1;
        if state.fail_shutdown {
            return Err(CqlError::Transport("shutdown failed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, _config: &ConnectorConfig) -> Result<Arc<dyn RawConnection>> {
        let mut state = self.state();
        state.connects += 1;
        if state.fail_connect {
            return Err(CqlError::Transport("connection refused".to_string()));
        }
        Ok(Arc::new(MockConnection {
            state: self.state.clone(),
        }))
    }
}
