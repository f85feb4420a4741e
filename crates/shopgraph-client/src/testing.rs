//! Scripted transport for tests: replays canned pages and records every
//! request's variables so tests can assert on request counts and cursor
//! chaining.

use crate::{PageVariables, Transport, TransportError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

pub struct ScriptedTransport {
    pages: Vec<Value>,
    error: Option<String>,
    requests: Mutex<Vec<(String, PageVariables)>>,
}

impl ScriptedTransport {
    /// Replay `pages` in order, one per request, regardless of the query.
    pub fn new(pages: Vec<Value>) -> Self {
        Self {
            pages,
            error: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail every request with the given error.
    pub fn failing(error: TransportError) -> Self {
        Self {
            pages: Vec::new(),
            error: Some(error.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Variables of every request issued so far, in order.
    pub fn requests(&self) -> Vec<PageVariables> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Requests issued so far as (query, variables) pairs.
    pub fn requests_with_queries(&self) -> Vec<(String, PageVariables)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(
        &self,
        query: &str,
        variables: &PageVariables,
    ) -> Result<Value, TransportError> {
        let mut requests = self.requests.lock().unwrap();
        if let Some(message) = &self.error {
            return Err(TransportError::Network(message.clone()));
        }
        let index = requests.len();
        requests.push((query.to_string(), variables.clone()));
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| TransportError::Network(format!("no scripted page {index}")))
    }
}

/// Route requests to per-query scripted transports, for pipeline tests
/// that fetch several entity types in one run.
pub struct RoutedTransport {
    routes: Vec<(&'static str, ScriptedTransport)>,
}

impl RoutedTransport {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Serve `pages` for any query containing `marker` (e.g. `"articles("`).
    pub fn route(mut self, marker: &'static str, pages: Vec<Value>) -> Self {
        self.routes.push((marker, ScriptedTransport::new(pages)));
        self
    }

    pub fn requests_for(&self, marker: &str) -> Vec<PageVariables> {
        self.routes
            .iter()
            .find(|(m, _)| *m == marker)
            .map(|(_, t)| t.requests())
            .unwrap_or_default()
    }
}

impl Default for RoutedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for RoutedTransport {
    async fn request(
        &self,
        query: &str,
        variables: &PageVariables,
    ) -> Result<Value, TransportError> {
        for (marker, transport) in &self.routes {
            if query.contains(marker) {
                return transport.request(query, variables).await;
            }
        }
        Err(TransportError::Network(format!(
            "no route matches query: {}",
            query.lines().find(|l| !l.trim().is_empty()).unwrap_or("")
        )))
    }
}
