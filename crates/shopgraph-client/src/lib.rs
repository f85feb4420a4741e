//! Shopify Storefront GraphQL transport and cursor paginator
//!
//! Two pieces:
//! 1. [`Transport`] — the seam between the pipeline and the network.
//!    [`StorefrontClient`] is the production implementation; tests swap
//!    in [`testing::ScriptedTransport`].
//! 2. [`paginate_all`] — drains a cursor-paginated connection into a
//!    complete ordered vector of raw nodes.
//!
//! No retry or backoff lives here. A transport failure on any page aborts
//! the drain immediately; callers wanting resilience wrap their
//! [`Transport`] implementation.

pub mod queries;
pub mod testing;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// Transport
// ============================================================================

/// Variables for one page request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageVariables {
    pub first: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

impl PageVariables {
    pub fn first_page(first: u32) -> Self {
        Self { first, after: None }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("GraphQL errors for variables {variables}: {errors}")]
    GraphQL { errors: Value, variables: Value },
    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

/// One GraphQL request. Returns the response's `data` object; any
/// `errors` payload is surfaced as [`TransportError::GraphQL`] with the
/// offending request variables attached for diagnostics.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, query: &str, variables: &PageVariables)
        -> Result<Value, TransportError>;
}

/// Storefront API client. Authenticates with the storefront access token
/// header against the versioned GraphQL endpoint.
pub struct StorefrontClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl StorefrontClient {
    pub fn new(store_url: &str, token: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/2019-10/graphql.json", store_url.trim_end_matches('/')),
            token: token.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for StorefrontClient {
    async fn request(
        &self,
        query: &str,
        variables: &PageVariables,
    ) -> Result<Value, TransportError> {
        let body = serde_json::json!({ "query": query, "variables": variables });

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Shopify-Storefront-Access-Token", &self.token)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidBody(e.to_string()))?;

        if let Some(errors) = payload.get("errors").filter(|e| !e.is_null()) {
            return Err(TransportError::GraphQL {
                errors: errors.clone(),
                variables: serde_json::to_value(variables)
                    .map_err(|e| TransportError::InvalidBody(e.to_string()))?,
            });
        }

        match payload.get("data") {
            Some(data) if !data.is_null() => Ok(data.clone()),
            _ => Err(TransportError::InvalidBody(
                "response carries neither data nor errors".to_string(),
            )),
        }
    }
}

// ============================================================================
// Paginator
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PaginateError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("pagination protocol violation: {0}")]
    Protocol(String),
}

/// Drain a cursor-paginated query into the complete ordered sequence of
/// raw nodes.
///
/// The query must alias its connection to `data` and return the
/// `{pageInfo{hasNextPage}, edges[{cursor, node}]}` envelope. Pages are
/// fetched strictly sequentially; each request's `after` is the `cursor`
/// of the previous page's last edge. Terminates when `hasNextPage` is
/// false. A page reporting `hasNextPage=true` with zero edges, or whose
/// last edge carries no cursor, is fatal: no next cursor can be derived.
pub async fn paginate_all<T: Transport + ?Sized>(
    transport: &T,
    query: &str,
    page_size: u32,
) -> Result<Vec<Value>, PaginateError> {
    paginate_from(transport, query, page_size, None).await
}

/// Like [`paginate_all`], but resuming from a known cursor.
pub async fn paginate_from<T: Transport + ?Sized>(
    transport: &T,
    query: &str,
    page_size: u32,
    start_cursor: Option<String>,
) -> Result<Vec<Value>, PaginateError> {
    let mut nodes = Vec::new();
    let mut variables = PageVariables {
        first: page_size,
        after: start_cursor,
    };

    loop {
        let data = transport.request(query, &variables).await?;
        let connection = data
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| PaginateError::Protocol("missing `data` connection".to_string()))?;

        let has_next_page = connection
            .get("pageInfo")
            .and_then(|p| p.get("hasNextPage"))
            .and_then(Value::as_bool)
            .ok_or_else(|| PaginateError::Protocol("missing pageInfo.hasNextPage".to_string()))?;

        let edges = connection
            .get("edges")
            .and_then(Value::as_array)
            .ok_or_else(|| PaginateError::Protocol("missing edges array".to_string()))?;

        tracing::debug!(
            edges = edges.len(),
            has_next_page,
            after = variables.after.as_deref().unwrap_or(""),
            "fetched page"
        );

        if edges.is_empty() {
            if has_next_page {
                return Err(PaginateError::Protocol(
                    "hasNextPage=true with zero edges".to_string(),
                ));
            }
            return Ok(nodes);
        }

        for edge in edges {
            nodes.push(edge.get("node").cloned().unwrap_or(Value::Null));
        }

        if !has_next_page {
            return Ok(nodes);
        }

        let last_cursor = edges
            .last()
            .and_then(|e| e.get("cursor"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                PaginateError::Protocol("hasNextPage=true but last edge has no cursor".to_string())
            })?;
        variables.after = Some(last_cursor.to_string());
    }
}

// ============================================================================
// Tests
// ============================================================================
