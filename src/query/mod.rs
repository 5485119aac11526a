mod sonar;

use crate::core::models::{Ticket, TicketQuery};
use async_trait::async_trait;
use thiserror::Error;

pub use sonar::SonarClient;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query failed with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),
}

#[async_trait]
pub trait TicketSource: Send + Sync {
    async fn fetch_tickets(&self, query: TicketQuery) -> Result<Vec<Ticket>, QueryError>;
}

/// Runs each query in order, one at a time.
pub async fn fetch_all<S: TicketSource + ?Sized>(
    source: &S,
    queries: &[TicketQuery],
) -> Vec<(TicketQuery, Result<Vec<Ticket>, QueryError>)> {
    let mut results = Vec::with_capacity(queries.len());

    for query in queries {
        let result = source.fetch_tickets(*query).await;
        results.push((*query, result));
    }

    results
}
