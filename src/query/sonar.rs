use crate::core::credentials::Credentials;
use crate::core::models::{Ticket, TicketQuery};
use crate::query::{QueryError, TicketSource};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SCHEMA_PROBE_QUERY: &str = "{\n  __schema {\n    queryType {\n      name\n    }\n  }\n}\n";
const MAX_ERROR_BODY_CHARS: usize = 200;

pub struct SonarClient {
    http: Client,
    graphql_url: String,
    api_key: String,
}

#[derive(Debug)]
pub struct ProbeResponse {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphQlEnvelope {
    data: Option<TicketsData>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct TicketsData {
    tickets: Option<TicketPage>,
}

#[derive(Debug, Deserialize)]
struct TicketPage {
    entities: Vec<Ticket>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

impl SonarClient {
    pub fn new(credentials: &Credentials, timeout: Duration) -> Result<Self, QueryError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            graphql_url: credentials.graphql_url.clone(),
            api_key: credentials.api_key.clone(),
        })
    }

    /// Sends a schema introspection query to check the endpoint and key.
    pub async fn probe(&self) -> Result<ProbeResponse, QueryError> {
        let (status, body) = self.post(SCHEMA_PROBE_QUERY).await?;
        let body = serde_json::from_slice(&body)
            .map_err(|e| QueryError::MalformedResponse(e.to_string()))?;

        Ok(ProbeResponse { status, body })
    }

    async fn post(&self, query: &str) -> Result<(StatusCode, Vec<u8>), QueryError> {
        let response = self
            .http
            .post(&self.graphql_url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&GraphQlRequest { query })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::Status {
                status,
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let body = response.bytes().await?;
        Ok((status, body.to_vec()))
    }
}

#[async_trait]
impl TicketSource for SonarClient {
    async fn fetch_tickets(&self, query: TicketQuery) -> Result<Vec<Ticket>, QueryError> {
        let (_, body) = self.post(&query.to_graphql()).await?;
        let tickets = parse_tickets(&body)?;

        tracing::debug!(%query, count = tickets.len(), "Fetched tickets");
        Ok(tickets)
    }
}

fn parse_tickets(body: &[u8]) -> Result<Vec<Ticket>, QueryError> {
    let envelope: GraphQlEnvelope =
        serde_json::from_slice(body).map_err(|e| QueryError::MalformedResponse(e.to_string()))?;

    let messages: Vec<String> = envelope.errors.into_iter().map(|e| e.message).collect();

    match envelope.data.and_then(|data| data.tickets) {
        Some(page) => {
            if !messages.is_empty() {
                tracing::warn!(errors = ?messages, "GraphQL response carried errors alongside data");
            }
            Ok(page.entities)
        }
        None if !messages.is_empty() => Err(QueryError::GraphQl(messages)),
        None => Err(QueryError::MalformedResponse(
            "missing data.tickets in response".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{TicketId, TicketStatus};
    use mockito::Matcher;
    use serde_json::json;

    const API_KEY: &str = "secret-key";
    const GRAPHQL_PATH: &str = "/api/graphql";

    const OPEN_PAGE: &str = r#"{
        "data": {
            "tickets": {
                "entities": [
                    {
                        "id": 21,
                        "subject": "Fiber cut",
                        "status": "OPEN",
                        "created_at": "2024-05-02T08:00:00-04:00",
                        "updated_at": "2024-05-02T08:00:00-04:00"
                    }
                ]
            }
        }
    }"#;

    fn client_for(server: &mockito::Server) -> SonarClient {
        let credentials = Credentials {
            api_key: API_KEY.to_string(),
            graphql_url: format!("{}{}", server.url(), GRAPHQL_PATH),
        };
        SonarClient::new(&credentials, Duration::from_secs(5)).unwrap()
    }

    fn open_query() -> TicketQuery {
        TicketQuery::new(1, TicketStatus::Open)
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer_token_and_query_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", GRAPHQL_PATH)
            .match_header("authorization", "Bearer secret-key")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({ "query": open_query().to_graphql() })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(OPEN_PAGE)
            .create_async()
            .await;

        let tickets = client_for(&server)
            .fetch_tickets(open_query())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].id, TicketId::Number(21));
        assert_eq!(tickets[0].subject, "Fiber cut");
    }

    #[tokio::test]
    async fn test_error_status_is_reported_before_body_is_parsed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", GRAPHQL_PATH)
            .with_status(500)
            .with_body(OPEN_PAGE)
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_tickets(open_query())
            .await
            .unwrap_err();

        mock.assert_async().await;
        match err {
            QueryError::Status { status, body } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert!(body.contains("Fiber cut"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_error_body_is_truncated() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", GRAPHQL_PATH)
            .with_status(503)
            .with_body("x".repeat(MAX_ERROR_BODY_CHARS * 3))
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_tickets(open_query())
            .await
            .unwrap_err();

        match err {
            QueryError::Status { status, body } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body.chars().count(), MAX_ERROR_BODY_CHARS);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_success_status_with_bad_body_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", GRAPHQL_PATH)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_tickets(open_query())
            .await
            .unwrap_err();

        assert!(matches!(err, QueryError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_schema_query_reports_endpoint_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", GRAPHQL_PATH)
            .match_header("authorization", "Bearer secret-key")
            .match_body(Matcher::Json(json!({ "query": SCHEMA_PROBE_QUERY })))
            .with_status(200)
            .with_body(r#"{"data": {"__schema": {"queryType": {"name": "Query"}}}}"#)
            .create_async()
            .await;

        let response = client_for(&server).probe().await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["data"]["__schema"]["queryType"]["name"], "Query");
    }

    #[test]
    fn test_parse_ticket_list() {
        let body = br#"{
            "data": {
                "tickets": {
                    "entities": [
                        {
                            "id": 12,
                            "subject": "No internet",
                            "status": "OPEN",
                            "created_at": "2024-05-02T08:00:00-04:00",
                            "updated_at": "2024-05-02T08:05:00-04:00"
                        },
                        {
                            "id": "13",
                            "subject": "Router swap",
                            "status": "PENDING_INTERNAL",
                            "created_at": "2024-05-02T09:00:00Z",
                            "updated_at": "2024-05-02T09:00:00Z"
                        }
                    ]
                }
            }
        }"#;

        let tickets = parse_tickets(body).unwrap();

        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[0].id, TicketId::Number(12));
        assert_eq!(tickets[0].subject, "No internet");
        assert_eq!(tickets[1].id, TicketId::Text("13".to_string()));
        assert_eq!(tickets[1].status, TicketStatus::PendingInternal);
    }

    #[test]
    fn test_parse_keeps_page_with_odd_timestamp() {
        let body = br#"{
            "data": {
                "tickets": {
                    "entities": [
                        {
                            "id": 30,
                            "subject": "Odd date",
                            "status": "OPEN",
                            "created_at": "02/05/2024",
                            "updated_at": null
                        },
                        {
                            "id": 31,
                            "subject": "Normal",
                            "status": "OPEN",
                            "created_at": "2024-05-02T09:00:00Z",
                            "updated_at": "2024-05-02T09:00:00Z"
                        }
                    ]
                }
            }
        }"#;

        let tickets = parse_tickets(body).unwrap();

        assert_eq!(tickets.len(), 2);
        assert!(tickets[0].created_at.is_none());
        assert!(tickets[1].created_at.is_some());
    }

    #[test]
    fn test_parse_empty_entities() {
        let body = br#"{"data": {"tickets": {"entities": []}}}"#;
        assert!(parse_tickets(body).unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let err = parse_tickets(b"<html>gateway timeout</html>").unwrap_err();
        assert!(matches!(err, QueryError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        let err = parse_tickets(br#"{"data": {"tickets": []}}"#).unwrap_err();
        assert!(matches!(err, QueryError::MalformedResponse(_)));

        let err = parse_tickets(br#"{"data": null}"#).unwrap_err();
        assert!(matches!(err, QueryError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_rejects_ticket_missing_fields() {
        let body = br#"{"data": {"tickets": {"entities": [{"id": 1, "subject": "x"}]}}}"#;
        let err = parse_tickets(body).unwrap_err();
        assert!(matches!(err, QueryError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_graphql_errors_without_data() {
        let body = br#"{
            "data": null,
            "errors": [
                {"message": "Unauthenticated."},
                {"message": "Token expired"}
            ]
        }"#;

        match parse_tickets(body).unwrap_err() {
            QueryError::GraphQl(messages) => {
                assert_eq!(messages, vec!["Unauthenticated.", "Token expired"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_keeps_data_when_errors_are_partial() {
        let body = br#"{
            "data": {"tickets": {"entities": []}},
            "errors": [{"message": "field deprecated"}]
        }"#;

        assert!(parse_tickets(body).unwrap().is_empty());
    }

    #[test]
    fn test_graphql_request_body() {
        let query = TicketQuery::new(1, TicketStatus::Open).to_graphql();
        let json = serde_json::to_value(GraphQlRequest { query: &query }).unwrap();

        assert_eq!(json["query"].as_str(), Some(query.as_str()));
    }
}
