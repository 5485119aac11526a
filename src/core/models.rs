use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Sonar ticket group that holds the Helpdesk queue.
pub const HELPDESK_GROUP_ID: u32 = 1;

pub const TRACKED_QUERIES: [TicketQuery; 2] = [
    TicketQuery::new(HELPDESK_GROUP_ID, TicketStatus::Open),
    TicketQuery::new(HELPDESK_GROUP_ID, TicketStatus::PendingInternal),
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TicketId {
    Number(i64),
    Text(String),
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketId::Number(n) => write!(f, "{}", n),
            TicketId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Open,
    PendingInternal,
    PendingExternal,
    Closed,
    #[serde(other)]
    Unknown,
}

impl TicketStatus {
    /// Enum literal as the GraphQL schema spells it.
    pub fn as_graphql(&self) -> &'static str {
        match self {
            TicketStatus::Open => "OPEN",
            TicketStatus::PendingInternal => "PENDING_INTERNAL",
            TicketStatus::PendingExternal => "PENDING_EXTERNAL",
            TicketStatus::Closed => "CLOSED",
            TicketStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_graphql())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub subject: String,
    pub status: TicketStatus,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Timestamps are display-only. A missing or unparsable value becomes `None`
/// so it cannot reject the rest of the ticket page.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;

    let Some(serde_json::Value::String(text)) = raw else {
        return Ok(None);
    };

    let parsed = DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        });

    if parsed.is_none() {
        tracing::debug!(value = %text, "Ignoring unparsable ticket timestamp");
    }

    Ok(parsed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TicketQuery {
    pub ticket_group_id: u32,
    pub status: TicketStatus,
}

impl TicketQuery {
    pub const fn new(ticket_group_id: u32, status: TicketStatus) -> Self {
        Self {
            ticket_group_id,
            status,
        }
    }

    pub fn to_graphql(&self) -> String {
        format!(
            "{{\n  tickets(ticket_group_id: {}, status: {}) {{\n    entities {{\n      id\n      subject\n      status\n      created_at\n      updated_at\n    }}\n  }}\n}}\n",
            self.ticket_group_id,
            self.status.as_graphql()
        )
    }
}

impl fmt::Display for TicketQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group {} / {}", self.ticket_group_id, self.status)
    }
}
