use crate::core::credentials::Credentials;
use crate::core::models::{Ticket, TicketId, TicketQuery, TRACKED_QUERIES};
use crate::core::settings::Settings;
use crate::query::{fetch_all, SonarClient};
use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;

#[derive(Serialize)]
struct TicketsOutput {
    queries: Vec<QueryOutput>,
    total: usize,
    #[serde(with = "chrono::serde::ts_seconds")]
    fetched_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct QueryOutput {
    ticket_group_id: u32,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tickets: Option<Vec<Ticket>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn run(settings: &Settings, json: bool) -> Result<()> {
    let credentials = Credentials::from_env()?;
    let client = SonarClient::new(&credentials, settings.http.timeout())
        .context("Failed to build HTTP client")?;

    let queries: Vec<QueryOutput> = fetch_all(&client, &TRACKED_QUERIES)
        .await
        .into_iter()
        .map(|(query, result)| query_output(query, result.map_err(|e| e.to_string())))
        .collect();

    let total = queries
        .iter()
        .filter_map(|q| q.tickets.as_ref())
        .map(Vec::len)
        .sum();
    let failed = queries.iter().filter(|q| q.error.is_some()).count();

    if json {
        let output = TicketsOutput {
            queries,
            total,
            fetched_at: Utc::now(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_text_output(&queries, total);
    }

    if failed > 0 {
        anyhow::bail!("{} of {} ticket queries failed", failed, TRACKED_QUERIES.len());
    }

    Ok(())
}

fn query_output(query: TicketQuery, result: Result<Vec<Ticket>, String>) -> QueryOutput {
    let (tickets, error) = match result {
        Ok(tickets) => (Some(tickets), None),
        Err(e) => (None, Some(e)),
    };

    QueryOutput {
        ticket_group_id: query.ticket_group_id,
        status: query.status.to_string(),
        tickets,
        error,
    }
}

fn print_text_output(queries: &[QueryOutput], total: usize) {
    for (i, query) in queries.iter().enumerate() {
        if i > 0 {
            println!();
        }

        println!("{} (group {})", query.status, query.ticket_group_id);

        if let Some(error) = &query.error {
            println!("  Error: {}", error);
            continue;
        }

        match query.tickets.as_deref() {
            Some([]) | None => println!("  (none)"),
            Some(tickets) => {
                for ticket in tickets {
                    print_ticket_line(ticket);
                }
            }
        }
    }

    println!();
    println!("{} tickets currently tracked", total);
}

fn print_ticket_line(ticket: &Ticket) {
    println!(
        "  {:>8}  {}  {}",
        format_id(&ticket.id),
        format_created(ticket),
        ticket.subject
    );
}

fn format_created(ticket: &Ticket) -> String {
    ticket
        .created_at
        .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %I:%M %p").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_id(id: &TicketId) -> String {
    format!("#{}", id)
}
