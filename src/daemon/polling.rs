use crate::core::models::{Ticket, TicketQuery, TRACKED_QUERIES};
use crate::core::notifications::{Notifier, TicketAlert};
use crate::core::store::SeenTickets;
use crate::query::{fetch_all, TicketSource};
use chrono::Local;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Uninitialized,
    Polling,
}

#[derive(Debug, Default)]
pub struct CycleReport {
    pub fetched: usize,
    pub failed: Vec<TicketQuery>,
    pub new_tickets: Vec<Ticket>,
}

/// Owns the seen-ticket set and drives the fetch/diff/notify cycle.
pub struct TicketWatcher<S, N> {
    source: S,
    notifier: N,
    queries: Vec<TicketQuery>,
    seen: SeenTickets,
    state: WatcherState,
    alert_duration: Duration,
}

impl<S: TicketSource, N: Notifier> TicketWatcher<S, N> {
    pub fn new(source: S, notifier: N, alert_duration: Duration) -> Self {
        Self {
            source,
            notifier,
            queries: TRACKED_QUERIES.to_vec(),
            seen: SeenTickets::new(),
            state: WatcherState::Uninitialized,
            alert_duration,
        }
    }

    pub fn seen(&self) -> &SeenTickets {
        &self.seen
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    /// Records every ticket that exists right now so it never notifies.
    /// Returns how many tickets were fetched.
    pub async fn initialize(&mut self) -> usize {
        let (tickets, failed) = self.fetch_combined().await;
        self.seen.mark_all_seen(&tickets);
        self.state = WatcherState::Polling;

        if !failed.is_empty() {
            tracing::warn!(
                failed_queries = failed.len(),
                "Initialization fetch incomplete; tickets from failed queries will notify on a later cycle"
            );
        }

        tracing::info!(
            count = tickets.len(),
            "Initialization complete: {} tickets currently in Helpdesk",
            tickets.len()
        );

        tickets.len()
    }

    /// One cycle: fetch every tracked query, notify for ids not yet seen,
    /// then remember them. Run `initialize` first or every ticket counts as new.
    pub async fn poll_once(&mut self) -> CycleReport {
        let (combined, failed) = self.fetch_combined().await;
        let new_tickets = self.seen.unseen(&combined);

        if !new_tickets.is_empty() {
            tracing::info!(
                count = new_tickets.len(),
                at = %Local::now().format("%I:%M %p"),
                "New tickets found"
            );

            for ticket in &new_tickets {
                self.send_alert(ticket);
            }

            self.seen.mark_all_seen(&new_tickets);
        }

        CycleReport {
            fetched: combined.len(),
            failed,
            new_tickets,
        }
    }

    /// Initializes if needed, then runs a cycle every `interval` until
    /// `shutdown` resolves. Shutdown is checked between cycles, so an
    /// already-resolved future runs exactly one cycle.
    pub async fn run<F>(&mut self, interval: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        if self.state() == WatcherState::Uninitialized {
            self.initialize().await;
        }

        tracing::info!(interval_secs = interval.as_secs(), "Scanning for new tickets...");

        loop {
            let report = self.poll_once().await;
            tracing::debug!(
                fetched = report.fetched,
                failed = report.failed.len(),
                new = report.new_tickets.len(),
                "Poll cycle complete"
            );

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!(seen = self.seen().len(), "Shutdown requested, stopping watcher");
                    break;
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    async fn fetch_combined(&self) -> (Vec<Ticket>, Vec<TicketQuery>) {
        let mut combined = Vec::new();
        let mut failed = Vec::new();

        for (query, result) in fetch_all(&self.source, &self.queries).await {
            match result {
                Ok(tickets) => combined.extend(tickets),
                Err(e) => {
                    tracing::warn!(%query, error = %e, "Ticket query failed, treating as empty");
                    failed.push(query);
                }
            }
        }

        (combined, failed)
    }

    fn send_alert(&self, ticket: &Ticket) {
        let alert = TicketAlert::new_ticket(ticket, self.alert_duration);

        match self.notifier.notify(&alert) {
            Ok(()) => tracing::info!(
                id = %ticket.id,
                subject = %ticket.subject,
                status = %ticket.status,
                "Notification sent"
            ),
            Err(e) => tracing::warn!(
                id = %ticket.id,
                error = %e,
                "Failed to send notification"
            ),
        }
    }
}
