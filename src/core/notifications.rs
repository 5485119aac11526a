use crate::core::models::Ticket;
use anyhow::{Context, Result};
use notify_rust::{Notification, Timeout};
use std::time::Duration;

const APP_NAME: &str = "ticket-watch";
const NEW_TICKET_TITLE: &str = "New Ticket Notification";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketAlert {
    pub title: String,
    pub body: String,
    pub duration: Duration,
}

impl TicketAlert {
    pub fn new_ticket(ticket: &Ticket, duration: Duration) -> Self {
        Self {
            title: NEW_TICKET_TITLE.to_string(),
            body: format!(
                "Ticket ID: {}, Subject: {}, Status: {}",
                ticket.id, ticket.subject, ticket.status
            ),
            duration,
        }
    }

    pub fn test(duration: Duration) -> Self {
        Self {
            title: "Test Notification".to_string(),
            body: "This is a test notification".to_string(),
            duration,
        }
    }
}

pub trait Notifier {
    fn notify(&self, alert: &TicketAlert) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, alert: &TicketAlert) -> Result<()> {
        let millis = u32::try_from(alert.duration.as_millis()).unwrap_or(u32::MAX);

        Notification::new()
            .summary(&alert.title)
            .body(&alert.body)
            .appname(APP_NAME)
            .timeout(Timeout::Milliseconds(millis))
            .show()
            .context("Failed to show desktop notification")?;

        tracing::debug!(title = %alert.title, "Sent desktop notification");
        Ok(())
    }
}

/// Sink used when notifications are switched off in settings.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyNotifier;

impl Notifier for LogOnlyNotifier {
    fn notify(&self, alert: &TicketAlert) -> Result<()> {
        tracing::info!(title = %alert.title, body = %alert.body, "Notification (desktop disabled)");
        Ok(())
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&self, alert: &TicketAlert) -> Result<()> {
        (**self).notify(alert)
    }
}
