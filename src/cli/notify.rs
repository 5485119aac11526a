use crate::core::notifications::{DesktopNotifier, Notifier, TicketAlert};
use crate::core::settings::Settings;
use anyhow::{Context, Result};

pub fn run(settings: &Settings) -> Result<()> {
    let alert = TicketAlert::test(settings.notifications.duration());

    DesktopNotifier
        .notify(&alert)
        .context("There was an error initializing desktop notifications")?;

    println!("Test notification sent");
    Ok(())
}
