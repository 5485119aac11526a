use crate::core::models::{Ticket, TicketId};
use std::collections::HashSet;

/// Ticket ids observed during this run. Ids are only ever added.
#[derive(Debug, Clone, Default)]
pub struct SeenTickets {
    ids: HashSet<TicketId>,
}

impl SeenTickets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &TicketId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn mark_seen(&mut self, id: TicketId) -> bool {
        self.ids.insert(id)
    }

    pub fn mark_all_seen<'a>(&mut self, tickets: impl IntoIterator<Item = &'a Ticket>) {
        for ticket in tickets {
            self.mark_seen(ticket.id.clone());
        }
    }

    /// Tickets whose id has not been seen, in input order. A ticket listed
    /// twice in `tickets` is returned once.
    pub fn unseen(&self, tickets: &[Ticket]) -> Vec<Ticket> {
        let mut picked: HashSet<&TicketId> = HashSet::new();

        tickets
            .iter()
            .filter(|ticket| !self.contains(&ticket.id) && picked.insert(&ticket.id))
            .cloned()
            .collect()
    }
}
