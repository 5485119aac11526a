pub mod notify;
pub mod probe;
pub mod tickets;
