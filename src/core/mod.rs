pub mod credentials;
pub mod models;
pub mod notifications;
pub mod settings;
pub mod store;
