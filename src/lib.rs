pub mod card;
pub mod configuration;
pub mod document;
pub mod error;
pub mod helper;
pub mod store;
pub mod telemetry;
