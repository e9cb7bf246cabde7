pub mod api;
pub mod cities;
pub mod commodities;
pub mod config;
pub mod error;
pub mod fetch;
pub mod history;
pub mod models;
pub mod pipeline;
pub mod scheduler;
pub mod store;
pub mod telemetry;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;
