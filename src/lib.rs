pub mod config;
pub mod constants;
pub mod error;
pub mod extractors;
pub mod ingest;
pub mod logging;
pub mod quiz;
pub mod response;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod store;
