pub mod app;
pub mod config;
pub mod db;
pub mod errors;
pub mod external;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;
