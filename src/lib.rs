pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod paths;
pub mod router;
pub mod state;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
