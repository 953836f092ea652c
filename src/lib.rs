//! School attendance tracking service: students, subjects, per-class
//! attendance marks and the statistics computed from them.

pub mod aggregate;
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod model;
pub mod routes;
pub mod snapshot;
pub mod store;
pub mod write_path;
