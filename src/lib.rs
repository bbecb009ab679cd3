//! compliance-tracker - policy document lifecycle tracking over HTTP
//!
//! Documents move from Pending to Approved through review and approval;
//! uploaded files live in a blob store, metadata in SQLite.

pub mod audit;
pub mod auth;
pub mod blob;
pub mod cli;
pub mod clock;
pub mod config;
pub mod db;
pub mod document;
pub mod http_server;
pub mod incident;
pub mod observability;
