pub mod access;
pub mod api;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod favorites;
pub mod init;
pub mod query;
pub mod stats;
