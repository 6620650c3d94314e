// Library exports for Khateraty
// This allows integration tests and the binary to share the app modules

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod feed;
pub mod flash;
pub mod messages;
pub mod posts;
pub mod profile;
pub mod routes;
pub mod state;
pub mod storage;
pub mod validation;
