pub mod cache;
pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod http;
pub mod identity;
pub mod models;
pub mod policy;
pub mod service;
pub mod tokens;
