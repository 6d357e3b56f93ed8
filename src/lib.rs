pub mod auth;
pub mod config;
pub mod connectors;
pub mod models;
pub mod output;
pub mod summary;
pub mod web;
