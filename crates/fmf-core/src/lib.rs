//! Core ForkMyFolio client library (HTTP client, session stores, routing, config).

pub mod api;
pub mod auth;
pub mod config;
pub mod cookies;
pub mod logging;
pub mod models;
pub mod router;
pub mod services;
pub mod settings;
pub mod theme;
