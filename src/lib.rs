//! signup-flow — mini-app registration flow with email verification.

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod flow;
pub mod host;
pub mod sessions;
pub mod web;
