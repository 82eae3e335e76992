//! HTTP server: processing endpoints, the served commerce.txt artifact and OpenAPI docs.

pub mod config;
pub mod dto;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;
