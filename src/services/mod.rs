//! Service layer: HTTP API surface.

pub mod api;
pub mod web;
