//! PublicFacade: `RoutingEngine` plus a thin Axum HTTP surface over it.

pub mod facade;
pub mod http;

pub use facade::RoutingEngine;
