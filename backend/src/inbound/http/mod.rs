//! HTTP inbound adapter exposing the discovery REST endpoints.

pub mod cache_control;
pub mod discovery;
pub mod discovery_dto;
pub mod error;
pub mod health;
pub mod schemas;
pub mod state;
pub mod validation;

pub use error::ApiResult;
