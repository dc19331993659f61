//! Session backend implementations.

pub mod fixture;
pub mod http;
