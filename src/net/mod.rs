//! Backend transport: the shared HTTP core and the wire DTOs.

pub mod api;
pub mod types;
