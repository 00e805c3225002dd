//! Client for the papelería inventory backend: session persistence, auth,
//! route guarding and the product resource.

pub mod config;
pub mod error;
pub mod net;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
