//! Session and access control core for the dealership web client.
//!
//! [`session::SessionStore`] verifies the session against the identity
//! backend and holds the resulting read model; [`gate::AccessGate`] turns
//! that read model into render/redirect decisions for protected views.

pub mod backend;
pub mod config;
pub mod gate;
pub mod models;
pub mod routes;
pub mod session;
pub mod startup;
pub mod state;
pub mod storage;
pub mod utils;
