pub mod access_gate;

pub use access_gate::{AccessGate, GateDecision, Gated, Redirect, RoleRoutes};
