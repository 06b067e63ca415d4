//! Tillgate - authorization and session core for a point-of-sale back office
//!
//! This library owns the client-side permission model: rules, abilities,
//! role mapping, the session lifecycle, and the gate/guard decisions a
//! rendering layer consumes. It exposes all modules for testing purposes.

pub mod ability;
pub mod errors;
pub mod gate;
pub mod session;
pub mod settings;
