// handlers/users/mod.rs - Self-service endpoints for the signed-in member

pub mod me;

pub use me::{me_get, me_put};
