// handlers/admin/mod.rs - Role administration (admin or founder members only)
//
// Authorization is decided per request against the actor's stored roles, so
// these routes share the plain session middleware with everything else.

pub mod roles;

pub use roles::update_user_roles;
