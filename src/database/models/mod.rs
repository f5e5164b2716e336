pub mod user;

pub use user::{NewUser, ProfileUpdate, User, UserProfile, UserRow};
