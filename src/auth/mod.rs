//! # Login
//!
//! Plain credential check for the dashboard login form. There are no sessions
//! or tokens: a successful login only answers "these credentials are valid".

pub mod crypto;
pub mod errors;
pub mod user;

pub use errors::{AuthError, AuthResult};
pub use user::UserRepository;
