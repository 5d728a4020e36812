//! Access-token secrets and the cached credential built around them.

pub mod credential;
pub mod secret;

pub use credential::*;
pub use secret::*;
