//! Session credentials: the access/refresh token pair and its redacting secret wrapper.

pub mod secret;
pub mod session;

pub use secret::*;
pub use session::*;
