//! Client credentials, redacting secrets, and the persisted token state.

pub mod credentials;
pub mod secret;
pub mod state;

pub use credentials::*;
pub use secret::*;
pub use state::*;
