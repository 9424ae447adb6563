//! Request handlers.

pub mod classify;
pub mod health;
pub mod model;

pub use classify::*;
pub use health::*;
pub use model::*;
