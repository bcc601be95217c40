mod auth;
mod telemetry;

pub use auth::*;
pub use telemetry::*;
