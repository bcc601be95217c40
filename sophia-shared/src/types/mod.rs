pub mod api;
pub mod auth;
pub mod business;
pub mod pagination;

pub use api::*;
pub use auth::*;
pub use business::*;
pub use pagination::*;
