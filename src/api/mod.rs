//! Request extraction helpers shared by the route handlers.

pub mod json;

pub use json::ApiJson;
