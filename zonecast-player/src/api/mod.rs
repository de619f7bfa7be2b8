//! HTTP control surface
//!
//! JSON endpoints for the dashboard plus a Server-Sent Events stream of
//! controller events.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{build_router, run, AppContext};
