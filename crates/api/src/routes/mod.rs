//! Route handlers grouped by resource.

pub mod bidders;
pub mod events;
pub mod health;
pub mod metrics;
pub mod phase;
