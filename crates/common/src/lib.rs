//! Shared types used across the bidding round crates.

mod types;

pub use types::BidderId;
