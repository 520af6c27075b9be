use serde::{Deserialize, Serialize};

/// Identifier of a bidder within one bidding round.
///
/// Bidders also use this number to log in, so it is a plain integer rather
/// than an opaque token. Ids are assigned once and never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BidderId(u32);

impl BidderId {
    /// Creates a bidder ID from a raw number.
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw number.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for BidderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BidderId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u32> for BidderId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<BidderId> for u32 {
    fn from(id: BidderId) -> Self {
        id.0
    }
}
