//! Value objects for the bidding round.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A monthly bid, stored in euro cents.
///
/// Zero means that no bid has been placed yet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Bid(u64);

/// Reasons a typed-in amount is rejected by [`Bid::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BidParseError {
    #[error("Amount is empty")]
    Empty,

    #[error("Invalid amount: {0:?} is not a whole number")]
    InvalidInteger(String),

    #[error("Invalid amount: {0:?} must be one or two digits after the decimal separator")]
    InvalidFraction(String),

    #[error("Amount is too large")]
    Overflow,
}

impl Bid {
    /// Creates a bid from cents.
    pub fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the empty bid.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> u64 {
        self.0
    }

    /// Returns true if no bid has been placed.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies by a count of months, saturating at the largest amount.
    pub fn times(&self, months: u64) -> Bid {
        Bid(self.0.saturating_mul(months))
    }

    /// Parses an amount as a person would type it.
    ///
    /// Accepts `123`, `123,45`, `123.45`, `1.234,5` and the same with a
    /// trailing `€`. If a comma is present it separates the cents and every
    /// dot is a thousands separator. Without a comma a single dot separates
    /// the cents, while several dots are thousands separators.
    pub fn parse(input: &str) -> Result<Bid, BidParseError> {
        let input = input.trim();
        let input = input.strip_suffix('€').unwrap_or(input).trim_end();

        if input.is_empty() {
            return Err(BidParseError::Empty);
        }

        let (whole, fraction) = match input.split_once(',') {
            Some((whole, fraction)) => (whole.replace('.', ""), Some(fraction)),
            None if input.matches('.').count() == 1 => {
                let (whole, fraction) = input.split_at(input.find('.').unwrap_or(input.len()));
                (whole.to_string(), Some(&fraction[1..]))
            }
            None => (input.replace('.', ""), None),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BidParseError::InvalidInteger(whole));
        }

        let cents = match fraction {
            None => 0,
            Some(f) if (1..=2).contains(&f.len()) && f.bytes().all(|b| b.is_ascii_digit()) => {
                let value: u64 = f
                    .parse()
                    .map_err(|_| BidParseError::InvalidFraction(f.to_string()))?;
                if f.len() == 1 { value * 10 } else { value }
            }
            Some(f) => return Err(BidParseError::InvalidFraction(f.to_string())),
        };

        let euros: u64 = whole.parse().map_err(|_| BidParseError::Overflow)?;
        euros
            .checked_mul(100)
            .and_then(|c| c.checked_add(cents))
            .map(Bid)
            .ok_or(BidParseError::Overflow)
    }
}

impl std::str::FromStr for Bid {
    type Err = BidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Bid::parse(s)
    }
}

impl std::fmt::Display for Bid {
    /// Formats as `1.234,56 €`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = (self.0 / 100).to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        write!(f, "{},{:02} €", grouped, self.0 % 100)
    }
}

impl From<u64> for Bid {
    fn from(cents: u64) -> Self {
        Self(cents)
    }
}

/// Pick-up point where a bidder collects the vegetables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DistributionSite {
    /// Not chosen yet.
    #[default]
    None,
    Villingen,
    Schwenningen,
    Ueberauchen,
}

impl DistributionSite {
    /// Every site a bidder can choose.
    pub fn all() -> [DistributionSite; 3] {
        [
            DistributionSite::Villingen,
            DistributionSite::Schwenningen,
            DistributionSite::Ueberauchen,
        ]
    }

    /// Reads the form token; unknown tokens mean "not chosen".
    pub fn from_attr(attr: &str) -> Self {
        match attr {
            "villingen" => DistributionSite::Villingen,
            "schwenningen" => DistributionSite::Schwenningen,
            "ueberauchen" => DistributionSite::Ueberauchen,
            _ => DistributionSite::None,
        }
    }

    pub fn as_attr(&self) -> &'static str {
        match self {
            DistributionSite::None => "-",
            DistributionSite::Villingen => "villingen",
            DistributionSite::Schwenningen => "schwenningen",
            DistributionSite::Ueberauchen => "ueberauchen",
        }
    }

    /// Returns true if a site has been chosen.
    pub fn is_chosen(&self) -> bool {
        !matches!(self, DistributionSite::None)
    }
}

impl std::fmt::Display for DistributionSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DistributionSite::None => "-",
            DistributionSite::Villingen => "Villingen",
            DistributionSite::Schwenningen => "Schwenningen",
            DistributionSite::Ueberauchen => "Überauchen",
        };
        f.write_str(name)
    }
}

impl Serialize for DistributionSite {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_attr())
    }
}

impl<'de> Deserialize<'de> for DistributionSite {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let attr = String::deserialize(deserializer)?;
        Ok(Self::from_attr(&attr))
    }
}

/// Whether a bidder takes a whole share or wants to split one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShareSplit {
    #[default]
    Full,
    /// Wants half a share and is still looking for a partner.
    HalfSeeking,
    /// Shares with a known partner.
    Half,
    /// Would accept half a share.
    HalfPossible,
}

impl ShareSplit {
    pub fn all() -> [ShareSplit; 4] {
        [
            ShareSplit::Full,
            ShareSplit::HalfSeeking,
            ShareSplit::Half,
            ShareSplit::HalfPossible,
        ]
    }

    /// Reads the form token; unknown tokens fall back to a full share.
    pub fn from_attr(attr: &str) -> Self {
        match attr {
            "halb-suche" => ShareSplit::HalfSeeking,
            "halb" => ShareSplit::Half,
            "halb-moeglich" => ShareSplit::HalfPossible,
            _ => ShareSplit::Full,
        }
    }

    pub fn as_attr(&self) -> &'static str {
        match self {
            ShareSplit::Full => "ganz",
            ShareSplit::HalfSeeking => "halb-suche",
            ShareSplit::Half => "halb",
            ShareSplit::HalfPossible => "halb-moeglich",
        }
    }
}

impl std::fmt::Display for ShareSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_attr())
    }
}

impl Serialize for ShareSplit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_attr())
    }
}

impl<'de> Deserialize<'de> for ShareSplit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let attr = String::deserialize(deserializer)?;
        Ok(Self::from_attr(&attr))
    }
}
