//! Phases of the bidding round.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The phase the bidding round is in.
///
/// The administrator moves the round between phases in any order:
/// ```text
/// Registration ──► Validation ──► Offer ──► Finish
///      ▲                                      │
///      └──────────────── (any) ◄──────────────┘
/// ```
/// `Invalid` is what an unknown token decodes to; it is never a legal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoundPhase {
    Invalid,

    /// Participants register and edit their data.
    Registration,

    /// The administrator checks registrations; selected bidders may still edit.
    Validation,

    /// Present bidders submit their bids.
    Offer,

    /// The round is over.
    Finish,
}

impl RoundPhase {
    /// Returns every phase the round can be set to.
    pub fn all() -> [RoundPhase; 4] {
        [
            RoundPhase::Registration,
            RoundPhase::Validation,
            RoundPhase::Offer,
            RoundPhase::Finish,
        ]
    }

    /// Reads a form token; anything unknown is `Invalid`.
    pub fn from_attr(attr: &str) -> Self {
        match attr {
            "registration" => RoundPhase::Registration,
            "validation" => RoundPhase::Validation,
            "offer" => RoundPhase::Offer,
            "finish" => RoundPhase::Finish,
            _ => RoundPhase::Invalid,
        }
    }

    pub fn as_attr(&self) -> &'static str {
        match self {
            RoundPhase::Invalid => "-",
            RoundPhase::Registration => "registration",
            RoundPhase::Validation => "validation",
            RoundPhase::Offer => "offer",
            RoundPhase::Finish => "finish",
        }
    }

    /// Returns true for every phase except `Invalid`.
    pub fn is_valid(&self) -> bool {
        !matches!(self, RoundPhase::Invalid)
    }

    /// Returns true if new bidders can be created in this phase.
    pub fn can_register(&self) -> bool {
        matches!(self, RoundPhase::Registration)
    }

    /// Returns true if bids are collected in this phase.
    pub fn can_bid(&self) -> bool {
        matches!(self, RoundPhase::Offer)
    }

    /// Returns the German display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundPhase::Invalid => "Ungültig",
            RoundPhase::Registration => "Registrierung",
            RoundPhase::Validation => "Überprüfung",
            RoundPhase::Offer => "Gebote",
            RoundPhase::Finish => "Fertig",
        }
    }
}

impl std::fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for RoundPhase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_attr())
    }
}

impl<'de> Deserialize<'de> for RoundPhase {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let attr = String::deserialize(deserializer)?;
        Ok(Self::from_attr(&attr))
    }
}
