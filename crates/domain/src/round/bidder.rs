//! The bidder record.

use std::collections::BTreeMap;

use common::BidderId;
use serde::{Deserialize, Serialize};

use crate::email::is_valid_email;
use crate::iban::is_valid_iban;

use super::{Bid, DistributionSite, RoundPhase, ShareSplit};

/// One participant of the bidding round.
///
/// A freshly created bidder only carries its id; everything else is filled
/// in by the participant or the administrator through `update-bidder`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Bidder {
    pub id: BidderId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub phone: String,

    /// The bidder is a member of the cooperative association.
    pub member: bool,

    pub distribution_site: DistributionSite,
    pub share_split: ShareSplit,

    /// Name of the person sharing the contract, if any.
    pub contract_partner: String,

    pub iban: String,

    /// Leave empty if the account belongs to the bidder.
    pub account_holder: String,

    /// Pays once a year instead of monthly.
    pub yearly: bool,

    /// Monthly bid.
    pub bid: Bid,

    /// Attended the bidding meeting; only present bidders may bid.
    pub present: bool,

    /// May still edit their data during validation.
    pub self_edit: bool,

    pub contract_accepted: bool,
}

/// Field key to message, for fields that fail validation.
pub type InvalidFields = BTreeMap<&'static str, &'static str>;

impl Bidder {
    /// Creates an empty bidder with the given id.
    pub fn new(id: BidderId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Returns the account holder, falling back to the bidder's own name.
    pub fn account_holder(&self) -> String {
        if self.account_holder.trim().is_empty() {
            self.full_name()
        } else {
            self.account_holder.clone()
        }
    }

    /// Amount per payment: twelve months at once for yearly payers.
    pub fn annual_amount(&self) -> Bid {
        if self.yearly {
            self.bid.times(12)
        } else {
            self.bid
        }
    }

    /// Returns the fields that are missing or malformed.
    ///
    /// Computed on every call and never stored.
    pub fn invalid_fields(&self) -> InvalidFields {
        let mut invalid = InvalidFields::new();

        if self.first_name.trim().is_empty() {
            invalid.insert("first_name", "First name is required");
        }
        if self.last_name.trim().is_empty() {
            invalid.insert("last_name", "Last name is required");
        }
        if !is_valid_email(&self.email) {
            invalid.insert("email", "Not a valid e-mail address");
        }
        if self.address.trim().is_empty() {
            invalid.insert("address", "Address is required");
        }
        if !self.member {
            invalid.insert("member", "Membership in the association is required");
        }
        if !self.distribution_site.is_chosen() {
            invalid.insert("distribution_site", "Choose a distribution site");
        }
        if !is_valid_iban(&self.iban) {
            invalid.insert("iban", "Not a valid IBAN");
        }

        invalid
    }

    pub fn is_valid(&self) -> bool {
        self.invalid_fields().is_empty()
    }

    /// Whether the bidder may change their own data in `phase`.
    pub fn can_self_edit(&self, phase: RoundPhase) -> bool {
        match phase {
            RoundPhase::Registration => true,
            RoundPhase::Validation => self.self_edit,
            _ => false,
        }
    }

    /// Whether the bidder may submit a bid in `phase`.
    pub fn can_place_bid(&self, phase: RoundPhase) -> bool {
        phase.can_bid() && self.present
    }
}
