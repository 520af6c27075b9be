//! Bidding round aggregate and related types.

mod bidder;
mod events;
mod model;
mod phase;
mod value_objects;

pub use bidder::{Bidder, InvalidFields};
pub use events::{
    AcceptContractData, CreateBidderData, DeleteBidderData, ModelEvent, ResetAllBidsData,
    SetBidData, SetPhaseData, SetPresentData, SetSelfEditData, UpdateBidderData,
};
pub use model::{BIDDER_ID_RANGE, Model};
pub use phase::RoundPhase;
pub use value_objects::{Bid, BidParseError, DistributionSite, ShareSplit};
