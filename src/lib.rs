//! CGM treatment guide
//!
//! Turns a CGM trend arrow and a glucose reading into a carb recommendation
//! using a caregiver-editable protocol table, keeps care-team contacts, and
//! warns until the caregiver has reviewed and saved the protocol.

pub mod bands;
pub mod carbs;
pub mod config;
pub mod contacts;
pub mod engine;
pub mod error;
pub mod gate;
pub mod protocol;
pub mod session;
pub mod storage;
pub mod trend;
pub mod units;
pub mod urgency;

pub use carbs::CarbValue;
pub use contacts::{ContactBook, ContactField};
pub use engine::{recommend, ActionText, Recommendation};
pub use error::CalcError;
pub use protocol::ProtocolTable;
pub use session::Session;
pub use trend::TrendDirection;
pub use units::MgDl;
pub use urgency::UrgencyTier;
