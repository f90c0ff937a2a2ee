//! # gridclear-engine
//!
//! **The stateful plane of GridClear**: per-market round state machines,
//! participant registrations, and the process-wide registry that ties them
//! to the round driver.
//!
//! ## Architecture
//!
//! The engine sits between participant callbacks and the (out-of-scope)
//! transport layer:
//!
//! 1. **MarketState / Market**: the six-state round machine and its owner —
//!    reservation counts, offer book, clearing
//! 2. **OfferBook / ReservationTracker**: one round's curves and counts
//! 3. **ParticipantRegistration / RegistrationManager**: a participant's
//!    standing subscription and the per-market fan-out over all of them
//! 4. **MarketRegistry**: the name → market map and the round-driver entry
//!    points (`on_reservation_round`, `on_offer_round`, `force_clear`)
//!
//! ## Round Flow
//!
//! ```text
//! reservation round → offers round → aggregates published per side
//!                                  → clear: (quantity, price) | typed failure
//! ```
//!
//! Every round of every active market ends in exactly one clearing outcome,
//! after which the market resets to `ACCEPT_RESERVATIONS`.

pub mod events;
pub mod manager;
pub mod market;
pub mod offer_book;
pub mod registration;
pub mod registry;
pub mod reservations;
pub mod state;

pub use events::{AggregateEvent, ClearEvent, EngineEvent, ErrorEvent, MarketFailure};
pub use manager::RegistrationManager;
pub use market::{Market, MarketClearing, OfferReceipt};
pub use offer_book::OfferBook;
pub use registration::{
    AggregateCallback, ErrorCallback, OfferCallback, ParticipantCallbacks,
    ParticipantRegistration, PriceCallback, ReservationCallback,
};
pub use registry::MarketRegistry;
pub use reservations::ReservationTracker;
pub use state::{MarketEvent, MarketState};
