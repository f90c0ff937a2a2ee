//! # gridclear-types
//!
//! Shared types, errors, and configuration for the **GridClear** clearing engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`MarketName`], [`ParticipantId`], [`Timestamp`]
//! - **Market sides**: [`Side`]
//! - **Errors**: [`GridclearError`] with `GC_ERR_` prefix codes, and the
//!   round-level [`FailureCode`] set (`NOT_FORMED`, `SHORT_OFFERS`,
//!   `BAD_STATE`, `NO_INTERSECT`)
//! - **Configuration**: [`EngineConfig`]
//! - **Constants**: system-wide defaults and limits

pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod side;

// Re-export all primary types at crate root for ergonomic imports:
//   use gridclear_types::{MarketName, Side, FailureCode, ...};

pub use config::*;
pub use error::*;
pub use ids::*;
pub use side::*;

// Constants are accessed via `gridclear_types::constants::FOO`
// (not re-exported to avoid name collisions).
