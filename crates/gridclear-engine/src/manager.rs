//! Fan-out of round events to every registration of one market.
//!
//! The manager holds no cross-registration state: it owns the market's
//! registrations, rejects duplicates, and applies per-registration
//! operations to each in insertion order.

use gridclear_curve::Curve;
use gridclear_types::{GridclearError, MarketName, ParticipantId, Result, Side, Timestamp};
use rust_decimal::Decimal;

use crate::events::MarketFailure;
use crate::registration::ParticipantRegistration;

/// All registrations of one market.
#[derive(Debug)]
pub struct RegistrationManager {
    market: MarketName,
    registrations: Vec<ParticipantRegistration>,
}

impl RegistrationManager {
    #[must_use]
    pub fn new(market: MarketName) -> Self {
        Self {
            market,
            registrations: Vec::new(),
        }
    }

    #[must_use]
    pub fn market(&self) -> &MarketName {
        &self.market
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Add a registration; each (participant, side) pairing may register at
    /// most once per market.
    pub fn insert(&mut self, registration: ParticipantRegistration) -> Result<()> {
        let duplicate = self.registrations.iter().any(|existing| {
            existing.participant() == registration.participant()
                && existing.side() == registration.side()
        });
        if duplicate {
            return Err(GridclearError::DuplicateRegistration {
                participant: registration.participant(),
                market: self.market.clone(),
                side: registration.side(),
            });
        }
        self.registrations.push(registration);
        Ok(())
    }

    #[must_use]
    pub fn find_mut(
        &mut self,
        participant: ParticipantId,
        side: Side,
    ) -> Option<&mut ParticipantRegistration> {
        self.registrations
            .iter_mut()
            .find(|reg| reg.participant() == participant && reg.side() == side)
    }

    /// Ask every registration whether it wants a reservation this round;
    /// returns the (participant, side) pairs that do.
    pub fn collect_reservation_requests(
        &mut self,
        timestamp: Timestamp,
    ) -> Vec<(ParticipantId, Side)> {
        self.registrations
            .iter_mut()
            .filter_map(|reg| {
                reg.request_reservation(timestamp)
                    .then(|| (reg.participant(), reg.side()))
            })
            .collect()
    }

    /// Ask every reserved registration with an offer callback for its curve.
    pub fn collect_offers(&mut self, timestamp: Timestamp) -> Vec<(ParticipantId, Side, Curve)> {
        self.registrations
            .iter_mut()
            .filter_map(|reg| {
                let curve = reg.request_offer(timestamp)?;
                Some((reg.participant(), reg.side(), curve))
            })
            .collect()
    }

    /// Deliver a side's composite curve to every registration holding an
    /// aggregate callback; returns the counter-offers they produced.
    pub fn report_aggregate(
        &mut self,
        timestamp: Timestamp,
        aggregate_side: Side,
        curve: &Curve,
    ) -> Vec<(ParticipantId, Side, Curve)> {
        self.registrations
            .iter_mut()
            .filter_map(|reg| {
                let counter = reg.report_aggregate(timestamp, aggregate_side, curve)?;
                Some((reg.participant(), reg.side(), counter))
            })
            .collect()
    }

    /// Deliver the clearing price to every registration.
    pub fn report_clear_price(&mut self, timestamp: Timestamp, quantity: Decimal, price: Decimal) {
        for reg in &mut self.registrations {
            reg.report_clear_price(timestamp, quantity, price);
        }
    }

    /// Deliver a round failure to every registration.
    pub fn report_error(&mut self, timestamp: Timestamp, failure: &MarketFailure) {
        for reg in &mut self.registrations {
            reg.report_error(timestamp, failure);
        }
    }

    /// Epoch reset: drop every registration's per-round state.
    pub fn reset_round_state(&mut self) {
        for reg in &mut self.registrations {
            reg.reset_round_state();
        }
    }
}
