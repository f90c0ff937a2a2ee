//! The process-wide map of markets and the round-driver entry points.
//!
//! `MarketRegistry` is the engine's only process-wide state and is owned
//! explicitly by whoever constructs it — there are no globals. The
//! surrounding transport drives it with discrete round events:
//!
//! 1. [`MarketRegistry::on_reservation_round`] — ask every registration
//!    whether it wants to trade; markets are created lazily on the first
//!    reservation for an unseen name;
//! 2. [`MarketRegistry::on_offer_round`] — open offer collection, gather
//!    curves, publish per-side aggregates, and clear completed markets;
//! 3. [`MarketRegistry::force_clear`] — fail any market that did not finish
//!    its round, so that no round ends without exactly one clearing outcome
//!    per active market.
//!
//! ## Locking
//!
//! Every market has its own mutex: all counter and state mutations for one
//! commodity are serialized, while distinct markets stay fully independent.
//! Participant callbacks are never invoked with a market lock held; when a
//! registration manager and a market must both be held, the manager lock is
//! always taken first.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use gridclear_curve::Curve;
use gridclear_types::{
    EngineConfig, GridclearError, MarketName, ParticipantId, Result, Side, Timestamp,
};

use crate::events::{AggregateEvent, ClearEvent, EngineEvent, ErrorEvent};
use crate::manager::RegistrationManager;
use crate::market::{Market, OfferReceipt};
use crate::registration::{ParticipantCallbacks, ParticipantRegistration};
use crate::state::MarketState;

/// The process-wide market registry.
#[derive(Debug)]
pub struct MarketRegistry {
    config: EngineConfig,
    markets: RwLock<HashMap<MarketName, Arc<Mutex<Market>>>>,
    managers: RwLock<HashMap<MarketName, Arc<Mutex<RegistrationManager>>>>,
    /// Events produced since the last drain, in emission order.
    events: Mutex<Vec<EngineEvent>>,
}

impl MarketRegistry {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            markets: RwLock::new(HashMap::new()),
            managers: RwLock::new(HashMap::new()),
            events: Mutex::new(Vec::new()),
        })
    }

    // =================================================================
    // Participant-facing operations
    // =================================================================

    /// Register a participant on one side of one market.
    ///
    /// Fails unless at least one of the offer, aggregate, or price
    /// callbacks is supplied, or when the (participant, market, side)
    /// triple is already registered.
    pub fn join_market(
        &self,
        participant: ParticipantId,
        market: MarketName,
        side: Side,
        callbacks: ParticipantCallbacks,
    ) -> Result<()> {
        let registration =
            ParticipantRegistration::new(participant, market.clone(), side, callbacks)?;

        let manager = {
            let mut managers = write(&self.managers);
            Arc::clone(
                managers
                    .entry(market.clone())
                    .or_insert_with(|| {
                        Arc::new(Mutex::new(RegistrationManager::new(market.clone())))
                    }),
            )
        };
        lock(&manager).insert(registration)?;
        tracing::info!(%market, %side, %participant, "participant joined market");
        Ok(())
    }

    /// Submit an offer on behalf of a registered participant.
    ///
    /// This is the external offer path, used by participants that drive
    /// their own submissions rather than answering an offer callback. A
    /// completed side publishes its aggregate, counter-offers are pumped,
    /// and a market whose collection finishes is cleared immediately;
    /// resulting events are buffered for the next driver drain.
    pub fn make_offer(
        &self,
        participant: ParticipantId,
        market: &MarketName,
        side: Side,
        curve: Curve,
        timestamp: Timestamp,
    ) -> Result<OfferReceipt> {
        let manager_arc =
            read(&self.managers)
                .get(market)
                .cloned()
                .ok_or(GridclearError::UnknownRegistration {
                    participant,
                    market: market.clone(),
                    side,
                })?;
        let market_arc = read(&self.markets)
            .get(market)
            .cloned()
            .ok_or_else(|| GridclearError::UnknownMarket(market.clone()))?;

        let mut manager = lock(&manager_arc);
        let registration =
            manager
                .find_mut(participant, side)
                .ok_or(GridclearError::UnknownRegistration {
                    participant,
                    market: market.clone(),
                    side,
                })?;
        registration.precheck_offer()?;

        let receipt = lock(&market_arc).receive_offer(side, curve)?;
        if let Some(aggregate) = &receipt.aggregate {
            let counters =
                self.publish_aggregate(&market_arc, &mut manager, side, aggregate, timestamp);
            self.pump_offers(&market_arc, &mut manager, counters.into(), timestamp);
        }
        if lock(&market_arc).state().is_done() {
            self.clear_market(&market_arc, &mut manager, timestamp);
        }
        Ok(receipt)
    }

    /// Events buffered by external [`Self::make_offer`] calls since the
    /// last driver round.
    pub fn drain_events(&self) -> Vec<EngineEvent> {
        std::mem::take(&mut *lock(&self.events))
    }

    // =================================================================
    // Round-driver operations
    // =================================================================

    /// A reservation round began: ask every registration whether it wants
    /// to trade, creating markets lazily on first reservation.
    pub fn on_reservation_round(&self, timestamp: Timestamp) {
        let managers = snapshot(&self.managers);
        for (name, manager_arc) in managers {
            let mut manager = lock(&manager_arc);
            let wants = manager.collect_reservation_requests(timestamp);
            if wants.is_empty() {
                continue;
            }

            let market_arc = self.market_or_create(&name);
            for (participant, side) in wants {
                let granted = lock(&market_arc).receive_reservation(side);
                if granted {
                    if let Some(reg) = manager.find_mut(participant, side) {
                        reg.grant_reservation();
                    }
                }
            }
        }
        tracing::debug!(markets = read(&self.markets).len(), "reservation round complete");
    }

    /// An offer round began: open collection everywhere, gather offers,
    /// publish aggregates, and clear every market that completes. Markets
    /// that never formed are cleared immediately with `NOT_FORMED`.
    pub fn on_offer_round(&self, timestamp: Timestamp) -> Vec<EngineEvent> {
        for (name, market_arc) in snapshot(&self.markets) {
            let Some(manager_arc) = read(&self.managers).get(&name).cloned() else {
                continue;
            };
            let mut manager = lock(&manager_arc);

            let opened = {
                let mut market = lock(&market_arc);
                if market.round_is_idle() {
                    continue;
                }
                market.start_offer_round()
            };
            if !opened {
                // Never formed: fail the round now so every reservation
                // holder hears about it exactly once.
                self.clear_market(&market_arc, &mut manager, timestamp);
                continue;
            }

            let pending: VecDeque<(ParticipantId, Side, Curve)> =
                manager.collect_offers(timestamp).into();
            self.pump_offers(&market_arc, &mut manager, pending, timestamp);

            if lock(&market_arc).state().is_done() {
                self.clear_market(&market_arc, &mut manager, timestamp);
            }
        }
        self.drain_events()
    }

    /// Fail every market that did not complete its round. Markets already
    /// cleared (or never touched this round) are skipped.
    pub fn force_clear(&self, timestamp: Timestamp) -> Vec<EngineEvent> {
        for (name, market_arc) in snapshot(&self.markets) {
            if lock(&market_arc).round_is_idle() {
                continue;
            }
            let Some(manager_arc) = read(&self.managers).get(&name).cloned() else {
                continue;
            };
            let mut manager = lock(&manager_arc);
            tracing::warn!(market = %name, "force-clearing incomplete round");
            self.clear_market(&market_arc, &mut manager, timestamp);
        }
        self.drain_events()
    }

    /// Epoch reset: discard every market and every registration's
    /// per-round state. Registrations themselves persist.
    pub fn clear_reservations(&self) {
        write(&self.markets).clear();
        for (_, manager_arc) in snapshot(&self.managers) {
            lock(&manager_arc).reset_round_state();
        }
        tracing::info!("all markets and reservations cleared");
    }

    // =================================================================
    // Introspection
    // =================================================================

    #[must_use]
    pub fn market_count(&self) -> usize {
        read(&self.markets).len()
    }

    #[must_use]
    pub fn market_state(&self, market: &MarketName) -> Option<MarketState> {
        read(&self.markets)
            .get(market)
            .map(|market| lock(market).state())
    }

    #[must_use]
    pub fn has_market_formed(&self, market: &MarketName) -> bool {
        read(&self.markets)
            .get(market)
            .is_some_and(|market| lock(market).has_formed())
    }

    // =================================================================
    // Internals
    // =================================================================

    fn market_or_create(&self, name: &MarketName) -> Arc<Mutex<Market>> {
        let mut markets = write(&self.markets);
        Arc::clone(markets.entry(name.clone()).or_insert_with(|| {
            tracing::info!(market = %name, "creating market on first reservation");
            Arc::new(Mutex::new(Market::new(name.clone(), self.config.clone())))
        }))
    }

    /// Submit queued offers, publishing aggregates as sides complete and
    /// feeding aggregate-driven counter-offers back into the queue.
    fn pump_offers(
        &self,
        market_arc: &Arc<Mutex<Market>>,
        manager: &mut RegistrationManager,
        mut pending: VecDeque<(ParticipantId, Side, Curve)>,
        timestamp: Timestamp,
    ) {
        while let Some((participant, side, curve)) = pending.pop_front() {
            if let Some(reg) = manager.find_mut(participant, side) {
                if let Err(err) = reg.precheck_offer() {
                    tracing::warn!(market = %manager.market(), %participant, %side, %err,
                        "offer rejected before submission");
                    continue;
                }
            }

            let receipt = match lock(market_arc).receive_offer(side, curve) {
                Ok(receipt) => receipt,
                Err(err) => {
                    tracing::warn!(market = %manager.market(), %participant, %side, %err,
                        "offer rejected by market");
                    continue;
                }
            };

            if let Some(aggregate) = &receipt.aggregate {
                let counters =
                    self.publish_aggregate(market_arc, manager, side, aggregate, timestamp);
                pending.extend(counters);
            }
        }
    }

    /// Emit a side's aggregate event and deliver it to aggregate callbacks;
    /// returns the counter-offers those callbacks produced.
    fn publish_aggregate(
        &self,
        market_arc: &Arc<Mutex<Market>>,
        manager: &mut RegistrationManager,
        side: Side,
        aggregate: &Curve,
        timestamp: Timestamp,
    ) -> Vec<(ParticipantId, Side, Curve)> {
        let name = lock(market_arc).name().clone();
        tracing::debug!(market = %name, %side, points = aggregate.len(),
            "side complete; publishing aggregate");
        self.push_event(EngineEvent::Aggregate(AggregateEvent {
            market: name,
            side,
            curve: aggregate.clone(),
            timestamp,
        }));
        manager.report_aggregate(timestamp, side, aggregate)
    }

    /// Produce the market's single clearing outcome for this round and fan
    /// it out.
    fn clear_market(
        &self,
        market_arc: &Arc<Mutex<Market>>,
        manager: &mut RegistrationManager,
        timestamp: Timestamp,
    ) {
        let (name, outcome) = {
            let mut market = lock(market_arc);
            (market.name().clone(), market.clear())
        };
        match outcome {
            Ok(clearing) => {
                self.push_event(EngineEvent::Clear(ClearEvent {
                    market: name,
                    quantity: clearing.quantity,
                    price: clearing.price,
                    timestamp,
                }));
                manager.report_clear_price(timestamp, clearing.quantity, clearing.price);
            }
            Err(failure) => {
                self.push_event(EngineEvent::Error(ErrorEvent::from_failure(
                    name, &failure, timestamp,
                )));
                manager.report_error(timestamp, &failure);
            }
        }
    }

    fn push_event(&self, event: EngineEvent) {
        lock(&self.events).push(event);
    }
}

// Poisoned locks are recovered rather than propagated: the engine's shared
// state stays consistent because every mutation completes before its guard
// drops.

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<'a, T>(lock: &'a RwLock<T>) -> std::sync::RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<'a, T>(lock: &'a RwLock<T>) -> std::sync::RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn snapshot<K: Clone, V>(map: &RwLock<HashMap<K, Arc<V>>>) -> Vec<(K, Arc<V>)> {
    read(map)
        .iter()
        .map(|(k, v)| (k.clone(), Arc::clone(v)))
        .collect()
}
