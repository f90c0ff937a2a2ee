//! End-to-end integration tests for the full round lifecycle:
//! reservation round -> offer round -> aggregate publication -> clearing.
//!
//! These drive the engine the way the transport layer would, with
//! callback-recording participants standing in for real agent processes.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use gridclear_curve::Curve;
use gridclear_engine::{EngineEvent, MarketRegistry, MarketState, ParticipantCallbacks};
use gridclear_types::{EngineConfig, FailureCode, MarketName, ParticipantId, Side};
use rust_decimal::Decimal;

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

/// Demand: 1000 units at price 0 down to nothing at price 1000.
fn demand_curve() -> Curve {
    Curve::from_points([(dec(0), dec(1000)), (dec(1000), dec(0))])
}

/// Supply: price rises 0 -> 1000 over quantity 0 -> 1000.
fn supply_curve() -> Curve {
    Curve::from_points([(dec(0), dec(0)), (dec(1000), dec(1000))])
}

/// Records every callback a participant receives.
#[derive(Default)]
struct Recorder {
    offers_requested: Mutex<usize>,
    aggregates: Mutex<Vec<(Side, usize)>>,
    prices: Mutex<Vec<(Decimal, Decimal)>>,
    errors: Mutex<Vec<FailureCode>>,
}

impl Recorder {
    fn prices(&self) -> Vec<(Decimal, Decimal)> {
        self.prices.lock().unwrap().clone()
    }

    fn errors(&self) -> Vec<FailureCode> {
        self.errors.lock().unwrap().clone()
    }

    fn aggregates(&self) -> Vec<(Side, usize)> {
        self.aggregates.lock().unwrap().clone()
    }
}

/// A participant that answers offer requests with a fixed curve and records
/// everything it hears.
fn recording_callbacks(recorder: &Arc<Recorder>, curve: fn() -> Curve) -> ParticipantCallbacks {
    let on_offer = Arc::clone(recorder);
    let on_price = Arc::clone(recorder);
    let on_error = Arc::clone(recorder);
    ParticipantCallbacks {
        offer: Some(Box::new(move |_, _, _| {
            *on_offer.offers_requested.lock().unwrap() += 1;
            Some(curve())
        })),
        price: Some(Box::new(move |_, _, _, quantity, price| {
            on_price.prices.lock().unwrap().push((quantity, price));
        })),
        error: Some(Box::new(move |_, _, _, failure| {
            on_error.errors.lock().unwrap().push(failure.code);
        })),
        ..Default::default()
    }
}

fn registry() -> MarketRegistry {
    MarketRegistry::new(EngineConfig::default()).unwrap()
}

#[test]
fn full_round_clears_at_the_analytic_crossing() {
    let registry = registry();
    let market = MarketName::new("electricity");

    let buyer_log = Arc::new(Recorder::default());
    let seller_log = Arc::new(Recorder::default());
    registry
        .join_market(
            ParticipantId::new(),
            market.clone(),
            Side::Buyer,
            recording_callbacks(&buyer_log, demand_curve),
        )
        .unwrap();
    registry
        .join_market(
            ParticipantId::new(),
            market.clone(),
            Side::Seller,
            recording_callbacks(&seller_log, supply_curve),
        )
        .unwrap();

    registry.on_reservation_round(Utc::now());
    assert!(registry.has_market_formed(&market));

    let events = registry.on_offer_round(Utc::now());

    // Both participants were asked to offer.
    assert_eq!(*buyer_log.offers_requested.lock().unwrap(), 1);
    assert_eq!(*seller_log.offers_requested.lock().unwrap(), 1);

    // One aggregate per side, then the clearing.
    let aggregates: Vec<Side> = events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::Aggregate(agg) => Some(agg.side),
            _ => None,
        })
        .collect();
    assert_eq!(aggregates.len(), 2);
    assert!(aggregates.contains(&Side::Buyer));
    assert!(aggregates.contains(&Side::Seller));

    let clears: Vec<(Decimal, Decimal)> = events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::Clear(clear) => Some((clear.quantity, clear.price)),
            _ => None,
        })
        .collect();
    assert_eq!(clears, vec![(dec(500), dec(500))]);

    // The clearing reached both price callbacks, and nobody heard an error.
    assert_eq!(buyer_log.prices(), vec![(dec(500), dec(500))]);
    assert_eq!(seller_log.prices(), vec![(dec(500), dec(500))]);
    assert!(buyer_log.errors().is_empty());
    assert!(seller_log.errors().is_empty());

    // The market reset for the next round.
    assert_eq!(
        registry.market_state(&market),
        Some(MarketState::AcceptReservations)
    );
}

#[test]
fn rounds_repeat_with_fresh_reservations() {
    let registry = registry();
    let market = MarketName::new("electricity");
    let buyer_log = Arc::new(Recorder::default());
    let seller_log = Arc::new(Recorder::default());
    registry
        .join_market(
            ParticipantId::new(),
            market.clone(),
            Side::Buyer,
            recording_callbacks(&buyer_log, demand_curve),
        )
        .unwrap();
    registry
        .join_market(
            ParticipantId::new(),
            market.clone(),
            Side::Seller,
            recording_callbacks(&seller_log, supply_curve),
        )
        .unwrap();

    for _ in 0..3 {
        registry.on_reservation_round(Utc::now());
        let events = registry.on_offer_round(Utc::now());
        assert!(
            events
                .iter()
                .any(|event| matches!(event, EngineEvent::Clear(_)))
        );
    }
    assert_eq!(buyer_log.prices().len(), 3);
    assert_eq!(seller_log.prices().len(), 3);
}

#[test]
fn buyer_only_market_fails_not_formed() {
    let registry = registry();
    let market = MarketName::new("electricity");
    let buyer_log = Arc::new(Recorder::default());
    registry
        .join_market(
            ParticipantId::new(),
            market.clone(),
            Side::Buyer,
            recording_callbacks(&buyer_log, demand_curve),
        )
        .unwrap();

    registry.on_reservation_round(Utc::now());
    assert!(!registry.has_market_formed(&market));

    let events = registry.on_offer_round(Utc::now());
    let codes: Vec<FailureCode> = events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::Error(err) => Some(err.code),
            _ => None,
        })
        .collect();
    assert_eq!(codes, vec![FailureCode::NotFormed]);
    assert_eq!(buyer_log.errors(), vec![FailureCode::NotFormed]);
    assert!(buyer_log.prices().is_empty());

    // The buyer was never asked to offer: the market short-circuited.
    assert_eq!(*buyer_log.offers_requested.lock().unwrap(), 0);
}

#[test]
fn missing_seller_offer_forces_short_offers() {
    let registry = registry();
    let market = MarketName::new("electricity");
    let buyer_log = Arc::new(Recorder::default());
    let seller_log = Arc::new(Recorder::default());

    registry
        .join_market(
            ParticipantId::new(),
            market.clone(),
            Side::Buyer,
            recording_callbacks(&buyer_log, demand_curve),
        )
        .unwrap();
    // This seller reserves but its offer callback never produces a curve.
    let silent = Arc::clone(&seller_log);
    registry
        .join_market(
            ParticipantId::new(),
            market.clone(),
            Side::Seller,
            ParticipantCallbacks {
                offer: Some(Box::new(move |_, _, _| {
                    *silent.offers_requested.lock().unwrap() += 1;
                    None
                })),
                error: {
                    let log = Arc::clone(&seller_log);
                    Some(Box::new(move |_, _, _, failure| {
                        log.errors.lock().unwrap().push(failure.code);
                    }))
                },
                ..Default::default()
            },
        )
        .unwrap();

    registry.on_reservation_round(Utc::now());
    let events = registry.on_offer_round(Utc::now());

    // Buy side completed and published its aggregate, but the market is
    // stuck waiting on the seller.
    assert!(events.iter().any(|event| matches!(
        event,
        EngineEvent::Aggregate(agg) if agg.side == Side::Buyer
    )));
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, EngineEvent::Clear(_)))
    );
    assert_eq!(
        registry.market_state(&market),
        Some(MarketState::AcceptSellOffers)
    );

    // The driver gives up on the round.
    let events = registry.force_clear(Utc::now());
    let codes: Vec<FailureCode> = events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::Error(err) => Some(err.code),
            _ => None,
        })
        .collect();
    assert_eq!(codes, vec![FailureCode::ShortOffers]);
    assert_eq!(seller_log.errors(), vec![FailureCode::ShortOffers]);
    assert_eq!(
        registry.market_state(&market),
        Some(MarketState::AcceptReservations)
    );
}

#[test]
fn aggregate_driven_seller_counter_offers() {
    let registry = registry();
    let market = MarketName::new("electricity");
    let buyer_log = Arc::new(Recorder::default());
    let seller_log = Arc::new(Recorder::default());

    registry
        .join_market(
            ParticipantId::new(),
            market.clone(),
            Side::Buyer,
            recording_callbacks(&buyer_log, demand_curve),
        )
        .unwrap();

    // The seller has no offer callback: it waits for the buy-side
    // aggregate and prices its supply against it.
    let on_aggregate = Arc::clone(&seller_log);
    let on_price = Arc::clone(&seller_log);
    registry
        .join_market(
            ParticipantId::new(),
            market.clone(),
            Side::Seller,
            ParticipantCallbacks {
                aggregate: Some(Box::new(move |_, _, side, curve| {
                    on_aggregate
                        .aggregates
                        .lock()
                        .unwrap()
                        .push((side, curve.len()));
                    (side == Side::Buyer).then(supply_curve)
                })),
                price: Some(Box::new(move |_, _, _, quantity, price| {
                    on_price.prices.lock().unwrap().push((quantity, price));
                })),
                ..Default::default()
            },
        )
        .unwrap();

    registry.on_reservation_round(Utc::now());
    let events = registry.on_offer_round(Utc::now());

    // The seller saw the buy-side aggregate and its counter-offer closed
    // the round.
    let seen = seller_log.aggregates();
    assert!(seen.iter().any(|(side, points)| *side == Side::Buyer && *points > 0));
    assert_eq!(seller_log.prices(), vec![(dec(500), dec(500))]);
    assert!(
        events
            .iter()
            .any(|event| matches!(event, EngineEvent::Clear(_)))
    );
}

#[test]
fn external_offers_drive_the_round_to_clearing() {
    let registry = registry();
    let market = MarketName::new("electricity");
    let buyer = ParticipantId::new();
    let seller = ParticipantId::new();
    let buyer_log = Arc::new(Recorder::default());
    let seller_log = Arc::new(Recorder::default());

    // Price-callback-only registrations: offers arrive over the external
    // `make_offer` path instead of an offer callback.
    for (participant, side, log) in [
        (buyer, Side::Buyer, &buyer_log),
        (seller, Side::Seller, &seller_log),
    ] {
        let on_price = Arc::clone(log);
        registry
            .join_market(
                participant,
                market.clone(),
                side,
                ParticipantCallbacks {
                    price: Some(Box::new(move |_, _, _, quantity, price| {
                        on_price.prices.lock().unwrap().push((quantity, price));
                    })),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    registry.on_reservation_round(Utc::now());
    let events = registry.on_offer_round(Utc::now());
    assert!(
        events.is_empty(),
        "no offer callbacks, so the round is still collecting"
    );
    assert_eq!(
        registry.market_state(&market),
        Some(MarketState::AcceptAllOffers)
    );

    let receipt = registry
        .make_offer(buyer, &market, Side::Buyer, demand_curve(), Utc::now())
        .unwrap();
    assert!(receipt.side_complete());

    let receipt = registry
        .make_offer(seller, &market, Side::Seller, supply_curve(), Utc::now())
        .unwrap();
    assert!(receipt.side_complete());

    // The second offer completed collection and cleared the market.
    let events = registry.drain_events();
    assert!(
        events
            .iter()
            .any(|event| matches!(event, EngineEvent::Clear(clear)
                if clear.quantity == dec(500) && clear.price == dec(500)))
    );
    assert_eq!(buyer_log.prices(), vec![(dec(500), dec(500))]);
    assert_eq!(seller_log.prices(), vec![(dec(500), dec(500))]);

    // A reservation is consumed per round: a second offer without a fresh
    // reservation is rejected.
    let err = registry
        .make_offer(buyer, &market, Side::Buyer, demand_curve(), Utc::now())
        .unwrap_err();
    assert!(matches!(err, gridclear_types::GridclearError::NoReservation));
}

#[test]
fn markets_evolve_independently() {
    let registry = registry();
    let electricity = MarketName::new("electricity");
    let gas = MarketName::new("natural_gas");
    let buyer_log = Arc::new(Recorder::default());
    let seller_log = Arc::new(Recorder::default());

    // Electricity gets both sides; gas only a buyer.
    registry
        .join_market(
            ParticipantId::new(),
            electricity.clone(),
            Side::Buyer,
            recording_callbacks(&buyer_log, demand_curve),
        )
        .unwrap();
    registry
        .join_market(
            ParticipantId::new(),
            electricity.clone(),
            Side::Seller,
            recording_callbacks(&seller_log, supply_curve),
        )
        .unwrap();
    let gas_log = Arc::new(Recorder::default());
    registry
        .join_market(
            ParticipantId::new(),
            gas.clone(),
            Side::Buyer,
            recording_callbacks(&gas_log, demand_curve),
        )
        .unwrap();

    registry.on_reservation_round(Utc::now());
    assert_eq!(registry.market_count(), 2);
    assert!(registry.has_market_formed(&electricity));
    assert!(!registry.has_market_formed(&gas));

    let events = registry.on_offer_round(Utc::now());
    let mut cleared = 0;
    let mut failed = 0;
    for event in &events {
        match event {
            EngineEvent::Clear(clear) => {
                assert_eq!(clear.market, electricity);
                cleared += 1;
            }
            EngineEvent::Error(err) => {
                assert_eq!(err.market, gas);
                assert_eq!(err.code, FailureCode::NotFormed);
                failed += 1;
            }
            EngineEvent::Aggregate(_) => {}
        }
    }
    assert_eq!((cleared, failed), (1, 1));
}

#[test]
fn epoch_reset_discards_markets_but_keeps_registrations() {
    let registry = registry();
    let market = MarketName::new("electricity");
    let buyer_log = Arc::new(Recorder::default());
    let seller_log = Arc::new(Recorder::default());
    registry
        .join_market(
            ParticipantId::new(),
            market.clone(),
            Side::Buyer,
            recording_callbacks(&buyer_log, demand_curve),
        )
        .unwrap();
    registry
        .join_market(
            ParticipantId::new(),
            market.clone(),
            Side::Seller,
            recording_callbacks(&seller_log, supply_curve),
        )
        .unwrap();

    registry.on_reservation_round(Utc::now());
    assert_eq!(registry.market_count(), 1);

    registry.clear_reservations();
    assert_eq!(registry.market_count(), 0);
    assert_eq!(registry.market_state(&market), None);

    // Registrations survive the epoch boundary: the next round works.
    registry.on_reservation_round(Utc::now());
    let events = registry.on_offer_round(Utc::now());
    assert!(
        events
            .iter()
            .any(|event| matches!(event, EngineEvent::Clear(_)))
    );
}
