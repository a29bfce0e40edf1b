//! Integration tests for position reconciliation
//!
//! Drives the full pipeline (subscription → debounce → reconciler →
//! published decision) against the scripted mock source.

mod common;

use common::{fast_config, snapshot, wait_until, MockPoolSource};
use poolwatch::{
    BinRange, DecisionRecord, PoolAddress, PositionDecision, PositionManager, SubscriptionStatus,
    WalletAddress, WatchError,
};
use std::time::Duration;

fn test_pool() -> PoolAddress {
    PoolAddress::new("TestPool1111111111111111111111111111111111")
}

fn test_wallet() -> WalletAddress {
    WalletAddress::new("TestWallet111111111111111111111111111111111")
}

async fn started_manager(mock: &MockPoolSource) -> PositionManager<MockPoolSource> {
    let manager = poolwatch::builder()
        .source(mock.clone())
        .config(fast_config())
        .build()
        .unwrap();
    manager.initialize(test_pool()).await.unwrap();
    manager.start(test_wallet()).unwrap();
    manager
}

/// Wait for the initial (synthetic-dispatch) decision
async fn first_decision(manager: &PositionManager<MockPoolSource>) -> DecisionRecord {
    assert!(
        wait_until(2_000, || manager.current_decision().is_some()).await,
        "no decision was published"
    );
    manager.current_decision().unwrap()
}

#[tokio::test]
async fn no_position_yields_create_with_proportional_sizing() {
    // Bin 100, width 10, bin amounts x=500 y=1000, deposit 100
    let mock = MockPoolSource::new(100);
    let manager = started_manager(&mock).await;

    let record = first_decision(&manager).await;
    match record.decision {
        PositionDecision::NeedsCreate {
            total_x_amount,
            total_y_amount,
            range,
        } => {
            assert_eq!(total_x_amount, 100);
            // Y = 500 * 100 / 1000
            assert_eq!(total_y_amount, 50);
            assert_eq!(
                range,
                BinRange {
                    min_bin_id: 90,
                    max_bin_id: 110
                }
            );
        }
        other => panic!("expected NeedsCreate, got {:?}", other),
    }
    assert_eq!(record.active_bin.unwrap().bin_id, 100);

    manager.stop().await;
}

#[tokio::test]
async fn in_range_yields_active_reporting_the_existing_range() {
    let mock = MockPoolSource::new(105);
    mock.set_positions(vec![snapshot(90, 120)]);
    let manager = started_manager(&mock).await;

    let record = first_decision(&manager).await;
    match record.decision {
        PositionDecision::Active { range } => {
            // The on-chain range, not the freshly computed {95, 115}
            assert_eq!(
                range,
                BinRange {
                    min_bin_id: 90,
                    max_bin_id: 120
                }
            );
        }
        other => panic!("expected Active, got {:?}", other),
    }

    manager.stop().await;
}

#[tokio::test]
async fn boundary_bins_classify_as_active() {
    for boundary_bin in [90, 120] {
        let mock = MockPoolSource::new(boundary_bin);
        mock.set_positions(vec![snapshot(90, 120)]);
        let manager = started_manager(&mock).await;

        let record = first_decision(&manager).await;
        assert!(
            matches!(record.decision, PositionDecision::Active { .. }),
            "bin {} on the boundary must be Active, got {:?}",
            boundary_bin,
            record.decision
        );
        manager.stop().await;
    }
}

#[tokio::test]
async fn out_of_range_yields_rebalance_with_new_range() {
    let mock = MockPoolSource::new(121);
    mock.set_positions(vec![snapshot(90, 120)]);
    let manager = started_manager(&mock).await;

    let record = first_decision(&manager).await;
    match record.decision {
        PositionDecision::NeedsRebalance {
            current,
            current_liquidity,
            range,
        } => {
            assert_eq!(current.lower_bin_id, 90);
            assert_eq!(current.upper_bin_id, 120);
            // 600 + 400 from the snapshot helper
            assert_eq!(current_liquidity, 1_000);
            assert_eq!(
                range,
                BinRange {
                    min_bin_id: 111,
                    max_bin_id: 131
                }
            );
        }
        other => panic!("expected NeedsRebalance, got {:?}", other),
    }

    manager.stop().await;
}

#[tokio::test]
async fn below_range_also_rebalances() {
    let mock = MockPoolSource::new(89);
    mock.set_positions(vec![snapshot(90, 120)]);
    let manager = started_manager(&mock).await;

    let record = first_decision(&manager).await;
    match record.decision {
        PositionDecision::NeedsRebalance { range, .. } => {
            assert_eq!(
                range,
                BinRange {
                    min_bin_id: 79,
                    max_bin_id: 99
                }
            );
        }
        other => panic!("expected NeedsRebalance, got {:?}", other),
    }

    manager.stop().await;
}

#[tokio::test]
async fn first_returned_position_wins() {
    let mock = MockPoolSource::new(105);
    mock.set_positions(vec![snapshot(90, 120), snapshot(0, 10)]);
    let manager = started_manager(&mock).await;

    let record = first_decision(&manager).await;
    assert!(
        matches!(
            record.decision,
            PositionDecision::Active {
                range: BinRange {
                    min_bin_id: 90,
                    max_bin_id: 120
                }
            }
        ),
        "the first snapshot decides, got {:?}",
        record.decision
    );

    manager.stop().await;
}

#[tokio::test]
async fn failed_fetch_costs_one_cycle_not_the_subscription() {
    let mock = MockPoolSource::new(100);
    mock.set_fail_active_bin(true);
    let manager = started_manager(&mock).await;

    let record = first_decision(&manager).await;
    assert!(
        matches!(
            record.decision,
            PositionDecision::Failed {
                reason: WatchError::StateFetch(_)
            }
        ),
        "got {:?}",
        record.decision
    );
    assert!(record.active_bin.is_none());
    assert_eq!(
        manager.status(),
        SubscriptionStatus::Connected,
        "a bad cycle must not kill the feed"
    );

    // The backend recovers; the next trigger gets a fresh chance
    mock.set_fail_active_bin(false);
    mock.emit_change();

    assert!(
        wait_until(2_000, || {
            matches!(
                manager.current_decision().map(|r| r.decision),
                Some(PositionDecision::NeedsCreate { .. })
            )
        })
        .await,
        "recovered cycle should produce a real decision"
    );

    manager.stop().await;
}

#[tokio::test]
async fn notification_burst_coalesces_into_one_cycle() {
    let mock = MockPoolSource::new(100);
    let mut config = fast_config();
    config.debounce_ms = 200;
    let manager = poolwatch::builder()
        .source(mock.clone())
        .config(config)
        .build()
        .unwrap();
    manager.initialize(test_pool()).await.unwrap();
    manager.start(test_wallet()).unwrap();

    // Let the synthetic initial cycle finish first
    let _ = first_decision(&manager).await;
    assert!(wait_until(1_000, || manager.metrics().reconciliations == 1).await);

    // Three notifications well inside one 200ms quiet period
    for _ in 0..3 {
        mock.emit_change();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    tokio::time::sleep(Duration::from_millis(600)).await;
    let metrics = manager.metrics();
    assert_eq!(metrics.notifications, 3);
    assert_eq!(
        metrics.reconciliations, 2,
        "a burst of notifications must run exactly one more cycle"
    );

    manager.stop().await;
}

#[tokio::test]
async fn initialize_is_idempotent() {
    let mock = MockPoolSource::new(100);
    let manager = poolwatch::builder()
        .source(mock.clone())
        .config(fast_config())
        .build()
        .unwrap();

    manager.initialize(test_pool()).await.unwrap();
    manager.initialize(test_pool()).await.unwrap();
    assert_eq!(mock.refresh_calls(), 1, "one initialization, not two");

    // Concurrent calls collapse the same way
    let mock2 = MockPoolSource::new(100);
    let manager2 = poolwatch::builder()
        .source(mock2.clone())
        .config(fast_config())
        .build()
        .unwrap();
    let (a, b) = tokio::join!(
        manager2.initialize(test_pool()),
        manager2.initialize(test_pool())
    );
    a.unwrap();
    b.unwrap();
    assert_eq!(mock2.refresh_calls(), 1);
}

#[tokio::test]
async fn no_decision_surfaces_after_stop() {
    let mock = MockPoolSource::new(100);
    let manager = started_manager(&mock).await;

    let _ = first_decision(&manager).await;
    manager.stop().await;
    while manager.try_recv_decision().is_some() {}
    let cycles_at_stop = manager.metrics().reconciliations;

    mock.emit_change();
    mock.emit_change();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(manager.try_recv_decision().is_none());
    assert_eq!(manager.metrics().reconciliations, cycles_at_stop);
}

#[tokio::test]
async fn preconditions_surface_as_failed_decisions() {
    let mock = MockPoolSource::new(100);
    let manager = poolwatch::builder()
        .source(mock.clone())
        .config(fast_config())
        .build()
        .unwrap();

    // No pool handle yet
    manager.poll_now().await;
    assert!(matches!(
        manager.current_decision().map(|r| r.decision),
        Some(PositionDecision::Failed {
            reason: WatchError::PoolUninitialized
        })
    ));

    // Handle but no wallet (never started)
    manager.initialize(test_pool()).await.unwrap();
    manager.poll_now().await;
    assert!(matches!(
        manager.current_decision().map(|r| r.decision),
        Some(PositionDecision::Failed {
            reason: WatchError::WalletUnavailable
        })
    ));

    // And the fetch path was never touched
    assert_eq!(mock.position_fetches(), 0);
}

#[tokio::test]
async fn start_validates_its_preconditions() {
    let mock = MockPoolSource::new(100);
    let manager = poolwatch::builder()
        .source(mock.clone())
        .config(fast_config())
        .build()
        .unwrap();

    assert!(matches!(
        manager.start(test_wallet()),
        Err(WatchError::PoolUninitialized)
    ));

    manager.initialize(test_pool()).await.unwrap();
    assert!(matches!(
        manager.start(WalletAddress::new("")),
        Err(WatchError::WalletUnavailable)
    ));
}

#[tokio::test]
async fn empty_y_side_fails_the_cycle() {
    let mock = MockPoolSource::with_amounts(100, 500, 0);
    let manager = started_manager(&mock).await;

    let record = first_decision(&manager).await;
    assert!(matches!(
        record.decision,
        PositionDecision::Failed {
            reason: WatchError::StateFetch(_)
        }
    ));

    manager.stop().await;
}

#[tokio::test]
async fn decisions_serialize_with_stable_tags() {
    let mock = MockPoolSource::new(100);
    let manager = started_manager(&mock).await;

    let record = first_decision(&manager).await;
    let json = serde_json::to_string(&record).unwrap();
    assert!(json.contains("\"type\":\"needs_create\""), "json: {}", json);

    let roundtrip: DecisionRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(roundtrip.decision, record.decision);

    manager.stop().await;
}
