//! Supervisor integration tests over the in-process collaborators.

use spacegate_access::AccessConfig;
use spacegate_daemon::collab::{Collaborators, InMemoryDirectory, LoopbackConnector, SpaceRecord};
use spacegate_daemon::config::SchedulerConfig;
use spacegate_daemon::supervisor::{RecheckReport, Supervisor};
use spacegate_types::{
    MapId, PlayerId, PlayerInfo, Point, RecheckJob, SpaceId, WalletAddress, WorldAction,
};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const VAULT: &str = r#"[{"name":"vault","topLeft":"10,10","bottomRight":"20,20","humanised":"Vault Key"}]"#;

struct Harness {
    directory: Arc<InMemoryDirectory>,
    connector: Arc<LoopbackConnector>,
    supervisor: Arc<Supervisor>,
}

fn harness() -> Harness {
    let directory = Arc::new(InMemoryDirectory::new());
    let connector = Arc::new(LoopbackConnector::default());
    let scheduler = SchedulerConfig {
        drain_timeout_secs: 1,
        ..Default::default()
    };
    let (supervisor, _discover_rx) = Supervisor::new(
        scheduler,
        AccessConfig::default().with_lookup_timeout(Duration::from_millis(200)),
        Collaborators::in_memory(directory.clone(), connector.clone()),
    );

    Harness {
        directory,
        connector,
        supervisor,
    }
}

fn space(id: &str) -> SpaceRecord {
    SpaceRecord::new(SpaceId::new(id)).with_regions(VAULT)
}

fn ids(names: &[&str]) -> Vec<SpaceId> {
    names.iter().map(|n| SpaceId::new(*n)).collect()
}

fn lobby() -> MapId {
    MapId::new("lobby")
}

/// Wait until the world has recorded `count` actions.
async fn wait_for_actions(
    connector: &LoopbackConnector,
    space_id: &SpaceId,
    count: usize,
) -> Vec<WorldAction> {
    let world = connector.world(space_id).unwrap();
    for _ in 0..200 {
        let actions = world.actions().await;
        if actions.len() >= count {
            return actions;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    world.actions().await
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn discovery_starts_and_stops_spaces() {
    let h = harness();
    h.directory.upsert_space(space("A")).await;
    h.directory.upsert_space(space("B")).await;

    let plan = h.supervisor.discover().await.unwrap();
    assert_eq!(plan.to_start, ids(&["A", "B"]));
    assert_eq!(h.supervisor.running_spaces().await, ids(&["A", "B"]));

    h.directory.remove_space(&SpaceId::new("A")).await;
    let plan = h.supervisor.discover().await.unwrap();
    assert_eq!(plan.to_stop, ids(&["A"]));
    assert!(plan.to_start.is_empty());
    assert_eq!(h.supervisor.running_spaces().await, ids(&["B"]));
    assert!(!h.connector.world(&SpaceId::new("A")).unwrap().is_connected());

    h.supervisor.stop().await;
    assert!(h.supervisor.running_spaces().await.is_empty());
}

#[tokio::test]
async fn unreachable_space_is_retried_on_next_discovery() {
    let h = harness();
    let a = SpaceId::new("A");
    h.directory.upsert_space(space("A")).await;
    h.directory.set_reachable(&a, false);

    h.supervisor.discover().await.unwrap();
    assert!(h.supervisor.running_spaces().await.is_empty());
    assert!(h.connector.world(&a).is_none());

    h.directory.set_reachable(&a, true);
    h.supervisor.discover().await.unwrap();
    assert_eq!(h.supervisor.running_spaces().await, ids(&["A"]));

    h.supervisor.stop().await;
}

#[tokio::test]
async fn refused_connection_is_retried() {
    let h = harness();
    let a = SpaceId::new("A");
    h.directory.upsert_space(space("A")).await;
    h.connector.refuse(&a, true);

    h.supervisor.discover().await.unwrap();
    assert!(h.supervisor.running_spaces().await.is_empty());

    h.connector.refuse(&a, false);
    h.supervisor.discover().await.unwrap();
    assert_eq!(h.supervisor.running_spaces().await, ids(&["A"]));

    h.supervisor.stop().await;
}

#[tokio::test]
async fn malformed_space_is_not_started() {
    let h = harness();
    h.directory
        .upsert_space(
            SpaceRecord::new(SpaceId::new("bad"))
                .with_regions(r#"[{"name":"x","topLeft":"5,5","bottomRight":"1,1"}]"#),
        )
        .await;
    h.directory.upsert_space(space("good")).await;

    h.supervisor.discover().await.unwrap();
    assert_eq!(h.supervisor.running_spaces().await, ids(&["good"]));

    h.supervisor.stop().await;
}

#[tokio::test]
async fn lost_connection_is_restarted() {
    let h = harness();
    let a = SpaceId::new("A");
    h.directory.upsert_space(space("A")).await;
    h.supervisor.discover().await.unwrap();

    let world = h.connector.world(&a).unwrap();
    world.drop_connection().await.unwrap();
    for _ in 0..200 {
        if h.supervisor.running_spaces().await.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(h.supervisor.running_spaces().await.is_empty());

    let plan = h.supervisor.discover().await.unwrap();
    assert_eq!(plan.to_start, ids(&["A"]));
    assert!(h.connector.world(&a).unwrap().is_connected());

    h.supervisor.stop().await;
}

// ---------------------------------------------------------------------------
// Enforcement and reload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn changed_regions_are_hot_reloaded() {
    let h = harness();
    let a = SpaceId::new("A");
    h.directory.upsert_space(space("A")).await;
    h.supervisor.discover().await.unwrap();

    let world = h.connector.world(&a).unwrap();
    let bob = PlayerInfo::new(PlayerId::new("b"), "Bob", lobby(), Point::new(0, 0));
    world.join(bob.clone()).await.unwrap();
    world.move_player(&bob.id, lobby(), Point::new(5, 5)).await.unwrap();
    world.move_player(&bob.id, lobby(), Point::new(15, 15)).await.unwrap();
    assert_eq!(wait_for_actions(&h.connector, &a, 2).await.len(), 2);
    world.clear_actions().await;

    // move the vault elsewhere
    h.directory
        .upsert_space(SpaceRecord::new(a.clone()).with_regions(
            r#"[{"name":"vault","topLeft":"45,45","bottomRight":"55,55","humanised":"Vault Key"}]"#,
        ))
        .await;
    let plan = h.supervisor.discover().await.unwrap();
    assert!(plan.is_empty());

    world.move_player(&bob.id, lobby(), Point::new(12, 12)).await.unwrap();
    world.move_player(&bob.id, lobby(), Point::new(51, 51)).await.unwrap();
    let actions = wait_for_actions(&h.connector, &a, 2).await;
    assert_eq!(
        actions,
        vec![
            WorldAction::teleport(bob.id.clone(), lobby(), Point::new(12, 12)),
            WorldAction::private_chat(bob.id.clone(), lobby(), "DENIED ACCESS[vault]:\nVault Key"),
        ]
    );

    h.supervisor.stop().await;
}

#[tokio::test]
async fn spawn_teleport_on_join() {
    let h = harness();
    let a = SpaceId::new("A");
    h.directory
        .upsert_space(space("A").with_spawn("lobby", "31, 32"))
        .await;
    h.supervisor.discover().await.unwrap();

    let world = h.connector.world(&a).unwrap();
    let carol = PlayerInfo::new(PlayerId::new("c"), "Carol", lobby(), Point::new(0, 0));
    world.join(carol.clone()).await.unwrap();

    let actions = wait_for_actions(&h.connector, &a, 1).await;
    assert_eq!(
        actions,
        vec![WorldAction::teleport(carol.id.clone(), lobby(), Point::new(31, 32))]
    );

    h.supervisor.stop().await;
}

// ---------------------------------------------------------------------------
// Recheck queue
// ---------------------------------------------------------------------------

#[tokio::test]
async fn recheck_job_applies_new_permission() {
    let h = harness();
    let a = SpaceId::new("A");
    let wallet = WalletAddress::new("0xbob");
    h.directory.upsert_space(space("A")).await;
    h.directory
        .link_wallet(PlayerId::new("b"), "gather", wallet.clone());
    h.supervisor.discover().await.unwrap();

    let world = h.connector.world(&a).unwrap();
    let bob = PlayerInfo::new(PlayerId::new("b"), "Bob", lobby(), Point::new(0, 0));
    world.join(bob.clone()).await.unwrap();
    world.move_player(&bob.id, lobby(), Point::new(5, 5)).await.unwrap();
    world.move_player(&bob.id, lobby(), Point::new(15, 15)).await.unwrap();
    assert_eq!(wait_for_actions(&h.connector, &a, 2).await.len(), 2);

    h.directory.grant(&wallet, &a, "vault");
    h.directory.request_recheck(&wallet, &a, &bob.id).await;
    let report = h.supervisor.drain_rechecks().await.unwrap();
    assert_eq!(
        report,
        RecheckReport {
            delivered: 1,
            discarded: 0,
            deferred: 0
        }
    );
    assert_eq!(h.directory.pending_count().await, 0);

    world.clear_actions().await;
    world.move_player(&bob.id, lobby(), Point::new(15, 15)).await.unwrap();
    world.move_player(&bob.id, lobby(), Point::new(16, 16)).await.unwrap();
    h.supervisor.stop().await;
    assert!(world.actions().await.is_empty());
}

#[tokio::test]
async fn recheck_jobs_for_unknown_spaces_stay_pending() {
    let h = harness();
    h.directory.enqueue(RecheckJob::new("garbage")).await;
    h.directory.enqueue(RecheckJob::new("grant:0xa:A:p1")).await;
    h.directory
        .request_recheck(
            &WalletAddress::new("0xa"),
            &SpaceId::new("elsewhere"),
            &PlayerId::new("p1"),
        )
        .await;

    let report = h.supervisor.drain_rechecks().await.unwrap();
    assert_eq!(
        report,
        RecheckReport {
            delivered: 0,
            discarded: 2,
            deferred: 1
        }
    );
    assert_eq!(h.directory.pending_count().await, 1);
}

// ---------------------------------------------------------------------------
// Background loops
// ---------------------------------------------------------------------------

#[tokio::test]
async fn background_loops_discover_and_stop() {
    let directory = Arc::new(InMemoryDirectory::new());
    let connector = Arc::new(LoopbackConnector::default());
    directory.upsert_space(space("A")).await;

    let scheduler = SchedulerConfig {
        recheck_interval_ms: 10,
        drain_timeout_secs: 1,
        ..Default::default()
    };
    let (supervisor, discover_rx) = Supervisor::new(
        scheduler,
        AccessConfig::default(),
        Collaborators::in_memory(directory.clone(), connector.clone()),
    );
    let task = tokio::spawn(supervisor.clone().start(discover_rx));

    for _ in 0..200 {
        if !supervisor.running_spaces().await.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(supervisor.running_spaces().await, ids(&["A"]));

    supervisor.stop().await;
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap();
    assert!(supervisor.running_spaces().await.is_empty());
}
