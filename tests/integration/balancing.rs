//! End-to-end balancing through the public API.

use std::collections::BTreeSet;
use std::time::Duration;

use teambalance::engine::{compute_balanced_partitions, partition_count, Balancer, BalancerLimits, CancelToken};
use teambalance::report::{self, BalanceReport};
use teambalance::source::roster::RosterFile;
use teambalance::source::ParticipantSource;
use teambalance::types::{BalanceError, Match, Participant};

use crate::mock_source::MockSource;

fn keys(matches: &[Match]) -> Vec<String> {
    matches
        .iter()
        .map(|m| format!("{}|{}", m.unfairness(), m.canonical_key()))
        .collect()
}

#[tokio::test]
async fn lobby_best_option_is_global_minimum() {
    let source = MockSource::lobby();
    let players = source.fetch_participants().await.unwrap();
    assert_eq!(source.fetch_count(), 1);

    let all = compute_balanced_partitions(&players, 2, 1000).unwrap();
    assert_eq!(all.len() as u128, partition_count(players.len(), 2));

    let top = compute_balanced_partitions(&players, 2, 3).unwrap();
    assert_eq!(top.len(), 3);
    assert_eq!(keys(&top), keys(&all[..3]));

    let min = all.iter().map(Match::deviation).min().unwrap();
    assert_eq!(top[0].deviation(), min);

    let ids: BTreeSet<&str> = players.iter().map(|p| p.id.as_str()).collect();
    for m in &top {
        let covered: BTreeSet<&str> = m
            .teams()
            .iter()
            .flat_map(|t| t.members().iter().map(|p| p.id.as_str()))
            .collect();
        assert_eq!(covered, ids);
        assert_eq!(m.participant_count(), players.len());
    }
}

#[tokio::test]
async fn source_failure_propagates() {
    let source = MockSource::lobby();
    source.set_error("lobby API unavailable");
    let err = source.fetch_participants().await.unwrap_err();
    assert!(format!("{err}").contains("unavailable"));
}

#[tokio::test]
async fn balancing_on_blocking_worker() {
    let players = MockSource::lobby().fetch_participants().await.unwrap();
    let balancer = Balancer::new(BalancerLimits::default());
    let token = CancelToken::new();

    let expected = keys(&compute_balanced_partitions(&players, 3, 4).unwrap());
    let worker_token = token.clone();
    let got = tokio::task::spawn_blocking(move || balancer.balance(&players, 3, 4, &worker_token))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(keys(&got), expected);
}

#[test]
fn concurrent_calls_are_independent() {
    let players: Vec<Participant> = (0..9)
        .map(|i| Participant::named(format!("p{i}"), 100 + (i * 37) % 90))
        .collect();
    let expected = keys(&compute_balanced_partitions(&players, 3, 5).unwrap());

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| keys(&compute_balanced_partitions(&players, 3, 5).unwrap())))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}

#[test]
fn expired_deadline_cancels_instead_of_returning_nothing() {
    let players: Vec<Participant> = (0..10).map(|i| Participant::named(format!("p{i}"), i)).collect();
    let token = CancelToken::with_timeout(Duration::ZERO);
    let err = Balancer::default().balance(&players, 4, 3, &token).unwrap_err();
    assert!(matches!(err, BalanceError::Cancelled { .. }));
}

#[tokio::test]
async fn roster_file_to_json_report() {
    let mut path = std::env::temp_dir();
    path.push(format!("teambalance_it_{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(
        &path,
        r#"
[[players]]
id = "A"
score = 10

[[players]]
id = "B"
score = 20

[[players]]
id = "C"
score = 30

[[players]]
id = "D"
score = 40

[[players]]
id = "E"
score = 999
present = false
"#,
    )
    .unwrap();

    let players = RosterFile::new(&path).fetch_participants().await.unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(players.len(), 4);

    let matches = compute_balanced_partitions(&players, 2, 1).unwrap();
    let json = report::render_json(&BalanceReport::new(&matches, players.len(), 2)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["options"].as_array().unwrap().len(), 1);
    assert_eq!(value["options"][0]["canonical_key"], "50,A,D,50,B,C");
    assert_eq!(value["options"][0]["unfairness"].as_f64(), Some(0.0));

    let text = report::render_text(&matches);
    assert!(text.starts_with("Option 1: 50 vs 50"));
}
