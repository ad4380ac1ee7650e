use std::time::Duration;

use super::*;

fn sequencer_at(now: Duration) -> CelebrationSequencer {
    CelebrationSequencer::new(CelebrationConfig::default(), now)
}

#[test]
fn first_frame_carries_the_opening_burst() {
    let mut seq = sequencer_at(Duration::ZERO);
    let bursts = seq.frame(Duration::ZERO);
    assert_eq!(bursts.len(), 3);
    assert_eq!(bursts[0].particles, 100);
    assert_eq!(bursts[0].origin, (0.5, 0.6));
    assert!((bursts[0].spread_degrees - 100.0).abs() < 1e-6);
}

#[test]
fn opening_burst_is_never_reemitted() {
    let mut seq = sequencer_at(Duration::ZERO);
    let _ = seq.frame(Duration::ZERO);
    for ms in [16u64, 33, 50, 1000] {
        let bursts = seq.frame(Duration::from_millis(ms));
        assert_eq!(bursts.len(), 2);
        assert!(bursts.iter().all(|b| b.particles == 3));
    }
}

#[test]
fn side_bursts_are_symmetric_edge_pairs() {
    let mut seq = sequencer_at(Duration::ZERO);
    let _ = seq.frame(Duration::ZERO);
    let bursts = seq.frame(Duration::from_millis(16));
    let (left, right) = (&bursts[0], &bursts[1]);
    assert_eq!(left.origin, (0.0, 0.5));
    assert_eq!(right.origin, (1.0, 0.5));
    assert!((left.angle_degrees + right.angle_degrees - 180.0).abs() < 1e-6);
    assert!((left.spread_degrees - right.spread_degrees).abs() < 1e-6);
}

#[test]
fn plan_runs_for_the_configured_duration_and_then_stops() {
    let started = Duration::from_secs(10);
    let mut seq = sequencer_at(started);
    assert!(!seq.finished(started));
    assert!(!seq
        .frame(started + Duration::from_millis(4999))
        .is_empty());

    let end = started + Duration::from_millis(5000);
    assert!(seq.finished(end));
    assert!(seq.frame(end).is_empty());
    assert!(seq.frame(end + Duration::from_secs(30)).is_empty());
}

#[test]
fn clock_earlier_than_start_does_not_finish_the_run() {
    let seq = sequencer_at(Duration::from_secs(10));
    assert!(!seq.finished(Duration::from_secs(9)));
}

#[test]
fn default_palette_matches_the_heart_constants() {
    let config = CelebrationConfig::default();
    assert_eq!(config.palette, HEART_PALETTE.to_vec());
    assert_eq!(config.palette[0], [0xFF, 0x4D, 0x6D]);
}
