mod common;

use locus::codec::ClassProb;
use locus::error::{IngestError, InvalidPacketError};
use locus::kernel::decision::{DecisionReducer, DecisionState, LockThreshold, DEFAULT_LOCK_THRESHOLD};
use locus::kernel::state::{FusionKernel, KernelConfig};

fn probs(entries: &[(&str, f64)]) -> Vec<ClassProb> {
    entries.iter().map(|(n, p)| ClassProb::new(*n, *p)).collect()
}

#[test]
fn test_strict_maximum_wins() {
    let reducer = DecisionReducer::default();
    let input = probs(&[("Idle", 0.1), ("Cleaning", 0.6), ("Walking", 0.3)]);

    let first = reducer.reduce(&input).unwrap();
    assert_eq!(first.top_action, "Cleaning");
    assert_eq!(first.top_prob, 0.6);
    assert!(!first.locked);

    // Deterministic across repeated runs
    for _ in 0..10 {
        assert_eq!(reducer.reduce(&input).unwrap(), first);
    }
}

#[test]
fn test_ties_go_to_first_occurring() {
    let reducer = DecisionReducer::default();

    let a = reducer.reduce(&probs(&[("Walking", 0.45), ("Cleaning", 0.45), ("Idle", 0.1)])).unwrap();
    assert_eq!(a.top_action, "Walking");

    let b = reducer.reduce(&probs(&[("Cleaning", 0.45), ("Walking", 0.45), ("Idle", 0.1)])).unwrap();
    assert_eq!(b.top_action, "Cleaning");

    let c = reducer.reduce(&probs(&[("Idle", 0.1), ("Walking", 0.45), ("Cleaning", 0.45)])).unwrap();
    assert_eq!(c.top_action, "Walking");

    for _ in 0..10 {
        assert_eq!(
            reducer.reduce(&probs(&[("Walking", 0.45), ("Cleaning", 0.45), ("Idle", 0.1)])).unwrap(),
            a
        );
    }
}

#[test]
fn test_lock_threshold_boundary() {
    let reducer = DecisionReducer::new(LockThreshold::new(DEFAULT_LOCK_THRESHOLD));

    let at = reducer.reduce(&probs(&[("Walking", 0.7), ("Idle", 0.3)])).unwrap();
    assert!(at.locked, "topProb == 0.7 must lock");

    let below = reducer.reduce(&probs(&[("Walking", 0.699999), ("Idle", 0.300001)])).unwrap();
    assert!(!below.locked, "topProb 0.699999 must not lock");

    let above = reducer.reduce(&probs(&[("Walking", 0.95)])).unwrap();
    assert!(above.locked);
}

#[test]
fn test_custom_threshold() {
    let reducer = DecisionReducer::new(LockThreshold::new(0.5));
    assert!(reducer.reduce(&probs(&[("Idle", 0.5), ("Walking", 0.5)])).unwrap().locked);
    assert!(!reducer.reduce(&probs(&[("Idle", 0.49)])).unwrap().locked);
}

#[test]
fn test_empty_vector_is_invalid() {
    let reducer = DecisionReducer::default();
    assert_eq!(reducer.reduce(&[]), Err(InvalidPacketError::EmptyActionProbs));
}

#[test]
fn test_non_finite_probability_is_invalid() {
    let reducer = DecisionReducer::default();
    let err = reducer.reduce(&probs(&[("Idle", 0.4), ("Walking", f64::NAN)])).unwrap_err();
    assert_eq!(err, InvalidPacketError::NonFiniteProbability { name: "Walking".into() });
}

#[test]
fn test_idle_scenario() {
    let mut kernel = FusionKernel::new(KernelConfig::default());
    let snapshot = kernel.ingest(common::packet(&[("Idle", 0.9), ("Walking", 0.1)])).unwrap();

    assert_eq!(
        snapshot.decision,
        Some(DecisionState {
            top_action: "Idle".to_string(),
            top_prob: 0.9,
            locked: true,
        })
    );
}

#[test]
fn test_no_hysteresis_between_packets() {
    let mut kernel = FusionKernel::new(KernelConfig::default());

    let locked = kernel.ingest(common::packet(&[("Walking", 0.8), ("Idle", 0.2)])).unwrap();
    assert!(locked.locked());

    // A single packet below threshold releases immediately
    let released = kernel.ingest(common::packet(&[("Walking", 0.69), ("Idle", 0.31)])).unwrap();
    assert!(!released.locked());
    assert_eq!(released.decision.as_ref().unwrap().top_action, "Walking");

    // And a single packet above locks again
    let relocked = kernel.ingest(common::packet(&[("Cleaning", 0.71), ("Idle", 0.29)])).unwrap();
    assert!(relocked.locked());
    assert_eq!(relocked.decision.as_ref().unwrap().top_action, "Cleaning");

    assert_eq!(kernel.telemetry().snapshot().lock_transitions, 3);
}

#[test]
fn test_invalid_packet_leaves_state_unchanged() {
    let mut kernel = FusionKernel::new(KernelConfig::default());
    let good = kernel.ingest(common::packet(&[("Walking", 0.9), ("Idle", 0.1)])).unwrap();

    let err = kernel.ingest(common::packet(&[])).unwrap_err();
    assert_eq!(err, IngestError::InvalidPacket(InvalidPacketError::EmptyActionProbs));

    let after = kernel.snapshot();
    assert_eq!(after.decision, good.decision);
    assert_eq!(after.context, good.context);
    assert_eq!(after.version, good.version);
    assert_eq!(kernel.context().len(), 1);

    let stats = kernel.telemetry().snapshot();
    assert_eq!(stats.packet_stats.accepted, 1);
    assert_eq!(stats.packet_stats.dropped_invalid, 1);
}

#[test]
fn test_awaiting_data_before_first_packet() {
    let kernel = FusionKernel::new(KernelConfig::default());
    let snapshot = kernel.snapshot();
    assert!(snapshot.is_awaiting_data());
    assert!(snapshot.weights.is_none());
    assert!(snapshot.context.is_empty());
    assert_eq!(snapshot.version, 0);
}

#[test]
fn test_kernel_context_window_follows_capacity() {
    let mut kernel = FusionKernel::new(KernelConfig {
        context_capacity: 3,
        ..KernelConfig::default()
    });

    for i in 0..5 {
        let p = 0.5 + i as f64 * 0.1;
        kernel.ingest(common::packet(&[("Walking", p), ("Idle", 1.0 - p)])).unwrap();
    }

    let snapshot = kernel.snapshot();
    let seqs: Vec<u64> = snapshot.context.iter().map(|f| f.seq).collect();
    assert_eq!(seqs, vec![3, 4, 5]);
    assert_eq!(snapshot.version, 5);
}

#[test]
fn test_wire_precision_decides_argmax() {
    // Both values collapse to the same f32; the later one is still strictly greater.
    let mut kernel = FusionKernel::new(KernelConfig::default());
    let snapshot = kernel
        .ingest(common::packet(&[("Walking", 0.30000001), ("Cleaning", 0.30000002), ("Idle", 0.1)]))
        .unwrap();

    let decision = snapshot.decision.as_ref().unwrap();
    assert_eq!(decision.top_action, "Cleaning");
    assert_eq!(decision.top_prob, 0.30000002);
}

#[test]
fn test_wire_value_just_below_threshold_stays_unlocked() {
    let mut kernel = FusionKernel::new(KernelConfig::default());

    let below = kernel.ingest(common::packet(&[("Walking", 0.69999997), ("Idle", 0.1)])).unwrap();
    let decision = below.decision.as_ref().unwrap();
    assert_eq!(decision.top_prob, 0.69999997);
    assert!(!decision.locked);

    let at = kernel.ingest(common::packet(&[("Walking", 0.7), ("Idle", 0.1)])).unwrap();
    assert!(at.locked());
}
