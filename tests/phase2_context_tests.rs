mod common;

use locus::kernel::context::{ContextBuffer, ContextFrame};

fn frame(seq: u64) -> ContextFrame {
    ContextFrame {
        seq,
        intensity: seq as f64 / 100.0,
    }
}

#[test]
fn test_default_capacity_window() {
    let mut buffer = ContextBuffer::new(30);
    assert!(buffer.is_empty());
    assert_eq!(buffer.capacity(), 30);

    for seq in 1..=10 {
        buffer.push(frame(seq));
    }
    assert_eq!(buffer.len(), 10);

    let seqs: Vec<u64> = buffer.snapshot().iter().map(|f| f.seq).collect();
    assert_eq!(seqs, (1..=10).collect::<Vec<_>>(), "Snapshot must be oldest-first");
}

#[test]
fn test_overflow_keeps_last_capacity_frames() {
    let capacity = 30;
    let k = 17;
    let mut buffer = ContextBuffer::new(capacity);

    for seq in 1..=(capacity + k) as u64 {
        buffer.push(frame(seq));
        assert!(buffer.len() <= capacity, "Buffer must never exceed capacity");
    }

    let seqs: Vec<u64> = buffer.snapshot().iter().map(|f| f.seq).collect();
    let expected: Vec<u64> = ((k + 1) as u64..=(capacity + k) as u64).collect();
    assert_eq!(seqs, expected);
    assert_eq!(buffer.latest().unwrap().seq, (capacity + k) as u64);
}

#[test]
fn test_capacity_one() {
    let mut buffer = ContextBuffer::new(1);
    buffer.push(frame(1));
    buffer.push(frame(2));
    assert_eq!(buffer.len(), 1);
    assert_eq!(buffer.snapshot()[0].seq, 2);
}

#[test]
fn test_zero_capacity_is_always_empty() {
    let mut buffer = ContextBuffer::new(0);
    assert_eq!(buffer.capacity(), 0);

    for seq in 1..=5 {
        buffer.push(frame(seq));
    }

    assert!(buffer.is_empty());
    assert!(buffer.snapshot().is_empty());
    assert!(buffer.latest().is_none());
}

#[test]
fn test_snapshot_is_detached_from_buffer() {
    let mut buffer = ContextBuffer::new(3);
    buffer.push(frame(1));
    let before = buffer.snapshot();

    buffer.push(frame(2));
    buffer.push(frame(3));
    buffer.push(frame(4));

    // Earlier snapshot is unaffected by later pushes
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].seq, 1);
    assert_eq!(buffer.snapshot().iter().map(|f| f.seq).collect::<Vec<_>>(), vec![2, 3, 4]);
}

#[test]
fn test_frame_intensity_is_strongest_action() {
    let packet = common::packet(&[("Idle", 0.2), ("Cleaning", 0.65), ("Walking", 0.15)]);
    let frame = ContextFrame::from_packet(7, &packet);
    assert_eq!(frame.seq, 7);
    assert!((frame.intensity - 0.65).abs() < 1e-6);
}
