use super::*;

#[test]
fn push_and_pattern_round_trip() {
    let mut seq = FrameSequence::new(50);
    seq.push(0);
    seq.push(1);
    seq.push_with_duration(0, 200);
    assert_eq!(seq.pattern(), vec![0, 1, 0]);
    assert_eq!(seq.durations(), vec![50, 50, 200]);
    assert_eq!(seq.total_duration_ms(), 300);
}

#[test]
fn insert_clamps_to_end() {
    let mut seq = FrameSequence::default();
    seq.push(0);
    seq.insert(99, 1);
    assert_eq!(seq.pattern(), vec![0, 1]);
    seq.insert(0, 2);
    assert_eq!(seq.pattern(), vec![2, 0, 1]);
}

#[test]
fn move_and_duplicate_are_index_addressed() {
    let mut seq = FrameSequence::default();
    seq.set_pattern(&[0, 1, 2]);
    seq.move_entry(0, 2).unwrap();
    assert_eq!(seq.pattern(), vec![1, 2, 0]);

    let copy = seq.duplicate(1).unwrap();
    assert_eq!(copy, 2);
    assert_eq!(seq.pattern(), vec![1, 2, 2, 0]);

    assert!(seq.move_entry(0, 9).is_err());
    assert!(seq.duplicate(9).is_err());
}

#[test]
fn remove_validates_position() {
    let mut seq = FrameSequence::default();
    seq.set_pattern(&[3, 4]);
    let removed = seq.remove(0).unwrap();
    assert_eq!(removed.material, 3);
    assert!(seq.remove(5).is_err());
}

#[test]
fn repeat_multiplies_whole_sequence() {
    let mut seq = FrameSequence::new(10);
    seq.set_pattern(&[0, 1]);
    seq.repeat(3).unwrap();
    assert_eq!(seq.pattern(), vec![0, 1, 0, 1, 0, 1]);
    assert!(seq.repeat(0).is_err());
}

#[test]
fn reverse_and_durations() {
    let mut seq = FrameSequence::new(10);
    seq.push_with_duration(0, 10);
    seq.push_with_duration(1, 20);
    seq.reverse();
    assert_eq!(seq.pattern(), vec![1, 0]);
    assert_eq!(seq.durations(), vec![20, 10]);

    seq.set_all_durations(75);
    assert_eq!(seq.durations(), vec![75, 75]);
}
