use super::*;

fn aligned(model: &MultiTimeline) -> bool {
    model
        .timelines()
        .iter()
        .all(|t| t.slots().len() == model.frame_count())
}

#[test]
fn new_model_starts_aligned() {
    let model = MultiTimeline::new("base", 3, 100);
    assert_eq!(model.frame_count(), 3);
    assert_eq!(model.timeline_count(), 1);
    assert_eq!(model.main_index(), 0);
    assert!(aligned(&model));
    assert!(model.timeline(0).unwrap().slots().iter().all(FrameSlot::is_empty));
}

#[test]
fn add_timeline_pads_to_timebase_length() {
    let mut model = MultiTimeline::new("base", 4, 100);
    let idx = model.add_timeline("");
    assert_eq!(idx, 1);
    assert_eq!(model.timeline(1).unwrap().name, "Timeline_2");
    assert!(aligned(&model));
}

#[test]
fn remove_timeline_refuses_last_and_clamps_main() {
    let mut model = MultiTimeline::new("a", 1, 100);
    assert!(model.remove_timeline(0).is_err());

    model.add_timeline("b");
    model.add_timeline("c");
    model.set_main_timeline(2);
    model.remove_timeline(2).unwrap();
    assert_eq!(model.main_index(), 1);
    assert!(model.remove_timeline(5).is_err());
}

#[test]
fn move_timeline_keeps_main_designation() {
    let mut model = MultiTimeline::new("a", 1, 100);
    model.add_timeline("b");
    model.add_timeline("c");

    // Main follows the moved timeline itself.
    model.set_main_timeline(0);
    model.move_timeline(0, 2).unwrap();
    assert_eq!(model.main_index(), 2);
    assert_eq!(model.main_timeline().name, "a");

    // Moving another timeline across the main shifts the index.
    model.move_timeline(2, 0).unwrap();
    assert_eq!(model.main_timeline().name, "a");
    assert_eq!(model.main_index(), 0);
}

#[test]
fn set_main_timeline_ignores_out_of_range() {
    let mut model = MultiTimeline::new("a", 1, 100);
    model.add_timeline("b");
    model.set_main_timeline(1);
    model.set_main_timeline(9);
    assert_eq!(model.main_index(), 1);
}

#[test]
fn timebase_add_and_insert_propagate_to_every_timeline() {
    let mut model = MultiTimeline::new("a", 0, 100);
    model.add_timeline("b");

    model.add_timebase_frames(2, None);
    assert_eq!(model.durations(), &[100, 100]);
    assert!(aligned(&model));

    model.insert_timebase_frames(1, 1, Some(40));
    assert_eq!(model.durations(), &[100, 40, 100]);
    assert!(aligned(&model));

    // Clamped insert position appends.
    model.insert_timebase_frames(99, 1, Some(70));
    assert_eq!(model.durations(), &[100, 40, 100, 70]);
    assert!(aligned(&model));

    model.add_timebase_frames(0, None);
    assert_eq!(model.frame_count(), 4);
}

#[test]
fn remove_timebase_frames_handles_unsorted_and_stale_positions() {
    let mut model = MultiTimeline::new("a", 5, 100);
    model.add_timeline("b");
    for i in 0..5 {
        model.set_timebase_duration(i, (i as u32 + 1) * 10).unwrap();
    }

    model.remove_timebase_frames(&[0, 3, 3, 42]);
    assert_eq!(model.durations(), &[20, 30, 50]);
    assert!(aligned(&model));
}

#[test]
fn move_and_duplicate_timebase_frames_carry_slots() {
    let mut model = MultiTimeline::new("a", 3, 100);
    model.set_slot(0, 0, FrameSlot::filled(7, 1, 2)).unwrap();
    model.set_timebase_duration(0, 10).unwrap();

    model.move_timebase_frame(0, 2);
    assert_eq!(model.durations(), &[100, 100, 10]);
    assert_eq!(model.slot(0, 2), Some(&FrameSlot::filled(7, 1, 2)));
    assert!(model.slot(0, 0).unwrap().is_empty());

    // Out-of-range move is a no-op.
    model.move_timebase_frame(0, 9);
    assert_eq!(model.frame_count(), 3);

    model.duplicate_timebase_frame(2).unwrap();
    assert_eq!(model.durations(), &[100, 100, 10, 10]);
    assert_eq!(model.slot(0, 3), Some(&FrameSlot::filled(7, 1, 2)));
    assert!(aligned(&model));
    assert!(model.duplicate_timebase_frame(9).is_err());
}

#[test]
fn ensure_timeline_length_pads_with_empty() {
    let mut model = MultiTimeline::new("a", 2, 100);
    model.ensure_timeline_length(0, 6).unwrap();
    assert_eq!(model.timeline(0).unwrap().slots().len(), 6);
    // Never truncates.
    model.ensure_timeline_length(0, 1).unwrap();
    assert_eq!(model.timeline(0).unwrap().slots().len(), 6);
    assert!(model.ensure_timeline_length(3, 1).is_err());
}

#[test]
fn iter_frame_layers_applies_timeline_offsets_bottom_to_top() {
    let mut model = MultiTimeline::new("bottom", 1, 100);
    model.add_timeline("top");
    model.set_timeline_offset(0, 1, 2).unwrap();
    model.set_slot(0, 0, FrameSlot::filled(0, 5, 6)).unwrap();
    model.set_slot(1, 0, FrameSlot::filled(1, 7, 8)).unwrap();

    let layers = model.iter_frame_layers(0);
    assert_eq!(layers, vec![(0, 6, 8), (1, 7, 8)]);

    // Empty slots and out-of-range frames yield nothing.
    assert!(model.iter_frame_layers(5).is_empty());
}

#[test]
fn slot_accessors_validate_indices() {
    let mut model = MultiTimeline::new("a", 1, 100);
    assert!(model.set_slot(0, 5, FrameSlot::Empty).is_err());
    assert!(model.set_slot(3, 0, FrameSlot::Empty).is_err());
    assert!(model.slot(0, 5).is_none());

    model.set_slot(0, 0, FrameSlot::filled(2, 0, 0)).unwrap();
    model.clear_slot(0, 0).unwrap();
    assert!(model.slot(0, 0).unwrap().is_empty());
}

#[test]
fn durations_and_max_referenced_material() {
    let mut model = MultiTimeline::new("a", 2, 100);
    model.add_timeline("b");
    model.set_slot(0, 0, FrameSlot::filled(3, 0, 0)).unwrap();
    model.set_slot(1, 1, FrameSlot::filled(9, 0, 0)).unwrap();

    assert_eq!(model.max_referenced_material(), Some(9));
    model.set_all_durations(25);
    assert_eq!(model.total_duration_ms(), 50);

    let empty = MultiTimeline::new("x", 2, 100);
    assert_eq!(empty.max_referenced_material(), None);
}
