use super::*;

use crate::template::document::parse_template_str;

fn sample_model() -> MultiTimeline {
    let mut model = MultiTimeline::new("base", 3, 100);
    model.set_timebase_duration(1, 200).unwrap();
    model.set_timebase_duration(2, 300).unwrap();
    model.add_timeline("overlay");
    model.set_timeline_offset(1, 6, 8).unwrap();
    model.set_slot(0, 0, FrameSlot::filled(0, 1, 2)).unwrap();
    model.set_slot(1, 2, FrameSlot::filled(1, -3, 4)).unwrap();
    model.set_main_timeline(1);
    model
}

#[test]
fn multi_export_apply_reproduces_the_model() {
    let model = sample_model();
    let doc = export_multi(&model, TemplateSettings::default());

    let TemplateDocument::MultiTimeline(doc) = doc else {
        panic!("expected multi-timeline document");
    };
    assert_eq!(doc.version, TEMPLATE_VERSION);
    assert_eq!(doc.format, "multi_timeline");
    assert_eq!(doc.timebase.durations_ms, vec![100, 200, 300]);
    assert_eq!(doc.main_timeline_index, 1);

    let (rebuilt, settings) = apply_multi(&doc, None).unwrap();
    assert_eq!(rebuilt, model);
    assert_eq!(settings, TemplateSettings::default());
}

#[test]
fn apply_multi_remaps_material_indices() {
    let doc = export_multi(&sample_model(), TemplateSettings::default());
    let TemplateDocument::MultiTimeline(doc) = doc else {
        panic!("expected multi-timeline document");
    };

    let mapping = HashMap::from([(0usize, 5usize)]);
    let (rebuilt, _) = apply_multi(&doc, Some(&mapping)).unwrap();

    // Mapped index moves, unmapped index falls through unchanged.
    assert_eq!(rebuilt.slot(0, 0), Some(&FrameSlot::filled(5, 1, 2)));
    assert_eq!(rebuilt.slot(1, 2), Some(&FrameSlot::filled(1, -3, 4)));
}

#[test]
fn apply_multi_pads_and_truncates_slot_lists() {
    let doc = MultiTimelineDocument {
        version: TEMPLATE_VERSION.to_string(),
        format: String::from("multi_timeline"),
        settings: TemplateSettings::default(),
        timebase: TimebaseSection {
            durations_ms: vec![100, 100],
        },
        main_timeline_index: 0,
        timelines: vec![
            TimelineSection {
                name: String::from("long"),
                offset_x: 0,
                offset_y: 0,
                // Two entries past the timebase get dropped.
                frames: vec![
                    Some(SlotEntry {
                        material_index: 0,
                        x: 0,
                        y: 0,
                    }),
                    None,
                    Some(SlotEntry {
                        material_index: 9,
                        x: 0,
                        y: 0,
                    }),
                    None,
                ],
            },
            TimelineSection {
                name: String::from("short"),
                offset_x: 0,
                offset_y: 0,
                frames: vec![],
            },
        ],
    };

    let (model, _) = apply_multi(&doc, None).unwrap();
    assert_eq!(model.frame_count(), 2);
    assert_eq!(model.timeline_count(), 2);
    assert_eq!(model.slot(0, 0), Some(&FrameSlot::filled(0, 0, 0)));
    assert_eq!(model.slot(0, 1), Some(&FrameSlot::Empty));
    // The short timeline is padded with empty slots up to the timebase.
    assert_eq!(model.slot(1, 0), Some(&FrameSlot::Empty));
    assert_eq!(model.slot(1, 1), Some(&FrameSlot::Empty));
    assert_eq!(model.max_referenced_material(), Some(0));
}

#[test]
fn out_of_range_main_index_is_ignored_on_apply() {
    let doc = export_multi(&sample_model(), TemplateSettings::default());
    let TemplateDocument::MultiTimeline(mut doc) = doc else {
        panic!("expected multi-timeline document");
    };
    doc.main_timeline_index = 99;

    let (model, _) = apply_multi(&doc, None).unwrap();
    assert_eq!(model.main_index(), 0);
}

#[test]
fn layered_export_apply_reproduces_the_sequence() {
    let mut sequence = LayeredSequence::new();
    sequence.add_frame("intro", Some(120));
    sequence.add_frame("", None);
    {
        let frame = sequence.frame_mut(0).unwrap();
        frame.add_layer(
            Layer::new(0)
                .with_position(4, -2)
                .with_crop(CropRect::new(1, 1, 8, 8))
                .with_name("bg"),
        );
        frame.add_layer(
            Layer::new(1)
                .with_scale(0.5)
                .with_opacity(0.25)
                .with_visible(false),
        );
    }

    let settings = TemplateSettings {
        material_count: Some(2),
        ..Default::default()
    };
    let doc = export_layered(&sequence, settings);
    let TemplateDocument::Layered(doc) = doc else {
        panic!("expected layered document");
    };
    assert_eq!(doc.frames.len(), 2);
    assert_eq!(doc.frames[0].layers[0].crop_width, Some(8));
    assert_eq!(doc.frames[0].layers[1].crop_width, None);

    let (rebuilt, settings) = apply_layered(&doc, None);
    assert_eq!(rebuilt, sequence);
    assert_eq!(settings.material_count, Some(2));
}

#[test]
fn apply_layered_remaps_and_requires_both_crop_extents() {
    let doc = parse_template_str(
        r#"{
            "version": "1.0",
            "frames": [{
                "duration": 90,
                "layers": [
                    {"material_index": 0, "crop_x": 2, "crop_width": 5},
                    {"material_index": 1, "crop_x": 2, "crop_width": 5, "crop_height": 6}
                ]
            }]
        }"#,
    )
    .unwrap();
    let TemplateDocument::Layered(doc) = doc else {
        panic!("expected layered document");
    };

    let mapping = HashMap::from([(1usize, 3usize)]);
    let (sequence, _) = apply_layered(&doc, Some(&mapping));

    let frame = sequence.frame(0).unwrap();
    assert_eq!(frame.layers[0].material, 0);
    // Width without height is not a crop.
    assert_eq!(frame.layers[0].crop, None);
    assert_eq!(frame.layers[1].material, 3);
    assert_eq!(frame.layers[1].crop, Some(CropRect::new(2, 0, 5, 6)));
    assert_eq!(frame.duration_ms, 90);
}

#[test]
fn encode_config_reflects_template_settings() {
    let settings = TemplateSettings {
        output_width: 48,
        output_height: 24,
        loop_count: 4,
        transparent_bg: true,
        material_count: None,
        color_count: 64,
    };
    let config = encode_config_from(&settings).unwrap();
    assert_eq!(config.size, Some(Canvas::new(48, 24).unwrap()));
    assert!(config.background.is_transparent());
    assert_eq!(config.loop_count, 4);
    assert_eq!(config.palette_size, 64);

    let bad = TemplateSettings {
        color_count: 1,
        ..settings
    };
    assert!(encode_config_from(&bad).is_err());
}
