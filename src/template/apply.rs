use std::collections::HashMap;

use crate::{
    assets::loader::DEFAULT_FRAME_DURATION_MS,
    composition::{
        layered::{CropRect, Layer, LayeredSequence},
        timeline::{FrameSlot, MultiTimeline},
    },
    encode::gif::GifEncodeConfig,
    foundation::{
        core::{Canvas, Rgba8},
        error::GifweaveResult,
    },
    template::document::{
        FrameEntry, LayerEntry, LayeredDocument, MultiTimelineDocument, SlotEntry,
        TEMPLATE_VERSION, TemplateDocument, TemplateSettings, TimebaseSection, TimelineSection,
    },
};

/// Snapshots a multi-timeline model as a versioned template document.
pub fn export_multi(model: &MultiTimeline, mut settings: TemplateSettings) -> TemplateDocument {
    // Declared material counts belong to legacy documents only.
    settings.material_count = None;

    let timelines = model
        .timelines()
        .iter()
        .map(|timeline| TimelineSection {
            name: timeline.name.clone(),
            offset_x: timeline.offset_x,
            offset_y: timeline.offset_y,
            frames: timeline
                .slots()
                .iter()
                .map(|slot| match slot {
                    FrameSlot::Empty => None,
                    FrameSlot::Filled { material, x, y } => Some(SlotEntry {
                        material_index: *material,
                        x: *x,
                        y: *y,
                    }),
                })
                .collect(),
        })
        .collect();

    TemplateDocument::MultiTimeline(MultiTimelineDocument {
        version: TEMPLATE_VERSION.to_string(),
        format: String::from("multi_timeline"),
        settings,
        timebase: TimebaseSection {
            durations_ms: model.durations().to_vec(),
        },
        main_timeline_index: model.main_index(),
        timelines,
    })
}

/// Snapshots a layered sequence as a legacy-format template document.
pub fn export_layered(sequence: &LayeredSequence, settings: TemplateSettings) -> TemplateDocument {
    let frames = sequence
        .frames()
        .iter()
        .enumerate()
        .map(|(frame_index, frame)| FrameEntry {
            index: frame_index,
            duration: frame.duration_ms,
            name: frame.name.clone(),
            layers: frame
                .layers
                .iter()
                .enumerate()
                .map(|(layer_index, layer)| LayerEntry {
                    index: layer_index,
                    material_index: layer.material,
                    name: layer.name.clone(),
                    x: layer.x,
                    y: layer.y,
                    crop_x: layer.crop.map(|c| c.x).unwrap_or(0),
                    crop_y: layer.crop.map(|c| c.y).unwrap_or(0),
                    crop_width: layer.crop.map(|c| c.width),
                    crop_height: layer.crop.map(|c| c.height),
                    scale: layer.scale,
                    opacity: layer.opacity,
                    visible: layer.visible,
                })
                .collect(),
        })
        .collect();

    TemplateDocument::Layered(LayeredDocument {
        version: TEMPLATE_VERSION.to_string(),
        settings,
        frames,
    })
}

/// Rebuilds a fresh multi-timeline model from a document.
///
/// Material indices pass through `mapping` with identity fallback per index.
/// Each timeline's slot list is truncated or padded (with empty slots) to the
/// document's own timebase length.
pub fn apply_multi(
    document: &MultiTimelineDocument,
    mapping: Option<&HashMap<usize, usize>>,
) -> GifweaveResult<(MultiTimeline, TemplateSettings)> {
    let frame_count = document.timebase.durations_ms.len();
    let first_name = document
        .timelines
        .first()
        .map(|t| t.name.clone())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| String::from("Timeline_1"));

    let mut model = MultiTimeline::new(first_name, frame_count, DEFAULT_FRAME_DURATION_MS);
    for (position, &duration) in document.timebase.durations_ms.iter().enumerate() {
        model.set_timebase_duration(position, duration)?;
    }

    for (index, section) in document.timelines.iter().enumerate() {
        let timeline_index = if index == 0 {
            0
        } else {
            model.add_timeline(section.name.clone())
        };
        model.set_timeline_offset(timeline_index, section.offset_x, section.offset_y)?;

        for (frame, slot) in section.frames.iter().take(frame_count).enumerate() {
            if let Some(entry) = slot {
                let material = remap(entry.material_index, mapping);
                model.set_slot(
                    timeline_index,
                    frame,
                    FrameSlot::filled(material, entry.x, entry.y),
                )?;
            }
        }
    }

    model.set_main_timeline(document.main_timeline_index);

    Ok((model, document.settings.clone()))
}

/// Rebuilds a fresh layered sequence from a legacy document.
///
/// Material indices pass through `mapping` with identity fallback per index;
/// a crop is reconstructed only when both extents are present on the wire.
pub fn apply_layered(
    document: &LayeredDocument,
    mapping: Option<&HashMap<usize, usize>>,
) -> (LayeredSequence, TemplateSettings) {
    let mut sequence = LayeredSequence::new();

    for entry in &document.frames {
        let position = sequence.add_frame(entry.name.clone(), Some(entry.duration));
        let Some(frame) = sequence.frame_mut(position) else {
            continue;
        };
        for layer_entry in &entry.layers {
            let mut layer = Layer::new(remap(layer_entry.material_index, mapping))
                .with_position(layer_entry.x, layer_entry.y)
                .with_scale(layer_entry.scale)
                .with_opacity(layer_entry.opacity)
                .with_visible(layer_entry.visible)
                .with_name(layer_entry.name.clone());
            if let (Some(width), Some(height)) = (layer_entry.crop_width, layer_entry.crop_height)
            {
                layer = layer.with_crop(CropRect::new(
                    layer_entry.crop_x,
                    layer_entry.crop_y,
                    width,
                    height,
                ));
            }
            frame.add_layer(layer);
        }
    }

    (sequence, document.settings.clone())
}

/// Encoder configuration for a template's render settings.
pub fn encode_config_from(settings: &TemplateSettings) -> GifweaveResult<GifEncodeConfig> {
    let background = if settings.transparent_bg {
        Rgba8::transparent()
    } else {
        Rgba8::WHITE
    };
    let config = GifEncodeConfig {
        size: Some(Canvas::new(settings.output_width, settings.output_height)?),
        background,
        loop_count: settings.loop_count,
        palette_size: settings.color_count,
        chroma_key: None,
    };
    config.validate()?;
    Ok(config)
}

fn remap(index: usize, mapping: Option<&HashMap<usize, usize>>) -> usize {
    mapping.and_then(|m| m.get(&index).copied()).unwrap_or(index)
}

#[cfg(test)]
#[path = "../../tests/unit/template/apply.rs"]
mod tests;
