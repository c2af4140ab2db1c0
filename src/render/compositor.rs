use image::{Rgba, RgbaImage, imageops};

use crate::assets::store::MaterialStore;
use crate::composition::layered::{Layer, LayeredFrame};
use crate::composition::timeline::MultiTimeline;
use crate::effects::chroma::ChromaKey;
use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{GifweaveError, GifweaveResult};

/// Scale factors closer to 1.0 than this skip resampling entirely.
const SCALE_EPSILON: f32 = 0.001;

/// Render one layered frame onto a fresh canvas.
///
/// Layers composite bottom to top with the straight-alpha over operator.
/// Invisible layers and stale material references are skipped; a layer that
/// fails to render (degenerate scale/opacity from a hand-edited template) is
/// skipped with a warning and the frame is still produced.
pub fn composite_frame(
    frame: &LayeredFrame,
    store: &MaterialStore,
    canvas: Canvas,
    background: Rgba8,
) -> RgbaImage {
    composite_layers_with(&frame.layers, store, canvas, background, None)
}

/// [`composite_frame`] with an optional per-material chroma-key pass applied
/// before each layer's transform chain.
pub fn composite_layers_with(
    layers: &[Layer],
    store: &MaterialStore,
    canvas: Canvas,
    background: Rgba8,
    chroma: Option<&ChromaKey>,
) -> RgbaImage {
    let mut out = RgbaImage::from_pixel(canvas.width, canvas.height, Rgba(background.to_array()));

    for layer in layers {
        if !layer.visible {
            continue;
        }
        let Some(material) = store.get(layer.material) else {
            tracing::debug!(
                layer = %layer.name,
                material = layer.material,
                "skipping layer with unknown material"
            );
            continue;
        };
        match render_layer(layer, &material.image, chroma) {
            Ok(rendered) => {
                imageops::overlay(&mut out, &rendered, i64::from(layer.x), i64::from(layer.y));
            }
            Err(err) => {
                tracing::warn!(layer = %layer.name, error = %err, "skipping layer that failed to render");
            }
        }
    }

    out
}

/// Render one frame of a multi-timeline model.
///
/// Placements come from [`MultiTimeline::iter_frame_layers`] bottom to top.
/// When `canvas` is `None` the size defaults to the first material a filled
/// slot resolves to.
#[tracing::instrument(skip(model, store))]
pub fn composite_timeline_frame(
    model: &MultiTimeline,
    store: &MaterialStore,
    frame: usize,
    canvas: Option<Canvas>,
    background: Rgba8,
    chroma: Option<&ChromaKey>,
) -> GifweaveResult<RgbaImage> {
    let canvas = match canvas {
        Some(canvas) => canvas,
        None => default_timeline_canvas(model, store)?,
    };
    let mut out = RgbaImage::from_pixel(canvas.width, canvas.height, Rgba(background.to_array()));

    for (material_index, x, y) in model.iter_frame_layers(frame) {
        let Some(material) = store.get(material_index) else {
            tracing::debug!(material = material_index, "skipping slot with unknown material");
            continue;
        };
        let image = match chroma {
            Some(key) => key.apply(&material.image),
            None => material.image.clone(),
        };
        imageops::overlay(&mut out, &image, i64::from(x), i64::from(y));
    }

    Ok(out)
}

/// Native size of the first material any filled slot resolves to, scanning
/// frames in order. Fails when nothing resolves.
pub fn default_timeline_canvas(
    model: &MultiTimeline,
    store: &MaterialStore,
) -> GifweaveResult<Canvas> {
    for frame in 0..model.frame_count() {
        for (material_index, _, _) in model.iter_frame_layers(frame) {
            if let Some(material) = store.get(material_index) {
                let (width, height) = material.image.dimensions();
                return Canvas::new(width, height);
            }
        }
    }
    Err(GifweaveError::validation(
        "cannot derive a canvas size: no filled frame slot resolves to a material",
    ))
}

/// Crop, scale, then apply opacity; chroma runs first so keyed pixels never
/// reach the canvas.
fn render_layer(
    layer: &Layer,
    source: &RgbaImage,
    chroma: Option<&ChromaKey>,
) -> GifweaveResult<RgbaImage> {
    layer.validate()?;

    let mut image = match chroma {
        Some(key) => key.apply(source),
        None => source.clone(),
    };

    // A crop rect that misses the source entirely is skipped, keeping the
    // full image.
    if let Some(crop) = layer.crop
        && let Some((x, y, width, height)) = crop.clamped(image.width(), image.height())
    {
        image = imageops::crop_imm(&image, x, y, width, height).to_image();
    }

    if (layer.scale - 1.0).abs() > SCALE_EPSILON {
        let width = (image.width() as f32 * layer.scale).round() as u32;
        let height = (image.height() as f32 * layer.scale).round() as u32;
        if width > 0 && height > 0 {
            image = imageops::resize(&image, width, height, imageops::FilterType::Lanczos3);
        }
    }

    if layer.opacity < 1.0 {
        scale_alpha_in_place(&mut image, layer.opacity);
    }

    Ok(image)
}

fn scale_alpha_in_place(image: &mut RgbaImage, opacity: f32) {
    let op = ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16;
    let buf: &mut [u8] = image;
    for px in buf.chunks_exact_mut(4) {
        px[3] = mul_div255(u16::from(px[3]), op);
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
