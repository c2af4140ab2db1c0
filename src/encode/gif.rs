use std::{borrow::Cow, io::BufWriter, path::Path};

use anyhow::Context as _;
use color_quant::NeuQuant;
use image::{RgbaImage, imageops};

use crate::{
    assets::{loader, store::MaterialStore},
    composition::{layered::LayeredFrame, sequence::FrameSequence, timeline::MultiTimeline},
    effects::chroma::ChromaKey,
    foundation::{
        core::{Canvas, Rgba8},
        error::{GifweaveError, GifweaveResult},
    },
    render::compositor,
};

/// Pixels with alpha below this survive a transparent export as the reserved
/// palette index; everything at or above it is quantized normally.
pub const ALPHA_THRESHOLD: u8 = 128;

/// NeuQuant sampling factor (1 = slowest/best, 30 = fastest/worst).
const QUANT_SAMPLE_FACTOR: i32 = 10;

/// Settings for one GIF export.
///
/// A `background` with alpha 0 switches the export into transparent mode:
/// frames keep their alpha channel, one palette slot is reserved as the
/// transparency index, and nothing is flattened onto a solid color.
#[derive(Clone, Debug)]
pub struct GifEncodeConfig {
    /// Output size. `None` keeps each frame at its native size.
    pub size: Option<Canvas>,
    pub background: Rgba8,
    /// Number of animation loops, 0 means loop forever.
    pub loop_count: u16,
    /// Palette entries per frame, 2..=256.
    pub palette_size: u16,
    pub chroma_key: Option<ChromaKey>,
}

impl Default for GifEncodeConfig {
    fn default() -> Self {
        Self {
            size: None,
            background: Rgba8::WHITE,
            loop_count: 0,
            palette_size: 256,
            chroma_key: None,
        }
    }
}

impl GifEncodeConfig {
    pub fn validate(&self) -> GifweaveResult<()> {
        if let Some(size) = self.size
            && (size.width == 0 || size.height == 0)
        {
            return Err(GifweaveError::validation(
                "output width/height must be non-zero",
            ));
        }
        if !(2..=256).contains(&self.palette_size) {
            return Err(GifweaveError::validation(format!(
                "palette size must be between 2 and 256, got {}",
                self.palette_size
            )));
        }
        Ok(())
    }

    pub fn with_size(mut self, size: Canvas) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_background(mut self, background: Rgba8) -> Self {
        self.background = background;
        self
    }

    pub fn with_loop_count(mut self, loop_count: u16) -> Self {
        self.loop_count = loop_count;
        self
    }

    pub fn with_palette_size(mut self, palette_size: u16) -> Self {
        self.palette_size = palette_size;
        self
    }

    pub fn with_chroma_key(mut self, key: ChromaKey) -> Self {
        self.chroma_key = Some(key);
        self
    }
}

/// Summary of an existing GIF file, as read back from disk.
#[derive(Clone, Debug, serde::Serialize)]
pub struct GifInfo {
    pub frame_count: usize,
    pub size: Canvas,
    pub total_duration_ms: u32,
    /// 0 means loop forever.
    pub loop_count: u16,
    pub has_transparency: bool,
    /// Entries in the global color table, or the largest local table when no
    /// global one is present.
    pub color_table_size: usize,
    pub file_size_bytes: u64,
}

/// One quantized frame ready for container writing.
struct IndexedFrame {
    width: u16,
    height: u16,
    pixels: Vec<u8>,
    palette: Vec<u8>,
    transparent: Option<u8>,
}

/// Turns composed RGBA frames into palette-indexed animated GIFs.
pub struct GifEncoder {
    config: GifEncodeConfig,
}

impl GifEncoder {
    pub fn new(config: GifEncodeConfig) -> GifweaveResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GifEncodeConfig {
        &self.config
    }

    /// Fits a source image into the configured output canvas.
    ///
    /// Oversized images shrink to fit while preserving aspect ratio, smaller
    /// images are never enlarged; either way the result is centered on a
    /// background-filled canvas. Without a configured size the image passes
    /// through unchanged.
    pub fn prepare_frame(&self, image: &RgbaImage) -> RgbaImage {
        let Some(size) = self.config.size else {
            return image.clone();
        };

        let (src_w, src_h) = image.dimensions();
        let fitted = if src_w > size.width || src_h > size.height {
            let ratio = (f64::from(size.width) / f64::from(src_w))
                .min(f64::from(size.height) / f64::from(src_h));
            let w = ((f64::from(src_w) * ratio).round() as u32).clamp(1, size.width);
            let h = ((f64::from(src_h) * ratio).round() as u32).clamp(1, size.height);
            Cow::Owned(imageops::resize(image, w, h, imageops::FilterType::Lanczos3))
        } else {
            Cow::Borrowed(image)
        };

        let mut canvas = RgbaImage::from_pixel(
            size.width,
            size.height,
            image::Rgba(self.config.background.to_array()),
        );
        let x = (i64::from(size.width) - i64::from(fitted.width())) / 2;
        let y = (i64::from(size.height) - i64::from(fitted.height())) / 2;
        imageops::overlay(&mut canvas, fitted.as_ref(), x, y);
        canvas
    }

    /// Encodes a simple sequence, one material per frame.
    ///
    /// A sequence entry pointing at a missing material is an error here
    /// (unlike previews, which skip silently).
    pub fn build_from_sequence(
        &self,
        store: &MaterialStore,
        sequence: &FrameSequence,
        path: &Path,
    ) -> GifweaveResult<()> {
        if sequence.is_empty() {
            return Err(GifweaveError::validation(
                "sequence is empty, nothing to encode",
            ));
        }
        if store.is_empty() {
            return Err(GifweaveError::validation(
                "material store is empty, nothing to encode",
            ));
        }

        let mut frames = Vec::with_capacity(sequence.len());
        let mut durations = Vec::with_capacity(sequence.len());
        for entry in sequence.entries() {
            let material = store.get(entry.material).ok_or_else(|| {
                GifweaveError::validation(format!(
                    "material index {} does not exist",
                    entry.material
                ))
            })?;
            frames.push(self.prepare_frame(&self.keyed(&material.image)));
            durations.push(entry.duration_ms);
        }

        self.save(&frames, &durations, path)
    }

    /// Composites layered frames and encodes them.
    ///
    /// Without a configured output size the canvas defaults to the first
    /// resolvable material's native size.
    pub fn build_from_layered(
        &self,
        store: &MaterialStore,
        frames: &[LayeredFrame],
        path: &Path,
    ) -> GifweaveResult<()> {
        if frames.is_empty() {
            return Err(GifweaveError::validation(
                "frame list is empty, nothing to encode",
            ));
        }

        let canvas = match self.config.size {
            Some(size) => size,
            None => default_layered_canvas(frames, store)?,
        };

        let mut rendered = Vec::with_capacity(frames.len());
        let mut durations = Vec::with_capacity(frames.len());
        for frame in frames {
            rendered.push(compositor::composite_layers_with(
                &frame.layers,
                store,
                canvas,
                self.config.background,
                self.config.chroma_key.as_ref(),
            ));
            durations.push(frame.duration_ms);
        }

        self.save(&rendered, &durations, path)
    }

    /// Composites every timebase frame of a multi-timeline model and encodes
    /// them.
    pub fn build_from_timeline(
        &self,
        store: &MaterialStore,
        model: &MultiTimeline,
        path: &Path,
    ) -> GifweaveResult<()> {
        if model.frame_count() == 0 {
            return Err(GifweaveError::validation(
                "timeline has no frames, nothing to encode",
            ));
        }

        let mut rendered = Vec::with_capacity(model.frame_count());
        for frame in 0..model.frame_count() {
            rendered.push(compositor::composite_timeline_frame(
                model,
                store,
                frame,
                self.config.size,
                self.config.background,
                self.config.chroma_key.as_ref(),
            )?);
        }

        self.save(&rendered, model.durations(), path)
    }

    /// Encodes pre-composed images directly, pairing each with a duration.
    pub fn build_from_images(
        &self,
        images: &[RgbaImage],
        durations_ms: &[u32],
        path: &Path,
    ) -> GifweaveResult<()> {
        if images.is_empty() {
            return Err(GifweaveError::validation(
                "image list is empty, nothing to encode",
            ));
        }
        if images.len() != durations_ms.len() {
            return Err(GifweaveError::validation(format!(
                "image count {} does not match duration count {}",
                images.len(),
                durations_ms.len()
            )));
        }

        let frames: Vec<RgbaImage> = images.iter().map(|img| self.prepare_frame(img)).collect();
        self.save(&frames, durations_ms, path)
    }

    /// Composed `(frame, duration_ms)` pairs for a sequence, without
    /// encoding. Entries whose material is gone are skipped.
    pub fn preview_sequence(
        &self,
        store: &MaterialStore,
        sequence: &FrameSequence,
    ) -> Vec<(RgbaImage, u32)> {
        let mut frames = Vec::new();
        for entry in sequence.entries() {
            let Some(material) = store.get(entry.material) else {
                continue;
            };
            frames.push((
                self.prepare_frame(&self.keyed(&material.image)),
                entry.duration_ms,
            ));
        }
        frames
    }

    /// Composed `(frame, duration_ms)` pairs for layered frames, without
    /// encoding.
    pub fn preview_layered(
        &self,
        store: &MaterialStore,
        frames: &[LayeredFrame],
    ) -> GifweaveResult<Vec<(RgbaImage, u32)>> {
        if frames.is_empty() {
            return Ok(Vec::new());
        }

        let canvas = match self.config.size {
            Some(size) => size,
            None => default_layered_canvas(frames, store)?,
        };

        Ok(frames
            .iter()
            .map(|frame| {
                (
                    compositor::composite_layers_with(
                        &frame.layers,
                        store,
                        canvas,
                        self.config.background,
                        self.config.chroma_key.as_ref(),
                    ),
                    frame.duration_ms,
                )
            })
            .collect())
    }

    /// Composed `(frame, duration_ms)` pairs for a multi-timeline model,
    /// without encoding.
    pub fn preview_timeline(
        &self,
        store: &MaterialStore,
        model: &MultiTimeline,
    ) -> GifweaveResult<Vec<(RgbaImage, u32)>> {
        let mut frames = Vec::with_capacity(model.frame_count());
        for frame in 0..model.frame_count() {
            let image = compositor::composite_timeline_frame(
                model,
                store,
                frame,
                self.config.size,
                self.config.background,
                self.config.chroma_key.as_ref(),
            )?;
            frames.push((image, model.durations()[frame]));
        }
        Ok(frames)
    }

    /// Quantizes and writes frames as an animated GIF.
    ///
    /// Durations are per frame in milliseconds; the container stores them as
    /// centiseconds with a minimum of 1. Every frame carries its own local
    /// palette and restore-to-background disposal.
    #[tracing::instrument(skip(self, frames, durations_ms))]
    pub fn save(&self, frames: &[RgbaImage], durations_ms: &[u32], path: &Path) -> GifweaveResult<()> {
        if frames.is_empty() {
            return Err(GifweaveError::validation(
                "frame list is empty, nothing to encode",
            ));
        }
        if frames.len() != durations_ms.len() {
            return Err(GifweaveError::validation(format!(
                "frame count {} does not match duration count {}",
                frames.len(),
                durations_ms.len()
            )));
        }

        let mut indexed = Vec::with_capacity(frames.len());
        for image in frames {
            indexed.push(self.quantize_frame(image)?);
        }

        ensure_parent_dir(path)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create output file '{}'", path.display()))?;
        let mut encoder = gif::Encoder::new(
            BufWriter::new(file),
            indexed[0].width,
            indexed[0].height,
            &[],
        )
        .context("failed to write gif header")?;

        let repeat = if self.config.loop_count == 0 {
            gif::Repeat::Infinite
        } else {
            gif::Repeat::Finite(self.config.loop_count)
        };
        encoder
            .set_repeat(repeat)
            .context("failed to write gif loop extension")?;

        for (data, &duration) in indexed.into_iter().zip(durations_ms) {
            let mut frame = gif::Frame::default();
            frame.delay = (duration / 10).clamp(1, u32::from(u16::MAX)) as u16;
            frame.dispose = gif::DisposalMethod::Background;
            frame.transparent = data.transparent;
            frame.width = data.width;
            frame.height = data.height;
            frame.palette = Some(data.palette);
            frame.buffer = Cow::Owned(data.pixels);
            encoder
                .write_frame(&frame)
                .context("failed to write gif frame")?;
        }

        Ok(())
    }

    fn keyed(&self, image: &RgbaImage) -> RgbaImage {
        match &self.config.chroma_key {
            Some(key) => key.apply(image),
            None => image.clone(),
        }
    }

    fn quantize_frame(&self, image: &RgbaImage) -> GifweaveResult<IndexedFrame> {
        if image.width() == 0 || image.height() == 0 {
            return Err(GifweaveError::validation("cannot encode an empty frame"));
        }
        let width = dim_to_u16(image.width())?;
        let height = dim_to_u16(image.height())?;

        if self.config.background.is_transparent() {
            Ok(self.quantize_transparent(image, width, height))
        } else {
            Ok(self.quantize_opaque(image, width, height))
        }
    }

    /// Opaque export: flatten onto the background color, then quantize the
    /// result with every palette slot available.
    fn quantize_opaque(&self, image: &RgbaImage, width: u16, height: u16) -> IndexedFrame {
        let flat = flatten_rgba(image, self.config.background);
        let quant = NeuQuant::new(
            QUANT_SAMPLE_FACTOR,
            usize::from(self.config.palette_size),
            &flat,
        );
        let pixels = flat
            .chunks_exact(4)
            .map(|px| quant.index_of(px) as u8)
            .collect();

        IndexedFrame {
            width,
            height,
            pixels,
            palette: quant.color_map_rgb(),
            transparent: None,
        }
    }

    /// Transparent export: quantize with one palette slot held back, send
    /// low-alpha pixels to that reserved index and record it as the frame's
    /// transparency index.
    fn quantize_transparent(&self, image: &RgbaImage, width: u16, height: u16) -> IndexedFrame {
        let mut opaque = image.as_raw().clone();
        for px in opaque.chunks_exact_mut(4) {
            px[3] = 255;
        }

        let reserved = (self.config.palette_size - 1) as u8;
        let quant = NeuQuant::new(
            QUANT_SAMPLE_FACTOR,
            usize::from(self.config.palette_size) - 1,
            &opaque,
        );

        let pixels = image
            .as_raw()
            .chunks_exact(4)
            .zip(opaque.chunks_exact(4))
            .map(|(src, norm)| {
                if src[3] < ALPHA_THRESHOLD {
                    reserved
                } else {
                    quant.index_of(norm) as u8
                }
            })
            .collect();

        let mut palette = quant.color_map_rgb();
        palette.resize(usize::from(self.config.palette_size) * 3, 0);

        IndexedFrame {
            width,
            height,
            pixels,
            palette,
            transparent: Some(reserved),
        }
    }
}

/// Reads summary information back from a GIF file on disk.
pub fn read_gif_info(path: &Path) -> GifweaveResult<GifInfo> {
    let file_size_bytes = std::fs::metadata(path)
        .with_context(|| format!("failed to read metadata for '{}'", path.display()))?
        .len();
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open '{}'", path.display()))?;

    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = options
        .read_info(std::io::BufReader::new(file))
        .context("failed to parse gif stream")?;

    let size = Canvas::new(u32::from(decoder.width()), u32::from(decoder.height()))?;
    let global_palette_len = decoder.global_palette().map(|p| p.len() / 3);

    let mut frame_count = 0usize;
    let mut total_duration_ms = 0u32;
    let mut has_transparency = false;
    let mut local_palette_len = 0usize;
    while let Some(frame) = decoder
        .read_next_frame()
        .context("failed to decode gif frame")?
    {
        frame_count += 1;
        total_duration_ms += u32::from(frame.delay) * 10;
        has_transparency |= frame.transparent.is_some();
        if let Some(palette) = &frame.palette {
            local_palette_len = local_palette_len.max(palette.len() / 3);
        }
    }

    let loop_count = match decoder.repeat() {
        gif::Repeat::Infinite => 0,
        gif::Repeat::Finite(n) => n,
    };

    Ok(GifInfo {
        frame_count,
        size,
        total_duration_ms,
        loop_count,
        has_transparency,
        color_table_size: global_palette_len.unwrap_or(local_palette_len),
        file_size_bytes,
    })
}

/// Re-samples every frame of an existing GIF by `scale_factor`, preserving
/// per-frame durations, loop count and transparency mode.
pub fn resize_gif(input: &Path, output: &Path, scale_factor: f32) -> GifweaveResult<()> {
    if !scale_factor.is_finite() || scale_factor <= 0.0 {
        return Err(GifweaveError::validation(format!(
            "scale factor must be positive and finite, got {scale_factor}"
        )));
    }

    let info = read_gif_info(input)?;
    let frames = loader::load_animation_frames(input)?;

    let mut resized = Vec::with_capacity(frames.len());
    let mut durations = Vec::with_capacity(frames.len());
    for (image, duration) in frames {
        let width = ((f64::from(image.width()) * f64::from(scale_factor)).round() as u32).max(1);
        let height = ((f64::from(image.height()) * f64::from(scale_factor)).round() as u32).max(1);
        resized.push(imageops::resize(
            &image,
            width,
            height,
            imageops::FilterType::Lanczos3,
        ));
        durations.push(duration);
    }

    let background = if info.has_transparency {
        Rgba8::transparent()
    } else {
        Rgba8::WHITE
    };
    let config = GifEncodeConfig {
        size: None,
        background,
        loop_count: info.loop_count,
        palette_size: (info.color_table_size as u16).clamp(2, 256),
        chroma_key: None,
    };
    GifEncoder::new(config)?.save(&resized, &durations, output)
}

pub fn ensure_parent_dir(path: &Path) -> GifweaveResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

fn default_layered_canvas(frames: &[LayeredFrame], store: &MaterialStore) -> GifweaveResult<Canvas> {
    for frame in frames {
        for layer in &frame.layers {
            if let Some(material) = store.get(layer.material) {
                let (width, height) = material.image.dimensions();
                return Canvas::new(width, height);
            }
        }
    }
    Err(GifweaveError::validation(
        "cannot infer an output size, no layer references a loaded material",
    ))
}

/// Straight-alpha composite of every pixel onto an opaque background color.
fn flatten_rgba(image: &RgbaImage, background: Rgba8) -> Vec<u8> {
    let bg = [
        u16::from(background.r),
        u16::from(background.g),
        u16::from(background.b),
    ];
    let mut flat = image.as_raw().clone();
    for px in flat.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a < 255 {
            let inv = 255 - a;
            for c in 0..3 {
                px[c] = (mul_div255(u16::from(px[c]), a) + mul_div255(bg[c], inv)).min(255) as u8;
            }
        }
        px[3] = 255;
    }
    flat
}

fn dim_to_u16(dim: u32) -> GifweaveResult<u16> {
    u16::try_from(dim).map_err(|_| {
        GifweaveError::validation(format!("frame dimension {dim} exceeds the gif limit of 65535"))
    })
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
