use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, RgbaImage, imageops};

use crate::foundation::error::{GifweaveError, GifweaveResult};

/// Duration assigned to still images and to animation frames that carry no
/// usable delay of their own.
pub const DEFAULT_FRAME_DURATION_MS: u32 = 100;

/// Decode a single image file to straight-alpha RGBA8.
pub fn load_image(path: &Path) -> GifweaveResult<RgbaImage> {
    let dyn_img =
        image::open(path).with_context(|| format!("decode image '{}'", path.display()))?;
    Ok(dyn_img.to_rgba8())
}

/// Decode a file into `(frame, duration_ms)` pairs.
///
/// Animated GIFs yield one entry per frame with the frame's own delay;
/// anything else decodes as a single frame at [`DEFAULT_FRAME_DURATION_MS`].
pub fn load_animation_frames(path: &Path) -> GifweaveResult<Vec<(RgbaImage, u32)>> {
    if image::ImageFormat::from_path(path).ok() != Some(image::ImageFormat::Gif) {
        return Ok(vec![(load_image(path)?, DEFAULT_FRAME_DURATION_MS)]);
    }

    let file = std::fs::File::open(path)
        .with_context(|| format!("open animation '{}'", path.display()))?;
    let decoder = GifDecoder::new(BufReader::new(file))
        .with_context(|| format!("decode gif '{}'", path.display()))?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .with_context(|| format!("decode gif frames from '{}'", path.display()))?;

    if frames.is_empty() {
        return Err(GifweaveError::validation(format!(
            "'{}' contains no frames",
            path.display()
        )));
    }

    Ok(frames
        .into_iter()
        .map(|frame| {
            let (numer, denom) = frame.delay().numer_denom_ms();
            let ms = if denom == 0 { 0 } else { numer / denom };
            let ms = if ms == 0 { DEFAULT_FRAME_DURATION_MS } else { ms };
            (frame.into_buffer(), ms)
        })
        .collect())
}

/// Split an image into `rows * cols` equally sized tiles, row-major.
///
/// Tile size is `floor(width / cols)` by `floor(height / rows)`; trailing
/// pixels that do not fill a whole tile are dropped.
pub fn split_grid(image: &RgbaImage, rows: u32, cols: u32) -> GifweaveResult<Vec<RgbaImage>> {
    if rows == 0 || cols == 0 {
        return Err(GifweaveError::validation(format!(
            "split grid must have rows > 0 and cols > 0, got {rows}x{cols}"
        )));
    }
    let (width, height) = image.dimensions();
    let tile_w = width / cols;
    let tile_h = height / rows;
    if tile_w == 0 || tile_h == 0 {
        return Err(GifweaveError::validation(format!(
            "a {rows}x{cols} grid over a {width}x{height} image produces empty tiles"
        )));
    }

    let mut tiles = Vec::with_capacity((rows * cols) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let tile = imageops::crop_imm(image, col * tile_w, row * tile_h, tile_w, tile_h);
            tiles.push(tile.to_image());
        }
    }
    Ok(tiles)
}

/// Split an image into as many `tile_width x tile_height` tiles as fit,
/// row-major; trailing pixels are dropped.
pub fn split_tile_size(
    image: &RgbaImage,
    tile_width: u32,
    tile_height: u32,
) -> GifweaveResult<Vec<RgbaImage>> {
    if tile_width == 0 || tile_height == 0 {
        return Err(GifweaveError::validation(format!(
            "tile size must be > 0, got {tile_width}x{tile_height}"
        )));
    }
    let (width, height) = image.dimensions();
    let cols = width / tile_width;
    let rows = height / tile_height;
    if cols == 0 || rows == 0 {
        return Err(GifweaveError::validation(format!(
            "tile size {tile_width}x{tile_height} does not fit into a {width}x{height} image"
        )));
    }

    let mut tiles = Vec::with_capacity((rows * cols) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let tile =
                imageops::crop_imm(image, col * tile_width, row * tile_height, tile_width, tile_height);
            tiles.push(tile.to_image());
        }
    }
    Ok(tiles)
}

/// Cheap probe: does this path look like an image we can decode?
///
/// Checks the magic bytes without decoding pixel data.
pub fn is_loadable_image(path: &Path) -> bool {
    image::ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map(|reader| reader.format().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
