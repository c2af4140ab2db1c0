use std::path::Path;

use image::RgbaImage;

use crate::assets::loader::{self, DEFAULT_FRAME_DURATION_MS};
use crate::foundation::error::{GifweaveError, GifweaveResult};

/// A named source image with a default per-frame display duration.
#[derive(Clone, Debug)]
pub struct Material {
    /// Decoded straight-alpha RGBA pixels.
    pub image: RgbaImage,
    /// Display name shown by drivers and used for auto-generated tile names.
    pub name: String,
    /// Default duration in milliseconds when this material fills a frame.
    pub duration_ms: u32,
}

/// Indexed, owned collection of materials.
///
/// Everything downstream (timelines, layers, templates) references materials
/// by index into this store. Removing a material shifts later indices;
/// lookups return `None` for stale indices instead of panicking so callers
/// can decide whether that is a skip or an error.
#[derive(Clone, Debug, Default)]
pub struct MaterialStore {
    materials: Vec<Material>,
}

impl MaterialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a material with an explicit duration. An empty name is replaced
    /// with an auto-generated `Material_{n}` label.
    pub fn add(&mut self, image: RgbaImage, name: impl Into<String>, duration_ms: u32) -> usize {
        let mut name = name.into();
        if name.is_empty() {
            name = format!("Material_{}", self.materials.len() + 1);
        }
        self.materials.push(Material {
            image,
            name,
            duration_ms,
        });
        self.materials.len() - 1
    }

    /// Add a material with the default duration.
    pub fn add_image(&mut self, image: RgbaImage, name: impl Into<String>) -> usize {
        self.add(image, name, DEFAULT_FRAME_DURATION_MS)
    }

    /// Decode one image file into a material. `name` defaults to the file stem.
    pub fn load_file(&mut self, path: &Path, name: Option<&str>) -> GifweaveResult<usize> {
        let image = loader::load_image(path)?;
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| file_stem(path));
        Ok(self.add_image(image, name))
    }

    /// Decode an animation into one material per frame, keeping each frame's
    /// own duration. Returns the new indices in frame order.
    pub fn load_animation(&mut self, path: &Path, prefix: Option<&str>) -> GifweaveResult<Vec<usize>> {
        let frames = loader::load_animation_frames(path)?;
        let prefix = prefix
            .map(str::to_string)
            .unwrap_or_else(|| file_stem(path));
        tracing::debug!(path = %path.display(), frames = frames.len(), "loading animation frames as materials");

        Ok(frames
            .into_iter()
            .enumerate()
            .map(|(i, (image, duration_ms))| {
                self.add(image, format!("{}_{}", prefix, i + 1), duration_ms)
            })
            .collect())
    }

    /// Decode an image file and split it into a `rows x cols` grid of tile
    /// materials, row-major. Returns the new indices in tile order.
    pub fn load_tiles(
        &mut self,
        path: &Path,
        rows: u32,
        cols: u32,
        prefix: Option<&str>,
    ) -> GifweaveResult<Vec<usize>> {
        let image = loader::load_image(path)?;
        let tiles = loader::split_grid(&image, rows, cols)?;
        let prefix = prefix
            .map(str::to_string)
            .unwrap_or_else(|| file_stem(path));
        tracing::debug!(path = %path.display(), tiles = tiles.len(), "loading split tiles as materials");

        Ok(tiles
            .into_iter()
            .enumerate()
            .map(|(i, tile)| {
                let row = i as u32 / cols;
                let col = i as u32 % cols;
                self.add(tile, format!("{prefix}_{row}_{col}"), DEFAULT_FRAME_DURATION_MS)
            })
            .collect())
    }

    pub fn get(&self, index: usize) -> Option<&Material> {
        self.materials.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Material> {
        self.materials.get_mut(index)
    }

    /// Remove a material, shifting every later index down by one.
    pub fn remove(&mut self, index: usize) -> Option<Material> {
        if index < self.materials.len() {
            Some(self.materials.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.materials.clear();
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.materials.iter().map(|m| m.name.as_str())
    }

    pub fn set_duration(&mut self, index: usize, duration_ms: u32) -> GifweaveResult<()> {
        let len = self.materials.len();
        let material = self.materials.get_mut(index).ok_or_else(|| {
            GifweaveError::validation(format!(
                "material index {index} out of range (store has {len})"
            ))
        })?;
        material.duration_ms = duration_ms;
        Ok(())
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Material".to_string())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
