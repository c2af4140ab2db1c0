use crate::assets::loader::DEFAULT_FRAME_DURATION_MS;
use crate::foundation::error::{GifweaveError, GifweaveResult};

/// Requested crop rectangle in source-image coordinates.
///
/// The origin may sit outside the image; [`CropRect::clamped`] resolves the
/// request against actual source bounds at composite time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CropRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Clamp the requested rect to `src_width x src_height`.
    ///
    /// Returns `(x, y, width, height)` of the usable region, or `None` when
    /// nothing of the rect lands inside the source.
    pub fn clamped(self, src_width: u32, src_height: u32) -> Option<(u32, u32, u32, u32)> {
        if src_width == 0 || src_height == 0 {
            return None;
        }
        let x = i64::from(self.x).clamp(0, i64::from(src_width) - 1) as u32;
        let y = i64::from(self.y).clamp(0, i64::from(src_height) - 1) as u32;
        let right = x.saturating_add(self.width).min(src_width);
        let bottom = y.saturating_add(self.height).min(src_height);
        if right > x && bottom > y {
            Some((x, y, right - x, bottom - y))
        } else {
            None
        }
    }
}

/// One transformed material placement inside a [`LayeredFrame`].
///
/// Z-order is the position in the owning frame's layer list, index 0 at the
/// bottom.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub material: usize,
    pub x: i32,
    pub y: i32,
    pub crop: Option<CropRect>,
    /// Uniform scale factor, must be finite and > 0.
    pub scale: f32,
    /// Multiplied into the existing alpha channel, 0.0..=1.0.
    pub opacity: f32,
    pub visible: bool,
    pub name: String,
}

impl Layer {
    pub fn new(material: usize) -> Self {
        Self {
            material,
            x: 0,
            y: 0,
            crop: None,
            scale: 1.0,
            opacity: 1.0,
            visible: true,
            name: String::new(),
        }
    }

    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_crop(mut self, crop: CropRect) -> Self {
        self.crop = Some(crop);
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn validate(&self) -> GifweaveResult<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(GifweaveError::validation(format!(
                "layer '{}' scale must be finite and > 0, got {}",
                self.name, self.scale
            )));
        }
        if !self.opacity.is_finite() || !(0.0..=1.0).contains(&self.opacity) {
            return Err(GifweaveError::validation(format!(
                "layer '{}' opacity must be within 0.0..=1.0, got {}",
                self.name, self.opacity
            )));
        }
        Ok(())
    }
}

/// The legacy single-frame-many-layers unit.
#[derive(Clone, Debug, PartialEq)]
pub struct LayeredFrame {
    pub layers: Vec<Layer>,
    pub duration_ms: u32,
    pub name: String,
}

impl LayeredFrame {
    pub fn new(name: impl Into<String>, duration_ms: u32) -> Self {
        Self {
            layers: Vec::new(),
            duration_ms,
            name: name.into(),
        }
    }

    pub fn add_layer(&mut self, layer: Layer) -> usize {
        self.layers.push(layer);
        self.layers.len() - 1
    }

    /// Insert at `position` (clamped to the top of the stack).
    pub fn insert_layer(&mut self, position: usize, layer: Layer) {
        let position = position.min(self.layers.len());
        self.layers.insert(position, layer);
    }

    pub fn remove_layer(&mut self, position: usize) -> GifweaveResult<Layer> {
        self.check_layer(position)?;
        Ok(self.layers.remove(position))
    }

    pub fn move_layer(&mut self, from: usize, to: usize) -> GifweaveResult<()> {
        self.check_layer(from)?;
        self.check_layer(to)?;
        if from != to {
            let layer = self.layers.remove(from);
            self.layers.insert(to, layer);
        }
        Ok(())
    }

    pub fn layer(&self, position: usize) -> Option<&Layer> {
        self.layers.get(position)
    }

    pub fn layer_mut(&mut self, position: usize) -> Option<&mut Layer> {
        self.layers.get_mut(position)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn validate(&self) -> GifweaveResult<()> {
        for layer in &self.layers {
            layer.validate()?;
        }
        Ok(())
    }

    fn check_layer(&self, position: usize) -> GifweaveResult<()> {
        if position >= self.layers.len() {
            return Err(GifweaveError::validation(format!(
                "layer position {position} out of range in frame '{}' (len {})",
                self.name,
                self.layers.len()
            )));
        }
        Ok(())
    }
}

/// An editable ordered list of [`LayeredFrame`]s.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayeredSequence {
    frames: Vec<LayeredFrame>,
}

impl LayeredSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an empty frame; an empty name becomes `Frame_{n}` and a `None`
    /// duration uses the loader default.
    pub fn add_frame(&mut self, name: impl Into<String>, duration_ms: Option<u32>) -> usize {
        let mut name = name.into();
        if name.is_empty() {
            name = format!("Frame_{}", self.frames.len() + 1);
        }
        self.frames.push(LayeredFrame::new(
            name,
            duration_ms.unwrap_or(DEFAULT_FRAME_DURATION_MS),
        ));
        self.frames.len() - 1
    }

    pub fn insert_frame(
        &mut self,
        position: usize,
        name: impl Into<String>,
        duration_ms: Option<u32>,
    ) -> usize {
        let position = position.min(self.frames.len());
        self.frames.insert(
            position,
            LayeredFrame::new(name, duration_ms.unwrap_or(DEFAULT_FRAME_DURATION_MS)),
        );
        position
    }

    pub fn remove_frame(&mut self, position: usize) -> GifweaveResult<LayeredFrame> {
        self.check_frame(position)?;
        Ok(self.frames.remove(position))
    }

    pub fn move_frame(&mut self, from: usize, to: usize) -> GifweaveResult<()> {
        self.check_frame(from)?;
        self.check_frame(to)?;
        if from != to {
            let frame = self.frames.remove(from);
            self.frames.insert(to, frame);
        }
        Ok(())
    }

    /// Deep-copy the frame at `position` directly after itself; returns the
    /// copy's index.
    pub fn duplicate_frame(&mut self, position: usize) -> GifweaveResult<usize> {
        self.check_frame(position)?;
        let frame = self.frames[position].clone();
        self.frames.insert(position + 1, frame);
        Ok(position + 1)
    }

    pub fn frame(&self, position: usize) -> Option<&LayeredFrame> {
        self.frames.get(position)
    }

    pub fn frame_mut(&mut self, position: usize) -> Option<&mut LayeredFrame> {
        self.frames.get_mut(position)
    }

    pub fn frames(&self) -> &[LayeredFrame] {
        &self.frames
    }

    pub fn push_frame(&mut self, frame: LayeredFrame) -> usize {
        self.frames.push(frame);
        self.frames.len() - 1
    }

    pub fn durations(&self) -> Vec<u32> {
        self.frames.iter().map(|f| f.duration_ms).collect()
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.duration_ms)).sum()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn check_frame(&self, position: usize) -> GifweaveResult<()> {
        if position >= self.frames.len() {
            return Err(GifweaveError::validation(format!(
                "frame position {position} out of range (len {})",
                self.frames.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/layered.rs"]
mod tests;
