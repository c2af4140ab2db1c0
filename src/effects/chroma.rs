use image::RgbaImage;

/// Color-similarity transparency pass.
///
/// Pixels whose RGB Euclidean distance to `color` is within `threshold`
/// get their alpha forced to 0; every other pixel keeps its alpha, so
/// pre-existing partial transparency survives. The pass is pixel-independent:
/// results never depend on processing order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChromaKey {
    pub color: [u8; 3],
    pub threshold: f32,
}

impl ChromaKey {
    /// Default matching distance, in 8-bit RGB units.
    pub const DEFAULT_THRESHOLD: f32 = 30.0;

    pub fn new(color: [u8; 3]) -> Self {
        Self {
            color,
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Apply to a copy of `image`.
    pub fn apply(&self, image: &RgbaImage) -> RgbaImage {
        let mut out = image.clone();
        self.apply_in_place(&mut out);
        out
    }

    /// Apply over the whole buffer in one pass.
    pub fn apply_in_place(&self, image: &mut RgbaImage) {
        // Compare squared distances; threshold 0 still catches exact matches.
        let threshold = f64::from(self.threshold.max(0.0));
        let threshold_sq = threshold * threshold;
        let [kr, kg, kb] = self.color.map(i32::from);

        let buf: &mut [u8] = image;
        for px in buf.chunks_exact_mut(4) {
            let dr = i32::from(px[0]) - kr;
            let dg = i32::from(px[1]) - kg;
            let db = i32::from(px[2]) - kb;
            let dist_sq = dr * dr + dg * dg + db * db;
            if f64::from(dist_sq) <= threshold_sq {
                px[3] = 0;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/chroma.rs"]
mod tests;
