//! Gifweave is a layered raster composition engine for animated GIFs.
//!
//! The pipeline turns loose images into palette-quantized animations:
//!
//! 1. **Collect**: load images and sprite-sheet tiles into a [`MaterialStore`]
//! 2. **Compose**: describe frames as a flat [`FrameSequence`], a per-frame
//!    [`LayeredSequence`], or a [`MultiTimeline`] with a shared timebase
//! 3. **Encode**: flatten, quantize, and write GIF89a output via [`GifEncoder`]
//! 4. **Ship** (optional): templates serialize compositions to JSON, the batch
//!    processor applies one template across many sprite sheets, and the
//!    optimizer shells out to `gifsicle` for lossy recompression
//!
//! Compositing works on straight-alpha RGBA8 throughout; transparency only
//! collapses to a reserved palette index at encode time.
#![forbid(unsafe_code)]

pub mod assets;
pub mod batch;
pub mod composition;
pub mod effects;
pub mod encode;
pub mod foundation;
pub mod render;
pub mod template;

pub use assets::loader::{
    DEFAULT_FRAME_DURATION_MS, is_loadable_image, load_animation_frames, load_image, split_grid,
    split_tile_size,
};
pub use assets::store::{Material, MaterialStore};
pub use batch::processor::{
    BatchConfig, BatchReport, BatchValidation, SplitMode, process_batch, process_single,
    validate_template_for_batch,
};
pub use composition::layered::{CropRect, Layer, LayeredFrame, LayeredSequence};
pub use composition::sequence::{FrameSequence, SequenceEntry};
pub use composition::timeline::{FrameSlot, MultiTimeline, Timeline};
pub use effects::chroma::ChromaKey;
pub use encode::gif::{
    ALPHA_THRESHOLD, GifEncodeConfig, GifEncoder, GifInfo, ensure_parent_dir, read_gif_info,
    resize_gif,
};
pub use encode::optimize::{OptimizeOptions, is_gifsicle_available, optimize_gif_lossy};
pub use foundation::core::{Canvas, Rgba8};
pub use foundation::error::{GifweaveError, GifweaveResult};
pub use render::compositor::{composite_layers_with, composite_timeline_frame};
pub use template::apply::{
    apply_layered, apply_multi, encode_config_from, export_layered, export_multi,
};
pub use template::document::{
    LayeredDocument, MultiTimelineDocument, TEMPLATE_VERSION, TemplateDocument, TemplateInfo,
    TemplateSettings, load_template, parse_template, parse_template_str, save_template,
};
