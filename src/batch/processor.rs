use std::path::{Path, PathBuf};

use crate::{
    assets::{loader, store::MaterialStore},
    encode::gif::GifEncoder,
    foundation::error::{GifweaveError, GifweaveResult},
    template::{
        apply::{apply_layered, apply_multi, encode_config_from},
        document::TemplateDocument,
    },
};

/// How a source image is cut into material tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitMode {
    /// A fixed number of rows and columns; tile size follows the image.
    Grid { rows: u32, cols: u32 },
    /// A fixed tile pixel size; row/column counts follow the image, trailing
    /// remainders are dropped.
    TileSize { width: u32, height: u32 },
}

/// One batch job: a template plus the splitting and output choices shared by
/// every source image.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    pub template: TemplateDocument,
    pub split: SplitMode,
    /// `(row, col)` tile positions to keep, in caller order. `None` keeps all
    /// tiles. Positions whose flat index falls outside the tile list are
    /// dropped.
    pub selected_positions: Option<Vec<(u32, u32)>>,
    /// Output directory for generated GIFs; `None` writes beside each source.
    pub output_dir: Option<PathBuf>,
    /// Palette override for every generated GIF, trumping the template's
    /// color count.
    pub color_count: Option<u16>,
}

impl BatchConfig {
    pub fn new(template: TemplateDocument, split: SplitMode) -> Self {
        Self {
            template,
            split,
            selected_positions: None,
            output_dir: None,
            color_count: None,
        }
    }
}

/// Outcome of a whole batch run. The batch itself never fails; every per-item
/// error lands in `failures` as a `(path, reason)` pair.
#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    pub successes: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, String)>,
}

/// Result of a pre-flight compatibility check between a template and the
/// planned split.
#[derive(Clone, Debug)]
pub struct BatchValidation {
    pub is_valid: bool,
    pub message: String,
}

/// Processes one source image: split into tiles, apply the template against
/// an ephemeral material store, export a GIF. Returns the written path.
///
/// Any failure comes back as a batch error naming the source file.
pub fn process_single(input: &Path, config: &BatchConfig) -> GifweaveResult<PathBuf> {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    process_single_inner(input, config)
        .map_err(|err| GifweaveError::batch(format!("failed to process {name}: {err}")))
}

/// Processes every source image independently, reporting progress after each
/// item and once more on completion. Per-item failures are recorded, never
/// propagated.
#[tracing::instrument(skip(inputs, config, progress), fields(total = inputs.len()))]
pub fn process_batch(
    inputs: &[PathBuf],
    config: &BatchConfig,
    mut progress: impl FnMut(usize, usize, &str),
) -> BatchReport {
    let total = inputs.len();
    let mut report = BatchReport::default();

    for (index, input) in inputs.iter().enumerate() {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());
        match process_single(input, config) {
            Ok(dest) => {
                report.successes.push(dest);
                progress(index + 1, total, &format!("processed {name}"));
            }
            Err(err) => {
                tracing::warn!(source = %input.display(), error = %err, "batch item failed");
                report.failures.push((input.clone(), err.to_string()));
                progress(index + 1, total, &format!("failed {name}"));
            }
        }
    }

    progress(total, total, "batch processing complete");
    report
}

/// Checks template compatibility from split parameters and sample image
/// dimensions alone, without touching the filesystem.
pub fn validate_template_for_batch(
    template: &TemplateDocument,
    split: SplitMode,
    image_width: u32,
    image_height: u32,
    selected_positions: Option<&[(u32, u32)]>,
) -> BatchValidation {
    let (total_tiles, cols) = match split {
        SplitMode::Grid { rows, cols } => (rows as usize * cols as usize, cols as usize),
        SplitMode::TileSize { width, height } => {
            if width == 0 || height == 0 || width > image_width || height > image_height {
                return BatchValidation {
                    is_valid: false,
                    message: format!(
                        "tile size {width}x{height} does not fit a {image_width}x{image_height} image"
                    ),
                };
            }
            let cols = (image_width / width) as usize;
            let rows = (image_height / height) as usize;
            (rows * cols, cols)
        }
    };

    let tile_count = match selected_positions {
        Some(positions) => positions
            .iter()
            .filter(|(row, col)| *row as usize * cols + (*col as usize) < total_tiles)
            .count(),
        None => total_tiles,
    };

    let required = required_materials(template);
    if tile_count < required {
        let message = match template {
            TemplateDocument::MultiTimeline(_) => format!(
                "template references material index up to {}, but split will generate only {tile_count} tiles",
                required - 1
            ),
            TemplateDocument::Layered(_) => format!(
                "template requires {required} materials, but split will generate only {tile_count} tiles"
            ),
        };
        return BatchValidation {
            is_valid: false,
            message,
        };
    }

    BatchValidation {
        is_valid: true,
        message: format!("compatible: {tile_count} tiles will be generated"),
    }
}

fn process_single_inner(input: &Path, config: &BatchConfig) -> GifweaveResult<PathBuf> {
    let image = loader::load_image(input)?;
    let (tiles, cols) = match config.split {
        SplitMode::Grid { rows, cols } => (loader::split_grid(&image, rows, cols)?, cols),
        SplitMode::TileSize { width, height } => (
            loader::split_tile_size(&image, width, height)?,
            image.width() / width,
        ),
    };

    let tiles = match &config.selected_positions {
        Some(positions) => {
            let mut kept = Vec::new();
            for &(row, col) in positions {
                let flat = row as usize * cols as usize + col as usize;
                if let Some(tile) = tiles.get(flat) {
                    kept.push(tile.clone());
                }
            }
            kept
        }
        None => tiles,
    };
    if tiles.is_empty() {
        return Err(GifweaveError::validation(
            "no tiles generated after filtering",
        ));
    }

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("image"));
    let mut store = MaterialStore::new();
    for (index, tile) in tiles.into_iter().enumerate() {
        store.add_image(tile, format!("{stem}_tile_{index}"));
    }

    check_material_requirement(&config.template, store.len())?;

    let renamed = input.with_extension("gif");
    let dest = match &config.output_dir {
        Some(dir) => dir.join(
            renamed
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| std::ffi::OsString::from("out.gif")),
        ),
        None => renamed,
    };

    match &config.template {
        TemplateDocument::MultiTimeline(doc) => {
            let (model, settings) = apply_multi(doc, None)?;
            let mut encode = encode_config_from(&settings)?;
            if let Some(colors) = config.color_count {
                encode.palette_size = colors;
            }
            GifEncoder::new(encode)?.build_from_timeline(&store, &model, &dest)?;
        }
        TemplateDocument::Layered(doc) => {
            let (sequence, settings) = apply_layered(doc, None);
            let mut encode = encode_config_from(&settings)?;
            if let Some(colors) = config.color_count {
                encode.palette_size = colors;
            }
            GifEncoder::new(encode)?.build_from_layered(&store, sequence.frames(), &dest)?;
        }
    }

    Ok(dest)
}

fn required_materials(template: &TemplateDocument) -> usize {
    match template {
        TemplateDocument::MultiTimeline(doc) => doc
            .timelines
            .iter()
            .flat_map(|t| t.frames.iter())
            .flatten()
            .map(|slot| slot.material_index + 1)
            .max()
            .unwrap_or(0),
        TemplateDocument::Layered(doc) => doc.settings.material_count.unwrap_or(0),
    }
}

fn check_material_requirement(template: &TemplateDocument, tile_count: usize) -> GifweaveResult<()> {
    let required = required_materials(template);
    if tile_count >= required {
        return Ok(());
    }
    match template {
        TemplateDocument::MultiTimeline(_) => Err(GifweaveError::validation(format!(
            "template references material index up to {}, but only {tile_count} tiles were generated",
            required - 1
        ))),
        TemplateDocument::Layered(_) => Err(GifweaveError::validation(format!(
            "template requires {required} materials, but only {tile_count} tiles were generated"
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/batch/processor.rs"]
mod tests;
