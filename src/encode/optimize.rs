use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::{
    assets::loader,
    encode::gif::{GifEncodeConfig, GifEncoder, ensure_parent_dir, read_gif_info},
    foundation::{
        core::Rgba8,
        error::{GifweaveError, GifweaveResult},
    },
};

/// Options for one lossy optimization run.
#[derive(Clone, Debug)]
pub struct OptimizeOptions {
    /// gifsicle lossy level, clamped to 0..=200. Higher compresses more.
    pub lossy: u16,
    /// Optional palette ceiling for the optimized file.
    pub colors: Option<u16>,
    /// Replace the input file when no explicit output path is given.
    pub overwrite: bool,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            lossy: 80,
            colors: None,
            overwrite: false,
        }
    }
}

pub fn is_gifsicle_available() -> bool {
    Command::new("gifsicle")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Runs gifsicle's lossy optimizer over `input`, falling back to an in-process
/// re-encode when the tool is not installed (absent tool only; a tool that ran
/// and failed propagates its error).
///
/// Destination: explicit `output`, else the input itself when
/// `options.overwrite` is set, else `<stem>-optimized.gif` beside the input.
/// The result lands in a temporary file first and is renamed into place.
#[tracing::instrument(skip(options))]
pub fn optimize_gif_lossy(
    input: &Path,
    output: Option<&Path>,
    options: &OptimizeOptions,
) -> GifweaveResult<PathBuf> {
    if !input.exists() {
        return Err(GifweaveError::validation(format!(
            "input file does not exist: '{}'",
            input.display()
        )));
    }

    let dest = match output {
        Some(path) => path.to_path_buf(),
        None if options.overwrite => input.to_path_buf(),
        None => {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            input.with_file_name(format!("{stem}-optimized.gif"))
        }
    };
    ensure_parent_dir(&dest)?;

    // Temp file next to the destination so the final rename never crosses
    // filesystems.
    let tmp_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("out.gif"));
    let tmp = dest.with_file_name(format!(".{}.{}.tmp", tmp_name, std::process::id()));

    let run = if is_gifsicle_available() {
        run_gifsicle(input, &tmp, options)
    } else {
        tracing::debug!("gifsicle not found on PATH, re-encoding in process");
        reencode_fallback(input, &tmp, options.colors)
    };
    if let Err(err) = run {
        std::fs::remove_file(&tmp).ok();
        return Err(err);
    }

    if let Err(err) = std::fs::rename(&tmp, &dest) {
        std::fs::remove_file(&tmp).ok();
        return Err(anyhow::Error::from(err)
            .context(format!(
                "failed to move optimized file into place at '{}'",
                dest.display()
            ))
            .into());
    }

    Ok(dest)
}

fn run_gifsicle(input: &Path, output: &Path, options: &OptimizeOptions) -> GifweaveResult<()> {
    let lossy = options.lossy.min(200);

    let mut cmd = Command::new("gifsicle");
    cmd.arg(format!("--lossy={lossy}")).arg("-O3");
    if let Some(colors) = options.colors {
        cmd.args(["--colors", &colors.to_string()]);
    }
    cmd.arg(input).arg("-o").arg(output);
    cmd.stdout(Stdio::null()).stderr(Stdio::piped());

    tracing::debug!(?cmd, "running gifsicle");
    let out = cmd
        .output()
        .map_err(|e| GifweaveError::optimizer(format!("failed to invoke gifsicle: {e}")))?;

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        return Err(GifweaveError::optimizer(format!(
            "gifsicle exited with status {}: {}",
            out.status,
            stderr.trim()
        )));
    }
    if !output.exists() {
        return Err(GifweaveError::optimizer(
            "gifsicle did not produce the expected output file",
        ));
    }
    Ok(())
}

/// In-process stand-in for gifsicle: decode, optionally tighten the palette,
/// rewrite. Not a true lossy pass, but still shrinks most files.
fn reencode_fallback(input: &Path, output: &Path, colors: Option<u16>) -> GifweaveResult<()> {
    let info = read_gif_info(input)?;
    let (images, durations): (Vec<_>, Vec<_>) =
        loader::load_animation_frames(input)?.into_iter().unzip();

    let background = if info.has_transparency {
        Rgba8::transparent()
    } else {
        Rgba8::WHITE
    };
    let palette_size = match colors {
        Some(c) => c.clamp(2, 256),
        None => (info.color_table_size as u16).clamp(2, 256),
    };
    let config = GifEncodeConfig {
        size: None,
        background,
        loop_count: 0,
        palette_size,
        chroma_key: None,
    };
    GifEncoder::new(config)?.save(&images, &durations, output)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/optimize.rs"]
mod tests;
