use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "gifweave", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a template to a list of material images and write a GIF.
    Render(RenderArgs),
    /// Apply one template across many sprite sheets.
    Batch(BatchArgs),
    /// Recompress a GIF (uses `gifsicle` when it is on PATH).
    Optimize(OptimizeArgs),
    /// Print a JSON summary of a GIF or template file.
    Info(InfoArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Template JSON path.
    #[arg(long)]
    template: PathBuf,

    /// Material images, in template index order.
    #[arg(long, num_args = 1.., required = true)]
    materials: Vec<PathBuf>,

    /// Output GIF path.
    #[arg(long)]
    out: PathBuf,

    /// Override the template's output width (requires --height).
    #[arg(long)]
    width: Option<u32>,

    /// Override the template's output height (requires --width).
    #[arg(long)]
    height: Option<u32>,

    /// Key out a color, as `R,G,B`.
    #[arg(long)]
    chroma: Option<String>,

    /// Matching distance for --chroma, in 8-bit RGB units.
    #[arg(long, default_value_t = gifweave::ChromaKey::DEFAULT_THRESHOLD)]
    chroma_threshold: f32,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Template JSON path.
    #[arg(long)]
    template: PathBuf,

    /// Cut each sheet into `ROWSxCOLS` equal tiles.
    #[arg(long)]
    grid: Option<String>,

    /// Cut each sheet into fixed `WIDTHxHEIGHT` tiles.
    #[arg(long)]
    tile_size: Option<String>,

    /// Keep only these tiles, as `row,col` pairs separated by `;`.
    #[arg(long)]
    positions: Option<String>,

    /// Write outputs here instead of beside each input.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Sprite sheet images to process.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct OptimizeArgs {
    /// Lossiness level (clamped to 200 when gifsicle runs).
    #[arg(long, default_value_t = 80)]
    lossy: u16,

    /// Reduce the palette to this many colors.
    #[arg(long)]
    colors: Option<u16>,

    /// Replace the input file in place.
    #[arg(long, conflicts_with = "out")]
    overwrite: bool,

    /// Output path (default: `<input>-optimized.gif` beside the input).
    #[arg(short = 'o', long)]
    out: Option<PathBuf>,

    /// GIF to optimize.
    input: PathBuf,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// A `.gif` file or a template JSON.
    input: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Batch(args) => cmd_batch(args),
        Command::Optimize(args) => cmd_optimize(args),
        Command::Info(args) => cmd_info(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let template = gifweave::load_template(&args.template)?;

    let mut store = gifweave::MaterialStore::new();
    for path in &args.materials {
        let image = gifweave::load_image(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("material"));
        store.add_image(image, name);
    }

    match template {
        gifweave::TemplateDocument::MultiTimeline(doc) => {
            let (model, settings) = gifweave::apply_multi(&doc, None)?;
            let config = apply_overrides(gifweave::encode_config_from(&settings)?, &args)?;
            gifweave::GifEncoder::new(config)?.build_from_timeline(&store, &model, &args.out)?;
        }
        gifweave::TemplateDocument::Layered(doc) => {
            let (sequence, settings) = gifweave::apply_layered(&doc, None);
            let config = apply_overrides(gifweave::encode_config_from(&settings)?, &args)?;
            gifweave::GifEncoder::new(config)?.build_from_layered(
                &store,
                sequence.frames(),
                &args.out,
            )?;
        }
    }

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn apply_overrides(
    mut config: gifweave::GifEncodeConfig,
    args: &RenderArgs,
) -> anyhow::Result<gifweave::GifEncodeConfig> {
    match (args.width, args.height) {
        (Some(width), Some(height)) => {
            config = config.with_size(gifweave::Canvas::new(width, height)?);
        }
        (None, None) => {}
        _ => anyhow::bail!("--width and --height must be given together"),
    }
    if let Some(rgb) = &args.chroma {
        let key = gifweave::ChromaKey::new(parse_rgb(rgb)?).with_threshold(args.chroma_threshold);
        config = config.with_chroma_key(key);
    }
    Ok(config)
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let template = gifweave::load_template(&args.template)?;

    let split = match (&args.grid, &args.tile_size) {
        (Some(grid), None) => {
            let (rows, cols) = parse_pair(grid, 'x')?;
            gifweave::SplitMode::Grid { rows, cols }
        }
        (None, Some(tile)) => {
            let (width, height) = parse_pair(tile, 'x')?;
            gifweave::SplitMode::TileSize { width, height }
        }
        _ => anyhow::bail!("exactly one of --grid or --tile-size is required"),
    };

    let mut config = gifweave::BatchConfig::new(template, split);
    config.output_dir = args.out_dir.clone();
    if let Some(positions) = &args.positions {
        let mut parsed = Vec::new();
        for part in positions.split(';').filter(|p| !p.trim().is_empty()) {
            parsed.push(parse_pair(part, ',')?);
        }
        config.selected_positions = Some(parsed);
    }

    let report = gifweave::process_batch(&args.inputs, &config, |current, total, message| {
        eprintln!("[{current}/{total}] {message}");
    });

    for (path, reason) in &report.failures {
        eprintln!("failed {}: {reason}", path.display());
    }
    eprintln!(
        "{} succeeded, {} failed",
        report.successes.len(),
        report.failures.len()
    );
    if !report.failures.is_empty() {
        anyhow::bail!(
            "{} of {} inputs failed",
            report.failures.len(),
            args.inputs.len()
        );
    }
    Ok(())
}

fn cmd_optimize(args: OptimizeArgs) -> anyhow::Result<()> {
    let options = gifweave::OptimizeOptions {
        lossy: args.lossy,
        colors: args.colors,
        overwrite: args.overwrite,
    };
    let dest = gifweave::optimize_gif_lossy(&args.input, args.out.as_deref(), &options)?;
    eprintln!("wrote {}", dest.display());
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let is_gif = args
        .input
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gif"))
        .unwrap_or(false);

    let json = if is_gif {
        let info = gifweave::read_gif_info(&args.input)?;
        serde_json::to_string_pretty(&info).context("serialize gif info")?
    } else {
        let template = gifweave::load_template(&args.input)?;
        serde_json::to_string_pretty(&template.info()).context("serialize template info")?
    };
    println!("{json}");
    Ok(())
}

fn parse_pair(s: &str, sep: char) -> anyhow::Result<(u32, u32)> {
    let (a, b) = s
        .split_once(sep)
        .with_context(|| format!("expected two values separated by '{sep}', got '{s}'"))?;
    let a = a.trim().parse().with_context(|| format!("parse '{a}'"))?;
    let b = b.trim().parse().with_context(|| format!("parse '{b}'"))?;
    Ok((a, b))
}

fn parse_rgb(s: &str) -> anyhow::Result<[u8; 3]> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        anyhow::bail!("expected a color as R,G,B, got '{s}'");
    }
    let channel = |p: &str| -> anyhow::Result<u8> {
        p.trim()
            .parse()
            .with_context(|| format!("parse channel '{p}'"))
    };
    Ok([channel(parts[0])?, channel(parts[1])?, channel(parts[2])?])
}
