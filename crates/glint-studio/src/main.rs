use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use glint_engine::device::{Gpu, GpuInit, WgpuContext};
use glint_engine::imaging::DecoderRegistry;
use glint_engine::logging::{init_logging, LoggingConfig};
use glint_engine::texture::{
    CacheConfig, FilterMode, Texture, TextureCache, TextureError, WrapMode,
};

/// glint-studio - load shader textures and inspect them
#[derive(Parser, Debug)]
#[command(name = "glint-studio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Texture files to open. Repeating a name reuses the cached texture.
    #[arg(value_name = "TEXTURE", required = true)]
    textures: Vec<String>,

    /// Log filter in env_logger syntax (defaults to RUST_LOG, then "info")
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,

    /// Edge of the square box thumbnails are fitted into
    #[arg(
        long,
        value_name = "PIXELS",
        default_value_t = 16,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    thumbnail_size: u32,

    /// Wrap mode applied to both axes of every opened texture
    #[arg(long, value_enum)]
    wrap: Option<WrapArg>,

    /// Filter applied to minification and magnification of every opened texture
    #[arg(long, value_enum)]
    filter: Option<FilterArg>,

    /// Use the placeholder texture when a file fails to load
    #[arg(long)]
    fallback: bool,

    /// Directory to write each thumbnail to as PNG
    #[arg(long, value_name = "DIR")]
    icons: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum WrapArg {
    Repeat,
    Mirror,
    Clamp,
}

impl From<WrapArg> for WrapMode {
    fn from(arg: WrapArg) -> Self {
        match arg {
            WrapArg::Repeat => WrapMode::Repeat,
            WrapArg::Mirror => WrapMode::MirroredRepeat,
            WrapArg::Clamp => WrapMode::ClampToEdge,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FilterArg {
    Nearest,
    Linear,
}

impl From<FilterArg> for FilterMode {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Nearest => FilterMode::Nearest,
            FilterArg::Linear => FilterMode::Linear,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..LoggingConfig::default()
    });

    let gpu = pollster::block_on(Gpu::new(GpuInit::default()))
        .context("GPU initialization failed")?;
    let info = gpu.adapter_info();
    println!("adapter: {} ({:?})", info.name, info.backend);

    let config = CacheConfig {
        thumbnail_size: cli.thumbnail_size,
    };
    let mut cache = TextureCache::new(
        WgpuContext::new(gpu),
        DecoderRegistry::with_defaults(),
        config,
    );

    if let Some(dir) = &cli.icons {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create icon directory {}", dir.display()))?;
    }

    // Handles are kept alive until the report is printed so duplicates show
    // up as shared references.
    let mut opened: Vec<Texture<WgpuContext>> = Vec::new();
    let mut failures = 0usize;

    for name in &cli.textures {
        let texture = match cache.open(name) {
            Ok(texture) => texture,
            Err(err @ TextureError::Decode(_)) if cli.fallback => {
                log::warn!("{err}; using placeholder");
                cache.placeholder()?
            }
            Err(err) => {
                log::error!("{err}");
                failures += 1;
                continue;
            }
        };

        if let Some(wrap) = cli.wrap {
            texture.set_wrap_mode(wrap.into(), wrap.into())?;
        }
        if let Some(filter) = cli.filter {
            texture.set_filtering_mode(filter.into(), filter.into())?;
        }
        if let Some(dir) = &cli.icons {
            write_icon(dir, opened.len(), &texture)?;
        }

        opened.push(texture);
    }

    for texture in &opened {
        print_row(texture)?;
    }

    println!(
        "cached names: {}  live resources: {}  failures: {}",
        cache.len(),
        cache.live_resources(),
        failures
    );

    drop(opened);
    if let Some(ctx) = cache.teardown() {
        log::debug!("releasing device with {} texture(s) left", ctx.texture_count());
    }

    if failures > 0 {
        anyhow::bail!("{failures} texture(s) failed to load");
    }
    Ok(())
}

fn print_row(texture: &Texture<WgpuContext>) -> Result<()> {
    let name = texture.name().unwrap_or("<placeholder>");
    let (w, h) = texture.size();
    let (iw, ih) = texture.icon().dimensions();
    let sampler = texture.sampler_state()?;
    println!(
        "{name:<32} {id:>5} {target} {w}x{h} icon {iw}x{ih} refs {refs} wrap {ws:?}/{wt:?} filter {min:?}/{mag:?}",
        id = texture.id().to_string(),
        target = texture.target(),
        refs = texture.ref_count(),
        ws = sampler.wrap_s,
        wt = sampler.wrap_t,
        min = sampler.min_filter,
        mag = sampler.mag_filter,
    );
    Ok(())
}

fn write_icon(dir: &Path, index: usize, texture: &Texture<WgpuContext>) -> Result<()> {
    let stem = texture
        .name()
        .and_then(|n| Path::new(n).file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("placeholder");
    let path = dir.join(format!("{index:02}-{stem}.png"));
    texture
        .icon()
        .save(&path)
        .with_context(|| format!("cannot write icon {}", path.display()))?;
    log::info!("wrote {}", path.display());
    Ok(())
}
