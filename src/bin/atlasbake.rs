use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Serialize;

use atlasbake::{
    BuildConfig, BuildSession, FsResourceResolver, Placement, ResourceId, SpriteInfo,
    SpriteLoader, StandardSpriteBaker,
};

#[derive(Parser, Debug)]
#[command(name = "atlasbake", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load every sprite of a namespace and print the sprite descriptors as JSON.
    Load(SourceArgs),
    /// Load, then materialize every sprite with mipmaps and print a summary as JSON.
    Bake(SourceArgs),
}

#[derive(Parser, Debug)]
struct SourceArgs {
    /// Resource root containing `<namespace>/textures/**.png`.
    #[arg(long)]
    root: PathBuf,

    /// Namespace to scan.
    #[arg(long, default_value = atlasbake::DEFAULT_NAMESPACE)]
    namespace: String,

    /// Build configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the loader's worker thread count.
    #[arg(long)]
    threads: Option<usize>,

    /// Load on the calling thread instead of the worker pool.
    #[arg(long, default_value_t = false)]
    sequential: bool,

    /// Write the JSON report here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Serialize)]
struct LoadReport {
    requested: usize,
    loaded: usize,
    failed: usize,
    sprites: Vec<SpriteInfo>,
}

#[derive(Serialize)]
struct BakedSummary {
    id: ResourceId,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    frame_count: u32,
    mip_levels: usize,
}

#[derive(Serialize)]
struct BakeReport {
    requested: usize,
    baked: Vec<BakedSummary>,
    placeholders: Vec<ResourceId>,
    handles_opened: usize,
    handles_closed: usize,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Load(args) => cmd_load(args),
        Command::Bake(args) => cmd_bake(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn read_config(args: &SourceArgs) -> anyhow::Result<BuildConfig> {
    let mut cfg = match &args.config {
        Some(path) => BuildConfig::from_path(path)?,
        None => BuildConfig::default(),
    };
    if args.threads.is_some() {
        cfg.loader.threads = args.threads;
    }
    if args.sequential {
        cfg.loader.parallel = false;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn load_sprites(
    args: &SourceArgs,
    cfg: &BuildConfig,
    resolver: &FsResourceResolver,
    session: &BuildSession,
) -> anyhow::Result<(Vec<ResourceId>, Vec<SpriteInfo>)> {
    let requested = resolver
        .discover(&args.namespace)
        .with_context(|| format!("scan namespace '{}'", args.namespace))?;
    let ids: HashSet<ResourceId> = requested.iter().cloned().collect();
    let loader = SpriteLoader::new(Arc::new(resolver.clone()), cfg.loader.clone())?;
    let mut infos = loader.load(session, &ids);
    infos.sort_by(|a, b| a.id.cmp(&b.id));
    Ok((requested, infos))
}

fn cmd_load(args: SourceArgs) -> anyhow::Result<()> {
    let cfg = read_config(&args)?;
    let resolver = FsResourceResolver::new(&args.root);
    let session = BuildSession::begin();

    let (requested, sprites) = load_sprites(&args, &cfg, &resolver, &session)?;
    session.finish();

    let report = LoadReport {
        requested: requested.len(),
        loaded: sprites.len(),
        failed: requested.len() - sprites.len(),
        sprites,
    };
    write_report(&report, args.out.as_deref())
}

fn cmd_bake(args: SourceArgs) -> anyhow::Result<()> {
    let cfg = read_config(&args)?;
    let resolver = FsResourceResolver::new(&args.root);
    let session = BuildSession::begin();

    let (requested, sprites) = load_sprites(&args, &cfg, &resolver, &session)?;
    let loaded: HashSet<&ResourceId> = sprites.iter().map(|s| &s.id).collect();
    let mut placeholders: Vec<ResourceId> = requested
        .iter()
        .filter(|id| !loaded.contains(id))
        .cloned()
        .collect();

    let mut baked = Vec::with_capacity(sprites.len());
    let mut x = 0u32;
    for info in &sprites {
        let placement = Placement {
            width: info.width,
            height: info.height,
            mip_level: cfg.sprites.mip_levels.saturating_sub(1),
            x,
            y: 0,
        };
        x = x.saturating_add(info.width);
        match atlasbake::materialize(&session, &StandardSpriteBaker, info, &placement) {
            Ok(sprite) => baked.push(BakedSummary {
                id: sprite.id.clone(),
                x: sprite.x,
                y: sprite.y,
                width: sprite.width,
                height: sprite.height,
                frame_count: sprite.frame_count,
                mip_levels: sprite.mip_count(),
            }),
            Err(_) => placeholders.push(info.id.clone()),
        }
    }
    session.finish();
    placeholders.sort();

    let report = BakeReport {
        requested: requested.len(),
        baked,
        placeholders,
        handles_opened: resolver.opened_handles(),
        handles_closed: resolver.closed_handles(),
    };
    write_report(&report, args.out.as_deref())
}

fn write_report<T: Serialize>(report: &T, out: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("serialize report")?;
    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(path, json)
                .with_context(|| format!("write report '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
