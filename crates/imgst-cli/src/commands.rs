use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use imgst_store::{compact, Dimensions, ImageStore, OpenMode, StoreConfig};
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::List(args) => cmd_list(&args.store, cli.format),
        Command::Create(args) => cmd_create(args),
        Command::Read(args) => cmd_read(args),
        Command::Insert(args) => cmd_insert(args),
        Command::Delete(args) => cmd_delete(args),
        Command::Gc(args) => cmd_gc(&args.store),
    }
}

fn open(path: &Path, mode: OpenMode) -> anyhow::Result<ImageStore> {
    ImageStore::open(path, mode).with_context(|| format!("cannot open store {}", path.display()))
}

fn cmd_list(path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let store = open(path, OpenMode::ReadOnly)?;
    match format {
        OutputFormat::Text => print!("{}", render_text(&store)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&render_json(&store))?),
    }
    Ok(())
}

fn render_text<C>(store: &ImageStore<C>) -> String {
    let mut out = format!("{}\n", store.header());
    if store.is_empty() {
        out.push_str("<< empty imgStore >>\n");
    }
    for listed in store.list() {
        out.push_str(&format!("{}\n", listed.slot));
    }
    out
}

fn render_json<C>(store: &ImageStore<C>) -> serde_json::Value {
    let ids: Vec<&str> = store.list().map(|l| l.slot.id.as_str()).collect();
    serde_json::json!({ "Images": ids })
}

fn build_config(args: &CreateArgs) -> anyhow::Result<StoreConfig> {
    let mut config = match &args.config {
        Some(path) => StoreConfig::from_toml_file(path)
            .with_context(|| format!("cannot load config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(capacity) = args.max_files {
        config.capacity = capacity;
    }
    if let Some(dims) = &args.thumb_res {
        config.thumb = dimensions(dims)?;
    }
    if let Some(dims) = &args.small_res {
        config.small = dimensions(dims)?;
    }
    Ok(config)
}

fn dimensions(pair: &[u16]) -> anyhow::Result<Dimensions> {
    match pair {
        [width, height] => Ok(Dimensions::new(*width, *height)),
        _ => bail!("expected WIDTH HEIGHT, got {} values", pair.len()),
    }
}

fn cmd_create(args: CreateArgs) -> anyhow::Result<()> {
    let config = build_config(&args)?;
    let store = ImageStore::create(&args.store, &config)
        .with_context(|| format!("cannot create store {}", args.store.display()))?;
    println!("{} Created {}", "✓".green().bold(), args.store.display().to_string().bold());
    println!("{}", store.header());
    store.close()?;
    Ok(())
}

fn cmd_read(args: ReadArgs) -> anyhow::Result<()> {
    let id = imgst_types::ImageId::new(&args.id)?;
    let mut store = open(&args.store, OpenMode::ReadWrite)?;
    let bytes = store
        .read(id.as_str(), args.resolution)
        .with_context(|| format!("cannot read {} at {}", id, args.resolution))?;
    store.close()?;

    let target = args.out.join(id.output_file_name(args.resolution));
    std::fs::write(&target, &bytes).with_context(|| format!("cannot write {}", target.display()))?;
    debug!(path = %target.display(), size = bytes.len(), "exported image");
    println!(
        "{} {} ({}) -> {}",
        "✓".green().bold(),
        id.as_str().yellow(),
        args.resolution,
        target.display()
    );
    Ok(())
}

fn cmd_insert(args: InsertArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))?;
    let mut store = open(&args.store, OpenMode::ReadWrite)?;
    let index = store
        .insert(&args.id, &bytes)
        .with_context(|| format!("cannot insert {}", args.id))?;
    println!(
        "{} Inserted {} into slot {} ({}/{})",
        "✓".green().bold(),
        args.id.yellow(),
        index,
        store.len(),
        store.capacity()
    );
    store.close()?;
    Ok(())
}

fn cmd_delete(args: DeleteArgs) -> anyhow::Result<()> {
    let mut store = open(&args.store, OpenMode::ReadWrite)?;
    store
        .delete(&args.id)
        .with_context(|| format!("cannot delete {}", args.id))?;
    println!("{} Deleted {}", "✓".green().bold(), args.id.yellow());
    store.close()?;
    Ok(())
}

fn cmd_gc(path: &Path) -> anyhow::Result<()> {
    let report = compact(path).with_context(|| format!("cannot compact {}", path.display()))?;
    println!(
        "{} GC: {} images kept, {} payloads copied, {} shared, {} bytes reclaimed.",
        "✓".green(),
        report.live_images,
        report.payloads_copied,
        report.payloads_shared,
        report.bytes_reclaimed().to_string().bold()
    );
    Ok(())
}
