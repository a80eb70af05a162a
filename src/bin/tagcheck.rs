use std::env;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::LevelFilter;
use plc_tag_engine::{catalog, EngineConfig, JsonDirTagStore, TagRegistry};

const DEFAULT_CONFIG_FILE: &str = "engine.json";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    let args: Vec<String> = env::args().collect();
    let Some(store_dir) = args.get(1) else {
        bail!("usage: tagcheck <store-dir> [engine-config.json]");
    };
    let store_dir = Path::new(store_dir);
    if !store_dir.is_dir() {
        bail!("store dir not found: {}", store_dir.display());
    }

    let config_path = args
        .get(2)
        .map(|p| Path::new(p).to_path_buf())
        .unwrap_or_else(|| store_dir.join(DEFAULT_CONFIG_FILE));
    let config = EngineConfig::load_from_file(&config_path)?;

    let registry = TagRegistry::open(JsonDirTagStore::new(store_dir), config)
        .await
        .with_context(|| format!("failed to load tags from {}", store_dir.display()))?;
    let persisted = registry
        .count_persisted()
        .await
        .context("failed to count persisted records")?;
    let report = registry.last_load();

    println!(
        "{}: vendor={} loaded={} persisted={} skipped={}",
        store_dir.display(),
        config.vendor,
        registry.count_loaded(),
        persisted,
        report.skipped
    );

    let mut tags: Vec<_> = registry.iter().collect();
    tags.sort_by(|a, b| {
        a.program
            .cmp(&b.program)
            .then_with(|| a.tagname.cmp(&b.tagname))
    });
    for tag in tags {
        let display = catalog::translate_to_display(config.vendor, tag.datatype).unwrap_or("?");
        let flag = if report.invalid.contains(&tag.id) { "INVALID" } else { "ok" };
        println!(
            "  [{}] {} {} ({}) used_by={}",
            flag,
            registry
                .scope_path_of(tag.id)
                .map(|p| p.as_str())
                .unwrap_or(""),
            tag.id,
            display,
            tag.usage.len()
        );
    }

    for path in &report.duplicate_paths {
        println!("  [DUPLICATE] {}", path);
    }

    if !report.invalid.is_empty() || !report.duplicate_paths.is_empty() || report.skipped > 0 {
        bail!(
            "{} invalid, {} duplicate, {} unreadable record(s)",
            report.invalid.len(),
            report.duplicate_paths.len(),
            report.skipped
        );
    }
    Ok(())
}
