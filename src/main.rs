use anyhow::{bail, Context, Result};
use memscan::config::{validate_config, Config, ConfigLoader};
use tracing::info;

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let pid: u32 = match args.next() {
        Some(pid) => pid.parse().with_context(|| format!("invalid pid: {}", pid))?,
        None => bail!("usage: memscan <pid> [config.toml]"),
    };

    let config = match args.next() {
        Some(path) => ConfigLoader::new(&path)
            .load()
            .with_context(|| format!("failed to load {}", path))?,
        None => ConfigLoader::new("memscan.toml").load_or_default(),
    };
    validate_config(&config)?;

    memscan::logging::init(&config.logging);
    info!("memscan v{}", memscan::core::VERSION);

    run(pid, &config)
}

#[cfg(windows)]
fn run(pid: u32, config: &Config) -> Result<()> {
    use memscan::MemoryAccessor;
    use serde_json::json;

    let mut accessor = MemoryAccessor::attach(pid)
        .with_context(|| format!("failed to attach to process {}", pid))?;
    accessor.set_verify_residency(config.memory.verify_residency);
    info!("Attached to {} (image base {})", pid, accessor.image_base());

    let options = config.scan_options();
    for pattern in config.signature_set().compile()? {
        for result in pattern.find_with(&accessor, &options)? {
            let result = result?;
            println!(
                "{}",
                json!({
                    "name": pattern.name(),
                    "address": result.address,
                    "unmodified_address": result.unmodified_address,
                })
            );
        }
    }

    Ok(())
}

#[cfg(not(windows))]
fn run(_pid: u32, _config: &Config) -> Result<()> {
    bail!("attaching to a live process is only supported on Windows")
}
