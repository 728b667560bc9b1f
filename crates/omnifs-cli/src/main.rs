//! omnifs offline administration tool.
//!
//! Works directly on container files; never talks to a running server.
//!
//! Usage:
//!   omnifs format --config omnifs.toml disk.omni
//!   omnifs inspect disk.omni
//!   omnifs inspect --json disk.omni
//!   omnifs tree disk.omni
//!   omnifs users disk.omni
//!
//! Logging goes to stderr; set `RUST_LOG=debug` for codec detail.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use omnifs_kernel::tree::NamespaceTree;
use omnifs_kernel::{ContainerConfig, ContainerReport, NodeId};

#[derive(Parser, Debug)]
#[command(name = "omnifs")]
#[command(about = "Format and inspect omnifs containers")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a fresh container
    Format {
        /// TOML config; built-in defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,

        container: PathBuf,
    },

    /// Print the size and usage breakdown
    Inspect {
        #[arg(long)]
        json: bool,

        container: PathBuf,
    },

    /// List the namespace
    Tree { container: PathBuf },

    /// List active accounts
    Users { container: PathBuf },
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    match args.command {
        Commands::Format {
            config,
            force,
            container,
        } => format(config.as_deref(), force, &container),
        Commands::Inspect { json, container } => inspect(&container, json),
        Commands::Tree { container } => tree(&container),
        Commands::Users { container } => users(&container),
    }
}

fn format(config: Option<&Path>, force: bool, container: &Path) -> Result<()> {
    if container.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", container.display());
    }
    let config = match config {
        Some(path) => {
            tracing::info!(config = %path.display(), "using config file");
            ContainerConfig::load(path)?
        }
        None => ContainerConfig::default(),
    };
    omnifs_kernel::format(container, &config)
        .with_context(|| format!("formatting {}", container.display()))?;
    println!(
        "formatted {}: {} blocks of {} bytes, {} user slots",
        container.display(),
        config.total_blocks(),
        config.block_size,
        config.max_users
    );
    Ok(())
}

fn inspect(container: &Path, json: bool) -> Result<()> {
    let report = ContainerReport::read(container)
        .with_context(|| format!("reading {}", container.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let h = &report.header;
    println!("container     {}", container.display());
    println!("magic         {}", String::from_utf8_lossy(&h.magic));
    println!(
        "version       {}.{}",
        h.format_version >> 16,
        h.format_version & 0xffff
    );
    println!("created       {}", h.created_on);
    if !h.creator_id.is_empty() {
        println!("creator       {}", h.creator_id);
    }
    if !h.config_hash.is_empty() {
        println!("config hash   {}", h.config_hash);
    }
    println!();
    println!("file size     {}", human(report.file_size));
    println!("  header      {}", human(report.header_bytes));
    println!(
        "  user table  {} ({} slots)",
        human(report.user_table_bytes),
        report.user_slots
    );
    println!("  namespace   {}", human(report.tree_bytes));
    println!("  bitmap      {}", human(report.bitmap_bytes));
    println!();
    println!(
        "capacity      {} in {} blocks of {}",
        human(h.total_size),
        report.total_blocks,
        human(h.block_size)
    );
    println!(
        "blocks        {} used, {} free",
        report.used_blocks, report.free_blocks
    );
    println!("used space    {}", human(report.used_space));
    println!("free space    {}", human(report.free_space));
    println!("utilization   {:.2}%", report.utilization);
    println!(
        "users         {} of {}",
        report.active_users.len(),
        report.user_slots
    );
    Ok(())
}

fn tree(container: &Path) -> Result<()> {
    let engine = omnifs_kernel::load(container, &ContainerConfig::default())
        .with_context(|| format!("loading {}", container.display()))?;
    let tree = engine.tree();
    tracing::info!(container = %container.display(), nodes = tree.len(), "namespace loaded");
    print_node(tree, tree.root(), 0);
    let (files, dirs) = tree.count_kinds();
    println!();
    println!("{} directories, {} files", dirs, files);
    Ok(())
}

fn print_node(tree: &NamespaceTree, id: NodeId, depth: usize) {
    let Some(node) = tree.get(id) else {
        return;
    };
    let e = &node.entry;
    let suffix = if e.is_dir() && depth > 0 { "/" } else { "" };
    println!(
        "{:04o} {:<10} {:>10}  {}{}{}",
        e.mode.bits() & 0o7777,
        e.owner,
        if e.is_dir() { String::new() } else { e.size.to_string() },
        "  ".repeat(depth),
        e.name,
        suffix
    );
    for &child in node.children() {
        print_node(tree, child, depth + 1);
    }
}

fn users(container: &Path) -> Result<()> {
    let report = ContainerReport::read(container)
        .with_context(|| format!("reading {}", container.display()))?;
    for user in &report.active_users {
        println!(
            "{:<32} {:<6} created {} last login {}",
            user.username,
            user.role,
            user.created_at,
            if user.last_login == 0 {
                "never".to_string()
            } else {
                user.last_login.to_string()
            }
        );
    }
    Ok(())
}

fn human(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["omnifs", "format", "-c", "x.toml", "disk.omni"]).unwrap();
        match args.command {
            Commands::Format {
                config,
                force,
                container,
            } => {
                assert_eq!(config, Some(PathBuf::from("x.toml")));
                assert!(!force);
                assert_eq!(container, PathBuf::from("disk.omni"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(Args::try_parse_from(["omnifs", "inspect"]).is_err());
    }

    #[test]
    fn test_human() {
        assert_eq!(human(512), "512 B");
        assert_eq!(human(2048), "2.00 KiB");
        assert_eq!(human(50 * 1024 * 1024), "50.00 MiB");
    }
}
