use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use vk2yadisk::config::Config;
use vk2yadisk::store::FolderStatus;
use vk2yadisk::sync::{self, SyncOptions, SyncSummary};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Export VK profile photos to a Yandex.Disk folder, named by like count"
)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize with a default config file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,

        /// Path to config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Upload photos that are not in the destination folder yet
    Sync {
        /// Path to config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Show what would be uploaded without uploading
        #[arg(long)]
        dry_run: bool,

        /// Do not show a progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Show what a sync would do
    Status {
        /// Path to config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(Some(env_logger::fmt::TimestampPrecision::Seconds))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Init { force, config } => {
            init_config(config, *force)?;
            Ok(())
        }
        Commands::Sync {
            config,
            dry_run,
            no_progress,
        } => {
            let (config_data, config_dir) = load_config(config)?;
            println!("Syncing photos...");
            print_config(&config_data);

            let options = SyncOptions {
                dry_run: *dry_run,
                no_progress: *no_progress,
            };
            let summary = sync::run(&config_data, &config_dir, options)
                .await
                .context("Sync failed")?;

            print_summary(&summary, true);
            Ok(())
        }
        Commands::Status { config } => {
            let (config_data, config_dir) = load_config(config)?;
            println!("vk2yadisk Status");
            println!("Configuration:");
            print_config(&config_data);

            let options = SyncOptions {
                dry_run: true,
                no_progress: true,
            };
            let summary = sync::run(&config_data, &config_dir, options)
                .await
                .context("Failed to compute status")?;

            print_summary(&summary, false);
            Ok(())
        }
    }
}

fn print_config(config: &Config) {
    println!("  Folder: {}", config.folder_name);
    println!("  Naming: {:?}", config.naming);
    println!("  VK token file: {}", config.vk_token_file);
    println!("  Disk token file: {}", config.disk_token_file);
}

fn print_summary(summary: &SyncSummary, list_files: bool) {
    println!("\nProfile: {}", summary.owner);
    println!("Photos fetched: {}", summary.photo_count);
    println!("Files in export set: {}", summary.exported_count);

    match summary.folder_status {
        Some(FolderStatus::Created) => println!("Folder {} created", summary.folder),
        Some(FolderStatus::Existing) => println!("Folder {} already exists", summary.folder),
        None => {}
    }

    if !summary.rejected.is_empty() {
        println!("Photos skipped as invalid: {}", summary.rejected.len());
    }
    if !summary.collisions.is_empty() {
        println!(
            "Photos lost to duplicate names: {} (use `naming: indexed` to keep them)",
            summary.collisions.len()
        );
        for collision in &summary.collisions {
            println!(
                "  {} replaced {} with {}",
                collision.file_name, collision.replaced_url, collision.kept_url
            );
        }
    }

    if list_files {
        for name in &summary.plan.to_skip {
            println!("File {name} already exists!");
        }
        if summary.dry_run {
            for file in &summary.plan.to_upload {
                println!("Would upload {} ({})", file.file_name, file.source_url);
            }
        }
        for (name, error) in summary.failures() {
            println!("Failed to upload {name}: {error}");
        }
    }

    if summary.dry_run {
        println!(
            "{} photos to upload, {} already present",
            summary.plan.to_upload.len(),
            summary.skipped_count()
        );
    } else {
        println!(
            "Added {} photos ({} skipped, {} failed)",
            summary.uploaded_count(),
            summary.skipped_count(),
            summary.failures().len()
        );
    }
}

fn init_config(config_path_opt: &Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = Config::get_config_path(config_path_opt);

    if config_path.exists() && !force {
        println!("Config file already exists at {}", config_path.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    let config = Config::default();
    config
        .save_to_file(&config_path)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    println!("Created config file at {}", config_path.display());
    Ok(())
}

/// Loads the config and returns it with the directory relative paths resolve against
fn load_config(config_path_opt: &Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let config_path = Config::get_config_path(config_path_opt);

    if !config_path.exists() {
        anyhow::bail!(
            "Config file not found at {}. Run 'vk2yadisk init' to create one.",
            config_path.display()
        );
    }

    let config = Config::load_from_file(&config_path)?;
    let config_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    Ok((config, config_dir))
}
