use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipper::cli::{batch, CategoryCommands, Cli, Commands};
use clipper::config::Config;
use clipper::{output, utils, ClipManager};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "clipper=debug" } else { "clipper=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().await?,
    };

    if let Commands::Config { show } = &cli.command {
        if *show {
            config.display();
        } else {
            println!("Edit the config file to change settings:");
            println!("  {}", Config::config_path()?.display());
        }
        return Ok(());
    }

    // Check for required external dependencies (non-fatal)
    let missing_deps =
        utils::check_dependencies(&config.app.yt_dlp_path, &config.app.ffmpeg_normalize_path).await;
    if !missing_deps.is_empty() {
        eprintln!("⚠️  Dependency check warnings:");
        for dep in missing_deps {
            eprintln!("   • {}", dep);
        }
        eprintln!("   (Continuing anyway - tools may be available)");
    }

    let mut manager = ClipManager::from_config(&config, cli.token.as_deref()).await?;

    // the local store is written back however the command ends
    let outcome = tokio::select! {
        result = run(&cli, &mut manager) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, saving local clips");
            Err(anyhow::anyhow!("interrupted"))
        }
        _ = terminate() => {
            tracing::warn!("Terminated, saving local clips");
            Err(anyhow::anyhow!("terminated"))
        }
    };

    if let Err(e) = manager.shutdown() {
        tracing::error!("Failed to save local clips: {}", e);
        if outcome.is_ok() {
            return Err(e.into());
        }
    }

    outcome
}

async fn run(cli: &Cli, manager: &mut ClipManager) -> Result<()> {
    match &cli.command {
        Commands::New { url, start, end } => {
            let uid = manager.new_clip(url, start, end.as_deref()).await?;
            println!("Created clip #{}", uid);
        }
        Commands::Download { uid } => {
            let path = with_spinner(cli.quiet, "Downloading clip...", manager.download(uid)).await?;
            println!("Downloaded to: {}", path.display());
        }
        Commands::Normalize { uid } => {
            let path = with_spinner(cli.quiet, "Normalizing loudness...", manager.normalize(uid)).await?;
            println!("Normalized to: {}", path.display());
        }
        Commands::Upload { uid } => {
            let url = with_spinner(cli.quiet, "Uploading clip...", manager.upload(uid)).await?;
            println!("Uploaded to: {}", url);
        }
        Commands::Publish { uid, category, names } => {
            let names = utils::parse_names(names)?;
            manager.publish(uid, category, names).await?;
            println!("Published clip #{} in {}", uid, category);
        }
        Commands::Generate { url, start, end, category, names } => {
            // parse names up front so a typo does not cost a download
            let names = match category {
                Some(_) => Some(utils::parse_names(names)?),
                None => None,
            };

            let uid = with_spinner(
                cli.quiet,
                "Generating clip...",
                manager.generate(url, start, end.as_deref()),
            )
            .await?;
            println!("Generated clip #{}", uid);

            if let (Some(category), Some(names)) = (category, names) {
                manager.publish(&uid, category, names).await?;
                println!("Published clip #{} in {}", uid, category);
            }
        }
        Commands::Batch { file } => {
            let entries = batch::parse_file(file)
                .with_context(|| format!("Failed to read batch file {}", file.display()))?;
            let total = entries.len();
            let summary = batch::run(manager, entries).await;

            println!("Published {}/{} clips", summary.published.len(), total);
            for (line, error) in &summary.failed {
                println!("  line {}: {}", line, error);
            }
            if !summary.failed.is_empty() {
                anyhow::bail!("{} batch lines failed", summary.failed.len());
            }
        }
        Commands::Info { uid, format } => {
            output::print_clip(manager.info(uid)?, format)?;
        }
        Commands::List { format } => {
            output::print_clips(&manager.list(), format)?;
        }
        Commands::Category { command } => match command {
            CategoryCommands::Add { id, names } => {
                let names = utils::parse_names(names)?;
                manager.add_category(id, names).await?;
                println!("Saved category {}", id);
            }
            CategoryCommands::List => {
                println!("{}", output::format_categories(manager.catalog().await?));
            }
        },
        // handled before connecting
        Commands::Config { .. } => {}
    }

    Ok(())
}

/// Resolves on SIGTERM
#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!("Cannot listen for SIGTERM: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

/// Show a spinner while a long lifecycle step runs
async fn with_spinner<T, F>(quiet: bool, message: &'static str, fut: F) -> clipper::Result<T>
where
    F: Future<Output = clipper::Result<T>>,
{
    if quiet {
        return fut.await;
    }

    let progress = ProgressBar::new_spinner();
    if let Ok(spinner) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        progress.set_style(spinner);
    }
    progress.set_message(message);
    progress.enable_steady_tick(Duration::from_millis(120));

    let result = fut.await;
    match &result {
        Ok(_) => progress.finish_with_message("Done"),
        Err(_) => progress.abandon_with_message("Failed"),
    }
    result
}
