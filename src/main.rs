use anyhow::Context;
use clap::{Parser, Subcommand};
use harness_fs::{
	HarnessConfig, Interrupt, MountChecker, ProcessIntrospector, RetryingDeleter, TreeDeleter,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};

#[derive(Parser)]
#[command(name = "harness-fs")]
#[command(about = "Retrying cleanup and filesystem diagnostics for test harnesses")]
struct Cli {
	/// Configuration file (defaults to ./harness-fs.toml if present)
	#[arg(short, long, global = true)]
	config: Option<PathBuf>,

	/// Enable verbose logging
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Delete files or directories, retrying transient failures
	Delete {
		paths: Vec<PathBuf>,

		/// Delete directories recursively
		#[arg(short, long)]
		tree: bool,

		/// Skip paths that do not exist
		#[arg(short, long)]
		if_exists: bool,

		/// Print tree deletion reports as JSON
		#[arg(long)]
		json: bool,
	},
	/// Check that all mounted filesystems respond
	CheckMounts {
		/// Also fail on duplicate mount points
		#[arg(short, long)]
		strict: bool,
	},
	/// List the open file descriptors of this process
	ListFds,
	/// Print the number of open handles of this process
	HandleCount,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
	let cli = Cli::parse();

	// Initialize tracing
	let level = if cli.verbose {
		Level::DEBUG
	} else {
		Level::INFO
	};
	tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();

	let config = match &cli.config {
		Some(path) => HarnessConfig::load_from(path),
		None => HarnessConfig::load(),
	}
	.context("failed to load configuration")?;

	match cli.command {
		Commands::Delete { paths, tree, if_exists, json } => {
			delete(config, paths, tree, if_exists, json).await
		}
		Commands::CheckMounts { strict } => {
			let checker = MountChecker::new(config.diagnostics);
			let accessible = if strict {
				checker.check_all_mount_points_accessible().await?
			} else {
				checker.check_file_systems_accessible().await?
			};
			info!("Filesystems accessible: {}", accessible);
			Ok(if accessible { ExitCode::SUCCESS } else { ExitCode::FAILURE })
		}
		Commands::ListFds => {
			let introspector = ProcessIntrospector::new(config.diagnostics);
			let mut stdout = std::io::stdout();
			introspector.list_open_file_descriptors(&mut stdout).await?;
			Ok(ExitCode::SUCCESS)
		}
		Commands::HandleCount => {
			let introspector = ProcessIntrospector::new(config.diagnostics);
			println!("{}", introspector.open_handle_count()?);
			Ok(ExitCode::SUCCESS)
		}
	}
}

async fn delete(
	config: HarnessConfig, paths: Vec<PathBuf>, tree: bool, if_exists: bool, json: bool,
) -> anyhow::Result<ExitCode> {
	let interrupt = Interrupt::new();
	let deleter = RetryingDeleter::new(config.retry).with_interrupt(interrupt.clone());

	// Ctrl-C cancels any backoff in progress
	let signal_interrupt = interrupt.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			info!("Interrupt received, cancelling deletion");
			signal_interrupt.interrupt();
		}
	});

	let success = tokio::task::spawn_blocking(move || {
		let tree_deleter = TreeDeleter::new(deleter);
		let mut success = true;
		for path in &paths {
			if interrupt.is_interrupted() {
				success = false;
				break;
			}
			if tree {
				let report = if if_exists {
					tree_deleter.delete_tree_if_exists(path)
				} else {
					tree_deleter.delete_tree(path)
				};
				if json {
					match serde_json::to_string_pretty(&report.summary(path)) {
						Ok(rendered) => println!("{rendered}"),
						Err(e) => error!("Failed to render report: {}", e),
					}
				}
				for failure in report.iter() {
					error!("{}", failure);
				}
				success &= report.is_success();
			} else {
				let result = if if_exists {
					tree_deleter.deleter().delete_if_exists_with_retry(path)
				} else {
					tree_deleter.deleter().delete_with_retry(path)
				};
				if let Err(e) = result {
					error!("{}", e);
					success = false;
				}
			}
		}
		success
	})
	.await
	.context("deletion task panicked")?;

	Ok(if success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
