//! Perch replay harness.
//!
//! Plays a TOML scenario of host notifications against the overlay controller
//! wired to in-memory collaborators, then reports where every surface ended up
//! and how many attribute changes it took to get there.

mod scenario;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use perch_overlay::memory::{MemoryHost, MemoryStore, SurfaceProbes, memory_surfaces};
use perch_overlay::{OverlayConfig, OverlayController, StateStore};
use tracing::info;

use crate::scenario::Scenario;

/// Replay command line arguments.
#[derive(Parser, Debug)]
#[command(name = "perch-replay")]
#[command(about = "Replay a host notification scenario against the overlay controller")]
struct Args {
	/// Scenario file
	#[arg(value_name = "SCENARIO")]
	scenario: PathBuf,

	/// Overlay configuration, replacing the scenario's own
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	let scenario = Scenario::load(&args.scenario)?;
	let config = match &args.config {
		Some(path) => OverlayConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
		None => scenario.config.clone(),
	};
	info!(scenario = %args.scenario.display(), steps = scenario.steps.len(), "starting replay");

	let probes = replay(&scenario, config).await?;
	report(&probes);
	Ok(())
}

async fn replay(scenario: &Scenario, config: OverlayConfig) -> anyhow::Result<SurfaceProbes> {
	let host = Arc::new(MemoryHost::new(scenario.screen_set()));
	let store = Arc::new(MemoryStore::new());
	let (surfaces, probes) = memory_surfaces();
	let controller = OverlayController::new(config, host.clone(), store.clone(), surfaces)?;
	controller.start()?;

	for step in &scenario.steps {
		step.play(&host, &controller).await;
	}
	// Give trailing deferred units a chance to fire before stopping.
	tokio::time::sleep(std::time::Duration::from_millis(500)).await;
	controller.shutdown().await?;

	let state = store.current_state();
	info!(
		actions = store.actions().len(),
		panel_displayed = state.panel_displayed,
		chat_detached = state.chat_detached,
		"replay finished"
	);
	Ok(probes)
}

fn report(probes: &SurfaceProbes) {
	for probe in probes.iter() {
		let state = probe.state();
		info!(
			surface = probe.kind().as_str(),
			frame = ?state.frame,
			opacity = ?state.opacity,
			hidden = state.hidden,
			level = ?state.level,
			changes = probe.history().len(),
			"surface"
		);
	}
}

fn setup_tracing(verbose: bool) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::fmt::format::FmtSpan;
	use tracing_subscriber::prelude::*;

	let filter = || {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| {
			if verbose {
				EnvFilter::new("perch=trace,debug")
			} else {
				EnvFilter::new("perch=debug,info")
			}
		})
	};

	// PERCH_LOG_DIR keeps a per-run log next to stderr output.
	if let Some(log_dir) = std::env::var("PERCH_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("perch-replay.{}.log", std::process::id()));

		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_span_events(FmtSpan::CLOSE)
				.with_target(true);

			tracing_subscriber::registry()
				.with(filter())
				.with(file_layer)
				.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
				.init();

			tracing::info!(path = ?log_path, "replay tracing initialized");
			return;
		}
	}

	tracing_subscriber::fmt().with_env_filter(filter()).with_writer(std::io::stderr).init();
}

#[cfg(test)]
mod tests {
	use perch_geometry::Rect;
	use pretty_assertions::assert_eq;

	use super::*;

	#[tokio::test(flavor = "current_thread", start_paused = true)]
	async fn sample_scenario_places_widget_beside_editor() {
		let scenario = Scenario::from_toml_str(include_str!("../scenarios/editor_follow.toml")).unwrap();
		let probes = replay(&scenario, scenario.config.clone()).await.unwrap();

		assert_eq!(probes.widget.frame(), Rect::new(966.0, 384.0, 30.0, 30.0));
		assert!(!probes.widget.is_hidden());
		assert!(!probes.chat_panel.is_hidden());
	}
}
