//! Overlay configuration.
//!
//! Every section is `#[serde(default)]`, so an empty document yields
//! [`OverlayConfig::default`]. Durations are written in milliseconds.
//!
//! ```toml
//! [placement]
//! positioning = "align_to_text_cursor"
//! suggestion = "nearby_text_cursor"
//!
//! [chat]
//! attach_to_host = true
//!
//! [timing]
//! location_interval_ms = 50
//! ```

use std::path::Path;
use std::time::Duration;

use perch_geometry::{PanelMetrics, PositioningMode, SuggestionDisplayMode};
use perch_worker::UpdatePolicy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
	pub placement: PlacementConfig,
	pub chat: ChatConfig,
	pub timing: TimingConfig,
	pub metrics: PanelMetrics,
}

/// How the widget and panels follow the host editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
	pub positioning: PositioningMode,
	pub suggestion: SuggestionDisplayMode,
	/// Collapse the widget to a zero-size anchor when placing panels.
	pub hide_circular_widget: bool,
	/// Editors at least this wide keep the default panel inside their bounds.
	pub inside_editor_min_width: f64,
}

impl Default for PlacementConfig {
	fn default() -> Self {
		Self {
			positioning: PositioningMode::default(),
			suggestion: SuggestionDisplayMode::default(),
			hide_circular_widget: false,
			inside_editor_min_width: 1400.0,
		}
	}
}

/// Chat panel attachment and stacking behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
	/// Dock the chat panel to the host window's trailing edge.
	pub attach_to_host: bool,
	pub disable_float_on_top_when_detached: bool,
	/// With the above set, still float while the panel overlaps a host window.
	pub keep_float_on_top_when_overlapping: bool,
}

impl Default for ChatConfig {
	fn default() -> Self {
		Self {
			attach_to_host: false,
			disable_float_on_top_when_detached: false,
			keep_float_on_top_when_overlapping: true,
		}
	}
}

/// Scheduler constants, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
	/// Debounce quiet window for opacity updates.
	pub opacity_quiet_ms: u64,
	/// Opacity requests later than this after the previous one apply at once.
	pub opacity_gate_ms: u64,
	/// Minimum spacing between location applies.
	pub location_interval_ms: u64,
	/// Delay after the completion panel hides before recomputing.
	pub completion_settle_ms: u64,
}

impl Default for TimingConfig {
	fn default() -> Self {
		Self {
			opacity_quiet_ms: 200,
			opacity_gate_ms: 3_000,
			location_interval_ms: 50,
			completion_settle_ms: 400,
		}
	}
}

impl TimingConfig {
	pub fn opacity_policy(&self) -> UpdatePolicy {
		UpdatePolicy::Debounce {
			quiet: Duration::from_millis(self.opacity_quiet_ms),
			gate: Duration::from_millis(self.opacity_gate_ms),
		}
	}

	pub fn location_policy(&self) -> UpdatePolicy {
		UpdatePolicy::Throttle {
			interval: Duration::from_millis(self.location_interval_ms),
		}
	}

	pub fn completion_settle(&self) -> Duration {
		Duration::from_millis(self.completion_settle_ms)
	}
}

impl OverlayConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads, parses and validates the file at `path`.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&input)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if let Some(field) = self.metrics.first_non_positive() {
			return Err(ConfigError::Invalid {
				field,
				reason: "must be greater than zero",
			});
		}
		let min_width = self.placement.inside_editor_min_width;
		if min_width <= 0.0 || min_width.is_nan() {
			return Err(ConfigError::Invalid {
				field: "inside_editor_min_width",
				reason: "must be greater than zero",
			});
		}
		if self.timing.opacity_quiet_ms == 0 {
			return Err(ConfigError::Invalid {
				field: "opacity_quiet_ms",
				reason: "must be greater than zero",
			});
		}
		if self.timing.location_interval_ms == 0 {
			return Err(ConfigError::Invalid {
				field: "location_interval_ms",
				reason: "must be greater than zero",
			});
		}
		Ok(())
	}
}
