use serde::{Deserialize, Serialize};

use crate::rect::Size;

/// Sizes and paddings used by every placement strategy.
///
/// The defaults are empirically chosen UI constants. Only their rough
/// magnitude matters to the placement rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelMetrics {
	pub widget_width: f64,
	pub widget_height: f64,
	/// Gap between the widget and the editor edge, and between widget and panel.
	pub widget_padding: f64,
	pub panel_width: f64,
	pub panel_height: f64,
	/// Narrowest trailing gap the attached chat panel accepts.
	pub min_chat_panel_width: f64,
	pub inline_suggestion_max_height: f64,
	pub inline_suggestion_padding: f64,
	/// Generic host windows at or below this height never anchor the widget.
	pub min_window_height: f64,
	/// Bottom strip of workspace windows kept clear of the widget.
	pub workspace_bottom_inset: f64,
}

impl Default for PanelMetrics {
	fn default() -> Self {
		Self {
			widget_width: 30.0,
			widget_height: 30.0,
			widget_padding: 4.0,
			panel_width: 454.0,
			panel_height: 530.0,
			min_chat_panel_width: 242.0,
			inline_suggestion_max_height: 400.0,
			inline_suggestion_padding: 6.0,
			min_window_height: 300.0,
			workspace_bottom_inset: 40.0,
		}
	}
}

impl PanelMetrics {
	pub fn widget_size(&self) -> Size {
		Size::new(self.widget_width, self.widget_height)
	}

	pub fn panel_size(&self) -> Size {
		Size::new(self.panel_width, self.panel_height)
	}

	/// Returns the first non-positive field name, if any.
	pub fn first_non_positive(&self) -> Option<&'static str> {
		[
			("widget_width", self.widget_width),
			("widget_height", self.widget_height),
			("panel_width", self.panel_width),
			("panel_height", self.panel_height),
			("min_chat_panel_width", self.min_chat_panel_width),
			("inline_suggestion_max_height", self.inline_suggestion_max_height),
			("min_window_height", self.min_window_height),
		]
		.into_iter()
		.find(|(_, value)| *value <= 0.0 || value.is_nan())
		.map(|(name, _)| name)
	}
}
