//! Placement strategies for the widget, the default panel and the suggestion
//! panel.
//!
//! [`compute_widget_location`] is the single entry point. It dispatches on the
//! resolved [`Anchor`] and the configured [`PositioningMode`], then overlays the
//! [`SuggestionDisplayMode`] on top of the result. Anchors and cursor frames are
//! accessibility-space rects; every frame in the returned [`WidgetLocation`] is
//! in screen space.

mod horizontal;
mod nearby;

use serde::{Deserialize, Serialize};

use self::horizontal::Horizontal;
use crate::metrics::PanelMetrics;
use crate::rect::{Rect, Size};
use crate::screen::Screen;

/// Where the widget and default panel follow the editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositioningMode {
	/// Anchor to the editor's bottom edge.
	#[default]
	FixedToBottom,
	/// Anchor to the text insertion point.
	AlignToTextCursor,
}

/// How the suggestion panel is presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionDisplayMode {
	/// Share the default panel location.
	#[default]
	Default,
	/// Float directly under the first selected line.
	NearbyTextCursor,
}

/// A panel frame with its vertical growth direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelLocation {
	pub frame: Rect,
	/// Content grows downward from the frame's top edge when set.
	pub align_top: bool,
}

/// The suggestion panel frame when it is placed next to the cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuggestionLocation {
	pub frame: Rect,
	pub align_top: bool,
	/// Horizontal offset of the first rendered line inside the frame.
	pub first_line_indent: f64,
	pub line_height: f64,
}

/// Frames for every anchored surface, recomputed on each placement pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidgetLocation {
	pub widget_frame: Rect,
	pub tab_frame: Rect,
	pub default_panel: PanelLocation,
	pub suggestion_panel: Option<SuggestionLocation>,
}

/// The focused editor, in accessibility space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorAnchor {
	/// Frame of the editor's scroll area.
	pub frame: Rect,
	/// Frame of the text insertion point.
	pub cursor: Option<Rect>,
	/// Frame of the first line of the current selection.
	pub first_line: Option<Rect>,
}

/// What the widget is anchored to for one placement pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
	/// A focused source editor.
	Editor(EditorAnchor),
	/// A generic host window, already expanded by [`expand_window_anchor`].
	Window { frame: Rect, expanded: Size },
	/// No qualifying host element; only the default panel is positioned.
	Unanchored,
}

/// Inputs to [`compute_widget_location`].
#[derive(Debug, Clone, Copy)]
pub struct PlacementInput<'a> {
	pub anchor: &'a Anchor,
	/// Screen with origin `(0, 0)`.
	pub main: Option<&'a Screen>,
	/// Screen the window system reports as current.
	pub active: Option<&'a Screen>,
	pub positioning: PositioningMode,
	pub suggestion: SuggestionDisplayMode,
	/// Host completion panel frame, accessibility space.
	pub completion_panel: Option<Rect>,
	pub hide_circular_widget: bool,
	/// Editors at least this wide keep the panel inside their bounds.
	pub inside_editor_min_width: f64,
}

/// Computes every surface frame for one placement pass.
///
/// Returns `None` when either the main or the active screen is unknown; the
/// caller keeps its previous location in that case.
pub fn compute_widget_location(input: &PlacementInput<'_>, metrics: &PanelMetrics) -> Option<WidgetLocation> {
	let main = input.main?;
	let active = input.active?;

	match input.anchor {
		Anchor::Unanchored => Some(default_location(active, metrics)),
		Anchor::Window { frame, expanded } => {
			let horizontal = Horizontal {
				editor: *frame,
				main,
				active,
				metrics,
				hide_widget: input.hide_circular_widget,
				inside_min_width: f64::INFINITY,
				expanded: *expanded,
			};
			Some(horizontal.fixed_to_bottom())
		}
		Anchor::Editor(editor) => {
			let horizontal = Horizontal {
				editor: editor.frame,
				main,
				active,
				metrics,
				hide_widget: input.hide_circular_widget,
				inside_min_width: input.inside_editor_min_width,
				expanded: Size::ZERO,
			};
			let mut location = match input.positioning {
				PositioningMode::FixedToBottom => horizontal.fixed_to_bottom(),
				PositioningMode::AlignToTextCursor => horizontal.align_to_cursor(editor.cursor),
			};
			if input.suggestion == SuggestionDisplayMode::NearbyTextCursor {
				location.suggestion_panel = nearby::suggestion_near_cursor(editor, main, active, input.completion_panel, metrics);
			}
			Some(location)
		}
	}
}

/// The location used when nothing in the host qualifies as an anchor.
///
/// Widget and tab frames are zero; the default panel is centered on `active`.
pub fn default_location(active: &Screen, metrics: &PanelMetrics) -> WidgetLocation {
	WidgetLocation {
		widget_frame: Rect::ZERO,
		tab_frame: Rect::ZERO,
		default_panel: PanelLocation {
			frame: active.frame.centered(metrics.panel_size()),
			align_top: false,
		},
		suggestion_panel: None,
	}
}

/// Turns a generic host window frame into a widget anchor.
///
/// Workspace windows lose a strip at the bottom so their status bar stays
/// clickable. Other windows grow sideways so the widget sits just outside
/// their edge; the growth is reported as the expansion term.
pub fn expand_window_anchor(frame: Rect, is_workspace: bool, metrics: &PanelMetrics) -> Anchor {
	if is_workspace {
		let height = (frame.height - metrics.workspace_bottom_inset).max(0.0);
		return Anchor::Window {
			frame: Rect::new(frame.x, frame.y, frame.width, height),
			expanded: Size::ZERO,
		};
	}

	let grow = metrics.widget_padding * 2.0 + metrics.widget_width;
	Anchor::Window {
		frame: Rect::new(frame.x - (metrics.widget_padding + metrics.widget_width / 2.0), frame.y, frame.width + grow, frame.height),
		expanded: Size::new(grow / 2.0, metrics.widget_padding),
	}
}
