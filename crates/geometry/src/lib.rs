//! Geometry primitives and placement strategies for overlay surfaces.
//!
//! Everything in this crate is pure: functions take frames, screens and
//! metrics by value or reference and return new values. Nothing here reads
//! window-system state.
//!
//! Two coordinate spaces meet here:
//!
//! * accessibility space: origin at the top-left of the main display, y grows
//!   downward. Host windows, editors and cursor frames arrive in this space.
//! * screen space: origin at the bottom-left of the main display, y grows
//!   upward. Screens and overlay surfaces live in this space.
//!
//! Conversion goes through the main screen's height; see
//! [`Rect::flip_to_screen`].

/// Chat panel frames (default and attached).
pub mod chat;
/// Panel and widget size metrics.
pub mod metrics;
/// Widget/panel placement strategies.
pub mod placement;
/// Points, sizes and rectangles.
pub mod rect;
/// Screens and screen selection.
pub mod screen;

pub use chat::{attached_chat_panel_frame, default_chat_panel_frame, trailing_gap};
pub use metrics::PanelMetrics;
pub use placement::{
	Anchor, EditorAnchor, PanelLocation, PlacementInput, PositioningMode, SuggestionDisplayMode,
	SuggestionLocation, WidgetLocation, compute_widget_location, default_location, expand_window_anchor,
};
pub use rect::{Point, Rect, Size};
pub use screen::{Screen, ScreenSet};
