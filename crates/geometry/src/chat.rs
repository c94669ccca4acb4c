use crate::metrics::PanelMetrics;
use crate::rect::Rect;
use crate::screen::Screen;

/// Frame of a detached chat panel: pinned to the right edge of the visible
/// area, full height, at most 30% of the visible width.
pub fn default_chat_panel_frame(screen: &Screen, metrics: &PanelMetrics) -> Rect {
	let visible = screen.visible_frame;
	let width = metrics.panel_width.min(visible.width * 0.3);
	Rect::new(visible.max_x() - width, visible.min_y(), width, visible.height)
}

/// Horizontal room between a host window (accessibility space) and the right
/// edge of its screen's visible area. Negative when the window overhangs it.
pub fn trailing_gap(host: &Rect, screen: &Screen) -> f64 {
	screen.visible_frame.max_x() - host.max_x()
}

/// Frame of a chat panel docked to the trailing side of `host`.
///
/// The panel fills the trailing gap, never narrower than the configured
/// minimum, and matches the host window's vertical extent.
pub fn attached_chat_panel_frame(host: Rect, host_screen: &Screen, main: &Screen, metrics: &PanelMetrics) -> Rect {
	let width = trailing_gap(&host, host_screen).max(metrics.min_chat_panel_width);
	let x = host_screen.visible_frame.max_x() - width;
	let y = main.frame.max_y() - host.max_y() + main.frame.min_y();
	Rect::new(x, y, width, host.height)
}
