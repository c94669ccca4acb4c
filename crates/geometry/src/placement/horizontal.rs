use super::{PanelLocation, WidgetLocation};
use crate::metrics::PanelMetrics;
use crate::rect::{Rect, Size};
use crate::screen::Screen;

/// Clearance kept between the widget and the active screen's edges.
const SCREEN_EDGE_CLEARANCE: f64 = 4.0;

/// Shared placement core: the widget rides along the anchor's trailing edge at
/// a computed height, and the panel goes right, left or inside the anchor.
pub(super) struct Horizontal<'a> {
	/// Anchor frame, accessibility space.
	pub editor: Rect,
	pub main: &'a Screen,
	pub active: &'a Screen,
	pub metrics: &'a PanelMetrics,
	pub hide_widget: bool,
	pub inside_min_width: f64,
	pub expanded: Size,
}

impl Horizontal<'_> {
	pub fn fixed_to_bottom(&self) -> WidgetLocation {
		let y = self.main.frame.height - self.editor.max_y() + self.metrics.widget_padding;
		self.place(y, Some(false))
	}

	pub fn align_to_cursor(&self, cursor: Option<Rect>) -> WidgetLocation {
		match cursor {
			Some(cursor) => self.place(self.main.frame.height - cursor.max_y(), None),
			None => self.fixed_to_bottom(),
		}
	}

	/// `y` is the proposed widget origin in screen space.
	fn place(&self, y: f64, fixed_alignment: Option<bool>) -> WidgetLocation {
		let m = self.metrics;
		let main_height = self.main.frame.height;
		let active = self.active.frame;
		let editor = self.editor;

		let y = y
			.max(main_height - editor.max_y() + m.widget_padding)
			.max(active.min_y() + SCREEN_EDGE_CLEARANCE);
		let y = y
			.min(active.max_y() - SCREEN_EDGE_CLEARANCE)
			.min(main_height - editor.min_y() - m.widget_height - m.widget_padding);

		let right_widget = Rect::new(editor.max_x() - m.widget_padding - m.widget_width, y, m.widget_width, m.widget_height);
		let right_anchor = if self.hide_widget {
			Rect::new(editor.max_x() - m.widget_padding, y, 0.0, 0.0)
		} else {
			right_widget
		};
		let align_top = fixed_alignment.unwrap_or(y > active.mid_y());

		let right_panel_x = right_anchor.max_x() + m.widget_padding * 2.0 - self.expanded.width;
		let put_right = editor.width < self.inside_min_width && active.max_x() > right_panel_x + m.panel_width;
		if put_right {
			return self.beside(right_widget, right_anchor, right_panel_x, align_top);
		}

		let left_widget = Rect::new(editor.min_x() + m.widget_padding, y, m.widget_width, m.widget_height);
		let left_anchor = if self.hide_widget {
			Rect::new(editor.min_x() + m.widget_padding, y, 0.0, 0.0)
		} else {
			left_widget
		};
		let left_panel_x = left_anchor.min_x() - m.widget_padding * 2.0 - m.panel_width + self.expanded.width;
		let keep_inside = editor.width >= self.inside_min_width && editor.max_x() <= active.max_x();
		if !keep_inside && left_panel_x > active.min_x() {
			return self.beside(left_widget, left_anchor, left_panel_x, align_top);
		}

		let panel_y = if align_top {
			right_anchor.max_y() - m.panel_height - m.widget_height - m.widget_padding
		} else {
			right_anchor.max_y() + m.widget_padding - self.expanded.height
		};
		WidgetLocation {
			widget_frame: right_widget,
			tab_frame: Rect::new(right_anchor.min_x() - m.widget_padding - m.widget_width, right_anchor.y, m.widget_width, m.widget_height),
			default_panel: PanelLocation {
				frame: Rect::new(right_anchor.max_x() - m.panel_width, panel_y, m.panel_width, m.panel_height),
				align_top,
			},
			suggestion_panel: None,
		}
	}

	/// Panel outside the anchor, at `panel_x`, with the tab stacked on the widget.
	fn beside(&self, widget: Rect, anchor: Rect, panel_x: f64, align_top: bool) -> WidgetLocation {
		let m = self.metrics;
		let panel_y = if align_top {
			anchor.max_y() - m.panel_height
		} else {
			anchor.min_y() - self.expanded.height
		};
		let tab_y = if align_top {
			anchor.min_y() - m.widget_height - m.widget_padding
		} else {
			anchor.max_y() + m.widget_padding
		};
		WidgetLocation {
			widget_frame: widget,
			tab_frame: Rect::new(anchor.x, tab_y, m.widget_width, m.widget_height),
			default_panel: PanelLocation {
				frame: Rect::new(panel_x, panel_y, m.panel_width, m.panel_height),
				align_top,
			},
			suggestion_panel: None,
		}
	}
}
