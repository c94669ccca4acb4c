use super::{EditorAnchor, SuggestionLocation};
use crate::metrics::PanelMetrics;
use crate::rect::Rect;
use crate::screen::Screen;

/// Places the suggestion panel right under the first selected line.
///
/// When the host completion panel overlaps that frame the panel moves below
/// the completion panel, then above the line. If neither fits on the active
/// screen there is no nearby location.
pub(super) fn suggestion_near_cursor(
	editor: &EditorAnchor,
	main: &Screen,
	active: &Screen,
	completion_panel: Option<Rect>,
	metrics: &PanelMetrics,
) -> Option<SuggestionLocation> {
	let line = editor.first_line.or(editor.cursor)?;
	let frame = editor.frame;
	if line.max_y() < frame.min_y() || line.min_y() > frame.max_y() {
		return None;
	}

	let main_height = main.frame.height;
	let height = metrics.inline_suggestion_max_height;
	let padding = metrics.inline_suggestion_padding;
	let line_top = main_height - line.min_y();

	let beside_line = SuggestionLocation {
		frame: Rect::new(frame.min_x(), line_top - height + padding, frame.width, height),
		align_top: true,
		first_line_indent: (line.max_x() - frame.min_x() - padding).max(0.0),
		line_height: line.height,
	};

	let Some(completion) = completion_panel.map(|panel| panel.flip_to_screen(main_height)) else {
		return Some(beside_line);
	};
	if !beside_line.frame.intersects(&completion) {
		return Some(beside_line);
	}

	let visible = active.visible_frame;
	let below = beside_line.frame.with_y(completion.min_y() - height);
	if below.min_y() >= visible.min_y() {
		return Some(SuggestionLocation {
			frame: below,
			align_top: true,
			first_line_indent: 0.0,
			line_height: line.height,
		});
	}

	let above = beside_line.frame.with_y(line_top);
	if above.max_y() <= visible.max_y() && !above.intersects(&completion) {
		return Some(SuggestionLocation {
			frame: above,
			align_top: false,
			first_line_indent: 0.0,
			line_height: line.height,
		});
	}

	None
}
