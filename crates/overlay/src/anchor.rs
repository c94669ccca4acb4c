use perch_geometry::{Anchor, EditorAnchor, PanelMetrics, expand_window_anchor};

use crate::host::{Accessibility, AppKind, HostWindowSnapshot, Pid};

/// Resolves what the widget anchors to for the current focus.
///
/// The focused editor wins. Without one, the focused window anchors if it is
/// tall enough and not a menu; quick-open panels, alerts and anything else
/// that does not qualify defer to the workspace window. With no workspace
/// window either, nothing anchors.
pub(crate) fn resolve(ax: &dyn Accessibility, metrics: &PanelMetrics) -> Anchor {
	let Some(pid) = anchor_pid(ax) else {
		return Anchor::Unanchored;
	};

	if let Some(editor) = ax.focused_editor().filter(|editor| editor.pid == pid) {
		return Anchor::Editor(EditorAnchor {
			frame: editor.frame,
			cursor: editor.cursor,
			first_line: editor.selection_first_line,
		});
	}

	match ax.focused_window(pid) {
		Some(window) if qualifies(&window, metrics) => expand_window_anchor(window.frame, window.is_workspace(), metrics),
		Some(window) => {
			tracing::trace!(pid, role = ?window.role, "overlay.anchor.window_rejected");
			workspace(ax, pid, metrics)
		}
		None => workspace(ax, pid, metrics),
	}
}

/// The host process whose elements anchor the widget.
fn anchor_pid(ax: &dyn Accessibility) -> Option<Pid> {
	let active = ax.active_application()?;
	match active.kind {
		AppKind::Host => Some(active.pid),
		AppKind::ExtensionService => ax.latest_active_host().map(|host| host.pid),
		AppKind::Other => None,
	}
}

fn qualifies(window: &HostWindowSnapshot, metrics: &PanelMetrics) -> bool {
	!window.is_quick_open() && !window.is_alert() && !window.is_menu() && window.frame.height > metrics.min_window_height
}

fn workspace(ax: &dyn Accessibility, pid: Pid, metrics: &PanelMetrics) -> Anchor {
	ax.workspace_window(pid)
		.map(|window| expand_window_anchor(window.frame, true, metrics))
		.unwrap_or(Anchor::Unanchored)
}
