//! Pure visibility and stacking decisions.

use perch_geometry::Rect;

use crate::config::ChatConfig;
use crate::host::AppKind;
use crate::store::StateSnapshot;
use crate::surface::WindowLevel;

/// Inputs to [`visibility`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct VisibilityInput<'a> {
	pub active: AppKind,
	/// The host relevant to `active` has a focused window.
	pub host_has_window: bool,
	pub previous_was_host: bool,
	pub state: &'a StateSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VisibilityPlan {
	/// Shared panel, suggestion panel and toast.
	pub panels_hidden: bool,
	pub widget_hidden: bool,
	pub chat_hidden: bool,
}

pub(crate) fn visibility(input: &VisibilityInput<'_>) -> VisibilityPlan {
	let (panels_hidden, widget_hidden) = match input.active {
		AppKind::Host => (!input.host_has_window, !input.host_has_window),
		AppKind::ExtensionService => (!input.host_has_window, !input.host_has_window || !input.previous_was_host),
		AppKind::Other => (true, true),
	};

	// A detached chat survives without a host window while something is on it.
	let requested = input.state.panel_displayed || input.state.has_chat_tabs();
	let chat_hidden = if input.state.chat_detached {
		panels_hidden && !requested
	} else {
		panels_hidden
	};

	VisibilityPlan {
		panels_hidden,
		widget_hidden,
		chat_hidden,
	}
}

/// Stacking level for the chat panel.
///
/// `host_windows` are the most recently active host's windows in screen
/// space, or `None` when no host has been seen; the level is then left
/// unchanged.
pub(crate) fn chat_level(config: &ChatConfig, detached: bool, active: Option<AppKind>, chat_frame: Rect, host_windows: Option<&[Rect]>) -> Option<WindowLevel> {
	if !config.disable_float_on_top_when_detached || !detached {
		return Some(WindowLevel::Floating);
	}
	let host_related = matches!(active, Some(AppKind::Host | AppKind::ExtensionService));
	if !config.keep_float_on_top_when_overlapping || !host_related {
		return Some(WindowLevel::Normal);
	}
	let overlapping = host_windows?.iter().any(|frame| frame.intersects(&chat_frame));
	Some(if overlapping { WindowLevel::Floating } else { WindowLevel::Normal })
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn state(displayed: bool, detached: bool, tabs: usize) -> StateSnapshot {
		StateSnapshot {
			panel_displayed: displayed,
			chat_detached: detached,
			chat_tabs: (0..tabs).map(|idx| format!("tab {idx}")).collect(),
			focusing_document_url: None,
		}
	}

	fn plan(active: AppKind, has_window: bool, previous_was_host: bool, state: &StateSnapshot) -> VisibilityPlan {
		visibility(&VisibilityInput {
			active,
			host_has_window: has_window,
			previous_was_host,
			state,
		})
	}

	#[test]
	fn host_with_window_shows_everything() {
		let state = state(false, false, 0);
		assert_eq!(
			plan(AppKind::Host, true, false, &state),
			VisibilityPlan {
				panels_hidden: false,
				widget_hidden: false,
				chat_hidden: false,
			}
		);
	}

	#[test]
	fn host_without_window_keeps_requested_detached_chat() {
		let hidden = plan(AppKind::Host, false, false, &state(false, true, 0));
		assert!(hidden.panels_hidden && hidden.widget_hidden && hidden.chat_hidden);

		let displayed = plan(AppKind::Host, false, false, &state(true, true, 0));
		assert!(displayed.panels_hidden && !displayed.chat_hidden);

		let tabs = plan(AppKind::Host, false, false, &state(false, true, 1));
		assert!(!tabs.chat_hidden);

		let attached = plan(AppKind::Host, false, false, &state(true, false, 2));
		assert!(attached.chat_hidden);
	}

	#[test]
	fn extension_service_widget_needs_previous_host() {
		let state = state(false, false, 0);
		let after_host = plan(AppKind::ExtensionService, true, true, &state);
		assert!(!after_host.panels_hidden && !after_host.widget_hidden);

		let after_other = plan(AppKind::ExtensionService, true, false, &state);
		assert!(!after_other.panels_hidden && after_other.widget_hidden);

		let no_window = plan(AppKind::ExtensionService, false, true, &state);
		assert!(no_window.panels_hidden && no_window.widget_hidden);
	}

	#[test]
	fn other_app_hides_all_but_requested_detached_chat() {
		let bare = plan(AppKind::Other, true, true, &state(false, true, 0));
		assert!(bare.panels_hidden && bare.widget_hidden && bare.chat_hidden);
		assert!(!plan(AppKind::Other, true, true, &state(false, true, 3)).chat_hidden);
		assert!(plan(AppKind::Other, true, true, &state(true, false, 0)).chat_hidden);
	}

	fn chat(disable: bool, keep: bool) -> ChatConfig {
		ChatConfig {
			attach_to_host: false,
			disable_float_on_top_when_detached: disable,
			keep_float_on_top_when_overlapping: keep,
		}
	}

	#[test]
	fn chat_floats_unless_detached_with_setting() {
		let frame = Rect::new(0.0, 0.0, 10.0, 10.0);
		assert_eq!(chat_level(&chat(false, true), true, None, frame, None), Some(WindowLevel::Floating));
		assert_eq!(chat_level(&chat(true, true), false, None, frame, None), Some(WindowLevel::Floating));
	}

	#[test]
	fn detached_chat_floats_only_over_host_windows() {
		let frame = Rect::new(1500.0, 0.0, 400.0, 1000.0);
		let overlapping = [Rect::new(0.0, 0.0, 1600.0, 1000.0)];
		let clear = [Rect::new(0.0, 0.0, 1400.0, 1000.0)];
		let config = chat(true, true);

		assert_eq!(
			chat_level(&config, true, Some(AppKind::Host), frame, Some(&overlapping)),
			Some(WindowLevel::Floating)
		);
		assert_eq!(
			chat_level(&config, true, Some(AppKind::ExtensionService), frame, Some(&clear)),
			Some(WindowLevel::Normal)
		);
		assert_eq!(chat_level(&config, true, Some(AppKind::Host), frame, None), None);
		assert_eq!(
			chat_level(&config, true, Some(AppKind::Other), frame, Some(&overlapping)),
			Some(WindowLevel::Normal)
		);
		assert_eq!(
			chat_level(&chat(true, false), true, Some(AppKind::Host), frame, Some(&overlapping)),
			Some(WindowLevel::Normal)
		);
	}
}
