//! Tracks the focused host application for the attached chat mode.

use perch_geometry::{PanelMetrics, Rect, Screen, attached_chat_panel_frame, trailing_gap};

use crate::host::{HostWindowSnapshot, Pid};

/// Last known state of one tracked host application.
///
/// The previous entry is a lookup record only; it keeps the geometry it last
/// saw, never the application's resources.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedApp {
	pub pid: Pid,
	pub window: HostWindowSnapshot,
	pub screen: Screen,
}

/// Why an attachment pass left the chat panel alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachSkip {
	FullScreen,
	Disabled,
	PanelNotDisplayed,
	ChatHidden,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttachOutcome {
	Skip(AttachSkip),
	Apply(Rect),
}

/// Inputs to one attachment pass.
#[derive(Debug, Clone, Copy)]
pub struct AttachRequest<'a> {
	pub window: &'a HostWindowSnapshot,
	/// Screen holding `window`.
	pub screen: &'a Screen,
	pub main: &'a Screen,
	/// Current chat panel frame, screen space.
	pub chat_frame: Rect,
	pub attach_enabled: bool,
	pub panel_displayed: bool,
	pub chat_hidden: bool,
}

#[derive(Debug, Default)]
pub struct AttachmentTracker {
	current: Option<TrackedApp>,
	previous: Option<TrackedApp>,
}

impl AttachmentTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records `window` as the latest snapshot of its application.
	///
	/// The current entry moves to `previous` only when the process changes.
	/// Returns whether it did.
	pub fn observe(&mut self, window: &HostWindowSnapshot, screen: Screen) -> bool {
		let entry = TrackedApp {
			pid: window.pid,
			window: window.clone(),
			screen,
		};
		match &mut self.current {
			Some(current) if current.pid == window.pid => {
				*current = entry;
				false
			}
			_ => {
				self.previous = self.current.replace(entry);
				true
			}
		}
	}

	/// Computes the chat frame for `request`.
	///
	/// `app_changed` is the value [`observe`](Self::observe) returned for
	/// this snapshot.
	pub fn attached_frame(&self, request: &AttachRequest<'_>, app_changed: bool, metrics: &PanelMetrics) -> AttachOutcome {
		if request.window.full_screen && !app_changed {
			return AttachOutcome::Skip(AttachSkip::FullScreen);
		}
		if !request.attach_enabled {
			return AttachOutcome::Skip(AttachSkip::Disabled);
		}
		if !request.panel_displayed {
			return AttachOutcome::Skip(AttachSkip::PanelNotDisplayed);
		}
		if request.chat_hidden {
			return AttachOutcome::Skip(AttachSkip::ChatHidden);
		}

		let frame = attached_chat_panel_frame(request.window.frame, request.screen, request.main, metrics);
		if trailing_gap(&request.window.frame, request.screen) >= metrics.min_chat_panel_width {
			return AttachOutcome::Apply(frame);
		}

		let previous_cramped = self.previous.as_ref().is_some_and(|previous| {
			previous.pid != request.window.pid
				&& trailing_gap(&previous.window.frame, &previous.screen) < metrics.min_chat_panel_width
				&& previous.screen.frame.intersects(&request.chat_frame)
		});
		if previous_cramped {
			return AttachOutcome::Apply(Rect::new(request.chat_frame.x, frame.y, request.chat_frame.width, frame.height));
		}
		AttachOutcome::Apply(frame)
	}

	pub fn current(&self) -> Option<&TrackedApp> {
		self.current.as_ref()
	}

	pub fn previous(&self) -> Option<&TrackedApp> {
		self.previous.as_ref()
	}
}
