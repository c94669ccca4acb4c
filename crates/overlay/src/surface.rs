//! Overlay surfaces and the orchestrator-owned set of them.

use perch_geometry::{Rect, WidgetLocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opacity {
	Visible,
	Hidden,
}

impl Opacity {
	pub fn from_hidden(hidden: bool) -> Self {
		if hidden { Self::Hidden } else { Self::Visible }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowLevel {
	Normal,
	Floating,
}

/// A window-system surface. Implementations apply each setter immediately.
pub trait Surface: Send {
	fn frame(&self) -> Rect;
	fn set_frame(&mut self, frame: Rect);
	fn opacity(&self) -> Opacity;
	fn set_opacity(&mut self, opacity: Opacity);
	/// Ordered out of the window list, independent of opacity.
	fn is_hidden(&self) -> bool;
	fn set_hidden(&mut self, hidden: bool);
	fn level(&self) -> WindowLevel;
	fn set_level(&mut self, level: WindowLevel);
	/// Whether clicks may make the surface the key window.
	fn can_become_key(&self) -> bool;
	fn set_can_become_key(&mut self, key: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
	Widget,
	SharedPanel,
	SuggestionPanel,
	ChatPanel,
	Toast,
}

impl SurfaceKind {
	pub const ALL: [SurfaceKind; 5] = [Self::Widget, Self::SharedPanel, Self::SuggestionPanel, Self::ChatPanel, Self::Toast];

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Widget => "widget",
			Self::SharedPanel => "shared_panel",
			Self::SuggestionPanel => "suggestion_panel",
			Self::ChatPanel => "chat_panel",
			Self::Toast => "toast",
		}
	}

	/// Whether the surface may take keyboard focus. Only the chat panel
	/// accepts typing; everything else must leave the host's focus alone.
	pub const fn can_become_key(self) -> bool {
		matches!(self, Self::ChatPanel)
	}

	/// Whether the surface is framed to the default panel location.
	pub const fn follows_default_panel(self) -> bool {
		matches!(self, Self::SharedPanel | Self::Toast | Self::ChatPanel)
	}
}

/// Every overlay surface, created before the controller starts.
pub struct Surfaces {
	widget: Box<dyn Surface>,
	shared_panel: Box<dyn Surface>,
	suggestion_panel: Box<dyn Surface>,
	chat_panel: Box<dyn Surface>,
	toast: Box<dyn Surface>,
}

impl Surfaces {
	pub fn new(
		widget: Box<dyn Surface>,
		shared_panel: Box<dyn Surface>,
		suggestion_panel: Box<dyn Surface>,
		chat_panel: Box<dyn Surface>,
		toast: Box<dyn Surface>,
	) -> Self {
		Self {
			widget,
			shared_panel,
			suggestion_panel,
			chat_panel,
			toast,
		}
	}

	pub(crate) fn get(&self, kind: SurfaceKind) -> &dyn Surface {
		match kind {
			SurfaceKind::Widget => self.widget.as_ref(),
			SurfaceKind::SharedPanel => self.shared_panel.as_ref(),
			SurfaceKind::SuggestionPanel => self.suggestion_panel.as_ref(),
			SurfaceKind::ChatPanel => self.chat_panel.as_ref(),
			SurfaceKind::Toast => self.toast.as_ref(),
		}
	}

	fn get_mut(&mut self, kind: SurfaceKind) -> &mut dyn Surface {
		match kind {
			SurfaceKind::Widget => self.widget.as_mut(),
			SurfaceKind::SharedPanel => self.shared_panel.as_mut(),
			SurfaceKind::SuggestionPanel => self.suggestion_panel.as_mut(),
			SurfaceKind::ChatPanel => self.chat_panel.as_mut(),
			SurfaceKind::Toast => self.toast.as_mut(),
		}
	}

	/// Sets the frame if it differs. Returns whether the surface changed.
	pub(crate) fn set_frame(&mut self, kind: SurfaceKind, frame: Rect) -> bool {
		let surface = self.get_mut(kind);
		if surface.frame() == frame {
			return false;
		}
		surface.set_frame(frame);
		tracing::trace!(surface = kind.as_str(), ?frame, "overlay.surface.frame");
		true
	}

	pub(crate) fn set_opacity(&mut self, kind: SurfaceKind, opacity: Opacity) -> bool {
		let surface = self.get_mut(kind);
		if surface.opacity() == opacity {
			return false;
		}
		surface.set_opacity(opacity);
		tracing::trace!(surface = kind.as_str(), ?opacity, "overlay.surface.opacity");
		true
	}

	pub(crate) fn set_hidden(&mut self, kind: SurfaceKind, hidden: bool) -> bool {
		let surface = self.get_mut(kind);
		if surface.is_hidden() == hidden {
			return false;
		}
		surface.set_hidden(hidden);
		tracing::trace!(surface = kind.as_str(), hidden, "overlay.surface.hidden");
		true
	}

	pub(crate) fn set_level(&mut self, kind: SurfaceKind, level: WindowLevel) -> bool {
		let surface = self.get_mut(kind);
		if surface.level() == level {
			return false;
		}
		surface.set_level(level);
		tracing::trace!(surface = kind.as_str(), ?level, "overlay.surface.level");
		true
	}

	pub(crate) fn set_can_become_key(&mut self, kind: SurfaceKind, key: bool) -> bool {
		let surface = self.get_mut(kind);
		if surface.can_become_key() == key {
			return false;
		}
		surface.set_can_become_key(key);
		tracing::trace!(surface = kind.as_str(), key, "overlay.surface.key");
		true
	}

	/// Shows or hides a surface: ordered in or out, alpha to match.
	pub(crate) fn set_visible(&mut self, kind: SurfaceKind, visible: bool) {
		self.set_hidden(kind, !visible);
		self.set_opacity(kind, Opacity::from_hidden(!visible));
	}

	/// Frames every surface from `location`.
	///
	/// The suggestion panel only moves when a nearby location was computed.
	/// The chat panel moves only when `frame_chat` is set.
	pub(crate) fn apply_location(&mut self, location: &WidgetLocation, frame_chat: bool) {
		self.set_frame(SurfaceKind::Widget, location.widget_frame);
		if let Some(suggestion) = location.suggestion_panel {
			self.set_frame(SurfaceKind::SuggestionPanel, suggestion.frame);
		}
		for kind in SurfaceKind::ALL {
			if !kind.follows_default_panel() || (kind == SurfaceKind::ChatPanel && !frame_chat) {
				continue;
			}
			self.set_frame(kind, location.default_panel.frame);
		}
	}
}
