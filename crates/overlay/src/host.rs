//! The host-facing accessibility interface and the snapshots it produces.
//!
//! Frames reported through this module are in accessibility space (top-left
//! origin, y down). Screens are in screen space.

use futures::stream::BoxStream;
use perch_geometry::{Rect, Screen, ScreenSet};
use serde::{Deserialize, Serialize};
use url::Url;

/// Process identifier of a running application.
pub type Pid = i32;

/// Opaque window identifier assigned by the accessibility layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

/// What an application is relative to the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppKind {
	/// The host application the overlay follows.
	Host,
	/// The host's auxiliary extension-service process.
	ExtensionService,
	Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppInfo {
	pub pid: Pid,
	pub kind: AppKind,
}

impl AppInfo {
	pub const fn new(pid: Pid, kind: AppKind) -> Self {
		Self { pid, kind }
	}

	pub fn is_host(&self) -> bool {
		self.kind == AppKind::Host
	}
}

/// Accessibility role of a window element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowRole {
	#[default]
	Window,
	MenuBar,
	MenuBarItem,
	Other(String),
}

/// One captured state of a host window. Superseded, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostWindowSnapshot {
	pub id: WindowId,
	pub frame: Rect,
	#[serde(default)]
	pub full_screen: bool,
	#[serde(default)]
	pub role: WindowRole,
	/// Host-assigned identifier such as `workspace` or `open_quickly`.
	#[serde(default)]
	pub identifier: Option<String>,
	/// Subrole-style label such as `alert`.
	#[serde(default)]
	pub label: Option<String>,
	pub pid: Pid,
}

impl HostWindowSnapshot {
	pub fn is_menu(&self) -> bool {
		matches!(self.role, WindowRole::MenuBar | WindowRole::MenuBarItem)
	}

	pub fn is_quick_open(&self) -> bool {
		self.identifier.as_deref() == Some("open_quickly")
	}

	pub fn is_alert(&self) -> bool {
		self.label.as_deref() == Some("alert")
	}

	pub fn is_workspace(&self) -> bool {
		self.identifier.as_deref() == Some("workspace")
	}
}

/// The focused source editor element.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorSnapshot {
	pub pid: Pid,
	/// Scroll-area frame.
	pub frame: Rect,
	/// Text insertion point.
	pub cursor: Option<Rect>,
	/// First line of the current selection.
	pub selection_first_line: Option<Rect>,
	pub document: Option<Url>,
}

/// Reference to a focused editor element, yielded by the editor stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EditorHandle {
	pub id: u64,
	pub pid: Pid,
}

/// The host's completion panel while it is on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelHandle {
	pub frame: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryChange {
	Moved,
	Resized,
}

/// A raw notification from one observed element.
#[derive(Debug, Clone, PartialEq)]
pub enum FocusEvent {
	FocusedWindowChanged(HostWindowSnapshot),
	FocusedElementChanged(Option<HostWindowSnapshot>),
	ApplicationActivated,
	ApplicationDeactivated,
	MainWindowChanged(HostWindowSnapshot),
	WindowMiniaturized(HostWindowSnapshot),
	WindowDeminiaturized(HostWindowSnapshot),
	GeometryChanged {
		window: HostWindowSnapshot,
		change: GeometryChange,
	},
	SelectionChanged,
	ScrollChanged,
	CompletionPanelVisibilityChanged(bool),
	WindowCreated,
	ElementDestroyed,
	TitleChanged,
}

impl FocusEvent {
	pub fn name(&self) -> &'static str {
		match self {
			Self::FocusedWindowChanged(_) => "focused_window_changed",
			Self::FocusedElementChanged(_) => "focused_element_changed",
			Self::ApplicationActivated => "application_activated",
			Self::ApplicationDeactivated => "application_deactivated",
			Self::MainWindowChanged(_) => "main_window_changed",
			Self::WindowMiniaturized(_) => "window_miniaturized",
			Self::WindowDeminiaturized(_) => "window_deminiaturized",
			Self::GeometryChanged { .. } => "geometry_changed",
			Self::SelectionChanged => "selection_changed",
			Self::ScrollChanged => "scroll_changed",
			Self::CompletionPanelVisibilityChanged(_) => "completion_panel_visibility_changed",
			Self::WindowCreated => "window_created",
			Self::ElementDestroyed => "element_destroyed",
			Self::TitleChanged => "title_changed",
		}
	}
}

/// Element whose notifications are observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObserveTarget {
	Application(Pid),
	Editor(EditorHandle),
}

/// Accessibility and window-system queries the controller depends on.
///
/// Stream methods are called once per observation loop; queries are cheap
/// synchronous reads of the latest known state.
pub trait Accessibility: Send + Sync + 'static {
	/// Every application activation, in order.
	fn active_applications(&self) -> BoxStream<'static, AppInfo>;

	/// Every change of the focused editor element.
	fn focused_editors(&self) -> BoxStream<'static, EditorHandle>;

	/// The completion panel appearing (`Some`) or disappearing (`None`).
	fn completion_panels(&self) -> BoxStream<'static, Option<PanelHandle>>;

	/// Notifications for one application or editor element.
	fn notifications(&self, target: ObserveTarget) -> BoxStream<'static, FocusEvent>;

	fn active_application(&self) -> Option<AppInfo>;

	/// The application that was active before the current one.
	fn previous_active_application(&self) -> Option<AppInfo>;

	/// The most recently active host instance.
	fn latest_active_host(&self) -> Option<AppInfo>;

	fn focused_window(&self, pid: Pid) -> Option<HostWindowSnapshot>;

	/// The host's primary workspace window.
	fn workspace_window(&self, pid: Pid) -> Option<HostWindowSnapshot>;

	fn windows(&self, pid: Pid) -> Vec<HostWindowSnapshot>;

	fn focused_editor(&self) -> Option<EditorSnapshot>;

	/// Document shown by the focused editor of `pid`, read live.
	fn realtime_document_url(&self, pid: Pid) -> Option<Url>;

	fn screens(&self) -> ScreenSet;

	/// The screen containing most of `window`.
	fn screen_of(&self, window: &HostWindowSnapshot) -> Option<Screen>;

	fn completion_panel_frame(&self) -> Option<Rect>;
}
