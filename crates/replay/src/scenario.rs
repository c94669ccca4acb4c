//! TOML scenarios: a screen layout, an optional configuration and a list of
//! steps played against [`MemoryHost`].
//!
//! ```toml
//! [[screens]]
//! frame = { x = 0.0, y = 0.0, width = 1920.0, height = 1080.0 }
//! visible_frame = { x = 0.0, y = 0.0, width = 1920.0, height = 1055.0 }
//!
//! [[steps]]
//! op = "activate"
//! pid = 10
//! kind = "host"
//!
//! [[steps]]
//! op = "wait"
//! ms = 250
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use perch_geometry::{Rect, Screen, ScreenSet};
use perch_overlay::memory::MemoryHost;
use perch_overlay::{AppInfo, AppKind, EditorSnapshot, FocusEvent, GeometryChange, HostWindowSnapshot, OverlayConfig, OverlayController, Pid};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
	pub screens: Vec<Screen>,
	/// Index into `screens` of the active display.
	#[serde(default)]
	pub active_screen: usize,
	#[serde(default)]
	pub config: OverlayConfig,
	#[serde(default)]
	pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
	Activate {
		pid: Pid,
		kind: AppKind,
	},
	FocusWindow {
		window: HostWindowSnapshot,
	},
	MoveWindow {
		window: HostWindowSnapshot,
		#[serde(default)]
		resized: bool,
	},
	/// Registers `window` as the workspace window of its application.
	Workspace {
		window: HostWindowSnapshot,
	},
	FocusEditor {
		pid: Pid,
		frame: Rect,
		#[serde(default)]
		cursor: Option<Rect>,
		#[serde(default)]
		first_line: Option<Rect>,
		#[serde(default)]
		document: Option<Url>,
	},
	/// Moves the focused editor's cursor, then reports `count` selection changes.
	Select {
		#[serde(default)]
		cursor: Option<Rect>,
		#[serde(default = "one")]
		count: usize,
	},
	Scroll,
	CompletionPanel {
		#[serde(default)]
		frame: Option<Rect>,
	},
	Present {
		what: Presentation,
	},
	Wait {
		ms: u64,
	},
}

fn one() -> usize {
	1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
	Suggestion,
	ChatRoom,
	DetachedChat,
	Panel,
	Hide,
}

impl Scenario {
	pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
		let scenario: Self = toml::from_str(input)?;
		if scenario.screens.is_empty() {
			bail!("scenario declares no screens");
		}
		if scenario.active_screen >= scenario.screens.len() {
			bail!("active_screen {} out of range", scenario.active_screen);
		}
		Ok(scenario)
	}

	pub fn load(path: &Path) -> anyhow::Result<Self> {
		let input = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
		Self::from_toml_str(&input).with_context(|| format!("parsing {}", path.display()))
	}

	pub fn screen_set(&self) -> ScreenSet {
		ScreenSet::new(self.screens.clone(), Some(self.active_screen))
	}
}

impl Step {
	fn name(&self) -> &'static str {
		match self {
			Self::Activate { .. } => "activate",
			Self::FocusWindow { .. } => "focus_window",
			Self::MoveWindow { .. } => "move_window",
			Self::Workspace { .. } => "workspace",
			Self::FocusEditor { .. } => "focus_editor",
			Self::Select { .. } => "select",
			Self::Scroll => "scroll",
			Self::CompletionPanel { .. } => "completion_panel",
			Self::Present { .. } => "present",
			Self::Wait { .. } => "wait",
		}
	}

	/// Plays this step. Waits suspend on the runtime clock.
	pub async fn play(&self, host: &MemoryHost, controller: &OverlayController) {
		tracing::debug!(step = self.name(), "replay.step");
		match self {
			Self::Activate { pid, kind } => host.activate(AppInfo::new(*pid, *kind)),
			Self::FocusWindow { window } => host.focus_window(window.clone()),
			Self::MoveWindow { window, resized } => {
				let change = if *resized { GeometryChange::Resized } else { GeometryChange::Moved };
				host.reshape_window(window.clone(), change);
			}
			Self::Workspace { window } => {
				host.put_window(window.clone());
				host.set_workspace_window(window.pid, window.id);
			}
			Self::FocusEditor {
				pid,
				frame,
				cursor,
				first_line,
				document,
			} => {
				host.focus_editor(EditorSnapshot {
					pid: *pid,
					frame: *frame,
					cursor: *cursor,
					selection_first_line: *first_line,
					document: document.clone(),
				});
				host.emit(*pid, FocusEvent::FocusedElementChanged(None));
			}
			Self::Select { cursor, count } => {
				if let Some(cursor) = cursor {
					host.update_editor(|editor| editor.cursor = Some(*cursor));
				}
				for _ in 0..*count {
					host.emit_editor(FocusEvent::SelectionChanged);
				}
			}
			Self::Scroll => host.emit_editor(FocusEvent::ScrollChanged),
			Self::CompletionPanel { frame } => host.set_completion_panel(*frame),
			Self::Present { what } => match what {
				Presentation::Suggestion => controller.suggest_code(),
				Presentation::ChatRoom => controller.present_chat_room(),
				Presentation::DetachedChat => controller.present_detached_global_chat(),
				Presentation::Panel => controller.show_panel(),
				Presentation::Hide => controller.hide_button_clicked(),
			},
			Self::Wait { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
		}
		// Let the observation loops and the actor drain what this step produced.
		tokio::task::yield_now().await;
	}
}
