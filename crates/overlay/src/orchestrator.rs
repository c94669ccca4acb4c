//! The serialized mutation domain.
//!
//! [`Orchestrator`] owns every surface, the attachment tracker and both update
//! schedulers. It runs as a single actor task draining [`Command`]s, so no two
//! observation loops ever interleave writes to a surface.
//!
//! Deferred units (debounced opacity, throttled location, completion settle)
//! fire by sending [`Command::Fire`] back into the same queue. The actor
//! re-checks the unit's generation before acting, which is what makes a
//! cancelled or superseded unit a no-op even when its timer already elapsed.

mod policy;

use std::sync::Arc;

use perch_geometry::{Anchor, PlacementInput, compute_widget_location, default_chat_panel_frame};
use perch_worker::{Admission, Deferred, UpdateScheduler};
use tokio::sync::mpsc;
use tokio::time::Instant;

use self::policy::VisibilityInput;
use crate::anchor;
use crate::attachment::{AttachOutcome, AttachRequest, AttachmentTracker};
use crate::config::OverlayConfig;
use crate::host::{Accessibility, AppInfo, AppKind, HostWindowSnapshot};
use crate::normalizer::{Reaction, Signal};
use crate::store::{Action, StateStore};
use crate::surface::{Opacity, SurfaceKind, Surfaces, WindowLevel};

/// Message into the orchestrator actor.
#[derive(Debug)]
pub(crate) enum Command {
	Signal(Signal),
	/// A deferred unit's timer elapsed.
	Fire { unit: Unit, generation: u64 },
	/// Recompute location and opacity.
	Refresh { immediate: bool },
	Reconfigure(Box<OverlayConfig>),
	/// New suggestion content is on its way; lift suppression.
	SuggestionPresented,
	Shutdown,
}

/// Deferred unit kinds owned by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Unit {
	Opacity,
	Location,
	CompletionSettle,
}

pub(crate) struct Orchestrator {
	config: OverlayConfig,
	ax: Arc<dyn Accessibility>,
	store: Arc<dyn StateStore>,
	surfaces: Surfaces,
	tracker: AttachmentTracker,
	opacity: UpdateScheduler,
	location: UpdateScheduler,
	settle: Deferred,
	completion_visible: bool,
	/// Set by scroll, focus and document transitions. Opacity passes keep the
	/// suggestion panel out until new content is presented or the editor switches.
	suggestion_suppressed: bool,
	full_screen: bool,
	commands: mpsc::WeakUnboundedSender<Command>,
}

impl Orchestrator {
	pub fn new(config: OverlayConfig, ax: Arc<dyn Accessibility>, store: Arc<dyn StateStore>, surfaces: Surfaces, commands: &mpsc::UnboundedSender<Command>) -> Self {
		Self {
			opacity: UpdateScheduler::new("opacity", config.timing.opacity_policy()),
			location: UpdateScheduler::new("location", config.timing.location_policy()),
			settle: Deferred::new("completion-settle"),
			config,
			ax,
			store,
			surfaces,
			tracker: AttachmentTracker::new(),
			completion_visible: false,
			suggestion_suppressed: false,
			full_screen: false,
			commands: commands.downgrade(),
		}
	}

	/// Drains commands until [`Command::Shutdown`] or every sender is gone.
	pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
		self.prime();
		while let Some(command) = commands.recv().await {
			if !self.handle(command) {
				break;
			}
		}
		self.opacity.cancel();
		self.location.cancel();
		self.settle.cancel();
		tracing::debug!("overlay.orchestrator.stopped");
	}

	/// Puts every surface except the chat panel above normal windows and
	/// applies each surface's key capability.
	fn prime(&mut self) {
		for kind in SurfaceKind::ALL {
			self.surfaces.set_can_become_key(kind, kind.can_become_key());
			if kind != SurfaceKind::ChatPanel {
				self.surfaces.set_level(kind, WindowLevel::Floating);
			}
		}
		self.adjust_chat_level();
	}

	/// Handles one command. Returns `false` once the actor should stop.
	pub fn handle(&mut self, command: Command) -> bool {
		match command {
			Command::Signal(Signal::AppActivated(app)) => self.on_activated(app),
			Command::Signal(Signal::Reaction(reaction)) => self.on_reaction(reaction),
			Command::Signal(Signal::CompletionPanel { visible }) => self.on_completion_panel(visible),
			Command::Fire { unit, generation } => self.on_fire(unit, generation),
			Command::Refresh { immediate } => {
				self.request_location(immediate);
				self.request_opacity(immediate);
			}
			Command::Reconfigure(config) => self.reconfigure(*config),
			Command::SuggestionPresented => {
				self.suggestion_suppressed = false;
				self.request_opacity(true);
			}
			Command::Shutdown => return false,
		}
		true
	}

	fn on_activated(&mut self, app: AppInfo) {
		tracing::debug!(pid = app.pid, kind = ?app.kind, "overlay.app.activated");
		if app.is_host() {
			if let Some(window) = self.ax.focused_window(app.pid) {
				self.observe_window(&window);
			}
			self.request_location(true);
			self.request_opacity(false);
		} else {
			self.hide_suggestion();
			self.request_opacity(true);
			self.request_location(false);
		}
		self.adjust_chat_level();
	}

	fn on_reaction(&mut self, reaction: Reaction) {
		match reaction {
			Reaction::NoOp => {}
			Reaction::HideForTransition { document } => {
				tracing::debug!(document = ?document.as_ref().map(|url| url.as_str()), "overlay.transition");
				self.hide_suggestion();
				self.store.dispatch(Action::HidePanel);
				if document.is_none() {
					self.store.dispatch(Action::RemoveDisplayedContent);
				}
				self.store.dispatch(Action::UpdateFocusingDocumentUrl(document));
				self.store.dispatch(Action::SwitchEditorAndUpdateContent);
				self.request_location(true);
				self.request_opacity(true);
			}
			Reaction::UpdateAndNotify {
				immediate,
				hide_suggestion,
				window,
			} => {
				if !hide_suggestion {
					self.suggestion_suppressed = false;
				}
				self.prepare(hide_suggestion, window.as_ref());
				self.store.dispatch(Action::SwitchEditorAndUpdateContent);
				self.request_location(immediate);
				self.request_opacity(immediate);
			}
			Reaction::UpdateOnly {
				immediate,
				hide_suggestion,
				window,
			} => {
				self.prepare(hide_suggestion, window.as_ref());
				self.request_location(immediate);
				self.request_opacity(immediate);
			}
		}
	}

	fn prepare(&mut self, hide_suggestion: bool, window: Option<&HostWindowSnapshot>) {
		if hide_suggestion {
			self.hide_suggestion();
		}
		if let Some(window) = window {
			self.observe_window(window);
		}
	}

	fn on_completion_panel(&mut self, visible: bool) {
		self.settle.cancel();
		self.completion_visible = visible;
		if visible {
			self.request_location(true);
			self.request_opacity(true);
			return;
		}
		let deadline = Instant::now() + self.config.timing.completion_settle();
		let fire = self.fire(Unit::CompletionSettle);
		self.settle.arm(deadline, fire);
	}

	fn on_fire(&mut self, unit: Unit, generation: u64) {
		let due = match unit {
			Unit::Opacity => self.opacity.take_due(generation),
			Unit::Location => self.location.take_due(generation),
			Unit::CompletionSettle => self.settle.take(generation).is_some(),
		};
		if !due {
			tracing::trace!(?unit, generation, "overlay.fire.stale");
			return;
		}
		match unit {
			Unit::Opacity => self.apply_opacity(),
			Unit::Location => self.apply_location(),
			Unit::CompletionSettle => {
				self.request_location(true);
				self.request_opacity(true);
			}
		}
	}

	fn reconfigure(&mut self, config: OverlayConfig) {
		self.opacity.set_policy(config.timing.opacity_policy());
		self.location.set_policy(config.timing.location_policy());
		self.config = config;
		tracing::info!("overlay.reconfigure");
		self.request_location(false);
	}

	/// Sender for a deferred unit's timer.
	fn fire(&self, unit: Unit) -> impl FnOnce(u64) + Send + use<> {
		let commands = self.commands.clone();
		move |generation| {
			if let Some(commands) = commands.upgrade() {
				let _ = commands.send(Command::Fire { unit, generation });
			}
		}
	}

	fn request_location(&mut self, immediate: bool) {
		let fire = self.fire(Unit::Location);
		if self.location.request(Instant::now(), immediate, fire) == Admission::Now {
			self.apply_location();
		}
	}

	fn request_opacity(&mut self, immediate: bool) {
		let fire = self.fire(Unit::Opacity);
		if self.opacity.request(Instant::now(), immediate, fire) == Admission::Now {
			self.apply_opacity();
		}
	}

	fn hide_suggestion(&mut self) {
		self.suggestion_suppressed = true;
		self.surfaces.set_opacity(SurfaceKind::SuggestionPanel, Opacity::Hidden);
	}

	/// Full-screen tracking and attachment for a fresh host window snapshot.
	fn observe_window(&mut self, window: &HostWindowSnapshot) {
		if window.full_screen != self.full_screen {
			self.full_screen = window.full_screen;
			let action = if window.full_screen {
				Action::EnterFullScreen
			} else {
				Action::ExitFullScreen
			};
			self.store.dispatch(action);
		}

		let Some(screen) = self.ax.screen_of(window) else {
			tracing::debug!(window = window.id.0, "overlay.attachment.no_screen");
			return;
		};
		let app_changed = self.tracker.observe(window, screen);
		self.update_attachment(window, app_changed);
	}

	fn update_attachment(&mut self, window: &HostWindowSnapshot, app_changed: bool) {
		let state = self.store.current_state();
		if state.chat_detached {
			return;
		}
		let screens = self.ax.screens();
		let (Some(main), Some(tracked)) = (screens.main(), self.tracker.current()) else {
			return;
		};
		let chat = self.surfaces.get(SurfaceKind::ChatPanel);
		let request = AttachRequest {
			window,
			screen: &tracked.screen,
			main,
			chat_frame: chat.frame(),
			attach_enabled: self.config.chat.attach_to_host,
			panel_displayed: state.panel_displayed,
			chat_hidden: chat.is_hidden(),
		};

		match self.tracker.attached_frame(&request, app_changed, &self.config.metrics) {
			AttachOutcome::Skip(reason) => {
				tracing::trace!(?reason, "overlay.attachment.skip");
			}
			AttachOutcome::Apply(frame) => {
				self.surfaces.set_frame(SurfaceKind::ChatPanel, frame);
				tracing::debug!(?frame, "overlay.attachment.apply");
				self.adjust_chat_level();
			}
		}
	}

	fn apply_location(&mut self) {
		let screens = self.ax.screens();
		let anchor = anchor::resolve(self.ax.as_ref(), &self.config.metrics);
		let completion_panel = if self.completion_visible {
			self.ax.completion_panel_frame()
		} else {
			None
		};
		let placement = &self.config.placement;
		let input = PlacementInput {
			anchor: &anchor,
			main: screens.main(),
			active: screens.active(),
			positioning: placement.positioning,
			suggestion: placement.suggestion,
			completion_panel,
			hide_circular_widget: placement.hide_circular_widget,
			inside_editor_min_width: placement.inside_editor_min_width,
		};
		let Some(location) = compute_widget_location(&input, &self.config.metrics) else {
			tracing::debug!("overlay.location.skip");
			return;
		};

		let state = self.store.current_state();
		let frame_chat = !state.chat_detached && !self.config.chat.attach_to_host;
		self.surfaces.apply_location(&location, frame_chat);
		if state.chat_detached
			&& self.surfaces.get(SurfaceKind::ChatPanel).frame().is_empty()
			&& let Some(active) = screens.active()
		{
			self.surfaces.set_frame(SurfaceKind::ChatPanel, default_chat_panel_frame(active, &self.config.metrics));
		}
		self.store.dispatch(Action::UpdatePanelState(location));

		let anchor_kind = match anchor {
			Anchor::Editor(_) => "editor",
			Anchor::Window { .. } => "window",
			Anchor::Unanchored => "none",
		};
		tracing::debug!(anchor = anchor_kind, panel = ?location.default_panel.frame, "overlay.location.apply");
		self.adjust_chat_level();
	}

	fn apply_opacity(&mut self) {
		let Some(active) = self.ax.active_application() else {
			tracing::debug!("overlay.opacity.skip");
			return;
		};
		let host_has_window = match active.kind {
			AppKind::Host => self.ax.focused_window(active.pid).is_some(),
			AppKind::ExtensionService => self
				.ax
				.latest_active_host()
				.is_some_and(|host| self.ax.focused_window(host.pid).is_some()),
			AppKind::Other => false,
		};
		let previous_was_host = self.ax.previous_active_application().is_some_and(|app| app.is_host());
		let state = self.store.current_state();
		let plan = policy::visibility(&VisibilityInput {
			active: active.kind,
			host_has_window,
			previous_was_host,
			state: &state,
		});

		self.surfaces.set_visible(SurfaceKind::Widget, !plan.widget_hidden);
		for kind in [SurfaceKind::SharedPanel, SurfaceKind::Toast] {
			self.surfaces.set_visible(kind, !plan.panels_hidden);
		}
		self.surfaces
			.set_visible(SurfaceKind::SuggestionPanel, !plan.panels_hidden && !self.suggestion_suppressed);
		self.surfaces.set_visible(SurfaceKind::ChatPanel, !plan.chat_hidden);
		tracing::debug!(?plan, suggestion_suppressed = self.suggestion_suppressed, "overlay.opacity.apply");
		self.adjust_chat_level();
	}

	fn adjust_chat_level(&mut self) {
		let state = self.store.current_state();
		let active = self.ax.active_application().map(|app| app.kind);
		let screens = self.ax.screens();
		let host_windows = match (self.ax.latest_active_host(), screens.main()) {
			(Some(host), Some(main)) => Some(
				self.ax
					.windows(host.pid)
					.iter()
					.map(|window| window.frame.flip_to_screen(main.frame.height))
					.collect::<Vec<_>>(),
			),
			_ => None,
		};
		let chat_frame = self.surfaces.get(SurfaceKind::ChatPanel).frame();
		if let Some(level) = policy::chat_level(&self.config.chat, state.chat_detached, active, chat_frame, host_windows.as_deref()) {
			self.surfaces.set_level(SurfaceKind::ChatPanel, level);
		}
	}
}

#[cfg(test)]
mod tests;
