//! Public handle over the observation loops and the orchestrator actor.

use std::sync::Arc;

use parking_lot::Mutex;
use perch_worker::{TaskClass, spawn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::OverlayConfig;
use crate::error::{ControllerError, Result};
use crate::host::Accessibility;
use crate::normalizer::Normalizer;
use crate::orchestrator::{Command, Orchestrator};
use crate::store::{Action, StateStore, Toast};
use crate::surface::Surfaces;

/// Built but not yet running.
struct Idle {
	orchestrator: Orchestrator,
	commands: mpsc::UnboundedReceiver<Command>,
}

struct Running {
	cancel: CancellationToken,
	actor: JoinHandle<()>,
	observers: Vec<JoinHandle<()>>,
}

/// Owns the overlay's background work for one host session.
///
/// Construction wires every collaborator eagerly; [`start`](Self::start)
/// spawns the orchestrator actor and the observation loops on the current
/// tokio runtime. Presentation methods dispatch straight into the store and,
/// where they change what should be visible, ask the actor for an immediate
/// refresh.
pub struct OverlayController {
	ax: Arc<dyn Accessibility>,
	store: Arc<dyn StateStore>,
	commands: mpsc::UnboundedSender<Command>,
	idle: Mutex<Option<Idle>>,
	running: Mutex<Option<Running>>,
}

impl OverlayController {
	pub fn new(config: OverlayConfig, ax: Arc<dyn Accessibility>, store: Arc<dyn StateStore>, surfaces: Surfaces) -> Result<Self> {
		config.validate()?;
		let (commands, rx) = mpsc::unbounded_channel();
		let orchestrator = Orchestrator::new(config, ax.clone(), store.clone(), surfaces, &commands);
		Ok(Self {
			ax,
			store,
			commands,
			idle: Mutex::new(Some(Idle { orchestrator, commands: rx })),
			running: Mutex::new(None),
		})
	}

	/// Spawns the actor and every observation loop. Must be called from
	/// within a tokio runtime, at most once.
	pub fn start(&self) -> Result<()> {
		let Idle { orchestrator, commands } = self.idle.lock().take().ok_or(ControllerError::AlreadyStarted)?;

		let cancel = CancellationToken::new();
		let actor = spawn(TaskClass::Actor, orchestrator.run(commands));
		let normalizer = Normalizer::new(self.ax.clone(), self.store.clone(), self.commands.clone());
		let observers = normalizer.spawn(&cancel);
		tracing::info!(observers = observers.len(), "overlay.controller.started");

		*self.running.lock() = Some(Running { cancel, actor, observers });
		Ok(())
	}

	pub fn is_running(&self) -> bool {
		self.running.lock().is_some()
	}

	/// Stops every observation loop and pending deferred unit, then the actor.
	pub async fn shutdown(&self) -> Result<()> {
		let Some(running) = self.running.lock().take() else {
			return Err(ControllerError::Closed);
		};

		running.cancel.cancel();
		for observer in running.observers {
			if let Err(error) = observer.await {
				tracing::warn!(%error, "overlay.controller.observer_failed");
			}
		}
		let _ = self.commands.send(Command::Shutdown);
		if let Err(error) = running.actor.await {
			tracing::warn!(%error, "overlay.controller.actor_failed");
		}
		tracing::info!("overlay.controller.stopped");
		Ok(())
	}

	/// Requests a location and opacity pass. Requests made before
	/// [`start`](Self::start) apply once the actor runs.
	pub fn refresh(&self, immediate: bool) -> Result<()> {
		self.send(Command::Refresh { immediate })
	}

	/// Validates and swaps the configuration inside the actor.
	pub fn reconfigure(&self, config: OverlayConfig) -> Result<()> {
		config.validate()?;
		self.send(Command::Reconfigure(Box::new(config)))
	}

	fn send(&self, command: Command) -> Result<()> {
		self.commands.send(command).map_err(|_| ControllerError::Closed)
	}

	fn dispatch(&self, action: Action) {
		tracing::debug!(action = action.name(), "overlay.controller.dispatch");
		self.store.dispatch(action);
	}

	/// Dispatches `action`, then refreshes visibility without waiting.
	fn dispatch_and_refresh(&self, action: Action) {
		self.dispatch(action);
		if self.refresh(true).is_err() {
			tracing::trace!("overlay.controller.refresh_dropped");
		}
	}

	pub fn suggest_code(&self) {
		self.dispatch(Action::PresentSuggestion);
		if self.send(Command::SuggestionPresented).is_err() {
			tracing::trace!("overlay.controller.suggestion_dropped");
		}
	}

	pub fn expand_suggestion(&self) {
		self.dispatch(Action::ExpandSuggestion);
	}

	pub fn discard_suggestion(&self) {
		self.dispatch(Action::DiscardSuggestion);
	}

	pub fn present_chat_room(&self) {
		self.dispatch_and_refresh(Action::PresentChatPanel { force_detach: false });
	}

	/// Presents the chat panel detached from the host, e.g. for sign-in.
	pub fn present_detached_global_chat(&self) {
		self.dispatch_and_refresh(Action::PresentChatPanel { force_detach: true });
	}

	pub fn present_error(&self, message: impl Into<String>) {
		self.dispatch(Action::Toast(Toast::Error(message.into())));
	}

	pub fn present_warning(&self, message: impl Into<String>, url: Option<Url>) {
		self.dispatch(Action::Toast(Toast::Warning {
			message: message.into(),
			url,
		}));
	}

	pub fn dismiss_warning(&self) {
		self.dispatch(Action::DismissWarning);
	}

	pub fn mark_as_processing(&self, processing: bool) {
		self.dispatch(Action::MarkAsProcessing(processing));
	}

	pub fn show_panel(&self) {
		self.dispatch_and_refresh(Action::ShowPanel);
	}

	pub fn hide_button_clicked(&self) {
		self.dispatch_and_refresh(Action::HideButtonClicked);
	}

	/// Marks the chat panel as user-positioned; it stops following the
	/// default panel frame.
	pub fn detach_chat_panel(&self) {
		self.dispatch_and_refresh(Action::DetachChatPanel);
	}
}

impl Drop for OverlayController {
	fn drop(&mut self) {
		if let Some(running) = self.running.get_mut().take() {
			running.cancel.cancel();
			let _ = self.commands.send(Command::Shutdown);
		}
	}
}
