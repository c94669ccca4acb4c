//! Turns host notification streams into orchestrator signals.
//!
//! Three top-level loops run for the controller's lifetime: application
//! activations, focused-editor changes and completion panel visibility. The
//! first two each own a [`TaskSlot`] holding the notification loop for the
//! currently observed application or editor; switching targets cancels the old
//! loop before the new one subscribes.
//!
//! Every loop forwards into the orchestrator's command channel. Selection
//! bursts are coalesced here, before fan-in.

use std::sync::Arc;

use futures::{FutureExt, Stream, StreamExt};
use perch_worker::{GenerationToken, TaskClass, TaskSlot, spawn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::host::{Accessibility, AppInfo, EditorHandle, FocusEvent, HostWindowSnapshot, ObserveTarget, Pid};
use crate::orchestrator::Command;
use crate::store::StateStore;

/// Input to the serialized domain from one observation loop.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Signal {
	AppActivated(AppInfo),
	Reaction(Reaction),
	CompletionPanel { visible: bool },
}

/// What the orchestrator should do about one notification.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Reaction {
	/// The focused document changed; hide before switching to it.
	HideForTransition { document: Option<Url> },
	/// Recompute everything and tell the store the editor changed.
	UpdateAndNotify {
		immediate: bool,
		hide_suggestion: bool,
		window: Option<HostWindowSnapshot>,
	},
	/// Recompute without the editor-change side effect.
	UpdateOnly {
		immediate: bool,
		hide_suggestion: bool,
		window: Option<HostWindowSnapshot>,
	},
	NoOp,
}

impl Reaction {
	fn update(hide_suggestion: bool) -> Self {
		Self::UpdateOnly {
			immediate: false,
			hide_suggestion,
			window: None,
		}
	}
}

/// Maps an application-level notification of `pid` to a reaction.
pub(crate) fn classify(event: FocusEvent, pid: Pid, ax: &dyn Accessibility, store: &dyn StateStore) -> Reaction {
	match event {
		FocusEvent::FocusedWindowChanged(window) => Reaction::UpdateAndNotify {
			immediate: true,
			hide_suggestion: true,
			window: Some(window),
		},
		FocusEvent::FocusedElementChanged(window) => {
			let document = ax.realtime_document_url(pid);
			if document != store.current_state().focusing_document_url {
				Reaction::HideForTransition { document }
			} else {
				Reaction::UpdateAndNotify {
					immediate: true,
					hide_suggestion: false,
					window,
				}
			}
		}
		FocusEvent::ApplicationActivated => Reaction::UpdateAndNotify {
			immediate: false,
			hide_suggestion: false,
			window: None,
		},
		FocusEvent::MainWindowChanged(window) => Reaction::UpdateAndNotify {
			immediate: false,
			hide_suggestion: false,
			window: Some(window),
		},
		FocusEvent::GeometryChanged { window, .. } | FocusEvent::WindowMiniaturized(window) | FocusEvent::WindowDeminiaturized(window) => Reaction::UpdateOnly {
			immediate: false,
			hide_suggestion: false,
			window: Some(window),
		},
		FocusEvent::SelectionChanged => Reaction::update(false),
		FocusEvent::ScrollChanged => Reaction::update(true),
		FocusEvent::ApplicationDeactivated
		| FocusEvent::WindowCreated
		| FocusEvent::ElementDestroyed
		| FocusEvent::TitleChanged
		| FocusEvent::CompletionPanelVisibilityChanged(_) => Reaction::NoOp,
	}
}

/// Shared context of every observation loop.
pub(crate) struct Normalizer {
	ax: Arc<dyn Accessibility>,
	store: Arc<dyn StateStore>,
	commands: mpsc::UnboundedSender<Command>,
}

impl Normalizer {
	pub fn new(ax: Arc<dyn Accessibility>, store: Arc<dyn StateStore>, commands: mpsc::UnboundedSender<Command>) -> Arc<Self> {
		Arc::new(Self { ax, store, commands })
	}

	/// Starts the top-level loops. They stop once `cancel` fires.
	pub fn spawn(self: &Arc<Self>, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
		vec![
			spawn(TaskClass::Observer, self.clone().watch_applications(cancel.child_token())),
			spawn(TaskClass::Observer, self.clone().watch_editors(cancel.child_token())),
			spawn(TaskClass::Observer, self.clone().watch_completion_panel(cancel.child_token())),
		]
	}

	fn forward(&self, signal: Signal) -> bool {
		self.commands.send(Command::Signal(signal)).is_ok()
	}

	async fn watch_applications(self: Arc<Self>, cancel: CancellationToken) {
		let mut activations = self.ax.active_applications();
		let mut slot = TaskSlot::new("app-notifications");
		let mut observed = None;

		while let Some(app) = next_or_cancel(&mut activations, cancel.cancelled()).await {
			tracing::debug!(pid = app.pid, kind = ?app.kind, "overlay.normalizer.activated");
			if !self.forward(Signal::AppActivated(app)) {
				break;
			}
			if !app.is_host() {
				observed = None;
				slot.clear();
				continue;
			}
			if observed != Some(app.pid) {
				observed = Some(app.pid);
				let this = self.clone();
				slot.replace(move |token| this.watch_application(app.pid, token));
			}
		}
		tracing::debug!("overlay.normalizer.applications.end");
	}

	async fn watch_application(self: Arc<Self>, pid: Pid, token: GenerationToken) {
		let mut events = self.ax.notifications(ObserveTarget::Application(pid));

		while let Some(event) = next_or_cancel(&mut events, token.cancelled()).await {
			let name = event.name();
			let reaction = classify(event, pid, self.ax.as_ref(), self.store.as_ref());
			if reaction == Reaction::NoOp {
				tracing::trace!(pid, event = name, "overlay.normalizer.ignored");
				continue;
			}
			tracing::trace!(pid, event = name, generation = token.generation(), "overlay.normalizer.app_event");
			if token.is_cancelled() || !self.forward(Signal::Reaction(reaction)) {
				break;
			}
		}
	}

	async fn watch_editors(self: Arc<Self>, cancel: CancellationToken) {
		let mut editors = self.ax.focused_editors();
		let mut slot = TaskSlot::new("editor-notifications");

		while let Some(editor) = next_or_cancel(&mut editors, cancel.cancelled()).await {
			let from_host = self.ax.latest_active_host().is_some_and(|host| host.pid == editor.pid);
			if !from_host {
				tracing::trace!(pid = editor.pid, "overlay.normalizer.editor_ignored");
				slot.clear();
				continue;
			}
			let this = self.clone();
			slot.replace(move |token| this.watch_editor(editor, token));
		}
		tracing::debug!("overlay.normalizer.editors.end");
	}

	async fn watch_editor(self: Arc<Self>, editor: EditorHandle, token: GenerationToken) {
		let mut events = self.ax.notifications(ObserveTarget::Editor(editor));
		let mut carried = None;

		loop {
			let event = match carried.take() {
				Some(event) => event,
				None => match next_or_cancel(&mut events, token.cancelled()).await {
					Some(event) => event,
					None => break,
				},
			};

			let mut exhausted = false;
			let reaction = match event {
				FocusEvent::SelectionChanged => {
					// Zero-delay debounce: whatever is already queued belongs to the same edit.
					tokio::task::yield_now().await;
					let mut coalesced = 0usize;
					while let Some(next) = events.next().now_or_never() {
						match next {
							Some(FocusEvent::SelectionChanged) => coalesced += 1,
							Some(other) => {
								carried = Some(other);
								break;
							}
							None => {
								exhausted = true;
								break;
							}
						}
					}
					if coalesced > 0 {
						tracing::trace!(editor = editor.id, coalesced, "overlay.normalizer.selection_coalesced");
					}
					Reaction::update(false)
				}
				FocusEvent::ScrollChanged => Reaction::update(true),
				other => classify(other, editor.pid, self.ax.as_ref(), self.store.as_ref()),
			};

			if reaction != Reaction::NoOp && (token.is_cancelled() || !self.forward(Signal::Reaction(reaction))) {
				break;
			}
			if exhausted {
				break;
			}
		}
	}

	async fn watch_completion_panel(self: Arc<Self>, cancel: CancellationToken) {
		let mut panels = self.ax.completion_panels();
		while let Some(panel) = next_or_cancel(&mut panels, cancel.cancelled()).await {
			let visible = panel.is_some();
			tracing::trace!(visible, "overlay.normalizer.completion_panel");
			if !self.forward(Signal::CompletionPanel { visible }) {
				break;
			}
		}
	}
}

/// Next stream item, or `None` once the stream ends or `cancelled` resolves.
async fn next_or_cancel<S, C>(stream: &mut S, cancelled: C) -> Option<S::Item>
where
	S: Stream + Unpin,
	C: Future<Output = ()>,
{
	tokio::select! {
		biased;
		_ = cancelled => None,
		item = stream.next() => item,
	}
}

#[cfg(test)]
mod tests;
