//! In-memory collaborators.
//!
//! [`MemoryHost`] plays the accessibility layer from scripted calls,
//! [`MemoryStore`] records every dispatched action and applies the few state
//! changes placement cares about, and [`MemorySurface`] logs each attribute
//! change with a timestamp. The replay harness and the tests drive the
//! controller through these.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::BoxStream;
use parking_lot::Mutex;
use perch_geometry::{Point, Rect, Screen, ScreenSet};
use tokio::sync::mpsc;
use tokio::time::Instant;
use url::Url;

use crate::host::{Accessibility, AppInfo, EditorHandle, EditorSnapshot, FocusEvent, GeometryChange, HostWindowSnapshot, ObserveTarget, PanelHandle, Pid, WindowId};
use crate::store::{Action, StateSnapshot, StateStore};
use crate::surface::{Opacity, Surface, SurfaceKind, Surfaces, WindowLevel};

/// One recorded attribute change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceChange {
	Frame(Rect),
	Opacity(Opacity),
	Hidden(bool),
	Level(WindowLevel),
	CanBecomeKey(bool),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceState {
	pub frame: Rect,
	pub opacity: Opacity,
	pub hidden: bool,
	pub level: WindowLevel,
	pub can_become_key: bool,
}

impl Default for SurfaceState {
	fn default() -> Self {
		Self {
			frame: Rect::ZERO,
			opacity: Opacity::Hidden,
			hidden: true,
			level: WindowLevel::Normal,
			can_become_key: false,
		}
	}
}

#[derive(Debug, Default)]
struct SurfaceLog {
	state: SurfaceState,
	history: Vec<(Instant, SurfaceChange)>,
}

/// A surface that only remembers what was done to it.
pub struct MemorySurface {
	kind: SurfaceKind,
	log: Arc<Mutex<SurfaceLog>>,
}

/// Read side of a [`MemorySurface`] that stays with the test or harness.
#[derive(Clone)]
pub struct SurfaceProbe {
	kind: SurfaceKind,
	log: Arc<Mutex<SurfaceLog>>,
}

impl MemorySurface {
	pub fn new(kind: SurfaceKind) -> (Self, SurfaceProbe) {
		let log = Arc::new(Mutex::new(SurfaceLog::default()));
		(Self { kind, log: log.clone() }, SurfaceProbe { kind, log })
	}

	fn record(&self, change: SurfaceChange) {
		let mut log = self.log.lock();
		match change {
			SurfaceChange::Frame(frame) => log.state.frame = frame,
			SurfaceChange::Opacity(opacity) => log.state.opacity = opacity,
			SurfaceChange::Hidden(hidden) => log.state.hidden = hidden,
			SurfaceChange::Level(level) => log.state.level = level,
			SurfaceChange::CanBecomeKey(key) => log.state.can_become_key = key,
		}
		log.history.push((Instant::now(), change));
		tracing::trace!(surface = self.kind.as_str(), ?change, "memory.surface.change");
	}
}

impl Surface for MemorySurface {
	fn frame(&self) -> Rect {
		self.log.lock().state.frame
	}

	fn set_frame(&mut self, frame: Rect) {
		self.record(SurfaceChange::Frame(frame));
	}

	fn opacity(&self) -> Opacity {
		self.log.lock().state.opacity
	}

	fn set_opacity(&mut self, opacity: Opacity) {
		self.record(SurfaceChange::Opacity(opacity));
	}

	fn is_hidden(&self) -> bool {
		self.log.lock().state.hidden
	}

	fn set_hidden(&mut self, hidden: bool) {
		self.record(SurfaceChange::Hidden(hidden));
	}

	fn level(&self) -> WindowLevel {
		self.log.lock().state.level
	}

	fn set_level(&mut self, level: WindowLevel) {
		self.record(SurfaceChange::Level(level));
	}

	fn can_become_key(&self) -> bool {
		self.log.lock().state.can_become_key
	}

	fn set_can_become_key(&mut self, key: bool) {
		self.record(SurfaceChange::CanBecomeKey(key));
	}
}

impl SurfaceProbe {
	pub fn kind(&self) -> SurfaceKind {
		self.kind
	}

	pub fn state(&self) -> SurfaceState {
		self.log.lock().state
	}

	pub fn frame(&self) -> Rect {
		self.state().frame
	}

	pub fn opacity(&self) -> Opacity {
		self.state().opacity
	}

	pub fn is_hidden(&self) -> bool {
		self.state().hidden
	}

	pub fn level(&self) -> WindowLevel {
		self.state().level
	}

	pub fn can_become_key(&self) -> bool {
		self.state().can_become_key
	}

	pub fn history(&self) -> Vec<(Instant, SurfaceChange)> {
		self.log.lock().history.clone()
	}

	/// Recorded changes without timestamps.
	pub fn changes(&self) -> Vec<SurfaceChange> {
		self.log.lock().history.iter().map(|(_, change)| *change).collect()
	}

	/// Timestamps of recorded frame changes.
	pub fn frame_changes(&self) -> Vec<(Instant, Rect)> {
		self.log
			.lock()
			.history
			.iter()
			.filter_map(|(at, change)| match change {
				SurfaceChange::Frame(frame) => Some((*at, *frame)),
				_ => None,
			})
			.collect()
	}

	pub fn clear_history(&self) {
		self.log.lock().history.clear();
	}
}

/// Probes for every surface built by [`memory_surfaces`].
#[derive(Clone)]
pub struct SurfaceProbes {
	pub widget: SurfaceProbe,
	pub shared_panel: SurfaceProbe,
	pub suggestion_panel: SurfaceProbe,
	pub chat_panel: SurfaceProbe,
	pub toast: SurfaceProbe,
}

impl SurfaceProbes {
	pub fn get(&self, kind: SurfaceKind) -> &SurfaceProbe {
		match kind {
			SurfaceKind::Widget => &self.widget,
			SurfaceKind::SharedPanel => &self.shared_panel,
			SurfaceKind::SuggestionPanel => &self.suggestion_panel,
			SurfaceKind::ChatPanel => &self.chat_panel,
			SurfaceKind::Toast => &self.toast,
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = &SurfaceProbe> {
		SurfaceKind::ALL.into_iter().map(|kind| self.get(kind))
	}

	/// Total recorded changes across every surface.
	pub fn change_count(&self) -> usize {
		self.iter().map(|probe| probe.log.lock().history.len()).sum()
	}

	pub fn clear_history(&self) {
		self.iter().for_each(SurfaceProbe::clear_history);
	}
}

/// Builds a full surface set backed by [`MemorySurface`]s.
pub fn memory_surfaces() -> (Surfaces, SurfaceProbes) {
	let (widget, widget_probe) = MemorySurface::new(SurfaceKind::Widget);
	let (shared, shared_probe) = MemorySurface::new(SurfaceKind::SharedPanel);
	let (suggestion, suggestion_probe) = MemorySurface::new(SurfaceKind::SuggestionPanel);
	let (chat, chat_probe) = MemorySurface::new(SurfaceKind::ChatPanel);
	let (toast, toast_probe) = MemorySurface::new(SurfaceKind::Toast);
	let surfaces = Surfaces::new(Box::new(widget), Box::new(shared), Box::new(suggestion), Box::new(chat), Box::new(toast));
	let probes = SurfaceProbes {
		widget: widget_probe,
		shared_panel: shared_probe,
		suggestion_panel: suggestion_probe,
		chat_panel: chat_probe,
		toast: toast_probe,
	};
	(surfaces, probes)
}

/// A state store that logs actions and applies the panel-related ones.
#[derive(Default)]
pub struct MemoryStore {
	state: Mutex<StateSnapshot>,
	actions: Mutex<Vec<(Instant, Action)>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_state(state: StateSnapshot) -> Self {
		Self {
			state: Mutex::new(state),
			actions: Mutex::default(),
		}
	}

	pub fn update(&self, f: impl FnOnce(&mut StateSnapshot)) {
		f(&mut self.state.lock());
	}

	pub fn actions(&self) -> Vec<Action> {
		self.actions.lock().iter().map(|(_, action)| action.clone()).collect()
	}

	pub fn timed_actions(&self) -> Vec<(Instant, Action)> {
		self.actions.lock().clone()
	}

	/// Number of dispatched actions with the given [`Action::name`].
	pub fn count(&self, name: &str) -> usize {
		self.actions.lock().iter().filter(|(_, action)| action.name() == name).count()
	}

	pub fn clear_actions(&self) {
		self.actions.lock().clear();
	}

	fn reduce(state: &mut StateSnapshot, action: &Action) {
		match action {
			Action::ShowPanel => state.panel_displayed = true,
			Action::HidePanel | Action::HideButtonClicked => state.panel_displayed = false,
			Action::UpdateFocusingDocumentUrl(url) => state.focusing_document_url = url.clone(),
			Action::DetachChatPanel => state.chat_detached = true,
			Action::PresentChatPanel { force_detach } => {
				state.panel_displayed = true;
				state.chat_detached |= *force_detach;
			}
			_ => {}
		}
	}
}

impl StateStore for MemoryStore {
	fn current_state(&self) -> StateSnapshot {
		self.state.lock().clone()
	}

	fn dispatch(&self, action: Action) {
		tracing::debug!(action = action.name(), "memory.store.dispatch");
		Self::reduce(&mut self.state.lock(), &action);
		self.actions.lock().push((Instant::now(), action));
	}
}

/// Unbounded feed that buffers items until someone subscribes.
struct Feed<T> {
	tx: mpsc::UnboundedSender<T>,
	rx: Option<mpsc::UnboundedReceiver<T>>,
}

impl<T: Send + 'static> Feed<T> {
	fn new() -> Self {
		let (tx, rx) = mpsc::unbounded_channel();
		Self { tx, rx: Some(rx) }
	}

	fn send(&self, item: T) {
		let _ = self.tx.send(item);
	}

	/// Hands out the receiver. A second subscription ends the first stream.
	fn subscribe(&mut self) -> BoxStream<'static, T> {
		let rx = match self.rx.take() {
			Some(rx) => rx,
			None => {
				let (tx, rx) = mpsc::unbounded_channel();
				self.tx = tx;
				rx
			}
		};
		futures::stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) }).boxed()
	}
}

#[derive(Default)]
struct HostState {
	active: Option<AppInfo>,
	previous: Option<AppInfo>,
	latest_host: Option<AppInfo>,
	windows: HashMap<Pid, Vec<HostWindowSnapshot>>,
	focused: HashMap<Pid, WindowId>,
	workspace: HashMap<Pid, WindowId>,
	documents: HashMap<Pid, Url>,
	editor: Option<(EditorHandle, EditorSnapshot)>,
	next_editor_id: u64,
	screens: ScreenSet,
	completion_panel: Option<Rect>,
}

impl HostState {
	fn window(&self, pid: Pid, id: WindowId) -> Option<HostWindowSnapshot> {
		self.windows.get(&pid)?.iter().find(|window| window.id == id).cloned()
	}
}

struct Feeds {
	applications: Feed<AppInfo>,
	editors: Feed<EditorHandle>,
	completion: Feed<Option<PanelHandle>>,
	targets: HashMap<ObserveTarget, Feed<FocusEvent>>,
}

impl Feeds {
	fn target(&mut self, target: ObserveTarget) -> &mut Feed<FocusEvent> {
		self.targets.entry(target).or_insert_with(Feed::new)
	}
}

/// Scriptable accessibility layer.
///
/// State-changing calls update the queryable state first, then publish the
/// matching notification, the same order a real host observes.
pub struct MemoryHost {
	state: Mutex<HostState>,
	feeds: Mutex<Feeds>,
}

impl MemoryHost {
	pub fn new(screens: ScreenSet) -> Self {
		Self {
			state: Mutex::new(HostState {
				screens,
				..HostState::default()
			}),
			feeds: Mutex::new(Feeds {
				applications: Feed::new(),
				editors: Feed::new(),
				completion: Feed::new(),
				targets: HashMap::new(),
			}),
		}
	}

	pub fn set_screens(&self, screens: ScreenSet) {
		self.state.lock().screens = screens;
	}

	/// Inserts or replaces a window snapshot without notifying.
	pub fn put_window(&self, window: HostWindowSnapshot) {
		let mut state = self.state.lock();
		let windows = state.windows.entry(window.pid).or_default();
		match windows.iter_mut().find(|existing| existing.id == window.id) {
			Some(existing) => *existing = window,
			None => windows.push(window),
		}
	}

	pub fn set_workspace_window(&self, pid: Pid, id: WindowId) {
		self.state.lock().workspace.insert(pid, id);
	}

	pub fn set_document(&self, pid: Pid, url: Option<Url>) {
		let mut state = self.state.lock();
		match url {
			Some(url) => state.documents.insert(pid, url),
			None => state.documents.remove(&pid),
		};
	}

	/// Makes `app` the active application and publishes the activation.
	pub fn activate(&self, app: AppInfo) {
		{
			let mut state = self.state.lock();
			let previous = state.active.replace(app);
			if previous.is_some_and(|previous| previous != app) {
				state.previous = previous;
			}
			if app.is_host() {
				state.latest_host = Some(app);
			}
		}
		self.feeds.lock().applications.send(app);
	}

	/// Focuses `window`, storing it, and notifies its application.
	pub fn focus_window(&self, window: HostWindowSnapshot) {
		let pid = window.pid;
		self.put_window(window.clone());
		self.state.lock().focused.insert(pid, window.id);
		self.emit(pid, FocusEvent::FocusedWindowChanged(window));
	}

	/// Drops the focused window of `pid` without notifying.
	pub fn clear_focus(&self, pid: Pid) {
		self.state.lock().focused.remove(&pid);
	}

	/// Moves or resizes `window` and notifies its application.
	pub fn reshape_window(&self, window: HostWindowSnapshot, change: GeometryChange) {
		let pid = window.pid;
		self.put_window(window.clone());
		self.emit(pid, FocusEvent::GeometryChanged { window, change });
	}

	/// Publishes a raw notification for application `pid`.
	pub fn emit(&self, pid: Pid, event: FocusEvent) {
		self.feeds.lock().target(ObserveTarget::Application(pid)).send(event);
	}

	/// Focuses an editor and publishes the new handle.
	pub fn focus_editor(&self, editor: EditorSnapshot) -> EditorHandle {
		let handle = {
			let mut state = self.state.lock();
			state.next_editor_id += 1;
			let handle = EditorHandle {
				id: state.next_editor_id,
				pid: editor.pid,
			};
			if let Some(url) = editor.document.clone() {
				state.documents.insert(editor.pid, url);
			}
			state.editor = Some((handle, editor));
			handle
		};
		self.feeds.lock().editors.send(handle);
		handle
	}

	/// Replaces the focused editor's geometry without a new handle.
	pub fn update_editor(&self, f: impl FnOnce(&mut EditorSnapshot)) {
		if let Some((_, editor)) = self.state.lock().editor.as_mut() {
			f(editor);
		}
	}

	pub fn clear_editor(&self) {
		self.state.lock().editor = None;
	}

	/// Publishes a notification for the focused editor, if any.
	pub fn emit_editor(&self, event: FocusEvent) {
		let handle = self.state.lock().editor.as_ref().map(|(handle, _)| *handle);
		if let Some(handle) = handle {
			self.feeds.lock().target(ObserveTarget::Editor(handle)).send(event);
		}
	}

	pub fn set_completion_panel(&self, frame: Option<Rect>) {
		self.state.lock().completion_panel = frame;
		self.feeds.lock().completion.send(frame.map(|frame| PanelHandle { frame }));
	}
}

impl Accessibility for MemoryHost {
	fn active_applications(&self) -> BoxStream<'static, AppInfo> {
		self.feeds.lock().applications.subscribe()
	}

	fn focused_editors(&self) -> BoxStream<'static, EditorHandle> {
		self.feeds.lock().editors.subscribe()
	}

	fn completion_panels(&self) -> BoxStream<'static, Option<PanelHandle>> {
		self.feeds.lock().completion.subscribe()
	}

	fn notifications(&self, target: ObserveTarget) -> BoxStream<'static, FocusEvent> {
		self.feeds.lock().target(target).subscribe()
	}

	fn active_application(&self) -> Option<AppInfo> {
		self.state.lock().active
	}

	fn previous_active_application(&self) -> Option<AppInfo> {
		self.state.lock().previous
	}

	fn latest_active_host(&self) -> Option<AppInfo> {
		self.state.lock().latest_host
	}

	fn focused_window(&self, pid: Pid) -> Option<HostWindowSnapshot> {
		let state = self.state.lock();
		let id = *state.focused.get(&pid)?;
		state.window(pid, id)
	}

	fn workspace_window(&self, pid: Pid) -> Option<HostWindowSnapshot> {
		let state = self.state.lock();
		let id = *state.workspace.get(&pid)?;
		state.window(pid, id)
	}

	fn windows(&self, pid: Pid) -> Vec<HostWindowSnapshot> {
		self.state.lock().windows.get(&pid).cloned().unwrap_or_default()
	}

	fn focused_editor(&self) -> Option<EditorSnapshot> {
		self.state.lock().editor.as_ref().map(|(_, editor)| editor.clone())
	}

	fn realtime_document_url(&self, pid: Pid) -> Option<Url> {
		self.state.lock().documents.get(&pid).cloned()
	}

	fn screens(&self) -> ScreenSet {
		self.state.lock().screens.clone()
	}

	fn screen_of(&self, window: &HostWindowSnapshot) -> Option<Screen> {
		let state = self.state.lock();
		let main = *state.screens.main()?;
		let center = Point::new(window.frame.mid_x(), main.frame.height - window.frame.mid_y());
		let screen = state.screens.iter().find(|screen| screen.frame.contains(center)).copied();
		Some(screen.unwrap_or(main))
	}

	fn completion_panel_frame(&self) -> Option<Rect> {
		self.state.lock().completion_panel
	}
}
