use std::time::Duration;

use perch_geometry::{Rect, Screen, ScreenSet};
use pretty_assertions::assert_eq;

use super::*;
use crate::host::{AppKind, EditorSnapshot, GeometryChange, WindowId, WindowRole};
use crate::memory::{MemoryHost, MemoryStore};

const HOST: AppInfo = AppInfo::new(10, AppKind::Host);
const OTHER_HOST: AppInfo = AppInfo::new(20, AppKind::Host);
const FINDER: AppInfo = AppInfo::new(30, AppKind::Other);

struct Fixture {
	host: Arc<MemoryHost>,
	store: Arc<MemoryStore>,
	commands: mpsc::UnboundedReceiver<Command>,
	cancel: CancellationToken,
	loops: Vec<JoinHandle<()>>,
}

impl Fixture {
	fn start() -> Self {
		let screen = Screen::new(Rect::new(0.0, 0.0, 1920.0, 1080.0), Rect::new(0.0, 0.0, 1920.0, 1055.0));
		let host = Arc::new(MemoryHost::new(ScreenSet::single(screen)));
		let store = Arc::new(MemoryStore::new());
		let (tx, commands) = mpsc::unbounded_channel();
		let cancel = CancellationToken::new();
		let loops = Normalizer::new(host.clone(), store.clone(), tx).spawn(&cancel);
		Self {
			host,
			store,
			commands,
			cancel,
			loops,
		}
	}

	/// Lets every loop run until idle, then returns the forwarded signals.
	async fn signals(&mut self) -> Vec<Signal> {
		tokio::time::sleep(Duration::from_millis(1)).await;
		std::iter::from_fn(|| self.commands.try_recv().ok())
			.filter_map(|command| match command {
				Command::Signal(signal) => Some(signal),
				_ => None,
			})
			.collect()
	}
}

fn window(pid: Pid) -> HostWindowSnapshot {
	HostWindowSnapshot {
		id: WindowId(pid as u64),
		frame: Rect::new(0.0, 25.0, 1200.0, 800.0),
		full_screen: false,
		role: WindowRole::Window,
		identifier: None,
		label: None,
		pid,
	}
}

fn editor(pid: Pid) -> EditorSnapshot {
	EditorSnapshot {
		pid,
		frame: Rect::new(100.0, 100.0, 800.0, 600.0),
		cursor: None,
		selection_first_line: None,
		document: None,
	}
}

fn url(path: &str) -> Url {
	Url::parse(&format!("file:///src/{path}")).unwrap()
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn selection_burst_coalesces_into_one_update() {
	let mut fixture = Fixture::start();
	fixture.host.activate(HOST);
	fixture.host.focus_editor(editor(HOST.pid));
	assert_eq!(fixture.signals().await, vec![Signal::AppActivated(HOST)]);

	for _ in 0..10 {
		fixture.host.emit_editor(FocusEvent::SelectionChanged);
	}
	assert_eq!(fixture.signals().await, vec![Signal::Reaction(Reaction::update(false))]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn scroll_passes_through_and_splits_selection_bursts() {
	let mut fixture = Fixture::start();
	fixture.host.activate(HOST);
	fixture.host.focus_editor(editor(HOST.pid));
	fixture.signals().await;

	for event in [
		FocusEvent::SelectionChanged,
		FocusEvent::SelectionChanged,
		FocusEvent::ScrollChanged,
		FocusEvent::ScrollChanged,
		FocusEvent::SelectionChanged,
	] {
		fixture.host.emit_editor(event);
	}
	assert_eq!(
		fixture.signals().await,
		vec![
			Signal::Reaction(Reaction::update(false)),
			Signal::Reaction(Reaction::update(true)),
			Signal::Reaction(Reaction::update(true)),
			Signal::Reaction(Reaction::update(false)),
		]
	);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn switching_host_cancels_previous_app_loop() {
	let mut fixture = Fixture::start();
	fixture.host.activate(HOST);
	fixture.signals().await;
	fixture.host.activate(OTHER_HOST);
	fixture.signals().await;

	fixture.host.reshape_window(window(HOST.pid), GeometryChange::Moved);
	assert!(fixture.signals().await.is_empty());

	fixture.host.focus_window(window(OTHER_HOST.pid));
	assert_eq!(
		fixture.signals().await,
		vec![Signal::Reaction(Reaction::UpdateAndNotify {
			immediate: true,
			hide_suggestion: true,
			window: Some(window(OTHER_HOST.pid)),
		})]
	);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn non_host_activation_stops_observing() {
	let mut fixture = Fixture::start();
	fixture.host.activate(HOST);
	fixture.host.activate(FINDER);
	assert_eq!(fixture.signals().await, vec![Signal::AppActivated(HOST), Signal::AppActivated(FINDER)]);

	fixture.host.reshape_window(window(HOST.pid), GeometryChange::Resized);
	assert!(fixture.signals().await.is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn reactivating_same_host_keeps_loop() {
	let mut fixture = Fixture::start();
	fixture.host.activate(HOST);
	fixture.host.activate(HOST);
	fixture.signals().await;

	fixture.host.reshape_window(window(HOST.pid), GeometryChange::Moved);
	assert_eq!(
		fixture.signals().await,
		vec![Signal::Reaction(Reaction::UpdateOnly {
			immediate: false,
			hide_suggestion: false,
			window: Some(window(HOST.pid)),
		})]
	);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn log_only_events_are_not_forwarded() {
	let mut fixture = Fixture::start();
	fixture.host.activate(HOST);
	fixture.signals().await;

	for event in [
		FocusEvent::WindowCreated,
		FocusEvent::ElementDestroyed,
		FocusEvent::TitleChanged,
		FocusEvent::ApplicationDeactivated,
	] {
		fixture.host.emit(HOST.pid, event);
	}
	assert!(fixture.signals().await.is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn document_change_hides_for_transition() {
	let mut fixture = Fixture::start();
	fixture.store.update(|state| state.focusing_document_url = Some(url("a.rs")));
	fixture.host.set_document(HOST.pid, Some(url("a.rs")));
	fixture.host.activate(HOST);
	fixture.signals().await;

	fixture.host.emit(HOST.pid, FocusEvent::FocusedElementChanged(None));
	assert_eq!(
		fixture.signals().await,
		vec![Signal::Reaction(Reaction::UpdateAndNotify {
			immediate: true,
			hide_suggestion: false,
			window: None,
		})]
	);

	fixture.host.set_document(HOST.pid, Some(url("b.rs")));
	fixture.host.emit(HOST.pid, FocusEvent::FocusedElementChanged(None));
	assert_eq!(
		fixture.signals().await,
		vec![Signal::Reaction(Reaction::HideForTransition {
			document: Some(url("b.rs")),
		})]
	);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn editors_outside_latest_host_are_ignored() {
	let mut fixture = Fixture::start();
	fixture.host.activate(HOST);
	fixture.host.focus_editor(editor(OTHER_HOST.pid));
	fixture.signals().await;

	fixture.host.emit_editor(FocusEvent::ScrollChanged);
	assert!(fixture.signals().await.is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn completion_panel_visibility_is_forwarded() {
	let mut fixture = Fixture::start();
	fixture.host.set_completion_panel(Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
	fixture.host.set_completion_panel(None);
	assert_eq!(
		fixture.signals().await,
		vec![Signal::CompletionPanel { visible: true }, Signal::CompletionPanel { visible: false }]
	);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn cancel_ends_every_loop() {
	let mut fixture = Fixture::start();
	fixture.host.activate(HOST);
	fixture.host.focus_editor(editor(HOST.pid));
	fixture.signals().await;

	fixture.cancel.cancel();
	for handle in std::mem::take(&mut fixture.loops) {
		handle.await.unwrap();
	}
	fixture.host.emit(HOST.pid, FocusEvent::ScrollChanged);
	fixture.host.emit_editor(FocusEvent::ScrollChanged);
	assert!(fixture.signals().await.is_empty());
}

#[test]
fn classify_maps_window_events() {
	let host = MemoryHost::new(ScreenSet::default());
	let store = MemoryStore::new();
	let classify = |event| classify(event, HOST.pid, &host, &store);

	assert_eq!(
		classify(FocusEvent::ApplicationActivated),
		Reaction::UpdateAndNotify {
			immediate: false,
			hide_suggestion: false,
			window: None,
		}
	);
	assert_eq!(
		classify(FocusEvent::MainWindowChanged(window(HOST.pid))),
		Reaction::UpdateAndNotify {
			immediate: false,
			hide_suggestion: false,
			window: Some(window(HOST.pid)),
		}
	);
	assert_eq!(
		classify(FocusEvent::WindowMiniaturized(window(HOST.pid))),
		Reaction::UpdateOnly {
			immediate: false,
			hide_suggestion: false,
			window: Some(window(HOST.pid)),
		}
	);
	assert_eq!(
		classify(FocusEvent::FocusedElementChanged(Some(window(HOST.pid)))),
		Reaction::UpdateAndNotify {
			immediate: true,
			hide_suggestion: false,
			window: Some(window(HOST.pid)),
		}
	);
	assert_eq!(classify(FocusEvent::CompletionPanelVisibilityChanged(true)), Reaction::NoOp);
}
