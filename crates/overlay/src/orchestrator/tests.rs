use std::sync::Arc;
use std::time::Duration;

use perch_geometry::{PanelMetrics, PositioningMode, Rect, Screen, ScreenSet, attached_chat_panel_frame, expand_window_anchor};
use pretty_assertions::assert_eq;
use tokio::task::JoinHandle;

use super::*;
use crate::host::{EditorSnapshot, WindowId, WindowRole};
use crate::memory::{MemoryHost, MemoryStore, SurfaceChange, SurfaceProbes, memory_surfaces};
use crate::store::StateSnapshot;

const HOST: AppInfo = AppInfo::new(10, AppKind::Host);
const OTHER: AppInfo = AppInfo::new(20, AppKind::Other);

fn display() -> Screen {
	Screen::new(Rect::new(0.0, 0.0, 1920.0, 1080.0), Rect::new(0.0, 0.0, 1920.0, 1055.0))
}

fn window(id: u64, frame: Rect) -> HostWindowSnapshot {
	HostWindowSnapshot {
		id: WindowId(id),
		frame,
		full_screen: false,
		role: WindowRole::Window,
		identifier: None,
		label: None,
		pid: HOST.pid,
	}
}

/// Editor whose widget lands at `x + 766`, `y = 384`.
fn editor(x: f64) -> EditorSnapshot {
	EditorSnapshot {
		pid: HOST.pid,
		frame: Rect::new(x, 100.0, 800.0, 600.0),
		cursor: None,
		selection_first_line: None,
		document: None,
	}
}

fn widget_at(x: f64) -> Rect {
	Rect::new(x, 384.0, 30.0, 30.0)
}

fn update(immediate: bool, window: Option<HostWindowSnapshot>) -> Command {
	Command::Signal(Signal::Reaction(Reaction::UpdateOnly {
		immediate,
		hide_suggestion: false,
		window,
	}))
}

fn hide_and_update(immediate: bool, notify: bool, window: Option<HostWindowSnapshot>) -> Command {
	let reaction = if notify {
		Reaction::UpdateAndNotify {
			immediate,
			hide_suggestion: true,
			window,
		}
	} else {
		Reaction::UpdateOnly {
			immediate,
			hide_suggestion: true,
			window,
		}
	};
	Command::Signal(Signal::Reaction(reaction))
}

async fn settle() {
	for _ in 0..8 {
		tokio::task::yield_now().await;
	}
}

async fn sleep_ms(ms: u64) {
	tokio::time::sleep(Duration::from_millis(ms)).await;
}

struct Harness {
	host: Arc<MemoryHost>,
	store: Arc<MemoryStore>,
	probes: SurfaceProbes,
	commands: mpsc::UnboundedSender<Command>,
	actor: JoinHandle<()>,
}

impl Harness {
	async fn start(config: OverlayConfig, state: StateSnapshot) -> Self {
		let host = Arc::new(MemoryHost::new(ScreenSet::single(display())));
		let store = Arc::new(MemoryStore::with_state(state));
		let (surfaces, probes) = memory_surfaces();
		let (commands, rx) = mpsc::unbounded_channel();
		let orchestrator = Orchestrator::new(config, host.clone(), store.clone(), surfaces, &commands);
		let actor = tokio::spawn(orchestrator.run(rx));
		settle().await;
		Self {
			host,
			store,
			probes,
			commands,
			actor,
		}
	}

	async fn default() -> Self {
		Self::start(OverlayConfig::default(), StateSnapshot::default()).await
	}

	async fn send(&self, command: Command) {
		self.commands.send(command).expect("actor running");
		settle().await;
	}

	async fn activate(&self, app: AppInfo) {
		self.host.activate(app);
		self.send(Command::Signal(Signal::AppActivated(app))).await;
	}
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn prime_floats_every_surface() {
	let h = Harness::default().await;
	for probe in h.probes.iter() {
		assert_eq!(probe.level(), WindowLevel::Floating, "{}", probe.kind().as_str());
	}
	let focusable: Vec<_> = h.probes.iter().filter(|probe| probe.can_become_key()).map(|probe| probe.kind()).collect();
	assert_eq!(focusable, vec![SurfaceKind::ChatPanel]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn location_applies_once_per_throttle_interval_with_latest_geometry() {
	let h = Harness::default().await;
	h.host.focus_editor(editor(100.0));
	let t0 = Instant::now();
	h.activate(HOST).await;

	sleep_ms(10).await;
	h.host.update_editor(|editor| editor.frame.x = 150.0);
	h.send(update(false, None)).await;
	sleep_ms(10).await;
	h.host.update_editor(|editor| editor.frame.x = 200.0);
	h.send(update(false, None)).await;
	sleep_ms(100).await;

	assert_eq!(
		h.probes.widget.frame_changes(),
		vec![(t0, widget_at(866.0)), (t0 + Duration::from_millis(50), widget_at(966.0))]
	);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn immediate_location_bypasses_throttle() {
	let h = Harness::default().await;
	h.host.focus_editor(editor(100.0));
	h.activate(HOST).await;

	sleep_ms(5).await;
	h.host.update_editor(|editor| editor.frame.x = 200.0);
	h.send(update(true, None)).await;
	assert_eq!(h.probes.widget.frame(), widget_at(966.0));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn opacity_applies_after_quiet_window_from_last_request() {
	let h = Harness::default().await;
	h.host.focus_window(window(1, Rect::new(0.0, 25.0, 1200.0, 900.0)));
	let t0 = Instant::now();
	h.activate(HOST).await;
	assert!(!h.probes.widget.is_hidden());

	sleep_ms(100).await;
	h.host.clear_focus(HOST.pid);
	h.send(Command::Refresh { immediate: false }).await;
	sleep_ms(50).await;
	h.send(Command::Refresh { immediate: false }).await;
	sleep_ms(500).await;

	let hides: Vec<_> = h
		.probes
		.widget
		.history()
		.into_iter()
		.filter(|(_, change)| *change == SurfaceChange::Hidden(true))
		.map(|(at, _)| at)
		.collect();
	assert_eq!(hides, vec![t0 + Duration::from_millis(350)]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn stale_fire_is_ignored() {
	let h = Harness::default().await;
	h.host.focus_editor(editor(100.0));
	h.activate(HOST).await;
	h.probes.clear_history();

	h.send(Command::Fire {
		unit: Unit::Location,
		generation: 42,
	})
	.await;
	h.send(Command::Fire {
		unit: Unit::CompletionSettle,
		generation: 1,
	})
	.await;
	assert_eq!(h.probes.change_count(), 0);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn shutdown_cancels_pending_units() {
	let h = Harness::default().await;
	h.host.focus_editor(editor(100.0));
	h.activate(HOST).await;
	sleep_ms(10).await;
	h.host.update_editor(|editor| editor.frame.x = 200.0);
	h.send(update(false, None)).await;
	h.probes.clear_history();

	let Harness { probes, commands, actor, .. } = h;
	commands.send(Command::Shutdown).expect("actor running");
	actor.await.expect("actor exits cleanly");
	sleep_ms(500).await;
	assert_eq!(probes.change_count(), 0);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn menu_bar_focus_anchors_to_workspace_window() {
	let h = Harness::default().await;
	let workspace = HostWindowSnapshot {
		identifier: Some("workspace".into()),
		..window(2, Rect::new(0.0, 25.0, 1200.0, 900.0))
	};
	h.host.put_window(workspace.clone());
	h.host.set_workspace_window(HOST.pid, workspace.id);
	h.host.focus_window(HostWindowSnapshot {
		role: WindowRole::MenuBar,
		..window(3, Rect::new(0.0, 0.0, 1920.0, 25.0))
	});
	h.activate(HOST).await;

	let metrics = PanelMetrics::default();
	let screen = display();
	let placement = OverlayConfig::default().placement;
	let anchor = expand_window_anchor(workspace.frame, true, &metrics);
	let expected = compute_widget_location(
		&PlacementInput {
			anchor: &anchor,
			main: Some(&screen),
			active: Some(&screen),
			positioning: placement.positioning,
			suggestion: placement.suggestion,
			completion_panel: None,
			hide_circular_widget: placement.hide_circular_widget,
			inside_editor_min_width: placement.inside_editor_min_width,
		},
		&metrics,
	)
	.expect("screens known");

	let published = h.store.actions().into_iter().rev().find_map(|action| match action {
		Action::UpdatePanelState(location) => Some(location),
		_ => None,
	});
	assert_eq!(published, Some(expected));
	assert_eq!(h.probes.widget.frame(), expected.widget_frame);
	assert_eq!(h.probes.shared_panel.frame(), expected.default_panel.frame);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn other_app_keeps_only_requested_detached_chat() {
	let state = StateSnapshot {
		chat_detached: true,
		chat_tabs: vec!["review".into()],
		..StateSnapshot::default()
	};
	let h = Harness::start(OverlayConfig::default(), state).await;
	h.host.focus_window(window(1, Rect::new(0.0, 25.0, 1200.0, 900.0)));
	h.activate(HOST).await;
	for probe in h.probes.iter() {
		assert!(!probe.is_hidden(), "{} visible with host", probe.kind().as_str());
	}
	assert!(!h.probes.chat_panel.frame().is_empty());

	h.activate(OTHER).await;
	assert!(h.probes.widget.is_hidden());
	assert!(h.probes.shared_panel.is_hidden());
	assert_eq!(h.probes.suggestion_panel.opacity(), Opacity::Hidden);
	assert!(!h.probes.chat_panel.is_hidden());

	h.store.update(|state| state.chat_tabs.clear());
	h.send(Command::Refresh { immediate: true }).await;
	assert!(h.probes.chat_panel.is_hidden());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn completion_panel_close_settles_before_update() {
	let h = Harness::default().await;
	h.host.focus_editor(editor(100.0));
	h.activate(HOST).await;
	h.send(Command::Signal(Signal::CompletionPanel { visible: true })).await;

	h.host.update_editor(|editor| editor.frame.x = 200.0);
	let closed = Instant::now();
	h.send(Command::Signal(Signal::CompletionPanel { visible: false })).await;
	sleep_ms(399).await;
	assert_eq!(h.probes.widget.frame(), widget_at(866.0));

	sleep_ms(10).await;
	let last = h.probes.widget.frame_changes().pop();
	assert_eq!(last, Some((closed + Duration::from_millis(400), widget_at(966.0))));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn reopened_completion_panel_cancels_settle() {
	let h = Harness::default().await;
	h.host.focus_editor(editor(100.0));
	h.activate(HOST).await;
	h.send(Command::Signal(Signal::CompletionPanel { visible: false })).await;
	sleep_ms(100).await;
	h.send(Command::Signal(Signal::CompletionPanel { visible: true })).await;
	h.probes.clear_history();
	h.host.update_editor(|editor| editor.frame.x = 200.0);

	sleep_ms(1000).await;
	assert_eq!(h.probes.widget.frame_changes(), Vec::new());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn document_transition_hides_then_switches() {
	let h = Harness::default().await;
	h.host.focus_window(window(1, Rect::new(0.0, 25.0, 1200.0, 900.0)));
	h.activate(HOST).await;
	h.store.clear_actions();
	h.probes.clear_history();

	h.send(Command::Signal(Signal::Reaction(Reaction::HideForTransition { document: None })))
		.await;

	let actions: Vec<_> = h
		.store
		.actions()
		.into_iter()
		.filter(|action| !matches!(action, Action::UpdatePanelState(_)))
		.collect();
	assert_eq!(
		actions,
		vec![
			Action::HidePanel,
			Action::RemoveDisplayedContent,
			Action::UpdateFocusingDocumentUrl(None),
			Action::SwitchEditorAndUpdateContent,
		]
	);
	assert_eq!(h.probes.suggestion_panel.opacity(), Opacity::Hidden);
	assert!(!h.probes.suggestion_panel.changes().contains(&SurfaceChange::Opacity(Opacity::Visible)));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn full_screen_toggle_is_published_and_skips_attachment() {
	let mut config = OverlayConfig::default();
	config.chat.attach_to_host = true;
	let state = StateSnapshot {
		panel_displayed: true,
		..StateSnapshot::default()
	};
	let h = Harness::start(config, state).await;
	let normal = window(1, Rect::new(0.0, 25.0, 1200.0, 900.0));
	h.host.focus_window(normal.clone());
	h.activate(HOST).await;
	h.send(update(true, Some(normal.clone()))).await;

	let screen = display();
	let attached = attached_chat_panel_frame(normal.frame, &screen, &screen, &PanelMetrics::default());
	assert_eq!(h.probes.chat_panel.frame(), attached);
	let applied = h.probes.chat_panel.frame_changes().len();

	let full = HostWindowSnapshot {
		full_screen: true,
		..window(1, Rect::new(0.0, 0.0, 1920.0, 1080.0))
	};
	h.send(update(true, Some(full))).await;
	assert_eq!(h.store.count("enter_full_screen"), 1);
	assert_eq!(h.probes.chat_panel.frame_changes().len(), applied);

	h.send(update(true, Some(normal))).await;
	assert_eq!(h.store.count("exit_full_screen"), 1);
	assert_eq!(h.probes.chat_panel.frame(), attached);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn reconfigure_reapplies_location() {
	let h = Harness::default().await;
	h.host.focus_editor(EditorSnapshot {
		cursor: Some(Rect::new(300.0, 200.0, 2.0, 16.0)),
		..editor(100.0)
	});
	h.activate(HOST).await;
	assert_eq!(h.probes.widget.frame(), widget_at(866.0));

	sleep_ms(100).await;
	let mut config = OverlayConfig::default();
	config.placement.positioning = PositioningMode::AlignToTextCursor;
	h.send(Command::Reconfigure(Box::new(config))).await;
	assert_eq!(h.probes.widget.frame(), Rect::new(866.0, 864.0, 30.0, 30.0));
}

/// Host active with a focused window, every surface shown.
async fn shown_on_host() -> Harness {
	let h = Harness::default().await;
	h.host.focus_window(window(1, Rect::new(0.0, 25.0, 1200.0, 900.0)));
	h.host.focus_editor(editor(100.0));
	h.activate(HOST).await;
	assert_eq!(h.probes.suggestion_panel.opacity(), Opacity::Visible);
	h.probes.clear_history();
	h
}

fn suggestion_shown_again(h: &Harness) -> bool {
	h.probes.suggestion_panel.changes().contains(&SurfaceChange::Opacity(Opacity::Visible))
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn scroll_after_idle_keeps_suggestion_hidden() {
	let h = shown_on_host().await;
	sleep_ms(4000).await;

	h.send(hide_and_update(false, false, None)).await;
	sleep_ms(500).await;
	assert_eq!(h.probes.suggestion_panel.opacity(), Opacity::Hidden);
	assert!(!suggestion_shown_again(&h));
	assert!(!h.probes.widget.is_hidden());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn scroll_inside_gate_keeps_suggestion_hidden_after_debounce() {
	let h = shown_on_host().await;
	sleep_ms(100).await;

	h.send(hide_and_update(false, false, None)).await;
	assert_eq!(h.probes.suggestion_panel.opacity(), Opacity::Hidden);
	sleep_ms(500).await;
	assert_eq!(h.probes.suggestion_panel.opacity(), Opacity::Hidden);
	assert!(!suggestion_shown_again(&h));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn focused_window_change_keeps_suggestion_hidden() {
	let h = shown_on_host().await;
	let focused = window(1, Rect::new(0.0, 25.0, 1200.0, 900.0));

	sleep_ms(100).await;
	h.send(hide_and_update(true, true, Some(focused.clone()))).await;
	assert_eq!(h.probes.suggestion_panel.opacity(), Opacity::Hidden);

	sleep_ms(4000).await;
	h.send(hide_and_update(true, true, Some(focused))).await;
	sleep_ms(500).await;
	assert_eq!(h.probes.suggestion_panel.opacity(), Opacity::Hidden);
	assert!(!suggestion_shown_again(&h));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn new_suggestion_or_editor_switch_lifts_suppression() {
	let h = shown_on_host().await;
	h.send(hide_and_update(true, false, None)).await;
	assert_eq!(h.probes.suggestion_panel.opacity(), Opacity::Hidden);

	h.send(Command::SuggestionPresented).await;
	assert_eq!(h.probes.suggestion_panel.opacity(), Opacity::Visible);
	assert!(!h.probes.suggestion_panel.is_hidden());

	h.send(hide_and_update(true, false, None)).await;
	assert_eq!(h.probes.suggestion_panel.opacity(), Opacity::Hidden);
	h.send(Command::Signal(Signal::Reaction(Reaction::UpdateAndNotify {
		immediate: true,
		hide_suggestion: false,
		window: None,
	})))
	.await;
	assert_eq!(h.probes.suggestion_panel.opacity(), Opacity::Visible);
}
