use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, advance};

use super::*;

const QUIET: Duration = Duration::from_millis(200);
const GATE: Duration = Duration::from_secs(3);
const INTERVAL: Duration = Duration::from_millis(50);

fn debounce() -> UpdateScheduler {
	UpdateScheduler::new("opacity", UpdatePolicy::Debounce { quiet: QUIET, gate: GATE })
}

fn throttle() -> UpdateScheduler {
	UpdateScheduler::new("location", UpdatePolicy::Throttle { interval: INTERVAL })
}

fn sender(tx: &mpsc::UnboundedSender<u64>) -> impl FnOnce(u64) + Send + 'static {
	let tx = tx.clone();
	move |generation| {
		let _ = tx.send(generation);
	}
}

fn deferred_generation(admission: Admission) -> u64 {
	match admission {
		Admission::Deferred { generation, .. } => generation,
		Admission::Now => panic!("expected a deferred admission"),
	}
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn debounce_first_request_applies_now() {
	let (tx, _rx) = mpsc::unbounded_channel();
	let mut scheduler = debounce();
	assert_eq!(scheduler.request(Instant::now(), false, sender(&tx)), Admission::Now);
	assert_eq!(scheduler.last_stamp(), Some(Instant::now()));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn debounce_burst_collapses_to_last_request() {
	let (tx, mut rx) = mpsc::unbounded_channel();
	let mut scheduler = debounce();
	scheduler.request(Instant::now(), false, sender(&tx));

	advance(Duration::from_millis(100)).await;
	let first = deferred_generation(scheduler.request(Instant::now(), false, sender(&tx)));
	advance(Duration::from_millis(50)).await;
	let at = Instant::now();
	let admission = scheduler.request(at, false, sender(&tx));
	assert_eq!(
		admission,
		Admission::Deferred {
			generation: first + 1,
			deadline: at + QUIET,
		}
	);

	assert_eq!(rx.recv().await, Some(first + 1));
	assert_eq!(Instant::now(), at + QUIET);
	assert!(!scheduler.take_due(first));
	assert!(scheduler.take_due(first + 1));
	assert!(!scheduler.has_pending());

	drop(tx);
	assert!(rx.recv().await.is_none());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn debounce_applies_now_after_gate_or_when_immediate() {
	let (tx, _rx) = mpsc::unbounded_channel();
	let mut scheduler = debounce();
	scheduler.request(Instant::now(), false, sender(&tx));

	advance(Duration::from_millis(10)).await;
	scheduler.request(Instant::now(), false, sender(&tx));
	assert!(scheduler.has_pending());
	assert_eq!(scheduler.request(Instant::now(), true, sender(&tx)), Admission::Now);
	assert!(!scheduler.has_pending());

	advance(GATE + Duration::from_millis(1)).await;
	assert_eq!(scheduler.request(Instant::now(), false, sender(&tx)), Admission::Now);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn throttle_burst_fires_once_at_interval_end() {
	let (tx, mut rx) = mpsc::unbounded_channel();
	let mut scheduler = throttle();
	let start = Instant::now();
	assert_eq!(scheduler.request(start, false, sender(&tx)), Admission::Now);

	advance(Duration::from_millis(10)).await;
	let first = scheduler.request(Instant::now(), false, sender(&tx));
	advance(Duration::from_millis(20)).await;
	let second = scheduler.request(Instant::now(), false, sender(&tx));

	let deadline = start + INTERVAL;
	assert!(matches!(first, Admission::Deferred { deadline: d, .. } if d == deadline));
	assert!(matches!(second, Admission::Deferred { deadline: d, .. } if d == deadline));

	let fired = rx.recv().await.expect("trailing apply fires");
	assert_eq!(fired, deferred_generation(second));
	assert!(scheduler.take_due(fired));
	assert_eq!(scheduler.last_stamp(), Some(deadline));

	advance(Duration::from_millis(10)).await;
	let next = scheduler.request(Instant::now(), false, sender(&tx));
	assert!(matches!(next, Admission::Deferred { deadline: d, .. } if d == deadline + INTERVAL));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn throttle_outside_interval_applies_now_and_restamps() {
	let (tx, _rx) = mpsc::unbounded_channel();
	let mut scheduler = throttle();
	scheduler.request(Instant::now(), false, sender(&tx));

	advance(INTERVAL + Duration::from_millis(5)).await;
	let now = Instant::now();
	assert_eq!(scheduler.request(now, false, sender(&tx)), Admission::Now);
	assert_eq!(scheduler.last_stamp(), Some(now));

	advance(Duration::from_millis(1)).await;
	assert_eq!(scheduler.request(Instant::now(), true, sender(&tx)), Admission::Now);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn cancelled_unit_never_fires() {
	let (tx, mut rx) = mpsc::unbounded_channel();
	let mut scheduler = throttle();
	scheduler.request(Instant::now(), false, sender(&tx));
	let generation = deferred_generation(scheduler.request(Instant::now(), false, sender(&tx)));
	assert!(scheduler.cancel());
	drop(tx);

	assert!(rx.recv().await.is_none());
	assert!(!scheduler.take_due(generation));
}
