use std::future::Future;

use tokio::task::JoinHandle;

use crate::{GenerationClock, GenerationToken, TaskClass, spawn};

struct Live {
	token: GenerationToken,
	handle: JoinHandle<()>,
}

/// Holds at most one live task for a named category.
///
/// Starting a task through [`TaskSlot::replace`] cancels the previous one
/// before the new one is spawned. Dropping the slot cancels whatever is live.
pub struct TaskSlot {
	name: &'static str,
	clock: GenerationClock,
	live: Option<Live>,
}

impl TaskSlot {
	pub fn new(name: &'static str) -> Self {
		Self {
			name,
			clock: GenerationClock::new(),
			live: None,
		}
	}

	/// Cancels the live task, then spawns `start(token)` as the new one.
	///
	/// The task is expected to observe its token and return once it is
	/// cancelled. Returns the new generation.
	pub fn replace<F, Fut>(&mut self, start: F) -> u64
	where
		F: FnOnce(GenerationToken) -> Fut,
		Fut: Future<Output = ()> + Send + 'static,
	{
		let previous = self.cancel_live();
		let token = GenerationToken::issue(&self.clock);
		let generation = token.generation();
		let handle = spawn(TaskClass::Observer, start(token.clone()));
		tracing::debug!(slot = self.name, generation, ?previous, "worker.slot.replace");
		self.live = Some(Live { token, handle });
		generation
	}

	/// Cancels the live task without starting another.
	pub fn clear(&mut self) {
		if let Some(generation) = self.cancel_live() {
			tracing::debug!(slot = self.name, generation, "worker.slot.clear");
		}
	}

	/// Generation of the live task, if any and still running.
	pub fn live_generation(&self) -> Option<u64> {
		self.live
			.as_ref()
			.filter(|live| !live.token.is_cancelled() && !live.handle.is_finished())
			.map(|live| live.token.generation())
	}

	fn cancel_live(&mut self) -> Option<u64> {
		let live = self.live.take()?;
		live.token.cancel();
		Some(live.token.generation())
	}
}

impl Drop for TaskSlot {
	fn drop(&mut self) {
		self.cancel_live();
	}
}
