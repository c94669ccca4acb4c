use tokio::time::Instant;

use crate::{GenerationClock, GenerationToken, TaskClass, spawn};

struct Pending {
	token: GenerationToken,
	deadline: Instant,
}

/// A single cancellable timer.
///
/// Arming cancels whatever was pending. When the timer elapses the `fire`
/// callback receives the generation it was armed with; the receiver must hand
/// that generation back to [`Deferred::take`] before acting, which rejects
/// anything cancelled or superseded in the meantime.
pub struct Deferred {
	name: &'static str,
	clock: GenerationClock,
	pending: Option<Pending>,
}

impl Deferred {
	pub fn new(name: &'static str) -> Self {
		Self {
			name,
			clock: GenerationClock::new(),
			pending: None,
		}
	}

	/// Cancels any pending timer and arms a new one for `deadline`.
	pub fn arm<F>(&mut self, deadline: Instant, fire: F) -> u64
	where
		F: FnOnce(u64) + Send + 'static,
	{
		self.cancel();
		let token = GenerationToken::issue(&self.clock);
		let generation = token.generation();
		let watch = token.clone();
		let name = self.name;
		spawn(TaskClass::Deferred, async move {
			tokio::select! {
				biased;
				_ = watch.cancelled() => {
					tracing::trace!(deferred = name, generation, "worker.deferred.cancelled");
				}
				_ = tokio::time::sleep_until(deadline) => {
					if !watch.is_cancelled() {
						fire(generation);
					}
				}
			}
		});
		self.pending = Some(Pending { token, deadline });
		generation
	}

	/// Cancels the pending timer. Returns whether one was pending.
	pub fn cancel(&mut self) -> bool {
		match self.pending.take() {
			Some(pending) => {
				pending.token.cancel();
				true
			}
			None => false,
		}
	}

	/// Consumes the pending timer if `generation` is the one currently armed.
	///
	/// Returns the deadline the timer was armed for.
	pub fn take(&mut self, generation: u64) -> Option<Instant> {
		if self.pending.as_ref()?.token.generation() != generation {
			tracing::trace!(deferred = self.name, generation, "worker.deferred.stale");
			return None;
		}
		self.pending.take().map(|pending| pending.deadline)
	}

	pub fn is_pending(&self) -> bool {
		self.pending.is_some()
	}
}

impl Drop for Deferred {
	fn drop(&mut self) {
		self.cancel();
	}
}
