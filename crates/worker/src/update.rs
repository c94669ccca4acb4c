use std::time::Duration;

use tokio::time::Instant;

use crate::Deferred;

/// Admission discipline for one update class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePolicy {
	/// Requests arriving within `gate` of the previous request wait for a
	/// `quiet` window; every such request restarts the window.
	Debounce { quiet: Duration, gate: Duration },
	/// Applies are spaced at least `interval` apart. A request inside the
	/// interval fires at the end of it, measured from the last admitted apply.
	Throttle { interval: Duration },
}

/// Outcome of [`UpdateScheduler::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
	/// Apply now, in the caller's turn.
	Now,
	/// A deferred unit was armed; the apply happens once it fires and
	/// [`UpdateScheduler::take_due`] accepts its generation.
	Deferred { generation: u64, deadline: Instant },
}

/// Hybrid debounce/throttle gate for one update class.
///
/// At most one deferred unit is pending. Every request cancels the pending
/// unit before deciding, so a superseded unit can never apply.
pub struct UpdateScheduler {
	name: &'static str,
	policy: UpdatePolicy,
	deferred: Deferred,
	stamp: Option<Instant>,
}

impl UpdateScheduler {
	pub fn new(name: &'static str, policy: UpdatePolicy) -> Self {
		Self {
			name,
			policy,
			deferred: Deferred::new(name),
			stamp: None,
		}
	}

	/// Admits one update request at `now`.
	///
	/// When the request is deferred, `fire` is invoked with the unit's
	/// generation at the deadline unless a later request or [`cancel`] gets
	/// there first.
	///
	/// [`cancel`]: UpdateScheduler::cancel
	pub fn request<F>(&mut self, now: Instant, immediate: bool, fire: F) -> Admission
	where
		F: FnOnce(u64) + Send + 'static,
	{
		let superseded = self.deferred.cancel();

		let deadline = match self.policy {
			UpdatePolicy::Debounce { quiet, gate } => {
				let previous = self.stamp.replace(now);
				match previous {
					Some(previous) if !immediate && now.saturating_duration_since(previous) <= gate => Some(now + quiet),
					_ => None,
				}
			}
			UpdatePolicy::Throttle { interval } => match self.stamp {
				Some(last) if !immediate && now < last + interval => Some(last + interval),
				_ => {
					self.stamp = Some(now);
					None
				}
			},
		};

		match deadline {
			Some(deadline) => {
				let generation = self.deferred.arm(deadline, fire);
				tracing::trace!(class = self.name, generation, superseded, "worker.update.deferred");
				Admission::Deferred { generation, deadline }
			}
			None => {
				tracing::trace!(class = self.name, immediate, superseded, "worker.update.now");
				Admission::Now
			}
		}
	}

	/// Accepts a fired deferred unit if it is still the pending one.
	///
	/// Returns `false` for cancelled or superseded generations; the caller
	/// must then do nothing.
	pub fn take_due(&mut self, generation: u64) -> bool {
		let Some(deadline) = self.deferred.take(generation) else {
			return false;
		};
		if let UpdatePolicy::Throttle { .. } = self.policy {
			self.stamp = Some(deadline);
		}
		true
	}

	/// Cancels the pending unit, if any.
	pub fn cancel(&mut self) -> bool {
		self.deferred.cancel()
	}

	pub fn has_pending(&self) -> bool {
		self.deferred.is_pending()
	}

	/// Swaps the policy. A pending unit keeps its deadline.
	pub fn set_policy(&mut self, policy: UpdatePolicy) {
		self.policy = policy;
	}

	pub fn last_stamp(&self) -> Option<Instant> {
		self.stamp
	}
}

#[cfg(test)]
mod tests;
