//! Worker primitives shared by the overlay controller.
//!
//! * [`spawn`] attaches a [`TaskClass`] to every spawned task for tracing.
//! * [`GenerationClock`] and [`GenerationToken`] scope cancellation to one
//!   lifecycle; a stale generation is never acted upon.
//! * [`TaskSlot`] keeps at most one live observation loop per category.
//! * [`Deferred`] is a single cancellable timer whose firing is re-checked by
//!   generation at the receiving end.
//! * [`UpdateScheduler`] layers debounce and throttle admission on top of
//!   [`Deferred`].

mod class;
mod deferred;
mod slot;
mod spawn;
mod token;
mod update;

pub use class::TaskClass;
pub use deferred::Deferred;
pub use slot::TaskSlot;
pub use spawn::spawn;
pub use token::{GenerationClock, GenerationToken};
pub use update::{Admission, UpdatePolicy, UpdateScheduler};
