/// Execution classes used to label spawned tasks in traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Long-lived loop awaiting a notification source.
	Observer,
	/// Timer that fires once unless cancelled first.
	Deferred,
	/// The serialized mutation domain.
	Actor,
}

impl TaskClass {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Observer => "observer",
			Self::Deferred => "deferred",
			Self::Actor => "actor",
		}
	}
}
