//! Placement and update scheduling for overlay surfaces that follow a host
//! application's windows.
//!
//! # Architecture
//!
//! ```text
//! Accessibility streams ──► observation loops ──► command queue ──► orchestrator actor
//!   (activations,            (normalizer,          (mpsc, one          (surfaces, attachment,
//!    editors, completion,     one TaskSlot per      consumer)            opacity debounce,
//!    per-target events)       category)                                  location throttle)
//! ```
//!
//! Observation loops only classify notifications and forward them. Every
//! surface mutation happens inside the orchestrator actor, one command at a
//! time. Debounced and throttled work is armed as a deferred unit that sends a
//! generation-tagged command back into the same queue; the actor drops any
//! generation that is no longer pending.
//!
//! Placement itself is pure and lives in `perch-geometry`.
//!
//! # Collaborators
//!
//! * [`Accessibility`] reads host windows, editors and screens.
//! * [`StateStore`] holds application state the overlay reads and dispatches
//!   [`Action`]s into.
//! * [`Surface`] is one window-system surface.
//!
//! [`memory`] provides scripted in-memory versions of all three.

mod anchor;
pub mod attachment;
mod config;
mod controller;
mod error;
mod host;
pub mod memory;
mod normalizer;
mod orchestrator;
mod store;
mod surface;

pub use attachment::{AttachOutcome, AttachRequest, AttachSkip, AttachmentTracker, TrackedApp};
pub use config::{ChatConfig, OverlayConfig, PlacementConfig, TimingConfig};
pub use controller::OverlayController;
pub use error::{ConfigError, ControllerError, Result};
pub use host::{
	Accessibility, AppInfo, AppKind, EditorHandle, EditorSnapshot, FocusEvent, GeometryChange, HostWindowSnapshot, ObserveTarget, PanelHandle, Pid,
	WindowId, WindowRole,
};
pub use store::{Action, StateSnapshot, StateStore, Toast};
pub use surface::{Opacity, Surface, SurfaceKind, Surfaces, WindowLevel};
