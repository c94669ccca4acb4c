use serde::{Deserialize, Serialize};

use crate::rect::{Point, Rect};

/// One display, in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Screen {
	/// Full display bounds.
	pub frame: Rect,
	/// Bounds minus menu bar and dock.
	pub visible_frame: Rect,
}

impl Screen {
	pub const fn new(frame: Rect, visible_frame: Rect) -> Self {
		Self { frame, visible_frame }
	}

	/// The screen anchoring both coordinate spaces has its origin at `(0, 0)`.
	pub fn is_main_display(&self) -> bool {
		self.frame.origin() == Point::ZERO
	}
}

/// The set of attached displays as reported by the window system.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenSet {
	screens: Vec<Screen>,
	active: Option<usize>,
}

impl ScreenSet {
	/// Creates a screen set; `active` indexes into `screens`.
	pub fn new(screens: Vec<Screen>, active: Option<usize>) -> Self {
		let active = active.filter(|&idx| idx < screens.len());
		Self { screens, active }
	}

	/// Convenience for a single display that is both main and active.
	pub fn single(screen: Screen) -> Self {
		Self::new(vec![screen], Some(0))
	}

	/// The display whose origin is `(0, 0)`, used for coordinate conversion.
	pub fn main(&self) -> Option<&Screen> {
		self.screens.iter().find(|screen| screen.is_main_display())
	}

	/// The display the window system currently considers active.
	pub fn active(&self) -> Option<&Screen> {
		self.active.and_then(|idx| self.screens.get(idx))
	}

	pub fn iter(&self) -> impl Iterator<Item = &Screen> {
		self.screens.iter()
	}

	pub fn is_empty(&self) -> bool {
		self.screens.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn display(x: f64, y: f64) -> Screen {
		let frame = Rect::new(x, y, 1920.0, 1080.0);
		Screen::new(frame, Rect::new(x, y, 1920.0, 1055.0))
	}

	#[test]
	fn main_is_origin_screen_regardless_of_order() {
		let set = ScreenSet::new(vec![display(1920.0, 0.0), display(0.0, 0.0)], Some(0));
		assert_eq!(set.main(), Some(&display(0.0, 0.0)));
		assert_eq!(set.active(), Some(&display(1920.0, 0.0)));
	}

	#[test]
	fn out_of_range_active_is_dropped() {
		let set = ScreenSet::new(vec![display(0.0, 0.0)], Some(3));
		assert!(set.active().is_none());
		assert!(set.main().is_some());
	}

	#[test]
	fn no_origin_screen_means_no_main() {
		let set = ScreenSet::new(vec![display(-1920.0, 0.0)], Some(0));
		assert!(set.main().is_none());
	}
}
