use serde::{Deserialize, Serialize};

/// A point in either coordinate space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
	pub width: f64,
	pub height: f64,
}

impl Size {
	pub const ZERO: Self = Self {
		width: 0.0,
		height: 0.0,
	};

	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}
}

/// Axis-aligned rectangle with an origin at its minimum corner.
///
/// The origin is the corner with the smallest x and y. Which visual corner
/// that is depends on the coordinate space the rect belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub const ZERO: Self = Self {
		x: 0.0,
		y: 0.0,
		width: 0.0,
		height: 0.0,
	};

	pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self { x, y, width, height }
	}

	/// Builds a rect from an origin and a size.
	pub const fn from_origin_size(origin: Point, size: Size) -> Self {
		Self::new(origin.x, origin.y, size.width, size.height)
	}

	pub const fn origin(&self) -> Point {
		Point::new(self.x, self.y)
	}

	pub const fn size(&self) -> Size {
		Size::new(self.width, self.height)
	}

	pub fn min_x(&self) -> f64 {
		self.x
	}

	pub fn max_x(&self) -> f64 {
		self.x + self.width
	}

	pub fn mid_x(&self) -> f64 {
		self.x + self.width / 2.0
	}

	pub fn min_y(&self) -> f64 {
		self.y
	}

	pub fn max_y(&self) -> f64 {
		self.y + self.height
	}

	pub fn mid_y(&self) -> f64 {
		self.y + self.height / 2.0
	}

	/// Returns true when either dimension is zero or negative.
	pub fn is_empty(&self) -> bool {
		self.width <= 0.0 || self.height <= 0.0
	}

	/// Returns true when the rects share a region of non-zero area.
	///
	/// Touching edges do not count as an intersection.
	pub fn intersects(&self, other: &Rect) -> bool {
		if self.is_empty() || other.is_empty() {
			return false;
		}
		self.min_x() < other.max_x() && other.min_x() < self.max_x() && self.min_y() < other.max_y() && other.min_y() < self.max_y()
	}

	/// Returns true when `point` lies inside the rect (max edges exclusive).
	pub fn contains(&self, point: Point) -> bool {
		point.x >= self.min_x() && point.x < self.max_x() && point.y >= self.min_y() && point.y < self.max_y()
	}

	/// Returns a copy with the origin moved by `(dx, dy)`.
	pub fn offset(&self, dx: f64, dy: f64) -> Self {
		Self::new(self.x + dx, self.y + dy, self.width, self.height)
	}

	/// Returns a copy with a new y origin.
	pub fn with_y(&self, y: f64) -> Self {
		Self::new(self.x, y, self.width, self.height)
	}

	/// Returns a rect of `size` centered inside `self`.
	pub fn centered(&self, size: Size) -> Self {
		Self::new(self.mid_x() - size.width / 2.0, self.mid_y() - size.height / 2.0, size.width, size.height)
	}

	/// Converts an accessibility-space rect into screen space.
	///
	/// `main_height` is the height of the screen whose origin is `(0, 0)`.
	/// The conversion is its own inverse.
	pub fn flip_to_screen(&self, main_height: f64) -> Self {
		Self::new(self.x, main_height - self.max_y(), self.width, self.height)
	}
}
