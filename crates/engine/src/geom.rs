use serde::{Deserialize, Serialize};

/// Screen-space vector: `x` grows to the right, `y` grows downward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance_to(self, other: Vec2) -> f64 {
        (other - self).length()
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    pub fn component(self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }

    pub fn component_mut(&mut self, axis: Axis) -> &mut f64 {
        match axis {
            Axis::Horizontal => &mut self.x,
            Axis::Vertical => &mut self.y,
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub const BOTH: [Axis; 2] = [Axis::Horizontal, Axis::Vertical];

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Horizontal => "x",
            Self::Vertical => "y",
        }
    }
}

/// Angle from `from` to `to` in radians, positive pointing up the screen.
pub fn look_angle(from: Vec2, to: Vec2) -> f64 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    (-dy).atan2(dx)
}

/// Unit screen-space direction for an angle produced by [`look_angle`].
pub fn heading(angle_radians: f64) -> Vec2 {
    Vec2 {
        x: angle_radians.cos(),
        y: -angle_radians.sin(),
    }
}

/// Axis-aligned box; `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2 {
            x: self.x + self.width * 0.5,
            y: self.y + self.height * 0.5,
        }
    }

    pub fn min(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.left(),
            Axis::Vertical => self.top(),
        }
    }

    pub fn max(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.right(),
            Axis::Vertical => self.bottom(),
        }
    }

    pub fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    /// Box covering every position between `self` and `self` moved by `distance`.
    pub fn swept(&self, axis: Axis, distance: f64) -> Rect {
        let mut swept = *self;
        match axis {
            Axis::Horizontal => {
                swept.width += distance.abs();
                if distance < 0.0 {
                    swept.x += distance;
                }
            }
            Axis::Vertical => {
                swept.height += distance.abs();
                if distance < 0.0 {
                    swept.y += distance;
                }
            }
        }
        swept
    }

    /// Strict overlap: boxes sharing only an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    pub fn expanded(&self, margin: f64) -> Rect {
        Rect {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + margin * 2.0,
            height: self.height + margin * 2.0,
        }
    }

    pub fn to_int_rect(&self) -> IntRect {
        IntRect {
            x: self.x.round() as i64,
            y: self.y.round() as i64,
            width: self.width.round() as i64,
            height: self.height.round() as i64,
        }
    }
}

/// Whole-unit box handed to rendering and obstacle pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_angle_is_positive_when_target_is_above() {
        let angle = look_angle(Vec2::new(0.0, 0.0), Vec2::new(0.0, -10.0));
        assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        let dir = heading(angle);
        assert!(dir.x.abs() < 1e-12);
        assert!((dir.y + 1.0).abs() < 1e-12);
    }

    #[test]
    fn swept_rect_covers_both_ends() {
        let rect = Rect::new(10.0, 0.0, 4.0, 4.0);
        let right = rect.swept(Axis::Horizontal, 6.0);
        assert_eq!(right, Rect::new(10.0, 0.0, 10.0, 4.0));
        let up = rect.swept(Axis::Vertical, -3.0);
        assert_eq!(up, Rect::new(10.0, -3.0, 4.0, 7.0));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        let c = Rect::new(9.5, 0.0, 10.0, 10.0);
        assert!(a.intersects(&c));
    }

    #[test]
    fn int_rect_rounds_each_field() {
        let rect = Rect::new(1.4, 2.6, 10.5, 3.49);
        assert_eq!(
            rect.to_int_rect(),
            IntRect {
                x: 1,
                y: 3,
                width: 11,
                height: 3
            }
        );
    }
}
