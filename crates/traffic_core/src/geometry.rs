use bevy::prelude::*;

/// Cubic Bezier curve describing a lane's centre line (or the connection
/// between two lanes at a node).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bezier3 {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
    pub d: Vec3,
}

impl Bezier3 {
    pub fn new(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> Self {
        Self { a, b, c, d }
    }

    /// Straight curve with control points at thirds.
    pub fn straight(from: Vec3, to: Vec3) -> Self {
        let step = (to - from) / 3.0;
        Self {
            a: from,
            b: from + step,
            c: from + step * 2.0,
            d: to,
        }
    }

    /// Evaluate the curve at parameter t in [0, 1]
    pub fn position(&self, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        let uu = u * u;
        let tt = t * t;
        u * uu * self.a + 3.0 * uu * t * self.b + 3.0 * u * tt * self.c + t * tt * self.d
    }

    /// First derivative at parameter t
    pub fn tangent(&self, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        3.0 * u * u * (self.b - self.a) + 6.0 * u * t * (self.c - self.b) + 3.0 * t * t * (self.d - self.c)
    }
}

/// Line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Segment3 {
    pub a: Vec3,
    pub b: Vec3,
}

impl Segment3 {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self { a, b }
    }

    pub fn length_squared(&self) -> f32 {
        self.a.distance_squared(self.b)
    }

    /// Unit direction from `a` to `b`, zero for a degenerate segment.
    pub fn direction(&self) -> Vec3 {
        (self.b - self.a).normalize_or_zero()
    }

    /// Axis-aligned bounds as (min, max).
    pub fn bounds(&self) -> (Vec3, Vec3) {
        (self.a.min(self.b), self.a.max(self.b))
    }

    /// Shortest distance between this segment and `other`.
    ///
    /// Clamped closest-point solve on both parameters; handles degenerate
    /// (point-like) segments on either side.
    pub fn distance_to_segment(&self, other: &Segment3) -> f32 {
        let d1 = self.b - self.a;
        let d2 = other.b - other.a;
        let r = self.a - other.a;
        let a = d1.length_squared();
        let e = d2.length_squared();
        let f = d2.dot(r);

        let (s, t) = if a <= f32::EPSILON && e <= f32::EPSILON {
            (0.0, 0.0)
        } else if a <= f32::EPSILON {
            (0.0, (f / e).clamp(0.0, 1.0))
        } else {
            let c = d1.dot(r);
            if e <= f32::EPSILON {
                ((-c / a).clamp(0.0, 1.0), 0.0)
            } else {
                let b = d1.dot(d2);
                let denom = a * e - b * b;
                let mut s = if denom > f32::EPSILON {
                    ((b * f - c * e) / denom).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let mut t = (b * s + f) / e;
                if t < 0.0 {
                    t = 0.0;
                    s = (-c / a).clamp(0.0, 1.0);
                } else if t > 1.0 {
                    t = 1.0;
                    s = ((b - c) / a).clamp(0.0, 1.0);
                }
                (s, t)
            }
        };

        let p1 = self.a + d1 * s;
        let p2 = other.a + d2 * t;
        p1.distance(p2)
    }
}
