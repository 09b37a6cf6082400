//! Axis-aligned bounding boxes in mesh coordinates.

/// Axis-aligned bounding box over `[f64; 3]` coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb {
    /// An empty box: union identity, intersects nothing.
    pub const EMPTY: Aabb = Aabb {
        min: [f64::INFINITY; 3],
        max: [f64::NEG_INFINITY; 3],
    };

    /// Box containing a single point.
    pub fn from_point(p: [f64; 3]) -> Self {
        Aabb { min: p, max: p }
    }

    /// Smallest box containing all of `points`; `EMPTY` if none.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = [f64; 3]>,
    {
        let mut out = Aabb::EMPTY;
        for p in points {
            out.expand_to(p);
        }
        out
    }

    /// True if no point has been accumulated.
    pub fn is_empty(&self) -> bool {
        (0..3).any(|k| self.min[k] > self.max[k])
    }

    /// Grows the box to contain `p`.
    pub fn expand_to(&mut self, p: [f64; 3]) {
        for k in 0..3 {
            self.min[k] = self.min[k].min(p[k]);
            self.max[k] = self.max[k].max(p[k]);
        }
    }

    /// Union of two boxes.
    pub fn union(&self, other: &Aabb) -> Aabb {
        let mut out = *self;
        if !other.is_empty() {
            out.expand_to(other.min);
            out.expand_to(other.max);
        }
        out
    }

    /// The box inflated by `tol` on every side. Negative `tol` shrinks.
    pub fn inflated(&self, tol: f64) -> Aabb {
        let mut out = *self;
        for k in 0..3 {
            out.min[k] -= tol;
            out.max[k] += tol;
        }
        out
    }

    /// Closed-interval overlap test.
    pub fn intersects(&self, other: &Aabb) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        (0..3).all(|k| self.min[k] <= other.max[k] && self.max[k] >= other.min[k])
    }

    /// Overlap test with the first box inflated by `tol`.
    ///
    /// `tol` is an absolute distance in the mesh's coordinate units.
    pub fn intersects_with_tol(&self, other: &Aabb, tol: f64) -> bool {
        self.inflated(tol).intersects(other)
    }

    /// Box center; meaningless for an empty box.
    pub fn center(&self) -> [f64; 3] {
        [
            0.5 * (self.min[0] + self.max[0]),
            0.5 * (self.min[1] + self.max[1]),
            0.5 * (self.min[2] + self.max[2]),
        ]
    }

    /// Index of the longest axis (0, 1, or 2).
    pub fn longest_axis(&self) -> usize {
        let ext = [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ];
        let mut axis = 0;
        for k in 1..3 {
            if ext[k] > ext[axis] {
                axis = k;
            }
        }
        axis
    }
}
