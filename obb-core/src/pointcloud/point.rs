use serde::{Deserialize, Serialize};

// Scans are stored as rows of four little-endian f32 values: x, y, z, intensity.
// Coordinates are widened to f64 once read so geometry stays in one precision.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub intensity: f32,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64, intensity: f32) -> Self {
        Self { x, y, z, intensity }
    }

    pub fn set(&mut self, x: f64, y: f64, z: f64) {
        self.x = x;
        self.y = y;
        self.z = z;
    }

    pub fn xyz(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn scale(&mut self, factor: f64) {
        self.set(self.x * factor, self.y * factor, self.z * factor);
    }
}

#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    pub points: Vec<Point>,
    pub metadata: Metadata,
}

impl PointCloud {
    pub fn new(points: Vec<Point>) -> Self {
        let mut bounding_volume = BoundingVolume::empty();
        for point in &points {
            bounding_volume.extend(point.xyz());
        }

        let metadata = Metadata {
            point_count: points.len(),
            bounding_volume,
        };

        PointCloud { points, metadata }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, f64, &Point)> {
        self.points
            .iter()
            .map(|point| (point.x, point.y, point.z, point))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Point> {
        self.points.iter_mut()
    }

    /// Smallest and largest z, or `None` for an empty cloud.
    pub fn z_range(&self) -> Option<(f64, f64)> {
        if self.is_empty() {
            return None;
        }
        let bv = &self.metadata.bounding_volume;
        Some((bv.min[2], bv.max[2]))
    }
}

// Axis-aligned bounds of the points. An empty volume has min > max.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingVolume {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingVolume {
    pub fn empty() -> Self {
        BoundingVolume {
            min: [f64::MAX, f64::MAX, f64::MAX],
            max: [f64::MIN, f64::MIN, f64::MIN],
        }
    }

    pub fn extend(&mut self, xyz: [f64; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(xyz[axis]);
            self.max[axis] = self.max[axis].max(xyz[axis]);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0]
    }
}

impl Default for BoundingVolume {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub point_count: usize,
    pub bounding_volume: BoundingVolume,
}
