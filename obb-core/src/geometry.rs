use crate::record::CanonicalRecord;

pub type Point3 = [f64; 3];
pub type Point2 = [f64; 2];

/// Pair of corner indices.
pub type Edge = (usize, usize);

// Corners 0..4 are the bottom face and 4..8 the top face, both counter-clockwise
// when seen from above, so corner i + 4 sits right above corner i.
pub const BOX_EDGES: [Edge; 12] = [
    // bottom
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    // top
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    // vertical
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

const CORNER_SIGNS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

/// Rotates `offset` (a point relative to some center) about the z axis.
pub fn rotate_z(offset: Point3, yaw: f64) -> Point3 {
    let (sin, cos) = yaw.sin_cos();
    [
        cos * offset[0] - sin * offset[1],
        sin * offset[0] + cos * offset[1],
        offset[2],
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrientedBoundingBox3D {
    pub center: Point3,
    pub half_extents: Point3,
    pub yaw: f64,
    pub corners: [Point3; 8],
}

impl OrientedBoundingBox3D {
    pub fn from_record(record: &CanonicalRecord) -> Self {
        let center = record.center();
        let half_extents = [record.dx / 2.0, record.dy / 2.0, record.dz / 2.0];

        let corners = CORNER_SIGNS.map(|sign| {
            let local = [
                sign[0] * half_extents[0],
                sign[1] * half_extents[1],
                sign[2] * half_extents[2],
            ];
            let rotated = rotate_z(local, record.rot);
            [
                rotated[0] + center[0],
                rotated[1] + center[1],
                rotated[2] + center[2],
            ]
        });

        OrientedBoundingBox3D {
            center,
            half_extents,
            yaw: record.rot,
            corners,
        }
    }

    pub fn edges(&self) -> [Edge; 12] {
        BOX_EDGES
    }

    pub fn segments(&self) -> impl Iterator<Item = (Point3, Point3)> + '_ {
        BOX_EDGES
            .iter()
            .map(|&(a, b)| (self.corners[a], self.corners[b]))
    }
}

/// The 8 corners of the box described by `record` and its 12 edges.
///
/// Corners are rotated about the box center, not the world origin. Yaw is used
/// as given, negative values rotate clockwise.
pub fn corners_and_edges(record: &CanonicalRecord) -> ([Point3; 8], [Edge; 12]) {
    let obb = OrientedBoundingBox3D::from_record(record);
    (obb.corners, BOX_EDGES)
}

/// Bird's-eye rectangle of a box: anchored at its unrotated bottom-left corner
/// and rotated by `angle_deg` about its own center. Height (z, dz) is dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint2D {
    pub origin: Point2,
    pub width: f64,
    pub height: f64,
    pub angle_deg: f64,
}

impl Footprint2D {
    pub fn center(&self) -> Point2 {
        [
            self.origin[0] + self.width / 2.0,
            self.origin[1] + self.height / 2.0,
        ]
    }

    /// Rotated corners, counter-clockwise from the bottom-left one.
    pub fn corners(&self) -> [Point2; 4] {
        let [cx, cy] = self.center();
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        let yaw = self.angle_deg.to_radians();
        [[-hw, -hh], [hw, -hh], [hw, hh], [-hw, hh]].map(|[ox, oy]| {
            let r = rotate_z([ox, oy, 0.0], yaw);
            [r[0] + cx, r[1] + cy]
        })
    }
}

pub fn footprint_rectangle(record: &CanonicalRecord) -> Footprint2D {
    Footprint2D {
        origin: [record.x - record.dx / 2.0, record.y - record.dy / 2.0],
        width: record.dx,
        height: record.dy,
        angle_deg: record.rot.to_degrees(),
    }
}
