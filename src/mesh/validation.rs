//! Validation of finished binary STL buffers
//!
//! Re-reads the bytes the serializer produced and checks them for 3D printing
//! compatibility:
//! - Declared triangle count agrees with the buffer length
//! - No NaN/Inf coordinates
//! - No degenerate (zero area) triangles
//! - Unit-length normals

use anyhow::{Result, bail};

use super::Triangle;

/// Summary of an STL buffer
#[derive(Debug, Default)]
pub struct StlReport {
    /// Number of triangle records
    pub triangles: usize,
    /// Number of degenerate triangles (zero or near-zero area)
    pub degenerate: usize,
    /// Number of triangles with invalid coordinates (NaN/Inf)
    pub invalid_coords: usize,
    /// Number of triangles whose stored normal is not unit length
    pub invalid_normal: usize,
    /// Axis-aligned bounds of all vertices
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl StlReport {
    /// Check if the mesh has any issues at all
    pub fn has_issues(&self) -> bool {
        self.degenerate > 0 || self.invalid_coords > 0 || self.invalid_normal > 0
    }

    /// Size of the bounding box in mm
    pub fn extent(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Get a summary string
    pub fn summary(&self) -> String {
        let [x, y, z] = self.extent();
        if !self.has_issues() {
            format!(
                "Mesh valid: {} triangles, {:.1} x {:.1} x {:.1} mm",
                self.triangles, x, y, z
            )
        } else {
            format!(
                "Mesh issues: {} total, {} degenerate, {} invalid coords, {} bad normals",
                self.triangles, self.degenerate, self.invalid_coords, self.invalid_normal
            )
        }
    }
}

/// Minimum area threshold for non-degenerate triangles (in square mm)
const MIN_TRIANGLE_AREA: f32 = 1e-10;

const HEADER_LEN: usize = 80;
const RECORD_LEN: usize = 50;

/// Parse and check a binary STL buffer
pub fn inspect_stl(bytes: &[u8]) -> Result<StlReport> {
    if bytes.len() < HEADER_LEN + 4 {
        bail!("STL buffer is {} bytes, shorter than its header", bytes.len());
    }

    let declared = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
    let expected_len = HEADER_LEN + 4 + declared * RECORD_LEN;
    if bytes.len() != expected_len {
        bail!(
            "STL declares {} triangles ({} bytes) but buffer is {} bytes",
            declared,
            expected_len,
            bytes.len()
        );
    }

    let mut report = StlReport {
        triangles: declared,
        min: [f32::INFINITY; 3],
        max: [f32::NEG_INFINITY; 3],
        ..Default::default()
    };

    for record in bytes[HEADER_LEN + 4..].chunks_exact(RECORD_LEN) {
        let tri = parse_record(record);

        if has_invalid_coords(&tri) {
            report.invalid_coords += 1;
            continue;
        }
        if is_degenerate(&tri) {
            report.degenerate += 1;
        }
        if !is_normal_valid(&tri.normal) {
            report.invalid_normal += 1;
        }

        for vertex in &tri.vertices {
            for axis in 0..3 {
                report.min[axis] = report.min[axis].min(vertex[axis]);
                report.max[axis] = report.max[axis].max(vertex[axis]);
            }
        }
    }

    Ok(report)
}

fn parse_record(record: &[u8]) -> Triangle {
    let f = |i: usize| {
        let o = i * 4;
        f32::from_le_bytes([record[o], record[o + 1], record[o + 2], record[o + 3]])
    };
    let vec3 = |i: usize| [f(i), f(i + 1), f(i + 2)];
    Triangle {
        normal: vec3(0),
        vertices: [vec3(3), vec3(6), vec3(9)],
    }
}

/// Check if a triangle has any invalid (NaN/Inf) coordinates
fn has_invalid_coords(tri: &Triangle) -> bool {
    tri.vertices
        .iter()
        .flatten()
        .chain(tri.normal.iter())
        .any(|c| !c.is_finite())
}

/// Check if a triangle is degenerate (zero or near-zero area)
fn is_degenerate(tri: &Triangle) -> bool {
    triangle_area(&tri.vertices) < MIN_TRIANGLE_AREA
}

/// Calculate the area of a triangle from its vertices
fn triangle_area(vertices: &[[f32; 3]; 3]) -> f32 {
    let [v0, v1, v2] = *vertices;

    let edge_a = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
    let edge_b = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];

    let cx = edge_a[1] * edge_b[2] - edge_a[2] * edge_b[1];
    let cy = edge_a[2] * edge_b[0] - edge_a[0] * edge_b[2];
    let cz = edge_a[0] * edge_b[1] - edge_a[1] * edge_b[0];

    0.5 * (cx * cx + cy * cy + cz * cz).sqrt()
}

/// Check if a normal vector is valid (unit length, not zero/NaN)
fn is_normal_valid(normal: &[f32; 3]) -> bool {
    let len_sq = normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2];
    len_sq.is_finite() && (0.99..=1.01).contains(&len_sq)
}
