use super::Triangle;
use super::grid::VertexGrid;
use super::writer::BinaryWriter;
use crate::error::Result;
use anyhow::Context;
use std::path::Path;

/// Default 80-byte header text
pub const DEFAULT_HEADER: &str = "terrain2stl - Terrain Model STL Generator";

const HEADER_LEN: usize = 80;
const RECORD_LEN: usize = 50;

/// Which part of the solid a triangle belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Top,
    Base,
    South,
    North,
    West,
    East,
}

impl Face {
    /// Unit vector pointing away from the solid's interior
    pub fn outward(self) -> [f32; 3] {
        match self {
            Face::Top => [0.0, 0.0, 1.0],
            Face::Base => [0.0, 0.0, -1.0],
            Face::South => [0.0, -1.0, 0.0],
            Face::North => [0.0, 1.0, 0.0],
            Face::West => [-1.0, 0.0, 0.0],
            Face::East => [1.0, 0.0, 0.0],
        }
    }
}

/// Number of triangles a `width x height` grid produces:
/// top surface, two for the base, two per edge segment on each wall
pub fn triangle_count(width: usize, height: usize) -> usize {
    let (w, h) = (width - 1, height - 1);
    2 * w * h + 2 + 4 * (w + h)
}

/// Get the file size of an STL with the given number of triangles
pub fn estimate_stl_size(triangle_count: usize) -> usize {
    // 80 (header) + 4 (count) + triangles * (12 normal + 36 vertices + 2 attribute)
    HEADER_LEN + 4 + triangle_count * RECORD_LEN
}

#[inline]
fn grounded(v: [f32; 3]) -> [f32; 3] {
    [v[0], v[1], 0.0]
}

/// Emit the closed solid for a vertex grid, one triangle at a time.
///
/// Winding is counter-clockwise seen from outside on every face. With `a`, `b`
/// consecutive boundary vertices along increasing x (or y) and `a0`, `b0`
/// their projections onto z = 0:
/// - south and east walls use `(a0, b0, b)` and `(a0, b, a)`
/// - north and west walls use `(a0, b, b0)` and `(a0, a, b)`
pub fn for_each_triangle<F>(grid: &VertexGrid, mut emit: F) -> Result<()>
where
    F: FnMut(Face, Triangle) -> Result<()>,
{
    let (w, h) = (grid.width(), grid.height());

    // Top surface, one quad per cell split along the a-c diagonal
    for j in 0..h - 1 {
        for i in 0..w - 1 {
            let a = grid.get(i, j);
            let b = grid.get(i + 1, j);
            let c = grid.get(i + 1, j + 1);
            let d = grid.get(i, j + 1);
            emit(Face::Top, Triangle::new(a, b, c))?;
            emit(Face::Top, Triangle::new(a, c, d))?;
        }
    }

    // Base, facing down
    let sw = grounded(grid.get(0, 0));
    let se = grounded(grid.get(w - 1, 0));
    let ne = grounded(grid.get(w - 1, h - 1));
    let nw = grounded(grid.get(0, h - 1));
    emit(Face::Base, Triangle::new(sw, ne, se))?;
    emit(Face::Base, Triangle::new(sw, nw, ne))?;

    // South (j = 0) and north (j = h - 1) walls
    for i in 0..w - 1 {
        let a = grid.get(i, 0);
        let b = grid.get(i + 1, 0);
        emit(Face::South, Triangle::new(grounded(a), grounded(b), b))?;
        emit(Face::South, Triangle::new(grounded(a), b, a))?;

        let a = grid.get(i, h - 1);
        let b = grid.get(i + 1, h - 1);
        emit(Face::North, Triangle::new(grounded(a), b, grounded(b)))?;
        emit(Face::North, Triangle::new(grounded(a), a, b))?;
    }

    // West (i = 0) and east (i = w - 1) walls
    for j in 0..h - 1 {
        let a = grid.get(0, j);
        let b = grid.get(0, j + 1);
        emit(Face::West, Triangle::new(grounded(a), b, grounded(b)))?;
        emit(Face::West, Triangle::new(grounded(a), a, b))?;

        let a = grid.get(w - 1, j);
        let b = grid.get(w - 1, j + 1);
        emit(Face::East, Triangle::new(grounded(a), grounded(b), b))?;
        emit(Face::East, Triangle::new(grounded(a), b, a))?;
    }

    Ok(())
}

fn header_bytes(text: &str) -> [u8; HEADER_LEN] {
    let mut header = [b' '; HEADER_LEN];
    let bytes = text.as_bytes();
    let len = bytes.len().min(HEADER_LEN);
    header[..len].copy_from_slice(&bytes[..len]);
    header
}

fn write_triangle(writer: &mut BinaryWriter, tri: &Triangle) -> Result<()> {
    writer.put_vec3(tri.normal)?;
    for vertex in tri.vertices {
        writer.put_vec3(vertex)?;
    }
    // Attribute byte count, unused
    writer.put_u16_le(0)
}

/// Serialize a vertex grid into a binary STL buffer
///
/// Binary STL format:
/// - 80 byte header
/// - 4 byte u32 triangle count (little endian)
/// - For each triangle:
///   - 3 x f32 normal (12 bytes)
///   - 3 x 3 x f32 vertices (36 bytes)
///   - 2 byte attribute (usually 0)
///
/// The buffer is allocated once at its final size; any disagreement between
/// the precomputed count and what was written is an error.
pub fn serialize_terrain(grid: &VertexGrid, header: &str) -> Result<Vec<u8>> {
    let count = triangle_count(grid.width(), grid.height());
    let mut writer = BinaryWriter::with_len(estimate_stl_size(count));

    writer.put_bytes(&header_bytes(header))?;
    writer.put_u32_le(count as u32)?;

    for_each_triangle(grid, |_, tri| write_triangle(&mut writer, &tri))?;

    writer.finish()
}

/// Write a finished STL buffer to disk
pub fn write_stl(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write STL file: {}", path.display()))
}
