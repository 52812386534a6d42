/// One facet of the terrain solid, as stored in an STL record
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// Corners in counter-clockwise order seen from outside
    pub vertices: [[f32; 3]; 3],
    /// Unit normal derived from the winding
    pub normal: [f32; 3],
}

impl Triangle {
    pub fn new(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> Self {
        Self {
            vertices: [a, b, c],
            normal: calculate_normal(a, b, c),
        }
    }
}

#[inline]
fn sub(p: [f32; 3], q: [f32; 3]) -> [f32; 3] {
    [p[0] - q[0], p[1] - q[1], p[2] - q[2]]
}

#[inline]
fn cross(u: [f32; 3], v: [f32; 3]) -> [f32; 3] {
    [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ]
}

/// Unit normal of `(b - a) x (c - a)`.
///
/// Collapsed triangles get `+z` so every record still carries a unit vector.
pub fn calculate_normal(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> [f32; 3] {
    let n = cross(sub(b, a), sub(c, a));
    let len = n.iter().map(|x| x * x).sum::<f32>().sqrt();
    if len <= 1e-10 {
        return [0.0, 0.0, 1.0];
    }
    n.map(|x| x / len)
}
