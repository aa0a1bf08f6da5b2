use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

/// Vertex layout shared by every generated mesh.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub tex_coord: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl Vertex {
    pub const STRIDE: u32 = std::mem::size_of::<Vertex>() as u32;

    fn new(position: Vec3, normal: Vec3, tex_coord: Vec2, tangent: Vec3, bitangent: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            color: [1.0; 4],
            tex_coord: tex_coord.to_array(),
            tangent: tangent.to_array(),
            bitangent: bitangent.to_array(),
        }
    }
}

/// CPU-side geometry ready for upload. Triangles wind clockwise when seen
/// from outside.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn vertex_stride(&self) -> u32 {
        Vertex::STRIDE
    }
}

/// Tangent and bitangent of a triangle from its positions and UVs.
///
/// Degenerate UV mappings fall back to +X / +Y.
pub fn tangent_frame(positions: [Vec3; 3], uvs: [Vec2; 3]) -> (Vec3, Vec3) {
    let edge1 = positions[1] - positions[0];
    let edge2 = positions[2] - positions[0];
    let d1 = uvs[1] - uvs[0];
    let d2 = uvs[2] - uvs[0];

    let det = d1.x * d2.y - d2.x * d1.y;
    if det.abs() < 1e-6 {
        return (Vec3::X, Vec3::Y);
    }
    let inv = 1.0 / det;
    let tangent = (edge1 * d2.y - edge2 * d1.y) * inv;
    let bitangent = (edge2 * d1.x - edge1 * d2.x) * inv;
    (
        tangent.try_normalize().unwrap_or(Vec3::X),
        bitangent.try_normalize().unwrap_or(Vec3::Y),
    )
}

/// Unit cube centred on the origin: 24 vertices, 36 indices.
pub fn cube() -> MeshData {
    // (normal, four corners clockwise from top-left as seen from outside)
    let faces: [(Vec3, [Vec3; 4]); 6] = [
        (
            Vec3::NEG_Z,
            [
                Vec3::new(-0.5, 0.5, -0.5),
                Vec3::new(0.5, 0.5, -0.5),
                Vec3::new(0.5, -0.5, -0.5),
                Vec3::new(-0.5, -0.5, -0.5),
            ],
        ),
        (
            Vec3::Z,
            [
                Vec3::new(0.5, 0.5, 0.5),
                Vec3::new(-0.5, 0.5, 0.5),
                Vec3::new(-0.5, -0.5, 0.5),
                Vec3::new(0.5, -0.5, 0.5),
            ],
        ),
        (
            Vec3::NEG_X,
            [
                Vec3::new(-0.5, 0.5, 0.5),
                Vec3::new(-0.5, 0.5, -0.5),
                Vec3::new(-0.5, -0.5, -0.5),
                Vec3::new(-0.5, -0.5, 0.5),
            ],
        ),
        (
            Vec3::X,
            [
                Vec3::new(0.5, 0.5, -0.5),
                Vec3::new(0.5, 0.5, 0.5),
                Vec3::new(0.5, -0.5, 0.5),
                Vec3::new(0.5, -0.5, -0.5),
            ],
        ),
        (
            Vec3::Y,
            [
                Vec3::new(-0.5, 0.5, 0.5),
                Vec3::new(0.5, 0.5, 0.5),
                Vec3::new(0.5, 0.5, -0.5),
                Vec3::new(-0.5, 0.5, -0.5),
            ],
        ),
        (
            Vec3::NEG_Y,
            [
                Vec3::new(-0.5, -0.5, -0.5),
                Vec3::new(0.5, -0.5, -0.5),
                Vec3::new(0.5, -0.5, 0.5),
                Vec3::new(-0.5, -0.5, 0.5),
            ],
        ),
    ];
    let uvs = [
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
    ];

    let mut mesh = MeshData::default();
    for (normal, corners) in faces {
        let base = mesh.vertices.len() as u32;
        let (tangent, bitangent) =
            tangent_frame([corners[0], corners[1], corners[2]], [uvs[0], uvs[1], uvs[2]]);
        for (corner, uv) in corners.into_iter().zip(uvs) {
            mesh.vertices
                .push(Vertex::new(corner, normal, uv, tangent, bitangent));
        }
        mesh.indices
            .extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

/// UV sphere. Poles get a fixed +X tangent; pole rows emit no zero-area
/// triangles.
pub fn sphere(radius: f32, slices: u32, stacks: u32) -> MeshData {
    let slices = slices.max(3);
    let stacks = stacks.max(2);
    let mut mesh = MeshData::default();

    for stack in 0..=stacks {
        let phi = stack as f32 * PI / stacks as f32;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for slice in 0..=slices {
            let theta = slice as f32 * TAU / slices as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();

            let normal = Vec3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta);
            let tangent = if sin_phi < 1e-4 {
                Vec3::X
            } else {
                Vec3::new(-sin_theta, 0.0, cos_theta)
            };
            let bitangent = normal.cross(tangent).try_normalize().unwrap_or(Vec3::Z);
            let uv = Vec2::new(
                slice as f32 / slices as f32,
                stack as f32 / stacks as f32,
            );
            mesh.vertices
                .push(Vertex::new(normal * radius, normal, uv, tangent, bitangent));
        }
    }

    let row = slices + 1;
    for stack in 0..stacks {
        for slice in 0..slices {
            let current = stack * row + slice;
            let next = current + 1;
            let below = current + row;
            let below_next = below + 1;

            if stack > 0 {
                mesh.indices.extend([current, next, below]);
            }
            if stack < stacks - 1 {
                mesh.indices.extend([next, below_next, below]);
            }
        }
    }
    mesh
}

/// Flat grid in the XZ plane facing +Y, centred on the origin.
pub fn plane(width: f32, depth: f32, x_divs: u32, z_divs: u32) -> MeshData {
    let x_divs = x_divs.max(1);
    let z_divs = z_divs.max(1);
    let mut mesh = MeshData::default();

    for z in 0..=z_divs {
        let v = z as f32 / z_divs as f32;
        for x in 0..=x_divs {
            let u = x as f32 / x_divs as f32;
            let position = Vec3::new(-width / 2.0 + u * width, 0.0, -depth / 2.0 + v * depth);
            mesh.vertices.push(Vertex::new(
                position,
                Vec3::Y,
                Vec2::new(u, v),
                Vec3::X,
                Vec3::Z,
            ));
        }
    }

    let row = x_divs + 1;
    for z in 0..z_divs {
        for x in 0..x_divs {
            let top_left = z * row + x;
            let top_right = top_left + 1;
            let bottom_left = top_left + row;
            let bottom_right = bottom_left + 1;
            mesh.indices.extend([
                top_left,
                bottom_left,
                top_right,
                top_right,
                bottom_left,
                bottom_right,
            ]);
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(mesh: &MeshData, t: usize) -> [Vec3; 3] {
        let i = &mesh.indices[t * 3..t * 3 + 3];
        [0, 1, 2].map(|k| Vec3::from_array(mesh.vertices[i[k] as usize].position))
    }

    /// For clockwise winding in a left-handed frame, `(b - a) x (c - a)`
    /// points away from the viewer that sees the front face.
    fn outward(mesh: &MeshData, t: usize) -> Vec3 {
        let [a, b, c] = triangle(mesh, t);
        (b - a).cross(c - a)
    }

    #[test]
    fn cube_counts() {
        let mesh = cube();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.index_count(), 36);
        assert_eq!(mesh.vertex_stride(), 72);
    }

    #[test]
    fn cube_faces_wind_outward() {
        let mesh = cube();
        for t in 0..12 {
            let [a, b, c] = triangle(&mesh, t);
            let centroid = (a + b + c) / 3.0;
            assert!(outward(&mesh, t).dot(centroid) > 0.0, "triangle {t}");
        }
    }

    #[test]
    fn cube_front_face_tangent_frame() {
        let mesh = cube();
        // -Z face: u runs +X, v runs -Y
        assert_eq!(mesh.vertices[0].tangent, [1.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[0].bitangent, [0.0, -1.0, 0.0]);
    }

    #[test]
    fn degenerate_uvs_fall_back() {
        let (t, b) = tangent_frame([Vec3::ZERO, Vec3::X, Vec3::Y], [Vec2::ZERO; 3]);
        assert_eq!((t, b), (Vec3::X, Vec3::Y));
    }

    #[test]
    fn sphere_counts_skip_pole_triangles() {
        let mesh = sphere(1.0, 20, 20);
        assert_eq!(mesh.vertices.len(), 21 * 21);
        assert_eq!(mesh.indices.len(), 20 * (2 * 20 - 2) * 3);
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let mesh = sphere(2.5, 8, 6);
        for v in &mesh.vertices {
            let len = Vec3::from_array(v.position).length();
            assert!((len - 2.5).abs() < 1e-4);
        }
    }

    #[test]
    fn sphere_triangles_have_area_and_face_out() {
        let mesh = sphere(1.0, 12, 8);
        for t in 0..mesh.indices.len() / 3 {
            let [a, b, c] = triangle(&mesh, t);
            let n = outward(&mesh, t);
            assert!(n.length() > 1e-6, "triangle {t} is degenerate");
            assert!(n.dot((a + b + c) / 3.0) > 0.0, "triangle {t} faces inward");
        }
    }

    #[test]
    fn plane_counts_and_extent() {
        let mesh = plane(10.0, 4.0, 5, 2);
        assert_eq!(mesh.vertices.len(), 6 * 3);
        assert_eq!(mesh.indices.len(), 5 * 2 * 6);
        assert_eq!(mesh.vertices[0].position, [-5.0, 0.0, -2.0]);
        assert_eq!(mesh.vertices.last().unwrap().position, [5.0, 0.0, 2.0]);
    }

    #[test]
    fn plane_faces_up() {
        let mesh = plane(2.0, 2.0, 2, 2);
        for t in 0..mesh.indices.len() / 3 {
            assert!(outward(&mesh, t).y > 0.0);
        }
    }
}
