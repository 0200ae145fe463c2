use bytemuck::{Pod, Zeroable};

/// Pre-transformed quad vertex: clip-space position and texture coordinate.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 4],
    pub uv: [f32; 2],
}

const fn vertex(x: f32, y: f32, u: f32, v: f32) -> QuadVertex {
    QuadVertex {
        position: [x, y, 0.0, 1.0],
        uv: [u, v],
    }
}

/// Triangle-strip order. v = 0 is the top row of the image.
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    vertex(-1.0, -1.0, 0.0, 1.0),
    vertex(-1.0, 1.0, 0.0, 0.0),
    vertex(1.0, -1.0, 1.0, 1.0),
    vertex(1.0, 1.0, 1.0, 0.0),
];

/// The strip expanded into its two triangles.
pub fn quad_triangles() -> [[QuadVertex; 3]; 2] {
    let v = QUAD_VERTICES;
    [[v[0], v[1], v[2]], [v[2], v[1], v[3]]]
}

/// Vertex layout of `fullscreen_quad.wgsl`.
pub fn quad_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x4, 1 => Float32x2];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}
