//! Layer descriptor → wgpu pipeline state.
//!
//! Pure mappings from the cache's layer vocabulary onto wgpu types, plus a
//! convenience constructor for a layer's render pipeline.

use strata_cache::{BakedVertex, BlendMode, DrawMode, Layer, VertexFormat};

/// Bytes of vertex-stage push constants used for the region offset
/// (`vec4<f32>`, w unused).
pub const REGION_PUSH_CONSTANT_SIZE: u32 = 16;

/// Every attribute of [`BakedVertex`], in field order.
static BAKED_ATTRIBS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    0 => Float32x3,  // position
    1 => Unorm8x4,   // color
    2 => Float32x2,  // uv
    3 => Uint32,     // light
    4 => Uint32,     // overlay
];

/// Returns the WGSL source for the region shader.
#[must_use]
pub fn shader_source() -> &'static str {
    include_str!("../shaders/region.wgsl")
}

/// Vertex buffer layout exposing the attributes a format consumes.
///
/// The stride is always the full [`BakedVertex`] size.
#[must_use]
pub fn vertex_layout(format: VertexFormat) -> wgpu::VertexBufferLayout<'static> {
    let attributes = match format {
        VertexFormat::PositionColor => &BAKED_ATTRIBS[..2],
        VertexFormat::PositionColorTexLight => &BAKED_ATTRIBS[..4],
        VertexFormat::PositionColorTexLightOverlay => &BAKED_ATTRIBS[..],
    };
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<BakedVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

/// Primitive state for a draw mode. Quads are drawn as indexed triangles.
#[must_use]
pub fn primitive_state(mode: DrawMode) -> wgpu::PrimitiveState {
    let topology = match mode {
        DrawMode::Triangles | DrawMode::Quads => wgpu::PrimitiveTopology::TriangleList,
        DrawMode::Lines => wgpu::PrimitiveTopology::LineList,
    };
    wgpu::PrimitiveState {
        topology,
        front_face: wgpu::FrontFace::Ccw,
        // Plates are visible from both sides
        cull_mode: None,
        ..Default::default()
    }
}

/// Blend state for a blend mode. `None` replaces.
#[must_use]
pub fn blend_state(mode: BlendMode) -> Option<wgpu::BlendState> {
    match mode {
        BlendMode::Opaque => None,
        BlendMode::Translucent => Some(wgpu::BlendState::ALPHA_BLENDING),
        BlendMode::Additive => Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        }),
    }
}

/// Depth state for a layer. Color-only layers test depth but never write it.
#[must_use]
pub fn depth_stencil_state(layer: Layer, format: wgpu::TextureFormat) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format,
        depth_write_enabled: layer.descriptor().depth_write,
        depth_compare: wgpu::CompareFunction::LessEqual,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Triangle-list indices for `vertex_count / 4` quads.
///
/// Trailing vertices that do not complete a quad get no indices.
#[must_use]
pub fn quad_indices(vertex_count: u32) -> Vec<u32> {
    let quads = vertex_count / 4;
    let mut indices = Vec::with_capacity(quads as usize * 6);
    for quad in 0..quads {
        let base = quad * 4;
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    indices
}

/// Pipeline layout with the region offset push constant.
#[must_use]
pub fn pipeline_layout(
    device: &wgpu::Device,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
) -> wgpu::PipelineLayout {
    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Region Pipeline Layout"),
        bind_group_layouts,
        push_constant_ranges: &[wgpu::PushConstantRange {
            stages: wgpu::ShaderStages::VERTEX,
            range: 0..REGION_PUSH_CONSTANT_SIZE,
        }],
    })
}

/// Render pipeline for one layer using `vs_main` / `fs_main` from `shader`.
#[must_use]
pub fn create_layer_pipeline(
    device: &wgpu::Device,
    layer: Layer,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    color_format: wgpu::TextureFormat,
    depth_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let descriptor = layer.descriptor();
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(descriptor.name),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers: &[vertex_layout(descriptor.format)],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: blend_state(descriptor.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: primitive_state(descriptor.draw_mode),
        depth_stencil: Some(depth_stencil_state(layer, depth_format)),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}
