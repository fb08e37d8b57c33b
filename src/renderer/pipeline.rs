use wgpu::{
    include_wgsl, BlendComponent, BlendState, ColorTargetState, ColorWrites, CompareFunction,
    DepthBiasState, DepthStencilState, Device, Face, FragmentState, FrontFace, MultisampleState,
    PipelineLayout, PipelineLayoutDescriptor, PolygonMode, PrimitiveState, PrimitiveTopology,
    RenderPipeline, RenderPipelineDescriptor, ShaderModule, StencilState, TextureFormat,
    VertexState,
};

use super::{
    depth_texture::DEPTH_TEXTURE_FORMAT,
    vertex::{SkinVertex, Vertex},
    RendererLayouts,
};

const VERTEX_ENTRY: &str = "vs_main";
const FRAGMENT_ENTRY: &str = "fs_main";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderType {
    /// Lit, shadowed and fogged color pass
    Object,
    /// Depth only pass into the shadow map
    Depth,
}

#[derive(Debug)]
pub struct RenderPipelineItem {
    render_pipeline: RenderPipeline,
}

#[derive(Debug)]
pub struct RenderPipelineItemDescriptor<'a> {
    pub label: Option<&'a str>,
    pub shader_module: &'a ShaderModule,
    pub vertex_entry_name: &'a str,
    pub fragment_entry_name: Option<&'a str>,
    pub target_texture_format: TextureFormat,
    pub shader_type: ShaderType,
}

impl RenderPipelineItem {
    fn create_pipeline_layout(
        device: &Device,
        layouts: &RendererLayouts,
        descriptor: &RenderPipelineItemDescriptor,
    ) -> PipelineLayout {
        let bind_group_layouts: &[_] = match descriptor.shader_type {
            ShaderType::Object => &[
                &layouts.global,
                &layouts.instance,
                &layouts.material,
                &layouts.joint,
            ],
            ShaderType::Depth => &[&layouts.shadow, &layouts.instance, &layouts.joint],
        };
        device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: descriptor.label,
            bind_group_layouts,
            push_constant_ranges: &[],
        })
    }

    fn create_render_pipeline(
        device: &Device,
        pipeline_layout: &PipelineLayout,
        descriptor: &RenderPipelineItemDescriptor,
    ) -> RenderPipeline {
        let targets = [Some(ColorTargetState {
            format: descriptor.target_texture_format,
            blend: Some(BlendState {
                color: BlendComponent::REPLACE,
                alpha: BlendComponent::REPLACE,
            }),
            write_mask: ColorWrites::all(),
        })];
        let bias = match descriptor.shader_type {
            ShaderType::Object => DepthBiasState::default(),
            ShaderType::Depth => DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            },
        };
        device.create_render_pipeline(&RenderPipelineDescriptor {
            label: descriptor.label,
            layout: Some(pipeline_layout),
            vertex: VertexState {
                module: descriptor.shader_module,
                entry_point: descriptor.vertex_entry_name,
                compilation_options: Default::default(),
                buffers: &[SkinVertex::desc()],
            },
            fragment: descriptor
                .fragment_entry_name
                .map(|fragment_entry_name| FragmentState {
                    module: descriptor.shader_module,
                    entry_point: fragment_entry_name,
                    compilation_options: Default::default(),
                    targets: &targets,
                }),
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: Some(Face::Back),
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_TEXTURE_FORMAT,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
                stencil: StencilState::default(),
                bias,
            }),
            multisample: MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }

    pub fn new(
        device: &Device,
        layouts: &RendererLayouts,
        descriptor: &RenderPipelineItemDescriptor,
    ) -> Self {
        let pipeline_layout = Self::create_pipeline_layout(device, layouts, descriptor);
        let render_pipeline = Self::create_render_pipeline(device, &pipeline_layout, descriptor);
        Self { render_pipeline }
    }

    pub fn render_pipeline(&self) -> &RenderPipeline {
        &self.render_pipeline
    }
}

pub struct Pipelines {
    object: RenderPipelineItem,
    depth: RenderPipelineItem,
}

impl Pipelines {
    pub fn new(
        device: &Device,
        layouts: &RendererLayouts,
        target_texture_format: TextureFormat,
    ) -> Self {
        let object_shader = device.create_shader_module(include_wgsl!("../shader/object.wgsl"));
        let depth_shader = device.create_shader_module(include_wgsl!("../shader/depth.wgsl"));
        let object = RenderPipelineItem::new(
            device,
            layouts,
            &RenderPipelineItemDescriptor {
                label: Some("Object Pipeline"),
                shader_module: &object_shader,
                vertex_entry_name: VERTEX_ENTRY,
                fragment_entry_name: Some(FRAGMENT_ENTRY),
                target_texture_format,
                shader_type: ShaderType::Object,
            },
        );
        let depth = RenderPipelineItem::new(
            device,
            layouts,
            &RenderPipelineItemDescriptor {
                label: Some("Depth Pipeline"),
                shader_module: &depth_shader,
                vertex_entry_name: VERTEX_ENTRY,
                fragment_entry_name: None,
                target_texture_format,
                shader_type: ShaderType::Depth,
            },
        );
        Self { object, depth }
    }

    pub fn get(&self, shader: ShaderType) -> &RenderPipelineItem {
        match shader {
            ShaderType::Object => &self.object,
            ShaderType::Depth => &self.depth,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn declares(source: &str, stage: &str, entry: &str) -> bool {
        source.contains(&format!("{}\nfn {}(", stage, entry))
    }

    #[test]
    fn test_entry_points_exist_in_shaders() {
        let object = include_str!("../shader/object.wgsl");
        let depth = include_str!("../shader/depth.wgsl");
        assert!(declares(object, "@vertex", VERTEX_ENTRY));
        assert!(declares(object, "@fragment", FRAGMENT_ENTRY));
        assert!(declares(depth, "@vertex", VERTEX_ENTRY));
        assert!(!depth.contains("@fragment"));
    }
}
