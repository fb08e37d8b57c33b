use glam::Vec3;
use log::{info, warn};
use wgpu::{Device, Queue, RenderPass};

use crate::{
    config::ViewerConfig,
    frame::FrameContext,
    renderer::{model::Model, RendererLayouts},
};

use shape::{box_transform, cube_primitive};
use terrain::Terrain;

pub mod shape;
pub mod terrain;
pub mod tile;

/// Everything drawn in the scene: the animated model, static boxes and the
/// tiled ground.
pub struct World {
    pub model: Model,
    boxes: Vec<Model>,
    pub terrain: Terrain,
}

impl World {
    pub fn new(
        device: &Device,
        queue: &Queue,
        layouts: &RendererLayouts,
        config: &ViewerConfig,
    ) -> Self {
        let mut model = match &config.model.path {
            Some(path) => Model::load(device, queue, layouts, path),
            None => {
                warn!("No model path configured, showing an empty scene");
                Model::empty(None, None)
            }
        };
        model.set_transform(config.model.transform());

        let boxes = config
            .boxes
            .iter()
            .enumerate()
            .map(|(index, box_config)| {
                let mut model = Model::from_primitives(
                    device,
                    queue,
                    layouts,
                    vec![cube_primitive(box_config.color)],
                    Some(format!("Box #{}", index)),
                );
                model.set_transform(box_transform(box_config));
                model
            })
            .collect::<Vec<_>>();
        info!("Placed {} boxes", boxes.len());

        Self {
            model,
            boxes,
            terrain: Terrain::new(device, queue, layouts, &config.terrain),
        }
    }

    /// Load failures to report to the user
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.model
            .load_error()
            .into_iter()
            .chain(self.terrain.load_error())
    }

    pub fn update(
        &mut self,
        device: &Device,
        layouts: &RendererLayouts,
        frame: &FrameContext,
        player_position: Vec3,
    ) {
        self.terrain.update(device, layouts, player_position);
        self.model.update_animation(frame.delta);
    }

    pub fn prepare(&mut self, queue: &Queue) {
        self.model.prepare(queue);
        for cube in &mut self.boxes {
            cube.prepare(queue);
        }
    }

    pub fn render(&self, render_pass: &mut RenderPass) {
        self.terrain.render(render_pass);
        for cube in &self.boxes {
            cube.render(render_pass);
        }
        self.model.render(render_pass);
    }

    /// Shadow casters, drawn from the light
    pub fn render_depth(&self, render_pass: &mut RenderPass) {
        self.terrain.render_depth(render_pass);
        for cube in &self.boxes {
            cube.render_depth(render_pass);
        }
        self.model.render_depth(render_pass);
    }
}
