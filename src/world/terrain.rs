use std::collections::HashMap;

use glam::{Mat4, Vec3};
use log::{debug, error};
use wgpu::{Device, Queue, RenderPass};

use crate::{
    config::TerrainConfig,
    renderer::{
        mesh::MeshBuffers,
        texture::TextureItem,
        uniform::{instance::InstanceUniformBuffer, material::MaterialBinding},
        RendererLayouts, INSTANCE_GROUP, MATERIAL_GROUP,
    },
};

use super::{
    shape::ground_quad,
    tile::{TileKey, TileManager, TileUpdate},
};

/// Tint used when no ground texture could be loaded
const FALLBACK_GROUND_COLOR: [f32; 4] = [0.76, 0.7, 0.5, 1.0];

/// Ground made of textured quads, one per loaded tile. All tiles share one
/// mesh and material and only differ in their instance transform.
pub struct Terrain {
    tiles: TileManager,
    mesh: MeshBuffers,
    material: MaterialBinding,
    instances: HashMap<TileKey, InstanceUniformBuffer>,
    load_error: Option<String>,
}

impl Terrain {
    pub fn new(
        device: &Device,
        queue: &Queue,
        layouts: &RendererLayouts,
        config: &TerrainConfig,
    ) -> Self {
        let mut load_error = None;
        let loaded = config.texture.as_ref().and_then(|path| {
            TextureItem::from_path(device, queue, path)
                .map_err(|err| {
                    error!("Failed to load terrain texture {:?}: {}", path, err);
                    load_error = Some(format!(
                        "Load terrain texture \"{}\" failed: {}",
                        path.to_string_lossy(),
                        err
                    ));
                })
                .ok()
        });
        let (texture, base_color) = match loaded {
            Some(texture) => (texture, [1.0; 4]),
            None => (TextureItem::white(device, queue), FALLBACK_GROUND_COLOR),
        };

        let quad = ground_quad();
        let mesh = MeshBuffers::new(device, &quad, Some("Terrain tile"));
        let material = MaterialBinding::new(
            device,
            &layouts.material,
            base_color,
            &texture,
            Some("Terrain material"),
        );

        Self {
            tiles: TileManager::new(config),
            mesh,
            material,
            instances: HashMap::new(),
            load_error,
        }
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    fn tile_transform(&self, key: TileKey) -> Mat4 {
        let size = self.tiles.tile_size();
        Mat4::from_translation(self.tiles.tile_origin(key))
            * Mat4::from_scale(Vec3::new(size, 1.0, size))
    }

    /// Follow the player, creating instances for new tiles and dropping the
    /// evicted ones.
    pub fn update(
        &mut self,
        device: &Device,
        layouts: &RendererLayouts,
        player_position: Vec3,
    ) -> TileUpdate {
        let update = self.tiles.update(player_position);
        for key in &update.evicted {
            self.instances.remove(key);
        }
        for key in &update.spawned {
            let instance =
                InstanceUniformBuffer::new(device, &layouts.instance, self.tile_transform(*key), false);
            self.instances.insert(*key, instance);
        }
        if !update.is_empty() {
            debug!(
                "Terrain tiles: {} spawned, {} evicted, {} loaded",
                update.spawned.len(),
                update.evicted.len(),
                self.tiles.tile_count()
            );
        }
        update
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.tile_count()
    }

    pub fn active_count(&self) -> usize {
        self.tiles.active_tiles().count()
    }

    fn active_instances(&self) -> impl Iterator<Item = &InstanceUniformBuffer> + '_ {
        self.tiles
            .active_tiles()
            .filter_map(|key| self.instances.get(&key))
    }

    pub fn render(&self, render_pass: &mut RenderPass) {
        render_pass.set_bind_group(MATERIAL_GROUP, self.material.bind_group(), &[]);
        self.mesh.bind(render_pass);
        for instance in self.active_instances() {
            render_pass.set_bind_group(INSTANCE_GROUP, instance.bind_group(), &[]);
            render_pass.draw_indexed(0..self.mesh.index_count(), 0, 0..1);
        }
    }

    pub fn render_depth(&self, render_pass: &mut RenderPass) {
        self.mesh.bind(render_pass);
        for instance in self.active_instances() {
            render_pass.set_bind_group(INSTANCE_GROUP, instance.bind_group(), &[]);
            render_pass.draw_indexed(0..self.mesh.index_count(), 0, 0..1);
        }
    }
}
