use egui::{Align2, Context, Window};

use crate::{renderer::Renderer, world::World};

pub fn scene_info(ctx: &Context, renderer: &Renderer, world: &World) {
    Window::new("Scene")
        .pivot(Align2::RIGHT_TOP)
        .resizable([false, false])
        .show(ctx, |ui| {
            let eye = renderer.camera().view.eye;
            ui.label(format!("Camera: ({:.1}, {:.1}, {:.1})", eye.x, eye.y, eye.z));
            ui.label(format!(
                "Terrain tiles: {} loaded, {} drawn",
                world.terrain.tile_count(),
                world.terrain.active_count()
            ));
            ui.label(format!("Shadow map: {}px", renderer.shadow_map_size()));
        });
}
