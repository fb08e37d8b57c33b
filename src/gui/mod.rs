use std::sync::mpsc::Sender;

use animation::animation_panel;
use egui::Context;
use error::error_dialog;
use perf::perf_info;
use scene::scene_info;

use crate::{frame::FrameContext, perf::PerformanceTracker, renderer::Renderer, world::World};

mod animation;
mod error;
pub mod overlay;
mod perf;
mod scene;

#[derive(Default)]
pub struct GuiState {
    errors: Vec<String>,
}

impl GuiState {
    pub fn add_error(&mut self, error: String) {
        self.errors.push(error)
    }
}

/// Requests from the overlay, applied to the scene before the next frame
#[derive(Debug, Clone, PartialEq)]
pub enum GuiAction {
    SetPlaying(bool),
    SelectAnimation(usize),
    Seek(f32),
}

pub struct GuiParam<'a> {
    pub renderer: &'a Renderer,
    pub world: &'a World,
    pub frame: Option<&'a FrameContext>,
    pub perf_tracker: &'a PerformanceTracker,
}

pub fn gui_main(
    ctx: &Context,
    param: &GuiParam,
    state: &mut GuiState,
    gui_actions_tx: &mut Sender<GuiAction>,
) {
    perf_info(ctx, param.perf_tracker, param.frame);
    animation_panel(ctx, &param.world.model, gui_actions_tx);
    scene_info(ctx, param.renderer, param.world);

    let mut remove_index = Vec::new();
    for (index, error) in state.errors.iter().enumerate() {
        error_dialog(ctx, index, error, || {
            remove_index.push(index);
        });
    }
    for index in remove_index.into_iter().rev() {
        state.errors.remove(index);
    }
}
