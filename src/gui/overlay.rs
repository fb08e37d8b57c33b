use std::sync::mpsc::{self, Receiver, Sender};

use egui::{Context, ViewportId};
use egui_wgpu::{Renderer as EguiRenderer, ScreenDescriptor};
use egui_winit::State as EguiWinitState;
use wgpu::{Device, Queue, TextureFormat};
use winit::{event::WindowEvent, window::Window};

use crate::renderer::{OngoingRenderState, DEPTH_TEXTURE_FORMAT};

use super::{gui_main, GuiAction, GuiParam, GuiState};

/// The egui debug overlay, toggled at runtime. Widgets never touch the
/// scene directly, they queue `GuiAction`s applied before the next frame.
pub struct Overlay {
    active: bool,
    renderer: EguiRenderer,
    winit_state: EguiWinitState,
    state: GuiState,
    actions_tx: Sender<GuiAction>,
    actions_rx: Receiver<GuiAction>,
}

impl Overlay {
    pub fn new(device: &Device, format: TextureFormat, window: &Window) -> Self {
        let renderer = EguiRenderer::new(device, format, Some(DEPTH_TEXTURE_FORMAT), 1, false);
        let winit_state = EguiWinitState::new(
            Context::default(),
            ViewportId::default(),
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let (actions_tx, actions_rx) = mpsc::channel();
        Self {
            active: false,
            renderer,
            winit_state,
            state: GuiState::default(),
            actions_tx,
            actions_rx,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn toggle(&mut self) -> bool {
        self.active = !self.active;
        self.active
    }

    pub fn add_error(&mut self, error: String) {
        self.state.add_error(error);
    }

    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) {
        // Every frame is redrawn anyway, so the repaint hint is not needed
        let _ = self.winit_state.on_window_event(window, event);
    }

    pub fn take_actions(&self) -> Vec<GuiAction> {
        self.actions_rx.try_iter().collect()
    }

    /// Run the widgets and paint them on top of the scene in the same pass.
    pub fn draw(
        &mut self,
        window: &Window,
        device: &Device,
        queue: &Queue,
        ongoing_state: &mut OngoingRenderState,
        param: GuiParam,
    ) {
        if !self.active {
            return;
        }
        let size = window.inner_size();
        let screen_descriptor = ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point: self.winit_state.egui_ctx().zoom_factor()
                * window.scale_factor() as f32,
        };

        let input = self.winit_state.take_egui_input(window);
        let state = &mut self.state;
        let actions_tx = &mut self.actions_tx;
        let output = self.winit_state.egui_ctx().run(input, |ctx| {
            gui_main(ctx, &param, state, actions_tx);
        });
        self.winit_state
            .handle_platform_output(window, output.platform_output);

        let paint_jobs = self
            .winit_state
            .egui_ctx()
            .tessellate(output.shapes, output.pixels_per_point);
        for (id, image_delta) in &output.textures_delta.set {
            self.renderer
                .update_texture(device, queue, *id, image_delta);
        }
        self.renderer.update_buffers(
            device,
            queue,
            &mut ongoing_state.encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        self.renderer
            .render(&mut ongoing_state.render_pass, &paint_jobs, &screen_descriptor);
        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}
