use std::{cmp::Ordering, path::PathBuf, sync::Arc, time::Instant};

use log::info;
use pollster::FutureExt;
use skinview::{
    config::ViewerConfig,
    frame::FrameClock,
    gpu::GpuContext,
    gui::{overlay::Overlay, GuiAction, GuiParam},
    perf::PerformanceTracker,
    renderer::{camera::PositionController, OngoingRenderState, Renderer},
    world::World,
};
use wgpu::TextureViewDescriptor;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Fullscreen, Window, WindowAttributes, WindowId},
};

const MOUSE_SENSITIVITY: f32 = 0.3;
const FOV_STEP: f32 = 10.0;

struct Viewer {
    gpu: GpuContext,
    renderer: Renderer,
    world: World,
    overlay: Overlay,

    clock: FrameClock,
    max_frame_delta: f32,
    last_frame: Option<Instant>,
    perf_tracker: PerformanceTracker,
    controller: PositionController,
}

impl Viewer {
    fn new(window: Arc<Window>, config: &ViewerConfig) -> Self {
        let gpu = GpuContext::new(window.clone()).block_on();
        let renderer = Renderer::new(&gpu.device, gpu.format(), gpu.size(), config);
        let world = World::new(&gpu.device, &gpu.queue, &renderer.layouts, config);
        let mut overlay = Overlay::new(&gpu.device, gpu.format(), &window);
        for error in world.errors() {
            overlay.add_error(error.to_string());
        }

        Self {
            gpu,
            renderer,
            world,
            overlay,
            clock: FrameClock::default(),
            max_frame_delta: config.max_frame_delta,
            last_frame: None,
            perf_tracker: PerformanceTracker::default(),
            controller: PositionController::new(config.camera.speed),
        }
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if self.gpu.resize(size) {
            self.renderer.resize(&self.gpu.device, size);
        }
    }

    fn zoom(&mut self, scroll: f32) {
        let step = match scroll.total_cmp(&0.0) {
            Ordering::Less => FOV_STEP,
            Ordering::Greater => -FOV_STEP,
            Ordering::Equal => return,
        };
        self.renderer.update_camera(|camera| {
            camera.projection.yfov = (camera.projection.yfov + step).clamp(30.0, 120.0);
        })
    }

    fn look(&mut self, (delta_x, delta_y): (f64, f64)) {
        self.renderer.update_camera(|camera| {
            camera.view.yaw += delta_x as f32 * MOUSE_SENSITIVITY;
            camera.view.pitch =
                (camera.view.pitch - delta_y as f32 * MOUSE_SENSITIVITY).clamp(-89.0, 89.0);
        })
    }

    /// Movement keys held down steer the camera every frame.
    fn movement_key(&mut self, code: KeyCode, pressed: bool) {
        let flag = match code {
            KeyCode::KeyW => &mut self.controller.forward,
            KeyCode::KeyS => &mut self.controller.backward,
            KeyCode::KeyA => &mut self.controller.left,
            KeyCode::KeyD => &mut self.controller.right,
            KeyCode::Space => &mut self.controller.up,
            KeyCode::ShiftLeft => &mut self.controller.down,
            _ => return,
        };
        *flag = pressed;
    }

    fn apply_action(&mut self, action: GuiAction) {
        let animator = self.world.model.animator_mut();
        match action {
            GuiAction::SetPlaying(playing) => animator.set_playing(playing),
            GuiAction::SelectAnimation(index) => {
                if !animator.set_active_animation(index) {
                    self.overlay
                        .add_error(format!("Animation #{} does not exist", index));
                }
            }
            GuiAction::Seek(time) => animator.seek(time),
        }
    }

    fn toggle_playing(&mut self) {
        let playing = self.world.model.animator().is_playing();
        self.apply_action(GuiAction::SetPlaying(!playing));
    }

    fn render(&mut self, window: &Window) {
        for action in self.overlay.take_actions() {
            self.apply_action(action);
        }

        let start_time = Instant::now();
        let since_last = self.last_frame.map(|last_frame| start_time - last_frame);
        self.last_frame = Some(start_time);
        if let Some(duration) = since_last {
            let controller = &self.controller;
            self.renderer
                .update_camera(|camera| controller.update(duration, camera));
        }
        let frame = self.clock.tick(since_last, self.max_frame_delta);

        let player_position = self.renderer.camera().view.eye;
        self.world
            .update(&self.gpu.device, &self.renderer.layouts, &frame, player_position);
        self.renderer.prepare(&self.gpu.queue);
        self.world.prepare(&self.gpu.queue);

        let Some(output) = self.gpu.acquire_frame() else {
            window.request_redraw();
            return;
        };
        let texture_view = output
            .texture
            .create_view(&TextureViewDescriptor::default());

        let mut encoder = self.renderer.create_encoder(&self.gpu.device);
        {
            let mut shadow_pass = self.renderer.begin_shadow_pass(&mut encoder);
            self.world.render_depth(&mut shadow_pass);
        }
        let mut ongoing_state = OngoingRenderState::new(encoder, &texture_view, &self.renderer);
        self.world.render(&mut ongoing_state.render_pass);
        self.overlay.draw(
            window,
            &self.gpu.device,
            &self.gpu.queue,
            &mut ongoing_state,
            GuiParam {
                renderer: &self.renderer,
                world: &self.world,
                frame: Some(&frame),
                perf_tracker: &self.perf_tracker,
            },
        );
        ongoing_state.finish(&self.gpu.queue);

        window.pre_present_notify();
        output.present();
        window.request_redraw();

        let end_time = Instant::now();
        self.perf_tracker.add_sample(end_time - start_time, end_time);
    }
}

struct App {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    viewer: Option<Viewer>,
}

impl App {
    fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            window: None,
            viewer: None,
        }
    }

    fn grab_cursor(window: &Window, grab: bool) {
        window.set_cursor_visible(!grab);
        let result = if grab {
            window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
        } else {
            window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(err) = result {
            info!("Failed to change mouse grab: {:?}", err);
        }
    }

    /// Keys that work whether or not the overlay has the input. Returns true
    /// when the key was consumed.
    fn global_key(
        event_loop: &ActiveEventLoop,
        window: &Window,
        viewer: &mut Viewer,
        event: &KeyEvent,
    ) -> bool {
        let released = !event.repeat && event.state == ElementState::Released;
        match event.physical_key {
            PhysicalKey::Code(KeyCode::Escape) => event_loop.exit(),
            PhysicalKey::Code(KeyCode::F11) if released => {
                let fullscreen = match window.fullscreen() {
                    Some(_) => None,
                    None => Some(Fullscreen::Borderless(None)),
                };
                window.set_fullscreen(fullscreen);
            }
            PhysicalKey::Code(KeyCode::F10) => {
                if released {
                    let active = viewer.overlay.toggle();
                    Self::grab_cursor(window, window.has_focus() && !active);
                }
                return true;
            }
            _ => (),
        }
        false
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window = self.window.get_or_insert_with(|| {
            Arc::new(
                event_loop
                    .create_window(
                        WindowAttributes::default()
                            .with_title("skinview")
                            .with_inner_size(LogicalSize::new(1280, 720)),
                    )
                    .expect("Failed to create window"),
            )
        });
        Self::grab_cursor(window, true);
        if self.viewer.is_none() {
            self.viewer = Some(Viewer::new(window.clone(), &self.config));
        }
    }

    fn suspended(&mut self, _: &ActiveEventLoop) {
        self.viewer = None;
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: DeviceId, event: DeviceEvent) {
        if let (Some(viewer), DeviceEvent::MouseMotion { delta }) = (self.viewer.as_mut(), event) {
            if !viewer.overlay.is_active() {
                viewer.look(delta);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
        let (Some(window), Some(viewer)) = (self.window.as_ref(), self.viewer.as_mut()) else {
            return;
        };

        match &event {
            WindowEvent::CloseRequested => return event_loop.exit(),
            WindowEvent::RedrawRequested => return viewer.render(window),
            WindowEvent::Focused(focused) => {
                return Self::grab_cursor(window, *focused && !viewer.overlay.is_active());
            }
            WindowEvent::Resized(size) => viewer.resize(*size),
            WindowEvent::KeyboardInput { event, .. } => {
                if Self::global_key(event_loop, window, viewer, event) {
                    return;
                }
            }
            _ => (),
        }

        if viewer.overlay.is_active() {
            viewer.overlay.on_window_event(window, &event);
            return;
        }
        match event {
            WindowEvent::MouseWheel { delta, .. } => viewer.zoom(match delta {
                MouseScrollDelta::LineDelta(_, y) => y,
                MouseScrollDelta::PixelDelta(position) => position.y as f32,
            }),
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    if code == KeyCode::KeyP {
                        if !event.repeat && event.state == ElementState::Released {
                            viewer.toggle_playing();
                        }
                    } else {
                        viewer.movement_key(code, event.state.is_pressed());
                    }
                }
            }
            _ => (),
        }
    }
}

fn main() {
    env_logger::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = ViewerConfig::load(config_path.as_deref());

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config);
    event_loop
        .run_app(&mut app)
        .expect("Failed to run the application");
}
