use std::time::Duration;

use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

#[derive(Debug, Clone)]
pub struct CameraProjection {
    /// Vertical field of view, in degrees
    pub yfov: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl CameraProjection {
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.yfov.to_radians(), aspect, self.znear, self.zfar)
    }
}

#[derive(Debug, Clone)]
pub struct CameraView {
    pub eye: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl CameraView {
    fn front_from_yaw_pitch(yaw: f32, pitch: f32) -> Vec3 {
        let yaw = yaw.to_radians();
        let pitch = pitch.to_radians();
        let x = yaw.cos() * pitch.cos();
        let y = pitch.sin();
        let z = yaw.sin() * pitch.cos();
        Vec3::new(x, y, z).normalize()
    }

    pub fn front(&self) -> Vec3 {
        Self::front_from_yaw_pitch(self.yaw, self.pitch)
    }

    /// Horizontal heading, rotated by `yaw_offset` degrees
    pub fn front_ignore_pitch(&self, yaw_offset: f32) -> Vec3 {
        Self::front_from_yaw_pitch(self.yaw + yaw_offset, 0.0)
    }

    pub fn matrix(&self) -> Mat4 {
        let target = self.eye + self.front();
        Mat4::look_at_rh(self.eye, target, Vec3::Y)
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub view: CameraView,
    pub projection: CameraProjection,
}

impl Camera {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            view: CameraView {
                eye: Vec3::from_array(config.eye),
                yaw: config.yaw,
                pitch: config.pitch.clamp(-89.0, 89.0),
            },
            projection: CameraProjection {
                yfov: config.fov.clamp(30.0, 120.0),
                znear: config.znear.max(0.001),
                zfar: config.zfar.max(config.znear + 1.0),
            },
        }
    }

    pub fn move_eye(&mut self, offset: Vec3) {
        self.view.eye += offset;
    }

    pub fn matrix(&self, aspect: f32) -> Mat4 {
        let proj = self.projection.matrix(aspect);
        let view = self.view.matrix();
        proj * view
    }
}

#[derive(Clone, Debug)]
pub struct PositionController {
    pub speed: f32,
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl PositionController {
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            forward: false,
            backward: false,
            left: false,
            right: false,
            up: false,
            down: false,
        }
    }

    pub fn update(&self, duration: Duration, camera: &mut Camera) {
        let milliseconds = duration.as_millis();
        let distance = self.speed * milliseconds as f32;
        let mut movement = Vec3::ZERO;

        let forward = camera.view.front_ignore_pitch(0.0) * distance;
        if self.forward {
            movement += forward;
        }
        if self.backward {
            movement -= forward;
        }

        let left = camera.view.front_ignore_pitch(-90.0) * distance;
        if self.left {
            movement += left;
        }
        if self.right {
            movement -= left;
        }

        if self.up {
            movement.y += distance;
        }
        if self.down {
            movement.y -= distance;
        }
        camera.move_eye(movement)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_camera_looks_down_negative_z() {
        let camera = Camera::from_config(&CameraConfig::default());
        let front = camera.view.front_ignore_pitch(0.0);
        assert!(front.abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert!(camera.view.front().y < 0.0);
    }

    #[test]
    fn test_controller_moves_on_the_ground_plane() {
        let mut camera = Camera::from_config(&CameraConfig {
            eye: [0.0, 10.0, 0.0],
            ..Default::default()
        });
        let mut controller = PositionController::new(0.01);
        controller.forward = true;
        controller.left = true;
        controller.update(Duration::from_millis(100), &mut camera);
        assert!(camera
            .view
            .eye
            .abs_diff_eq(Vec3::new(-1.0, 10.0, -1.0), 1e-5));
    }
}
