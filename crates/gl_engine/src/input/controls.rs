//! Mouse-look and WASD movement for a [`Camera`]
//!
//! The cursor is re-centred every frame by the caller; its offset from the
//! window centre since the last frame becomes yaw and pitch.

use std::collections::HashSet;

use crate::core::config::CameraConfig;
use crate::foundation::math::{utils, Vec3};
use crate::render::Camera;

use super::{InputEvent, KeyCode};

/// Pitch limit, just short of straight up/down
const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// First-person camera controller
#[derive(Debug, Clone)]
pub struct FirstPersonControls {
    camera: Camera,
    speed: f32,
    mouse_speed: f32,
    enabled: bool,
    held: HashSet<KeyCode>,
}

impl FirstPersonControls {
    /// Create enabled controls around a camera
    pub fn new(camera: Camera, speed: f32, mouse_speed: f32) -> Self {
        Self { camera, speed, mouse_speed, enabled: true, held: HashSet::new() }
    }

    /// Create a camera and its controls from configuration
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        Self::new(Camera::from_config(config, aspect), config.speed, config.mouse_speed)
    }

    /// The controlled camera
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Whether mouse and keys currently steer the camera
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a key is held down
    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// Feed one window event
    pub fn handle_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::Focus(focused) => {
                self.enabled = focused;
                if !focused {
                    self.held.clear();
                }
                log::debug!("Controls {}", if focused { "enabled" } else { "disabled" });
            }
            InputEvent::Resize { width, height } => self.camera.set_viewport(width, height),
            InputEvent::Key { key, pressed: true } => {
                self.held.insert(key);
            }
            InputEvent::Key { key, pressed: false } => {
                self.held.remove(&key);
            }
            InputEvent::CursorMoved { .. } | InputEvent::CloseRequested => {}
        }
    }

    /// Advance by `dt` seconds
    ///
    /// `cursor` is the cursor position before re-centring and `window_size`
    /// the window size in the same coordinates. Does nothing while disabled.
    pub fn update(&mut self, dt: f32, cursor: (f64, f64), window_size: (u32, u32)) {
        if !self.enabled {
            return;
        }

        let centre_x = f64::from(window_size.0) / 2.0;
        let centre_y = f64::from(window_size.1) / 2.0;
        self.camera.horizontal_angle += self.mouse_speed * (centre_x - cursor.0) as f32;
        self.camera.vertical_angle = utils::clamp(
            self.camera.vertical_angle + self.mouse_speed * (centre_y - cursor.1) as f32,
            -MAX_PITCH,
            MAX_PITCH,
        );

        let step = self.speed * dt;
        let (direction, right) = (self.camera.direction(), self.camera.right());
        let mut offset = Vec3::zeros();
        if self.is_held(KeyCode::W) {
            offset += direction;
        }
        if self.is_held(KeyCode::S) {
            offset -= direction;
        }
        if self.is_held(KeyCode::D) {
            offset += right;
        }
        if self.is_held(KeyCode::A) {
            offset -= right;
        }

        if offset != Vec3::zeros() {
            self.camera.position += offset * step;
            let p = self.camera.position;
            log::debug!("Position changed. New position: {:.3}, {:.3}, {:.3}", p.x, p.y, p.z);
        }
    }
}
