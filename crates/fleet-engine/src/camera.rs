//! Camera math and the free/tracking camera state machine

use glam::{DQuat, DVec2, DVec3, Mat4};
use std::f64::consts::FRAC_PI_2;

/// Home position the camera returns to
pub const HOME_POSITION: DVec3 = DVec3::new(0.0, 700.0, 1200.0);
/// Drag-look sensitivity (radians per pixel)
pub const DRAG_SENSITIVITY: f64 = 0.005;
/// Translation per tick while a movement key is held
pub const MOVE_SPEED: f64 = 10.0;
/// Dolly distance per unit of wheel delta
pub const ZOOM_FACTOR: f64 = 5.0;
/// Fraction of the remaining distance covered per tracking tick
pub const TRACKING_LERP: f64 = 0.05;

/// Perspective camera with yaw/pitch orientation.
///
/// Orientation is always `rot_y(yaw) * rot_x(pitch)`; forward is `-Z` in
/// camera space, so yaw = pitch = 0 looks down the world `-Z` axis.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: DVec3,
    pub orientation: DQuat,
    /// Vertical field of view (radians)
    pub fov_y: f64,
    pub near: f64,
    pub far: f64,
    /// Viewport width / height
    pub aspect: f64,
    yaw: f64,
    pitch: f64,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            position: HOME_POSITION,
            orientation: DQuat::IDENTITY,
            fov_y: 75.0_f64.to_radians(),
            near: 0.1,
            far: 50_000.0,
            aspect: 16.0 / 9.0,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    pub fn yaw(&self) -> f64 {
        self.yaw
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    pub fn forward(&self) -> DVec3 {
        self.orientation * DVec3::NEG_Z
    }

    pub fn right(&self) -> DVec3 {
        self.orientation * DVec3::X
    }

    pub fn up(&self) -> DVec3 {
        self.orientation * DVec3::Y
    }

    /// Set yaw/pitch (pitch clamped to [-π/2, π/2]) and rebuild the orientation
    pub fn set_angles(&mut self, yaw: f64, pitch: f64) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-FRAC_PI_2, FRAC_PI_2);
        self.orientation = DQuat::from_rotation_y(self.yaw) * DQuat::from_rotation_x(self.pitch);
    }

    /// Accumulate a drag delta in pixels
    pub fn rotate(&mut self, dx: f64, dy: f64) {
        self.set_angles(
            self.yaw - dx * DRAG_SENSITIVITY,
            self.pitch - dy * DRAG_SENSITIVITY,
        );
    }

    /// Move in the camera's local frame
    pub fn translate(&mut self, forward: f64, right: f64, up: f64) {
        self.position += self.forward() * forward + self.right() * right + self.up() * up;
    }

    /// Face `target`; yaw/pitch are re-derived so free look continues from here
    pub fn look_at(&mut self, target: DVec3) {
        let dir = target - self.position;
        if dir.length_squared() < 1e-18 {
            return;
        }
        let dir = dir.normalize();
        self.set_angles((-dir.x).atan2(-dir.z), dir.y.clamp(-1.0, 1.0).asin());
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(
            self.position.as_vec3(),
            self.forward().as_vec3(),
            self.up().as_vec3(),
        )
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y as f32,
            self.aspect as f32,
            self.near as f32,
            self.far as f32,
        )
    }

    /// World-space ray direction through a point in normalized device
    /// coordinates (x right, y up, both in [-1, 1])
    pub fn ray_direction(&self, ndc: DVec2) -> DVec3 {
        let half_h = (self.fov_y * 0.5).tan();
        let half_w = half_h * self.aspect;
        (self.forward() + self.right() * (ndc.x * half_w) + self.up() * (ndc.y * half_h))
            .normalize()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera uniform buffer data for GPU
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 3],
    pub _pad0: f32,
    pub near: f32,
    pub far: f32,
    pub fov_y: f32,
    pub aspect: f32,
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        let view = camera.view_matrix();
        let proj = camera.projection_matrix();
        let view_proj = proj * view;

        Self {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            view_proj: view_proj.to_cols_array_2d(),
            position: camera.position.as_vec3().into(),
            _pad0: 0.0,
            near: camera.near as f32,
            far: camera.far as f32,
            fov_y: camera.fov_y as f32,
            aspect: camera.aspect as f32,
        }
    }
}

/// Who drives the camera position
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CameraMode {
    Free,
    Tracking(String),
}

/// Movement keys the rig reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveKey {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl MoveKey {
    /// Accepts DOM `KeyboardEvent.code` values (`KeyW`) and bare letters
    pub fn from_code(code: &str) -> Option<Self> {
        let letter = code.strip_prefix("Key").unwrap_or(code);
        match letter.to_ascii_lowercase().as_str() {
            "w" => Some(Self::Forward),
            "s" => Some(Self::Backward),
            "a" => Some(Self::Left),
            "d" => Some(Self::Right),
            "e" => Some(Self::Up),
            "q" => Some(Self::Down),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct HeldKeys {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

impl HeldKeys {
    fn set(&mut self, key: MoveKey, pressed: bool) {
        match key {
            MoveKey::Forward => self.forward = pressed,
            MoveKey::Backward => self.backward = pressed,
            MoveKey::Left => self.left = pressed,
            MoveKey::Right => self.right = pressed,
            MoveKey::Up => self.up = pressed,
            MoveKey::Down => self.down = pressed,
        }
    }

    fn any(&self) -> bool {
        self.forward || self.backward || self.left || self.right || self.up || self.down
    }

    /// (forward, right, up) axes in {-1, 0, 1}
    fn axes(&self) -> (f64, f64, f64) {
        let axis = |pos: bool, neg: bool| (pos as i8 - neg as i8) as f64;
        (
            axis(self.forward, self.backward),
            axis(self.right, self.left),
            axis(self.up, self.down),
        )
    }
}

/// Camera plus the input state that drives it.
///
/// The mode is a single enum so free and tracking control can never be
/// active together. Any drag-look or translation input drops back to
/// [`CameraMode::Free`] before it is applied.
#[derive(Clone, Debug)]
pub struct CameraRig {
    pub camera: Camera,
    mode: CameraMode,
    keys: HeldKeys,
    dragging: bool,
}

impl CameraRig {
    pub fn new() -> Self {
        Self {
            camera: Camera::new(),
            mode: CameraMode::Free,
            keys: HeldKeys::default(),
            dragging: false,
        }
    }

    pub fn mode(&self) -> &CameraMode {
        &self.mode
    }

    pub fn tracked_id(&self) -> Option<&str> {
        match &self.mode {
            CameraMode::Tracking(id) => Some(id),
            CameraMode::Free => None,
        }
    }

    pub fn track(&mut self, id: impl Into<String>) {
        let id = id.into();
        tracing::debug!("Camera tracking {}", id);
        self.mode = CameraMode::Tracking(id);
    }

    pub fn release(&mut self) {
        if let CameraMode::Tracking(id) = &self.mode {
            tracing::debug!("Camera released {}", id);
        }
        self.mode = CameraMode::Free;
    }

    /// Snap back to the home position facing down `-Z`
    pub fn go_home(&mut self) {
        self.mode = CameraMode::Free;
        self.camera.position = HOME_POSITION;
        self.camera.set_angles(0.0, 0.0);
    }

    pub fn pointer_down(&mut self) {
        self.dragging = true;
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    /// Pointer motion in pixels; only looks around while dragging
    pub fn pointer_move(&mut self, dx: f64, dy: f64) {
        if !self.dragging || (dx == 0.0 && dy == 0.0) {
            return;
        }
        // The camera's yaw/pitch already match the tracked view direction
        self.release();
        self.camera.rotate(dx, dy);
    }

    /// Dolly along the facing direction; positive delta moves away
    pub fn wheel(&mut self, delta_y: f64) {
        let distance = -delta_y * ZOOM_FACTOR;
        self.camera.position += self.camera.forward() * distance;
    }

    pub fn key(&mut self, key: MoveKey, pressed: bool) {
        self.keys.set(key, pressed);
    }

    /// Advance one animation tick.
    ///
    /// `lookup` resolves a tracked id to its current position and size; when
    /// it returns `None` the target is gone and the camera falls back to free.
    pub fn tick<F>(&mut self, lookup: F)
    where
        F: FnOnce(&str) -> Option<(DVec3, f64)>,
    {
        if self.keys.any() {
            self.release();
            let (forward, right, up) = self.keys.axes();
            self.camera
                .translate(forward * MOVE_SPEED, right * MOVE_SPEED, up * MOVE_SPEED);
            return;
        }

        let CameraMode::Tracking(id) = &self.mode else {
            return;
        };

        match lookup(id) {
            Some((target, size)) => {
                let desired = target + DVec3::new(0.0, 3.0 * size, 8.0 * size);
                self.camera.position = self.camera.position.lerp(desired, TRACKING_LERP);
                self.camera.look_at(target);
            }
            None => {
                tracing::info!("Tracked object {} left the scene, camera is free", id);
                self.mode = CameraMode::Free;
            }
        }
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform::from_camera(&self.camera)
    }
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_eq(a: DVec3, b: DVec3) {
        assert!((a - b).length() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_default_looks_down_neg_z() {
        let camera = Camera::new();
        assert_vec_eq(camera.forward(), DVec3::NEG_Z);
        assert_vec_eq(camera.right(), DVec3::X);
        assert_eq!(camera.position, HOME_POSITION);
    }

    #[test]
    fn test_look_at_keeps_angles_in_sync() {
        let mut camera = Camera::new();
        camera.position = DVec3::ZERO;
        camera.look_at(DVec3::new(10.0, 5.0, -3.0));

        let dir = DVec3::new(10.0, 5.0, -3.0).normalize();
        assert_vec_eq(camera.forward(), dir);

        // Rebuilding from the stored angles gives the same view
        let mut rebuilt = camera.clone();
        rebuilt.set_angles(camera.yaw(), camera.pitch());
        assert_vec_eq(rebuilt.forward(), dir);
    }

    #[test]
    fn test_pitch_clamped() {
        let mut camera = Camera::new();
        camera.rotate(0.0, -10_000.0);
        assert!((camera.pitch() - FRAC_PI_2).abs() < 1e-12);
        camera.rotate(0.0, 50_000.0);
        assert!((camera.pitch() + FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_center_ray_is_forward() {
        let mut camera = Camera::new();
        camera.set_angles(0.3, -0.2);
        assert_vec_eq(camera.ray_direction(DVec2::ZERO), camera.forward());

        let edge = camera.ray_direction(DVec2::new(0.0, 1.0));
        let angle = edge.angle_between(camera.forward());
        assert!((angle - camera.fov_y / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_drag_releases_tracking_without_snap() {
        let mut rig = CameraRig::new();
        rig.track("earth");
        rig.tick(|_| Some((DVec3::new(100.0, 0.0, 0.0), 5.0)));
        let facing = rig.camera.forward();

        rig.pointer_down();
        rig.pointer_move(1.0, 0.0);

        assert_eq!(rig.mode(), &CameraMode::Free);
        // One pixel of drag turns the view by exactly the sensitivity
        let turned = rig.camera.forward().angle_between(facing);
        assert!(turned <= DRAG_SENSITIVITY + 1e-9);
    }

    #[test]
    fn test_move_without_drag_is_ignored() {
        let mut rig = CameraRig::new();
        rig.track("earth");
        rig.pointer_move(30.0, 30.0);
        assert_eq!(rig.tracked_id(), Some("earth"));
    }

    #[test]
    fn test_translation_clears_tracking_same_tick() {
        let mut rig = CameraRig::new();
        rig.track("earth");
        rig.key(MoveKey::Forward, true);

        let before = rig.camera.position;
        rig.tick(|_| Some((DVec3::ZERO, 1.0)));

        assert_eq!(rig.mode(), &CameraMode::Free);
        assert_vec_eq(rig.camera.position, before + DVec3::NEG_Z * MOVE_SPEED);

        rig.key(MoveKey::Forward, false);
        rig.tick(|_| None);
        assert_vec_eq(rig.camera.position, before + DVec3::NEG_Z * MOVE_SPEED);
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let mut rig = CameraRig::new();
        rig.key(MoveKey::Left, true);
        rig.key(MoveKey::Right, true);
        rig.tick(|_| None);
        assert_vec_eq(rig.camera.position, HOME_POSITION);
    }

    #[test]
    fn test_tracking_lerps_toward_offset() {
        let mut rig = CameraRig::new();
        rig.camera.position = DVec3::ZERO;
        rig.track("mars");

        let target = DVec3::new(200.0, 0.0, 0.0);
        rig.tick(|id| {
            assert_eq!(id, "mars");
            Some((target, 2.0))
        });

        let desired = target + DVec3::new(0.0, 6.0, 16.0);
        assert_vec_eq(rig.camera.position, desired * TRACKING_LERP);
        let facing = (target - rig.camera.position).normalize();
        assert_vec_eq(rig.camera.forward(), facing);

        for _ in 0..500 {
            rig.tick(|_| Some((target, 2.0)));
        }
        assert!((rig.camera.position - desired).length() < 1e-6);
    }

    #[test]
    fn test_vanished_target_falls_back_to_free() {
        let mut rig = CameraRig::new();
        rig.track("NEO-9");
        rig.tick(|_| None);
        assert_eq!(rig.mode(), &CameraMode::Free);
    }

    #[test]
    fn test_go_home_resets() {
        let mut rig = CameraRig::new();
        rig.camera.position = DVec3::new(5.0, 5.0, 5.0);
        rig.camera.set_angles(1.0, 0.5);
        rig.track("earth");

        rig.go_home();

        assert_eq!(rig.mode(), &CameraMode::Free);
        assert_eq!(rig.camera.position, HOME_POSITION);
        assert_eq!((rig.camera.yaw(), rig.camera.pitch()), (0.0, 0.0));
    }

    #[test]
    fn test_wheel_dollies_forward() {
        let mut rig = CameraRig::new();
        rig.wheel(-2.0);
        assert_vec_eq(rig.camera.position, HOME_POSITION + DVec3::NEG_Z * 10.0);
        rig.wheel(2.0);
        assert_vec_eq(rig.camera.position, HOME_POSITION);
    }

    #[test]
    fn test_move_key_codes() {
        assert_eq!(MoveKey::from_code("KeyW"), Some(MoveKey::Forward));
        assert_eq!(MoveKey::from_code("q"), Some(MoveKey::Down));
        assert_eq!(MoveKey::from_code("E"), Some(MoveKey::Up));
        assert_eq!(MoveKey::from_code("Space"), None);
    }

    #[test]
    fn test_uniform_is_plain_data() {
        let rig = CameraRig::new();
        let uniform = rig.uniform();
        let bytes: &[u8] = bytemuck::bytes_of(&uniform);
        assert_eq!(bytes.len(), std::mem::size_of::<CameraUniform>());
        assert_eq!(uniform.far, 50_000.0);
    }
}
