use glam::{Mat4, Vec3};

/// How the camera maps view space onto clip space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    /// Fixed box; ignores the window aspect ratio.
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
    /// Perspective with a vertical field of view in radians.
    Perspective { fov_y: f32, near: f32, far: f32 },
}

/// A look-at camera: eye, target, up vector and a projection.
///
/// The per-draw MVP is `camera.view_projection(aspect) * model`.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub projection: Projection,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            projection: Projection::Perspective {
                fov_y: std::f32::consts::FRAC_PI_2,
                near: 0.1,
                far: 500.0,
            },
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, eye: Vec3) -> Self {
        self.eye = eye;
        self
    }

    pub fn looking_at(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    pub fn with_up(mut self, up: Vec3) -> Self {
        self.up = up;
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Projection matrix with wgpu's `0..1` clip depth.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        match self.projection {
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => Mat4::orthographic_rh(left, right, bottom, top, near, far),
            Projection::Perspective { fov_y, near, far } => {
                Mat4::perspective_rh(fov_y, aspect, near, far)
            }
        }
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn orthographic_maps_box_corners_to_clip_edges() {
        let camera = Camera::new().with_projection(Projection::Orthographic {
            left: -5.0,
            right: 5.0,
            bottom: -5.0,
            top: 5.0,
            near: 0.1,
            far: 500.0,
        });
        let clip = camera.view_projection(1.0) * Vec4::new(5.0, -5.0, 0.0, 1.0);
        assert!((clip.x - 1.0).abs() < 1e-5);
        assert!((clip.y + 1.0).abs() < 1e-5);
        assert!(clip.z >= 0.0 && clip.z <= 1.0);
    }

    #[test]
    fn target_lands_in_the_middle_of_the_view() {
        let camera = Camera::new()
            .at(Vec3::new(-15.0, 15.0, 0.0))
            .with_up(Vec3::X);
        let clip = camera.view_projection(16.0 / 9.0) * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((clip.x / clip.w).abs() < 1e-5);
        assert!((clip.y / clip.w).abs() < 1e-5);
    }
}
