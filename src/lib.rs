//! # Pocket Arcade
//!
//! **Two tiny GPU toy games on a thin wgpu layer.**
//!
//! - `canon`: a 2D cannon lobs a bouncing projectile at four coins
//! - `maze`: a 3D board of cubes with holes and obstacles to hop around
//!
//! Both games share the same plumbing: a GLSL shader pair loaded from disk,
//! a registry of uploaded vertex data, and one draw per object per frame
//! with a freshly composed MVP matrix.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pocket_arcade::*;
//!
//! fn main() -> Result<(), AppError> {
//!     init_logging(LoggingConfig::default());
//!
//!     run_with_config(AppConfig::new().title("Spinning cube"), |ctx| {
//!         let cube = ctx.create_drawable(shapes::cube()?);
//!         ctx.camera(Camera::new().at(glam::Vec3::new(4.0, 3.0, 6.0)));
//!
//!         Ok(move |frame: &mut Frame| {
//!             if frame.input.key_pressed(KeyCode::Escape) {
//!                 frame.quit();
//!             }
//!             let spin = glam::Mat4::from_rotation_y(frame.time);
//!             frame.draw(cube, spin);
//!         })
//!     })
//! }
//! ```
//!
//! Game rules live in [`game::canon`] and [`game::maze`] as plain state
//! values that can be driven without a window.

mod app;
mod camera;
mod color;
mod geometry;
mod gpu;
mod input;
mod logging;
mod registry;
mod scene_pass;
mod shader;

pub mod game;
pub mod shapes;

pub use app::{AppConfig, AppError, Frame, SetupContext, run_with_config};
pub use camera::{Camera, Projection};
pub use color::Color;
pub use geometry::{ColorSource, Drawable, FillMode, Geometry, GeometryError, Topology};
pub use gpu::{DEPTH_FORMAT, GpuContext, GpuError};
pub use input::Input;
pub use logging::{LoggingConfig, init_logging};
pub use registry::{DrawableId, DrawableRegistry};
pub use scene_pass::{DrawCall, ScenePass};
pub use shader::{ShaderError, ShaderProgram, Stage, validate_files, validate_program};

// Re-export commonly needed types
pub use winit::keyboard::KeyCode;
