//! Maze of holes and obstacles, in 3D.
//!
//! The board is the top face of an 11×11×11 block of cubes with some top
//! cubes missing. The avatar hops two units per key release; landing in a
//! hole or on a collidable obstacle, or stepping off the board, costs a life.

use glam::{IVec2, IVec3, Mat4, Vec3};
use winit::keyboard::KeyCode;

use crate::app::{AppConfig, AppError, Frame, SetupContext};
use crate::camera::{Camera, Projection};
use crate::color::Color;
use crate::input::Input;
use crate::shapes;

pub const STEP: i32 = 2;
pub const BOUND: i32 = 10;
pub const SPAWN: IVec2 = IVec2::new(-10, -10);
pub const STARTING_LIVES: i32 = 4;
/// Height at which obstacles and the avatar sit, one cube above the board.
pub const SURFACE_Y: i32 = 12;

/// Missing top-layer cells as (x, z). (0, 0) is listed twice.
pub const HOLES: [IVec2; 9] = [
    IVec2::new(0, 0),
    IVec2::new(-2, -2),
    IVec2::new(-4, -4),
    IVec2::new(-6, -6),
    IVec2::new(0, 0),
    IVec2::new(-2, 2),
    IVec2::new(-4, 4),
    IVec2::new(-6, 6),
    IVec2::new(2, -2),
];

/// Obstacle cells as (x, z).
///
/// The second entry is (6, 0) because its z was never set; it was probably
/// meant to be (4, 6). Kept as played until someone confirms the layout.
pub const OBSTACLES: [IVec2; 7] = [
    IVec2::new(2, 2),
    IVec2::new(6, 0),
    IVec2::new(2, -4),
    IVec2::new(-2, -4),
    IVec2::new(-6, 8),
    IVec2::new(8, 10),
    IVec2::new(6, -8),
];

/// Only the leading obstacles block the avatar; the rest are scenery.
pub const COLLIDABLE_OBSTACLES: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Spawn,
    /// +X
    Forward,
    /// −X
    Back,
    /// +Z
    Right,
    /// −Z
    Left,
    ToggleOverview,
}

impl Command {
    /// Commands act on key release.
    pub fn from_input(input: &Input) -> impl Iterator<Item = Command> + '_ {
        [
            (KeyCode::KeyN, Command::Spawn),
            (KeyCode::KeyW, Command::Forward),
            (KeyCode::KeyS, Command::Back),
            (KeyCode::KeyD, Command::Right),
            (KeyCode::KeyA, Command::Left),
            (KeyCode::KeyT, Command::ToggleOverview),
        ]
        .into_iter()
        .filter(|(key, _)| input.key_released(*key))
        .map(|(_, command)| command)
    }

    fn offset(self) -> Option<IVec2> {
        match self {
            Command::Forward => Some(IVec2::new(STEP, 0)),
            Command::Back => Some(IVec2::new(-STEP, 0)),
            Command::Right => Some(IVec2::new(0, STEP)),
            Command::Left => Some(IVec2::new(0, -STEP)),
            Command::Spawn | Command::ToggleOverview => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Avatar {
    /// Board cell as (x, z).
    pub cell: IVec2,
    pub active: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MazeState {
    pub avatar: Avatar,
    /// Never clamped; keeps counting down past zero.
    pub lives: i32,
    pub overview: bool,
}

impl Default for MazeState {
    fn default() -> Self {
        Self {
            avatar: Avatar {
                cell: SPAWN,
                active: false,
            },
            lives: STARTING_LIVES,
            overview: false,
        }
    }
}

impl MazeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(mut self, command: Command) -> Self {
        match command {
            Command::Spawn => {
                if !self.avatar.active {
                    self.avatar = Avatar {
                        cell: SPAWN,
                        active: true,
                    };
                    log::info!("avatar spawned at {}", SPAWN);
                }
            }
            Command::ToggleOverview => {
                self.overview = !self.overview;
                log::debug!("overview camera {}", if self.overview { "on" } else { "off" });
            }
            _ => {
                if let Some(offset) = command.offset().filter(|_| self.avatar.active) {
                    let next = self.avatar.cell + offset;
                    if next.abs().max_element() > BOUND {
                        self.lose_life("stepped off the board");
                    } else {
                        self.avatar.cell = next;
                    }
                }
            }
        }
        self
    }

    /// Checks the avatar's cell against holes and collidable obstacles.
    pub fn step(mut self) -> Self {
        if !self.avatar.active {
            return self;
        }
        let cell = self.avatar.cell;
        if HOLES.contains(&cell) {
            self.lose_life("fell into a hole");
        } else if OBSTACLES[..COLLIDABLE_OBSTACLES].contains(&cell) {
            self.lose_life("hit an obstacle");
        }
        self
    }

    fn lose_life(&mut self, why: &str) {
        self.avatar.active = false;
        self.lives -= 1;
        log::info!("{why} at {}; {} lives left", self.avatar.cell, self.lives);
    }

    pub fn avatar_model(&self) -> Option<Mat4> {
        self.avatar.active.then(|| surface_model(self.avatar.cell))
    }

    pub fn camera(&self) -> Camera {
        let eye = if self.overview {
            Vec3::new(-5.0, 25.0, 0.0)
        } else {
            Vec3::new(-15.0, 15.0, 0.0)
        };
        Camera::new()
            .at(eye)
            .looking_at(Vec3::ZERO)
            .with_up(Vec3::X)
            .with_projection(Projection::Perspective {
                // 90 radians, not degrees; wraps to roughly 117°.
                fov_y: 90.0,
                near: 0.1,
                far: 500.0,
            })
    }
}

fn surface_model(cell: IVec2) -> Mat4 {
    Mat4::from_translation(Vec3::new(cell.x as f32, SURFACE_Y as f32, cell.y as f32))
}

/// Centers of every cube in the block, minus top-layer holes.
pub fn board_cells() -> Vec<IVec3> {
    let range = || (-BOUND..=BOUND).step_by(STEP as usize);
    range()
        .flat_map(|x| range().flat_map(move |y| range().map(move |z| IVec3::new(x, y, z))))
        .filter(|c| !(c.y == BOUND && HOLES.contains(&IVec2::new(c.x, c.z))))
        .collect()
}

pub fn obstacle_models() -> impl Iterator<Item = Mat4> {
    OBSTACLES.into_iter().map(surface_model)
}

pub fn config() -> AppConfig {
    AppConfig::new()
        .title("Sample OpenGL3.3 Application")
        .size(1366, 768)
        .clear_color(Color::rgb8(235, 95, 250))
}

/// Uploads the cube and returns the per-frame closure.
pub fn setup(ctx: &mut SetupContext) -> Result<impl FnMut(&mut Frame) + use<>, AppError> {
    let cube = ctx.create_drawable(shapes::cube()?);
    let mut state = MazeState::new();
    ctx.camera(state.camera());

    let board: Vec<Mat4> = board_cells()
        .into_iter()
        .map(|c| Mat4::from_translation(c.as_vec3()))
        .collect();
    log::info!("board has {} cubes", board.len());

    Ok(move |frame: &mut Frame| {
        if super::quit_pressed(frame.input) {
            frame.quit();
            return;
        }

        for command in Command::from_input(frame.input) {
            state = state.apply(command);
        }
        state = state.step();
        *frame.camera = state.camera();

        for &model in &board {
            frame.draw(cube, model);
        }
        for model in obstacle_models() {
            frame.draw(cube, model);
        }
        if let Some(model) = state.avatar_model() {
            frame.draw(cube, model);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawned() -> MazeState {
        MazeState::new().apply(Command::Spawn)
    }

    #[test]
    fn spawn_places_avatar_in_the_corner() {
        let state = spawned();
        assert_eq!(state.avatar.cell, IVec2::new(-10, -10));
        assert!(state.avatar.active);
        assert_eq!(state.lives, 4);
    }

    #[test]
    fn spawn_while_active_keeps_position() {
        let state = spawned().apply(Command::Forward).apply(Command::Spawn);
        assert_eq!(state.avatar.cell, IVec2::new(-8, -10));
    }

    #[test]
    fn moves_follow_the_key_axes() {
        let state = spawned()
            .apply(Command::Forward)
            .apply(Command::Forward)
            .apply(Command::Right);
        assert_eq!(state.avatar.cell, IVec2::new(-6, -8));

        let state = state.apply(Command::Back).apply(Command::Left);
        assert_eq!(state.avatar.cell, IVec2::new(-8, -10));
    }

    #[test]
    fn moves_while_inactive_are_ignored() {
        let state = MazeState::new().apply(Command::Forward).apply(Command::Right);
        assert_eq!(state, MazeState::new());
    }

    #[test]
    fn stepping_off_the_board_costs_one_life() {
        let state = spawned().apply(Command::Back);
        assert!(!state.avatar.active);
        assert_eq!(state.lives, 3);
        assert_eq!(state.avatar.cell, IVec2::new(-10, -10));

        let state = state.apply(Command::Left);
        assert_eq!(state.lives, 3);
    }

    #[test]
    fn edge_cells_are_reachable() {
        let mut state = spawned();
        state.avatar.cell = IVec2::new(8, 10);
        let state = state.apply(Command::Forward);
        assert!(state.avatar.active);
        assert_eq!(state.avatar.cell, IVec2::new(10, 10));
    }

    #[test]
    fn landing_in_a_hole_costs_a_life() {
        let mut state = spawned();
        state.avatar.cell = IVec2::new(-4, -6);
        let state = state.apply(Command::Right).step();
        assert!(!state.avatar.active);
        assert_eq!(state.lives, 3);
    }

    #[test]
    fn collidable_obstacle_hits_from_any_side() {
        for from in [IVec2::new(0, 2), IVec2::new(2, 0), IVec2::new(4, 2), IVec2::new(2, 4)] {
            let mut state = spawned();
            state.avatar.cell = from;
            let command = match IVec2::new(2, 2) - from {
                IVec2 { x: 2, .. } => Command::Forward,
                IVec2 { x: -2, .. } => Command::Back,
                IVec2 { y: 2, .. } => Command::Right,
                _ => Command::Left,
            };
            let state = state.apply(command).step();
            assert_eq!(state.avatar.cell, IVec2::new(2, 2));
            assert!(!state.avatar.active, "approach from {from}");
            assert_eq!(state.lives, 3);
        }
    }

    #[test]
    fn transcribed_obstacle_and_scenery_obstacle() {
        let mut state = spawned();
        state.avatar.cell = IVec2::new(6, 0);
        assert!(!state.step().avatar.active);

        state.avatar.cell = IVec2::new(6, -8);
        assert!(state.step().avatar.active);
    }

    #[test]
    fn lives_can_go_negative() {
        let mut state = MazeState::new();
        for _ in 0..6 {
            state = state.apply(Command::Spawn).apply(Command::Back);
        }
        assert_eq!(state.lives, -2);
    }

    #[test]
    fn overview_toggles() {
        let state = MazeState::new().apply(Command::ToggleOverview);
        assert!(state.overview);
        assert_eq!(state.camera().eye, Vec3::new(-5.0, 25.0, 0.0));
        let state = state.apply(Command::ToggleOverview);
        assert_eq!(state.camera().eye, Vec3::new(-15.0, 15.0, 0.0));
    }

    #[test]
    fn board_omits_distinct_top_layer_holes() {
        let cells = board_cells();
        assert_eq!(cells.len(), 11 * 11 * 11 - 8);
        assert!(!cells.contains(&IVec3::new(0, 10, 0)));
        assert!(cells.contains(&IVec3::new(0, 8, 0)));
        assert!(cells.contains(&IVec3::new(2, 10, 2)));
    }

    #[test]
    fn avatar_drawn_above_the_board_only_when_active() {
        assert!(MazeState::new().avatar_model().is_none());
        let model = spawned().avatar_model().unwrap();
        assert_eq!(
            model.transform_point3(Vec3::ZERO),
            Vec3::new(-10.0, 12.0, -10.0)
        );
    }
}
