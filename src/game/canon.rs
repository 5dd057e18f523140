//! Cannon and coins, in 2D.
//!
//! A cannon in the bottom-left corner fires a projectile that flies under a
//! simple gravity term, bounces off the floor a few times and reflects off
//! the right wall. Coins touched by the projectile disappear.

use glam::{Mat4, Vec2, Vec3};
use winit::keyboard::KeyCode;

use crate::app::{AppConfig, AppError, Frame, SetupContext};
use crate::camera::{Camera, Projection};
use crate::color::Color;
use crate::input::Input;
use crate::shapes;

pub const TIME_STEP: f32 = 0.01;
pub const LAUNCH_SPEED: f32 = 7.0;
pub const MAX_BOUNCES: u32 = 5;
pub const HIT_THRESHOLD: f32 = 0.4;
pub const STARTING_AMMO: i32 = 4;
/// Barrel angle change per key press, in degrees.
pub const ANGLE_STEP: f32 = 10.0;
pub const MIN_ANGLE: f32 = 0.0;
pub const MAX_ANGLE: f32 = 90.0;
pub const CANNON_BASE: Vec2 = Vec2::new(-4.0, -4.0);
/// Distance from the cannon base to where the projectile appears.
pub const MUZZLE_DISTANCE: f32 = 1.2;
pub const COIN_POSITIONS: [Vec2; 4] = [
    Vec2::new(3.0, 3.0),
    Vec2::new(4.0, 1.0),
    Vec2::new(2.0, 4.0),
    Vec2::new(2.0, 2.0),
];

/// How a projectile position is compared against a coin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HitRule {
    /// Hit when either axis is within the threshold. This collects every
    /// coin sharing a row or column band with the projectile; kept as the
    /// default until the intended rule is confirmed.
    #[default]
    EitherAxis,
    /// Hit only when both axes are within the threshold.
    BothAxes,
}

impl HitRule {
    pub fn hits(self, projectile: Vec2, coin: Vec2) -> bool {
        let d = (projectile - coin).abs();
        match self {
            HitRule::EitherAxis => d.x <= HIT_THRESHOLD || d.y <= HIT_THRESHOLD,
            HitRule::BothAxes => d.x <= HIT_THRESHOLD && d.y <= HIT_THRESHOLD,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coin {
    pub position: Vec2,
    pub visible: bool,
}

/// A projectile between launch and its last bounce.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Flight {
    /// World position of the muzzle at launch.
    pub origin: Vec2,
    /// Offset from `origin`.
    pub position: Vec2,
    pub velocity: Vec2,
    /// Seconds since launch or the last floor contact.
    pub elapsed: f32,
    pub bounces: u32,
}

impl Flight {
    /// Leaves the muzzle at `angle_deg`.
    pub fn launch(angle_deg: f32) -> Self {
        let dir = Vec2::from_angle(angle_deg.to_radians());
        Self {
            origin: CANNON_BASE + MUZZLE_DISTANCE * dir,
            position: Vec2::ZERO,
            velocity: LAUNCH_SPEED * dir,
            elapsed: 0.0,
            bounces: 0,
        }
    }

    pub fn world_position(&self) -> Vec2 {
        self.origin + self.position
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Projectile {
    #[default]
    Idle,
    /// Fired; launches on the next step from the barrel angle at that time.
    Loaded,
    InFlight(Flight),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    RaiseBarrel,
    LowerBarrel,
    Fire,
}

impl Command {
    /// Commands act on key press.
    pub fn from_input(input: &Input) -> impl Iterator<Item = Command> + '_ {
        [
            (KeyCode::KeyU, Command::RaiseBarrel),
            (KeyCode::KeyD, Command::LowerBarrel),
            (KeyCode::KeyN, Command::Fire),
        ]
        .into_iter()
        .filter(|(key, _)| input.key_pressed(*key))
        .map(|(_, command)| command)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanonState {
    /// Barrel angle in degrees above +X.
    pub angle_deg: f32,
    pub ammo: i32,
    pub projectile: Projectile,
    pub coins: [Coin; 4],
    pub hit_rule: HitRule,
}

impl Default for CanonState {
    fn default() -> Self {
        Self {
            angle_deg: MAX_ANGLE,
            ammo: STARTING_AMMO,
            projectile: Projectile::Idle,
            coins: COIN_POSITIONS.map(|position| Coin {
                position,
                visible: true,
            }),
            hit_rule: HitRule::default(),
        }
    }
}

impl CanonState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hit_rule(mut self, hit_rule: HitRule) -> Self {
        self.hit_rule = hit_rule;
        self
    }

    pub fn apply(mut self, command: Command) -> Self {
        match command {
            Command::RaiseBarrel if self.angle_deg < MAX_ANGLE => self.angle_deg += ANGLE_STEP,
            Command::LowerBarrel if self.angle_deg > MIN_ANGLE => self.angle_deg -= ANGLE_STEP,
            Command::Fire if self.ammo > 0 => {
                self.ammo -= 1;
                self.projectile = Projectile::Loaded;
                log::info!("fire at {}°, {} shots left", self.angle_deg, self.ammo);
            }
            Command::Fire => log::debug!("out of ammo"),
            Command::RaiseBarrel | Command::LowerBarrel => {}
        }
        self
    }

    /// Advances the projectile by one fixed time step.
    pub fn step(mut self) -> Self {
        let flight = match self.projectile {
            Projectile::Idle => return self,
            Projectile::Loaded => {
                self.projectile = Projectile::InFlight(Flight::launch(self.angle_deg));
                return self;
            }
            Projectile::InFlight(flight) => flight,
        };

        self.projectile = match advance(flight, self.angle_deg.to_radians()) {
            Some(flight) => {
                self.collect_coins(flight.position);
                Projectile::InFlight(flight)
            }
            None => {
                log::info!("projectile came to rest");
                Projectile::Idle
            }
        };
        self
    }

    /// Hides every visible coin the projectile touches.
    ///
    /// Compares against the flight-local offset, not the world position.
    fn collect_coins(&mut self, position: Vec2) {
        for coin in self.coins.iter_mut().filter(|c| c.visible) {
            if self.hit_rule.hits(position, coin.position) {
                coin.visible = false;
                log::info!("coin at {} collected", coin.position);
            }
        }
    }

    pub fn visible_coins(&self) -> impl Iterator<Item = &Coin> {
        self.coins.iter().filter(|c| c.visible)
    }

    pub fn cannon_model(&self) -> Mat4 {
        Mat4::from_translation(CANNON_BASE.extend(0.0))
            * Mat4::from_rotation_z(self.angle_deg.to_radians())
            * Mat4::from_scale(Vec3::splat(0.5))
    }

    /// Model matrix of the projectile, if one is visible.
    pub fn projectile_model(&self) -> Option<Mat4> {
        match self.projectile {
            Projectile::InFlight(flight) => Some(
                Mat4::from_translation(flight.world_position().extend(0.0)) * disc_scale(),
            ),
            Projectile::Idle | Projectile::Loaded => None,
        }
    }
}

/// One motion step; `None` once the projectile has used up its bounces.
///
/// `theta` is the live barrel angle in radians; the floor and right wall
/// bounds shift with it.
fn advance(mut f: Flight, theta: f32) -> Option<Flight> {
    f.position.x += TIME_STEP * f.velocity.x;
    f.position.y += TIME_STEP * (f.velocity.y + 5.0 - 10.0 * f.elapsed);

    if f.position.y <= -(0.3 + theta.sin()) {
        if f.bounces < MAX_BOUNCES {
            f.velocity.y *= 0.5;
            f.bounces += 1;
            log::debug!("bounce {} at {}", f.bounces, f.world_position());
        }
        f.elapsed = 0.0;
        if f.bounces >= MAX_BOUNCES {
            return None;
        }
    } else if f.position.x >= 8.0 - theta.cos() {
        f.velocity.x *= -0.5;
        log::debug!("wall hit at {}", f.world_position());
    }

    f.elapsed += TIME_STEP;
    Some(f)
}

fn disc_scale() -> Mat4 {
    Mat4::from_scale(Vec3::new(0.2, 0.2, 0.0))
}

pub fn coin_model(coin: &Coin) -> Mat4 {
    Mat4::from_translation(coin.position.extend(0.0)) * disc_scale()
}

/// Bottom, left, right and top walls framing the field.
pub fn wall_models() -> [Mat4; 4] {
    let horizontal = Mat4::from_scale(Vec3::new(10.0, 0.5, 0.0));
    let vertical = Mat4::from_scale(Vec3::new(0.5, 10.0, 0.0));
    [
        Mat4::from_translation(Vec3::new(0.0, -4.75, 0.0)) * horizontal,
        Mat4::from_translation(Vec3::new(-4.75, 0.0, 0.0)) * vertical,
        Mat4::from_translation(Vec3::new(4.75, 0.0, 0.0)) * vertical,
        Mat4::from_translation(Vec3::new(0.0, 4.75, 0.0)) * horizontal,
    ]
}

pub fn camera() -> Camera {
    Camera::new()
        .at(Vec3::new(0.0, 0.0, 3.0))
        .looking_at(Vec3::ZERO)
        .with_up(Vec3::Y)
        .with_projection(Projection::Orthographic {
            left: -5.0,
            right: 5.0,
            bottom: -5.0,
            top: 5.0,
            near: 0.1,
            far: 500.0,
        })
}

pub fn config() -> AppConfig {
    AppConfig::new()
        .title("Sample OpenGL 3.3 Application")
        .size(800, 800)
        .clear_color(Color::rgb(0.3, 0.3, 0.3))
}

/// Uploads the shapes and returns the per-frame closure.
pub fn setup(ctx: &mut SetupContext) -> Result<impl FnMut(&mut Frame) + use<>, AppError> {
    let cannon = ctx.create_drawable(shapes::canon()?);
    let disc = ctx.create_drawable(shapes::circle()?);
    let wall = ctx.create_drawable(shapes::rectangle()?);
    ctx.camera(camera());

    let mut state = CanonState::new();

    Ok(move |frame: &mut Frame| {
        if super::quit_pressed(frame.input) {
            frame.quit();
            return;
        }

        for command in Command::from_input(frame.input) {
            state = state.apply(command);
        }
        state = state.step();

        frame.draw(cannon, state.cannon_model());
        for coin in state.visible_coins() {
            frame.draw(disc, coin_model(coin));
        }
        if let Some(model) = state.projectile_model() {
            frame.draw(disc, model);
        }
        for model in wall_models() {
            frame.draw(wall, model);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn flying(state: &CanonState) -> Flight {
        match state.projectile {
            Projectile::InFlight(f) => f,
            other => panic!("expected a projectile in flight, got {other:?}"),
        }
    }

    #[test]
    fn barrel_stays_within_range() {
        let mut state = CanonState::new();
        state = state.apply(Command::RaiseBarrel);
        assert_eq!(state.angle_deg, 90.0);

        for _ in 0..12 {
            state = state.apply(Command::LowerBarrel);
        }
        assert_eq!(state.angle_deg, 0.0);

        state = state.apply(Command::RaiseBarrel);
        assert_eq!(state.angle_deg, 10.0);
    }

    #[test]
    fn fire_spends_ammo_and_loads() {
        let state = CanonState::new().apply(Command::Fire);
        assert_eq!(state.ammo, 3);
        assert_eq!(state.projectile, Projectile::Loaded);
    }

    #[test]
    fn fire_without_ammo_does_nothing() {
        let mut state = CanonState::new();
        state.ammo = 0;
        let state = state.apply(Command::Fire);
        assert_eq!(state.ammo, 0);
        assert_eq!(state.projectile, Projectile::Idle);
    }

    #[test]
    fn launch_uses_the_angle_at_the_next_step() {
        let state = CanonState::new()
            .apply(Command::Fire)
            .apply(Command::LowerBarrel)
            .apply(Command::LowerBarrel)
            .apply(Command::LowerBarrel)
            .step();

        let flight = flying(&state);
        let dir = Vec2::from_angle(60f32.to_radians());
        assert!(flight.velocity.abs_diff_eq(7.0 * dir, 1e-5));
        assert!(flight.origin.abs_diff_eq(Vec2::new(-4.0, -4.0) + 1.2 * dir, 1e-5));
        assert_eq!(flight.position, Vec2::ZERO);
        assert_eq!(flight.elapsed, 0.0);
        assert_eq!(flight.bounces, 0);
    }

    #[test]
    fn refire_mid_flight_restarts_the_trajectory() {
        let mut state = CanonState::new().apply(Command::Fire).step();
        for _ in 0..30 {
            state = state.step();
        }
        assert!(flying(&state).elapsed > 0.0);

        state = state.apply(Command::Fire);
        assert_eq!(state.ammo, 2);
        let flight = flying(&state.step());
        assert_eq!(flight.elapsed, 0.0);
        assert_eq!(flight.bounces, 0);
        assert_eq!(flight.position, Vec2::ZERO);
    }

    #[test]
    fn motion_follows_the_gravity_term() {
        let flight = Flight {
            origin: Vec2::ZERO,
            position: Vec2::ZERO,
            velocity: Vec2::new(2.0, 3.0),
            elapsed: 0.5,
            bounces: 0,
        };
        let next = advance(flight, 0.0).unwrap();
        assert!(approx(next.position.x, 0.02));
        assert!(approx(next.position.y, 0.01 * (3.0 + 5.0 - 5.0)));
        assert!(approx(next.elapsed, 0.51));
    }

    #[test]
    fn floor_contact_halves_vertical_speed() {
        let flight = Flight {
            origin: Vec2::ZERO,
            position: Vec2::new(0.0, -2.0),
            velocity: Vec2::new(0.0, 4.0),
            elapsed: 1.0,
            bounces: 2,
        };
        let next = advance(flight, 90f32.to_radians()).unwrap();
        assert_eq!(next.velocity.y, 2.0);
        assert_eq!(next.bounces, 3);
        assert!(approx(next.elapsed, TIME_STEP));
    }

    #[test]
    fn last_bounce_deactivates() {
        let flight = Flight {
            origin: Vec2::ZERO,
            position: Vec2::new(0.0, -2.0),
            velocity: Vec2::new(0.0, 4.0),
            elapsed: 1.0,
            bounces: 4,
        };
        assert!(advance(flight, 90f32.to_radians()).is_none());

        let exhausted = Flight {
            bounces: MAX_BOUNCES,
            velocity: Vec2::new(0.0, 100.0),
            position: Vec2::new(0.0, -5.0),
            ..flight
        };
        assert!(advance(exhausted, 90f32.to_radians()).is_none());
    }

    #[test]
    fn right_wall_reflects_and_halves_horizontal_speed() {
        let flight = Flight {
            origin: Vec2::ZERO,
            position: Vec2::new(7.5, 3.0),
            velocity: Vec2::new(6.0, 0.0),
            elapsed: 0.0,
            bounces: 0,
        };
        // theta = 0 puts the wall at x = 7.
        let next = advance(flight, 0.0).unwrap();
        assert_eq!(next.velocity.x, -3.0);
        assert_eq!(next.velocity.y, 0.0);
    }

    #[test]
    fn either_axis_rule_collects_row_and_column_neighbours() {
        let rule = HitRule::EitherAxis;
        assert!(rule.hits(Vec2::new(3.3, -2.0), Vec2::new(3.0, 3.0)));
        assert!(rule.hits(Vec2::new(-1.0, 2.9), Vec2::new(3.0, 3.0)));
        assert!(!rule.hits(Vec2::new(0.0, 0.0), Vec2::new(3.0, 3.0)));
    }

    #[test]
    fn both_axes_rule_needs_a_real_overlap() {
        let rule = HitRule::BothAxes;
        assert!(!rule.hits(Vec2::new(3.3, -2.0), Vec2::new(3.0, 3.0)));
        assert!(rule.hits(Vec2::new(3.3, 2.7), Vec2::new(3.0, 3.0)));
    }

    #[test]
    fn hit_test_uses_flight_local_position() {
        let mut state = CanonState::new();
        state.projectile = Projectile::InFlight(Flight {
            origin: Vec2::new(-3.0, -3.0),
            position: Vec2::new(2.0, 3.99),
            velocity: Vec2::ZERO,
            elapsed: 0.5,
            bounces: 0,
        });
        let state = state.with_hit_rule(HitRule::BothAxes).step();
        // Local (2, ~4) matches the coin at (2, 4); world (-1, ~1) matches nothing.
        let hidden: Vec<Vec2> = state
            .coins
            .iter()
            .filter(|c| !c.visible)
            .map(|c| c.position)
            .collect();
        assert_eq!(hidden, vec![Vec2::new(2.0, 4.0)]);
    }

    #[test]
    fn projectile_is_drawn_only_in_flight() {
        let state = CanonState::new();
        assert!(state.projectile_model().is_none());
        let state = state.apply(Command::Fire);
        assert!(state.projectile_model().is_none());
        assert!(state.step().projectile_model().is_some());
    }

    #[test]
    fn cannon_model_pivots_at_the_base() {
        let m = CanonState::new().cannon_model();
        let tip = m.transform_point3(Vec3::new(2.0, 0.0, 0.0));
        assert!(tip.abs_diff_eq(Vec3::new(-4.0, -3.0, 0.0), 1e-5));
    }
}
