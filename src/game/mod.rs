//! The two games.
//!
//! Each game is a plain state value with two transitions: `apply` folds one
//! player [`Command`](canon::Command) into the state, and `step` advances it
//! by one frame. Both take `self` by value and return the next state, so the
//! rules are testable without a window. The `setup` function of each module
//! wires the state into [`run_with_config`](crate::run_with_config).

pub mod canon;
pub mod maze;

use winit::keyboard::KeyCode;

use crate::input::Input;

/// Escape or Q closes either game.
pub(crate) fn quit_pressed(input: &Input) -> bool {
    input.key_pressed(KeyCode::Escape) || input.key_pressed(KeyCode::KeyQ)
}
