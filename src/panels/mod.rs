mod controls;
mod status;
mod util;

pub use controls::{ControlAction, ControlsPanel};
pub use status::{StatusPanel, StatusView};
