extern crate nalgebra as na;

pub mod animation;
pub mod error;
pub mod expr;
pub mod model;
pub mod params;
pub mod plot;
pub mod reference;
pub mod simulate;
pub mod state;
pub mod trajectory;

pub use error::{Error, Result};
pub use model::{dynamics, Model};
pub use params::{Params, SimConfig};
pub use reference::{piecewise_constant, Reference};
pub use state::{Input, State};
pub use trajectory::Trajectory;
