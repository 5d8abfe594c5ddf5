//! Susceptible-infected-resistant cellular automaton with an evolving pathogen.
//!
//! Every cell of a fixed lattice carries a [`Genome`]. Each tick all cells
//! compute their next genome from the committed state of their Moore
//! neighbourhood and only then commit together, see [`Scheduler`].

mod cell;
mod config;
mod error;
mod grid;
pub mod mean_field;
mod model;
pub mod render;
pub mod reporters;
mod simulation;


pub use cell::{infection_probability, Cell, CellState, Genome, Tick, MIN_INFECTIOUSNESS};
pub use config::ModelConfig;
pub use error::{Result, SircaError};
pub use grid::{Grid, Position};
pub use model::Model;
pub use render::color_of;
pub use simulation::{ExecutionMode, Scheduler};
