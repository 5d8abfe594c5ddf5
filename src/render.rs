use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::cell::CellState;
use crate::grid::Grid;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum Color {
    White,
    Red,
    Blue,
}

impl Color {
    pub fn hex(&self) -> &'static str {
        match self {
            Color::White => "#ffffff",
            Color::Red => "#ff0000",
            Color::Blue => "#0000ff",
        }
    }

    /// Character used for terminal frames.
    pub fn glyph(&self) -> char {
        match self {
            Color::White => '.',
            Color::Red => '#',
            Color::Blue => 'o',
        }
    }
}

pub const SUSCEPTIBLE_COLOR: Color = Color::White;
pub const INFECTED_COLOR: Color = Color::Red;
pub const RESISTANT_COLOR: Color = Color::Blue;

pub fn color_of(state: CellState) -> Color {
    match state {
        CellState::Susceptible => SUSCEPTIBLE_COLOR,
        CellState::Infected => INFECTED_COLOR,
        CellState::Resistant => RESISTANT_COLOR,
    }
}

/// One row per `y`, one glyph per cell.
impl Display for Grid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for row in self.cells().chunks(self.width().max(1)) {
            for cell in row {
                write!(f, "{}", color_of(cell.state()).glyph())?
            }
            writeln!(f)?
        }
        Ok(())
    }
}
