use crate::cell::Cell;
use itertools::Itertools;

/// `(x, y)` with `x` in `[0, width)` and `y` in `[0, height)`.
pub type Position = (usize, usize);

/// Fixed 2-D lattice owning every cell in row-major order.
#[derive(Clone, Debug)]
pub struct Grid {
    size: (usize, usize),
    torus: bool,
    cells: Vec<Cell>,
}

impl Grid {
    /// Every cell starts with the default (susceptible) genome.
    pub fn new(width: usize, height: usize, torus: bool) -> Grid {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(Cell::new((x, y)));
            }
        }
        Grid {
            size: (width, height),
            torus,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.size.0
    }

    pub fn height(&self) -> usize {
        self.size.1
    }

    pub fn is_torus(&self) -> bool {
        self.torus
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub const fn idx_2_xy(&self, idx: usize) -> Position {
        (idx % self.size.0, idx / self.size.0)
    }

    pub const fn xy_2_idx(&self, xy: Position) -> usize {
        xy.1 * self.size.0 + xy.0
    }

    pub fn contains(&self, (x, y): Position) -> bool {
        x < self.size.0 && y < self.size.1
    }

    pub fn get(&self, position: Position) -> Option<&Cell> {
        if !self.contains(position) {
            return None;
        }
        self.cells.get(self.xy_2_idx(position))
    }

    pub fn get_mut(&mut self, position: Position) -> Option<&mut Cell> {
        if !self.contains(position) {
            return None;
        }
        let idx = self.xy_2_idx(position);
        self.cells.get_mut(idx)
    }

    /// Cells in row-major order. The order is stable for the lifetime of the grid.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Positions of the Moore neighbourhood around `position`, centre excluded.
    ///
    /// On a torus all eight offsets wrap, so exactly eight positions are
    /// produced (tori narrower than three cells revisit the same sites). On a
    /// bounded grid offsets falling outside the lattice are dropped, leaving
    /// three to eight positions on grids of at least 2x2.
    pub fn neighbor_positions(&self, position: Position) -> impl Iterator<Item = Position> + '_ {
        debug_assert!(self.contains(position), "{:?} is off the grid", position);
        (-1isize..=1)
            .cartesian_product(-1isize..=1)
            .filter(|&offset| offset != (0, 0))
            .filter_map(move |offset| self.shifted(position, offset))
    }

    pub fn neighbors_of(&self, position: Position) -> impl Iterator<Item = &Cell> + '_ {
        self.neighbor_positions(position)
            .map(move |xy| &self.cells[self.xy_2_idx(xy)])
    }

    fn shifted(&self, (x, y): Position, (dx, dy): (isize, isize)) -> Option<Position> {
        let (width, height) = (self.size.0 as isize, self.size.1 as isize);
        let nx = x as isize + dx;
        let ny = y as isize + dy;
        if self.torus {
            Some((nx.rem_euclid(width) as usize, ny.rem_euclid(height) as usize))
        } else if (0..width).contains(&nx) && (0..height).contains(&ny) {
            Some((nx as usize, ny as usize))
        } else {
            None
        }
    }
}
