use std::fmt::{Display, Formatter};

use log::debug;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SircaError};
use crate::grid::{Grid, Position};

/// Ticks elapsed since some event.
pub type Tick = u32;

/// Floor for mutated infectiousness, keeps donor weights strictly positive.
pub const MIN_INFECTIOUSNESS: f64 = f64::EPSILON;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum CellState {
    Susceptible,
    Infected,
    Resistant,
}

impl Default for CellState {
    fn default() -> Self {
        CellState::Susceptible
    }
}

impl Display for CellState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CellState::Susceptible => "S",
                CellState::Infected => "I",
                CellState::Resistant => "R",
            }
        )
    }
}

/// Disease traits carried by a cell. The default genome is the susceptible one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub state: CellState,
    /// Contribution to the infection load of every susceptible neighbour.
    pub infectiousness: f64,
    pub infection_duration: Tick,
    pub resistance_duration: Tick,
    /// Ticks since the cell entered `state`.
    pub tick: Tick,
}

impl Genome {
    pub fn infected(
        infectiousness: f64,
        infection_duration: Tick,
        resistance_duration: Tick,
        tick: Tick,
    ) -> Genome {
        Genome {
            state: CellState::Infected,
            infectiousness,
            infection_duration,
            resistance_duration,
            tick,
        }
    }

    /// Drifted copy of this genome in the infected state, `tick` carried over.
    pub fn mutated<R: Rng + ?Sized>(&self, rng: &mut R) -> Genome {
        let noise: f64 = rng.sample(StandardNormal);
        Genome {
            state: CellState::Infected,
            infectiousness: (self.infectiousness + noise).max(MIN_INFECTIOUSNESS),
            infection_duration: drift(self.infection_duration, rng),
            resistance_duration: drift(self.resistance_duration, rng),
            tick: self.tick,
        }
    }

    fn recovered(&self) -> Genome {
        Genome {
            state: CellState::Resistant,
            infectiousness: 0.,
            tick: 0,
            ..*self
        }
    }

    fn ticked(&self) -> Genome {
        Genome {
            tick: self.tick.saturating_add(1),
            ..*self
        }
    }
}

fn drift<R: Rng + ?Sized>(duration: Tick, rng: &mut R) -> Tick {
    let step: i64 = rng.gen_range(-1..=1);
    (duration as i64 + step).clamp(1, Tick::MAX as i64) as Tick
}

/// Saturating infection probability, `h_inf` being the load at which it reaches 0.5.
pub fn infection_probability(infection_load: f64, h_inf: f64) -> f64 {
    if infection_load <= 0. {
        return 0.;
    }
    infection_load / (infection_load + h_inf)
}

/// One site of the lattice with a committed genome and a scratch slot for
/// the tick being computed.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    position: Position,
    current: Genome,
    pending: Genome,
}

impl Cell {
    pub fn new(position: Position) -> Cell {
        Cell::with_genome(position, Genome::default())
    }

    pub fn with_genome(position: Position, genome: Genome) -> Cell {
        Cell {
            position,
            current: genome,
            pending: genome,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// The committed genome, the only one neighbours ever read.
    pub fn current(&self) -> &Genome {
        &self.current
    }

    pub fn state(&self) -> CellState {
        self.current.state
    }

    /// Overwrites both slots. Only for seeding, never during a tick.
    pub fn set_genome(&mut self, genome: Genome) {
        self.current = genome;
        self.pending = genome;
    }

    /// Sum of the infectiousness of the infected neighbours.
    pub fn infection_load(&self, grid: &Grid) -> f64 {
        grid.neighbors_of(self.position)
            .map(Cell::current)
            .filter(|g| g.state == CellState::Infected)
            .map(|g| g.infectiousness)
            .sum()
    }

    pub fn infection_probability(&self, grid: &Grid, h_inf: f64) -> f64 {
        infection_probability(self.infection_load(grid), h_inf)
    }

    /// Next genome of this cell, computed from the committed genomes of the
    /// cell and its neighbours only.
    pub fn step<R: Rng + ?Sized>(&self, grid: &Grid, h_inf: f64, rng: &mut R) -> Genome {
        match self.current.state {
            CellState::Susceptible => self.transfer_s_to_i(grid, h_inf, rng),
            CellState::Infected => self.transfer_i_to_r(rng),
            CellState::Resistant => self.transfer_r_to_s(),
        }
    }

    pub fn stage(&mut self, next: Genome) {
        self.pending = next;
    }

    /// Commits the staged genome.
    pub fn advance(&mut self) {
        self.current = self.pending;
    }

    fn transfer_s_to_i<R: Rng + ?Sized>(&self, grid: &Grid, h_inf: f64, rng: &mut R) -> Genome {
        let infected: Vec<&Genome> = grid
            .neighbors_of(self.position)
            .map(Cell::current)
            .filter(|g| g.state == CellState::Infected)
            .collect();
        if infected.is_empty() {
            return self.current;
        }
        let infection_load: f64 = infected.iter().map(|g| g.infectiousness).sum();
        let u: f64 = rng.gen();
        if u >= infection_probability(infection_load, h_inf) {
            return self.current;
        }
        match self.pick_donor(&infected, rng) {
            Ok(donor) => Genome {
                tick: 0,
                ..donor.mutated(rng)
            },
            Err(err) => {
                debug!("{}", err);
                self.current
            }
        }
    }

    /// Infectiousness-weighted choice among the infected neighbours.
    fn pick_donor<'g, R: Rng + ?Sized>(
        &self,
        infected: &[&'g Genome],
        rng: &mut R,
    ) -> Result<&'g Genome> {
        let weights = WeightedIndex::<f64>::new(infected.iter().map(|g| g.infectiousness)).map_err(
            |_| SircaError::DegenerateWeightedChoice {
                position: self.position,
            },
        )?;
        Ok(infected[weights.sample(rng)])
    }

    fn transfer_i_to_r<R: Rng + ?Sized>(&self, rng: &mut R) -> Genome {
        if self.current.tick > self.current.infection_duration {
            self.current.recovered()
        } else {
            self.current.ticked().mutated(rng)
        }
    }

    fn transfer_r_to_s(&self) -> Genome {
        if self.current.tick > self.current.resistance_duration {
            Genome::default()
        } else {
            self.current.ticked()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    fn lone(genome: Genome) -> (Grid, Cell) {
        let mut grid = Grid::new(3, 3, false);
        grid.get_mut((1, 1)).unwrap().set_genome(genome);
        let cell = grid.get((1, 1)).unwrap().clone();
        (grid, cell)
    }

    #[test]
    fn recovery_boundary() {
        let mut rng = rng();
        let (grid, cell) = lone(Genome::infected(2., 5, 10, 5));
        let next = cell.step(&grid, 10., &mut rng);
        assert_eq!(next.state, CellState::Infected);
        assert_eq!(next.tick, 6);

        let (grid, cell) = lone(Genome::infected(2., 5, 10, 6));
        let next = cell.step(&grid, 10., &mut rng);
        assert_eq!(next.state, CellState::Resistant);
        assert_eq!(next.tick, 0);
        assert_eq!(next.infectiousness, 0.);
        assert_eq!(next.infection_duration, 5);
        assert_eq!(next.resistance_duration, 10);
    }

    #[test]
    fn resistance_boundary() {
        let mut rng = rng();
        let resistant = Genome {
            state: CellState::Resistant,
            infectiousness: 0.,
            infection_duration: 5,
            resistance_duration: 4,
            tick: 4,
        };
        let (grid, cell) = lone(resistant);
        let next = cell.step(&grid, 10., &mut rng);
        assert_eq!(next, Genome { tick: 5, ..resistant });

        let (grid, cell) = lone(Genome { tick: 5, ..resistant });
        assert_eq!(cell.step(&grid, 10., &mut rng), Genome::default());
    }

    #[test]
    fn susceptible_without_infected_neighbors_stays() {
        let mut rng = rng();
        let mut grid = Grid::new(4, 4, true);
        grid.get_mut((0, 0)).unwrap().set_genome(Genome {
            state: CellState::Resistant,
            resistance_duration: 3,
            ..Genome::default()
        });
        for cell in grid.cells().iter().filter(|c| c.state() == CellState::Susceptible) {
            assert_eq!(cell.infection_load(&grid), 0.);
            for _ in 0..1000 {
                assert_eq!(cell.step(&grid, 1e-12, &mut rng), *cell.current());
            }
        }
    }

    #[test]
    fn mutation_stays_in_bounds() {
        let mut rng = rng();
        let source = Genome::infected(1e-3, 1, 1, 9);
        for _ in 0..10000 {
            let m = source.mutated(&mut rng);
            assert_eq!(m.state, CellState::Infected);
            assert!(m.infectiousness >= MIN_INFECTIOUSNESS);
            assert!((1..=2).contains(&m.infection_duration));
            assert!((1..=2).contains(&m.resistance_duration));
            assert_eq!(m.tick, 9);
        }
    }

    #[test]
    fn infection_inherits_from_donor() {
        let mut rng = rng();
        let mut grid = Grid::new(3, 3, false);
        grid.get_mut((0, 0))
            .unwrap()
            .set_genome(Genome::infected(1e12, 40, 60, 3));
        let cell = grid.get((1, 1)).unwrap().clone();
        let next = cell.step(&grid, 1e-12, &mut rng);
        assert_eq!(next.state, CellState::Infected);
        assert_eq!(next.tick, 0);
        assert!((39..=41).contains(&next.infection_duration));
        assert!((59..=61).contains(&next.resistance_duration));
    }

    #[test]
    fn zero_weights_leave_no_donor() {
        let mut rng = rng();
        let cell = Cell::new((2, 3));
        let a = Genome::infected(0., 3, 3, 0);
        let b = Genome::infected(0., 3, 3, 0);
        match cell.pick_donor(&[&a, &b], &mut rng) {
            Err(SircaError::DegenerateWeightedChoice { position }) => assert_eq!(position, (2, 3)),
            other => panic!("expected degenerate choice, got {:?}", other),
        }
    }

    #[test]
    fn invalid_weights_keep_cell_susceptible() {
        let mut rng = rng();
        let mut grid = Grid::new(3, 1, false);
        grid.get_mut((0, 0))
            .unwrap()
            .set_genome(Genome::infected(1e12, 3, 3, 0));
        grid.get_mut((2, 0))
            .unwrap()
            .set_genome(Genome::infected(-1., 3, 3, 0));
        let cell = grid.get((1, 0)).unwrap().clone();
        for _ in 0..100 {
            assert_eq!(cell.step(&grid, 1e-12, &mut rng), Genome::default());
        }
    }

    #[test]
    fn probability_bounds() {
        for h_inf in [1e-3, 0.5, 1., 10., 1e6] {
            assert_eq!(infection_probability(0., h_inf), 0.);
            let mut last = 0.;
            for k in 1..200 {
                let load = k as f64 * 0.37;
                let p = infection_probability(load, h_inf);
                assert!(p > 0. && p <= 1.);
                assert!(p >= last);
                last = p;
            }
            assert_eq!(infection_probability(h_inf, h_inf), 0.5);
        }
    }

    #[test]
    fn stronger_neighbor_never_lowers_probability() {
        let mut grid = Grid::new(3, 3, true);
        grid.get_mut((0, 0))
            .unwrap()
            .set_genome(Genome::infected(1.5, 3, 3, 0));
        let mut last = 0.;
        for k in 0..50 {
            grid.get_mut((2, 1))
                .unwrap()
                .set_genome(Genome::infected(k as f64 * 0.25, 3, 3, 0));
            let p = grid.get((1, 1)).unwrap().infection_probability(&grid, 10.);
            assert!(p >= last);
            last = p;
        }
    }
}
