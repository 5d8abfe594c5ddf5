use log::{info, trace};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use crate::cell::{Cell, CellState, Genome};
use crate::config::ModelConfig;
use crate::error::Result;
use crate::grid::Grid;
use crate::simulation::Scheduler;

/// Owns the grid, the random stream and the parameters of one run.
pub struct Model {
    pub(crate) config: ModelConfig,
    pub(crate) grid: Grid,
    pub(crate) scheduler: Scheduler,
    pub(crate) rng: SmallRng,
    pub(crate) stepnumber: usize,
}

impl Model {
    pub fn new(config: ModelConfig) -> Result<Model> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let mut model = Model {
            grid: Grid::new(config.width, config.height, config.torus),
            scheduler: Scheduler::new(config.execution),
            rng,
            stepnumber: 0,
            config,
        };
        let seeded = model.seed_infection();
        info!(
            "initialised {}x{} grid with {} infected cells ({})",
            model.grid.width(),
            model.grid.height(),
            seeded,
            model.config
        );
        Ok(model)
    }

    /// Infects each cell independently with probability `seed_density`, at a
    /// random point of its infection so the outbreak does not start in lockstep.
    fn seed_infection(&mut self) -> usize {
        let config = &self.config;
        let mut seeded = 0;
        for cell in self.grid.cells_mut() {
            if !self.rng.gen_bool(config.seed_density) {
                continue;
            }
            let tick = self.rng.gen_range(0..=config.infection_duration);
            cell.set_genome(Genome::infected(
                config.infectiousness,
                config.infection_duration,
                config.resistance_duration,
                tick,
            ));
            trace!("seeded {:?} at tick {}", cell.position(), tick);
            seeded += 1;
        }
        seeded
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Committed cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        self.grid.cells()
    }

    pub fn stepnumber(&self) -> usize {
        self.stepnumber
    }

    /// False once no infected cell is left.
    pub fn is_running(&self) -> bool {
        self.cells()
            .iter()
            .any(|cell| cell.state() == CellState::Infected)
    }

    pub fn generate_json(&self) -> serde_json::Value {
        let cells: Vec<serde_json::Value> = self
            .cells()
            .iter()
            .map(|cell| {
                let (x, y) = cell.position();
                json!({"x": x, "y": y, "genome": cell.current()})
            })
            .collect();
        json!({
            "width": self.grid.width(),
            "height": self.grid.height(),
            "torus": self.grid.is_torus(),
            "stepnumber": self.stepnumber,
            "cells": cells,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_respects_parameters() {
        let config = ModelConfig {
            width: 20,
            height: 15,
            seed_density: 1.,
            infection_duration: 4,
            seed: Some(11),
            ..Default::default()
        };
        let model = Model::new(config).unwrap();
        assert_eq!(model.cells().len(), 300);
        for cell in model.cells() {
            let g = cell.current();
            assert_eq!(g.state, CellState::Infected);
            assert_eq!(g.infectiousness, 2.0);
            assert_eq!(g.infection_duration, 4);
            assert_eq!(g.resistance_duration, 10);
            assert!(g.tick <= 4);
        }
        assert!(model.is_running());
    }

    #[test]
    fn invalid_config_builds_nothing() {
        let config = ModelConfig {
            height: 0,
            ..Default::default()
        };
        assert!(Model::new(config).is_err());
    }

    #[test]
    fn json_snapshot() {
        let config = ModelConfig {
            width: 3,
            height: 2,
            seed_density: 0.,
            seed: Some(1),
            ..Default::default()
        };
        let model = Model::new(config).unwrap();
        let v = model.generate_json();
        assert_eq!(v["width"], 3);
        assert_eq!(v["height"], 2);
        assert_eq!(v["stepnumber"], 0);
        assert_eq!(v["cells"].as_array().unwrap().len(), 6);
        assert_eq!(v["cells"][4]["x"], 1);
        assert_eq!(v["cells"][4]["y"], 1);
        assert_eq!(v["cells"][4]["genome"]["state"], "Susceptible");
    }
}
