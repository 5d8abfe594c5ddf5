use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, Genome};
use crate::error::Result;
use crate::grid::Grid;
use crate::model::Model;
use crate::reporters::{census, TimeSeries};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Cells draw from the model stream one after another in row-major order.
    Sequential,
    /// Cells are computed on the rayon pool, each with its own stream derived
    /// from a per-tick seed and the cell index.
    Parallel,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode::Sequential
    }
}

/// Simultaneous activation: every cell computes its next genome against the
/// committed grid before any cell commits.
#[derive(Clone, Copy, Debug, Default)]
pub struct Scheduler {
    mode: ExecutionMode,
}

impl Scheduler {
    pub fn new(mode: ExecutionMode) -> Scheduler {
        Scheduler { mode }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn step<R: Rng + ?Sized>(&self, grid: &mut Grid, h_inf: f64, rng: &mut R) {
        let staged = self.compute(grid, h_inf, rng);
        for (cell, next) in grid.cells_mut().iter_mut().zip(staged) {
            cell.stage(next);
        }
        match self.mode {
            ExecutionMode::Sequential => grid.cells_mut().iter_mut().for_each(Cell::advance),
            ExecutionMode::Parallel => grid.cells_mut().par_iter_mut().for_each(Cell::advance),
        }
    }

    /// Phase one. Reads only committed genomes.
    fn compute<R: Rng + ?Sized>(&self, grid: &Grid, h_inf: f64, rng: &mut R) -> Vec<Genome> {
        match self.mode {
            ExecutionMode::Sequential => grid
                .cells()
                .iter()
                .map(|cell| cell.step(grid, h_inf, rng))
                .collect(),
            ExecutionMode::Parallel => {
                let tick_seed: u64 = rng.gen();
                grid.cells()
                    .par_iter()
                    .enumerate()
                    .map(|(idx, cell)| {
                        let mut cell_rng = SmallRng::seed_from_u64(cell_seed(tick_seed, idx));
                        cell.step(grid, h_inf, &mut cell_rng)
                    })
                    .collect()
            }
        }
    }
}

/// splitmix64 finaliser over the tick seed and the cell index.
fn cell_seed(tick_seed: u64, idx: usize) -> u64 {
    let mut z = tick_seed.wrapping_add((idx as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/* Propagation */
impl Model {
    /// Advances every cell by one tick.
    pub fn step(&mut self) {
        self.scheduler
            .step(&mut self.grid, self.config.h_inf, &mut self.rng);
        self.stepnumber += 1;
        if log::log_enabled!(log::Level::Debug) {
            let counts = census(self.cells());
            debug!(
                "tick {}: S={} I={} R={}",
                self.stepnumber,
                counts.susceptible(),
                counts.infected(),
                counts.resistant()
            );
        }
    }

    /// Records an observation, then steps, up to `ticks` times. Stops early
    /// once the infection has died out; the final state is always recorded.
    pub fn run(&mut self, ticks: usize, recorder: &mut TimeSeries) -> usize {
        self.run_with(ticks, recorder, |_| {})
    }

    fn run_with<F: FnMut(usize)>(
        &mut self,
        ticks: usize,
        recorder: &mut TimeSeries,
        mut on_tick: F,
    ) -> usize {
        let mut done = 0;
        while done < ticks {
            recorder.record(self);
            if !self.is_running() {
                info!("no infected cells left after {} ticks", self.stepnumber);
                return done;
            }
            self.step();
            done += 1;
            on_tick(done);
        }
        recorder.record(self);
        done
    }

    pub fn run_and_write_csv(
        &mut self,
        ticks: usize,
        filename: impl AsRef<Path>,
    ) -> Result<TimeSeries> {
        let pb = ProgressBar::new(ticks as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ticks ({eta})",
                )
                .progress_chars("#>-"),
        );

        info!("running {} ticks with {}", ticks, self.config);
        let mut series = TimeSeries::default();
        let done = self.run_with(ticks, &mut series, |_| pb.inc(1));
        pb.finish_with_message("simulation complete");
        info!("finished after {} of {} ticks", done, ticks);

        info!("writing file {}", filename.as_ref().display());
        let file = BufWriter::new(File::create(filename)?);
        series.write_csv(file)?;
        Ok(series)
    }
}
