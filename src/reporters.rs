//! Read-only statistics over committed cells.
//!
//! Every function here is a pure function of the cell collection handed in,
//! so it can run after any tick without touching the model. Means over an
//! empty subset are `None` instead of an error; the simulation never stops
//! because a compartment happens to be empty.

use std::io::Write;

use hashbag::HashBag;
use itertools::Itertools;
use serde::Serialize;

use crate::cell::{Cell, CellState, Genome};
use crate::error::{Result, SircaError};
use crate::model::Model;

/// Number of cells per state.
#[derive(Debug)]
pub struct Census {
    bag: HashBag<CellState>,
}

impl Census {
    pub fn count(&self, state: CellState) -> usize {
        self.bag.contains(&state)
    }

    pub fn susceptible(&self) -> usize {
        self.count(CellState::Susceptible)
    }

    pub fn infected(&self) -> usize {
        self.count(CellState::Infected)
    }

    pub fn resistant(&self) -> usize {
        self.count(CellState::Resistant)
    }

    pub fn total(&self) -> usize {
        self.bag.len()
    }

    pub fn fraction(&self, state: CellState) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.count(state) as f64 / total as f64),
        }
    }
}

pub fn census<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> Census {
    Census {
        bag: cells.into_iter().map(Cell::state).collect(),
    }
}

pub fn fraction_in(cells: &[Cell], state: CellState) -> Option<f64> {
    census(cells).fraction(state)
}

fn mean_over<F>(cells: &[Cell], state: CellState, field: F) -> Option<f64>
where
    F: Fn(&Genome) -> f64,
{
    let values: Vec<f64> = cells
        .iter()
        .map(Cell::current)
        .filter(|g| g.state == state)
        .map(field)
        .collect();
    if values.is_empty() {
        return None;
    }
    Some(stats::mean(values.into_iter()))
}

pub fn mean_infection_duration(cells: &[Cell]) -> Option<f64> {
    mean_over(cells, CellState::Infected, |g| g.infection_duration as f64)
}

pub fn mean_resistance_duration(cells: &[Cell]) -> Option<f64> {
    mean_over(cells, CellState::Resistant, |g| g.resistance_duration as f64)
}

pub fn mean_infected_tick(cells: &[Cell]) -> Option<f64> {
    mean_over(cells, CellState::Infected, |g| g.tick as f64)
}

pub fn mean_resistant_tick(cells: &[Cell]) -> Option<f64> {
    mean_over(cells, CellState::Resistant, |g| g.tick as f64)
}

pub fn mean_infectiousness(cells: &[Cell]) -> Option<f64> {
    mean_over(cells, CellState::Infected, |g| g.infectiousness)
}

/// Turns the empty-subset sentinel into an error for callers that need a value.
pub fn require(value: Option<f64>, what: &'static str) -> Result<f64> {
    value.ok_or(SircaError::EmptyAggregate(what))
}

/// All reporter values for one committed tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Observation {
    pub tick: usize,
    pub susceptible: f64,
    pub infected: f64,
    pub resistant: f64,
    pub mean_infection_duration: Option<f64>,
    pub mean_resistance_duration: Option<f64>,
    pub mean_infected_tick: Option<f64>,
    pub mean_resistant_tick: Option<f64>,
    pub mean_infectiousness: Option<f64>,
}

impl Observation {
    pub fn from_cells(tick: usize, cells: &[Cell]) -> Observation {
        let counts = census(cells);
        Observation {
            tick,
            susceptible: counts.fraction(CellState::Susceptible).unwrap_or(0.),
            infected: counts.fraction(CellState::Infected).unwrap_or(0.),
            resistant: counts.fraction(CellState::Resistant).unwrap_or(0.),
            mean_infection_duration: mean_infection_duration(cells),
            mean_resistance_duration: mean_resistance_duration(cells),
            mean_infected_tick: mean_infected_tick(cells),
            mean_resistant_tick: mean_resistant_tick(cells),
            mean_infectiousness: mean_infectiousness(cells),
        }
    }

    fn csv_row(&self) -> String {
        let optional = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
        [
            self.tick.to_string(),
            self.susceptible.to_string(),
            self.infected.to_string(),
            self.resistant.to_string(),
            optional(self.mean_infection_duration),
            optional(self.mean_resistance_duration),
            optional(self.mean_infected_tick),
            optional(self.mean_resistant_tick),
            optional(self.mean_infectiousness),
        ]
        .iter()
        .join(",")
    }
}

const CSV_HEADER: [&str; 9] = [
    "tick",
    "S",
    "I",
    "R",
    "mean_infection_duration",
    "mean_resistance_duration",
    "mean_infected_tick",
    "mean_resistant_tick",
    "mean_infectiousness",
];

/// Observations collected over a run, one per committed tick.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TimeSeries {
    observations: Vec<Observation>,
}

impl TimeSeries {
    pub fn record(&mut self, model: &Model) {
        self.observations
            .push(Observation::from_cells(model.stepnumber(), model.cells()));
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Undefined means are written as empty fields.
    pub fn write_csv<W: Write>(&self, mut out: W) -> Result<()> {
        writeln!(out, "{}", CSV_HEADER.iter().join(","))?;
        for observation in &self.observations {
            writeln!(out, "{}", observation.csv_row())?;
        }
        out.flush()?;
        Ok(())
    }
}
