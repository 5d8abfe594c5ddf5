//! Mean-field approximation of the automaton.
//!
//! Treats the lattice as well mixed: every susceptible cell sees eight
//! neighbours, each infected with probability `I`, all carrying the seeded
//! infectiousness. Recovery and loss of resistance happen at rates
//! `1 / infection_duration` and `1 / resistance_duration`. No mutation.

use assert_float_eq::*;
use serde::Serialize;

use crate::cell::CellState;
use crate::config::ModelConfig;
use crate::reporters::Census;

pub const MOORE_NEIGHBOURS: f64 = 8.;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Fractions {
    pub susceptible: f64,
    pub infected: f64,
    pub resistant: f64,
}

impl Fractions {
    pub fn total(&self) -> f64 {
        self.susceptible + self.infected + self.resistant
    }

    pub fn from_census(counts: &Census) -> Option<Fractions> {
        Some(Fractions {
            susceptible: counts.fraction(CellState::Susceptible)?,
            infected: counts.fraction(CellState::Infected)?,
            resistant: counts.fraction(CellState::Resistant)?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct MeanField {
    infectiousness: f64,
    h_inf: f64,
    infection_duration: f64,
    resistance_duration: f64,
    state: Fractions,
}

impl MeanField {
    pub fn new(config: &ModelConfig, initial: Fractions) -> MeanField {
        MeanField {
            infectiousness: config.infectiousness,
            h_inf: config.h_inf,
            infection_duration: config.infection_duration as f64,
            resistance_duration: config.resistance_duration as f64,
            state: initial,
        }
    }

    pub fn state(&self) -> Fractions {
        self.state
    }

    pub fn step(&mut self) -> Fractions {
        let Fractions {
            susceptible: s,
            infected: i,
            resistant: r,
        } = self.state;
        let load = MOORE_NEIGHBOURS * self.infectiousness * i;
        let infections = load * s / (load + self.h_inf);
        let recoveries = i / self.infection_duration;
        let waning = r / self.resistance_duration;
        let next = Fractions {
            susceptible: s + waning - infections,
            infected: i + infections - recoveries,
            resistant: r + recoveries - waning,
        };
        assert_float_absolute_eq!(next.total(), self.state.total(), 1e-9);
        self.state = next;
        next
    }

    /// The current state followed by `steps` successors.
    pub fn trajectory(&mut self, steps: usize) -> Vec<Fractions> {
        let mut out = Vec::with_capacity(steps + 1);
        out.push(self.state);
        for _ in 0..steps {
            out.push(self.step());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> Fractions {
        Fractions {
            susceptible: 0.8,
            infected: 0.1,
            resistant: 0.1,
        }
    }

    #[test]
    fn conserves_population() {
        let config = ModelConfig {
            infectiousness: 2.0,
            infection_duration: 5,
            resistance_duration: 5,
            h_inf: 10.,
            ..Default::default()
        };
        let mut mf = MeanField::new(&config, start());
        let trajectory = mf.trajectory(25);
        assert_eq!(trajectory.len(), 26);
        assert_eq!(trajectory[0], start());
        for f in trajectory {
            assert_float_absolute_eq!(f.total(), 1.0, 1e-9);
            assert!(f.susceptible >= 0. && f.infected >= 0. && f.resistant >= 0.);
        }
    }

    #[test]
    fn first_step_matches_hand_computation() {
        let config = ModelConfig {
            infectiousness: 2.0,
            infection_duration: 5,
            resistance_duration: 5,
            h_inf: 10.,
            ..Default::default()
        };
        let mut mf = MeanField::new(&config, start());
        let next = mf.step();
        // load = 8 * 2 * 0.1 = 1.6, infections = 1.6 * 0.8 / 11.6
        let infections = 1.28 / 11.6;
        assert_float_absolute_eq!(next.susceptible, 0.8 + 0.02 - infections, 1e-12);
        assert_float_absolute_eq!(next.infected, 0.1 + infections - 0.02, 1e-12);
        assert_float_absolute_eq!(next.resistant, 0.1, 1e-12);
    }

    #[test]
    fn no_infection_stays_clean() {
        let mut mf = MeanField::new(
            &ModelConfig::default(),
            Fractions {
                susceptible: 1.,
                infected: 0.,
                resistant: 0.,
            },
        );
        for f in mf.trajectory(50) {
            assert_eq!(f.infected, 0.);
            assert_eq!(f.susceptible, 1.);
        }
    }
}
