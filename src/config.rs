use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cell::Tick;
use crate::error::{Result, SircaError};
use crate::simulation::ExecutionMode;

/// Parameters a [`Model`](crate::Model) is built from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Infectiousness of the initially seeded cells.
    pub infectiousness: f64,
    pub infection_duration: Tick,
    /// Infection load at which the infection probability is one half.
    pub h_inf: f64,
    pub resistance_duration: Tick,
    /// Probability for each cell to start out infected.
    pub seed_density: f64,
    pub width: usize,
    pub height: usize,
    pub torus: bool,
    /// `None` draws the seed from the operating system.
    pub seed: Option<u64>,
    pub execution: ExecutionMode,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            infectiousness: 2.0,
            infection_duration: 5,
            h_inf: 10.0,
            resistance_duration: 10,
            seed_density: 0.1,
            width: 100,
            height: 100,
            torus: true,
            seed: None,
            execution: ExecutionMode::Sequential,
        }
    }
}

impl ModelConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<ModelConfig> {
        let reader = BufReader::new(File::open(path)?);
        let config: ModelConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SircaError::config(format!(
                "grid must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width.checked_mul(self.height).is_none() {
            return Err(SircaError::config(format!(
                "grid of {}x{} cells does not fit in memory",
                self.width, self.height
            )));
        }
        if !self.infectiousness.is_finite() || self.infectiousness <= 0. {
            return Err(SircaError::config(format!(
                "infectiousness must be positive, got {}",
                self.infectiousness
            )));
        }
        if !self.h_inf.is_finite() || self.h_inf <= 0. {
            return Err(SircaError::config(format!(
                "h_inf must be positive, got {}",
                self.h_inf
            )));
        }
        if self.infection_duration == 0 {
            return Err(SircaError::config("infection duration must be positive"));
        }
        if self.resistance_duration == 0 {
            return Err(SircaError::config("resistance duration must be positive"));
        }
        if !(0.0..=1.0).contains(&self.seed_density) {
            return Err(SircaError::config(format!(
                "seed density must lie in [0, 1], got {}",
                self.seed_density
            )));
        }
        Ok(())
    }

    pub fn population(&self) -> usize {
        self.width * self.height
    }
}

impl Display for ModelConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "i:{} di:{} dr:{} h_inf:{} d:{} t:{} {}x{}",
            self.infectiousness,
            self.infection_duration,
            self.resistance_duration,
            self.h_inf,
            self.seed_density,
            self.torus,
            self.width,
            self.height
        )
    }
}
