use serde::{Deserialize, Serialize};

/// Per-unit thermal coefficients of one thermostatically controlled load.
///
/// Sampled once when the fleet is built and reused on every episode reset,
/// together with the unit's initial temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalParams {
    /// Coupling between indoor air and outdoor temperature.
    pub ca: f64,
    /// Coupling between indoor air and thermal mass.
    pub cm: f64,
    /// Constant heat gain per half-step.
    pub q: f64,
    /// Rated power drawn (and heat injected) while the unit is on.
    pub power: f64,
    /// Indoor and mass temperature at the start of every episode.
    pub initial_temp: f64,
}

/// A single thermostatically controlled load (TCL).
///
/// Tracks indoor temperature `t` and thermal-mass temperature `tm` and
/// applies a hysteresis backup controller that overrides dispatch
/// commands at the edges of the comfort band `[t_min, t_max]`.
#[derive(Debug, Clone)]
pub struct ThermalUnit {
    params: ThermalParams,
    /// Lower edge of the comfort band.
    pub t_min: f64,
    /// Upper edge of the comfort band.
    pub t_max: f64,
    /// Indoor temperature.
    pub t: f64,
    /// Thermal-mass temperature.
    pub tm: f64,
    u: u8,
}

impl ThermalUnit {
    /// Creates a unit at its initial temperature with the heater off.
    ///
    /// # Panics
    ///
    /// Panics if the comfort band is empty (`t_min >= t_max`).
    pub fn new(params: ThermalParams, t_min: f64, t_max: f64) -> Self {
        assert!(t_min < t_max, "comfort band must be non-empty");
        Self {
            params,
            t_min,
            t_max,
            t: params.initial_temp,
            tm: params.initial_temp,
            u: 0,
        }
    }

    /// Applies a dispatch command through the hysteresis backup controller.
    ///
    /// Below the comfort floor the unit is forced on, at or above the
    /// ceiling it is forced off, and in between the command is obeyed.
    pub fn control(&mut self, commanded: bool) {
        self.u = if self.t < self.t_min {
            1
        } else if self.t < self.t_max {
            u8::from(commanded)
        } else {
            0
        };
    }

    /// Advances the two-node RC model by one hour (two half-steps).
    ///
    /// The second half-step is skipped once the indoor temperature reaches
    /// the ceiling. `u` is held fixed for the whole update.
    pub fn update_state(&mut self, outdoor_temp: f64) {
        let p = &self.params;
        let heat = p.power * f64::from(self.u);
        for _ in 0..2 {
            self.t += p.ca * (outdoor_temp - self.t) + p.cm * (self.tm - self.t) + heat + p.q;
            self.tm += p.cm * (self.t - self.tm);
            if self.t >= self.t_max {
                break;
            }
        }
    }

    /// Position of the indoor temperature within the comfort band.
    ///
    /// Not clamped: values below 0 or above 1 mean the unit is outside
    /// its band.
    pub fn soc(&self) -> f64 {
        (self.t - self.t_min) / (self.t_max - self.t_min)
    }

    /// Last realized control bit.
    pub fn u(&self) -> u8 {
        self.u
    }

    /// Power drawn in the current hour (`u * P`).
    pub fn consumption(&self) -> f64 {
        f64::from(self.u) * self.params.power
    }

    pub fn params(&self) -> &ThermalParams {
        &self.params
    }
}
