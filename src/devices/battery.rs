use serde::Serialize;

/// Aggregated battery energy storage on the microgrid bus.
///
/// `Battery` stores energy offered by the settlement step and returns it
/// on demand, with separate charge and discharge efficiencies and a
/// per-hour cap on both directions.
///
/// # Energy Convention
/// - `charge(E)` takes energy *from* the bus and returns what it rejected
/// - `supply(E)` delivers energy *to* the bus after discharge losses
#[derive(Debug, Clone, Serialize)]
pub struct Battery {
    /// Full-charge capacity.
    pub capacity: f64,

    /// Discharge efficiency applied to energy leaving the battery.
    pub use_d: f64,

    /// Exponential self-discharge rate per hour.
    pub dissipation: f64,

    /// Charge efficiency applied to the capped charging input.
    pub rate_c: f64,

    /// Maximum energy drawn from storage per hour.
    pub max_dd: f64,

    /// Maximum charging input per hour.
    pub charge_e: f64,

    /// Remaining charge, kept in `[0, capacity]`.
    rc: f64,
}

impl Battery {
    /// Creates an empty battery.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Full-charge capacity (must be > 0)
    /// * `use_d` - Discharge efficiency (0..=1.0)
    /// * `dissipation` - Self-discharge rate (>= 0)
    /// * `rate_c` - Charge efficiency (0..=1.0)
    /// * `max_dd` - Maximum draw per hour (>= 0)
    /// * `charge_e` - Maximum charging input per hour (>= 0)
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero/negative, efficiencies are outside
    /// `(0, 1]`, or any limit is negative.
    pub fn new(
        capacity: f64,
        use_d: f64,
        dissipation: f64,
        rate_c: f64,
        max_dd: f64,
        charge_e: f64,
    ) -> Self {
        assert!(capacity > 0.0);
        assert!(use_d > 0.0 && use_d <= 1.0);
        assert!(rate_c > 0.0 && rate_c <= 1.0);
        assert!(dissipation >= 0.0 && max_dd >= 0.0 && charge_e >= 0.0);

        Self {
            capacity,
            use_d,
            dissipation,
            rate_c,
            max_dd,
            charge_e,
            rc: 0.0,
        }
    }

    /// Offers `energy` to the battery and returns the part it rejects.
    ///
    /// Only the first `charge_e` of the offer is efficiency-scaled and
    /// stored. Anything above `charge_e`, plus whatever would overfill the
    /// battery, comes back to the caller.
    pub fn charge(&mut self, energy: f64) -> f64 {
        if self.rc >= self.capacity {
            return energy;
        }

        self.rc += self.rate_c * energy.min(self.charge_e);
        let leftover = self.rc - self.capacity + (energy - self.charge_e).max(0.0);
        self.rc = self.rc.min(self.capacity);
        leftover.max(0.0)
    }

    /// Draws up to `energy` from storage and returns what reaches the bus.
    ///
    /// The draw is limited by the remaining charge and `max_dd`; the
    /// discharge efficiency is applied to the delivered amount only.
    pub fn supply(&mut self, energy: f64) -> f64 {
        let drawn = energy.min(self.rc).min(self.max_dd);
        self.rc = (self.rc - drawn).max(0.0);
        drawn * self.use_d
    }

    /// Applies one hour of exponential self-discharge.
    pub fn dissipate(&mut self) {
        self.rc *= (-self.dissipation).exp();
    }

    /// Remaining charge.
    pub fn remaining_charge(&self) -> f64 {
        self.rc
    }

    /// Stored energy as a fraction of capacity.
    pub fn soc(&self) -> f64 {
        self.rc / self.capacity
    }
}
