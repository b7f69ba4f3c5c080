//! Post-hoc episode summary computed from step records.

use std::fmt;

use serde::Serialize;

use super::types::StepRecord;

/// Aggregate indicators for one episode.
///
/// Computed post-hoc from the recorded `StepRecord`s so the summary always
/// agrees with the per-step data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EpisodeSummary {
    /// Number of settled hours.
    pub steps: usize,
    /// Sum of normalized step rewards.
    pub total_reward: f64,
    /// Energy exported to the grid.
    pub energy_sold: f64,
    /// Energy imported from the grid.
    pub energy_bought: f64,
    /// Energy moved into and out of the battery.
    pub battery_throughput: f64,
    /// Largest hourly demand (loads plus TCLs).
    pub peak_demand: f64,
    /// Mean TCL SoC over all hours and units.
    pub mean_tcl_soc: f64,
    /// Hours that ended with no deferred load pending.
    pub deferral_free_hours: usize,
    /// Hours in which the high-price cap forced the neutral tier.
    pub capped_hours: usize,
}

impl EpisodeSummary {
    /// Computes the summary from an episode's records.
    ///
    /// # Arguments
    ///
    /// * `records` - Settled hours in order
    ///
    /// # Returns
    ///
    /// A zeroed summary for an empty slice.
    pub fn from_records(records: &[StepRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            steps: records.len(),
            ..Self::default()
        };
        let mut soc_sum = 0.0;
        let mut soc_count = 0usize;

        for r in records {
            summary.total_reward += r.reward;
            summary.energy_sold += r.energy_sold;
            summary.energy_bought += r.energy_bought;
            summary.battery_throughput += r.battery_charged + r.battery_discharged;
            summary.peak_demand = summary.peak_demand.max(r.total_consumption());
            soc_sum += r.tcl_socs.iter().sum::<f64>();
            soc_count += r.tcl_socs.len();
            if r.pending_deferrals == 0 {
                summary.deferral_free_hours += 1;
            }
            if r.effective_price_tier != r.action.price_tier() {
                summary.capped_hours += 1;
            }
        }

        if soc_count > 0 {
            summary.mean_tcl_soc = soc_sum / soc_count as f64;
        }
        summary
    }
}

impl fmt::Display for EpisodeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Episode Summary ---")?;
        writeln!(f, "Steps:                 {}", self.steps)?;
        writeln!(f, "Total reward:          {:.4}", self.total_reward)?;
        writeln!(f, "Energy sold:           {:.2}", self.energy_sold)?;
        writeln!(f, "Energy bought:         {:.2}", self.energy_bought)?;
        writeln!(f, "Battery throughput:    {:.2}", self.battery_throughput)?;
        writeln!(f, "Peak demand:           {:.2}", self.peak_demand)?;
        writeln!(f, "Mean TCL SoC:          {:.3}", self.mean_tcl_soc)?;
        writeln!(
            f,
            "Deferral-free hours:   {}/{}",
            self.deferral_free_hours, self.steps
        )?;
        write!(f, "Price-capped hours:    {}", self.capped_hours)
    }
}
