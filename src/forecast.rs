//! Forecasting utilities for the simulator.

/// Hours of outdoor temperature attached to every step.
pub const FORECAST_HORIZON: usize = 24;

/// Perfect-foresight forecaster.
///
/// Reads the future straight from the recorded series. When the series
/// ends early the last available value is held for the remaining hours.
#[derive(Debug, Default, Clone, Copy)]
pub struct PerfectForecast;

impl PerfectForecast {
    /// Forecast `horizon` values of `series` starting at `start`.
    ///
    /// # Returns
    ///
    /// A vector of forecast values with length equal to `horizon`
    /// (empty if `series` is empty).
    pub fn forecast(&self, series: &[f64], start: usize, horizon: usize) -> Vec<f64> {
        let Some(&last) = series.last() else {
            return Vec::new();
        };

        let available = series.get(start..).unwrap_or(&[]);
        let mut forecast: Vec<f64> = available.iter().take(horizon).copied().collect();
        forecast.resize(horizon, last);
        forecast
    }
}
