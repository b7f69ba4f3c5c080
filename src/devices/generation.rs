use std::sync::Arc;

/// Renewable generation feeding the microgrid bus.
///
/// `GenerationSource` replays a pre-scaled hourly series addressed by
/// absolute hour (`day * 24 + hour`). Scaling and unit conversion happen
/// when the series is loaded, never here.
#[derive(Debug, Clone)]
pub struct GenerationSource {
    power: Arc<[f64]>,
}

impl GenerationSource {
    /// Wraps an hourly generation series.
    pub fn new(power: Arc<[f64]>) -> Self {
        Self { power }
    }

    /// Energy generated during `absolute_hour`.
    ///
    /// # Panics
    ///
    /// Panics if `absolute_hour` is past the end of the series. The
    /// simulator validates its horizon on construction and reset so this
    /// cannot happen through its API.
    pub fn current_generation(&self, absolute_hour: usize) -> f64 {
        self.power[absolute_hour]
    }

    /// The 24 readings of `day`.
    pub fn day_window(&self, day: usize) -> &[f64] {
        &self.power[day * 24..day * 24 + 24]
    }

    pub fn len(&self) -> usize {
        self.power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }
}
