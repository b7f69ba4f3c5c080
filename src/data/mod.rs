//! Hourly input series consumed by the simulator.

/// Seeded synthetic series for demos and tests.
pub mod synthetic;

use std::sync::Arc;

use crate::config::DataConfig;
use crate::error::{Result, SimError};
use crate::io::series::read_series;

/// Outdoor temperature, grid prices and renewable generation, all indexed
/// by absolute hour (`day * 24 + hour`).
///
/// Series are shared behind `Arc` so the simulator, the price oracle and
/// the generation source can hold them without copying.
#[derive(Debug, Clone)]
pub struct MarketData {
    pub temperatures: Arc<[f64]>,
    pub buy_prices: Arc<[f64]>,
    pub sell_prices: Arc<[f64]>,
    pub generation: Arc<[f64]>,
}

impl MarketData {
    pub fn new(
        temperatures: Vec<f64>,
        buy_prices: Vec<f64>,
        sell_prices: Vec<f64>,
        generation: Vec<f64>,
    ) -> Self {
        Self {
            temperatures: Arc::from(temperatures),
            buy_prices: Arc::from(buy_prices),
            sell_prices: Arc::from(sell_prices),
            generation: Arc::from(generation),
        }
    }

    /// Hours covered by every series (the shortest one wins).
    pub fn hours(&self) -> usize {
        self.series()
            .iter()
            .map(|(_, s)| s.len())
            .min()
            .unwrap_or(0)
    }

    /// Checks that every series covers at least `required` hours.
    ///
    /// # Errors
    ///
    /// Returns `SimError::SeriesTooShort` naming the first short series.
    pub fn validate_horizon(&self, required: usize) -> Result<()> {
        for (name, series) in self.series() {
            if series.len() < required {
                return Err(SimError::SeriesTooShort {
                    series: name,
                    len: series.len(),
                    required,
                });
            }
        }
        Ok(())
    }

    /// Reads all four series from the CSV files named in `cfg`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Config` if no directory is configured, or the
    /// I/O, CSV or parse error of the first file that fails.
    pub fn from_csv_dir(cfg: &DataConfig) -> Result<Self> {
        let dir = cfg.dir.as_ref().ok_or_else(|| crate::config::ConfigError {
            field: "data.dir".to_string(),
            message: "no data directory configured".to_string(),
        })?;

        let temperatures = read_series(
            &dir.join(&cfg.temperatures_file),
            Some(cfg.temperature_column),
            true,
            1.0,
        )?;
        let buy_prices = read_series(&dir.join(&cfg.buy_prices_file), None, true, cfg.price_scale)?;
        let sell_prices =
            read_series(&dir.join(&cfg.sell_prices_file), None, true, cfg.price_scale)?;
        let generation = read_series(
            &dir.join(&cfg.generation_file),
            None,
            cfg.generation_has_header,
            cfg.generation_scale,
        )?;

        Ok(Self::new(temperatures, buy_prices, sell_prices, generation))
    }

    /// Loads series from disk when a directory is configured, otherwise
    /// generates `cfg.synthetic_days` of synthetic data from `seed`.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`MarketData::from_csv_dir`].
    pub fn load(cfg: &DataConfig, seed: u64) -> Result<Self> {
        if cfg.dir.is_some() {
            Self::from_csv_dir(cfg)
        } else {
            Ok(synthetic::generate(cfg.synthetic_days, seed))
        }
    }

    fn series(&self) -> [(&'static str, &Arc<[f64]>); 4] {
        [
            ("temperatures", &self.temperatures),
            ("buy_prices", &self.buy_prices),
            ("sell_prices", &self.sell_prices),
            ("generation", &self.generation),
        ]
    }
}
