//! Synthetic market data with diurnal shapes and correlated noise.
//!
//! Temperature and prices follow a daily sinusoid plus Gaussian noise.
//! Generation is wind-like: an AR(1) multiplier on a nominal output,
//! clamped to a plausible range.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

use super::MarketData;

const TEMP_MEAN_C: f64 = 2.0;
const TEMP_AMP_C: f64 = 4.0;
const TEMP_NOISE_C: f64 = 0.5;

const WIND_NOMINAL: f64 = 120.0;
const WIND_ALPHA: f64 = 0.85;
const WIND_NOISE_STD: f64 = 0.35;
/// Calm spell.
const WIND_MULTIPLIER_MIN: f64 = 0.05;
/// Storm output.
const WIND_MULTIPLIER_MAX: f64 = 1.8;

const PRICE_MEAN: f64 = 3.0;
const PRICE_AMP: f64 = 1.2;
const PRICE_NOISE: f64 = 0.3;
/// Export prices sit below import prices by this margin on average.
const SELL_DISCOUNT: f64 = 0.6;

/// Generates `days` days of hourly data from `seed`.
///
/// Identical `(days, seed)` pairs always produce identical series.
pub fn generate(days: usize, seed: u64) -> MarketData {
    let mut rng = StdRng::seed_from_u64(seed);
    let hours = days * 24;

    let mut temperatures = Vec::with_capacity(hours);
    let mut buy_prices = Vec::with_capacity(hours);
    let mut sell_prices = Vec::with_capacity(hours);
    let mut generation = Vec::with_capacity(hours);

    let mut wind = 1.0_f64;
    for h in 0..hours {
        let day_pos = (h % 24) as f64 / 24.0;

        // Coldest before dawn, warmest mid-afternoon.
        let temp_angle = 2.0 * PI * day_pos - 1.3 * PI;
        temperatures.push(TEMP_MEAN_C + TEMP_AMP_C * temp_angle.sin() + noise(&mut rng, TEMP_NOISE_C));

        // Morning and evening peaks.
        let price_shape = (4.0 * PI * day_pos - PI / 2.0).sin().max(0.0);
        let buy = PRICE_MEAN + PRICE_AMP * price_shape + noise(&mut rng, PRICE_NOISE);
        let spread: f64 = rng.random_range(0.5..1.5);
        buy_prices.push(buy);
        sell_prices.push(buy - SELL_DISCOUNT * spread);

        let epsilon = 1.0 + noise(&mut rng, WIND_NOISE_STD);
        wind = (WIND_ALPHA * wind + (1.0 - WIND_ALPHA) * epsilon)
            .clamp(WIND_MULTIPLIER_MIN, WIND_MULTIPLIER_MAX);
        generation.push(WIND_NOMINAL * wind);
    }

    MarketData::new(temperatures, buy_prices, sell_prices, generation)
}

fn noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    let z: f64 = StandardNormal.sample(rng);
    z * std_dev
}
