use std::sync::Arc;

/// Wholesale grid connection with separate export and import prices.
///
/// Prices are hourly series addressed by absolute hour. The oracle keeps a
/// read cursor that the simulator moves at the start of every step; both
/// settlement functions price energy at the cursor.
#[derive(Debug, Clone)]
pub struct GridPriceOracle {
    sell_prices: Arc<[f64]>,
    buy_prices: Arc<[f64]>,
    export_transfer_price: f64,
    import_transfer_price: f64,
    time: usize,
}

impl GridPriceOracle {
    /// Creates an oracle with its cursor at hour 0.
    ///
    /// # Panics
    ///
    /// Panics if the two price series differ in length.
    pub fn new(
        sell_prices: Arc<[f64]>,
        buy_prices: Arc<[f64]>,
        export_transfer_price: f64,
        import_transfer_price: f64,
    ) -> Self {
        assert_eq!(sell_prices.len(), buy_prices.len());
        Self {
            sell_prices,
            buy_prices,
            export_transfer_price,
            import_transfer_price,
            time: 0,
        }
    }

    /// Moves the read cursor to `absolute_hour`.
    pub fn set_time(&mut self, absolute_hour: usize) {
        self.time = absolute_hour;
    }

    /// Current cursor position.
    pub fn time(&self) -> usize {
        self.time
    }

    /// Revenue for exporting `energy` at the cursor hour.
    pub fn sell(&self, energy: f64) -> f64 {
        (self.sell_prices[self.time] + self.export_transfer_price) * energy
    }

    /// Cost of importing `energy` at the cursor hour (non-positive for `energy >= 0`).
    pub fn buy(&self, energy: f64) -> f64 {
        -(self.buy_prices[self.time] + self.import_transfer_price) * energy
    }

    /// Raw export price at `absolute_hour`, without transfer fees.
    pub fn sell_price_at(&self, absolute_hour: usize) -> f64 {
        self.sell_prices[absolute_hour]
    }

    /// Raw import price at `absolute_hour`, without transfer fees.
    pub fn buy_price_at(&self, absolute_hour: usize) -> f64 {
        self.buy_prices[absolute_hour]
    }

    /// The 24 export prices of `day`.
    pub fn sell_day_window(&self, day: usize) -> &[f64] {
        &self.sell_prices[day * 24..day * 24 + 24]
    }

    /// The 24 import prices of `day`.
    pub fn buy_day_window(&self, day: usize) -> &[f64] {
        &self.buy_prices[day * 24..day * 24 + 24]
    }

    /// Number of hours covered by the price series.
    pub fn len(&self) -> usize {
        self.sell_prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sell_prices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oracle() -> GridPriceOracle {
        let sell: Vec<f64> = (0..48).map(|h| h as f64 * 0.1).collect();
        let buy: Vec<f64> = (0..48).map(|h| 1.0 + h as f64 * 0.1).collect();
        GridPriceOracle::new(Arc::from(sell), Arc::from(buy), 0.09, 0.97)
    }

    #[test]
    fn sell_uses_cursor_price_plus_export_fee() {
        let mut grid = oracle();
        grid.set_time(10);
        assert!((grid.sell(2.0) - (1.0 + 0.09) * 2.0).abs() < 1e-12);
    }

    #[test]
    fn buy_is_negative_cost() {
        let mut grid = oracle();
        grid.set_time(10);
        assert!((grid.buy(2.0) + (2.0 + 0.97) * 2.0).abs() < 1e-12);
        assert!(grid.buy(5.0) <= 0.0);
        assert_eq!(grid.buy(0.0), 0.0);
    }

    #[test]
    fn cursor_moves() {
        let mut grid = oracle();
        assert_eq!(grid.time(), 0);
        grid.set_time(25);
        assert_eq!(grid.time(), 25);
    }

    #[test]
    fn day_windows() {
        let grid = oracle();
        assert_eq!(grid.sell_day_window(1).len(), 24);
        assert!((grid.buy_day_window(1)[0] - 3.4).abs() < 1e-12);
    }

    #[test]
    #[should_panic]
    fn mismatched_series_panics() {
        GridPriceOracle::new(Arc::from(vec![0.0; 24]), Arc::from(vec![0.0; 23]), 0.0, 0.0);
    }
}
