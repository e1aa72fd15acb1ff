//! Grid boundary derivation
//!
//! Turns a price-history sample into two grid configurations:
//!
//! - **aggressive**: bounded by the min/max close of the most recent
//!   [`AGGRESSIVE_WINDOW`] bars, so it hugs current price action;
//! - **conservative**: bounded by the lowest low and highest high of the
//!   whole history, so it survives wider swings.
//!
//! In both cases the limit price is pushed [`LIMIT_BUFFER`] outside the grid
//! on the side of the stance.

use super::errors::{GridError, GridResult};
use super::types::{GridStrategyConfig, GridTemplate, PriceBar, Stance};

/// Number of most recent closes used for the aggressive grid
pub const AGGRESSIVE_WINDOW: usize = 20;

/// Distance (quote currency) between the grid edge and the limit price
pub const LIMIT_BUFFER: f64 = 0.01;

pub const AGGRESSIVE_ID: &str = "aggressive_grid";
pub const CONSERVATIVE_ID: &str = "conservative_grid";

/// Price range of a grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridBounds {
    pub start_price: f64,
    pub end_price: f64,
}

impl GridBounds {
    /// Min/max close over the last [`AGGRESSIVE_WINDOW`] bars
    pub fn aggressive(bars: &[PriceBar]) -> GridResult<Self> {
        if bars.is_empty() {
            return Err(GridError::EmptyHistory);
        }
        if bars.len() < AGGRESSIVE_WINDOW {
            return Err(GridError::InsufficientHistory {
                required: AGGRESSIVE_WINDOW,
                got: bars.len(),
            });
        }

        let window = &bars[bars.len() - AGGRESSIVE_WINDOW..];
        Ok(Self {
            start_price: min_of(window.iter().map(|b| b.close)),
            end_price: max_of(window.iter().map(|b| b.close)),
        })
    }

    /// Lowest low / highest high over the whole history
    pub fn conservative(bars: &[PriceBar]) -> GridResult<Self> {
        if bars.is_empty() {
            return Err(GridError::EmptyHistory);
        }

        Ok(Self {
            start_price: min_of(bars.iter().map(|b| b.low)),
            end_price: max_of(bars.iter().map(|b| b.high)),
        })
    }

    pub fn limit_price(&self, stance: Stance) -> f64 {
        stance.limit_price(self.start_price, self.end_price, LIMIT_BUFFER)
    }

    fn into_config(
        self,
        id: &str,
        trading_pair: &str,
        stance: Stance,
        template: &GridTemplate,
    ) -> GridStrategyConfig {
        GridStrategyConfig::from_template(
            id,
            trading_pair,
            stance,
            self.start_price,
            self.end_price,
            self.limit_price(stance),
            template,
        )
    }
}

fn min_of(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::INFINITY, f64::min)
}

fn max_of(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::NEG_INFINITY, f64::max)
}

/// The two synthesized configurations, deployed together
#[derive(Debug, Clone, PartialEq)]
pub struct GridPair {
    pub aggressive: GridStrategyConfig,
    pub conservative: GridStrategyConfig,
}

impl GridPair {
    /// Configs in deployment order (aggressive first)
    pub fn configs(&self) -> [&GridStrategyConfig; 2] {
        [&self.aggressive, &self.conservative]
    }

    pub fn ids(&self) -> Vec<String> {
        self.configs().iter().map(|c| c.id.clone()).collect()
    }
}

/// Derive the aggressive and conservative grids from `bars` (oldest first)
///
/// Fails with [`GridError::EmptyHistory`] for an empty history and with
/// [`GridError::InsufficientHistory`] when fewer than [`AGGRESSIVE_WINDOW`]
/// bars are supplied. No other validation is done.
pub fn synthesize(
    bars: &[PriceBar],
    trading_pair: &str,
    aggressive: Stance,
    conservative: Stance,
    template: &GridTemplate,
) -> GridResult<GridPair> {
    let aggressive_bounds = GridBounds::aggressive(bars)?;
    let conservative_bounds = GridBounds::conservative(bars)?;

    Ok(GridPair {
        aggressive: aggressive_bounds.into_config(
            AGGRESSIVE_ID,
            trading_pair,
            aggressive,
            template,
        ),
        conservative: conservative_bounds.into_config(
            CONSERVATIVE_ID,
            trading_pair,
            conservative,
            template,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 25 bars; the last 20 closes span exactly [100, 110], older bars reach further.
    fn sample_history() -> Vec<PriceBar> {
        let mut bars = vec![
            PriceBar::new(130.0, 90.0, 95.0),
            PriceBar::new(125.0, 92.0, 120.0),
            PriceBar::new(121.0, 94.0, 96.0),
            PriceBar::new(119.0, 95.0, 118.0),
            PriceBar::new(117.0, 96.0, 97.0),
        ];
        for i in 0..20 {
            let close = 100.0 + (i % 11) as f64;
            bars.push(PriceBar::new(close + 1.5, close - 1.5, close));
        }
        bars
    }

    #[test]
    fn test_aggressive_long_scenario() {
        let bars = sample_history();
        let template = GridTemplate::default();
        let pair = synthesize(&bars, "ERA-USDT", Stance::Long, Stance::Short, &template).unwrap();

        let value = serde_json::to_value(&pair.aggressive).unwrap();
        assert_eq!(value["id"], "aggressive_grid");
        assert_eq!(value["start_price"], "100.000000");
        assert_eq!(value["end_price"], "110.000000");
        assert_eq!(value["limit_price"], "99.990000");
    }

    #[test]
    fn test_conservative_uses_all_lows_and_highs() {
        let bars = sample_history();
        let template = GridTemplate::default();
        let pair = synthesize(&bars, "ERA-USDT", Stance::Long, Stance::Short, &template).unwrap();

        assert_eq!(pair.conservative.id, "conservative_grid");
        assert_eq!(pair.conservative.start_price, 90.0);
        assert_eq!(pair.conservative.end_price, 130.0);
        assert!((pair.conservative.limit_price - 130.01).abs() < 1e-9);
        assert_eq!(pair.conservative.side, Stance::Short);
    }

    #[test]
    fn test_conservative_bounds_any_length() {
        let bars = vec![PriceBar::new(5.0, 3.0, 4.0)];
        let bounds = GridBounds::conservative(&bars).unwrap();
        assert_eq!(bounds.start_price, 3.0);
        assert_eq!(bounds.end_price, 5.0);

        let bars = vec![
            PriceBar::new(5.0, 3.0, 4.0),
            PriceBar::new(8.0, 2.5, 7.0),
            PriceBar::new(6.0, 4.0, 5.0),
        ];
        let bounds = GridBounds::conservative(&bars).unwrap();
        assert_eq!(bounds.start_price, 2.5);
        assert_eq!(bounds.end_price, 8.0);
    }

    #[test]
    fn test_empty_history() {
        let template = GridTemplate::default();
        let result = synthesize(&[], "ERA-USDT", Stance::Long, Stance::Short, &template);
        assert_eq!(result, Err(GridError::EmptyHistory));
    }

    #[test]
    fn test_insufficient_history() {
        let bars: Vec<PriceBar> = (0..19)
            .map(|i| PriceBar::new(i as f64 + 1.0, i as f64, i as f64))
            .collect();
        let template = GridTemplate::default();
        let result = synthesize(&bars, "ERA-USDT", Stance::Long, Stance::Short, &template);
        assert_eq!(
            result,
            Err(GridError::InsufficientHistory {
                required: 20,
                got: 19
            })
        );
    }

    #[test]
    fn test_exactly_twenty_bars() {
        let bars: Vec<PriceBar> = (0..20)
            .map(|i| {
                let close = 50.0 + i as f64;
                PriceBar::new(close + 2.0, close - 2.0, close)
            })
            .collect();
        let template = GridTemplate::default();
        let pair = synthesize(&bars, "BTC-USDT", Stance::Short, Stance::Long, &template).unwrap();

        assert_eq!(pair.aggressive.start_price, 50.0);
        assert_eq!(pair.aggressive.end_price, 69.0);
        assert!((pair.aggressive.limit_price - 69.01).abs() < 1e-9);
        assert!((pair.conservative.limit_price - 47.99).abs() < 1e-9);
    }

    #[test]
    fn test_limit_outside_grid_for_both_stances() {
        let bars = sample_history();
        let template = GridTemplate::default();
        for (aggressive, conservative) in [
            (Stance::Long, Stance::Long),
            (Stance::Long, Stance::Short),
            (Stance::Short, Stance::Long),
            (Stance::Short, Stance::Short),
        ] {
            let pair = synthesize(&bars, "ERA-USDT", aggressive, conservative, &template).unwrap();
            for config in pair.configs() {
                assert!(config.start_price <= config.end_price);
                assert!(config.limit_outside_grid(), "{:?}", config);
            }
        }
    }

    #[test]
    fn test_pair_shares_template() {
        let template = GridTemplate {
            leverage: 10,
            ..GridTemplate::default()
        };
        let pair = synthesize(&sample_history(), "ERA-USDT", Stance::Long, Stance::Short, &template)
            .unwrap();

        assert_eq!(pair.aggressive.template, template);
        assert_eq!(pair.conservative.template, template);
        assert_eq!(pair.ids(), vec!["aggressive_grid", "conservative_grid"]);
    }
}
