//! Core data types for grid config synthesis

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Render a price as a fixed-point string with exactly 6 fractional digits
pub fn format_price(price: f64) -> String {
    format!("{:.6}", price)
}

/// Serde adapter storing an `f64` price as a 6-decimal string
pub mod fixed6 {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(price: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_price(*price))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<f64>().map_err(de::Error::custom)
    }
}

/// One historical candle, oldest first when part of a history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Candle open time in unix seconds, when the service provides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PriceBar {
    pub fn new(high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp: None,
            high,
            low,
            close,
        }
    }

    /// Builder: attach the candle timestamp
    pub fn at(mut self, timestamp: f64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Directional stance of a grid
///
/// The wire encoding of the stance (1/2 or 1/-1) is chosen by the API layer,
/// see [`crate::api::SideEncoding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Long,
    Short,
}

impl Stance {
    /// Place the limit price `buffer` outside the grid on the side of the stance
    pub fn limit_price(&self, start_price: f64, end_price: f64, buffer: f64) -> f64 {
        match self {
            Stance::Long => start_price - buffer,
            Stance::Short => end_price + buffer,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stance::Long => "long",
            Stance::Short => "short",
        }
    }
}

impl std::fmt::Display for Stance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position mode on the derivatives connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionMode {
    Hedge,
    Oneway,
}

/// Trailing stop parameters of the barrier sub-structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingStop {
    pub activation_price: String,
    pub trailing_delta: String,
}

/// Take-profit / stop-loss / time-limit barriers applied to every grid order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripleBarrierConfig {
    pub open_order_type: u8,
    pub stop_loss: Option<String>,
    pub stop_loss_order_type: u8,
    pub take_profit: Option<String>,
    pub take_profit_order_type: u8,
    pub time_limit: Option<u64>,
    pub time_limit_order_type: u8,
    pub trailing_stop: Option<TrailingStop>,
}

impl Default for TripleBarrierConfig {
    fn default() -> Self {
        Self {
            open_order_type: 3,
            stop_loss: None,
            stop_loss_order_type: 1,
            // 0.08%
            take_profit: Some("0.0008".into()),
            take_profit_order_type: 3,
            time_limit: None,
            time_limit_order_type: 1,
            trailing_stop: None,
        }
    }
}

/// Operational parameters shared by every synthesized grid
///
/// Defaults carry the fixed grid-strike template: 50x leverage, hedge mode,
/// $1000 quote budget and a 0.08% take-profit with no stop-loss or time limit.
/// Any field can be overridden from the `[template]` settings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridTemplate {
    pub controller_name: String,
    pub controller_type: String,
    pub connector_name: String,
    pub total_amount_quote: String,
    pub manual_kill_switch: bool,
    pub candles_config: Vec<Value>,
    pub initial_positions: Vec<Value>,
    pub leverage: u32,
    pub position_mode: PositionMode,
    pub min_spread_between_orders: String,
    pub min_order_amount_quote: String,
    pub max_open_orders: u32,
    pub max_orders_per_batch: u32,
    pub order_frequency: u32,
    pub activation_bounds: f64,
    pub keep_position: bool,
    pub triple_barrier_config: TripleBarrierConfig,
}

impl Default for GridTemplate {
    fn default() -> Self {
        Self {
            controller_name: "grid_strike".into(),
            controller_type: "generic".into(),
            connector_name: "binance_perpetual".into(),
            total_amount_quote: "1000".into(),
            manual_kill_switch: false,
            candles_config: Vec::new(),
            initial_positions: Vec::new(),
            leverage: 50,
            position_mode: PositionMode::Hedge,
            min_spread_between_orders: "0.001".into(),
            min_order_amount_quote: "5".into(),
            max_open_orders: 3,
            max_orders_per_batch: 1,
            order_frequency: 3,
            activation_bounds: 0.002,
            keep_position: false,
            triple_barrier_config: TripleBarrierConfig::default(),
        }
    }
}

/// A complete grid-strike controller configuration for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridStrategyConfig {
    pub id: String,
    pub trading_pair: String,
    pub side: Stance,
    #[serde(with = "fixed6")]
    pub start_price: f64,
    #[serde(with = "fixed6")]
    pub end_price: f64,
    #[serde(with = "fixed6")]
    pub limit_price: f64,
    #[serde(flatten)]
    pub template: GridTemplate,
}

impl GridStrategyConfig {
    /// Build a config from the shared template and derived bounds
    pub fn from_template(
        id: impl Into<String>,
        trading_pair: impl Into<String>,
        side: Stance,
        start_price: f64,
        end_price: f64,
        limit_price: f64,
        template: &GridTemplate,
    ) -> Self {
        Self {
            id: id.into(),
            trading_pair: trading_pair.into(),
            side,
            start_price,
            end_price,
            limit_price,
            template: template.clone(),
        }
    }

    pub fn connector_name(&self) -> &str {
        &self.template.connector_name
    }

    /// Whether the limit price sits strictly outside the grid on the stance side
    pub fn limit_outside_grid(&self) -> bool {
        match self.side {
            Stance::Long => self.limit_price < self.start_price,
            Stance::Short => self.limit_price > self.end_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price_six_digits() {
        assert_eq!(format_price(100.0), "100.000000");
        assert_eq!(format_price(99.99), "99.990000");
        assert_eq!(format_price(0.000123456789), "0.000123");
        assert_eq!(format_price(-1.5), "-1.500000");
        assert_eq!(format_price(123456789.0), "123456789.000000");
    }

    #[test]
    fn test_format_price_always_six_fraction_digits() {
        for price in [0.0, 1e-9, 0.5, -0.25, 42.4242424242, 1e12, -987654.321] {
            let formatted = format_price(price);
            let (_, fraction) = formatted.split_once('.').unwrap();
            assert_eq!(fraction.len(), 6, "bad fraction for {}", formatted);
        }
    }

    #[test]
    fn test_stance_limit_price() {
        assert!((Stance::Long.limit_price(100.0, 110.0, 0.01) - 99.99).abs() < 1e-9);
        assert!((Stance::Short.limit_price(100.0, 110.0, 0.01) - 110.01).abs() < 1e-9);
    }

    #[test]
    fn test_config_serializes_prices_as_strings() {
        let config = GridStrategyConfig::from_template(
            "aggressive_grid",
            "ERA-USDT",
            Stance::Long,
            100.0,
            110.0,
            99.99,
            &GridTemplate::default(),
        );
        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(value["start_price"], "100.000000");
        assert_eq!(value["end_price"], "110.000000");
        assert_eq!(value["limit_price"], "99.990000");
        assert_eq!(value["leverage"], 50);
        assert_eq!(value["position_mode"], "HEDGE");
        assert_eq!(value["connector_name"], "binance_perpetual");
        assert_eq!(value["triple_barrier_config"]["take_profit"], "0.0008");
        assert!(value["triple_barrier_config"]["stop_loss"].is_null());
        assert!(value["triple_barrier_config"]["time_limit"].is_null());

        let back: GridStrategyConfig = serde_json::from_value(value).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_template_partial_override() {
        let template: GridTemplate =
            serde_json::from_str(r#"{"leverage": 20, "connector_name": "okx_perpetual"}"#).unwrap();
        assert_eq!(template.leverage, 20);
        assert_eq!(template.connector_name, "okx_perpetual");
        assert_eq!(template.max_open_orders, 3);
        assert_eq!(template.position_mode, PositionMode::Hedge);
    }
}
