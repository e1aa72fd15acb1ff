//! Grid config synthesis
//!
//! Derives an aggressive and a conservative grid-strike configuration from a
//! recent price history. Everything in here is pure: no I/O, no logging.
//!
//! - [`types`] - price bars, stance and the controller config shape
//! - [`synth`] - boundary derivation and config construction
//! - [`errors`] - synthesis error types
//!
//! # Example Usage
//!
//! ```rust
//! use grid_deployer::grid::{synthesize, GridTemplate, PriceBar, Stance};
//!
//! let bars: Vec<PriceBar> = (0..30)
//!     .map(|i| PriceBar::new(101.0 + i as f64, 99.0 + i as f64, 100.0 + i as f64))
//!     .collect();
//!
//! let template = GridTemplate::default();
//! let pair = synthesize(&bars, "ERA-USDT", Stance::Long, Stance::Short, &template)?;
//! assert!(pair.aggressive.limit_price < pair.aggressive.start_price);
//! assert!(pair.conservative.limit_price > pair.conservative.end_price);
//! # Ok::<(), grid_deployer::grid::GridError>(())
//! ```

pub mod errors;
pub mod synth;
pub mod types;

pub use errors::{GridError, GridResult};
pub use synth::{
    synthesize, GridBounds, GridPair, AGGRESSIVE_ID, AGGRESSIVE_WINDOW, CONSERVATIVE_ID,
    LIMIT_BUFFER,
};
pub use types::{
    format_price, GridStrategyConfig, GridTemplate, PositionMode, PriceBar, Stance,
    TrailingStop, TripleBarrierConfig,
};
