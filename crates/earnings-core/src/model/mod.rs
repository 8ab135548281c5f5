//! Core value types shared across the pipeline

pub mod bar;
pub mod event;

pub use bar::{PriceBar, PriceSeries};
pub use event::EarningsEvent;
