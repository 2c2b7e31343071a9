//! Output dispatch: choosing and applying a display strategy.

mod materialize;
mod strategy;

pub use materialize::{materialize, RenderTarget};
pub use strategy::{render, DisplayStrategy, StrategyKind};
