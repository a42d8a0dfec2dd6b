//! Domain types for CandleLab

pub mod action;
pub mod bar;
pub mod quote;

pub use action::ActionSeries;
pub use bar::Bar;
pub use quote::{MalformedQuote, Quote, RawQuote};
