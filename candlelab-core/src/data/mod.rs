//! Quote ingestion into bars

pub mod aggregate;

pub use aggregate::{
    aggregate_quotes, aggregate_quotes_with, AggregateError, Aggregation, BarInterval,
    MalformedPolicy, SkippedQuote,
};
