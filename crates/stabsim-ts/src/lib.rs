//! Channel reduction: raw engine channels in, one time-indexed table per signal type out.

pub mod export;
pub mod reduce;
pub mod table;

pub use export::{write_csv, write_table};
pub use reduce::{parse_label, reduce_channels, ChannelReducer};
pub use table::{SignalColumn, SignalSet, SignalTable};
