//! Line charts of reduced signal tables, one SVG per non-empty table.

pub mod chart;
pub mod style;

pub use chart::{render_svg, write_chart, ChartSpec, VizError, VizResult};
pub use style::{palette_for, BUS_PALETTE, DEFAULT_PALETTE, GEN_PALETTE};
