mod chart;
mod text;

pub use chart::{BarChartRenderer, GroupedBars, Palette, Series, save_png};
pub use text::{load_font, render_text_pixmap};
