use crate::text::render_text_pixmap;
use ab_glyph::Font;
use anyhow::{Context, Result, anyhow};
use std::path::Path;
use tiny_skia::{
    Color, LineCap, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};

/// Bar colours cycled over series
#[derive(Debug, Clone)]
pub struct Palette(pub Vec<[u8; 4]>);

impl Default for Palette {
    fn default() -> Self {
        // blue, green, red, cyan
        Palette(vec![
            [0, 0, 255, 255],
            [0, 128, 0, 255],
            [255, 0, 0, 255],
            [0, 191, 191, 255],
        ])
    }
}

impl Palette {
    fn color(&self, index: usize) -> [u8; 4] {
        if self.0.is_empty() {
            return [128, 128, 128, 255];
        }
        self.0[index % self.0.len()]
    }
}

/// One group member drawn at every category, e.g. a cohort across tau values
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    /// `(mean, error)` per category; `None` leaves a gap
    pub values: Vec<Option<(f64, f64)>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupedBars {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

impl GroupedBars {
    /// Largest `mean + error` over all plotted bars
    fn y_extent(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().flatten())
            .map(|&(mean, err)| mean + err.max(0.0))
            .fold(0.0, f64::max)
    }
}

struct PlotArea {
    left: f32,
    top: f32,
    width: f32,
    height: f32,
    y_max: f64,
}

impl PlotArea {
    fn y(&self, value: f64) -> f32 {
        let frac = (value / self.y_max).clamp(0.0, 1.0) as f32;
        self.top + self.height * (1.0 - frac)
    }

    fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Renders grouped bars with symmetric error bars onto a white canvas
pub struct BarChartRenderer<F: Font> {
    width: u32,
    height: u32,
    font: Option<F>,
    palette: Palette,
    bar_width: f32,
    cap_px: f32,
}

impl<F: Font> BarChartRenderer<F> {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            font: None,
            palette: Palette::default(),
            bar_width: 0.2,
            cap_px: 5.0,
        }
    }

    /// Without a font the chart is drawn without any text.
    pub fn with_font(mut self, font: F) -> Self {
        self.font = Some(font);
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn render(&self, chart: &GroupedBars) -> Result<Pixmap> {
        let mut canvas = Pixmap::new(self.width, self.height)
            .ok_or_else(|| anyhow!("invalid canvas size {}x{}", self.width, self.height))?;
        canvas.fill(Color::WHITE);

        let area = PlotArea {
            left: 80.0,
            top: 60.0,
            width: (self.width as f32 - 80.0 - 220.0).max(1.0),
            height: (self.height as f32 - 60.0 - 70.0).max(1.0),
            y_max: (chart.y_extent() * 1.1).max(1.0),
        };

        self.draw_axes(&mut canvas, &area, chart);
        self.draw_bars(&mut canvas, &area, chart);
        self.draw_legend(&mut canvas, &area, chart);
        Ok(canvas)
    }

    fn draw_axes(&self, canvas: &mut Pixmap, area: &PlotArea, chart: &GroupedBars) {
        let black = [0, 0, 0, 255];
        let grey = [200, 200, 200, 255];

        let ticks = 5;
        for i in 0..=ticks {
            let value = area.y_max * i as f64 / ticks as f64;
            let y = area.y(value);
            if i > 0 {
                stroke_line(canvas, (area.left, y), (area.left + area.width, y), 1.0, grey);
            }
            self.draw_text(canvas, &format!("{:.1}", value), 14.0, (area.left - 8.0, y), Anchor::Right);
        }

        stroke_line(canvas, (area.left, area.top), (area.left, area.bottom()), 1.5, black);
        stroke_line(
            canvas,
            (area.left, area.bottom()),
            (area.left + area.width, area.bottom()),
            1.5,
            black,
        );

        let slot = slot_width(area, chart);
        for (i, category) in chart.categories.iter().enumerate() {
            let x = area.left + slot * (i as f32 + 0.5);
            stroke_line(canvas, (x, area.bottom()), (x, area.bottom() + 5.0), 1.0, black);
            self.draw_text(canvas, category, 14.0, (x, area.bottom() + 18.0), Anchor::Center);
        }

        let mid_x = area.left + area.width / 2.0;
        self.draw_text(canvas, &chart.title, 20.0, (mid_x, area.top / 2.0), Anchor::Center);
        self.draw_text(canvas, &chart.x_label, 16.0, (mid_x, area.bottom() + 45.0), Anchor::Center);
        self.draw_text(canvas, &chart.y_label, 16.0, (area.left, area.top - 14.0), Anchor::Left);
    }

    fn draw_bars(&self, canvas: &mut Pixmap, area: &PlotArea, chart: &GroupedBars) {
        let slot = slot_width(area, chart);
        let bar_px = slot * self.bar_width;
        let k = chart.series.len() as f32;

        for (idx, series) in chart.series.iter().enumerate() {
            let color = self.palette.color(idx);
            // offsets of -1.5, -0.5, 0.5, 1.5 bar widths for four series
            let offset = (idx as f32 - (k - 1.0) / 2.0) * bar_px;

            for (cat, value) in series.values.iter().enumerate().take(chart.categories.len()) {
                let Some((mean, err)) = *value else {
                    continue;
                };
                let cx = area.left + slot * (cat as f32 + 0.5) + offset;
                let top = area.y(mean);
                if let Some(rect) = Rect::from_ltrb(cx - bar_px / 2.0, top, cx + bar_px / 2.0, area.bottom()) {
                    let mut paint = Paint::default();
                    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
                    paint.anti_alias = true;
                    canvas.fill_rect(rect, &paint, Transform::identity(), None);
                }

                if err > 0.0 {
                    let black = [0, 0, 0, 255];
                    let hi = area.y(mean + err);
                    let lo = area.y(mean - err);
                    stroke_line(canvas, (cx, hi), (cx, lo), 1.5, black);
                    stroke_line(canvas, (cx - self.cap_px, hi), (cx + self.cap_px, hi), 1.5, black);
                    stroke_line(canvas, (cx - self.cap_px, lo), (cx + self.cap_px, lo), 1.5, black);
                }
            }
        }
    }

    fn draw_legend(&self, canvas: &mut Pixmap, area: &PlotArea, chart: &GroupedBars) {
        let x = area.left + area.width + 20.0;
        for (idx, series) in chart.series.iter().enumerate() {
            let y = area.top + 10.0 + idx as f32 * 26.0;
            let color = self.palette.color(idx);
            if let Some(rect) = Rect::from_xywh(x, y, 16.0, 16.0) {
                let mut paint = Paint::default();
                paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
                canvas.fill_rect(rect, &paint, Transform::identity(), None);
            }
            self.draw_text(canvas, &series.name, 14.0, (x + 24.0, y + 8.0), Anchor::Left);
        }
    }

    fn draw_text(&self, canvas: &mut Pixmap, text: &str, size: f32, at: (f32, f32), anchor: Anchor) {
        let Some(font) = &self.font else {
            return;
        };
        let Some(pm) = render_text_pixmap(text, size, font, Color::BLACK) else {
            return;
        };
        let w = pm.width() as f32;
        let x = match anchor {
            Anchor::Left => at.0,
            Anchor::Center => at.0 - w / 2.0,
            Anchor::Right => at.0 - w,
        };
        let y = at.1 - pm.height() as f32 / 2.0;
        canvas.draw_pixmap(
            x.round() as i32,
            y.round() as i32,
            pm.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
}

#[derive(Debug, Clone, Copy)]
enum Anchor {
    Left,
    Center,
    Right,
}

fn slot_width(area: &PlotArea, chart: &GroupedBars) -> f32 {
    area.width / chart.categories.len().max(1) as f32
}

fn stroke_line(canvas: &mut Pixmap, from: (f32, f32), to: (f32, f32), width: f32, color: [u8; 4]) {
    let mut pb = PathBuilder::new();
    pb.move_to(from.0, from.1);
    pb.line_to(to.0, to.1);
    let Some(path) = pb.finish() else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;
    let stroke = Stroke {
        width,
        line_cap: LineCap::Butt,
        ..Stroke::default()
    };
    canvas.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

pub fn save_png(pixmap: &Pixmap, path: &Path) -> Result<()> {
    pixmap
        .save_png(path)
        .with_context(|| format!("writing chart to {}", path.display()))
}
