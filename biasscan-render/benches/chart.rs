use ab_glyph::FontVec;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use biasscan_render::{BarChartRenderer, GroupedBars, Series};

/// Four cohorts over six tau values, the usual sweep shape.
fn sweep_chart() -> GroupedBars {
    let categories: Vec<String> = (4..10).map(|t| t.to_string()).collect();
    let series = ["16p11.2 REV", "16p11.2 VAR", "WT REV", "WT VAR"]
        .iter()
        .enumerate()
        .map(|(i, name)| Series {
            name: name.to_string(),
            values: (0..categories.len())
                .map(|c| Some((40.0 - c as f64 * 4.0 + i as f64, 3.0)))
                .collect(),
        })
        .collect();
    GroupedBars {
        title: "Mean Bias Count".into(),
        x_label: "Tau".into(),
        y_label: "Mean Bias Count".into(),
        categories,
        series,
    }
}

pub fn bench_render_chart(c: &mut Criterion) {
    let mut g = c.benchmark_group("chart");
    g.sample_size(30);

    let chart = sweep_chart();
    let renderer = BarChartRenderer::<FontVec>::new(1400, 800);
    g.bench_function("grouped_bars_no_text", |b| {
        b.iter(|| renderer.render(black_box(&chart)))
    });

    g.finish();
}

criterion_group!(benches, bench_render_chart);
criterion_main!(benches);
