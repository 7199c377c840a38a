use std::ops::RangeInclusive;

use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints};

use edu_dashboard::data::model::{Level, SchoolPerformanceRecord};

use crate::color::{self, level_color};
use crate::state::AppState;

const PLOT_HEIGHT: f32 = 280.0;

/// Axis formatter that prints category names at integer positions.
fn category_axis(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let v = mark.value;
        if v.fract().abs() > f64::EPSILON || v < 0.0 {
            return String::new();
        }
        labels.get(v as usize).cloned().unwrap_or_default()
    }
}

/// Year axis without thousands separators or fractions.
fn year_axis(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    if mark.value.fract().abs() > f64::EPSILON {
        String::new()
    } else {
        format!("{}", mark.value as i64)
    }
}

// ---------------------------------------------------------------------------
// Literacy
// ---------------------------------------------------------------------------

/// Mean overall literacy per year.
pub fn national_trend_plot(ui: &mut Ui, state: &AppState, accent: Color32) {
    let points: PlotPoints = state
        .views
        .national_trend
        .iter()
        .map(|p| [p.year as f64, p.value])
        .collect();

    Plot::new("national_trend")
        .height(PLOT_HEIGHT)
        .allow_scroll(false)
        .allow_drag(false)
        .x_axis_label("Year")
        .y_axis_label("Literacy Rate (%)")
        .x_axis_formatter(year_axis)
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).name("Overall").color(accent).width(3.0));
        });
}

/// Horizontal bars, one per selected province, lowest first.
pub fn province_bars(ui: &mut Ui, state: &AppState) {
    let rows = &state.views.provinces;
    let labels: Vec<String> = rows.iter().map(|p| p.province.clone()).collect();
    let bars: Vec<Bar> = rows
        .iter()
        .enumerate()
        .map(|(i, p)| {
            Bar::new(i as f64, p.overall_literacy)
                .name(&p.province)
                .fill(state.province_colors.color_for(&p.province))
                .width(0.7)
        })
        .collect();

    Plot::new("province_bars")
        .height(PLOT_HEIGHT)
        .allow_scroll(false)
        .allow_drag(false)
        .x_axis_label("Overall Literacy (%)")
        .y_axis_formatter(category_axis(labels))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal());
        });
}

/// Male vs female national averages over time.
pub fn gender_gap_plot(ui: &mut Ui, state: &AppState) {
    let male: PlotPoints = state
        .views
        .gender_trend
        .iter()
        .map(|p| [p.year as f64, p.male])
        .collect();
    let female: PlotPoints = state
        .views
        .gender_trend
        .iter()
        .map(|p| [p.year as f64, p.female])
        .collect();

    Plot::new("gender_gap")
        .height(PLOT_HEIGHT)
        .allow_scroll(false)
        .allow_drag(false)
        .legend(Legend::default())
        .y_axis_label("Literacy Rate (%)")
        .x_axis_formatter(year_axis)
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(male).name("Male").color(color::MALE).width(3.0));
            plot_ui.line(Line::new(female).name("Female").color(color::FEMALE).width(3.0));
        });
}

// ---------------------------------------------------------------------------
// Enrollment
// ---------------------------------------------------------------------------

/// Enrollment per province, stacked by level.
pub fn enrollment_stacked(ui: &mut Ui, state: &AppState) {
    let totals = &state.views.enrollment;
    let mut provinces: Vec<String> = totals.iter().map(|t| t.province.clone()).collect();
    provinces.dedup();

    let mut charts: Vec<BarChart> = Vec::with_capacity(Level::ALL.len());
    for level in Level::ALL {
        let bars: Vec<Bar> = provinces
            .iter()
            .enumerate()
            .map(|(i, province)| {
                let total = totals
                    .iter()
                    .find(|t| &t.province == province && t.level == level)
                    .map(|t| t.total)
                    .unwrap_or(0);
                Bar::new(i as f64, total as f64).width(0.6)
            })
            .collect();
        let mut chart = BarChart::new(bars)
            .name(level.as_str())
            .color(level_color(level));
        if !charts.is_empty() {
            let below: Vec<&BarChart> = charts.iter().collect();
            chart = chart.stack_on(&below);
        }
        charts.push(chart);
    }

    Plot::new("enrollment")
        .height(PLOT_HEIGHT)
        .allow_scroll(false)
        .allow_drag(false)
        .legend(Legend::default())
        .y_axis_label("Number of Students")
        .x_axis_formatter(category_axis(provinces))
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

// ---------------------------------------------------------------------------
// District rankings
// ---------------------------------------------------------------------------

/// Horizontal bars coloured by score on a single-hue ramp.  Rows are drawn
/// bottom-up, so the first record ends up at the top.
pub fn ranking_bars(ui: &mut Ui, id: &str, records: &[SchoolPerformanceRecord], hue: f32) {
    let (lo, hi) = records.iter().fold((f64::MAX, f64::MIN), |(lo, hi), r| {
        (lo.min(r.avg_score), hi.max(r.avg_score))
    });
    let span = (hi - lo).max(f64::EPSILON);

    let n = records.len();
    let labels: Vec<String> = records.iter().rev().map(|r| r.district.clone()).collect();
    let bars: Vec<Bar> = records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            Bar::new((n - 1 - i) as f64, r.avg_score)
                .name(&r.district)
                .fill(color::sequential(hue, (r.avg_score - lo) / span))
                .width(0.7)
        })
        .collect();

    Plot::new(id)
        .height(PLOT_HEIGHT)
        .allow_scroll(false)
        .allow_drag(false)
        .x_axis_label("Average Score")
        .y_axis_formatter(category_axis(labels))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal());
        });
}
