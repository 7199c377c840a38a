use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use edu_dashboard::data::model::SchoolPerformanceRecord;

use crate::color;
use crate::state::AppState;
use crate::ui::plot;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Dashboard Controls");
    ui.separator();

    if state.years.is_empty() {
        ui.label("No literacy data loaded.");
        return;
    }

    // ---- Year selector (latest first) ----
    ui.strong("Select Year");
    let mut year = state.filters.year;
    egui::ComboBox::from_id_salt("year")
        .selected_text(year.to_string())
        .show_ui(ui, |ui: &mut Ui| {
            for y in &state.years {
                ui.selectable_value(&mut year, *y, y.to_string());
            }
        });
    if year != state.filters.year {
        state.set_year(year);
    }
    ui.separator();

    // ---- Province multi-select ----
    let n_selected = state.filters.regions.len();
    let n_total = state.provinces.len();
    ui.strong(format!("Filter Provinces  ({n_selected}/{n_total})"));
    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.select_all_regions();
        }
        if ui.small_button("None").clicked() {
            state.select_no_regions();
        }
    });
    ui.label(RichText::new("Leave empty to show all provinces").small().weak());

    let provinces = state.provinces.clone();
    for province in &provinces {
        let mut checked = state.filters.regions.contains(province);
        let text = RichText::new(province).color(state.province_colors.color_for(province));
        if ui.checkbox(&mut checked, text).changed() {
            state.toggle_region(province);
        }
    }
    ui.separator();

    // ---- Minimum district size ----
    ui.strong("Minimum District Students");
    let mut min_students = state.filters.min_students;
    let slider = egui::Slider::new(&mut min_students, 0..=state.max_students);
    if ui.add(slider).changed() {
        state.set_min_students(min_students);
    }
    ui.separator();

    ui.label(
        RichText::new(
            "Tip: use filters to explore specific provinces and years. \
             Export the filtered data from the File menu.",
        )
        .small(),
    );
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data folder…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
            if ui.button("Export filtered CSV…").clicked() {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();
        ui.label(format!("Data: {}", state.config.data_dir.display()));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });

    for warning in &state.warnings {
        ui.label(RichText::new(warning.to_string()).color(Color32::from_rgb(0xd3, 0x8b, 0x00)));
    }
}

// ---------------------------------------------------------------------------
// Central panel – charts and metrics
// ---------------------------------------------------------------------------

fn metric(ui: &mut Ui, label: &str, value: impl Into<String>) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.vertical(|ui: &mut Ui| {
            ui.label(RichText::new(label).small());
            ui.label(RichText::new(value).size(22.0).strong());
        });
    });
}

fn no_data(ui: &mut Ui, what: &str) {
    ui.label(RichText::new(format!("No {what} available for selected filters.")).italics());
}

/// Thousands separators for headline counts.
fn grouped(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    let accent = state
        .config
        .theme
        .rgb()
        .map(|[r, g, b]| Color32::from_rgb(r, g, b))
        .unwrap_or(Color32::DARK_GREEN);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            literacy_section(ui, state, accent);
            ui.separator();
            enrollment_section(ui, state, accent);
            ui.separator();
            performance_section(ui, state, accent);
            ui.separator();
            export_section(ui, state, accent);
        });
}

fn literacy_section(ui: &mut Ui, state: &AppState, accent: Color32) {
    let year = state.filters.year;
    ui.heading(RichText::new("Literacy Analysis").color(accent));

    ui.columns(2, |cols| {
        cols[0].strong("National Literacy Trend");
        if state.views.national_trend.is_empty() {
            no_data(&mut cols[0], "literacy data");
        } else {
            plot::national_trend_plot(&mut cols[0], state, accent);
        }

        cols[0].strong(format!("Province Comparison — {year}"));
        if state.views.provinces.is_empty() {
            no_data(&mut cols[0], "data");
        } else {
            plot::province_bars(&mut cols[0], state);
        }

        cols[1].strong("Gender Gap Analysis");
        if state.views.gender_trend.is_empty() {
            no_data(&mut cols[1], "gender-specific data");
        } else {
            plot::gender_gap_plot(&mut cols[1], state);
        }
        if let Some(gap) = state.views.gender_gap {
            let label = format!("Gender Gap, Male - Female ({year})");
            metric(&mut cols[1], &label, format!("{gap:.1}%"));
        }
    });
}

fn enrollment_section(ui: &mut Ui, state: &AppState, accent: Color32) {
    let year = state.filters.year;
    ui.heading(RichText::new("Enrollment Statistics").color(accent));
    ui.strong(format!("Student Enrollment by Province & Level — {year}"));

    if state.views.enrollment.is_empty() {
        no_data(ui, "enrollment data");
        return;
    }
    plot::enrollment_stacked(ui, state);

    let s = &state.views.enrollment_summary;
    ui.horizontal(|ui: &mut Ui| {
        metric(ui, "Total Enrollment", grouped(s.total));
        metric(ui, "Primary Level", format!("{:.1}%", s.primary_pct));
        metric(ui, "Provinces", s.provinces.to_string());
        metric(ui, "Avg per Province", grouped(s.avg_per_province.round() as u64));
    });
}

fn district_table(ui: &mut Ui, id: &str, records: &[SchoolPerformanceRecord]) {
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::remainder())
            .header(18.0, |mut header| {
                for title in ["District", "Province", "Score", "Pass rate"] {
                    header.col(|ui: &mut Ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for r in records {
                    body.row(18.0, |mut row| {
                        row.col(|ui: &mut Ui| {
                            ui.label(&r.district);
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(&r.province);
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(format!("{:.1}", r.avg_score));
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(format!("{:.0}%", r.pass_rate * 100.0));
                        });
                    });
                }
            });
    });
}

fn performance_section(ui: &mut Ui, state: &AppState, accent: Color32) {
    let year = state.filters.year;
    let views = &state.views;
    ui.heading(RichText::new("District Performance Rankings").color(accent));
    ui.strong(format!("Top & Bottom Performing Districts — {year}"));

    if let Some(sub) = views.performance.substitution {
        ui.label(
            RichText::new(format!(
                "Note: Performance data uses year {} (closest available to selected year {}).",
                sub.used, sub.requested
            ))
            .small()
            .italics(),
        );
    }

    if views.performance.records.is_empty() {
        ui.label(
            RichText::new(
                "No district performance data available after applying filters. \
                 Try adjusting the filters.",
            )
            .color(Color32::from_rgb(0xd3, 0x8b, 0x00)),
        );
        return;
    }

    let n = state.config.top_n;
    ui.columns(2, |cols| {
        cols[0].strong(format!("Top {n} Districts"));
        plot::ranking_bars(&mut cols[0], "top_districts", &views.top, color::GREENS);
        if let Some(best) = views.top.first() {
            cols[0].label(
                RichText::new(format!(
                    "Best: {} ({}) - Score: {}",
                    best.district, best.province, best.avg_score
                ))
                .color(Color32::DARK_GREEN),
            );
        }
        district_table(&mut cols[0], "top_table", &views.top);

        cols[1].strong(format!("Bottom {n} Districts"));
        plot::ranking_bars(&mut cols[1], "bottom_districts", &views.bottom, color::REDS);
        if let Some(worst) = views.bottom.first() {
            cols[1].label(
                RichText::new(format!(
                    "Needs Attention: {} ({}) - Score: {}",
                    worst.district, worst.province, worst.avg_score
                ))
                .color(Color32::DARK_RED),
            );
        }
        district_table(&mut cols[1], "bottom_table", &views.bottom);
    });

    if let Some(s) = &views.performance_summary {
        ui.strong("Overall Performance Statistics");
        ui.horizontal(|ui: &mut Ui| {
            metric(ui, "Avg Score", format!("{:.1}", s.avg_score));
            metric(ui, "Avg Pass Rate", format!("{:.1}%", s.avg_pass_pct));
            metric(ui, "Total Students", grouped(s.total_students));
            metric(ui, "Districts", s.districts.to_string());
        });
    }
}

fn export_section(ui: &mut Ui, state: &mut AppState, accent: Color32) {
    ui.heading(RichText::new("Data Export & Summary").color(accent));

    let o = &state.overview;
    let years = match o.literacy_years {
        Some((lo, hi)) => format!("{lo} – {hi}"),
        None => "–".to_string(),
    };
    let (enrollment_records, district_records) = (o.enrollment_records, o.district_records);
    ui.horizontal(|ui: &mut Ui| {
        metric(ui, "Literacy Years Range", years);
        metric(ui, "Enrollment Records", grouped(enrollment_records as u64));
        metric(ui, "District Records", grouped(district_records as u64));
    });

    ui.label("Export the filtered literacy, enrollment and district tables as CSV.");
    if ui.button("Download Filtered Datasets…").clicked() {
        export_dialog(state);
    }
}

// ---------------------------------------------------------------------------
// Folder dialogs
// ---------------------------------------------------------------------------

pub fn open_folder_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open education data folder")
        .pick_folder();

    if let Some(dir) = folder {
        log::info!("Opening data folder {}", dir.display());
        state.open_data_dir(&dir);
    }
}

pub fn export_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Export filtered datasets to…")
        .pick_folder();

    if let Some(dir) = folder {
        match state.export_to(&dir) {
            Ok(paths) => {
                state.status_message = None;
                log::info!("Wrote {} export files", paths.len());
            }
            Err(e) => {
                log::error!("Failed to export: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
