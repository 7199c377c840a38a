use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use edu_dashboard::config::DashboardConfig;
use edu_dashboard::data::export::ExportBundle;
use edu_dashboard::data::filter::{
    available_years, enrollment_by_province_level, enrollment_snapshot, gender_gap_for_year,
    gender_gap_trend, max_students, national_literacy_trend, performance_snapshot,
    province_choices, province_snapshot, top_and_bottom, EnrollmentTotal, FilterState,
    GenderPoint, PerformanceSnapshot, ProvinceLiteracy, RegionSet, TrendPoint,
};
use edu_dashboard::data::model::{SchoolPerformanceRecord, Tables};
use edu_dashboard::data::store::{DataPaths, DataStore, LoadOutcome, LoadWarning};
use edu_dashboard::data::summary::{DatasetOverview, EnrollmentSummary, PerformanceSummary};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Derived views, recomputed on every filter change
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Views {
    pub national_trend: Vec<TrendPoint>,
    pub provinces: Vec<ProvinceLiteracy>,
    pub gender_trend: Vec<GenderPoint>,
    pub gender_gap: Option<f64>,
    pub enrollment: Vec<EnrollmentTotal>,
    pub enrollment_summary: EnrollmentSummary,
    pub performance: PerformanceSnapshot,
    pub top: Vec<SchoolPerformanceRecord>,
    pub bottom: Vec<SchoolPerformanceRecord>,
    pub performance_summary: Option<PerformanceSummary>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,
    store: DataStore,

    /// Source tables for the session (shared, never mutated).
    pub tables: Arc<Tables>,
    /// Overview of `tables`, fixed until the next load.
    pub overview: DatasetOverview,

    /// Current selection in the side panel.
    pub filters: FilterState,

    /// Selector contents derived from the loaded tables.
    pub years: Vec<i32>,
    pub provinces: Vec<String>,
    pub max_students: u32,

    pub views: Views,

    /// Colour per province.
    pub province_colors: ColorMap,

    /// Problems met while loading data, shown until the next load.
    pub warnings: Vec<LoadWarning>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let store = DataStore::new(DataPaths::in_dir(&config.data_dir)).with_seed(config.seed);
        let filters = FilterState {
            year: 0,
            regions: RegionSet::new(),
            min_students: config.default_min_students,
        };
        let mut state = Self {
            config,
            store,
            tables: Arc::new(Tables::default()),
            overview: DatasetOverview::from_tables(&Tables::default()),
            filters,
            years: Vec::new(),
            provinces: Vec::new(),
            max_students: 0,
            views: Views::default(),
            province_colors: ColorMap::default(),
            warnings: Vec::new(),
            status_message: None,
        };
        state.reload();
        state
    }

    /// Resolve the tables through the store (cached when files are unchanged).
    pub fn reload(&mut self) {
        let outcome = self.store.load();
        self.set_tables(outcome);
    }

    /// Point the store at another data folder and load it.
    pub fn open_data_dir(&mut self, dir: &Path) {
        self.store = DataStore::new(DataPaths::in_dir(dir)).with_seed(self.config.seed);
        self.config.data_dir = dir.to_path_buf();
        self.reload();
    }

    /// Ingest freshly loaded tables, reset selector bounds and filters.
    pub fn set_tables(&mut self, outcome: LoadOutcome) {
        let tables = outcome.tables;
        self.years = available_years(&tables.literacy);
        self.provinces = province_choices(&tables.literacy);
        self.max_students = max_students(&tables.performance);
        self.province_colors = ColorMap::new(&self.provinces);
        self.overview = DatasetOverview::from_tables(&tables);

        // Latest year, every province selected.
        if !self.years.contains(&self.filters.year) {
            self.filters.year = self.years.first().copied().unwrap_or_default();
        }
        self.filters.regions = self.provinces.iter().cloned().collect();
        self.filters.min_students = self.filters.min_students.min(self.max_students);

        log::info!(
            "Loaded {} literacy, {} enrollment and {} district rows",
            tables.literacy.len(),
            tables.enrollment.len(),
            tables.performance.len()
        );
        self.tables = tables;
        self.warnings = outcome.warnings;
        self.status_message = None;
        self.refresh_views();
    }

    /// Recompute every derived view from the current filters.
    pub fn refresh_views(&mut self) {
        let t = &self.tables;
        let f = &self.filters;

        let performance = performance_snapshot(&t.performance, f.year, &f.regions, f.min_students);
        let (top, bottom) = top_and_bottom(&performance.records, self.config.top_n);
        let enrollment_rows = enrollment_snapshot(&t.enrollment, f.year, &f.regions);

        self.views = Views {
            national_trend: national_literacy_trend(&t.literacy),
            provinces: province_snapshot(&t.literacy, f.year, &f.regions),
            gender_trend: gender_gap_trend(&t.literacy),
            gender_gap: gender_gap_for_year(&t.literacy, f.year),
            enrollment: enrollment_by_province_level(&t.enrollment, f.year, &f.regions),
            enrollment_summary: EnrollmentSummary::from_rows(&enrollment_rows),
            performance_summary: PerformanceSummary::from_records(&performance.records),
            performance,
            top,
            bottom,
        };
    }

    pub fn set_year(&mut self, year: i32) {
        self.filters.year = year;
        self.refresh_views();
    }

    pub fn set_min_students(&mut self, min_students: u32) {
        self.filters.min_students = min_students;
        self.refresh_views();
    }

    /// Toggle a single province in the region filter.
    pub fn toggle_region(&mut self, province: &str) {
        if !self.filters.regions.remove(province) {
            self.filters.regions.insert(province.to_string());
        }
        self.refresh_views();
    }

    pub fn select_all_regions(&mut self) {
        self.filters.regions = self.provinces.iter().cloned().collect();
        self.refresh_views();
    }

    /// Clear the selection, which shows every province.
    pub fn select_no_regions(&mut self) {
        self.filters.regions.clear();
        self.refresh_views();
    }

    /// Write the three filtered CSV files into `dir`.
    pub fn export_to(&mut self, dir: &Path) -> Result<Vec<PathBuf>> {
        let bundle = ExportBundle::build(&self.tables, &self.filters);
        bundle.write_to_dir(dir, self.filters.year)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn state_in(dir: &TempDir) -> AppState {
        AppState::new(DashboardConfig {
            data_dir: dir.path().join("data"),
            seed: Some(3),
            ..DashboardConfig::default()
        })
    }

    #[test]
    fn starts_on_latest_year_with_all_provinces() {
        let dir = TempDir::new().unwrap();
        let state = state_in(&dir);
        assert_eq!(state.filters.year, 2024);
        assert_eq!(state.filters.regions.len(), 7);
        assert_eq!(state.filters.min_students, 500);
        assert_eq!(state.views.provinces.len(), 7);
        // No 2024 performance data: the latest year is substituted.
        assert_eq!(state.views.performance.year, Some(2023));
        assert!(state.views.performance.substitution.is_some());
        assert!(state.views.top.len() <= 10);
    }

    #[test]
    fn region_changes_refresh_views() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);

        state.select_no_regions();
        assert_eq!(state.views.provinces.len(), 7);

        state.toggle_region("Sindh");
        assert_eq!(state.views.provinces.len(), 1);
        assert!(state.views.enrollment.iter().all(|e| e.province == "Sindh"));

        state.toggle_region("Sindh");
        assert!(state.filters.regions.is_empty());
        state.select_all_regions();
        assert_eq!(state.filters.regions.len(), 7);
    }

    #[test]
    fn export_writes_year_named_files() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        state.set_year(2020);
        let out = dir.path().join("out");
        let paths = state.export_to(&out).unwrap();
        assert!(paths[0].ends_with("literacy_filtered_2020.csv"));
        assert!(paths.iter().all(|p| p.exists()));
    }
}
