/// Data layer: core types, loading, synthesis, filtering and export.
///
/// Architecture:
/// ```text
///  data/*.csv (.json / .parquet)        synth (seeded Rng)
///        │                                   │
///        ▼                                   │
///   ┌──────────┐   parse error / missing     │
///   │  loader   │ ─────────────────────────► │
///   └──────────┘                             │
///        │                                   ▼
///        ▼                            ┌──────────┐
///   ┌──────────┐ ◄─────────────────── │  store    │  persist + cache
///   │  Tables   │                     └──────────┘
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  year / provinces / min students → views
///   └──────────┘
///        │
///        ├──► summary  (metric cards)
///        └──► export   (filtered CSV files)
/// ```

pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod store;
pub mod summary;
pub mod synth;
