use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{
    Array, ArrayRef, Float64Array, Int32Array, StringArray, UInt32Array, UInt64Array,
};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::{Parser, ValueEnum};
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::SeedableRng;

use edu_dashboard::data::export::write_csv_file;
use edu_dashboard::data::model::Tables;
use edu_dashboard::data::synth::SampleSynthesizer;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Parquet,
}

/// Write freshly synthesized literacy, enrollment and school performance tables.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Directory to write the tables into (created if missing).
    #[arg(long, default_value = "data")]
    out_dir: PathBuf,

    /// Seed for reproducible output; omitted means a random seed.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let tables = SampleSynthesizer::new(rng).tables();

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    match args.format {
        Format::Csv => {
            write_csv_file(&tables.literacy, &args.out_dir.join("literacy.csv"))?;
            write_csv_file(&tables.enrollment, &args.out_dir.join("enrollment.csv"))?;
            write_csv_file(
                &tables.performance,
                &args.out_dir.join("school_performance.csv"),
            )?;
        }
        Format::Parquet => write_parquet(&tables, &args.out_dir)?,
    }

    println!(
        "Wrote {} literacy, {} enrollment and {} district rows to {}",
        tables.literacy.len(),
        tables.enrollment.len(),
        tables.performance.len(),
        args.out_dir.display()
    );
    Ok(())
}

fn write_parquet(tables: &Tables, dir: &Path) -> Result<()> {
    let lit = &tables.literacy;
    write_batch(
        &dir.join("literacy.parquet"),
        vec![
            column("year", Int32Array::from_iter_values(lit.iter().map(|r| r.year))),
            column(
                "province",
                StringArray::from_iter_values(lit.iter().map(|r| r.province.as_str())),
            ),
            column(
                "male_literacy",
                Float64Array::from_iter_values(lit.iter().map(|r| r.male_literacy)),
            ),
            column(
                "female_literacy",
                Float64Array::from_iter_values(lit.iter().map(|r| r.female_literacy)),
            ),
            column(
                "overall_literacy",
                Float64Array::from_iter_values(lit.iter().map(|r| r.overall_literacy)),
            ),
        ],
    )?;

    let enr = &tables.enrollment;
    write_batch(
        &dir.join("enrollment.parquet"),
        vec![
            column("year", Int32Array::from_iter_values(enr.iter().map(|r| r.year))),
            column(
                "province",
                StringArray::from_iter_values(enr.iter().map(|r| r.province.as_str())),
            ),
            column("level", StringArray::from_iter_values(enr.iter().map(|r| r.level.as_str()))),
            column("enrollment", UInt64Array::from_iter_values(enr.iter().map(|r| r.enrollment))),
        ],
    )?;

    let perf = &tables.performance;
    write_batch(
        &dir.join("school_performance.parquet"),
        vec![
            column("year", Int32Array::from_iter_values(perf.iter().map(|r| r.year))),
            column(
                "district",
                StringArray::from_iter_values(perf.iter().map(|r| r.district.as_str())),
            ),
            column(
                "province",
                StringArray::from_iter_values(perf.iter().map(|r| r.province.as_str())),
            ),
            column("avg_score", Float64Array::from_iter_values(perf.iter().map(|r| r.avg_score))),
            column("pass_rate", Float64Array::from_iter_values(perf.iter().map(|r| r.pass_rate))),
            column(
                "num_students",
                UInt32Array::from_iter_values(perf.iter().map(|r| r.num_students)),
            ),
        ],
    )
}

fn column(name: &'static str, array: impl Array + 'static) -> (&'static str, ArrayRef) {
    (name, Arc::new(array))
}

fn write_batch(path: &Path, columns: Vec<(&'static str, ArrayRef)>) -> Result<()> {
    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), false))
            .collect::<Vec<_>>(),
    ));
    let arrays = columns.into_iter().map(|(_, array)| array).collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}
