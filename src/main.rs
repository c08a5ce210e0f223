use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result, bail};
use assessment_qc::report::{self, PREVIEW_ROWS, ReportMeta};
use assessment_qc::{ALL_LABEL, Assessment, ReportConfig, filter_by_category, load_csv};
use clap::Parser;
use num_format::{Locale, ToFormattedString};
use once_cell::sync::Lazy;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState::default()));

#[derive(Default)]
struct AppState {
    config: ReportConfig,
    out_dir: PathBuf,
    loaded: Option<Loaded>,
}

#[derive(Clone)]
struct Loaded {
    source: String,
    assessment: Assessment,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "RCW 87.84 rehabilitation assessment QA/QC reports")]
struct Cli {
    /// Assessment CSV to load on startup
    #[arg(long)]
    input: Option<PathBuf>,

    /// JSON file overriding the identifier column and category table
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory the report files are written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Generate reports for --input and exit instead of opening the menu
    #[arg(long, requires = "input")]
    batch: bool,

    /// With --batch, also export the detail table filtered to this category
    #[arg(long, requires = "batch")]
    filter: Option<String>,
}

fn state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ReportConfig::load(cli.config.as_deref()).context("loading report config")?;
    info!(categories = config.categories.len(), "startup");
    {
        let mut st = state();
        st.config = config;
        st.out_dir = cli.out_dir.clone();
    }

    if let Some(input) = &cli.input {
        if let Err(e) = load_file(input) {
            if cli.batch {
                return Err(e);
            }
            eprintln!("Failed to load file: {e:#}");
        }
    }

    if cli.batch {
        generate_reports()?;
        if let Some(label) = &cli.filter {
            filter_table(label)?;
        }
        return Ok(());
    }

    loop {
        println!("RCW 87.84 Rehabilitation Assessments QA/QC");
        println!("[1] Load the file");
        println!("[2] Generate Reports");
        println!("[3] Filter the Detailed Table");
        println!("[4] Exit");

        let Some(choice) = prompt("Enter Choice: ")? else {
            break;
        };
        let outcome = match choice.as_str() {
            "1" => match prompt("Enter CSV filename: ")? {
                Some(name) => load_file(Path::new(&name))
                    .map_err(|e| e.context("Failed to load file")),
                None => break,
            },
            "2" => generate_reports(),
            "3" => match choose_category()? {
                Some(label) => filter_table(&label),
                None => Ok(()),
            },
            "4" => break,
            _ => {
                println!("Invalid choice. Please try again.");
                Ok(())
            }
        };
        if let Err(e) = outcome {
            eprintln!("Error: {e:#}");
        }
        println!();
    }
    Ok(())
}

/// Prints `label`, reads one trimmed line. `None` on end of input.
fn prompt(label: &str) -> Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;
    let mut buf = String::new();
    if io::stdin().read_line(&mut buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(buf.trim().to_string()))
}

/// Replaces whatever was loaded before. On error the previous file stays.
fn load_file(path: &Path) -> Result<()> {
    let config = state().config.clone();
    let (dataset, load_report) =
        load_csv(path).with_context(|| format!("reading {}", path.display()))?;
    let assessment = Assessment::build(dataset, &config);

    println!(
        "Processing dataset... ({} rows loaded)",
        load_report.loaded_rows.to_formatted_string(&Locale::en)
    );
    if load_report.parse_errors > 0 {
        println!(
            "{} parse errors encountered, rows skipped.",
            load_report.parse_errors.to_formatted_string(&Locale::en)
        );
    }
    if !assessment.schema.is_complete() {
        println!("Warning: expected category columns not found (reported as 0/0):");
        for column in assessment.schema.missing_columns() {
            println!("  - {column}");
        }
    }

    state().loaded = Some(Loaded {
        source: path.display().to_string(),
        assessment,
    });
    Ok(())
}

fn loaded() -> Option<Loaded> {
    state().loaded.clone()
}

fn generate_reports() -> Result<()> {
    let Some(loaded) = loaded() else {
        println!("No data loaded. Please choose [1] Load the file first.");
        return Ok(());
    };
    let (config, out_dir) = {
        let st = state();
        (st.config.clone(), st.out_dir.clone())
    };

    println!("Generating reports...");
    println!();
    print!("{}", report::console_report(&loaded.assessment));
    println!();

    let meta = ReportMeta::now(&loaded.source);
    let written = report::export_reports(&loaded.assessment, &config.categories, &meta, &out_dir)
        .context("exporting reports")?;
    println!("Reports exported:");
    for path in written {
        println!("  {}", path.display());
    }
    Ok(())
}

fn choose_category() -> Result<Option<String>> {
    let config = state().config.clone();
    let options: Vec<&str> = std::iter::once(ALL_LABEL)
        .chain(config.categories.labels())
        .collect();

    println!("Filter by Category:");
    for (i, label) in options.iter().enumerate() {
        println!("[{i}] {label}");
    }
    let Some(answer) = prompt("Enter Choice: ")? else {
        return Ok(None);
    };
    let picked = match answer.parse::<usize>() {
        Ok(i) => options.get(i).map(|s| s.to_string()),
        Err(_) => options.iter().find(|l| **l == answer).map(|s| s.to_string()),
    };
    if picked.is_none() {
        println!("Invalid choice. Please try again.");
    }
    Ok(picked)
}

fn filter_table(label: &str) -> Result<()> {
    let Some(loaded) = loaded() else {
        bail!("no data loaded; load a file first");
    };
    let (config, out_dir) = {
        let st = state();
        (st.config.clone(), st.out_dir.clone())
    };

    let detail = loaded.assessment.annotated.to_dataset();
    let filtered = filter_by_category(&detail, &config.categories, label)?;

    println!(
        "Filter: {label} ({} of {} records)",
        filtered.len().to_formatted_string(&Locale::en),
        detail.len().to_formatted_string(&Locale::en)
    );
    print!("{}", report::records_preview(&filtered, PREVIEW_ROWS));

    let path = report::export_filtered(&filtered, label, &out_dir)?;
    println!("Full table exported to {}", path.display());
    Ok(())
}
