use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;
use flow_estimate::export::{
    project_completion, save_distribution_csv, save_graph_json, save_summary_csv,
};
use flow_estimate::{EvaluationConfig, WorkCalendar, load_flow_graph_from_json, summary_frame, to_dot};
use polars::prelude::{AnyValue, DataFrame};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "flow-estimate")]
#[command(about = "Monte Carlo duration estimates for activity flow graphs")]
struct Args {
    /// Activity definition (JSON)
    #[arg(long, short)]
    input: PathBuf,

    /// Directory receiving the exports; defaults to the input's directory
    #[arg(long, short)]
    output: Option<PathBuf>,

    #[arg(long, env = "FLOW_ESTIMATE_SEED", default_value_t = 0)]
    seed: u64,

    /// Log level for the engine (trace, debug, info, warn, error)
    #[arg(long, env = "FLOW_ESTIMATE_LEVEL", default_value = "info")]
    level: String,

    /// First working day, YYYY-MM-DD; defaults to today
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Also write a Graphviz rendering
    #[arg(long)]
    dot: bool,
}

fn render_cell(value: &AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Float64(v) => format!("{v:.2}"),
        AnyValue::String(s) => s.to_string(),
        other => other.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let mut cells: Vec<Vec<String>> = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let row = columns
            .iter()
            .map(|col| col.get(row_idx).map(|av| render_cell(&av)).unwrap_or_default())
            .collect();
        cells.push(row);
    }

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.chars().count()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |row: &[String]| {
        let mut line = String::from("|");
        for (ci, cell) in row.iter().enumerate() {
            let pad = widths[ci].saturating_sub(cell.chars().count());
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(pad));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn output_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "estimate".to_string())
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = EvaluationConfig::with_seed(args.seed);
    if let Some(start_date) = args.start_date {
        config.start_date = start_date;
    }

    let mut flow = load_flow_graph_from_json(&args.input)?;
    flow.set_config(config);
    flow.evaluate()?;

    let total_mean = flow
        .result(flow.output())
        .map(|result| result.cumulative_stats.mean)
        .unwrap_or_default();
    let calendar = WorkCalendar::for_horizon(flow.config().start_date, total_mean);

    let out_dir = match args.output {
        Some(dir) => dir,
        None => args
            .input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    if !out_dir.as_os_str().is_empty() {
        fs::create_dir_all(&out_dir)?;
    }
    let stem = output_stem(&args.input);

    let json_path = out_dir.join(format!("{stem}.json"));
    save_graph_json(&flow, Some(&calendar), &json_path)?;
    let csv_path = out_dir.join(format!("{stem}.csv"));
    save_summary_csv(&flow, Some(&calendar), &csv_path)?;
    let distribution_path = out_dir.join(format!("{stem}-distribution.csv"));
    save_distribution_csv(&flow, &distribution_path)?;
    if args.dot {
        let dot_path = out_dir.join(format!("{stem}.dot"));
        fs::write(&dot_path, to_dot(&flow))?;
        info!(path = %dot_path.display(), "wrote graphviz rendering");
    }
    info!(
        json = %json_path.display(),
        csv = %csv_path.display(),
        distribution = %distribution_path.display(),
        "wrote exports"
    );

    let frame = summary_frame(&flow, Some(&calendar))?;
    println!("{}", render_df_as_text_table(&frame));
    if let Some(path) = flow.critical_path() {
        println!(
            "Critical path ({:.2} expected): {}",
            path.expected_duration,
            path.nodes
                .iter()
                .filter_map(|id| flow.node(*id))
                .map(|node| node.name.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        );
    }
    match project_completion(&flow, &calendar) {
        Some(date) => println!("Estimated completion: {date}"),
        None => println!("Expected duration: {total_mean:.2}"),
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("flow_estimate={}", args.level))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
