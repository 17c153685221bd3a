//! One-shot batch front-end: read an exam record from disk, run the report
//! pipeline, write the PDF (and optionally the chart PNGs) next to it.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use report::ReportJob;
use report::feedback::DisabledNarrative;

#[derive(Parser, Debug)]
#[command(
    name = "batch",
    about = "Generate a student performance PDF report from an exam-submission JSON record"
)]
struct Args {
    /// Path to the exam-submission JSON record.
    input: PathBuf,

    /// Recipient name used on the cover page and in the narrative.
    #[arg(long, default_value = "Student")]
    student_name: String,

    /// Output PDF path. Defaults to `<StudentName>_Performance_Report.pdf`
    /// in the current directory.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also write each rendered chart as a PNG into this directory.
    #[arg(long)]
    charts_dir: Option<PathBuf>,

    /// Skip the external narrative service and use templated feedback.
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(common::config::log_level())),
        )
        .init();

    let args = Args::parse();

    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let record: serde_json::Value =
        serde_json::from_str(&raw).context("input is not valid JSON")?;

    let mut job = ReportJob::new(record).with_student_name(&args.student_name);
    if args.offline {
        job = job.with_narrative(Box::new(DisabledNarrative));
    }

    let generated = job.generate().await.context("generating report")?;

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(&generated.filename));
    fs::write(&output, &generated.pdf)
        .with_context(|| format!("writing {}", output.display()))?;
    info!(
        output = %output.display(),
        bytes = generated.pdf.len(),
        charts = generated.charts.len(),
        at = %generated.generated_at,
        "report written"
    );

    if let Some(dir) = args.charts_dir {
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        for chart in &generated.charts {
            let path = dir.join(format!("{}.png", chart.name));
            let png = chart
                .to_png()
                .with_context(|| format!("encoding chart '{}'", chart.name))?;
            fs::write(&path, png).with_context(|| format!("writing {}", path.display()))?;
        }
        info!(dir = %dir.display(), count = generated.charts.len(), "charts written");
    }

    println!(
        "Report written to {} ({} charts, accuracy {:.2}%)",
        output.display(),
        generated.charts.len(),
        generated.statistics.overall.accuracy
    );
    Ok(())
}
