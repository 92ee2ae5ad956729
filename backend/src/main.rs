//! AOS Dashboard CLI - overdue receivables reports
//!
//! # Commands
//!
//! ```bash
//! aos-dashboard serve                                  # Start HTTP server (port 3000)
//! aos-dashboard report piutang.txt --summary --chart   # Overdue report as JSON
//! aos-dashboard report piutang.xlsx --tidy --export data_rapi.xlsx
//! aos-dashboard opname opname.txt                      # Opname table as JSON
//! ```

use aos_dashboard::{
    build_opname_report, build_overdue_report, export_summary, export_tidy, load,
    table_to_xlsx, OpnameReportResponse, OverdueReportResponse, ReportOptions,
};
use aos_dashboard::config::DEFAULT_PORT;
use aos_dashboard::server::start_server;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "aos-dashboard")]
#[command(about = "Overdue receivables report: tidy, bucket, summarize, chart and export", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the overdue report of a Piutang Overdue file
    Report {
        /// Input file (.txt pipe-delimited or .xlsx)
        input: PathBuf,

        /// Apply Data Rapi formatting (Rp amounts, DD-MM-YYYY dates)
        #[arg(long)]
        tidy: bool,

        /// Include the table in the output
        #[arg(long)]
        table: bool,

        /// Include the per-bucket summary
        #[arg(long)]
        summary: bool,

        /// Include the chart description
        #[arg(long)]
        chart: bool,

        /// Write the tidied table to this .xlsx file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Write the bucket summary to this .xlsx file
        #[arg(long)]
        summary_export: Option<PathBuf>,

        /// Output file for the JSON report (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show an Opname Faktur file as a table
    Opname {
        /// Input file (.txt pipe-delimited or .xlsx)
        input: PathBuf,

        /// Write the table to this .xlsx file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Output file for the JSON report (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "AOS_DASHBOARD_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Report {
            input,
            tidy,
            table,
            summary,
            chart,
            export,
            summary_export,
            output,
        } => {
            let options = ReportOptions { tidy, table, summary, chart };
            cmd_report(
                &input,
                options,
                export.as_deref(),
                summary_export.as_deref(),
                output.as_deref(),
            )
            .await
        }

        Commands::Opname { input, export, output } => {
            cmd_opname(&input, export.as_deref(), output.as_deref()).await
        }

        Commands::Serve { port } => start_server(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn read_input(input: &Path) -> Result<aos_dashboard::LoadedTable, Box<dyn std::error::Error>> {
    eprintln!("📄 Loading: {}", input.display());

    let bytes = tokio::fs::read(input).await?;
    let name = input
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let loaded = load(name, &bytes)?;

    if let Some(encoding) = &loaded.info.encoding {
        eprintln!("   Encoding: {}", encoding);
    }
    eprintln!("   Columns: {}", loaded.info.columns.join(", "));
    if loaded.info.skipped_lines > 0 {
        eprintln!("   ⚠️  Skipped {} malformed line(s)", loaded.info.skipped_lines);
    }
    eprintln!("✅ Loaded {} rows", loaded.info.row_count);

    Ok(loaded)
}

async fn cmd_report(
    input: &Path,
    options: ReportOptions,
    export: Option<&Path>,
    summary_export: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = read_input(input).await?;
    let report = build_overdue_report(&loaded.table, &options);

    if let Some(path) = export {
        let bytes = export_tidy(&loaded.table)?;
        fs::write(path, bytes)?;
        eprintln!("💾 Data Rapi written to: {}", path.display());
    }

    if let Some(path) = summary_export {
        // Computed even when --summary is off
        let summary = match &report.summary {
            Some(summary) => summary.clone(),
            None => aos_dashboard::summarize(&loaded.table)?,
        };
        fs::write(path, export_summary(&summary)?)?;
        eprintln!("💾 Summary written to: {}", path.display());
    }

    for warning in &report.warnings {
        eprintln!("⚠️  {}", warning);
    }

    let response = OverdueReportResponse::new(&loaded.info, &report, None);
    let json = serde_json::to_string_pretty(&response)?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_opname(
    input: &Path,
    export: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = read_input(input).await?;
    let report = build_opname_report(&loaded.table);

    if let Some(path) = export {
        fs::write(path, table_to_xlsx(&report.table)?)?;
        eprintln!("💾 Opname written to: {}", path.display());
    }

    let response = OpnameReportResponse::new(&loaded.info, &report, None);
    let json = serde_json::to_string_pretty(&response)?;
    write_output(&json, output)?;

    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
