//! campreport CLI - enrich camp/afterschool registration exports
//!
//! # Main Commands
//!
//! ```bash
//! campreport transform registrations.csv   # Run the full pipeline, write the export
//! campreport serve                         # Start the HTTP API (port 3000)
//! campreport mask list                     # Manage column-visibility masks
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! campreport parse registrations.csv       # Ingest + build the report, no transforms
//! ```

use campreport::{
    default_mask, export_filename, to_display_value, transform_csv, visible_headers, write_csv_file,
    CampSeason, Diagnostics, MaskStore, PipelineOptions, Report, ReportVariant,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "campreport")]
#[command(about = "Enrich camp and afterschool registration CSV exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and build the raw report (no transforms)
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file for the report JSON (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Full pipeline: CSV → enriched report → CSV export
    Transform {
        /// Input CSV file
        input: PathBuf,

        /// Report variant: camp or afterschool
        #[arg(short, long, default_value = "camp")]
        variant: ReportVariant,

        /// Camp season tables to use (camp variant only)
        #[arg(short, long, default_value = "2025")]
        season: u16,

        /// Override the age reference date (YYYY-MM-DD)
        #[arg(long)]
        reference_date: Option<NaiveDate>,

        /// Output CSV file (default: conventional import filename)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export only the columns the stored mask marks visible
        #[arg(long)]
        filtered: bool,

        /// Also dump the enriched report as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Number of rows to preview (0 to skip)
        #[arg(long, default_value = "5")]
        preview: usize,
    },

    /// Manage column-visibility masks
    Mask {
        #[command(subcommand)]
        action: MaskAction,
    },

    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[derive(Subcommand)]
enum MaskAction {
    /// List all stored masks
    List,

    /// Show the stored mask for a variant
    Show { variant: ReportVariant },

    /// Mark the given columns visible (all others hidden)
    Set {
        variant: ReportVariant,
        /// Comma-separated header list, e.g. "Contact,Cohort,Weeks"
        #[arg(long)]
        visible: String,
    },

    /// Flip one header's visibility
    Toggle {
        variant: ReportVariant,
        header: String,
    },

    /// Delete the stored mask
    Clear { variant: ReportVariant },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse {
            input,
            delimiter,
            output,
        } => cmd_parse(&input, delimiter, output.as_deref()),

        Commands::Transform {
            input,
            variant,
            season,
            reference_date,
            output,
            filtered,
            json,
            preview,
        } => cmd_transform(
            &input,
            variant,
            season,
            reference_date,
            output.as_deref(),
            filtered,
            json.as_deref(),
            preview,
        ),

        Commands::Mask { action } => cmd_mask(action),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_parse(
    input: &Path,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let parsed = match delimiter {
        Some(d) => {
            let bytes = fs::read(input)?;
            let encoding = campreport::detect_encoding(&bytes);
            let content = campreport::decode_content(&bytes, &encoding)?;
            campreport::parse_str(&content, d, encoding)?
        }
        None => campreport::parse_csv_file_auto(input)?,
    };

    eprintln!("   Encoding: {}", parsed.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        format_delimiter(parsed.delimiter),
        if delimiter.is_none() {
            " (auto-detected)"
        } else {
            ""
        }
    );
    eprintln!("   Columns: {}", parsed.raw_headers.join(", "));
    eprintln!("✅ Parsed {} rows", parsed.rows.len());

    let mut diagnostics = Diagnostics::new();
    let report = Report::build(&parsed.raw_headers, parsed.rows, &mut diagnostics);
    for finding in diagnostics.iter() {
        eprintln!("   ⚠️  {}", finding);
    }

    let json = serde_json::to_string_pretty(&report)?;
    write_output(&json, output)?;

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_transform(
    input: &Path,
    variant: ReportVariant,
    season: u16,
    reference_date: Option<NaiveDate>,
    output: Option<&Path>,
    filtered: bool,
    json_output: Option<&Path>,
    preview: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let mut camp = match season {
        2023 => CampSeason::summer_2023(),
        2025 => CampSeason::summer_2025(),
        other => return Err(format!("no season tables for {other} (try 2023 or 2025)").into()),
    };
    if let Some(date) = reference_date {
        camp = camp.with_reference_date(date);
    }

    let options = PipelineOptions {
        variant,
        camp,
        ..PipelineOptions::default()
    };
    let run = transform_csv(input, &options)?;

    eprintln!("   Encoding: {}", run.csv_info.encoding);
    eprintln!(
        "   Delimiter: '{}'",
        format_delimiter(run.csv_info.delimiter)
    );
    eprintln!("   Rows: {}", run.csv_info.row_count);

    if !run.diagnostics.is_empty() {
        eprintln!("\n🔎 Findings ({}):", run.diagnostics.len());
        for finding in &run.diagnostics {
            eprintln!("   - {}", finding);
        }
    }

    if preview > 0 {
        eprintln!("\n📋 Preview (first {} rows):", preview.min(run.report.rows.len()));
        eprintln!("   {}", run.report.headers.join(" | "));
        for row in run.report.rows.iter().take(preview) {
            let cells: Vec<String> = run
                .report
                .headers
                .iter()
                .map(|header| to_display_value(row.value(header)))
                .collect();
            eprintln!("   {}", cells.join(" | "));
        }
    }

    // Pick the export column set
    let headers = if filtered {
        let store = MaskStore::open();
        let mask = store
            .get(variant.mask_key())
            .map(|stored| stored.columns.clone())
            .unwrap_or_else(|| default_mask(&run.report.headers));
        let visible = visible_headers(&mask, &run.report.headers);
        if visible.is_empty() || visible.len() == run.report.headers.len() {
            eprintln!("   (mask selects no strict subset, exporting all columns)");
            run.report.headers.clone()
        } else {
            eprintln!("   Exporting {} visible column(s)", visible.len());
            visible
        }
    } else {
        run.report.headers.clone()
    };

    let export_path = match output {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(export_filename(chrono::Utc::now().date_naive())),
    };
    write_csv_file(&export_path, &headers, &run.report.rows)?;
    eprintln!("💾 Export written to: {}", export_path.display());

    if let Some(json_path) = json_output {
        let json = serde_json::to_string_pretty(&run.report)?;
        fs::write(json_path, json)?;
        eprintln!("💾 Report JSON written to: {}", json_path.display());
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_mask(action: MaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = MaskStore::open();

    match action {
        MaskAction::List => {
            let masks = store.list();
            if masks.is_empty() {
                eprintln!("📋 No masks stored yet.");
                eprintln!("   Use 'campreport mask set <variant> --visible \"A,B\"' to add one.");
                return Ok(());
            }

            eprintln!("📋 Stored masks ({}):\n", masks.len());
            for mask in masks {
                let visible = mask.columns.values().filter(|v| **v).count();
                println!("  🗂  {}", mask.key);
                println!("     Columns: {} ({} visible)", mask.columns.len(), visible);
                println!("     Updated: {}", mask.updated_at);
                println!();
            }
        }

        MaskAction::Show { variant } => match store.get(variant.mask_key()) {
            Some(mask) => println!("{}", serde_json::to_string_pretty(mask)?),
            None => return Err(format!("no mask stored for '{}'", variant.as_str()).into()),
        },

        MaskAction::Set { variant, visible } => {
            let columns = visible
                .split(',')
                .map(|header| (header.trim().to_string(), true))
                .filter(|(header, _)| !header.is_empty())
                .collect();
            let mask = store.set(variant.mask_key(), columns)?;
            eprintln!(
                "✅ Mask '{}' saved with {} visible column(s)",
                mask.key,
                mask.columns.len()
            );
        }

        MaskAction::Toggle { variant, header } => {
            let now_visible = store.toggle(variant.mask_key(), &header)?;
            eprintln!(
                "✅ '{}' is now {}",
                header,
                if now_visible { "visible" } else { "hidden" }
            );
        }

        MaskAction::Clear { variant } => {
            store.clear(variant.mask_key())?;
            eprintln!("🗑️  Mask cleared: {}", variant.mask_key());
        }
    }

    Ok(())
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    campreport::server::serve(port).await
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
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
