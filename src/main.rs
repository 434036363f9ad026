use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};

use dmojwatch::config::Config;
use dmojwatch::judgeapi::JudgeClient;
use dmojwatch::reports::{self, history, summary};
use dmojwatch::{collector, judgedb};

const NO_DATA: &str = "   NO DATA";
const DONE: &str = "   DONE";

#[derive(Parser)]
#[command(name = "dmojwatch", about = "Tracks students' judge submissions in a local database")]
struct Cli {
    /// SQLite database file (overrides DMOJ_DB)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Directory the CSV files are written to (overrides DMOJ_OUTPUT_DIR)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch new submissions for every student and store them
    Collect,
    /// Write the per-day submission history of every student to a CSV file
    Report,
    /// Show each student's latest page of submissions without storing anything
    Peek,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Begin logger
    env_logger::init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(database) = cli.database {
        config.database = database;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }

    match cli.command {
        Command::Collect => run_collect(&config).await,
        Command::Report => run_report(&config),
        Command::Peek => run_peek(&config).await,
    }
}

async fn run_collect(config: &Config) -> Result<()> {
    let token = config.require_token()?.to_string();
    let client = JudgeClient::new(&config.base_url, Some(token), config.timeout)?;

    println!("Requesting data for the supplied students.");
    println!("  - All data will be stored into {}.", config.database.display());
    println!("  - The most recent data will be displayed ready to paste into a spreadsheet.\n");

    let summaries = collector::collect_into(&client, &config.database, &config.students).await?;
    println!("{}", summary::render_console(summary::CONSOLE_HEADER, &summaries));

    let path = reports::dated_csv_path(&config.output_dir, "summary-", Local::now().date_naive());
    summary::write_summary_csv(&summaries, &path)?;

    println!("\nDONE");
    Ok(())
}

fn run_report(config: &Config) -> Result<()> {
    println!("Generating report for the supplied students.");
    println!("  - All data will be loaded from {}.", config.database.display());
    println!("  - A CSV file will be created into {}.\n", config.output_dir.display());

    println!("[1/2]: Collecting data from the database.");
    let connection = judgedb::open(&config.database)?;
    let Some(report) = history::build_history(&connection, &config.students, config.report_min_date)?
    else {
        println!("{NO_DATA}");
        return Ok(());
    };
    println!("{DONE}");

    println!("\n[2/2]: Creating the CSV file.");
    let path = reports::dated_csv_path(&config.output_dir, "", Local::now().date_naive());
    history::write_history_csv(&report, &path)?;
    println!("{DONE}");

    Ok(())
}

async fn run_peek(config: &Config) -> Result<()> {
    let client = JudgeClient::new(&config.base_url, config.api_token.clone(), config.timeout)?;

    let mut summaries = Vec::with_capacity(config.students.len());
    for username in &config.students {
        summaries.push(collector::peek_user(&client, username).await);
    }
    println!("{}", summary::render_console(summary::PEEK_HEADER, &summaries));

    Ok(())
}
