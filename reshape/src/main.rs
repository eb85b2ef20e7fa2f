//! Reshape CLI - turn a banquet reservation export into a booking-tool import
//!
//! # Commands
//!
//! ```bash
//! reshape transform data/source_data.csv data/transformed_data.csv --mapping data/menu_mapping.csv
//! reshape transform export.csv out.csv --delimiter ";" --profile v2
//! reshape menus data/source_data.csv data/unique_menu_names.txt
//! reshape columns data/source_data.csv     # header indices, for maintaining offsets
//! reshape profile list
//! reshape profile show v3 > my-profile.json
//! ```
//!
//! Defaults can be set with `RESHAPE_*` variables, also read from `.env`.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use reshape::logs::{log_error, set_quiet};
use reshape::{
    builtin_profiles, harvest_file, locate_meal_blocks, read_table_file, transform_file,
    Profile, TransformOptions, DEFAULT_PROFILE,
};

#[derive(Parser)]
#[command(name = "reshape")]
#[command(about = "Reshape banquet reservation exports into booking-tool import CSVs", long_about = None)]
struct Cli {
    /// Suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reshape an export into the import format
    Transform {
        /// Input export CSV
        #[arg(env = "RESHAPE_INPUT", default_value = "data/source_data.csv")]
        input: PathBuf,

        /// Output import CSV
        #[arg(env = "RESHAPE_OUTPUT", default_value = "data/transformed_data.csv")]
        output: PathBuf,

        /// Built-in profile name or profile JSON file
        #[arg(short, long, env = "RESHAPE_PROFILE", default_value = DEFAULT_PROFILE)]
        profile: String,

        /// Menu mapping CSV with old_name,new_name columns
        /// (default: data/menu_mapping.csv)
        #[arg(short, long, env = "RESHAPE_MAPPING")]
        mapping: Option<PathBuf>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long, env = "RESHAPE_DELIMITER")]
        delimiter: Option<char>,

        /// Fixed run time, e.g. "2024-05-01 09:30:00" (default: now)
        #[arg(long, value_parser = parse_run_at)]
        run_at: Option<NaiveDateTime>,
    },

    /// List the distinct menu names found in the meal-name columns
    Menus {
        /// Input export CSV
        #[arg(env = "RESHAPE_INPUT", default_value = "data/source_data.csv")]
        input: PathBuf,

        /// Output text file, one name per line
        #[arg(default_value = "data/unique_menu_names.txt")]
        output: PathBuf,

        /// Profile whose block locator is used
        #[arg(short, long, env = "RESHAPE_PROFILE", default_value = DEFAULT_PROFILE)]
        profile: String,
    },

    /// Print the input's header with column indices
    Columns {
        /// Input export CSV
        #[arg(env = "RESHAPE_INPUT", default_value = "data/source_data.csv")]
        input: PathBuf,

        /// Mark the meal blocks this profile would find
        #[arg(short, long, env = "RESHAPE_PROFILE", default_value = DEFAULT_PROFILE)]
        profile: String,
    },

    /// Inspect mapping profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// List built-in profiles
    List,

    /// Print a profile as JSON
    Show {
        /// Built-in profile name or profile JSON file
        name: String,
    },
}

fn parse_run_at(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| format!("expected YYYY-MM-DD HH:MM:SS: {}", e))
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    set_quiet(cli.quiet);

    let result = match cli.command {
        Commands::Transform {
            input,
            output,
            profile,
            mapping,
            delimiter,
            run_at,
        } => cmd_transform(&input, &output, profile, mapping, delimiter, run_at),

        Commands::Menus {
            input,
            output,
            profile,
        } => cmd_menus(&input, &output, &profile),

        Commands::Columns { input, profile } => cmd_columns(&input, &profile),

        Commands::Profile { action } => cmd_profile(action),
    };

    if let Err(e) = result {
        log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

fn cmd_transform(
    input: &Path,
    output: &Path,
    profile: String,
    mapping: Option<PathBuf>,
    delimiter: Option<char>,
    run_at: Option<NaiveDateTime>,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = TransformOptions {
        profile,
        mapping_path: mapping,
        delimiter,
        run_at,
    };

    let report = transform_file(input, output, &options)?;

    let warnings = match report.warnings.len() {
        0 => String::new(),
        n => format!(", {} warning(s)", n),
    };
    println!(
        "{} rows written to {} (profile {}{})",
        report.output.rows.len(),
        output.display(),
        report.profile,
        warnings
    );
    Ok(())
}

fn cmd_menus(input: &Path, output: &Path, profile: &str) -> Result<(), Box<dyn std::error::Error>> {
    let names = harvest_file(input, output, profile)?;

    println!("Found {} unique menu names", names.len());
    if !names.is_empty() {
        println!("\nFirst 20:");
        for name in names.iter().take(20) {
            println!("{}", name);
        }
    }
    Ok(())
}

fn cmd_columns(input: &Path, profile: &str) -> Result<(), Box<dyn std::error::Error>> {
    let profile = Profile::load(profile)?;
    let parsed = read_table_file(input)?;
    let blocks = locate_meal_blocks(&parsed.table, profile.locator.locator());

    for (i, header) in parsed.table.headers.iter().enumerate() {
        let marker = match blocks.iter().position(|&b| b == i) {
            Some(n) => format!("  <- meal block {}", n + 1),
            None => String::new(),
        };
        println!("[{:3}] {}{}", i, header, marker);
    }
    Ok(())
}

fn cmd_profile(action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ProfileAction::List => {
            for profile in builtin_profiles() {
                let default = if profile.name == DEFAULT_PROFILE { " (default)" } else { "" };
                println!("  {}{}", profile.name, default);
                println!("     {}", profile.description);
                println!("     Blocks: {}", profile.locator.describe());
                println!("     Columns: {}", profile.fields.len());
            }
        }

        ProfileAction::Show { name } => {
            let profile = Profile::load(&name)?;
            println!("{}", profile.to_json()?);
        }
    }
    Ok(())
}
