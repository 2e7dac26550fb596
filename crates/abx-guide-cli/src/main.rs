//! Command line browser for antibiotic guideline data.

mod display;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use abx_guide_core::dosing::{format_dosage, PediatricCalculator, RoundingPolicy};
use abx_guide_core::models::{AgeGroup, DecisionStep, LineTier, PediatricDosingRule, Setting, UnitSystem};
use abx_guide_core::regimens::locate_treatment;
use abx_guide_core::search::search;
use abx_guide_core::{
    FileStore, GuidelineBrowser, GuidelineStore, SessionContext, TreatmentRequest, ViewConfig,
};

#[derive(Parser)]
#[command(name = "abx-guide", version, about = "Antibiotic treatment guideline browser")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Guideline data directory
    #[arg(long, env = "ABX_DATA_DIR", default_value = "data", global = true)]
    data_dir: PathBuf,

    /// Unit system for dose display (metric, imperial)
    #[arg(long, env = "ABX_UNITS", default_value = "metric", global = true)]
    units: UnitSystem,

    /// Pediatric dose rounding (tiered, nearest-ten)
    #[arg(long, env = "ABX_ROUNDING", default_value = "tiered", global = true)]
    rounding: RoundingPolicy,

    /// Log filter, overrides RUST_LOG (e.g. "debug", "abx_guide_core=trace")
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

/// Patient flags shared by page commands.
#[derive(clap::Args, Clone, Copy)]
struct PatientArgs {
    /// Show pediatric regimens and doses
    #[arg(long)]
    pediatric: bool,

    /// Patient weight in kg
    #[arg(long)]
    weight: Option<f64>,

    /// neonate, infant, child or adolescent
    #[arg(long)]
    age_group: Option<AgeGroup>,
}

#[derive(Subcommand)]
enum Command {
    /// List condition categories
    Categories,

    /// List conditions in a category
    Conditions { category: String },

    /// Show treatment regimens for a condition
    Show {
        category: String,
        condition: String,

        /// first_line, second_line or third_line
        #[arg(long, default_value = "first_line")]
        line: LineTier,

        /// outpatient, inpatient or icu (defaults to the condition's first)
        #[arg(long)]
        setting: Option<Setting>,

        #[command(flatten)]
        patient: PatientArgs,
    },

    /// Walk a condition's decision tree with answer indexes
    Tree {
        category: String,
        condition: String,

        /// Zero-based answers, e.g. 0,1
        #[arg(long, value_delimiter = ',')]
        answers: Vec<usize>,
    },

    /// Show antibiotic detail by id, name or alias
    Drug {
        name: String,

        #[command(flatten)]
        patient: PatientArgs,
    },

    /// Search antibiotics and conditions
    Search { term: String },

    /// Convert mg/kg and mg/lb tokens in dosing text
    Convert { text: String },

    /// Calculate a pediatric dose from a rule
    Dose {
        /// Patient weight in kg
        #[arg(long)]
        weight: f64,

        /// Daily dose in mg/kg
        #[arg(long)]
        per_kg: f64,

        #[arg(long, default_value = "q24h")]
        frequency: String,

        /// Maximum daily dose in mg
        #[arg(long)]
        max_daily: Option<f64>,

        #[arg(long)]
        min_weight: Option<f64>,

        #[arg(long)]
        max_weight: Option<f64>,

        #[arg(long)]
        age_group: Option<AgeGroup>,

        /// Adult dose text to compare against (e.g. "500 mg")
        #[arg(long)]
        adult_dose: Option<String>,
    },
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn session_context(cli: &Cli, patient: PatientArgs) -> SessionContext {
    SessionContext {
        pediatric_mode: patient.pediatric,
        weight_kg: patient.weight,
        age_group: patient.age_group,
        ..SessionContext::with_units(cli.units)
    }
}

fn open_store(cli: &Cli) -> Result<FileStore> {
    FileStore::open(&cli.data_dir)
        .with_context(|| format!("failed to open data directory {}", cli.data_dir.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());
    tracing::debug!("abx-guide v{}", env!("CARGO_PKG_VERSION"));

    let config = ViewConfig::new(cli.rounding);

    match &cli.command {
        Command::Categories => {
            let categories = open_store(&cli)?.list_categories()?;
            if cli.json {
                print_json(&categories)?;
            } else {
                print!("{}", display::render_categories(&categories));
            }
        }

        Command::Conditions { category } => {
            let conditions = open_store(&cli)?
                .list_category_conditions(category)
                .with_context(|| format!("failed to list category {category}"))?;
            if cli.json {
                print_json(&conditions)?;
            } else {
                print!("{}", display::render_conditions(&conditions));
            }
        }

        Command::Show {
            category,
            condition,
            line,
            setting,
            patient,
        } => {
            let browser = GuidelineBrowser::with_session(
                open_store(&cli)?,
                config,
                session_context(&cli, *patient),
            );
            let request = TreatmentRequest {
                line: *line,
                setting: *setting,
            };
            let view = browser.build_treatment_view(category, condition, request)?;
            if cli.json {
                println!("{}", view.to_json()?);
            } else {
                print!("{}", view.to_text());
            }
        }

        Command::Tree {
            category,
            condition,
            answers,
        } => {
            let store = open_store(&cli)?;
            let record = store.load_condition(category, condition)?;
            let Some(tree) = &record.decision_tree else {
                bail!("{} has no decision tree", record.name);
            };
            let Some((entry, _)) = tree.entry() else {
                bail!("{} has an empty decision tree", record.name);
            };

            let mut node_id = entry.to_string();
            let mut outcome = None;
            for &answer in answers {
                let node = tree
                    .node(&node_id)
                    .with_context(|| format!("decision tree has no node {node_id}"))?;
                let step = tree
                    .answer(&node_id, answer)
                    .with_context(|| format!("no answer {answer} for: {}", node.question))?;
                println!("{} -> {}", node.question, node.options[answer].text);
                match step {
                    DecisionStep::Next(next) => node_id = next,
                    DecisionStep::Treatment(key) => {
                        outcome = Some(key);
                        break;
                    }
                    DecisionStep::End => break,
                }
            }

            match outcome {
                Some(key) => {
                    let location = locate_treatment(&record, &key)
                        .with_context(|| format!("treatment {key} is not in any line"))?;
                    println!(
                        "\nRecommended: {} ({}, {})\n",
                        key,
                        location.line.label(),
                        location.setting.as_str()
                    );
                    let browser = GuidelineBrowser::with_session(
                        store,
                        config,
                        SessionContext::with_units(cli.units),
                    );
                    let request = TreatmentRequest {
                        line: location.line,
                        setting: Some(location.setting),
                    };
                    let view = browser.build_treatment_view(category, condition, request)?;
                    print!("{}", view.to_text());
                }
                None => {
                    if let Some(node) = tree.node(&node_id) {
                        print!("{}", display::render_question(node));
                    }
                }
            }
        }

        Command::Drug { name, patient } => {
            let browser = GuidelineBrowser::with_session(
                open_store(&cli)?,
                config,
                session_context(&cli, *patient),
            );
            let view = browser.build_antibiotic_view(name)?;
            if cli.json {
                println!("{}", view.to_json()?);
            } else {
                print!("{}", view.to_text());
            }
        }

        Command::Search { term } => {
            let hits = search(&open_store(&cli)?, term)?;
            if cli.json {
                print_json(&hits)?;
            } else {
                print!("{}", display::render_hits(&hits));
            }
        }

        Command::Convert { text } => {
            println!("{}", format_dosage(text, cli.units));
        }

        Command::Dose {
            weight,
            per_kg,
            frequency,
            max_daily,
            min_weight,
            max_weight,
            age_group,
            adult_dose,
        } => {
            let mut rule = PediatricDosingRule::new(*per_kg, frequency.clone());
            rule.max_daily = *max_daily;
            rule.min_weight = *min_weight;
            rule.max_weight = *max_weight;
            rule.validate("command line").context("invalid dosing rule")?;

            let result = PediatricCalculator::new(cli.rounding).calculate(
                *weight,
                *age_group,
                &rule,
                adult_dose.as_deref(),
            );
            if cli.json {
                print_json(&result)?;
            } else {
                print!("{}", display::render_dose(&result, *weight, cli.units));
            }
        }
    }

    Ok(())
}
