use anyhow::{bail, Context, Result};
use budgetsplit_core::{Bucket, Money, Recurrence, SplitConfig, Transaction};
use budgetsplit_import::{detect, BankFormat, MatchType, Rule};
use budgetsplit_storage::{DataPaths, RuleStore, Settings};
use budgetsplit_sync::{HttpSheetSink, SheetConfig};
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::pipeline::{self, PipelineOptions};
use crate::report;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Bank CSV exports to process
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Account label for the imported rows
    #[arg(short, long)]
    pub account: Option<String>,

    /// Skip detection and read every file as this format
    #[arg(short, long)]
    pub format: Option<BankFormat>,

    /// Push the results to the configured sheet endpoint
    #[arg(long)]
    pub sync: bool,

    /// Print the full run as JSON instead of a report
    #[arg(long)]
    pub json: bool,

    /// Needs target percentage
    #[arg(long)]
    pub needs: Option<Decimal>,

    /// Wants target percentage
    #[arg(long)]
    pub wants: Option<Decimal>,

    /// Savings target percentage
    #[arg(long)]
    pub savings: Option<Decimal>,

    /// How many merchants to list
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

#[derive(Subcommand, Debug)]
pub enum RuleCommands {
    /// List rules in evaluation order, disabled ones last
    List,
    /// Add a rule
    Add {
        /// Rule name
        name: String,
        /// Category assigned on match
        #[arg(short, long)]
        category: String,
        /// Keyword that must appear in the description (repeatable)
        #[arg(short, long = "keyword")]
        keywords: Vec<String>,
        /// Pattern matched according to --match-type
        #[arg(short, long)]
        pattern: Option<String>,
        /// contains, exact, regex or fuzzy:<threshold>
        #[arg(short, long, default_value = "contains")]
        match_type: MatchType,
        /// needs, wants, savings, income or uncategorized
        #[arg(short, long)]
        bucket: Option<Bucket>,
        /// subscription, recurring or one-time
        #[arg(short, long)]
        recurrence: Option<Recurrence>,
        /// Lower numbers are tried first
        #[arg(long, default_value_t = budgetsplit_import::rules::DEFAULT_PRIORITY)]
        priority: i32,
        /// Leave matching transactions out of the totals
        #[arg(long)]
        sweep: bool,
        /// Smallest signed amount matched
        #[arg(long, allow_negative_numbers = true)]
        min: Option<Decimal>,
        /// Largest signed amount matched
        #[arg(long, allow_negative_numbers = true)]
        max: Option<Decimal>,
    },
    /// Delete a rule
    Remove { id: String },
    /// Enable a rule
    Enable { id: String },
    /// Disable a rule without deleting it
    Disable { id: String },
    /// Show how a description would be categorized
    Test {
        description: String,
        /// Signed amount; negative is spending
        #[arg(long, allow_negative_numbers = true, default_value = "-1")]
        amount: Decimal,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective settings
    Show,
    /// Write a settings file with the defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print where settings and rules live
    Path,
}

fn load(data_dir: Option<&Path>) -> Result<(DataPaths, Settings)> {
    let paths = DataPaths::resolve(data_dir).context("Failed to resolve data directory")?;
    let settings = Settings::load(&paths.settings_file()).context("Failed to load settings")?;
    Ok((paths, settings))
}

fn effective_split(settings: &Settings, args: &ImportArgs) -> Result<SplitConfig> {
    let base = settings.split;
    let split = SplitConfig::new(
        args.needs.unwrap_or(base.needs),
        args.wants.unwrap_or(base.wants),
        args.savings.unwrap_or(base.savings),
    )
    .context("Invalid split")?;
    Ok(split)
}

pub async fn import(data_dir: Option<&Path>, args: ImportArgs) -> Result<()> {
    let (paths, settings) = load(data_dir)?;
    let split = effective_split(&settings, &args)?;
    let engine = RuleStore::new(paths.rules_file())
        .engine(settings.engine_options())
        .context("Failed to load rules")?;

    let account = args
        .account
        .as_deref()
        .or(settings.import.default_account.as_deref());
    let opts = PipelineOptions {
        format: args.format,
        account,
        split,
        top_merchants: args.top,
    };
    let mut run = pipeline::run_pipeline(&args.files, &engine, &opts)?;

    if args.sync {
        let outcome = match HttpSheetSink::new(SheetConfig {
            endpoint: settings.sheet.endpoint.clone(),
            token: settings.sheet.token.clone(),
            timeout: Duration::from_secs(settings.sheet.timeout_secs),
        }) {
            Ok(sink) => pipeline::publish(&sink, &settings.sheet.sheet_name, &run).await,
            Err(e) => {
                tracing::error!(error = %e, "sheet sync unavailable");
                pipeline::SyncOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        if let pipeline::SyncOutcome::Failed { error } = &outcome {
            eprintln!("warning: sync failed: {error}");
        }
        run.sync = Some(outcome);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        print!("{}", report::render(&run)?);
    }
    Ok(())
}

pub fn detect(file: &Path) -> Result<()> {
    let reader = std::fs::File::open(file)
        .map(std::io::BufReader::new)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let found = detect::detect_reader(reader)
        .with_context(|| format!("Failed to detect format of {}", file.display()))?;
    let info = found.detection.format.info();
    println!("Format:      {} ({})", info.name, found.detection.format);
    println!("Bank:        {}", info.bank);
    println!("Card type:   {}", info.card_type);
    println!("Categories:  {}", if info.has_categories { "yes" } else { "no" });
    println!("Confidence:  {:.2}", found.detection.confidence);
    println!("Header line: {}", found.line + 1);
    Ok(())
}

fn describe(rule: &Rule) -> String {
    let mut matcher = Vec::new();
    if !rule.keywords.is_empty() {
        matcher.push(format!("keywords [{}]", rule.keywords.join(", ")));
    }
    if let Some(p) = &rule.pattern {
        matcher.push(format!("{} '{}'", rule.match_type, p));
    }
    if let Some(min) = rule.amount_min {
        matcher.push(format!("amount >= {min}"));
    }
    if let Some(max) = rule.amount_max {
        matcher.push(format!("amount <= {max}"));
    }
    if matcher.is_empty() {
        matcher.push("everything".to_string());
    }
    let bucket = rule.bucket.map_or_else(|| "-".to_string(), |b| b.to_string());
    let mut line = format!(
        "{:<8} {:>4}  {:<20} {} -> {} / {}",
        rule.id,
        rule.priority,
        rule.name,
        matcher.join(" + "),
        rule.category,
        bucket
    );
    if let Some(recurrence) = rule.recurrence {
        line.push_str(&format!("  [{recurrence}]"));
    }
    if rule.sweep {
        line.push_str("  [sweep]");
    }
    if !rule.enabled {
        line.push_str("  [disabled]");
    }
    line
}

/// Enabled rules first in the order the engine tries them, then disabled ones.
fn listing_order(rules: &mut [Rule]) {
    rules.sort_by_key(|r| (!r.enabled, r.priority));
}

pub fn rules(data_dir: Option<&Path>, cmd: RuleCommands) -> Result<()> {
    let (paths, settings) = load(data_dir)?;
    let store = RuleStore::new(paths.rules_file());

    match cmd {
        RuleCommands::List => {
            let mut set = store.load()?;
            if set.rules.is_empty() {
                println!("No rules yet. Add one with 'budgetsplit rules add'.");
                return Ok(());
            }
            listing_order(&mut set.rules);
            for rule in &set.rules {
                println!("{}", describe(rule));
            }
        }
        RuleCommands::Add {
            name,
            category,
            keywords,
            pattern,
            match_type,
            bucket,
            recurrence,
            priority,
            sweep,
            min,
            max,
        } => {
            if keywords.is_empty() && pattern.is_none() && min.is_none() && max.is_none() {
                bail!("A rule needs a --keyword, a --pattern, --min or --max");
            }
            let rule = Rule {
                keywords,
                pattern,
                match_type,
                bucket,
                recurrence,
                priority,
                sweep,
                amount_min: min.map(Money::from_decimal),
                amount_max: max.map(Money::from_decimal),
                ..Rule::new(&name, &category)
            };
            let rule = store.add(rule).context("Failed to add rule")?;
            println!("Added {}", describe(&rule));
        }
        RuleCommands::Remove { id } => {
            let rule = store.remove(&id)?;
            println!("Removed '{}' ({})", rule.name, rule.id);
        }
        RuleCommands::Enable { id } => {
            let rule = store.set_enabled(&id, true)?;
            println!("Enabled '{}'", rule.name);
        }
        RuleCommands::Disable { id } => {
            let rule = store.set_enabled(&id, false)?;
            println!("Disabled '{}'", rule.name);
        }
        RuleCommands::Test { description, amount } => {
            let engine = store.engine(settings.engine_options())?;
            let tx = Transaction::new(
                chrono::Local::now().date_naive(),
                &description,
                Money::from_decimal(amount),
                "test",
            );
            let result = engine.categorize(&tx);
            match engine.find_matching_rule(&tx) {
                Some(rule) => println!("Matched:  {}", describe(rule)),
                None => println!("Matched:  no rule"),
            }
            println!("Category: {}", result.category);
            println!("Bucket:   {}", result.bucket);
            println!("Recurs:   {}", result.recurrence);
            println!("Included: {}", if result.included { "yes" } else { "no (swept)" });
        }
    }
    Ok(())
}

pub fn config(data_dir: Option<&Path>, cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Path => {
            let paths = DataPaths::resolve(data_dir)?;
            println!("Data directory: {}", paths.base_dir().display());
            println!("Settings:       {}", paths.settings_file().display());
            println!("Rules:          {}", paths.rules_file().display());
        }
        ConfigCommands::Show => {
            let (_, settings) = load(data_dir)?;
            print!("{}", toml::to_string_pretty(&settings)?);
        }
        ConfigCommands::Init { force } => {
            let paths = DataPaths::resolve(data_dir)?;
            if paths.is_initialized() && !force {
                println!("Settings already exist: {}", paths.settings_file().display());
                return Ok(());
            }
            paths.ensure_directories()?;
            Settings::default().save(&paths.settings_file())?;
            println!("Wrote {}", paths.settings_file().display());
        }
    }
    Ok(())
}
