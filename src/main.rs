use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::style::Stylize;
use funifier_lottery::config::{ApiConfig, Config, ConfigVar};
use funifier_lottery::data::{DataExporter, ResultTable};
use funifier_lottery::services::LotteryService;
use funifier_lottery::utils::logging;
use funifier_lottery::FunifierApi;
use std::fs;
use std::path::Path;
use tracing::debug;

mod cli;
mod table_display;

use cli::{Cli, Command};
use table_display::{display_count, display_results};

fn main() {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}", format!("An error occurred: {:#}", e).red());
        if let Some(path) = logging::log_path() {
            eprintln!("{}", format!("Details in {}", path.display()).dark_grey());
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Command::GenerateConfig(args) = &cli.command {
        return generate_config(cli.config.as_deref(), args.force);
    }

    let settings = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if !settings.display.use_colors {
        crossterm::style::force_color_output(false);
    }

    let api_config = api_config(&cli, &settings)?;
    print_parameters(&api_config);
    let api = FunifierApi::with_timeout(api_config, settings.api.timeout())?;
    let show_table = settings.display.show_table && !cli.no_table;
    let max_rows = settings.display.max_display_rows;

    match cli.command {
        Command::Winners(args) => {
            let report = LotteryService::new(&api).winners_report(
                &args.lottery_uid,
                &args.ticket_uid,
                args.with_count,
            )?;
            if show_table {
                display_results(&report.winners, max_rows);
            }
            if let Some(count) = report.participant_count {
                display_count("Participants", count);
            }
            println!("{}", report.status_message().cyan());

            let path = DataExporter::output_path(
                args.output.as_deref(),
                settings.export.output_dir.as_deref(),
                &report.lottery_uid,
            );
            export(&report.winners, &path)?;
        }
        Command::Participants(args) => {
            if args.list {
                let table = api.get_lottery_participants(&args.ticket_uid, args.days)?;
                if show_table {
                    display_results(&table, max_rows);
                }
                if let Some(path) = &args.output {
                    export(&table, path)?;
                }
            } else {
                let count = api.count_lottery_participants(&args.ticket_uid)?;
                display_count("Participants", count);
            }
        }
        Command::WinnersCount(args) => {
            let count = api.count_lottery_winners(&args.lottery_uid, args.days)?;
            display_count("Winners", count);
        }
        Command::PlayerTickets(args) => {
            let count = api.count_player_tickets(&args.player_uid, &args.ticket_uid)?;
            display_count("Tickets", count);
        }
        Command::LotteryUids(args) => {
            let table = api.get_lottery_uids_by_last_n_entries(args.last)?;
            if show_table {
                display_results(&table, max_rows);
            }
            if let Some(path) = &args.output {
                export(&table, path)?;
            }
        }
        Command::Lotteries(args) => {
            let table = api.get_all_lottery_in_date_range(&args.from, &args.to)?;
            if show_table {
                display_results(&table, max_rows);
            }
            if let Some(path) = &args.output {
                export(&table, path)?;
            }
        }
        Command::GenerateConfig(_) => {}
    }
    Ok(())
}

/// Credentials come from a configuration variable file when given,
/// otherwise from flags or the environment combined with the settings file
fn api_config(cli: &Cli, settings: &Config) -> Result<ApiConfig> {
    let mut api_settings = settings.api.clone();
    if let Some(base_url) = &cli.base_url {
        api_settings.base_url = base_url.clone();
    }
    if let Some(version) = &cli.api_version {
        api_settings.version = version.clone();
    }

    if let Some(path) = &cli.config_var {
        let json = fs::read_to_string(path)
            .with_context(|| format!("cannot read configuration variable {}", path.display()))?;
        let from_var = ConfigVar::from_json_str(&json)?.into_api_config()?;
        if cli.base_url.is_none() && cli.api_version.is_none() {
            return Ok(from_var);
        }
        let mut config = ApiConfig::new(
            from_var.api_key(),
            from_var.app_secret(),
            cli.base_url.as_deref().unwrap_or(from_var.base_url()),
            cli.api_version.as_deref().unwrap_or(from_var.version()),
        )?
        .with_header(from_var.header().clone());
        if let Some(scope) = from_var.scope() {
            config = config.with_scope(scope.to_vec());
        }
        if let Some(extra) = from_var.settings() {
            config = config.with_settings(extra.clone());
        }
        return Ok(config);
    }

    let (Some(api_key), Some(secret)) = (&cli.api_key, &cli.secret) else {
        bail!("missing credentials: pass --api-key and --secret, set FUNIFIER_API_KEY and FUNIFIER_APP_SECRET, or use --config-var");
    };
    Ok(api_settings.api_config(api_key, secret)?)
}

fn print_parameters(config: &ApiConfig) {
    println!("{}", "Parameters loaded:".yellow());
    println!("  {:<10} {}", "base url", config.base_url());
    println!("  {:<10} {}", "version", config.version());
    println!("  {:<10} {}", "api key", config.api_key());
    println!("  {:<10} {}", "secret", mask(config.app_secret()));
    if let Some(range) = &config.header().range {
        println!("  {:<10} {}", "range", range);
    }
    println!();
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(2).collect();
    format!("{}{}", visible, "*".repeat(6))
}

fn export(table: &ResultTable, path: &Path) -> Result<()> {
    if table.column_count() == 0 {
        println!("{}", "Nothing to export.".yellow());
        return Ok(());
    }
    let status = DataExporter::export_to_csv(table, path)?;
    println!("{}", status.green());
    Ok(())
}

fn generate_config(explicit: Option<&Path>, force: bool) -> Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => Config::get_config_path()?,
    };
    if path.exists() && !force {
        bail!("{} already exists (use --force to replace it)", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    fs::write(&path, Config::create_default_with_comments())
        .with_context(|| format!("cannot write {}", path.display()))?;
    debug!("Wrote default settings to {}", path.display());
    println!("Configuration file created at: {}", path.display());
    Ok(())
}
