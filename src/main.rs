use crate::format::format_multiplier;
use crate::portfolio::Portfolio;
use crate::simulation::SLIDER_MAX;
use crate::tui::{run_tui, App, Component, DisabledComponents, Tab};

use clap::{arg, value_parser, ArgMatches, Command};
use colored::Colorize;
use eyre::WrapErr;
use serde::Deserialize;
use serde::Serialize;

mod error;
mod form;
mod format;
mod holding;
mod portfolio;
mod simulation;
mod tui;

const APP_NAME: &str = "holdings_rs";

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
struct Config {
    portfolio_file: String,
    currency: String,
    default_tab: String,
    disabled_components: Vec<String>,
    log_file: String,
    log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            portfolio_file: String::new(),
            currency: "USD".to_string(),
            default_tab: "overview".to_string(),
            disabled_components: Vec::new(),
            log_file: String::new(),
            log_level: "info".to_string(),
        }
    }
}

fn file_arg() -> clap::Arg {
    arg!(<FILE> "JSON file with a portfolio snapshot")
        .required(false)
        .default_value("")
}

fn cli() -> Command {
    Command::new(APP_NAME)
        .about("Track stocks, real estate, bitcoin and cash, and simulate bitcoin prices")
        .arg_required_else_help(true)
        .subcommand(Command::new("config").about("Print the path to the config file"))
        .subcommand(
            Command::new("tui")
                .about("Open the interactive portfolio tracker")
                .arg(file_arg())
                .arg(arg!(--tab <TAB> "Tab to open first (overview, holdings)").required(false)),
        )
        .subcommand(
            Command::new("balances")
                .about("Show the current balances of your portfolio")
                .arg(file_arg()),
        )
        .subcommand(
            Command::new("allocation")
                .about("Show the current allocation of your portfolio")
                .arg(file_arg()),
        )
        .subcommand(
            Command::new("simulate")
                .about("Show the portfolio with bitcoin at a simulated price")
                .arg(
                    arg!(<POSITION> "Slider position, 0-400 (200 keeps the real price)")
                        .value_parser(value_parser!(u16).range(..=i64::from(SLIDER_MAX))),
                )
                .arg(file_arg()),
        )
}

/// Route log records to stderr, or for the TUI to the configured log file
/// (dropped when none is set) so they never draw over the screen.
fn init_logging(cfg: &Config, interactive: bool) -> eyre::Result<()> {
    let env = env_logger::Env::default().default_filter_or(cfg.log_level.as_str());
    let mut builder = env_logger::Builder::from_env(env);

    if !cfg.log_file.is_empty() {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&cfg.log_file)
            .wrap_err_with(|| format!("Failed to open log file {}", cfg.log_file))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    } else if interactive {
        builder.target(env_logger::Target::Pipe(Box::new(std::io::sink())));
    }

    builder.try_init().wrap_err("Failed to initialise logging")
}

/// FILE argument first, configured portfolio file second.
fn portfolio_path(matches: &ArgMatches, cfg: &Config) -> Option<String> {
    let from_arg = matches
        .try_get_one::<String>("FILE")
        .ok()
        .flatten()
        .filter(|f| !f.is_empty());

    match from_arg {
        Some(f) => Some(f.to_string()),
        None if !cfg.portfolio_file.is_empty() => Some(cfg.portfolio_file.clone()),
        None => None,
    }
}

fn load_portfolio(filename: &str) -> eyre::Result<Portfolio> {
    let portfolio = Portfolio::from_file(filename)
        .wrap_err_with(|| format!("Could not load portfolio from {filename}"))?;
    log::info!(
        "loaded {} stocks and {} properties from {filename}",
        portfolio.stocks.len(),
        portfolio.real_estate.len()
    );
    Ok(portfolio)
}

fn print_header(title: &str) {
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    println!("{} {}", title.bold(), format!("as of {now}").dimmed());
}

fn main() -> eyre::Result<()> {
    let cfg: Config = confy::load(APP_NAME, "config").wrap_err("Failed to load config")?;

    let matches = cli().get_matches();
    let interactive = matches.subcommand_name() == Some("tui");
    init_logging(&cfg, interactive)?;

    match matches.subcommand() {
        Some(("config", _)) => {
            let path = confy::get_configuration_file_path(APP_NAME, "config")
                .wrap_err("Failed to locate config file")?;
            println!("Your config file is located here: \n{}", path.display());
            println!("\nComponents that can be listed under disabled_components:");
            for component in Component::all() {
                println!("  {: <20} {}", component.as_str(), component.description());
            }
        }
        Some(("tui", sub_matches)) => {
            // an empty session is fine here, unlike the reports below
            let portfolio = match portfolio_path(sub_matches, &cfg) {
                Some(filename) => load_portfolio(&filename)?,
                None => Portfolio::new(),
            };

            let tab_name = sub_matches
                .get_one::<String>("tab")
                .cloned()
                .unwrap_or_else(|| cfg.default_tab.clone());
            let tab = Tab::from_str(&tab_name);
            if tab.is_none() {
                log::warn!("unknown tab '{tab_name}', opening overview");
            }

            let disabled = DisabledComponents::new(&cfg.disabled_components);
            let app = App::new(portfolio, cfg.currency.clone(), disabled);
            run_tui(app, tab).wrap_err("Terminal UI failed")?;
        }
        Some((report @ ("balances" | "allocation" | "simulate"), sub_matches)) => {
            let Some(filename) = portfolio_path(sub_matches, &cfg) else {
                cli().print_help()?;
                return Ok(());
            };
            let mut portfolio = load_portfolio(&filename)?;

            match report {
                "balances" => {
                    print_header("Balances");
                    portfolio.print(&cfg.currency);
                }
                "allocation" => {
                    portfolio.draw_pie_chart();
                    portfolio.print_allocation();
                }
                _ => {
                    let position = sub_matches
                        .get_one::<u16>("POSITION")
                        .copied()
                        .unwrap_or_default();
                    portfolio.set_slider(position);
                    if !portfolio.is_simulating() {
                        portfolio.toggle_simulation();
                    }
                    print_header("Simulation");
                    let line = format!(
                        "Slider {position} ({}): bitcoin at {} the real price",
                        portfolio.slider.regime(),
                        format_multiplier(portfolio.slider.multiplier())
                    );
                    if portfolio.slider.multiplier() == 0.0 {
                        println!("{}", line.red());
                    } else {
                        println!("{}", line.yellow());
                    }
                    portfolio.print(&cfg.currency);
                }
            }
        }
        _ => {}
    }

    Ok(())
}
