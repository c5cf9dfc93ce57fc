use chainwatch_dashboard::{historical::QueryState, series::TableRow, Dashboard, Event};
use chainwatch_utils::{config::Config, disk_storage::DiskStorageInterface};
use clap::Parser;
use console::style;

use crate::cli::{Cli, Commands};

mod cli;
mod panic_hook;

#[tokio::main]
async fn main() {
    panic_hook::set();

    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        if error.is_connect() {
            eprintln!(
                "{} please check your internet connection - {error}",
                style("error:").red()
            );
        } else if error.is_validation() {
            eprintln!(
                "{} {error} (dates are YYYY-MM-DD, start before end)",
                style("error:").red()
            );
            std::process::exit(2);
        } else {
            eprintln!("{} {error}", style("error:").red());
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> chainwatch_dashboard::Result<()> {
    let mut config = Config::load()?;
    cli.apply_overrides(&mut config);
    chainwatch_utils::log::init(&config.log_filter)?;

    match cli.cmd {
        Commands::Watch { addresses } => {
            let mut dashboard = Dashboard::from_config(&config)?;
            for address in addresses {
                dashboard.handle_event(Event::AddressInput(address));
                dashboard.handle_event(Event::AddAddress);
            }
            dashboard.settle().await;

            print_rows(("Address", "Balance (ETH)"), &dashboard.watchlist().rows());
        }
        Commands::History { token, start, end } => {
            let mut dashboard = Dashboard::from_config(&config)?;
            dashboard.handle_event(Event::TokenInput(token));
            dashboard.handle_event(Event::StartDateInput(start));
            dashboard.handle_event(Event::EndDateInput(end));
            dashboard.handle_event(Event::FetchHistory);
            dashboard.settle().await;

            let history = dashboard.history();
            if let QueryState::Error(error) = history.state() {
                return Err(error.clone().into());
            }

            println!("{}", style(history.chart_title()).bold());
            let rows: Vec<TableRow> = history
                .rows()
                .into_iter()
                .map(|row| TableRow {
                    value: format!("${}", row.value),
                    ..row
                })
                .collect();
            print_rows(("Date", "Price (USD)"), &rows);
        }
        Commands::Config { save } => {
            print!("{}", config.to_toml()?);
            if save {
                config.save()?;
                println!("saved to {}", Config::path()?.display());
            }
        }
    }

    Ok(())
}

fn print_rows(header: (&str, &str), rows: &[TableRow]) {
    let width = rows
        .iter()
        .map(|row| row.label.len())
        .chain(std::iter::once(header.0.len()))
        .max()
        .unwrap_or_default();

    println!(
        "{}",
        style(format!("{:<width$}  {:>16}", header.0, header.1)).bold()
    );
    for row in rows {
        println!("{:<width$}  {:>16}", row.label, row.value);
    }
}
