// Copyright (C) 2025 Marceline Cramer
// SPDX-License-Identifier: AGPL-3.0-or-later
//
// MCP Planner is free software: you can redistribute it and/or modify it under
// the terms of the GNU Affero General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option) any
// later version.
//
// MCP Planner is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for
// more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with MCP Planner. If not, see <https://www.gnu.org/licenses/>.

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use mcp_planner_model::{Instance, SolveRecord};
use mcp_planner_sat::{
    config::{SolverConfig, Variant, PRESETS},
    search::Outcome,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Solves an instance with a single configuration.
    Solve {
        /// The path to the instance file.
        path: PathBuf,

        /// The solver layout to use.
        #[arg(long, default_value_t = Variant::Single)]
        variant: Variant,

        /// The search strategy, either Binary or Linear.
        #[arg(long, default_value = "Binary")]
        strategy: String,

        #[arg(long)]
        no_symmetry_breaking: bool,

        #[arg(long)]
        no_implied: bool,

        /// The solving timeout in seconds.
        #[arg(long, default_value_t = 300)]
        timeout: u64,

        /// Prints the route of every courier.
        #[arg(long)]
        display: bool,
    },

    /// Solves an instance with every preset configuration.
    Run {
        /// The path to the instance file.
        path: PathBuf,

        /// The solving timeout of each preset in seconds.
        #[arg(long, default_value_t = 300)]
        timeout: u64,

        /// Prints the route of every courier.
        #[arg(long)]
        display: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_env_var("MCP_PLANNER_LOG")
        .with_default_directive("mcp_planner=info".parse().unwrap())
        .from_env()
        .expect("failed to parse logging directives");

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    match args.command {
        Command::Solve {
            path,
            variant,
            strategy,
            no_symmetry_breaking,
            no_implied,
            timeout,
            display,
        } => {
            let Some(instance) = load_instance(&path) else {
                return ExitCode::FAILURE;
            };

            let config = SolverConfig {
                variant,
                symmetry_breaking: !no_symmetry_breaking,
                implied_constraint: !no_implied,
                timeout: Duration::from_secs(timeout),
                ..Default::default()
            };

            let config = match config.with_strategy(&strategy) {
                Ok(config) => config,
                Err(err) => {
                    error!("{err}");
                    return ExitCode::FAILURE;
                }
            };

            let Some(record) = run_config(&instance, &config, display) else {
                return ExitCode::FAILURE;
            };

            print_json(&record)
        }
        Command::Run {
            path,
            timeout,
            display,
        } => {
            let Some(instance) = load_instance(&path) else {
                return ExitCode::FAILURE;
            };

            let mut records = IndexMap::new();
            for name in PRESETS.iter().copied() {
                let Some(config) = SolverConfig::preset(name) else {
                    continue;
                };

                let config = SolverConfig {
                    timeout: Duration::from_secs(timeout),
                    ..config
                };

                info!("running preset {name}");
                let Some(record) = run_config(&instance, &config, display) else {
                    return ExitCode::FAILURE;
                };

                records.insert(name, record);
            }

            print_json(&records)
        }
    }
}

/// Reads and parses an instance file, reporting any errors.
pub fn load_instance(path: &Path) -> Option<Instance> {
    let src = match std::fs::read_to_string(path) {
        Ok(src) => src,
        Err(err) => {
            error!("failed to read {}: {err}", path.display());
            return None;
        }
    };

    let name = path.display().to_string();
    match Instance::parse(&src) {
        Ok(instance) => Some(instance),
        Err(mcp_planner_model::Error::Parse { message, span }) => {
            let report = Report::build(ReportKind::Error, (name.as_str(), span.clone()))
                .with_message("failed to parse instance")
                .with_label(
                    Label::new((name.as_str(), span))
                        .with_message(message)
                        .with_color(Color::Red),
                )
                .finish();

            if let Err(err) = report.eprint((name.as_str(), Source::from(&src))) {
                error!("failed to print report: {err}");
            }

            None
        }
        Err(err) => {
            error!("invalid instance {name}: {err}");
            None
        }
    }
}

/// Solves one configuration, optionally printing its routes.
pub fn run_config(instance: &Instance, config: &SolverConfig, display: bool) -> Option<SolveRecord> {
    let outcome = match mcp_planner_sat::solve(instance, config) {
        Ok(outcome) => outcome,
        Err(err) => {
            error!("solving failed: {err}");
            return None;
        }
    };

    let record = outcome.record();
    info!(obj = %record.obj, time = record.time, optimal = record.optimal, "solved");

    if display {
        display_routes(&outcome);
    }

    Some(record)
}

/// Prints each courier's route and travelled distance.
pub fn display_routes(outcome: &Outcome) {
    let Some(solution) = outcome.solution.as_ref() else {
        eprintln!("no solution found");
        return;
    };

    eprintln!("objective value: {}", solution.objective);
    for (route, distance) in solution.sol().iter().zip(solution.distances.iter()) {
        let stops: String = route.iter().map(|item| format!(" --> {item}")).collect();
        eprintln!("Origin{stops} --> Origin: travelled {distance}");
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("failed to serialize result: {err}");
            ExitCode::FAILURE
        }
    }
}
