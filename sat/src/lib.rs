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

//! SAT encoding and objective search for Multiple Couriers Planning.

use std::fmt::Display;

use tracing::{info, span, trace, Level};

pub use mcp_planner_model::{Instance, Objective, SolveRecord};

pub mod bits;
pub mod builder;
pub mod config;
pub mod decode;
pub mod encode;
pub mod engine;
pub mod search;
pub mod sequential;
pub mod vars;

#[cfg(test)]
pub mod tests;

use crate::{
    builder::McpEncoding,
    config::{SearchStrategy, SolverConfig, Variant},
    engine::{Engine, Session},
    search::{Deadline, Outcome, SearchController},
};

pub use crate::decode::Solution;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid search strategy {0:?}, expected Binary or Linear")]
    InvalidStrategy(String),

    #[error("the {variant} variant does not support {strategy} search")]
    UnsupportedStrategy {
        variant: Variant,
        strategy: SearchStrategy,
    },

    #[error("SAT engine failure: {0}")]
    Engine(String),

    #[error("out of memory while encoding")]
    OutOfMemory(#[from] rustsat::OutOfMemory),

    #[error("route of courier #{courier} is not a Hamiltonian cycle")]
    NotHamiltonian { courier: usize },

    #[error(transparent)]
    Instance(#[from] mcp_planner_model::Error),
}

impl Error {
    pub(crate) fn engine(err: impl Display) -> Self {
        Error::Engine(err.to_string())
    }
}

/// Solves an instance under the given configuration.
pub fn solve(instance: &Instance, config: &SolverConfig) -> Result<Outcome> {
    instance.validate()?;
    config.validate()?;

    info!(
        couriers = instance.couriers(),
        items = instance.items(),
        variant = %config.variant,
        strategy = %config.strategy,
        "solving instance"
    );

    let encoding = log_time("building encoding", || {
        McpEncoding::build(instance, &config.encoding_options())
    })?;

    match config.variant {
        Variant::Single => solve_single(encoding, config),
        Variant::Sequential => sequential::solve(&encoding, config.timeout),
    }
}

fn solve_single(mut encoding: McpEncoding, config: &SolverConfig) -> Result<Outcome> {
    let mut session = Session::new(encoding.pool.clone())?;

    log_time("loading engine", || {
        session.add_clauses(std::mem::take(&mut encoding.assignment))?;
        session.add_clauses(std::mem::take(&mut encoding.routing))
    })?;

    let deadline = Deadline::start(config.timeout);
    SearchController::new(&mut session, &encoding, deadline).run(config.strategy)
}

pub(crate) fn log_time<T>(message: &str, cb: impl FnOnce() -> T) -> T {
    let span = span!(
        Level::TRACE,
        "solver_time",
        message = message,
        duration_us = tracing::field::Empty
    );

    let _enter = span.enter();

    trace!("{message}...");

    let start = std::time::Instant::now();
    let result = cb();
    let duration = start.elapsed();
    trace!("{message} took {duration:?}");

    span.record("duration_us", duration.as_micros());

    result
}
