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

//! Cluster-first, route-second search over two engines.
//!
//! The assignment engine holds only the assignment prefix and enumerates
//! candidate assignments. The full engine holds the prefix and the routing
//! clauses; each candidate is fixed in a scope of its own while the objective
//! bound is tightened, then blocked in the assignment engine.

use std::time::Duration;

use rustsat::types::{Clause, Lit};
use tracing::{debug, info, trace};

use crate::{
    builder::McpEncoding,
    decode::Solution,
    engine::{Check, Engine, Session},
    log_time,
    search::{try_bound, Attempt, Deadline, Outcome, Status},
    Result,
};

pub struct SequentialSearch<'a, E: ?Sized> {
    assignments: &'a mut E,
    full: &'a mut E,
    encoding: &'a McpEncoding,
    deadline: Deadline,
    upper: u64,
    candidates: usize,
}

impl<'a, E: Engine + ?Sized> SequentialSearch<'a, E> {
    /// Creates a search over two engines already loaded with the encoding.
    pub fn new(
        assignments: &'a mut E,
        full: &'a mut E,
        encoding: &'a McpEncoding,
        deadline: Deadline,
    ) -> Self {
        Self {
            assignments,
            full,
            encoding,
            deadline,
            upper: encoding.upper,
            candidates: 0,
        }
    }

    pub fn run(mut self) -> Result<Outcome> {
        let mut best = None;

        let exhausted = loop {
            if self.deadline.expired() {
                break false;
            }

            self.assignments.set_timeout(self.deadline.remaining());
            match self.assignments.check()? {
                Check::Sat => {}
                Check::Unsat => break true,
                Check::Unknown => break false,
            }

            self.candidates += 1;
            let candidate = self.candidate()?;
            debug!(candidate = self.candidates, "routing assignment");

            self.full.push();
            let units: Vec<Clause> = candidate
                .iter()
                .map(|(lit, value)| Clause::from_iter([if *value { *lit } else { !*lit }]))
                .collect();

            self.full.add_clauses(units)?;

            let routed = self.route(&mut best);
            self.full.pop()?;

            match routed? {
                Routed::Exhausted => {}
                Routed::Optimal => break true,
                Routed::TimedOut => break false,
            }

            let blocking: Clause = candidate
                .iter()
                .map(|(lit, value)| if *value { !*lit } else { *lit })
                .collect();

            let assigned: Vec<_> = candidate
                .iter()
                .filter(|(_, value)| *value)
                .filter_map(|(lit, _)| self.encoding.vars.describe(*lit))
                .map(|(_, indices)| (indices[0], indices[1]))
                .collect();

            trace!(?assigned, "blocking assignment");
            self.assignments.add_clauses(vec![blocking])?;
        };

        debug!(candidates = self.candidates, exhausted, "sequential search finished");
        let status = Status::from_best(&best, exhausted);
        Ok(Outcome::new(status, best, &self.deadline))
    }

    /// The assignment found by the last check of the assignment engine.
    fn candidate(&self) -> Result<Vec<(Lit, bool)>> {
        self.encoding
            .vars
            .assign
            .iter()
            .flatten()
            .map(|lit| Ok((*lit, self.assignments.value(*lit)?)))
            .collect()
    }

    /// Tightens the objective bound under the fixed assignment.
    fn route(&mut self, best: &mut Option<Solution>) -> Result<Routed> {
        loop {
            let attempt = try_bound(
                &mut *self.full,
                self.encoding,
                &self.deadline,
                self.upper,
                None,
            )?;

            match attempt {
                Attempt::Found(solution) => {
                    let objective = solution.objective;
                    info!(objective, elapsed = ?self.deadline.elapsed(), "found solution");
                    *best = Some(solution);

                    if objective <= self.encoding.lower {
                        return Ok(Routed::Optimal);
                    }

                    self.upper = objective - 1;
                }
                Attempt::Infeasible => return Ok(Routed::Exhausted),
                Attempt::TimedOut => return Ok(Routed::TimedOut),
            }
        }
    }
}

/// How routing a single candidate assignment ended.
enum Routed {
    /// No better route exists for this assignment.
    Exhausted,

    /// A solution reached the objective lower bound.
    Optimal,

    TimedOut,
}

/// Loads the encoding into two fresh engines and runs the sequential search.
pub fn solve(encoding: &McpEncoding, timeout: Duration) -> Result<Outcome> {
    let (mut assignments, mut full) = log_time("loading engines", || -> Result<_> {
        let mut assignments = Session::new(encoding.pool.clone())?;
        assignments.add_clauses(encoding.assignment.clone())?;

        let mut full = Session::new(encoding.pool.clone())?;
        full.add_clauses(encoding.assignment.clone())?;
        full.add_clauses(encoding.routing.clone())?;

        Ok((assignments, full))
    })?;

    let deadline = Deadline::start(timeout);
    SequentialSearch::new(&mut assignments, &mut full, encoding, deadline).run()
}
