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

//! Objective bound tightening over a satisfiability engine.

use std::time::{Duration, Instant};

use mcp_planner_model::{Objective, SolveRecord};
use tracing::{debug, info};

use crate::{
    builder::McpEncoding,
    config::SearchStrategy,
    decode::{decode, Solution},
    encode::encode_with,
    engine::{Check, Engine},
    Result,
};

/// How a search ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    /// The best solution found is proven optimal.
    Optimal,

    /// The search timed out after finding a solution.
    Feasible,

    /// The instance is proven to have no solution.
    Unsat,

    /// The search timed out before finding any solution.
    Unknown,
}

impl Status {
    pub(crate) fn from_best(best: &Option<Solution>, exhausted: bool) -> Self {
        match (best.is_some(), exhausted) {
            (true, true) => Status::Optimal,
            (true, false) => Status::Feasible,
            (false, true) => Status::Unsat,
            (false, false) => Status::Unknown,
        }
    }

    /// Whether the search ran to completion.
    pub fn is_proven(&self) -> bool {
        matches!(self, Status::Optimal | Status::Unsat)
    }
}

/// The final result of a search.
#[derive(Clone, Debug)]
pub struct Outcome {
    pub status: Status,
    pub solution: Option<Solution>,

    /// Wall-clock solving time, excluding encoding.
    pub elapsed: Duration,
    pub timeout: Duration,
}

impl Outcome {
    pub fn new(status: Status, solution: Option<Solution>, deadline: &Deadline) -> Self {
        Self {
            status,
            solution,
            elapsed: deadline.elapsed(),
            timeout: deadline.timeout,
        }
    }

    pub fn objective(&self) -> Objective {
        match (&self.solution, self.status) {
            (Some(solution), _) => Objective::Value(solution.objective),
            (None, Status::Unsat) => Objective::Unsat,
            (None, _) => Objective::Unknown,
        }
    }

    /// Summarizes this outcome as a result record.
    ///
    /// Unfinished searches report the whole timeout as their solving time.
    pub fn record(&self) -> SolveRecord {
        let cap = self.timeout.as_secs();
        let time = match self.status.is_proven() {
            true => self.elapsed.as_secs().min(cap),
            false => cap,
        };

        SolveRecord {
            time,
            optimal: self.status.is_proven(),
            obj: self.objective(),
            sol: self.solution.as_ref().map(Solution::sol).unwrap_or_default(),
        }
    }
}

/// A single wall-clock deadline shared by every engine call of a search.
#[derive(Copy, Clone, Debug)]
pub struct Deadline {
    start: Instant,
    timeout: Duration,
}

impl Deadline {
    pub fn start(timeout: Duration) -> Self {
        Self {
            start: Instant::now(),
            timeout,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.timeout.saturating_sub(self.elapsed())
    }

    pub fn expired(&self) -> bool {
        self.remaining().is_zero()
    }
}

/// The result of checking a single objective bound.
#[derive(Clone, Debug)]
pub enum Attempt {
    Found(Solution),
    Infeasible,
    TimedOut,
}

/// Looks for a solution with every distance at most `upper` and, if given,
/// some distance at least `lower`.
///
/// The bound constraints live in their own scope that is popped again before
/// returning, after the model has been decoded.
pub fn try_bound<E: Engine + ?Sized>(
    engine: &mut E,
    encoding: &McpEncoding,
    deadline: &Deadline,
    upper: u64,
    lower: Option<u64>,
) -> Result<Attempt> {
    if deadline.expired() {
        return Ok(Attempt::TimedOut);
    }

    let rows = encoding.distance_rows();

    engine.push();
    encode_with(engine, |enc| {
        enc.all_leq(&rows, upper)?;

        if let Some(lower) = lower {
            enc.some_geq(&rows, lower)?;
        }

        Ok(())
    })?;

    engine.set_timeout(deadline.remaining());
    let check = engine.check()?;
    debug!(upper, ?lower, ?check, "checked objective bound");

    let attempt = match check {
        Check::Sat => Attempt::Found(decode(engine, encoding)?),
        Check::Unsat => Attempt::Infeasible,
        Check::Unknown => Attempt::TimedOut,
    };

    engine.pop()?;
    Ok(attempt)
}

/// Drives a single engine holding the complete encoding.
pub struct SearchController<'a, E: ?Sized> {
    engine: &'a mut E,
    encoding: &'a McpEncoding,
    deadline: Deadline,
    best: Option<Solution>,
}

impl<'a, E: Engine + ?Sized> SearchController<'a, E> {
    pub fn new(engine: &'a mut E, encoding: &'a McpEncoding, deadline: Deadline) -> Self {
        Self {
            engine,
            encoding,
            deadline,
            best: None,
        }
    }

    pub fn run(self, strategy: SearchStrategy) -> Result<Outcome> {
        match strategy {
            SearchStrategy::Binary => self.binary(),
            SearchStrategy::Linear => self.linear(),
        }
    }

    /// Records a new best solution and returns its objective.
    fn improve(&mut self, solution: Solution) -> u64 {
        let objective = solution.objective;
        info!(objective, elapsed = ?self.deadline.elapsed(), "found solution");
        self.best = Some(solution);
        objective
    }

    fn finish(self, exhausted: bool) -> Outcome {
        let status = Status::from_best(&self.best, exhausted);
        debug!(?status, "search finished");
        Outcome::new(status, self.best, &self.deadline)
    }

    /// Bisects the objective range, one scope per candidate bound.
    pub fn binary(mut self) -> Result<Outcome> {
        let mut lower = self.encoding.lower;
        let mut upper = self.encoding.upper;

        while lower <= upper {
            let mid = lower + (upper - lower) / 2;
            debug!(lower, upper, mid, "bisecting objective");

            let attempt = try_bound(
                &mut *self.engine,
                self.encoding,
                &self.deadline,
                mid,
                Some(lower),
            )?;

            match attempt {
                Attempt::Found(solution) => {
                    let objective = self.improve(solution);
                    if objective <= lower {
                        break;
                    }

                    upper = objective - 1;
                }
                Attempt::Infeasible => lower = mid + 1,
                Attempt::TimedOut => return Ok(self.finish(false)),
            }
        }

        Ok(self.finish(true))
    }

    /// Tightens a single upper bound until no better solution exists.
    pub fn linear(mut self) -> Result<Outcome> {
        let lower = self.encoding.lower;
        let mut upper = self.encoding.upper;

        loop {
            let attempt = try_bound(&mut *self.engine, self.encoding, &self.deadline, upper, None)?;

            match attempt {
                Attempt::Found(solution) => {
                    let objective = self.improve(solution);
                    if objective <= lower {
                        return Ok(self.finish(true));
                    }

                    upper = objective - 1;
                }
                Attempt::Infeasible => return Ok(self.finish(true)),
                Attempt::TimedOut => return Ok(self.finish(false)),
            }
        }
    }
}
