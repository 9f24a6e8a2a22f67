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
    cell::Cell,
    time::{Duration, Instant},
};

use batsat::Callbacks;
use rustsat::{
    encodings::CollectClauses,
    solvers::{Solve, SolveIncremental, SolverResult},
    types::{Clause, Lit},
};
use tracing::trace;

use crate::{log_time, vars::VariablePool, Error, Result};

pub type Oracle = rustsat_batsat::Solver<DeadlineCallbacks>;

thread_local! {
    /// The wall-clock instant at which the running engine call must stop.
    static DEADLINE: Cell<Option<Instant>> = const { Cell::new(None) };
}

/// Batsat callbacks that stop the search once the call's budget is spent.
#[derive(Default)]
pub struct DeadlineCallbacks;

impl Callbacks for DeadlineCallbacks {
    fn stop(&self) -> bool {
        DEADLINE.with(|deadline| deadline.get().is_some_and(|at| Instant::now() >= at))
    }
}

/// The verdict of a single satisfiability check.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Check {
    Sat,
    Unsat,
    /// The engine ran out of time before reaching a verdict.
    Unknown,
}

/// An incremental satisfiability engine with scoped constraints.
pub trait Engine {
    /// The variable pool that encodings for this engine allocate from.
    fn vars(&mut self) -> &mut VariablePool;

    /// Adds clauses to the innermost open scope.
    fn add_clauses(&mut self, clauses: Vec<Clause>) -> Result<()>;

    /// Opens a new scope.
    fn push(&mut self);

    /// Retracts every clause added since the matching [Engine::push].
    fn pop(&mut self) -> Result<()>;

    /// The number of open scopes.
    fn depth(&self) -> usize;

    /// Sets the wall-clock budget of the next [Engine::check].
    fn set_timeout(&mut self, budget: Duration);

    /// Checks the satisfiability of every clause in every open scope.
    fn check(&mut self) -> Result<Check>;

    /// Evaluates a literal in the model of the last satisfiable check.
    fn value(&self, lit: Lit) -> Result<bool>;
}

/// A batsat-backed [Engine].
///
/// Scopes are a stack of guard literals: every clause added inside a scope
/// carries its guard, checks assume every open guard to be false, and popping
/// a scope asserts its guard so that its clauses are satisfied for good.
pub struct Session {
    oracle: Oracle,
    vars: VariablePool,
    scopes: Vec<Lit>,
    budget: Option<Duration>,
}

impl Session {
    /// Creates an empty session allocating from `vars`.
    pub fn new(vars: VariablePool) -> Result<Self> {
        let mut oracle = Oracle::default();
        oracle.add_unit(vars.top()).map_err(Error::engine)?;

        Ok(Self {
            oracle,
            vars,
            scopes: Vec::new(),
            budget: None,
        })
    }
}

impl Engine for Session {
    fn vars(&mut self) -> &mut VariablePool {
        &mut self.vars
    }

    fn add_clauses(&mut self, clauses: Vec<Clause>) -> Result<()> {
        let Some(guard) = self.scopes.last().copied() else {
            CollectClauses::extend_clauses(&mut self.oracle, clauses)?;
            return Ok(());
        };

        let guarded = clauses.into_iter().map(|mut clause| {
            clause.add(guard);
            clause
        });

        CollectClauses::extend_clauses(&mut self.oracle, guarded)?;
        Ok(())
    }

    fn push(&mut self) {
        let guard = self.vars.fresh_lits(1)[0];
        self.scopes.push(guard);
        trace!(depth = self.scopes.len(), "pushed scope");
    }

    fn pop(&mut self) -> Result<()> {
        let Some(guard) = self.scopes.pop() else {
            return Ok(());
        };

        // the guard is forced so it is never reused
        self.oracle.add_unit(guard).map_err(Error::engine)?;
        trace!(depth = self.scopes.len(), "popped scope");
        Ok(())
    }

    fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn set_timeout(&mut self, budget: Duration) {
        self.budget = Some(budget);
    }

    fn check(&mut self) -> Result<Check> {
        if self.budget.is_some_and(|budget| budget.is_zero()) {
            return Ok(Check::Unknown);
        }

        let assumptions: Vec<_> = self.scopes.iter().map(|guard| !*guard).collect();
        let deadline = self.budget.map(|budget| Instant::now() + budget);

        DEADLINE.with(|cell| cell.set(deadline));
        let result = log_time("checking satisfiability", || {
            self.oracle.solve_assumps(&assumptions)
        });
        DEADLINE.with(|cell| cell.set(None));

        match result.map_err(Error::engine)? {
            SolverResult::Sat => Ok(Check::Sat),
            SolverResult::Unsat => Ok(Check::Unsat),
            SolverResult::Interrupted => Ok(Check::Unknown),
        }
    }

    fn value(&self, lit: Lit) -> Result<bool> {
        let value = self.oracle.lit_val(lit).map_err(Error::engine)?;
        Ok(value.to_bool_with_def(false))
    }
}

/// An in-memory clause collector.
///
/// Encodings are built into buffers first so that the same clauses can be
/// replayed into several engines.
#[derive(Clone, Debug, Default)]
pub struct ClauseBuffer {
    clauses: Vec<Clause>,
}

impl CollectClauses for ClauseBuffer {
    fn n_clauses(&self) -> usize {
        self.clauses.len()
    }

    fn extend_clauses<T>(&mut self, cl_iter: T) -> Result<(), rustsat::OutOfMemory>
    where
        T: IntoIterator<Item = Clause>,
    {
        self.clauses.extend(cl_iter);
        Ok(())
    }
}

impl ClauseBuffer {
    pub fn into_clauses(self) -> Vec<Clause> {
        self.clauses
    }
}
