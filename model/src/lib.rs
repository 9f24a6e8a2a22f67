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

use std::{fmt::Display, ops::Range};

use serde::{Serialize, Serializer};

pub mod parse;
pub mod validate;


pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A Multiple Couriers Planning instance.
///
/// Items are indexed `0..n` and node `n` of the distance matrix is the depot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instance {
    /// The load capacity of each courier.
    pub capacities: Vec<u64>,

    /// The size of each item.
    pub sizes: Vec<u64>,

    /// The `(n+1)×(n+1)` distance matrix, not necessarily symmetric.
    pub distances: Vec<Vec<u64>>,
}

impl Instance {
    /// Creates and validates an instance.
    pub fn new(capacities: Vec<u64>, sizes: Vec<u64>, distances: Vec<Vec<u64>>) -> Result<Self> {
        let instance = Self {
            capacities,
            sizes,
            distances,
        };

        instance.validate()?;
        Ok(instance)
    }

    /// The number of couriers.
    pub fn couriers(&self) -> usize {
        self.capacities.len()
    }

    /// The number of items.
    pub fn items(&self) -> usize {
        self.sizes.len()
    }

    /// The node index of the depot.
    pub fn depot(&self) -> usize {
        self.sizes.len()
    }

    /// The distance from node `from` to node `to`.
    pub fn distance(&self, from: usize, to: usize) -> u64 {
        self.distances[from][to]
    }

    /// Recomputes the length of a depot-rooted route over 0-based items.
    ///
    /// An empty route has length zero. The length saturates at `u64::MAX`.
    pub fn route_distance(&self, route: &[usize]) -> u64 {
        let depot = self.depot();
        let mut total = 0;
        let mut at = depot;
        for item in route.iter().copied() {
            total = self.distance(at, item).saturating_add(total);
            at = item;
        }

        if at != depot {
            total = self.distance(at, depot).saturating_add(total);
        }

        total
    }
}

/// The objective entry of a [SolveRecord].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Objective {
    /// The best objective value found.
    Value(u64),

    /// The instance was proven to have no solution.
    Unsat,

    /// No solution was found before the timeout.
    Unknown,
}

impl Display for Objective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Objective::Value(value) => write!(f, "{value}"),
            Objective::Unsat => write!(f, "UNSAT"),
            Objective::Unknown => write!(f, "N/A"),
        }
    }
}

impl Serialize for Objective {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Objective::Value(value) => serializer.serialize_u64(*value),
            other => serializer.collect_str(other),
        }
    }
}

/// The result of one solver invocation on one instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SolveRecord {
    /// Solving time in whole seconds, capped at the timeout.
    pub time: u64,

    /// Whether the objective (or infeasibility) was proven.
    pub optimal: bool,

    /// The objective value or the reason why there is none.
    pub obj: Objective,

    /// One route per courier, as 1-based item numbers without the depot.
    pub sol: Vec<Vec<usize>>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{message}")]
    Parse { message: String, span: Range<usize> },

    #[error("expected {expected} values in instance, found {got}")]
    ValueCount { expected: usize, got: usize },

    #[error("instance has no couriers")]
    NoCouriers,

    #[error("instance has no items")]
    NoItems,

    #[error("distance matrix has {got} rows but {expected} nodes")]
    RowCount { expected: usize, got: usize },

    #[error("distance matrix row #{row} has length {got}, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        got: usize,
    },
}
