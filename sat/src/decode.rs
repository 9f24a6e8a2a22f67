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

use bitvec::prelude::*;
use rustsat::types::Lit;
use tracing::debug;

use crate::{bits::from_bits, builder::McpEncoding, engine::Engine, Error, Result};

/// A routed solution in input courier order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solution {
    /// The 0-based items each courier delivers, in delivery order.
    pub routes: Vec<Vec<usize>>,

    /// The travelled distance of each courier.
    pub distances: Vec<u64>,

    /// The largest travelled distance.
    pub objective: u64,
}

impl Solution {
    /// The routes as 1-based item numbers.
    pub fn sol(&self) -> Vec<Vec<usize>> {
        self.routes
            .iter()
            .map(|route| route.iter().map(|item| item + 1).collect())
            .collect()
    }
}

/// Checks that an adjacency matrix forms a single cycle through the depot.
///
/// The depot is the last node. Following outgoing edges from the depot must
/// visit as many nodes as there are edges, which rules out a detached cycle
/// next to a depot self-loop.
pub fn is_hamiltonian(matrix: &[BitVec]) -> bool {
    let Some(depot) = matrix.len().checked_sub(1) else {
        return false;
    };

    let mut visited = bitvec![0; matrix.len()];
    let mut node = depot;
    while !visited[node] {
        visited.set(node, true);

        match matrix[node].first_one() {
            Some(next) => node = next,
            None => break,
        }
    }

    let edges: usize = matrix.iter().map(|row| row.count_ones()).sum();
    visited.count_ones() == edges
}

/// Reads the values of a row of literals out of the engine's model.
fn evaluate<E: Engine + ?Sized>(engine: &E, lits: &[Lit]) -> Result<BitVec> {
    lits.iter().map(|lit| engine.value(*lit)).collect()
}

/// Decodes the engine's model into a validated [Solution].
pub fn decode<E: Engine + ?Sized>(engine: &E, encoding: &McpEncoding) -> Result<Solution> {
    let vars = &encoding.vars;
    let couriers = vars.couriers;

    let mut slot_routes = vec![vec![None; vars.items]; couriers];
    let mut slot_distances = Vec::with_capacity(couriers);

    for slot in 0..couriers {
        let matrix = vars.route[slot]
            .iter()
            .map(|row| evaluate(engine, row))
            .collect::<Result<Vec<_>>>()?;

        if !is_hamiltonian(&matrix) {
            let edges = vars
                .flat_route(slot)
                .into_iter()
                .zip(matrix.iter().flat_map(|row| row.iter().by_vals()))
                .filter(|(_, used)| *used)
                .filter_map(|(lit, _)| vars.describe(lit))
                .map(|(_, indices)| (indices[1], indices[2]))
                .collect::<Vec<_>>();

            debug!(slot, ?edges, "route is not a single cycle");
            return Err(Error::NotHamiltonian {
                courier: encoding.permutation[slot],
            });
        }

        slot_distances.push(from_bits(evaluate(engine, &vars.distances[slot])?));
    }

    let assign = vars
        .assign
        .iter()
        .map(|row| evaluate(engine, row))
        .collect::<Result<Vec<_>>>()?;

    for (item, order) in vars.order.iter().enumerate() {
        let Some(position) = evaluate(engine, order)?.first_one() else {
            continue;
        };

        if let Some(slot) = assign.iter().position(|row| row[item]) {
            slot_routes[slot][position] = Some(item);
        }
    }

    let mut routes = vec![Vec::new(); couriers];
    let mut distances = vec![0; couriers];
    for (slot, courier) in encoding.permutation.iter().copied().enumerate() {
        routes[courier] = slot_routes[slot].iter().flatten().copied().collect();
        distances[courier] = slot_distances[slot];
    }

    let objective = distances.iter().copied().max().unwrap_or(0);

    Ok(Solution {
        routes,
        distances,
        objective,
    })
}
