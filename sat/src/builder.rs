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

use std::cmp::Reverse;

use mcp_planner_model::Instance;
use rustsat::{encodings::CollectClauses, instances::ManageVars, types::Clause};
use tracing::{debug, warn};

use crate::{
    bits::{self, constant, num_bits, Bit},
    encode::Encoder,
    engine::ClauseBuffer,
    log_time,
    vars::{VariablePool, Variables},
    Result,
};

/// Which worst-case objective bound to derive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BoundFormula {
    /// Sums the largest item-to-item distances plus the worst depot legs.
    Single,

    /// Sums the largest outgoing distance of as many nodes as a route may leave.
    Sequential,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EncodingOptions {
    pub symmetry_breaking: bool,
    pub implied_constraint: bool,
    pub bounds: BoundFormula,
}

/// The complete clause set of one instance.
///
/// Clauses are split into an assignment prefix (item assignment, capacities
/// and courier symmetry) and the routing clauses built on top of it, so that
/// the prefix can be loaded into an engine of its own.
pub struct McpEncoding {
    pub vars: Variables,

    /// The pool after every encoding variable has been allocated.
    pub pool: VariablePool,

    /// `permutation[slot]` is the input courier encoded in courier slot `slot`.
    pub permutation: Vec<usize>,

    /// No solution has an objective below this.
    pub lower: u64,

    /// No solution has an objective above this.
    pub upper: u64,

    pub assignment: Vec<Clause>,
    pub routing: Vec<Clause>,
}

impl McpEncoding {
    pub fn build(instance: &Instance, options: &EncodingOptions) -> Result<Self> {
        let couriers = instance.couriers();
        let items = instance.items();

        let mut implied = options.implied_constraint;
        if implied && items < couriers {
            warn!(couriers, items, "fewer items than couriers; dropping implied constraints");
            implied = false;
        }

        let mut permutation: Vec<usize> = (0..couriers).collect();
        if options.symmetry_breaking {
            permutation.sort_by_key(|courier| Reverse(instance.capacities[*courier]));
        }

        let lower = lower_bound(instance);
        let upper = match options.bounds {
            BoundFormula::Single => single_upper_bound(instance, implied),
            BoundFormula::Sequential => sequential_upper_bound(instance, implied),
        };

        debug!(lower, upper, "computed objective bounds");

        let load_width = num_bits(saturating_sum(&instance.sizes));
        let distance_width = num_bits(upper);

        let mut pool = VariablePool::default();
        let vars = Variables::allocate(&mut pool, couriers, items, load_width, distance_width);

        let mut assignment = ClauseBuffer::default();
        log_time("encoding assignments", || {
            let mut enc = Encoder::new(&mut assignment, &mut pool);
            encode_assignment(&mut enc, instance, &vars, &permutation, options, implied)
        })?;

        let mut routing = ClauseBuffer::default();
        log_time("encoding routes", || {
            let mut enc = Encoder::new(&mut routing, &mut pool);
            encode_routing(&mut enc, instance, &vars, implied)
        })?;

        debug!(
            variables = pool.max_var().map_or(0, |var| var.idx32() + 1),
            assignment = assignment.n_clauses(),
            routing = routing.n_clauses(),
            "built encoding"
        );

        Ok(Self {
            vars,
            pool,
            permutation,
            lower,
            upper,
            assignment: assignment.into_clauses(),
            routing: routing.into_clauses(),
        })
    }

    /// The travelled distance of every courier slot as binary numbers.
    pub fn distance_rows(&self) -> Vec<Vec<Bit>> {
        self.vars.distances.iter().map(|row| bits::lits(row)).collect()
    }
}

fn encode_assignment(
    enc: &mut Encoder<ClauseBuffer>,
    instance: &Instance,
    vars: &Variables,
    permutation: &[usize],
    options: &EncodingOptions,
    implied: bool,
) -> Result<()> {
    let loads: Vec<Vec<Bit>> = vars.loads.iter().map(|row| bits::lits(row)).collect();
    let assign: Vec<Vec<Bit>> = vars.assign.iter().map(|row| bits::lits(row)).collect();

    if options.symmetry_breaking {
        // capacities are sorted, so loads can be too
        enc.sort_decreasing(&loads)?;

        // couriers with equal loads are ordered by their assignment rows
        for i in 1..vars.couriers {
            let mut clause: Vec<Bit> = enc
                .differs(&loads[i - 1], &loads[i])?
                .into_iter()
                .map(Bit::Lit)
                .collect();

            clause.push(Bit::Lit(enc.leq_lit(&assign[i - 1], &assign[i])?));
            enc.clause(clause)?;
        }
    }

    for j in 0..vars.items {
        enc.exactly_one(&bits::lits(&vars.assign_column(j)))?;
    }

    for (slot, courier) in permutation.iter().copied().enumerate() {
        enc.conditional_sum(&vars.assign[slot], &instance.sizes, &loads[slot])?;
        enc.leq(&loads[slot], &constant(instance.capacities[courier]))?;

        if implied {
            enc.at_least_one(&assign[slot])?;
        }
    }

    Ok(())
}

fn encode_routing(
    enc: &mut Encoder<ClauseBuffer>,
    instance: &Instance,
    vars: &Variables,
    implied: bool,
) -> Result<()> {
    let depot = vars.depot();
    let order: Vec<Vec<Bit>> = vars.order.iter().map(|row| bits::lits(row)).collect();

    for row in order.iter() {
        enc.exactly_one(row)?;
    }

    let flat_distances: Vec<u64> = instance.distances.iter().flatten().copied().collect();

    for i in 0..vars.couriers {
        let route = &vars.route[i];

        for j in 0..depot {
            enc.clause([!Bit::Lit(route[j][j])])?;
        }

        if implied {
            enc.clause([!Bit::Lit(route[depot][depot])])?;
        }

        // an item's row and column are used exactly when it is assigned
        for j in 0..depot {
            let assigned = vars.assign[i][j];
            let row = bits::lits(&route[j]);
            let column = bits::lits(&vars.route_column(i, j));

            enc.guarded(assigned, |enc| {
                enc.exactly_one(&row)?;
                enc.exactly_one(&column)
            })?;

            enc.guarded(!assigned, |enc| {
                enc.all_false(&row)?;
                enc.all_false(&column)
            })?;
        }

        enc.exactly_one(&bits::lits(&route[depot]))?;
        enc.exactly_one(&bits::lits(&vars.route_column(i, depot)))?;

        // sub-cycles away from the depot would need a cyclic order
        for j in 0..depot {
            for k in (0..depot).filter(|k| *k != j) {
                enc.guarded(route[j][k], |enc| enc.successive(&order[j], &order[k]))?;
            }

            enc.guarded(route[depot][j], |enc| enc.clause([order[j][0]]))?;
        }

        let distance = bits::lits(&vars.distances[i]);
        enc.conditional_sum(&vars.flat_route(i), &flat_distances, &distance)?;
    }

    Ok(())
}

/// The largest shortest-path round trip from the depot to a single item.
///
/// The courier delivering an item travels at least that far. Shortest paths
/// are used because distances need not satisfy the triangle inequality.
pub fn lower_bound(instance: &Instance) -> u64 {
    let nodes = instance.items() + 1;
    let depot = instance.depot();
    let mut paths = instance.distances.clone();

    for via in 0..nodes {
        for from in 0..nodes {
            for to in 0..nodes {
                let through = paths[from][via].saturating_add(paths[via][to]);
                if through < paths[from][to] {
                    paths[from][to] = through;
                }
            }
        }
    }

    (0..depot)
        .map(|j| paths[depot][j].saturating_add(paths[j][depot]))
        .max()
        .unwrap_or(0)
}

/// Worst-case route length when each route is bounded edge by edge.
///
/// With the implied constraint a courier serves at most `n - m + 1` items, so
/// it takes at most `n - m` item-to-item edges.
pub fn single_upper_bound(instance: &Instance, implied: bool) -> u64 {
    let depot = instance.depot();
    let items = &instance.distances[..depot];

    let mut maxima: Vec<u64> = items
        .iter()
        .map(|row| row[..depot].iter().copied().max().unwrap_or(0))
        .collect();

    maxima.sort_unstable();

    let skip = if implied { instance.couriers() } else { 1 };
    let edges = saturating_sum(maxima.iter().skip(skip));
    let leave = instance.distances[depot].iter().copied().max().unwrap_or(0);
    let ret = items.iter().map(|row| row[depot]).max().unwrap_or(0);

    edges.saturating_add(leave).saturating_add(ret)
}

/// Worst-case route length when every visited node leaves along its longest edge.
pub fn sequential_upper_bound(instance: &Instance, implied: bool) -> u64 {
    let mut maxima: Vec<u64> = instance
        .distances
        .iter()
        .map(|row| row.iter().copied().max().unwrap_or(0))
        .collect();

    maxima.sort_unstable();

    let skip = if implied {
        instance.couriers().saturating_sub(1)
    } else {
        0
    };

    saturating_sum(maxima.iter().skip(skip))
}

fn saturating_sum<'a>(values: impl IntoIterator<Item = &'a u64>) -> u64 {
    values.into_iter().fold(0, |sum, value| sum.saturating_add(*value))
}
