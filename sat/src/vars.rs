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

use rustsat::{
    instances::ManageVars,
    types::{Lit, Var},
};
use smallvec::{smallvec, SmallVec};

/// Allocator for SAT variables.
///
/// Variable zero is reserved as the constant true literal, which every
/// engine asserts before anything else is loaded.
#[derive(Clone, Debug)]
pub struct VariablePool {
    next_var: u32,
    used_num: u32,
}

impl Default for VariablePool {
    fn default() -> Self {
        Self {
            next_var: 1,
            used_num: 1,
        }
    }
}

impl VariablePool {
    /// The literal that is always true.
    pub fn top(&self) -> Lit {
        Var::new(0).pos_lit()
    }

    /// Allocates a row of fresh positive literals.
    pub fn fresh_lits(&mut self, num: usize) -> Vec<Lit> {
        (0..num).map(|_| self.new_var().pos_lit()).collect()
    }
}

impl ManageVars for VariablePool {
    fn new_var(&mut self) -> Var {
        self.used_num += 1;
        let var = self.next_var;
        self.next_var += 1;
        Var::new(var)
    }

    fn max_var(&self) -> Option<Var> {
        self.next_var.checked_sub(1).map(Var::new)
    }

    fn increase_next_free(&mut self, v: Var) -> bool {
        if v.idx32() < self.next_var {
            return false;
        }

        self.used_num += v.idx32() - self.next_var;
        self.next_var = v.idx32();
        true
    }

    fn combine(&mut self, other: Self) {
        self.next_var = self.next_var.max(other.next_var);
        self.used_num = self.used_num.max(other.used_num);
    }

    fn n_used(&self) -> u32 {
        self.used_num
    }

    fn forget_from(&mut self, min_var: Var) {
        let min_var = min_var.idx32().max(1);
        if min_var < self.next_var {
            self.used_num -= self.next_var - min_var;
            self.next_var = min_var;
        }
    }
}

/// The role a problem variable plays in the encoding.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum Role {
    /// `A[i][j]`: courier `i` delivers item `j`.
    Assign,

    /// `R[i][j][k]`: courier `i` travels directly from node `j` to node `k`.
    Route,

    /// `T[j][k]`: item `j` is the `k`-th delivery on its route.
    Order,

    /// Digit `k` (most significant first) of courier `i`'s load.
    Load,

    /// Digit `k` (most significant first) of courier `i`'s travelled distance.
    Distance,
}

/// Registry of every problem variable of one instance.
///
/// All variables are allocated once, contiguously and in [Role] order, so a
/// literal can be mapped back to its role and indices without a lookup table.
/// Courier indices are symmetry-breaking slots, not input couriers.
#[derive(Clone, Debug)]
pub struct Variables {
    pub couriers: usize,
    pub items: usize,
    pub assign: Vec<Vec<Lit>>,
    pub route: Vec<Vec<Vec<Lit>>>,
    pub order: Vec<Vec<Lit>>,
    pub loads: Vec<Vec<Lit>>,
    pub distances: Vec<Vec<Lit>>,
    first: u32,
}

impl Variables {
    /// Allocates the registry for `couriers` couriers and `items` items.
    pub fn allocate(
        pool: &mut VariablePool,
        couriers: usize,
        items: usize,
        load_width: usize,
        distance_width: usize,
    ) -> Self {
        let nodes = items + 1;
        let first = pool.max_var().map_or(0, |var| var.idx32() + 1);

        let assign = (0..couriers).map(|_| pool.fresh_lits(items)).collect();

        let route = (0..couriers)
            .map(|_| (0..nodes).map(|_| pool.fresh_lits(nodes)).collect())
            .collect();

        let order = (0..items).map(|_| pool.fresh_lits(items)).collect();
        let loads = (0..couriers).map(|_| pool.fresh_lits(load_width)).collect();

        let distances = (0..couriers)
            .map(|_| pool.fresh_lits(distance_width))
            .collect();

        Self {
            couriers,
            items,
            assign,
            route,
            order,
            loads,
            distances,
            first,
        }
    }

    /// The node index of the depot.
    pub fn depot(&self) -> usize {
        self.items
    }

    /// The assignment literals of item `j`, one per courier.
    pub fn assign_column(&self, j: usize) -> Vec<Lit> {
        self.assign.iter().map(|row| row[j]).collect()
    }

    /// The literals of every edge of courier `i` entering node `k`.
    pub fn route_column(&self, i: usize, k: usize) -> Vec<Lit> {
        self.route[i].iter().map(|row| row[k]).collect()
    }

    /// Courier `i`'s route matrix flattened in row-major order.
    pub fn flat_route(&self, i: usize) -> Vec<Lit> {
        self.route[i].iter().flatten().copied().collect()
    }

    /// Looks up a problem variable by role and indices.
    pub fn lookup(&self, role: Role, indices: &[usize]) -> Option<Lit> {
        match (role, indices) {
            (Role::Assign, [i, j]) => self.assign.get(*i)?.get(*j).copied(),
            (Role::Route, [i, j, k]) => self.route.get(*i)?.get(*j)?.get(*k).copied(),
            (Role::Order, [j, k]) => self.order.get(*j)?.get(*k).copied(),
            (Role::Load, [i, k]) => self.loads.get(*i)?.get(*k).copied(),
            (Role::Distance, [i, k]) => self.distances.get(*i)?.get(*k).copied(),
            _ => None,
        }
    }

    /// Maps a literal back to the role and indices of its variable.
    ///
    /// Auxiliary variables introduced by encodings have no description.
    pub fn describe(&self, lit: Lit) -> Option<(Role, SmallVec<[usize; 3]>)> {
        let mut idx = lit.var().idx32().checked_sub(self.first)? as usize;
        let nodes = self.items + 1;

        let blocks = [
            (Role::Assign, self.couriers, self.items),
            (Role::Route, self.couriers * nodes, nodes),
            (Role::Order, self.items, self.items),
            (Role::Load, self.couriers, self.loads.first().map_or(0, Vec::len)),
            (
                Role::Distance,
                self.couriers,
                self.distances.first().map_or(0, Vec::len),
            ),
        ];

        for (role, rows, width) in blocks {
            let size = rows * width;
            if idx >= size {
                idx -= size;
                continue;
            }

            let (row, col) = (idx / width, idx % width);
            let indices = match role {
                Role::Route => smallvec![row / nodes, row % nodes, col],
                _ => smallvec![row, col],
            };

            return Some((role, indices));
        }

        None
    }
}
