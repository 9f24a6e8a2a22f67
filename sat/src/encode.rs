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

//! Boolean encodings of cardinality constraints and binary arithmetic.
//!
//! Binary numbers are slices of [Bit], most significant digit first.

use rustsat::{
    encodings::CollectClauses,
    instances::ManageVars,
    types::{Clause, Lit},
};
use smallvec::SmallVec;

use crate::{
    bits::{constant, num_bits, pad, to_bits, Bit},
    engine::{ClauseBuffer, Engine},
    vars::VariablePool,
    Result,
};

/// Emits clauses into a collector, allocating auxiliary variables from a pool.
///
/// Every clause emitted inside [Encoder::guarded] is weakened by the negation
/// of each active guard, so a constraint `C` becomes `guard -> C`.
pub struct Encoder<'a, C> {
    collector: &'a mut C,
    pool: &'a mut VariablePool,
    top: Lit,
    guards: SmallVec<[Lit; 2]>,
}

impl<'a, C: CollectClauses> Encoder<'a, C> {
    pub fn new(collector: &'a mut C, pool: &'a mut VariablePool) -> Self {
        let top = pool.top();

        Self {
            collector,
            pool,
            top,
            guards: SmallVec::new(),
        }
    }

    /// Allocates a fresh auxiliary literal.
    pub fn fresh(&mut self) -> Lit {
        self.pool.new_var().pos_lit()
    }

    /// Emits a single clause.
    ///
    /// A true digit satisfies the clause outright and false digits are dropped.
    /// An unguarded clause left empty makes the formula unsatisfiable.
    pub fn clause(&mut self, bits: impl IntoIterator<Item = Bit>) -> Result<()> {
        let mut clause = Clause::new();
        for bit in bits {
            match bit {
                Bit::Const(true) => return Ok(()),
                Bit::Const(false) => {}
                Bit::Lit(lit) => clause.add(lit),
            }
        }

        for guard in self.guards.iter() {
            clause.add(!*guard);
        }

        if clause.is_empty() {
            clause.add(!self.top);
        }

        self.collector.extend_clauses([clause])?;
        Ok(())
    }

    /// Runs `f` with every emitted clause conditional on `guard`.
    pub fn guarded<T>(&mut self, guard: Lit, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.guards.push(guard);
        let result = f(self);
        self.guards.pop();
        result
    }

    /// Constrains at least one digit to be true.
    pub fn at_least_one(&mut self, bits: &[Bit]) -> Result<()> {
        self.clause(bits.iter().copied())
    }

    /// Constrains every digit to be false.
    pub fn all_false(&mut self, bits: &[Bit]) -> Result<()> {
        for bit in bits {
            self.clause([!*bit])?;
        }

        Ok(())
    }

    /// Sequential at-most-one encoding.
    ///
    /// Auxiliary `s[i]` holds when some digit up to `i` is true.
    pub fn at_most_one(&mut self, bits: &[Bit]) -> Result<()> {
        let n = bits.len();
        if n < 2 {
            return Ok(());
        }

        let s: Vec<Bit> = (0..n - 1).map(|_| Bit::Lit(self.fresh())).collect();

        self.clause([!bits[0], s[0]])?;

        for i in 1..n - 1 {
            self.clause([!bits[i], s[i]])?;
            self.clause([!s[i - 1], s[i]])?;
            self.clause([!s[i - 1], !bits[i]])?;
        }

        self.clause([!s[n - 2], !bits[n - 1]])
    }

    pub fn exactly_one(&mut self, bits: &[Bit]) -> Result<()> {
        self.at_least_one(bits)?;
        self.at_most_one(bits)
    }

    /// Constrains two binary numbers to be equal, padding the shorter one.
    pub fn equal(&mut self, v: &[Bit], u: &[Bit]) -> Result<()> {
        let width = v.len().max(u.len());
        let (v, u) = (pad(v, width), pad(u, width));

        for (a, b) in v.into_iter().zip(u) {
            self.clause([!a, b])?;
            self.clause([a, !b])?;
        }

        Ok(())
    }

    /// Constrains `v <= u` as binary numbers of possibly different widths.
    ///
    /// Walks both numbers from the most significant digit, tracking a literal
    /// that is forced whenever the digits seen so far are all equal. Under that
    /// literal the current digit of `v` may not exceed the digit of `u`.
    pub fn leq(&mut self, v: &[Bit], u: &[Bit]) -> Result<()> {
        let width = v.len().max(u.len());
        let (v, u) = (pad(v, width), pad(u, width));

        let mut prefix = Bit::Const(true);
        for (k, (a, b)) in v.iter().copied().zip(u.iter().copied()).enumerate() {
            if prefix == Bit::Const(false) {
                break;
            }

            self.clause([!prefix, !a, b])?;

            if k + 1 == width {
                break;
            }

            let next = match (prefix, a, b) {
                (_, Bit::Const(a), Bit::Const(b)) if a != b => Bit::Const(false),
                (Bit::Const(true), Bit::Const(a), Bit::Const(b)) => Bit::Const(a == b),
                _ => Bit::Lit(self.fresh()),
            };

            self.clause([!prefix, a, b, next])?;
            self.clause([!prefix, !a, !b, next])?;
            prefix = next;
        }

        Ok(())
    }

    /// Returns a literal that implies `v <= u`.
    pub fn leq_lit(&mut self, v: &[Bit], u: &[Bit]) -> Result<Lit> {
        let lit = self.fresh();
        self.guarded(lit, |enc| enc.leq(v, u))?;
        Ok(lit)
    }

    /// Returns one literal per digit, each implying that `v` and `u` differ
    /// at that digit.
    pub fn differs(&mut self, v: &[Bit], u: &[Bit]) -> Result<Vec<Lit>> {
        let width = v.len().max(u.len());
        let (v, u) = (pad(v, width), pad(u, width));

        let mut lits = Vec::with_capacity(width);
        for (a, b) in v.into_iter().zip(u) {
            let lit = self.fresh();
            self.clause([!Bit::Lit(lit), a, b])?;
            self.clause([!Bit::Lit(lit), !a, !b])?;
            lits.push(lit);
        }

        Ok(lits)
    }

    /// Computes the carry of a full adder, allocating a literal only when the
    /// carry is not already determined by known digits.
    fn carry(&mut self, a: Bit, b: Bit, c: Bit) -> Result<Bit> {
        let known: SmallVec<[bool; 3]> = [a, b, c]
            .into_iter()
            .filter_map(|bit| match bit {
                Bit::Const(value) => Some(value),
                Bit::Lit(_) => None,
            })
            .collect();

        let ones = known.iter().filter(|value| **value).count();
        let zeros = known.len() - ones;

        if ones >= 2 {
            return Ok(Bit::Const(true));
        } else if zeros >= 2 {
            return Ok(Bit::Const(false));
        }

        let out = Bit::Lit(self.fresh());
        self.clause([!a, !b, out])?;
        self.clause([!a, !c, out])?;
        self.clause([!b, !c, out])?;
        self.clause([a, b, !out])?;
        self.clause([a, c, !out])?;
        self.clause([b, c, !out])?;
        Ok(out)
    }

    /// Constrains `d <-> a ^ b ^ c`.
    fn xor3(&mut self, a: Bit, b: Bit, c: Bit, d: Bit) -> Result<()> {
        for mask in 0..8u8 {
            let (x, y, z) = (mask & 4 != 0, mask & 2 != 0, mask & 1 != 0);
            let parity = x ^ y ^ z;

            // rules out the assignment (x, y, z) with the wrong output
            let lit = |bit: Bit, value: bool| if value { !bit } else { bit };
            self.clause([lit(a, x), lit(b, y), lit(c, z), lit(d, !parity)])?;
        }

        Ok(())
    }

    /// Constrains `a + b = d` by ripple-carry addition without overflow.
    ///
    /// The operands are padded to the width of `d`; an operand wider than `d`
    /// must have its excess digits false.
    pub fn sum_bin(&mut self, a: &[Bit], b: &[Bit], d: &[Bit]) -> Result<()> {
        let width = d.len();
        let a = self.fit(a, width)?;
        let b = self.fit(b, width)?;

        let mut carry = Bit::Const(false);
        for k in (0..width).rev() {
            self.xor3(a[k], b[k], carry, d[k])?;
            carry = self.carry(a[k], b[k], carry)?;
        }

        self.clause([!carry])
    }

    /// Resizes a binary number to `width` digits, forcing dropped digits false.
    fn fit(&mut self, bits: &[Bit], width: usize) -> Result<Vec<Bit>> {
        if bits.len() <= width {
            return Ok(pad(bits, width));
        }

        let (excess, rest) = bits.split_at(bits.len() - width);
        self.all_false(excess)?;
        Ok(rest.to_vec())
    }

    /// Constrains `delta = sum of alpha[j] for every true x[j]`.
    ///
    /// Builds a chain of partial-sum registers as wide as `delta`. Registers are
    /// only allocated once the running sum may be nonzero: the first nonzero
    /// coefficient selects `alpha[j]` directly through `x[j]`, and zero
    /// coefficients leave the register untouched. A coefficient too wide for
    /// `delta` can never be selected.
    pub fn conditional_sum(&mut self, x: &[Lit], alpha: &[u64], delta: &[Bit]) -> Result<()> {
        let width = delta.len();
        let mut acc = to_bits(0, width);
        let mut started = false;

        for (&x, &alpha) in x.iter().zip(alpha) {
            if alpha == 0 {
                continue;
            }

            if num_bits(alpha) > width {
                self.clause([!Bit::Lit(x)])?;
                continue;
            }

            let summand = to_bits(alpha, width);

            if !started {
                acc = summand
                    .into_iter()
                    .map(|bit| match bit {
                        Bit::Const(true) => Bit::Lit(x),
                        bit => bit,
                    })
                    .collect();

                started = true;
                continue;
            }

            let next: Vec<Bit> = (0..width).map(|_| Bit::Lit(self.fresh())).collect();
            self.guarded(x, |enc| enc.sum_bin(&summand, &acc, &next))?;
            self.guarded(!x, |enc| enc.equal(&next, &acc))?;
            acc = next;
        }

        self.equal(delta, &acc)
    }

    /// Constrains the one-hot position of `u` to directly follow that of `v`.
    ///
    /// Both rows must already be exactly-one. There is no wraparound: the first
    /// slot of `u` and the last slot of `v` are false.
    pub fn successive(&mut self, v: &[Bit], u: &[Bit]) -> Result<()> {
        let (Some(first), Some(last)) = (u.first(), v.last()) else {
            return Ok(());
        };

        self.clause([!*first])?;
        self.equal(&v[..v.len() - 1], &u[1..])?;
        self.clause([!*last])
    }

    /// Constrains binary numbers to be sorted in non-increasing order.
    pub fn sort_decreasing(&mut self, rows: &[Vec<Bit>]) -> Result<()> {
        for pair in rows.windows(2) {
            self.leq(&pair[1], &pair[0])?;
        }

        Ok(())
    }

    /// Constrains every binary number to be at most `bound`.
    pub fn all_leq(&mut self, rows: &[Vec<Bit>], bound: u64) -> Result<()> {
        let bound = constant(bound);
        for row in rows {
            self.leq(row, &bound)?;
        }

        Ok(())
    }

    /// Constrains some binary number to be at least `bound`.
    pub fn some_geq(&mut self, rows: &[Vec<Bit>], bound: u64) -> Result<()> {
        let bound = constant(bound);
        let mut lits = Vec::with_capacity(rows.len());
        for row in rows {
            lits.push(Bit::Lit(self.leq_lit(&bound, row)?));
        }

        self.at_least_one(&lits)
    }
}

/// Encodes clauses with `f` and loads them into the innermost scope of `engine`.
pub fn encode_with<E: Engine + ?Sized, T>(
    engine: &mut E,
    f: impl FnOnce(&mut Encoder<'_, ClauseBuffer>) -> Result<T>,
) -> Result<T> {
    let mut buffer = ClauseBuffer::default();
    let result = {
        let mut encoder = Encoder::new(&mut buffer, engine.vars());
        f(&mut encoder)?
    };

    engine.add_clauses(buffer.into_clauses())?;
    Ok(result)
}
