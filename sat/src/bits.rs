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

use std::ops::Not;

use rustsat::types::Lit;

/// A Boolean that may already be known while encoding.
///
/// Constants are folded away when clauses are emitted, so binary numbers can
/// freely mix known digits (capacities, distances, bounds) with literals.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Bit {
    Const(bool),
    Lit(Lit),
}

impl Not for Bit {
    type Output = Bit;

    fn not(self) -> Self::Output {
        match self {
            Bit::Const(value) => Bit::Const(!value),
            Bit::Lit(lit) => Bit::Lit(!lit),
        }
    }
}

/// The number of binary digits needed to represent `x`.
///
/// Zero still takes one digit.
pub fn num_bits(x: u64) -> usize {
    match x {
        0 => 1,
        x => (u64::BITS - x.leading_zeros()) as usize,
    }
}

/// Converts `x` into `width` constant digits, most significant first.
///
/// Digits of `x` above `width` are dropped.
pub fn to_bits(x: u64, width: usize) -> Vec<Bit> {
    (0..width)
        .rev()
        .map(|k| Bit::Const(k < 64 && (x >> k) & 1 == 1))
        .collect()
}

/// Converts `x` into its shortest constant binary representation.
pub fn constant(x: u64) -> Vec<Bit> {
    to_bits(x, num_bits(x))
}

/// Reads a binary number, most significant digit first.
pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> u64 {
    bits.into_iter()
        .fold(0, |acc, bit| (acc << 1) | u64::from(bit))
}

/// Lifts a row of literals into digits.
pub fn lits(lits: &[Lit]) -> Vec<Bit> {
    lits.iter().copied().map(Bit::Lit).collect()
}

/// Pads a binary number with leading zeros up to `width` digits.
pub fn pad(bits: &[Bit], width: usize) -> Vec<Bit> {
    let padding = width.saturating_sub(bits.len());
    let mut padded = vec![Bit::Const(false); padding];
    padded.extend_from_slice(bits);
    padded
}
