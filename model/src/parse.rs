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

use chumsky::prelude::*;

use crate::*;

impl Instance {
    /// Parses an instance from the `.dat` format.
    ///
    /// The format is a whitespace-separated list of non-negative integers: the
    /// number of couriers `m`, the number of items `n`, `m` capacities, `n`
    /// sizes, and then the `(n+1)×(n+1)` distance matrix in row-major order.
    pub fn parse(src: &str) -> Result<Self> {
        let values = values().parse(src).map_err(|errors| {
            // the value grammar has no recovery so only the first error matters
            match errors.into_iter().next() {
                Some(err) => Error::Parse {
                    message: err.to_string(),
                    span: err.span(),
                },
                None => Error::Parse {
                    message: "failed to parse instance".to_string(),
                    span: 0..src.len(),
                },
            }
        })?;

        Self::from_values(&values)
    }

    /// Lays out a flat list of instance values.
    pub fn from_values(values: &[u64]) -> Result<Self> {
        let mut cursor = values.iter().copied();
        let mut header = |expected| {
            cursor.next().ok_or(Error::ValueCount {
                expected,
                got: values.len(),
            })
        };

        let m = header(2)? as usize;
        let n = header(2)? as usize;

        // reject absurd headers before computing the matrix size
        if m > values.len() || n > values.len() {
            return Err(Error::ValueCount {
                expected: 2 + m.saturating_add(n),
                got: values.len(),
            });
        }

        let nodes = n + 1;
        let expected = 2 + m + n + nodes * nodes;
        if values.len() != expected {
            return Err(Error::ValueCount {
                expected,
                got: values.len(),
            });
        }

        let (capacities, rest) = values[2..].split_at(m);
        let (sizes, matrix) = rest.split_at(n);
        let distances = matrix.chunks(nodes).map(<[u64]>::to_vec).collect();

        Self::new(capacities.to_vec(), sizes.to_vec(), distances)
    }
}

fn values() -> impl Parser<char, Vec<u64>, Error = Simple<char>> {
    let int = text::int(10).try_map(|digits: String, span| {
        digits
            .parse::<u64>()
            .map_err(|err| Simple::custom(span, format!("invalid integer `{digits}`: {err}")))
    });

    text::whitespace()
        .ignore_then(int.then_ignore(text::whitespace()).repeated())
        .then_ignore(end())
}
