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

use crate::*;

impl Instance {
    /// Checks that this instance is well-formed.
    pub fn validate(&self) -> Result<()> {
        // both sides of the assignment must be non-empty
        if self.capacities.is_empty() {
            return Err(Error::NoCouriers);
        }

        if self.sizes.is_empty() {
            return Err(Error::NoItems);
        }

        // the distance matrix covers every item plus the depot
        let nodes = self.items() + 1;
        if self.distances.len() != nodes {
            return Err(Error::RowCount {
                expected: nodes,
                got: self.distances.len(),
            });
        }

        for (row, distances) in self.distances.iter().enumerate() {
            if distances.len() != nodes {
                return Err(Error::RowLength {
                    row,
                    expected: nodes,
                    got: distances.len(),
                });
            }
        }

        Ok(())
    }
}
