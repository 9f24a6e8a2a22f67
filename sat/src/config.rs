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

use std::time::Duration;

use strum::{Display, EnumString};

use crate::{
    builder::{BoundFormula, EncodingOptions},
    Error, Result,
};

/// How the objective bound is tightened.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Display, EnumString)]
pub enum SearchStrategy {
    #[default]
    Binary,
    Linear,
}

/// Which solver layout is used.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Variant {
    /// One engine holding the complete encoding.
    #[default]
    Single,

    /// An assignment engine feeding candidates to a routing engine.
    Sequential,
}

/// The names of the preset configurations, in reporting order.
pub const PRESETS: &[&str] = &[
    "base",
    "base_no_sym_break",
    "base_no_implied",
    "base_linear",
    "sequential",
    "sequential_no_sym_break",
    "sequential_no_implied",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolverConfig {
    pub variant: Variant,
    pub strategy: SearchStrategy,
    pub symmetry_breaking: bool,
    pub implied_constraint: bool,
    pub timeout: Duration,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            variant: Variant::Single,
            strategy: SearchStrategy::Binary,
            symmetry_breaking: true,
            implied_constraint: true,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

impl SolverConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    /// Sets the search strategy from its name.
    pub fn with_strategy(mut self, token: &str) -> Result<Self> {
        self.strategy = token
            .parse()
            .map_err(|_| Error::InvalidStrategy(token.to_string()))?;

        Ok(self)
    }

    /// Looks up a preset configuration by name.
    pub fn preset(name: &str) -> Option<Self> {
        if !PRESETS.contains(&name) {
            return None;
        }

        let variant = match name.starts_with("sequential") {
            true => Variant::Sequential,
            false => Variant::Single,
        };

        let strategy = match name.contains("sequential") || name.contains("linear") {
            true => SearchStrategy::Linear,
            false => SearchStrategy::Binary,
        };

        Some(Self {
            variant,
            strategy,
            symmetry_breaking: !name.ends_with("no_sym_break"),
            implied_constraint: !name.ends_with("no_implied"),
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }

    /// Rejects strategy and variant combinations that cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.variant == Variant::Sequential && self.strategy == SearchStrategy::Binary {
            return Err(Error::UnsupportedStrategy {
                variant: self.variant,
                strategy: self.strategy,
            });
        }

        Ok(())
    }

    pub fn encoding_options(&self) -> EncodingOptions {
        EncodingOptions {
            symmetry_breaking: self.symmetry_breaking,
            implied_constraint: self.implied_constraint,
            bounds: match self.variant {
                Variant::Single => BoundFormula::Single,
                Variant::Sequential => BoundFormula::Sequential,
            },
        }
    }
}
