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

use bitvec::prelude::*;
use rustsat::types::{Clause, Lit};

use crate::{
    bits::{self, constant, from_bits, num_bits, to_bits, Bit},
    builder::{lower_bound, sequential_upper_bound, single_upper_bound},
    config::{SearchStrategy, SolverConfig, Variant, PRESETS},
    decode::is_hamiltonian,
    encode::encode_with,
    engine::{Check, Engine, Session},
    search::{Outcome, Status},
    vars::{Role, VariablePool, Variables},
    *,
};

fn session() -> Session {
    Session::new(VariablePool::default()).unwrap()
}

/// Fixes `lits` to the binary digits of `value`, most significant first.
fn digits(lits: &[Lit], value: u64) -> Vec<(Lit, bool)> {
    let values = to_bits(value, lits.len());
    lits.iter()
        .zip(values)
        .map(|(lit, bit)| (*lit, bit == Bit::Const(true)))
        .collect()
}

/// Checks the session with `fixed` assumed and reads `read` as a number.
fn solve_with(session: &mut Session, fixed: &[(Lit, bool)], read: &[Lit]) -> Option<u64> {
    let units = fixed
        .iter()
        .map(|(lit, value)| Clause::from_iter([if *value { *lit } else { !*lit }]))
        .collect();

    session.push();
    session.add_clauses(units).unwrap();

    let result = match session.check().unwrap() {
        Check::Sat => {
            let values: Vec<bool> = read.iter().map(|lit| session.value(*lit).unwrap()).collect();
            Some(from_bits(values))
        }
        Check::Unsat => None,
        Check::Unknown => panic!("engine gave up without a timeout"),
    };

    session.pop().unwrap();
    result
}

fn is_sat(session: &mut Session, fixed: &[(Lit, bool)]) -> bool {
    solve_with(session, fixed, &[]).is_some()
}

#[test]
fn binary_conversions() {
    assert_eq!(num_bits(0), 1);
    assert_eq!(num_bits(1), 1);
    assert_eq!(num_bits(8), 4);
    assert_eq!(num_bits(255), 8);
    assert_eq!(from_bits([true, false, true]), 5);
    assert_eq!(constant(6), to_bits(6, 3));
    assert_eq!(
        to_bits(5, 4),
        vec![
            Bit::Const(false),
            Bit::Const(true),
            Bit::Const(false),
            Bit::Const(true)
        ]
    );
    assert_eq!(bits::pad(&constant(1), 3), to_bits(1, 3));
}

#[test]
fn scopes_retract_constraints() {
    let mut session = session();
    let x = session.vars().fresh_lits(1)[0];

    session.add_clauses(vec![Clause::from_iter([x])]).unwrap();
    assert_eq!(session.check().unwrap(), Check::Sat);

    session.push();
    session.add_clauses(vec![Clause::from_iter([!x])]).unwrap();
    assert_eq!(session.depth(), 1);
    assert_eq!(session.check().unwrap(), Check::Unsat);

    session.pop().unwrap();
    assert_eq!(session.depth(), 0);
    assert_eq!(session.check().unwrap(), Check::Sat);
    assert!(session.value(x).unwrap());
}

#[test]
fn nested_scopes() {
    let mut session = session();
    let lits = session.vars().fresh_lits(2);
    let (x, y) = (lits[0], lits[1]);

    session.push();
    session.add_clauses(vec![Clause::from_iter([x])]).unwrap();
    session.push();
    session.add_clauses(vec![Clause::from_iter([!x, y])]).unwrap();

    assert_eq!(session.check().unwrap(), Check::Sat);
    assert!(session.value(y).unwrap());

    session.pop().unwrap();
    session.add_clauses(vec![Clause::from_iter([!y])]).unwrap();
    assert_eq!(session.check().unwrap(), Check::Sat);

    session.pop().unwrap();
    session.add_clauses(vec![Clause::from_iter([!x])]).unwrap();
    assert_eq!(session.check().unwrap(), Check::Sat);
}

#[test]
fn zero_budget_is_unknown() {
    let mut session = session();
    session.set_timeout(Duration::ZERO);
    assert_eq!(session.check().unwrap(), Check::Unknown);
}

#[test]
fn empty_clause_is_unsat() {
    let mut session = session();
    encode_with(&mut session, |enc| enc.clause([Bit::Const(false)])).unwrap();
    assert_eq!(session.check().unwrap(), Check::Unsat);
}

#[test]
fn cardinality() {
    let mut session = session();
    let most = session.vars().fresh_lits(4);
    let exactly = session.vars().fresh_lits(4);
    let least = session.vars().fresh_lits(4);
    let none = session.vars().fresh_lits(4);

    encode_with(&mut session, |enc| {
        enc.at_most_one(&bits::lits(&most))?;
        enc.exactly_one(&bits::lits(&exactly))?;
        enc.at_least_one(&bits::lits(&least))?;
        enc.all_false(&bits::lits(&none))
    })
    .unwrap();

    for value in 0..16 {
        let ones = u64::count_ones(value);
        assert_eq!(is_sat(&mut session, &digits(&most, value)), ones <= 1);
        assert_eq!(is_sat(&mut session, &digits(&exactly, value)), ones == 1);
        assert_eq!(is_sat(&mut session, &digits(&least, value)), ones >= 1);
        assert_eq!(is_sat(&mut session, &digits(&none, value)), ones == 0);
    }
}

#[test]
fn guarded_constraints() {
    let mut session = session();
    let row = session.vars().fresh_lits(3);
    let guard = session.vars().fresh_lits(1)[0];

    encode_with(&mut session, |enc| {
        enc.guarded(guard, |enc| enc.exactly_one(&bits::lits(&row)))
    })
    .unwrap();

    for value in 0..8 {
        let mut fixed = digits(&row, value);
        assert!(is_sat(&mut session, &fixed));

        fixed.push((guard, true));
        assert_eq!(is_sat(&mut session, &fixed), value.count_ones() == 1);
    }
}

#[test]
fn comparisons() {
    for (v_width, u_width) in [(3, 3), (2, 3), (3, 2), (1, 3)] {
        let mut session = session();
        let v = session.vars().fresh_lits(v_width);
        let u = session.vars().fresh_lits(u_width);
        let (v_bits, u_bits) = (bits::lits(&v), bits::lits(&u));

        let lit = encode_with(&mut session, |enc| enc.leq_lit(&v_bits, &u_bits)).unwrap();

        for a in 0..1 << v_width {
            for b in 0..1 << u_width {
                let mut fixed = digits(&v, a);
                fixed.extend(digits(&u, b));
                assert!(is_sat(&mut session, &fixed));

                fixed.push((lit, true));
                assert_eq!(is_sat(&mut session, &fixed), a <= b, "{a} <= {b}");
            }
        }
    }
}

#[test]
fn comparisons_with_constants() {
    let mut session = session();
    let rows: Vec<Vec<Lit>> = (0..2).map(|_| session.vars().fresh_lits(3)).collect();
    let row_bits: Vec<Vec<Bit>> = rows.iter().map(|row| bits::lits(row)).collect();

    encode_with(&mut session, |enc| {
        enc.all_leq(&row_bits, 5)?;
        enc.some_geq(&row_bits, 4)
    })
    .unwrap();

    for a in 0..8 {
        for b in 0..8 {
            let mut fixed = digits(&rows[0], a);
            fixed.extend(digits(&rows[1], b));
            let expected = a <= 5 && b <= 5 && (a >= 4 || b >= 4);
            assert_eq!(is_sat(&mut session, &fixed), expected, "{a}, {b}");
        }
    }
}

#[test]
fn addition() {
    let mut session = session();
    let a = session.vars().fresh_lits(2);
    let b = session.vars().fresh_lits(3);
    let d = session.vars().fresh_lits(3);

    encode_with(&mut session, |enc| {
        enc.sum_bin(&bits::lits(&a), &bits::lits(&b), &bits::lits(&d))
    })
    .unwrap();

    for x in 0..4 {
        for y in 0..8 {
            let mut fixed = digits(&a, x);
            fixed.extend(digits(&b, y));
            let expected = (x + y < 8).then_some(x + y);
            assert_eq!(solve_with(&mut session, &fixed, &d), expected, "{x} + {y}");
        }
    }
}

#[test]
fn addition_with_constant() {
    let mut session = session();
    let b = session.vars().fresh_lits(3);
    let d = session.vars().fresh_lits(4);

    encode_with(&mut session, |enc| {
        enc.sum_bin(&constant(5), &bits::lits(&b), &bits::lits(&d))
    })
    .unwrap();

    for y in 0..8 {
        assert_eq!(solve_with(&mut session, &digits(&b, y), &d), Some(y + 5));
    }
}

#[test]
fn conditional_sums() {
    let alpha = [3, 0, 5, 6];
    let mut session = session();
    let x = session.vars().fresh_lits(alpha.len());
    let delta = session.vars().fresh_lits(4);

    encode_with(&mut session, |enc| {
        enc.conditional_sum(&x, &alpha, &bits::lits(&delta))
    })
    .unwrap();

    for mask in 0..1 << alpha.len() {
        let fixed = digits(&x, mask);
        let expected: u64 = fixed
            .iter()
            .zip(alpha)
            .filter(|((_, selected), _)| *selected)
            .map(|(_, alpha)| alpha)
            .sum();

        assert_eq!(solve_with(&mut session, &fixed, &delta), Some(expected));
    }
}

#[test]
fn conditional_sum_overflow() {
    let alpha = [2, 9, 5];
    let mut session = session();
    let x = session.vars().fresh_lits(alpha.len());
    let delta = session.vars().fresh_lits(3);

    encode_with(&mut session, |enc| {
        enc.conditional_sum(&x, &alpha, &bits::lits(&delta))
    })
    .unwrap();

    for mask in 0..1 << alpha.len() {
        let fixed = digits(&x, mask);
        let selected: Vec<u64> = fixed
            .iter()
            .zip(alpha)
            .filter(|((_, selected), _)| *selected)
            .map(|(_, alpha)| alpha)
            .collect();

        let sum: u64 = selected.iter().sum();
        let expected = (sum < 8 && !selected.contains(&9)).then_some(sum);
        assert_eq!(solve_with(&mut session, &fixed, &delta), expected);
    }
}

#[test]
fn successive_positions() {
    let mut session = session();
    let v = session.vars().fresh_lits(4);
    let u = session.vars().fresh_lits(4);

    encode_with(&mut session, |enc| {
        let (v, u) = (bits::lits(&v), bits::lits(&u));
        enc.exactly_one(&v)?;
        enc.exactly_one(&u)?;
        enc.successive(&v, &u)
    })
    .unwrap();

    for p in 0..4 {
        for q in 0..4 {
            let mut fixed = digits(&v, 8 >> p);
            fixed.extend(digits(&u, 8 >> q));
            assert_eq!(is_sat(&mut session, &fixed), q == p + 1, "{p} -> {q}");
        }
    }
}

#[test]
fn sorted_rows_with_tie_break() {
    let mut session = session();
    let loads: Vec<Vec<Lit>> = (0..2).map(|_| session.vars().fresh_lits(2)).collect();
    let rows: Vec<Vec<Lit>> = (0..2).map(|_| session.vars().fresh_lits(2)).collect();

    encode_with(&mut session, |enc| {
        let loads: Vec<Vec<Bit>> = loads.iter().map(|row| bits::lits(row)).collect();
        let rows: Vec<Vec<Bit>> = rows.iter().map(|row| bits::lits(row)).collect();
        enc.sort_decreasing(&loads)?;

        let mut clause: Vec<Bit> = enc
            .differs(&loads[0], &loads[1])?
            .into_iter()
            .map(Bit::Lit)
            .collect();

        clause.push(Bit::Lit(enc.leq_lit(&rows[0], &rows[1])?));
        enc.clause(clause)
    })
    .unwrap();

    for l0 in 0..4 {
        for l1 in 0..4 {
            for r0 in 0..4 {
                for r1 in 0..4 {
                    let mut fixed = digits(&loads[0], l0);
                    fixed.extend(digits(&loads[1], l1));
                    fixed.extend(digits(&rows[0], r0));
                    fixed.extend(digits(&rows[1], r1));

                    let expected = l1 <= l0 && (l0 != l1 || r0 <= r1);
                    assert_eq!(is_sat(&mut session, &fixed), expected);
                }
            }
        }
    }
}

fn adjacency(nodes: usize, edges: &[(usize, usize)]) -> Vec<BitVec> {
    let mut matrix = vec![bitvec![0; nodes]; nodes];
    for (from, to) in edges.iter().copied() {
        matrix[from].set(to, true);
    }

    matrix
}

#[test]
fn hamiltonian_cycles() {
    assert!(is_hamiltonian(&adjacency(4, &[(3, 0), (0, 2), (2, 3)])));
    assert!(is_hamiltonian(&adjacency(4, &[(3, 3)])));
    assert!(is_hamiltonian(&adjacency(2, &[(1, 0), (0, 1)])));

    // depot self-loop next to a detached cycle
    assert!(!is_hamiltonian(&adjacency(4, &[(3, 3), (0, 1), (1, 0)])));

    // depot cycle next to a detached cycle
    assert!(!is_hamiltonian(&adjacency(
        5,
        &[(4, 0), (0, 4), (1, 2), (2, 1)]
    )));

    assert!(!is_hamiltonian(&[]));
}

#[test]
fn variable_registry() {
    let mut pool = VariablePool::default();
    let vars = Variables::allocate(&mut pool, 2, 3, 4, 5);

    assert_eq!(vars.route[1].len(), 4);
    assert_eq!(vars.route_column(1, 2), vec![
        vars.route[1][0][2],
        vars.route[1][1][2],
        vars.route[1][2][2],
        vars.route[1][3][2],
    ]);

    let cases: &[(Role, &[usize])] = &[
        (Role::Assign, &[1, 2]),
        (Role::Route, &[1, 3, 0]),
        (Role::Order, &[2, 1]),
        (Role::Load, &[0, 3]),
        (Role::Distance, &[1, 4]),
    ];

    for (role, indices) in cases {
        let lit = vars.lookup(*role, indices).unwrap();
        let (found, found_indices) = vars.describe(lit).unwrap();
        assert_eq!(found, *role);
        assert_eq!(found_indices.as_slice(), *indices);
    }

    assert_eq!(vars.lookup(Role::Order, &[3, 0]), None);
    assert_eq!(vars.describe(pool.top()), None);
    assert_eq!(vars.describe(pool.fresh_lits(1)[0]), None);
}

fn scenario_a_instance() -> Instance {
    Instance::new(
        vec![10, 10],
        vec![3, 4, 5],
        vec![
            vec![0, 2, 4, 1],
            vec![2, 0, 3, 5],
            vec![4, 3, 0, 6],
            vec![1, 5, 6, 0],
        ],
    )
    .unwrap()
}

#[test]
fn objective_bounds() {
    let instance = scenario_a_instance();
    assert_eq!(lower_bound(&instance), 10);
    assert_eq!(single_upper_bound(&instance, true), 16);
    assert_eq!(single_upper_bound(&instance, false), 20);
    assert_eq!(sequential_upper_bound(&instance, true), 17);
    assert_eq!(sequential_upper_bound(&instance, false), 21);
}

#[test]
fn bounds_saturate() {
    let far = u64::MAX - 1;
    let instance = Instance::new(
        vec![10, 10],
        vec![1, 1, 1],
        vec![
            vec![0, far, far, far],
            vec![far, 0, far, far],
            vec![far, far, 0, far],
            vec![far, far, far, 0],
        ],
    )
    .unwrap();

    assert_eq!(lower_bound(&instance), u64::MAX);
    assert_eq!(single_upper_bound(&instance, true), u64::MAX);
    assert_eq!(single_upper_bound(&instance, false), u64::MAX);
    assert_eq!(sequential_upper_bound(&instance, true), u64::MAX);
    assert_eq!(sequential_upper_bound(&instance, false), u64::MAX);
}

#[test]
fn malformed_instance_is_rejected() {
    let ragged = Instance {
        capacities: vec![5],
        sizes: vec![1, 1],
        distances: vec![vec![0, 1, 2], vec![1, 0], vec![2, 1, 0]],
    };

    assert!(matches!(
        solve(&ragged, &SolverConfig::default()),
        Err(Error::Instance(mcp_planner_model::Error::RowLength {
            row: 1,
            expected: 3,
            got: 2
        }))
    ));

    let short = Instance {
        distances: vec![vec![0, 1], vec![1, 0]],
        ..ragged
    };

    assert!(matches!(
        solve(&short, &SolverConfig::default()),
        Err(Error::Instance(mcp_planner_model::Error::RowCount { .. }))
    ));
}

#[test]
fn unfinished_records() {
    let solution = Solution {
        routes: vec![vec![1, 0], vec![2]],
        distances: vec![9, 12],
        objective: 12,
    };

    let feasible = Outcome {
        status: Status::Feasible,
        solution: Some(solution.clone()),
        elapsed: Duration::from_millis(2300),
        timeout: Duration::from_secs(2),
    };

    assert_eq!(
        feasible.record(),
        SolveRecord {
            time: 2,
            optimal: false,
            obj: Objective::Value(12),
            sol: vec![vec![2, 1], vec![3]],
        }
    );

    // proven runs report their own time, still capped
    let optimal = Outcome {
        status: Status::Optimal,
        elapsed: Duration::from_millis(1700),
        ..feasible.clone()
    };

    assert_eq!(optimal.record().time, 1);
    assert!(optimal.record().optimal);

    let late = Outcome {
        elapsed: Duration::from_secs(5),
        ..optimal
    };

    assert_eq!(late.record().time, 2);
}

#[test]
fn timeout_keeps_best_solution() {
    let instance = metric_instance(42, 3, 14);
    let config = SolverConfig {
        timeout: Duration::from_millis(1500),
        ..SolverConfig::preset("base_linear").unwrap()
    };

    let outcome = solve(&instance, &config).unwrap();
    assert_valid(&instance, &outcome);

    let record = outcome.record();
    match outcome.status {
        Status::Feasible => {
            assert!(!record.optimal);
            assert_eq!(record.time, 1);
        }
        Status::Optimal => assert!(record.optimal),
        status => panic!("unexpected status {status:?}"),
    }
}

#[test]
fn strategy_tokens() {
    let config = SolverConfig::default();
    assert_eq!(config.strategy, SearchStrategy::Binary);

    let linear = config.clone().with_strategy("Linear").unwrap();
    assert_eq!(linear.strategy, SearchStrategy::Linear);

    assert!(matches!(
        config.clone().with_strategy("Ternary"),
        Err(Error::InvalidStrategy(token)) if token == "Ternary"
    ));

    assert!(matches!(
        config.with_strategy("linear"),
        Err(Error::InvalidStrategy(_))
    ));
}

#[test]
fn presets() {
    for name in PRESETS {
        let config = SolverConfig::preset(name).unwrap();
        config.validate().unwrap();
    }

    let base = SolverConfig::preset("base").unwrap();
    assert_eq!(base, SolverConfig::default());

    let sequential = SolverConfig::preset("sequential_no_implied").unwrap();
    assert_eq!(sequential.variant, Variant::Sequential);
    assert_eq!(sequential.strategy, SearchStrategy::Linear);
    assert!(sequential.symmetry_breaking);
    assert!(!sequential.implied_constraint);

    let linear = SolverConfig::preset("base_linear").unwrap();
    assert_eq!(linear.variant, Variant::Single);
    assert_eq!(linear.strategy, SearchStrategy::Linear);

    assert_eq!(SolverConfig::preset("mip"), None);
}

#[test]
fn sequential_binary_is_unsupported() {
    let config = SolverConfig {
        variant: Variant::Sequential,
        ..Default::default()
    };

    assert!(matches!(
        solve(&scenario_a_instance(), &config),
        Err(Error::UnsupportedStrategy { .. })
    ));
}

#[test]
fn zero_timeout_is_unknown() {
    for name in ["base", "sequential"] {
        let config = SolverConfig {
            timeout: Duration::ZERO,
            ..SolverConfig::preset(name).unwrap()
        };

        let outcome = solve(&scenario_a_instance(), &config).unwrap();
        assert_eq!(outcome.status, Status::Unknown);

        let record = outcome.record();
        assert_eq!(record.obj, Objective::Unknown);
        assert!(!record.optimal);
        assert_eq!(record.time, 0);
        assert!(record.sol.is_empty());
    }
}

/// The optimal objective by exhaustive enumeration of assignments and orders.
fn brute_force(instance: &Instance) -> Option<u64> {
    let (couriers, items) = (instance.couriers(), instance.items());
    let mut owner = vec![0; items];
    let mut best: Option<u64> = None;

    loop {
        let mut worst = Some(0);
        for courier in 0..couriers {
            let route: Vec<usize> = (0..items).filter(|j| owner[*j] == courier).collect();
            let load: u64 = route.iter().map(|j| instance.sizes[*j]).sum();
            if load > instance.capacities[courier] {
                worst = None;
                break;
            }

            let tour = shortest_tour(instance, route);
            worst = worst.map(|worst: u64| worst.max(tour));
        }

        if let Some(worst) = worst {
            best = Some(best.map_or(worst, |best| best.min(worst)));
        }

        let mut j = 0;
        while j < items && owner[j] == couriers - 1 {
            owner[j] = 0;
            j += 1;
        }

        if j == items {
            return best;
        }

        owner[j] += 1;
    }
}

fn shortest_tour(instance: &Instance, mut route: Vec<usize>) -> u64 {
    fn permute(instance: &Instance, route: &mut [usize], k: usize, best: &mut u64) {
        if k == route.len() {
            *best = (*best).min(instance.route_distance(route));
            return;
        }

        for i in k..route.len() {
            route.swap(k, i);
            permute(instance, route, k + 1, best);
            route.swap(k, i);
        }
    }

    let mut best = u64::MAX;
    permute(instance, &mut route, 0, &mut best);
    best
}

/// A small instance over points on a grid with Manhattan distances.
///
/// Every courier can carry any single item.
fn metric_instance(seed: u64, couriers: usize, items: usize) -> Instance {
    let mut state = seed;
    let mut next = move |bound: u64| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) % bound
    };

    let points: Vec<(u64, u64)> = (0..=items).map(|_| (next(10), next(10))).collect();
    let sizes: Vec<u64> = (0..items).map(|_| 1 + next(5)).collect();
    let largest = sizes.iter().copied().max().unwrap();
    let total: u64 = sizes.iter().sum();

    let capacities = (0..couriers)
        .map(|_| largest + next(total / 2 + 1))
        .collect();

    let distances = points
        .iter()
        .map(|(x0, y0)| {
            points
                .iter()
                .map(|(x1, y1)| x0.abs_diff(*x1) + y0.abs_diff(*y1))
                .collect()
        })
        .collect();

    Instance::new(capacities, sizes, distances).unwrap()
}

/// Checks a solved outcome against the instance, independently of the engine.
fn assert_valid(instance: &Instance, outcome: &Outcome) {
    let solution = outcome.solution.as_ref().expect("no solution found");
    assert_eq!(solution.routes.len(), instance.couriers());

    let mut delivered: Vec<usize> = solution.routes.iter().flatten().copied().collect();
    delivered.sort_unstable();
    assert_eq!(delivered, (0..instance.items()).collect::<Vec<_>>());

    for (courier, route) in solution.routes.iter().enumerate() {
        let load: u64 = route.iter().map(|item| instance.sizes[*item]).sum();
        assert!(load <= instance.capacities[courier], "courier {courier} is overloaded");
        assert_eq!(solution.distances[courier], instance.route_distance(route));
    }

    assert_eq!(
        solution.objective,
        solution.distances.iter().copied().max().unwrap()
    );

    let record = outcome.record();
    assert_eq!(record.obj, Objective::Value(solution.objective));
    assert_eq!(record.sol, solution.sol());
}

fn scenario_a(config: SolverConfig) {
    let instance = scenario_a_instance();
    let outcome = solve(&instance, &config).unwrap();

    assert_eq!(outcome.status, Status::Optimal);
    assert_valid(&instance, &outcome);
    assert_eq!(outcome.objective(), Objective::Value(11));
    assert!(outcome.solution.unwrap().routes.iter().all(|route| !route.is_empty()));
}

fn scenario_b(config: SolverConfig) {
    let instance = Instance {
        capacities: vec![3, 3],
        ..scenario_a_instance()
    };

    let outcome = solve(&instance, &config).unwrap();
    assert_eq!(outcome.status, Status::Unsat);

    let record = outcome.record();
    assert_eq!(record.obj, Objective::Unsat);
    assert!(record.optimal);
    assert!(record.sol.is_empty());
}

fn scenario_c(config: SolverConfig) {
    let instance = Instance::new(
        vec![5],
        vec![1, 1],
        vec![vec![0, 3, 4], vec![3, 0, 5], vec![4, 5, 0]],
    )
    .unwrap();

    let outcome = solve(&instance, &config).unwrap();
    assert_eq!(outcome.status, Status::Optimal);
    assert_valid(&instance, &outcome);
    assert_eq!(outcome.objective(), Objective::Value(12));
}

fn courier_order_is_restored(config: SolverConfig) {
    let instance = Instance {
        capacities: vec![4, 12],
        ..scenario_a_instance()
    };

    let outcome = solve(&instance, &config).unwrap();
    assert_eq!(outcome.status, Status::Optimal);
    assert_valid(&instance, &outcome);
    assert_eq!(
        outcome.objective(),
        Objective::Value(brute_force(&instance).unwrap())
    );
}

fn matches_brute_force(config: SolverConfig) {
    for (seed, couriers, items) in [
        (1, 2, 4),
        (2, 2, 5),
        (3, 3, 5),
        (4, 3, 4),
        (5, 1, 4),
        (6, 3, 2),
        (7, 4, 2),
    ] {
        let instance = metric_instance(seed, couriers, items);
        let outcome = solve(&instance, &config).unwrap();

        match brute_force(&instance) {
            Some(optimum) => {
                assert_eq!(outcome.status, Status::Optimal, "seed {seed}");
                assert_valid(&instance, &outcome);
                assert_eq!(outcome.objective(), Objective::Value(optimum), "seed {seed}");
            }
            None => assert_eq!(outcome.status, Status::Unsat, "seed {seed}"),
        }
    }
}

macro_rules! tests_with_preset {
    ($preset:literal, ) => {};
    ($preset:literal, $head:ident $($rest:ident)*) => {
        #[test]
        fn $head() {
            let config = SolverConfig {
                timeout: std::time::Duration::from_secs(60),
                ..SolverConfig::preset($preset).unwrap()
            };

            super::$head(config);
        }

        tests_with_preset!($preset, $($rest)*);
    };
}

macro_rules! tests_all_presets {
    ($($tests:ident)*) => {
        pub mod base {
            use super::*;
            tests_with_preset!("base", $($tests)*);
        }

        pub mod base_no_sym_break {
            use super::*;
            tests_with_preset!("base_no_sym_break", $($tests)*);
        }

        pub mod base_no_implied {
            use super::*;
            tests_with_preset!("base_no_implied", $($tests)*);
        }

        pub mod base_linear {
            use super::*;
            tests_with_preset!("base_linear", $($tests)*);
        }

        pub mod sequential {
            use super::*;
            tests_with_preset!("sequential", $($tests)*);
        }

        pub mod sequential_no_sym_break {
            use super::*;
            tests_with_preset!("sequential_no_sym_break", $($tests)*);
        }

        pub mod sequential_no_implied {
            use super::*;
            tests_with_preset!("sequential_no_implied", $($tests)*);
        }
    }
}

tests_all_presets!(
    scenario_a
    scenario_b
    scenario_c
    courier_order_is_restored
    matches_brute_force
);
