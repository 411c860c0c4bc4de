//! End-to-end solves and interface consistency tests.

use simplex_core::{
    solve, Basis, BasisStatus, IndexCollection, Lp, ModelError, ModelStatus, ObjSense,
    SimplexStrategy, SolverOptions, SparseMatrix, INF,
};

fn matrix(num_row: usize, num_col: usize, triplets: &[(usize, usize, f64)]) -> SparseMatrix {
    let mut tri = sprs::TriMat::new((num_row, num_col));
    for &(i, j, v) in triplets {
        tri.add_triplet(i, j, v);
    }
    SparseMatrix::from_csmat(&tri.to_csc())
}

fn bounded_lp() -> Lp {
    // minimize -x0 - 2 x1
    // subject to x0 + x1 <= 4, 0 <= x0, x1 <= 3
    Lp {
        col_cost: vec![-1.0, -2.0],
        col_lower: vec![0.0, 0.0],
        col_upper: vec![3.0, 3.0],
        row_lower: vec![-INF],
        row_upper: vec![4.0],
        a_matrix: matrix(1, 2, &[(0, 0, 1.0), (0, 1, 1.0)]),
        sense: ObjSense::Minimize,
        ..Default::default()
    }
}

#[test]
fn test_trivial_lp_logical_start() {
    // n = 1, m = 1: minimize x0 with x0 >= 0 and x0 <= 0 through the row
    let lp = Lp {
        col_cost: vec![1.0],
        col_lower: vec![0.0],
        col_upper: vec![INF],
        row_lower: vec![-INF],
        row_upper: vec![0.0],
        a_matrix: matrix(1, 1, &[(0, 0, 1.0)]),
        sense: ObjSense::Minimize,
        ..Default::default()
    };
    let (status, solution) = solve(lp, &SolverOptions::default()).unwrap();
    assert_eq!(status, ModelStatus::Optimal);
    assert_eq!(solution.col_value[0], 0.0);
    assert_eq!(solution.row_value[0], 0.0);
}

#[test]
fn test_bounded_lp_optimal() {
    let (status, solution) = solve(bounded_lp(), &SolverOptions::default()).unwrap();
    assert_eq!(status, ModelStatus::Optimal);
    assert!((solution.col_value[0] - 1.0).abs() < 1e-6);
    assert!((solution.col_value[1] - 3.0).abs() < 1e-6);
    assert!((solution.row_value[0] - 4.0).abs() < 1e-6);
}

#[test]
fn test_equality_lp_through_dual() {
    // minimize x0 + x1 subject to x0 + x1 = 10, x >= 0
    let lp = Lp {
        col_cost: vec![1.0, 1.0],
        col_lower: vec![0.0, 0.0],
        col_upper: vec![INF, INF],
        row_lower: vec![10.0],
        row_upper: vec![10.0],
        a_matrix: matrix(1, 2, &[(0, 0, 1.0), (0, 1, 1.0)]),
        sense: ObjSense::Minimize,
        ..Default::default()
    };
    let mut solver = simplex_core::SimplexSolver::new(lp, SolverOptions::default()).unwrap();
    solver.solve().unwrap();
    assert_eq!(solver.model_status(), ModelStatus::Optimal);
    assert!((solver.info().objective_function_value - 10.0).abs() < 1e-6);
    let solution = solver.get_solution();
    assert!((solution.col_value[0] + solution.col_value[1] - 10.0).abs() < 1e-6);
}

#[test]
fn test_maximization() {
    // maximize x0 + x1 subject to 2 x0 + x1 <= 8, x0 + 3 x1 <= 9, x >= 0
    let lp = Lp {
        col_cost: vec![1.0, 1.0],
        col_lower: vec![0.0, 0.0],
        col_upper: vec![INF, INF],
        row_lower: vec![-INF, -INF],
        row_upper: vec![8.0, 9.0],
        a_matrix: matrix(
            2,
            2,
            &[(0, 0, 2.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)],
        ),
        sense: ObjSense::Maximize,
        ..Default::default()
    };
    let (status, solution) = solve(lp, &SolverOptions::default()).unwrap();
    assert_eq!(status, ModelStatus::Optimal);
    // Optimum at the vertex (3, 2)
    assert!((solution.col_value[0] - 3.0).abs() < 1e-6);
    assert!((solution.col_value[1] - 2.0).abs() < 1e-6);
}

#[test]
fn test_infinite_cost_fix() {
    // c = [-inf, 1]; the first column must be fixed at its upper bound
    // and the engine solves with c = (0, 1)
    let lp = Lp {
        col_cost: vec![-INF, 1.0],
        col_lower: vec![0.0, 0.0],
        col_upper: vec![5.0, INF],
        row_lower: vec![10.0],
        row_upper: vec![10.0],
        a_matrix: matrix(1, 2, &[(0, 0, 1.0), (0, 1, 1.0)]),
        sense: ObjSense::Minimize,
        ..Default::default()
    };
    let mut solver = simplex_core::SimplexSolver::new(lp, SolverOptions::default()).unwrap();
    solver.solve().unwrap();
    assert_eq!(solver.model_status(), ModelStatus::Optimal);
    let solution = solver.get_solution();
    assert!((solution.col_value[0] - 5.0).abs() < 1e-6);
    assert!((solution.col_value[1] - 5.0).abs() < 1e-6);
    // The original cost and bounds are restored and the objective
    // carries the infinite contribution
    assert_eq!(solver.lp().col_cost[0], -INF);
    assert_eq!(solver.lp().col_upper[0], 5.0);
    assert_eq!(solver.info().objective_function_value, -INF);
}

#[test]
fn test_infinite_cost_without_bound_is_error() {
    let lp = Lp {
        col_cost: vec![-INF],
        col_lower: vec![0.0],
        col_upper: vec![INF],
        row_lower: vec![-INF],
        row_upper: vec![1.0],
        a_matrix: matrix(1, 1, &[(0, 0, 1.0)]),
        sense: ObjSense::Minimize,
        ..Default::default()
    };
    let mut solver = simplex_core::SimplexSolver::new(lp, SolverOptions::default()).unwrap();
    assert!(matches!(
        solver.solve(),
        Err(ModelError::InfiniteCostNoBound { col: 0 })
    ));
}

#[test]
fn test_rank_deficient_supplied_basis() {
    // The second column of A is empty, so a basis of both columns is
    // singular and must be rejected when it is the only basis allowed
    let lp = Lp {
        col_cost: vec![1.0, 1.0],
        col_lower: vec![0.0, 0.0],
        col_upper: vec![INF, INF],
        row_lower: vec![0.0, 0.0],
        row_upper: vec![0.0, 0.0],
        a_matrix: matrix(2, 2, &[(0, 0, 1.0)]),
        sense: ObjSense::Minimize,
        ..Default::default()
    };
    let num_nz = lp.a_matrix.num_nz();
    let mut solver = simplex_core::SimplexSolver::new(lp, SolverOptions::default()).unwrap();
    let basis = Basis {
        col_status: vec![BasisStatus::Basic, BasisStatus::Basic],
        row_status: vec![BasisStatus::Lower, BasisStatus::Lower],
        valid: true,
        alien: false,
    };
    solver.set_basis(basis).unwrap();
    let result = solver.get_basic_variables();
    assert!(matches!(
        result,
        Err(ModelError::SingularBasis { rank_deficiency: 1 })
    ));
    // The LP itself is untouched
    assert_eq!(solver.lp().num_col(), 2);
    assert_eq!(solver.lp().a_matrix.num_nz(), num_nz);
}

#[test]
fn test_infeasible_lp() {
    // x0 >= 0 but the row forces x0 <= -1
    let lp = Lp {
        col_cost: vec![1.0],
        col_lower: vec![0.0],
        col_upper: vec![INF],
        row_lower: vec![-INF],
        row_upper: vec![-1.0],
        a_matrix: matrix(1, 1, &[(0, 0, 1.0)]),
        sense: ObjSense::Minimize,
        ..Default::default()
    };
    let mut solver = simplex_core::SimplexSolver::new(lp, SolverOptions::default()).unwrap();
    solver.solve().unwrap();
    assert_eq!(solver.model_status(), ModelStatus::Infeasible);
    let ray = solver.get_dual_ray().unwrap();
    assert!(ray.is_some());
    assert!(ray.unwrap().iter().any(|&v| v != 0.0));
}

#[test]
fn test_unbounded_lp_records_primal_ray() {
    // minimize -x0 with x0 >= 0 and a vacuous row
    let lp = Lp {
        col_cost: vec![-1.0],
        col_lower: vec![0.0],
        col_upper: vec![INF],
        row_lower: vec![-5.0],
        row_upper: vec![INF],
        a_matrix: matrix(1, 1, &[(0, 0, 1.0)]),
        sense: ObjSense::Minimize,
        ..Default::default()
    };
    let mut solver = simplex_core::SimplexSolver::new(lp, SolverOptions::default()).unwrap();
    solver.solve().unwrap();
    assert_eq!(solver.model_status(), ModelStatus::Unbounded);
    let ray = solver.get_primal_ray().unwrap().unwrap();
    // The ray direction increases x0
    assert!(ray[0] > 0.0);
}

#[test]
fn test_dual_disambiguation_to_unbounded() {
    // Dual-infeasible and primal-feasible; the dual solver cannot
    // classify this and hands over to the primal, which proves
    // unboundedness
    let lp = Lp {
        col_cost: vec![-1.0],
        col_lower: vec![0.0],
        col_upper: vec![INF],
        row_lower: vec![-5.0],
        row_upper: vec![INF],
        a_matrix: matrix(1, 1, &[(0, 0, 1.0)]),
        sense: ObjSense::Minimize,
        ..Default::default()
    };
    let options = SolverOptions {
        simplex_strategy: SimplexStrategy::Dual,
        ..Default::default()
    };
    let (status, _) = solve(lp, &options).unwrap();
    assert_eq!(status, ModelStatus::Unbounded);
}

#[test]
fn test_dual_disambiguation_to_infeasible() {
    // Dual-infeasible and primal-infeasible
    let lp = Lp {
        col_cost: vec![-1.0],
        col_lower: vec![0.0],
        col_upper: vec![INF],
        row_lower: vec![-INF],
        row_upper: vec![-1.0],
        a_matrix: matrix(1, 1, &[(0, 0, 1.0)]),
        sense: ObjSense::Minimize,
        ..Default::default()
    };
    let options = SolverOptions {
        simplex_strategy: SimplexStrategy::Dual,
        ..Default::default()
    };
    let (status, _) = solve(lp, &options).unwrap();
    assert_eq!(status, ModelStatus::Infeasible);
}

#[test]
fn test_iteration_limit_warning() {
    let options = SolverOptions {
        simplex_iteration_limit: 0,
        ..Default::default()
    };
    let mut solver = simplex_core::SimplexSolver::new(bounded_lp(), options).unwrap();
    let outcome = solver.solve().unwrap();
    assert_eq!(outcome, simplex_core::Outcome::Warning);
    assert_eq!(solver.model_status(), ModelStatus::ReachedIterationLimit);
}

#[test]
fn test_add_cols_shifts_basic_logicals() {
    // Start from the logical basis so the slack is basic, then append
    // columns: the logicals are renumbered behind the new block and the
    // basis must follow for the next factorization to be right
    let lp = bounded_lp();
    let logical = Basis::logical(&lp);
    let mut solver = simplex_core::SimplexSolver::new(lp, SolverOptions::default()).unwrap();
    solver.set_basis(logical).unwrap();
    assert_eq!(solver.get_basic_variables().unwrap(), vec![-1]);
    solver
        .add_cols(
            2,
            &[-3.0, -3.0],
            &[0.0, 0.0],
            &[1.0, 1.0],
            &[0, 1, 2],
            &[0, 0],
            &[1.0, 1.0],
        )
        .unwrap();
    assert_eq!(solver.lp().num_col(), 4);
    // The slack of row 0 is still the basic variable
    assert_eq!(solver.get_basic_variables().unwrap(), vec![-1]);
    // The new columns came in nonbasic at their lower bounds
    let basis = solver.get_basis();
    assert_eq!(basis.col_status[2], BasisStatus::Lower);
    assert_eq!(basis.col_status[3], BasisStatus::Lower);
    // Solving the extended model uses the new columns first
    solver.solve().unwrap();
    assert_eq!(solver.model_status(), ModelStatus::Optimal);
    assert!((solver.info().objective_function_value + 10.0).abs() < 1e-6);
    let solution = solver.get_solution();
    assert!((solution.col_value[2] - 1.0).abs() < 1e-6);
    assert!((solution.col_value[3] - 1.0).abs() < 1e-6);
}

#[test]
fn test_add_rows_appends_basic_logicals() {
    let mut solver =
        simplex_core::SimplexSolver::new(bounded_lp(), SolverOptions::default()).unwrap();
    solver.solve().unwrap();
    solver
        .add_rows(
            2,
            &[-INF, -INF],
            &[10.0, 12.0],
            &[0, 1, 2],
            &[0, 1],
            &[1.0, 1.0],
        )
        .unwrap();
    assert_eq!(solver.lp().num_row(), 3);
    let basis = solver.get_basis();
    assert_eq!(basis.row_status[1], BasisStatus::Basic);
    assert_eq!(basis.row_status[2], BasisStatus::Basic);
    let basic = solver.get_basic_variables().unwrap();
    assert!(basic.contains(&-2));
    assert!(basic.contains(&-3));
    // The modified model solves to the same optimum; the new rows are
    // slack
    solver.solve().unwrap();
    assert_eq!(solver.model_status(), ModelStatus::Optimal);
    assert!((solver.info().objective_function_value + 7.0).abs() < 1e-6);
}

#[test]
fn test_add_then_delete_cols_round_trip() {
    let reference = bounded_lp();
    let mut solver =
        simplex_core::SimplexSolver::new(reference.clone(), SolverOptions::default()).unwrap();
    solver
        .add_cols(
            2,
            &[5.0, 6.0],
            &[0.0, 0.0],
            &[1.0, 2.0],
            &[0, 1, 2],
            &[0, 0],
            &[3.0, 4.0],
        )
        .unwrap();
    assert_eq!(solver.lp().num_col(), 4);
    let mut mask = vec![0, 0, 1, 1];
    let mut ix = IndexCollection::Mask(&mut mask);
    solver.delete_cols(&mut ix).unwrap();
    assert_eq!(solver.lp().num_col(), 2);
    assert_eq!(solver.lp().col_cost, reference.col_cost);
    assert_eq!(solver.lp().col_lower, reference.col_lower);
    assert_eq!(solver.lp().col_upper, reference.col_upper);
    assert_eq!(
        solver.lp().a_matrix.to_csmat().to_dense(),
        reference.a_matrix.to_csmat().to_dense()
    );
    // The mask now maps retained columns to their new positions
    assert_eq!(mask, vec![0, 1, -1, -1]);
}

#[test]
fn test_delete_rows_invalidates_basis() {
    let mut solver =
        simplex_core::SimplexSolver::new(bounded_lp(), SolverOptions::default()).unwrap();
    solver.solve().unwrap();
    assert!(solver.get_basis().valid);
    let mut ix = IndexCollection::Interval { from: 0, to: 0 };
    solver.delete_rows(&mut ix).unwrap();
    assert!(!solver.get_basis().valid);
    assert_eq!(solver.model_status(), ModelStatus::NotSet);
    assert_eq!(solver.lp().num_row(), 0);
}

#[test]
fn test_change_costs_resolves() {
    let mut solver =
        simplex_core::SimplexSolver::new(bounded_lp(), SolverOptions::default()).unwrap();
    solver.solve().unwrap();
    assert!((solver.info().objective_function_value + 7.0).abs() < 1e-6);
    // Make x0 the valuable one
    solver
        .change_costs(&IndexCollection::Interval { from: 0, to: 1 }, &[-5.0, -1.0])
        .unwrap();
    assert_eq!(solver.model_status(), ModelStatus::NotSet);
    solver.solve().unwrap();
    assert_eq!(solver.model_status(), ModelStatus::Optimal);
    // Now x0 = 3 and x1 = 1
    let solution = solver.get_solution();
    assert!((solution.col_value[0] - 3.0).abs() < 1e-6);
    assert!((solution.col_value[1] - 1.0).abs() < 1e-6);
}

#[test]
fn test_change_bounds_updates_nonbasic_status() {
    let mut solver =
        simplex_core::SimplexSolver::new(bounded_lp(), SolverOptions::default()).unwrap();
    solver.solve().unwrap();
    // x1 is basic-or-upper; force a tight box around zero for x1
    solver
        .change_col_bounds(
            &IndexCollection::Interval { from: 1, to: 1 },
            &[0.0],
            &[0.0],
        )
        .unwrap();
    solver.solve().unwrap();
    assert_eq!(solver.model_status(), ModelStatus::Optimal);
    let solution = solver.get_solution();
    assert_eq!(solution.col_value[1], 0.0);
    assert!((solution.col_value[0] - 3.0).abs() < 1e-6);
}

#[test]
fn test_change_coefficient_marks_alien_basis() {
    let mut solver =
        simplex_core::SimplexSolver::new(bounded_lp(), SolverOptions::default()).unwrap();
    solver.solve().unwrap();
    // x1 is basic at the optimum of this LP? x1 sits at its upper bound,
    // x0 is basic; change an entry of the basic column
    let basis = solver.get_basis().clone();
    let basic_col = basis
        .col_status
        .iter()
        .position(|&s| s == BasisStatus::Basic)
        .unwrap();
    solver.change_coefficient(0, basic_col, 2.5).unwrap();
    assert!(solver.get_basis().alien);
    assert_eq!(solver.get_coefficient(0, basic_col).unwrap(), 2.5);
    // The model resolves after the structural change
    solver.solve().unwrap();
    assert_eq!(solver.model_status(), ModelStatus::Optimal);
}

#[test]
fn test_change_coefficient_small_value_deletes() {
    let mut solver =
        simplex_core::SimplexSolver::new(bounded_lp(), SolverOptions::default()).unwrap();
    let num_nz = solver.lp().a_matrix.num_nz();
    solver.change_coefficient(0, 0, 1e-12).unwrap();
    assert_eq!(solver.lp().a_matrix.num_nz(), num_nz - 1);
    assert_eq!(solver.get_coefficient(0, 0).unwrap(), 0.0);
}

#[test]
fn test_scale_col_round_trip() {
    let reference = bounded_lp();
    let mut solver =
        simplex_core::SimplexSolver::new(reference.clone(), SolverOptions::default()).unwrap();
    solver.scale_col(0, -4.0).unwrap();
    assert_eq!(solver.get_coefficient(0, 0).unwrap(), -4.0);
    assert_eq!(solver.lp().col_upper[0], 0.0);
    assert_eq!(solver.lp().col_lower[0], -0.75);
    solver.scale_col(0, -0.25).unwrap();
    assert_eq!(
        solver.lp().a_matrix.to_csmat().to_dense(),
        reference.a_matrix.to_csmat().to_dense()
    );
    assert_eq!(solver.lp().col_lower, reference.col_lower);
    assert_eq!(solver.lp().col_upper, reference.col_upper);
    assert_eq!(solver.lp().col_cost, reference.col_cost);
}

#[test]
fn test_scale_row_flips_status() {
    let mut solver =
        simplex_core::SimplexSolver::new(bounded_lp(), SolverOptions::default()).unwrap();
    solver.solve().unwrap();
    // The single row is binding at the optimum, so it is nonbasic at a
    // bound; a negative row scaling must flip that bound
    let status_before = solver.get_basis().row_status[0];
    solver.scale_row(0, -1.0).unwrap();
    let status_after = solver.get_basis().row_status[0];
    match status_before {
        BasisStatus::Upper => assert_eq!(status_after, BasisStatus::Lower),
        BasisStatus::Lower => assert_eq!(status_after, BasisStatus::Upper),
        other => panic!("row unexpectedly {:?}", other),
    }
    assert_eq!(solver.lp().row_lower[0], -4.0);
    solver.solve().unwrap();
    assert_eq!(solver.model_status(), ModelStatus::Optimal);
    assert!((solver.info().objective_function_value + 7.0).abs() < 1e-6);
}

#[test]
fn test_basis_solve_and_basic_variables() {
    let mut solver =
        simplex_core::SimplexSolver::new(bounded_lp(), SolverOptions::default()).unwrap();
    solver.solve().unwrap();
    let basic = solver.get_basic_variables().unwrap();
    assert_eq!(basic.len(), 1);
    // Solve B x = e0 and check it against the basis column
    let rhs = vec![1.0];
    let mut value = vec![0.0];
    let mut indices = Vec::new();
    solver
        .basis_solve(&rhs, &mut value, Some(&mut indices), false)
        .unwrap();
    assert_eq!(indices.len(), 1);
    // The basic variable is x0 with column [1], so the solve is identity
    assert!((value[0] - 1.0).abs() < 1e-9);
}

#[test]
fn test_basis_solve_empty_model_is_noop() {
    let lp = Lp {
        col_cost: vec![1.0],
        col_lower: vec![0.0],
        col_upper: vec![1.0],
        row_lower: vec![],
        row_upper: vec![],
        a_matrix: SparseMatrix::new(0, 1),
        sense: ObjSense::Minimize,
        ..Default::default()
    };
    let mut solver = simplex_core::SimplexSolver::new(lp, SolverOptions::default()).unwrap();
    let rhs: Vec<f64> = Vec::new();
    let mut value: Vec<f64> = Vec::new();
    let outcome = solver.basis_solve(&rhs, &mut value, None, false).unwrap();
    assert_eq!(outcome, simplex_core::Outcome::Ok);
    assert!(value.is_empty());
}

#[test]
fn test_add_cols_zero_is_noop() {
    let mut solver =
        simplex_core::SimplexSolver::new(bounded_lp(), SolverOptions::default()).unwrap();
    let outcome = solver.add_cols(0, &[], &[], &[], &[0], &[], &[]).unwrap();
    assert_eq!(outcome, simplex_core::Outcome::Ok);
    assert_eq!(solver.lp().num_col(), 2);
}

#[test]
fn test_hot_start_round_trip() {
    let mut solver =
        simplex_core::SimplexSolver::new(bounded_lp(), SolverOptions::default()).unwrap();
    solver.solve().unwrap();
    let objective = solver.info().objective_function_value;
    let hot_start = solver.get_hot_start();
    assert!(hot_start.valid);

    let mut restarted =
        simplex_core::SimplexSolver::new(bounded_lp(), SolverOptions::default()).unwrap();
    restarted.set_hot_start(&hot_start).unwrap();
    restarted.solve().unwrap();
    assert_eq!(restarted.model_status(), ModelStatus::Optimal);
    assert!((restarted.info().objective_function_value - objective).abs() < 1e-9);
    // Resuming from the optimal basis takes no simplex iterations
    assert_eq!(restarted.info().simplex_iteration_count, 0);
}

#[test]
fn test_condition_estimate_of_solved_basis() {
    let mut solver =
        simplex_core::SimplexSolver::new(bounded_lp(), SolverOptions::default()).unwrap();
    solver.solve().unwrap();
    let condition = solver.compute_basis_condition().unwrap();
    assert!(condition >= 1.0);
    assert!(condition < 1e6);
}

#[test]
fn test_user_cost_scaling() {
    // user_cost_scale = 1 doubles the stored costs; reported duals and
    // objective come back in user units
    let mut lp = bounded_lp();
    lp.user_cost_scale = 1;
    let mut solver = simplex_core::SimplexSolver::new(lp, SolverOptions::default()).unwrap();
    assert_eq!(solver.lp().col_cost, vec![-2.0, -4.0]);
    solver.solve().unwrap();
    assert_eq!(solver.model_status(), ModelStatus::Optimal);
    assert!((solver.info().objective_function_value + 7.0).abs() < 1e-6);
}

#[test]
fn test_option_change_action_rescales() {
    let mut solver =
        simplex_core::SimplexSolver::new(bounded_lp(), SolverOptions::default()).unwrap();
    solver.solve().unwrap();
    solver.option_change_action(1, 0, 1e-7, 1e-7).unwrap();
    // The stored bounds doubled and the solution values moved with them
    assert_eq!(solver.lp().col_upper, vec![6.0, 6.0]);
    assert!((solver.get_solution().col_value[1] - 6.0).abs() < 1e-6);
    // Solving in the scaled space reproduces the scaled objective
    solver.solve().unwrap();
    assert_eq!(solver.model_status(), ModelStatus::Optimal);
}

#[test]
fn test_objective_offset_and_sense() {
    let mut lp = bounded_lp();
    lp.offset = 2.5;
    let (status, _solution) = solve(lp, &SolverOptions::default()).unwrap();
    assert_eq!(status, ModelStatus::Optimal);

    let mut lp = bounded_lp();
    lp.offset = 2.5;
    let mut solver = simplex_core::SimplexSolver::new(lp, SolverOptions::default()).unwrap();
    solver.solve().unwrap();
    assert!((solver.info().objective_function_value + 7.0 - 2.5).abs() < 1e-6);
}

#[test]
fn test_empty_model() {
    let lp = Lp::default();
    let mut solver = simplex_core::SimplexSolver::new(lp, SolverOptions::default()).unwrap();
    solver.solve().unwrap();
    assert_eq!(solver.model_status(), ModelStatus::ModelEmpty);
}
