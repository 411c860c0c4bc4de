//! Simple LP example demonstrating the simplex engine.
//!
//! Solves:
//!   minimize    x1 + x2
//!   subject to  x1 + x2 = 1
//!               x1, x2 >= 0
//!
//! Optimal objective = 1.0, attained at any point on the constraint.

use simplex_core::{solve, Lp, ObjSense, SolverOptions, SparseMatrix, INF};

fn main() {
    println!("simplex-core - Simple LP Example");
    println!("================================");
    println!();

    // Problem: min x1 + x2 s.t. x1 + x2 = 1, x1 >= 0, x2 >= 0
    //
    // The engine takes the row form directly:
    //   row_lower <= A x <= row_upper, col_lower <= x <= col_upper
    //
    // A = [1  1], row bounds [1, 1] (equality)

    let mut tri = sprs::TriMat::new((1, 2));
    tri.add_triplet(0, 0, 1.0);
    tri.add_triplet(0, 1, 1.0);

    let lp = Lp {
        col_cost: vec![1.0, 1.0],
        col_lower: vec![0.0, 0.0],
        col_upper: vec![INF, INF],
        row_lower: vec![1.0],
        row_upper: vec![1.0],
        a_matrix: SparseMatrix::from_csmat(&tri.to_csc()),
        sense: ObjSense::Minimize,
        ..Default::default()
    };

    let options = SolverOptions::default();

    match solve(lp, &options) {
        Ok((status, solution)) => {
            println!("=== Solution ===");
            println!("Status: {}", status);
            println!("x1 = {:.6}", solution.col_value[0]);
            println!("x2 = {:.6}", solution.col_value[1]);
            println!("row activity = {:.6}", solution.row_value[0]);
            println!("row dual     = {:.6}", solution.row_dual[0]);

            // Verify the constraint
            let sum = solution.col_value[0] + solution.col_value[1];
            println!(
                "\nConstraint verification: x1 + x2 = {:.6} (should be 1.0)",
                sum
            );
        }
        Err(e) => {
            eprintln!("Solver failed: {}", e);
            std::process::exit(1);
        }
    }
}
