//! EMC - Magnetic Equivalent Circuit Solver
//!
//! Solves the reference core-and-airgap circuit and prints the airgap flux density.
//!
//! # Usage
//!
//! ```bash
//! emc --bh-file 35PN210.tab --relaxation 0.8
//! ```

use std::path::PathBuf;

use clap::Parser;
use emc_core::{error::Result, solve, Circuit, ModelParams, SolveStatus};
use tracing::Level;

/// Magnetic equivalent circuit solver
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Tab-separated B-H table for the core material; the core is linear without it
    #[arg(long, value_name = "BH_FILE")]
    bh_file: Option<PathBuf>,

    /// Magnetomotive force of the coil (A)
    #[arg(long, default_value_t = 10000.0)]
    mmf: f64,

    /// Relaxation factor for the Newton update, in (0, 1]
    #[arg(short, long, default_value_t = 1.0)]
    relaxation: f64,

    /// Log every Newton pass
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    // Build the circuit
    let mut circ = Circuit::new("EMC");
    let core_model = match &args.bh_file {
        Some(path) => {
            circ.add_model("BH", "35PN210", ModelParams::new(path.clone()))?;
            Some("35PN210")
        }
        None => None,
    };
    let gnd = circ.ground_node();
    circ.add_mmf_source("MMF1", "n1", gnd, args.mmf)?;
    circ.add_permeance("Rc", "n1", "n2", 3000.0, 10.0, 10.0, 120.0, core_model)?;
    circ.add_permeance("Rg", "n2", gnd, 1.0, 10.0, 10.0, 1.0, None)?;

    println!("{}", circ);

    // Solve
    let solution = solve(&mut circ, args.relaxation)?;
    if solution.status == SolveStatus::Exhausted {
        eprintln!(
            "warning: no convergence after {} iterations (error {:.3e})",
            solution.iterations, solution.error
        );
    }

    let gap = circ.get_element("Rg")?;
    if let Some(rg) = gap.as_permeance() {
        println!("airgap flux density: {}", rg.flux_density(&solution.x));
    }

    Ok(())
}
