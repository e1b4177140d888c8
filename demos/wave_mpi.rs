//! cargo mpirun -n 4 --features mpi-support --example wave_mpi -- 10000 1000
//!
//! Each rank builds the same initial field; rank 0 prints timing and a few
//! samples of the gathered result.

#[cfg(feature = "mpi-support")]
fn main() {
    use std::env;
    use std::process;
    use std::time::Instant;
    use wave_halo::prelude::*;

    let comm = MpiComm::new().expect("MPI initialization failed");
    let args: Vec<String> = env::args().collect();
    let i_max: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(10_000);
    let t_max: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(1_000);

    let n = (i_max - 1) as f64;
    let init: Vec<f64> = (0..i_max)
        .map(|i| (std::f64::consts::TAU * i as f64 / n).sin())
        .collect();

    let start = Instant::now();
    let outcome = simulate(&comm, t_max, init.clone(), init.clone(), init);
    let took = start.elapsed().as_secs_f64();

    match outcome {
        Ok(WorkerOutcome::Coordinator(field)) => {
            println!("Took {took:.6} seconds");
            println!("Normalized: {:.6e} seconds", took / (i_max as f64 * t_max as f64));
            for i in (0..i_max).step_by((i_max / 8).max(1)) {
                println!("{i:>8} {:+.6}", field[i]);
            }
        }
        Ok(WorkerOutcome::Released) => {}
        Err(e) => {
            eprintln!("[rank {}] simulation failed: {e}", comm.rank());
            process::exit(1);
        }
    }
}

#[cfg(not(feature = "mpi-support"))]
fn main() {
    eprintln!("This example requires the 'mpi-support' feature to run.");
}
