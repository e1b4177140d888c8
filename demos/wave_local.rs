//! cargo run --example wave_local -- 10000 1000 4
//!
//! Runs the halo-exchange engine on an in-process group and checks the
//! gathered field against the sequential kernel.

use std::env;
use std::process;
use std::time::Instant;

use wave_halo::prelude::*;

fn parse_arg(args: &[String], idx: usize, default: usize) -> usize {
    match args.get(idx) {
        None => default,
        Some(s) => s.parse().unwrap_or_else(|_| {
            eprintln!("usage: wave_local [i_max] [t_max] [workers]");
            process::exit(1);
        }),
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let i_max = parse_arg(&args, 1, 10_000);
    let t_max = parse_arg(&args, 2, 1_000);
    let workers = parse_arg(&args, 3, 4);

    // One sine period, fixed at zero on both ends.
    let n = (i_max - 1) as f64;
    let init: Vec<f64> = (0..i_max)
        .map(|i| (std::f64::consts::TAU * i as f64 / n).sin())
        .collect();

    let cfg = SimulationConfig::with_steps(t_max);
    let start = Instant::now();
    let outcomes = run_local_group(workers, |comm| {
        let field = Field::at_rest(init.clone())?;
        WaveSimulation::new(&comm, i_max, &cfg)?.run(field)
    })
    .expect("failed to start local group");
    let took = start.elapsed().as_secs_f64();

    let field = match outcomes.into_iter().next() {
        Some(Ok(WorkerOutcome::Coordinator(field))) => field,
        Some(Err(e)) => {
            eprintln!("simulation failed: {e}");
            process::exit(1);
        }
        _ => unreachable!("rank 0 is the coordinator"),
    };

    let reference = simulate_sequential(t_max, Field::at_rest(init).expect("valid field"));
    let max_err = field
        .iter()
        .zip(&reference)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max);

    println!("Took {took:.6} seconds");
    println!("Normalized: {:.6e} seconds", took / (i_max as f64 * t_max as f64));
    println!("max |distributed - sequential| = {max_err:e}");
}
