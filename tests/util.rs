#![allow(dead_code)]
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use wave_halo::prelude::*;

/// Random interior amplitudes in `[-1, 1)` between fixed boundaries.
pub fn random_wave(i_max: usize, seed: u64) -> Vec<f64> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut v: Vec<f64> = (0..i_max).map(|_| rng.gen_range(-1.0..1.0)).collect();
    v[0] = 0.25;
    v[i_max - 1] = -0.5;
    v
}

/// A single sine period over the interior, zero at both ends.
pub fn sine_pulse(i_max: usize) -> Vec<f64> {
    let n = (i_max - 1) as f64;
    (0..i_max)
        .map(|i| (std::f64::consts::TAU * i as f64 / n).sin())
        .collect()
}

/// Run the distributed engine on an in-process group and return the
/// coordinator's field, checking every other worker was released.
pub fn run_group(size: usize, config: &SimulationConfig, init: &[f64]) -> Vec<f64> {
    let outcomes = run_local_group(size, |comm| {
        let field = Field::at_rest(init.to_vec())?;
        WaveSimulation::new(&comm, init.len(), config)?.run(field)
    })
    .expect("local group");
    let mut it = outcomes.into_iter();
    let field = it
        .next()
        .expect("coordinator")
        .expect("coordinator run")
        .into_field()
        .expect("coordinator holds the field");
    for (rank, out) in it.enumerate() {
        assert_eq!(out, Ok(WorkerOutcome::Released), "rank {}", rank + 1);
    }
    field
}

pub fn sequential(t_max: usize, init: &[f64]) -> Vec<f64> {
    simulate_sequential(t_max, Field::at_rest(init.to_vec()).unwrap())
}

pub fn assert_close(got: &[f64], want: &[f64], tol: f64) {
    assert_eq!(got.len(), want.len());
    for (i, (g, w)) in got.iter().zip(want).enumerate() {
        assert!((g - w).abs() <= tol, "index {i}: got {g}, want {w}");
    }
}
