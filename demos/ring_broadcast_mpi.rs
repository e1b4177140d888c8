//! cargo mpirun -n 5 --features mpi-support --example ring_broadcast_mpi -- "hello ring"
//!
//! Rank 2 broadcasts a text message over the ring; every rank prints what it
//! received.

#[cfg(feature = "mpi-support")]
fn main() {
    use std::env;
    use std::process;
    use wave_halo::prelude::*;

    const ROOT: usize = 2;
    const LEN: usize = 256;

    let comm = MpiComm::new().expect("MPI initialization failed");
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        println!("usage: ring_broadcast_mpi <text_to_print>");
        return;
    }
    if comm.size() <= ROOT {
        eprintln!("This example requires at least {} ranks.", ROOT + 1);
        process::exit(1);
    }

    let mut buffer = [0u8; LEN];
    if comm.rank() == ROOT {
        let msg = args[1].as_bytes();
        let n = msg.len().min(LEN);
        buffer[..n].copy_from_slice(&msg[..n]);
    }

    broadcast_ring(&comm, &mut buffer, LEN, ROOT).expect("ring broadcast failed");

    let end = buffer.iter().position(|&b| b == 0).unwrap_or(LEN);
    println!(
        "process {} received: \"{}\"",
        comm.rank(),
        String::from_utf8_lossy(&buffer[..end])
    );
}

#[cfg(not(feature = "mpi-support"))]
fn main() {
    eprintln!("This example requires the 'mpi-support' feature to run.");
}
