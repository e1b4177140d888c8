use proptest::prelude::*;
use wave_halo::algs::partition::{owned_range, partitions};
use wave_halo::wave_error::WaveError;

proptest! {
    #[test]
    fn ranges_tile_the_interior(i_max in 3usize..2_000, size in 1usize..64) {
        prop_assume!(size <= i_max - 2);
        let parts = partitions(i_max, size).unwrap();
        let mut next = 1;
        for (rank, p) in parts.iter().enumerate() {
            prop_assert_eq!(p.rank, rank);
            prop_assert_eq!(p.start, next, "gap or overlap before rank {}", rank);
            prop_assert!(!p.is_empty());
            next = p.stop;
        }
        prop_assert_eq!(next, i_max - 1);
    }

    #[test]
    fn only_the_last_worker_is_larger(i_max in 3usize..2_000, size in 1usize..64) {
        prop_assume!(size <= i_max - 2);
        let share = (i_max - 2) / size;
        let parts = partitions(i_max, size).unwrap();
        for p in &parts[..size - 1] {
            prop_assert_eq!(p.len(), share);
        }
        prop_assert_eq!(parts[size - 1].len(), i_max - 2 - share * (size - 1));
    }

    #[test]
    fn oversubscription_is_rejected(i_max in 3usize..40, extra in 1usize..8) {
        let size = i_max - 2 + extra;
        prop_assert_eq!(
            owned_range(i_max, size, 0),
            Err(WaveError::TooManyWorkers { workers: size, interior: i_max - 2 })
        );
    }
}

#[test]
fn ranges_are_recomputed_identically() {
    for rank in 0..7 {
        assert_eq!(owned_range(1003, 7, rank), owned_range(1003, 7, rank));
    }
}
