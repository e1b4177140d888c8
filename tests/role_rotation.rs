use wave_halo::data::field::{Field, Role, RoleMap};

/// Model: the slot that plays `current` after `t` swaps, tracked by label
/// instead of by array identity.
fn model_current_slot(t: usize) -> usize {
    // slot 1 starts as current, then slot 2 (old next), then slot 0 (old previous)
    [1, 2, 0][t % 3]
}

#[test]
fn rotating_t_times_permutes_which_slot_is_current() {
    for t in 0..12 {
        assert_eq!(RoleMap::after(t).slot(Role::Current), model_current_slot(t));
    }
}

#[test]
fn roles_always_form_a_permutation() {
    let mut map = RoleMap::default();
    for _ in 0..10 {
        let mut slots: Vec<_> = [Role::Previous, Role::Current, Role::Next]
            .iter()
            .map(|&r| map.slot(r))
            .collect();
        slots.sort_unstable();
        assert_eq!(slots, vec![0, 1, 2]);
        map.rotate();
    }
}

#[test]
fn field_reads_follow_the_model() {
    let tagged = |k: f64| vec![0.0, k, 0.0];
    let mut field = Field::new(tagged(100.0), tagged(101.0), tagged(102.0)).unwrap();
    for t in 0..7 {
        assert_eq!(field.roles(), RoleMap::after(t));
        assert_eq!(field.current()[1], 100.0 + model_current_slot(t) as f64);
        field.rotate();
    }
}
