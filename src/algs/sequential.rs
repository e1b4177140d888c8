//! Single-partition reference run: no partition, no messages.

use crate::algs::stencil::update_range;
use crate::data::field::{Field, Role};

/// Advance `field` by `t_max` timesteps over the whole interior and return
/// the buffer holding the latest values.
pub fn simulate_sequential(t_max: usize, mut field: Field) -> Vec<f64> {
    let interior = 1..field.i_max() - 1;
    for _ in 0..t_max {
        let v = field.views();
        update_range(v.previous, v.current, v.next, interior.clone());
        field.rotate();
    }
    field.into_role(Role::Current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_steps_is_identity() {
        let init = vec![0.0, 3.0, -1.0, 0.0];
        let f = Field::new(vec![9.0; 4], init.clone(), vec![7.0; 4]).unwrap();
        assert_eq!(simulate_sequential(0, f), init);
    }

    #[test]
    fn boundaries_never_move() {
        let init = vec![1.5, 0.0, 2.0, 0.0, -0.5];
        let out = simulate_sequential(17, Field::at_rest(init).unwrap());
        assert_eq!(out[0], 1.5);
        assert_eq!(out[4], -0.5);
    }

    #[test]
    fn one_step_by_hand() {
        let init = vec![0.0, 1.0, 2.0, 3.0, 4.0, 0.0];
        let out = simulate_sequential(1, Field::at_rest(init).unwrap());
        let want = [0.0, 1.0, 2.0, 3.0, 3.25, 0.0];
        for (g, w) in out.iter().zip(want) {
            assert!((g - w).abs() < 1e-12);
        }
    }
}
