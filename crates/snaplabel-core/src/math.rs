//! Shared math utilities.

/// Numerically stable softmax in place.
///
/// Non-finite logits take no part in the normalization and come out as NaN,
/// so ranking drops them; the finite entries still sum to 1.
pub fn softmax_in_place(v: &mut [f32]) {
    let max = v
        .iter()
        .copied()
        .filter(|x| x.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        v.iter_mut().for_each(|x| *x = f32::NAN);
        return;
    }

    let mut sum = 0.0;
    for x in v.iter_mut() {
        if x.is_finite() {
            *x = (*x - max).exp();
            sum += *x;
        } else {
            *x = f32::NAN;
        }
    }
    // sum >= 1: the max entry contributes exp(0)
    for x in v.iter_mut().filter(|x| x.is_finite()) {
        *x /= sum;
    }
}
