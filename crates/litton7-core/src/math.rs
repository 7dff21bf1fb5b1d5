//! Shared math utilities.

/// Numerically stable softmax over a slice of logits.
///
/// `+inf` logits share all of the mass equally. Otherwise NaN and `-inf`
/// contribute zero mass, and if every logit is one of those the result is all
/// zeros.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let infinite = logits.iter().filter(|v| **v == f32::INFINITY).count();
    if infinite > 0 {
        let share = 1.0 / infinite as f32;
        return logits
            .iter()
            .map(|&v| if v == f32::INFINITY { share } else { 0.0 })
            .collect();
    }

    let max = logits
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);

    let exps: Vec<f32> = logits
        .iter()
        .map(|&v| if v.is_finite() { (v - max).exp() } else { 0.0 })
        .collect();
    let sum: f32 = exps.iter().sum();
    if sum == 0.0 {
        return vec![0.0; logits.len()];
    }
    exps.into_iter().map(|v| v / sum).collect()
}

/// Index of the largest value. Ties resolve to the lowest index.
///
/// Returns `None` for an empty slice. NaN entries never win.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b || v.is_nan() => {}
            None if v.is_nan() => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
