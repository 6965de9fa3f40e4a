//! Signal weight normalization.

/// Convert raw non-negative weights into integer weights summing to exactly
/// 100.
///
/// Each weight is floored to its share of 100 and the rounding remainder goes
/// to the first signal. Negative or non-finite weights count as zero; when
/// every weight is zero the 100 points are split equally.
pub fn normalize_weights(raw: &[f64]) -> Vec<u32> {
    if raw.is_empty() {
        return Vec::new();
    }

    let clean: Vec<f64> = raw
        .iter()
        .map(|w| if w.is_finite() && *w > 0.0 { *w } else { 0.0 })
        .collect();
    let total: f64 = clean.iter().sum();

    let mut weights: Vec<u32> = if total > 0.0 {
        clean
            .iter()
            .map(|w| (w / total * 100.0).floor() as u32)
            .collect()
    } else {
        vec![100 / raw.len() as u32; raw.len()]
    };

    let assigned: u32 = weights.iter().sum();
    weights[0] += 100u32.saturating_sub(assigned);
    weights
}
