//! Convergence diagnostics for multi-chain samples.

/// R-hat above this is reported as a warning.
pub const RHAT_WARN: f64 = 1.05;

/// Split-R̂ (Gelman–Rubin on half-chains).
///
/// `values` is chain-major with `draws` values per chain. Each chain is split
/// into two halves (the middle draw is dropped for odd lengths). Returns
/// `None` when the halves are shorter than two draws.
pub fn split_rhat(values: &[f64], chains: usize, draws: usize) -> Option<f64> {
    let half = draws / 2;
    if chains == 0 || half < 2 || values.len() != chains * draws {
        return None;
    }

    let mut segments: Vec<&[f64]> = Vec::with_capacity(2 * chains);
    for c in 0..chains {
        let chain = &values[c * draws..(c + 1) * draws];
        segments.push(&chain[..half]);
        segments.push(&chain[draws - half..]);
    }

    let m = segments.len() as f64;
    let n = half as f64;
    let means: Vec<f64> = segments.iter().map(|s| mean(s)).collect();
    let grand = mean(&means);

    let between = n / (m - 1.0) * means.iter().map(|mu| (mu - grand).powi(2)).sum::<f64>();
    let within = segments
        .iter()
        .zip(&means)
        .map(|(s, mu)| s.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / (n - 1.0))
        .sum::<f64>()
        / m;

    if within == 0.0 {
        return Some(if between == 0.0 { 1.0 } else { f64::INFINITY });
    }

    let var_plus = (n - 1.0) / n * within + between / n;
    Some((var_plus / within).sqrt())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
