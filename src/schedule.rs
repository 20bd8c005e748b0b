/// `num` penalty strengths evenly spaced on a log scale, `10^start_exp ..= 10^stop_exp`.
///
/// The result is ascending whenever `start_exp <= stop_exp`, which is what
/// [`ConvexClustering::fit_path`](crate::ConvexClustering::fit_path) expects.
pub fn lambda_logspace(start_exp: f64, stop_exp: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![10f64.powf(start_exp)],
        _ => {
            let step = (stop_exp - start_exp) / (num - 1) as f64;
            (0..num)
                .map(|i| {
                    let exponent = if i == num - 1 {
                        stop_exp
                    } else {
                        start_exp + step * i as f64
                    };
                    10f64.powf(exponent)
                })
                .collect()
        }
    }
}
