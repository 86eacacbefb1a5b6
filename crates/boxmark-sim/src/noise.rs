use rand::rngs::StdRng;
use rand::Rng;

/// Standard normal sample (Box-Muller).
pub(crate) fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1 = rng.random::<f64>().max(f64::MIN_POSITIVE);
    let u2 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Add Gaussian noise, then salt-and-pepper impulses, then quantize.
///
/// `salt_pepper` is the total impulse probability, split evenly between 0
/// and 255.
pub(crate) fn quantize_with_noise(
    values: &[f64],
    sigma: f64,
    salt_pepper: f64,
    rng: &mut StdRng,
) -> Vec<u8> {
    values
        .iter()
        .map(|&v| {
            let mut v = v;
            if sigma > 0.0 {
                v += sigma * standard_normal(rng);
            }
            if salt_pepper > 0.0 {
                let u = rng.random::<f64>();
                if u < 0.5 * salt_pepper {
                    v = 0.0;
                } else if u < salt_pepper {
                    v = 255.0;
                }
            }
            v.round().clamp(0.0, 255.0) as u8
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn normal_samples_have_unit_spread() {
        let mut rng = StdRng::seed_from_u64(11);
        let n = 20_000;
        let xs: Vec<f64> = (0..n).map(|_| standard_normal(&mut rng)).collect();
        let mean = xs.iter().sum::<f64>() / n as f64;
        let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((var - 1.0).abs() < 0.05, "var {var}");
    }

    #[test]
    fn noiseless_quantization_rounds_and_clamps() {
        let mut rng = StdRng::seed_from_u64(0);
        let out = quantize_with_noise(&[-3.0, 12.4, 12.6, 300.0], 0.0, 0.0, &mut rng);
        assert_eq!(out, vec![0, 12, 13, 255]);
    }

    #[test]
    fn impulses_hit_requested_fraction() {
        let mut rng = StdRng::seed_from_u64(3);
        let values = vec![128.0; 100_000];
        let out = quantize_with_noise(&values, 0.0, 0.02, &mut rng);
        let salt = out.iter().filter(|&&v| v == 255).count();
        let pepper = out.iter().filter(|&&v| v == 0).count();
        assert!((700..1300).contains(&salt), "salt {salt}");
        assert!((700..1300).contains(&pepper), "pepper {pepper}");
    }
}
