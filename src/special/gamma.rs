//! Log-gamma and the complete beta function.

const LANCZOS_G: f64 = 7.0;

const LANCZOS_COEFFICIENTS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

pub(super) const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_8;

/// Natural log of `|Γ(x)|` (Lanczos, g = 7).
///
/// Poles at non-positive integers give `+inf`.
pub fn gammaln(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 && x == x.floor() {
        return f64::INFINITY;
    }
    if x < 0.5 {
        // reflection: lnΓ(x) = ln π - ln|sin πx| - lnΓ(1 - x)
        let sin_pi_x = (std::f64::consts::PI * x).sin().abs();
        return std::f64::consts::PI.ln() - sin_pi_x.ln() - gammaln(1.0 - x);
    }
    let x = x - 1.0;
    let mut ag = LANCZOS_COEFFICIENTS[0];
    for (i, &c) in LANCZOS_COEFFICIENTS.iter().enumerate().skip(1) {
        ag += c / (x + i as f64);
    }
    let t = x + LANCZOS_G + 0.5;
    LN_SQRT_2PI + (x + 0.5) * t.ln() - t + ag.ln()
}

/// Complete beta function `B(a, b) = Γ(a)Γ(b)/Γ(a+b)` for positive arguments.
pub fn beta(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() || a <= 0.0 || b <= 0.0 {
        return f64::NAN;
    }
    (gammaln(a) + gammaln(b) - gammaln(a + b)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gammaln_integers() {
        assert_relative_eq!(gammaln(1.0), 0.0, epsilon = 1e-13);
        assert_relative_eq!(gammaln(2.0), 0.0, epsilon = 1e-13);
        // Γ(5) = 24
        assert_relative_eq!(gammaln(5.0), 24.0f64.ln(), max_relative = 1e-13);
        // Γ(0.5) = √π
        assert_relative_eq!(gammaln(0.5), std::f64::consts::PI.sqrt().ln(), max_relative = 1e-13);
    }

    #[test]
    fn test_gammaln_poles_and_reflection() {
        assert_eq!(gammaln(0.0), f64::INFINITY);
        assert_eq!(gammaln(-3.0), f64::INFINITY);
        // Γ(-0.5) = -2√π
        let expected = (2.0 * std::f64::consts::PI.sqrt()).ln();
        assert_relative_eq!(gammaln(-0.5), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_beta() {
        assert_relative_eq!(beta(1.0, 1.0), 1.0, max_relative = 1e-13);
        assert_relative_eq!(beta(3.0, 3.0), 1.0 / 30.0, max_relative = 1e-12);
        assert_relative_eq!(beta(2.0, 5.0), 1.0 / 30.0, max_relative = 1e-12);
        assert!(beta(0.0, 1.0).is_nan());
        assert!(beta(f64::NAN, 1.0).is_nan());
    }
}
