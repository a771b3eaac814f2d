//! Saturation and repression laws shared by the flux definitions.
//!
//! Every function here returns a finite value for finite non-negative input,
//! including the exactly-zero substrate and zero-constant corners where the
//! textbook formula would evaluate 0/0.
//!
//! References:
//! - Cornish-Bowden A. Fundamentals of Enzyme Kinetics. 4th ed. Wiley-Blackwell, 2012
//! - Monod J. Annu Rev Microbiol. 1949;3:371-394

/// Simple Michaelis-Menten kinetics
///
/// v = Vmax * [S] / (Km + [S])
///
/// # Arguments
/// * `vmax` - Maximum reaction velocity
/// * `km` - Michaelis constant (same unit as `s`)
/// * `s` - Substrate concentration
///
/// # Reference
/// Michaelis L, Menten ML. Biochemische Zeitschrift. 1913;49:333-369
#[inline]
pub fn michaelis_menten(vmax: f64, km: f64, s: f64) -> f64 {
    if s <= 0.0 {
        return 0.0;
    }
    let denominator = km + s;
    if denominator <= 0.0 {
        return 0.0;
    }
    vmax * s / denominator
}

/// Monod specific growth rate
///
/// μ = μmax * [S] / (Ks + [S])
///
/// Same functional form as Michaelis-Menten; kept separate so call sites
/// read as growth rather than catalysis.
#[inline]
pub fn monod(mu_max: f64, ks: f64, s: f64) -> f64 {
    michaelis_menten(mu_max, ks, s)
}

/// Hill repression factor in [0, 1]
///
/// f = 1 / (1 + (x/K)^n)
///
/// No repressor (x <= 0) gives 1. A zero constant with repressor present
/// gives 0 (infinitely potent repression).
#[inline]
pub fn hill_repression(x: f64, k: f64, n: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    if k <= 0.0 {
        return 0.0;
    }
    1.0 / (1.0 + (x / k).powf(n))
}

/// Hill inhibition written in the K^n / (K^n + x^n) form
///
/// Algebraically equal to [`hill_repression`] for K > 0; written this way
/// to match the growth-inhibition equation. Returns 0 when both K and x are
/// zero.
#[inline]
pub fn hill_inhibition(x: f64, k: f64, n: f64) -> f64 {
    let k_n = k.max(0.0).powf(n);
    let x_n = x.max(0.0).powf(n);
    let denominator = k_n + x_n;
    if denominator <= 0.0 || !denominator.is_finite() {
        return if x <= 0.0 && k > 0.0 { 1.0 } else { 0.0 };
    }
    k_n / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_michaelis_menten_half_saturation() {
        // At [S] = Km, v = Vmax/2
        let v = michaelis_menten(10.0, 2.0, 2.0);
        assert!((v - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_michaelis_menten_zero_guards() {
        assert_eq!(michaelis_menten(1.0, 1.5, 0.0), 0.0);
        assert_eq!(michaelis_menten(1.0, 1.5, -0.2), 0.0);
        // Km = 0 and S > 0: fully saturated
        assert!((michaelis_menten(3.0, 0.0, 0.1) - 3.0).abs() < 1e-12);
        assert_eq!(michaelis_menten(3.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_hill_repression_limits() {
        assert_eq!(hill_repression(0.0, 1e-4, 2.0), 1.0);
        assert_eq!(hill_repression(1e-4, 0.0, 2.0), 0.0);
        assert!((hill_repression(1e-4, 1e-4, 2.0) - 0.5).abs() < 1e-12);
        assert!(hill_repression(1.0, 1e-4, 2.0) < 1e-6);
    }

    #[test]
    fn test_hill_inhibition_matches_repression() {
        for &x in &[1e-6, 5e-5, 1e-4, 3e-4, 1e-2] {
            let a = hill_inhibition(x, 1e-4, 2.0);
            let b = hill_repression(x, 1e-4, 2.0);
            assert!((a - b).abs() < 1e-12, "x={}: {} vs {}", x, a, b);
        }
    }

    #[test]
    fn test_hill_inhibition_zero_corners() {
        assert_eq!(hill_inhibition(0.0, 1e-4, 2.0), 1.0);
        assert_eq!(hill_inhibition(0.0, 0.0, 2.0), 0.0);
        assert_eq!(hill_inhibition(1e-4, 0.0, 2.0), 0.0);
        assert!(hill_inhibition(0.0, 0.0, 2.0).is_finite());
    }
}
