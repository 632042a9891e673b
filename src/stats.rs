use std::iter::Sum;

use num_traits::Float;
use statrs::distribution::{ChiSquared, ContinuousCDF, StudentsT};

use crate::{AssistError, Result};

#[allow(dead_code)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Tails {
    One,
    Two,
}

impl Tails {
    fn factor(&self) -> f64 {
        match self {
            Self::One => 1.,
            Self::Two => 2.,
        }
    }
}

fn to_f64<N: Float>(n: N) -> Result<f64> {
    n.to_f64().ok_or(AssistError::Stats)
}

struct Sample {
    mean: f64,
    len: f64,
    var: f64,
}

impl Sample {
    fn new<N: Float + Sum, T: IntoIterator<Item = N>>(sample: T) -> Result<Self> {
        let values = sample
            .into_iter()
            .map(to_f64)
            .collect::<Result<Vec<f64>>>()?;

        // a variance needs at least two points
        if values.len() < 2 {
            return Err(AssistError::Stats);
        }

        let len = values.len() as f64;
        let mean = values.iter().sum::<f64>() / len;
        let var = values.iter().map(|n| (n - mean).powi(2)).sum::<f64>() / (len - 1.);

        Ok(Sample { mean, len, var })
    }
}

#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub(crate) struct WelchsT {
    /// The p-value of the test, which is the probability accepting the results
    /// of the test is an error because the null hypothesis is in fact true.
    pub(crate) p: f64,

    /// The maximum allowed p-value.
    pub(crate) alpha: f64,

    /// The "tails" of the test.
    pub(crate) tails: Tails,
}

impl WelchsT {
    /// Runs the test on two samples.
    ///
    /// Returns [`AssistError::Stats`] if either sample has fewer than two
    /// points or both samples have no variance at all.
    ///
    /// # Panics
    ///
    /// `alpha` must be in (0, 1).
    pub(crate) fn two_sample<N, T, V>(a: T, b: V, alpha: f64, tails: Tails) -> Result<Self>
    where
        N: Float + Sum,
        T: IntoIterator<Item = N>,
        V: IntoIterator<Item = N>,
    {
        assert!(alpha > 0. && alpha < 1.);

        let a = Sample::new(a)?;
        let b = Sample::new(b)?;

        let (se_a, se_b) = (a.var / a.len, b.var / b.len);
        if se_a + se_b <= f64::EPSILON {
            return Err(AssistError::Stats);
        }

        // Welch-Satterthwaite
        let t = (a.mean - b.mean).abs() / (se_a + se_b).sqrt();
        let deg = (se_a + se_b).powi(2)
            / (se_a.powi(2) / (a.len - 1.) + se_b.powi(2) / (b.len - 1.));

        let dist = StudentsT::new(0.0, 1.0, deg).map_err(|_| AssistError::Stats)?;
        let p = (dist.cdf(-t) * tails.factor()).min(1.);

        Ok(Self { p, alpha, tails })
    }

    pub(crate) fn is_significant(&self) -> bool {
        self.p < self.alpha
    }
}

/// Pearson's chi-squared test of independence on a 2x2 table laid out as
/// `[a_yes, b_yes, a_no, b_no]`, returning the p-value.
pub(crate) fn chi_squared_2x2(table: &[u32; 4]) -> Result<f64> {
    let [a, b, c, d] = (*table).map(f64::from);
    let n = a + b + c + d;
    let rows = [a + b, c + d];
    let cols = [a + c, b + d];

    if rows.contains(&0.) || cols.contains(&0.) {
        return Err(AssistError::Stats);
    }

    let observed = [[a, b], [c, d]];
    let mut statistic = 0.;
    for (i, row) in observed.iter().enumerate() {
        for (j, &o) in row.iter().enumerate() {
            let expected = rows[i] * cols[j] / n;
            statistic += (o - expected).powi(2) / expected;
        }
    }

    let dist = ChiSquared::new(1.0).map_err(|_| AssistError::Stats)?;
    Ok(1. - dist.cdf(statistic))
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;
    use rand::{distributions::Distribution, rngs::StdRng, SeedableRng};
    use statrs::distribution::Normal;

    use super::*;

    #[test]
    fn degenerate_samples() {
        assert!(WelchsT::two_sample([1.0_f64], [1.0, 2.0], 0.05, Tails::Two).is_err());
        assert!(WelchsT::two_sample([3.0_f64, 3.0], [3.0, 3.0], 0.05, Tails::Two).is_err());
    }

    #[test]
    fn known_value() -> Result<()> {
        // t = sqrt(6) with 4 degrees of freedom, two-sided p of about 0.0705
        let test = WelchsT::two_sample([1.0_f64, 2.0, 3.0], [3.0, 4.0, 5.0], 0.05, Tails::Two)?;
        assert!((test.p - 0.0705).abs() < 1e-3);
        assert!(!test.is_significant());
        Ok(())
    }

    #[test]
    fn chi_squared() -> Result<()> {
        let p = chi_squared_2x2(&[50, 50, 50, 50])?;
        assert!((p - 1.).abs() < 1e-9);

        let p = chi_squared_2x2(&[900, 500, 100, 500])?;
        assert!(p < 1e-6);

        assert!(chi_squared_2x2(&[10, 10, 0, 0]).is_err());
        Ok(())
    }

    proptest! {
        #[test]
        fn separated_samples_are_significant(
            mean in 1.0_f64..10.0,
            std in 0.1_f64..1.0,
            seed in any::<u64>(),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let near = Normal::new(mean, std).unwrap();
            let far = Normal::new(mean + 20., std).unwrap();

            let a: Vec<f64> = (0..50).map(|_| near.sample(&mut rng)).collect();
            let b: Vec<f64> = (0..50).map(|_| far.sample(&mut rng)).collect();

            let test = WelchsT::two_sample(a, b, 0.05, Tails::Two)?;
            prop_assert!(test.is_significant());
            prop_assert!(test.p >= 0.);
        }

        #[test]
        fn p_value_is_symmetric(
            a in prop::collection::vec(0.0_f64..10.0, 3..30),
            b in prop::collection::vec(0.0_f64..10.0, 3..30),
        ) {
            if let (Ok(ab), Ok(ba)) = (
                WelchsT::two_sample(a.iter().copied(), b.iter().copied(), 0.05, Tails::Two),
                WelchsT::two_sample(b.iter().copied(), a.iter().copied(), 0.05, Tails::Two),
            ) {
                prop_assert!((ab.p - ba.p).abs() < 1e-9);
                prop_assert!(ab.p <= 1.);
            }
        }
    }
}
