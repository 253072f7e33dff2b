//! Distance metrics for the neighbor search.
//!
//! Metric names are accepted case-insensitively, with the usual aliases
//! (`l2`, `l1`, `taxicab`, `linfinity`).

use std::{fmt, str::FromStr};

use ndarray::ArrayView1;

use crate::error::KmerBinError;

/// A distance between two frequency vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    #[default]
    Euclidean,
    Manhattan,
    Chebyshev,
    Canberra,
    BrayCurtis,
    Cosine,
    Correlation,
    /// Defined for non-negative vectors, such as k-mer frequencies.
    Hellinger,
}

impl Metric {
    pub const ALL: [Self; 8] = [
        Self::Euclidean,
        Self::Manhattan,
        Self::Chebyshev,
        Self::Canberra,
        Self::BrayCurtis,
        Self::Cosine,
        Self::Correlation,
        Self::Hellinger,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::Manhattan => "manhattan",
            Self::Chebyshev => "chebyshev",
            Self::Canberra => "canberra",
            Self::BrayCurtis => "braycurtis",
            Self::Cosine => "cosine",
            Self::Correlation => "correlation",
            Self::Hellinger => "hellinger",
        }
    }

    /// Distance between `x` and `y`, which must have the same length.
    pub fn distance(self, x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64 {
        let pairs = || x.iter().zip(y.iter()).map(|(&a, &b)| (a, b));
        match self {
            Self::Euclidean => pairs().map(|(a, b)| (a - b) * (a - b)).sum::<f64>().sqrt(),
            Self::Manhattan => pairs().map(|(a, b)| (a - b).abs()).sum(),
            Self::Chebyshev => pairs().map(|(a, b)| (a - b).abs()).fold(0.0, f64::max),
            Self::Canberra => pairs()
                .map(|(a, b)| {
                    let denominator = a.abs() + b.abs();
                    if denominator > 0.0 {
                        (a - b).abs() / denominator
                    } else {
                        0.0
                    }
                })
                .sum(),
            Self::BrayCurtis => {
                let (numerator, denominator) = pairs().fold((0.0, 0.0), |(n, d), (a, b)| {
                    (n + (a - b).abs(), d + (a + b).abs())
                });
                if denominator > 0.0 {
                    numerator / denominator
                } else {
                    0.0
                }
            }
            Self::Cosine => cosine(pairs()),
            Self::Correlation => {
                let n = x.len() as f64;
                let mean_x = x.sum() / n;
                let mean_y = y.sum() / n;
                cosine(pairs().map(|(a, b)| (a - mean_x, b - mean_y)))
            }
            Self::Hellinger => {
                let (mut root_product, mut sum_x, mut sum_y) = (0.0, 0.0, 0.0);
                for (a, b) in pairs() {
                    root_product += (a * b).sqrt();
                    sum_x += a;
                    sum_y += b;
                }
                if sum_x == 0.0 && sum_y == 0.0 {
                    0.0
                } else if sum_x == 0.0 || sum_y == 0.0 {
                    1.0
                } else {
                    (1.0 - root_product / (sum_x * sum_y).sqrt()).max(0.0).sqrt()
                }
            }
        }
    }
}

/// One minus the cosine similarity; zero vectors are equal to each other and
/// maximally far from everything else.
fn cosine(pairs: impl Iterator<Item = (f64, f64)>) -> f64 {
    let (mut dot, mut norm_x, mut norm_y) = (0.0, 0.0, 0.0);
    for (a, b) in pairs {
        dot += a * b;
        norm_x += a * a;
        norm_y += b * b;
    }
    if norm_x == 0.0 && norm_y == 0.0 {
        0.0
    } else if norm_x == 0.0 || norm_y == 0.0 {
        1.0
    } else {
        (1.0 - dot / (norm_x * norm_y).sqrt()).max(0.0)
    }
}

impl FromStr for Metric {
    type Err = KmerBinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "euclidean" | "l2" => Ok(Self::Euclidean),
            "manhattan" | "l1" | "taxicab" => Ok(Self::Manhattan),
            "chebyshev" | "linfinity" | "linfty" | "linf" => Ok(Self::Chebyshev),
            "canberra" => Ok(Self::Canberra),
            "braycurtis" => Ok(Self::BrayCurtis),
            "cosine" => Ok(Self::Cosine),
            "correlation" => Ok(Self::Correlation),
            "hellinger" => Ok(Self::Hellinger),
            _ => Err(KmerBinError::UnknownMetric {
                name: s.to_string(),
                expected: Self::ALL.map(Self::name).join(", "),
            }),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    fn dist(metric: Metric, x: &Array1<f64>, y: &Array1<f64>) -> f64 {
        metric.distance(x.view(), y.view())
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn parse_names_and_aliases() {
        assert_eq!("euclidean".parse::<Metric>().unwrap(), Metric::Euclidean);
        assert_eq!("L2".parse::<Metric>().unwrap(), Metric::Euclidean);
        assert_eq!("taxicab".parse::<Metric>().unwrap(), Metric::Manhattan);
        assert_eq!("linfinity".parse::<Metric>().unwrap(), Metric::Chebyshev);
        assert_eq!("Cosine".parse::<Metric>().unwrap(), Metric::Cosine);
        for metric in Metric::ALL {
            assert_eq!(metric.name().parse::<Metric>().unwrap(), metric);
        }
    }

    #[test]
    fn parse_unknown_metric() {
        let err = "mahalanobis".parse::<Metric>().unwrap_err();
        assert!(matches!(err, KmerBinError::UnknownMetric { ref name, .. } if name == "mahalanobis"));
        insta::assert_snapshot!(err.to_string(), @"unknown distance metric 'mahalanobis' (expected one of: euclidean, manhattan, chebyshev, canberra, braycurtis, cosine, correlation, hellinger)");
    }

    #[test]
    fn minkowski_family() {
        let x = array![0.0, 0.0];
        let y = array![3.0, 4.0];
        assert!(close(dist(Metric::Euclidean, &x, &y), 5.0));
        assert!(close(dist(Metric::Manhattan, &x, &y), 7.0));
        assert!(close(dist(Metric::Chebyshev, &x, &y), 4.0));
    }

    #[test]
    fn canberra_skips_zero_pairs() {
        let x = array![0.0, 1.0, 2.0];
        let y = array![0.0, 3.0, 2.0];
        assert!(close(dist(Metric::Canberra, &x, &y), 0.5));
    }

    #[test]
    fn bray_curtis() {
        let x = array![1.0, 2.0];
        let y = array![3.0, 2.0];
        assert!(close(dist(Metric::BrayCurtis, &x, &y), 0.25));
        let zero = array![0.0, 0.0];
        assert!(close(dist(Metric::BrayCurtis, &zero, &zero), 0.0));
    }

    #[test]
    fn cosine_and_correlation() {
        let x = array![1.0, 2.0, 3.0];
        let y = array![2.0, 4.0, 6.0];
        assert!(close(dist(Metric::Cosine, &x, &y), 0.0));
        assert!(close(dist(Metric::Correlation, &x, &y), 0.0));

        let a = array![1.0, 0.0];
        let b = array![0.0, 1.0];
        assert!(close(dist(Metric::Cosine, &a, &b), 1.0));

        let zero = array![0.0, 0.0];
        assert!(close(dist(Metric::Cosine, &zero, &zero), 0.0));
        assert!(close(dist(Metric::Cosine, &zero, &a), 1.0));
    }

    #[test]
    fn hellinger() {
        let x = array![0.25, 0.75];
        assert!(close(dist(Metric::Hellinger, &x, &x), 0.0));
        let a = array![1.0, 0.0];
        let b = array![0.0, 1.0];
        assert!(close(dist(Metric::Hellinger, &a, &b), 1.0));
    }

    #[test]
    fn distances_are_symmetric() {
        let x = array![0.1, 0.7, 0.0, 2.5];
        let y = array![1.3, 0.2, 0.4, 0.0];
        for metric in Metric::ALL {
            assert!(
                close(dist(metric, &x, &y), dist(metric, &y, &x)),
                "{metric} is not symmetric"
            );
            assert!(dist(metric, &x, &x).abs() < 1e-6, "{metric}(x, x) != 0");
        }
    }

    #[test]
    fn display_is_canonical_name() {
        assert_eq!(Metric::BrayCurtis.to_string(), "braycurtis");
        assert_eq!(Metric::default(), Metric::Euclidean);
    }
}
