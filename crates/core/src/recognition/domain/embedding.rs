/// Fixed-length face descriptor produced by the embedding model.
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding {
    values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Builds a unit-length embedding. A zero vector stays zero.
    pub fn normalized(mut values: Vec<f32>) -> Self {
        l2_normalize(&mut values);
        Self { values }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// False if any component is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// Euclidean distance, accumulated in f64. Callers must compare
    /// embeddings of equal dimension; extra components are ignored.
    pub fn euclidean_distance(&self, other: &Embedding) -> f64 {
        debug_assert_eq!(self.dimension(), other.dimension());
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| {
                let d = *a as f64 - *b as f64;
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_l2_normalize_unit_vector() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert_relative_eq!(v[0], 0.6, epsilon = 1e-6);
        assert_relative_eq!(v[1], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let mut v = vec![0.0, 0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let e = Embedding::new(vec![0.1, -0.4, 0.7]);
        assert_relative_eq!(e.euclidean_distance(&e), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Embedding::new(vec![0.0, 0.0]);
        let b = Embedding::new(vec![3.0, 4.0]);
        assert_relative_eq!(a.euclidean_distance(&b), 5.0);
        assert_relative_eq!(b.euclidean_distance(&a), 5.0);
    }

    #[test]
    fn test_unit_vectors_distance_matches_cosine() {
        // |a - b| = sqrt(2 - 2 cos) for unit vectors
        let a = Embedding::normalized(vec![1.0, 0.0]);
        let b = Embedding::normalized(vec![1.0, 1.0]);
        let cos = std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(a.euclidean_distance(&b), (2.0 - 2.0 * cos).sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_dimension() {
        assert_eq!(Embedding::new(vec![0.0; 512]).dimension(), 512);
    }
}
