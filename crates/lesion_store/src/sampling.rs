use lesion::Label;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{info, warn};
use crate::metadata::SampleMeta;

/// Draw `per_class` samples with replacement from each label, benign rows
/// first. Each class gets its own generator seeded with `seed`, so the
/// result only depends on the input order and the seed.
pub fn balance(samples: &[SampleMeta], per_class: usize, seed: u64) -> Vec<SampleMeta> {
    let mut balanced = Vec::with_capacity(per_class * 2);

    for label in [Label::Benign, Label::Malignant] {
        let pool: Vec<&SampleMeta> = samples.iter().filter(|s| s.label() == label).collect();
        if pool.is_empty() {
            warn!(%label, "no samples for class, skipping");
            continue;
        }

        let mut rng = StdRng::seed_from_u64(seed);
        balanced.extend((0..per_class).map(|_| pool[rng.random_range(0..pool.len())].clone()));
    }

    info!(rows = balanced.len(), per_class, seed, "balanced dataset");
    balanced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Diagnosis;

    fn sample(id: &str, diagnosis: Diagnosis) -> SampleMeta {
        SampleMeta {
            lesion_id: None,
            image_id: id.to_string(),
            diagnosis,
            dx_type: None,
            age: None,
            sex: None,
            localization: None,
        }
    }

    fn dataset() -> Vec<SampleMeta> {
        vec![
            sample("n1", Diagnosis::Nv),
            sample("n2", Diagnosis::Nv),
            sample("n3", Diagnosis::Bkl),
            sample("m1", Diagnosis::Mel),
            sample("m2", Diagnosis::Bcc),
        ]
    }

    #[test]
    fn test_balance_draws_per_class() {
        let balanced = balance(&dataset(), 6, 42);
        assert_eq!(balanced.len(), 12);
        assert!(balanced[..6].iter().all(|s| s.label() == Label::Benign));
        assert!(balanced[6..].iter().all(|s| s.label() == Label::Malignant));
    }

    #[test]
    fn test_balance_is_seeded() {
        let ids = |rows: Vec<SampleMeta>| rows.into_iter().map(|s| s.image_id).collect::<Vec<_>>();
        assert_eq!(ids(balance(&dataset(), 20, 7)), ids(balance(&dataset(), 20, 7)));
    }

    #[test]
    fn test_balance_skips_missing_class() {
        let benign_only: Vec<SampleMeta> = dataset().into_iter().take(3).collect();
        let balanced = balance(&benign_only, 4, 1);
        assert_eq!(balanced.len(), 4);
    }
}
