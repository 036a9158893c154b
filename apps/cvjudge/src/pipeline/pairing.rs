//! Pairing Strategy — picks the record each primary is compared against.

use rand::Rng;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PairingStrategy {
    /// Compare with the next record; the last record has no counterpart.
    #[default]
    Sequential,
    /// Compare with a uniformly drawn other record. Repeats across primaries are allowed.
    Random,
}

impl PairingStrategy {
    /// Rejects tables on which the strategy cannot produce a counterpart.
    pub fn validate(&self, len: usize) -> Result<(), AppError> {
        match self {
            PairingStrategy::Random if len < 2 => Err(AppError::Config(format!(
                "random pairing needs at least 2 records, table has {len}"
            ))),
            _ => Ok(()),
        }
    }

    /// Position of the counterpart for `position`, or `None` when there is none.
    pub fn counterpart<R: Rng + ?Sized>(
        &self,
        position: usize,
        len: usize,
        rng: &mut R,
    ) -> Result<Option<usize>, AppError> {
        match self {
            PairingStrategy::Sequential => Ok((position + 1 < len).then_some(position + 1)),
            PairingStrategy::Random => {
                self.validate(len)?;
                loop {
                    let drawn = rng.gen_range(0..len);
                    if drawn != position {
                        return Ok(Some(drawn));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sequential_pairs_with_next() {
        let mut rng = StdRng::seed_from_u64(1);
        let s = PairingStrategy::Sequential;
        assert_eq!(s.counterpart(0, 3, &mut rng).unwrap(), Some(1));
        assert_eq!(s.counterpart(1, 3, &mut rng).unwrap(), Some(2));
        assert_eq!(s.counterpart(2, 3, &mut rng).unwrap(), None);
    }

    #[test]
    fn test_sequential_single_record_has_no_counterpart() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            PairingStrategy::Sequential.counterpart(0, 1, &mut rng).unwrap(),
            None
        );
        assert!(PairingStrategy::Sequential.validate(1).is_ok());
    }

    #[test]
    fn test_random_never_pairs_with_self() {
        let mut rng = StdRng::seed_from_u64(42);
        let len = 4;
        for draw in 0..10_000 {
            let position = draw % len;
            let other = PairingStrategy::Random
                .counterpart(position, len, &mut rng)
                .unwrap()
                .unwrap();
            assert_ne!(other, position);
            assert!(other < len);
        }
    }

    #[test]
    fn test_random_two_records_always_pick_the_other() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(
                PairingStrategy::Random.counterpart(0, 2, &mut rng).unwrap(),
                Some(1)
            );
        }
    }

    #[test]
    fn test_random_reaches_every_other_record() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = [false; 5];
        for _ in 0..1_000 {
            let other = PairingStrategy::Random.counterpart(2, 5, &mut rng).unwrap().unwrap();
            seen[other] = true;
        }
        assert_eq!(seen, [true, true, false, true, true]);
    }

    #[test]
    fn test_random_single_record_is_config_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = PairingStrategy::Random.counterpart(0, 1, &mut rng).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(PairingStrategy::Random.validate(1).is_err());
    }
}
