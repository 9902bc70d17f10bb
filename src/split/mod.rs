//! Reproducible train/valid/test partitioning of annotated images.

use std::fmt;

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use crate::error::ConfigError;
use crate::ir::ImageId;

/// Allowed distance between the ratio sum and 1.0.
pub const RATIO_SUM_TOLERANCE: f64 = 0.001;

/// One of the three output subsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Valid,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Valid, Split::Test];

    /// Directory name under the output root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Valid => "valid",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Validated split ratios.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitRatios {
    train: f64,
    val: f64,
    test: f64,
}

impl SplitRatios {
    /// Each ratio must be in `[0, 1]` and the sum within [`RATIO_SUM_TOLERANCE`] of 1.
    pub fn new(train: f64, val: f64, test: f64) -> Result<Self, ConfigError> {
        let sum = train + val + test;
        let in_range = |r: f64| r.is_finite() && (0.0..=1.0).contains(&r);

        if !(in_range(train) && in_range(val) && in_range(test))
            || (sum - 1.0).abs() > RATIO_SUM_TOLERANCE
        {
            return Err(ConfigError::InvalidSplitRatios {
                train,
                val,
                test,
                sum,
            });
        }

        Ok(Self { train, val, test })
    }

    /// Everything goes to train: the single-output-directory mode.
    pub fn train_only() -> Self {
        Self {
            train: 1.0,
            val: 0.0,
            test: 0.0,
        }
    }

    pub fn train(&self) -> f64 {
        self.train
    }

    pub fn val(&self) -> f64 {
        self.val
    }

    pub fn test(&self) -> f64 {
        self.test
    }
}

/// Disjoint image-id groups, each in shuffled order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SplitAssignment {
    pub train: Vec<ImageId>,
    pub valid: Vec<ImageId>,
    pub test: Vec<ImageId>,
}

impl SplitAssignment {
    pub fn group(&self, split: Split) -> &[ImageId] {
        match split {
            Split::Train => &self.train,
            Split::Valid => &self.valid,
            Split::Test => &self.test,
        }
    }

    /// Non-empty groups in train, valid, test order.
    pub fn non_empty(&self) -> impl Iterator<Item = (Split, &[ImageId])> {
        Split::ALL
            .into_iter()
            .map(move |split| (split, self.group(split)))
            .filter(|(_, ids)| !ids.is_empty())
    }

    pub fn total(&self) -> usize {
        self.train.len() + self.valid.len() + self.test.len()
    }
}

/// Partitions `image_ids` with a generator seeded from `seed`.
///
/// The same ids in the same order with the same ratios and seed always
/// produce the same assignment.
pub fn partition_image_ids(image_ids: &[ImageId], ratios: SplitRatios, seed: u64) -> SplitAssignment {
    let mut rng = StdRng::seed_from_u64(seed);
    partition_image_ids_with_rng(image_ids, ratios, &mut rng)
}

/// Partitions `image_ids` using a caller-owned generator.
///
/// Group bounds come from cumulative counts over the shuffled ids:
/// `train = [0, floor(n*train))`, `valid` up to `floor(n*(train+val))`,
/// `test` the rest. With a zero test ratio the test group stays empty and
/// rounding leftovers go to `valid`.
pub fn partition_image_ids_with_rng<R: Rng + ?Sized>(
    image_ids: &[ImageId],
    ratios: SplitRatios,
    rng: &mut R,
) -> SplitAssignment {
    let total = image_ids.len();
    if total == 0 {
        return SplitAssignment::default();
    }

    let mut shuffled = image_ids.to_vec();
    shuffled.shuffle(rng);

    let train_end = ((total as f64 * ratios.train).floor() as usize).min(total);
    let val_end = if ratios.test > 0.0 {
        ((total as f64 * (ratios.train + ratios.val)).floor() as usize).clamp(train_end, total)
    } else {
        total
    };

    let test = shuffled.split_off(val_end);
    let valid = shuffled.split_off(train_end);

    SplitAssignment {
        train: shuffled,
        valid,
        test,
    }
}
