use super::{TreeFloat, TreeInt};
use rustc_hash::FxHashSet;
use thiserror::Error;

/// How continuous node heights become integer times.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub enum Discretization {
    /// Times are the ranks `1..=n` of the heights (factor 0).
    #[default]
    Ranked,
    /// Times are `ceil(height * factor)`, collisions pushed downwards.
    Timed(TreeFloat),
    /// Like `Timed`, with the factor chosen per tree so that the smallest
    /// gap between consecutive heights maps to one time step.
    TimedAuto,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiscretizationError {
    #[error(
        "Discretization factor {factor} leaves no free positive time; a larger factor is required."
    )]
    Underflow { factor: TreeFloat },
    #[error("Invalid discretization factor: {0}.")]
    InvalidFactor(TreeFloat),
    #[error("Cannot derive a discretization factor: no positive height gap.")]
    NoPositiveGap,
}

impl Discretization {
    /// Maps a single numeric factor: 0 is rank mode, a positive factor is
    /// timed mode.
    pub fn from_factor(factor: TreeFloat) -> Result<Self, DiscretizationError> {
        if factor == 0e0 {
            Ok(Self::Ranked)
        } else if factor.is_finite() && factor > 0e0 {
            Ok(Self::Timed(factor))
        } else {
            Err(DiscretizationError::InvalidFactor(factor))
        }
    }

    /// The numeric factor, if one is fixed up front.
    pub fn factor(&self) -> Option<TreeFloat> {
        match self {
            Self::Ranked => Some(0e0),
            Self::Timed(factor) => Some(*factor),
            Self::TimedAuto => None,
        }
    }
}

/// Turns heights into distinct positive integer times.
///
/// `heights[i]` is the height of the i-th internal node in tie-breaking
/// order: of two equal heights, the earlier one receives the smaller time.
/// The returned times line up with `heights`. Strictly smaller heights
/// always receive strictly smaller times.
pub fn discretize(
    heights: &[TreeFloat],
    discretization: Discretization,
) -> Result<Vec<TreeInt>, DiscretizationError> {
    let order = ascending_order(heights);
    match discretization {
        Discretization::Ranked => {
            let mut times: Vec<TreeInt> = vec![0; heights.len()];
            for (rank, &i) in order.iter().enumerate() {
                times[i] = rank as TreeInt + 1;
            }
            Ok(times)
        }
        Discretization::Timed(factor) => {
            scale_and_resolve(heights, &order, factor)
        }
        Discretization::TimedAuto => {
            let factor = minimum_gap_factor(heights, &order)?;
            tracing::debug!(factor, "derived discretization factor");
            scale_and_resolve(heights, &order, factor)
        }
    }
}

/// Indices of `heights` sorted ascending; the sort is stable, so ties keep
/// their input order.
fn ascending_order(heights: &[TreeFloat]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..heights.len()).collect();
    order.sort_by(|&a, &b| heights[a].total_cmp(&heights[b]));
    order
}

/// Reciprocal of the smallest positive gap between consecutive heights,
/// counting the leaves' height 0 as the lowest one.
fn minimum_gap_factor(
    heights: &[TreeFloat],
    order: &[usize],
) -> Result<TreeFloat, DiscretizationError> {
    let mut previous: TreeFloat = 0e0;
    let mut minimum_gap = TreeFloat::INFINITY;
    for &i in order {
        let gap = heights[i] - previous;
        if gap > 0e0 && gap < minimum_gap {
            minimum_gap = gap;
        }
        previous = heights[i];
    }

    if minimum_gap.is_finite() {
        Ok(1e0 / minimum_gap)
    } else {
        Err(DiscretizationError::NoPositiveGap)
    }
}

/// Scales every height by `factor`, rounds up, and resolves collisions from
/// the highest node downwards by stepping to the next free smaller integer.
fn scale_and_resolve(
    heights: &[TreeFloat],
    order: &[usize],
    factor: TreeFloat,
) -> Result<Vec<TreeInt>, DiscretizationError> {
    if !(factor.is_finite() && factor > 0e0) {
        return Err(DiscretizationError::InvalidFactor(factor));
    }

    let mut times: Vec<TreeInt> = vec![0; heights.len()];
    let mut taken: FxHashSet<TreeInt> = FxHashSet::default();
    for &i in order.iter().rev() {
        let scaled = (heights[i] * factor).ceil();
        if scaled.is_nan() || scaled < 1e0 {
            return Err(DiscretizationError::Underflow { factor });
        }

        let mut time = scaled as TreeInt;
        while taken.contains(&time) {
            time -= 1;
        }
        if time < 1 {
            return Err(DiscretizationError::Underflow { factor });
        }

        let _ = taken.insert(time);
        times[i] = time;
    }

    Ok(times)
}
