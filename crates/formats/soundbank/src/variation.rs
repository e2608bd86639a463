//! Track selection for play-wave events with more than one candidate.

use parking_lot::Mutex;
use rand::Rng;
use serde::Serialize;

use crate::error::{Error, Result};

/// How a play-wave event chooses among its tracks on each play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u16)]
pub enum VariationPolicy {
    Ordered = 0,
    /// Plays in order like [`VariationPolicy::Ordered`]. The randomized
    /// starting track is not implemented.
    OrderedFromRandom = 1,
    Random = 2,
    RandomNoImmediateRepeats = 3,
}

impl VariationPolicy {
    /// Decode a stored playlist type. Shuffle (4) and unknown values fail.
    pub fn from_u16(v: u16) -> Result<Self> {
        match v {
            0 => Ok(Self::Ordered),
            1 => Ok(Self::OrderedFromRandom),
            2 => Ok(Self::Random),
            3 => Ok(Self::RandomNoImmediateRepeats),
            other => Err(Error::UnsupportedVariationPolicy(other)),
        }
    }
}

/// The last track a play-wave event picked.
///
/// Each event owns its own lock, so concurrent plays of unrelated events
/// never contend. The value is only written through [`SelectorState::advance`].
#[derive(Debug)]
pub struct SelectorState {
    last_picked: Mutex<i32>,
}

impl SelectorState {
    pub fn new() -> Self {
        Self {
            last_picked: Mutex::new(-1),
        }
    }

    /// Index of the previously picked track, or `None` before the first play.
    pub fn last_picked(&self) -> Option<usize> {
        usize::try_from(*self.last_picked.lock()).ok()
    }

    /// Pick the next track and remember it.
    pub fn advance<R: Rng + ?Sized>(
        &self,
        policy: VariationPolicy,
        weights: &[u8],
        rng: &mut R,
    ) -> usize {
        let mut last = self.last_picked.lock();
        let next = pick(policy, weights, usize::try_from(*last).ok(), rng);
        *last = next as i32;
        next
    }
}

impl Default for SelectorState {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SelectorState {
    fn clone(&self) -> Self {
        Self {
            last_picked: Mutex::new(*self.last_picked.lock()),
        }
    }
}

impl PartialEq for SelectorState {
    fn eq(&self, other: &Self) -> bool {
        self.last_picked() == other.last_picked()
    }
}

/// Choose the next track index for a play.
///
/// `weights` has one entry per track. Ordered policies ignore the weights.
/// Random policies draw `r` in `[0, total)` and scan from the highest index
/// down, taking the first index where `r > remaining - weight`.
pub fn pick<R: Rng + ?Sized>(
    policy: VariationPolicy,
    weights: &[u8],
    last_picked: Option<usize>,
    rng: &mut R,
) -> usize {
    let count = weights.len().max(1);
    match policy {
        VariationPolicy::Ordered | VariationPolicy::OrderedFromRandom => {
            last_picked.map_or(0, |last| (last + 1) % count)
        }
        VariationPolicy::Random => weighted_draw(weights, None, rng)
            .unwrap_or_else(|| fallback(weights, None, last_picked)),
        VariationPolicy::RandomNoImmediateRepeats => weighted_draw(weights, last_picked, rng)
            .unwrap_or_else(|| fallback(weights, last_picked, last_picked)),
    }
}

fn weighted_draw<R: Rng + ?Sized>(
    weights: &[u8],
    excluded: Option<usize>,
    rng: &mut R,
) -> Option<usize> {
    let candidates = weights
        .iter()
        .enumerate()
        .filter(move |&(i, _)| Some(i) != excluded)
        .map(|(i, &w)| (i, f64::from(w)));
    weighted_scan(candidates, rng.gen::<f64>())
}

/// Weighted choice over `(index, weight)` candidates for a draw `r` in `[0, 1)`.
///
/// Scans from the last candidate down, taking the first one where
/// `r * total > remaining - weight`. `None` when nothing qualifies (a zero
/// draw or zero total weight).
pub fn weighted_scan<I>(candidates: I, r: f64) -> Option<usize>
where
    I: IntoIterator<Item = (usize, f64)>,
    I::IntoIter: DoubleEndedIterator + Clone,
{
    let candidates = candidates.into_iter();
    let mut max: f64 = candidates.clone().map(|(_, w)| w).sum();
    let next = r * max;
    for (i, w) in candidates.rev() {
        if next > max - w {
            return Some(i);
        }
        max -= w;
    }
    None
}

// The scan selects nothing when the draw is exactly zero or every remaining
// weight is zero. Take the lowest nonzero candidate (the limit of a draw
// approaching zero), then the previous pick, then the first track.
fn fallback(weights: &[u8], excluded: Option<usize>, last_picked: Option<usize>) -> usize {
    weights
        .iter()
        .enumerate()
        .find(|&(i, &w)| Some(i) != excluded && w > 0)
        .map(|(i, _)| i)
        .or(last_picked)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn ordered_cycles_without_randomness() {
        let mut rng = StdRng::seed_from_u64(1);
        let weights = [0, 0, 0, 0];
        let mut last = None;
        let mut seen = Vec::new();
        for _ in 0..10 {
            let next = pick(VariationPolicy::Ordered, &weights, last, &mut rng);
            seen.push(next);
            last = Some(next);
        }
        assert_eq!(seen, [0, 1, 2, 3, 0, 1, 2, 3, 0, 1]);
    }

    #[test]
    fn ordered_from_random_shares_ordered_rule() {
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(
            pick(VariationPolicy::OrderedFromRandom, &[1, 1, 1], None, &mut rng),
            0
        );
        assert_eq!(
            pick(VariationPolicy::OrderedFromRandom, &[1, 1, 1], Some(2), &mut rng),
            0
        );
        assert_eq!(
            pick(VariationPolicy::OrderedFromRandom, &[1, 1, 1], Some(0), &mut rng),
            1
        );
    }

    #[test]
    fn random_frequencies_follow_weights() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let weights = [1, 1, 2];
        let mut counts = [0usize; 3];
        let draws = 40_000;
        let mut last = None;
        for _ in 0..draws {
            let next = pick(VariationPolicy::Random, &weights, last, &mut rng);
            counts[next] += 1;
            last = Some(next);
        }
        let expected = [0.25, 0.25, 0.5];
        for (count, want) in counts.iter().zip(expected) {
            let freq = *count as f64 / draws as f64;
            assert!((freq - want).abs() < 0.02, "counts {counts:?}");
        }
    }

    #[test]
    fn random_never_picks_zero_weight() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..1000 {
            let next = pick(VariationPolicy::Random, &[0, 5, 0, 3], None, &mut rng);
            assert!(next == 1 || next == 3);
        }
    }

    #[test]
    fn no_immediate_repeats() {
        let mut rng = StdRng::seed_from_u64(77);
        let weights = [3, 1, 4, 1, 5];
        let mut last = None;
        for _ in 0..5000 {
            let next = pick(
                VariationPolicy::RandomNoImmediateRepeats,
                &weights,
                last,
                &mut rng,
            );
            assert_ne!(Some(next), last);
            last = Some(next);
        }
    }

    #[test]
    fn no_repeat_with_single_weighted_track_falls_back_to_last() {
        let mut rng = StdRng::seed_from_u64(3);
        let next = pick(
            VariationPolicy::RandomNoImmediateRepeats,
            &[0, 9, 0],
            Some(1),
            &mut rng,
        );
        assert_eq!(next, 1);
    }

    #[test]
    fn all_zero_weights_are_deterministic() {
        let mut rng = StdRng::seed_from_u64(4);
        assert_eq!(pick(VariationPolicy::Random, &[0, 0], None, &mut rng), 0);
        assert_eq!(pick(VariationPolicy::Random, &[0, 0], Some(1), &mut rng), 1);
    }

    #[test]
    fn single_track_always_zero() {
        let mut rng = StdRng::seed_from_u64(5);
        for policy in [
            VariationPolicy::Ordered,
            VariationPolicy::OrderedFromRandom,
            VariationPolicy::Random,
            VariationPolicy::RandomNoImmediateRepeats,
        ] {
            let mut last = None;
            for _ in 0..3 {
                let next = pick(policy, &[0xFF], last, &mut rng);
                assert_eq!(next, 0, "{policy:?}");
                last = Some(next);
            }
        }
    }

    #[test]
    fn scan_reaches_every_weighted_candidate() {
        let equal = || [(0, 1.0), (1, 1.0), (2, 1.0)];
        assert_eq!(weighted_scan(equal(), 0.1), Some(0));
        assert_eq!(weighted_scan(equal(), 0.5), Some(1));
        assert_eq!(weighted_scan(equal(), 0.9), Some(2));
        assert_eq!(weighted_scan(equal(), 0.0), None);

        // Zero-weight candidates are skipped over.
        let gapped = [(0, 1.0), (1, 0.0), (2, 1.0)];
        assert_eq!(weighted_scan(gapped, 0.25), Some(0));
        assert_eq!(weighted_scan(gapped, 0.75), Some(2));
        assert_eq!(weighted_scan([(0, 0.0), (1, 0.0)], 0.5), None);
    }

    #[test]
    fn shuffle_is_rejected() {
        assert!(matches!(
            VariationPolicy::from_u16(4),
            Err(Error::UnsupportedVariationPolicy(4))
        ));
        assert_eq!(
            VariationPolicy::from_u16(3).unwrap(),
            VariationPolicy::RandomNoImmediateRepeats
        );
    }

    #[test]
    fn selector_state_remembers_last_pick() {
        let mut rng = StdRng::seed_from_u64(6);
        let state = SelectorState::new();
        assert_eq!(state.last_picked(), None);
        state.advance(VariationPolicy::Ordered, &[1, 1], &mut rng);
        assert_eq!(state.last_picked(), Some(0));
        state.advance(VariationPolicy::Ordered, &[1, 1], &mut rng);
        assert_eq!(state.last_picked(), Some(1));
        let copy = state.clone();
        assert_eq!(copy, state);
    }
}
