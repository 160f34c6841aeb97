//! Steepest-ascent refinement at native resolution.
//!
//! The climber scores every position within a Chebyshev radius of the current
//! best, moves to the best neighbor if it strictly improves the score and stops
//! at the first local maximum. It does not search for the global maximum.

use crate::candidate::MatchCandidate;
use crate::kernel::{Kernel, ScoringLevel};
use crate::template::TemplatePlan;

/// Result of one climb: the terminal candidate and every visited best.
#[derive(Clone, Debug, PartialEq)]
pub struct ClimbOutcome {
    pub best: MatchCandidate,
    /// Successive bests starting with the seed; scores strictly increase.
    pub path: Vec<MatchCandidate>,
}

/// Climbs from `start` over `radius`-neighborhoods until no neighbor improves.
///
/// `start.score` must be the score of `start` at this level. Positions outside
/// the level are never visited; a zero radius returns the seed unchanged.
pub fn hill_climb<K: Kernel>(
    level: &ScoringLevel<'_>,
    plan: &TemplatePlan,
    start: MatchCandidate,
    radius: usize,
) -> ClimbOutcome {
    let mut path = vec![start];
    let Some((max_x, max_y)) = level.max_position(plan.width(), plan.height()) else {
        return ClimbOutcome { best: start, path };
    };
    if radius == 0 || start.x > max_x || start.y > max_y {
        return ClimbOutcome { best: start, path };
    }

    // Every move strictly improves the score, so no position repeats.
    let max_moves = (max_x + 1).saturating_mul(max_y + 1);
    let mut best = start;
    for _ in 0..max_moves {
        let x0 = best.x.saturating_sub(radius);
        let y0 = best.y.saturating_sub(radius);
        let x1 = (best.x + radius).min(max_x);
        let y1 = (best.y + radius).min(max_y);

        let mut next = best;
        for y in y0..=y1 {
            for x in x0..=x1 {
                if x == best.x && y == best.y {
                    continue;
                }
                let score = K::score_at(level, plan, x, y);
                if score > next.score {
                    next = MatchCandidate::new(x, y, score);
                }
            }
        }

        if next.score > best.score {
            best = next;
            path.push(best);
        } else {
            break;
        }
    }

    ClimbOutcome { best, path }
}

#[cfg(test)]
mod tests {
    use super::hill_climb;
    use crate::candidate::MatchCandidate;
    use crate::image::{ImageView, OwnedImage};
    use crate::kernel::scalar::NccScalar;
    use crate::kernel::{IndexedImage, Kernel};
    use crate::template::TemplatePlan;

    fn noise(width: usize, height: usize, seed: u32) -> Vec<u8> {
        (0..width * height)
            .map(|i| {
                let v = (i as u32).wrapping_mul(2_654_435_761).wrapping_add(seed);
                (v >> 24) as u8
            })
            .collect()
    }

    fn scene() -> (IndexedImage, TemplatePlan) {
        let (w, h) = (24, 20);
        let tpl: Vec<u8> = (0..36).map(|i| ((i % 6) * 30 + (i / 6) * 11) as u8).collect();
        let mut data = noise(w, h, 17);
        for ty in 0..6 {
            for tx in 0..6 {
                data[(5 + ty) * w + 5 + tx] = tpl[ty * 6 + tx];
            }
        }
        let image = IndexedImage::new(OwnedImage::new(data, w, h).unwrap());
        let plan = TemplatePlan::from_view(ImageView::from_slice(&tpl, 6, 6).unwrap()).unwrap();
        (image, plan)
    }

    #[test]
    fn climbs_onto_embedded_template() {
        let (image, plan) = scene();
        let level = image.level();
        let seed_score = NccScalar::score_at(&level, &plan, 4, 6);
        let outcome = hill_climb::<NccScalar>(
            &level,
            &plan,
            MatchCandidate::new(4, 6, seed_score),
            1,
        );
        assert_eq!((outcome.best.x, outcome.best.y), (5, 5));
        assert!(outcome.best.score > 0.999);
        assert_eq!(outcome.path.first(), Some(&MatchCandidate::new(4, 6, seed_score)));
    }

    #[test]
    fn path_is_strictly_increasing_and_ends_at_local_max() {
        let (image, plan) = scene();
        let level = image.level();
        for (sx, sy) in [(0, 0), (12, 3), (18, 14), (9, 9)] {
            let seed = MatchCandidate::new(sx, sy, NccScalar::score_at(&level, &plan, sx, sy));
            let outcome = hill_climb::<NccScalar>(&level, &plan, seed, 2);
            for pair in outcome.path.windows(2) {
                assert!(pair[1].score > pair[0].score);
            }
            let best = outcome.best;
            assert_eq!(outcome.path.last(), Some(&best));
            let (max_x, max_y) = level.max_position(6, 6).unwrap();
            for y in best.y.saturating_sub(2)..=(best.y + 2).min(max_y) {
                for x in best.x.saturating_sub(2)..=(best.x + 2).min(max_x) {
                    assert!(NccScalar::score_at(&level, &plan, x, y) <= best.score);
                }
            }
        }
    }

    #[test]
    fn zero_radius_keeps_seed() {
        let (image, plan) = scene();
        let seed = MatchCandidate::new(3, 3, 0.1);
        let outcome = hill_climb::<NccScalar>(&image.level(), &plan, seed, 0);
        assert_eq!(outcome.best, seed);
        assert_eq!(outcome.path.len(), 1);
    }
}
