use cohort_builder::GapWindow;
use cohort_builder::algorithm::matching::{match_count, match_ordered, match_unordered};
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::utils::DAY;

fn random_stream(rng: &mut StdRng, max_len: usize) -> Vec<i64> {
    let len = rng.random_range(0..=max_len);
    let mut stream: Vec<i64> = (0..len).map(|_| rng.random_range(0..400) * DAY).collect();
    stream.sort_unstable();
    stream
}

fn with_extra(stream: &[i64], extra: i64) -> Vec<i64> {
    let mut extended = stream.to_vec();
    extended.push(extra);
    extended.sort_unstable();
    extended
}

fn random_gap(rng: &mut StdRng) -> GapWindow {
    let min = rng.random_range(0..60);
    GapWindow::new(min, min + rng.random_range(0..120)).unwrap()
}

fn looser_gap(rng: &mut StdRng, gap: &GapWindow) -> GapWindow {
    let min = rng.random_range(0..=gap.min_days());
    let max = gap.max_days() + rng.random_range(0..60);
    let looser = GapWindow::new(min, max).unwrap();
    assert!(gap.is_within(&looser));
    looser
}

/// Adding events to a patient never turns a match into a non-match
#[test]
fn test_adding_events_preserves_matches() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..500 {
        let gap = random_gap(&mut rng);
        let a = random_stream(&mut rng, 6);
        let b = random_stream(&mut rng, 6);
        let extra = rng.random_range(0..400) * DAY;
        let k = rng.random_range(1..5);

        if match_ordered(&[&a, &b], &gap) {
            assert!(match_ordered(&[&with_extra(&a, extra), &b], &gap));
            assert!(match_ordered(&[&a, &with_extra(&b, extra)], &gap));
        }
        if match_count(&a, k, &gap) {
            assert!(match_count(&with_extra(&a, extra), k, &gap));
        }
        if match_unordered(&[&a, &b], &gap) {
            // The extra event can move the anchor slot; the match must survive either way
            let b2 = with_extra(&b, extra);
            assert!(
                match_unordered(&[&a, &b2], &gap),
                "a {a:?} b {b2:?} gap {gap}"
            );
        }
    }
}

/// Widening the gap never turns a match into a non-match
#[test]
fn test_looser_gap_preserves_matches() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut matched = 0;

    for _ in 0..1000 {
        let gap = random_gap(&mut rng);
        let looser = looser_gap(&mut rng, &gap);
        let a = random_stream(&mut rng, 6);
        let b = random_stream(&mut rng, 6);
        let c = random_stream(&mut rng, 4);
        let k = rng.random_range(1..5);

        if match_unordered(&[&a, &b], &gap) {
            matched += 1;
            assert!(
                match_unordered(&[&a, &b], &looser),
                "a {a:?} b {b:?} gap {gap} looser {looser}"
            );
        }
        if match_unordered(&[&a, &b, &c], &gap) {
            assert!(match_unordered(&[&a, &b, &c], &looser));
        }
        if match_count(&a, k, &gap) {
            assert!(
                match_count(&a, k, &looser),
                "a {a:?} k {k} gap {gap} looser {looser}"
            );
        }
        if match_ordered(&[&a, &b], &gap) {
            assert!(match_ordered(&[&a, &b], &looser));
        }
    }
    assert!(matched > 0);
}

#[test]
fn test_zero_minimum_admits_same_day_events() {
    let a = vec![10 * DAY];
    let b = vec![10 * DAY, 30 * DAY];
    let tight = GapWindow::new(5, 10).unwrap();
    let looser = GapWindow::new(0, 10).unwrap();
    assert!(!match_unordered(&[&a, &b], &tight));
    assert!(match_unordered(&[&a, &b], &looser));
    assert!(!match_ordered(&[&a, &b], &tight));
    assert!(match_ordered(&[&a, &b], &looser));
}
