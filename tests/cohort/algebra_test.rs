use cohort_builder::algorithm::cohort::{
    CohortSet, compose, intersect, intersect_within, subtract, union,
};
use cohort_builder::CohortError;
use rand::prelude::*;
use rand::rngs::StdRng;

fn random_set(rng: &mut StdRng) -> CohortSet {
    (0..rng.random_range(0..12))
        .map(|_| format!("p{:02}", rng.random_range(0..20)))
        .collect()
}

fn random_sets(rng: &mut StdRng, n: usize) -> Vec<CohortSet> {
    (0..n).map(|_| random_set(rng)).collect()
}

#[test]
fn test_set_laws() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..200 {
        let n = rng.random_range(1..5);
        let sets = random_sets(&mut rng, n);
        let all = union(&sets);
        let common = intersect(&sets).unwrap();

        for set in &sets {
            assert!(set.is_subset(&all));
            assert!(common.is_subset(set));
        }

        // Order of operands does not matter
        let mut reversed = sets.clone();
        reversed.reverse();
        assert_eq!(union(&reversed), all);
        assert_eq!(intersect(&reversed).unwrap(), common);

        let exclusions = random_sets(&mut rng, 2);
        let remaining = subtract(&all, &exclusions);
        assert!(remaining.is_subset(&all));
        for exclusion in &exclusions {
            assert!(remaining.iter().all(|id| !exclusion.contains(id)));
        }
    }
}

#[test]
fn test_exclusion_dominates_inclusion() {
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..200 {
        let inclusion = random_sets(&mut rng, 2);
        let exclusion = random_sets(&mut rng, 2);
        let cohort = compose(&inclusion, &exclusion).unwrap();
        for excluded in union(&exclusion).iter() {
            assert!(!cohort.contains(excluded));
        }
    }
}

#[test]
fn test_output_sorted_and_unique() {
    let a: CohortSet = ["p3", "p1", "p2"].into_iter().collect();
    let b: CohortSet = ["p2", "p1"].into_iter().collect();
    let cohort = compose(&[a, b], &[]).unwrap();
    assert_eq!(cohort.into_vec(), vec!["p1".to_string(), "p2".to_string()]);
}

#[test]
fn test_empty_inclusion_requires_explicit_population() {
    assert!(matches!(intersect(&[]), Err(CohortError::NoInclusionCriteria)));

    let population: CohortSet = ["p1", "p2"].into_iter().collect();
    assert_eq!(intersect_within(&population, &[]), population);
}
