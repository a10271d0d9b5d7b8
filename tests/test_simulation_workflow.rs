//! Full workflow: generate a reference, evolve variants under a
//! heterogeneous rate model, and read the results back out.

use varevo::base::Nucleotide;
use varevo::evolution::{Mutator, RateModel, SequenceGammas};
use varevo::genome::VarSet;
use varevo::sampling::engine_from_seeds;
use varevo::simulation::{
    evolve_chrom, evolve_variants, generate_genome, CancelToken, SimulationConfig,
};

fn jc69(mu: f64) -> [[f64; 4]; 4] {
    let r = mu / 3.0;
    let mut q = [[r; 4]; 4];
    for (i, row) in q.iter_mut().enumerate() {
        row[i] = -mu;
    }
    q
}

#[test]
fn test_generate_pool_frequencies() {
    // 1000 fixed-length sequences; pooled base frequencies track pi
    let pi = [0.1, 0.2, 0.3, 0.4];
    let genome = generate_genome(1000, 100.0, 0.0, pi, 4, 42).unwrap();
    assert_eq!(genome.len(), 1000);
    for chrom in genome.chroms() {
        assert_eq!(chrom.size(), 100);
    }

    let mut counts = [0usize; 4];
    for chrom in genome.chroms() {
        for &b in chrom.seq().as_slice() {
            counts[b.to_index() as usize] += 1;
        }
    }
    let total = genome.total_size() as f64;
    for (i, &p) in pi.iter().enumerate() {
        let observed = counts[i] as f64 / total;
        let sigma = (p * (1.0 - p) / total).sqrt();
        assert!(
            (observed - p).abs() < 3.0 * sigma + 1e-3,
            "base {i}: observed {observed}, expected {p}"
        );
    }
}

#[test]
fn test_workflow_generate_evolve_extract() {
    let reference = generate_genome(2, 400.0, 50.0, [0.25; 4], 2, 11).unwrap();
    let model =
        RateModel::new(jc69(1.0), [0.25; 4], 0.2, 1.5, vec![1.0, 0.5, 0.25], vec![1.0, 0.5])
            .unwrap();
    let mut vars = VarSet::new(reference.clone(), 4);
    let config = SimulationConfig::new(Some(99)).with_workers(2);

    let events =
        evolve_variants(&mut vars, &model, None, 0.3, &config, &CancelToken::new()).unwrap();
    assert!(events > 0);

    for variant in vars.variants() {
        for (vc, rc) in variant.chroms().iter().zip(reference.chroms()) {
            let full = vc.to_sequence();
            assert_eq!(full.len(), vc.size());
            // Evolution happened against this reference chromosome
            assert_eq!(vc.name(), rc.name());
            // Every site remains a legal base and is point-addressable
            for p in (0..vc.size()).step_by(17) {
                assert_eq!(vc.base_at(p), full[p]);
            }
        }
    }
}

#[test]
fn test_zero_gamma_region_is_preserved() {
    // Silencing the first half of the chromosome must leave it untouched.
    let reference = generate_genome(1, 200.0, 0.0, [0.25; 4], 1, 5).unwrap();
    let original = reference.get(0).unwrap().seq().clone();
    // Substitution-only model so coordinates stay aligned
    let model = RateModel::new(jc69(2.0), [0.25; 4], 0.0, 1.0, vec![], vec![]).unwrap();
    let gammas = SequenceGammas::new(&[(99, 0.0), (199, 1.0)], 200).unwrap();

    let mut vars = VarSet::new(reference, 1);
    let vc = vars.get_mut(0).unwrap().get_mut(0).unwrap();
    let mut mutator = Mutator::new(&model, gammas).unwrap();
    let mut eng = engine_from_seeds([3, 14]);
    let events =
        evolve_chrom(vc, &mut mutator, 2.0, &mut eng, 1024, &CancelToken::new()).unwrap();
    assert!(events > 0);

    let evolved = vc.to_sequence();
    assert_eq!(&evolved.as_slice()[..100], &original.as_slice()[..100]);
    assert_ne!(&evolved.as_slice()[100..], &original.as_slice()[100..]);
}

#[test]
fn test_cancellation_mid_run() {
    let reference = generate_genome(1, 2000.0, 0.0, [0.25; 4], 1, 17).unwrap();
    let model = RateModel::new(jc69(1.0), [0.25; 4], 0.1, 1.0, vec![1.0], vec![1.0]).unwrap();
    let mut vars = VarSet::new(reference, 1);
    let config = SimulationConfig::new(Some(42)).with_cancel_poll_interval(16);

    let token = CancelToken::new();
    token.cancel();
    let result = evolve_variants(&mut vars, &model, None, 10.0, &config, &token);
    assert!(result.is_err());
}

#[test]
fn test_insertions_follow_equilibrium_frequencies() {
    // An insertion-heavy model on a skewed pi: inserted material should
    // drag pooled frequencies towards pi.
    let pi = [0.05, 0.05, 0.45, 0.45];
    let reference = generate_genome(1, 500.0, 0.0, [0.25; 4], 1, 23).unwrap();
    let model = RateModel::new(jc69(0.01), pi, 5.0, 100.0, vec![1.0, 1.0, 1.0], vec![1.0])
        .unwrap();
    let mut vars = VarSet::new(reference, 1);
    let config = SimulationConfig::new(Some(8));
    evolve_variants(&mut vars, &model, None, 0.1, &config, &CancelToken::new()).unwrap();

    let vc = vars.get(0).unwrap().get(0).unwrap();
    assert!(vc.size() > 500, "insertion-dominated run should grow the chromosome");
    let full = vc.to_sequence();
    let a_or_g = full
        .as_slice()
        .iter()
        .filter(|b| matches!(b, Nucleotide::A | Nucleotide::G))
        .count() as f64;
    // Reference was uniform (~50% A+G); inserted bases are ~90% A+G
    assert!(a_or_g / full.len() as f64 > 0.55);
}
