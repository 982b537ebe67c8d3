use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use good_nlp::{
    Bound, ConstraintSet, Problem, VariableBlock, VariableContainer,
};
use sprs::TriMat;

/// Ties block `k` to block `k + 1`: x[3k..3k+3] - x[3k+3..3k+6] == 0.
struct Coupling {
    offset: usize,
}

impl ConstraintSet for Coupling {
    fn name(&self) -> &str {
        "coupling"
    }
    fn len(&self) -> usize {
        3
    }
    fn bounds(&self) -> Vec<Bound> {
        vec![Bound::zero(); 3]
    }
    fn values(&self, vars: &VariableContainer) -> Vec<f64> {
        let x = vars.flat_values();
        (0..3)
            .map(|i| x[self.offset + i] - x[self.offset + 3 + i])
            .collect()
    }
    fn jacobian(&self, vars: &VariableContainer) -> TriMat<f64> {
        let mut block = TriMat::new((3, vars.total_len()));
        for i in 0..3 {
            block.add_triplet(i, self.offset + i, 1.);
            block.add_triplet(i, self.offset + 3 + i, -1.);
        }
        block
    }
}

fn chain_problem(num_blocks: usize) -> Problem {
    let mut problem = Problem::new();
    for k in 0..num_blocks {
        problem.add_variable_set(Box::new(
            VariableBlock::new(format!("node_{}", k), 3).bounds(Bound::new(-1., 1.)),
        ));
    }
    for k in 0..num_blocks - 1 {
        problem.add_constraint_set(Box::new(Coupling { offset: 3 * k }));
    }
    problem
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("assemble a 1000-block chain problem", |b| {
        b.iter(|| chain_problem(black_box(1000)))
    });

    c.bench_function(
        "evaluate jacobian values of a 1000-block chain, 10 iterates",
        |b| {
            let mut problem = chain_problem(1000);
            let n = problem.num_variables();
            let nnz = problem.jacobian_nnz();
            let mut values = vec![0.; nnz];
            b.iter(|| {
                for i in 0..10 {
                    let x = vec![black_box(i as f64 * 0.1); n];
                    problem.eval_jacobian_values(&x, &mut values);
                }
                values[0]
            })
        },
    );
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
