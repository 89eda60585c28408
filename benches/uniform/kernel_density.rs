use crate::uniform::build::build_balltree;
use crate::uniform::BANDWIDTH;
use balltree::{KdeOptions, Kernel};
use criterion::Criterion;

pub fn benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("kernel_density");
    group.sample_size(10);

    let (tree, queries) = build_balltree();
    for (name, atol, rtol) in [("exact", 0.0, 0.0), ("atol", 1e-3, 0.0), ("rtol", 0.0, 1e-2)] {
        for dualtree in [false, true] {
            let options = KdeOptions {
                atol,
                rtol,
                breadth_first: false,
                dualtree,
            };
            let id = format!("{name}/{}", if dualtree { "dual" } else { "single" });
            group.bench_function(id, |b| {
                b.iter(|| {
                    tree.kernel_density(queries.view(), BANDWIDTH, Kernel::Gaussian, options)
                        .expect("valid query")
                });
            });
        }
    }
}
