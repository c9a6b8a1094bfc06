use criterion::{
    BenchmarkId, Criterion, Throughput, criterion_group, criterion_main,
};
use ranktree::{Discretization, parse_newick};
use std::hint::black_box;
use std::path::PathBuf;

fn caterpillar(leaf_count: usize) -> String {
    let mut newick = "(L0:1,L1:1)".to_string();
    for k in 2..leaf_count {
        newick = format!("({newick}:1,L{k}:{k})");
    }
    newick.push(';');
    newick
}

fn balanced(depth: usize, next_leaf: &mut usize) -> String {
    if depth == 0 {
        let label = format!("T{}", *next_leaf);
        *next_leaf += 1;
        return label;
    }
    let left = balanced(depth - 1, next_leaf);
    let right = balanced(depth - 1, next_leaf);
    format!("({left}:1.0000001[&rate=1.2],{right}:0.9999999)")
}

fn prepare_test_data() -> Vec<(String, String)> {
    let mut test_data = Vec::new();
    for leaf_count in [100, 1000] {
        test_data.push((format!("caterpillar_{leaf_count}"), caterpillar(leaf_count)));
    }
    for depth in [7, 11] {
        let mut next_leaf = 0;
        let newick = format!("{};", balanced(depth, &mut next_leaf));
        test_data.push((format!("balanced_{next_leaf}"), newick));
    }
    test_data
}

fn bench_newick_parser(c: &mut Criterion) {
    let test_data = prepare_test_data();

    let mut group = c.benchmark_group("newick_parser");
    let _ = group.sample_size(30);

    for (name, newick_string) in &test_data {
        let char_count = newick_string.len();
        let _ = group.throughput(Throughput::Bytes(char_count as u64));

        for (mode, discretization) in [
            ("ranked", Discretization::Ranked),
            ("timed_auto", Discretization::TimedAuto),
        ] {
            let _ = group.bench_with_input(
                BenchmarkId::new(format!("parse_newick_{mode}"), name),
                newick_string,
                |b, newick| {
                    b.iter(|| {
                        let _ = black_box(parse_newick(newick, discretization));
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(
    name = benches;
    config = {
        let mut criterion = Criterion::default();
        let benchmark_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("benchmark_results");
        criterion = criterion.output_directory(&benchmark_dir);
        criterion = criterion.warm_up_time(std::time::Duration::from_millis(500));
        criterion = criterion.measurement_time(std::time::Duration::from_secs(5));
        criterion
    };
    targets = bench_newick_parser
);
criterion_main!(benches);
