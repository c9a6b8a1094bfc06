use criterion::{
    BenchmarkId, Criterion, Throughput, criterion_group, criterion_main,
};
use ranktree::{Discretization, parse_nexus};
use std::hint::black_box;
use std::path::PathBuf;

/// A posterior-sample style file: `tree_count` random-ish trees over the
/// same `leaf_count` taxa, each statement annotated like a BEAST log.
fn sample_file(tree_count: usize, leaf_count: usize) -> String {
    let mut content = String::from("#NEXUS\nbegin trees;\n");
    for state in 0..tree_count {
        let mut newick = "(T0:1.5[&rate=1],T1:1.5)".to_string();
        let mut height = 1.5;
        for k in 2..leaf_count {
            let step = 0.25 + ((state * 7 + k * 13) % 11) as f64 * 0.1;
            height += step;
            newick = format!("({newick}:{step},T{k}:{height})");
        }
        content.push_str(&format!(
            "\ttree STATE_{state} [&lnP=-{state}.5] = [&R] {newick}:0.0;\n"
        ));
    }
    content.push_str("end;\n");
    content
}

fn prepare_test_data() -> Vec<(String, String)> {
    vec![
        ("sample_100x50".to_string(), sample_file(100, 50)),
        ("sample_20x500".to_string(), sample_file(20, 500)),
    ]
}

fn bench_nexus_parser(c: &mut Criterion) {
    let test_data = prepare_test_data();

    let mut group = c.benchmark_group("nexus_parser");

    for (name, nexus_string) in &test_data {
        let char_count = nexus_string.len();
        let _ = group.throughput(Throughput::Bytes(char_count as u64));

        let _ = group.bench_with_input(
            BenchmarkId::new("parse_nexus", name),
            nexus_string,
            |b, nexus| {
                b.iter(|| {
                    let _ = black_box(parse_nexus(nexus, Discretization::Ranked));
                });
            },
        );
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
    targets = bench_nexus_parser
);
criterion_main!(benches);
