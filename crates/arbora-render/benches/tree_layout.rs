use arbora_core::{RenderConfig, SourceTree, TreeModel};
use arbora_render::{LayoutOptions, PathRequest, rebuild_tree};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;

/// Complete binary classification tree with `levels` levels, ids in breadth-first order.
fn complete_tree(levels: u32) -> TreeModel {
    let capacity = (1usize << levels) - 1;
    let internal = (1usize << (levels - 1)) - 1;
    let mut children_left = Vec::with_capacity(capacity);
    let mut children_right = Vec::with_capacity(capacity);
    let mut feature = Vec::with_capacity(capacity);
    let mut threshold = Vec::with_capacity(capacity);
    let mut impurity = Vec::with_capacity(capacity);
    let mut value = Vec::with_capacity(capacity);
    let mut samples = Vec::with_capacity(capacity);

    for id in 0..capacity {
        let depth = (usize::BITS - (id + 1).leading_zeros() - 1) as i32;
        let n = 4096.0 / 2f64.powi(depth);
        if id < internal {
            children_left.push((2 * id + 1) as i64);
            children_right.push((2 * id + 2) as i64);
            feature.push((id % 4) as i64);
            threshold.push(0.5 + id as f64 * 0.01);
        } else {
            children_left.push(-1);
            children_right.push(-1);
            feature.push(-2);
            threshold.push(-2.0);
        }
        let split = 0.5 + 0.4 * ((id % 7) as f64 / 7.0 - 0.5);
        impurity.push(1.0 - split * split - (1.0 - split) * (1.0 - split));
        value.push(vec![n * split, n * (1.0 - split)]);
        samples.push(n);
    }

    TreeModel {
        criterion: Some("gini".to_string()),
        maximum_depth: Some(levels as i64 - 1),
        maximum_number_of_classes: Some(2),
        classes: None,
        tree: Some(SourceTree {
            capacity,
            children_left,
            children_right,
            feature,
            threshold,
            impurity,
            value,
            weighted_number_of_node_samples: samples,
            number_of_node_samples: None,
            maximum_depth: Some(levels as i64 - 1),
        }),
    }
}

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild_tree");
    group.measurement_time(Duration::from_secs(10));

    let options = LayoutOptions::default();
    let mut labeled = RenderConfig::default();
    labeled.labels.node_attributes = vec!["impurity".into(), "number-of-instances".into()];
    labeled.labels.link_attributes = vec!["weight".into()];

    let cases = [("levels_8", 8u32), ("levels_12", 12u32)];
    for (name, levels) in cases {
        let model = complete_tree(levels);
        let path: Vec<i64> = std::iter::successors(Some(0i64), |id| Some(2 * id + 1))
            .take(levels as usize)
            .collect();

        group.bench_with_input(BenchmarkId::new("windowed", name), &model, |b, model| {
            b.iter(|| {
                let scene = rebuild_tree(
                    black_box(model),
                    &RenderConfig::default(),
                    None,
                    &options,
                );
                black_box(scene.map(|s| s.map(|s| s.nodes.len())).ok());
            })
        });

        group.bench_with_input(
            BenchmarkId::new("labeled_with_path", name),
            &model,
            |b, model| {
                b.iter(|| {
                    let scene = rebuild_tree(
                        black_box(model),
                        &labeled,
                        Some(PathRequest {
                            path: &path,
                            instance: None,
                        }),
                        &options,
                    );
                    black_box(scene.map(|s| s.map(|s| s.links.len())).ok());
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_rebuild);
criterion_main!(benches);
