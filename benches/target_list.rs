//! Benchmark for inserting targets into the sorted list.

use chart_timeline::prelude::*;
use criterion::{BatchSize, Criterion, Throughput};

fn chart_targets(count: i32) -> Vec<TimelineTarget> {
    (0..count)
        .map(|index| {
            let tick = BeatTick::from_ticks(index * 24 - index % 3 * 24);
            let button_type = ButtonType::ALL[index as usize % ButtonType::ALL.len()];
            let mut target = TimelineTarget::new(tick, button_type);
            target.flags.set_is_chain(button_type.is_slide());
            target
        })
        .collect()
}

fn bench_target_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("target_list");

    for count in [256, 2048] {
        let targets = chart_targets(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("add/{count}"), |b| {
            b.iter_batched(
                || targets.clone(),
                |targets| {
                    let mut list = SortedTargetList::new();
                    for target in targets {
                        list.add(std::hint::black_box(target));
                    }
                    list
                },
                BatchSize::SmallInput,
            );
        });
        group.bench_function(format!("bulk_load/{count}"), |b| {
            b.iter_batched(
                || targets.clone(),
                |targets| SortedTargetList::try_from(std::hint::black_box(targets)),
                BatchSize::SmallInput,
            );
        });
        group.bench_function(format!("edit_all/{count}"), |b| {
            let mut list = SortedTargetList::try_from(targets.clone()).expect("targets have no ids");
            b.iter(|| {
                let mut edit = list.edit_all();
                for target in edit.iter_mut() {
                    target.tick += BeatTick::from_ticks(1);
                }
            });
        });
    }

    group.finish();
}

fn main() {
    let mut criterion = Criterion::default();
    bench_target_list(&mut criterion);
}
