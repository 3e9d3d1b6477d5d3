//! Benchmarks for the filter engine and aggregator
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ecocat::aggregate::{
    count_by_category, count_by_season, count_by_year, default_category_rules, top_organisations,
};
use ecocat::{filter_records, DatasetRecord, FilterPredicate, StatisticsSummary};

const TITLES: [&str; 6] = [
    "Qualité de l'eau des rivières",
    "Inventaire forestier décennal",
    "Émissions de gaz à effet de serre",
    "Occupation du sol",
    "Espèces menacées",
    "Budget municipal",
];

const ORGANISATIONS: [&str; 5] = ["MELCC", "MFFP", "Ville de Montréal", "Hydro-Québec", "Statistique Canada"];

fn create_test_records(count: usize) -> Vec<DatasetRecord> {
    (0..count)
        .map(|i| {
            DatasetRecord::new(i as i64, format!("{} {}", TITLES[i % TITLES.len()], i))
                .organisation(ORGANISATIONS[i % ORGANISATIONS.len()])
                .source(if i % 3 == 0 { "Données Québec" } else { "Open Government" })
                .created(format!("{}-{:02}-15", 2000 + (i % 24), 1 + (i % 12)))
        })
        .collect()
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");

    for size in [1_000, 10_000] {
        let records = create_test_records(size);
        group.throughput(Throughput::Elements(size as u64));

        let predicate = FilterPredicate::all().search("eau").organisation("MELCC");
        group.bench_function(format!("search_and_org_{}", size), |b| {
            b.iter(|| filter_records(black_box(&records), black_box(&predicate)))
        });
    }

    group.finish();
}

fn bench_aggregates(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    let rules = default_category_rules();

    for size in [1_000, 10_000] {
        let records = create_test_records(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("categories_{}", size), |b| {
            b.iter(|| count_by_category(black_box(&records), &rules))
        });

        group.bench_function(format!("top_organisations_{}", size), |b| {
            b.iter(|| top_organisations(black_box(&records)))
        });

        group.bench_function(format!("timeline_{}", size), |b| {
            b.iter(|| {
                (
                    count_by_year(black_box(&records), 2024),
                    count_by_season(black_box(&records)),
                )
            })
        });

        let visible: Vec<&DatasetRecord> = records.iter().collect();
        group.bench_function(format!("summary_{}", size), |b| {
            b.iter(|| StatisticsSummary::compute(black_box(&visible), &rules, 2024))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_filter, bench_aggregates);
criterion_main!(benches);
