use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use navdb::core::config::Config;
use navdb::core::database::Database;
use navdb::query::ast::{Predicate, RangePredicate};
use navdb::query::types::{OrderBy, QueryParams};
use navdb::repo::nav::Nav;
use navdb::repo::{Repository, Tables};
use std::sync::Arc;
use std::time::Duration;
use rand::Rng;
use tempfile::TempDir;

/// Helper to open a fresh store with every table created
fn open_repo(dir: &TempDir) -> Repository<Nav> {
    let db = Arc::new(Database::open(Config::in_dir(dir.path())).unwrap());
    Tables::new(db.clone()).ensure_all().unwrap();
    Repository::new(db)
}

/// Helper to create a link with a unique title
fn create_test_nav(n: u64) -> Nav {
    let mut rng = rand::thread_rng();
    Nav {
        class_id: rng.gen_range(1..=10),
        title: format!("Site {}", n),
        url: format!("https://site{}.example", n),
        description: format!("Description of site {}", n),
        sort: rng.gen_range(1..100),
        ..Nav::default()
    }
}

fn seed(repo: &Repository<Nav>, count: u64) {
    let mut batch: Vec<Nav> = (0..count).map(create_test_nav).collect();
    for chunk in batch.chunks_mut(500) {
        repo.insert(chunk).unwrap();
    }
}

/// Benchmark single record insertion (dedupe check + id allocation + insert)
fn bench_single_insert(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let repo = open_repo(&dir);

    c.bench_function("single_nav_insert", |b| {
        let mut n = 0;
        b.iter(|| {
            let mut batch = [create_test_nav(n)];
            repo.insert(&mut batch).unwrap();
            n += 1;
        });
    });
}

/// Benchmark batch insertion
fn bench_batch_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_insert");
    group.sample_size(20);

    for batch_size in [10, 50, 100, 500].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            batch_size,
            |b, &batch_size| {
                let dir = TempDir::new().unwrap();
                let repo = open_repo(&dir);
                let mut n = 0u64;

                b.iter(|| {
                    let mut batch: Vec<Nav> = (0..batch_size)
                        .map(|_| {
                            n += 1;
                            create_test_nav(n)
                        })
                        .collect();
                    repo.insert(&mut batch).unwrap();
                });
            },
        );
    }

    group.finish();
}

/// Benchmark duplicate detection when every record already exists
fn bench_duplicate_skip(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let repo = open_repo(&dir);
    let existing: Vec<Nav> = (0..100).map(create_test_nav).collect();
    repo.insert(&mut existing.clone()).unwrap();

    c.bench_function("duplicate_skip_100", |b| {
        b.iter(|| {
            let mut batch = existing.clone();
            let outcome = repo.insert(&mut batch).unwrap();
            black_box(outcome.affected);
        });
    });
}

/// Benchmark filtered and paged reads
fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select");
    let dir = TempDir::new().unwrap();
    let repo = open_repo(&dir);
    seed(&repo, 5_000);

    let queries = vec![
        ("by_id", QueryParams::new(Predicate::eq("id", 2_500))),
        ("by_class", QueryParams::new(Predicate::eq("class_id", 3))),
        ("title_prefix", QueryParams::new(Predicate::prefix("title", "Site 12"))),
        (
            "sort_range_paged",
            QueryParams::new(Predicate::Range(RangePredicate::new("sort").gte(20).lt(60)))
                .order_by(OrderBy::desc("sort"))
                .limit(20)
                .page(3, 20),
        ),
        (
            "bool_paged",
            QueryParams::new(Predicate::and(vec![
                Predicate::one_of("class_id", [1, 2, 3]),
                Predicate::not(Predicate::eq("is_show", false)),
            ]))
            .order_by(OrderBy::asc("id"))
            .limit(50),
        ),
    ];

    for (name, params) in queries.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), params, |b, params| {
            b.iter(|| {
                let list = repo.select(black_box(params)).unwrap();
                black_box(list.len());
            });
        });
    }

    group.finish();
}

/// Benchmark update and delete by id
fn bench_write_by_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_by_filter");
    group.measurement_time(Duration::from_secs(5));

    let dir = TempDir::new().unwrap();
    let repo = open_repo(&dir);
    seed(&repo, 1_000);

    group.bench_function("update_one", |b| {
        let mut rng = rand::thread_rng();
        b.iter(|| {
            let id = rng.gen_range(1..=1_000i64);
            let mut nav = create_test_nav(id as u64);
            nav.views = rng.gen_range(0..10_000);
            repo.update_one(&nav, &Predicate::eq("id", id)).unwrap();
        });
    });

    group.bench_function("insert_then_delete", |b| {
        let mut n = 1_000_000u64;
        b.iter(|| {
            n += 1;
            let mut batch = [create_test_nav(n)];
            let outcome = repo.insert(&mut batch).unwrap();
            repo.delete(&Predicate::eq("id", outcome.ids[0])).unwrap();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_insert,
    bench_batch_insert,
    bench_duplicate_skip,
    bench_select,
    bench_write_by_filter
);
criterion_main!(benches);
