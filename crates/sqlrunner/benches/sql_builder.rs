use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlrunner::{InsertBuilder, Op, Predicate, SelectBuilder, Value};

/// A predicate with `n` conditions alternating AND/OR:
/// col0 = ? OR col1 > ? AND col2 = ? ...
fn build_predicate(n: usize) -> Predicate {
    let mut p = Predicate::new();
    for i in 0..n {
        if i % 2 == 0 {
            p.and_where(&format!("col{i}"), Op::Eq, i as i64);
        } else {
            p.or_where(&format!("col{i}"), Op::Gt, i as i64);
        }
    }
    p
}

fn bench_predicate_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/predicate_render");

    for n in [1, 5, 10, 50, 100] {
        let p = build_predicate(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &p, |b, p| {
            b.iter(|| black_box(p.render()));
        });
    }

    group.finish();
}

fn bench_select_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/select_build");

    for n in [1, 5, 10, 50] {
        let p = build_predicate(n);
        let mut select = SelectBuilder::new("t");
        select
            .columns((0..n).map(|i| format!("col{i}")))
            .order_by("col0 DESC")
            .limit(20)
            .offset(40);
        group.bench_with_input(BenchmarkId::from_parameter(n), &p, |b, p| {
            b.iter(|| black_box(select.build(p)));
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/in_list");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let mut p = Predicate::new();
                p.and_in("id", values.iter().copied());
                black_box(p.render())
            });
        });
    }

    group.finish();
}

fn bench_group_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/group_merge");

    for n in [1, 5, 10, 50] {
        let inner = build_predicate(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &inner, |b, inner| {
            b.iter(|| {
                let mut p = Predicate::new();
                p.and_eq("tenant_id", 1).and_group(inner);
                black_box(p.render())
            });
        });
    }

    group.finish();
}

fn bench_multi_row_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/multi_row_insert");

    for rows in [1, 10, 100, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            b.iter(|| {
                let mut insert = InsertBuilder::new("events");
                for i in 0..rows {
                    insert.values([
                        ("id", Value::Int(i)),
                        ("kind", Value::Text("click".to_string())),
                        ("payload", Value::Null),
                    ]);
                }
                black_box(insert.build())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_predicate_render,
    bench_select_build,
    bench_in_list,
    bench_group_merge,
    bench_multi_row_insert
);
criterion_main!(benches);
