//! Benchmarks for lowering programs and running the lowered blocks.
//!
//! Programs are generated with a configurable number of projections over a
//! row of nullable integers and booleans, so the same shapes measure both
//! lowering cost and per-row execution cost.
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use sqlcg::{
    Bump, ExprBuilder, ImplementorTable, Program, ScalarExpr, SqlType, StandardTypeSystem, Value,
    compile_program, ops,
};

const FIELDS: usize = 4;

fn input_types() -> Vec<SqlType> {
    let int = SqlType::integer().with_nullable(true);
    let flag = SqlType::boolean().with_nullable(true);
    vec![int, int, flag, flag]
}

/// `width` projections, alternating nullable arithmetic and three-valued
/// logic, behind a `$0 > 0 AND $2` condition.
fn build_program<'ast>(b: ExprBuilder<'ast>, width: usize) -> Program<'ast> {
    let int = SqlType::integer().with_nullable(true);
    let flag = SqlType::boolean().with_nullable(true);
    let projects: Vec<&ScalarExpr<'ast>> = (0..width)
        .map(|i| {
            if i % 2 == 0 {
                let sum = b.call(ops::PLUS, &[b.input_ref(0, int), b.input_ref(1, int)], int);
                b.call(ops::TIMES, &[sum, b.int_literal(i as i64)], int)
            } else {
                let not = b.call(ops::NOT, &[b.input_ref(3, flag)], flag);
                b.call(ops::OR, &[b.input_ref(2, flag), not], flag)
            }
        })
        .collect();
    let positive = b.call(ops::GREATER_THAN, &[b.input_ref(0, int), b.int_literal(0)], flag);
    let condition = b.call(ops::AND, &[positive, b.input_ref(2, flag)], flag);
    match Program::new(&[], b.exprs(&projects), Some(condition)) {
        Ok(program) => program,
        Err(e) => panic!("invalid benchmark program: {e}"),
    }
}

fn lowering_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("lowering");
    let table = ImplementorTable::standard();
    let inputs = input_types();

    for width in [1, 10, 100, 1000] {
        let arena = Bump::new();
        let program = build_program(ExprBuilder::new(&arena), width);
        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::new("projections", width), &program, |b, program| {
            b.iter(|| {
                let compiled =
                    compile_program(black_box(program), &StandardTypeSystem, &table, &inputs)
                        .unwrap();
                black_box(compiled.projection().statements.len())
            });
        });
    }

    group.finish();
}

fn execution_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("execution");
    let table = ImplementorTable::standard();
    let inputs = input_types();
    let rows = [
        ("all_set", vec![Value::Int32(3), Value::Int32(4), Value::Bool(true), Value::Bool(false)]),
        ("nulls", vec![Value::Int32(3), Value::Null, Value::Bool(true), Value::Null]),
        ("rejected", vec![Value::Null, Value::Int32(4), Value::Bool(true), Value::Bool(true)]),
    ];
    debug_assert!(rows.iter().all(|(_, row)| row.len() == FIELDS));

    for width in [10, 100] {
        let arena = Bump::new();
        let program = build_program(ExprBuilder::new(&arena), width);
        let compiled = compile_program(&program, &StandardTypeSystem, &table, &inputs).unwrap();
        for (name, row) in &rows {
            group.bench_function(BenchmarkId::new(*name, width), |b| {
                b.iter(|| black_box(compiled.execute(black_box(row.clone())).unwrap()));
            });
        }
    }

    group.finish();
}

criterion_group!(benches, lowering_benchmarks, execution_benchmarks);
criterion_main!(benches);
