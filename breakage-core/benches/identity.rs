//! Benchmarks for type identity and end-to-end package comparison.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use breakage_core::differ::{analyze, Allowlist};
use breakage_core::parser::{parse_package, SourceSet};
use breakage_core::typecmp::identical;
use breakage_core::types::{BasicKind, Field, Method, TypeGraph, TypeId};

/// A linked chain of `depth` structs, each pointing at the next and at an
/// interface whose method returns the chain head.
fn build_chain(g: &mut TypeGraph, depth: usize) -> TypeId {
    let head = g.declare_named("Node0");
    let int = g.basic(BasicKind::Int);
    let string = g.basic(BasicKind::String);
    let mut current = head;
    for i in 0..depth {
        let next = if i + 1 == depth {
            head
        } else {
            g.declare_named(format!("Node{}", i + 1))
        };
        let ptr = g.pointer(next);
        let sig = g.func(&[int], &[ptr], false);
        let iface = g.interface(
            vec![Method {
                name: "Next".to_string(),
                sig,
            }],
            vec![],
        );
        let body = g.structure(vec![
            Field::new("ID", int, true),
            Field::new("Label", string, true),
            Field::new("Link", ptr, true),
            Field::new("Walker", iface, true),
        ]);
        g.set_underlying(current, body);
        current = next;
    }
    head
}

fn bench_identity(c: &mut Criterion) {
    let mut a = TypeGraph::new();
    let mut b = TypeGraph::new();
    let x = build_chain(&mut a, 64);
    let y = build_chain(&mut b, 64);

    c.bench_function("identical_recursive_chain_64", |bench| {
        bench.iter(|| black_box(identical(a.at(x), b.at(y))))
    });
}

fn generated_package(funcs: usize, changed: bool) -> SourceSet {
    let mut source = String::from("package bench\n\ntype Item struct {\n    ID int\n    Name string\n}\n\n");
    for i in 0..funcs {
        let extra = if changed && i % 10 == 0 { ", flag bool" } else { "" };
        source.push_str(&format!(
            "func Process{}(items []Item, limit int{}) (map[string]*Item, error) {{ return nil, nil }}\n",
            i, extra
        ));
    }
    SourceSet::from_files("bench", [("bench.go", source)])
}

fn bench_compare_packages(c: &mut Criterion) {
    let before = parse_package(&generated_package(500, false)).unwrap();
    let after = parse_package(&generated_package(500, true)).unwrap();

    c.bench_function("analyze_500_funcs", |bench| {
        bench.iter(|| black_box(analyze(&before, &after)))
    });

    let old = generated_package(500, false);
    let new = generated_package(500, true);
    c.bench_function("check_500_funcs_end_to_end", |bench| {
        bench.iter(|| black_box(breakage_core::check(&old, &new, &Allowlist::default())))
    });
}

criterion_group!(benches, bench_identity, bench_compare_packages);
criterion_main!(benches);
