//! Parse and URL-generation benchmarks.
//!
//! Run with: cargo bench -p postern-router

use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use postern_router::{
    Params, RequestContext, ResourceOptions, RouteOptions, RouteTable, RouterConfig, UrlOptions,
};

const RESOURCES: [&str; 6] = [
    "users",
    "orders",
    "products",
    "customers",
    "invoices",
    "payments",
];

/// Build a table with resource routes, filled to `count` explicit routes,
/// followed by the default routes.
fn build_table(count: usize) -> RouteTable {
    let table = RouteTable::new(RouterConfig::new().with_prefixes(["admin"]));
    let _ = table.map_resources(RESOURCES, &ResourceOptions::default());

    let mut i = table.len();
    while i < count {
        let resource = RESOURCES[i % RESOURCES.len()];
        let _ = table.connect(
            &format!("/api/v{}/{}/:action/*", i / 10, resource),
            Params::new().with("controller", resource),
            RouteOptions::new(),
        );
        i += 1;
    }
    table.ensure_default_routes();
    table
}

fn get() -> HashMap<String, String> {
    HashMap::from([("REQUEST_METHOD".to_string(), "GET".to_string())])
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("route_parse");
    let env = get();

    for route_count in [50, 100, 500] {
        let table = build_table(route_count);

        group.bench_with_input(BenchmarkId::new("resource", route_count), &table, |b, table| {
            b.iter(|| black_box(table.parse("/users/12345", &env)));
        });

        group.bench_with_input(BenchmarkId::new("default_greedy", route_count), &table, |b, table| {
            b.iter(|| black_box(table.parse("/articles/view/5/page:2/sort:title", &env)));
        });

        group.bench_with_input(BenchmarkId::new("prefixed", route_count), &table, |b, table| {
            b.iter(|| black_box(table.parse("/admin/articles/edit/9", &env)));
        });

        group.bench_with_input(BenchmarkId::new("not_found", route_count), &table, |b, table| {
            b.iter(|| black_box(table.parse("/", &env)));
        });
    }

    group.finish();
}

fn bench_url(c: &mut Criterion) {
    let mut group = c.benchmark_group("route_url");
    let ctx = RequestContext::new();
    let options = UrlOptions::default();

    for route_count in [50, 100, 500] {
        let table = build_table(route_count);
        let matched = Params::new()
            .with("controller", "articles")
            .with("action", "view")
            .with(0usize, "5")
            .with("page", "2");
        let composed = matched.clone().with("unknown", "x");

        group.bench_with_input(BenchmarkId::new("matched", route_count), &table, |b, table| {
            b.iter(|| black_box(table.url(matched.clone(), &options, &ctx)));
        });

        group.bench_with_input(BenchmarkId::new("fallback", route_count), &table, |b, table| {
            b.iter(|| black_box(table.url(composed.clone(), &options, &ctx)));
        });
    }

    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("route_build");

    for route_count in [50, 100, 500] {
        group.bench_with_input(
            BenchmarkId::new("build_table", route_count),
            &route_count,
            |b, &count| b.iter(|| black_box(build_table(count))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_url, bench_build);
criterion_main!(benches);
