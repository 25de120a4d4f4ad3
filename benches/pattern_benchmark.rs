use criterion::{black_box, criterion_group, criterion_main, Criterion};

use webframe::pattern::{ExemptionList, RoutePattern};

fn exemption_match_benchmark(c: &mut Criterion) {
    let list = ExemptionList::compile(&[
        "/api/public*",
        "/webhook/*",
        "/health",
        "/static/*",
    ])
    .unwrap();

    c.bench_function("exemption_hit", |b| {
        b.iter(|| list.matches(black_box("/webhook/github/push")));
    });
    c.bench_function("exemption_miss", |b| {
        b.iter(|| list.matches(black_box("/api/private/users")));
    });
}

fn route_extract_benchmark(c: &mut Criterion) {
    let pattern = RoutePattern::compile("/users/:id/posts/:post").unwrap();

    c.bench_function("route_extract", |b| {
        b.iter(|| pattern.extract(black_box("/users/42/posts/hello-world")));
    });
    c.bench_function("route_compile", |b| {
        b.iter(|| RoutePattern::compile(black_box("/users/:id/posts/:post")).unwrap());
    });
}

criterion_group!(benches, exemption_match_benchmark, route_extract_benchmark);
criterion_main!(benches);
