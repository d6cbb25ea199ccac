#![allow(dead_code)]

use criterion::{criterion_group, criterion_main, Criterion};
use lazydi::{build, declare, declare_with_options, BuildConfig, Component, Options, Registry, Scope};
use std::sync::Arc;

struct A(Arc<B>, Arc<C>);
struct B(i32);
struct C(Arc<CA>);
struct CA(Arc<CAA>);
struct CAA(Arc<CAAA>);
struct CAAA;

fn chain() -> Component<A> {
    let caaa = declare("CAAA", |_: &Scope| Ok(CAAA));
    let caa = declare("CAA", move |scope: &Scope| Ok(CAA(caaa.get(scope)?)));
    let ca = declare("CA", move |scope: &Scope| Ok(CA(caa.get(scope)?)));
    let c = declare("C", move |scope: &Scope| Ok(C(ca.get(scope)?)));
    let b = declare_with_options("B", |_: &Scope| Ok(B(2)), Options::<B>::new().priority(1).done(|_, _| {}));
    declare_with_options(
        "A",
        move |scope: &Scope| Ok(A(b.get(scope)?, c.get(scope)?)),
        Options::<A>::new().init(|_, _| Ok(())).done(|_, _| {}),
    )
}

fn scope() -> Scope {
    Scope::new(Arc::new(Registry::new()))
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("get_single", |b| {
        struct A;

        let component = declare("A", |_: &Scope| Ok(A));
        let scope = scope();
        b.iter(|| component.get(&scope).unwrap());
    })
    .bench_function("get_many", |b| {
        let component = chain();
        let scope = scope();
        b.iter(|| component.get(&scope).unwrap());
    })
    .bench_function("build_single", |b| {
        struct A;

        let component = declare("A", |_: &Scope| Ok(A));
        b.iter(|| component.get(&scope()).unwrap());
    })
    .bench_function("build_many", |b| {
        let component = chain();
        b.iter(|| component.get(&scope()).unwrap());
    })
    .bench_function("build_init_done", |b| {
        let component = chain();
        b.iter(|| {
            let app = build(&component, BuildConfig::new()).unwrap();
            app.done();
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
