//! Benchmarks for graph validation and component lookup
//!
//! Chains of qualified components measure validation cost as the graph grows;
//! lookups compare singleton caching with construction on every request.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use elif_di::container::{erase, Instance};
use elif_di::{
    Component, ComponentDescriptor, ComponentProvider, ComponentRef, ContextConfig,
    DependencyResolver, InjectError, Initializer, Injectable, Param, Qualifier, Singleton, Tag,
};

/// Provider whose only dependency is the previous link of the chain
struct ChainLink {
    previous: Option<ComponentRef>,
}

impl ComponentProvider for ChainLink {
    fn get(&self, _resolver: &dyn DependencyResolver) -> Result<Instance, InjectError> {
        Ok(erase(Arc::new(0usize)))
    }

    fn dependencies(&self) -> Vec<ComponentRef> {
        self.previous.iter().cloned().collect()
    }
}

fn link(index: usize) -> Component {
    Component::qualified::<usize>(Qualifier::named(format!("link{}", index)))
}

fn chain(size: usize) -> ContextConfig {
    let mut config = ContextConfig::new();
    for index in 0..size {
        let previous = index
            .checked_sub(1)
            .map(|previous| ComponentRef::new(link(previous)));
        config
            .bind_provider(link(index), Arc::new(ChainLink { previous }))
            .unwrap();
    }
    config
}

fn benchmark_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");

    for size in [10, 100, 500, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("linear_chain", size), size, |b, &size| {
            b.iter(|| black_box(chain(size).build_context().unwrap()));
        });
    }

    group.finish();
}

struct Repository;

struct Service {
    _repository: Arc<Repository>,
}

impl Injectable for Service {
    fn descriptor() -> ComponentDescriptor<Self> {
        ComponentDescriptor::new().constructor(
            Initializer::new(|arguments| {
                Ok(Service {
                    _repository: arguments.next::<Repository>()?,
                })
            })
            .param(Param::of::<Repository>()),
        )
    }
}

fn benchmark_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");

    let mut config = ContextConfig::new();
    config
        .bind_instance(Arc::new(Repository))
        .unwrap()
        .bind::<Service, Service>()
        .unwrap();
    let transient = config.build_context().unwrap();

    group.bench_function("transient", |b| {
        b.iter(|| black_box(transient.get::<Service>().unwrap()));
    });

    let mut config = ContextConfig::new();
    config
        .bind_instance(Arc::new(Repository))
        .unwrap()
        .bind_tagged::<Service, Service>(vec![Tag::scope::<Singleton>()])
        .unwrap();
    let singleton = config.build_context().unwrap();

    group.bench_function("singleton", |b| {
        b.iter(|| black_box(singleton.get::<Service>().unwrap()));
    });

    group.bench_function("deferred", |b| {
        let handle = singleton.deferred::<Service>().unwrap().unwrap();
        b.iter(|| black_box(handle.get().unwrap()));
    });

    group.finish();
}

criterion_group!(benches, benchmark_validation, benchmark_lookup);

criterion_main!(benches);
