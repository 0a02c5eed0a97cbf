//! Import benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::DVec3;
use strata_core::{ComponentDefinition, Entities, Face, Group, Instance, Model, Transform};
use strata_import::{import_with_observer, EntityAnalyzer, ImportOptions, NoopObserver};
use strata_scene::SceneGraph;

/// A street of `houses` houses, each with windows and a garden of bushes.
fn street(houses: usize) -> Model {
    let window = ComponentDefinition::new("Window", Entities::new().with_face(Face::quad(DVec3::ZERO, 1.0)));
    let leaf = ComponentDefinition::new("Leaf", Entities::new().with_face(Face::quad(DVec3::ZERO, 0.1)));
    let mut bush = Entities::new();
    for i in 0..12 {
        let angle = i as f64 * 0.5;
        bush = bush.with_instance(
            Instance::of("Leaf").transformed(Transform::from_translation(DVec3::new(angle.cos(), angle.sin(), 0.5))),
        );
    }
    let mut house = Entities::new().with_face(Face::quad(DVec3::ZERO, 10.0));
    for i in 0..8 {
        house = house.with_instance(
            Instance::of("Window").transformed(Transform::from_translation(DVec3::new(i as f64, 0.0, 2.0))),
        );
    }
    let mut garden = Entities::new();
    for i in 0..6 {
        garden = garden.with_instance(
            Instance::of("Bush").transformed(Transform::from_translation(DVec3::new(i as f64 * 2.0, -5.0, 0.0))),
        );
    }
    house = house.with_group(Group::new("Garden", garden));

    let mut root = Entities::new();
    for i in 0..houses {
        root = root.with_instance(
            Instance::of("House").transformed(Transform::from_translation(DVec3::new(i as f64 * 20.0, 0.0, 0.0))),
        );
    }
    Model::new(root)
        .with_definition(window)
        .with_definition(leaf)
        .with_definition(ComponentDefinition::new("Bush", bush))
        .with_definition(ComponentDefinition::new("House", house))
}

fn analyze_street(c: &mut Criterion) {
    let model = street(200);
    let hidden = Default::default();
    c.bench_function("analyze_street_200", |b| {
        b.iter(|| {
            let mut analyzer = EntityAnalyzer::new(black_box(&model), &hidden);
            analyzer.analyze_root()
        })
    });
}

fn import_street(c: &mut Criterion) {
    let model = street(200);
    let options = ImportOptions::default().with_threshold(2);
    c.bench_function("import_street_200", |b| {
        b.iter(|| {
            let mut scene = SceneGraph::new();
            import_with_observer(black_box(&model), &mut scene, &options, &mut NoopObserver)
        })
    });
}

fn import_street_in_place(c: &mut Criterion) {
    let model = street(50);
    let options = ImportOptions::default().with_threshold(usize::MAX);
    c.bench_function("import_street_50_in_place", |b| {
        b.iter(|| {
            let mut scene = SceneGraph::new();
            import_with_observer(black_box(&model), &mut scene, &options, &mut NoopObserver)
        })
    });
}

criterion_group!(benches, analyze_street, import_street, import_street_in_place);
criterion_main!(benches);
