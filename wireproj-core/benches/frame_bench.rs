use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::Vector3;
use wireproj_core::{
    AnimationDriver, Cuboid, DrawList, ManualScheduler, MathEvaluator, MotionParams, Evaluator,
    RenderSettings, SurfaceSize,
};

fn bench_frame_100_samples(c: &mut Criterion) {
    let settings = RenderSettings {
        samples: 100,
        motion: MotionParams::new(10.0, 3.0, Vector3::new(0.2, 0.1, 0.3)),
        ..RenderSettings::default()
    };
    let mut driver = AnimationDriver::new(ManualScheduler::new());
    driver.render(&settings, SurfaceSize::new(1280, 720)).unwrap();
    let mut surface = DrawList::new();
    let mut t = 0.0;

    c.bench_function("frame_100_samples", |b| {
        b.iter(|| {
            surface.commands.clear();
            t += 16.0;
            black_box(driver.frame(t, &mut surface));
        });
    });
}

fn bench_sample_cuboid(c: &mut Criterion) {
    let cuboid = Cuboid::new([-1.0, 3.0, -1.0].into(), [1.0, 5.0, 1.0].into()).unwrap();
    c.bench_function("sample_cuboid_1000", |b| {
        b.iter(|| black_box(cuboid.sample(1000).unwrap()));
    });
}

fn bench_formula_eval(c: &mut Criterion) {
    let formula = MathEvaluator
        .compile("\\frac{x\\cos\\left(z\\right)}{y^{2}+1}", &["x", "y", "z"])
        .unwrap();
    c.bench_function("formula_eval_1000", |b| {
        b.iter(|| {
            for i in 0..1000 {
                let v = i as f64 / 1000.0;
                black_box(formula.evaluate(&[v, v + 1.0, -v]).ok());
            }
        });
    });
}

criterion_group!(benches, bench_frame_100_samples, bench_sample_cuboid, bench_formula_eval);
criterion_main!(benches);
