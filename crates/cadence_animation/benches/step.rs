use cadence_animation::{
    AnimationBuilder, Animator, ClosureAccessor, Easing, PropertyTween, Repeat,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::{Arc, Mutex};

fn looping_tween(duration: f32) -> cadence_animation::Animation {
    let value = Arc::new(Mutex::new(0.0_f32));
    let (read, write) = (value.clone(), value);
    AnimationBuilder::new()
        .duration(duration)
        .repeat(Repeat::Infinite)
        .easing(Easing::EASE_IN_OUT)
        .plugin(PropertyTween::new(
            ClosureAccessor::new(
                move || Some(*read.lock().unwrap()),
                move |v: f32| *write.lock().unwrap() = v,
            ),
            1.0_f32,
        ))
        .build()
        .unwrap()
}

fn bench_step(c: &mut Criterion) {
    c.bench_function("tween_step", |b| {
        let mut anim = looping_tween(500.0);
        anim.start();
        b.iter(|| anim.step(black_box(16.6)))
    });

    c.bench_function("sequence_step", |b| {
        let mut anim = AnimationBuilder::new()
            .repeat(Repeat::Infinite)
            .build_sequence()
            .unwrap();
        {
            let mut seq = anim.as_sequence_mut().unwrap();
            for duration in [100.0, 200.0, 50.0, 400.0] {
                let element = AnimationBuilder::new().duration(duration).build().unwrap();
                seq.push(None, element).unwrap();
            }
        }
        anim.start();
        b.iter(|| anim.step(black_box(16.6)))
    });
}

fn bench_animator(c: &mut Criterion) {
    let mut group = c.benchmark_group("animator_advance");
    for count in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut animator = Animator::new();
            for i in 0..count {
                animator.add(looping_tween(200.0 + i as f32));
            }
            animator.advance(0.0).unwrap();
            b.iter(|| animator.advance(black_box(16.6)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_step, bench_animator);
criterion_main!(benches);
