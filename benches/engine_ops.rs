use ai_2048_mc::engine::{Board, Move};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;

fn corpus() -> Vec<Board> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut boards = Vec::new();
    boards.push(Board::EMPTY);
    let mut b = Board::EMPTY;
    b.place_random(&mut rng);
    b.place_random(&mut rng);
    boards.push(b);
    // Derive a variety of densities deterministically
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..20 {
        if b.shift(seq[i % seq.len()]) {
            b.place_random(&mut rng);
        }
        boards.push(b);
    }
    boards
}

fn bench_shift(c: &mut Criterion) {
    let boards = corpus();
    for dir in Move::ALL {
        c.bench_function(&format!("shift/{}", dir.name().to_lowercase()), |bch| {
            bch.iter(|| {
                let mut acc = 0u64;
                for &bd in &boards {
                    let mut b = bd;
                    b.shift(dir);
                    acc ^= b.score();
                }
                black_box(acc)
            })
        });
    }
}

fn bench_place_random(c: &mut Criterion) {
    let boards = corpus();
    c.bench_function("place_random", |bch| {
        bch.iter_batched(
            || (boards.clone(), StdRng::seed_from_u64(7)),
            |(mut bs, mut rng)| {
                for b in bs.iter_mut() {
                    black_box(b.place_random(&mut rng));
                }
                bs
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_shift, bench_place_random);
criterion_main!(benches);
