use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use strided_dispatch::{binary_into, unary_into, Order, StridedArray};

fn random_array(rng: &mut StdRng, shape: &[usize], order: Order) -> StridedArray<f64> {
    StridedArray::from_fn(shape.to_vec(), order, |_| rng.sample(StandardNormal))
}

fn bench_copy_permuted(c: &mut Criterion) {
    let mut group = c.benchmark_group("copy_permuted");
    let mut rng = StdRng::seed_from_u64(42);
    for size in [100usize, 500, 1000] {
        group.throughput(Throughput::Elements((size * size) as u64));
        let a = random_array(&mut rng, &[size, size], Order::RowMajor);

        group.bench_with_input(BenchmarkId::new("naive", size), &size, |b, &n| {
            b.iter(|| {
                let mut out = vec![0.0; n * n];
                let src = a.data();
                for i in 0..n {
                    for j in 0..n {
                        out[i * n + j] = src[j * n + i];
                    }
                }
                out
            })
        });

        group.bench_with_input(BenchmarkId::new("blocked", size), &size, |b, &n| {
            let mut out = StridedArray::<f64>::zeros([n, n], Order::RowMajor);
            b.iter(|| {
                let a_t = match a.view().permute(&[1, 0]) {
                    Ok(v) => v,
                    Err(err) => panic!("permute failed: {err}"),
                };
                if let Err(err) = unary_into(&a_t, &mut out.view_mut(), |v| v) {
                    panic!("unary_into failed: {err}");
                }
            })
        });
    }
    group.finish();
}

fn bench_add_mixed_orders(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_mixed_orders");
    let mut rng = StdRng::seed_from_u64(42);
    for size in [100usize, 500] {
        group.throughput(Throughput::Elements((size * size) as u64));
        let a = random_array(&mut rng, &[size, size], Order::RowMajor);
        let b_col = random_array(&mut rng, &[size, size], Order::ColumnMajor);

        group.bench_with_input(BenchmarkId::new("binary_into", size), &size, |bench, &n| {
            let mut out = StridedArray::<f64>::zeros([n, n], Order::RowMajor);
            bench.iter(|| {
                if let Err(err) = binary_into(&a.view(), &b_col.view(), &mut out.view_mut(), |x, y| x + y) {
                    panic!("binary_into failed: {err}");
                }
            })
        });
    }
    group.finish();
}

fn bench_rank4_flipped(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank4_flipped");
    let mut rng = StdRng::seed_from_u64(42);
    let shape = [16usize, 16, 16, 16];
    let elements: usize = shape.iter().product();
    group.throughput(Throughput::Elements(elements as u64));
    let a = random_array(&mut rng, &shape, Order::ColumnMajor);

    group.bench_function("scale_into", |bench| {
        let mut out = StridedArray::<f64>::zeros(shape, Order::RowMajor);
        bench.iter(|| {
            let view = match a.view().flip(1).and_then(|v| v.permute(&[3, 1, 0, 2])) {
                Ok(v) => v,
                Err(err) => panic!("view failed: {err}"),
            };
            let mut dst = match out.view_mut().permute(&[3, 1, 0, 2]) {
                Ok(v) => v,
                Err(err) => panic!("view failed: {err}"),
            };
            if let Err(err) = unary_into(&view, &mut dst, |v| 2.0 * v) {
                panic!("unary_into failed: {err}");
            }
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_copy_permuted,
    bench_add_mixed_orders,
    bench_rank4_flipped
);
criterion_main!(benches);
