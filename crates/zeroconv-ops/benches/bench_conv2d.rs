use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use zeroconv_ops::conv2d::{
    conv2d, conv2d_naive, conv2d_parallel_channels, conv2d_parallel_rows, ConvParams,
};
use zeroconv_tensor::{Tensor, TensorShape};

fn bench_conv2d(c: &mut Criterion) {
    let mut group = c.benchmark_group("Conv2d");

    for (height, width) in [(64, 64), (128, 128), (256, 256)].iter() {
        for kernel_size in [3, 5].iter() {
            let out_h = *height - *kernel_size + 1;
            let out_w = *width - *kernel_size + 1;

            // multiply-accumulates per convolution
            group.throughput(criterion::Throughput::Elements(
                (16 * out_h * out_w * 3 * *kernel_size * *kernel_size) as u64,
            ));

            let parameter_string = format!("{}x{}x{}", height, width, kernel_size);

            let input = Tensor::<f32>::rand(TensorShape::chw(3, *height, *width)).unwrap();
            let kernel =
                Tensor::<f32>::rand(TensorShape::echw(16, 3, *kernel_size, *kernel_size)).unwrap();
            let params = ConvParams::default();

            group.bench_with_input(
                BenchmarkId::new("naive", &parameter_string),
                &(&input, &kernel),
                |b, i| b.iter(|| black_box(conv2d_naive(i.0, i.1, params))),
            );

            group.bench_with_input(
                BenchmarkId::new("parallel_rows", &parameter_string),
                &(&input, &kernel),
                |b, i| b.iter(|| black_box(conv2d_parallel_rows(i.0, i.1, params, 4))),
            );

            group.bench_with_input(
                BenchmarkId::new("parallel_channels", &parameter_string),
                &(&input, &kernel),
                |b, i| b.iter(|| black_box(conv2d_parallel_channels(i.0, i.1, params, 4))),
            );

            group.bench_with_input(
                BenchmarkId::new("auto", &parameter_string),
                &(&input, &kernel),
                |b, i| b.iter(|| black_box(conv2d(i.0, i.1, params))),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_conv2d);
criterion_main!(benches);
