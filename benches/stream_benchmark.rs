use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use prism_stream::{converter, EntityStream, Next, Row, StreamConfig};

const ROWS: i64 = 10_000;

fn int_stream() -> (EntityStream<i64>, prism_stream::RowSink<i64>) {
    EntityStream::channel(
        converter(|row: Row| row.get::<i64>("id")),
        StreamConfig::default(),
    )
}

fn bench_buffered_drain(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to build runtime");

    c.bench_function("buffered_drain_10k", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let (stream, sink) = int_stream();
                for id in 0..ROWS {
                    sink.send_row(Row::new().with("id", id));
                }
                sink.complete();

                let mut sum = 0;
                while let Ok(Next::Value(id)) = stream.next().await {
                    sum += id;
                }
                black_box(sum)
            })
        })
    });
}

fn bench_waiting_consumer(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .build()
        .expect("failed to build runtime");

    c.bench_function("threaded_producer_10k", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let (stream, sink) = int_stream();
                let producer = std::thread::spawn(move || {
                    for id in 0..ROWS {
                        sink.send_row(Row::new().with("id", id));
                    }
                    sink.complete();
                });

                let mut count = 0;
                while let Ok(Next::Value(_)) = stream.next().await {
                    count += 1;
                }
                producer.join().expect("producer thread panicked");
                black_box(count)
            })
        })
    });
}

criterion_group!(benches, bench_buffered_drain, bench_waiting_consumer);
criterion_main!(benches);
