use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use modbus_rtu_slave::{checksum, RegisterBank, RegisterBinding, RtuSlave, SlaveConfig};

fn frame(bytes: &[u8]) -> Vec<u8> {
    let mut frame = bytes.to_vec();
    checksum::append(&mut frame);
    frame
}

fn bench_crc(c: &mut Criterion) {
    let data: Vec<u8> = (0..=255u8).collect();

    let mut group = c.benchmark_group("crc16");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("256_bytes", |b| {
        b.iter(|| checksum::compute(black_box(&data)))
    });
    group.finish();
}

fn bench_process(c: &mut Criterion) {
    let bank = RegisterBank::new(0x0000, 125);
    let mut slave = RtuSlave::new(SlaveConfig::new(0x01), |frame: &[u8]| {
        black_box(frame);
    })
    .unwrap();
    slave
        .register(
            RegisterBinding::new(0x0000, 125)
                .with_read(bank.clone())
                .with_write(bank.clone()),
        )
        .unwrap();

    let mut group = c.benchmark_group("process");
    for count in [1u16, 10, 125] {
        let [hi, lo] = count.to_be_bytes();
        let read = frame(&[0x01, 0x03, 0x00, 0x00, hi, lo]);
        group.throughput(Throughput::Elements(u64::from(count)));
        group.bench_with_input(BenchmarkId::new("read_03", count), &read, |b, read| {
            b.iter(|| slave.process(black_box(read)))
        });
    }

    let mut write = vec![0x01, 0x10, 0x00, 0x00, 0x00, 0x0A, 0x14];
    for value in 0..10u16 {
        write.extend_from_slice(&value.to_be_bytes());
    }
    checksum::append(&mut write);
    group.throughput(Throughput::Elements(10));
    group.bench_function("write_10", |b| b.iter(|| slave.process(black_box(&write))));

    let foreign = frame(&[0x02, 0x03, 0x00, 0x00, 0x00, 0x01]);
    group.bench_function("dropped", |b| b.iter(|| slave.process(black_box(&foreign))));
    group.finish();
}

criterion_group!(benches, bench_crc, bench_process);
criterion_main!(benches);
