use criterion::{black_box, criterion_group, criterion_main, Criterion};

use apack::checksum;
use apack::codec;
use apack::crypto;
use apack::format::constants::{
    CHECKSUM_CRC32, CHECKSUM_XXH3_64, COMPRESSION_LZ4, COMPRESSION_ZSTD, ENCRYPTION_AES_256_GCM,
    ENCRYPTION_CHACHA20_POLY1305, SYMMETRIC_KEY_LEN,
};

fn bench_compression(c: &mut Criterion) {
    let data = vec![0u8; 1024 * 1024];
    let zstd = codec::get_by_id(COMPRESSION_ZSTD).unwrap();
    let lz4 = codec::get_by_id(COMPRESSION_LZ4).unwrap();
    c.bench_function("zstd_compress_1mb", |b| b.iter(|| zstd.compress(black_box(&data), 3)));
    c.bench_function("lz4_compress_1mb", |b| b.iter(|| lz4.compress(black_box(&data), 0)));
}

fn bench_checksum(c: &mut Criterion) {
    let data = vec![7u8; 1024 * 1024];
    let crc32 = checksum::get_by_id(CHECKSUM_CRC32).unwrap();
    let xxh3 = checksum::get_by_id(CHECKSUM_XXH3_64).unwrap();
    c.bench_function("crc32_1mb", |b| b.iter(|| crc32.compute(black_box(&data))));
    c.bench_function("xxh3_64_1mb", |b| b.iter(|| xxh3.compute(black_box(&data))));
}

fn bench_encryption(c: &mut Criterion) {
    let data = vec![3u8; 256 * 1024];
    let key = [9u8; SYMMETRIC_KEY_LEN];
    let aes = crypto::get_by_id(ENCRYPTION_AES_256_GCM).unwrap();
    let chacha = crypto::get_by_id(ENCRYPTION_CHACHA20_POLY1305).unwrap();
    c.bench_function("aes_256_gcm_encrypt_256kb", |b| {
        b.iter(|| aes.encrypt(black_box(&data), &key, None))
    });
    c.bench_function("chacha20_poly1305_encrypt_256kb", |b| {
        b.iter(|| chacha.encrypt(black_box(&data), &key, None))
    });
}

criterion_group!(benches, bench_compression, bench_checksum, bench_encryption);
criterion_main!(benches);
