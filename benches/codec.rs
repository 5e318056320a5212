use bytes::Bytes;
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use courier::{FrameReader, FrameWriter, Message, MessageTypeId, message, protocol};

message! {
    struct PingMessage {
        sequence: u32,
    }
}

message! {
    struct ChatMessage {
        author: String,
        body: String,
    }
}

protocol! {
    enum BenchProtocol {
        PingMessage,
        ChatMessage,
    }
}

fn encoded_frame<M: courier::Variant<BenchProtocol>>(message: &M) -> Vec<u8> {
    let registry = BenchProtocol::registry();
    let id = registry.id_of::<M>().unwrap();
    let mut writer = FrameWriter::new();
    writer.put_u8(id.raw());
    message.encode(&mut writer).unwrap();
    writer.as_slice().to_vec()
}

fn bench_encode(c: &mut Criterion) {
    let registry = BenchProtocol::registry();
    let mut group = c.benchmark_group("codec");

    // Minimal frame: id byte + one u32.
    let ping = PingMessage { sequence: 42 };
    let ping_id = registry.id_of::<PingMessage>().unwrap();
    group.throughput(Throughput::Bytes(5));
    group.bench_function("encode_ping", |b| {
        let mut writer = FrameWriter::new();
        b.iter(|| {
            writer.reset();
            writer.put_u8(ping_id.raw());
            ping.encode(&mut writer).unwrap();
            black_box(writer.as_slice());
        });
    });

    // String-heavy frame (~1 KB).
    let chat = ChatMessage {
        author: "bench".to_string(),
        body: "x".repeat(1024),
    };
    let chat_id = registry.id_of::<ChatMessage>().unwrap();
    let chat_len = encoded_frame(&chat).len() as u64;
    group.throughput(Throughput::Bytes(chat_len));
    group.bench_function("encode_chat_1kb", |b| {
        let mut writer = FrameWriter::new();
        b.iter(|| {
            writer.reset();
            writer.put_u8(chat_id.raw());
            chat.encode(&mut writer).unwrap();
            black_box(writer.as_slice());
        });
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let registry = BenchProtocol::registry();
    let mut group = c.benchmark_group("codec");

    let ping_frame = Bytes::from(encoded_frame(&PingMessage { sequence: 42 }));
    group.throughput(Throughput::Bytes(ping_frame.len() as u64));
    group.bench_function("decode_ping", |b| {
        b.iter(|| {
            let mut reader = FrameReader::new(ping_frame.clone());
            let id = MessageTypeId::new(reader.take_u8().unwrap());
            let mut message = registry.blank(id).unwrap();
            message.decode(&mut reader).unwrap();
            black_box(message);
        });
    });

    let chat_frame = Bytes::from(encoded_frame(&ChatMessage {
        author: "bench".to_string(),
        body: "x".repeat(1024),
    }));
    group.throughput(Throughput::Bytes(chat_frame.len() as u64));
    group.bench_function("decode_chat_1kb", |b| {
        b.iter(|| {
            let mut reader = FrameReader::new(chat_frame.clone());
            let id = MessageTypeId::new(reader.take_u8().unwrap());
            let mut message = registry.blank(id).unwrap();
            message.decode(&mut reader).unwrap();
            black_box(message);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
