//! Performance benchmarks for hot client paths

use client::config::ClientConfig;
use client::session::Session;
use shared::{decode_server_message, encode_client_message, ClientMessage};
use std::time::{Duration, Instant};

fn big_init(players: usize, mobs: usize) -> String {
    let players: Vec<String> = (0..players)
        .map(|i| {
            format!(
                r#""p{}": {{"x": {}, "y": 100, "name": "player{}", "current_map": "map{}"}}"#,
                i,
                i * 10,
                i,
                i % 3 + 1
            )
        })
        .collect();
    let mobs: Vec<String> = (0..mobs)
        .map(|i| {
            format!(
                r#""m{}": {{"x": {}, "y": {}, "current_hp": 50, "max_hp": 50, "is_alive": true}}"#,
                i,
                (i * 37) % 2000,
                (i * 53) % 2000
            )
        })
        .collect();
    format!(
        r#"{{"type": "init", "player_id": "p0", "players": {{{}}},
            "map": {{"id": "map1", "pixel_width": 2000, "pixel_height": 2000}},
            "mobs": {{{}}}}}"#,
        players.join(","),
        mobs.join(",")
    )
}

/// Benchmarks decoding of the most frequent server message
#[test]
fn benchmark_decode_player_moved() {
    let frame = r#"{"type": "player_moved", "player_id": "p42", "x": 123.5, "y": 456.25}"#;
    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let _ = decode_server_message(frame).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "player_moved decode: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds for 100k iterations
    assert!(duration.as_secs() < 2);
}

/// Benchmarks a large init snapshot
#[test]
fn benchmark_large_init() {
    let frame = big_init(500, 300);
    let iterations = 50;
    let start = Instant::now();

    for _ in 0..iterations {
        let mut session = Session::new(ClientConfig::default());
        session.handle_frame(&frame, Instant::now());
        assert_eq!(session.world().players().len(), 500);
    }

    let duration = start.elapsed();
    println!(
        "Init with 500 players / 300 mobs: {} iterations in {:?} ({:.2} ms/iter)",
        iterations,
        duration,
        duration.as_millis() as f64 / iterations as f64
    );

    assert!(duration.as_secs() < 5);
}

/// Benchmarks the per-frame tick with movement and a held attack
#[test]
fn benchmark_session_tick() {
    let start = Instant::now();
    let mut session = Session::new(ClientConfig::default());
    session.on_connected(start);
    session.handle_frame(&big_init(100, 300), start);
    session.handle_frame(
        r#"{"type": "stats_update", "stats": {"damage": 5, "range": 100, "attack_speed": 2}}"#,
        start,
    );
    session.press_attack(start);

    let frames = 10_000u64;
    let bench = Instant::now();
    for frame in 0..frames {
        let now = start + Duration::from_micros(frame * 16_667);
        session.apply_local_move(1.0, 0.5);
        session.tick(now);
        session.drain_outbound();
        session.drain_notifications();
    }

    let duration = bench.elapsed();
    println!(
        "Session tick: {} frames in {:?} ({:.2} μs/frame)",
        frames,
        duration,
        duration.as_micros() as f64 / frames as f64
    );

    // 10k frames is almost three minutes of play
    assert!(duration.as_secs() < 2);
}

/// Benchmarks outbound encoding
#[test]
fn benchmark_encode_move() {
    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let message = ClientMessage::Move {
            x: i as f32,
            y: 10.0,
        };
        let _ = encode_client_message(&message).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "move encode: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_secs() < 2);
}
