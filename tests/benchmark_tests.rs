//! Performance benchmarks for critical game systems

use client::game::LocalGame;
use rand::rngs::StdRng;
use rand::SeedableRng;
use server::entities::EntitySignals;
use server::world::WorldState;
use server::CommandProcessor;
use shared::grid::SAMPLE_ATTEMPTS;
use shared::transport::write_frame;
use shared::{Action, Command, Grid, MapLayout, PlayerState, Position, PositionUpdate};
use std::time::Instant;

/// Walled 30x20 arena, the size of the default map.
fn arena() -> Grid {
    let mut rows = Vec::new();
    for y in 0..20 {
        let row: String = (0..30)
            .map(|x| {
                if x == 0 || y == 0 || x == 29 || y == 19 {
                    '▤'
                } else if (x * 7 + y * 3) % 11 == 0 {
                    '♣'
                } else {
                    ' '
                }
            })
            .collect();
        rows.push(row);
    }
    MapLayout::parse(&rows.join("\n")).unwrap().grid
}

fn crowded_world(players: u32) -> WorldState {
    let mut world = WorldState::new(arena());
    for i in 0..players {
        let mut player = PlayerState::spawn(1);
        player.x = (i % 28) as i32 + 1;
        player.y = (i / 28) as i32 + 1;
        world.players.insert(format!("Jogador-{:04}", i), player);
    }
    world
}

/// Benchmarks parsing of textual position details
#[test]
fn benchmark_detail_parsing() {
    let details = ["X:5,Y:7", "X:12,Y:3;VIDAS:2", "garbage", "X:-1,Y:40"];

    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let _ = PositionUpdate::parse(details[i % details.len()]);
    }

    let duration = start.elapsed();
    println!(
        "Detail parsing: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds even without optimizations
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks the command path, half of it retransmissions
#[tokio::test]
async fn benchmark_command_processing() {
    let world = crowded_world(16).into_shared();
    let processor = CommandProcessor::new(world, EntitySignals::detached(), 4);

    let iterations: u32 = 5_000;
    let start = Instant::now();

    for i in 0..iterations {
        // Every sequence is sent twice; the second copy is dropped as a duplicate.
        let sequence = i / 2 + 2;
        let target = Position::new((i % 20) as i32 + 2, 2);
        let action = Action::UpdatePosition(PositionUpdate::new(target, None));
        let response = processor
            .apply(Command::new("Jogador-0000", sequence, action))
            .await;
        assert!(response.success);
    }

    let duration = start.elapsed();
    println!(
        "Command processing: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Each call clones a full snapshot; should still stay under 5 seconds
    assert!(duration.as_millis() < 5000);
}

/// Benchmarks snapshot serialization into a wire frame
#[tokio::test]
async fn benchmark_snapshot_framing() {
    let snapshot = crowded_world(32).snapshot();

    let iterations = 5_000;
    let mut bytes = 0;
    let start = Instant::now();

    for _ in 0..iterations {
        let mut buffer: Vec<u8> = Vec::new();
        write_frame(&mut buffer, &snapshot).await.unwrap();
        bytes = buffer.len();
    }

    let duration = start.elapsed();
    println!(
        "Snapshot framing: {} iterations of {} bytes in {:?} ({:.2} μs/iter)",
        iterations,
        bytes,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(bytes > 0);
    assert!(duration.as_millis() < 5000);
}

/// Benchmarks merging server snapshots into the client's view
#[test]
fn benchmark_reconciliation() {
    let snapshot = crowded_world(32).snapshot();
    let mut game = LocalGame::new(arena());

    let iterations = 5_000;
    let start = Instant::now();

    for _ in 0..iterations {
        game.reconcile(&snapshot, "Jogador-0000");
    }

    let duration = start.elapsed();
    println!(
        "Reconciliation: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert_eq!(game.remote_players(), 31);
    assert!(duration.as_millis() < 5000);
}

/// Benchmarks free-cell sampling used by relocating entities
#[test]
fn benchmark_free_cell_sampling() {
    let world = crowded_world(32);
    let mut rng = StdRng::seed_from_u64(7);

    let iterations = 20_000;
    let mut found = 0;
    let start = Instant::now();

    for _ in 0..iterations {
        if world.sample_free_cell(&mut rng).is_some() {
            found += 1;
        }
    }

    let duration = start.elapsed();
    println!(
        "Free-cell sampling: {} iterations in {:?} ({:.2} ns/iter, up to {} attempts each)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64,
        SAMPLE_ATTEMPTS
    );

    // Most of the arena is open, so sampling practically never gives up
    assert!(found > iterations * 99 / 100);
    assert!(duration.as_millis() < 3000);
}
