//! End-to-end replication scenario: an authoritative world is flushed
//! through the real wire format into a client and the mirror is checked
//! after every frame.

use glam::Vec2;

use horde::net::{encode_assign_identity, encode_hello, encode_map_data};
use horde::{EntityKind, ExtensionKind, GameStateMeta, StateEncoder, World};
use horde_client::GameClient;

fn meta_at(timestamp: f64) -> GameStateMeta {
    GameStateMeta {
        timestamp: Some(timestamp),
        ..Default::default()
    }
}

#[test]
fn spawn_move_remove_roundtrip() {
    let mut world = World::new();
    let mut encoder = StateEncoder::new();

    // A player so the client has an identity, plus the zombie under test.
    let player = world.spawn_at(EntityKind::Player, Vec2::new(-5.0, 0.0));
    let zombie = world.spawn_at(EntityKind::Zombie, Vec2::ZERO);

    let mut client = GameClient::default();
    client.handle_message(&encode_hello());
    client.handle_message(&encode_assign_identity(player));
    client.handle_message(&encode_map_data(b"flatland"));

    // Flush #1: full snapshot.
    client.handle_message(&encoder.encode_full(&world, meta_at(0.0), b"flatland"));
    assert!(client.is_ready());
    assert_eq!(client.entity_count(), 2);
    let mirrored = client.entity(zombie).expect("zombie not mirrored");
    assert!(mirrored.position().unwrap().length() <= 0.1);
    assert!(client.spatial().contains(zombie));

    // Synchronize the delta stream with the snapshot the client just got.
    encoder.encode_delta(&mut world, meta_at(0.0));

    // Flush #2: the zombie moved; the delta must carry only its position.
    world
        .get_mut(zombie)
        .unwrap()
        .set_position(Vec2::new(16.0, 0.0));
    let health_before = match client
        .entity(zombie)
        .unwrap()
        .extension(ExtensionKind::Health)
        .unwrap()
        .data()
    {
        horde::ExtensionData::Health(data) => data.current,
        _ => unreachable!(),
    };

    client.handle_message(&encoder.encode_delta(&mut world, meta_at(50.0)));

    let mirrored = client.entity(zombie).unwrap();
    assert!((mirrored.position().unwrap() - Vec2::new(16.0, 0.0)).length() <= 0.1);
    let health_after = match mirrored.extension(ExtensionKind::Health).unwrap().data() {
        horde::ExtensionData::Health(data) => data.current,
        _ => unreachable!(),
    };
    assert_eq!(health_before, health_after, "untouched field changed");
    assert_eq!(
        client.spatial().position(zombie).map(|p| p.x.round()),
        Some(16.0)
    );

    // Flush #3: the zombie is gone; removal must reach mirror and grid.
    world.despawn(zombie);
    client.handle_message(&encoder.encode_delta(&mut world, meta_at(100.0)));

    assert!(client.entity(zombie).is_none());
    assert!(!client.spatial().contains(zombie));
    assert_eq!(client.entity_count(), 1);
}

#[test]
fn local_player_reconciliation_over_the_wire() {
    let mut world = World::new();
    let mut encoder = StateEncoder::new();
    let player = world.spawn_at(EntityKind::Player, Vec2::ZERO);

    let mut client = GameClient::default();
    client.handle_message(&encode_hello());
    client.handle_message(&encode_assign_identity(player));
    client.handle_message(&encode_map_data(b"m"));
    client.handle_message(&encoder.encode_full(&world, meta_at(0.0), b"m"));
    encoder.encode_delta(&mut world, meta_at(0.0));

    // Small server-side correction: the prediction wins visually, the
    // ghost position still records the authoritative value.
    world
        .get_mut(player)
        .unwrap()
        .set_position(Vec2::new(10.0, 0.0));
    client.handle_message(&encoder.encode_delta(&mut world, meta_at(50.0)));

    let rendered = client.local_player().unwrap().position().unwrap();
    assert!(rendered.length() <= 0.1, "prediction was overridden");
    assert!(
        (client.ghost_position().unwrap() - Vec2::new(10.0, 0.0)).length() <= 0.1
    );

    // Teleport-sized divergence snaps immediately.
    world
        .get_mut(player)
        .unwrap()
        .set_position(Vec2::new(1000.0, 0.0));
    client.handle_message(&encoder.encode_delta(&mut world, meta_at(100.0)));

    let rendered = client.local_player().unwrap().position().unwrap();
    assert!((rendered - Vec2::new(1000.0, 0.0)).length() <= 0.1);
    assert_eq!(
        client.spatial().position(player).map(|p| p.x.round()),
        Some(1000.0)
    );
}

#[test]
fn remote_entities_interpolate_between_flushes() {
    let mut world = World::new();
    let mut encoder = StateEncoder::new();
    let player = world.spawn_at(EntityKind::Player, Vec2::new(50.0, 50.0));
    let zombie = world.spawn_at(EntityKind::Zombie, Vec2::ZERO);

    let mut client = GameClient::new(horde_client::ClientConfig {
        interpolation: horde_client::InterpolationConfig {
            delay_ms: 0.0,
            ..Default::default()
        },
        ..Default::default()
    });
    client.handle_message(&encode_hello());
    client.handle_message(&encode_assign_identity(player));
    client.handle_message(&encode_map_data(b"m"));
    client.handle_message(&encoder.encode_full(&world, meta_at(0.0), b"m"));
    encoder.encode_delta(&mut world, meta_at(0.0));

    world
        .get_mut(zombie)
        .unwrap()
        .set_position(Vec2::new(100.0, 0.0));
    client.handle_message(&encoder.encode_delta(&mut world, meta_at(100.0)));

    let halfway = client.render_position(zombie, 50.0).unwrap();
    assert!((halfway - Vec2::new(50.0, 0.0)).length() <= 0.2);
}
