/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Timers (rebuild deadline, level-start deadline)
///   2. Roam schedule (Patrol <-> Chase)
///   3. Pursuer movement, in load order
///   4. Player movement (buffered desired heading)
///   5. Encounters (collectibles, captures, defeat, level clear)
///   6. Event application, in emission order
///
/// Pursuers move before the player, and encounters are resolved once,
/// after everyone has moved. Within the encounter pass a capture is always
/// reported before a defeat (see `EncounterResolver`).
///
/// Outside `Playing` only the timers run: during `Dying` nothing moves
/// until the rebuild deadline, and `GameOver` is inert.

use crate::domain::ai::NavContext;
use crate::domain::collision::CollisionField;
use super::encounter::EncounterResolver;
use super::event::GameEvent;
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState) -> Vec<GameEvent> {
    if world.phase == Phase::GameOver { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    resolve_timers(world, &mut events);
    if world.phase != Phase::Playing { return events; }

    resolve_roam(world, &mut events);
    resolve_pursuers(world);
    resolve_player(world);
    resolve_encounters(world, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Timers
// ══════════════════════════════════════════════════════════════

fn resolve_timers(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let now = world.tick;

    if world.timers.take_rebuild(now) {
        if world.score.is_out_of_lives() {
            world.game_over(events);
            return;
        }
        world.rebuild();
        events.push(GameEvent::MazeRebuilt);
    }

    if world.timers.take_level_start(now) {
        world.release_pursuers(events);
    }
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

fn resolve_roam(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if let Some(roam) = world.roam.update(world.tick) {
        tracing::debug!(tick = world.tick, ?roam, "roam mode changed");
        let event = GameEvent::RoamChanged { roam };
        world.apply(&event, events);
        events.push(event);
    }
}

fn resolve_pursuers(world: &mut WorldState) {
    let ctx = NavContext {
        field: CollisionField::new(&world.maze),
        now: world.tick,
        player: world.player.agent.position(),
    };
    for p in world.pursuers.iter_mut() {
        p.update(&ctx);
    }
}

fn resolve_player(world: &mut WorldState) {
    let field = CollisionField::new(&world.maze);
    world.player.update(&field);
}

// ══════════════════════════════════════════════════════════════
// Encounters
// ══════════════════════════════════════════════════════════════

fn resolve_encounters(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let found = EncounterResolver::new(
        CollisionField::new(&world.maze),
        &world.scoring,
        world.timing.frightened_ticks,
    )
    .resolve(world.tick, &world.player, &world.pursuers);

    for event in found {
        events.push(event.clone());
        world.apply(&event, events);
    }
}
