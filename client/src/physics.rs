//! Minimal AABB physics: gravity, platform resolution and contact reporting.
//!
//! Screen coordinates, so `y` grows downward and a positive vertical
//! velocity means falling.

use crate::collision::{Contact, ContactDetails, Target};
use crate::hero::Hero;
use crate::level::{Hostile, Level, HOSTILE_WIDTH};
use crate::puzzle::KeyObject;
use crate::registry::EntityRegistry;
use shared::{check_overlap, PlayerId, Rect, GRAVITY, PLAYER_SIZE, WORLD_HEIGHT, WORLD_WIDTH};

pub const MAX_FALL_SPEED: f32 = 900.0;
const GROUND_TOLERANCE: f32 = 0.1;

/// Integrates one frame for the hero and resolves it against the platforms.
pub fn step_hero(hero: &mut Hero, platforms: &[Rect], dt: f32) {
    hero.vel_y = (hero.vel_y + GRAVITY * dt).min(MAX_FALL_SPEED);
    hero.x += hero.vel_x * dt;
    hero.y += hero.vel_y * dt;

    resolve_collisions(hero, platforms);

    hero.x = hero.x.clamp(0.0, WORLD_WIDTH - PLAYER_SIZE);
    if hero.y + PLAYER_SIZE > WORLD_HEIGHT {
        hero.y = WORLD_HEIGHT - PLAYER_SIZE;
        hero.vel_y = 0.0;
    }

    hero.on_ground = is_grounded(&hero.bounds(), platforms);
}

/// Pushes the hero out of every platform along the axis of shallowest
/// penetration.
fn resolve_collisions(hero: &mut Hero, platforms: &[Rect]) {
    for platform in platforms {
        let bounds = hero.bounds();
        if !check_overlap(&bounds, platform) {
            continue;
        }

        let (left, top, right, bottom) = bounds.get_bounds();
        let (other_left, other_top, other_right, other_bottom) = platform.get_bounds();
        let overlap_x = right.min(other_right) - left.max(other_left);
        let overlap_y = bottom.min(other_bottom) - top.max(other_top);

        let (center_x, center_y) = bounds.center();
        let (other_x, other_y) = platform.center();

        if overlap_x < overlap_y {
            if center_x < other_x {
                hero.x = other_left - PLAYER_SIZE;
            } else {
                hero.x = other_right;
            }
            hero.vel_x = 0.0;
        } else {
            if center_y < other_y {
                hero.y = other_top - PLAYER_SIZE;
                hero.vel_y = hero.vel_y.min(0.0);
            } else {
                hero.y = other_bottom;
                hero.vel_y = hero.vel_y.max(0.0);
            }
        }
    }
}

fn is_grounded(bounds: &Rect, platforms: &[Rect]) -> bool {
    let (left, _, right, bottom) = bounds.get_bounds();

    platforms.iter().any(|platform| {
        let (other_left, other_top, other_right, _) = platform.get_bounds();
        let horizontal_overlap = right > other_left && left < other_right;
        horizontal_overlap && (bottom - other_top).abs() < GROUND_TOLERANCE
    })
}

/// Walks every live hostile back and forth across its patrol range.
pub fn step_hostiles(hostiles: &mut [Hostile], dt: f32) {
    for hostile in hostiles.iter_mut().filter(|h| h.alive) {
        hostile.x += hostile.vel_x * dt;

        if hostile.x < hostile.min_x {
            hostile.x = hostile.min_x;
            hostile.vel_x = hostile.vel_x.abs();
        } else if hostile.x + HOSTILE_WIDTH > hostile.max_x {
            hostile.x = hostile.max_x - HOSTILE_WIDTH;
            hostile.vel_x = -hostile.vel_x.abs();
        }
    }
}

/// Reports every character overlap for this frame, hero first, then remote
/// players by id.
///
/// Remote players are only known by their last position, so they are
/// reported as grounded and not moving.
pub fn detect_contacts(
    hero: &Hero,
    registry: &EntityRegistry,
    level: &Level,
    key: &KeyObject,
) -> Vec<Contact> {
    let mut contacts = Vec::new();

    let hero_details = ContactDetails {
        vertical_velocity: hero.vel_y,
        grounded: hero.on_ground,
    };
    contacts_for(hero.id, &hero.bounds(), hero_details, level, key, &mut contacts);
    if hero.on_ground {
        contacts.push(Contact {
            character: hero.id,
            target: Target::Solid,
            details: hero_details,
        });
    }

    let remote_details = ContactDetails {
        vertical_velocity: 0.0,
        grounded: true,
    };
    for remote in registry.live() {
        contacts_for(remote.id, &remote.bounds(), remote_details, level, key, &mut contacts);
    }

    contacts
}

fn contacts_for(
    character: PlayerId,
    bounds: &Rect,
    details: ContactDetails,
    level: &Level,
    key: &KeyObject,
    contacts: &mut Vec<Contact>,
) {
    let mut push = |target| {
        contacts.push(Contact {
            character,
            target,
            details,
        })
    };

    for (index, coin) in level.coins.iter().enumerate() {
        if coin.alive && check_overlap(bounds, &coin.bounds()) {
            push(Target::Coin(index));
        }
    }
    for (index, hostile) in level.hostiles.iter().enumerate() {
        if hostile.alive && check_overlap(bounds, &hostile.bounds()) {
            push(Target::Hostile(index));
        }
    }
    if key.alive && check_overlap(bounds, &key.bounds()) {
        push(Target::Key);
    }
    if check_overlap(bounds, &level.door.bounds()) {
        push(Target::Door);
    }
}
