//! Kinematic integration of platforms: position += velocity * dt.

use hecs::World;

use decoy_core::types::{Position, Velocity};

pub fn run(world: &mut World, dt: f64) {
    for (_entity, (pos, vel)) in world.query_mut::<(&mut Position, &Velocity)>() {
        pos.x += vel.x * dt;
        pos.y += vel.y * dt;
        pos.z += vel.z * dt;
    }
}
