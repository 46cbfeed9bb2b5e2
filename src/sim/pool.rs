//! Fixed-capacity particle pool
//!
//! Slots are allocated lazily up to the capacity and then recycled through a
//! free list. When every slot is live, new particles are dropped.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Size factor applied every 1/60 s
const SHRINK_PER_FRAME: f32 = 0.98;
/// Particles smaller than this are retired
const MIN_PARTICLE_SIZE: f32 = 0.5;

/// A cosmetic particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds left
    pub life: f32,
    pub max_life: f32,
    pub size: f32,
    /// 0xRRGGBB
    pub color: u32,
}

impl Particle {
    /// Remaining life as 0..1 (fade factor)
    #[inline]
    pub fn alpha(&self) -> f32 {
        if self.max_life > 0.0 {
            (self.life / self.max_life).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Pool usage counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Acquisitions served from the free list
    pub reused: u64,
    /// Acquisitions that allocated a new slot
    pub allocated: u64,
    /// Acquisitions rejected because the pool was full
    pub dropped: u64,
}

#[derive(Debug, Clone)]
pub struct ParticlePool {
    slots: Vec<Particle>,
    alive: Vec<bool>,
    free: Vec<usize>,
    capacity: usize,
    live: usize,
    stats: PoolStats,
}

impl ParticlePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            alive: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
            capacity,
            live: 0,
            stats: PoolStats::default(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Particles currently alive
    #[inline]
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Slots ever allocated (never exceeds capacity)
    #[inline]
    pub fn allocated(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Take a slot and fully overwrite it with `particle`
    pub fn acquire(&mut self, particle: Particle) -> Option<usize> {
        let index = if let Some(index) = self.free.pop() {
            self.slots[index] = particle;
            self.alive[index] = true;
            self.stats.reused += 1;
            index
        } else if self.slots.len() < self.capacity {
            self.slots.push(particle);
            self.alive.push(true);
            self.stats.allocated += 1;
            self.slots.len() - 1
        } else {
            if self.stats.dropped == 0 {
                log::warn!("Particle pool full ({}), dropping new particles", self.capacity);
            }
            self.stats.dropped += 1;
            return None;
        };
        self.live += 1;
        Some(index)
    }

    /// Return a slot to the free list (no-op for dead or unknown slots)
    pub fn release(&mut self, index: usize) {
        if self.alive.get(index).copied().unwrap_or(false) {
            self.alive[index] = false;
            self.free.push(index);
            self.live -= 1;
        }
    }

    /// Release everything, keeping the allocated slots
    pub fn clear(&mut self) {
        for index in 0..self.slots.len() {
            self.release(index);
        }
    }

    /// Change the capacity. Shrinking drops every particle.
    pub fn set_capacity(&mut self, capacity: usize) {
        if capacity < self.slots.len() {
            self.slots.truncate(capacity);
            self.alive.clear();
            self.alive.resize(self.slots.len(), false);
            self.free.clear();
            self.free.extend((0..self.slots.len()).rev());
            self.live = 0;
        }
        self.capacity = capacity;
    }

    /// Integrate live particles and retire the expired or shrunken ones
    pub fn update(&mut self, dt: f32, gravity: f32) {
        let shrink = SHRINK_PER_FRAME.powf(dt * 60.0);
        for index in 0..self.slots.len() {
            if !self.alive[index] {
                continue;
            }
            let p = &mut self.slots[index];
            p.pos += p.vel * dt;
            p.vel.y += gravity * dt;
            p.life -= dt;
            p.size *= shrink;
            if p.life <= 0.0 || p.size < MIN_PARTICLE_SIZE {
                self.release(index);
            }
        }
    }

    /// Live particles in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.slots
            .iter()
            .zip(&self.alive)
            .filter_map(|(p, &alive)| alive.then_some(p))
    }

    /// Spawn a burst; returns how many fit in the pool
    pub fn emit(&mut self, burst: &Burst, rng: &mut Pcg32) -> usize {
        let mut spawned = 0;
        for _ in 0..burst.count {
            let angle = burst.direction + rng.random_range(-0.5f32..=0.5) * burst.spread;
            let speed = burst.speed * rng.random_range(0.5f32..=1.0);
            let life = burst.life * rng.random_range(0.7f32..=1.0);
            let particle = Particle {
                pos: burst.origin,
                vel: Vec2::from_angle(angle) * speed,
                life,
                max_life: life,
                size: rng.random_range(burst.size.0..=burst.size.1),
                color: burst.color,
            };
            if self.acquire(particle).is_none() {
                break;
            }
            spawned += 1;
        }
        spawned
    }
}

/// Parameters for a particle burst
#[derive(Debug, Clone, Copy)]
pub struct Burst {
    pub origin: Vec2,
    pub count: u32,
    pub color: u32,
    /// Centre direction in radians (screen space, +y down)
    pub direction: f32,
    /// Full cone width in radians
    pub spread: f32,
    pub speed: f32,
    pub life: f32,
    /// (min, max) particle size
    pub size: (f32, f32),
}

impl Burst {
    /// Dust kicked up on take-off
    pub fn jump(origin: Vec2) -> Self {
        Self {
            origin,
            count: 8,
            color: 0xcccccc,
            direction: std::f32::consts::FRAC_PI_2,
            spread: std::f32::consts::PI,
            speed: 150.0,
            life: 0.4,
            size: (2.0, 4.0),
        }
    }

    /// Sparks trailing a slide
    pub fn slide(origin: Vec2) -> Self {
        Self {
            origin,
            count: 6,
            color: 0xffaa44,
            direction: std::f32::consts::PI,
            spread: 1.0,
            speed: 200.0,
            life: 0.3,
            size: (2.0, 3.0),
        }
    }

    pub fn coin(origin: Vec2) -> Self {
        Self {
            origin,
            count: 6,
            color: 0xffd700,
            direction: -std::f32::consts::FRAC_PI_2,
            spread: std::f32::consts::TAU,
            speed: 180.0,
            life: 0.5,
            size: (2.0, 4.0),
        }
    }

    pub fn powerup(origin: Vec2, color: u32) -> Self {
        Self {
            origin,
            count: 10,
            color,
            direction: -std::f32::consts::FRAC_PI_2,
            spread: std::f32::consts::TAU,
            speed: 220.0,
            life: 0.6,
            size: (3.0, 5.0),
        }
    }

    pub fn shield_break(origin: Vec2) -> Self {
        Self {
            origin,
            count: 12,
            color: 0x44aaff,
            direction: 0.0,
            spread: std::f32::consts::TAU,
            speed: 260.0,
            life: 0.5,
            size: (2.0, 5.0),
        }
    }

    pub fn damage(origin: Vec2) -> Self {
        Self {
            origin,
            count: 10,
            color: 0xff3344,
            direction: -std::f32::consts::FRAC_PI_2,
            spread: std::f32::consts::TAU,
            speed: 240.0,
            life: 0.6,
            size: (3.0, 6.0),
        }
    }

    pub fn game_over(origin: Vec2) -> Self {
        Self {
            origin,
            count: 24,
            color: 0xff6633,
            direction: -std::f32::consts::FRAC_PI_2,
            spread: std::f32::consts::TAU,
            speed: 320.0,
            life: 1.0,
            size: (3.0, 7.0),
        }
    }
}
