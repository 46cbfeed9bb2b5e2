//! Canvas 2D renderer
//!
//! Draws a `Snapshot` in logical (CSS) pixels. The context transform maps
//! logical pixels to device pixels, so nothing below deals with DPR.

use std::f64::consts::TAU;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::sim::{EntityKind, GamePhase, ObstacleShape, PowerUpKind, Snapshot};

const SKY: &str = "#87ceeb";
const GROUND: &str = "#4a7c3f";
const GROUND_EDGE: &str = "#2f5a27";
const PLAYER: &str = "#ff6b6b";
const COIN: &str = "#ffd700";
const HUD_TEXT: &str = "#ffffff";

/// Screen shake decay per frame
const SHAKE_DECAY: f32 = 0.85;

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    parallax: bool,
    shake: f32,
    shake_phase: f32,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            canvas,
            ctx,
            parallax: true,
            shake: 0.0,
            shake_phase: 0.0,
        })
    }

    /// Match the backing store to the logical size times DPR
    pub fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32) -> Result<(), JsValue> {
        self.canvas.set_width((width * pixel_ratio).round() as u32);
        self.canvas.set_height((height * pixel_ratio).round() as u32);
        let dpr = pixel_ratio as f64;
        self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)
    }

    pub fn set_parallax(&mut self, enabled: bool) {
        self.parallax = enabled;
    }

    /// Kick the camera (damage feedback)
    pub fn add_shake(&mut self, amount: f32) {
        self.shake = (self.shake + amount).min(20.0);
    }

    pub fn render(&mut self, snap: &Snapshot, fps: Option<u32>) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let w = snap.viewport.width as f64;
        let h = snap.viewport.height as f64;

        ctx.save();
        if self.shake > 0.1 {
            self.shake_phase += 1.7;
            let dx = (self.shake_phase.sin() * self.shake) as f64;
            let dy = ((self.shake_phase * 1.3).cos() * self.shake) as f64;
            ctx.translate(dx, dy)?;
            self.shake *= SHAKE_DECAY;
        } else {
            self.shake = 0.0;
        }

        ctx.set_fill_style_str(SKY);
        ctx.fill_rect(-20.0, -20.0, w + 40.0, h + 40.0);
        if self.parallax {
            self.draw_skyline(snap, w);
        }

        let ground = snap.ground_y as f64;
        ctx.set_fill_style_str(GROUND);
        ctx.fill_rect(-20.0, ground, w + 40.0, h - ground + 20.0);
        ctx.set_fill_style_str(GROUND_EDGE);
        ctx.fill_rect(-20.0, ground, w + 40.0, 4.0);

        self.draw_entities(snap)?;
        self.draw_player(snap)?;
        self.draw_particles(snap);
        ctx.restore();

        if snap.phase != GamePhase::Loading {
            self.draw_hud(snap, fps)?;
        }
        Ok(())
    }

    fn draw_skyline(&self, snap: &Snapshot, width: f64) {
        const BLOCK: f64 = 90.0;
        let ctx = &self.ctx;
        let offset = (snap.game_time * snap.speed as f64 * 0.2) % BLOCK;
        let base = snap.ground_y as f64;
        ctx.set_fill_style_str("rgba(60, 80, 110, 0.35)");
        let first = (snap.game_time * snap.speed as f64 * 0.2 / BLOCK).floor() as i64;
        let count = (width / BLOCK).ceil() as i64 + 2;
        for i in 0..count {
            // Cheap per-building hash for stable heights
            let n = (first + i).wrapping_mul(2_654_435_761) as u64;
            let height = 60.0 + (n % 140) as f64;
            let x = i as f64 * BLOCK - offset;
            ctx.fill_rect(x, base - height, BLOCK - 12.0, height);
        }
    }

    fn draw_entities(&self, snap: &Snapshot) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let t = snap.game_time;
        for entity in snap.entities {
            let x = entity.pos.x as f64;
            let y = entity.pos.y as f64;
            match entity.kind {
                EntityKind::Obstacle { shape, size } => {
                    let (ow, oh) = (size.x as f64, size.y as f64);
                    ctx.set_fill_style_str(&css_color(shape.color()));
                    if shape == ObstacleShape::Spike {
                        ctx.begin_path();
                        ctx.move_to(x, y + oh);
                        ctx.line_to(x + ow * 0.5, y);
                        ctx.line_to(x + ow, y + oh);
                        ctx.close_path();
                        ctx.fill();
                    } else {
                        ctx.fill_rect(x, y, ow, oh);
                        ctx.set_stroke_style_str("rgba(0, 0, 0, 0.35)");
                        ctx.set_line_width(2.0);
                        ctx.stroke_rect(x + 1.0, y + 1.0, ow - 2.0, oh - 2.0);
                    }
                }
                EntityKind::Coin { radius } => {
                    // Spin by squashing horizontally
                    let squash = (t * 6.0 + entity.id as f64).sin().abs().max(0.2);
                    ctx.set_fill_style_str(COIN);
                    ctx.begin_path();
                    ctx.ellipse(x, y, radius as f64 * squash, radius as f64, 0.0, 0.0, TAU)?;
                    ctx.fill();
                }
                EntityKind::PowerUp { kind, radius } => {
                    let bob = (t * 3.0 + entity.id as f64).sin() * 4.0;
                    ctx.set_fill_style_str(&css_color(kind.color()));
                    ctx.begin_path();
                    ctx.arc(x, y + bob, radius as f64, 0.0, TAU)?;
                    ctx.fill();
                    ctx.set_fill_style_str(HUD_TEXT);
                    ctx.set_font("bold 16px sans-serif");
                    ctx.set_text_align("center");
                    ctx.set_text_baseline("middle");
                    ctx.fill_text(powerup_glyph(kind), x, y + bob)?;
                }
            }
        }
        Ok(())
    }

    fn draw_player(&self, snap: &Snapshot) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let player = snap.player;
        let body = player.body();

        // Flicker while invulnerable
        let blink = player.invulnerable && ((snap.game_time * 12.0) as i64) % 2 == 0;
        ctx.set_global_alpha(if blink { 0.35 } else { 1.0 });
        ctx.set_fill_style_str(PLAYER);
        ctx.fill_rect(body.x as f64, body.y as f64, body.w as f64, body.h as f64);
        ctx.set_global_alpha(1.0);

        if snap.powerups.shield.active {
            let c = body.center();
            ctx.set_stroke_style_str(&css_color(PowerUpKind::Shield.color()));
            ctx.set_line_width(3.0);
            ctx.begin_path();
            ctx.arc(c.x as f64, c.y as f64, (body.h.max(body.w) * 0.8) as f64, 0.0, TAU)?;
            ctx.stroke();
        }
        Ok(())
    }

    fn draw_particles(&self, snap: &Snapshot) {
        let ctx = &self.ctx;
        for p in snap.particles.iter() {
            ctx.set_global_alpha(p.alpha() as f64);
            ctx.set_fill_style_str(&css_color(p.color));
            let s = p.size as f64;
            ctx.fill_rect(p.pos.x as f64 - s * 0.5, p.pos.y as f64 - s * 0.5, s, s);
        }
        ctx.set_global_alpha(1.0);
    }

    fn draw_hud(&self, snap: &Snapshot, fps: Option<u32>) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        ctx.set_fill_style_str(HUD_TEXT);
        ctx.set_text_baseline("top");
        ctx.set_text_align("left");
        ctx.set_font("bold 22px sans-serif");
        ctx.fill_text(&format!("Score {}", snap.score), 16.0, 14.0)?;
        ctx.set_font("16px sans-serif");
        ctx.fill_text(&format!("{} m", snap.distance_m), 16.0, 42.0)?;
        ctx.fill_text(&format!("Coins {}", snap.coins), 16.0, 62.0)?;

        let hearts: String = (0..snap.max_lives)
            .map(|i| if i < snap.lives { '\u{2665}' } else { '\u{2661}' })
            .collect();
        ctx.set_text_align("right");
        ctx.set_font("22px sans-serif");
        ctx.fill_text(&hearts, snap.viewport.width as f64 - 16.0, 14.0)?;

        ctx.set_font("14px sans-serif");
        let mut line = 44.0;
        let timers = [
            (PowerUpKind::Shield, snap.powerups.shield),
            (PowerUpKind::Magnet, snap.powerups.magnet),
            (PowerUpKind::Boost, snap.powerups.boost),
            (PowerUpKind::Multiplier, snap.powerups.multiplier),
        ];
        for (kind, effect) in timers.iter().filter(|(_, e)| e.active) {
            ctx.set_fill_style_str(&css_color(kind.color()));
            let label = if *kind == PowerUpKind::Multiplier {
                format!("x{} {:.0}s", snap.score_multiplier, effect.remaining.ceil())
            } else {
                format!("{} {:.0}s", kind.as_str(), effect.remaining.ceil())
            };
            ctx.fill_text(&label, snap.viewport.width as f64 - 16.0, line)?;
            line += 18.0;
        }

        if snap.combo_count > 1 {
            ctx.set_fill_style_str(COIN);
            ctx.set_text_align("center");
            ctx.set_font("bold 20px sans-serif");
            ctx.fill_text(
                &format!("Combo {} (x{:.1})", snap.combo_count, snap.combo_multiplier),
                snap.viewport.width as f64 * 0.5,
                14.0,
            )?;
        }

        if let Some(fps) = fps {
            ctx.set_fill_style_str(HUD_TEXT);
            ctx.set_text_align("left");
            ctx.set_text_baseline("bottom");
            ctx.set_font("12px monospace");
            ctx.fill_text(&format!("{} fps", fps), 8.0, snap.viewport.height as f64 - 8.0)?;
        }
        Ok(())
    }
}

fn powerup_glyph(kind: PowerUpKind) -> &'static str {
    match kind {
        PowerUpKind::Shield => "S",
        PowerUpKind::Magnet => "M",
        PowerUpKind::Boost => "B",
        PowerUpKind::Multiplier => "x2",
    }
}

/// 0xRRGGBB -> "#rrggbb"
fn css_color(rgb: u32) -> String {
    format!("#{:06x}", rgb & 0xff_ffff)
}
