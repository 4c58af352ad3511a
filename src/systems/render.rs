//! Debug viewer drawn with raylib.
//!
//! Only built with the `viewer` feature. The world is Y-up in units; the
//! screen is Y-down in pixels, centred on the [`CameraRig`].
use bevy_ecs::prelude::*;
use glam::Vec2;
use raylib::prelude::*;

use crate::components::attack::AttackController;
use crate::components::boxcollider::BoxCollider;
use crate::components::collisionlayer::{CollisionLayer, Layer};
use crate::components::health::Health;
use crate::components::mapposition::MapPosition;
use crate::components::zone::{Zone, ZoneKind};
use crate::resources::camera::CameraRig;
use crate::resources::collisionworld::{CollisionWorld, PlatformKind};
use crate::resources::gamestate::{GameState, GameStates};
use crate::resources::input::Button;
use crate::resources::worldsignals::WorldSignals;

/// World to screen mapping for one frame.
#[derive(Debug, Clone, Copy)]
pub struct ViewTransform {
    pub camera: Vec2,
    pub pixels_per_unit: f32,
    pub screen_size: Vec2,
}

impl ViewTransform {
    pub fn to_screen(&self, point: Vec2) -> Vector2 {
        let offset = (point - self.camera) * self.pixels_per_unit;
        Vector2 {
            x: self.screen_size.x * 0.5 + offset.x,
            y: self.screen_size.y * 0.5 - offset.y,
        }
    }

    fn rect(&self, min: Vec2, max: Vec2) -> Rectangle {
        let top_left = self.to_screen(Vec2::new(min.x, max.y));
        let size = (max - min) * self.pixels_per_unit;
        Rectangle {
            x: top_left.x,
            y: top_left.y,
            width: size.x,
            height: size.y,
        }
    }
}

fn layer_color(layer: Layer, platform: PlatformKind) -> Color {
    match (layer, platform) {
        (_, PlatformKind::Fake) => Color::DARKGRAY,
        (_, PlatformKind::Through) => Color::SKYBLUE,
        (Layer::Wall, _) => Color::BROWN,
        (Layer::Player, _) => Color::GREEN,
        (Layer::Enemy, _) => Color::RED,
        (Layer::Object, _) => Color::ORANGE,
        _ => Color::LIGHTGRAY,
    }
}

fn zone_color(kind: &ZoneKind) -> Color {
    let color = match kind {
        ZoneKind::Damage { .. } => Color::MAROON,
        ZoneKind::Reset => Color::PURPLE,
        ZoneKind::Win => Color::GOLD,
        ZoneKind::Music { .. } => Color::BLUE,
    };
    Color::new(color.r, color.g, color.b, 90)
}

/// Keyboard state as raw axes and held buttons.
pub fn read_keyboard(rl: &RaylibHandle) -> (Vec2, Vec<Button>) {
    let axis_key = |negative: KeyboardKey, positive: KeyboardKey| {
        let mut value = 0.0;
        if rl.is_key_down(negative) {
            value -= 1.0;
        }
        if rl.is_key_down(positive) {
            value += 1.0;
        }
        value
    };
    let axis = Vec2::new(
        axis_key(KeyboardKey::KEY_LEFT, KeyboardKey::KEY_RIGHT),
        axis_key(KeyboardKey::KEY_DOWN, KeyboardKey::KEY_UP),
    );

    let bindings = [
        (KeyboardKey::KEY_SPACE, Button::Jump),
        (KeyboardKey::KEY_C, Button::Dash),
        (KeyboardKey::KEY_X, Button::Attack),
        (KeyboardKey::KEY_LEFT_SHIFT, Button::Sprint),
        (KeyboardKey::KEY_ONE, Button::SelectWeapon1),
        (KeyboardKey::KEY_TWO, Button::SelectWeapon2),
        (KeyboardKey::KEY_THREE, Button::SelectWeapon3),
        (KeyboardKey::KEY_FOUR, Button::SelectWeapon4),
        (KeyboardKey::KEY_BACKSPACE, Button::Reset),
        (KeyboardKey::KEY_ENTER, Button::NextLevel),
        (KeyboardKey::KEY_R, Button::RestartLevel),
    ];
    let held = bindings
        .iter()
        .filter(|(key, _)| rl.is_key_down(*key))
        .map(|(_, button)| *button)
        .collect();
    (axis, held)
}

/// Draw zones, geometry, bodies and active hitboxes, then the HUD.
pub fn render_pass(world: &mut World, d: &mut RaylibDrawHandle, pixels_per_unit: f32) {
    let screen_size = Vec2::new(d.get_screen_width() as f32, d.get_screen_height() as f32);
    let camera = world.resource::<CameraRig>().position;
    let view = ViewTransform {
        camera,
        pixels_per_unit,
        screen_size,
    };

    d.clear_background(Color::BLACK);

    let mut zones = world.query::<(&Zone, &MapPosition, &BoxCollider)>();
    for (zone, position, collider) in zones.iter(world) {
        let (min, max) = collider.aabb(position.pos);
        d.draw_rectangle_rec(view.rect(min, max), zone_color(&zone.kind));
    }

    for entry in world.resource::<CollisionWorld>().statics() {
        let color = layer_color(entry.layer, entry.platform);
        let vertices = entry.shape.vertices();
        for (index, vertex) in vertices.iter().enumerate() {
            let next = vertices[(index + 1) % vertices.len()];
            d.draw_line_v(view.to_screen(*vertex), view.to_screen(next), color);
        }
    }

    let mut bodies = world.query::<(&MapPosition, &BoxCollider, &CollisionLayer, Option<&Health>)>();
    for (position, collider, layer, health) in bodies.iter(world) {
        let (min, max) = collider.aabb(position.pos);
        let color = match health.and_then(|health| health.tint()) {
            Some([r, g, b, a]) => Color::new(r, g, b, a),
            None => layer_color(layer.0, PlatformKind::Solid),
        };
        d.draw_rectangle_lines_ex(view.rect(min, max), 2.0, color);
    }

    let mut attackers = world.query::<(&AttackController, &MapPosition)>();
    for (attack, position) in attackers.iter(world) {
        if let Some((min, max)) = attack.hitbox_aabb(position.pos) {
            d.draw_rectangle_lines_ex(view.rect(min, max), 1.0, Color::YELLOW);
        }
    }

    let center = view.to_screen(camera);
    d.draw_circle_lines(center.x as i32, center.y as i32, 4.0, Color::WHITE);

    let signals = world.resource::<WorldSignals>();
    let lives = signals.get_integer("lives").unwrap_or(0);
    let level = signals.get_string("level_name").unwrap_or("");
    d.draw_text(&format!("{}  lives {}", level, lives), 10, 10, 20, Color::WHITE);

    let banner = match world.resource::<GameState>().get() {
        GameStates::GameOver => Some("GAME OVER - press R"),
        GameStates::Finished => Some("ALL LEVELS DONE"),
        _ => None,
    };
    if let Some(banner) = banner {
        let x = (screen_size.x * 0.5) as i32 - 120;
        let y = (screen_size.y * 0.5) as i32;
        d.draw_text(banner, x, y, 30, Color::YELLOW);
    }
}
