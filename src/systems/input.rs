//! Input systems.
//!
//! - [`scripted_input_system`] feeds [`InputState`] from an [`InputScript`]
//!   one frame at a time. The viewer feeds it from the keyboard through
//!   [`feed_input`] instead.
//! - [`player_input_system`] dispatches the buttons of the frame to the
//!   player: jump, early release, dash, attack, weapon selection, reset and
//!   sprint, then hands over the axes.
use bevy_ecs::prelude::*;
use glam::Vec2;
use log::debug;

use crate::components::attack::AttackController;
use crate::components::collisionbody::CollisionBody;
use crate::components::playercontroller::PlayerController;
use crate::components::signals::Signals;
use crate::events::player::PlayerResetEvent;
use crate::resources::input::{Button, InputScript, InputState};
use crate::resources::worldtime::WorldTime;

/// Units per second the smoothed axis moves toward the raw axis.
pub const AXIS_SENSITIVITY: f32 = 3.0;

fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// Start a new input frame from the raw axes and the held buttons.
///
/// The smoothed axis eases toward the raw one and snaps to zero when the
/// direction reverses.
pub fn feed_input(input: &mut InputState, raw_axis: Vec2, held: &[Button], delta: f32) {
    let step = AXIS_SENSITIVITY * delta;
    let smooth = |current: f32, target: f32| {
        let current = if current * target < 0.0 { 0.0 } else { current };
        move_towards(current, target, step)
    };
    let axis = Vec2::new(smooth(input.axis.x, raw_axis.x), smooth(input.axis.y, raw_axis.y));
    input.update(axis, raw_axis, held);
}

pub fn scripted_input_system(
    mut script: ResMut<InputScript>,
    mut input: ResMut<InputState>,
    time: Res<WorldTime>,
) {
    let (raw_axis, held) = script.next_frame();
    feed_input(&mut input, raw_axis, held, time.delta);
}

type PlayerInputParts = (
    Entity,
    &'static mut PlayerController,
    &'static CollisionBody,
    Option<&'static mut AttackController>,
    Option<&'static mut Signals>,
);

pub fn player_input_system(
    input: Res<InputState>,
    mut commands: Commands,
    mut players: Query<PlayerInputParts>,
) {
    let direction = input.direction();

    for (entity, mut controller, body, mut attack, mut signals) in players.iter_mut() {
        if controller.disabled {
            continue;
        }

        if input.just_pressed(Button::Jump) {
            if let Some(kind) = controller.jump(&body.data) {
                debug!("Jump {:?}", kind);
                if let Some(signals) = signals.as_deref_mut() {
                    signals.fire_trigger(if kind.is_wall_jump() { "wall_jump" } else { "jump" });
                }
            }
        }
        if input.just_released(Button::Jump) {
            controller.jump_early_release();
        }

        if input.just_pressed(Button::Dash) && controller.dash(&body.data) {
            if let Some(signals) = signals.as_deref_mut() {
                signals.fire_trigger("dash");
            }
        }

        if let Some(attack) = attack.as_deref_mut() {
            if input.just_pressed(Button::Attack) {
                if let Some(start) = attack.request_attack(body.data.face_direction) {
                    debug!("Player attack '{}'", start.attack_name);
                    if let Some(signals) = signals.as_deref_mut() {
                        signals.fire_trigger("attack");
                        signals.set_string("attack", start.attack_name);
                    }
                }
            }

            let slot = Button::ALL
                .iter()
                .filter(|button| input.just_pressed(**button))
                .find_map(|button| button.weapon_slot());
            if let Some(slot) = slot {
                if attack.switch_weapon(slot) {
                    if let (Some(signals), Some(weapon)) = (signals.as_deref_mut(), attack.current_weapon()) {
                        signals.set_string("weapon", weapon.name.clone());
                        signals.set_string("animation_set", weapon.animation_set.clone());
                    }
                }
            }
        }

        if input.just_pressed(Button::Reset) {
            commands.trigger(PlayerResetEvent { player: entity });
        }

        if input.held(Button::Sprint) {
            controller.start_sprint();
        } else {
            controller.stop_sprint();
        }

        // Buttons act on last frame's direction.
        controller.receive_input(input.axis, direction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::boxcollider::BoxCollider;
    use crate::components::playercontroller::PlayerAttributes;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn axis_eases_toward_raw() {
        let mut input = InputState::default();
        feed_input(&mut input, Vec2::X, &[], 0.1);
        assert!(approx_eq(input.axis.x, 0.3));
        assert_eq!(input.raw_axis.x, 1.0);
        for _ in 0..10 {
            feed_input(&mut input, Vec2::X, &[], 0.1);
        }
        assert_eq!(input.axis.x, 1.0);
    }

    #[test]
    fn axis_snaps_on_reversal() {
        let mut input = InputState::default();
        input.update(Vec2::X, Vec2::X, &[]);
        feed_input(&mut input, Vec2::NEG_X, &[], 0.1);
        assert!(approx_eq(input.axis.x, -0.3));
    }

    #[test]
    fn scripted_frames_reach_input_state() {
        let mut world = World::new();
        world.insert_resource(InputState::default());
        world.insert_resource(WorldTime {
            delta: 1.0,
            ..Default::default()
        });
        world.insert_resource(
            InputScript::from_json(r#"[{ "frames": 1, "axis": [-1, 0], "buttons": ["jump"] }]"#).unwrap(),
        );
        let mut schedule = Schedule::default();
        schedule.add_systems(scripted_input_system);

        schedule.run(&mut world);
        let input = world.resource::<InputState>();
        assert!(input.just_pressed(Button::Jump));
        assert_eq!(input.direction(), Vec2::new(-1.0, 0.0));

        schedule.run(&mut world);
        let input = world.resource::<InputState>();
        assert!(input.just_released(Button::Jump));
        assert_eq!(input.axis, Vec2::ZERO);
    }

    fn world_with_grounded_player() -> (World, Entity) {
        let mut world = World::new();
        let mut body = CollisionBody::new(Default::default(), &BoxCollider::new(1.0, 2.0));
        body.data.is_colliding_below = true;
        let player = world
            .spawn((PlayerController::new(PlayerAttributes::default()), body))
            .id();
        (world, player)
    }

    #[test]
    fn dash_on_first_frame_uses_previous_direction() {
        let (mut world, player) = world_with_grounded_player();
        let mut input = InputState::default();
        input.update(Vec2::X, Vec2::X, &[Button::Dash]);
        world.insert_resource(input);
        let mut schedule = Schedule::default();
        schedule.add_systems(player_input_system);

        schedule.run(&mut world);
        let controller = world.get::<PlayerController>(player).unwrap();
        assert!(!controller.is_dashing);
        assert_eq!(controller.input_direction, Vec2::X);

        // Release then press again: the direction is known now.
        world.resource_mut::<InputState>().update(Vec2::X, Vec2::X, &[]);
        schedule.run(&mut world);
        world.resource_mut::<InputState>().update(Vec2::X, Vec2::X, &[Button::Dash]);
        schedule.run(&mut world);
        assert!(world.get::<PlayerController>(player).unwrap().is_dashing);
    }
}
