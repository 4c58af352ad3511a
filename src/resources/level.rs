//! Level files and the level sequence.
//!
//! A level is a JSON document describing static geometry, the player, the
//! enemies, moving platforms, loose objects, zones, checkpoints, the camera
//! and the background music. [`LevelManager`] holds the ordered list of
//! level files and the pending load request; the rebuild itself happens in
//! [`systems::level`](crate::systems::level).
//!
//! # Tile grid
//!
//! Rows are listed top to bottom. Each character is one `tile_size` cell:
//!
//! | char | meaning |
//! |------|---------|
//! | `#`  | solid ground |
//! | `/`  | 45° slope rising to the right |
//! | `\`  | 45° slope rising to the left |
//! | `-`  | one-way platform (top quarter of the cell) |
//! | `~`  | fake platform, never collides |
//! | `W`  | climbable wall |
//! | `^`  | hazard, spawns a damage zone |
//!
//! Anything else is empty.

use std::path::PathBuf;

use bevy_ecs::prelude::Resource;
use glam::Vec2;
use log::info;
use serde::Deserialize;

use crate::components::attack::{Attack, Weapon};
use crate::components::collisionbody::CollisionAttributes;
use crate::components::collisionlayer::{Layer, LayerMask};
use crate::components::enemycontroller::EnemyAttributes;
use crate::components::health::HitEffectAttributes;
use crate::components::movingplatform::MovingPlatformAttributes;
use crate::components::playercontroller::PlayerAttributes;
use crate::components::zone::ZoneKind;
use crate::resources::camera::CameraSettings;
use crate::resources::collisionworld::{ConvexShape, PlatformKind};

pub const HAZARD_TILE_DAMAGE: f32 = 1.0;

fn default_layer_ground() -> Layer {
    Layer::Ground
}

fn default_tile_size() -> f32 {
    1.0
}

fn default_object_gravity() -> f32 {
    -50.0
}

fn default_health() -> f32 {
    3.0
}

fn default_lives() -> i32 {
    3
}

fn default_enemy_attackable() -> LayerMask {
    LayerMask::from_layers(&[Layer::Player])
}

fn default_player_attackable() -> LayerMask {
    LayerMask::from_layers(&[Layer::Enemy, Layer::Object])
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BoxData {
    pub min: Vec2,
    pub max: Vec2,
    #[serde(default = "default_layer_ground")]
    pub layer: Layer,
    #[serde(default)]
    pub platform: PlatformKind,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolygonData {
    pub points: Vec<Vec2>,
    #[serde(default = "default_layer_ground")]
    pub layer: Layer,
    #[serde(default)]
    pub platform: PlatformKind,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TileGridData {
    /// World position of the bottom-left corner of the grid.
    #[serde(default)]
    pub origin: Vec2,
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
    pub rows: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct GeometryData {
    pub boxes: Vec<BoxData>,
    pub polygons: Vec<PolygonData>,
    pub tiles: Option<TileGridData>,
}

/// Static shape ready for the collision world.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticShape {
    pub shape: ConvexShape,
    pub layer: Layer,
    pub platform: PlatformKind,
}

/// Geometry produced from a level: shapes plus hazard areas.
#[derive(Debug, Clone, Default)]
pub struct BuiltGeometry {
    pub shapes: Vec<StaticShape>,
    pub hazards: Vec<(Vec2, Vec2)>,
}

impl GeometryData {
    pub fn build(&self) -> Result<BuiltGeometry, String> {
        let mut built = BuiltGeometry::default();
        for data in &self.boxes {
            built.shapes.push(StaticShape {
                shape: ConvexShape::from_box(data.min.min(data.max), data.min.max(data.max)),
                layer: data.layer,
                platform: data.platform,
            });
        }
        for (index, data) in self.polygons.iter().enumerate() {
            let shape = ConvexShape::from_points(&data.points).map_err(|e| format!("Polygon {}: {}", index, e))?;
            built.shapes.push(StaticShape {
                shape,
                layer: data.layer,
                platform: data.platform,
            });
        }
        if let Some(tiles) = &self.tiles {
            tiles.build_into(&mut built)?;
        }
        Ok(built)
    }
}

impl TileGridData {
    fn build_into(&self, built: &mut BuiltGeometry) -> Result<(), String> {
        if self.tile_size <= 0.0 {
            return Err(format!("Invalid tile size {}", self.tile_size));
        }
        let size = self.tile_size;
        let row_count = self.rows.len();

        for (row_index, row) in self.rows.iter().enumerate() {
            let y = self.origin.y + (row_count - 1 - row_index) as f32 * size;
            let cells: Vec<char> = row.chars().collect();
            let mut column = 0;
            while column < cells.len() {
                let min = Vec2::new(self.origin.x + column as f32 * size, y);
                let max = min + Vec2::splat(size);
                match cells[column] {
                    '#' | 'W' => {
                        // Merge runs of the same solid tile into one box.
                        let tile = cells[column];
                        let start = column;
                        while column + 1 < cells.len() && cells[column + 1] == tile {
                            column += 1;
                        }
                        let run_max = Vec2::new(self.origin.x + (column + 1) as f32 * size, y + size);
                        built.shapes.push(StaticShape {
                            shape: ConvexShape::from_box(Vec2::new(self.origin.x + start as f32 * size, y), run_max),
                            layer: if tile == 'W' { Layer::Wall } else { Layer::Ground },
                            platform: PlatformKind::Solid,
                        });
                    }
                    '/' => built.shapes.push(StaticShape {
                        shape: ConvexShape::from_points(&[min, Vec2::new(max.x, min.y), max])?,
                        layer: Layer::Ground,
                        platform: PlatformKind::Solid,
                    }),
                    '\\' => built.shapes.push(StaticShape {
                        shape: ConvexShape::from_points(&[min, Vec2::new(max.x, min.y), Vec2::new(min.x, max.y)])?,
                        layer: Layer::Ground,
                        platform: PlatformKind::Solid,
                    }),
                    '-' => built.shapes.push(StaticShape {
                        shape: ConvexShape::from_box(Vec2::new(min.x, max.y - size * 0.25), max),
                        layer: Layer::Platform,
                        platform: PlatformKind::Through,
                    }),
                    '~' => built.shapes.push(StaticShape {
                        shape: ConvexShape::from_box(min, max),
                        layer: Layer::Ground,
                        platform: PlatformKind::Fake,
                    }),
                    '^' => built.hazards.push((min, max)),
                    _ => {}
                }
                column += 1;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerData {
    pub position: Vec2,
    pub size: Vec2,
    #[serde(default)]
    pub attributes: PlayerAttributes,
    #[serde(default)]
    pub collision: CollisionAttributes,
    #[serde(default = "default_health")]
    pub health: f32,
    #[serde(default = "default_lives")]
    pub lives: i32,
    #[serde(default)]
    pub hit_effect: HitEffectAttributes,
    #[serde(default)]
    pub weapons: Vec<Weapon>,
    #[serde(default)]
    pub attacks: Vec<Attack>,
    #[serde(default = "default_player_attackable")]
    pub attackable: LayerMask,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnemyData {
    pub position: Vec2,
    pub size: Vec2,
    #[serde(default)]
    pub attributes: EnemyAttributes,
    #[serde(default)]
    pub collision: CollisionAttributes,
    #[serde(default = "default_health")]
    pub health: f32,
    #[serde(default)]
    pub hit_effect: HitEffectAttributes,
    #[serde(default)]
    pub attacks: Vec<Attack>,
    #[serde(default = "default_enemy_attackable")]
    pub attackable: LayerMask,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlatformData {
    pub position: Vec2,
    pub size: Vec2,
    #[serde(flatten)]
    pub attributes: MovingPlatformAttributes,
    #[serde(default = "default_layer_ground")]
    pub layer: Layer,
    #[serde(default)]
    pub platform: PlatformKind,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObjectData {
    pub position: Vec2,
    pub size: Vec2,
    #[serde(default = "default_object_gravity")]
    pub gravity: f32,
    #[serde(default)]
    pub collision: CollisionAttributes,
    /// Breakable objects carry health.
    #[serde(default)]
    pub health: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ZoneData {
    pub min: Vec2,
    pub max: Vec2,
    #[serde(flatten)]
    pub kind: ZoneKind,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LevelData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub music: Option<String>,
    #[serde(default)]
    pub geometry: GeometryData,
    pub player: PlayerData,
    #[serde(default)]
    pub enemies: Vec<EnemyData>,
    #[serde(default)]
    pub platforms: Vec<PlatformData>,
    #[serde(default)]
    pub objects: Vec<ObjectData>,
    #[serde(default)]
    pub zones: Vec<ZoneData>,
    /// Respawn points in order. The player position is used when empty.
    #[serde(default)]
    pub checkpoints: Vec<Vec2>,
    #[serde(default)]
    pub checkpoint_distance: Option<f32>,
    #[serde(default)]
    pub camera: Option<CameraSettings>,
}

impl LevelData {
    pub fn from_json(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("Failed to parse level: {}", e))
    }

    pub fn load_from_file(path: &str) -> Result<Self, String> {
        let text = std::fs::read_to_string(path).map_err(|e| format!("Failed to read level '{}': {}", path, e))?;
        let level = Self::from_json(&text).map_err(|e| format!("{} ({})", e, path))?;
        info!("Loaded level '{}' from '{}'", level.name, path);
        Ok(level)
    }
}

/// What the level manager should load at the end of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelRequest {
    Load(usize),
    Next,
    Reload,
}

/// Where a request leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelTarget {
    Level(usize),
    /// The last level was completed.
    Finished,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct LevelManager {
    levels: Vec<PathBuf>,
    current: usize,
    pending: Option<LevelRequest>,
    /// Levels parsed up front by tests and embedders; used instead of files.
    preloaded: Vec<LevelData>,
}

impl LevelManager {
    pub fn new(levels: Vec<PathBuf>) -> Self {
        Self {
            levels,
            ..Default::default()
        }
    }

    /// Use already parsed levels instead of reading files.
    pub fn from_levels(levels: Vec<LevelData>) -> Self {
        Self {
            preloaded: levels,
            ..Default::default()
        }
    }

    pub fn level_count(&self) -> usize {
        self.levels.len().max(self.preloaded.len())
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn request(&mut self, request: LevelRequest) {
        self.pending = Some(request);
    }

    pub fn pending(&self) -> Option<LevelRequest> {
        self.pending
    }

    pub fn take_pending(&mut self) -> Option<LevelRequest> {
        self.pending.take()
    }

    /// Resolve a request against the level list and make it current.
    pub fn resolve(&mut self, request: LevelRequest) -> Result<LevelTarget, String> {
        let count = self.level_count();
        let index = match request {
            LevelRequest::Load(index) => index,
            LevelRequest::Next => self.current + 1,
            LevelRequest::Reload => self.current,
        };
        if index >= count {
            return match request {
                LevelRequest::Next => Ok(LevelTarget::Finished),
                _ => Err(format!("No level with index {} ({} levels)", index, count)),
            };
        }
        self.current = index;
        Ok(LevelTarget::Level(index))
    }

    /// Data for level `index`.
    pub fn load(&self, index: usize) -> Result<LevelData, String> {
        if let Some(level) = self.preloaded.get(index) {
            return Ok(level.clone());
        }
        let path = self
            .levels
            .get(index)
            .ok_or_else(|| format!("No level with index {}", index))?;
        LevelData::load_from_file(&path.to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_level() -> LevelData {
        LevelData::from_json(r#"{ "player": { "position": [0, 1], "size": [1, 2] } }"#).unwrap()
    }

    // ==================== PARSING ====================

    #[test]
    fn minimal_level_uses_defaults() {
        let level = minimal_level();
        assert_eq!(level.player.health, 3.0);
        assert_eq!(level.player.lives, 3);
        assert!(level.player.attackable.contains_layer(Layer::Enemy));
        assert!(level.enemies.is_empty());
        assert!(level.camera.is_none());
    }

    #[test]
    fn zones_and_platforms_flatten() {
        let level = LevelData::from_json(
            r#"{
                "player": { "position": [0, 1], "size": [1, 2] },
                "zones": [ { "min": [0, 0], "max": [1, 1], "kind": "damage", "damage": 2 } ],
                "platforms": [ {
                    "position": [3, 3], "size": [2, 0.5],
                    "waypoints": [[0, 0], [4, 0]], "speed": 2,
                    "passenger_mask": ["player", "enemy"]
                } ]
            }"#,
        )
        .unwrap();
        assert_eq!(level.zones[0].kind, ZoneKind::Damage { damage: 2.0 });
        assert_eq!(level.platforms[0].attributes.speed, 2.0);
        assert!(level.platforms[0].attributes.passenger_mask.contains_layer(Layer::Enemy));
        assert_eq!(level.platforms[0].layer, Layer::Ground);
    }

    #[test]
    fn unknown_layer_is_an_error() {
        let result = LevelData::from_json(
            r#"{ "player": { "position": [0, 1], "size": [1, 2], "attackable": ["ghosts"] } }"#,
        );
        assert!(result.is_err());
    }

    // ==================== GEOMETRY ====================

    #[test]
    fn tile_rows_merge_and_stack() {
        let geometry = GeometryData {
            tiles: Some(TileGridData {
                origin: Vec2::ZERO,
                tile_size: 1.0,
                rows: vec!["W  -".to_string(), "###/".to_string()],
            }),
            ..Default::default()
        };
        let built = geometry.build().unwrap();
        assert_eq!(built.shapes.len(), 4);

        let wall = &built.shapes[0];
        assert_eq!(wall.layer, Layer::Wall);
        assert_eq!(wall.shape.bounds(), (Vec2::new(0.0, 1.0), Vec2::new(1.0, 2.0)));

        let platform = &built.shapes[1];
        assert_eq!(platform.platform, PlatformKind::Through);
        assert_eq!(platform.shape.bounds(), (Vec2::new(3.0, 1.75), Vec2::new(4.0, 2.0)));

        let ground = &built.shapes[2];
        assert_eq!(ground.shape.bounds(), (Vec2::ZERO, Vec2::new(3.0, 1.0)));

        let slope = &built.shapes[3];
        assert_eq!(slope.shape.vertices().len(), 3);
    }

    #[test]
    fn hazards_become_areas() {
        let geometry = GeometryData {
            tiles: Some(TileGridData {
                origin: Vec2::new(-1.0, 0.0),
                tile_size: 2.0,
                rows: vec!["#^#".to_string()],
            }),
            ..Default::default()
        };
        let built = geometry.build().unwrap();
        assert_eq!(built.hazards, vec![(Vec2::new(1.0, 0.0), Vec2::new(3.0, 2.0))]);
        assert_eq!(built.shapes.len(), 2);
    }

    #[test]
    fn concave_polygon_is_rejected() {
        let geometry = GeometryData {
            polygons: vec![PolygonData {
                points: vec![
                    Vec2::ZERO,
                    Vec2::new(2.0, 0.0),
                    Vec2::new(1.0, 0.5),
                    Vec2::new(2.0, 2.0),
                    Vec2::new(0.0, 2.0),
                ],
                layer: Layer::Ground,
                platform: PlatformKind::Solid,
            }],
            ..Default::default()
        };
        assert!(geometry.build().is_err());
    }

    // ==================== LEVEL MANAGER ====================

    #[test]
    fn next_past_last_finishes() {
        let mut manager = LevelManager::from_levels(vec![minimal_level(), minimal_level()]);
        assert_eq!(manager.resolve(LevelRequest::Load(0)), Ok(LevelTarget::Level(0)));
        assert_eq!(manager.resolve(LevelRequest::Next), Ok(LevelTarget::Level(1)));
        assert_eq!(manager.resolve(LevelRequest::Reload), Ok(LevelTarget::Level(1)));
        assert_eq!(manager.resolve(LevelRequest::Next), Ok(LevelTarget::Finished));
        assert!(manager.resolve(LevelRequest::Load(5)).is_err());
        assert_eq!(manager.current(), 1);
    }

    #[test]
    fn requests_are_taken_once() {
        let mut manager = LevelManager::from_levels(vec![minimal_level()]);
        manager.request(LevelRequest::Reload);
        assert_eq!(manager.take_pending(), Some(LevelRequest::Reload));
        assert_eq!(manager.take_pending(), None);
    }

    #[test]
    fn missing_file_is_an_error() {
        let manager = LevelManager::new(vec![PathBuf::from("/no/such/level.json")]);
        assert!(manager.load(0).is_err());
    }
}
