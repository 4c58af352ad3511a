//! Collision layers and layer masks.
//!
//! Every collider lives on exactly one [`Layer`]. Raycasts and overlap
//! queries filter colliders with a [`LayerMask`], a bit set where bit `n`
//! stands for layer `n`. Masks are written in level files as lists of layer
//! names, e.g. `["ground", "wall", "platform"]`.

use std::fmt;
use std::str::FromStr;

use bevy_ecs::prelude::Component;
use serde::Deserialize;

/// Named collision layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
#[repr(u8)]
pub enum Layer {
    #[default]
    Default = 0,
    Ground = 1,
    Wall = 2,
    Platform = 3,
    Player = 4,
    Enemy = 5,
    Object = 6,
    Hazard = 7,
}

impl Layer {
    pub const ALL: [Layer; 8] = [
        Layer::Default,
        Layer::Ground,
        Layer::Wall,
        Layer::Platform,
        Layer::Player,
        Layer::Enemy,
        Layer::Object,
        Layer::Hazard,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Layer::Default => "default",
            Layer::Ground => "ground",
            Layer::Wall => "wall",
            Layer::Platform => "platform",
            Layer::Player => "player",
            Layer::Enemy => "enemy",
            Layer::Object => "object",
            Layer::Hazard => "hazard",
        }
    }
}

impl FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Layer::ALL
            .iter()
            .copied()
            .find(|layer| layer.name() == s)
            .ok_or_else(|| format!("Unknown collision layer '{}'", s))
    }
}

impl TryFrom<String> for Layer {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Layer a collider-bearing entity lives on.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionLayer(pub Layer);

/// Set of layers used to filter collision queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    pub fn from_layers(layers: &[Layer]) -> Self {
        layers
            .iter()
            .fold(LayerMask::NONE, |mask, layer| mask.with(*layer))
    }

    pub fn with(self, layer: Layer) -> Self {
        LayerMask(self.0 | (1 << layer.index()))
    }

    /// True when the bit for `layer` is set.
    pub fn contains_layer(self, layer: Layer) -> bool {
        self.0 == (self.0 | (1 << layer.index()))
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<Vec<String>> for LayerMask {
    type Error = String;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        let mut mask = LayerMask::NONE;
        for name in names {
            mask = mask.with(name.parse()?);
        }
        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_contains_only_its_layers() {
        let mask = LayerMask::from_layers(&[Layer::Ground, Layer::Platform]);
        assert!(mask.contains_layer(Layer::Ground));
        assert!(mask.contains_layer(Layer::Platform));
        assert!(!mask.contains_layer(Layer::Player));
        assert!(!LayerMask::NONE.contains_layer(Layer::Default));
        assert!(LayerMask::ALL.contains_layer(Layer::Hazard));
    }

    #[test]
    fn layer_parses_from_name() {
        assert_eq!("wall".parse::<Layer>().unwrap(), Layer::Wall);
        assert!("lava".parse::<Layer>().is_err());
    }

    #[test]
    fn mask_deserializes_from_name_list() {
        let mask: LayerMask = serde_json::from_str(r#"["ground", "enemy"]"#).unwrap();
        assert_eq!(mask, LayerMask::from_layers(&[Layer::Ground, Layer::Enemy]));
    }

    #[test]
    fn mask_rejects_unknown_names() {
        let result: Result<LayerMask, _> = serde_json::from_str(r#"["ground", "nope"]"#);
        assert!(result.is_err());
    }
}
