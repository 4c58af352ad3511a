use bevy_ecs::prelude::Component;

/// Tag grouping entities by role, e.g. `"player"` or `"enemy"`.
#[derive(Component, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Group(pub String);

impl Group {
    pub const PLAYER: &'static str = "player";
    pub const ENEMY: &'static str = "enemy";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is(&self, name: &str) -> bool {
        self.0 == name
    }
}
