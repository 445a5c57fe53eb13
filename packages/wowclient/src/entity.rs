//! The guid-keyed entity model: everything currently in view, owned
//! uniquely by the manager. Observers look entities up by guid or iterate;
//! under the single-threaded frame invariant those references are stable
//! for the duration of one frame.

use crate::character::{Race, Class, Gender, AppearanceBytes};
use std::collections::{HashMap, hash_map};
use vek::*;


/// 64-bit entity identity. Never reused within a session.
pub type Guid = u64;

/// Object-type tag carried by create blocks.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum ObjectKind {
    Object = 0,
    Item = 1,
    Container = 2,
    Unit = 3,
    Player = 4,
    GameObject = 5,
    DynamicObject = 6,
    Corpse = 7,
}

impl ObjectKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => ObjectKind::Object,
            1 => ObjectKind::Item,
            2 => ObjectKind::Container,
            3 => ObjectKind::Unit,
            4 => ObjectKind::Player,
            5 => ObjectKind::GameObject,
            6 => ObjectKind::DynamicObject,
            7 => ObjectKind::Corpse,
            _ => return None,
        })
    }
}

/// Values every unit variant carries beyond the base object.
#[derive(Debug, Clone, Default)]
pub struct UnitState {
    pub level: u32,
    pub health: u32,
    pub max_health: u32,
    pub power: [u32; 7],
    pub max_power: [u32; 7],
    pub faction_template: u32,
    pub flags: u32,
    pub display_id: u32,
    pub native_display_id: u32,
    pub mount_display_id: u32,
    pub bounding_radius: f32,
    pub target: Guid,
}

/// Player additions over a unit.
#[derive(Debug, Clone, Default)]
pub struct PlayerState {
    pub name: String,
    pub guild_id: u32,
    pub race: Option<Race>,
    pub class: Option<Class>,
    pub gender: Gender,
    pub appearance: AppearanceBytes,
    /// Equipment display ids by visible slot, as published in update fields.
    pub equipment_display: [u32; 19],
}

/// Per-variant payload.
#[derive(Debug, Clone)]
pub enum EntityState {
    Object,
    GameObject { display_id: u32 },
    Unit(UnitState),
    Player { unit: UnitState, player: PlayerState },
}

impl EntityState {
    pub fn for_kind(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Unit => EntityState::Unit(UnitState::default()),
            ObjectKind::Player => EntityState::Player {
                unit: UnitState::default(),
                player: PlayerState::default(),
            },
            ObjectKind::GameObject => EntityState::GameObject { display_id: 0 },
            _ => EntityState::Object,
        }
    }
}

/// One entity in view. Position and yaw are canonical-frame.
#[derive(Debug, Clone)]
pub struct Entity {
    pub guid: Guid,
    pub kind: ObjectKind,
    pub entry: u32,
    pub pos: Vec3<f32>,
    pub yaw: f32,
    pub state: EntityState,
    /// Raw update-field values, kept for re-interpretation when layout
    /// hints change. Keyed by numeric field index.
    pub raw_fields: HashMap<u16, u32>,
}

impl Entity {
    pub fn new(guid: Guid, kind: ObjectKind) -> Self {
        Entity {
            guid,
            kind,
            entry: 0,
            pos: Vec3::zero(),
            yaw: 0.0,
            state: EntityState::for_kind(kind),
            raw_fields: HashMap::new(),
        }
    }

    pub fn unit(&self) -> Option<&UnitState> {
        match &self.state {
            EntityState::Unit(unit) => Some(unit),
            EntityState::Player { unit, .. } => Some(unit),
            _ => None,
        }
    }

    pub fn unit_mut(&mut self) -> Option<&mut UnitState> {
        match &mut self.state {
            EntityState::Unit(unit) => Some(unit),
            EntityState::Player { unit, .. } => Some(unit),
            _ => None,
        }
    }

    pub fn player(&self) -> Option<&PlayerState> {
        match &self.state {
            EntityState::Player { player, .. } => Some(player),
            _ => None,
        }
    }

    pub fn player_mut(&mut self) -> Option<&mut PlayerState> {
        match &mut self.state {
            EntityState::Player { player, .. } => Some(player),
            _ => None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.unit().map(|u| u.health > 0).unwrap_or(true)
    }
}

/// Owner of every entity in view.
#[derive(Debug, Default)]
pub struct EntityMgr {
    entities: HashMap<Guid, Entity>,
}

impl EntityMgr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh entity for a create block. Re-creating an existing
    /// guid resets it, which is what a server-side re-spawn means.
    pub fn create(&mut self, guid: Guid, kind: ObjectKind) -> &mut Entity {
        self.entities.insert(guid, Entity::new(guid, kind));
        self.entities.get_mut(&guid).unwrap()
    }

    pub fn destroy(&mut self, guid: Guid) -> bool {
        self.entities.remove(&guid).is_some()
    }

    pub fn get(&self, guid: Guid) -> Option<&Entity> {
        self.entities.get(&guid)
    }

    pub fn get_mut(&mut self, guid: Guid) -> Option<&mut Entity> {
        self.entities.get_mut(&guid)
    }

    pub fn contains(&self, guid: Guid) -> bool {
        self.entities.contains_key(&guid)
    }

    pub fn iter(&self) -> hash_map::Values<'_, Guid, Entity> {
        self.entities.values()
    }

    pub fn iter_mut(&mut self) -> hash_map::ValuesMut<'_, Guid, Entity> {
        self.entities.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Hostility of a unit toward the player, resolved through the
    /// faction-template map the shell loads at login.
    pub fn is_hostile(&self, guid: Guid, hostility: &HashMap<u32, bool>) -> bool {
        self.get(guid)
            .and_then(|e| e.unit())
            .map(|u| hostility.get(&u.faction_template).copied().unwrap_or(false))
            .unwrap_or(false)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_lookup_destroy() {
        let mut mgr = EntityMgr::new();
        mgr.create(42, ObjectKind::Unit);
        assert!(mgr.contains(42));
        assert!(mgr.get(42).unwrap().unit().is_some());
        assert!(mgr.destroy(42));
        assert!(!mgr.destroy(42));
        assert!(mgr.get(42).is_none());
    }

    #[test]
    fn player_variant_carries_unit_values() {
        let mut mgr = EntityMgr::new();
        let e = mgr.create(7, ObjectKind::Player);
        e.unit_mut().unwrap().health = 100;
        e.player_mut().unwrap().name = "Aldra".to_owned();
        let e = mgr.get(7).unwrap();
        assert_eq!(e.unit().unwrap().health, 100);
        assert_eq!(e.player().unwrap().name, "Aldra");
    }

    #[test]
    fn hostility_comes_from_injected_map() {
        let mut mgr = EntityMgr::new();
        mgr.create(1, ObjectKind::Unit).unit_mut().unwrap().faction_template = 16;
        let mut map = HashMap::new();
        map.insert(16, true);
        assert!(mgr.is_hostile(1, &map));
        assert!(!mgr.is_hostile(1, &HashMap::new()));
        assert!(!mgr.is_hostile(99, &map));
    }
}
