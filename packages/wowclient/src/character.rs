//! Races, classes, genders, the race/class validity matrix, and the
//! start-data table used to seed a fresh single-player character.

use serde::{Serialize, Deserialize};
use vek::*;


#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Race {
    Human = 1,
    Orc = 2,
    Dwarf = 3,
    NightElf = 4,
    Undead = 5,
    Tauren = 6,
    Gnome = 7,
    Troll = 8,
    BloodElf = 10,
    Draenei = 11,
}

impl Race {
    pub fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            1 => Race::Human,
            2 => Race::Orc,
            3 => Race::Dwarf,
            4 => Race::NightElf,
            5 => Race::Undead,
            6 => Race::Tauren,
            7 => Race::Gnome,
            8 => Race::Troll,
            10 => Race::BloodElf,
            11 => Race::Draenei,
            _ => return None,
        })
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Class {
    Warrior = 1,
    Paladin = 2,
    Hunter = 3,
    Rogue = 4,
    Priest = 5,
    DeathKnight = 6,
    Shaman = 7,
    Mage = 8,
    Warlock = 9,
    Druid = 11,
}

impl Class {
    pub fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            1 => Class::Warrior,
            2 => Class::Paladin,
            3 => Class::Hunter,
            4 => Class::Rogue,
            5 => Class::Priest,
            6 => Class::DeathKnight,
            7 => Class::Shaman,
            8 => Class::Mage,
            9 => Class::Warlock,
            11 => Class::Druid,
            _ => return None,
        })
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

/// Gender as the client tracks it. The wire only knows 0 and 1; any other
/// byte a server sends is preserved here and clamped to male wherever a
/// binary value is required.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other(u8),
}

impl Default for Gender {
    fn default() -> Self {
        Gender::Male
    }
}

impl Gender {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Gender::Male,
            1 => Gender::Female,
            other => Gender::Other(other),
        }
    }

    /// The byte sent to the server.
    pub fn wire_byte(self) -> u8 {
        match self {
            Gender::Female => 1,
            Gender::Male | Gender::Other(_) => 0,
        }
    }

    /// Gendered texture file-name suffix.
    pub fn suffix(self) -> char {
        match self {
            Gender::Female => 'F',
            Gender::Male | Gender::Other(_) => 'M',
        }
    }
}

/// Whether this race/class pairing can exist on 3.3.5a. Never panics;
/// creation flows surface this as a predicate.
pub fn valid_race_class(race: Race, class: Class) -> bool {
    use Race::*;
    use Class::*;
    // death knights exist for every race in this era
    if class == DeathKnight {
        return true;
    }
    match race {
        Human => matches!(class, Warrior | Paladin | Rogue | Priest | Mage | Warlock),
        Orc => matches!(class, Warrior | Hunter | Rogue | Shaman | Warlock),
        Dwarf => matches!(class, Warrior | Paladin | Hunter | Rogue | Priest),
        NightElf => matches!(class, Warrior | Hunter | Rogue | Priest | Druid),
        Undead => matches!(class, Warrior | Rogue | Priest | Mage | Warlock),
        Tauren => matches!(class, Warrior | Hunter | Shaman | Druid),
        Gnome => matches!(class, Warrior | Rogue | Mage | Warlock),
        Troll => matches!(class, Warrior | Hunter | Rogue | Priest | Shaman | Mage),
        BloodElf => matches!(class, Paladin | Hunter | Rogue | Priest | Mage | Warlock),
        Draenei => matches!(class, Warrior | Paladin | Hunter | Priest | Shaman | Mage),
    }
}

/// Appearance bytes shared by char-enum records and the compositor.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
pub struct AppearanceBytes {
    pub skin: u8,
    pub face: u8,
    pub hair_style: u8,
    pub hair_color: u8,
    pub facial_hair: u8,
}

/// One character from the server's enumeration, equipment included.
#[derive(Debug, Clone)]
pub struct CharacterSummary {
    pub guid: u64,
    pub name: String,
    pub race: Race,
    pub class: Class,
    pub gender: Gender,
    pub appearance: AppearanceBytes,
    pub level: u8,
    pub zone: u32,
    pub map: u32,
    pub pos: Vec3<f32>,
    pub guild_id: u32,
    pub flags: u32,
    pub pet_display_id: u32,
    pub pet_level: u32,
    pub pet_family: u32,
    pub equipment: [CharEnumEquip; 23],
}

#[derive(Debug, Copy, Clone, Default)]
pub struct CharEnumEquip {
    pub display_id: u32,
    pub inventory_type: u8,
    pub enchant_aura: u32,
}

/// Spawn point and level-1 vitals for a fresh character.
#[derive(Debug, Copy, Clone)]
pub struct StartData {
    pub map: u32,
    pub zone: u32,
    pub pos: Vec3<f32>,
    pub yaw: f32,
    pub health: u32,
    pub power: u32,
}

/// Start-data by race and class, canonical coordinates. Death knights all
/// share the Ebon Hold start regardless of race.
pub fn start_data(race: Race, class: Class) -> StartData {
    if class == Class::DeathKnight {
        return StartData {
            map: 609,
            zone: 4298,
            pos: Vec3::new(2355.84, 5664.77, 426.028),
            yaw: 3.65997,
            health: 8121,
            power: 1000,
        };
    }
    let (map, zone, pos, yaw) = match race {
        Race::Human => (0, 12, Vec3::new(-8949.95, -132.493, 83.5312), 0.0),
        Race::Orc | Race::Troll => (1, 14, Vec3::new(-618.518, -4251.67, 38.718), 0.0),
        Race::Dwarf | Race::Gnome => (0, 1, Vec3::new(-6240.32, 331.033, 382.758), 6.17716),
        Race::NightElf => (1, 141, Vec3::new(10311.3, 832.463, 1326.41), 5.69632),
        Race::Undead => (0, 85, Vec3::new(1676.35, 1677.45, 121.67), 2.70526),
        Race::Tauren => (1, 215, Vec3::new(-2917.58, -257.98, 52.9968), 0.0),
        Race::BloodElf => (530, 3431, Vec3::new(10349.6, -6357.29, 33.4026), 5.31605),
        Race::Draenei => (530, 3526, Vec3::new(-3961.64, -13931.2, 100.615), 2.08364),
    };
    let (health, power) = match class {
        Class::Warrior => (60, 1000),
        Class::Paladin => (58, 140),
        Class::Hunter => (56, 110),
        Class::Rogue => (55, 100),
        Class::Priest => (42, 165),
        Class::Shaman => (57, 85),
        Class::Mage => (42, 160),
        Class::Warlock => (43, 140),
        Class::Druid => (53, 60),
        Class::DeathKnight => unreachable!(),
    };
    StartData { map, zone, pos, yaw, health, power }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_matrix_spot_checks() {
        assert!(valid_race_class(Race::Human, Class::Paladin));
        assert!(!valid_race_class(Race::Orc, Class::Paladin));
        assert!(!valid_race_class(Race::Human, Class::Shaman));
        assert!(valid_race_class(Race::Tauren, Class::Druid));
        assert!(!valid_race_class(Race::Gnome, Class::Priest));
        // every race can be a death knight
        for id in 1..=11 {
            if let Some(race) = Race::from_id(id) {
                assert!(valid_race_class(race, Class::DeathKnight));
            }
        }
    }

    #[test]
    fn gender_wire_clamp() {
        assert_eq!(Gender::from_byte(3), Gender::Other(3));
        assert_eq!(Gender::Other(3).wire_byte(), 0);
        assert_eq!(Gender::Other(3).suffix(), 'M');
        assert_eq!(Gender::Female.wire_byte(), 1);
    }
}
