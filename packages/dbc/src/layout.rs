//! The layout registry: *(table name, logical field name) → column index*
//! for the active game version.
//!
//! Column positions move between expansions, so anything that must survive
//! a version change reads its columns through a layout. The registry is
//! immutable once constructed; the shell builds one at init and passes it
//! down. Unknown lookups answer `None` and callers fall back to their
//! hard-coded 3.3.5a index.

use std::collections::HashMap;
use anyhow::{Result, ensure};
use serde_json::Value;


/// An immutable table-name → field-name → column-index mapping.
#[derive(Debug, Clone)]
pub struct DbcLayout {
    tables: HashMap<String, HashMap<String, u32>>,
}

impl DbcLayout {
    /// The built-in 3.3.5a defaults.
    pub fn wotlk() -> Self {
        let mut tables = HashMap::new();
        for (name, fields) in WOTLK_TABLES {
            let fields = fields
                .iter()
                .map(|&(f, col)| (f.to_owned(), col))
                .collect::<HashMap<_, _>>();
            tables.insert((*name).to_owned(), fields);
        }
        DbcLayout { tables }
    }

    /// Parse an override document, `{"Table": {"Field": index, ...}, ...}`,
    /// layered over the 3.3.5a defaults.
    pub fn from_json(doc: &str) -> Result<Self> {
        let mut layout = Self::wotlk();
        let value: Value = serde_json::from_str(doc)?;
        let obj = value.as_object()
            .ok_or_else(|| anyhow::anyhow!("dbc layout: document is not an object"))?;
        for (table, fields) in obj {
            let fields_obj = fields.as_object()
                .ok_or_else(|| anyhow::anyhow!("dbc layout: table {:?} is not an object", table))?;
            let entry = layout.tables.entry(table.clone()).or_default();
            for (field, index) in fields_obj {
                let index = index.as_u64()
                    .filter(|&i| i <= u32::MAX as u64)
                    .ok_or_else(|| anyhow::anyhow!(
                        "dbc layout: {}.{} is not a column index", table, field,
                    ))?;
                entry.insert(field.clone(), index as u32);
            }
        }
        ensure!(!layout.tables.is_empty(), "dbc layout: empty document");
        Ok(layout)
    }

    /// Column index for a logical field, if this layout knows it.
    pub fn field(&self, table: &str, field: &str) -> Option<u32> {
        self.tables.get(table)?.get(field).copied()
    }

    /// Column index with a hard-coded fallback for fields the layout does
    /// not carry.
    pub fn field_or(&self, table: &str, field: &str, fallback: u32) -> u32 {
        self.field(table, field).unwrap_or_else(|| {
            trace!(table, field, fallback, "dbc layout miss");
            fallback
        })
    }
}

/// 3.3.5a column positions, restricted to the fields this client reads.
static WOTLK_TABLES: &[(&str, &[(&str, u32)])] = &[
    ("AreaTable", &[("Id", 0), ("MapId", 1), ("ParentAreaId", 2), ("Name", 11)]),
    ("AuctionHouse", &[("Id", 0), ("FactionId", 1)]),
    ("CharBaseInfo", &[("Race", 0), ("Class", 1)]),
    ("CharSections", &[
        ("Id", 0), ("Race", 1), ("Gender", 2), ("Section", 3),
        ("Texture1", 4), ("Texture2", 5), ("Texture3", 6),
        ("Flags", 7), ("Variation", 8), ("Color", 9),
    ]),
    ("CharStartOutfit", &[("Id", 0), ("RaceClassGender", 1), ("ItemId0", 2)]),
    ("CharTitles", &[("Id", 0), ("Name", 2)]),
    ("ChatProfanity", &[("Id", 0), ("Text", 1)]),
    ("ChrClasses", &[("Id", 0), ("PowerType", 2), ("Name", 4)]),
    ("ChrRaces", &[
        ("Id", 0), ("FactionId", 2), ("MaleDisplayId", 4),
        ("FemaleDisplayId", 5), ("ClientPrefix", 6), ("BaseLanguage", 10),
        ("Name", 14),
    ]),
    ("CinematicSequences", &[("Id", 0)]),
    ("CreatureDisplayInfo", &[
        ("Id", 0), ("ModelId", 1), ("SoundId", 2), ("ExtraDisplayId", 3),
        ("Scale", 4), ("Opacity", 5), ("Texture1", 6), ("Texture2", 7),
        ("Texture3", 8),
    ]),
    ("CreatureDisplayInfoExtra", &[("Id", 0), ("Race", 1), ("Gender", 2), ("BakedTexture", 20)]),
    ("CreatureFamily", &[("Id", 0), ("Name", 13)]),
    ("CreatureModelData", &[("Id", 0), ("Flags", 1), ("ModelPath", 2)]),
    ("EmotesText", &[("Id", 0), ("Name", 1)]),
    ("Faction", &[("Id", 0), ("ReputationIndex", 1), ("Name", 19)]),
    ("FactionTemplate", &[
        ("Id", 0), ("FactionId", 1), ("Flags", 2), ("FactionGroup", 3),
        ("FriendGroup", 4), ("EnemyGroup", 5),
        ("Enemy1", 6), ("Enemy2", 7), ("Enemy3", 8), ("Enemy4", 9),
        ("Friend1", 10), ("Friend2", 11), ("Friend3", 12), ("Friend4", 13),
    ]),
    ("GameObjectDisplayInfo", &[("Id", 0), ("ModelPath", 1)]),
    ("GemProperties", &[("Id", 0), ("EnchantId", 1)]),
    ("ItemDisplayInfo", &[
        ("Id", 0), ("LeftModel", 1), ("RightModel", 2),
        ("LeftModelTexture", 3), ("RightModelTexture", 4),
        ("Icon1", 5), ("Icon2", 6),
        ("GeosetGroup1", 7), ("GeosetGroup2", 8), ("GeosetGroup3", 9),
        ("Flags", 10), ("SpellVisualId", 11), ("GroupSoundIndex", 12),
        ("HelmetGeosetVisMale", 13), ("HelmetGeosetVisFemale", 14),
        ("TextureArmUpper", 15), ("TextureArmLower", 16), ("TextureHand", 17),
        ("TextureTorsoUpper", 18), ("TextureTorsoLower", 19),
        ("TextureLegUpper", 20), ("TextureLegLower", 21), ("TextureFoot", 22),
        ("ItemVisual", 23), ("ParticleColorId", 24),
    ]),
    ("Item", &[
        ("Id", 0), ("ClassId", 1), ("SubclassId", 2), ("SoundOverride", 3),
        ("Material", 4), ("DisplayId", 5), ("InventoryType", 6), ("SheatheType", 7),
    ]),
    ("LoadingScreens", &[("Id", 0), ("Name", 1), ("Path", 2)]),
    ("Light", &[("Id", 0), ("MapId", 1), ("X", 2), ("Y", 3), ("Z", 4), ("FalloffStart", 5), ("FalloffEnd", 6)]),
    ("Map", &[
        ("Id", 0), ("Directory", 1), ("InstanceType", 2), ("Flags", 3),
        ("Name", 5), ("AreaTableId", 7), ("LoadingScreenId", 57),
    ]),
    ("SkillLine", &[("Id", 0), ("CategoryId", 1), ("Name", 3)]),
    ("Spell", &[
        ("Id", 0), ("Category", 1), ("Dispel", 2), ("Mechanic", 3),
        ("Attributes", 4), ("CastingTimeIndex", 28), ("RecoveryTime", 30),
        ("CategoryRecoveryTime", 31), ("DurationIndex", 36), ("PowerType", 37),
        ("ManaCost", 38), ("RangeIndex", 42), ("SpellIconId", 133),
        ("ActiveIconId", 134), ("Name", 136), ("Rank", 153), ("Description", 170),
    ]),
    ("SpellCastTimes", &[("Id", 0), ("Base", 1), ("PerLevel", 2), ("Minimum", 3)]),
    ("SpellDuration", &[("Id", 0), ("Duration", 1), ("DurationPerLevel", 2), ("MaxDuration", 3)]),
    ("SpellIcon", &[("Id", 0), ("TextureFile", 1)]),
    ("SpellRange", &[("Id", 0), ("MinRangeHostile", 1), ("MaxRangeHostile", 3)]),
    ("TaxiNodes", &[("Id", 0), ("MapId", 1), ("X", 2), ("Y", 3), ("Z", 4), ("Name", 5)]),
    ("TaxiPath", &[("Id", 0), ("FromNode", 1), ("ToNode", 2), ("Cost", 3)]),
    ("TaxiPathNode", &[("Id", 0), ("PathId", 1), ("NodeIndex", 2), ("MapId", 3), ("X", 4), ("Y", 5), ("Z", 6)]),
    ("WorldMapArea", &[("Id", 0), ("MapId", 1), ("AreaId", 2), ("Name", 3)]),
];


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wotlk_defaults_cover_version_sensitive_tables() {
        let layout = DbcLayout::wotlk();
        assert_eq!(layout.field("Spell", "Name"), Some(136));
        assert_eq!(layout.field("CharSections", "Texture1"), Some(4));
        assert_eq!(layout.field("ItemDisplayInfo", "TextureFoot"), Some(22));
        assert_eq!(layout.field("Spell", "NoSuchField"), None);
        assert_eq!(layout.field("NoSuchTable", "Id"), None);
    }

    #[test]
    fn json_overrides_layer_over_defaults() {
        let layout = DbcLayout::from_json(r#"{"Spell": {"Name": 140}}"#).unwrap();
        assert_eq!(layout.field("Spell", "Name"), Some(140));
        // untouched fields keep the defaults
        assert_eq!(layout.field("Spell", "Rank"), Some(153));
        assert_eq!(layout.field("CharSections", "Race"), Some(1));
    }

    #[test]
    fn fallback_used_on_miss() {
        let layout = DbcLayout::wotlk();
        assert_eq!(layout.field_or("Spell", "Name", 1), 136);
        assert_eq!(layout.field_or("Spell", "Unheard", 77), 77);
    }

    #[test]
    fn bad_documents_rejected() {
        assert!(DbcLayout::from_json("[]").is_err());
        assert!(DbcLayout::from_json(r#"{"Spell": 3}"#).is_err());
        assert!(DbcLayout::from_json(r#"{"Spell": {"Name": "x"}}"#).is_err());
    }
}
