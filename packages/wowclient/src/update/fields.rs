//! Numeric update-field indices for the 3.3.5a object field space, plus
//! classification helpers for the ranges the client reacts to.

pub const OBJECT_FIELD_GUID: u16 = 0x00;
pub const OBJECT_FIELD_TYPE: u16 = 0x02;
pub const OBJECT_FIELD_ENTRY: u16 = 0x03;
pub const OBJECT_FIELD_SCALE_X: u16 = 0x04;
pub const OBJECT_END: u16 = 0x06;

pub const UNIT_FIELD_CHARM: u16 = 0x06;
pub const UNIT_FIELD_SUMMON: u16 = 0x08;
pub const UNIT_FIELD_TARGET: u16 = 0x12;
pub const UNIT_FIELD_BYTES_0: u16 = 0x17;
pub const UNIT_FIELD_HEALTH: u16 = 0x18;
pub const UNIT_FIELD_POWER1: u16 = 0x19;
pub const UNIT_FIELD_MAXHEALTH: u16 = 0x20;
pub const UNIT_FIELD_MAXPOWER1: u16 = 0x21;
pub const UNIT_FIELD_LEVEL: u16 = 0x36;
pub const UNIT_FIELD_FACTIONTEMPLATE: u16 = 0x37;
pub const UNIT_FIELD_FLAGS: u16 = 0x3B;
pub const UNIT_FIELD_FLAGS_2: u16 = 0x3C;
pub const UNIT_FIELD_BASEATTACKTIME: u16 = 0x3E;
pub const UNIT_FIELD_BOUNDINGRADIUS: u16 = 0x41;
pub const UNIT_FIELD_COMBATREACH: u16 = 0x42;
pub const UNIT_FIELD_DISPLAYID: u16 = 0x43;
pub const UNIT_FIELD_NATIVEDISPLAYID: u16 = 0x44;
pub const UNIT_FIELD_MOUNTDISPLAYID: u16 = 0x45;
pub const UNIT_END: u16 = 0x94;

pub const PLAYER_FLAGS: u16 = 0x96;
pub const PLAYER_GUILDID: u16 = 0x97;
pub const PLAYER_GUILDRANK: u16 = 0x98;
pub const PLAYER_BYTES: u16 = 0x99;
pub const PLAYER_BYTES_2: u16 = 0x9A;
pub const PLAYER_BYTES_3: u16 = 0x9B;
pub const PLAYER_QUEST_LOG_1_1: u16 = 0x9E;
pub const PLAYER_VISIBLE_ITEM_1_ENTRYID: u16 = 0x11B;
/// Entry id plus enchantment per visible slot.
pub const PLAYER_VISIBLE_ITEM_FIELDS: u16 = 2;
pub const PLAYER_VISIBLE_ITEM_SLOTS: u16 = 19;
pub const PLAYER_XP: u16 = 0x3FC;
pub const PLAYER_NEXT_LEVEL_XP: u16 = 0x3FD;
pub const PLAYER_FIELD_COINAGE: u16 = 0x4A6;

/// Which visible equipment slot a field index belongs to, if it is an
/// entry-id field in the visible-item range.
pub fn visible_item_slot(field: u16) -> Option<u16> {
    let end = PLAYER_VISIBLE_ITEM_1_ENTRYID
        + PLAYER_VISIBLE_ITEM_SLOTS * PLAYER_VISIBLE_ITEM_FIELDS;
    if field < PLAYER_VISIBLE_ITEM_1_ENTRYID || field >= end {
        return None;
    }
    let offset = field - PLAYER_VISIBLE_ITEM_1_ENTRYID;
    (offset % PLAYER_VISIBLE_ITEM_FIELDS == 0).then(|| offset / PLAYER_VISIBLE_ITEM_FIELDS)
}

/// One of the seven power bars, if the field is a current-power field.
pub fn power_index(field: u16) -> Option<usize> {
    (UNIT_FIELD_POWER1..UNIT_FIELD_POWER1 + 7)
        .contains(&field)
        .then(|| (field - UNIT_FIELD_POWER1) as usize)
}

pub fn max_power_index(field: u16) -> Option<usize> {
    (UNIT_FIELD_MAXPOWER1..UNIT_FIELD_MAXPOWER1 + 7)
        .contains(&field)
        .then(|| (field - UNIT_FIELD_MAXPOWER1) as usize)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_item_range_classification() {
        assert_eq!(visible_item_slot(PLAYER_VISIBLE_ITEM_1_ENTRYID), Some(0));
        // the enchantment halves are not entry ids
        assert_eq!(visible_item_slot(PLAYER_VISIBLE_ITEM_1_ENTRYID + 1), None);
        assert_eq!(visible_item_slot(PLAYER_VISIBLE_ITEM_1_ENTRYID + 2), Some(1));
        assert_eq!(visible_item_slot(PLAYER_VISIBLE_ITEM_1_ENTRYID + 36), Some(18));
        assert_eq!(visible_item_slot(PLAYER_VISIBLE_ITEM_1_ENTRYID + 38), None);
        assert_eq!(visible_item_slot(0), None);
    }

    #[test]
    fn power_bar_classification() {
        assert_eq!(power_index(UNIT_FIELD_POWER1), Some(0));
        assert_eq!(power_index(UNIT_FIELD_POWER1 + 6), Some(6));
        assert_eq!(power_index(UNIT_FIELD_MAXHEALTH), None);
        assert_eq!(max_power_index(UNIT_FIELD_MAXPOWER1 + 3), Some(3));
    }
}
