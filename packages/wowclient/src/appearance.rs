//! The character appearance compositor: builds one GPU-ready skin atlas
//! from the base body texture plus underwear and equipment region
//! overlays, and computes which geosets the equipped set activates.

use crate::{
    asset::AssetMgr,
    character::{AppearanceBytes, Gender, Race},
    inventory::{EquipSlot, Inventory},
    item::InventoryType,
};
use std::collections::BTreeSet;
use blp::BlpImage;


/// Atlas dimensions of the composed skin.
pub const ATLAS_W: u32 = 256;
pub const ATLAS_H: u32 = 256;

/// CharSections section kinds.
const SECTION_BASE_SKIN: u32 = 0;
const SECTION_UNDERWEAR: u32 = 4;

/// The eight equipment texture regions, with their ItemDisplayInfo column
/// and their rectangle in the atlas.
#[derive(Debug, Copy, Clone)]
struct Region {
    field: &'static str,
    fallback_col: u32,
    component_dir: &'static str,
    rect: (u32, u32, u32, u32),
}

static REGIONS: &[Region] = &[
    Region { field: "TextureArmUpper", fallback_col: 15, component_dir: "ArmUpperTexture", rect: (0, 0, 128, 64) },
    Region { field: "TextureArmLower", fallback_col: 16, component_dir: "ArmLowerTexture", rect: (0, 64, 128, 64) },
    Region { field: "TextureHand", fallback_col: 17, component_dir: "HandTexture", rect: (0, 128, 128, 32) },
    Region { field: "TextureTorsoUpper", fallback_col: 18, component_dir: "TorsoUpperTexture", rect: (128, 0, 128, 64) },
    Region { field: "TextureTorsoLower", fallback_col: 19, component_dir: "TorsoLowerTexture", rect: (128, 64, 128, 32) },
    Region { field: "TextureLegUpper", fallback_col: 20, component_dir: "LegUpperTexture", rect: (128, 96, 128, 64) },
    Region { field: "TextureLegLower", fallback_col: 21, component_dir: "LegLowerTexture", rect: (128, 160, 128, 64) },
    Region { field: "TextureFoot", fallback_col: 22, component_dir: "FootTexture", rect: (128, 224, 128, 32) },
];

/// A composed skin plus the geosets to activate on the character mesh.
#[derive(Debug, Clone)]
pub struct CompositeAppearance {
    pub width: u32,
    pub height: u32,
    /// RGBA8, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
    pub geosets: BTreeSet<u16>,
}

/// Everything the compositor needs about one character. The shell retains
/// this from spawn time so equipment changes can re-composite.
#[derive(Debug, Clone)]
pub struct AppearanceInputs {
    pub race: Race,
    pub gender: Gender,
    pub appearance: AppearanceBytes,
    /// Equipped display ids by slot, as the inventory or the update fields
    /// report them.
    pub equipment: Vec<(EquipSlot, InventoryType, u32)>,
}

impl AppearanceInputs {
    pub fn from_inventory(
        race: Race,
        gender: Gender,
        appearance: AppearanceBytes,
        inventory: &Inventory,
    ) -> Self {
        AppearanceInputs {
            race,
            gender,
            appearance,
            equipment: inventory
                .equipped_items()
                .map(|(slot, item)| (slot, item.inventory_type, item.display_id))
                .collect(),
        }
    }
}

/// Compose the skin atlas and geoset set. Missing textures degrade to the
/// base skin; a missing base yields a neutral gray body so the character
/// still renders.
pub fn compose(assets: &AssetMgr, inputs: &AppearanceInputs) -> CompositeAppearance {
    let mut atlas = vec![0u8; (ATLAS_W * ATLAS_H * 4) as usize];
    for px in atlas.chunks_exact_mut(4) {
        px.copy_from_slice(&[0x80, 0x70, 0x60, 0xFF]);
    }

    // base skin, then every underwear overlay
    if let Some(path) = char_section_textures(assets, inputs, SECTION_BASE_SKIN).into_iter().next() {
        if let Some(image) = assets.load_texture(&path) {
            blit(&mut atlas, &image, (0, 0, ATLAS_W, ATLAS_H), false);
        }
    }
    for path in char_section_textures(assets, inputs, SECTION_UNDERWEAR) {
        if let Some(image) = assets.load_texture(&path) {
            blit(&mut atlas, &image, (0, 0, ATLAS_W, ATLAS_H), true);
        }
    }

    // equipment regions in slot order
    let mut geoset_items = Vec::new();
    for &(_, inventory_type, display_id) in &inputs.equipment {
        let Some(display) = display_info(assets, display_id) else {
            geoset_items.push((inventory_type, [0u32; 3]));
            continue;
        };
        geoset_items.push((inventory_type, display.geoset_groups));
        for (region, name) in REGIONS.iter().zip(display.region_textures.iter()) {
            if name.is_empty() {
                continue;
            }
            if let Some(image) = load_region_texture(assets, region, name, inputs.gender) {
                blit(&mut atlas, &image, region.rect, true);
            }
        }
    }

    CompositeAppearance {
        width: ATLAS_W,
        height: ATLAS_H,
        pixels: atlas,
        geosets: geoset_activation(&geoset_items, inputs.appearance.hair_style),
    }
}

/// Which geosets the equipped set turns on. Pure; fully enumerated rules.
pub fn geoset_activation(
    equipment: &[(InventoryType, [u32; 3])],
    hair_style: u8,
) -> BTreeSet<u16> {
    use InventoryType::*;
    let mut set = BTreeSet::new();
    let find = |wanted: &[InventoryType]| {
        equipment.iter().find(|(it, _)| wanted.contains(it))
    };

    let chest = find(&[Shirt, Chest, Robe]);
    let legs = find(&[Legs]);
    let boots = find(&[Feet]);
    let gloves = find(&[Hands]);
    let cloak = find(&[Cloak]);
    let tabard = find(&[Tabard]);
    let helmet = find(&[Head]);

    // chest sets sleeves; a robe's third group is a kilt over the legs
    let mut kilt = false;
    if let Some((_, groups)) = chest {
        set.insert(801 + groups[0] as u16);
        if groups[2] != 0 {
            set.insert(1301 + groups[2] as u16);
            kilt = true;
        }
    }
    if !kilt {
        if let Some((_, groups)) = legs {
            set.insert(1301 + groups[0] as u16);
        }
    }
    match boots {
        Some((_, groups)) => set.insert(501 + groups[0] as u16),
        None => set.insert(501),
    };
    match gloves {
        Some((_, groups)) => set.insert(401 + groups[0] as u16),
        None => set.insert(401),
    };
    if let Some((_, groups)) = cloak {
        set.insert(1501 + groups[0] as u16);
    }
    if let Some((_, groups)) = tabard {
        set.insert(1201 + groups[0] as u16);
    }
    if helmet.is_some() {
        // scalp cap instead of hair
        set.insert(1);
    } else {
        set.insert(100 + hair_style as u16);
    }
    set
}

struct DisplayInfo {
    region_textures: [String; 8],
    geoset_groups: [u32; 3],
}

fn display_info(assets: &AssetMgr, display_id: u32) -> Option<DisplayInfo> {
    let table = assets.load_dbc("ItemDisplayInfo")?;
    let row = table.find_record_by_id(display_id)?;
    let layout = assets.layout();
    let mut region_textures: [String; 8] = Default::default();
    for (i, region) in REGIONS.iter().enumerate() {
        let col = layout.field_or("ItemDisplayInfo", region.field, region.fallback_col);
        region_textures[i] = table.get_string(row, col).to_owned();
    }
    let mut geoset_groups = [0u32; 3];
    for (i, field) in ["GeosetGroup1", "GeosetGroup2", "GeosetGroup3"].iter().enumerate() {
        let col = layout.field_or("ItemDisplayInfo", field, 7 + i as u32);
        geoset_groups[i] = table.get_u32(row, col);
    }
    Some(DisplayInfo { region_textures, geoset_groups })
}

/// Base-skin or underwear texture paths from CharSections for this
/// race/gender/skin colour, in row order.
fn char_section_textures(
    assets: &AssetMgr,
    inputs: &AppearanceInputs,
    section: u32,
) -> Vec<String> {
    let Some(table) = assets.load_dbc("CharSections") else {
        return Vec::new();
    };
    let layout = assets.layout();
    let race_col = layout.field_or("CharSections", "Race", 1);
    let gender_col = layout.field_or("CharSections", "Gender", 2);
    let section_col = layout.field_or("CharSections", "Section", 3);
    let texture1_col = layout.field_or("CharSections", "Texture1", 4);
    let texture2_col = layout.field_or("CharSections", "Texture2", 5);
    let color_col = layout.field_or("CharSections", "Color", 9);

    let mut paths = Vec::new();
    for row in 0..table.record_count() {
        if table.get_u32(row, race_col) != inputs.race.id() as u32
            || table.get_u32(row, gender_col) != inputs.gender.wire_byte() as u32
            || table.get_u32(row, section_col) != section
            || table.get_u32(row, color_col) != inputs.appearance.skin as u32
        {
            continue;
        }
        for col in [texture1_col, texture2_col] {
            let texture = table.get_string(row, col);
            if !texture.is_empty() {
                paths.push(texture.to_owned());
            }
        }
    }
    paths
}

/// Region textures carry a gendered suffix; fall back to the universal
/// form when the gendered file is absent.
fn load_region_texture(
    assets: &AssetMgr,
    region: &Region,
    name: &str,
    gender: Gender,
) -> Option<std::rc::Rc<BlpImage>> {
    let base = format!("Item\\TextureComponents\\{}\\{}", region.component_dir, name);
    let gendered = format!("{}_{}.blp", base, gender.suffix());
    let universal = format!("{}_U.blp", base);
    assets
        .load_texture(&gendered)
        .or_else(|| assets.load_texture(&universal))
}

/// Nearest-neighbor blit of `image` into `rect` of the atlas, optionally
/// alpha-blended over what is already there.
fn blit(atlas: &mut [u8], image: &BlpImage, rect: (u32, u32, u32, u32), blend: bool) {
    let (rx, ry, rw, rh) = rect;
    let src = image.pixels();
    for y in 0..rh {
        for x in 0..rw {
            let sx = (x * image.width / rw).min(image.width - 1);
            let sy = (y * image.height / rh).min(image.height - 1);
            let s = ((sy * image.width + sx) * 4) as usize;
            let d = (((ry + y) * ATLAS_W + rx + x) * 4) as usize;
            let alpha = src[s + 3] as u32;
            if blend {
                if alpha == 0 {
                    continue;
                }
                for ch in 0..3 {
                    let over = src[s + ch] as u32;
                    let under = atlas[d + ch] as u32;
                    atlas[d + ch] = ((over * alpha + under * (255 - alpha)) / 255) as u8;
                }
                atlas[d + 3] = 0xFF;
            } else {
                atlas[d..d + 4].copy_from_slice(&src[s..s + 4]);
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use InventoryType::*;

    #[test]
    fn bare_character_gets_default_geosets() {
        let set = geoset_activation(&[], 3);
        assert!(set.contains(&401), "bare forearms");
        assert!(set.contains(&501), "bare shins");
        assert!(set.contains(&103), "hair style 3");
        assert!(!set.contains(&1));
    }

    #[test]
    fn robe_kilt_suppresses_pants() {
        let robe = (Robe, [1u32, 0, 2]);
        let pants = (Legs, [4u32, 0, 0]);
        let set = geoset_activation(&[robe, pants], 0);
        assert!(set.contains(&(801 + 1)));
        assert!(set.contains(&(1301 + 2)), "kilt from the robe's third group");
        assert!(!set.contains(&(1301 + 4)), "pants suppressed by the robe");
        // without the robe the pants show
        let set = geoset_activation(&[pants], 0);
        assert!(set.contains(&(1301 + 4)));
    }

    #[test]
    fn helmet_swaps_hair_for_scalp_cap() {
        let set = geoset_activation(&[(Head, [0, 0, 0])], 5);
        assert!(set.contains(&1));
        assert!(!set.contains(&105));
    }

    #[test]
    fn cloak_and_tabard_toggle_their_groups() {
        let set = geoset_activation(&[(Cloak, [2, 0, 0]), (Tabard, [0, 0, 0])], 0);
        assert!(set.contains(&(1501 + 2)));
        assert!(set.contains(&1201));
        let set = geoset_activation(&[], 0);
        assert!(!set.iter().any(|&g| (1500..1600).contains(&g)));
    }

    #[test]
    fn boots_and_gloves_use_their_first_group() {
        let set = geoset_activation(&[(Feet, [2, 0, 0]), (Hands, [3, 0, 0])], 0);
        assert!(set.contains(&503));
        assert!(set.contains(&404));
        assert!(!set.contains(&501));
        assert!(!set.contains(&401));
    }
}
