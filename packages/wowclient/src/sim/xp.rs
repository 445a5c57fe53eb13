//! Experience math on the 3.3.5a curve. Everything here is pure.


/// Total XP needed to advance from `level` to the next.
pub fn xp_for_level(level: u32) -> u32 {
    let level = level.max(1);
    let mxp = 45 + 5 * level;
    let diff = match level {
        1..=27 => 0,
        28 => 1,
        29 => 3,
        30 => 6,
        31 => 9,
        32..=59 => (level - 30) * 5,
        _ => 160,
    };
    ((8 * level + diff) * mxp).max(1)
}

/// Highest victim level that still awards nothing ("gray") for a player
/// of this level.
pub fn gray_level(player_level: u32) -> u32 {
    match player_level {
        0..=5 => 0,
        6..=39 => player_level - player_level / 10 - 5,
        40..=59 => player_level - player_level / 5 - 1,
        _ => player_level.saturating_sub(9),
    }
}

/// Levels of difference before a lower-level victim's award hits zero.
fn zero_difference(player_level: u32) -> u32 {
    match player_level {
        0..=7 => 5,
        8..=9 => 6,
        10..=11 => 7,
        12..=15 => 8,
        16..=19 => 9,
        20..=29 => 11,
        30..=39 => 12,
        40..=44 => 13,
        45..=49 => 14,
        50..=54 => 15,
        55..=59 => 16,
        _ => 17,
    }
}

/// XP awarded for killing a victim of the given level. Zero for victims at
/// or below the gray threshold. Pure: identical inputs, identical award.
pub fn kill_xp(player_level: u32, victim_level: u32) -> u32 {
    let player_level = player_level.max(1);
    if victim_level <= gray_level(player_level) {
        return 0;
    }
    let base = player_level * 5 + 45;
    if victim_level >= player_level {
        let bonus = (victim_level - player_level).min(4);
        base * (20 + bonus) / 20
    } else {
        let diff = player_level - victim_level;
        let zd = zero_difference(player_level);
        if diff >= zd {
            return 0;
        }
        base * (zd - diff) / zd
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_level_always_awards() {
        assert!(kill_xp(60, 60) > 0);
        assert!(kill_xp(1, 1) > 0);
        assert!(kill_xp(30, 30) > 0);
    }

    #[test]
    fn gray_victims_award_nothing() {
        assert_eq!(kill_xp(60, 30), 0);
        assert_eq!(kill_xp(60, gray_level(60)), 0);
        assert!(kill_xp(60, gray_level(60) + 1) > 0);
    }

    #[test]
    fn award_is_pure() {
        for (p, v) in [(10, 12), (40, 38), (60, 60)] {
            assert_eq!(kill_xp(p, v), kill_xp(p, v));
        }
    }

    #[test]
    fn higher_victims_award_more() {
        assert!(kill_xp(20, 22) > kill_xp(20, 20));
        assert!(kill_xp(20, 20) > kill_xp(20, 16));
    }

    #[test]
    fn level_curve_is_monotone() {
        let mut last = 0;
        for level in 1..=79 {
            let xp = xp_for_level(level);
            assert!(xp > last, "xp_for_level({}) = {} not > {}", level, xp, last);
            last = xp;
        }
    }

    #[test]
    fn level_one_values() {
        assert_eq!(xp_for_level(1), 400);
        assert_eq!(kill_xp(1, 1), 50);
    }
}
