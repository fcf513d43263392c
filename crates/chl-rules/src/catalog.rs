//! Built-in challenge catalog.

use chl_core::Environment;

use crate::entry::{ChallengeEntry, GoalPredicate, SettingRange};

/// Blocks whose drops the block randomizer reassigns.
pub const BLOCKS: &[&str] = &[
    "stone",
    "dirt",
    "grass_block",
    "sand",
    "gravel",
    "oak_log",
    "birch_log",
    "coal_ore",
    "iron_ore",
    "gold_ore",
    "diamond_ore",
    "redstone_ore",
    "lapis_ore",
    "emerald_ore",
    "obsidian",
    "netherrack",
    "glowstone",
    "end_stone",
    "clay",
    "pumpkin",
];

/// Items handed out by the randomizers.
pub const ITEMS: &[&str] = &[
    "cobblestone",
    "dirt",
    "sand",
    "gravel",
    "flint",
    "oak_log",
    "stick",
    "coal",
    "raw_iron",
    "raw_gold",
    "diamond",
    "redstone",
    "lapis_lazuli",
    "emerald",
    "obsidian",
    "glowstone_dust",
    "clay_ball",
    "pumpkin",
    "apple",
    "bread",
    "ender_pearl",
    "blaze_rod",
    "string",
    "bone",
    "gunpowder",
];

/// Entities whose drops the entity randomizer reassigns.
pub const ENTITIES: &[&str] = &[
    "zombie",
    "skeleton",
    "creeper",
    "spider",
    "enderman",
    "blaze",
    "cow",
    "pig",
    "sheep",
    "chicken",
];

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn kill_goal(id: &str, name: &str, entity: &str, environment: Option<Environment>) -> ChallengeEntry {
    ChallengeEntry::goal(
        id,
        name,
        GoalPredicate::KillEntity {
            entity: entity.to_string(),
            environment,
        },
    )
}

/// The default set of challenges, all disabled.
pub fn default_catalog() -> Vec<ChallengeEntry> {
    vec![
        ChallengeEntry::randomizer(
            "block_randomizer",
            "Block Randomizer",
            owned(BLOCKS),
            owned(ITEMS),
        ),
        ChallengeEntry::randomizer(
            "entity_loot_randomizer",
            "Entity Loot Randomizer",
            owned(ENTITIES),
            owned(ITEMS),
        ),
        kill_goal(
            "kill_ender_dragon",
            "Kill the Ender Dragon",
            "ender_dragon",
            Some(Environment::End),
        ),
        kill_goal("kill_wither", "Kill the Wither", "wither", None),
        kill_goal(
            "kill_elder_guardian",
            "Kill an Elder Guardian",
            "elder_guardian",
            Some(Environment::Overworld),
        ),
        ChallengeEntry::goal(
            "collect_diamond",
            "Collect a Diamond",
            GoalPredicate::CollectItem {
                item: "diamond".to_string(),
            },
        ),
        ChallengeEntry::modifier("max_health", "Max Health", SettingRange::new(1, 40), 20)
            .with_unit("half hearts"),
        ChallengeEntry::modifier(
            "damage_multiplier",
            "Damage Multiplier",
            SettingRange::new(1, 10),
            1,
        )
        .with_unit("x"),
    ]
}
