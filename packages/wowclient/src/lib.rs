//! Asset and game-data core of a 3.3.5a-era MMO client: archives of binary
//! tables and textures plus a realm-server stream, turned into a consistent
//! queryable view of the player's world state.

#[macro_use]
extern crate tracing;

pub mod logging;
pub mod settings;
pub mod asset;
pub mod character;
pub mod entity;
pub mod item;
pub mod inventory;
pub mod action_bar;
pub mod auras;
pub mod group;
pub mod quest_log;
pub mod chat;
pub mod spell;
pub mod game_state;
pub mod events;
pub mod net;
pub mod update;
pub mod session;
pub mod appearance;
pub mod scheduler;
pub mod sim;
pub mod shell;
