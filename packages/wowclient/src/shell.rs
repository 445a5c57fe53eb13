//! The application shell: owns every top-level object, forwards UI
//! intents to whichever driver is active, and keeps the side tables
//! (spawn queues, taxi and mount state, faction hostility, model paths,
//! spawn-time appearance) that glue the core to the renderer.

use crate::{
    appearance::{self, AppearanceInputs, CompositeAppearance},
    asset::AssetMgr,
    entity::Guid,
    events::{GameEvent, GameEvents},
    game_state::GameState,
    scheduler::Scheduler,
    session::WorldSession,
    settings::Settings,
    sim::SinglePlayer,
};
use std::collections::{HashMap, VecDeque};
use vek::*;


/// At most this many queued spawns resolve per frame.
const SPAWN_BUDGET_PER_FRAME: usize = 96;
/// A spawn that cannot resolve its model after this many frames is
/// dropped.
const SPAWN_RETRY_LIMIT: u32 = 300;
/// Seconds after a taxi flight before the next can begin.
const TAXI_COOLDOWN: f32 = 2.0;
/// Deferred mount model load delay, standing in for async model IO.
const MOUNT_LOAD_DELAY: f32 = 0.25;

#[derive(Debug, Copy, Clone)]
enum ShellTask {
    TaxiCooldownEnd,
    MountLoad(u32),
}

#[derive(Debug)]
struct PendingSpawn {
    guid: Guid,
    retries: u32,
}

#[derive(Debug, Default)]
struct TaxiState {
    in_flight: bool,
    cooling_down: bool,
    destination_node: u32,
}

#[derive(Debug, Default)]
struct MountState {
    pending_display: Option<u32>,
    current_display: Option<u32>,
}

/// Which event source is driving the model this run.
pub enum Driver {
    Session(WorldSession),
    Single(SinglePlayer),
}

pub struct Shell {
    pub settings: Settings,
    assets: AssetMgr,
    pub state: GameState,
    events: GameEvents,
    driver: Driver,
    scheduler: Scheduler<ShellTask>,
    pending_spawns: VecDeque<PendingSpawn>,
    /// Faction template id -> hostile to the player.
    hostility: HashMap<u32, bool>,
    /// Creature display id -> model path.
    display_models: HashMap<u32, String>,
    taxi: TaxiState,
    mount: MountState,
    /// Appearance inputs captured at spawn, kept so an equipment change
    /// can re-composite without re-deriving everything.
    spawn_appearance: HashMap<Guid, AppearanceInputs>,
    /// Latest composites, keyed by guid; the renderer swaps these in.
    composites: HashMap<Guid, CompositeAppearance>,
}

impl Shell {
    pub fn new(settings: Settings, assets: AssetMgr, driver: Driver) -> Self {
        Shell {
            settings,
            assets,
            state: GameState::new(),
            events: GameEvents::new(),
            driver,
            scheduler: Scheduler::new(),
            pending_spawns: VecDeque::new(),
            hostility: HashMap::new(),
            display_models: HashMap::new(),
            taxi: TaxiState::default(),
            mount: MountState::default(),
            spawn_appearance: HashMap::new(),
            composites: HashMap::new(),
        }
    }

    pub fn assets(&self) -> &AssetMgr {
        &self.assets
    }

    pub fn session(&self) -> Option<&WorldSession> {
        match &self.driver {
            Driver::Session(session) => Some(session),
            Driver::Single(_) => None,
        }
    }

    /// One frame: drive the active event source, absorb its events, work
    /// the deferred queues. Returns the frame's events for the UI layer.
    pub fn frame(&mut self, dt: f32) -> Vec<GameEvent> {
        match &mut self.driver {
            Driver::Session(session) => {
                self.state.game_time += dt as f64;
                session.update(dt, &mut self.state, &mut self.events);
                self.state.action_bar.tick(dt);
            }
            Driver::Single(sim) => sim.update(dt, &mut self.state, &mut self.events),
        }

        let mut frame_events = Vec::new();
        while let Some(event) = self.events.pop() {
            self.absorb(&event);
            frame_events.push(event);
        }

        self.process_spawn_queue();
        self.recomposite_dirty();
        for task in self.scheduler.tick(dt) {
            match task {
                ShellTask::TaxiCooldownEnd => self.taxi.cooling_down = false,
                ShellTask::MountLoad(display_id) => self.finish_mount_load(display_id),
            }
        }
        frame_events
    }

    /// Shell-side bookkeeping per event, before the UI sees it.
    fn absorb(&mut self, event: &GameEvent) {
        match event {
            GameEvent::WorldEntered { .. } => {
                self.load_login_tables();
            }
            GameEvent::EntityCreated(guid) => {
                self.pending_spawns.push_back(PendingSpawn { guid: *guid, retries: 0 });
                self.capture_spawn_appearance(*guid);
            }
            GameEvent::EntityDestroyed(guid) => {
                self.spawn_appearance.remove(guid);
                self.composites.remove(guid);
            }
            GameEvent::SessionFailed { reason } => {
                warn!(%reason, "driver failed, clearing world state");
                self.state.reset();
                self.pending_spawns.clear();
            }
            _ => {}
        }
    }

    /// Snapshot what the compositor will need later. For the local player
    /// this comes from the inventory; for other players, from their
    /// published equipment display ids.
    fn capture_spawn_appearance(&mut self, guid: Guid) {
        let Some(entity) = self.state.entities.get(guid) else { return };
        let Some(player) = entity.player() else { return };
        let (Some(race), Some(_)) = (player.race, player.class) else { return };
        let inputs = if guid == self.state.player_guid {
            AppearanceInputs::from_inventory(
                race,
                player.gender,
                player.appearance,
                &self.state.inventory,
            )
        } else {
            AppearanceInputs {
                race,
                gender: player.gender,
                appearance: player.appearance,
                equipment: Vec::new(),
            }
        };
        self.spawn_appearance.insert(guid, inputs);
    }

    /// Pay out the per-frame spawn budget. A spawn resolves when its
    /// model path is known; unresolvable spawns retry up to the limit.
    fn process_spawn_queue(&mut self) {
        let mut budget = SPAWN_BUDGET_PER_FRAME;
        let mut requeue = VecDeque::new();
        while budget > 0 {
            let Some(mut spawn) = self.pending_spawns.pop_front() else { break };
            budget -= 1;
            let Some(entity) = self.state.entities.get(spawn.guid) else {
                // despawned while queued
                continue;
            };
            let display_id = entity.unit().map(|u| u.display_id).unwrap_or(0);
            if display_id == 0 || self.resolve_display_model(display_id).is_some() {
                continue;
            }
            spawn.retries += 1;
            if spawn.retries >= SPAWN_RETRY_LIMIT {
                warn!(guid = spawn.guid, display_id, "spawn dropped after retry limit");
                continue;
            }
            requeue.push_back(spawn);
        }
        self.pending_spawns.append(&mut requeue);
    }

    /// Creature display id -> model path, cached through
    /// CreatureDisplayInfo and CreatureModelData.
    fn resolve_display_model(&mut self, display_id: u32) -> Option<String> {
        if let Some(path) = self.display_models.get(&display_id) {
            return Some(path.clone());
        }
        let layout_model_id;
        let model_path;
        {
            let display = self.assets.load_dbc("CreatureDisplayInfo")?;
            let layout = self.assets.layout();
            let row = display.find_record_by_id(display_id)?;
            layout_model_id =
                display.get_u32(row, layout.field_or("CreatureDisplayInfo", "ModelId", 1));
            let models = self.assets.load_dbc("CreatureModelData")?;
            let model_row = models.find_record_by_id(layout_model_id)?;
            model_path = models
                .get_string(model_row, layout.field_or("CreatureModelData", "ModelPath", 2))
                .to_owned();
        }
        if model_path.is_empty() {
            return None;
        }
        self.display_models.insert(display_id, model_path.clone());
        Some(model_path)
    }

    /// Re-run the compositor for every guid whose equipment dirtied this
    /// frame.
    fn recomposite_dirty(&mut self) {
        for guid in self.state.take_equipment_dirty() {
            // keep the captured inputs current
            if guid == self.state.player_guid {
                self.capture_spawn_appearance(guid);
            } else if let Some(inputs) = self.spawn_appearance.get_mut(&guid) {
                if let Some(player) = self.state.entities.get(guid).and_then(|e| e.player()) {
                    inputs.appearance = player.appearance;
                }
            }
            let Some(inputs) = self.spawn_appearance.get(&guid) else { continue };
            let composite = appearance::compose(&self.assets, inputs);
            debug!(guid, geosets = composite.geosets.len(), "recomposited skin");
            self.composites.insert(guid, composite);
        }
    }

    pub fn composite_for(&self, guid: Guid) -> Option<&CompositeAppearance> {
        self.composites.get(&guid)
    }

    /// Hostility and model tables loaded once the world is entered.
    fn load_login_tables(&mut self) {
        self.hostility.clear();
        if let Some(table) = self.assets.load_dbc("FactionTemplate") {
            let layout = self.assets.layout();
            let id_col = layout.field_or("FactionTemplate", "Id", 0);
            let enemy_group_col = layout.field_or("FactionTemplate", "EnemyGroup", 5);
            for row in 0..table.record_count() {
                let id = table.get_u32(row, id_col);
                // mask bit 1 is the player group
                let hostile = table.get_u32(row, enemy_group_col) & 0x1 != 0;
                self.hostility.insert(id, hostile);
            }
            info!(entries = self.hostility.len(), "faction hostility table loaded");
        }
        // the simulator's factions are not in any table
        self.hostility.entry(16).or_insert(true);
        self.hostility.entry(35).or_insert(false);
    }

    pub fn is_hostile(&self, guid: Guid) -> bool {
        self.state.entities.is_hostile(guid, &self.hostility)
    }

    // --- taxi and mount bookkeeping ---

    pub fn begin_taxi(&mut self, destination_node: u32) -> bool {
        if self.taxi.in_flight || self.taxi.cooling_down {
            return false;
        }
        self.taxi.in_flight = true;
        self.taxi.destination_node = destination_node;
        true
    }

    pub fn end_taxi(&mut self) {
        if self.taxi.in_flight {
            self.taxi.in_flight = false;
            self.taxi.cooling_down = true;
            self.scheduler.schedule(TAXI_COOLDOWN, ShellTask::TaxiCooldownEnd);
        }
    }

    pub fn taxi_in_flight(&self) -> bool {
        self.taxi.in_flight
    }

    /// Mounting defers until the model is ready; the pending id survives
    /// re-requests in between.
    pub fn request_mount(&mut self, display_id: u32) {
        if self.mount.current_display == Some(display_id) {
            return;
        }
        self.mount.pending_display = Some(display_id);
        self.scheduler.schedule(MOUNT_LOAD_DELAY, ShellTask::MountLoad(display_id));
    }

    pub fn dismount(&mut self) {
        self.mount.pending_display = None;
        self.mount.current_display = None;
        let guid = self.state.player_guid;
        if let Some(unit) = self.state.entities.get_mut(guid).and_then(|e| e.unit_mut()) {
            unit.mount_display_id = 0;
        }
    }

    fn finish_mount_load(&mut self, display_id: u32) {
        if self.mount.pending_display != Some(display_id) {
            // superseded or cancelled while loading
            return;
        }
        self.mount.pending_display = None;
        self.mount.current_display = Some(display_id);
        let guid = self.state.player_guid;
        if let Some(unit) = self.state.entities.get_mut(guid).and_then(|e| e.unit_mut()) {
            unit.mount_display_id = display_id;
        }
    }

    // --- intent forwarding ---

    pub fn connect(&mut self, host: &str, port: u16) {
        if let Driver::Session(session) = &mut self.driver {
            session.connect(host, port, &mut self.events);
        }
    }

    pub fn disconnect(&mut self) {
        if let Driver::Session(session) = &mut self.driver {
            session.disconnect(&mut self.events);
        }
    }

    pub fn enter_single_player_world(&mut self) {
        if let Driver::Single(sim) = &mut self.driver {
            sim.enter_world(&mut self.state, &mut self.events, Some(&self.assets));
        }
    }

    pub fn request_char_list(&mut self) {
        if let Driver::Session(session) = &mut self.driver {
            session.request_char_list(&mut self.events);
        }
    }

    pub fn player_login(&mut self, guid: Guid) {
        if let Driver::Session(session) = &mut self.driver {
            session.player_login(guid, &mut self.events);
        }
    }

    pub fn set_selection(&mut self, guid: Guid) {
        match &mut self.driver {
            Driver::Session(session) => {
                self.state.target = guid;
                self.state.auras.clear_all_target();
                session.set_selection(guid);
            }
            Driver::Single(sim) => sim.set_selection(guid, &mut self.state),
        }
    }

    pub fn attack(&mut self, guid: Guid) {
        match &mut self.driver {
            Driver::Session(session) => {
                session.set_selection(guid);
                session.attack_swing(guid);
            }
            Driver::Single(sim) => sim.attack(guid, &mut self.state, &mut self.events),
        }
    }

    pub fn loot(&mut self, guid: Guid) {
        match &mut self.driver {
            Driver::Session(session) => session.loot(guid),
            Driver::Single(sim) => sim.loot(guid, &mut self.events),
        }
    }

    pub fn loot_item(&mut self, slot: u8) {
        match &mut self.driver {
            Driver::Session(session) => session.loot_item(slot),
            Driver::Single(sim) => sim.loot_item(slot, &mut self.state, &mut self.events),
        }
    }

    pub fn loot_release(&mut self, source: Guid) {
        match &mut self.driver {
            Driver::Session(session) => session.loot_release(source),
            Driver::Single(sim) => sim.loot_release(&mut self.events),
        }
    }

    pub fn gossip_hello(&mut self, guid: Guid) {
        match &mut self.driver {
            Driver::Session(session) => session.gossip_hello(guid),
            Driver::Single(sim) => sim.gossip_hello(guid, &self.state, &mut self.events),
        }
    }

    pub fn accept_quest(&mut self, giver: Guid, quest_id: u32) {
        match &mut self.driver {
            Driver::Session(session) => session.quest_accept(giver, quest_id),
            Driver::Single(sim) => sim.accept_quest(quest_id, &mut self.state),
        }
    }

    pub fn complete_quest(&mut self, giver: Guid, quest_id: u32) {
        match &mut self.driver {
            Driver::Session(session) => session.quest_choose_reward(giver, quest_id, 0),
            Driver::Single(sim) => {
                sim.complete_quest(quest_id, &mut self.state, &mut self.events)
            }
        }
    }

    pub fn send_chat(&mut self, text: &str) {
        match &mut self.driver {
            Driver::Session(session) => session.send_chat(1, 0, "", text),
            Driver::Single(_) => {
                let name = self
                    .state
                    .name_cache
                    .get(&self.state.player_guid)
                    .cloned()
                    .unwrap_or_default();
                self.state.chat.push(crate::chat::ChatMessage {
                    chat_type: crate::chat::ChatType::Say,
                    language: crate::chat::Language::Universal,
                    sender_guid: self.state.player_guid,
                    sender_name: name,
                    target: String::new(),
                    text: text.to_owned(),
                });
            }
        }
    }

    pub fn move_player(&mut self, pos: Vec3<f32>, yaw: f32) {
        match &mut self.driver {
            Driver::Session(_) => {
                // the heartbeat inside the session picks the change up
                let guid = self.state.player_guid;
                if let Some(entity) = self.state.entities.get_mut(guid) {
                    entity.pos = pos;
                    entity.yaw = yaw;
                }
            }
            Driver::Single(sim) => sim.move_player(pos, yaw, &mut self.state),
        }
    }

    pub fn use_action(&mut self, index: usize) {
        match &mut self.driver {
            Driver::Session(session) => {
                if let crate::action_bar::Action::Spell(spell_id) =
                    self.state.action_bar.get(index)
                {
                    if self.state.action_bar.is_ready(index) {
                        session.cast_spell(spell_id, self.state.target);
                    }
                }
            }
            Driver::Single(sim) => sim.use_action(index, &mut self.state),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{Class, Gender, Race};
    use dbc::DbcLayout;

    fn single_player_shell() -> Shell {
        let assets = AssetMgr::new(
            std::path::Path::new("/nonexistent-data"),
            None,
            DbcLayout::wotlk(),
        );
        let save = std::env::temp_dir().join(format!(
            "wowclient-shell-test-{}-{}.sav",
            std::process::id(),
            rand::random::<u32>(),
        ));
        let sim = SinglePlayer::create("Aldra", Race::Orc, Class::Warrior, Gender::Male, save)
            .unwrap();
        let mut shell = Shell::new(Settings::default(), assets, Driver::Single(sim));
        shell.enter_single_player_world();
        shell
    }

    #[test]
    fn frame_surfaces_world_entry() {
        let mut shell = single_player_shell();
        let events = shell.frame(0.016);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::WorldEntered { .. })));
        // the simulator factions resolved through the injected table
        assert!(shell.is_hostile(crate::sim::PLAYER_GUID + 99));
    }

    #[test]
    fn taxi_cooldown_blocks_back_to_back_flights() {
        let mut shell = single_player_shell();
        shell.frame(0.016);
        assert!(shell.begin_taxi(3));
        shell.end_taxi();
        assert!(!shell.begin_taxi(4), "cooling down");
        // wait out the cooldown
        for _ in 0..40 {
            shell.frame(0.1);
        }
        assert!(shell.begin_taxi(4));
    }

    #[test]
    fn mount_defers_until_loaded() {
        let mut shell = single_player_shell();
        shell.frame(0.016);
        shell.request_mount(14632);
        let guid = shell.state.player_guid;
        let mounted = |shell: &Shell| {
            shell
                .state
                .entities
                .get(guid)
                .and_then(|e| e.unit())
                .map(|u| u.mount_display_id)
                .unwrap_or(0)
        };
        assert_eq!(mounted(&shell), 0, "not yet loaded");
        for _ in 0..10 {
            shell.frame(0.1);
        }
        assert_eq!(mounted(&shell), 14632);
        shell.dismount();
        assert_eq!(mounted(&shell), 0);
    }

    #[test]
    fn combat_through_the_shell_kills_and_loots() {
        let mut shell = single_player_shell();
        shell.frame(0.016);
        let boar = 100;
        shell.attack(boar);
        let mut saw_death = false;
        for _ in 0..60 {
            for event in shell.frame(0.5) {
                if matches!(event, GameEvent::UnitDied(guid) if guid == boar) {
                    saw_death = true;
                }
            }
            if saw_death {
                break;
            }
        }
        assert!(saw_death, "sustained attack kills the boar");
        shell.loot(boar);
        let events = shell.frame(0.016);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::LootOpened(_))));
    }
}
