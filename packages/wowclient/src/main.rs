//! Headless shell entry point. The renderer, window, and input layers sit
//! outside this crate; what runs here is the frame loop that drives the
//! core and keeps the world model live.

use std::{
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};
use tracing::{error, info};
use wowclient::{
    character::{Class, Gender, Race},
    logging::init_logging,
    session::{SessionState, WorldSession},
    settings::{Settings, SETTINGS_FILE_NAME},
    shell::{Driver, Shell},
    sim::SinglePlayer,
    asset::AssetMgr,
};
use dbc::DbcLayout;


const FRAME: Duration = Duration::from_millis(16);

fn main() {
    init_logging();
    let settings = Settings::read(SETTINGS_FILE_NAME);

    let args = std::env::args().collect::<Vec<_>>();
    let args = args.iter().map(|s| s.as_str()).collect::<Vec<_>>();
    let shell = match &args[..] {
        &[_, "--data", data, "single", name, race, class] => {
            single_player(data, name, race, class, 0, settings)
        }
        &[_, "--data", data, "single", name, race, class, gender] => {
            let gender = gender.parse::<u8>().unwrap_or(0);
            single_player(data, name, race, class, gender, settings)
        }
        &[_, "--data", data, "connect", host, port, account, key_hex] => {
            connect(data, host, port, account, key_hex, settings)
        }
        _ => {
            error!(
                "usage: wowclient --data <dir> single <name> <race-id> <class-id> [gender] \
                 | --data <dir> connect <host> <port> <account> <session-key-hex>",
            );
            std::process::exit(2);
        }
    };
    let mut shell = match shell {
        Ok(shell) => shell,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    info!("entering frame loop");
    let mut last = Instant::now();
    loop {
        let dt = last.elapsed().as_secs_f32();
        last = Instant::now();
        shell.frame(dt);
        if let Some(session) = shell.session() {
            if matches!(
                session.state(),
                SessionState::Failed | SessionState::Disconnected,
            ) {
                info!("session over, shutting down");
                break;
            }
        }
        thread::sleep(FRAME);
    }
}

fn load_assets(data: &str) -> AssetMgr {
    let data_root = PathBuf::from(data);
    let overlay = data_root.join("patch");
    let overlay = overlay.exists().then_some(overlay);
    AssetMgr::new(&data_root, overlay.as_deref(), layout_for(&data_root))
}

/// The built-in 3.3.5a layout, overridden by a `dbc_layout.json` next to
/// the data when one is present.
fn layout_for(data_root: &Path) -> DbcLayout {
    let override_path = data_root.join("dbc_layout.json");
    match std::fs::read_to_string(&override_path) {
        Ok(doc) => match DbcLayout::from_json(&doc) {
            Ok(layout) => {
                info!(path = ?override_path, "using layout override");
                layout
            }
            Err(e) => {
                error!(%e, "bad layout override, using builtin");
                DbcLayout::wotlk()
            }
        },
        Err(_) => DbcLayout::wotlk(),
    }
}

fn single_player(
    data: &str,
    name: &str,
    race: &str,
    class: &str,
    gender: u8,
    settings: Settings,
) -> anyhow::Result<Shell> {
    let race = race
        .parse::<u8>()
        .ok()
        .and_then(Race::from_id)
        .ok_or_else(|| anyhow::anyhow!("unknown race id {:?}", race))?;
    let class = class
        .parse::<u8>()
        .ok()
        .and_then(Class::from_id)
        .ok_or_else(|| anyhow::anyhow!("unknown class id {:?}", class))?;
    let gender = Gender::from_byte(gender);
    let save_path = PathBuf::from("saves").join(format!("{}.sav", name.to_lowercase()));

    let sim = if save_path.exists() {
        info!(?save_path, "resuming saved character");
        SinglePlayer::load(save_path)?
    } else {
        SinglePlayer::create(name, race, class, gender, save_path)?
    };
    let mut shell = Shell::new(settings, load_assets(data), Driver::Single(sim));
    shell.enter_single_player_world();
    Ok(shell)
}

fn connect(
    data: &str,
    host: &str,
    port: &str,
    account: &str,
    key_hex: &str,
    settings: Settings,
) -> anyhow::Result<Shell> {
    let port = port.parse::<u16>()?;
    let session_key = parse_hex(key_hex)?;
    anyhow::ensure!(session_key.len() == 40, "session key must be 40 bytes");
    let session = WorldSession::new(account, &session_key);
    let mut shell = Shell::new(settings, load_assets(data), Driver::Session(session));
    shell.connect(host, port);
    Ok(shell)
}

fn parse_hex(hex: &str) -> anyhow::Result<Vec<u8>> {
    anyhow::ensure!(hex.len() % 2 == 0, "odd hex length");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).map_err(Into::into))
        .collect()
}
