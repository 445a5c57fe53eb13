
use std::{
    path::Path,
    fs::File,
    io::{
        BufReader,
        BufWriter,
    },
};
use serde::{Serialize, Deserialize};
use anyhow::*;


pub const SETTINGS_FILE_NAME: &'static str = "settings.json";


/// Game settings. A client-side global resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub fullscreen: bool,
    pub vsync: bool,
    pub shadows: bool,
    pub resolution_w: u32,
    pub resolution_h: u32,
    pub music_volume: f32,
    pub sfx_volume: f32,
    pub mouse_sensitivity: f32,
    pub invert_mouse: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            fullscreen: false,
            vsync: true,
            shadows: true,
            resolution_w: 1920,
            resolution_h: 1080,
            music_volume: 0.8,
            sfx_volume: 1.0,
            mouse_sensitivity: 0.5,
            invert_mouse: false,
        }
    }
}

impl Settings {
    pub fn read(path: impl AsRef<Path>) -> Self {
        Self::try_read(path).unwrap_or_default()
    }

    pub fn try_read(path: impl AsRef<Path>) -> Result<Self> {
        Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), self)?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_falls_back_to_default() {
        assert_eq!(Settings::read("/no/such/settings.json"), Settings::default());
    }
}
