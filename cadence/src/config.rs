use anyhow::{Context, Result};
use cadence_ipc::SOCKET_PATH;
use directories::ProjectDirs;
use ratatui::style::Color;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::session::SessionSettings;

/// Longest inter-phase pause we allow; anything more would read as a real pause.
const MAX_INTER_PHASE_DELAY_MS: u64 = 1000;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Single-timer duration used at startup.
    pub timer_minutes: u32,
    pub loop_enabled: bool,
    pub sound_enabled: bool,
    /// Minute values offered as single-timer presets.
    pub presets: Vec<u32>,
    /// Gap between the end-of-phase signal and the next phase's first second.
    pub inter_phase_delay_ms: u64,
    pub socket_path: PathBuf,
    pub theme: Theme,
    pub icons: Icons,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Theme {
    #[serde(deserialize_with = "hex_to_color")]
    pub background: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub foreground: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub selection: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub black: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub red: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub green: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub yellow: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub blue: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub magenta: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub cyan: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub gray: Color,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Icons {
    pub timer: String,
    pub cycle: String,
    pub history: String,
    pub play: String,
    pub pause: String,
    pub stop: String,
    pub done: String,
    pub select: String,
    pub on: String,
    pub off: String,
    pub input_cursor: String,
    pub separator: String,
    pub header_left: String,
    pub header_right: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timer_minutes: 25,
            loop_enabled: true,
            sound_enabled: true,
            presets: vec![5, 15, 25, 50],
            inter_phase_delay_ms: 100,
            socket_path: PathBuf::from(SOCKET_PATH),
            theme: Theme::default(),
            icons: Icons::default(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Rgb(9, 14, 19),
            foreground: Color::Rgb(197, 201, 199),
            selection: Color::Rgb(230, 195, 132),
            black: Color::Rgb(13, 12, 12),
            red: Color::Rgb(228, 104, 118),
            green: Color::Rgb(138, 154, 123),
            yellow: Color::Rgb(196, 178, 138),
            blue: Color::Rgb(127, 180, 202),
            magenta: Color::Rgb(162, 146, 163),
            cyan: Color::Rgb(122, 168, 159),
            gray: Color::Rgb(164, 167, 164),
        }
    }
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            timer: "Δ".to_string(),
            cycle: "↻".to_string(),
            history: "⬢".to_string(),
            play: "▶".to_string(),
            pause: "⏸".to_string(),
            stop: "■".to_string(),
            done: "☑".to_string(),
            select: "▸".to_string(),
            on: "●".to_string(),
            off: "○".to_string(),
            input_cursor: "▊".to_string(),
            separator: "│".to_string(),
            header_left: "⟪ ".to_string(),
            header_right: " ⟫".to_string(),
        }
    }
}

impl Config {
    pub fn inter_phase_delay(&self) -> Duration {
        Duration::from_millis(self.inter_phase_delay_ms.min(MAX_INTER_PHASE_DELAY_MS))
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            timer_secs: u64::from(self.timer_minutes.max(1)) * 60,
            loop_enabled: self.loop_enabled,
            sound_enabled: self.sound_enabled,
            inter_phase_delay: self.inter_phase_delay(),
        }
    }

    /// Presets with zero-minute entries removed.
    pub fn presets(&self) -> Vec<u32> {
        self.presets.iter().copied().filter(|&m| m > 0).collect()
    }
}

fn hex_to_color<'de, D>(deserializer: D) -> Result<Color, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = serde::Deserialize::deserialize(deserializer)?;
    if !s.starts_with('#') || s.len() != 7 {
        return Err(serde::de::Error::custom("invalid hex color format"));
    }
    let r = u8::from_str_radix(&s[1..3], 16).map_err(serde::de::Error::custom)?;
    let g = u8::from_str_radix(&s[3..5], 16).map_err(serde::de::Error::custom)?;
    let b = u8::from_str_radix(&s[5..7], 16).map_err(serde::de::Error::custom)?;
    Ok(Color::Rgb(r, g, b))
}

pub fn load_config() -> Result<Config> {
    match ProjectDirs::from("com", "cadence", "cadence") {
        Some(proj_dirs) => {
            let path = proj_dirs.config_dir().join("cadence.toml");
            if path.exists() {
                let config_str = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file at {:?}", path))?;
                toml::from_str(&config_str)
                    .with_context(|| format!("Failed to parse config file at {:?}", path))
            } else {
                Ok(Config::default())
            }
        }
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r##"
            timer_minutes = 45
            loop_enabled = false

            [theme]
            blue = "#102030"
            "##,
        )
        .unwrap();
        assert_eq!(config.timer_minutes, 45);
        assert!(!config.loop_enabled);
        assert!(config.sound_enabled);
        assert_eq!(config.presets, vec![5, 15, 25, 50]);
        assert_eq!(config.theme.blue, Color::Rgb(0x10, 0x20, 0x30));
        assert_eq!(config.theme.red, Theme::default().red);
    }

    #[test]
    fn bad_hex_color_is_rejected() {
        let parsed: Result<Config, _> = toml::from_str("[theme]\nred = \"red\"\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn delay_is_clamped_and_zero_minutes_raised() {
        let config = Config {
            timer_minutes: 0,
            inter_phase_delay_ms: 60_000,
            presets: vec![0, 10],
            ..Config::default()
        };
        let settings = config.session_settings();
        assert_eq!(settings.timer_secs, 60);
        assert_eq!(settings.inter_phase_delay, Duration::from_millis(1000));
        assert_eq!(config.presets(), vec![10]);
    }
}
