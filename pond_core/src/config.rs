//! Tunables for the pond.
//!
//! Loaded from a JSON file (every field optional) with an environment
//! override, falling back to the built-in defaults which reproduce the
//! installation as it was exhibited.

use std::{
    collections::HashSet,
    env, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::creature::{CreatureClass, Direction};

/// Environment variable naming a config file to load instead of the defaults.
pub const CONFIG_ENV_VAR: &str = "KOI_POND_CONFIG";

/// Reference copy of the defaults, shipped next to the crate.
pub const EXAMPLE_CONFIG: &str = include_str!("../data/pond_config.json");

// ════════════════════════════════════════════════════════════════════════════
// PondConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PondConfig {
    pub max_creatures:        usize,
    /// Gestures must score strictly above this to spawn anything.
    pub confidence_threshold: f32,
    pub cooldowns:            CooldownConfig,
    pub pulse_interval_ms:    u64,
    pub ambient:              AmbientConfig,
    pub scale:                ScaleConfig,
    pub variants:             VariantConfig,
    pub gestures:             Vec<GestureBinding>,
    pub reel:                 ReelConfig,
}

impl Default for PondConfig {
    fn default() -> Self {
        PondConfig {
            max_creatures:        25,
            confidence_threshold: 0.4,
            cooldowns:            CooldownConfig::default(),
            pulse_interval_ms:    2_000,
            ambient:              AmbientConfig::default(),
            scale:                ScaleConfig::default(),
            variants:             VariantConfig::default(),
            gestures:             default_gestures(),
            reel:                 ReelConfig::default(),
        }
    }
}

/// Minimum spacing between successful spawns of one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    pub fish_ms:   u64,
    pub swarm_ms:  u64,
    pub skater_ms: u64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        CooldownConfig { fish_ms: 2_000, swarm_ms: 7_000, skater_ms: 5_000 }
    }
}

impl CooldownConfig {
    pub fn threshold(&self, class: CreatureClass) -> Duration {
        Duration::from_millis(match class {
            CreatureClass::Fish   => self.fish_ms,
            CreatureClass::Swarm  => self.swarm_ms,
            CreatureClass::Skater => self.skater_ms,
        })
    }
}

/// The background timer that occasionally releases a skater.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    pub period_ms:     u64,
    pub skater_chance: f64,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        AmbientConfig { period_ms: 6_000, skater_chance: 0.5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Global scale applied to every element on the canvas.
    pub base:       f32,
    pub lilypad:    f32,
    pub fish:       f32,
    pub swarm:      f32,
    pub skater:     f32,
    pub jitter_min: f32,
    pub jitter_max: f32,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        ScaleConfig {
            base:       0.25,
            lilypad:    1.6,
            fish:       1.0,
            swarm:      1.8,
            skater:     1.2,
            jitter_min: 0.7,
            jitter_max: 1.3,
        }
    }
}

impl ScaleConfig {
    pub fn creature(&self, class: CreatureClass) -> f32 {
        self.base * match class {
            CreatureClass::Fish   => self.fish,
            CreatureClass::Swarm  => self.swarm,
            CreatureClass::Skater => self.skater,
        }
    }

    pub fn lilypad_base(&self) -> f32 { self.base * self.lilypad }
}

/// How many visual and sound variants each class draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantConfig {
    pub fish_skins:    u8,
    pub fish_sounds:   u8,
    pub swarm_sounds:  u8,
    pub skater_sounds: u8,
}

impl Default for VariantConfig {
    fn default() -> Self {
        VariantConfig { fish_skins: 3, fish_sounds: 8, swarm_sounds: 4, skater_sounds: 8 }
    }
}

impl VariantConfig {
    pub fn skins(&self, class: CreatureClass) -> u8 {
        match class {
            CreatureClass::Fish => self.fish_skins,
            _                   => 1,
        }
    }

    pub fn sounds(&self, class: CreatureClass) -> u8 {
        match class {
            CreatureClass::Fish   => self.fish_sounds,
            CreatureClass::Swarm  => self.swarm_sounds,
            CreatureClass::Skater => self.skater_sounds,
        }
    }
}

/// One row of the gesture-name table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureBinding {
    pub name:      String,
    pub class:     CreatureClass,
    #[serde(default)]
    pub direction: Option<Direction>,
}

impl GestureBinding {
    pub fn new(name: &str, class: CreatureClass, direction: Option<Direction>) -> Self {
        GestureBinding { name: name.to_string(), class, direction }
    }
}

fn default_gestures() -> Vec<GestureBinding> {
    use CreatureClass::*;
    use Direction::*;
    vec![
        GestureBinding::new("PushOut",            Swarm, None),
        GestureBinding::new("WaveInwards_Left",   Fish,  Some(Right)),
        GestureBinding::new("WaveInwards_Right",  Fish,  Some(Left)),
        GestureBinding::new("WaveOutwards_Left",  Fish,  Some(Left)),
        GestureBinding::new("WaveOutwards_Right", Fish,  Some(Right)),
    ]
}

/// Media lengths used by the simulated show driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelConfig {
    pub intro_ms:       u64,
    pub interactive_ms: u64,
    pub credits_ms:     u64,
}

impl Default for ReelConfig {
    fn default() -> Self {
        ReelConfig { intro_ms: 20_000, interactive_ms: 180_000, credits_ms: 30_000 }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Errors / loading
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse pond config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read pond config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid pond config: {0}")]
    Invalid(String),
    #[error("duplicate gesture binding `{0}`")]
    DuplicateGesture(String),
}

impl PondConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: PondConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        PondConfig::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "confidence_threshold {} outside [0, 1]", self.confidence_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.ambient.skater_chance) {
            return Err(ConfigError::Invalid(format!(
                "ambient.skater_chance {} outside [0, 1]", self.ambient.skater_chance
            )));
        }
        if self.ambient.period_ms == 0 {
            return Err(ConfigError::Invalid("ambient.period_ms must be positive".into()));
        }
        let s = &self.scale;
        let factors = [
            ("base", s.base), ("lilypad", s.lilypad), ("fish", s.fish),
            ("swarm", s.swarm), ("skater", s.skater),
        ];
        for (name, value) in factors {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("scale.{name} {value} must be finite and positive")));
            }
        }
        if !(s.jitter_min > 0.0 && s.jitter_max.is_finite() && s.jitter_min < s.jitter_max) {
            return Err(ConfigError::Invalid(format!(
                "scale jitter range [{}, {}) is empty or non-positive", s.jitter_min, s.jitter_max
            )));
        }
        let v = &self.variants;
        if v.fish_skins == 0 || v.fish_sounds == 0 || v.swarm_sounds == 0 || v.skater_sounds == 0 {
            return Err(ConfigError::Invalid("every variant count must be at least 1".into()));
        }
        let mut seen = HashSet::new();
        for g in &self.gestures {
            if !seen.insert(g.name.as_str()) {
                return Err(ConfigError::DuplicateGesture(g.name.clone()));
            }
        }
        Ok(())
    }

    pub fn pulse_interval(&self) -> Duration { Duration::from_millis(self.pulse_interval_ms) }

    pub fn ambient_period(&self) -> Duration { Duration::from_millis(self.ambient.period_ms) }
}

/// Load the config named by [`CONFIG_ENV_VAR`], or an explicit path, or the
/// defaults.  A file that fails to load is reported and skipped.
pub fn load_config(explicit: Option<&Path>) -> PondConfig {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from));

    if let Some(path) = path {
        match PondConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "koi_pond::config",
                    path = %path.display(),
                    "pond_config.loaded=file"
                );
                return config;
            }
            Err(err) => {
                tracing::warn!(
                    target: "koi_pond::config",
                    path = %path.display(),
                    error = %err,
                    "pond_config.load_failed"
                );
            }
        }
    }

    tracing::info!(target: "koi_pond::config", "pond_config.loaded=builtin");
    PondConfig::default()
}

pub fn load_config_from_env() -> PondConfig { load_config(None) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_file_matches_defaults() {
        let parsed = PondConfig::from_json_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(parsed, PondConfig::default());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = PondConfig::from_json_str(r#"{ "max_creatures": 5, "cooldowns": { "fish_ms": 100 } }"#)
            .unwrap();
        assert_eq!(cfg.max_creatures, 5);
        assert_eq!(cfg.cooldowns.fish_ms, 100);
        assert_eq!(cfg.cooldowns.swarm_ms, 7_000);
        assert_eq!(cfg.gestures.len(), 5);
    }

    #[test]
    fn class_scales() {
        let s = ScaleConfig::default();
        assert!((s.creature(CreatureClass::Swarm) - 0.45).abs() < 1e-6);
        assert!((s.creature(CreatureClass::Skater) - 0.3).abs() < 1e-6);
        assert!((s.lilypad_base() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn rejects_duplicate_gesture() {
        let json = r#"{ "gestures": [
            { "name": "PushOut", "class": "Swarm" },
            { "name": "PushOut", "class": "Fish", "direction": "Left" }
        ] }"#;
        assert!(matches!(PondConfig::from_json_str(json), Err(ConfigError::DuplicateGesture(n)) if n == "PushOut"));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        assert!(matches!(
            PondConfig::from_json_str(r#"{ "confidence_threshold": 1.5 }"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_empty_jitter() {
        assert!(matches!(
            PondConfig::from_json_str(r#"{ "scale": { "jitter_min": 1.0, "jitter_max": 1.0 } }"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_non_finite_jitter() {
        // 1e39 overflows f32 and parses as infinity.
        assert!(matches!(
            PondConfig::from_json_str(r#"{ "scale": { "jitter_max": 1e39 } }"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_bad_scale_factors() {
        for json in [
            r#"{ "scale": { "base": 0.0 } }"#,
            r#"{ "scale": { "swarm": -1.0 } }"#,
            r#"{ "scale": { "skater": 1e39 } }"#,
        ] {
            assert!(matches!(PondConfig::from_json_str(json), Err(ConfigError::Invalid(_))), "{json}");
        }
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = PondConfig::from_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn env_var_names_the_config_file() {
        let path = env::temp_dir().join(format!("koi_pond_config_{}.json", std::process::id()));
        fs::write(&path, r#"{ "max_creatures": 7, "ambient": { "skater_chance": 0.25 } }"#).unwrap();
        // The only test in this crate that reads the variable.
        env::set_var(CONFIG_ENV_VAR, &path);
        let cfg = load_config_from_env();
        env::remove_var(CONFIG_ENV_VAR);
        let _ = fs::remove_file(&path);

        assert_eq!(cfg.max_creatures, 7);
        assert_eq!(cfg.ambient.skater_chance, 0.25);
        assert_eq!(cfg.cooldowns, CooldownConfig::default());
    }

    #[test]
    fn bad_explicit_path_falls_back_to_defaults() {
        let cfg = load_config(Some(Path::new("/definitely/not/here.json")));
        assert_eq!(cfg, PondConfig::default());
    }
}
