use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Top-level configuration for the Banter engine.
///
/// Loaded from a TOML file by the embedding application. Each section
/// corresponds to one stage of the response pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BanterConfig {
    #[serde(default)]
    pub persona: PersonaConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub suggestions: SuggestionConfig,
    #[serde(default)]
    pub lexicon: LexiconConfig,
}

impl BanterConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BanterConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// The bot's presentation identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    /// Display name substituted for `{self}` and stripped from user input.
    pub bot_name: String,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            bot_name: "Banter".to_string(),
        }
    }
}

/// Fuzzy matching thresholds.
///
/// Scores run 0.0 (perfect) to 1.0 (no similarity). Candidates beyond the
/// loose threshold are discarded before scoring; the best survivor is
/// accepted only at or below the strict threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Acceptance cutoff for the best fuzzy candidate.
    pub strict_threshold: f64,
    /// Recall cutoff: candidates scoring above this are never considered.
    pub loose_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            strict_threshold: 0.2,
            loose_threshold: 0.5,
        }
    }
}

/// Suggestion engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    /// Maximum number of suggestions returned per turn.
    pub cap: usize,
    /// Turn count at which the farewell phase begins.
    pub farewell_after_turns: usize,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            cap: 32,
            farewell_after_turns: 5,
        }
    }
}

/// Designated action keys and fixed phrases the pipeline depends on.
///
/// The keys must match action keys in the loaded catalog; a key with no
/// catalog counterpart simply never fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// The identity-introduction action forced on the first turn.
    pub introduce_key: String,
    /// Greeting-category actions (suggestion phase: one turn in).
    pub greeting_keys: Vec<String>,
    /// Farewell-category actions; matching one ends the session.
    pub farewell_keys: Vec<String>,
    /// Action appended on a coin toss when no reaction was selected.
    pub offer_help_key: String,
    /// Reactions drawn at random for a confused non-question token.
    pub filler_keys: Vec<String>,
    /// Keys whose keywords are excluded from the noise suggestion pool.
    pub ignored_suggestion_keys: Vec<String>,
    /// Reply when the engine asks the user to teach it a missing fact.
    pub teach_prompt: String,
    /// Reply after a taught fact has been stored.
    pub learned_ack: String,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            introduce_key: "tell-name".to_string(),
            greeting_keys: vec!["say-hi".to_string(), "ask-name".to_string()],
            farewell_keys: vec!["say-bye".to_string(), "say-later".to_string()],
            offer_help_key: "ask-to-help".to_string(),
            filler_keys: vec![
                "say-im-confused".to_string(),
                "say-something-random".to_string(),
                "tell-a-joke".to_string(),
            ],
            ignored_suggestion_keys: vec![
                "say-hi".to_string(),
                "ask-name".to_string(),
                "tell-name".to_string(),
                "ask-to-help".to_string(),
                "tell-a-joke".to_string(),
            ],
            teach_prompt: "Can you tell me the answer? I'll remember that for you.".to_string(),
            learned_ack: "Got it. I'll remember that.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = BanterConfig::default();
        assert_eq!(config.persona.bot_name, "Banter");
        assert!((config.matcher.strict_threshold - 0.2).abs() < f64::EPSILON);
        assert!((config.matcher.loose_threshold - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.suggestions.cap, 32);
        assert_eq!(config.suggestions.farewell_after_turns, 5);
        assert_eq!(config.lexicon.introduce_key, "tell-name");
        assert_eq!(config.lexicon.greeting_keys, vec!["say-hi", "ask-name"]);
        assert_eq!(config.lexicon.farewell_keys, vec!["say-bye", "say-later"]);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[persona]
bot_name = "Smalltalk"

[matcher]
strict_threshold = 0.3
loose_threshold = 0.6

[suggestions]
cap = 16
farewell_after_turns = 8
"#;
        let file = create_temp_config(content);
        let config = BanterConfig::load(file.path()).unwrap();
        assert_eq!(config.persona.bot_name, "Smalltalk");
        assert!((config.matcher.strict_threshold - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.suggestions.cap, 16);
        assert_eq!(config.suggestions.farewell_after_turns, 8);
        // Untouched section keeps defaults
        assert_eq!(config.lexicon.introduce_key, "tell-name");
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[persona]
bot_name = "Chatter"
"#;
        let file = create_temp_config(content);
        let config = BanterConfig::load(file.path()).unwrap();
        assert_eq!(config.persona.bot_name, "Chatter");
        assert_eq!(config.suggestions.cap, 32);
        assert!((config.matcher.loose_threshold - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = BanterConfig::load_or_default(Path::new("/nonexistent/banter.toml"));
        assert_eq!(config.persona.bot_name, "Banter");
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        assert!(BanterConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banter.toml");

        let config = BanterConfig::default();
        config.save(&path).unwrap();

        let reloaded = BanterConfig::load(&path).unwrap();
        assert_eq!(reloaded.persona.bot_name, config.persona.bot_name);
        assert_eq!(reloaded.suggestions.cap, config.suggestions.cap);
        assert_eq!(reloaded.lexicon.filler_keys, config.lexicon.filler_keys);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("dir").join("banter.toml");

        BanterConfig::default().save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = BanterConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let deserialized: BanterConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized.persona.bot_name, config.persona.bot_name);
        assert_eq!(
            deserialized.lexicon.ignored_suggestion_keys,
            config.lexicon.ignored_suggestion_keys
        );
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = BanterConfig::load(file.path()).unwrap();
        assert_eq!(config.persona.bot_name, "Banter");
        assert_eq!(config.suggestions.cap, 32);
        assert_eq!(
            config.lexicon.teach_prompt,
            "Can you tell me the answer? I'll remember that for you."
        );
    }

    #[test]
    fn test_sub_config_defaults() {
        let persona = PersonaConfig::default();
        assert_eq!(persona.bot_name, "Banter");

        let matcher = MatcherConfig::default();
        assert!(matcher.strict_threshold < matcher.loose_threshold);

        let suggestions = SuggestionConfig::default();
        assert_eq!(suggestions.cap, 32);

        let lexicon = LexiconConfig::default();
        assert!(lexicon.filler_keys.contains(&"say-im-confused".to_string()));
        assert!(lexicon
            .ignored_suggestion_keys
            .contains(&lexicon.introduce_key));
    }
}
