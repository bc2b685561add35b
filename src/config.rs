use clap::Parser;
use log::warn;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Config file consulted before the environment, relative to the working directory.
pub const CONFIG_FILE: &str = "config.json";

/// Environment variable consulted when the config file yields no key.
pub const KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// Sentinel value shipped in the sample config file; treated as no key at all.
pub const PLACEHOLDER_KEY: &str = "YOUR_GEMINI_API_KEY_HERE";

#[derive(Debug, Parser)]
#[clap(
    name = "gemini-ask",
    version = "0.1.0",
    about = "Asks Google's Gemini a single question from the command line and prints the answer."
)]
pub struct Config {
    #[clap(
        value_name = "PROMPT",
        help = "The question to ask; multiple words are joined into one prompt"
    )]
    pub prompt_words: Vec<String>,

    #[clap(short, long, help = "Enable debug logging on stderr")]
    pub verbose: bool,
}

impl Config {
    pub fn from_cli() -> Self {
        Config::parse()
    }

    /// Joins the positional arguments with single spaces into the prompt string.
    pub fn prompt(&self) -> String {
        self.prompt_words.join(" ")
    }
}

/// The shape of `config.json`. Extra fields are ignored.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    api_key: Option<String>,
}

fn is_usable(key: &str) -> bool {
    !key.is_empty() && key != PLACEHOLDER_KEY
}

/// Pulls the API key out of the config file at `path`, if the file exists,
/// parses, and carries a real key rather than the placeholder.
///
/// A missing file is the normal case and stays silent; a file that is present
/// but unreadable or malformed is skipped with a warning so a broken config
/// doesn't get mistaken for an absent one.
fn key_from_config_file(path: &Path) -> Option<String> {
    if !path.exists() {
        return None;
    }
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("ignoring unreadable {}: {}", path.display(), e);
            return None;
        }
    };
    let parsed: ConfigFile = match serde_json::from_str(&text) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("ignoring malformed {}: {}", path.display(), e);
            return None;
        }
    };
    parsed.api_key.filter(|key| is_usable(key))
}

/// Precedence rule: a usable config-file key wins over the environment.
fn select_key(file_key: Option<String>, env_key: Option<String>) -> Option<String> {
    file_key.or_else(|| env_key.filter(|key| !key.is_empty()))
}

/// Resolves the API key from `config.json` in the working directory, falling
/// back to the `GEMINI_API_KEY` environment variable. Returns `None` when
/// neither source yields a usable key.
pub fn resolve_api_key() -> Option<String> {
    select_key(
        key_from_config_file(Path::new(CONFIG_FILE)),
        env::var(KEY_ENV_VAR).ok(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILE);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn prompt_words_join_with_single_spaces() {
        let config = Config {
            prompt_words: vec![
                "Explain".to_string(),
                "quantum".to_string(),
                "computing".to_string(),
            ],
            verbose: false,
        };
        assert_eq!(config.prompt(), "Explain quantum computing");
    }

    #[test]
    fn config_file_key_is_used_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"api_key": "file-key"}"#);
        assert_eq!(key_from_config_file(&path), Some("file-key".to_string()));
    }

    #[test]
    fn placeholder_key_counts_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"api_key": "YOUR_GEMINI_API_KEY_HERE"}"#);
        assert_eq!(key_from_config_file(&path), None);
    }

    #[test]
    fn empty_key_counts_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"api_key": ""}"#);
        assert_eq!(key_from_config_file(&path), None);
    }

    #[test]
    fn missing_file_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(key_from_config_file(&dir.path().join(CONFIG_FILE)), None);
    }

    #[test]
    fn malformed_file_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "not json at all {");
        assert_eq!(key_from_config_file(&path), None);
    }

    #[test]
    fn file_without_api_key_field_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"model": "gemini-1.5-flash"}"#);
        assert_eq!(key_from_config_file(&path), None);
    }

    #[test]
    fn file_key_beats_environment_key() {
        let selected = select_key(Some("file-key".to_string()), Some("env-key".to_string()));
        assert_eq!(selected, Some("file-key".to_string()));
    }

    #[test]
    fn environment_key_is_the_fallback() {
        let selected = select_key(None, Some("env-key".to_string()));
        assert_eq!(selected, Some("env-key".to_string()));
    }

    #[test]
    fn empty_environment_key_is_ignored() {
        assert_eq!(select_key(None, Some(String::new())), None);
    }

    #[test]
    fn no_source_yields_nothing() {
        assert_eq!(select_key(None, None), None);
    }
}
