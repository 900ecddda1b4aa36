use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

const CONFIG_DIR_REL_HOME: &str = ".config/scowlbot";
const CONFIG_FILE: &str = "config.toml";

/// Directory holding the bot's configuration and persisted state files
pub fn config_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(CONFIG_DIR_REL_HOME))
        .ok_or(anyhow!("Could not find home directory"))
}

/// Path of a file within the bot's configuration directory
pub fn config_path(file: &str) -> Result<PathBuf> {
    Ok(config_dir()?.join(file))
}

/// Bot configuration
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Config {
    pub general: General,
    pub mention: Mention,
    pub censor: Censor,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct General {
    pub discord_token: String,
    /// First word of every command message, e.g. `?scowl`
    pub command_prefix: String,
    /// The one guild the bot serves
    pub guild_id: u64,
    /// Users allowed to run admin commands
    pub admin_ids: Vec<u64>,
    /// How many pool emojis to react with on an ordinary message
    pub reaction_count: usize,
    /// Sent when someone tries to command the bot outside the home guild
    pub invite_url: Option<String>,
    /// While set, only admins may run commands
    #[serde(default)]
    pub maintenance: bool,
}

/// Trigger words that provoke a canned reply
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Mention {
    pub trigger_words: Vec<String>,
    pub reply: String,
}

/// Unicode emojis that get a message deleted
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Censor {
    pub forbidden: Vec<String>,
}

impl Config {
    pub async fn load() -> Result<Self> {
        let path = config_path(CONFIG_FILE)?;

        let mut file = tokio::fs::File::open(&path).await.map_err(|e| {
            anyhow!(
                "Could not open configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).await.map_err(|e| {
            anyhow!(
                "Could not read configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow!(
                "Could not parse configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        Ok(config)
    }

    pub fn is_admin(&self, user_id: serenity::all::UserId) -> bool {
        self.general.admin_ids.contains(&user_id.get())
    }
}
