use crate::store::{self, StoreError};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_KINDLE_LOCATION: &str = if cfg!(target_os = "macos") {
    "/Volumes/Kindle"
} else {
    "/media/Kindle"
};

pub const KEY_NOTION_TOKEN: &str = "notion.v2token";
pub const KEY_NOTION_PAGE: &str = "notion.page";
pub const KEY_KINDLE_LOCATION: &str = "kindle.location";
pub const KEY_KINDLE_PATH: &str = "kindle.path";
pub const KEY_KINDLE_LOG: &str = "kindle.log";

const ENV_CONFIG_DIR: &str = "BOOKNOTE_CONFIG_DIR";
const ENV_NOTION_TOKEN: &str = "BOOKNOTE_NOTION_TOKEN";
const ENV_NOTION_PAGE: &str = "BOOKNOTE_NOTION_PAGE";
const ENV_KINDLE_LOCATION: &str = "BOOKNOTE_KINDLE_LOCATION";

#[derive(Parser, Debug)]
#[command(name = "booknote")]
#[command(version, about = "Upload Kindle highlights to a Notion page with custom formatting")]
pub struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory holding config.json and style.json (default ~/.config/booknote)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Change a configuration variable
    ///
    /// Variables:
    ///   kindle.log      where the log of uploaded highlights is kept
    ///   kindle.path     where the Kindle is mounted (defaults to /Volumes/Kindle on macOS)
    ///   notion.page     URL of the Notion page highlights go to
    ///   notion.v2token  the token_v2 cookie used to authenticate
    #[command(verbatim_doc_comment)]
    Config { name: String, value: String },

    /// Change how highlights are rendered in Notion
    ///
    /// Elements: title, quote, annotation
    /// Variables:
    ///   color       default|gray|brown|orange|yellow|green|blue|purple|pink|red
    ///   block.type  HeaderBlock|SubheaderBlock|SubsubheaderBlock|QuoteBlock|TextBlock|
    ///               PageBlock|BulletedListBlock|TodoBlock|CalloutBlock|ToggleBlock
    ///
    /// Example: booknote setstyle title block.type HeaderBlock
    #[command(name = "setstyle", verbatim_doc_comment)]
    SetStyle {
        element: String,
        variable: String,
        value: String,
    },

    /// Upload highlights to Notion
    Upload {
        /// Upload every highlight on the Kindle, not only the new ones
        #[arg(long)]
        all: bool,
    },

    /// Print one of the internal files (kindle.log | config | style)
    List { file: String },
}

/// The files `booknote list` can print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListTarget {
    KindleLog,
    Config,
    Style,
}

impl ListTarget {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "kindle.log" => Some(ListTarget::KindleLog),
            "config" | "config.json" => Some(ListTarget::Config),
            "style" | "style.json" => Some(ListTarget::Style),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paths {
    pub dir: PathBuf,
    pub config_file: PathBuf,
    pub style_file: PathBuf,
    pub default_log: PathBuf,
}

impl Paths {
    /// Config directory from the flag, then `BOOKNOTE_CONFIG_DIR`, then `~/.config/booknote`.
    pub fn resolve(cli_dir: Option<PathBuf>, env: impl Fn(&str) -> Option<String>) -> Self {
        let dir = cli_dir
            .or_else(|| env(ENV_CONFIG_DIR).map(PathBuf::from))
            .unwrap_or_else(default_config_dir);

        Self::in_dir(dir)
    }

    pub fn in_dir(dir: PathBuf) -> Self {
        Paths {
            config_file: dir.join("config.json"),
            style_file: dir.join("style.json"),
            default_log: dir.join("kindle.log"),
            dir,
        }
    }
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("booknote")
}

/// The flat `config.json` key-value map.
///
/// Values the tool does not write itself (numbers, nested objects) are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<String, Value>,
}

impl Settings {
    pub fn defaults(default_log: &Path) -> Self {
        let values = [
            (KEY_NOTION_TOKEN, String::new()),
            (KEY_NOTION_PAGE, String::new()),
            (KEY_KINDLE_LOCATION, DEFAULT_KINDLE_LOCATION.to_string()),
            (KEY_KINDLE_LOG, default_log.to_string_lossy().into_owned()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::String(v)))
        .collect();

        Settings { values }
    }

    /// Loads `path`, regenerating it with defaults when missing or not JSON.
    ///
    /// A JSON file of the wrong shape is an error and is left on disk.
    pub fn open(path: &Path, default_log: &Path) -> Result<Self, StoreError> {
        match store::load_json(path) {
            Ok(settings) => Ok(settings),
            Err(e) if !e.is_unreadable() => Err(e),
            Err(e) => {
                if path.exists() {
                    warn!(error = %e, "Config file unreadable, writing defaults");
                }
                let settings = Self::defaults(default_log);
                settings.save(path)?;
                Ok(settings)
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        store::write_json(path, self)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.values
            .insert(name.to_string(), Value::String(value.to_string()));
    }

    pub fn log_path(&self, default_log: &Path) -> PathBuf {
        self.get(KEY_KINDLE_LOG)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| default_log.to_path_buf())
    }

    /// Values used for an upload, with `BOOKNOTE_*` environment overrides applied.
    pub fn resolve(&self, env: impl Fn(&str) -> Option<String>) -> Config {
        let lookup = |env_name: &str, keys: &[&str]| {
            env(env_name).or_else(|| {
                keys.iter()
                    .find_map(|k| self.get(k).filter(|v| !v.is_empty()))
                    .map(String::from)
            })
        };

        Config {
            notion_token: lookup(ENV_NOTION_TOKEN, &[KEY_NOTION_TOKEN]).unwrap_or_default(),
            notion_page: lookup(ENV_NOTION_PAGE, &[KEY_NOTION_PAGE]).unwrap_or_default(),
            kindle_location: lookup(
                ENV_KINDLE_LOCATION,
                &[KEY_KINDLE_LOCATION, KEY_KINDLE_PATH],
            )
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_KINDLE_LOCATION)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub notion_token: String,
    pub notion_page: String,
    pub kindle_location: PathBuf,
}
