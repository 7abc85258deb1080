use anyhow::{Context, Result, anyhow, bail};
use opsdeck_app::{DEFAULT_NOTICE_CAP, TabKind, Theme};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_VERSION: i64 = 1;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub ui: Ui,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            ui: Ui::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub theme: Option<String>,
    pub start_tab: Option<String>,
    pub compact_tabs: Option<bool>,
    pub notice_cap: Option<i64>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            theme: None,
            start_tab: None,
            compact_tabs: None,
            notice_cap: Some(DEFAULT_NOTICE_CAP as i64),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("OPSDECK_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set OPSDECK_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(opsdeck_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and move values under [storage] and [ui]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.version != CONFIG_VERSION {
            bail!(
                "config {} has version {}; expected 1",
                path.display(),
                self.version
            );
        }

        if let Some(db_path) = &self.storage.db_path {
            opsdeck_db::validate_db_path(db_path)?;
        }

        if let Some(theme) = &self.ui.theme
            && Theme::parse(theme.trim()).is_none()
        {
            bail!(
                "ui.theme in {} must be \"light\" or \"dark\", got {theme:?}",
                path.display()
            );
        }

        if let Some(start_tab) = &self.ui.start_tab
            && TabKind::parse_fragment(start_tab).is_none()
        {
            bail!(
                "ui.start_tab in {} must name a view (dashboard, products, reports, settings), got {start_tab:?}",
                path.display()
            );
        }

        if let Some(cap) = self.ui.notice_cap
            && cap <= 0
        {
            bail!(
                "ui.notice_cap in {} must be positive, got {cap}",
                path.display()
            );
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => opsdeck_db::default_db_path(),
        }
    }

    pub fn theme(&self) -> Option<Theme> {
        self.ui
            .theme
            .as_deref()
            .and_then(|value| Theme::parse(value.trim()))
    }

    pub fn start_tab(&self) -> Option<TabKind> {
        self.ui
            .start_tab
            .as_deref()
            .and_then(TabKind::parse_fragment)
    }

    pub fn compact_tabs(&self) -> Option<bool> {
        self.ui.compact_tabs
    }

    pub fn notice_cap(&self) -> usize {
        self.ui
            .notice_cap
            .filter(|cap| *cap > 0)
            .map(|cap| cap as usize)
            .unwrap_or(DEFAULT_NOTICE_CAP)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# opsdeck config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/opsdeck/opsdeck.db)\n# db_path = \"/absolute/path/to/opsdeck.db\"\n\n[ui]\n# theme = \"light\"\n# start_tab = \"dashboard\"\n# compact_tabs = false\nnotice_cap = {}\n",
            path.display(),
            DEFAULT_NOTICE_CAP,
        )
    }
}
