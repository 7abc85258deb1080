use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabKind {
    Dashboard,
    Products,
    Reports,
    Settings,
}

impl TabKind {
    pub const ALL: [Self; 4] = [Self::Dashboard, Self::Products, Self::Reports, Self::Settings];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Products => "products",
            Self::Reports => "reports",
            Self::Settings => "settings",
        }
    }

    /// Single-letter label for the compact tab bar.
    pub const fn short_label(self) -> &'static str {
        match self {
            Self::Dashboard => "d",
            Self::Products => "p",
            Self::Reports => "r",
            Self::Settings => "s",
        }
    }

    /// The tab's serialized navigation-state identifier, without the `#`.
    pub const fn fragment(self) -> &'static str {
        self.label()
    }

    /// Parses a fragment back into a tab. A leading `#` is tolerated;
    /// unknown names parse to nothing.
    pub fn parse_fragment(raw: &str) -> Option<Self> {
        let name = raw.trim().trim_start_matches('#');
        match name {
            "dashboard" => Some(Self::Dashboard),
            "products" => Some(Self::Products),
            "reports" => Some(Self::Reports),
            "settings" => Some(Self::Settings),
            _ => None,
        }
    }

    /// Positional lookup for the digit shortcuts (1-based).
    pub fn from_position(position: usize) -> Option<Self> {
        if position == 0 {
            return None;
        }
        Self::ALL.get(position - 1).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "info" => Some(Self::Info),
            "success" => Some(Self::Success),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    Draft,
    Pending,
    Published,
}

impl ReportStatus {
    pub const ALL: [Self; 3] = [Self::Draft, Self::Pending, Self::Published];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Published => "published",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "pending" => Some(Self::Pending),
            "published" => Some(Self::Published),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingKey {
    UiTheme,
    UiCompactTabs,
    UiLastFragment,
}

impl SettingKey {
    pub const ALL: [Self; 3] = [Self::UiTheme, Self::UiCompactTabs, Self::UiLastFragment];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UiTheme => "ui.theme",
            Self::UiCompactTabs => "ui.compact_tabs",
            Self::UiLastFragment => "ui.last_fragment",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ui.theme" => Some(Self::UiTheme),
            "ui.compact_tabs" => Some(Self::UiCompactTabs),
            "ui.last_fragment" => Some(Self::UiLastFragment),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::UiTheme => "theme",
            Self::UiCompactTabs => "compact tabs",
            Self::UiLastFragment => "last view",
        }
    }

    pub const fn expected_value_kind(self) -> SettingValueKind {
        match self {
            Self::UiTheme => SettingValueKind::Theme,
            Self::UiCompactTabs => SettingValueKind::Bool,
            Self::UiLastFragment => SettingValueKind::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingValueKind {
    Bool,
    Text,
    Theme,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingValue {
    Bool(bool),
    Text(String),
}

impl SettingValue {
    pub fn parse_for_key(key: SettingKey, raw: &str) -> Option<Self> {
        match key.expected_value_kind() {
            SettingValueKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => Some(Self::Bool(true)),
                "0" | "false" | "off" | "no" => Some(Self::Bool(false)),
                _ => None,
            },
            SettingValueKind::Theme => {
                Theme::parse(raw.trim()).map(|theme| Self::Text(theme.as_str().to_owned()))
            }
            SettingValueKind::Text => Some(Self::Text(raw.to_owned())),
        }
    }

    pub fn to_storage(&self, key: SettingKey) -> Option<String> {
        match (key.expected_value_kind(), self) {
            (SettingValueKind::Bool, Self::Bool(value)) => {
                Some(if *value { "true" } else { "false" }.to_owned())
            }
            (SettingValueKind::Text, Self::Text(value)) => Some(value.clone()),
            (SettingValueKind::Theme, Self::Text(value)) => {
                Theme::parse(value).map(|theme| theme.as_str().to_owned())
            }
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Bool(true) => "on".to_owned(),
            Self::Bool(false) => "off".to_owned(),
            Self::Text(value) => value.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSetting {
    pub key: SettingKey,
    pub value: SettingValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormKind {
    Product,
    Report,
}

impl FormKind {
    /// Key under which this form's draft snapshot is persisted.
    pub const fn snapshot_key(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Report => "report",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppMode {
    Nav,
    Form(FormKind),
}

/// Typed row-action identifiers; dispatch never matches on display labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: CategoryId,
    pub name: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub category_id: CategoryId,
    pub price_cents: Option<i64>,
    pub stock: i64,
    pub active: bool,
    pub notes: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub title: String,
    pub period: String,
    pub status: ReportStatus,
    pub generated_at: Option<Date>,
    pub notes: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DashboardCounts {
    pub products_total: usize,
    pub products_low_stock: usize,
    pub reports_pending: usize,
}
