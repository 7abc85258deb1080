use anyhow::{Context, Result, anyhow, bail};
use opsdeck_app::{
    AppSetting, CategoryId, DashboardCounts, FormKind, FormSnapshot, Product, ProductCategory,
    ProductId, Report, ReportId, ReportStatus, SettingKey, SettingValue, Theme,
};
use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

pub const APP_NAME: &str = "opsdeck";
/// Products at or below this stock count surface on the dashboard.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

const SNAPSHOT_KEY_PREFIX: &str = "form-snapshot-";

const DEFAULT_CATEGORIES: [&str; 7] = [
    "Accessories",
    "Apparel",
    "Electronics",
    "Furniture",
    "Hardware",
    "Outdoors",
    "Stationery",
];

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "product_categories",
        &["id", "name", "created_at", "updated_at"],
    ),
    (
        "products",
        &[
            "id",
            "name",
            "sku",
            "category_id",
            "price_cents",
            "stock",
            "active",
            "notes",
            "created_at",
            "updated_at",
            "deleted_at",
        ],
    ),
    (
        "reports",
        &[
            "id",
            "title",
            "period",
            "status",
            "generated_at",
            "notes",
            "created_at",
            "updated_at",
            "deleted_at",
        ],
    ),
    ("settings", &["key", "value", "updated_at"]),
    (
        "form_snapshots",
        &["key", "payload", "sha256", "updated_at"],
    ),
    (
        "deletion_records",
        &["id", "entity", "target_id", "deleted_at", "restored_at"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_product_categories_name",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_product_categories_name ON product_categories (name);",
    },
    RequiredIndex {
        name: "idx_products_category_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_products_category_id ON products (category_id);",
    },
    RequiredIndex {
        name: "idx_products_sku",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_products_sku ON products (sku);",
    },
    RequiredIndex {
        name: "idx_products_deleted_at",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_products_deleted_at ON products (deleted_at);",
    },
    RequiredIndex {
        name: "idx_reports_status",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_reports_status ON reports (status);",
    },
    RequiredIndex {
        name: "idx_reports_deleted_at",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_reports_deleted_at ON reports (deleted_at);",
    },
    RequiredIndex {
        name: "idx_deletion_records_entity",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_deletion_records_entity ON deletion_records (entity);",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    pub category_id: CategoryId,
    pub price_cents: Option<i64>,
    pub stock: i64,
    pub active: bool,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReport {
    pub title: String,
    pub period: String,
    pub status: ReportStatus,
    pub generated_at: Option<Date>,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntityKind {
    Product,
    Report,
}

impl EntityKind {
    const fn table(self) -> &'static str {
        match self {
            Self::Product => "products",
            Self::Report => "reports",
        }
    }

    const fn deleted_tag(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Report => "report",
        }
    }
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        }

        ensure_required_indexes(&self.conn)?;

        self.seed_defaults()?;
        Ok(())
    }

    pub fn seed_defaults(&self) -> Result<()> {
        for category in DEFAULT_CATEGORIES {
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO product_categories (name) VALUES (?)",
                    params![category],
                )
                .with_context(|| format!("insert default category {category}"))?;
        }
        Ok(())
    }

    /// Seeds a handful of fixed rows for `--demo` launches.
    pub fn seed_demo_data(&self) -> Result<()> {
        let categories = self.list_categories()?;
        let category_named = |name: &str| -> Result<CategoryId> {
            categories
                .iter()
                .find(|category| category.name == name)
                .map(|category| category.id)
                .ok_or_else(|| anyhow!("demo seed expects default category {name}"))
        };

        let demo_products: [(&str, &str, &str, Option<i64>, i64); 5] = [
            ("Walnut standing desk", "DSK-100", "Furniture", Some(64_900), 12),
            ("Mechanical keyboard", "KBD-210", "Electronics", Some(12_500), 3),
            ("Field notebook 3-pack", "NTB-031", "Stationery", Some(1_450), 88),
            ("Trail rain shell", "APP-440", "Apparel", Some(9_900), 2),
            ("Hex key set", "HRD-077", "Hardware", None, 41),
        ];
        for (name, sku, category, price_cents, stock) in demo_products {
            self.create_product(&NewProduct {
                name: name.to_owned(),
                sku: sku.to_owned(),
                category_id: category_named(category)?,
                price_cents,
                stock,
                active: true,
                notes: String::new(),
            })?;
        }

        let demo_reports: [(&str, &str, ReportStatus); 3] = [
            ("Inventory valuation", "2026-Q2", ReportStatus::Published),
            ("Low stock review", "2026-Q3", ReportStatus::Pending),
            ("Supplier spend", "2026-Q3", ReportStatus::Draft),
        ];
        for (title, period, status) in demo_reports {
            self.create_report(&NewReport {
                title: title.to_owned(),
                period: period.to_owned(),
                status,
                generated_at: None,
                notes: String::new(),
            })?;
        }
        Ok(())
    }

    pub fn list_categories(&self) -> Result<Vec<ProductCategory>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, created_at, updated_at
                 FROM product_categories
                 ORDER BY name ASC",
            )
            .context("prepare categories query")?;
        let rows = stmt
            .query_map([], |row| {
                let created_at_raw: String = row.get(2)?;
                let updated_at_raw: String = row.get(3)?;
                Ok(ProductCategory {
                    id: CategoryId::new(row.get(0)?),
                    name: row.get(1)?,
                    created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                    updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
                })
            })
            .context("query categories")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect categories")
    }

    pub fn create_product(&self, product: &NewProduct) -> Result<ProductId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "INSERT INTO products
                   (name, sku, category_id, price_cents, stock, active, notes, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    product.name,
                    product.sku,
                    product.category_id.get(),
                    product.price_cents,
                    product.stock,
                    i64::from(product.active),
                    product.notes,
                    now,
                    now,
                ],
            )
            .with_context(|| format!("insert product {}", product.name))?;
        Ok(ProductId::new(self.conn.last_insert_rowid()))
    }

    pub fn get_product(&self, product_id: ProductId) -> Result<Product> {
        self.conn
            .query_row(
                &format!("{PRODUCT_SELECT} WHERE id = ?"),
                params![product_id.get()],
                product_from_row,
            )
            .optional()
            .context("query product")?
            .ok_or_else(|| anyhow!("product {} not found", product_id.get()))
    }

    pub fn list_products(&self, include_deleted: bool) -> Result<Vec<Product>> {
        let sql = if include_deleted {
            format!("{PRODUCT_SELECT} ORDER BY updated_at DESC, id DESC")
        } else {
            format!("{PRODUCT_SELECT} WHERE deleted_at IS NULL ORDER BY updated_at DESC, id DESC")
        };
        let mut stmt = self.conn.prepare(&sql).context("prepare products query")?;
        let rows = stmt
            .query_map([], product_from_row)
            .context("query products")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect products")
    }

    pub fn soft_delete_product(&self, product_id: ProductId) -> Result<()> {
        self.mark_deleted(EntityKind::Product, product_id.get())
    }

    pub fn restore_product(&self, product_id: ProductId) -> Result<()> {
        self.mark_restored(EntityKind::Product, product_id.get())
    }

    pub fn create_report(&self, report: &NewReport) -> Result<ReportId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "INSERT INTO reports
                   (title, period, status, generated_at, notes, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    report.title,
                    report.period,
                    report.status.as_str(),
                    report.generated_at.map(format_date),
                    report.notes,
                    now,
                    now,
                ],
            )
            .with_context(|| format!("insert report {}", report.title))?;
        Ok(ReportId::new(self.conn.last_insert_rowid()))
    }

    pub fn list_reports(&self, include_deleted: bool) -> Result<Vec<Report>> {
        let sql = if include_deleted {
            format!("{REPORT_SELECT} ORDER BY updated_at DESC, id DESC")
        } else {
            format!("{REPORT_SELECT} WHERE deleted_at IS NULL ORDER BY updated_at DESC, id DESC")
        };
        let mut stmt = self.conn.prepare(&sql).context("prepare reports query")?;
        let rows = stmt
            .query_map([], report_from_row)
            .context("query reports")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect reports")
    }

    pub fn soft_delete_report(&self, report_id: ReportId) -> Result<()> {
        self.mark_deleted(EntityKind::Report, report_id.get())
    }

    pub fn restore_report(&self, report_id: ReportId) -> Result<()> {
        self.mark_restored(EntityKind::Report, report_id.get())
    }

    pub fn dashboard_counts(&self) -> Result<DashboardCounts> {
        let products_total: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM products WHERE deleted_at IS NULL",
                [],
                |row| row.get(0),
            )
            .context("count products")?;
        let products_low_stock: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM products
                 WHERE deleted_at IS NULL AND active = 1 AND stock < ?",
                params![LOW_STOCK_THRESHOLD],
                |row| row.get(0),
            )
            .context("count low-stock products")?;
        let reports_pending: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM reports WHERE deleted_at IS NULL AND status = ?",
                params![ReportStatus::Pending.as_str()],
                |row| row.get(0),
            )
            .context("count pending reports")?;
        Ok(DashboardCounts {
            products_total: products_total.max(0) as usize,
            products_low_stock: products_low_stock.max(0) as usize,
            reports_pending: reports_pending.max(0) as usize,
        })
    }

    pub fn get_setting(&self, key: SettingKey) -> Result<Option<SettingValue>> {
        let raw = self.get_setting_raw(key.as_str())?;
        raw.map(|value| {
            SettingValue::parse_for_key(key, &value).ok_or_else(|| {
                anyhow!(
                    "setting `{}` has invalid value `{}`; run `opsdeck --check`, then set a valid value in Settings",
                    key.as_str(),
                    value
                )
            })
        })
        .transpose()
    }

    pub fn put_setting(&self, key: SettingKey, value: SettingValue) -> Result<()> {
        let raw = value.to_storage(key).ok_or_else(|| {
            anyhow!(
                "setting `{}` expected {:?} value; reopen Settings and choose a valid option",
                key.as_str(),
                key.expected_value_kind()
            )
        })?;
        self.put_setting_raw(key.as_str(), &raw)
    }

    pub fn list_settings(&self) -> Result<Vec<AppSetting>> {
        let mut settings = Vec::with_capacity(SettingKey::ALL.len());
        for key in SettingKey::ALL {
            let value = self
                .get_setting(key)?
                .unwrap_or_else(|| default_setting_value(key));
            settings.push(AppSetting { key, value });
        }
        Ok(settings)
    }

    pub fn get_theme_override(&self) -> Result<Option<Theme>> {
        match self.get_setting(SettingKey::UiTheme)? {
            Some(SettingValue::Text(value)) => Theme::parse(&value)
                .map(Some)
                .ok_or_else(|| {
                    anyhow!(
                        "setting `{}` must be light or dark; open Settings and fix it",
                        SettingKey::UiTheme.as_str()
                    )
                }),
            Some(SettingValue::Bool(_)) => bail!(
                "setting `{}` must be text; open Settings and choose light or dark",
                SettingKey::UiTheme.as_str()
            ),
            None => Ok(None),
        }
    }

    pub fn put_theme(&self, theme: Theme) -> Result<()> {
        self.put_setting(
            SettingKey::UiTheme,
            SettingValue::Text(theme.as_str().to_owned()),
        )
    }

    pub fn get_compact_tabs_override(&self) -> Result<Option<bool>> {
        match self.get_setting(SettingKey::UiCompactTabs)? {
            Some(SettingValue::Bool(value)) => Ok(Some(value)),
            Some(SettingValue::Text(_)) => bail!(
                "setting `{}` must be on/off; open Settings and toggle it",
                SettingKey::UiCompactTabs.as_str()
            ),
            None => Ok(None),
        }
    }

    pub fn put_compact_tabs(&self, compact: bool) -> Result<()> {
        self.put_setting(SettingKey::UiCompactTabs, SettingValue::Bool(compact))
    }

    /// The last applied navigation fragment, re-applied on the next launch.
    pub fn get_last_fragment(&self) -> Result<Option<String>> {
        match self.get_setting(SettingKey::UiLastFragment)? {
            Some(SettingValue::Text(value)) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(trimmed.to_owned()))
                }
            }
            Some(SettingValue::Bool(_)) => bail!(
                "setting `{}` must be text",
                SettingKey::UiLastFragment.as_str()
            ),
            None => Ok(None),
        }
    }

    pub fn put_last_fragment(&self, fragment: &str) -> Result<()> {
        self.put_setting(
            SettingKey::UiLastFragment,
            SettingValue::Text(fragment.to_owned()),
        )
    }

    /// Persists a form draft snapshot, overwriting any prior one for the kind.
    pub fn put_form_snapshot(&self, kind: FormKind, snapshot: &FormSnapshot) -> Result<()> {
        let payload = serde_json::to_string(snapshot)
            .with_context(|| format!("encode {} draft snapshot", kind.snapshot_key()))?;
        let checksum = checksum_sha256(payload.as_bytes());
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "INSERT INTO form_snapshots (key, payload, sha256, updated_at)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT (key) DO UPDATE SET
                   payload = excluded.payload,
                   sha256 = excluded.sha256,
                   updated_at = excluded.updated_at",
                params![snapshot_key(kind), payload, checksum, now],
            )
            .with_context(|| format!("store {} draft snapshot", kind.snapshot_key()))?;
        Ok(())
    }

    /// Loads a stored draft snapshot. A checksum or decode mismatch is an
    /// error, not a crash: the caller reports it and opens the form blank.
    pub fn get_form_snapshot(&self, kind: FormKind) -> Result<Option<FormSnapshot>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT payload, sha256 FROM form_snapshots WHERE key = ?",
                params![snapshot_key(kind)],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .with_context(|| format!("load {} draft snapshot", kind.snapshot_key()))?;

        let Some((payload, stored_checksum)) = row else {
            return Ok(None);
        };
        if checksum_sha256(payload.as_bytes()) != stored_checksum {
            bail!(
                "stored draft for `{}` failed its integrity check; the draft was discarded -- re-enter the form values",
                kind.snapshot_key()
            );
        }
        let snapshot: FormSnapshot = serde_json::from_str(&payload).with_context(|| {
            format!(
                "stored draft for `{}` is not valid JSON; re-enter the form values",
                kind.snapshot_key()
            )
        })?;
        Ok(Some(snapshot))
    }

    pub fn clear_form_snapshot(&self, kind: FormKind) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM form_snapshots WHERE key = ?",
                params![snapshot_key(kind)],
            )
            .with_context(|| format!("clear {} draft snapshot", kind.snapshot_key()))?;
        Ok(())
    }

    fn mark_deleted(&self, entity: EntityKind, target_id: i64) -> Result<()> {
        let now = now_rfc3339()?;
        let changed = self
            .conn
            .execute(
                &format!(
                    "UPDATE {} SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
                    entity.table()
                ),
                params![now, now, target_id],
            )
            .with_context(|| format!("soft delete {} {target_id}", entity.deleted_tag()))?;
        if changed == 0 {
            bail!(
                "{} {target_id} not found or already deleted",
                entity.deleted_tag()
            );
        }
        self.conn
            .execute(
                "INSERT INTO deletion_records (entity, target_id, deleted_at) VALUES (?, ?, ?)",
                params![entity.deleted_tag(), target_id, now],
            )
            .context("record deletion")?;
        Ok(())
    }

    fn mark_restored(&self, entity: EntityKind, target_id: i64) -> Result<()> {
        let now = now_rfc3339()?;
        let changed = self
            .conn
            .execute(
                &format!(
                    "UPDATE {} SET deleted_at = NULL, updated_at = ? WHERE id = ? AND deleted_at IS NOT NULL",
                    entity.table()
                ),
                params![now, target_id],
            )
            .with_context(|| format!("restore {} {target_id}", entity.deleted_tag()))?;
        if changed == 0 {
            bail!("{} {target_id} is not deleted", entity.deleted_tag());
        }
        self.conn
            .execute(
                "UPDATE deletion_records SET restored_at = ?
                 WHERE entity = ? AND target_id = ? AND restored_at IS NULL",
                params![now, entity.deleted_tag(), target_id],
            )
            .context("record restore")?;
        Ok(())
    }

    fn get_setting_raw(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("load setting {key}"))
    }

    fn put_setting_raw(&self, key: &str, value: &str) -> Result<()> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "INSERT INTO settings (key, value, updated_at)
                 VALUES (?, ?, ?)
                 ON CONFLICT (key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .with_context(|| format!("store setting {key}"))?;
        Ok(())
    }
}

const PRODUCT_SELECT: &str = "SELECT id, name, sku, category_id, price_cents, stock, active, notes,
        created_at, updated_at, deleted_at
 FROM products";

const REPORT_SELECT: &str = "SELECT id, title, period, status, generated_at, notes, created_at, updated_at, deleted_at
 FROM reports";

fn product_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Product> {
    let created_at_raw: String = row.get(8)?;
    let updated_at_raw: String = row.get(9)?;
    let deleted_at_raw: Option<String> = row.get(10)?;
    let active: i64 = row.get(6)?;
    Ok(Product {
        id: ProductId::new(row.get(0)?),
        name: row.get(1)?,
        sku: row.get(2)?,
        category_id: CategoryId::new(row.get(3)?),
        price_cents: row.get(4)?,
        stock: row.get(5)?,
        active: active != 0,
        notes: row.get(7)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
        deleted_at: parse_opt_datetime(deleted_at_raw).map_err(to_sql_error)?,
    })
}

fn report_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Report> {
    let status_raw: String = row.get(3)?;
    let generated_raw: Option<String> = row.get(4)?;
    let created_at_raw: String = row.get(6)?;
    let updated_at_raw: String = row.get(7)?;
    let deleted_at_raw: Option<String> = row.get(8)?;
    Ok(Report {
        id: ReportId::new(row.get(0)?),
        title: row.get(1)?,
        period: row.get(2)?,
        status: ReportStatus::parse(&status_raw)
            .ok_or_else(|| to_sql_error(anyhow!("unknown report status {status_raw:?}")))?,
        generated_at: parse_opt_date(generated_raw).map_err(to_sql_error)?,
        notes: row.get(5)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
        deleted_at: parse_opt_datetime(deleted_at_raw).map_err(to_sql_error)?,
    })
}

fn snapshot_key(kind: FormKind) -> String {
    format!("{SNAPSHOT_KEY_PREFIX}{}", kind.snapshot_key())
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os("OPSDECK_DB_PATH") {
        return Ok(PathBuf::from(path));
    }
    let data_root = dirs::data_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set OPSDECK_DB_PATH to the database file")
    })?;
    let app_dir = data_root.join(APP_NAME);
    std::fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("opsdeck.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path == ":memory:" {
        return Ok(());
    }
    if path.contains("://") || path.starts_with("file:") {
        bail!("database path {path:?} looks like a URI; use a filesystem path");
    }
    if path.contains('?') {
        bail!("database path {path:?} must be a plain filesystem path without query parameters");
    }
    Ok(())
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing table `{table}`; point [storage].db_path at an opsdeck database or a fresh path"
            );
        }
        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();
        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}",
                missing.join(", ")
            );
        }
    }
    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    let existing = index_names(conn)?;
    for index in REQUIRED_INDEXES {
        if !existing.contains(index.name) {
            conn.execute_batch(index.create_sql)
                .with_context(|| format!("create index {}", index.name))?;
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            params![table],
            |row| row.get(0),
        )
        .with_context(|| format!("check table {table}"))?;
    Ok(count > 0)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query columns for {table}"))?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))
}

fn index_names(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'index' AND name NOT LIKE 'sqlite_%'",
        )
        .context("prepare index query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query index names")?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("collect index names")
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn default_setting_value(key: SettingKey) -> SettingValue {
    match key {
        SettingKey::UiTheme => SettingValue::Text(Theme::Light.as_str().to_owned()),
        SettingKey::UiCompactTabs => SettingValue::Bool(false),
        SettingKey::UiLastFragment => SettingValue::Text(String::new()),
    }
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    bail!("unsupported datetime format {raw:?}")
}

fn parse_date(raw: &str) -> Result<Date> {
    if let Ok(value) = Date::parse(raw, &format_description!("[year]-[month]-[day]")) {
        return Ok(value);
    }

    // Imported rows may carry full timestamps; normalize to the date.
    let date_time = parse_datetime(raw)?;
    Ok(date_time.date())
}

fn parse_opt_datetime(raw: Option<String>) -> Result<Option<OffsetDateTime>> {
    raw.as_deref().map(parse_datetime).transpose()
}

fn parse_opt_date(raw: Option<String>) -> Result<Option<Date>> {
    raw.as_deref().map(parse_date).transpose()
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}

fn format_date(value: Date) -> String {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| "1970-01-01".to_owned())
}

fn checksum_sha256(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut output = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write as _;
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}
