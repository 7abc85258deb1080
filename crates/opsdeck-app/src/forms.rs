use anyhow::{Result, bail};
use time::Date;
use time::macros::format_description;

use crate::snapshot::{FieldValue, FormSnapshot};
use crate::{CategoryId, FormKind, ReportStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFormInput {
    pub name: String,
    pub sku: String,
    pub category_id: CategoryId,
    pub price_cents: Option<i64>,
    pub stock: i64,
    pub active: bool,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFormInput {
    pub title: String,
    pub period: String,
    pub status: ReportStatus,
    pub generated_at: Option<Date>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPayload {
    Product(ProductFormInput),
    Report(ReportFormInput),
}

impl FormPayload {
    pub fn kind(&self) -> FormKind {
        match self {
            Self::Product(_) => FormKind::Product,
            Self::Report(_) => FormKind::Report,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Product(product) => product.validate(),
            Self::Report(report) => report.validate(),
        }
    }
}

impl ProductFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("product name is required -- enter a name and retry");
        }
        if self.sku.trim().is_empty() {
            bail!("product sku is required -- enter a sku and retry");
        }
        if self.category_id.get() <= 0 {
            bail!("product category is required -- choose a category and retry");
        }
        if let Some(price) = self.price_cents
            && price < 0
        {
            bail!("product price cannot be negative");
        }
        if self.stock < 0 {
            bail!("product stock cannot be negative");
        }
        Ok(())
    }
}

impl ReportFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            bail!("report title is required -- enter a title and retry");
        }
        if self.period.trim().is_empty() {
            bail!("report period is required -- enter a period such as 2026-Q3");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Flag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormFieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

const PRODUCT_FIELDS: &[FormFieldSpec] = &[
    FormFieldSpec { name: "name", label: "name", kind: FieldKind::Text },
    FormFieldSpec { name: "sku", label: "sku", kind: FieldKind::Text },
    FormFieldSpec { name: "category_id", label: "category id", kind: FieldKind::Text },
    FormFieldSpec { name: "price", label: "price", kind: FieldKind::Text },
    FormFieldSpec { name: "stock", label: "stock", kind: FieldKind::Text },
    FormFieldSpec { name: "active", label: "active", kind: FieldKind::Flag },
    FormFieldSpec { name: "notes", label: "notes", kind: FieldKind::Text },
];

const REPORT_FIELDS: &[FormFieldSpec] = &[
    FormFieldSpec { name: "title", label: "title", kind: FieldKind::Text },
    FormFieldSpec { name: "period", label: "period", kind: FieldKind::Text },
    FormFieldSpec { name: "status", label: "status", kind: FieldKind::Text },
    FormFieldSpec { name: "generated_at", label: "generated", kind: FieldKind::Text },
    FormFieldSpec { name: "notes", label: "notes", kind: FieldKind::Text },
];

pub fn form_field_specs(kind: FormKind) -> &'static [FormFieldSpec] {
    match kind {
        FormKind::Product => PRODUCT_FIELDS,
        FormKind::Report => REPORT_FIELDS,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub spec: FormFieldSpec,
    pub text: String,
    pub flag: bool,
}

/// In-progress form state: one text buffer (or flag) per field, captured to
/// and restored from a [`FormSnapshot`]. Restore is applied at most once per
/// draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDraft {
    kind: FormKind,
    fields: Vec<FormField>,
    restored: bool,
}

impl FormDraft {
    pub fn blank(kind: FormKind) -> Self {
        let fields = form_field_specs(kind)
            .iter()
            .map(|spec| FormField {
                spec: *spec,
                text: default_text_for(kind, spec.name),
                flag: default_flag_for(kind, spec.name),
            })
            .collect();
        Self {
            kind,
            fields,
            restored: false,
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Applies a stored snapshot to this draft, once. Stored names with no
    /// matching field, and type mismatches, are ignored. Returns false when
    /// the draft was already restored.
    pub fn restore(&mut self, snapshot: &FormSnapshot) -> bool {
        if self.restored {
            return false;
        }
        self.restored = true;
        for field in &mut self.fields {
            match (field.spec.kind, snapshot.get(field.spec.name)) {
                (FieldKind::Text, Some(FieldValue::Text(value))) => {
                    field.text = value.clone();
                }
                (FieldKind::Flag, Some(FieldValue::Flag(value))) => {
                    field.flag = *value;
                }
                _ => {}
            }
        }
        true
    }

    /// Captures the draft's current field values.
    pub fn snapshot(&self) -> FormSnapshot {
        let mut snapshot = FormSnapshot::new();
        for field in &self.fields {
            match field.spec.kind {
                FieldKind::Text => snapshot.insert_text(field.spec.name, field.text.clone()),
                FieldKind::Flag => snapshot.insert_flag(field.spec.name, field.flag),
            }
        }
        snapshot
    }

    pub fn insert_char(&mut self, index: usize, ch: char) {
        if let Some(field) = self.fields.get_mut(index)
            && field.spec.kind == FieldKind::Text
        {
            field.text.push(ch);
        }
    }

    pub fn backspace(&mut self, index: usize) {
        if let Some(field) = self.fields.get_mut(index)
            && field.spec.kind == FieldKind::Text
        {
            field.text.pop();
        }
    }

    /// Toggles a flag field; returns false when the field is not a flag.
    pub fn toggle_flag(&mut self, index: usize) -> bool {
        if let Some(field) = self.fields.get_mut(index)
            && field.spec.kind == FieldKind::Flag
        {
            field.flag = !field.flag;
            return true;
        }
        false
    }

    /// Parses the draft into a validated payload.
    pub fn to_payload(&self) -> Result<FormPayload> {
        let payload = match self.kind {
            FormKind::Product => FormPayload::Product(ProductFormInput {
                name: self.text("name"),
                sku: self.text("sku"),
                category_id: CategoryId::new(parse_optional_integer(
                    &self.text("category_id"),
                    "category id",
                )?
                .unwrap_or(0)),
                price_cents: parse_money_cents(&self.text("price"))?,
                stock: parse_optional_integer(&self.text("stock"), "stock")?.unwrap_or(0),
                active: self.flag("active"),
                notes: self.text("notes"),
            }),
            FormKind::Report => FormPayload::Report(ReportFormInput {
                title: self.text("title"),
                period: self.text("period"),
                status: parse_report_status(&self.text("status"))?,
                generated_at: parse_optional_date(&self.text("generated_at"))?,
                notes: self.text("notes"),
            }),
        };
        payload.validate()?;
        Ok(payload)
    }

    fn text(&self, name: &str) -> String {
        self.fields
            .iter()
            .find(|field| field.spec.name == name)
            .map(|field| field.text.clone())
            .unwrap_or_default()
    }

    fn flag(&self, name: &str) -> bool {
        self.fields
            .iter()
            .find(|field| field.spec.name == name)
            .map(|field| field.flag)
            .unwrap_or_default()
    }
}

fn default_text_for(kind: FormKind, name: &str) -> String {
    match (kind, name) {
        (FormKind::Report, "status") => ReportStatus::Draft.as_str().to_owned(),
        _ => String::new(),
    }
}

fn default_flag_for(kind: FormKind, name: &str) -> bool {
    matches!((kind, name), (FormKind::Product, "active"))
}

/// Parses a money field such as "12", "12.5", or "12.50" into cents. Empty
/// input is no value.
pub fn parse_money_cents(raw: &str) -> Result<Option<i64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };
    if fraction.len() > 2 || !fraction.bytes().all(|byte| byte.is_ascii_digit()) {
        bail!("invalid price {trimmed:?}; use a dollar amount such as 12.50");
    }
    let Ok(dollars) = whole.parse::<i64>() else {
        bail!("invalid price {trimmed:?}; use a dollar amount such as 12.50");
    };
    let mut cents_part: i64 = 0;
    if !fraction.is_empty() {
        cents_part = fraction
            .parse::<i64>()
            .map_err(|_| anyhow::anyhow!("invalid price {trimmed:?}"))?;
        if fraction.len() == 1 {
            cents_part *= 10;
        }
    }
    let sign = if dollars < 0 { -1 } else { 1 };
    Ok(Some(dollars * 100 + sign * cents_part))
}

fn parse_optional_integer(raw: &str, label: &str) -> Result<Option<i64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<i64>() {
        Ok(value) => Ok(Some(value)),
        Err(_) => bail!("invalid {label} {trimmed:?}; enter a whole number"),
    }
}

fn parse_optional_date(raw: &str) -> Result<Option<Date>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match Date::parse(trimmed, &format_description!("[year]-[month]-[day]")) {
        Ok(date) => Ok(Some(date)),
        Err(_) => bail!("invalid date {trimmed:?}; use YYYY-MM-DD"),
    }
}

fn parse_report_status(raw: &str) -> Result<ReportStatus> {
    let trimmed = raw.trim();
    match ReportStatus::parse(trimmed) {
        Some(status) => Ok(status),
        None => bail!("invalid report status {trimmed:?}; use draft, pending, or published"),
    }
}
