use anyhow::{Context, Result};
use opsdeck_app::ReportStatus;
use std::path::PathBuf;
use time::{Date, Month};

pub const CATEGORIES: [&str; 7] = [
    "Accessories",
    "Apparel",
    "Electronics",
    "Furniture",
    "Hardware",
    "Outdoors",
    "Stationery",
];

const PRODUCT_ADJECTIVES: [&str; 12] = [
    "Walnut", "Compact", "Heavy-Duty", "Folding", "Wireless", "Insulated", "Recycled", "Slim",
    "Modular", "Weatherproof", "Brushed", "Quilted",
];

const PRODUCT_NOUNS: [&str; 14] = [
    "desk",
    "keyboard",
    "notebook",
    "rain shell",
    "hex key set",
    "lamp",
    "monitor arm",
    "water bottle",
    "tool roll",
    "daypack",
    "chair mat",
    "label maker",
    "cable kit",
    "floor tile",
];

const SKU_PREFIXES: [&str; 7] = ["ACC", "APP", "ELC", "FRN", "HRD", "OUT", "STN"];

const REPORT_TOPICS: [&str; 8] = [
    "Inventory valuation",
    "Low stock review",
    "Supplier spend",
    "Fulfillment latency",
    "Returns summary",
    "Category margins",
    "Warehouse audit",
    "Reorder forecast",
];

/// Linear congruential generator; same seed, same sequence, no rand dep.
#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state >> 11
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeProduct {
    pub name: String,
    pub sku: String,
    pub category: String,
    pub price_cents: Option<i64>,
    pub stock: i64,
    pub active: bool,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeReport {
    pub title: String,
    pub period: String,
    pub status: ReportStatus,
    pub generated_at: Option<Date>,
    pub notes: String,
}

#[derive(Debug, Clone)]
pub struct CatalogFaker {
    rng: DeterministicRng,
    serial: u32,
}

impl CatalogFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            serial: 0,
        }
    }

    pub fn product(&mut self) -> FakeProduct {
        let category_index = self.rng.int_n(CATEGORIES.len());
        self.product_in_category(category_index)
    }

    pub fn product_in_category(&mut self, category_index: usize) -> FakeProduct {
        let index = category_index % CATEGORIES.len();
        self.serial += 1;
        let adjective = self.pick(&PRODUCT_ADJECTIVES);
        let noun = self.pick(&PRODUCT_NOUNS);
        let price = if self.rng.int_n(10) == 0 {
            None
        } else {
            Some(self.int_range_i64(500, 150_000))
        };

        FakeProduct {
            name: format!("{adjective} {noun}"),
            sku: format!("{}-{:03}", SKU_PREFIXES[index], self.serial),
            category: CATEGORIES[index].to_owned(),
            price_cents: price,
            stock: self.int_range_i64(0, 120),
            active: self.rng.int_n(5) != 0,
            notes: String::new(),
        }
    }

    pub fn report(&mut self) -> FakeReport {
        let year = 2024 + self.int_range_i64(0, 2) as i32;
        let quarter = 1 + self.rng.int_n(4);
        let status = match self.rng.int_n(3) {
            0 => ReportStatus::Draft,
            1 => ReportStatus::Pending,
            _ => ReportStatus::Published,
        };
        let generated_at = if status == ReportStatus::Published {
            Some(self.date_in_year(year))
        } else {
            None
        };

        FakeReport {
            title: self.pick(&REPORT_TOPICS).to_owned(),
            period: format!("{year}-Q{quarter}"),
            status,
            generated_at,
            notes: String::new(),
        }
    }

    pub fn date_in_year(&mut self, year: i32) -> Date {
        let month = Month::try_from(1 + self.rng.int_n(12) as u8).unwrap_or(Month::January);
        // Day stays within 28 so every month accepts it.
        let day = 1 + self.rng.int_n(28) as u8;
        Date::from_calendar_date(year, month, day).expect("day 1..=28 is valid for every month")
    }

    fn pick<'a>(&mut self, values: &[&'a str]) -> &'a str {
        values[self.rng.int_n(values.len())]
    }

    fn int_range_i64(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        low + (self.rng.next_u64() % ((high - low) as u64 + 1)) as i64
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("opsdeck-test.db");
    Ok((dir, path))
}

pub fn fixture_datetime() -> &'static str {
    "2026-02-19T12:00:00Z"
}
