use anyhow::{Result, bail};
use opsdeck_app::{
    DashboardCounts, FormKind, FormPayload, FormSnapshot, ProductId, ReportId, TabKind, Theme,
};
use opsdeck_db::{NewProduct, NewReport, Store};
use opsdeck_tui::{AppRuntime, TabSnapshot};

pub struct DbRuntime<'a> {
    store: &'a Store,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl AppRuntime for DbRuntime<'_> {
    fn load_dashboard_counts(&mut self) -> Result<DashboardCounts> {
        self.store.dashboard_counts()
    }

    fn load_tab_snapshot(&mut self, tab: TabKind) -> Result<Option<TabSnapshot>> {
        let snapshot = match tab {
            TabKind::Dashboard => None,
            TabKind::Products => Some(TabSnapshot::Products(self.store.list_products(false)?)),
            TabKind::Reports => Some(TabSnapshot::Reports(self.store.list_reports(false)?)),
            TabKind::Settings => Some(TabSnapshot::Settings(self.store.list_settings()?)),
        };
        Ok(snapshot)
    }

    fn submit_form(&mut self, payload: &FormPayload) -> Result<()> {
        payload.validate()?;

        match payload {
            FormPayload::Product(form) => {
                self.store.create_product(&NewProduct {
                    name: form.name.clone(),
                    sku: form.sku.clone(),
                    category_id: form.category_id,
                    price_cents: form.price_cents,
                    stock: form.stock,
                    active: form.active,
                    notes: form.notes.clone(),
                })?;
            }
            FormPayload::Report(form) => {
                self.store.create_report(&NewReport {
                    title: form.title.clone(),
                    period: form.period.clone(),
                    status: form.status,
                    generated_at: form.generated_at,
                    notes: form.notes.clone(),
                })?;
            }
        }

        Ok(())
    }

    fn delete_row(&mut self, tab: TabKind, row_id: i64) -> Result<()> {
        match tab {
            TabKind::Products => self.store.soft_delete_product(ProductId::new(row_id)),
            TabKind::Reports => self.store.soft_delete_report(ReportId::new(row_id)),
            TabKind::Dashboard | TabKind::Settings => {
                bail!("rows on the {} view cannot be deleted", tab.label())
            }
        }
    }

    fn persist_theme(&mut self, theme: Theme) -> Result<()> {
        self.store.put_theme(theme)
    }

    fn persist_fragment(&mut self, fragment: &str) -> Result<()> {
        self.store.put_last_fragment(fragment)
    }

    fn persist_compact_tabs(&mut self, compact: bool) -> Result<()> {
        self.store.put_compact_tabs(compact)
    }

    fn load_form_snapshot(&mut self, kind: FormKind) -> Result<Option<FormSnapshot>> {
        self.store.get_form_snapshot(kind)
    }

    fn save_form_snapshot(&mut self, kind: FormKind, snapshot: &FormSnapshot) -> Result<()> {
        self.store.put_form_snapshot(kind, snapshot)
    }

    fn clear_form_snapshot(&mut self, kind: FormKind) -> Result<()> {
        self.store.clear_form_snapshot(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::DbRuntime;
    use anyhow::Result;
    use opsdeck_app::{
        FormKind, FormPayload, FormSnapshot, ProductFormInput, ReportFormInput, ReportStatus,
        TabKind, Theme,
    };
    use opsdeck_db::Store;
    use opsdeck_tui::{AppRuntime, TabSnapshot};

    fn store_with_schema() -> Result<Store> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        Ok(store)
    }

    #[test]
    fn submit_form_creates_product_row() -> Result<()> {
        let store = store_with_schema()?;
        let category_id = store.list_categories()?[0].id;

        let mut runtime = DbRuntime::new(&store);
        runtime.submit_form(&FormPayload::Product(ProductFormInput {
            name: "Walnut standing desk".to_owned(),
            sku: "DSK-100".to_owned(),
            category_id,
            price_cents: Some(64_900),
            stock: 12,
            active: true,
            notes: String::new(),
        }))?;

        let products = store.list_products(false)?;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Walnut standing desk");
        Ok(())
    }

    #[test]
    fn submit_form_rejects_invalid_payloads() -> Result<()> {
        let store = store_with_schema()?;
        let mut runtime = DbRuntime::new(&store);

        let result = runtime.submit_form(&FormPayload::Report(ReportFormInput {
            title: String::new(),
            period: "2026-Q3".to_owned(),
            status: ReportStatus::Draft,
            generated_at: None,
            notes: String::new(),
        }));
        assert!(result.is_err());
        assert!(store.list_reports(false)?.is_empty());
        Ok(())
    }

    #[test]
    fn tab_snapshots_reflect_store_contents() -> Result<()> {
        let store = store_with_schema()?;
        store.seed_demo_data()?;
        let mut runtime = DbRuntime::new(&store);

        assert!(runtime.load_tab_snapshot(TabKind::Dashboard)?.is_none());
        let Some(TabSnapshot::Products(products)) =
            runtime.load_tab_snapshot(TabKind::Products)?
        else {
            panic!("expected products snapshot");
        };
        assert!(!products.is_empty());
        Ok(())
    }

    #[test]
    fn delete_row_soft_deletes_products() -> Result<()> {
        let store = store_with_schema()?;
        store.seed_demo_data()?;
        let mut runtime = DbRuntime::new(&store);

        let before = store.list_products(false)?;
        let target = before[0].id;
        runtime.delete_row(TabKind::Products, target.get())?;

        let after = store.list_products(false)?;
        assert_eq!(after.len(), before.len() - 1);
        assert!(store.list_products(true)?.len() == before.len());
        Ok(())
    }

    #[test]
    fn delete_row_rejects_non_table_views() -> Result<()> {
        let store = store_with_schema()?;
        let mut runtime = DbRuntime::new(&store);
        assert!(runtime.delete_row(TabKind::Settings, 1).is_err());
        Ok(())
    }

    #[test]
    fn theme_and_fragment_round_trip_through_the_store() -> Result<()> {
        let store = store_with_schema()?;
        let mut runtime = DbRuntime::new(&store);

        runtime.persist_theme(Theme::Dark)?;
        runtime.persist_fragment("products")?;
        assert_eq!(store.get_theme_override()?, Some(Theme::Dark));
        assert_eq!(store.get_last_fragment()?.as_deref(), Some("products"));
        Ok(())
    }

    #[test]
    fn form_snapshot_passthrough() -> Result<()> {
        let store = store_with_schema()?;
        let mut runtime = DbRuntime::new(&store);

        let mut snapshot = FormSnapshot::new();
        snapshot.insert_text("sku", "ABC123");
        runtime.save_form_snapshot(FormKind::Product, &snapshot)?;
        assert_eq!(
            runtime.load_form_snapshot(FormKind::Product)?,
            Some(snapshot)
        );
        runtime.clear_form_snapshot(FormKind::Product)?;
        assert_eq!(runtime.load_form_snapshot(FormKind::Product)?, None);
        Ok(())
    }
}
