use chrono::Utc;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};

use crate::config::ImportConfig;
use crate::error::Result;
use crate::models::{Category, Dye, Subtype, UpsertOutcome};
use crate::report::{ChangeType, ImportRecord, ImportReport};
use crate::slug::dye_slug;
use crate::spectrum::SpectralData;
use crate::store::{DyeStore, Store};
use crate::table::{cell_text, Table};

/// How a catalog row was matched to a dye record
#[derive(Debug, Clone, PartialEq)]
enum Resolution {
    Renamed { from: String },
    Existing,
    Created,
}

/// Matches vendor catalog rows to dye records and refreshes their spectra.
pub struct Reconciler<'a> {
    config: &'a ImportConfig,
}

impl<'a> Reconciler<'a> {
    pub fn new(config: &'a ImportConfig) -> Self {
        Self { config }
    }

    /// Processes every row of `dye_list`, then sweeps vendor dyes missing
    /// from it. Transaction handling is left to the caller.
    #[instrument(skip_all, fields(vendor = %self.config.vendor))]
    pub fn reconcile(
        &self,
        store: &dyn DyeStore,
        dye_list: &Table,
        data: &SpectralData,
    ) -> Result<ImportReport> {
        let mut report = ImportReport::new(&self.config.vendor);
        let mut processed = BTreeSet::new();

        for (idx, cells) in dye_list.rows().enumerate() {
            let record = self.process_row(store, idx + 1, cells, data, &mut processed)?;
            match record.change {
                ChangeType::Skipped => warn!(name = %record.name, "{}", record.detail),
                _ => info!(name = %record.name, change = ?record.change, "{}", record.detail),
            }
            report.push(record);
        }

        self.sweep(store, &processed, &mut report)?;
        Ok(report)
    }

    fn process_row(
        &self,
        store: &dyn DyeStore,
        row: usize,
        cells: &[String],
        data: &SpectralData,
        processed: &mut BTreeSet<String>,
    ) -> Result<ImportRecord> {
        let Some(name) = cell_text(cells, 0).map(str::trim) else {
            return Ok(ImportRecord::new(
                &format!("row {}", row),
                ChangeType::Skipped,
                "row has no dye name",
            ));
        };
        let manufacturer = cell_text(cells, 1).map(str::trim).unwrap_or("");

        if self.config.skip.contains(name) {
            return Ok(ImportRecord::new(name, ChangeType::Skipped, "in skip list"));
        }

        let Some((mut dye, resolution)) = self.resolve(store, name, manufacturer)? else {
            let owner = if manufacturer.is_empty() {
                "no manufacturer"
            } else {
                manufacturer
            };
            return Ok(ImportRecord::new(
                name,
                ChangeType::Skipped,
                format!("not a {} product ({}), not created", self.config.vendor, owner),
            ));
        };

        let before = (dye.manufacturer.clone(), dye.url.clone());
        dye.attribute_to(manufacturer);
        let fields_changed = before != (dye.manufacturer.clone(), dye.url.clone());
        store.save_dye(&mut dye)?;

        let mut spectra_changed = false;
        let mut notes = Vec::new();
        if let Some(dye_id) = dye.id {
            for subtype in [Subtype::Absorption, Subtype::Emission] {
                let curve = data.curve(name, subtype)?;
                if curve.is_empty() {
                    // No values left for this subtype; drop any stale curve
                    if store.delete_spectrum(dye_id, subtype, Category::Dye)? {
                        spectra_changed = true;
                        notes.push(format!("{} removed, no data", subtype));
                    } else {
                        notes.push(format!("no {} data", subtype));
                    }
                    continue;
                }
                let outcome = store.upsert_spectrum(dye_id, subtype, Category::Dye, &curve)?;
                if outcome != UpsertOutcome::Unchanged {
                    spectra_changed = true;
                    notes.push(format!("{} {:?}", subtype, outcome).to_lowercase());
                }
            }
        }
        processed.insert(dye.name.clone());

        let (change, mut detail) = match resolution {
            Resolution::Renamed { from } => {
                (ChangeType::Renamed, format!("renamed from '{}'", from))
            }
            Resolution::Created => (ChangeType::Created, "new dye".to_string()),
            Resolution::Existing if fields_changed || spectra_changed => {
                (ChangeType::Updated, "existing dye".to_string())
            }
            Resolution::Existing => (ChangeType::Found, "existing dye, up to date".to_string()),
        };
        if fields_changed && manufacturer.is_empty() {
            notes.push("manufacturer cleared".to_string());
        } else if fields_changed {
            notes.push(format!("manufacturer set to {}", manufacturer));
        }
        if !notes.is_empty() {
            detail = format!("{} ({})", detail, notes.join(", "));
        }
        Ok(ImportRecord::new(&dye.name, change, detail))
    }

    /// Finds the record for a catalog name: first through the rename map,
    /// then by slug. Only the configured vendor's rows may create a record.
    fn resolve(
        &self,
        store: &dyn DyeStore,
        name: &str,
        manufacturer: &str,
    ) -> Result<Option<(Dye, Resolution)>> {
        if let Some(old_name) = self.config.renames.get(name) {
            if let Some(mut dye) = store.dye_by_name(old_name)? {
                debug!(old = %old_name, new = %name, "Renaming dye");
                dye.rename(name);
                return Ok(Some((
                    dye,
                    Resolution::Renamed {
                        from: old_name.clone(),
                    },
                )));
            }
        }

        let slug = dye_slug(name);
        if let Some(dye) = store.dye_by_slug(&slug)? {
            debug!(slug = %slug, id = ?dye.id, "Found dye by slug");
            return Ok(Some((dye, Resolution::Existing)));
        }

        if manufacturer != self.config.vendor {
            return Ok(None);
        }
        Ok(Some((Dye::new(name), Resolution::Created)))
    }

    /// Dyes still attributed to the vendor that this run did not see lose
    /// the attribution. Only reported unless `apply_disown` is set.
    fn sweep(
        &self,
        store: &dyn DyeStore,
        processed: &BTreeSet<String>,
        report: &mut ImportReport,
    ) -> Result<()> {
        let rename_sources = self.config.rename_sources();
        for mut dye in store.dyes_by_manufacturer(&self.config.vendor)? {
            if processed.contains(&dye.name)
                || rename_sources.contains(dye.name.as_str())
                || self.config.skip.contains(&dye.name)
            {
                continue;
            }

            let detail = if self.config.apply_disown {
                dye.disown();
                store.save_dye(&mut dye)?;
                "not in current catalog, manufacturer and URL cleared"
            } else {
                "not in current catalog (report only)"
            };
            warn!(name = %dye.name, "{}", detail);
            report.push(ImportRecord::new(&dye.name, ChangeType::Disowned, detail));
        }
        Ok(())
    }
}

/// Loads both catalog files and imports them in one transaction.
pub fn run_import(store: &mut Store, config: &ImportConfig, dry_run: bool) -> Result<ImportReport> {
    info!(
        dye_list = %config.dye_list.display(),
        data = %config.data.display(),
        "Loading catalog"
    );
    let dye_list = Table::from_path(&config.dye_list)?;
    let data = Table::from_path(&config.data)?;
    if dye_list.is_empty() {
        warn!(table = dye_list.name(), "Dye list has no rows");
    }
    info!(
        dyes = dye_list.len(),
        wavelengths = data.len(),
        data_columns = data.headers().len(),
        "Loaded catalog"
    );
    import_tables(store, config, &dye_list, data, dry_run)
}

/// Imports already loaded tables. Any error rolls back the whole run; a dry
/// run rolls back after reporting.
pub fn import_tables(
    store: &mut Store,
    config: &ImportConfig,
    dye_list: &Table,
    data: Table,
    dry_run: bool,
) -> Result<ImportReport> {
    config.validate()?;
    let data = SpectralData::new(data, &config.wavelength_column)?;

    let tx = store.transaction()?;
    let mut report = Reconciler::new(config).reconcile(&*tx, dye_list, &data)?;

    if dry_run {
        tx.rollback()?;
        info!("Dry run, rolled back");
    } else {
        tx.commit()?;
        report.committed = true;
        info!(records = report.records.len(), "Import committed");
    }
    report.finished_at = Some(Utc::now());
    Ok(report)
}
