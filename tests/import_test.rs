use anyhow::Result;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

use dye_import::config::ImportConfig;
use dye_import::error::ImportError;
use dye_import::models::{Dye, Subtype};
use dye_import::reconciler::run_import;
use dye_import::report::ChangeType;
use dye_import::store::{DyeStore, Store};

const DYE_LIST: &str = "\
Name,Manufacturer,Notes
CF405S ,Biotium,
MemBrite Fix 660/680 ,Biotium,renamed
DAPI,Biotium,shared
Alexa Fluor 488,Thermo Fisher,not ours
EverBrite Blue,,no vendor
";

const DATA: &str = "\
Wavelength(nm),CF405S Abs,CF405S Em,MemBrite Fix 660/680 Abs,MemBrite Fix 660/680 Em,DAPI Abs,DAPI Em,Alexa Fluor 488 Abs,Alexa Fluor 488 Em,EverBrite Blue Abs,EverBrite Blue Em
380,0.80,,0.01,,0.5,0.1,0.2,,0.3,0.1
400,1.00,0.10,0.02,,0.4,0.3,0.4,,0.6,0.2
420,0.60,0.70,NaN,0.01,0.2,0.9,0.7,0.1,,0.5
440,,1.00,0.05,0.02,0.1,0.6,1.0,0.4,0.1,0.9
";

struct Fixture {
    _dir: TempDir,
    config: ImportConfig,
}

impl Fixture {
    fn new(dye_list: &str, data: &str) -> Result<Self> {
        let dir = tempdir()?;
        let dye_list_path = dir.path().join("dye-list.csv");
        let data_path = dir.path().join("data.csv");
        fs::write(&dye_list_path, dye_list)?;
        fs::write(&data_path, data)?;

        let config = ImportConfig {
            dye_list: dye_list_path,
            data: data_path,
            database: dir.path().join("db").join("dyes.db"),
            ..ImportConfig::default()
        };
        Ok(Self { _dir: dir, config })
    }

    fn store(&self) -> Result<Store> {
        Ok(Store::open(&self.config.database)?)
    }
}

fn seed(store: &Store, name: &str, manufacturer: &str, url: &str) -> Result<Dye> {
    let mut dye = Dye::new(name);
    dye.manufacturer = manufacturer.to_string();
    dye.url = url.to_string();
    store.connection().save_dye(&mut dye)?;
    Ok(dye)
}

fn dye_count(store: &Store) -> Result<i64> {
    Ok(store
        .connection()
        .query_row("SELECT COUNT(*) FROM dye", [], |row| row.get(0))?)
}

fn spectrum_count(store: &Store) -> Result<i64> {
    Ok(store
        .connection()
        .query_row("SELECT COUNT(*) FROM spectrum", [], |row| row.get(0))?)
}

fn spectrum(store: &Store, dye: &Dye, subtype: Subtype) -> Result<Vec<[f64; 2]>> {
    let spectra = store.connection().spectra_for_dye(dye.id.unwrap())?;
    Ok(spectra
        .into_iter()
        .find(|s| s.subtype == subtype)
        .map(|s| s.data)
        .unwrap_or_default())
}

#[test]
fn test_full_catalog_import() -> Result<()> {
    let fixture = Fixture::new(DYE_LIST, DATA)?;
    let mut store = fixture.store()?;
    let old = seed(&store, "MemBrite Fix 660", "Biotium", "https://biotium.com/membrite")?;
    let shared = seed(&store, "DAPI", "Sigma", "https://example.com/dapi")?;

    let report = run_import(&mut store, &fixture.config, false)?;
    assert!(report.committed);
    assert_eq!(report.names_with(ChangeType::Created), vec!["CF405S"]);
    assert_eq!(report.names_with(ChangeType::Renamed), vec!["MemBrite Fix 660/680"]);
    assert_eq!(
        report.names_with(ChangeType::Skipped),
        vec!["DAPI", "Alexa Fluor 488", "EverBrite Blue"]
    );

    // Renamed in place
    let renamed = store.connection().dye_by_name("MemBrite Fix 660/680")?.unwrap();
    assert_eq!(renamed.id, old.id);
    assert_eq!(renamed.slug, "membrite-fix-660-680");
    assert_eq!(renamed.url, "https://biotium.com/membrite");
    assert!(store.connection().dye_by_name("MemBrite Fix 660")?.is_none());

    // Skip list leaves the shared record alone
    let dapi = store.connection().dye_by_name("DAPI")?.unwrap();
    assert_eq!(dapi, shared);

    // Other manufacturers are never created
    assert!(store.connection().dye_by_slug("alexa-fluor-488")?.is_none());
    assert!(store.connection().dye_by_slug("everbrite-blue")?.is_none());
    assert_eq!(dye_count(&store)?, 3);

    // Missing values are dropped, file order kept
    let cf405s = store.connection().dye_by_slug("cf405s")?.unwrap();
    assert_eq!(cf405s.manufacturer, "Biotium");
    assert_eq!(
        spectrum(&store, &cf405s, Subtype::Absorption)?,
        vec![[380.0, 0.8], [400.0, 1.0], [420.0, 0.6]]
    );
    assert_eq!(
        spectrum(&store, &cf405s, Subtype::Emission)?,
        vec![[400.0, 0.1], [420.0, 0.7], [440.0, 1.0]]
    );
    assert_eq!(
        spectrum(&store, &renamed, Subtype::Absorption)?,
        vec![[380.0, 0.01], [400.0, 0.02], [440.0, 0.05]]
    );
    assert_eq!(spectrum_count(&store)?, 4);
    Ok(())
}

#[test]
fn test_reimport_is_idempotent() -> Result<()> {
    let fixture = Fixture::new(DYE_LIST, DATA)?;
    let mut store = fixture.store()?;
    seed(&store, "MemBrite Fix 660", "Biotium", "")?;

    run_import(&mut store, &fixture.config, false)?;
    let cf405s = store.connection().dye_by_slug("cf405s")?.unwrap();
    let first_abs = spectrum(&store, &cf405s, Subtype::Absorption)?;

    // The old name is gone now; the second run finds the dye by slug
    let report = run_import(&mut store, &fixture.config, false)?;
    assert_eq!(
        report.names_with(ChangeType::Found),
        vec!["CF405S", "MemBrite Fix 660/680"]
    );
    assert!(report.names_with(ChangeType::Created).is_empty());
    assert_eq!(dye_count(&store)?, 2);
    assert_eq!(spectrum_count(&store)?, 4);
    assert_eq!(spectrum(&store, &cf405s, Subtype::Absorption)?, first_abs);
    Ok(())
}

#[test]
fn test_existing_dye_keeps_row_manufacturer() -> Result<()> {
    let fixture = Fixture::new(DYE_LIST, DATA)?;
    let mut store = fixture.store()?;
    seed(&store, "Alexa Fluor 488", "Biotium", "https://biotium.com/af488")?;
    seed(&store, "EverBrite Blue", "Biotium", "https://biotium.com/everbrite")?;

    run_import(&mut store, &fixture.config, false)?;

    let alexa = store.connection().dye_by_slug("alexa-fluor-488")?.unwrap();
    assert_eq!(alexa.manufacturer, "Thermo Fisher");
    assert_eq!(alexa.url, "https://biotium.com/af488");

    let everbrite = store.connection().dye_by_slug("everbrite-blue")?.unwrap();
    assert_eq!(everbrite.manufacturer, "");
    assert_eq!(everbrite.url, "");
    assert_eq!(
        spectrum(&store, &everbrite, Subtype::Absorption)?,
        vec![[380.0, 0.3], [400.0, 0.6], [440.0, 0.1]]
    );
    Ok(())
}

#[test]
fn test_missing_column_rolls_back_everything() -> Result<()> {
    // CF405S is processed first, then the renamed dye has no Em column
    let data = "\
Wavelength(nm),CF405S Abs,CF405S Em,MemBrite Fix 660/680 Abs
380,0.8,0.1,0.01
";
    let fixture = Fixture::new(DYE_LIST, data)?;
    let mut store = fixture.store()?;
    seed(&store, "MemBrite Fix 660", "Biotium", "")?;

    let err = run_import(&mut store, &fixture.config, false).unwrap_err();
    assert!(matches!(
        err,
        ImportError::MissingColumn { ref column, .. } if column == "MemBrite Fix 660/680 Em"
    ));

    assert_eq!(dye_count(&store)?, 1);
    assert_eq!(spectrum_count(&store)?, 0);
    assert!(store.connection().dye_by_name("MemBrite Fix 660")?.is_some());
    assert!(store.connection().dye_by_slug("cf405s")?.is_none());
    Ok(())
}

#[test]
fn test_dry_run_changes_nothing() -> Result<()> {
    let fixture = Fixture::new(DYE_LIST, DATA)?;
    let mut store = fixture.store()?;
    seed(&store, "Hoechst 34580", "Biotium", "https://biotium.com/hoechst")?;
    let config = ImportConfig {
        apply_disown: true,
        ..fixture.config.clone()
    };

    let report = run_import(&mut store, &config, true)?;
    assert!(!report.committed);
    assert_eq!(
        report.names_with(ChangeType::Created),
        vec!["CF405S", "MemBrite Fix 660/680"]
    );
    assert_eq!(report.names_with(ChangeType::Disowned), vec!["Hoechst 34580"]);

    assert_eq!(dye_count(&store)?, 1);
    assert_eq!(spectrum_count(&store)?, 0);
    let hoechst = store.connection().dye_by_name("Hoechst 34580")?.unwrap();
    assert_eq!(hoechst.manufacturer, "Biotium");
    Ok(())
}

#[test]
fn test_disown_sweep() -> Result<()> {
    let fixture = Fixture::new(DYE_LIST, DATA)?;
    let mut store = fixture.store()?;
    seed(&store, "RPE-CF647T", "Biotium", "https://biotium.com/rpe")?;
    seed(&store, "Tetramethylrhodamine (TAMRA, TRITC)", "Biotium", "")?;
    seed(&store, "Hoechst 33342", "Biotium", "")?;

    let config = ImportConfig {
        apply_disown: true,
        ..fixture.config.clone()
    };
    let report = run_import(&mut store, &config, false)?;
    assert_eq!(
        report.names_with(ChangeType::Disowned),
        vec!["RPE-CF647T", "Tetramethylrhodamine (TAMRA, TRITC)"]
    );

    let rpe = store.connection().dye_by_name("RPE-CF647T")?.unwrap();
    assert_eq!(rpe.manufacturer, "");
    assert_eq!(rpe.url, "");

    // Skip-list names are never touched, not even by the sweep
    let hoechst = store.connection().dye_by_name("Hoechst 33342")?.unwrap();
    assert_eq!(hoechst.manufacturer, "Biotium");

    let remaining: Vec<String> = store
        .connection()
        .dyes_by_manufacturer("Biotium")?
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(
        remaining,
        vec!["CF405S", "Hoechst 33342", "MemBrite Fix 660/680"]
    );
    Ok(())
}

#[test]
fn test_missing_input_file() -> Result<()> {
    let fixture = Fixture::new(DYE_LIST, DATA)?;
    let mut store = fixture.store()?;
    let config = ImportConfig {
        data: Path::new("does-not-exist.csv").to_path_buf(),
        ..fixture.config.clone()
    };
    assert!(matches!(
        run_import(&mut store, &config, false),
        Err(ImportError::Io(_))
    ));
    Ok(())
}
