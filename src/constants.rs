//! Defaults for the Biotium catalog import.

pub const BIOTIUM: &str = "Biotium";

pub const DATA_DIR: &str = "data";
pub const BIOTIUM_DYE_LIST: &str = "Biotium-121823-dye-list.csv";
pub const BIOTIUM_DATA: &str = "Biotium-121823-data.csv";

pub const DEFAULT_DATABASE: &str = "dyes.db";
pub const DATABASE_ENV: &str = "DYE_IMPORT_DATABASE";

pub const WAVELENGTH_COLUMN: &str = "Wavelength(nm)";
pub const ABS_SUFFIX: &str = "Abs";
pub const EM_SUFFIX: &str = "Em";

/// Current vendor name -> name previously stored in the database.
pub const NAME_CHANGES: &[(&str, &str)] = &[
    ("MemBrite Fix 660/680", "MemBrite Fix 660"),
    ("MemBrite Fix 680/700", "MemBrite Fix 680"),
    ("MemBrite Fix 543/560", "MemBrite Fix 543"),
    ("MemBrite Fix 640/660", "MemBrite Fix 640"),
    ("MemBrite Fix 594/615", "MemBrite Fix 594"),
    ("MemBrite Fix 488/515", "MemBrite Fix 488"),
    ("MemBrite Fix 568/580", "MemBrite Fix 568"),
    ("MemBrite Fix 405/430", "MemBrite Fix 405"),
    ("BactoView Live Red", "BactoView Red"),
    ("BactoView Live Green", "BactoView Green"),
    ("PE (R-PE / R-phycoerythrin)", "PE (R-PE, R-phycoerythrin)"),
];

/// Generic dyes sold by many manufacturers; the catalog entry must not
/// claim the shared record.
pub const SKIP_NAMES: &[&str] = &["DAPI", "Hoechst 33342", "Propidium Iodide"];

// Dyes attributed to Biotium that are absent from the 12/18/23 data file:
// 'Tetramethylrhodamine (TAMRA, TRITC)', 'RPE-CF647T', 'Hoechst 34580'
