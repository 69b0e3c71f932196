use sha2::{Digest, Sha256};
use tracing::warn;

use crate::constants::{ABS_SUFFIX, EM_SUFFIX};
use crate::error::Result;
use crate::models::{SpectrumData, Subtype};
use crate::table::Table;

/// The vendor's spectral data file: one wavelength column plus an
/// absorption and an emission column per dye.
pub struct SpectralData {
    table: Table,
    wavelengths: Vec<Option<f64>>,
}

impl SpectralData {
    pub fn new(table: Table, wavelength_column: &str) -> Result<Self> {
        let wavelengths = table.numeric_column(wavelength_column)?;
        Ok(Self { table, wavelengths })
    }

    pub fn column_name(dye_name: &str, subtype: Subtype) -> String {
        let suffix = match subtype {
            Subtype::Absorption => ABS_SUFFIX,
            Subtype::Emission => EM_SUFFIX,
        };
        format!("{} {}", dye_name.trim(), suffix)
    }

    /// Pairs the wavelength column with the dye's column for `subtype`,
    /// dropping rows where either value is missing. File order is kept.
    pub fn curve(&self, dye_name: &str, subtype: Subtype) -> Result<SpectrumData> {
        let column = Self::column_name(dye_name, subtype);
        let values = self.table.numeric_column(&column)?;

        let data: SpectrumData = self
            .wavelengths
            .iter()
            .zip(values)
            .filter_map(|(wave, value)| Some([(*wave)?, value?]))
            .collect();

        if data.windows(2).any(|w| w[1][0] < w[0][0]) {
            warn!(column = %column, "Wavelengths are not ascending");
        }
        Ok(data)
    }
}

/// SHA-256 over the canonical JSON form of the curve
pub fn data_digest(data: &SpectrumData) -> Result<String> {
    let json = serde_json::to_string(data)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}
