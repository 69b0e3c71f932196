use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::slug::dye_slug;

/// A dye record in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dye {
    pub id: Option<i64>,
    pub name: String,
    pub slug: String,
    /// Empty means unattributed
    pub manufacturer: String,
    pub url: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Dye {
    /// Unsaved dye with the slug derived from `name`
    pub fn new(name: &str) -> Self {
        let now = Utc::now();
        let name = name.trim().to_string();
        Self {
            id: None,
            slug: dye_slug(&name),
            name,
            manufacturer: String::new(),
            url: String::new(),
            created: now,
            modified: now,
        }
    }

    pub fn rename(&mut self, name: &str) {
        self.name = name.trim().to_string();
        self.slug = dye_slug(&self.name);
    }

    /// Sets the manufacturer; an unattributed dye keeps no URL.
    pub fn attribute_to(&mut self, manufacturer: &str) {
        self.manufacturer = manufacturer.to_string();
        if self.manufacturer.is_empty() {
            self.url.clear();
        }
    }

    pub fn disown(&mut self) {
        self.attribute_to("");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subtype {
    #[serde(rename = "ab")]
    Absorption,
    #[serde(rename = "em")]
    Emission,
}

impl Subtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subtype::Absorption => "ab",
            Subtype::Emission => "em",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ab" => Some(Subtype::Absorption),
            "em" => Some(Subtype::Emission),
            _ => None,
        }
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "dye")]
    Dye,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Dye => "dye",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "dye" => Some(Category::Dye),
            _ => None,
        }
    }
}

/// (wavelength, intensity) pairs in file order
pub type SpectrumData = Vec<[f64; 2]>;

/// A spectral curve owned by one dye
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    pub id: Option<i64>,
    pub owner_dye_id: i64,
    pub subtype: Subtype,
    pub category: Category,
    pub data: SpectrumData,
}

/// Result of a spectrum upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpsertOutcome {
    Created,
    Updated,
    Unchanged,
}
