//! Controlled value lists for AERONET queryables.

use std::collections::HashMap;
use std::path::Path;

/// Queryable selecting between CSV and HTML output.
pub const FORMAT_ATTRIBUTE: &str = "format";
/// Queryable selecting all-points vs daily-average records.
pub const DATA_FORMAT_ATTRIBUTE: &str = "data_format";
pub const DATA_TYPE_ATTRIBUTE: &str = "data_type";
pub const SITE_ATTRIBUTE: &str = "site";

pub const FORMAT_VALUES: [&str; 2] = ["csv", "html"];
pub const DATA_FORMAT_VALUES: [&str; 2] = ["all-points", "daily-average"];
pub const DATA_TYPES: [&str; 9] = [
    "AOD10", "AOD15", "AOD20", "SDA10", "SDA15", "SDA20", "TOT10", "TOT15", "TOT20",
];
/// Values that are sent as `<value>=1` on top of the data types.
pub const EXTRA_FLAGS: [&str; 2] = ["if_no_html", "lunar_merge"];

const SITE_NAME_COLUMN: &str = "Site_Name";
const BUILTIN_SITE_LIST: &str = include_str!("../../data/aeronet_locations_v3.txt");

#[derive(Debug, thiserror::Error)]
pub enum VocabularyError {
    #[error("failed to read site list {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed site list: {0}")]
    Malformed(String),
}

/// Accepted values per queryable, plus the flag-style values.
///
/// Read-only once built; share it by reference across translations.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    accepted: HashMap<String, Vec<String>>,
    flags: Vec<String>,
}

impl Vocabulary {
    /// Build the tables around the given site names.
    pub fn with_sites(sites: Vec<String>) -> Self {
        let owned = |values: &[&str]| values.iter().map(|v| v.to_string()).collect::<Vec<_>>();

        let accepted = HashMap::from([
            (FORMAT_ATTRIBUTE.to_string(), owned(&FORMAT_VALUES)),
            (DATA_TYPE_ATTRIBUTE.to_string(), owned(&DATA_TYPES)),
            (DATA_FORMAT_ATTRIBUTE.to_string(), owned(&DATA_FORMAT_VALUES)),
            (SITE_ATTRIBUTE.to_string(), sites),
        ]);

        let mut flags = owned(&DATA_TYPES);
        flags.extend(owned(&EXTRA_FLAGS));

        Self { accepted, flags }
    }

    /// Load the site list file and build the tables.
    pub fn load(path: &Path) -> Result<Self, VocabularyError> {
        let contents = std::fs::read_to_string(path).map_err(|source| VocabularyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let vocabulary = Self::from_site_list(&contents)?;
        tracing::info!(
            "Vocabulary: {} sites loaded from {:?}",
            vocabulary.sites().len(),
            path
        );
        Ok(vocabulary)
    }

    /// Tables built from the site list bundled with the binary.
    pub fn builtin() -> Result<Self, VocabularyError> {
        Self::from_site_list(BUILTIN_SITE_LIST)
    }

    /// Parse the AERONET site list format:
    ///
    /// ```text
    /// AERONET_Database_Site_List,Num=2,Date_Generated=06:11:2025
    /// Site_Name,Longitude(decimal_degrees),Latitude(decimal_degrees),Elevation(meters)
    /// Cuiaba,-56.070214,-15.555244,234.000000
    /// ```
    pub fn from_site_list(contents: &str) -> Result<Self, VocabularyError> {
        let mut lines = contents.lines().map(str::trim).filter(|l| !l.is_empty());

        lines
            .next()
            .ok_or_else(|| VocabularyError::Malformed("empty file".to_string()))?;
        let header = lines
            .next()
            .ok_or_else(|| VocabularyError::Malformed("missing column header".to_string()))?;
        let column = header
            .split(',')
            .position(|name| name.trim() == SITE_NAME_COLUMN)
            .ok_or_else(|| {
                VocabularyError::Malformed(format!("no {} column in '{}'", SITE_NAME_COLUMN, header))
            })?;

        let mut sites = Vec::new();
        for (idx, line) in lines.enumerate() {
            let name = line
                .split(',')
                .nth(column)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| {
                    VocabularyError::Malformed(format!("row {} has no site name: '{}'", idx + 1, line))
                })?;
            sites.push(name.to_string());
        }

        if sites.is_empty() {
            return Err(VocabularyError::Malformed("no sites listed".to_string()));
        }

        Ok(Self::with_sites(sites))
    }

    /// Accepted values for a queryable, if it is constrained.
    pub fn accepted(&self, attribute: &str) -> Option<&[String]> {
        self.accepted.get(attribute).map(Vec::as_slice)
    }

    /// Whether `value` is sent as a `<value>=1` flag.
    pub fn is_flag(&self, value: &str) -> bool {
        self.flags.iter().any(|flag| flag == value)
    }

    pub fn sites(&self) -> &[String] {
        self.accepted(SITE_ATTRIBUTE).unwrap_or_default()
    }
}
