//! US state and territory codes and the shortcut sets built from them.
use std::{collections::BTreeSet, fmt, str::FromStr};

use itertools::Itertools;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;

const LOWER_48: [&str; 48] = [
    "AL", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "ID", "IL", "IN", "IA", "KS", "KY", "LA",
    "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM", "NY", "NC", "ND",
    "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA", "WV", "WI", "WY",
];
const NON_CONTIGUOUS: [&str; 2] = ["AK", "HI"];
const DISTRICT: [&str; 1] = ["DC"];
const USGS_TERRITORIES: [&str; 3] = ["GU", "PR", "VI"];
const OTHER_TERRITORIES: [&str; 6] = ["AS", "MP", "UM", "FM", "MH", "PW"];

static KNOWN_CODES: Lazy<BTreeSet<String>> = Lazy::new(|| StateSet::All.codes());

/// Returns true for any recognized state, district or territory code.
#[must_use]
pub fn is_known_code(code: &str) -> bool {
    KNOWN_CODES.contains(code)
}

/// The configured state-filter option, before it is applied to a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateSet {
    /// Every recognized state and territory.
    #[default]
    All,
    /// Contiguous states plus DC (`48`).
    Lower48,
    /// All fifty states plus DC (`50`).
    Fifty,
    /// Fifty states, DC, Guam, Puerto Rico and the Virgin Islands (`usgs`).
    Usgs,
    /// An explicit list of codes.
    Codes(BTreeSet<String>),
}

impl StateSet {
    /// Build an explicit set, dropping (and logging) anything unrecognized.
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codes = codes
            .into_iter()
            .map(|code| code.as_ref().trim().to_uppercase())
            .filter(|code| !code.is_empty())
            .filter(|code| {
                let known = is_known_code(code);
                if !known {
                    warn!(code = %code, "Ignoring unrecognized state code");
                }
                known
            })
            .collect();
        Self::Codes(codes)
    }

    /// Expand the shortcut into its concrete code set.
    #[must_use]
    pub fn codes(&self) -> BTreeSet<String> {
        let groups: &[&[&str]] = match self {
            Self::Lower48 => &[&LOWER_48, &DISTRICT],
            Self::Fifty => &[&LOWER_48, &DISTRICT, &NON_CONTIGUOUS],
            Self::Usgs => &[&LOWER_48, &DISTRICT, &NON_CONTIGUOUS, &USGS_TERRITORIES],
            Self::All => &[
                &LOWER_48,
                &DISTRICT,
                &NON_CONTIGUOUS,
                &USGS_TERRITORIES,
                &OTHER_TERRITORIES,
            ],
            Self::Codes(codes) => return codes.clone(),
        };
        groups
            .iter()
            .flat_map(|group| group.iter())
            .map(ToString::to_string)
            .collect()
    }

    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl FromStr for StateSet {
    type Err = String;

    /// Accepts `all`, `48`, `50`, `usgs`, or a comma separated list of codes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "48" => Ok(Self::Lower48),
            "50" => Ok(Self::Fifty),
            "usgs" => Ok(Self::Usgs),
            list => {
                let set = Self::from_codes(list.split(','));
                match &set {
                    Self::Codes(codes) if codes.is_empty() => {
                        Err(format!("no recognized state codes in '{s}'"))
                    }
                    _ => Ok(set),
                }
            }
        }
    }
}

/// The state filter in effect for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateFilter {
    All,
    Only(BTreeSet<String>),
}

impl StateFilter {
    #[must_use]
    pub fn single(code: impl Into<String>) -> Self {
        Self::Only(BTreeSet::from([code.into()]))
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(codes) => codes.contains(code),
        }
    }

    /// Codes to send upstream; `None` means "don't filter".
    #[must_use]
    pub fn to_param(&self) -> Option<Vec<String>> {
        match self {
            Self::All => None,
            Self::Only(codes) => Some(codes.iter().cloned().collect()),
        }
    }
}

impl fmt::Display for StateFilter {
    /// `ALL`, or the codes as a sorted CSV.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "ALL"),
            Self::Only(codes) => write!(f, "{}", codes.iter().join(",")),
        }
    }
}

impl From<&StateSet> for StateFilter {
    fn from(set: &StateSet) -> Self {
        match set {
            StateSet::All => Self::All,
            other => Self::Only(other.codes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcut_sizes() {
        assert_eq!(StateSet::Lower48.codes().len(), 49);
        assert_eq!(StateSet::Fifty.codes().len(), 51);
        assert_eq!(StateSet::Usgs.codes().len(), 54);
        assert_eq!(StateSet::All.codes().len(), 60);
    }

    #[test]
    fn test_lower48_excludes_alaska_and_hawaii() {
        let codes = StateSet::Lower48.codes();
        assert!(codes.contains("DC"));
        assert!(codes.contains("TX"));
        assert!(!codes.contains("AK"));
        assert!(!codes.contains("HI"));
    }

    #[test]
    fn test_usgs_adds_territories() {
        let codes = StateSet::Usgs.codes();
        for code in ["AK", "HI", "GU", "PR", "VI"] {
            assert!(codes.contains(code), "missing {code}");
        }
        assert!(!codes.contains("AS"));
    }

    #[test]
    fn test_parse_shortcuts() {
        assert_eq!("48".parse::<StateSet>().unwrap(), StateSet::Lower48);
        assert_eq!("50".parse::<StateSet>().unwrap(), StateSet::Fifty);
        assert_eq!("USGS".parse::<StateSet>().unwrap(), StateSet::Usgs);
        assert_eq!("all".parse::<StateSet>().unwrap(), StateSet::All);
        assert_eq!("".parse::<StateSet>().unwrap(), StateSet::All);
    }

    #[test]
    fn test_parse_code_list() {
        let set: StateSet = "tx, ok,ZZ".parse().unwrap();
        assert_eq!(
            set,
            StateSet::Codes(BTreeSet::from(["OK".to_string(), "TX".to_string()]))
        );
        assert!("ZZ,QQ".parse::<StateSet>().is_err());
    }

    #[test]
    fn test_filter_display_is_sorted_csv() {
        let filter = StateFilter::Only(BTreeSet::from(["TX".to_string(), "OK".to_string()]));
        assert_eq!(filter.to_string(), "OK,TX");
        assert_eq!(StateFilter::All.to_string(), "ALL");
        assert_eq!(StateFilter::All.to_param(), None);
    }
}
