//! Visa statuses and the per-passport status table.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codes::Iso2Code;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VisaStatus {
    #[serde(rename = "VF")]
    VisaFree,
    #[serde(rename = "VOA")]
    VisaOnArrival,
    #[serde(rename = "EV")]
    EVisa,
    #[serde(rename = "VR")]
    VisaRequired,
    #[serde(rename = "NA")]
    NoAdmission,
}

impl VisaStatus {
    pub const ALL: [VisaStatus; 5] = [
        VisaStatus::VisaFree,
        VisaStatus::VisaOnArrival,
        VisaStatus::EVisa,
        VisaStatus::VisaRequired,
        VisaStatus::NoAdmission,
    ];

    /// Wire code as used by the visa API.
    pub fn code(self) -> &'static str {
        match self {
            VisaStatus::VisaFree => "VF",
            VisaStatus::VisaOnArrival => "VOA",
            VisaStatus::EVisa => "EV",
            VisaStatus::VisaRequired => "VR",
            VisaStatus::NoAdmission => "NA",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    pub fn label(self) -> &'static str {
        match self {
            VisaStatus::VisaFree => "Visa free",
            VisaStatus::VisaOnArrival => "Visa on arrival / eTA",
            VisaStatus::EVisa => "eVisa",
            VisaStatus::VisaRequired => "Visa required",
            VisaStatus::NoAdmission => "No admission",
        }
    }
}

impl fmt::Display for VisaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Destination → status for one passport. A missing entry means the status
/// is unknown, not that no visa is needed.
///
/// Deserializing skips entries whose status is not one of the known codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, String>", into = "BTreeMap<Iso2Code, VisaStatus>")]
pub struct VisaTable {
    entries: HashMap<Iso2Code, VisaStatus>,
}

impl From<HashMap<String, String>> for VisaTable {
    fn from(raw: HashMap<String, String>) -> Self {
        raw.into_iter()
            .filter_map(|(code, status)| Some((Iso2Code::new(code), VisaStatus::from_code(&status)?)))
            .collect()
    }
}

impl From<VisaTable> for BTreeMap<Iso2Code, VisaStatus> {
    fn from(table: VisaTable) -> Self {
        table.entries.into_iter().collect()
    }
}

impl FromIterator<(Iso2Code, VisaStatus)> for VisaTable {
    fn from_iter<I: IntoIterator<Item = (Iso2Code, VisaStatus)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl VisaTable {
    pub fn get(&self, code: &Iso2Code) -> Option<VisaStatus> {
        self.entries.get(code).copied()
    }

    pub fn insert(&mut self, code: Iso2Code, status: VisaStatus) {
        self.entries.insert(code, status);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Iso2Code, VisaStatus)> {
        self.entries.iter().map(|(code, status)| (code, *status))
    }

    /// Flatten the upstream API document, which groups countries by status:
    /// `{"VF": [{"code": "BY", ...}], "VOA": [...], ...}`.
    pub fn from_upstream(doc: UpstreamDocument) -> Self {
        [
            (VisaStatus::VisaFree, doc.visa_free),
            (VisaStatus::VisaOnArrival, doc.visa_on_arrival),
            (VisaStatus::EVisa, doc.e_visa),
            (VisaStatus::VisaRequired, doc.visa_required),
            (VisaStatus::NoAdmission, doc.no_admission),
        ]
        .into_iter()
        .flat_map(|(status, countries)| {
            countries
                .into_iter()
                .filter_map(move |c| Some((Iso2Code::new(c.code?), status)))
        })
        .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpstreamCountry {
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpstreamDocument {
    #[serde(rename = "VF", default)]
    pub visa_free: Vec<UpstreamCountry>,
    #[serde(rename = "VOA", default)]
    pub visa_on_arrival: Vec<UpstreamCountry>,
    #[serde(rename = "EV", default)]
    pub e_visa: Vec<UpstreamCountry>,
    #[serde(rename = "VR", default)]
    pub visa_required: Vec<UpstreamCountry>,
    #[serde(rename = "NA", default)]
    pub no_admission: Vec<UpstreamCountry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_table_and_skips_unknown_statuses() {
        let table: VisaTable =
            serde_json::from_str(r#"{"JP": "VR", "th": "VOA", "XX": "MAYBE"}"#).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&Iso2Code::new("TH")), Some(VisaStatus::VisaOnArrival));
        assert_eq!(table.get(&Iso2Code::new("XX")), None);
    }

    #[test]
    fn serializes_as_sorted_wire_codes() {
        let table: VisaTable = [
            (Iso2Code::new("US"), VisaStatus::VisaRequired),
            (Iso2Code::new("BR"), VisaStatus::VisaFree),
        ]
        .into_iter()
        .collect();
        assert_eq!(serde_json::to_string(&table).unwrap(), r#"{"BR":"VF","US":"VR"}"#);
    }

    #[test]
    fn flattens_upstream_categories() {
        let doc: UpstreamDocument = serde_json::from_str(
            r#"{
                "VF": [{"code": "BY", "name": "Belarus"}, {"name": "no code"}],
                "EV": [{"code": "IN"}],
                "NA": [{"code": "AF"}],
                "last_updated": "2024-01-01"
            }"#,
        )
        .unwrap();
        let table = VisaTable::from_upstream(doc);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(&Iso2Code::new("BY")), Some(VisaStatus::VisaFree));
        assert_eq!(table.get(&Iso2Code::new("IN")), Some(VisaStatus::EVisa));
        assert_eq!(table.get(&Iso2Code::new("AF")), Some(VisaStatus::NoAdmission));
    }

    #[test]
    fn codes_round_trip_through_from_code() {
        for status in VisaStatus::ALL {
            assert_eq!(VisaStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(VisaStatus::from_code("vf"), None);
    }
}
