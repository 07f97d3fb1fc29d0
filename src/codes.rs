//! Country identifiers and the native-code → ISO 3166-1 alpha-2 resolver.
//!
//! The geographic dataset keys its features by whatever its authors chose
//! (mostly alpha-3, plus a few composite ids). Everything past the feature
//! store talks in [`Iso2Code`], so every native id goes through [`resolve`].

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Two-letter country code used for selection state and visa lookups.
///
/// Codes are stored upper-cased. Unknown dataset ids pass through
/// [`resolve`] unchanged, so the value is not guaranteed to be two letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Iso2Code(String);

impl Iso2Code {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Antarctica resolves to this code and is never selectable.
    pub fn is_antarctica(&self) -> bool {
        self.0 == ANTARCTICA
    }
}

impl fmt::Display for Iso2Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Iso2Code {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Iso2Code {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Raw feature id as stored in the dataset (`"FRA"`, `"CS-KM"`, `"-99"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NativeCode(String);

impl NativeCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn resolve(&self) -> Iso2Code {
        resolve(&self.0)
    }
}

impl fmt::Display for NativeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub const ANTARCTICA: &str = "AQ";

/// Dataset ids that do not follow alpha-3, or whose polygons belong to
/// another country's visa jurisdiction.
const SPECIAL_CODES: &[(&str, &str)] = &[
    // Kosovo carries a composite id in Natural Earth derived datasets.
    ("CS-KM", "XK"),
    ("KOS", "XK"),
    ("XKX", "XK"),
    // Svalbard and Jan Mayen: entry is governed by Norway.
    ("SJM", "NO"),
    ("ATA", ANTARCTICA),
];

/// Sorted by alpha-3 so lookups can binary search.
const ISO3_TO_ISO2: &[(&str, &str)] = &[
    ("ABW", "AW"), ("AFG", "AF"), ("AGO", "AO"), ("AIA", "AI"), ("ALA", "AX"), ("ALB", "AL"),
    ("AND", "AD"), ("ARE", "AE"), ("ARG", "AR"), ("ARM", "AM"), ("ASM", "AS"), ("ATA", "AQ"),
    ("ATF", "TF"), ("ATG", "AG"), ("AUS", "AU"), ("AUT", "AT"), ("AZE", "AZ"), ("BDI", "BI"),
    ("BEL", "BE"), ("BEN", "BJ"), ("BES", "BQ"), ("BFA", "BF"), ("BGD", "BD"), ("BGR", "BG"),
    ("BHR", "BH"), ("BHS", "BS"), ("BIH", "BA"), ("BLM", "BL"), ("BLR", "BY"), ("BLZ", "BZ"),
    ("BMU", "BM"), ("BOL", "BO"), ("BRA", "BR"), ("BRB", "BB"), ("BRN", "BN"), ("BTN", "BT"),
    ("BVT", "BV"), ("BWA", "BW"), ("CAF", "CF"), ("CAN", "CA"), ("CCK", "CC"), ("CHE", "CH"),
    ("CHL", "CL"), ("CHN", "CN"), ("CIV", "CI"), ("CMR", "CM"), ("COD", "CD"), ("COG", "CG"),
    ("COK", "CK"), ("COL", "CO"), ("COM", "KM"), ("CPV", "CV"), ("CRI", "CR"), ("CUB", "CU"),
    ("CUW", "CW"), ("CXR", "CX"), ("CYM", "KY"), ("CYP", "CY"), ("CZE", "CZ"), ("DEU", "DE"),
    ("DJI", "DJ"), ("DMA", "DM"), ("DNK", "DK"), ("DOM", "DO"), ("DZA", "DZ"), ("ECU", "EC"),
    ("EGY", "EG"), ("ERI", "ER"), ("ESH", "EH"), ("ESP", "ES"), ("EST", "EE"), ("ETH", "ET"),
    ("FIN", "FI"), ("FJI", "FJ"), ("FLK", "FK"), ("FRA", "FR"), ("FRO", "FO"), ("FSM", "FM"),
    ("GAB", "GA"), ("GBR", "GB"), ("GEO", "GE"), ("GGY", "GG"), ("GHA", "GH"), ("GIB", "GI"),
    ("GIN", "GN"), ("GLP", "GP"), ("GMB", "GM"), ("GNB", "GW"), ("GNQ", "GQ"), ("GRC", "GR"),
    ("GRD", "GD"), ("GRL", "GL"), ("GTM", "GT"), ("GUF", "GF"), ("GUM", "GU"), ("GUY", "GY"),
    ("HKG", "HK"), ("HMD", "HM"), ("HND", "HN"), ("HRV", "HR"), ("HTI", "HT"), ("HUN", "HU"),
    ("IDN", "ID"), ("IMN", "IM"), ("IND", "IN"), ("IOT", "IO"), ("IRL", "IE"), ("IRN", "IR"),
    ("IRQ", "IQ"), ("ISL", "IS"), ("ISR", "IL"), ("ITA", "IT"), ("JAM", "JM"), ("JEY", "JE"),
    ("JOR", "JO"), ("JPN", "JP"), ("KAZ", "KZ"), ("KEN", "KE"), ("KGZ", "KG"), ("KHM", "KH"),
    ("KIR", "KI"), ("KNA", "KN"), ("KOR", "KR"), ("KWT", "KW"), ("LAO", "LA"), ("LBN", "LB"),
    ("LBR", "LR"), ("LBY", "LY"), ("LCA", "LC"), ("LIE", "LI"), ("LKA", "LK"), ("LSO", "LS"),
    ("LTU", "LT"), ("LUX", "LU"), ("LVA", "LV"), ("MAC", "MO"), ("MAF", "MF"), ("MAR", "MA"),
    ("MCO", "MC"), ("MDA", "MD"), ("MDG", "MG"), ("MDV", "MV"), ("MEX", "MX"), ("MHL", "MH"),
    ("MKD", "MK"), ("MLI", "ML"), ("MLT", "MT"), ("MMR", "MM"), ("MNE", "ME"), ("MNG", "MN"),
    ("MNP", "MP"), ("MOZ", "MZ"), ("MRT", "MR"), ("MSR", "MS"), ("MTQ", "MQ"), ("MUS", "MU"),
    ("MWI", "MW"), ("MYS", "MY"), ("MYT", "YT"), ("NAM", "NA"), ("NCL", "NC"), ("NER", "NE"),
    ("NFK", "NF"), ("NGA", "NG"), ("NIC", "NI"), ("NIU", "NU"), ("NLD", "NL"), ("NOR", "NO"),
    ("NPL", "NP"), ("NRU", "NR"), ("NZL", "NZ"), ("OMN", "OM"), ("PAK", "PK"), ("PAN", "PA"),
    ("PCN", "PN"), ("PER", "PE"), ("PHL", "PH"), ("PLW", "PW"), ("PNG", "PG"), ("POL", "PL"),
    ("PRI", "PR"), ("PRK", "KP"), ("PRT", "PT"), ("PRY", "PY"), ("PSE", "PS"), ("PYF", "PF"),
    ("QAT", "QA"), ("REU", "RE"), ("ROU", "RO"), ("RUS", "RU"), ("RWA", "RW"), ("SAU", "SA"),
    ("SDN", "SD"), ("SEN", "SN"), ("SGP", "SG"), ("SGS", "GS"), ("SHN", "SH"), ("SLB", "SB"),
    ("SLE", "SL"), ("SLV", "SV"), ("SMR", "SM"), ("SOM", "SO"), ("SPM", "PM"), ("SRB", "RS"),
    ("SSD", "SS"), ("STP", "ST"), ("SUR", "SR"), ("SVK", "SK"), ("SVN", "SI"), ("SWE", "SE"),
    ("SWZ", "SZ"), ("SXM", "SX"), ("SYC", "SC"), ("SYR", "SY"), ("TCA", "TC"), ("TCD", "TD"),
    ("TGO", "TG"), ("THA", "TH"), ("TJK", "TJ"), ("TKL", "TK"), ("TKM", "TM"), ("TLS", "TL"),
    ("TON", "TO"), ("TTO", "TT"), ("TUN", "TN"), ("TUR", "TR"), ("TUV", "TV"), ("TWN", "TW"),
    ("TZA", "TZ"), ("UGA", "UG"), ("UKR", "UA"), ("UMI", "UM"), ("URY", "UY"), ("USA", "US"),
    ("UZB", "UZ"), ("VAT", "VA"), ("VCT", "VC"), ("VEN", "VE"), ("VGB", "VG"), ("VIR", "VI"),
    ("VNM", "VN"), ("VUT", "VU"), ("WLF", "WF"), ("WSM", "WS"), ("YEM", "YE"), ("ZAF", "ZA"),
    ("ZMB", "ZM"), ("ZWE", "ZW"),
];

/// Map a dataset id to the code the rest of the system uses.
///
/// Total: two-letter input is returned upper-cased (so resolving twice is a
/// no-op) and anything unrecognised passes through as-is.
pub fn resolve(native: &str) -> Iso2Code {
    let native = native.trim();
    let upper = native.to_ascii_uppercase();

    if let Some((_, iso2)) = SPECIAL_CODES.iter().find(|(id, _)| *id == upper) {
        return Iso2Code::new(iso2);
    }

    if upper.len() == 2 && upper.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Iso2Code(upper);
    }

    match ISO3_TO_ISO2.binary_search_by_key(&upper.as_str(), |&(iso3, _)| iso3) {
        Ok(idx) => Iso2Code::new(ISO3_TO_ISO2[idx].1),
        Err(_) => Iso2Code::new(native),
    }
}

/// Validate a code arriving from outside (URL path, CLI flag): exactly two
/// ASCII letters, returned upper-cased. Padding is not stripped.
pub fn parse_iso2(code: &str) -> Option<Iso2Code> {
    (code.len() == 2 && code.bytes().all(|b| b.is_ascii_alphabetic())).then(|| Iso2Code::new(code))
}

/// Whether a resolved code may be picked as passport or destination.
pub fn is_selectable(code: &Iso2Code) -> bool {
    !code.is_antarctica()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha3_table_is_sorted() {
        assert!(ISO3_TO_ISO2.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn resolves_alpha3() {
        assert_eq!(resolve("FRA").as_str(), "FR");
        assert_eq!(resolve("jpn").as_str(), "JP");
        assert_eq!(resolve("GRL").as_str(), "GL");
    }

    #[test]
    fn special_territories() {
        assert_eq!(resolve("CS-KM").as_str(), "XK");
        assert_eq!(resolve("SJM").as_str(), "NO");
        assert!(resolve("ATA").is_antarctica());
        assert!(!is_selectable(&resolve("ATA")));
    }

    #[test]
    fn unknown_codes_pass_through() {
        assert_eq!(resolve("-99").as_str(), "-99");
        assert_eq!(resolve("ZZZ").as_str(), "ZZZ");
    }

    #[test]
    fn external_codes_must_be_two_characters() {
        assert_eq!(parse_iso2("de"), Some(Iso2Code::new("DE")));
        assert_eq!(parse_iso2("DEU"), None);
        assert_eq!(parse_iso2(""), None);
    }

    #[test]
    fn padded_or_non_letter_codes_are_rejected() {
        assert_eq!(parse_iso2(" f"), None);
        assert_eq!(parse_iso2("d "), None);
        assert_eq!(parse_iso2("-9"), None);
        assert_eq!(parse_iso2("é"), None);
    }

    #[test]
    fn resolving_twice_is_stable() {
        for (iso3, _) in ISO3_TO_ISO2.iter().chain(SPECIAL_CODES) {
            let once = resolve(iso3);
            assert_eq!(resolve(once.as_str()), once, "{iso3}");
        }
        assert_eq!(resolve("fr").as_str(), "FR");
    }
}
