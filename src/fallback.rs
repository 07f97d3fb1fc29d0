//! Built-in statuses served when the visa API is unreachable.
//!
//! This is a degraded mode: the data is coarse and only covers a few dozen
//! destinations. Anything missing renders as "no data".

use crate::codes::Iso2Code;
use crate::visa::{VisaStatus, VisaTable};

use crate::visa::VisaStatus::{
    EVisa as EV, NoAdmission as NA, VisaFree as VF, VisaOnArrival as VOA, VisaRequired as VR,
};

const RU_PASSPORT: &[(VisaStatus, &[&str])] = &[
    (VF, &[
        "BY", "KZ", "KG", "AM", "AZ", "MD", "UA", "GE", "UZ", "TJ", "RS", "ME", "BA", "MK", "AL",
        "TR", "IL", "AR", "BR", "CL", "CR", "EC", "GT", "HN", "NI", "PA", "PE", "PY", "UY", "VE",
    ]),
    (VOA, &["EG", "JO", "LB", "MA", "TN", "ID", "TH", "VN", "KH", "LA", "MM", "NP", "LK", "MV", "BD"]),
    (EV, &["IN", "CN", "KE", "TZ", "ZM", "ZW", "ET", "RW", "UG", "BF"]),
    (VR, &[
        "US", "GB", "CA", "AU", "NZ", "JP", "KR", "SG", "MY", "PH", "DE", "FR", "IT", "ES", "PT",
        "NL", "BE", "AT", "CH", "SE", "NO", "DK", "FI", "IS", "IE", "PL", "CZ", "SK", "HU", "SI",
        "HR", "BG", "RO", "EE", "LV", "LT", "GR", "CY", "MT", "LU",
    ]),
    (NA, &["AF", "IQ", "SY", "YE", "SO"]),
];

const ANY_PASSPORT: &[(VisaStatus, &[&str])] = &[
    (VF, &["RU", "BR", "TR"]),
    (VOA, &["EG", "TH"]),
    (EV, &["CN", "IN"]),
    (VR, &["US", "GB", "DE", "FR", "IT", "JP", "CA", "AU", "SG"]),
];

/// Static table for `passport`. Only Russian passports get the detailed
/// list; everything else gets a short generic one.
pub fn fallback_table(passport: &Iso2Code) -> VisaTable {
    let groups = if passport.as_str() == "RU" {
        RU_PASSPORT
    } else {
        ANY_PASSPORT
    };
    groups
        .iter()
        .flat_map(|(status, codes)| codes.iter().map(move |code| (Iso2Code::new(code), *status)))
        .filter(|(code, _)| code != passport)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn russian_passport_gets_detailed_table() {
        let table = fallback_table(&Iso2Code::new("RU"));
        assert!(table.len() > 90);
        assert_eq!(table.get(&Iso2Code::new("TH")), Some(VisaStatus::VisaOnArrival));
        assert_eq!(table.get(&Iso2Code::new("AF")), Some(VisaStatus::NoAdmission));
    }

    #[test]
    fn other_passports_get_generic_table_without_themselves() {
        let table = fallback_table(&Iso2Code::new("DE"));
        assert_eq!(table.get(&Iso2Code::new("DE")), None);
        assert_eq!(table.get(&Iso2Code::new("US")), Some(VisaStatus::VisaRequired));
        assert_eq!(table.get(&Iso2Code::new("ZA")), None);
    }
}
