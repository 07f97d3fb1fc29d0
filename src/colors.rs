//! Fill color for each country given the current selection and visa table.

use std::fmt;

use crate::codes::{Iso2Code, resolve};
use crate::selection::SelectionState;
use crate::visa::{VisaStatus, VisaTable};

/// Dependency → administering country whose status it takes when the table
/// has no entry of its own.
pub const INHERITED_JURISDICTIONS: &[(&str, &str)] = &[("GL", "DK")];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: (hex >> 16) as u8,
            g: (hex >> 8) as u8,
            b: hex as u8,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub visa_free: Color,
    pub visa_on_arrival: Color,
    pub e_visa: Color,
    pub visa_required: Color,
    pub no_admission: Color,
    pub selected: Color,
    pub no_data: Color,
    pub antarctica: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            visa_free: Color::from_hex(0x4CAF50),
            visa_on_arrival: Color::from_hex(0xFFC107),
            e_visa: Color::from_hex(0x2196F3),
            visa_required: Color::from_hex(0xFF9800),
            no_admission: Color::from_hex(0xF44336),
            selected: Color::from_hex(0x9C27B0),
            no_data: Color::from_hex(0xE0E0E0),
            antarctica: Color::from_hex(0xB0B0B0),
        }
    }
}

impl Palette {
    pub fn status(&self, status: VisaStatus) -> Color {
        match status {
            VisaStatus::VisaFree => self.visa_free,
            VisaStatus::VisaOnArrival => self.visa_on_arrival,
            VisaStatus::EVisa => self.e_visa,
            VisaStatus::VisaRequired => self.visa_required,
            VisaStatus::NoAdmission => self.no_admission,
        }
    }

    pub fn color(&self, class: ColorClass) -> Color {
        match class {
            ColorClass::Selected => self.selected,
            ColorClass::Status(s) | ColorClass::Inherited(s) => self.status(s),
            ColorClass::Antarctica => self.antarctica,
            ColorClass::NoData => self.no_data,
        }
    }
}

/// Which precedence rule decided a country's color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorClass {
    Selected,
    Status(VisaStatus),
    /// Status borrowed from the administering country.
    Inherited(VisaStatus),
    Antarctica,
    NoData,
}

/// Decide the color rule for `code` (a native or two-letter code).
pub fn classify(code: &str, selection: &SelectionState, table: &VisaTable) -> ColorClass {
    let code = resolve(code);

    let highlighted = [selection.destination(), selection.passport()]
        .into_iter()
        .flatten()
        .any(|selected| resolve(selected.as_str()) == code);
    if highlighted {
        return ColorClass::Selected;
    }

    // Data for another passport must never leak through, so statuses only
    // apply once a passport is chosen.
    if selection.passport().is_some() && !table.is_empty() {
        if let Some(status) = table.get(&code) {
            return ColorClass::Status(status);
        }
        let inherited = INHERITED_JURISDICTIONS
            .iter()
            .find(|(dependency, _)| code.as_str() == *dependency)
            .and_then(|(_, metropole)| table.get(&Iso2Code::new(metropole)));
        if let Some(status) = inherited {
            return ColorClass::Inherited(status);
        }
    }

    if code.is_antarctica() {
        return ColorClass::Antarctica;
    }
    ColorClass::NoData
}

pub fn color_for(code: &str, selection: &SelectionState, table: &VisaTable, palette: &Palette) -> Color {
    palette.color(classify(code, selection, table))
}
