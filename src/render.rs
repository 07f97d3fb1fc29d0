use std::fmt::Write as _;

use crate::colors::{Color, ColorClass};
use crate::map::WorldMap;
use crate::viewport::ViewTransform;
use crate::visa::VisaStatus;

/// Terminal glyph for each color rule.
fn glyph(class: ColorClass) -> char {
    match class {
        ColorClass::Selected => '#',
        ColorClass::Status(s) | ColorClass::Inherited(s) => match s {
            VisaStatus::VisaFree => '+',
            VisaStatus::VisaOnArrival => 'o',
            VisaStatus::EVisa => 'e',
            VisaStatus::VisaRequired => 'x',
            VisaStatus::NoAdmission => '!',
        },
        ColorClass::Antarctica => '~',
        ColorClass::NoData => '\u{00b7}',
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    color: Option<Color>,
}

const EMPTY: Cell = Cell { ch: ' ', color: None };

#[derive(Debug, Clone, Copy)]
pub struct AsciiOptions {
    pub width: usize,
    pub height: usize,
    /// Wrap glyphs in 24-bit ANSI color escapes.
    pub ansi: bool,
}

/// Canvas → character grid scaling.
struct Grid {
    cells: Vec<Vec<Cell>>,
    col_per_unit: f64,
    row_per_unit: f64,
}

impl Grid {
    fn to_cell(&self, [x, y]: [f64; 2]) -> (i32, i32) {
        ((x * self.col_per_unit) as i32, (y * self.row_per_unit) as i32)
    }

    fn put(&mut self, col: i32, row: i32, cell: Cell, overwrite: bool) {
        if col < 0 || row < 0 {
            return;
        }
        let Some(slot) = self
            .cells
            .get_mut(row as usize)
            .and_then(|r| r.get_mut(col as usize))
        else {
            return;
        };
        if overwrite || *slot == EMPTY || slot.ch == glyph(ColorClass::NoData) {
            *slot = cell;
        }
    }

    /// Bresenham line between two canvas points.
    fn line(&mut self, from: [f64; 2], to: [f64; 2], cell: Cell, overwrite: bool) {
        let (c0, r0) = self.to_cell(from);
        let (c1, r1) = self.to_cell(to);

        let (mut x, mut y) = (c0, r0);
        let dx = (c1 - c0).abs();
        let dy = -(r1 - r0).abs();
        let sx = if c0 < c1 { 1 } else { -1 };
        let sy = if r0 < r1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.put(x, y, cell, overwrite);
            if x == c1 && y == r1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}

/// Draw country outlines in the current view as text, one glyph per color
/// rule, with two-letter labels. Selected countries draw over everything.
pub fn to_ascii(map: &WorldMap, opts: AsciiOptions) -> String {
    let (canvas_w, canvas_h) = map.profile().canvas;
    let transform = map.transform();
    let mut grid = Grid {
        cells: vec![vec![EMPTY; opts.width]; opts.height],
        col_per_unit: opts.width as f64 / canvas_w,
        row_per_unit: opts.height as f64 / canvas_h,
    };

    for (entry, fill) in map.fills() {
        let class = map.color_class(&entry.iso2);
        let selected = class == ColorClass::Selected;
        let cell = Cell {
            ch: glyph(class),
            color: Some(fill),
        };
        for ring in entry.shape.polygons.iter().flatten() {
            for edge in ring.windows(2) {
                grid.line(transform.apply(edge[0]), transform.apply(edge[1]), cell, selected);
            }
        }
    }

    let projection = map.projection().config();
    for feature in map.store().features() {
        let Some((lon, lat)) = feature.label_pos else {
            continue;
        };
        if feature.iso2.is_antarctica() || feature.iso2.as_str().len() != 2 {
            continue;
        }
        let selected = map.color_class(&feature.iso2) == ColorClass::Selected;
        let (col, row) = grid.to_cell(transform.apply(projection.project(lon, lat)));
        for (i, ch) in feature.iso2.as_str().chars().enumerate() {
            let cell = Cell {
                ch,
                color: selected.then_some(map.palette().selected),
            };
            grid.put(col - 1 + i as i32, row, cell, selected);
        }
    }

    let mut out = String::new();
    for (i, row) in grid.cells.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for cell in row {
            match cell.color.filter(|_| opts.ansi) {
                Some(c) => {
                    let _ = write!(out, "\x1b[38;2;{};{};{}m{}\x1b[0m", c.r, c.g, c.b, cell.ch);
                }
                None => out.push(cell.ch),
            }
        }
    }
    out
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Standalone SVG document of the map in its current view.
pub fn to_svg(map: &WorldMap) -> String {
    let (w, h) = map.profile().canvas;
    let t: ViewTransform = map.transform();

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}">"##
    );
    let _ = writeln!(svg, r##"  <rect width="100%" height="100%" fill="#f8fafc"/>"##);
    let _ = writeln!(
        svg,
        r##"  <g transform="{}" stroke="#ffffff" stroke-width="0.8">"##,
        t.to_svg()
    );
    for (entry, fill) in map.fills() {
        let _ = writeln!(
            svg,
            r#"    <path id="shape-{}" d="{}" fill="{fill}"><title>{}</title></path>"#,
            entry.id.index(),
            entry.shape.to_path_string(),
            escape_xml(&entry.name),
        );
    }
    svg.push_str("  </g>\n</svg>\n");
    svg
}

/// One line per status: glyph, hex color and label.
pub fn legend(map: &WorldMap) -> String {
    let palette = map.palette();
    let mut out = String::new();
    for status in VisaStatus::ALL {
        let _ = writeln!(
            out,
            "{} {} {:<4} {}",
            glyph(ColorClass::Status(status)),
            palette.status(status),
            status.code(),
            status.label()
        );
    }
    let _ = writeln!(out, "{} {} selected", glyph(ColorClass::Selected), palette.selected);
    let _ = write!(out, "{} {} no data", glyph(ColorClass::NoData), palette.no_data);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::Iso2Code;
    use crate::geo::GeoFeatureStore;
    use crate::profile::ViewportProfile;
    use crate::selection::SelectionMode;

    const WORLD: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "id": "FRA", "properties": {"name": "France & co"},
         "geometry": {"type": "Polygon", "coordinates": [[[-4,43],[8,43],[8,51],[-4,51],[-4,43]]]}},
        {"type": "Feature", "id": "ESP", "properties": {"name": "Spain"},
         "geometry": {"type": "Polygon", "coordinates": [[[-9,36],[3,36],[3,43],[-9,43],[-9,36]]]}},
        {"type": "Feature", "id": "XXX", "properties": {"name": "Broken"}, "geometry": null}
    ]}"#;

    fn map() -> WorldMap {
        let store = GeoFeatureStore::from_geojson(WORLD).unwrap();
        WorldMap::new(store, ViewportProfile::desktop(), SelectionMode::Cycle)
    }

    #[test]
    fn svg_skips_degenerate_features() {
        let svg = to_svg(&map());
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("translate(0,-15) scale(1.2)"));
        assert!(svg.contains("France &amp; co"));
        assert!(svg.contains(r##"fill="#E0E0E0""##));
    }

    #[test]
    fn selected_country_is_drawn_with_selected_glyph() {
        let mut m = map();
        m.select_passport(Iso2Code::new("FR"));
        let opts = AsciiOptions {
            width: 100,
            height: 40,
            ansi: false,
        };
        let text = to_ascii(&m, opts);
        assert!(text.contains('#'));
        assert!(text.contains("FR"));
        assert_eq!(text.lines().count(), 40);
        assert!(text.lines().all(|l| l.chars().count() == 100));
    }

    #[test]
    fn ansi_output_carries_colors() {
        let opts = AsciiOptions {
            width: 60,
            height: 20,
            ansi: true,
        };
        assert!(to_ascii(&map(), opts).contains("\x1b[38;2;224;224;224m"));
    }
}
