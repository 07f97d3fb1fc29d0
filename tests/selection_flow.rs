use pretty_assertions::assert_eq;

use visa_map::codes::Iso2Code;
use visa_map::colors::ColorClass;
use visa_map::fallback::fallback_table;
use visa_map::fetch::TableSource;
use visa_map::geo::GeoFeatureStore;
use visa_map::map::{MapEvent, WorldMap};
use visa_map::profile::ViewportProfile;
use visa_map::selection::{Phase, SelectionMode};
use visa_map::visa::VisaStatus;

static GEOJSON: &str = include_str!("../data/countries.geojson");

fn world() -> WorldMap {
    let store = GeoFeatureStore::from_geojson(GEOJSON).unwrap();
    WorldMap::new(store, ViewportProfile::desktop(), SelectionMode::Cycle)
}

fn at(map: &WorldMap, lon: f64, lat: f64) -> [f64; 2] {
    map.transform().apply(map.projection().config().project(lon, lat))
}

/// Click a passport and answer its fetch from the built-in tables.
fn pick_passport(map: &mut WorldMap, position: [f64; 2]) -> Iso2Code {
    let Some(MapEvent::FetchVisaTable(ticket)) = map.pointer_down(position) else {
        panic!("expected a fetch request");
    };
    let passport = ticket.passport().clone();
    assert_eq!(map.complete_fetch(ticket, fallback_table(&passport), TableSource::Fallback), None);
    assert_eq!(map.visa_source(), Some(TableSource::Fallback));
    passport
}

#[test]
fn france_to_japan() {
    let mut map = world();
    let france = at(&map, 2.0, 47.0);
    assert_eq!(pick_passport(&mut map, france), Iso2Code::new("FR"));
    assert_eq!(map.selection().phase(), Phase::AwaitingDestination);

    assert_eq!(
        map.select_destination(Iso2Code::new("JP")),
        Some(MapEvent::ShowDetails {
            passport: Some(Iso2Code::new("FR")),
            destination: Iso2Code::new("JP"),
            status: Some(VisaStatus::VisaRequired),
        })
    );
    assert_eq!(map.color_class(&Iso2Code::new("FR")), ColorClass::Selected);
    assert_eq!(map.color_class(&Iso2Code::new("JP")), ColorClass::Selected);
    assert_eq!(
        map.color_class(&Iso2Code::new("TH")),
        ColorClass::Status(VisaStatus::VisaOnArrival)
    );
}

#[test]
fn same_country_twice_is_refused() {
    let mut map = world();
    let russia = at(&map, 100.0, 60.0);
    assert_eq!(pick_passport(&mut map, russia), Iso2Code::new("RU"));
    assert_eq!(
        map.pointer_down(russia),
        Some(MapEvent::SameCountryWarning(Iso2Code::new("RU")))
    );
    assert_eq!(map.selection().destination(), None);
    assert_eq!(map.selection().phase(), Phase::AwaitingDestination);
}

#[test]
fn greenland_follows_denmark() {
    let mut map = world();
    let russia = at(&map, 100.0, 60.0);
    pick_passport(&mut map, russia);
    assert_eq!(map.visa_table().get(&Iso2Code::new("GL")), None);
    assert_eq!(
        map.color_class(&Iso2Code::new("GL")),
        ColorClass::Inherited(VisaStatus::VisaRequired)
    );
}

#[test]
fn antarctica_and_ocean_clicks_are_ignored() {
    let mut map = world();
    assert_eq!(map.pointer_down(at(&map, 0.0, -80.0)), None);
    assert_eq!(map.pointer_down(at(&map, -150.0, 0.0)), None);
    assert_eq!(map.selection().passport(), None);
    assert_eq!(map.color_class(&Iso2Code::new("AQ")), ColorClass::Antarctica);
}

#[test]
fn bundled_data_resolves_special_codes() {
    let map = world();
    let store = map.store();
    assert_eq!(store.features_for(&Iso2Code::new("XK")).count(), 1);
    assert_eq!(store.features_for(&Iso2Code::new("NO")).count(), 2);
    assert!(store.contains(&Iso2Code::new("AQ")));
    // The placeholder feature has no geometry and is never drawn.
    assert_eq!(map.shapes().len(), store.len() - 1);
}

#[test]
fn reset_keeps_passport_table() {
    let mut map = world();
    let france = at(&map, 2.0, 47.0);
    pick_passport(&mut map, france);
    map.select_destination(Iso2Code::new("US"));

    assert_eq!(map.reset_selection(), Some(MapEvent::HideDetails));
    assert_eq!(map.selection().destination(), None);
    assert!(!map.visa_table().is_empty());
}
