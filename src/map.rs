//! The interactive map: owns every piece of view and selection state and
//! routes input through the components that guard it.

use crate::codes::Iso2Code;
use crate::colors::{Color, ColorClass, Palette, classify};
use crate::fetch::{RequestTicket, TableSource, VisaTableSlot};
use crate::geo::GeoFeatureStore;
use crate::hit::{HitContext, HitResolver, HoverState, PointerEvent, PointerTarget, ShapeEntry, ShapeTable};
use crate::profile::ViewportProfile;
use crate::projection::ProjectionEngine;
use crate::selection::{SelectionMode, SelectionState, SelectionStateMachine, Transition};
use crate::viewport::{GestureKind, PointerButton, ViewTransform, ViewportController, gesture_allowed};
use crate::visa::{VisaStatus, VisaTable};

/// Something the surrounding UI has to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapEvent {
    /// Load the visa table for a new passport and hand the result to
    /// [`WorldMap::complete_fetch`] with this ticket.
    FetchVisaTable(RequestTicket),
    ShowDetails {
        passport: Option<Iso2Code>,
        destination: Iso2Code,
        status: Option<VisaStatus>,
    },
    HideDetails,
    SameCountryWarning(Iso2Code),
}

pub struct WorldMap {
    store: GeoFeatureStore,
    projection: ProjectionEngine,
    shapes: ShapeTable,
    viewport: ViewportController,
    hits: HitResolver,
    selection: SelectionStateMachine,
    visa: VisaTableSlot,
    palette: Palette,
    last_target: PointerTarget,
}

impl WorldMap {
    pub fn new(store: GeoFeatureStore, profile: ViewportProfile, mode: SelectionMode) -> Self {
        let projection = ProjectionEngine::new(profile.projection);
        let shapes = ShapeTable::build(&store, &projection);
        let hits = HitResolver::new(profile.hit.clone(), profile.canvas);
        Self {
            store,
            projection,
            shapes,
            viewport: ViewportController::new(profile),
            hits,
            selection: SelectionStateMachine::new(mode),
            visa: VisaTableSlot::default(),
            palette: Palette::default(),
            last_target: PointerTarget::Outside,
        }
    }

    /// Switch device class. Shapes are re-projected from the already-loaded
    /// features; selection and visa data are kept.
    pub fn set_profile(&mut self, profile: ViewportProfile) {
        self.projection.reconfigure(profile.projection);
        self.shapes = ShapeTable::build(&self.store, &self.projection);
        self.hits = HitResolver::new(profile.hit.clone(), profile.canvas);
        self.viewport.set_profile(profile);
        self.last_target = PointerTarget::Outside;
    }

    pub fn store(&self) -> &GeoFeatureStore {
        &self.store
    }

    pub fn shapes(&self) -> &ShapeTable {
        &self.shapes
    }

    pub fn projection(&self) -> &ProjectionEngine {
        &self.projection
    }

    pub fn profile(&self) -> &ViewportProfile {
        self.viewport.profile()
    }

    pub fn transform(&self) -> ViewTransform {
        self.viewport.transform()
    }

    pub fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    pub fn hover(&self) -> &HoverState {
        self.hits.hover()
    }

    pub fn visa_table(&self) -> &VisaTable {
        self.visa.table()
    }

    pub fn visa_source(&self) -> Option<TableSource> {
        self.visa.source()
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    fn hit_context(&self) -> HitContext<'_> {
        HitContext {
            shapes: &self.shapes,
            store: &self.store,
            transform: self.viewport.transform(),
        }
    }

    pub fn event_at(&self, position: [f64; 2]) -> PointerEvent {
        self.shapes
            .event_at(position, &self.viewport.transform(), self.hits.canvas())
    }

    /// Click or tap at a canvas position.
    pub fn pointer_down(&mut self, position: [f64; 2]) -> Option<MapEvent> {
        let event = self.event_at(position);
        let code = self.hits.on_pointer_down(&event, &self.hit_context())?;
        let transition = self.selection.select(code);
        self.apply(transition)
    }

    /// Pointer moved. Enter/leave are derived from the change of target.
    pub fn pointer_move(&mut self, position: [f64; 2]) {
        let event = self.event_at(position);
        if event.target == self.last_target {
            return;
        }
        if matches!(self.last_target, PointerTarget::Shape(_)) {
            self.hits.on_pointer_leave(&event);
        }
        if matches!(event.target, PointerTarget::Shape(_)) {
            let ctx = HitContext {
                shapes: &self.shapes,
                store: &self.store,
                transform: self.viewport.transform(),
            };
            self.hits.on_pointer_enter(&event, &ctx);
        } else {
            self.hits.clear_hover();
        }
        self.last_target = event.target;
    }

    pub fn pointer_exit(&mut self) {
        self.hits.clear_hover();
        self.last_target = PointerTarget::Outside;
    }

    pub fn select_passport(&mut self, code: Iso2Code) -> Option<MapEvent> {
        let transition = self.selection.select_passport(code);
        self.apply(transition)
    }

    pub fn select_destination(&mut self, code: Iso2Code) -> Option<MapEvent> {
        let transition = self.selection.select_destination(code);
        self.apply(transition)
    }

    pub fn reset_selection(&mut self) -> Option<MapEvent> {
        let transition = self.selection.reset();
        self.apply(transition)
    }

    /// Drop passport and destination. The visa table goes with the passport
    /// and any fetch still in flight is ignored when it lands.
    pub fn clear_selection(&mut self) -> Option<MapEvent> {
        let transition = self.selection.clear();
        self.apply(transition)
    }

    fn apply(&mut self, transition: Transition) -> Option<MapEvent> {
        match transition {
            Transition::PassportSelected {
                passport, changed, ..
            } => changed.then(|| MapEvent::FetchVisaTable(self.visa.begin(passport))),
            Transition::DestinationSelected { destination } => Some(MapEvent::ShowDetails {
                passport: self.selection.state().passport().cloned(),
                status: self.visa.table().get(&destination),
                destination,
            }),
            Transition::SameCountryRejected(code) => Some(MapEvent::SameCountryWarning(code)),
            Transition::DestinationCleared => Some(MapEvent::HideDetails),
            Transition::SelectionCleared => {
                self.visa.clear();
                Some(MapEvent::HideDetails)
            }
            Transition::Ignored(_) => None,
        }
    }

    /// Apply a finished fetch; stale tickets are dropped. When a destination
    /// is still selected its details are re-issued for the new table.
    pub fn complete_fetch(&mut self, ticket: RequestTicket, table: VisaTable, source: TableSource) -> Option<MapEvent> {
        if !self.visa.complete(ticket, table, source) {
            return None;
        }
        let state = self.selection.state();
        let destination = state.destination()?.clone();
        Some(MapEvent::ShowDetails {
            passport: state.passport().cloned(),
            status: self.visa.table().get(&destination),
            destination,
        })
    }

    /// Whether a press at `position` may start a pan.
    pub fn drag_allowed(&self, position: [f64; 2], button: PointerButton) -> bool {
        let over_country = matches!(self.event_at(position).target, PointerTarget::Shape(_));
        gesture_allowed(GestureKind::DragStart, button, over_country)
    }

    pub fn pan(&mut self, dx: f64, dy: f64) -> ViewTransform {
        self.viewport.pan(dx, dy)
    }

    pub fn zoom_at(&mut self, factor: f64, anchor: [f64; 2]) -> ViewTransform {
        self.viewport.zoom_at(factor, anchor)
    }

    pub fn reset_view(&mut self) -> ViewTransform {
        self.viewport.reset()
    }

    pub fn center_view(&mut self) -> ViewTransform {
        self.viewport.center()
    }

    pub fn color_class(&self, code: &Iso2Code) -> ColorClass {
        classify(code.as_str(), self.selection.state(), self.visa.table())
    }

    /// Every drawable shape with its current fill.
    pub fn fills(&self) -> impl Iterator<Item = (&ShapeEntry, Color)> {
        self.shapes.entries().iter().map(|entry| {
            let fill = self.palette.color(self.color_class(&entry.iso2));
            (entry, fill)
        })
    }
}
