//! Pointer events → country codes.
//!
//! Shapes are registered in a [`ShapeTable`] when the map is drawn, so a
//! pointer event only ever carries a [`ShapeId`]; the country behind it is
//! looked up, never parsed back out of the drawing. [`HitResolver`] then
//! filters the hits that overlapping or oddly-sized outlines produce.

use crate::codes::{Iso2Code, NativeCode};
use crate::geo::{Bounds, GeoFeatureStore, point_in_polygon};
use crate::profile::HitRules;
use crate::projection::{ProjectedShape, ProjectionEngine};
use crate::viewport::ViewTransform;

/// Index of a drawn shape, in draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(usize);

impl ShapeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct ShapeEntry {
    pub id: ShapeId,
    pub native: NativeCode,
    pub iso2: Iso2Code,
    pub name: String,
    pub shape: ProjectedShape,
}

impl ShapeEntry {
    /// The shape's box on the canvas under `transform`.
    pub fn rendered_bounds(&self, transform: &ViewTransform) -> Bounds {
        let b = self.shape.bounds;
        let [min_x, min_y] = transform.apply([b.min_x, b.min_y]);
        let [max_x, max_y] = transform.apply([b.max_x, b.max_y]);
        Bounds {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }
}

/// What lies under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Shape(ShapeId),
    /// Inside the canvas but not over any country (ocean, empty space).
    Background,
    /// Beyond the canvas edge.
    Outside,
}

/// A pointer event in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub target: PointerTarget,
    pub position: [f64; 2],
}

/// Every drawable shape with the country it stands for.
#[derive(Debug, Clone, Default)]
pub struct ShapeTable {
    entries: Vec<ShapeEntry>,
}

impl ShapeTable {
    /// Project every feature; degenerate geometry is left out of the table
    /// and therefore never drawn or hit.
    pub fn build(store: &GeoFeatureStore, projection: &ProjectionEngine) -> Self {
        let mut entries = Vec::with_capacity(store.len());
        for feature in store.features() {
            let Some(shape) = projection.project_feature(feature) else {
                tracing::debug!(id = %feature.id, "skipping feature without drawable geometry");
                continue;
            };
            entries.push(ShapeEntry {
                id: ShapeId(entries.len()),
                native: feature.id.clone(),
                iso2: feature.iso2.clone(),
                name: feature.name.clone(),
                shape,
            });
        }
        Self { entries }
    }

    pub fn get(&self, id: ShapeId) -> Option<&ShapeEntry> {
        self.entries.get(id.0)
    }

    pub fn entries(&self) -> &[ShapeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn shapes_for(&self, code: &Iso2Code) -> impl Iterator<Item = &ShapeEntry> + '_ {
        let code = code.clone();
        self.entries.iter().filter(move |e| e.iso2 == code)
    }

    /// Topmost shape under `position`. Later shapes are drawn over earlier
    /// ones, so the search runs back to front.
    pub fn pick(&self, position: [f64; 2], transform: &ViewTransform, canvas: &Bounds) -> PointerTarget {
        if !canvas.contains(position[0], position[1]) {
            return PointerTarget::Outside;
        }
        let [x, y] = transform.invert(position);
        self.entries
            .iter()
            .rev()
            .find(|e| {
                e.shape.bounds.contains(x, y)
                    && e.shape.polygons.iter().any(|poly| point_in_polygon(x, y, poly))
            })
            .map_or(PointerTarget::Background, |e| PointerTarget::Shape(e.id))
    }

    /// Build the event a renderer would deliver for a pointer at `position`.
    pub fn event_at(&self, position: [f64; 2], transform: &ViewTransform, canvas: &Bounds) -> PointerEvent {
        PointerEvent {
            target: self.pick(position, transform, canvas),
            position,
        }
    }
}

/// Why a pointer event did not resolve to a country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NotACountry,
    Antarctica,
    /// The shape's code matches no loaded feature.
    UnknownCountry(Iso2Code),
    /// A small island whose rendered box is too big to be a real hit.
    OversizedIsland(Iso2Code),
    OutsideHoverMargin(Iso2Code),
    UndersizedShape(Iso2Code),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoverState {
    pub hovered: Option<Iso2Code>,
    pub pointer: Option<[f64; 2]>,
}

/// Borrowed view of the scene a pointer event is resolved against.
#[derive(Debug, Clone, Copy)]
pub struct HitContext<'a> {
    pub shapes: &'a ShapeTable,
    pub store: &'a GeoFeatureStore,
    pub transform: ViewTransform,
}

#[derive(Debug, Clone)]
pub struct HitResolver {
    rules: HitRules,
    canvas: Bounds,
    hover: HoverState,
}

impl HitResolver {
    pub fn new(rules: HitRules, canvas: (f64, f64)) -> Self {
        Self {
            rules,
            canvas: Bounds {
                min_x: 0.0,
                min_y: 0.0,
                max_x: canvas.0,
                max_y: canvas.1,
            },
            hover: HoverState::default(),
        }
    }

    pub fn canvas(&self) -> &Bounds {
        &self.canvas
    }

    pub fn hover(&self) -> &HoverState {
        &self.hover
    }

    pub fn clear_hover(&mut self) {
        self.hover = HoverState::default();
    }

    /// Checks shared by clicks and hovers: a real, loaded, selectable country.
    fn resolve_target<'a>(
        &self,
        event: &PointerEvent,
        ctx: &HitContext<'a>,
    ) -> Result<&'a ShapeEntry, Rejection> {
        let PointerTarget::Shape(id) = event.target else {
            return Err(Rejection::NotACountry);
        };
        let entry = ctx.shapes.get(id).ok_or(Rejection::NotACountry)?;
        if entry.iso2.is_antarctica() {
            return Err(Rejection::Antarctica);
        }
        if !ctx.store.contains(&entry.iso2) {
            return Err(Rejection::UnknownCountry(entry.iso2.clone()));
        }
        Ok(entry)
    }

    pub fn resolve_click(&self, event: &PointerEvent, ctx: &HitContext<'_>) -> Result<Iso2Code, Rejection> {
        let entry = self.resolve_target(event, ctx)?;

        if self.rules.island_codes.contains(&entry.iso2) {
            let b = entry.rendered_bounds(&ctx.transform);
            if b.width() > self.rules.max_island_size || b.height() > self.rules.max_island_size {
                return Err(Rejection::OversizedIsland(entry.iso2.clone()));
            }
        }

        Ok(entry.iso2.clone())
    }

    pub fn resolve_hover(&self, event: &PointerEvent, ctx: &HitContext<'_>) -> Result<Iso2Code, Rejection> {
        let entry = self.resolve_target(event, ctx)?;
        let rendered = entry.rendered_bounds(&ctx.transform);

        if self.rules.large_codes.contains(&entry.iso2) {
            let [px, py] = event.position;
            if !rendered.inflate(self.rules.hover_margin).contains(px, py) {
                return Err(Rejection::OutsideHoverMargin(entry.iso2.clone()));
            }
        }

        if entry.iso2 == self.rules.min_size_code
            && (rendered.width() < self.rules.min_shape_size
                || rendered.height() < self.rules.min_shape_size)
        {
            return Err(Rejection::UndersizedShape(entry.iso2.clone()));
        }

        Ok(entry.iso2.clone())
    }

    /// Country to act on for a press, or `None` for interaction noise.
    pub fn on_pointer_down(&self, event: &PointerEvent, ctx: &HitContext<'_>) -> Option<Iso2Code> {
        self.resolve_click(event, ctx)
            .inspect_err(|reason| tracing::trace!(?reason, "click ignored"))
            .ok()
    }

    pub fn on_pointer_enter(&mut self, event: &PointerEvent, ctx: &HitContext<'_>) {
        match self.resolve_hover(event, ctx) {
            Ok(code) => {
                self.hover = HoverState {
                    hovered: Some(code),
                    pointer: Some(event.position),
                };
            }
            Err(reason) => tracing::trace!(?reason, "hover ignored"),
        }
    }

    /// `event` describes where the pointer went. Moving straight onto another
    /// country keeps the hover so the tooltip does not flicker; leaving the
    /// canvas or landing on empty space clears it.
    pub fn on_pointer_leave(&mut self, event: &PointerEvent) {
        let [x, y] = event.position;
        let still_on_canvas = self.canvas.contains(x, y);
        let onto_country = matches!(event.target, PointerTarget::Shape(_));
        if !still_on_canvas || !onto_country {
            self.clear_hover();
        }
    }
}
