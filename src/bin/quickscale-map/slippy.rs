//! The pan/zoom map widget: tiled basemaps, vector overlays and the input
//! handling that turns pointer gestures into [`MapEvent`]s.

use crate::colors;
use crate::constants::{CONTROL_MARGIN, KEYBOARD_PAN, TILE_FALLBACK_LEVELS};
use crate::tile_cache::TileCache;
use eframe::egui::{self, Color32, Pos2, Rect, Stroke, Vec2};
use quickscale_map::config::{MapOptions, StartView};
use quickscale_map::geo::{MAX_LATITUDE, TILE_SIZE, project, unproject, world_size};
use quickscale_map::scale::{SCALE_BAR_MAX_WIDTH, ScaleBar};
use quickscale_map::tiles::{TileCoord, TileSource, tile_range};
use quickscale_map::{ControlCorner, LatLng, Layer, LayerId, MapCursor, MapEvent, MapWidget};
use std::collections::BTreeMap;

pub struct SlippyMap {
    center: LatLng,
    zoom: f64,
    options: MapOptions,
    /// Container size the view is laid out for. Only refreshed on
    /// [`MapWidget::invalidate_size`].
    size: Option<Vec2>,
    size_stale: bool,
    layers: BTreeMap<LayerId, Layer>,
    next_layer: u64,
    events: Vec<MapEvent>,
    zoom_control: ControlCorner,
    cursor: MapCursor,
}

impl SlippyMap {
    pub fn new(start: &StartView, options: MapOptions) -> Self {
        let mut map = Self {
            center: start.center,
            zoom: start.zoom,
            options,
            size: None,
            size_stale: false,
            layers: BTreeMap::new(),
            next_layer: 1,
            events: Vec::new(),
            zoom_control: ControlCorner::default(),
            cursor: MapCursor::default(),
        };
        map.zoom = map.limit_zoom(start.zoom);
        map
    }

    fn limit_zoom(&self, zoom: f64) -> f64 {
        let snap = self.options.zoom_snap;
        let snapped = if snap > 0.0 {
            (zoom / snap).round() * snap
        } else {
            zoom
        };
        snapped.clamp(self.options.min_zoom, self.options.max_zoom)
    }

    /// Zooms by `delta` levels keeping the geographic point at `anchor`
    /// (offset from the view center, in points) where it is on screen.
    fn zoom_around(&mut self, delta: f64, anchor: Vec2) {
        let zoom = self.limit_zoom(self.zoom + delta);
        if zoom == self.zoom {
            return;
        }
        let anchor = (f64::from(anchor.x), f64::from(anchor.y));
        let (cx, cy) = project(self.center, self.zoom);
        let ratio = 2f64.powf(zoom - self.zoom);
        let (px, py) = ((cx + anchor.0) * ratio, (cy + anchor.1) * ratio);

        self.zoom = zoom;
        self.center = self.unproject_clamped(px - anchor.0, py - anchor.1);
        self.events.push(MapEvent::Zoom);
        self.events.push(MapEvent::Move);
    }

    fn pan_by(&mut self, offset: Vec2) {
        if offset == Vec2::ZERO {
            return;
        }
        let (cx, cy) = project(self.center, self.zoom);
        self.center =
            self.unproject_clamped(cx + f64::from(offset.x), cy + f64::from(offset.y));
        self.events.push(MapEvent::Move);
    }

    fn unproject_clamped(&self, x: f64, y: f64) -> LatLng {
        let size = world_size(self.zoom);
        let mut latlng = unproject(x.rem_euclid(size), y.clamp(0.0, size), self.zoom);
        latlng.lat = latlng.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        latlng
    }

    /// Screen position of a coordinate for a view centered at `origin`.
    fn to_screen(&self, latlng: LatLng, origin: Pos2) -> Pos2 {
        let (cx, cy) = project(self.center, self.zoom);
        let (x, y) = project(latlng, self.zoom);
        origin + egui::vec2((x - cx) as f32, (y - cy) as f32)
    }

    fn to_latlng(&self, pos: Pos2, origin: Pos2) -> LatLng {
        let (cx, cy) = project(self.center, self.zoom);
        let offset = pos - origin;
        self.unproject_clamped(cx + f64::from(offset.x), cy + f64::from(offset.y))
    }

    /// Lays the map out in the remaining space of `ui`, handles input and
    /// paints every layer.
    pub fn show(&mut self, ui: &mut egui::Ui, tiles: &mut TileCache, dark: bool) {
        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());

        match self.size {
            None => {
                self.size = Some(rect.size());
                self.events.push(MapEvent::Ready);
            }
            Some(_) if self.size_stale => {
                self.size = Some(rect.size());
                self.size_stale = false;
            }
            Some(_) => {}
        }
        let size = self.size.unwrap_or(rect.size());
        let origin = rect.min + size / 2.0;

        self.handle_input(ui, &response, rect, origin);

        let painter = ui.painter_at(rect);
        painter.rect_filled(
            rect,
            0.0,
            if dark {
                colors::MAP_BACKGROUND_DARK
            } else {
                colors::MAP_BACKGROUND_LIGHT
            },
        );

        let retina = ui.ctx().pixels_per_point() > 1.0;
        for layer in self.layers.values() {
            match layer {
                Layer::Tiles(source) => {
                    self.paint_tiles(ui.ctx(), &painter, tiles, source, size, origin, retina)
                }
                Layer::Polyline { points, weight } => {
                    let points: Vec<Pos2> =
                        points.iter().map(|p| self.to_screen(*p, origin)).collect();
                    painter.add(egui::Shape::line(
                        points,
                        Stroke::new(*weight, colors::MEASURE_STROKE),
                    ));
                }
                Layer::CircleMarker { .. } => {}
            }
        }
        // Markers sit above lines regardless of insertion order.
        for layer in self.layers.values() {
            if let Layer::CircleMarker {
                center,
                radius,
                weight,
            } = layer
            {
                painter.circle(
                    self.to_screen(*center, origin),
                    *radius,
                    colors::MEASURE_FILL,
                    Stroke::new(*weight, colors::MEASURE_STROKE),
                );
            }
        }

        self.paint_scale_bar(&painter, rect, origin, dark);
        self.paint_attribution(ui, rect);
        self.show_zoom_control(ui, rect);

        if response.hovered() {
            ui.ctx().set_cursor_icon(match (self.cursor, response.dragged()) {
                (MapCursor::Crosshair, _) => egui::CursorIcon::Crosshair,
                (MapCursor::Grab, true) => egui::CursorIcon::Grabbing,
                (MapCursor::Grab, false) => egui::CursorIcon::Grab,
            });
        }
    }

    fn handle_input(&mut self, ui: &egui::Ui, response: &egui::Response, rect: Rect, origin: Pos2) {
        if response.dragged_by(egui::PointerButton::Primary) {
            self.pan_by(-response.drag_delta());
        }

        let hover = ui.input(|i| i.pointer.hover_pos());
        let scroll = ui.input(|i| i.raw_scroll_delta.y);
        if scroll != 0.0
            && let Some(pos) = hover.filter(|p| rect.contains(*p))
        {
            let delta = f64::from(scroll / self.options.wheel_px_per_zoom_level);
            self.zoom_around(delta, pos - origin);
        }

        if response.clicked()
            && let Some(pos) = response.interact_pointer_pos()
        {
            self.events.push(MapEvent::Click(self.to_latlng(pos, origin)));
        }
        if response.double_clicked()
            && let Some(pos) = response.interact_pointer_pos()
        {
            let at = self.to_latlng(pos, origin);
            self.events.push(MapEvent::DoubleClick(at));
            if self.options.double_click_zoom {
                self.zoom_around(1.0, pos - origin);
            }
        }

        if response.hovered() {
            self.handle_keyboard_input(ui.ctx());
        }
    }

    /// Handles +/- zoom and arrow key panning while the pointer is over the map.
    fn handle_keyboard_input(&mut self, ctx: &egui::Context) {
        let delta = self.options.zoom_delta;
        let pan = KEYBOARD_PAN;
        let (zoom, offset) = ctx.input(|i| {
            let mut zoom = 0.0;
            if i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals) {
                zoom += delta;
            }
            if i.key_pressed(egui::Key::Minus) {
                zoom -= delta;
            }
            let mut offset = Vec2::ZERO;
            for (key, step) in [
                (egui::Key::ArrowLeft, egui::vec2(-pan, 0.0)),
                (egui::Key::ArrowRight, egui::vec2(pan, 0.0)),
                (egui::Key::ArrowUp, egui::vec2(0.0, -pan)),
                (egui::Key::ArrowDown, egui::vec2(0.0, pan)),
            ] {
                if i.key_pressed(key) {
                    offset += step;
                }
            }
            (zoom, offset)
        });

        if zoom != 0.0 {
            self.zoom_around(zoom, Vec2::ZERO);
        }
        self.pan_by(offset);
    }

    #[allow(clippy::too_many_arguments)]
    fn paint_tiles(
        &self,
        ctx: &egui::Context,
        painter: &egui::Painter,
        tiles: &mut TileCache,
        source: &TileSource,
        size: Vec2,
        origin: Pos2,
        retina: bool,
    ) {
        let tile_zoom = self.zoom.round().clamp(0.0, f64::from(source.max_zoom)) as u8;
        let scale = 2f64.powf(self.zoom - f64::from(tile_zoom));
        let tile_span = (TILE_SIZE * scale) as f32;
        let (cx, cy) = project(self.center, self.zoom);
        let view = [f64::from(size.x), f64::from(size.y)];

        for slot in tile_range(self.center, self.zoom, tile_zoom, view) {
            let min = origin
                + egui::vec2(
                    (slot.col as f64 * TILE_SIZE * scale - cx) as f32,
                    (slot.row as f64 * TILE_SIZE * scale - cy) as f32,
                );
            let tile_rect = Rect::from_min_size(min, Vec2::splat(tile_span));

            if let Some(texture) = tiles.request(ctx, source, slot.coord, retina) {
                painter.image(texture, tile_rect, FULL_UV, Color32::WHITE);
            } else if let Some((texture, uv)) = fallback(tiles, source, slot.coord, retina) {
                painter.image(texture, tile_rect, uv, Color32::WHITE);
            }
        }
    }

    fn paint_scale_bar(&self, painter: &egui::Painter, rect: Rect, origin: Pos2, dark: bool) {
        let y = origin.y;
        let left = self.to_latlng(egui::pos2(origin.x - SCALE_BAR_MAX_WIDTH / 2.0, y), origin);
        let right = self.to_latlng(egui::pos2(origin.x + SCALE_BAR_MAX_WIDTH / 2.0, y), origin);
        let Some(bar) = ScaleBar::metric(self.distance(left, right), SCALE_BAR_MAX_WIDTH) else {
            return;
        };

        let (fill, ink) = if dark {
            (colors::SCALE_BAR_DARK, Color32::from_gray(230))
        } else {
            (colors::SCALE_BAR_LIGHT, Color32::from_gray(30))
        };
        let bottom_left = rect.left_bottom() + egui::vec2(CONTROL_MARGIN, -CONTROL_MARGIN - 18.0);
        let bar_rect = Rect::from_min_size(bottom_left, egui::vec2(bar.width.max(1.0), 18.0));
        painter.rect_filled(bar_rect, 0.0, fill);
        painter.add(egui::Shape::line(
            vec![
                bar_rect.left_top(),
                bar_rect.left_bottom(),
                bar_rect.right_bottom(),
                bar_rect.right_top(),
            ],
            Stroke::new(2.0, ink),
        ));
        painter.text(
            bar_rect.left_center() + egui::vec2(4.0, 0.0),
            egui::Align2::LEFT_CENTER,
            &bar.label,
            egui::FontId::proportional(11.0),
            ink,
        );
    }

    fn paint_attribution(&self, ui: &egui::Ui, rect: Rect) {
        let attribution = self
            .layers
            .values()
            .filter_map(|layer| match layer {
                Layer::Tiles(source) if !source.attribution.is_empty() => {
                    Some(source.attribution.as_str())
                }
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" | ");
        if attribution.is_empty() {
            return;
        }

        let painter = ui.painter_at(rect);
        let color = ui.visuals().weak_text_color();
        let galley = painter.layout_no_wrap(attribution, egui::FontId::proportional(10.0), color);
        let pos = rect.right_bottom() - galley.size() - egui::vec2(4.0, 2.0);
        painter.rect_filled(
            Rect::from_min_size(pos, galley.size()).expand(2.0),
            2.0,
            ui.visuals().extreme_bg_color.gamma_multiply(0.8),
        );
        painter.galley(pos, galley, color);
    }

    /// Floating +/- buttons in the configured corner of the map.
    fn show_zoom_control(&mut self, ui: &egui::Ui, rect: Rect) {
        let inner = rect.shrink(CONTROL_MARGIN);
        let (pivot, pos) = match self.zoom_control {
            ControlCorner::TopLeft => (egui::Align2::LEFT_TOP, inner.left_top()),
            ControlCorner::TopRight => (egui::Align2::RIGHT_TOP, inner.right_top()),
            ControlCorner::BottomLeft => (egui::Align2::LEFT_BOTTOM, inner.left_bottom()),
            // Clear of the attribution line.
            ControlCorner::BottomRight => (
                egui::Align2::RIGHT_BOTTOM,
                inner.right_bottom() - egui::vec2(0.0, 14.0),
            ),
        };

        let mut step = 0.0;
        egui::Area::new(egui::Id::new("zoom_control"))
            .pivot(pivot)
            .fixed_pos(pos)
            .interactable(true)
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style())
                    .fill(ui.style().visuals.window_fill.gamma_multiply(0.95))
                    .show(ui, |ui| {
                        ui.vertical(|ui| {
                            let size = egui::vec2(26.0, 26.0);
                            if ui
                                .add_enabled(
                                    self.zoom < self.options.max_zoom,
                                    egui::Button::new("+").min_size(size),
                                )
                                .on_hover_text("Zoom in")
                                .clicked()
                            {
                                step = self.options.zoom_delta;
                            }
                            if ui
                                .add_enabled(
                                    self.zoom > self.options.min_zoom,
                                    egui::Button::new("−").min_size(size),
                                )
                                .on_hover_text("Zoom out")
                                .clicked()
                            {
                                step = -self.options.zoom_delta;
                            }
                        });
                    });
            });

        if step != 0.0 {
            self.zoom_around(step, Vec2::ZERO);
        }
    }

    /// Whether the next frame will re-measure the container.
    pub fn size_stale(&self) -> bool {
        self.size_stale
    }

    /// `https://www.openstreetmap.org/` link for the current view.
    pub fn permalink(&self) -> String {
        format!(
            "https://www.openstreetmap.org/#map={:.0}/{:.5}/{:.5}",
            self.zoom.round(),
            self.center.lat,
            self.center.lng
        )
    }
}

const FULL_UV: Rect = Rect::from_min_max(Pos2::ZERO, egui::pos2(1.0, 1.0));

/// A loaded ancestor of `coord` and the part of it that covers `coord`.
fn fallback(
    tiles: &TileCache,
    source: &TileSource,
    coord: TileCoord,
    retina: bool,
) -> Option<(egui::TextureId, Rect)> {
    let mut ancestor = coord;
    for level in 1..=TILE_FALLBACK_LEVELS {
        ancestor = ancestor.parent()?;
        if let Some(texture) = tiles.peek(source, ancestor, retina) {
            return Some((texture, ancestor_uv(coord, level)));
        }
    }
    None
}

/// Part of the ancestor `levels` up from `coord` that `coord` covers.
fn ancestor_uv(coord: TileCoord, levels: u8) -> Rect {
    let span = 1u32 << levels;
    let step = 1.0 / span as f32;
    let u = (coord.x % span) as f32 * step;
    let v = (coord.y % span) as f32 * step;
    Rect::from_min_size(egui::pos2(u, v), Vec2::splat(step))
}

impl MapWidget for SlippyMap {
    fn center(&self) -> LatLng {
        self.center
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.zoom = self.limit_zoom(zoom);
        self.events.push(MapEvent::Zoom);
    }

    fn invalidate_size(&mut self) {
        self.size_stale = true;
    }

    fn take_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }

    fn is_ready(&self) -> bool {
        self.size.is_some()
    }

    fn add_layer(&mut self, layer: Layer) -> LayerId {
        let id = LayerId(self.next_layer);
        self.next_layer += 1;
        self.layers.insert(id, layer);
        id
    }

    fn update_layer(&mut self, id: LayerId, layer: Layer) {
        if let Some(slot) = self.layers.get_mut(&id) {
            *slot = layer;
        }
    }

    fn remove_layer(&mut self, id: LayerId) {
        self.layers.remove(&id);
    }

    fn set_zoom_control_position(&mut self, corner: ControlCorner) {
        self.zoom_control = corner;
    }

    fn set_cursor(&mut self, cursor: MapCursor) {
        self.cursor = cursor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_at(zoom: f64) -> SlippyMap {
        let start = StartView {
            center: LatLng::new(19.4326, -99.1332),
            zoom,
        };
        SlippyMap::new(&start, MapOptions::default())
    }

    fn assert_close(a: LatLng, b: LatLng) {
        assert!((a.lat - b.lat).abs() < 1e-7, "{a:?} vs {b:?}");
        assert!((a.lng - b.lng).abs() < 1e-7, "{a:?} vs {b:?}");
    }

    #[test]
    fn zoom_is_snapped_and_kept_in_bounds() {
        let mut map = map_at(12.0);
        assert!((map.limit_zoom(12.3456) - 12.35).abs() < 1e-9);
        assert_eq!(map.limit_zoom(25.0), 20.0);
        assert_eq!(map.limit_zoom(-3.0), 0.0);

        map.set_zoom(42.0);
        assert_eq!(map.zoom(), 20.0);
        map.set_zoom(-1.0);
        assert_eq!(map.zoom(), 0.0);
        assert_eq!(map_at(30.0).zoom(), 20.0);
    }

    #[test]
    fn wheel_zoom_keeps_the_point_under_the_cursor() {
        let mut map = map_at(12.0);
        let anchor = egui::vec2(150.0, -80.0);
        let before = map.to_latlng(Pos2::ZERO + anchor, Pos2::ZERO);

        map.zoom_around(1.5, anchor);
        assert!((map.zoom() - 13.5).abs() < 1e-9);
        assert_close(map.to_latlng(Pos2::ZERO + anchor, Pos2::ZERO), before);

        map.zoom_around(-0.75, anchor);
        assert_close(map.to_latlng(Pos2::ZERO + anchor, Pos2::ZERO), before);
        assert_eq!(
            map.take_events(),
            vec![MapEvent::Zoom, MapEvent::Move, MapEvent::Zoom, MapEvent::Move]
        );
    }

    #[test]
    fn zooming_past_a_bound_is_a_no_op() {
        let mut map = map_at(20.0);
        let center = map.center();
        map.zoom_around(1.0, egui::vec2(40.0, 40.0));
        assert_eq!(map.zoom(), 20.0);
        assert_eq!(map.center(), center);
        assert!(map.take_events().is_empty());
    }

    #[test]
    fn ancestor_uv_selects_the_covered_quarter() {
        let uv = ancestor_uv(TileCoord::new(5, 2, 4), 1);
        assert_eq!(uv, Rect::from_min_size(egui::pos2(0.5, 0.0), Vec2::splat(0.5)));

        let uv = ancestor_uv(TileCoord::new(7, 6, 4), 2);
        assert_eq!(
            uv,
            Rect::from_min_size(egui::pos2(0.75, 0.5), Vec2::splat(0.25))
        );
    }
}
