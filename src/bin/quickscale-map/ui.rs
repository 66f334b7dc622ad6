//! Panel rendering for the viewer: side panel or bottom sheet, status bar and
//! the central map.

use crate::QuickScaleApp;
use crate::colors;
use crate::constants::SIDEBAR_WIDTH;
use eframe::egui;
use quickscale_map::Theme;
use quickscale_map::layout::LayoutView;

/// Something the user asked for this frame. Applied after all panels are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    ToggleTheme,
    SelectScale(usize),
    ToggleMeasure,
    ClearMeasure,
    ToggleSheet,
    OpenInBrowser,
}

impl QuickScaleApp {
    /// Renders the bottom status bar with the controls hint and the browser link.
    pub fn show_status_bar(&self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        let mobile = self.viewer.layout().view().mobile;
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if !mobile {
                    ui.label("Scroll: Zoom | Drag: Pan | +/-: Zoom | Double-click: Stop measuring");
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .small_button("Open in OpenStreetMap")
                        .on_hover_text("Show this view in the browser")
                        .clicked()
                    {
                        actions.push(UiAction::OpenInBrowser);
                    }
                });
            });
        });
    }

    /// Side panel on desktop, bottom sheet on mobile.
    pub fn show_panel(&self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        let view = *self.viewer.layout().view();
        if view.mobile {
            self.show_sheet(ctx, &view, actions);
        } else {
            egui::SidePanel::left("aside")
                .exact_width(SIDEBAR_WIDTH)
                .resizable(false)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        ui.add_space(4.0);
                        self.show_panel_header(ui, &view, actions);
                        ui.separator();
                        self.show_panel_content(ui, actions);
                    });
                });
        }
    }

    fn show_sheet(&self, ctx: &egui::Context, view: &LayoutView, actions: &mut Vec<UiAction>) {
        let max_height = ctx.screen_rect().height() * 0.45;
        egui::TopBottomPanel::bottom("sheet")
            .resizable(false)
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    let (rect, grabber) =
                        ui.allocate_exact_size(egui::vec2(48.0, 10.0), egui::Sense::click());
                    ui.painter().rect_filled(
                        egui::Rect::from_center_size(rect.center(), egui::vec2(40.0, 5.0)),
                        2.5,
                        ui.visuals().widgets.inactive.bg_fill,
                    );
                    if grabber
                        .on_hover_cursor(egui::CursorIcon::PointingHand)
                        .clicked()
                    {
                        actions.push(UiAction::ToggleSheet);
                    }
                });

                self.show_panel_header(ui, view, actions);

                if !view.sheet_collapsed {
                    ui.separator();
                    egui::ScrollArea::vertical()
                        .max_height(max_height)
                        .show(ui, |ui| self.show_panel_content(ui, actions));
                }
            });
    }

    /// Title, live readout and the theme/sheet buttons.
    fn show_panel_header(&self, ui: &mut egui::Ui, view: &LayoutView, actions: &mut Vec<UiAction>) {
        let hud = self.viewer.hud();
        ui.horizontal(|ui| {
            ui.strong("QuickScale");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if view.sheet_button_visible
                    && ui
                        .button(view.sheet_glyph)
                        .on_hover_text("Collapse or expand the panel")
                        .clicked()
                {
                    actions.push(UiAction::ToggleSheet);
                }

                let next = match self.viewer.theme().current() {
                    Theme::Light => "Switch to dark theme",
                    Theme::Dark => "Switch to light theme",
                };
                if ui
                    .button(self.viewer.theme().glyph())
                    .on_hover_text(next)
                    .clicked()
                {
                    actions.push(UiAction::ToggleTheme);
                }
            });
        });

        egui::Grid::new("hud").num_columns(2).show(ui, |ui| {
            ui.label("Zoom");
            ui.monospace(&hud.zoom_label);
            ui.end_row();
            ui.label("Scale");
            ui.monospace(&hud.scale_label);
            ui.end_row();
        });
    }

    /// Quick scales and the measurement controls.
    fn show_panel_content(&self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        let ribbon = self.viewer.ribbon();
        let measure = self.viewer.measure();

        ui.strong("Quick scales");
        ui.horizontal_wrapped(|ui| {
            for (index, button) in ribbon.buttons().iter().enumerate() {
                let active = ribbon.is_active(index);
                let text = if active {
                    egui::RichText::new(&button.label).color(colors::ACTIVE_ACCENT)
                } else {
                    egui::RichText::new(&button.label)
                };
                if ui.selectable_label(active, text).clicked() {
                    actions.push(UiAction::SelectScale(index));
                }
            }
        });
        ui.horizontal(|ui| {
            ui.label("Selected:");
            ui.monospace(ribbon.selected_label());
        });

        ui.add_space(12.0);

        ui.strong("Measure");
        ui.horizontal(|ui| {
            let label = if measure.is_measuring() {
                "Measuring"
            } else {
                "Measure"
            };
            if ui
                .selectable_label(measure.is_measuring(), label)
                .on_hover_text("Click the map to add points, double-click to stop")
                .clicked()
            {
                actions.push(UiAction::ToggleMeasure);
            }
            if ui.button("Clear").clicked() {
                actions.push(UiAction::ClearMeasure);
            }
        });
        ui.horizontal(|ui| {
            ui.label("Length:");
            ui.monospace(measure.length_label());
        });
    }

    /// Renders the central panel containing the map.
    pub fn show_central_panel(&mut self, ctx: &egui::Context) {
        let dark = self.viewer.theme().current() == Theme::Dark;
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.map.show(ui, &mut self.tiles, dark);
            });
    }
}
