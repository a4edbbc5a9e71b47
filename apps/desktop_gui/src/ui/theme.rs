use eframe::egui;

pub fn system_prefers_dark() -> bool {
    match dark_light::detect() {
        dark_light::Mode::Dark => true,
        dark_light::Mode::Light | dark_light::Mode::Default => false,
    }
}

pub fn visuals_for(dark: bool) -> egui::Visuals {
    let mut visuals = if dark {
        let mut v = egui::Visuals::dark();
        v.panel_fill = egui::Color32::from_rgb(28, 27, 31);
        v.window_fill = egui::Color32::from_rgb(28, 27, 31);
        v.extreme_bg_color = egui::Color32::from_rgb(20, 19, 22);
        v
    } else {
        let mut v = egui::Visuals::light();
        v.panel_fill = egui::Color32::from_rgb(255, 251, 254);
        v.window_fill = egui::Color32::from_rgb(255, 251, 254);
        v
    };

    let accent = egui::Color32::from_rgb(103, 80, 164);
    visuals.selection.bg_fill = accent;
    visuals.hyperlink_color = accent;
    visuals.window_corner_radius = egui::CornerRadius::same(8);
    visuals.menu_corner_radius = egui::CornerRadius::same(6);
    visuals
}

/// Colors for the error notice; readable on both backgrounds.
pub fn notice_colors() -> (egui::Color32, egui::Stroke) {
    (
        egui::Color32::from_rgb(111, 53, 53),
        egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)),
    )
}
