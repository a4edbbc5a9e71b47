use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::orchestration::dispatch_backend_command;
use crate::controller::reducer::{reduce, ScreenModel};
use crate::ui::theme::{notice_colors, visuals_for};

pub struct DarkModeApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    model: ScreenModel,
    system_prefers_dark: bool,
    applied_dark: Option<bool>,
    screen_visible: bool,
}

impl DarkModeApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        system_prefers_dark: bool,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            model: ScreenModel::default(),
            system_prefers_dark,
            applied_dark: None,
            screen_visible: true,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            reduce(&mut self.model, event);
        }
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.model.notice);
    }

    fn apply_theme_if_needed(&mut self, ctx: &egui::Context) {
        let dark = self
            .model
            .ui_state
            .resolve_dark_theme(self.system_prefers_dark);
        if self.applied_dark == Some(dark) {
            return;
        }
        ctx.set_visuals(visuals_for(dark));
        self.applied_dark = Some(dark);
    }

    fn track_visibility(&mut self, ctx: &egui::Context) {
        let minimized = ctx.input(|i| i.viewport().minimized.unwrap_or(false));
        let visible = !minimized;
        if visible == self.screen_visible {
            return;
        }
        self.screen_visible = visible;
        self.dispatch(if visible {
            BackendCommand::ScreenVisible
        } else {
            BackendCommand::ScreenHidden
        });
    }

    fn show_splash(&self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() * 0.4);
                ui.spinner();
                ui.add_space(8.0);
                ui.label("Loading preferences...");
            });
        });
    }

    fn show_settings_screen(&mut self, ctx: &egui::Context, is_dark_mode: bool) {
        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_status_banner(ui);
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() * 0.35);
                let mut checked = is_dark_mode;
                // The box reflects the stored value; the flip shows up once
                // the backend reports it.
                if ui
                    .checkbox(&mut checked, egui::RichText::new("Dark Mode").size(18.0))
                    .changed()
                {
                    self.dispatch(BackendCommand::ToggleDarkMode);
                }
            });
        });
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        let Some(message) = self.model.notice.clone() else {
            return;
        };
        let (fill, stroke) = notice_colors();

        egui::Frame::NONE
            .fill(fill)
            .stroke(stroke)
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(&message).color(egui::Color32::WHITE));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Dismiss").clicked() {
                            self.model.dismiss_notice();
                        }
                    });
                });
            });
    }
}

impl eframe::App for DarkModeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.track_visibility(ctx);
        self.apply_theme_if_needed(ctx);

        match self.model.ui_state.dark_mode() {
            None => self.show_splash(ctx),
            Some(is_dark_mode) => self.show_settings_screen(ctx, is_dark_mode),
        }

        let repaint_after = if self.model.keeps_splash_visible() {
            Duration::from_millis(16)
        } else {
            Duration::from_millis(100)
        };
        ctx.request_repaint_after(repaint_after);
    }
}

impl Drop for DarkModeApp {
    fn drop(&mut self) {
        let _ = self.cmd_tx.try_send(BackendCommand::Shutdown);
    }
}
