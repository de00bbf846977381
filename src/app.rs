use std::path::{Path, PathBuf};
use std::sync::mpsc;

use eframe::egui;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::cleaner::{self, DeletionOutcome};
use crate::contents::{self, ContentItem, EntryKind};
use crate::disk_info::{self, DiskInfo};
use crate::scanner::{self, VenvEntry};
use crate::utils::{self, SizeBand};

/// One scanned venv as shown in the list.
pub struct VenvRow {
    pub entry: VenvEntry,
    pub selected: bool,
}

/// The venv whose contents are shown in the bottom pane.
struct Focus {
    path: PathBuf,
    items: Vec<ContentItem>,
}

/// Messages sent from the worker thread to the UI thread.
pub enum BgMessage {
    ScanComplete(Vec<PathBuf>),
    SizeMeasured(PathBuf, u64),
    AllSizesMeasured,
    DeleteComplete(Vec<DeletionOutcome>),
}

/// Overall application operation state.
#[derive(PartialEq)]
pub enum AppPhase {
    Idle,
    Scanning,
    Measuring,
    Deleting,
}

/// Confirmation dialog state.
pub struct ConfirmDialog {
    pub visible: bool,
    pub total_bytes: u64,
    pub paths: Vec<PathBuf>,
}

pub struct VenvSweepApp {
    root: PathBuf,
    rows: Vec<VenvRow>,
    filter: String,
    focus: Option<Focus>,
    phase: AppPhase,
    receiver: Option<mpsc::Receiver<BgMessage>>,
    progress_label: String,
    confirm_dialog: ConfirmDialog,
    errors: Vec<String>,
    last_report: Option<String>,
    disk: Option<DiskInfo>,
}

fn band_color(band: SizeBand) -> egui::Color32 {
    match band {
        SizeBand::Large => egui::Color32::from_rgb(230, 90, 90),
        SizeBand::Medium => egui::Color32::from_rgb(230, 160, 60),
        SizeBand::Small => egui::Color32::from_rgb(80, 200, 80),
    }
}

impl VenvSweepApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, root: PathBuf) -> Self {
        let mut app = Self::with_root(root);
        app.start_scan();
        app
    }

    fn with_root(root: PathBuf) -> Self {
        Self {
            disk: disk_info::get_disk_info(&root),
            root,
            rows: vec![],
            filter: String::new(),
            focus: None,
            phase: AppPhase::Idle,
            receiver: None,
            progress_label: String::new(),
            confirm_dialog: ConfirmDialog {
                visible: false,
                total_bytes: 0,
                paths: vec![],
            },
            errors: vec![],
            last_report: None,
        }
    }

    /// Rows that pass the current filter, with their index into `rows`.
    fn visible_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| scanner::matches_filter(&row.entry.path, &self.filter))
            .map(|(i, _)| i)
            .collect()
    }

    /// Selected rows that are currently visible. Hidden rows never get deleted.
    fn selected_paths(&self) -> Vec<PathBuf> {
        self.visible_rows()
            .into_iter()
            .map(|i| &self.rows[i])
            .filter(|row| row.selected)
            .map(|row| row.entry.path.clone())
            .collect()
    }

    fn size_of(&self, path: &Path) -> u64 {
        self.rows
            .iter()
            .find(|row| row.entry.path == path)
            .and_then(|row| row.entry.size_bytes)
            .unwrap_or(0)
    }

    fn start_scan(&mut self) {
        self.phase = AppPhase::Scanning;
        self.progress_label = "Scanning for virtual environments...".to_string();
        self.rows.clear();
        self.focus = None;

        let (tx, rx) = mpsc::channel::<BgMessage>();
        self.receiver = Some(rx);
        let root = self.root.clone();

        std::thread::spawn(move || {
            let paths = scanner::scan(&root);
            let _ = tx.send(BgMessage::ScanComplete(paths.clone()));

            paths.par_iter().for_each_with(tx.clone(), |tx, path| {
                let size = utils::dir_size(path);
                let _ = tx.send(BgMessage::SizeMeasured(path.clone(), size));
            });
            let _ = tx.send(BgMessage::AllSizesMeasured);
        });
    }

    fn start_delete(&mut self) {
        self.phase = AppPhase::Deleting;
        self.confirm_dialog.visible = false;
        self.errors.clear();
        self.last_report = None;

        let paths = std::mem::take(&mut self.confirm_dialog.paths);
        self.progress_label = format!("Deleting {} venv(s)...", paths.len());

        let (tx, rx) = mpsc::channel::<BgMessage>();
        self.receiver = Some(rx);

        std::thread::spawn(move || {
            let outcomes = cleaner::delete_all(&paths);
            let _ = tx.send(BgMessage::DeleteComplete(outcomes));
        });
    }

    fn finish_delete(&mut self, outcomes: Vec<DeletionOutcome>) {
        let mut deleted = 0usize;
        let mut freed = 0u64;
        for outcome in outcomes {
            match outcome.error {
                None => {
                    deleted += 1;
                    freed += outcome.freed_bytes;
                }
                Some(err) => self
                    .errors
                    .push(format!("{}: {err}", utils::display_path(&outcome.path))),
            }
        }

        if deleted > 0 {
            self.last_report = Some(format!(
                "Deleted {deleted} venv(s) successfully, {} freed.",
                utils::format_size(freed)
            ));
        }
        self.start_scan();
    }

    fn drain_messages(&mut self) {
        let Some(rx) = self.receiver.take() else {
            return;
        };

        loop {
            match rx.try_recv() {
                Ok(BgMessage::ScanComplete(paths)) => {
                    self.progress_label = format!("Measuring {} venv(s)...", paths.len());
                    self.rows = paths
                        .into_iter()
                        .map(|path| VenvRow {
                            entry: VenvEntry::new(path),
                            selected: false,
                        })
                        .collect();
                    self.phase = AppPhase::Measuring;
                    self.disk = disk_info::get_disk_info(&self.root);
                }
                Ok(BgMessage::SizeMeasured(path, size)) => {
                    if let Some(row) = self.rows.iter_mut().find(|r| r.entry.path == path) {
                        row.entry.size_bytes = Some(size);
                    }
                }
                Ok(BgMessage::AllSizesMeasured) => {
                    self.phase = AppPhase::Idle;
                    self.progress_label.clear();
                    return;
                }
                Ok(BgMessage::DeleteComplete(outcomes)) => {
                    // finish_delete installs a fresh receiver for the re-scan
                    self.finish_delete(outcomes);
                    return;
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    warn!("background worker stopped before finishing");
                    self.errors.push(
                        "Background task stopped unexpectedly; results may be incomplete."
                            .to_string(),
                    );
                    self.phase = AppPhase::Idle;
                    self.progress_label.clear();
                    return;
                }
            }
        }

        self.receiver = Some(rx);
    }

    fn focus_on(&mut self, path: PathBuf) {
        let items = contents::list_contents(&path);
        debug!(venv = %path.display(), entries = items.len(), "listed venv contents");
        self.focus = Some(Focus { path, items });
    }

    fn show_confirm_dialog(&mut self) {
        let paths = self.selected_paths();
        self.confirm_dialog = ConfirmDialog {
            visible: true,
            total_bytes: paths.iter().map(|p| self.size_of(p)).sum(),
            paths,
        };
    }

    fn render_header(&self, ui: &mut egui::Ui) {
        ui.add_space(8.0);
        ui.vertical_centered(|ui| {
            ui.heading(
                egui::RichText::new("Virtual Environment Manager")
                    .size(24.0)
                    .strong()
                    .color(egui::Color32::from_rgb(80, 180, 220)),
            );
            let subtitle = match &self.disk {
                Some(disk) => format!(
                    "{}  |  {} free of {} ({}% used)",
                    utils::display_path(&self.root),
                    utils::format_size(disk.available),
                    utils::format_size(disk.total),
                    (disk.usage_percent() * 100.0) as u32,
                ),
                None => utils::display_path(&self.root),
            };
            ui.label(
                egui::RichText::new(subtitle)
                    .size(13.0)
                    .color(egui::Color32::GRAY),
            );
        });
        ui.add_space(8.0);
    }

    fn render_filter(&mut self, ui: &mut egui::Ui) {
        ui.add(
            egui::TextEdit::singleline(&mut self.filter)
                .hint_text("Type to filter venvs...")
                .desired_width(f32::INFINITY),
        );
        ui.add_space(4.0);
    }

    fn render_action_bar(&mut self, ui: &mut egui::Ui) {
        let is_busy = self.phase != AppPhase::Idle;

        ui.horizontal(|ui| {
            if ui
                .add_enabled(!is_busy, egui::Button::new("Refresh List"))
                .clicked()
            {
                self.errors.clear();
                self.last_report = None;
                self.start_scan();
            }

            let visible = self.visible_rows();
            if ui
                .add_enabled(!visible.is_empty(), egui::Button::new("Select All"))
                .clicked()
            {
                for &i in &visible {
                    self.rows[i].selected = true;
                }
            }
            if ui
                .add_enabled(!visible.is_empty(), egui::Button::new("Select None"))
                .clicked()
            {
                for row in &mut self.rows {
                    row.selected = false;
                }
            }

            let selected = self.selected_paths().len();
            let can_delete = !is_busy && selected > 0;
            let label = if selected > 0 {
                format!("Delete Selected ({selected})")
            } else {
                "Delete Selected".to_string()
            };

            if ui
                .add_enabled(
                    can_delete,
                    egui::Button::new(egui::RichText::new(label).color(if can_delete {
                        egui::Color32::from_rgb(220, 60, 60)
                    } else {
                        egui::Color32::GRAY
                    })),
                )
                .clicked()
            {
                self.show_confirm_dialog();
            }

            if is_busy {
                ui.add_space(8.0);
                ui.spinner();
                ui.label(&self.progress_label);
            }
        });

        if let Some(report) = &self.last_report {
            ui.label(
                egui::RichText::new(report).color(egui::Color32::from_rgb(80, 200, 80)),
            );
        }
        ui.add_space(4.0);
    }

    fn render_venv_list(&mut self, ui: &mut egui::Ui) {
        let visible = self.visible_rows();
        let focused = self.focus.as_ref().map(|f| f.path.clone());
        let mut clicked: Option<PathBuf> = None;

        if visible.is_empty() {
            let msg = if self.phase == AppPhase::Scanning {
                "Scanning..."
            } else if self.rows.is_empty() {
                "No virtual environments found."
            } else {
                "No venvs match the filter."
            };
            ui.label(
                egui::RichText::new(msg)
                    .italics()
                    .color(egui::Color32::GRAY),
            );
            return;
        }

        egui::ScrollArea::vertical()
            .id_salt("venv_list")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for &i in &visible {
                    let row = &mut self.rows[i];
                    let path_display = utils::display_path(&row.entry.path);
                    let is_focused = focused.as_deref() == Some(row.entry.path.as_path());

                    ui.horizontal(|ui| {
                        ui.checkbox(&mut row.selected, "");
                        if ui.selectable_label(is_focused, path_display.as_str()).clicked() {
                            clicked = Some(row.entry.path.clone());
                        }
                        ui.with_layout(
                            egui::Layout::right_to_left(egui::Align::Center),
                            |ui| match row.entry.size_bytes {
                                Some(bytes) => {
                                    ui.label(
                                        egui::RichText::new(utils::format_size(bytes))
                                            .strong()
                                            .color(band_color(SizeBand::of(bytes))),
                                    );
                                }
                                None => {
                                    ui.label(
                                        egui::RichText::new("measuring...")
                                            .italics()
                                            .color(egui::Color32::GRAY),
                                    );
                                }
                            },
                        );
                    });
                }
            });

        if let Some(path) = clicked {
            self.focus_on(path);
        }
    }

    fn render_contents(&self, ui: &mut egui::Ui) {
        let Some(focus) = &self.focus else {
            ui.label(
                egui::RichText::new("Select a venv to see its contents.")
                    .italics()
                    .color(egui::Color32::GRAY),
            );
            return;
        };

        ui.label(
            egui::RichText::new(format!(
                "{} ({} entries)",
                utils::display_path(&focus.path),
                focus.items.len()
            ))
            .strong(),
        );

        let row_height = ui.text_style_height(&egui::TextStyle::Monospace);
        egui::ScrollArea::vertical()
            .id_salt("venv_contents")
            .auto_shrink([false, false])
            .show_rows(ui, row_height, focus.items.len(), |ui, range| {
                for item in &focus.items[range] {
                    let color = match item.kind {
                        EntryKind::Directory => egui::Color32::from_rgb(120, 170, 230),
                        EntryKind::File => egui::Color32::from_rgb(160, 160, 170),
                    };
                    ui.label(
                        egui::RichText::new(item.display_line())
                            .monospace()
                            .color(color),
                    );
                }
            });
    }

    fn render_confirm_dialog(&mut self, ctx: &egui::Context) {
        let mut should_delete = false;
        let mut should_cancel = false;

        // Dark overlay behind the dialog to block background interaction
        egui::Area::new(egui::Id::new("confirm_overlay"))
            .fixed_pos(egui::Pos2::ZERO)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                let screen = ui.ctx().screen_rect();
                ui.allocate_rect(screen, egui::Sense::click());
                ui.painter()
                    .rect_filled(screen, 0.0, egui::Color32::from_black_alpha(160));
            });

        egui::Window::new("")
            .title_bar(false)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .fixed_size([420.0, 0.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    ui.label(
                        egui::RichText::new("Confirm Deletion")
                            .size(18.0)
                            .strong(),
                    );
                });
                ui.add_space(8.0);

                ui.label(format!(
                    "You are about to delete {} venv(s) totaling {}.",
                    self.confirm_dialog.paths.len(),
                    utils::format_size(self.confirm_dialog.total_bytes)
                ));
                ui.add_space(8.0);

                egui::Frame::group(ui.style())
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        egui::ScrollArea::vertical()
                            .max_height(160.0)
                            .show(ui, |ui| {
                                for path in &self.confirm_dialog.paths {
                                    ui.label(format!("\u{2022} {}", utils::display_path(path)));
                                }
                            });
                    });

                ui.add_space(4.0);
                ui.label(
                    egui::RichText::new("Are you sure? This action cannot be undone.")
                        .small()
                        .color(egui::Color32::from_rgb(200, 100, 100)),
                );
                ui.add_space(12.0);

                ui.columns(2, |cols| {
                    cols[0].vertical_centered(|ui| {
                        if ui
                            .add_sized([140.0, 32.0], egui::Button::new("Cancel"))
                            .clicked()
                        {
                            should_cancel = true;
                        }
                    });
                    cols[1].vertical_centered(|ui| {
                        if ui
                            .add_sized(
                                [140.0, 32.0],
                                egui::Button::new(
                                    egui::RichText::new("Delete")
                                        .strong()
                                        .color(egui::Color32::WHITE),
                                )
                                .fill(egui::Color32::from_rgb(200, 50, 50)),
                            )
                            .clicked()
                        {
                            should_delete = true;
                        }
                    });
                });
                ui.add_space(8.0);
            });

        if should_cancel {
            self.confirm_dialog.visible = false;
            self.confirm_dialog.paths.clear();
        }
        if should_delete {
            self.start_delete();
        }
    }

    fn render_errors(&self, ui: &mut egui::Ui) {
        if self.errors.is_empty() {
            return;
        }
        ui.add_space(4.0);
        egui::CollapsingHeader::new(
            egui::RichText::new(format!(
                "Problems during the last operation ({})",
                self.errors.len()
            ))
            .color(egui::Color32::from_rgb(220, 150, 50)),
        )
        .default_open(true)
        .show(ui, |ui| {
            for err in &self.errors {
                ui.label(egui::RichText::new(err).color(egui::Color32::from_rgb(220, 100, 50)));
            }
        });
    }
}

impl eframe::App for VenvSweepApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_messages();

        if self.phase != AppPhase::Idle {
            ctx.request_repaint();
        }

        if self.confirm_dialog.visible {
            self.render_confirm_dialog(ctx);
        }

        egui::TopBottomPanel::bottom("contents_panel")
            .resizable(true)
            .default_height(220.0)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                self.render_contents(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_header(ui);
            self.render_filter(ui);
            self.render_action_bar(ui);
            self.render_errors(ui);
            ui.separator();
            self.render_venv_list(ui);
        });
    }
}
