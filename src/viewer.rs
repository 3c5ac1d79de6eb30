use std::cell::RefCell;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use eframe::egui;
use image::DynamicImage;

use crate::batch::{self, Batch, Flow, Summary};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::landmarks::{Point, Slot, LANDMARK_COUNT};
use crate::session::{Input, Session, Target, Transition};

const APP_NAME: &str = "annotate-landmarks";
const SLOT_COLUMNS: usize = 6;
const RECT_COLOR: egui::Color32 = egui::Color32::from_rgb(0, 255, 0);
const MARKER_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 0, 0);

// ── Run Report ──────────────────────────────────────────────────────────────

/// What the window leaves behind for `main` once the event loop exits.
#[derive(Debug, Default)]
struct RunReport {
    summary: Summary,
    error: Option<Error>,
}

// ── Loaded Image ────────────────────────────────────────────────────────────

struct LoadedImage {
    name: String,
    raw: DynamicImage,
    texture: Option<egui::TextureHandle>,
    size: (f32, f32),
}

impl LoadedImage {
    fn open(path: &Path) -> Result<Self> {
        let raw = batch::load_image(path)?;
        let size = (raw.width() as f32, raw.height() as f32);
        Ok(Self {
            name: batch::image_name(path),
            raw,
            texture: None,
            size,
        })
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() {
            return;
        }
        let rgba = self.raw.to_rgba8();
        let size = [rgba.width() as usize, rgba.height() as usize];
        let pixels = rgba.as_flat_samples();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
        self.texture = Some(ctx.load_texture(
            &self.name,
            color_image,
            egui::TextureOptions::NEAREST,
        ));
    }

    fn file_name(&self) -> String {
        Path::new(&self.name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.name)
            .to_string()
    }
}

// ── App ─────────────────────────────────────────────────────────────────────

struct AnnotatorApp<F: Write, E: Write> {
    batch: Batch<F, E>,
    config: Config,
    report: Rc<RefCell<RunReport>>,

    session: Session,
    image: Option<LoadedImage>,
    closing: bool,

    // pan & zoom
    pan: egui::Vec2,
    zoom: f32,
    panning: bool,
    fitted: bool,
}

impl<F: Write, E: Write> AnnotatorApp<F, E> {
    fn new(batch: Batch<F, E>, config: Config, report: Rc<RefCell<RunReport>>) -> Self {
        let session = Session::with_quit_key(config.quit_key);
        Self {
            batch,
            config,
            report,
            session,
            image: None,
            closing: false,
            pan: egui::Vec2::ZERO,
            zoom: 1.0,
            panning: false,
            fitted: false,
        }
    }

    fn image_size(&self) -> (f32, f32) {
        self.image.as_ref().map(|img| img.size).unwrap_or((1.0, 1.0))
    }

    /// Convert image-space coords to screen-space
    fn image_to_screen(&self, canvas_rect: egui::Rect, img_pos: egui::Pos2) -> egui::Pos2 {
        let (w, h) = self.image_size();
        canvas_rect.center() + self.pan + (img_pos.to_vec2() - egui::vec2(w, h) * 0.5) * self.zoom
    }

    /// Convert screen-space coords to image-space
    fn screen_to_image(&self, canvas_rect: egui::Rect, screen_pos: egui::Pos2) -> egui::Pos2 {
        let (w, h) = self.image_size();
        let rel = screen_pos - canvas_rect.center() - self.pan;
        egui::pos2(rel.x / self.zoom + w * 0.5, rel.y / self.zoom + h * 0.5)
    }

    fn image_rect_on_screen(&self, canvas_rect: egui::Rect) -> egui::Rect {
        let (w, h) = self.image_size();
        egui::Rect::from_min_max(
            self.image_to_screen(canvas_rect, egui::Pos2::ZERO),
            self.image_to_screen(canvas_rect, egui::pos2(w, h)),
        )
    }

    /// Pixel under `screen_pos`, or `None` outside the image.
    fn pixel_at(&self, canvas_rect: egui::Rect, screen_pos: Option<egui::Pos2>) -> Option<Point> {
        let pos = screen_pos?;
        if !canvas_rect.contains(pos) {
            return None;
        }
        let img = self.screen_to_image(canvas_rect, pos);
        let (w, h) = self.image_size();
        if img.x < 0.0 || img.y < 0.0 || img.x >= w || img.y >= h {
            return None;
        }
        Some(Point::from_f32(img.x, img.y))
    }

    fn pixel_center(&self, canvas_rect: egui::Rect, p: Point) -> egui::Pos2 {
        self.image_to_screen(canvas_rect, egui::pos2(p.x as f32 + 0.5, p.y as f32 + 0.5))
    }

    fn fit_to_canvas(&mut self, canvas_rect: egui::Rect) {
        if self.fitted || self.image.is_none() {
            return;
        }
        let (w, h) = self.image_size();
        let fit = (canvas_rect.width() / w).min(canvas_rect.height() / h) * 0.95;
        if fit.is_finite() && fit > 0.0 {
            self.zoom = fit;
        }
        self.pan = egui::Vec2::ZERO;
        self.fitted = true;
    }

    // ── Batch handling ──────────────────────────────────────────────────────

    /// Loads the current image of the batch if nothing is shown yet.
    fn ensure_image(&mut self, ctx: &egui::Context) {
        if self.image.is_some() || self.closing {
            return;
        }
        let Some(path) = self.batch.current() else {
            self.close(ctx);
            return;
        };
        match LoadedImage::open(path) {
            Ok(img) => {
                log::info!(
                    "annotating {} ({}/{})",
                    img.name,
                    self.batch.position() + 1,
                    self.batch.len()
                );
                ctx.send_viewport_cmd(egui::ViewportCommand::Title(format!(
                    "{APP_NAME} — {}",
                    img.file_name()
                )));
                self.image = Some(img);
                self.session = Session::with_quit_key(self.config.quit_key);
                self.fitted = false;
            }
            Err(e) => self.fail(ctx, e),
        }
    }

    fn apply(&mut self, ctx: &egui::Context, input: Input) {
        if let Transition::Finished(outcome) = self.session.handle(input) {
            log::debug!("session finished: {outcome:?}");
            match self.batch.finish(&self.session) {
                Ok(Flow::Continue) => self.image = None,
                Ok(Flow::Stop) => self.close(ctx),
                Err(e) => self.fail(ctx, e),
            }
            self.publish();
        }
    }

    fn fail(&mut self, ctx: &egui::Context, e: Error) {
        log::error!("{e}");
        self.batch.abort();
        self.report.borrow_mut().error = Some(e);
        self.close(ctx);
    }

    fn close(&mut self, ctx: &egui::Context) {
        self.closing = true;
        self.publish();
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    fn publish(&self) {
        self.report.borrow_mut().summary = self.batch.summary();
    }

    // ── Drawing ─────────────────────────────────────────────────────────────

    fn draw_overlays(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        let landmarks = self.session.landmarks();
        let rect = landmarks.rect();
        let (min, max) = (rect.min(), rect.max());
        let screen_rect = egui::Rect::from_min_max(
            self.image_to_screen(canvas_rect, egui::pos2(min.x as f32, min.y as f32)),
            self.image_to_screen(canvas_rect, egui::pos2(max.x as f32, max.y as f32)),
        );
        painter.rect_stroke(
            screen_rect,
            0.0,
            egui::Stroke::new(self.config.rect_thickness * self.zoom, RECT_COLOR),
            egui::StrokeKind::Middle,
        );

        for (_, point) in landmarks.points() {
            if let Some(p) = point {
                painter.circle_filled(
                    self.pixel_center(canvas_rect, p),
                    self.config.marker_radius,
                    MARKER_COLOR,
                );
            }
        }
    }

    fn slot_panel(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let mut pressed = None;

        egui::Grid::new("slot_grid").spacing([4.0, 4.0]).show(ui, |ui| {
            for (i, slot) in Slot::all().enumerate() {
                let button = egui::Button::new(self.session.slot_label(slot))
                    .min_size(egui::vec2(44.0, 24.0))
                    .selected(self.session.is_current(slot));
                if ui.add(button).clicked() {
                    pressed = Some(Input::Reset(slot));
                }
                if (i + 1) % SLOT_COLUMNS == 0 {
                    ui.end_row();
                }
            }
        });

        ui.separator();
        let wide = egui::vec2(ui.available_width(), 28.0);
        if ui.add(egui::Button::new("Done").min_size(wide)).clicked() {
            pressed = Some(Input::Done);
        }
        if ui.add(egui::Button::new("Skip").min_size(wide)).clicked() {
            pressed = Some(Input::Skip);
        }

        ui.separator();
        if let Some(ref img) = self.image {
            ui.label(format!(
                "{} ({}/{})",
                img.file_name(),
                self.batch.position() + 1,
                self.batch.len()
            ));
        }
        let target = match self.session.target() {
            Target::Rect => "drag the face rectangle".to_string(),
            Target::Point(k) => format!("click landmark {k}"),
        };
        ui.label(target);
        ui.label(format!(
            "{}/{LANDMARK_COUNT} landmarks set",
            self.session.landmarks().set_count()
        ));
        ui.label(format!("press '{}' to quit without saving", self.config.quit_key));

        if let Some(input) = pressed {
            self.apply(ctx, input);
        }
    }
}

/// First character of a key's name, for single-character keys.
fn key_char(key: egui::Key) -> Option<char> {
    let mut chars = key.name().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c.to_ascii_lowercase()),
        _ => None,
    }
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl<F: Write, E: Write> eframe::App for AnnotatorApp<F, E> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) && !self.closing {
            log::warn!("window closed before the run finished");
            self.batch.abort();
            self.closing = true;
            self.publish();
            return;
        }

        self.ensure_image(ctx);
        if self.closing {
            return;
        }
        if let Some(ref mut img) = self.image {
            img.ensure_texture(ctx);
        }

        // Keyboard
        let keys: Vec<char> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        repeat: false,
                        ..
                    } => key_char(*key),
                    _ => None,
                })
                .collect()
        });
        for c in keys {
            self.apply(ctx, Input::Key(c));
            if self.image.is_none() || self.closing {
                return;
            }
        }

        // Slot buttons
        egui::SidePanel::right("slots")
            .resizable(false)
            .show(ctx, |ui| self.slot_panel(ctx, ui));
        if self.image.is_none() || self.closing {
            ctx.request_repaint();
            return;
        }

        // Canvas
        egui::CentralPanel::default().show(ctx, |ui| {
            let (response, painter) =
                ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
            let canvas_rect = response.rect;
            self.fit_to_canvas(canvas_rect);

            painter.rect_filled(canvas_rect, 0.0, egui::Color32::from_gray(40));

            if let Some(tex) = self.image.as_ref().and_then(|img| img.texture.as_ref()) {
                painter.image(
                    tex.id(),
                    self.image_rect_on_screen(canvas_rect),
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }

            self.draw_overlays(&painter, canvas_rect);

            // Handle pan (middle mouse button)
            let middle_down = ctx.input(|i| i.pointer.middle_down());
            if middle_down {
                self.pan += ctx.input(|i| i.pointer.delta());
                self.panning = true;
            } else {
                self.panning = false;
            }

            // Handle zoom (scroll wheel)
            let scroll_delta = ctx.input(|i| i.smooth_scroll_delta.y);
            if scroll_delta != 0.0 && response.hovered() {
                let new_zoom = (self.zoom * (1.0 + scroll_delta * 0.002)).clamp(0.05, 40.0);
                if let Some(cursor) = response.hover_pos() {
                    let cursor_rel = cursor - canvas_rect.center() - self.pan;
                    self.pan -= cursor_rel * (new_zoom / self.zoom - 1.0);
                }
                self.zoom = new_zoom;
            }

            // Primary button drives the session
            if !self.panning {
                let (pressed, released, down, moving, pos) = ctx.input(|i| {
                    (
                        i.pointer.primary_pressed(),
                        i.pointer.primary_released(),
                        i.pointer.primary_down(),
                        i.pointer.is_moving(),
                        i.pointer.interact_pos(),
                    )
                });
                let pixel = self.pixel_at(canvas_rect, pos);
                if pressed && response.hovered() {
                    self.apply(ctx, Input::PointerDown(pixel));
                }
                if down && moving && self.session.is_dragging_rect() {
                    self.apply(ctx, Input::PointerMove(pixel));
                }
                if released && self.session.target() == Target::Rect {
                    self.apply(ctx, Input::PointerUp(pixel));
                }
            }
        });
    }
}

// ── Entry point ─────────────────────────────────────────────────────────────

/// Opens the annotation window and runs every image of `batch` through it.
///
/// Returns once the window closes. A fatal error raised inside the window
/// (an unreadable image, a failed write) is returned here.
pub fn run<F, E>(batch: Batch<F, E>, config: Config) -> Result<Summary>
where
    F: Write + 'static,
    E: Write + 'static,
{
    let report = Rc::new(RefCell::new(RunReport::default()));
    let app_report = Rc::clone(&report);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_title(APP_NAME),
        ..Default::default()
    };

    eframe::run_native(
        APP_NAME,
        options,
        Box::new(move |_cc| Ok(Box::new(AnnotatorApp::new(batch, config, app_report)))),
    )
    .map_err(|e| Error::Gui(e.to_string()))?;

    let report = report.take();
    match report.error {
        Some(e) => Err(e),
        None => Ok(report.summary),
    }
}
