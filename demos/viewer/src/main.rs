use anyhow::Result;
use clap::Parser;
use crossbeam_channel::{Receiver, unbounded};
use eframe::egui;
use env_logger::Env;
use log::{debug, info, warn};
use nalgebra::Vector2;
use notify::Watcher;
use strum::IntoEnumIterator;
use zslice::{
    animate::Glide,
    app::{App, Command, Settings},
    expr::Preset,
    view::{Region, ScreenSize},
};

use std::path::PathBuf;

mod paint;
mod watcher;

/// Side length of the 2D preview, in points
const PREVIEW_SIZE: f32 = 350.0;

/// Interactive viewer for level-set slices of f(x, y)
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Equation in x and y
    #[clap(short, long, default_value = "x*x + y*y")]
    equation: String,

    /// Starting bound of the level range
    #[clap(long, default_value_t = -5.0, allow_negative_numbers = true)]
    min_z: f64,

    /// Finishing bound of the level range
    #[clap(long, default_value_t = 5.0, allow_negative_numbers = true)]
    max_z: f64,

    /// Animation speed, in levels per second
    #[clap(long, default_value_t = 1.0)]
    speed: f64,

    /// Grid steps between the origin and each edge of the sampled square
    #[clap(short, long, default_value_t = 200)]
    grid: u32,

    /// Hide the 2D preview on startup
    #[clap(long)]
    no_preview: bool,

    /// File to watch; its contents replace the equation whenever it changes
    #[clap(long)]
    watch: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .init();
    let args = Args::parse();

    let settings = Settings {
        min_z: args.min_z,
        max_z: args.max_z,
        speed: args.speed,
        grid_resolution: args.grid,
        equation: args.equation.clone(),
        show_preview: !args.no_preview,
        ..Settings::default()
    };
    let app = App::new(settings)?;

    // If we're watching a file, a pair of threads forwards its contents:
    //
    // - `notify` produces () notifications
    // - the file watcher thread reads the file and sends its text
    //
    // The GUI drains the text channel once per frame.
    let mut watch = None;
    if let Some(path) = &args.watch {
        let (notify_tx, notify_rx) = unbounded();
        let (text_tx, text_rx) = unbounded();
        let p = path.clone();
        std::thread::spawn(move || {
            if let Err(e) = watcher::file_watcher_thread(&p, notify_rx, text_tx)
            {
                warn!("file watcher thread failed: {e}");
            }
            info!("file watcher thread is done");
        });

        let mut w = notify::recommended_watcher(move |res| match res {
            Ok(event) => {
                debug!("file watcher: {event:?}");
                if notify_tx.send(()).is_err() {
                    warn!("file watcher thread has stopped");
                }
            }
            Err(e) => warn!("watch error: {e:?}"),
        })?;
        w.watch(path, notify::RecursiveMode::NonRecursive)?;
        watch = Some((w, text_rx));
    }

    let mut options = eframe::NativeOptions::default();
    let size = egui::Vec2::new(1280.0, 800.0);
    options.viewport.inner_size = Some(size);

    eframe::run_native(
        "zslice",
        options,
        Box::new(move |_cc| Ok(Box::new(ViewerApp::new(app, watch)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))?;

    Ok(())
}

////////////////////////////////////////////////////////////////////////////////

struct ViewerApp {
    app: App,

    /// Contents of the equation text box, which may not be committed yet
    equation: String,

    /// Compile error, shown until dismissed
    warning: Option<String>,

    /// Current glide, from held keys or buttons
    glide: Glide,

    /// Keeps the `notify` watcher alive, and receives new equations
    watch: Option<(notify::RecommendedWatcher, Receiver<String>)>,
}

impl ViewerApp {
    fn new(
        app: App,
        watch: Option<(notify::RecommendedWatcher, Receiver<String>)>,
    ) -> Self {
        Self {
            equation: app.settings().equation.clone(),
            app,
            warning: None,
            glide: Glide::Idle,
            watch,
        }
    }

    /// Draws the control panel, returning commands to apply
    fn draw_controls(&mut self, ctx: &egui::Context) -> Vec<Command> {
        let mut out = vec![];
        let mut glide = Glide::Idle;
        egui::SidePanel::left("controls")
            .resizable(false)
            .show(ctx, |ui| {
                ui.heading("f(x, y)");
                let r = ui.text_edit_singleline(&mut self.equation);
                let edited = self.equation != self.app.settings().equation;
                if r.lost_focus() && edited {
                    out.push(Command::EditEquation(self.equation.clone()));
                }
                egui::ComboBox::from_label("Preset")
                    .selected_text("Choose…")
                    .show_ui(ui, |ui| {
                        for p in Preset::iter() {
                            let r = ui.selectable_label(false, p.to_string());
                            if r.clicked() {
                                self.equation = p.equation().to_owned();
                                out.push(Command::SelectPreset(p));
                            }
                        }
                    });
                ui.separator();

                let s = self.app.settings();
                let (mut min_z, mut max_z) = (s.min_z, s.max_z);
                let (mut speed, mut grid) = (s.speed, s.grid_resolution);
                let mut show_preview = s.show_preview;
                ui.horizontal(|ui| {
                    ui.label("min z");
                    let r = ui.add(egui::DragValue::new(&mut min_z).speed(0.1));
                    if r.changed() {
                        out.push(Command::SetMinZ(min_z));
                    }
                    ui.label("max z");
                    let r = ui.add(egui::DragValue::new(&mut max_z).speed(0.1));
                    if r.changed() {
                        out.push(Command::SetMaxZ(max_z));
                    }
                });
                let mut level = self.app.level();
                if ui
                    .add(
                        egui::Slider::new(&mut level, self.app.slider_range())
                            .text("z"),
                    )
                    .changed()
                {
                    out.push(Command::SetLevel(level));
                }
                let (lo, hi) = self.app.legend();
                ui.label(format!("blue at {lo}, red at {hi}"));
                if ui
                    .add(
                        egui::Slider::new(&mut speed, 0.1..=10.0)
                            .text("speed"),
                    )
                    .changed()
                {
                    out.push(Command::SetSpeed(speed));
                }
                if ui
                    .add(egui::Slider::new(&mut grid, 10..=600).text("grid"))
                    .changed()
                {
                    out.push(Command::SetGridResolution(grid));
                }
                if ui.checkbox(&mut show_preview, "2D preview").changed() {
                    out.push(Command::ShowPreview(show_preview));
                }
                ui.separator();

                ui.horizontal(|ui| {
                    if ui.button("Animate").clicked() {
                        out.push(Command::Animate);
                    }
                    if ui.button("Pause").clicked() {
                        out.push(Command::Pause);
                    }
                    if ui.button("Reset").clicked() {
                        out.push(Command::Reset);
                    }
                });
                ui.horizontal(|ui| {
                    if ui.button("▲").is_pointer_button_down_on() {
                        glide = Glide::Up;
                    }
                    if ui.button("▼").is_pointer_button_down_on() {
                        glide = Glide::Down;
                    }
                    if ui.button("Capture").clicked() {
                        out.push(Command::Capture);
                    }
                });
                ui.label(format!("{} frozen slices", self.app.traces().len()));
                ui.separator();
                ui.label("Space: capture\n↑/↓: glide");
            });

        // Keyboard shortcuts, unless a text box has focus
        if !ctx.wants_keyboard_input() {
            ctx.input(|i| {
                if i.key_pressed(egui::Key::Space) {
                    out.push(Command::Capture);
                }
                if i.key_down(egui::Key::ArrowUp) {
                    glide = Glide::Up;
                } else if i.key_down(egui::Key::ArrowDown) {
                    glide = Glide::Down;
                }
            });
        }
        if glide != self.glide {
            self.glide = glide;
            out.push(Command::Glide(glide));
        }
        out
    }

    /// Converts pointer input over a region into commands
    fn pointer_commands(
        ctx: &egui::Context,
        r: &egui::Response,
        region: Region,
        out: &mut Vec<Command>,
    ) {
        if r.drag_started() {
            out.push(Command::PointerDown(region));
        }
        if r.hovered() {
            let scroll = ctx.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let notches = if scroll > 0.0 { 1 } else { -1 };
                out.push(match region {
                    Region::Scene => Command::SceneWheel(notches),
                    Region::Preview => Command::PreviewWheel(notches),
                });
            }
        }
    }

    fn draw_warning(&mut self, ctx: &egui::Context) {
        if let Some(e) = self.app.take_warning() {
            self.warning = Some(e.to_string());
        }
        let mut dismissed = false;
        if let Some(w) = &self.warning {
            egui::Window::new("Invalid equation")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, 40.0))
                .show(ctx, |ui| {
                    ui.label(w);
                    ui.label("Using f(x, y) = 0 instead.");
                    dismissed = ui.button("OK").clicked();
                });
        }
        if dismissed {
            self.warning = None;
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some((_, rx)) = &self.watch {
            if let Some(text) = rx.try_iter().last() {
                info!("loaded equation from file");
                self.equation = text.clone();
                self.app.apply(Command::EditEquation(text));
            }
        }

        for cmd in self.draw_controls(ctx) {
            self.app.apply(cmd);
        }
        self.draw_warning(ctx);

        let dt = ctx.input(|i| i.stable_dt) as f64;
        let frame = self.app.frame(dt);
        let mut pointer = vec![];

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let (rect, r) = ui.allocate_exact_size(
                    ui.available_size(),
                    egui::Sense::click_and_drag(),
                );
                let size = ScreenSize::new(rect.width(), rect.height());
                paint::paint(&ui.painter_at(rect), rect, &frame.scene(size));
                Self::pointer_commands(ctx, &r, Region::Scene, &mut pointer);
            });

        if frame.show_preview() {
            egui::Window::new("2D preview")
                .resizable(false)
                .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
                .show(ctx, |ui| {
                    let (rect, r) = ui.allocate_exact_size(
                        egui::vec2(PREVIEW_SIZE, PREVIEW_SIZE),
                        egui::Sense::click_and_drag(),
                    );
                    let size = ScreenSize::new(rect.width(), rect.height());
                    paint::paint(
                        &ui.painter_at(rect),
                        rect,
                        &frame.preview(size),
                    );
                    Self::pointer_commands(
                        ctx,
                        &r,
                        Region::Preview,
                        &mut pointer,
                    );
                });
        }

        // Drags are routed by the library, and releases are global so that a
        // drag ends even if the pointer has left the panel it started on.
        ctx.input(|i| {
            let d = i.pointer.delta();
            if i.pointer.any_down() && d != egui::Vec2::ZERO {
                pointer.push(Command::PointerDrag(Vector2::new(d.x, d.y)));
            }
            if i.pointer.any_released() {
                pointer.push(Command::PointerUp);
            }
        });
        for cmd in pointer {
            self.app.apply(cmd);
        }

        ctx.request_repaint();
    }
}
