//! Application state, user commands, and the per-frame update
//!
//! [`App`] owns everything that changes while the program runs.  Front-ends
//! turn widget and pointer events into [`Command`]s, then call
//! [`App::frame`] once per frame to advance the animation and sample the live
//! slice; the returned [`Frame`] draws both views from that single snapshot.
use crate::{
    Error,
    animate::{Animator, Bounds, Glide},
    expr::{Field, Preset, compile, pretty},
    render::{DrawList, Preview2, Scene3, Snapshot},
    sample::{SliceParams, sample},
    trace::TraceStore,
    view::{InputRouter, Region, ScreenSize},
};
use log::{debug, info, warn};
use nalgebra::{Point2, Vector2};

/// User-configurable values
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Starting bound of the level range
    pub min_z: f64,
    /// Finishing bound of the level range
    pub max_z: f64,
    /// Animation speed, in level units per second
    pub speed: f64,
    /// Number of grid steps between the origin and each edge
    pub grid_resolution: u32,
    /// Half-width of the sampled square, in model units
    pub span: f64,
    /// Half-thickness of the accepted band around the level
    pub tolerance: f64,
    /// Equation text
    pub equation: String,
    /// Whether the 2D preview is visible
    pub show_preview: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_z: -5.0,
            max_z: 5.0,
            speed: 1.0,
            grid_resolution: 200,
            span: 10.0,
            tolerance: 0.02,
            equation: Preset::Paraboloid.equation().to_owned(),
            show_preview: true,
        }
    }
}

impl Settings {
    /// Checks that every numeric setting is in its valid range
    pub fn validate(&self) -> Result<(), Error> {
        let bad = |name: &'static str, v: f64| -> Result<(), Error> {
            Err(Error::InvalidSetting(name, v.to_string()))
        };
        if !self.min_z.is_finite() {
            return bad("min_z", self.min_z);
        }
        if !self.max_z.is_finite() {
            return bad("max_z", self.max_z);
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return bad("speed", self.speed);
        }
        if self.grid_resolution == 0 {
            return Err(Error::InvalidSetting(
                "grid_resolution",
                "must be at least 1".to_owned(),
            ));
        }
        if !(self.span.is_finite() && self.span > 0.0) {
            return bad("span", self.span);
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return bad("tolerance", self.tolerance);
        }
        Ok(())
    }

    /// Returns the level bounds
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.min_z, self.max_z)
    }

    /// Returns sampling parameters for the given level
    pub fn slice_params(&self, level: f64) -> SliceParams {
        SliceParams {
            level,
            grid_resolution: self.grid_resolution,
            span: self.span,
            tolerance: self.tolerance,
        }
    }
}

/// A single user action
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replace the equation with a preset
    SelectPreset(Preset),
    /// Replace the equation with new text
    EditEquation(String),
    /// Start a sweep from `min_z` toward `max_z`
    Animate,
    /// Stop sweeping and gliding, keeping the level
    Pause,
    /// Stop all motion, clear traces and the preview view, and return the
    /// level to `min_z`
    Reset,
    /// Set the level (clamped into the bounds)
    SetLevel(f64),
    /// Begin or end a held-key glide
    Glide(Glide),
    /// Freeze the current slice
    Capture,
    /// Change the starting bound
    SetMinZ(f64),
    /// Change the finishing bound
    SetMaxZ(f64),
    /// Change the animation speed
    SetSpeed(f64),
    /// Change the sampling grid resolution
    SetGridResolution(u32),
    /// Show or hide the 2D preview
    ShowPreview(bool),
    /// Wheel notches over the 2D preview (positive zooms in)
    PreviewWheel(i32),
    /// Wheel notches over the 3D scene (positive zooms in)
    SceneWheel(i32),
    /// Pointer pressed over a region
    PointerDown(Region),
    /// Pointer moved by the given screen-space delta
    PointerDrag(Vector2<f32>),
    /// Pointer released anywhere
    PointerUp,
}

/// Complete application state
#[derive(Clone, Debug)]
pub struct App {
    settings: Settings,
    field: Field,
    pretty: String,
    warning: Option<Error>,
    level: f64,
    traces: TraceStore,
    animator: Animator,
    router: InputRouter,
    scene: Scene3,
    preview: Preview2,
    live: Vec<Point2<f64>>,
}

impl App {
    /// Builds a new application, compiling the equation in `settings`
    ///
    /// Returns an error if the settings are invalid; a malformed equation is
    /// not an error, and is reported through [`App::take_warning`] instead.
    pub fn new(settings: Settings) -> Result<Self, Error> {
        settings.validate()?;
        let mut app = Self {
            level: settings.bounds().clamp(settings.min_z),
            settings,
            field: Field::zero(),
            pretty: String::new(),
            warning: None,
            traces: TraceStore::new(),
            animator: Animator::default(),
            router: InputRouter::default(),
            scene: Scene3::default(),
            preview: Preview2::default(),
            live: vec![],
        };
        app.rebuild();
        Ok(app)
    }

    /// Recompiles the equation and discards everything derived from the old
    /// one
    fn rebuild(&mut self) {
        let compiled = compile(&self.settings.equation);
        self.field = compiled.field;
        self.warning = compiled.warning;
        self.pretty = pretty(&self.settings.equation);
        self.traces.clear();
        self.preview.view_mut().reset();
    }

    /// Applies a single command
    ///
    /// Out-of-range settings are logged and ignored.
    pub fn apply(&mut self, cmd: Command) {
        debug!("applying {cmd:?}");
        match cmd {
            Command::SelectPreset(p) => {
                info!("selected preset '{p}'");
                self.settings.equation = p.equation().to_owned();
                self.rebuild();
            }
            Command::EditEquation(text) => {
                self.settings.equation = text;
                self.rebuild();
            }
            Command::Animate => {
                self.level = self.animator.start_sweep(self.bounds());
            }
            Command::Pause => self.animator.pause(),
            Command::Reset => {
                info!("reset");
                self.animator.pause();
                self.traces.clear();
                self.preview.view_mut().reset();
                self.level = self.bounds().clamp(self.settings.min_z);
            }
            Command::SetLevel(z) => self.level = self.bounds().clamp(z),
            Command::Glide(g) => self.animator.set_glide(g),
            Command::Capture => {
                let params = self.settings.slice_params(self.level);
                let bounds = self.bounds();
                self.traces.add_trace(&self.field, &params, bounds);
            }
            Command::SetMinZ(v) => self.set_bound(v, self.settings.max_z),
            Command::SetMaxZ(v) => self.set_bound(self.settings.min_z, v),
            Command::SetSpeed(v) => {
                self.try_update(|s| s.speed = v);
            }
            Command::SetGridResolution(n) => {
                self.try_update(|s| s.grid_resolution = n);
            }
            Command::ShowPreview(b) => self.settings.show_preview = b,
            Command::PreviewWheel(n) => {
                if self.router.owner() != Some(Region::Scene) {
                    self.preview.view_mut().wheel(n);
                }
            }
            Command::SceneWheel(n) => {
                if self.router.orbit_enabled() {
                    self.scene.camera_mut().wheel(n);
                }
            }
            Command::PointerDown(r) => {
                self.router.pointer_down(r);
            }
            Command::PointerDrag(delta) => match self.router.owner() {
                Some(Region::Preview) => {
                    self.preview.view_mut().drag(delta);
                }
                Some(Region::Scene) => {
                    self.scene.camera_mut().rotate(delta);
                }
                None => (),
            },
            Command::PointerUp => self.router.pointer_up(),
        }
    }

    /// Applies a settings change if the result is valid
    fn try_update<F: FnOnce(&mut Settings)>(&mut self, f: F) -> bool {
        let mut next = self.settings.clone();
        f(&mut next);
        match next.validate() {
            Ok(()) => {
                self.settings = next;
                true
            }
            Err(e) => {
                warn!("ignoring setting: {e}");
                false
            }
        }
    }

    fn set_bound(&mut self, min_z: f64, max_z: f64) {
        if self.try_update(|s| {
            s.min_z = min_z;
            s.max_z = max_z;
        }) {
            self.level = self.bounds().clamp(self.level);
            let (lo, hi) = self.legend();
            debug!("bounds are now [{lo}, {hi}]");
        }
    }

    /// Advances the animation by `dt` seconds and samples the live slice
    ///
    /// The returned frame borrows a consistent snapshot of the level, bounds,
    /// live slice, and traces, which both views draw from.
    pub fn frame(&mut self, dt: f64) -> Frame<'_> {
        self.level = self.animator.step(
            self.level,
            self.bounds(),
            self.settings.speed,
            dt,
        );
        let params = self.settings.slice_params(self.level);
        self.live = sample(&self.field, &params);
        Frame {
            snapshot: Snapshot {
                level: self.level,
                bounds: self.bounds(),
                span: self.settings.span,
                live: &self.live,
                traces: &self.traces,
                equation: &self.pretty,
            },
            scene: &self.scene,
            preview: &self.preview,
            show_preview: self.settings.show_preview,
        }
    }

    /// Returns the current level
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Returns the current level bounds
    pub fn bounds(&self) -> Bounds {
        self.settings.bounds()
    }

    /// Borrows the current settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Borrows the compiled field
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Returns the prettified equation, as shown in both views
    pub fn pretty_equation(&self) -> &str {
        &self.pretty
    }

    /// Borrows the frozen traces
    pub fn traces(&self) -> &TraceStore {
        &self.traces
    }

    /// Borrows the animation state
    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    /// Borrows the input router
    pub fn router(&self) -> &InputRouter {
        &self.router
    }

    /// Borrows the 3D renderer (and its camera)
    pub fn scene(&self) -> &Scene3 {
        &self.scene
    }

    /// Borrows the 2D renderer (and its pan/zoom state)
    pub fn preview(&self) -> &Preview2 {
        &self.preview
    }

    /// Returns the most recent compile error, clearing it
    ///
    /// Each failed compilation is reported once.
    pub fn take_warning(&mut self) -> Option<Error> {
        self.warning.take()
    }

    /// Returns the legend labels for the bottom and top of the level range
    pub fn legend(&self) -> (String, String) {
        (self.settings.min_z.to_string(), self.settings.max_z.to_string())
    }

    /// Returns the range of the level slider
    pub fn slider_range(&self) -> std::ops::RangeInclusive<f64> {
        let (lo, hi) = self.bounds().ordered();
        lo..=hi
    }
}

/// Consistent view of the application state for drawing a single frame
#[derive(Copy, Clone, Debug)]
pub struct Frame<'a> {
    snapshot: Snapshot<'a>,
    scene: &'a Scene3,
    preview: &'a Preview2,
    show_preview: bool,
}

impl Frame<'_> {
    /// Borrows the shared snapshot
    pub fn snapshot(&self) -> &Snapshot<'_> {
        &self.snapshot
    }

    /// Checks whether the 2D preview should be shown
    pub fn show_preview(&self) -> bool {
        self.show_preview
    }

    /// Draws the 3D scene
    pub fn scene(&self, size: ScreenSize) -> DrawList {
        self.scene.draw(&self.snapshot, size)
    }

    /// Draws the 2D preview
    pub fn preview(&self, size: ScreenSize) -> DrawList {
        self.preview.draw(&self.snapshot, size)
    }

    /// Returns the readout text shown at the top of the preview
    pub fn readout(&self) -> String {
        format!("{}  =  {:.2}", self.snapshot.equation, self.snapshot.level)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::view::{DEFAULT_ZOOM, InputState};

    fn app() -> App {
        App::new(Settings {
            grid_resolution: 20,
            ..Settings::default()
        })
        .unwrap()
    }

    #[test]
    fn settings_validation() {
        assert!(Settings::default().validate().is_ok());
        for s in [
            Settings {
                speed: 0.0,
                ..Settings::default()
            },
            Settings {
                grid_resolution: 0,
                ..Settings::default()
            },
            Settings {
                span: -1.0,
                ..Settings::default()
            },
            Settings {
                tolerance: f64::NAN,
                ..Settings::default()
            },
            Settings {
                min_z: f64::INFINITY,
                ..Settings::default()
            },
        ] {
            assert!(matches!(s.validate(), Err(Error::InvalidSetting(..))));
            assert!(App::new(s).is_err());
        }
    }

    #[test]
    fn new_app_starts_at_min() {
        let mut a = app();
        assert_eq!(a.level(), -5.0);
        assert!(a.take_warning().is_none());
        assert_eq!(a.pretty_equation(), "x² + y²");
        assert_eq!(a.legend(), ("-5".to_owned(), "5".to_owned()));
        assert_eq!(a.slider_range(), -5.0..=5.0);
    }

    #[test]
    fn capture_and_reset() {
        let mut a = app();
        a.apply(Command::SetLevel(4.0));
        a.apply(Command::Capture);
        a.apply(Command::SetLevel(1.0));
        a.apply(Command::Capture);
        assert_eq!(a.traces().len(), 2);
        assert_eq!(a.traces().traces_2d()[0].points().len(), 4);

        a.apply(Command::PreviewWheel(3));
        a.apply(Command::Animate);
        a.apply(Command::Reset);
        assert!(a.traces().is_empty());
        assert!(!a.animator().is_moving());
        assert_eq!(a.preview().view().zoom(), DEFAULT_ZOOM);
        assert_eq!(a.level(), -5.0);
    }

    #[test]
    fn equation_edits() {
        let mut a = app();
        a.apply(Command::SetLevel(4.0));
        a.apply(Command::Capture);
        a.apply(Command::PreviewWheel(2));

        a.apply(Command::EditEquation("(x + y".to_owned()));
        assert!(a.traces().is_empty());
        assert_eq!(a.preview().view().zoom(), DEFAULT_ZOOM);
        assert!(a.take_warning().is_some());
        assert!(a.take_warning().is_none());
        let frame = a.frame(0.0);
        assert!(frame.snapshot().live.is_empty());

        a.apply(Command::SelectPreset(Preset::Saddle));
        assert_eq!(a.settings().equation, "x*x - y*y");
        assert!(a.take_warning().is_none());
        assert_eq!(a.field().text(), "x*x - y*y");
    }

    #[test]
    fn bounds_change_clamps_level() {
        let mut a = app();
        a.apply(Command::SetLevel(4.0));
        a.apply(Command::SetMaxZ(2.0));
        assert_eq!(a.level(), 2.0);
        assert_eq!(a.legend().1, "2");
        assert_eq!(a.slider_range(), -5.0..=2.0);

        a.apply(Command::SetMinZ(f64::NAN));
        assert_eq!(a.settings().min_z, -5.0);

        a.apply(Command::SetMinZ(3.0));
        assert_eq!(a.slider_range(), 2.0..=3.0);
        assert!(a.bounds().contains(a.level()));
    }

    #[test]
    fn invalid_settings_are_ignored() {
        let mut a = app();
        a.apply(Command::SetSpeed(-1.0));
        assert_eq!(a.settings().speed, 1.0);
        a.apply(Command::SetSpeed(2.5));
        assert_eq!(a.settings().speed, 2.5);
        a.apply(Command::SetGridResolution(0));
        assert_eq!(a.settings().grid_resolution, 20);
        a.apply(Command::ShowPreview(false));
        assert!(!a.frame(0.0).show_preview());
    }

    #[test]
    fn pointer_routing() {
        let mut a = app();
        let yaw = a.scene().camera().yaw();

        a.apply(Command::PointerDown(Region::Preview));
        a.apply(Command::PointerDrag(Vector2::new(4.0, 0.0)));
        assert_eq!(a.router().state(), InputState::Dragging2D);
        assert_eq!(a.preview().view().pan(), Vector2::new(10.0, 0.0));
        assert_eq!(a.scene().camera().yaw(), yaw);

        // Orbit zoom is suppressed while panning the preview
        let d = a.scene().camera().distance();
        a.apply(Command::SceneWheel(1));
        assert_eq!(a.scene().camera().distance(), d);
        a.apply(Command::PointerUp);

        a.apply(Command::PointerDown(Region::Scene));
        a.apply(Command::PointerDrag(Vector2::new(4.0, 0.0)));
        assert_ne!(a.scene().camera().yaw(), yaw);
        assert_eq!(a.preview().view().pan(), Vector2::new(10.0, 0.0));
        let z = a.preview().view().zoom();
        a.apply(Command::PreviewWheel(1));
        assert_eq!(a.preview().view().zoom(), z);
        a.apply(Command::PointerUp);
        assert_eq!(a.router().state(), InputState::Idle);
    }

    #[test]
    fn frame_samples_once() {
        let mut a = app();
        a.apply(Command::SetLevel(4.0));
        let frame = a.frame(0.0);
        assert_eq!(frame.snapshot().live.len(), 4);
        assert_eq!(frame.readout(), "x² + y²  =  4.00");
        let size = ScreenSize::from(300);
        assert!(!frame.scene(size).is_empty());
        assert!(frame.preview(size).texts().any(|t| t == frame.readout()));
    }

    #[test]
    fn glide_through_frames() {
        let mut a = app();
        a.apply(Command::Glide(Glide::Up));
        a.frame(0.5);
        assert_eq!(a.level(), -4.5);
        a.apply(Command::Glide(Glide::Idle));
        a.frame(0.5);
        assert_eq!(a.level(), -4.5);
        a.apply(Command::Glide(Glide::Down));
        for _ in 0..100 {
            a.frame(0.5);
        }
        assert_eq!(a.level(), -5.0);
    }
}
