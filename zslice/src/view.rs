//! Camera, pan, and zoom state for both views, plus pointer routing
//!
//! The 3D scene uses an [`OrbitCamera`] looking at the origin with `+Z` up.
//! The 2D preview uses a [`PreviewView`], a pan/zoom transform with `+Y` up.
//! An [`InputRouter`] decides which of the two owns an in-progress drag.
use nalgebra::{
    Isometry3, Matrix3, Perspective3, Point2, Point3, Vector2, Vector3,
};

/// Size of a drawing surface, in screen pixels
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScreenSize {
    /// Width in pixels
    pub width: f32,
    /// Height in pixels
    pub height: f32,
}

impl ScreenSize {
    /// Builds a new screen size
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the center of the surface
    pub fn center(&self) -> Point2<f32> {
        Point2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Returns `width / height`, or 1 for degenerate sizes
    pub fn aspect(&self) -> f32 {
        if self.width > 0.0 && self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

impl From<u32> for ScreenSize {
    fn from(s: u32) -> Self {
        Self::new(s as f32, s as f32)
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Smallest allowed preview zoom
pub const ZOOM_MIN: f32 = 0.3;

/// Largest allowed preview zoom
pub const ZOOM_MAX: f32 = 30.0;

/// Zoom factor per wheel notch
pub const ZOOM_STEP: f32 = 1.25;

/// Preview zoom after a reset
pub const DEFAULT_ZOOM: f32 = 0.4;

/// Pan and zoom of the 2D preview
///
/// Preview coordinates are mapped to the screen by
/// ```text
/// screen.x = width / 2  + (p.x + pan.x) * zoom
/// screen.y = height / 2 + (pan.y - p.y) * zoom
/// ```
/// so `pan` is measured in preview units and drags feel the same at every
/// zoom level.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PreviewView {
    pan: Vector2<f32>,
    zoom: f32,
}

impl Default for PreviewView {
    fn default() -> Self {
        Self {
            pan: Vector2::zeros(),
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl PreviewView {
    /// Builds a view with the given pan and zoom (clamped)
    pub fn new(pan: Vector2<f32>, zoom: f32) -> Self {
        Self {
            pan,
            zoom: zoom.clamp(ZOOM_MIN, ZOOM_MAX),
        }
    }

    /// Returns the current zoom factor
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Returns the current pan offset, in preview units
    pub fn pan(&self) -> Vector2<f32> {
        self.pan
    }

    /// Restores the default pan and zoom
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Applies wheel notches (positive zooms in, negative zooms out)
    ///
    /// Every notch moves the zoom in the same direction, so clamping once
    /// matches clamping after each notch.  Returns `true` if the zoom
    /// changed.
    pub fn wheel(&mut self, notches: i32) -> bool {
        let prev = self.zoom;
        self.zoom =
            (self.zoom * ZOOM_STEP.powi(notches)).clamp(ZOOM_MIN, ZOOM_MAX);
        self.zoom != prev
    }

    /// Pans by a drag delta given in screen pixels
    ///
    /// Returns `true` if the view has changed.
    pub fn drag(&mut self, delta: Vector2<f32>) -> bool {
        let dt = delta / self.zoom;
        self.pan += dt;
        dt != Vector2::zeros()
    }

    /// Returns the preview-to-screen transform matrix
    pub fn world_to_screen(&self, size: ScreenSize) -> Matrix3<f32> {
        let c = size.center();
        let z = self.zoom;
        Matrix3::new(
            z, 0.0, c.x + self.pan.x * z, //
            0.0, -z, c.y + self.pan.y * z, //
            0.0, 0.0, 1.0,
        )
    }

    /// Transforms a point from preview to screen coordinates
    pub fn to_screen(&self, p: &Point2<f32>, size: ScreenSize) -> Point2<f32> {
        self.world_to_screen(size).transform_point(p)
    }

    /// Transforms a point from screen to preview coordinates
    pub fn to_world(&self, p: &Point2<f32>, size: ScreenSize) -> Point2<f32> {
        let c = size.center();
        Point2::new(
            (p.x - c.x) / self.zoom - self.pan.x,
            self.pan.y - (p.y - c.y) / self.zoom,
        )
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Radians of rotation per pixel of drag
const ROTATE_SPEED: f32 = 0.01;

/// Pitch limit, to keep the camera from flipping over the pole
const PITCH_LIMIT: f32 = 1.55;

const NEAR: f32 = 1.0;
const FAR: f32 = 20_000.0;

/// Result of projecting a point into the 3D scene
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Projected {
    /// Position in screen pixels
    pub pos: Point2<f32>,
    /// Distance in front of the camera
    pub depth: f32,
}

/// Perspective camera orbiting the origin, with `+Z` up
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OrbitCamera {
    yaw: f32,
    pitch: f32,
    distance: f32,
    fov: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            yaw: -0.9,
            pitch: 0.5,
            distance: 1100.0,
            fov: std::f32::consts::FRAC_PI_3,
        }
    }
}

impl OrbitCamera {
    /// Smallest distance from the origin
    pub const DISTANCE_MIN: f32 = 100.0;
    /// Largest distance from the origin
    pub const DISTANCE_MAX: f32 = 10_000.0;

    /// Returns the yaw angle (about `+Z`), in radians
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Returns the pitch angle (elevation above the XY plane), in radians
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Returns the distance from the origin
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Returns the camera position in world coordinates
    pub fn eye(&self) -> Point3<f32> {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Point3::new(cp * cy, cp * sy, sp) * self.distance
    }

    /// Rotates the camera by a drag delta given in screen pixels
    ///
    /// Returns `true` if the view has changed.
    pub fn rotate(&mut self, delta: Vector2<f32>) -> bool {
        let yaw = (self.yaw - delta.x * ROTATE_SPEED) % std::f32::consts::TAU;
        let pitch = (self.pitch + delta.y * ROTATE_SPEED)
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);
        let changed = yaw != self.yaw || pitch != self.pitch;
        self.yaw = yaw;
        self.pitch = pitch;
        changed
    }

    /// Moves the camera toward (positive) or away from (negative) the origin
    pub fn wheel(&mut self, notches: i32) -> bool {
        let prev = self.distance;
        self.distance = (self.distance / ZOOM_STEP.powi(notches))
            .clamp(Self::DISTANCE_MIN, Self::DISTANCE_MAX);
        self.distance != prev
    }

    /// Returns the world-to-camera transform
    pub fn view(&self) -> Isometry3<f32> {
        Isometry3::look_at_rh(&self.eye(), &Point3::origin(), &Vector3::z())
    }

    /// Returns the camera-to-clip projection for the given screen
    pub fn projection(&self, size: ScreenSize) -> Perspective3<f32> {
        Perspective3::new(size.aspect(), self.fov, NEAR, FAR)
    }

    /// Projects a world-space point onto the screen
    ///
    /// Returns `None` for points behind the near plane.
    pub fn project(
        &self,
        p: &Point3<f32>,
        size: ScreenSize,
    ) -> Option<Projected> {
        self.projector(size).project(p)
    }

    /// Builds a reusable projector, for projecting many points at once
    pub fn projector(&self, size: ScreenSize) -> Projector {
        Projector {
            view: self.view(),
            proj: self.projection(size),
            size,
        }
    }

    /// Moves a point `dist` units toward the camera
    pub fn toward_eye(&self, p: &Point3<f32>, dist: f32) -> Point3<f32> {
        let d = self.eye() - p;
        match d.try_normalize(f32::EPSILON) {
            Some(n) => p + n * dist,
            None => *p,
        }
    }
}

/// Cached view and projection matrices for an [`OrbitCamera`]
#[derive(Copy, Clone, Debug)]
pub struct Projector {
    view: Isometry3<f32>,
    proj: Perspective3<f32>,
    size: ScreenSize,
}

impl Projector {
    /// Projects a world-space point onto the screen
    pub fn project(&self, p: &Point3<f32>) -> Option<Projected> {
        let pc = self.view.transform_point(p);
        if pc.z > -NEAR {
            return None;
        }
        Some(Projected {
            pos: self.to_screen(&pc),
            depth: -pc.z,
        })
    }

    /// Projects a line segment, clipping it against the near plane
    pub fn project_segment(
        &self,
        a: &Point3<f32>,
        b: &Point3<f32>,
    ) -> Option<(Point2<f32>, Point2<f32>)> {
        let mut a = self.view.transform_point(a);
        let mut b = self.view.transform_point(b);
        match (a.z <= -NEAR, b.z <= -NEAR) {
            (true, true) => (),
            (false, false) => return None,
            (true, false) => b = clip_near(&a, &b),
            (false, true) => a = clip_near(&a, &b),
        }
        Some((self.to_screen(&a), self.to_screen(&b)))
    }

    /// Projects a planar polygon, clipping it against the near plane
    ///
    /// The result is empty if the polygon is entirely behind the camera.
    pub fn project_polygon(&self, pts: &[Point3<f32>]) -> Vec<Point2<f32>> {
        let cam: Vec<_> =
            pts.iter().map(|p| self.view.transform_point(p)).collect();
        let mut out = vec![];
        for (i, a) in cam.iter().enumerate() {
            let b = &cam[(i + 1) % cam.len()];
            let a_in = a.z <= -NEAR;
            if a_in {
                out.push(*a);
            }
            if a_in != (b.z <= -NEAR) {
                out.push(clip_near(a, b));
            }
        }
        out.iter().map(|p| self.to_screen(p)).collect()
    }

    /// Converts a camera-space point (in front of the camera) to pixels
    fn to_screen(&self, pc: &Point3<f32>) -> Point2<f32> {
        let ndc = self.proj.project_point(pc);
        Point2::new(
            (ndc.x + 1.0) * 0.5 * self.size.width,
            (1.0 - ndc.y) * 0.5 * self.size.height,
        )
    }
}

/// Finds where the camera-space segment `a-b` crosses the near plane
fn clip_near(a: &Point3<f32>, b: &Point3<f32>) -> Point3<f32> {
    let t = (-NEAR - a.z) / (b.z - a.z);
    a + (b - a) * t
}

////////////////////////////////////////////////////////////////////////////////

/// Panel that can receive pointer input
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Region {
    /// The 3D scene
    Scene,
    /// The 2D preview
    Preview,
}

/// Which view currently owns the pointer
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum InputState {
    /// No drag in progress
    #[default]
    Idle,
    /// The orbit camera is being dragged
    Dragging3D,
    /// The preview is being panned; the orbit camera is disabled
    Dragging2D,
}

/// Routes pointer drags to at most one view at a time
///
/// Whichever panel saw the most recent pointer-down owns the drag until the
/// next pointer-up, which may happen anywhere (not just over that panel).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct InputRouter {
    state: InputState,
}

impl InputRouter {
    /// Returns the current state
    pub fn state(&self) -> InputState {
        self.state
    }

    /// Checks whether the orbit camera may respond to input
    pub fn orbit_enabled(&self) -> bool {
        self.state != InputState::Dragging2D
    }

    /// Handles a pointer-down event over the given region
    ///
    /// Returns `true` if the region now owns the drag; pointer-downs while
    /// another drag is in progress are ignored.
    pub fn pointer_down(&mut self, region: Region) -> bool {
        match (self.state, region) {
            (InputState::Idle, Region::Preview) => {
                self.state = InputState::Dragging2D;
                true
            }
            (InputState::Idle, Region::Scene) => {
                self.state = InputState::Dragging3D;
                true
            }
            _ => false,
        }
    }

    /// Handles a pointer-up (or cancel) event from anywhere
    pub fn pointer_up(&mut self) {
        self.state = InputState::Idle;
    }

    /// Returns the region that owns the current drag, if any
    pub fn owner(&self) -> Option<Region> {
        match self.state {
            InputState::Idle => None,
            InputState::Dragging3D => Some(Region::Scene),
            InputState::Dragging2D => Some(Region::Preview),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn preview_zoom_clamps() {
        let mut v = PreviewView::new(Vector2::zeros(), 1.0);
        assert!(v.wheel(-5));
        assert_relative_eq!(v.zoom(), 1.0 / ZOOM_STEP.powi(5));
        assert!(v.zoom() >= ZOOM_MIN);
        assert!(v.wheel(-1));
        assert_eq!(v.zoom(), ZOOM_MIN);
        assert!(!v.wheel(-10));
        assert_eq!(v.zoom(), ZOOM_MIN);

        assert!(v.wheel(100));
        assert_eq!(v.zoom(), ZOOM_MAX);
        assert!(!v.wheel(1));
        assert!(!v.wheel(0));
    }

    #[test]
    fn preview_zoom_extreme_notches() {
        // These must return immediately, rather than looping per notch
        let mut v = PreviewView::default();
        assert!(v.wheel(i32::MIN));
        assert_eq!(v.zoom(), ZOOM_MIN);
        assert!(v.wheel(i32::MAX));
        assert_eq!(v.zoom(), ZOOM_MAX);
        assert!(v.wheel(i32::MIN));
        assert_eq!(v.zoom(), ZOOM_MIN);
    }

    #[test]
    fn preview_drag_is_zoom_invariant() {
        let mut v = PreviewView::new(Vector2::zeros(), 2.0);
        v.drag(Vector2::new(10.0, -4.0));
        assert_eq!(v.pan(), Vector2::new(5.0, -2.0));

        let mut v = PreviewView::new(Vector2::zeros(), 0.5);
        v.drag(Vector2::new(10.0, -4.0));
        assert_eq!(v.pan(), Vector2::new(20.0, -8.0));

        v.reset();
        assert_eq!(v, PreviewView::default());
        assert_eq!(v.zoom(), DEFAULT_ZOOM);
    }

    #[test]
    fn preview_transform() {
        let size = ScreenSize::new(400.0, 200.0);
        let v = PreviewView::new(Vector2::new(10.0, 20.0), 2.0);
        let p = v.to_screen(&Point2::new(0.0, 0.0), size);
        assert_eq!(p, Point2::new(220.0, 140.0));
        let p = v.to_screen(&Point2::new(5.0, 5.0), size);
        assert_eq!(p, Point2::new(230.0, 130.0));

        let back = v.to_world(&p, size);
        assert_relative_eq!(back, Point2::new(5.0, 5.0));
    }

    #[test]
    fn dragging_moves_content_with_pointer() {
        let size = ScreenSize::from(300);
        let mut v = PreviewView::new(Vector2::zeros(), 1.5);
        let p = Point2::new(12.0, -7.0);
        let before = v.to_screen(&p, size);
        v.drag(Vector2::new(30.0, 15.0));
        let after = v.to_screen(&p, size);
        assert_relative_eq!(after - before, Vector2::new(30.0, 15.0));
    }

    #[test]
    fn camera_projects_origin_to_center() {
        let cam = OrbitCamera::default();
        let size = ScreenSize::new(800.0, 600.0);
        let p = cam.project(&Point3::origin(), size).unwrap();
        assert_relative_eq!(p.pos, Point2::new(400.0, 300.0), epsilon = 1e-3);
        assert_relative_eq!(p.depth, cam.distance(), epsilon = 1e-2);

        // Up is up
        let up = cam.project(&Point3::new(0.0, 0.0, 100.0), size).unwrap();
        assert!(up.pos.y < p.pos.y);

        // Behind the camera
        let behind = cam.eye() * 2.0;
        assert!(cam.project(&behind, size).is_none());
    }

    #[test]
    fn camera_rotate_and_zoom() {
        let mut cam = OrbitCamera::default();
        assert!(cam.rotate(Vector2::new(10.0, 0.0)));
        assert!(!cam.rotate(Vector2::zeros()));
        cam.rotate(Vector2::new(0.0, 1e6));
        assert_eq!(cam.pitch(), PITCH_LIMIT);

        let d = cam.distance();
        assert!(cam.wheel(1));
        assert_relative_eq!(cam.distance(), d / ZOOM_STEP);
        cam.wheel(-1000);
        assert_eq!(cam.distance(), OrbitCamera::DISTANCE_MAX);

        let p = Point3::origin();
        let q = cam.toward_eye(&p, 20.0);
        assert_relative_eq!((q - p).norm(), 20.0, epsilon = 1e-3);
        assert!((cam.eye() - q).norm() < (cam.eye() - p).norm());
    }

    #[test]
    fn near_plane_clipping() {
        let cam = OrbitCamera::default();
        let size = ScreenSize::new(800.0, 600.0);
        let proj = cam.projector(size);
        let behind = cam.eye() * 2.0;

        let (a, b) = proj
            .project_segment(&Point3::origin(), &behind)
            .unwrap();
        assert_relative_eq!(a, Point2::new(400.0, 300.0), epsilon = 1e-3);
        assert!(b.x.is_finite() && b.y.is_finite());
        assert!(proj.project_segment(&behind, &(behind * 2.0)).is_none());

        let quad = [
            Point3::new(-100.0, -100.0, 0.0),
            Point3::new(100.0, -100.0, 0.0),
            Point3::new(100.0, 100.0, 0.0),
            Point3::new(-100.0, 100.0, 0.0),
        ];
        assert_eq!(proj.project_polygon(&quad).len(), 4);
        let far = quad.map(|p| p + behind.coords);
        assert!(proj.project_polygon(&far).is_empty());
    }

    #[test]
    fn router() {
        let mut r = InputRouter::default();
        assert!(r.orbit_enabled());
        assert_eq!(r.owner(), None);

        assert!(r.pointer_down(Region::Preview));
        assert_eq!(r.state(), InputState::Dragging2D);
        assert!(!r.orbit_enabled());
        // Scene can't steal an in-progress drag
        assert!(!r.pointer_down(Region::Scene));
        assert_eq!(r.owner(), Some(Region::Preview));
        r.pointer_up();
        assert!(r.orbit_enabled());

        assert!(r.pointer_down(Region::Scene));
        assert_eq!(r.state(), InputState::Dragging3D);
        assert!(r.orbit_enabled());
        // Preview ignores pointer-downs while the camera is dragging
        assert!(!r.pointer_down(Region::Preview));
        assert_eq!(r.state(), InputState::Dragging3D);
        r.pointer_up();
        assert_eq!(r.state(), InputState::Idle);
    }
}
