//! zslice is a library for slicing two-variable functions at a chosen height.
//!
//! Given a **scalar field** `f(x, y)` and a **level** `z`, the level set
//! `f(x, y) = z` is an implicit curve in the plane.  zslice approximates that
//! curve by brute-force sampling: every point of a regular grid whose value
//! lies within a small tolerance of the level is kept.  The result is a point
//! cloud rather than a polyline, which makes the sampler indifferent to
//! discontinuous or partially-undefined fields.
//!
//! # Fields
//! Fields are parsed from text into a [`Tree`](crate::expr::Tree), which is
//! then evaluated directly:
//! ```
//! use zslice::expr::{Field, ScalarField};
//!
//! let field = Field::parse("x*x + y*y")?;
//! assert_eq!(field.eval(3.0, 4.0), 25.0);
//! # Ok::<(), zslice::Error>(())
//! ```
//!
//! Parsing can also fail softly, substituting a constant-zero field and
//! returning the error as a warning; this is what interactive front-ends use:
//! ```
//! use zslice::expr::{compile, ScalarField};
//!
//! let compiled = compile("(x + y");
//! assert!(compiled.warning.is_some());
//! assert_eq!(compiled.field.eval(1.0, 2.0), 0.0);
//! ```
//!
//! # Slicing
//! [`sample::sample`] scans the grid described by a
//! [`SliceParams`](crate::sample::SliceParams):
//! ```
//! use zslice::{expr::Field, sample::{sample, SliceParams}};
//!
//! let field = Field::parse("x*x + y*y")?;
//! let params = SliceParams {
//!     level: 4.0,
//!     grid_resolution: 20,
//!     span: 10.0,
//!     tolerance: 0.02,
//! };
//! let points = sample(&field, &params);
//! assert!(points.iter().all(|p| (p.coords.norm() - 2.0).abs() < 0.01));
//! # Ok::<(), zslice::Error>(())
//! ```
//!
//! # Views
//! Slices are drawn twice: once in a perspective 3D scene (see
//! [`render::Scene3`]) and once in a pannable, zoomable top-down preview (see
//! [`render::Preview2`]).  Frozen slices live in a
//! [`TraceStore`](crate::trace::TraceStore), which keeps the 3D and 2D copies
//! of every trace in lockstep so that both views agree.
//!
//! Renderers don't talk to a graphics API; they produce a
//! [`DrawList`](crate::render::DrawList) of screen-space primitives, which a
//! front-end (the `egui` viewer or the PNG exporter) then paints.
//!
//! # Application state
//! [`App`](crate::app::App) ties everything together: it owns the settings,
//! the compiled field, the trace store, both views, the input router, and the
//! animation driver.  Front-ends translate user input into
//! [`Command`](crate::app::Command)s, call
//! [`App::frame`](crate::app::App::frame) once per frame, and draw the
//! resulting views.
#![warn(missing_docs)]

pub mod animate;
pub mod app;
pub mod color;
pub mod expr;
pub mod render;
pub mod sample;
pub mod trace;
pub mod view;

mod error;
pub use error::Error;
