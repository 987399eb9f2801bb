use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;

use zslice::{
    app::{App, Command, Settings},
    expr::Field,
    view::ScreenSize,
};

mod raster;

/// Renders level-set slices of f(x, y) without a window
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    cmd: Target,

    #[clap(flatten)]
    slice: SliceSettings,
}

#[derive(Subcommand)]
enum Target {
    /// Render the top-down 2D preview
    Preview {
        #[clap(flatten)]
        settings: ImageSettings,
    },

    /// Render the perspective 3D scene
    Scene {
        #[clap(flatten)]
        settings: ImageSettings,
    },
}

#[derive(Parser)]
struct SliceSettings {
    /// Equation in x and y
    #[clap(short, long, default_value = "x*x + y*y")]
    equation: String,

    /// Starting bound of the level range
    #[clap(long, default_value_t = -5.0, allow_negative_numbers = true)]
    min_z: f64,

    /// Finishing bound of the level range
    #[clap(long, default_value_t = 5.0, allow_negative_numbers = true)]
    max_z: f64,

    /// Grid steps between the origin and each edge of the sampled square
    #[clap(short, long, default_value_t = 200)]
    grid: u32,

    /// Level of the live slice (defaults to the starting bound)
    #[clap(short = 'z', long, allow_negative_numbers = true)]
    level: Option<f64>,

    /// Number of evenly spaced slices to freeze between the bounds
    #[clap(short, long, default_value_t = 0)]
    captures: usize,
}

#[derive(Parser)]
struct ImageSettings {
    /// Name of a `.png` file to write
    #[clap(short, long)]
    out: Option<PathBuf>,

    /// Image size
    #[clap(short, long, default_value_t = 512)]
    size: u32,

    /// Wheel notches to zoom by (positive zooms in)
    #[clap(long, default_value_t = 0, allow_negative_numbers = true)]
    zoom: i32,
}

/// Levels of `n` evenly spaced captures from `min_z` to `max_z`
fn capture_levels(min_z: f64, max_z: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![min_z],
        n => (0..n)
            .map(|i| min_z + (max_z - min_z) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

////////////////////////////////////////////////////////////////////////////////

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .init();

    let args = Args::parse();
    let slice = &args.slice;

    // The viewer falls back to a zero field; here, a bad equation is fatal
    Field::parse(&slice.equation)?;

    let mut app = App::new(Settings {
        min_z: slice.min_z,
        max_z: slice.max_z,
        grid_resolution: slice.grid,
        equation: slice.equation.clone(),
        ..Settings::default()
    })?;

    let start = Instant::now();
    for z in capture_levels(slice.min_z, slice.max_z, slice.captures) {
        app.apply(Command::SetLevel(z));
        app.apply(Command::Capture);
    }
    if slice.captures > 0 {
        info!("Froze {} slices in {:?}", slice.captures, start.elapsed());
    }
    app.apply(Command::SetLevel(slice.level.unwrap_or(slice.min_z)));

    let (settings, zoom) = match &args.cmd {
        Target::Preview { settings } => {
            (settings, Command::PreviewWheel(settings.zoom))
        }
        Target::Scene { settings } => {
            (settings, Command::SceneWheel(settings.zoom))
        }
    };
    app.apply(zoom);

    let start = Instant::now();
    let frame = app.frame(0.0);
    let size = ScreenSize::from(settings.size);
    let list = match args.cmd {
        Target::Preview { .. } => frame.preview(size),
        Target::Scene { .. } => frame.scene(size),
    };
    info!("{}", frame.readout());
    info!(
        "Sampled {} points and drew {} primitives in {:?}",
        frame.snapshot().live.len(),
        list.len(),
        start.elapsed()
    );

    if let Some(out) = &settings.out {
        let image = raster::rasterize(&list)?;
        info!("Writing image to {out:?}");
        image.save(out)?;
    }
    Ok(())
}
