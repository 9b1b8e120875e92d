#![windows_subsystem = "windows"]

// ============================================================================
// MAIN — CLI parsing, logger setup, eframe bootstrap
// ============================================================================

use clap::Parser;
use eframe::egui;

use inkstage::app::InkstageApp;
use inkstage::session::DrawingSession;

/// Drawing stage with smoothed strokes, stamped brushes, and a floating
/// lasso selection.
#[derive(Parser, Debug)]
#[command(name = "inkstage", version, about = "Smoothed-stroke drawing stage")]
struct Args {
    /// Initial stage width in pixels. The stage then follows the window.
    #[arg(long, default_value_t = 1024)]
    width: u32,

    /// Initial stage height in pixels.
    #[arg(long, default_value_t = 768)]
    height: u32,

    /// Log at debug level instead of info.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), eframe::Error> {
    let args = Args::parse();

    // RUST_LOG still wins when set; the flag only moves the default.
    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let session = match DrawingSession::new(args.width, args.height) {
        Ok(session) => session,
        Err(err) => {
            log::error!(
                "cannot allocate a {}x{} stage: {err}",
                args.width,
                args.height
            );
            std::process::exit(2);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([args.width as f32, args.height as f32])
            .with_title("Inkstage"),
        ..Default::default()
    };

    eframe::run_native(
        "Inkstage",
        options,
        Box::new(move |cc| Box::new(InkstageApp::new(cc, session))),
    )
}
