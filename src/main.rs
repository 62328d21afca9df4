// Scene and flock accessors are mostly exercised by tests
#![allow(dead_code)]

mod audio;
mod birds;
mod config;
mod display;
mod error;
mod growth;
mod logging;
mod math2d;
mod noise;
mod particles;
mod scene;
mod tree;
mod util;

use audio::{Opener, SdlOutput, SongOutput};
use config::Config;
use display::{Display, InputEvent, PixelBuffer, RenderTarget, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use error::Error;
use scene::Scene;
use sdl2::keyboard::Keycode;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use util::FpsCounter;

const TITLE: &str = "mustard tree";
/// Frames between FPS title refreshes and debug statistics
const STATS_INTERVAL: u64 = 30;

struct Options {
    width: u32,
    height: u32,
    vsync: bool,
    seed: Option<u64>,
    config: Option<PathBuf>,
    frames: Option<u64>,
    mute: bool,
}

fn print_help() {
    println!("Usage: mustard-tree [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --width W, -w W           Set window width (default: {DEFAULT_WIDTH})");
    println!("  --height H, -h H          Set window height (default: {DEFAULT_HEIGHT})");
    println!("  --resolution WxH, -r WxH  Set resolution (e.g., 1920x1080)");
    println!("  --no-vsync                Disable VSync for uncapped framerate");
    println!("  --seed N                  Grow the same tree every run");
    println!("  --config PATH             Load tuning from a JSON file");
    println!("  --frames N                Quit after N frames");
    println!("  --mute                    Never open the audio device");
    println!("  --help                    Show this help message");
    println!();
    println!("Controls:");
    println!("  F       - Toggle FPS in the window title");
    println!("  R       - Replant and regrow");
    println!("  Escape  - Quit");
}

/// Parse command line arguments
fn parse_args() -> Options {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options {
        width: DEFAULT_WIDTH,
        height: DEFAULT_HEIGHT,
        vsync: true,
        seed: None,
        config: None,
        frames: None,
        mute: false,
    };

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--no-vsync" => options.vsync = false,
            "--mute" => options.mute = true,
            "--width" | "-w" => {
                if let Some(w) = value.and_then(|v| v.parse().ok()) {
                    options.width = w;
                }
                i += 1;
            },
            "--height" | "-h" => {
                if let Some(h) = value.and_then(|v| v.parse().ok()) {
                    options.height = h;
                }
                i += 1;
            },
            "--resolution" | "-r" => {
                // WxH, e.g. 1920x1080
                if let Some((w, h)) = value.and_then(|v| v.split_once('x')) {
                    if let (Ok(w), Ok(h)) = (w.parse::<u32>(), h.parse::<u32>()) {
                        options.width = w;
                        options.height = h;
                    }
                }
                i += 1;
            },
            "--seed" => {
                options.seed = value.and_then(|v| v.parse().ok());
                i += 1;
            },
            "--config" => {
                options.config = value.map(PathBuf::from);
                i += 1;
            },
            "--frames" => {
                options.frames = value.and_then(|v| v.parse().ok());
                i += 1;
            },
            "--help" => {
                print_help();
                std::process::exit(0);
            },
            other => log::warn!("ignoring unknown argument {other}"),
        }
        i += 1;
    }

    options
}

fn load_config(path: Option<&PathBuf>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    match Config::load(path) {
        Ok(config) => {
            log::info!("loaded config from {}", path.display());
            config
        },
        Err(e) => {
            log::warn!("failed to load {}: {e}; using defaults", path.display());
            Config::default()
        },
    }
}

fn wall_clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Deferred audio opener; the device itself is opened by the scene once the
/// tree has bloomed
fn audio_opener(display: &Display, mute: bool) -> Option<Opener> {
    if mute {
        log::info!("audio muted");
        return None;
    }
    match display.audio() {
        Ok(audio) => Some(Box::new(move || {
            SdlOutput::open(&audio).map(|output| Box::new(output) as Box<dyn SongOutput>)
        })),
        Err(e) => {
            log::warn!("audio subsystem unavailable: {e}");
            None
        },
    }
}

fn main() -> Result<(), Error> {
    logging::init();
    let options = parse_args();
    let config = load_config(options.config.as_ref());
    let seed = options.seed.unwrap_or_else(wall_clock_seed);

    let (mut display, texture_creator) =
        Display::with_options(TITLE, options.width, options.height, options.vsync)?;
    let (mut width, mut height) = (display.width(), display.height());
    let mut target = RenderTarget::with_size(&texture_creator, width, height)?;
    let mut buffer = PixelBuffer::with_size(width, height);

    log::info!(
        "{}x{}, vsync {}, seed {seed}",
        width,
        height,
        if options.vsync { "on" } else { "off" }
    );

    let opener = audio_opener(&display, options.mute);
    let mut scene = Scene::new(width, height, config, seed, opener);

    // FPS counter with 60 sample rolling average
    let mut fps_counter = FpsCounter::new(60);
    let mut show_fps = false;
    let mut frames: u64 = 0;

    'main: loop {
        let (dt, avg_fps) = fps_counter.tick();

        for event in display.poll_events() {
            match event {
                InputEvent::Quit | InputEvent::KeyDown(Keycode::Escape) => break 'main,
                InputEvent::KeyDown(Keycode::F) => {
                    show_fps = !show_fps;
                    if !show_fps {
                        display.set_title(TITLE);
                    }
                },
                InputEvent::KeyDown(Keycode::R) => scene.replant(),
                InputEvent::KeyDown(_) => {},
                InputEvent::PointerMove { x, y } => scene.on_pointer_move(x as f32, y as f32),
                InputEvent::Resized {
                    width: w,
                    height: h,
                } => {
                    if (w, h) != (width, height) {
                        width = w;
                        height = h;
                        buffer = PixelBuffer::with_size(width, height);
                        target = RenderTarget::with_size(&texture_creator, width, height)?;
                        scene.resize(width, height);
                    }
                },
            }
        }

        scene.tick(f64::from(dt));
        scene.render(&mut buffer);
        display.present(&mut target, &buffer)?;

        frames += 1;
        if frames % STATS_INTERVAL == 0 {
            let ms = fps_counter.avg_frame_time_ms();
            if show_fps {
                display.set_title(&format!("{TITLE}  {} fps  {}ms", avg_fps as u32, ms as u32));
            }
            log::debug!(
                "{} fps, {:.1}ms, growth {:.3}, {} birds, {} falling leaves",
                avg_fps as u32,
                ms,
                scene.progress(),
                scene.flock().len(),
                scene.falling_leaves().count()
            );
        }
        if options.frames.is_some_and(|limit| frames >= limit) {
            log::info!("frame limit reached");
            break;
        }
    }

    scene.dispose();
    Ok(())
}
