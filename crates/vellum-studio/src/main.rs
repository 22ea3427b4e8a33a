//! Vellum studio: opens a window and drives the frame submitter with demo
//! content.
//!
//! ```bash
//! vellum-studio                 # direct submission
//! vellum-studio --mode tile     # offscreen texture + full-screen composite
//! vellum-studio --frames-in-flight 1 --no-vsync
//! ```
//!
//! ESC quits.

mod demo;

use anyhow::Result;
use clap::Parser;
use winit::dpi::LogicalSize;

use vellum_engine::device::GpuInit;
use vellum_engine::logging::{LoggingConfig, init_logging};
use vellum_engine::paint::Color;
use vellum_engine::submit::{SubmitMode, SubmitterConfig};
use vellum_engine::window::{Runtime, RuntimeConfig};

#[derive(Parser)]
#[command(name = "vellum-studio", version, about = "Frame submission demo")]
struct Args {
    /// Submission path: `direct` or `tile`
    #[arg(long, short = 'm', default_value = "direct", value_parser = parse_mode)]
    mode: SubmitMode,

    /// Frames that may be in flight on the GPU at once
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=16))]
    frames_in_flight: u32,

    /// Present without waiting for vertical sync
    #[arg(long)]
    no_vsync: bool,

    /// Log filter (overrides RUST_LOG), e.g. `vellum_engine=trace`
    #[arg(long)]
    log: Option<String>,
}

fn parse_mode(s: &str) -> Result<SubmitMode, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..LoggingConfig::default()
    });

    let gpu_init = GpuInit {
        present_mode: if args.no_vsync {
            wgpu::PresentMode::AutoNoVsync
        } else {
            wgpu::PresentMode::Fifo
        },
        ..GpuInit::default()
    };

    let submit = SubmitterConfig {
        max_frames_in_flight: args.frames_in_flight as usize,
        mode: args.mode,
    };

    let config = RuntimeConfig {
        title: format!("Vellum Studio ({})", args.mode),
        initial_size: LogicalSize::new(960.0, 600.0),
        clear_color: Color::from_rgba_u8(18, 20, 28, 255),
    };

    log::info!("starting in {} mode, {} frame(s) in flight", submit.mode, submit.max_frames_in_flight);
    Runtime::run(config, gpu_init, submit, demo::Demo::default())
}
