//! Trace replay entry point (native).

#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
mod cli {
    use clap::{Parser, ValueEnum};
    use gkvisor_app::{Trace, replay};
    use gkvisor_core::Variant;
    use std::path::PathBuf;

    #[derive(Debug, Clone, Copy, ValueEnum)]
    enum VariantArg {
        Visor,
        Helper,
    }

    impl From<VariantArg> for Variant {
        fn from(arg: VariantArg) -> Self {
            match arg {
                VariantArg::Visor => Variant::Visor,
                VariantArg::Helper => Variant::Helper,
            }
        }
    }

    /// Replay a recorded gesture trace through the overlay widget.
    #[derive(Debug, Parser)]
    #[command(name = "gkvisor-replay", version)]
    struct Args {
        /// Trace file (JSON).
        trace: PathBuf,

        /// Directory for per-session PNG snapshots.
        #[arg(long)]
        out: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = VariantArg::Visor)]
        variant: VariantArg,

        /// Pixels per surface unit in snapshots.
        #[arg(long, default_value_t = 4.0)]
        scale: f64,
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        let args = Args::parse();
        let trace = Trace::load(&args.trace)?;
        log::info!("Replaying {} events from {}", trace.events.len(), args.trace.display());

        let summary = replay(&trace, args.variant.into(), args.out.as_deref(), args.scale)?;
        for session in &summary.sessions {
            match &session.image {
                Some(path) => log::info!("Session {} -> {}", session.index, path.display()),
                None => log::info!("Session {}: {} segments", session.index, session.strokes),
            }
        }
        log::info!(
            "{} sessions, {} events delivered, docked at ({}, {})",
            summary.sessions.len(),
            summary.events_delivered,
            summary.final_offset.x,
            summary.final_offset.y
        );
        if summary.tutorial_open {
            log::info!("Tutorial panel left open");
        }
        Ok(())
    }
}

#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
fn main() {
    env_logger::init();

    if let Err(e) = cli::run() {
        log::error!("Replay failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(all(feature = "native", not(target_arch = "wasm32"))))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
