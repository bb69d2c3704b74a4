//! vtex Runtime
//!
//! Drives a simulated render loop that streams texel data into textures
//! every frame, exercising texture memory reclamation end to end.

mod scene;

use anyhow::{Context, Result};
use scene::StreamingScene;
use vtex_core::{HostGpuAllocator, Settings, TextureContext};
use vtex_metrics::FrameTimer;

const DEMO_FRAMES: u64 = 240;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    tracing::info!("vtex v{}", vtex_core::VERSION);

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::from_path(&path)
            .with_context(|| format!("loading settings from {path}"))?,
        None => Settings::default(),
    };
    tracing::info!(
        purge_threshold = settings.purge_threshold,
        align_unit = settings.align_unit,
        memory_class = ?settings.memory_class,
        "settings loaded"
    );

    let allocator = HostGpuAllocator::new(&settings.pools);
    let mut ctx = TextureContext::new(&settings, allocator)?;
    let mut scene = StreamingScene::new(&mut ctx)?;

    let mut timer = FrameTimer::new(settings.metrics_window);
    for _ in 0..DEMO_FRAMES {
        timer.begin();
        scene.frame(&mut ctx)?;
        timer.end();
    }

    let stats = ctx.stats();
    tracing::info!(
        frames = stats.frame,
        textures = stats.live_textures,
        live_bytes = stats.live_bytes,
        reclaims = stats.reclaims,
        avg_reclaimed = ctx.reclaim_window().average(),
        peak_reclaimed = ctx.reclaim_window().peak(),
        "render loop finished"
    );
    let (min_ms, max_ms) = timer.frame_time_range_ms();
    tracing::info!(
        frames = timer.frames(),
        fps = timer.fps(),
        frame_ms = timer.frame_time_ms(),
        min_ms,
        max_ms,
        "frame timing"
    );
    for (name, value) in ctx.counters().snapshot() {
        tracing::info!("{name}: {value}");
    }

    scene.teardown(&mut ctx)?;
    anyhow::ensure!(
        ctx.allocator().live_allocations() == 0,
        "texture memory leaked after teardown"
    );
    Ok(())
}
