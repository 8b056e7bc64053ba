//! Windowless runs against the in-memory scene graph.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use scene::{FrameOutcome, NodeId, ReconcileStats, Reconciler, RetainedScene, Status, TextureId};
use sim_core::{SimSnapshot, Simulation};

/// Summary of a headless run.
#[derive(Debug, Clone, Serialize)]
pub struct HeadlessReport {
    /// Frames actually run; fewer than requested if the simulation finished.
    pub frames: u64,
    pub status: Status,
    pub last_outcome: FrameOutcome,
    pub stats: ReconcileStats,
    pub live_nodes: usize,
    pub generated_shapes: usize,
    pub snapshot: SimSnapshot,
}

/// Set up and run up to `frames` frames, stopping once the simulation
/// reports finished.
pub fn run_headless(
    sim: &mut Simulation,
    reconciler: &mut Reconciler<NodeId, TextureId>,
    frames: u64,
) -> HeadlessReport {
    let mut scene = RetainedScene::new();
    reconciler.setup(sim, &mut scene);

    let mut ran = 0;
    let mut last_outcome = FrameOutcome::Idle;
    while ran < frames {
        last_outcome = reconciler.frame(sim, &mut scene);
        ran += 1;
        if last_outcome == FrameOutcome::Finished {
            break;
        }
    }

    let stats = reconciler.stats();
    tracing::info!(
        frames = ran,
        created = stats.created,
        removed = stats.removed,
        sorts = stats.sorts,
        live_nodes = scene.live_nodes(),
        "Headless run complete"
    );

    HeadlessReport {
        frames: ran,
        status: reconciler.status(),
        last_outcome,
        stats,
        live_nodes: scene.live_nodes(),
        generated_shapes: scene.generated_shapes(),
        snapshot: sim.snapshot(),
    }
}

/// Write the report as pretty JSON to a file, or stdout without a path.
pub fn write_report(report: &HeadlessReport, path: Option<&Path>) -> io::Result<()> {
    match path {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, report)?;
            writer.flush()?;
            tracing::info!(path = %path.display(), "Report written");
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, report)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
