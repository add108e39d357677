use anyhow::{Context, Result};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use set_capture::{CaptureRect, CaptureStatus, FrameSource};
use set_state::{Board, SetTriple};
use set_vision::{Annotation, CardExtractor, Cell};

/// Everything one analysis cycle produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub cells: Vec<Cell>,
    pub board: Board,
    /// First Set in search order.
    pub set: Option<SetTriple>,
    pub all_sets: Vec<SetTriple>,
    pub annotations: Vec<Annotation>,
}

/// Segment, classify and solve one board image.
pub fn analyze_frame(frame: &RgbImage, extractor: &CardExtractor) -> Result<AnalysisResult> {
    let reading = extractor
        .extract_board(frame)
        .context("Board extraction produced an invalid board")?;
    let report = set_solver::solve(&reading.board);
    let annotations = set_vision::annotations(&reading.cells, &reading.board);

    match report.first {
        Some(set) => info!("Set found: {}", set),
        None => info!(
            "No set found ({} of 12 cards recognized)",
            reading.board.recognized_count()
        ),
    }

    Ok(AnalysisResult {
        cells: reading.cells,
        board: reading.board,
        set: report.first,
        all_sets: report.all,
        annotations,
    })
}

/// Manages the capture → analysis loop
pub struct Pipeline {
    stop: Arc<AtomicBool>,
    frame_rx: watch::Receiver<Option<Arc<RgbImage>>>,
    status_rx: watch::Receiver<CaptureStatus>,
    analysis_rx: watch::Receiver<Option<Arc<AnalysisResult>>>,
}

impl Pipeline {
    /// Start capturing from `source` and analyzing every new frame.
    /// Must be called from within a tokio runtime.
    pub fn start<S: FrameSource + 'static>(
        source: S,
        rect: CaptureRect,
        capture_interval: Duration,
        extractor: Arc<CardExtractor>,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));

        let (frame_tx, frame_rx) = watch::channel::<Option<Arc<RgbImage>>>(None);
        let (status_tx, status_rx) = watch::channel(CaptureStatus::default());
        let (analysis_tx, analysis_rx) = watch::channel::<Option<Arc<AnalysisResult>>>(None);

        let stop_capture = stop.clone();
        tokio::spawn(set_capture::capture_loop(
            source,
            rect,
            frame_tx,
            status_tx,
            capture_interval,
            stop_capture,
        ));

        // Analysis loop
        let mut analysis_frame_rx = frame_rx.clone();
        let stop_analysis = stop.clone();
        tokio::spawn(async move {
            loop {
                if stop_analysis.load(Ordering::Relaxed) {
                    break;
                }
                if analysis_frame_rx.changed().await.is_err() {
                    debug!("Frame channel closed");
                    break;
                }

                let frame = analysis_frame_rx.borrow_and_update().clone();
                let Some(frame) = frame else { continue };
                let ex = extractor.clone();
                let result =
                    tokio::task::spawn_blocking(move || analyze_frame(&frame, &ex)).await;

                match result {
                    Ok(Ok(analysis)) => {
                        let _ = analysis_tx.send(Some(Arc::new(analysis)));
                    }
                    Ok(Err(e)) => warn!("Analysis failed: {:#}", e),
                    Err(e) => warn!("Analysis task panicked: {}", e),
                }
            }
        });

        info!("Pipeline started");

        Self {
            stop,
            frame_rx,
            status_rx,
            analysis_rx,
        }
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
        info!("Pipeline stop requested");
    }

    pub fn capture_status(&self) -> CaptureStatus {
        self.status_rx.borrow().clone()
    }

    pub fn latest_analysis(&self) -> Option<Arc<AnalysisResult>> {
        self.analysis_rx.borrow().clone()
    }

    /// Receiver notified on every finished analysis.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<AnalysisResult>>> {
        self.analysis_rx.clone()
    }

    /// Get the latest captured board frame
    pub fn latest_frame(&self) -> Option<Arc<RgbImage>> {
        self.frame_rx.borrow().clone()
    }

    /// Save the current frame, its cells and the annotated board for debugging.
    /// Returns the path to the debug directory.
    pub fn save_debug_frame(&self, debug_dir: &Path) -> Option<PathBuf> {
        let frame = self.latest_frame()?;
        let analysis = self.latest_analysis()?;
        match write_debug_frame(&frame, &analysis, debug_dir) {
            Ok(()) => {
                info!("Debug frame saved to {}", debug_dir.display());
                Some(debug_dir.to_path_buf())
            }
            Err(e) => {
                warn!("Failed to save debug frame: {:#}", e);
                None
            }
        }
    }
}

/// Write the board, every cell crop, the annotated board and a text summary.
pub fn write_debug_frame(frame: &RgbImage, analysis: &AnalysisResult, debug_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(debug_dir)
        .with_context(|| format!("Failed to create {}", debug_dir.display()))?;

    frame.save(debug_dir.join("board.png"))?;
    for cell in &analysis.cells {
        let crop = set_vision::crop_cell(frame, cell);
        crop.save(debug_dir.join(format!("cell_{:02}.png", cell.index)))?;
    }
    set_vision::render(frame, &analysis.cells, analysis.set.as_ref())
        .save(debug_dir.join("board_annotated.png"))?;

    let mut info = format!("Board: {}x{}\n\n", frame.width(), frame.height());
    for (cell, card) in analysis.cells.iter().zip(analysis.board.cards()) {
        info.push_str(&format!(
            "Cell {:2} (col {}, row {}): x={} y={} w={} h={} -> {}\n",
            cell.index, cell.column, cell.row, cell.x, cell.y, cell.width, cell.height, card
        ));
    }
    match &analysis.set {
        Some(set) => info.push_str(&format!("\nSet: {}\n", set)),
        None => info.push_str("\nSet: none\n"),
    }
    std::fs::write(debug_dir.join("cards.txt"), info)?;
    Ok(())
}
