//! CLI tool to run a saved board screenshot through the card pipeline.
//! Usage: cargo run -p set-vision --features cli --bin analyze_board -- <board.png> [output_dir]

use std::path::PathBuf;

use set_data::ColorTable;
use set_vision::{crop_cell, CardExtractor, VisionConfig};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <board.png> [output_dir]", args[0]);
        std::process::exit(1);
    }

    let input_path = PathBuf::from(&args[1]);
    let output_dir = if args.len() >= 3 {
        PathBuf::from(&args[2])
    } else {
        PathBuf::from("./debug_output")
    };
    let _ = std::fs::create_dir_all(&output_dir);

    println!("Loading image: {}", input_path.display());
    let img = image::open(&input_path)
        .expect("Failed to open image")
        .to_rgb8();
    println!("Image size: {}x{}", img.width(), img.height());

    let extractor = CardExtractor::new(VisionConfig::default(), ColorTable::builtin())
        .expect("Default vision config is valid");

    println!("\n=== Cards ===");
    let reading = extractor
        .extract_board(&img)
        .expect("Segmenter always yields 12 cells");
    for (cell, card) in reading.cells.iter().zip(reading.board.cards()) {
        println!(
            "  Cell {:2} (col {}, row {}) x={} y={} w={} h={}: {}",
            cell.index, cell.column, cell.row, cell.x, cell.y, cell.width, cell.height, card
        );
        let crop = crop_cell(&img, cell);
        let _ = crop.save(output_dir.join(format!("cell_{:02}.png", cell.index)));
    }

    println!("\n=== Sets ===");
    let report = set_solver::solve(&reading.board);
    match report.first {
        Some(set) => println!("First set: {}", set),
        None => println!("No set on this board"),
    }
    for set in &report.all {
        println!("  {}", set);
    }

    let annotated = set_vision::render(&img, &reading.cells, report.first.as_ref());
    let _ = annotated.save(output_dir.join("board_annotated.png"));

    println!("\nDebug images saved to: {}", output_dir.display());
}
