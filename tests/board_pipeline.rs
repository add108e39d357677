use image::{Rgb, RgbImage};
use set_data::ColorTable;
use set_finder_lib::analyze_frame;
use set_state::{CardColor, Filling, SetTriple, Shape};
use set_vision::{CardExtractor, VisionConfig};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const GREEN: Rgb<u8> = Rgb([0, 128, 0]);

fn extractor() -> CardExtractor {
    CardExtractor::new(VisionConfig::default(), ColorTable::builtin()).unwrap()
}

/// 600x400 board: every cell is 200x100.
fn blank_board() -> RgbImage {
    RgbImage::from_pixel(600, 400, WHITE)
}

/// Ink `count` green diamonds into board slot `index`. `ring == 0` fills them.
fn put_card(board: &mut RgbImage, index: u32, count: usize, ring: i32) {
    let (ox, oy) = ((index / 4) as i32 * 200, (index % 4) as i32 * 100);
    let centers: &[i32] = match count {
        1 => &[100],
        2 => &[80, 120],
        _ => &[65, 100, 135],
    };
    let r = 12;
    for &cx in centers {
        for y in (50 - r)..=(50 + r) {
            for x in (cx - r)..=(cx + r) {
                let d = (x - cx).abs() + (y - 50).abs();
                if d <= r && (ring == 0 || d > r - ring) {
                    board.put_pixel((ox + x) as u32, (oy + y) as u32, GREEN);
                }
            }
        }
    }
}

/// Ink every pixel of slot `index` for which `inside(x, y)` holds, in cell
/// coordinates.
fn paint(board: &mut RgbImage, index: u32, inside: impl Fn(i32, i32) -> bool) {
    let (ox, oy) = ((index / 4) * 200, (index % 4) * 100);
    for y in 0..100 {
        for x in 0..200 {
            if inside(x as i32, y as i32) {
                board.put_pixel(ox + x, oy + y, GREEN);
            }
        }
    }
}

fn stadium(x: i32, y: i32) -> bool {
    let dy = ((y - 50).abs() - 10).max(0);
    ((x - 100) as f64).hypot(dy as f64) <= 8.0
}

fn squiggle(x: i32, y: i32) -> bool {
    if (y - 50).abs() > 18 {
        return false;
    }
    let t = (y - 50) as f64 * std::f64::consts::PI * 1.5 / 18.0;
    ((x - 100) as f64 - 6.0 * t.sin()).abs() <= 5.0
}

fn diamond(x: i32, y: i32) -> bool {
    (x - 100).abs() + (y - 50).abs() <= 12
}

#[test]
fn three_shapes_form_a_set() {
    let mut board = blank_board();
    paint(&mut board, 0, diamond);
    paint(&mut board, 1, stadium);
    paint(&mut board, 2, squiggle);

    let result = analyze_frame(&board, &extractor()).unwrap();
    let shapes: Vec<_> = (0..3).map(|i| result.board.get(i).unwrap().shape).collect();
    assert_eq!(
        shapes,
        vec![Some(Shape::Diamond), Some(Shape::Oval), Some(Shape::Squiggle)]
    );
    assert!(result.board.cards()[..3]
        .iter()
        .all(|c| c.count == 1 && c.filling == Some(Filling::Filled)));
    assert_eq!(result.set, Some(SetTriple([0, 1, 2])));
}

#[test]
fn fillings_across_a_row() {
    let mut board = blank_board();
    // Same row, one card per column: solid, outline, hatched.
    paint(&mut board, 1, diamond);
    put_card(&mut board, 5, 1, 3);
    paint(&mut board, 9, |x, y| {
        let d = (x - 100).abs() + (y - 50).abs();
        d <= 12 && (d > 10 || (y - 50) % 4 == 0)
    });

    let result = analyze_frame(&board, &extractor()).unwrap();
    let fillings: Vec<_> = [1, 5, 9]
        .iter()
        .map(|&i| result.board.get(i).unwrap().filling)
        .collect();
    assert_eq!(
        fillings,
        vec![Some(Filling::Filled), Some(Filling::Outline), Some(Filling::Striped)]
    );
    assert_eq!(result.set, Some(SetTriple([1, 5, 9])));
}

#[test]
fn identical_outline_cards_form_the_only_set() {
    let mut board = blank_board();
    for slot in 0..3 {
        put_card(&mut board, slot, 1, 3);
    }

    let result = analyze_frame(&board, &extractor()).unwrap();
    assert_eq!(result.set, Some(SetTriple([0, 1, 2])));
    assert_eq!(result.all_sets, vec![SetTriple([0, 1, 2])]);

    let card = result.board.get(1).unwrap();
    assert_eq!(card.color, CardColor::Green);
    assert_eq!(card.shape, Some(Shape::Diamond));
    assert_eq!(card.count, 1);
    assert_eq!(card.filling, Some(Filling::Outline));
    assert_eq!(result.board.recognized_count(), 3);
}

#[test]
fn counts_one_one_two_is_not_a_set() {
    let mut board = blank_board();
    put_card(&mut board, 0, 1, 0);
    put_card(&mut board, 1, 1, 0);
    put_card(&mut board, 2, 2, 0);

    let result = analyze_frame(&board, &extractor()).unwrap();
    assert_eq!(result.board.recognized_count(), 3);
    assert!(result.set.is_none());
    assert!(result.all_sets.is_empty());
}

#[test]
fn counts_across_columns() {
    let mut board = blank_board();
    put_card(&mut board, 0, 1, 0);
    put_card(&mut board, 4, 2, 0);
    put_card(&mut board, 8, 3, 0);

    let result = analyze_frame(&board, &extractor()).unwrap();
    assert_eq!(result.set, Some(SetTriple([0, 4, 8])));
    let counts: Vec<u8> = [0, 4, 8]
        .iter()
        .map(|&i| result.board.get(i).unwrap().count)
        .collect();
    assert_eq!(counts, vec![1, 2, 3]);
}

#[test]
fn result_serializes_to_json() {
    let mut board = blank_board();
    put_card(&mut board, 0, 1, 3);

    let result = analyze_frame(&board, &extractor()).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["cells"].as_array().unwrap().len(), 12);
    assert_eq!(json["board"][0]["shape"], "diamond");
    assert_eq!(json["board"][3]["color"], "unknown");
    assert!(json["set"].is_null());
}

#[test]
fn annotated_board_outlines_the_set() {
    let mut board = blank_board();
    for slot in 0..3 {
        put_card(&mut board, slot, 1, 3);
    }
    let result = analyze_frame(&board, &extractor()).unwrap();
    let annotated = set_vision::render(&board, &result.cells, result.set.as_ref());

    assert_eq!(annotated.get_pixel(0, 150), &set_vision::overlay::HIGHLIGHT);
    assert_eq!(annotated.get_pixel(300, 150), &WHITE);
}
