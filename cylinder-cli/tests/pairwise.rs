use std::fs;
use std::path::Path;

use cylinder_cli::{list_images, MatchConfig, Orchestrator, PairOutcome, PairResult, Report};
use image::{GrayImage, Luma};

/// Synthetic print: ridges modulated by a few bright pads
fn fingerprint(size: u32) -> GrayImage {
    let pads = [(0.32f32, 0.3f32, 250.0f32), (0.68, 0.4, 220.0), (0.45, 0.72, 200.0)];
    GrayImage::from_fn(size, size, |x, y| {
        let (fx, fy) = (x as f32 / size as f32, y as f32 / size as f32);
        let ridge = 20.0 * (fx * 60.0 + fy * 25.0).sin();
        let pad = pads
            .iter()
            .map(|&(cx, cy, peak)| {
                let d2 = (fx - cx).powi(2) + (fy - cy).powi(2);
                peak * (-d2 / 0.004).exp()
            })
            .fold(0.0f32, f32::max);
        Luma([(40.0 + ridge + pad).clamp(0.0, 255.0) as u8])
    })
}

fn write_corpus(dir: &Path) {
    fingerprint(240).save(dir.join("101_1.bmp")).unwrap();
    fs::copy(dir.join("101_1.bmp"), dir.join("101_2.bmp")).unwrap();
    GrayImage::from_pixel(240, 240, Luma([128])).save(dir.join("102_1.bmp")).unwrap();
}

fn run(dir: &Path) -> Vec<PairResult> {
    let cfg = MatchConfig { n_threads: 3, ..MatchConfig::default() };
    let corpus = list_images(dir, "bmp").unwrap();
    Orchestrator::new(&cfg).unwrap().run(&corpus, &())
}

fn find<'a>(results: &'a [PairResult], a: &str, b: &str) -> &'a PairResult {
    results
        .iter()
        .find(|r| r.image_a == a && r.image_b == b)
        .unwrap_or_else(|| panic!("missing pair {} - {}", a, b))
}

#[test]
fn produces_n_squared_lines() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    fs::write(dir.path().join("readme.txt"), "not an image").unwrap();

    let results = run(dir.path());
    assert_eq!(results.len(), 9);

    let out = dir.path().join("report.txt");
    Report::new(results).save(&out).unwrap();
    assert_eq!(fs::read_to_string(&out).unwrap().lines().count(), 9);
}

#[test]
fn self_pairs_are_exactly_one() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let results = run(dir.path());

    for name in ["101_1.bmp", "101_2.bmp", "102_1.bmp"] {
        assert_eq!(find(&results, name, name).outcome, PairOutcome::Score(1.0));
        assert_eq!(find(&results, name, name).to_string(), format!("{} - {}: 1.0000", name, name));
    }
}

#[test]
fn constant_image_reports_no_features() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let results = run(dir.path());

    let pair = find(&results, "101_1.bmp", "102_1.bmp");
    assert_eq!(pair.outcome, PairOutcome::NoFeatures);
    assert_eq!(pair.to_string(), "No valid features found in fingerprint: 101_1.bmp - 102_1.bmp");
    assert_eq!(find(&results, "102_1.bmp", "101_2.bmp").outcome, PairOutcome::NoFeatures);
}

#[test]
fn identical_copies_are_scored_symmetrically() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let results = run(dir.path());

    let forward = &find(&results, "101_1.bmp", "101_2.bmp").outcome;
    let backward = &find(&results, "101_2.bmp", "101_1.bmp").outcome;
    match (forward, backward) {
        (PairOutcome::Score(f), PairOutcome::Score(b)) => {
            assert!((0.0..=1.0).contains(f));
            assert_eq!(f, b);
        }
        other => panic!("expected scores, got {:?}", other),
    }
}

#[test]
fn corrupt_file_does_not_abort_batch() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    fs::write(dir.path().join("broken.bmp"), b"BM definitely not a bitmap").unwrap();

    let results = run(dir.path());
    assert_eq!(results.len(), 16);

    let failed = results.iter().filter(|r| matches!(r.outcome, PairOutcome::Failed(_))).count();
    // every pair touching broken.bmp except its self-pair
    assert_eq!(failed, 6);
    assert_eq!(find(&results, "broken.bmp", "broken.bmp").outcome, PairOutcome::Score(1.0));
}
