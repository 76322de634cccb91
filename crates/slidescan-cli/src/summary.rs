use std::path::Path;

use console::Style;
use slidescan_core::acquire::{ScanMap, SessionStats};
use slidescan_core::catalog::Catalog;
use slidescan_core::compare::{Rating, Similarity};
use slidescan_core::config::SessionConfig;
use slidescan_core::io::image_io::SavedMosaic;
use slidescan_core::io::layout::level_dir_name;
use slidescan_core::reconstruct::ReconstructOutcome;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    warning: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            warning: Style::new().yellow().bold(),
            path: Style::new().underlined(),
        }
    }
}

fn print_title(s: &Styles, title: &str) {
    println!();
    println!("  {}", s.title.apply_to(title));
    println!(
        "  {}",
        s.title.apply_to("\u{2550}".repeat(title.chars().count()))
    );
    println!();
}

pub fn print_scan_summary(config: &SessionConfig, stats: &SessionStats, scan_map: &ScanMap) {
    let s = Styles::new();
    print_title(&s, "Scan Summary");

    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Estimator"),
        s.method.apply_to(&config.estimator.method)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Naming"),
        s.method.apply_to(&config.naming)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Position"),
        s.method.apply_to(&config.position_policy)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Tile / Step"),
        s.value.apply_to(format!(
            "{} px / {} px",
            config.tile_size,
            config.step_size()
        ))
    );
    println!();

    println!("  {}", s.header.apply_to("Frames"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Seen"),
        s.value.apply_to(stats.frames_seen)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Unmatched"),
        s.value.apply_to(stats.frames_skipped)
    );
    println!();

    println!("  {}", s.header.apply_to("Tiles"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Captured"),
        s.value.apply_to(stats.tiles_captured)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Cells"),
        s.value.apply_to(scan_map.len())
    );
    if let Some(bounds) = scan_map.bounds() {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Grid"),
            s.value.apply_to(format!(
                "{}x{} ({:.1}% covered)",
                bounds.rows(),
                bounds.cols(),
                scan_map.coverage() * 100.0
            ))
        );
    }
    println!(
        "    {:<12}{}",
        s.label.apply_to("Position"),
        s.value.apply_to(format!("({}, {})", stats.position.0, stats.position.1))
    );
    println!();
}

pub fn print_levels_summary(catalog: &Catalog) {
    let s = Styles::new();
    print_title(&s, "Pyramid Levels");

    for (level, count) in catalog.level_counts() {
        println!(
            "    {:<12}{}",
            s.label.apply_to(level_dir_name(level)),
            s.value.apply_to(format!("{count} tiles"))
        );
    }
    println!();
}

pub fn print_stitch_summary(
    level: u8,
    outcome: &ReconstructOutcome,
    saved: &SavedMosaic,
    min_success_rate: f64,
) {
    let s = Styles::new();
    print_title(&s, "Mosaic");

    println!(
        "  {:<14}{}",
        s.label.apply_to("Level"),
        s.value.apply_to(level_dir_name(level))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Canvas"),
        s.value.apply_to(format!(
            "{}x{} ({:.1} MB)",
            outcome.canvas.width(),
            outcome.canvas.height(),
            outcome.projected_mb
        ))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Scale"),
        s.value.apply_to(format!("{:.6}", outcome.scale))
    );

    let placed = format!(
        "{}/{} ({:.1}%)",
        outcome.processed,
        outcome.total,
        outcome.success_rate() * 100.0
    );
    if outcome.is_partial(min_success_rate) {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Placed"),
            s.warning.apply_to(format!("{placed}, incomplete"))
        );
    } else {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Placed"),
            s.value.apply_to(placed)
        );
    }
    if outcome.failed > 0 {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Failed"),
            s.warning.apply_to(outcome.failed)
        );
    }
    println!();

    if saved.is_split() {
        println!(
            "  {}",
            s.header.apply_to(format!("Saved in {} parts", saved.parts.len()))
        );
    } else {
        println!("  {}", s.header.apply_to("Saved"));
    }
    for part in &saved.parts {
        println!(
            "    {}  {}",
            s.path.apply_to(part.path.display()),
            s.label.apply_to(format!("{}x{}", part.width, part.height))
        );
    }
    println!();
}

pub fn print_compare_summary(image: &Path, reference: &Path, similarity: &Similarity) {
    let s = Styles::new();
    print_title(&s, "Comparison");

    println!(
        "  {:<14}{}",
        s.label.apply_to("Image"),
        s.path.apply_to(image.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Reference"),
        s.path.apply_to(reference.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Similarity"),
        s.value.apply_to(format!("{:.2}%", similarity.score))
    );

    let rating = similarity.rating();
    let style = match rating {
        Rating::Excellent | Rating::Good => &s.method,
        Rating::Fair | Rating::Poor => &s.warning,
    };
    println!(
        "  {:<14}{}",
        s.label.apply_to("Rating"),
        style.apply_to(rating)
    );
    println!();
}
