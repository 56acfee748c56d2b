//! Debug tool: print every text chunk of a page range with its merge geometry
//!
//! Usage: debug_chunks <pdf_file> [max_page | min-max]

use pdf_bold_lines::{collect_page, MergeConfig, PageSource, PdfDocument, StyleClassifier};
use std::env;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: debug_chunks <pdf_path> [max_page | min-max]");
        std::process::exit(1);
    }

    let range = args.get(2).map(|s| s.as_str()).unwrap_or("1-3");
    let (min_page, max_page) = if let Some((a, b)) = range.split_once('-') {
        (a.parse().unwrap_or(1), b.parse().unwrap_or(3))
    } else {
        (1, range.parse().unwrap_or(3))
    };

    let doc = match PdfDocument::open(&args[1]) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let config = MergeConfig::default();
    let classifier = StyleClassifier::default();

    for page in min_page..=max_page.min(doc.page_count()) {
        let fragments = match collect_page(&doc, page, &config, &classifier) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Page {}: {}", page, e);
                continue;
            }
        };

        println!(
            "=== PAGE {} ({} chunks, {} bold, edges {:?}..{:?}) ===",
            page,
            fragments.chunks().len(),
            fragments.bold_count(),
            fragments.left_edge(),
            fragments.right_edge()
        );
        for chunk in fragments.chunks() {
            let line = fragments
                .registry()
                .index_of(chunk.line_height)
                .map(|i| i.to_string())
                .unwrap_or_else(|| "-".into());
            println!(
                "  {} x={:7.1}..{:7.1} h={:7.1} line={:>3} sp={:5.2} text={:?}",
                if chunk.is_bold { "B" } else { " " },
                chunk.start.x,
                chunk.end.x,
                chunk.line_height,
                line,
                chunk.char_space_width,
                chunk.text
            );
        }
        println!();
    }
}
