//! CLI tool for extracting bold lines from a PDF

use pdf_bold_lines::{extract_pages_from_file, ExtractOptions, HeightMatch};
use std::env;
use std::process;
use std::time::Instant;

fn usage(program: &str) -> ! {
    eprintln!(
        "Usage: {} <pdf_file> [--json] [--parallel] [--tolerance <eps>] [--pages <a-b>]",
        program
    );
    eprintln!();
    eprintln!("Prints the bold text of a PDF, one reconstructed line per output line.");
    process::exit(1);
}

fn parse_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once('-') {
        Some((a, b)) => Some((a.parse().ok()?, b.parse().ok()?)),
        None => {
            let page = range.parse().ok()?;
            Some((page, page))
        }
    }
}

fn json_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage(&args[0]);
    }

    let pdf_path = &args[1];
    let mut json_output = false;
    let mut options = ExtractOptions::default();

    let mut rest = args[2..].iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--json" => json_output = true,
            "--parallel" => options.parallel = true,
            "--tolerance" => {
                let eps = rest.next().and_then(|v| v.parse::<f32>().ok());
                match eps {
                    Some(eps) if eps >= 0.0 => {
                        options.merge.height_match = HeightMatch::Tolerance(eps)
                    }
                    _ => usage(&args[0]),
                }
            }
            "--pages" => match rest.next().and_then(|v| parse_range(v)) {
                Some(range) => options.pages = Some(range),
                None => usage(&args[0]),
            },
            _ => usage(&args[0]),
        }
    }

    let start = Instant::now();

    match extract_pages_from_file(pdf_path, &options) {
        Ok(pages) => {
            let elapsed = start.elapsed();
            let lines: Vec<&String> = pages.iter().flat_map(|p| p.lines.iter()).collect();

            if json_output {
                let items: Vec<String> = pages
                    .iter()
                    .flat_map(|p| {
                        p.lines.iter().map(move |line| {
                            format!(r#"{{"page":{},"text":"{}"}}"#, p.page, json_escape(line))
                        })
                    })
                    .collect();
                println!(
                    r#"{{"pages_processed":{},"line_count":{},"processing_time_ms":{},"lines":[{}]}}"#,
                    pages.len(),
                    lines.len(),
                    elapsed.as_millis(),
                    items.join(",")
                );
            } else {
                for line in lines {
                    println!("{}", line);
                }
            }
        }
        Err(e) => {
            if json_output {
                println!(r#"{{"error":"{}"}}"#, json_escape(&e.to_string()));
            } else {
                eprintln!("Error: {}", e);
            }
            process::exit(1);
        }
    }
}
