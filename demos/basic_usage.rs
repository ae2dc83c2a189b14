//! Basic usage example: build a small library, index it, search and render.
//!
//! Run with: cargo run --example basic_usage
//!
//! Rendering needs `xelatex` and ImageMagick's `convert` on `PATH`; without them
//! the search still works and the render report lists the failures.

use std::path::PathBuf;
use tempfile::tempdir;

use scrollkeep_core::{Library, LibraryConfig, Result, ScrollId};

fn main() -> Result<()> {
    let dir = tempdir()?;
    let root: PathBuf = dir.path().join("scrollkeep");

    println!("=== scrollkeep basic usage ===\n");

    // ========================================
    // 1. Lay out a library and write a few scrolls
    // ========================================
    let config = LibraryConfig::with_root(&root);
    config.ensure_directories()?;
    for (name, body) in [
        ("header", "\\documentclass{standalone}\n\\begin{document}\n"),
        ("footer", "\\end{document}\n"),
        ("theorem_header", "\\textbf{Theorem.} "),
        ("theorem_footer", "\n"),
        ("definition_header", "\\textbf{Definition.} "),
        ("definition_footer", "\n"),
    ] {
        std::fs::write(config.template_path(name), body)?;
    }

    let scrolls = [
        (
            "tychonoff",
            "Any product of compact spaces is compact.\n\n\
             % @source Munkres: Topology\n% @type theorem\n% topology, compactness\n",
        ),
        (
            "compact",
            "A space is compact if every open cover has a finite subcover.\n\n\
             % @type definition\n% topology\n",
        ),
        (
            "cantor",
            "The real numbers are uncountable.\n\n% @type theorem\n% set-theory\n",
        ),
    ];
    for (id, body) in scrolls {
        std::fs::write(config.knowledge_dir.join(format!("{id}.tex")), body)?;
    }
    println!("1. Wrote {} scrolls to {}\n", scrolls.len(), config.knowledge_dir.display());

    // ========================================
    // 2. Open the library and index the corpus
    // ========================================
    let library = Library::open(config)?;
    let report = library.update_index()?;
    println!(
        "2. Indexed {} of {} scrolls (full reindex: {})\n",
        report.indexed, report.scanned, report.full_reindex
    );

    // ========================================
    // 3. Search without rendering
    // ========================================
    let hits = library.find_matching_ids("topology -type:definition")?;
    println!("3. '{}' matched {} scroll(s): {:?}\n", hits.query, hits.total, hits.ids);

    // ========================================
    // 4. Search, render and reconcile
    // ========================================
    let found = library.find_scrolls("topology")?;
    println!("4. Found {} scroll(s):", found.total);
    for scroll in &found.scrolls {
        println!(
            "   - {} [{}] tags={:?} -> {}",
            scroll.id,
            scroll.metadata.scroll_type,
            scroll.metadata.tags,
            library.artifact_path(&scroll.id).display()
        );
    }
    for err in &found.render.errors {
        println!("   ! {err}");
    }
    println!();

    // ========================================
    // 5. Invalid queries are reported separately
    // ========================================
    match library.find_scrolls("nosuchfield:x") {
        Err(err) if err.is_invalid_query() => println!("5. Rejected query: {err}\n"),
        Err(err) => return Err(err),
        Ok(_) => println!("5. Unexpectedly accepted\n"),
    }

    // ========================================
    // 6. Statistics
    // ========================================
    let stats = library.statistics()?;
    println!(
        "6. {} scrolls, {:.1} KiB on disk",
        stats.scroll_count,
        stats.total_kib()
    );

    let loaded = library.load_scrolls(&[ScrollId::from("cantor")])?;
    println!("   cantor reads: {}", loaded[0].content);

    Ok(())
}
