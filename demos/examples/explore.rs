// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end session over a small Rashomon set: load, filter, zoom, pin.
//!
//! This drives the core the way an embedding UI would: each action returns
//! one render request, printed here instead of drawn.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p canopy_demos --example explore`

use std::error::Error;

use canopy_model::TreeId;
use canopy_partition::SectorKind;
use canopy_sync::{Explorer, FavoritesBook, RenderRequest};

/// Six trees over age/balance/housing splits, accuracies 0.82 through 0.92.
const PAYLOAD: &str = r#"{
    "trie": {
        "f": "root",
        "c": [
            { "f": "0", "c": [
                { "f": "2", "c": [ { "f": "_", "t": 0 }, { "f": "_", "t": 1 } ] },
                { "f": "3", "c": [ { "f": "_", "t": 2 } ] }
            ] },
            { "f": "1", "c": [
                { "f": "2", "c": [ { "f": "_", "t": 3 } ] },
                { "f": "_", "t": 4 }
            ] },
            { "f": "3", "c": [ { "f": "_", "t": 5 } ] }
        ]
    },
    "featureMap": {
        "0": ["age", "<=30", "age"],
        "1": ["age", ">30", "age"],
        "2": ["balance", "high", "bal"],
        "3": ["housing", "yes", "hou"]
    },
    "treeMap": {
        "0": [ { "f": ["0", 100, -1], "c": [
                    { "f": ["2", 60, -1], "c": [
                        { "f": ["+", 40, 34], "c": [] },
                        { "f": ["-", 20, 15], "c": [] } ] },
                    { "f": ["-", 40, 31], "c": [] } ] }, 0.018, 0.82 ],
        "1": [ { "f": ["0", 100, -1], "c": [
                    { "f": ["2", 60, -1], "c": [
                        { "f": ["+", 38, 33], "c": [] },
                        { "f": ["-", 22, 17], "c": [] } ] },
                    { "f": ["+", 40, 34], "c": [] } ] }, 0.016, 0.84 ],
        "2": [ { "f": ["0", 100, -1], "c": [
                    { "f": ["3", 55, -1], "c": [
                        { "f": ["+", 30, 26], "c": [] },
                        { "f": ["-", 25, 20], "c": [] } ] },
                    { "f": ["+", 45, 40], "c": [] } ] }, 0.014, 0.86 ],
        "3": [ { "f": ["1", 100, -1], "c": [
                    { "f": ["2", 50, -1], "c": [
                        { "f": ["+", 28, 25], "c": [] },
                        { "f": ["-", 22, 19], "c": [] } ] },
                    { "f": ["-", 50, 44], "c": [] } ] }, 0.012, 0.88 ],
        "4": [ { "f": ["1", 100, -1], "c": [
                    { "f": ["+", 52, 48], "c": [] },
                    { "f": ["-", 48, 42], "c": [] } ] }, 0.010, 0.90 ],
        "5": [ { "f": ["3", 100, -1], "c": [
                    { "f": ["+", 61, 57], "c": [] },
                    { "f": ["-", 39, 35], "c": [] } ] }, 0.008, 0.92 ]
    }
}"#;

fn print_request(explorer: &Explorer, request: &RenderRequest) {
    for sector in &request.sectors {
        let label = match sector.kind {
            SectorKind::Split(feature) => explorer
                .data()
                .features
                .get(feature)
                .map_or_else(|| format!("{feature} (unknown)"), |def| def.name_value()),
            SectorKind::Leaf(tree) => format!("{tree}"),
            SectorKind::Root => "root".to_string(),
        };
        println!(
            "  depth {} [{:.3}, {:.3}] {:24} paths={:<2} trees={}",
            sector.depth, sector.x0, sector.x1, label, sector.value, sector.tree_num
        );
    }
    if let Some(t) = &request.transition {
        println!(
            "  animating {:?} -> {:?} (rings {}..={})",
            t.from, t.to, t.depth_low, t.depth_high
        );
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut explorer = Explorer::from_json(PAYLOAD)?;
    let mut clock = 0_u64;

    println!(
        "loaded {} trees over {} feature-value pairs, {} rings",
        explorer.data().trees.len(),
        explorer.data().features.len(),
        explorer.zoom().depth_max()
    );
    println!("feature draw order: {:?}", explorer.colors().sector_order());

    // Keep only the more accurate half of the set.
    clock += 16;
    let request = explorer.set_accuracy_range(0.86, 1.0, clock);
    println!("\nafter accuracy >= 0.86:");
    print_request(&explorer, &request);

    // Zoom into the widest remaining depth-1 sector.
    let widest = request
        .sectors
        .iter()
        .filter(|s| s.depth == 1)
        .max_by(|a, b| (a.x1 - a.x0).total_cmp(&(b.x1 - b.x0)))
        .map(|s| s.node)
        .expect("at least one depth-1 sector survives");
    clock += 500;
    let request = explorer.click(widest, clock)?;
    println!("\nafter zooming into the widest sector:");
    print_request(&explorer, &request);

    // Labels lay out once the debounce window closes.
    if let Some(deadline) = request.labels_at {
        clock = deadline;
        if explorer.poll_labels(clock) {
            println!("\nlabel relayout at t={clock}ms");
        }
    }

    // Pin and annotate the best tree, then export the favorites download.
    let mut book = FavoritesBook::new();
    book.pin(TreeId(5));
    book.set_note(TreeId(5), "single housing split, 0.92 accuracy");
    book.toggle_favorite(TreeId(5));
    println!("\nfavorites download: {}", book.export_json(&explorer.data().trees)?);

    Ok(())
}
