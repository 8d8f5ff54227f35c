//! Tiers command - print the rating bands

use gauge_harness::tier_table;

/// Run the tiers command
pub fn run() {
    println!("Rating bands (weighted percentage):");
    print!("{}", tier_table());
}
