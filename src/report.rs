//! Human-readable rendering of prune statistics.
//!
//! The renderer is stateless; it only formats the finalized stats record.
//! Machine consumers should serialize [`crate::stats::PruneStats`] instead.

use std::fmt::Write as _;

use crate::stats::PruneStats;

/// Formats a byte count with binary suffixes.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    let value = bytes as f64;
    if bytes >= 1 << 40 {
        format!("{:.3} TiB", value / (1u64 << 40) as f64)
    } else if bytes >= 1 << 30 {
        format!("{:.3} GiB", value / (1u64 << 30) as f64)
    } else if bytes >= 1 << 20 {
        format!("{:.3} MiB", value / (1u64 << 20) as f64)
    } else if bytes >= 1 << 10 {
        format!("{:.3} KiB", value / (1u64 << 10) as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Formats `numerator / denominator` as a percentage, or an empty string
/// when the denominator is zero.
#[must_use]
pub fn format_percent(numerator: u64, denominator: u64) -> String {
    if denominator == 0 {
        return String::new();
    }
    format!("{:.2}%", 100.0 * numerator as f64 / denominator as f64)
}

/// Renders the post-planning summary.
#[must_use]
pub fn render(stats: &PruneStats) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "used:        {:>10} blobs / {}",
        stats.blobs.used,
        format_bytes(stats.bytes.used)
    );
    if stats.blobs.duplicate > 0 {
        let _ = writeln!(
            out,
            "duplicates:  {:>10} blobs / {}",
            stats.blobs.duplicate,
            format_bytes(stats.bytes.duplicate)
        );
    }
    let _ = writeln!(
        out,
        "unused:      {:>10} blobs / {}",
        stats.blobs.unused,
        format_bytes(stats.bytes.unused)
    );
    if stats.bytes.unreferenced > 0 {
        let _ = writeln!(
            out,
            "unreferenced:                   {}",
            format_bytes(stats.bytes.unreferenced)
        );
    }
    let _ = writeln!(
        out,
        "total:       {:>10} blobs / {}",
        stats.blobs.total,
        format_bytes(stats.bytes.total)
    );
    let _ = writeln!(
        out,
        "unused size: {} of total size",
        format_percent(stats.bytes.unused, stats.bytes.total)
    );
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "to repack:   {:>10} blobs / {}",
        stats.blobs.repack,
        format_bytes(stats.bytes.repack)
    );
    let _ = writeln!(
        out,
        "this removes {:>10} blobs / {}",
        stats.blobs.repack_rm,
        format_bytes(stats.bytes.repack_rm)
    );
    let _ = writeln!(
        out,
        "to delete:   {:>10} blobs / {}",
        stats.blobs.remove,
        format_bytes(stats.bytes.remove + stats.bytes.unreferenced)
    );
    let _ = writeln!(
        out,
        "total prune: {:>10} blobs / {}",
        stats.blobs.remove_total,
        format_bytes(stats.bytes.remove_total)
    );
    let _ = writeln!(
        out,
        "remaining:   {:>10} blobs / {}",
        stats.blobs.remain,
        format_bytes(stats.bytes.remain)
    );
    let _ = writeln!(
        out,
        "unused size after prune: {} ({} of remaining size)",
        format_bytes(stats.bytes.remain_unused),
        format_percent(stats.bytes.remain_unused, stats.bytes.remain)
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "totally used packs: {:>10}", stats.packs.used);
    let _ = writeln!(out, "partly used packs:  {:>10}", stats.packs.partly_used);
    let _ = writeln!(out, "unused packs:       {:>10}", stats.packs.unused);
    let _ = writeln!(out);
    let _ = writeln!(out, "to keep:   {:>10} packs", stats.packs.keep);
    let _ = writeln!(out, "to repack: {:>10} packs", stats.packs.repack);
    let _ = writeln!(out, "to delete: {:>10} packs", stats.packs.remove);
    if stats.packs.unreferenced > 0 {
        let _ = writeln!(
            out,
            "to delete: {:>10} unreferenced packs",
            stats.packs.unreferenced
        );
    }

    out
}
