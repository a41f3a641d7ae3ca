//! Planning properties over randomized repositories.
//!
//! Repositories are generated with a small blob-id universe so duplicate
//! copies across packs are common, then planned with randomized operator
//! limits.
//!
//! # Invariants
//! - Safety: every live blob survives the plan (its handle is kept and at
//!   least one holding pack is not deleted outright).
//! - Accounting closure: the derived totals add up in all three groupings.
//! - Limit respect: the repack byte cap is never exceeded; without a cap
//!   the unused-space target holds.
//! - Determinism: identical inputs produce identical plans.
//! - Idempotence: with default options, re-planning the executed state
//!   yields an empty plan.

use proptest::collection::vec;
use proptest::prelude::*;

use packsweep::{
    BlobHandle, BlobHandleSet, BlobType, CancelToken, Id, InMemoryIndex, MaxUnused, MemoryBackend,
    PruneOptions, PrunePlan, PruneStats,
};

/// Header overhead charged to every generated pack.
const HEADER_BYTES: u32 = 32;

#[derive(Clone, Debug)]
struct BlobSpec {
    key: u8,
    tree: bool,
    len: u32,
    live: bool,
}

#[derive(Clone, Debug)]
struct RepoSpec {
    packs: Vec<Vec<BlobSpec>>,
    unreferenced: Vec<u64>,
}

fn blob_spec() -> impl Strategy<Value = BlobSpec> {
    (0u8..12, any::<bool>(), 1u32..500, any::<bool>()).prop_map(|(key, tree, len, live)| {
        BlobSpec {
            key,
            tree,
            len,
            live,
        }
    })
}

fn repo_spec() -> impl Strategy<Value = RepoSpec> {
    (vec(vec(blob_spec(), 0..6), 1..8), vec(1u64..2048, 0..3))
        .prop_map(|(packs, unreferenced)| RepoSpec {
            packs,
            unreferenced,
        })
}

fn options() -> impl Strategy<Value = PruneOptions> {
    let max_unused = prop_oneof![
        Just(MaxUnused::Unlimited),
        (0u32..100).prop_map(|p| MaxUnused::Percent(f64::from(p))),
        (0u64..100_000).prop_map(MaxUnused::Bytes),
    ];
    (max_unused, prop::option::of(0u64..5_000), any::<bool>()).prop_map(
        |(max_unused, max_repack_size, repack_cacheable_only)| PruneOptions {
            dry_run: false,
            max_unused,
            max_repack_size,
            repack_cacheable_only,
        },
    )
}

fn pack_id(index: usize) -> Id {
    Id::from_bytes([0x10 + index as u8; 32])
}

fn unreferenced_id(index: usize) -> Id {
    Id::from_bytes([0xa0 + index as u8; 32])
}

fn handle(spec: &BlobSpec) -> BlobHandle {
    let tpe = if spec.tree {
        BlobType::Tree
    } else {
        BlobType::Data
    };
    BlobHandle::new(tpe, Id::from_bytes([spec.key; 32]))
}

type Layout = Vec<(Id, Vec<(BlobHandle, u32)>)>;

/// Materializes a consistent index + backend from the spec.
///
/// A handle is live when any of its generated copies is flagged live, so
/// the used set is well defined across duplicates.
fn build(spec: &RepoSpec) -> (InMemoryIndex, MemoryBackend, BlobHandleSet, Layout) {
    let mut index = InMemoryIndex::new();
    let mut backend = MemoryBackend::new();
    let mut used = BlobHandleSet::default();
    let mut layout = Layout::new();

    for (i, blobs) in spec.packs.iter().enumerate() {
        let id = pack_id(i);
        index.add_pack(id, HEADER_BYTES);
        let mut entries = Vec::with_capacity(blobs.len());
        let mut size = u64::from(HEADER_BYTES);
        for blob in blobs {
            let h = handle(blob);
            index.add_blob(h, id, blob.len);
            size += u64::from(blob.len);
            entries.push((h, blob.len));
            if blob.live {
                used.insert(h);
            }
        }
        backend.add_pack(id, size);
        layout.push((id, entries));
    }

    for (j, &size) in spec.unreferenced.iter().enumerate() {
        backend.add_pack(unreferenced_id(j), size);
    }

    (index, backend, used, layout)
}

fn plan(
    opts: &PruneOptions,
    index: &InMemoryIndex,
    backend: &MemoryBackend,
    used: BlobHandleSet,
) -> (PrunePlan, PruneStats) {
    packsweep::plan_prune(opts, index, backend, used, &CancelToken::new())
        .expect("generated repositories are consistent")
}

/// The repository layout after faithfully executing `plan`: obsoleted
/// packs vanish and the kept blobs of repacked packs move into fresh
/// per-type packs, one copy per handle.
fn apply_plan(layout: &Layout, plan: &PrunePlan) -> Layout {
    let mut next = Layout::new();
    let mut rewritten_data: Vec<(BlobHandle, u32)> = Vec::new();
    let mut rewritten_trees: Vec<(BlobHandle, u32)> = Vec::new();
    let mut copied = BlobHandleSet::default();

    for (id, blobs) in layout {
        if plan.repack.contains(id) {
            for &(h, len) in blobs {
                if plan.keep_blobs.contains(&h) && copied.insert(h) {
                    match h.tpe {
                        BlobType::Data => rewritten_data.push((h, len)),
                        BlobType::Tree => rewritten_trees.push((h, len)),
                    }
                }
            }
        } else if !plan.remove.contains(id)
            && !plan.remove_first.contains(id)
            && !plan.ignore.contains(id)
        {
            next.push((*id, blobs.clone()));
        }
    }

    if !rewritten_data.is_empty() {
        next.push((Id::from_bytes([0xf0; 32]), rewritten_data));
    }
    if !rewritten_trees.is_empty() {
        next.push((Id::from_bytes([0xf1; 32]), rewritten_trees));
    }

    next
}

fn rebuild_from_layout(layout: &Layout) -> (InMemoryIndex, MemoryBackend) {
    let mut index = InMemoryIndex::new();
    let mut backend = MemoryBackend::new();
    for (id, blobs) in layout {
        index.add_pack(*id, HEADER_BYTES);
        let mut size = u64::from(HEADER_BYTES);
        for &(h, len) in blobs {
            index.add_blob(h, *id, len);
            size += u64::from(len);
        }
        backend.add_pack(*id, size);
    }
    (index, backend)
}

fn sorted(set: &packsweep::PackIdSet) -> Vec<Id> {
    let mut ids: Vec<Id> = set.iter().copied().collect();
    ids.sort_unstable();
    ids
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn live_blobs_survive_planning(spec in repo_spec(), opts in options()) {
        let (index, backend, used, layout) = build(&spec);
        let live: Vec<BlobHandle> = used.iter().copied().collect();
        let (plan, _stats) = plan(&opts, &index, &backend, used);

        for h in &live {
            prop_assert!(plan.keep_blobs.contains(h), "live handle dropped: {h}");
            let survives = layout.iter().any(|(id, blobs)| {
                blobs.iter().any(|(b, _)| b == h)
                    && !plan.remove.contains(id)
                    && !plan.remove_first.contains(id)
            });
            prop_assert!(survives, "every copy of {h} is deleted outright");
        }
    }

    #[test]
    fn accounting_closure(spec in repo_spec(), opts in options()) {
        let (index, backend, used, _layout) = build(&spec);
        let (_plan, stats) = plan(&opts, &index, &backend, used);

        prop_assert_eq!(
            stats.blobs.total,
            stats.blobs.used + stats.blobs.unused + stats.blobs.duplicate
        );
        prop_assert_eq!(
            stats.blobs.remove_total,
            stats.blobs.remove + stats.blobs.repack_rm
        );
        prop_assert_eq!(stats.blobs.remain, stats.blobs.total - stats.blobs.remove_total);

        prop_assert_eq!(
            stats.bytes.total,
            stats.bytes.used + stats.bytes.unused + stats.bytes.unreferenced
        );
        prop_assert_eq!(
            stats.bytes.remove_total,
            stats.bytes.remove + stats.bytes.repack_rm + stats.bytes.unreferenced
        );
        prop_assert_eq!(stats.bytes.remain, stats.bytes.total - stats.bytes.remove_total);

        prop_assert_eq!(
            stats.packs.total,
            stats.packs.used
                + stats.packs.partly_used
                + stats.packs.unused
                + stats.packs.unreferenced
        );
        // Every reconciled pack is decided exactly one way.
        prop_assert_eq!(
            stats.packs.keep + stats.packs.repack + stats.packs.remove,
            stats.packs.used + stats.packs.partly_used + stats.packs.unused
        );
    }

    #[test]
    fn limits_are_respected(spec in repo_spec(), opts in options()) {
        let (index, backend, used, _layout) = build(&spec);
        let (_plan, stats) = plan(&opts, &index, &backend, used);

        if let Some(cap) = opts.max_repack_size {
            prop_assert!(
                stats.bytes.repack <= cap,
                "repacked {} bytes over cap {cap}",
                stats.bytes.repack
            );
        }

        // Without a binding repack cap or a data-pack exemption, the
        // unused-space target must be met.
        if opts.max_repack_size.is_none() && !opts.repack_cacheable_only {
            if let MaxUnused::Percent(_) | MaxUnused::Bytes(_) = opts.max_unused {
                let limit = opts.max_unused.limit_after_prune(stats.bytes.used);
                prop_assert!(
                    stats.bytes.remain_unused <= limit,
                    "remaining unused {} over target {limit}",
                    stats.bytes.remain_unused
                );
            }
        }
    }

    #[test]
    fn planning_is_deterministic(spec in repo_spec(), opts in options()) {
        let (index, backend, used, _layout) = build(&spec);
        let (plan_a, stats_a) = plan(&opts, &index, &backend, used.clone());
        let (plan_b, stats_b) = plan(&opts, &index, &backend, used);

        prop_assert_eq!(sorted(&plan_a.remove_first), sorted(&plan_b.remove_first));
        prop_assert_eq!(sorted(&plan_a.repack), sorted(&plan_b.repack));
        prop_assert_eq!(sorted(&plan_a.remove), sorted(&plan_b.remove));
        prop_assert_eq!(sorted(&plan_a.ignore), sorted(&plan_b.ignore));
        prop_assert_eq!(plan_a.keep_blobs.len(), plan_b.keep_blobs.len());
        prop_assert_eq!(stats_a, stats_b);
    }

    #[test]
    fn default_options_reach_a_fixed_point(spec in repo_spec()) {
        let opts = PruneOptions::default();
        let (index, backend, used, layout) = build(&spec);
        let live: Vec<BlobHandle> = used.iter().copied().collect();
        let (first, _stats) = plan(&opts, &index, &backend, used);

        let next_layout = apply_plan(&layout, &first);
        let (index, backend) = rebuild_from_layout(&next_layout);
        let used: BlobHandleSet = live.iter().copied().collect();
        let (second, stats) = plan(&opts, &index, &backend, used);

        prop_assert!(
            second.is_empty(),
            "second plan not empty: remove_first={} repack={} remove={} ignore={}",
            second.remove_first.len(),
            second.repack.len(),
            second.remove.len(),
            second.ignore.len()
        );
        prop_assert_eq!(stats.blobs.duplicate, 0);
        prop_assert_eq!(stats.bytes.remove_total, 0);
    }
}
