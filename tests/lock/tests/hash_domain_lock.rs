//! Digest surface lock tests.
//!
//! 1. Golden path digests: the byte layout of a path digest never changes
//!    silently.
//! 2. No raw `NEURITE::` domain literals in production source outside
//!    `hash_domain.rs`.

use neurite_kernel::digest::{canonical_hash, HashDomain};
use neurite_kernel::volume::{Calibration, Voxel};
use neurite_search::TracedPath;

// ---------------------------------------------------------------------------
// 1. Golden digests
// ---------------------------------------------------------------------------

fn path(voxels: &[(u32, u32, u32)]) -> TracedPath {
    TracedPath::new(
        voxels.iter().map(|&(x, y, z)| Voxel::new(x, y, z)).collect(),
        &Calibration::uncalibrated(),
    )
}

#[test]
fn short_path_digest_is_pinned() {
    assert_eq!(
        path(&[(0, 0, 0), (1, 1, 0), (2, 1, 0)]).digest().as_str(),
        "sha256:9fed0951f4ad837b2ad90d161a6f9c774cf832ef7e53624e0a9489487bea01fd"
    );
}

#[test]
fn diagonal_path_digest_is_pinned() {
    let diagonal: Vec<(u32, u32, u32)> = (0..8).map(|i| (i, i, 0)).collect();
    assert_eq!(
        path(&diagonal).digest().as_str(),
        "sha256:2ecec1c53ee92ac32070d148a54fe6396fece46789451d8af6feb064b3b529b3"
    );
}

#[test]
fn empty_path_digest_is_the_bare_domain() {
    assert_eq!(
        path(&[]).digest(),
        canonical_hash(HashDomain::TracedPath, &[])
    );
    assert_eq!(
        path(&[]).digest().as_str(),
        "sha256:4659473ba5e2c48cc7bf8f3430c92e24d60eaaf18f64c163a978e973616e5ff8"
    );
}

#[test]
fn calibration_does_not_enter_the_digest() {
    let voxels = vec![Voxel::new(3, 1, 4), Voxel::new(4, 1, 5)];
    let plain = TracedPath::new(voxels.clone(), &Calibration::uncalibrated());
    let scaled = TracedPath::new(voxels, &Calibration::new(0.2, 0.2, 1.0, "micron").unwrap());
    assert_eq!(plain.digest(), scaled.digest());
}

// ---------------------------------------------------------------------------
// 2. No raw domain literals outside the authority file
// ---------------------------------------------------------------------------

#[test]
fn no_raw_domain_literals_outside_authority() {
    let production_dirs = [
        concat!(env!("CARGO_MANIFEST_DIR"), "/../../kernel/src"),
        concat!(env!("CARGO_MANIFEST_DIR"), "/../../search/src"),
        concat!(env!("CARGO_MANIFEST_DIR"), "/../../harness/src"),
    ];
    let pattern = "b\"NEURITE::";
    let authority_file = "hash_domain.rs";

    let mut violations = Vec::new();
    let mut scanned = 0;
    for dir in production_dirs {
        for file in walk(std::path::Path::new(dir)) {
            if file.extension().and_then(|e| e.to_str()) != Some("rs")
                || file.file_name().and_then(|n| n.to_str()) == Some(authority_file)
            {
                continue;
            }
            scanned += 1;
            let Ok(content) = std::fs::read_to_string(&file) else {
                continue;
            };
            for (i, line) in content.lines().enumerate() {
                let trimmed = line.trim();
                if !trimmed.starts_with("//") && trimmed.contains(pattern) {
                    violations.push(format!("  {}:{}: {trimmed}", file.display(), i + 1));
                }
            }
        }
    }
    assert!(scanned > 10, "only {scanned} source files found");
    assert!(
        violations.is_empty(),
        "raw NEURITE:: domain literals found outside {authority_file}:\n{}",
        violations.join("\n")
    );
}

fn walk(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut results = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                results.extend(walk(&path));
            } else {
                results.push(path);
            }
        }
    }
    results
}
