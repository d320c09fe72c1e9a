//! Hash domain governance lock tests.
//!
//! Proves:
//! 1. All domain byte strings are unique
//! 2. All domains are null-terminated
//! 3. All domains follow the `LOOPTUNE::*::V1\0` naming convention
//! 4. No raw `LOOPTUNE::` domain literals in production source outside
//!    `fingerprint.rs`
//! 5. Fingerprints depend only on the dumped state, not on history

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use lock_tests::matmul_nest;
use looptune_kernel::agent::LoopAgentV1;
use looptune_kernel::fingerprint::{
    canonical_hash, fingerprint, StateFingerprint, DOMAIN_AGENT_STATE, DOMAIN_MODEL_FILE,
};

const ALL_DOMAINS: [&[u8]; 2] = [DOMAIN_AGENT_STATE, DOMAIN_MODEL_FILE];

fn workspace_root() -> &'static Path {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .expect("tests/ exists")
        .parent()
        .expect("workspace root exists")
}

fn rust_sources(dir: &Path, out: &mut Vec<PathBuf>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            rust_sources(&path, out);
        } else if path.extension().is_some_and(|e| e == "rs") {
            out.push(path);
        }
    }
}

// ---------------------------------------------------------------------------
// 1. All unique bytes
// ---------------------------------------------------------------------------

#[test]
fn hash_domain_all_unique_bytes() {
    let mut seen = BTreeSet::new();
    for domain in ALL_DOMAINS {
        assert!(
            seen.insert(domain),
            "duplicate domain bytes: {}",
            String::from_utf8_lossy(domain)
        );
    }
}

// ---------------------------------------------------------------------------
// 2. All null-terminated
// ---------------------------------------------------------------------------

#[test]
fn hash_domain_all_null_terminated() {
    for domain in ALL_DOMAINS {
        assert!(
            domain.ends_with(&[0]),
            "{} is not null-terminated",
            String::from_utf8_lossy(domain)
        );
        assert_eq!(domain.iter().filter(|b| **b == 0).count(), 1);
    }
}

// ---------------------------------------------------------------------------
// 3. Naming convention
// ---------------------------------------------------------------------------

#[test]
fn hash_domain_naming_convention() {
    for domain in ALL_DOMAINS {
        let text = std::str::from_utf8(domain).unwrap();
        assert!(text.starts_with("LOOPTUNE::"), "{text:?}");
        assert!(text.ends_with("::V1\0"), "{text:?}");
    }
}

// ---------------------------------------------------------------------------
// 4. Single definition site
// ---------------------------------------------------------------------------

#[test]
fn no_raw_domain_literals_outside_fingerprint_module() {
    let root = workspace_root();
    let mut files = Vec::new();
    for krate in ["kernel", "search", "harness"] {
        rust_sources(&root.join(krate).join("src"), &mut files);
    }
    assert!(!files.is_empty());

    let needle = concat!("b\"", "LOOPTUNE::");
    for file in files {
        if file.ends_with("kernel/src/fingerprint.rs") {
            continue;
        }
        let text = fs::read_to_string(&file).unwrap();
        assert!(
            !text.contains(needle),
            "{} defines a hash domain literal",
            file.display()
        );
    }
}

// ---------------------------------------------------------------------------
// 5. Fingerprints
// ---------------------------------------------------------------------------

#[test]
fn fingerprint_ignores_history() {
    let root = matmul_nest();
    let mut wandered = matmul_nest();
    wandered.apply_action("down").unwrap();
    wandered.apply_action("up").unwrap();
    assert_ne!(root.actions(), wandered.actions());
    assert_eq!(fingerprint(&root), fingerprint(&wandered));
}

#[test]
fn fingerprint_is_domain_separated_dump_hash() {
    let agent = matmul_nest();
    let fp = fingerprint(&agent);
    assert_eq!(
        fp.content_hash(),
        &canonical_hash(DOMAIN_AGENT_STATE, agent.dump().as_bytes())
    );
    assert_ne!(
        fp.content_hash(),
        &canonical_hash(DOMAIN_MODEL_FILE, agent.dump().as_bytes())
    );
    assert_eq!(fp, StateFingerprint::from_dump(&agent.dump()));
}
