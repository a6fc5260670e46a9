// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generation of the static kernel object directory.
//!
//! The build system scans the linked image for statically declared kernel
//! objects and hands the resulting `(address, kind)` pairs to this crate,
//! which searches for a perfect hash over the addresses and emits the Rust
//! source of the directory the kernel links in. Lookups against the emitted
//! table are `phash::PerfectHashMap` probes; this crate owns the offline
//! search for the table parameter.

use std::collections::HashSet;
use std::fmt::Write;
use std::hash::Hash;

use anyhow::{bail, Result};
use rand::prelude::*;
use rand_chacha::ChaCha20Rng;

use abi::{ObjAddr, ObjectKind};
use phash::PerfectHash;

/// An owned perfect hash from keys to values, as produced by the offline
/// search. This is the codegen-side shape; `phash::PerfectHashMap` is the
/// runtime shape.
pub struct OwnedPerfectHashMap<K, V> {
    pub m: u32,
    pub values: Vec<Option<(K, V)>>,
}

impl<K, V> OwnedPerfectHashMap<K, V>
where
    K: PerfectHash + Hash + Eq,
{
    /// Checks whether `m` sends every key to a distinct slot out of
    /// `slots`.
    fn check(values: &[(K, V)], slots: usize, m: u32) -> bool {
        let mut taken = vec![false; slots];
        values.iter().all(|(k, _)| {
            let slot = k.phash(m) % slots;
            !std::mem::replace(&mut taken[slot], true)
        })
    }

    /// Searches for a perfect hash over the given entries.
    ///
    /// Slot counts from exact up to twice the entry count are tried, with a
    /// bounded number of candidate parameters each, so the resulting table
    /// wastes at most half its slots. The parameter stream is seeded, which
    /// keeps builds reproducible.
    pub fn build(values: Vec<(K, V)>) -> Result<Self> {
        if values.is_empty() {
            return Ok(Self { m: 0, values: Vec::new() });
        }
        if values.iter().map(|(k, _)| k).collect::<HashSet<_>>().len()
            != values.len()
        {
            bail!("cannot build a perfect hash with duplicate keys");
        }

        const TRY_COUNT: usize = 1_000;
        let mut rng = ChaCha20Rng::seed_from_u64(0x1de);
        for slots in values.len()..(2 * values.len() + 1) {
            for _ in 0..TRY_COUNT {
                let m = rng.gen();
                if Self::check(&values, slots, m) {
                    let mut out =
                        (0..slots).map(|_| None).collect::<Vec<_>>();
                    for (k, v) in values {
                        let slot = k.phash(m) % slots;
                        assert!(out[slot].is_none());
                        out[slot] = Some((k, v));
                    }
                    return Ok(Self { m, values: out });
                }
            }
        }

        bail!("could not find a perfect hash");
    }
}

/// One statically declared kernel object, as reported by the image scan.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StaticObjectEntry {
    /// Link-time address of the object itself.
    pub addr: usize,
    /// Kind recorded for the declaring symbol.
    pub kind: ObjectKind,
}

/// Emits the Rust source of the static object directory: one descriptor per
/// entry plus the perfect-hash table over their addresses.
///
/// The output declares `STATIC_OBJECTS`, a
/// `kobj::directory::StaticObjects<'static>`, and expects `abi`, `kobj`,
/// and `phash` in scope as crates.
pub fn generate_directory(objects: &[StaticObjectEntry]) -> Result<String> {
    for o in objects {
        if o.addr == 0 {
            bail!("null address for static object of kind {:?}", o.kind);
        }
        if matches!(o.kind, ObjectKind::Any) {
            bail!("the wildcard kind cannot be declared as an object");
        }
    }

    let map = OwnedPerfectHashMap::build(
        objects
            .iter()
            .map(|o| (ObjAddr(o.addr), o.kind))
            .collect(),
    )?;

    let mut out = String::new();
    writeln!(out, "// Generated by kobjgen from the image symbol table.")?;
    writeln!(out, "// Do not edit.")?;
    writeln!(out)?;
    writeln!(
        out,
        "static KOBJECTS: [kobj::descs::KObject; {}] = [",
        objects.len()
    )?;
    // Descriptors are emitted in slot order, so each occupied slot `i` can
    // name its descriptor by a running index.
    let mut slot_to_index = Vec::with_capacity(map.values.len());
    let mut emitted = 0usize;
    for slot in &map.values {
        match slot {
            Some((addr, kind)) => {
                writeln!(
                    out,
                    "    kobj::descs::KObject::new({:#x}, \
                     abi::ObjectKind::{:?}),",
                    addr.0, kind
                )?;
                slot_to_index.push(Some(emitted));
                emitted += 1;
            }
            None => slot_to_index.push(None),
        }
    }
    writeln!(out, "];")?;
    writeln!(out)?;
    writeln!(
        out,
        "pub static STATIC_OBJECTS: \
         kobj::directory::StaticObjects<'static> ="
    )?;
    writeln!(
        out,
        "    kobj::directory::StaticObjects::new(phash::PerfectHashMap {{"
    )?;
    writeln!(out, "        m: {:#x},", map.m)?;
    writeln!(out, "        values: &[")?;
    for (slot, index) in map.values.iter().zip(&slot_to_index) {
        match (slot, index) {
            (Some((addr, _)), Some(i)) => writeln!(
                out,
                "            (abi::ObjAddr({:#x}), Some(&KOBJECTS[{}])),",
                addr.0, i
            )?,
            _ => writeln!(
                out,
                "            (abi::ObjAddr(0), None),"
            )?,
        }
    }
    writeln!(out, "        ],")?;
    writeln!(out, "    }});")?;

    Ok(out)
}
