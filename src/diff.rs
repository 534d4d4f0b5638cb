//! Content diff
//!
//! Compares two full `contents` mappings. Because every snapshot holds a
//! complete name → hash view, a diff is a single ordered merge walk.
//!
//! Author: Moroya Sakamoto

use std::collections::BTreeMap;

use crate::hash::Hash;

/// Change to one tracked file between two snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentChange {
    /// Tracked only in the newer mapping
    Added { name: String, hash: Hash },
    /// Tracked in both with different content
    Modified { name: String, old: Hash, new: Hash },
    /// Tracked only in the older mapping
    Removed { name: String, old: Hash },
}

impl ContentChange {
    pub fn name(&self) -> &str {
        match self {
            ContentChange::Added { name, .. }
            | ContentChange::Modified { name, .. }
            | ContentChange::Removed { name, .. } => name,
        }
    }
}

/// Changes turning `old` into `new`, in file-name order.
pub fn diff_contents(old: &BTreeMap<String, Hash>, new: &BTreeMap<String, Hash>) -> Vec<ContentChange> {
    let mut ops = Vec::new();
    let mut a = old.iter().peekable();
    let mut b = new.iter().peekable();

    loop {
        match (a.peek(), b.peek()) {
            (Some(&(na, &ha)), Some(&(nb, &hb))) => {
                if na < nb {
                    ops.push(ContentChange::Removed { name: na.clone(), old: ha });
                    a.next();
                } else if nb < na {
                    ops.push(ContentChange::Added { name: nb.clone(), hash: hb });
                    b.next();
                } else {
                    if ha != hb {
                        ops.push(ContentChange::Modified {
                            name: na.clone(),
                            old: ha,
                            new: hb,
                        });
                    }
                    a.next();
                    b.next();
                }
            }
            (Some(&(na, &ha)), None) => {
                ops.push(ContentChange::Removed { name: na.clone(), old: ha });
                a.next();
            }
            (None, Some(&(nb, &hb))) => {
                ops.push(ContentChange::Added { name: nb.clone(), hash: hb });
                b.next();
            }
            (None, None) => break,
        }
    }
    ops
}
