//! Pending Interest Table: one entry per distinct Interest name, tracking
//! the downstream faces awaiting a reply (in-records) and the upstream
//! faces we forwarded to (out-records).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use udcn_common::ndn::{Data, FaceId, Interest, Name};

use crate::name_tree::{NameTree, NodeId};
use crate::scheduler::TimerToken;

#[derive(Debug, Clone)]
pub struct InRecord {
    pub face: FaceId,
    pub interest: Interest,
    pub last_renewed: Instant,
    pub expiry: Instant,
}

#[derive(Debug, Clone)]
pub struct OutRecord {
    pub face: FaceId,
    pub last_nonce: u32,
    pub last_renewed: Instant,
    pub expiry: Instant,
}

#[derive(Debug)]
pub struct PitEntry {
    pub name: Name,
    pub in_records: HashMap<FaceId, InRecord>,
    pub out_records: HashMap<FaceId, OutRecord>,
    pub unsatisfy_timer: Option<TimerToken>,
    pub straggler_timer: Option<TimerToken>,
}

impl PitEntry {
    fn new(name: Name) -> Self {
        Self {
            name,
            in_records: HashMap::new(),
            out_records: HashMap::new(),
            unsatisfy_timer: None,
            straggler_timer: None,
        }
    }

    pub fn insert_or_update_in_record(&mut self, face: FaceId, interest: &Interest, now: Instant) {
        let expiry = now + interest.lifetime;
        self.in_records.insert(
            face,
            InRecord {
                face,
                interest: interest.clone(),
                last_renewed: now,
                expiry,
            },
        );
    }

    pub fn insert_or_update_out_record(
        &mut self,
        face: FaceId,
        nonce: u32,
        now: Instant,
        lifetime: Duration,
    ) {
        let expiry = now + lifetime;
        self.out_records.insert(
            face,
            OutRecord {
                face,
                last_nonce: nonce,
                last_renewed: now,
                expiry,
            },
        );
    }

    pub fn delete_in_records(&mut self) {
        self.in_records.clear();
    }

    pub fn delete_out_record(&mut self, face: FaceId) {
        self.out_records.remove(&face);
    }

    pub fn has_unexpired_out_records(&self, now: Instant) -> bool {
        self.out_records.values().any(|r| r.expiry > now)
    }

    pub fn max_in_record_expiry(&self) -> Option<Instant> {
        self.in_records.values().map(|r| r.expiry).max()
    }

    /// The in-record to re-express as an outgoing Interest: the
    /// most-recently-renewed one not already pending on `out_face`, falling
    /// back to any in-record if every downstream shares that face.
    pub fn pick_out_interest(&self, out_face: FaceId) -> Option<&InRecord> {
        self.in_records
            .values()
            .filter(|r| r.face != out_face)
            .max_by_key(|r| r.last_renewed)
            .or_else(|| self.in_records.values().max_by_key(|r| r.last_renewed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceMatch {
    None,
    InRecordSameFace,
    InRecordOtherFace,
    OutRecordSameFace,
    OutRecordOtherFace,
}

impl NonceMatch {
    pub fn is_duplicate(self) -> bool {
        !matches!(self, NonceMatch::None)
    }
}

#[derive(Default)]
pub struct Pit {
    entries: HashMap<NodeId, PitEntry>,
}

impl Pit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds or creates the entry for `interest.name`. Returns the node
    /// plus whether the entry is newly created (for PIT-aggregation metrics).
    pub fn insert(&mut self, tree: &mut NameTree, interest: &Interest) -> (NodeId, bool) {
        let node = tree.lookup(&interest.name);
        let is_new = !self.entries.contains_key(&node);
        self.entries
            .entry(node)
            .or_insert_with(|| PitEntry::new(interest.name.clone()));
        (node, is_new)
    }

    pub fn get(&self, node: NodeId) -> Option<&PitEntry> {
        self.entries.get(&node)
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut PitEntry> {
        self.entries.get_mut(&node)
    }

    pub fn erase(&mut self, node: NodeId) -> Option<PitEntry> {
        self.entries.remove(&node)
    }

    /// Drops every record referencing `face`, e.g. when the face is removed
    /// from the FaceTable. Leaves the entry itself in place even if this
    /// empties it — pipelines erase entries explicitly via `erase`.
    pub fn remove_face(&mut self, face: FaceId) {
        for entry in self.entries.values_mut() {
            entry.in_records.remove(&face);
            entry.out_records.remove(&face);
        }
    }

    pub fn find_nonce(&self, node: NodeId, nonce: u32, in_face: FaceId) -> NonceMatch {
        let Some(entry) = self.entries.get(&node) else {
            return NonceMatch::None;
        };
        for record in entry.in_records.values() {
            if record.interest.nonce == nonce {
                return if record.face == in_face {
                    NonceMatch::InRecordSameFace
                } else {
                    NonceMatch::InRecordOtherFace
                };
            }
        }
        for record in entry.out_records.values() {
            if record.last_nonce == nonce {
                return if record.face == in_face {
                    NonceMatch::OutRecordSameFace
                } else {
                    NonceMatch::OutRecordOtherFace
                };
            }
        }
        NonceMatch::None
    }

    /// Every PIT entry whose name is a prefix of `data.name`, walking only
    /// the ancestors of `data.name` in the tree rather than scanning the
    /// whole table.
    pub fn find_all_data_matches(&self, tree: &NameTree, data: &Data) -> Vec<NodeId> {
        let mut matches = Vec::new();
        let mut current = NameTree::ROOT;
        if let Some(entry) = self.entries.get(&current) {
            if data_satisfies(entry, data) {
                matches.push(current);
            }
        }
        for component in data.name.components() {
            match tree.child(current, component) {
                Some(next) => {
                    current = next;
                    if let Some(entry) = self.entries.get(&current) {
                        if data_satisfies(entry, data) {
                            matches.push(current);
                        }
                    }
                }
                None => break,
            }
        }
        matches
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn data_satisfies(entry: &PitEntry, data: &Data) -> bool {
    let requires_fresh = entry.in_records.values().any(|r| r.interest.must_be_fresh);
    !requires_fresh || data.is_fresh_now()
}
