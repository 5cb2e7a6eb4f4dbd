//! The state machine coordinating NameTree/FIB/PIT/CS/OP/DNL/Scheduler into
//! the twelve forwarding pipelines. This is the forwarding engine's core.

use std::collections::HashSet;
use std::rc::Rc;
use std::time::{Duration, Instant};

use log::{debug, error, warn};

use udcn_common::metrics::ForwarderMetrics;
use udcn_common::ndn::{Data, FaceId, Interest, Name, FACEID_CONTENT_STORE, FACEID_OBJECT_PROCESSOR};

use crate::cache::CacheResult;
use crate::config::Config;
use crate::content_store::ContentStore;
use crate::dead_nonce_list::DeadNonceList;
use crate::face::{Face, FaceTable};
use crate::fib::Fib;
use crate::name_tree::{NameTree, NodeId};
use crate::object_processor::ObjectProcessor;
use crate::pit::Pit;
use crate::scheduler::{ScheduledEvent, Scheduler};
use crate::strategy::{BestRouteStrategy, Strategy, StrategyChoice};
use crate::variant_deriver::VariantDeriver;

pub struct Forwarder {
    config: Config,
    name_tree: NameTree,
    fib: Fib,
    pit: Pit,
    cs: ContentStore,
    op: ObjectProcessor,
    dnl: DeadNonceList,
    strategy_choice: StrategyChoice,
    scheduler: Scheduler,
    faces: FaceTable,
    deriver: VariantDeriver,
    metrics: ForwarderMetrics,
    nonce_state: u32,
}

impl Forwarder {
    pub fn new(config: Config) -> Self {
        let deriver = VariantDeriver::new(config.movie_token.clone(), config.bitrate_ladder.clone());
        Self {
            cs: ContentStore::new(config.cs_max_size),
            op: ObjectProcessor::new(config.op_max_size),
            dnl: DeadNonceList::new(config.dnl_lifetime(), config.dnl_max_size),
            name_tree: NameTree::new(),
            fib: Fib::new(),
            pit: Pit::new(),
            strategy_choice: StrategyChoice::new(Box::new(BestRouteStrategy)),
            scheduler: Scheduler::new(),
            faces: FaceTable::new(),
            deriver,
            metrics: ForwarderMetrics::new(),
            nonce_state: 0x9E37_79B9,
            config,
        }
    }

    pub fn metrics(&self) -> &ForwarderMetrics {
        &self.metrics
    }

    pub fn pit_len(&self) -> usize {
        self.pit.len()
    }

    /* ---------------------------------------------------------------- *
     * Face and route management
     * ---------------------------------------------------------------- */

    pub fn allocate_face_id(&mut self) -> FaceId {
        self.faces.allocate_id()
    }

    pub fn add_face(&mut self, face: Rc<dyn Face>) -> FaceId {
        self.faces.add(face)
    }

    pub fn remove_face(&mut self, id: FaceId) {
        self.faces.remove(id);
        self.fib.remove_face(id);
        self.pit.remove_face(id);
    }

    pub fn register_prefix(&mut self, prefix: &Name, face: FaceId, cost: u32) {
        self.fib.register(&mut self.name_tree, prefix, face, cost);
        self.metrics.fib_size.set(self.fib.len() as u64);
    }

    pub fn unregister_prefix(&mut self, prefix: &Name, face: FaceId) -> bool {
        let removed = self.fib.unregister(&self.name_tree, prefix, face);
        self.metrics.fib_size.set(self.fib.len() as u64);
        removed
    }

    pub fn set_strategy(&mut self, prefix: &Name, strategy: Box<dyn Strategy>) {
        self.strategy_choice.set_strategy(&mut self.name_tree, prefix, strategy);
    }

    /// Drives due timer callbacks. The embedding reactor (`udcn-cli`) calls
    /// this once per tick; nothing fires on its own.
    pub fn poll_timers(&mut self, now: Instant) {
        for event in self.scheduler.poll_due(now) {
            match event {
                ScheduledEvent::Unsatisfy(node) => self.on_interest_unsatisfied(node),
                ScheduledEvent::Finalize(node, is_satisfied, freshness) => {
                    self.on_interest_finalize(node, is_satisfied, freshness)
                }
            }
        }
    }

    /* ---------------------------------------------------------------- *
     * 4.3.1 onIncomingInterest
     * ---------------------------------------------------------------- */

    pub fn on_incoming_interest(&mut self, in_face: FaceId, interest: Interest) {
        self.metrics.interest_processing_time.start();
        self.on_incoming_interest_inner(in_face, interest);
        self.metrics.interest_processing_time.stop();
    }

    fn on_incoming_interest_inner(&mut self, in_face: FaceId, mut interest: Interest) {
        self.metrics.in_interests.increment();
        interest.incoming_face_id = Some(in_face);

        if !self.faces.is_local(in_face) && is_localhost_scoped(&interest.name) {
            debug!("dropping /localhost interest from non-local face {in_face}");
            return;
        }

        let (node, is_new) = self.pit.insert(&mut self.name_tree, &interest);
        if is_new {
            self.metrics.pit_inserts.increment();
        } else {
            self.metrics.pit_aggregations.increment();
        }
        self.metrics.pit_size.set(self.pit.len() as u64);

        let nonce_match = self.pit.find_nonce(node, interest.nonce, in_face);
        if nonce_match.is_duplicate() || self.dnl.has(&interest.name, interest.nonce) {
            self.on_interest_loop(in_face, &interest);
            return;
        }

        self.cancel_unsatisfy_and_straggler_timer(node);

        let has_pending = self
            .pit
            .get(node)
            .map_or(false, |e| !e.in_records.is_empty());
        if has_pending {
            self.on_object_processor_miss(in_face, node, interest);
            return;
        }

        match self.cs.find(&interest) {
            CacheResult::Hit(data) => {
                self.metrics.cs_hits.increment();
                self.on_content_store_hit(in_face, node, data);
            }
            CacheResult::Miss => {
                self.metrics.cs_misses.increment();
                self.on_object_processor_hit(in_face, node, interest);
            }
        }
    }

    fn on_interest_loop(&mut self, in_face: FaceId, interest: &Interest) {
        debug!(
            "interest loop: {} nonce={} face={in_face}",
            interest.name, interest.nonce
        );
        self.metrics.interest_loops.increment();
    }

    /* ---------------------------------------------------------------- *
     * 4.3.2 onContentStoreHit
     * ---------------------------------------------------------------- */

    fn on_content_store_hit(&mut self, in_face: FaceId, pit_node: NodeId, mut data: Data) {
        data.incoming_face_id = Some(FACEID_CONTENT_STORE);
        self.dispatch_before_satisfy_interest(pit_node, FACEID_CONTENT_STORE, &data);
        self.set_straggler_timer(pit_node, true, data.freshness_period);
        self.on_outgoing_data(data, in_face);
    }

    /* ---------------------------------------------------------------- *
     * 4.3.3 onObjectProcessorHit — variant derivation
     * ---------------------------------------------------------------- */

    fn on_object_processor_hit(&mut self, in_face: FaceId, pit_node: NodeId, interest: Interest) {
        let candidates = self.deriver.candidate_parents(&interest.name);
        if !candidates.is_empty() {
            self.metrics.derivations_attempted.increment();
        }

        for candidate in &candidates {
            let placeholder = Interest::new(candidate.clone(), interest.nonce).with_lifetime(interest.lifetime);
            let (parent_node, is_new_placeholder) = self.pit.insert(&mut self.name_tree, &placeholder);

            match self.op.find(candidate) {
                CacheResult::Hit(parent_data) => {
                    self.metrics.op_hits.increment();
                    self.on_processing_data(in_face, pit_node, &interest.name, &parent_data);
                    if is_new_placeholder {
                        self.pit.erase(parent_node);
                    }
                    return;
                }
                CacheResult::Miss => {
                    self.metrics.op_misses.increment();
                    self.on_content_store_miss(candidate);
                    if is_new_placeholder {
                        self.pit.erase(parent_node);
                    }
                }
            }
        }

        if !candidates.is_empty() {
            self.metrics.derivations_failed.increment();
        }
        self.on_object_processor_miss(in_face, pit_node, interest);
    }

    /// As-written upstream behavior: no network action is taken when a
    /// candidate parent variant is absent from the Object Processor cache.
    fn on_content_store_miss(&mut self, parent_name: &Name) {
        debug!("object processor cache miss for candidate parent {parent_name}");
    }

    /* ---------------------------------------------------------------- *
     * 4.3.4 onProcessingData
     * ---------------------------------------------------------------- */

    fn on_processing_data(&mut self, in_face: FaceId, pit_node: NodeId, child_name: &Name, parent_data: &Data) {
        let mut child = self.deriver.synthesize_child(child_name, parent_data);
        self.metrics.derivations_succeeded.increment();
        child.incoming_face_id = Some(FACEID_OBJECT_PROCESSOR);

        self.on_outgoing_data(child.clone(), in_face);
        self.set_straggler_timer(pit_node, true, child.freshness_period);

        let evicted = self.cs.insert(child.without_transport_tags());
        self.metrics.cs_inserts.increment();
        self.metrics.cs_evictions.add(evicted as u64);
        self.metrics.cs_size.set(self.cs.len() as u64);
    }

    /* ---------------------------------------------------------------- *
     * 4.3.5 onObjectProcessorMiss
     * ---------------------------------------------------------------- */

    fn on_object_processor_miss(&mut self, in_face: FaceId, pit_node: NodeId, interest: Interest) {
        let now = Instant::now();
        if let Some(entry) = self.pit.get_mut(pit_node) {
            entry.insert_or_update_in_record(in_face, &interest, now);
        }
        self.set_unsatisfy_timer(pit_node);

        let next_hops = self
            .fib
            .longest_prefix_match(&self.name_tree, &interest.name)
            .map(|e| e.next_hops.clone());
        if next_hops.is_some() {
            self.metrics.fib_hits.increment();
        } else {
            self.metrics.fib_misses.increment();
        }

        self.dispatch_after_receive_interest(in_face, interest, next_hops, pit_node);
    }

    /* ---------------------------------------------------------------- *
     * 4.3.6 onOutgoingInterest — called by strategies via `&mut Forwarder`
     * ---------------------------------------------------------------- */

    pub fn on_outgoing_interest(&mut self, pit_node: NodeId, out_face: FaceId, want_new_nonce: bool) {
        let Some(face) = self.faces.get(out_face).cloned() else {
            warn!("onOutgoingInterest: invalid face {out_face}");
            return;
        };
        let Some(entry) = self.pit.get(pit_node) else {
            return;
        };
        if is_localhost_scoped(&entry.name) && !face.is_local() {
            debug!("dropping outgoing /localhost interest on non-local face {out_face}");
            return;
        }
        let Some(record) = entry.pick_out_interest(out_face) else {
            return;
        };
        let mut outgoing = record.interest.clone();
        if want_new_nonce {
            outgoing.nonce = self.next_nonce();
        }

        let now = Instant::now();
        if let Some(entry) = self.pit.get_mut(pit_node) {
            entry.insert_or_update_out_record(out_face, outgoing.nonce, now, outgoing.lifetime);
        }

        match face.send_interest(&outgoing) {
            Ok(()) => self.metrics.out_interests.increment(),
            Err(err) => warn!("send_interest on face {out_face} failed: {err}"),
        }
    }

    /* ---------------------------------------------------------------- *
     * 4.3.12 onInterestReject
     * ---------------------------------------------------------------- */

    pub fn on_interest_reject(&mut self, pit_node: NodeId) {
        let now = Instant::now();
        let has_unexpired_out = self
            .pit
            .get(pit_node)
            .map_or(false, |e| e.has_unexpired_out_records(now));
        if has_unexpired_out {
            error!("onInterestReject: rejecting a pit entry with unexpired out-records");
            return;
        }
        self.cancel_unsatisfy_and_straggler_timer(pit_node);
        self.set_straggler_timer(pit_node, false, None);
    }

    /* ---------------------------------------------------------------- *
     * 4.3.11 onInterestUnsatisfied
     * ---------------------------------------------------------------- */

    fn on_interest_unsatisfied(&mut self, pit_node: NodeId) {
        self.dispatch_before_expire_pending_interest(pit_node);
        self.on_interest_finalize(pit_node, false, None);
    }

    /* ---------------------------------------------------------------- *
     * 4.3.10 onInterestFinalize
     * ---------------------------------------------------------------- */

    fn on_interest_finalize(&mut self, pit_node: NodeId, is_satisfied: bool, freshness_period: Option<Duration>) {
        let must_be_fresh = self
            .pit
            .get(pit_node)
            .map_or(false, |e| e.in_records.values().any(|r| r.interest.must_be_fresh));
        let should_insert_dnl = !is_satisfied
            || (must_be_fresh && freshness_period.map_or(false, |d| d < self.dnl.lifetime()));
        if should_insert_dnl {
            self.insert_dead_nonce_list(pit_node);
        }

        self.cancel_unsatisfy_and_straggler_timer(pit_node);
        if self.pit.erase(pit_node).is_some() {
            self.metrics.pit_expirations.increment();
        }
        self.metrics.pit_size.set(self.pit.len() as u64);
    }

    fn insert_dead_nonce_list(&mut self, pit_node: NodeId) {
        let now = Instant::now();
        let Some(entry) = self.pit.get(pit_node) else {
            return;
        };
        let name = entry.name.clone();
        let nonces: Vec<u32> = entry.out_records.values().map(|r| r.last_nonce).collect();
        for nonce in nonces {
            self.dnl.add(&name, nonce, now);
        }
        self.metrics.dnl_size.set(self.dnl.len() as u64);
    }

    /* ---------------------------------------------------------------- *
     * 4.3.7 onIncomingData
     * ---------------------------------------------------------------- */

    pub fn on_incoming_data(&mut self, in_face: FaceId, data: Data) {
        self.metrics.data_processing_time.start();
        self.on_incoming_data_inner(in_face, data);
        self.metrics.data_processing_time.stop();
    }

    fn on_incoming_data_inner(&mut self, in_face: FaceId, mut data: Data) {
        self.metrics.in_datas.increment();
        data.incoming_face_id = Some(in_face);

        if !self.faces.is_local(in_face) && is_localhost_scoped(&data.name) {
            debug!("dropping /localhost data from non-local face {in_face}");
            return;
        }

        let matches = self.pit.find_all_data_matches(&self.name_tree, &data);
        if matches.is_empty() {
            self.on_data_unsolicited(in_face, data);
            return;
        }

        let clean = data.without_transport_tags();
        let cs_evicted = self.cs.insert(clean.clone());
        self.metrics.cs_inserts.increment();
        self.metrics.cs_evictions.add(cs_evicted as u64);
        self.metrics.cs_size.set(self.cs.len() as u64);
        let op_evicted = self.op.insert(clean.clone());
        self.metrics.op_inserts.increment();
        self.metrics.op_evictions.add(op_evicted as u64);
        self.metrics.op_size.set(self.op.len() as u64);

        let now = Instant::now();
        let mut pending_downstreams = HashSet::new();
        for &node in &matches {
            if let Some(entry) = self.pit.get(node) {
                for record in entry.in_records.values() {
                    if record.expiry > now {
                        pending_downstreams.insert(record.face);
                    }
                }
            }
        }

        for &node in &matches {
            self.cancel_unsatisfy_and_straggler_timer(node);
            self.dispatch_before_satisfy_interest(node, in_face, &clean);

            let must_be_fresh = self
                .pit
                .get(node)
                .map_or(false, |e| e.in_records.values().any(|r| r.interest.must_be_fresh));
            if must_be_fresh && clean.freshness_period.map_or(false, |d| d < self.dnl.lifetime()) {
                self.insert_dead_nonce_list(node);
            }

            if let Some(entry) = self.pit.get_mut(node) {
                entry.delete_in_records();
                entry.delete_out_record(in_face);
            }
            self.set_straggler_timer(node, true, clean.freshness_period);
        }

        for face in pending_downstreams {
            if face != in_face {
                self.on_outgoing_data(clean.clone(), face);
            }
        }
    }

    /* ---------------------------------------------------------------- *
     * 4.3.8 onDataUnsolicited
     * ---------------------------------------------------------------- */

    fn on_data_unsolicited(&mut self, in_face: FaceId, data: Data) {
        self.metrics.unsolicited_datas.increment();
        if self.faces.is_local(in_face) {
            let clean = data.without_transport_tags();
            let cs_evicted = self.cs.insert(clean.clone());
            self.metrics.cs_inserts.increment();
            self.metrics.cs_evictions.add(cs_evicted as u64);
            self.metrics.cs_size.set(self.cs.len() as u64);
            let op_evicted = self.op.insert(clean);
            self.metrics.op_inserts.increment();
            self.metrics.op_evictions.add(op_evicted as u64);
            self.metrics.op_size.set(self.op.len() as u64);
        } else {
            debug!("dropping unsolicited data on non-local face {in_face}");
        }
    }

    /* ---------------------------------------------------------------- *
     * 4.3.9 onOutgoingData
     * ---------------------------------------------------------------- */

    pub fn on_outgoing_data(&mut self, data: Data, out_face: FaceId) {
        let Some(face) = self.faces.get(out_face).cloned() else {
            warn!("onOutgoingData: invalid face {out_face}");
            return;
        };
        if is_localhost_scoped(&data.name) && !face.is_local() {
            debug!("dropping outgoing /localhost data on non-local face {out_face}");
            return;
        }
        match face.send_data(&data) {
            Ok(()) => self.metrics.out_datas.increment(),
            Err(err) => warn!("send_data on face {out_face} failed: {err}"),
        }
    }

    /* ---------------------------------------------------------------- *
     * Timers
     * ---------------------------------------------------------------- */

    fn set_unsatisfy_timer(&mut self, pit_node: NodeId) {
        let Some(expiry) = self.pit.get(pit_node).and_then(|e| e.max_in_record_expiry()) else {
            return;
        };
        let now = Instant::now();
        let delay = expiry.saturating_duration_since(now);
        let token = self.scheduler.schedule(now, delay, ScheduledEvent::Unsatisfy(pit_node));
        if let Some(entry) = self.pit.get_mut(pit_node) {
            entry.unsatisfy_timer = Some(token);
        }
    }

    fn set_straggler_timer(&mut self, pit_node: NodeId, is_satisfied: bool, freshness_period: Option<Duration>) {
        let now = Instant::now();
        let token = self.scheduler.schedule(
            now,
            self.config.straggler_time(),
            ScheduledEvent::Finalize(pit_node, is_satisfied, freshness_period),
        );
        if let Some(entry) = self.pit.get_mut(pit_node) {
            entry.straggler_timer = Some(token);
        }
    }

    fn cancel_unsatisfy_and_straggler_timer(&mut self, pit_node: NodeId) {
        let Some(entry) = self.pit.get_mut(pit_node) else {
            return;
        };
        if let Some(token) = entry.unsatisfy_timer.take() {
            self.scheduler.cancel(token);
        }
        if let Some(token) = entry.straggler_timer.take() {
            self.scheduler.cancel(token);
        }
    }

    /* ---------------------------------------------------------------- *
     * Strategy dispatch
     * ---------------------------------------------------------------- */

    fn dispatch_after_receive_interest(
        &mut self,
        in_face: FaceId,
        interest: Interest,
        next_hops: Option<Vec<crate::fib::NextHop>>,
        pit_node: NodeId,
    ) {
        let node = self.strategy_choice.lookup_node(&self.name_tree, &interest.name);
        if let Some(mut strategy) = self.strategy_choice.take(node) {
            strategy.after_receive_interest(self, in_face, &interest, next_hops, pit_node);
            self.strategy_choice.put_back(node, strategy);
        }
    }

    fn dispatch_before_satisfy_interest(&mut self, pit_node: NodeId, in_face: FaceId, data: &Data) {
        let Some(entry) = self.pit.get(pit_node) else {
            return;
        };
        let node = self.strategy_choice.lookup_node(&self.name_tree, &entry.name);
        if let Some(mut strategy) = self.strategy_choice.take(node) {
            strategy.before_satisfy_interest(self, pit_node, in_face, data);
            self.strategy_choice.put_back(node, strategy);
        }
    }

    fn dispatch_before_expire_pending_interest(&mut self, pit_node: NodeId) {
        let Some(entry) = self.pit.get(pit_node) else {
            return;
        };
        let node = self.strategy_choice.lookup_node(&self.name_tree, &entry.name);
        if let Some(mut strategy) = self.strategy_choice.take(node) {
            strategy.before_expire_pending_interest(self, pit_node);
            self.strategy_choice.put_back(node, strategy);
        }
    }

    fn next_nonce(&mut self) -> u32 {
        self.nonce_state = self.nonce_state.wrapping_mul(2_654_435_761).wrapping_add(1);
        self.nonce_state ^ (self.pit.len() as u32).rotate_left(13)
    }
}

fn is_localhost_scoped(name: &Name) -> bool {
    name.get(0).map_or(false, |c| c.as_bytes() == b"localhost")
}
