//! Forwarding strategy: the pluggable decision of which upstream face(s) to
//! try for a pending Interest. Concrete routing strategies beyond a minimal
//! best-route default are out of scope here — this module only provides
//! the seam the pipelines dispatch through.

use std::collections::HashMap;

use log::debug;
use udcn_common::ndn::{Data, FaceId, Interest};

use crate::fib::NextHop;
use crate::forwarder::Forwarder;
use crate::name_tree::{NameTree, NodeId};

pub trait Strategy {
    fn after_receive_interest(
        &mut self,
        forwarder: &mut Forwarder,
        in_face: FaceId,
        interest: &Interest,
        next_hops: Option<Vec<NextHop>>,
        pit_node: NodeId,
    );

    fn before_satisfy_interest(
        &mut self,
        _forwarder: &mut Forwarder,
        _pit_node: NodeId,
        _in_face: FaceId,
        _data: &Data,
    ) {
    }

    fn before_expire_pending_interest(&mut self, _forwarder: &mut Forwarder, _pit_node: NodeId) {}
}

/// Forwards to the lowest-cost next hop not already pending, mirroring
/// NFD's best-route strategy stripped of its retransmission heuristics.
pub struct BestRouteStrategy;

impl Strategy for BestRouteStrategy {
    fn after_receive_interest(
        &mut self,
        forwarder: &mut Forwarder,
        in_face: FaceId,
        interest: &Interest,
        next_hops: Option<Vec<NextHop>>,
        pit_node: NodeId,
    ) {
        // A FIB miss is not a rejection: onInterestReject is for a strategy
        // that actively gives up on an entry it has no out-records for yet.
        // Here there's simply no route, so the entry is left pending and
        // expires through the ordinary unsatisfy timer instead.
        let Some(hops) = next_hops else {
            debug!("afterReceiveInterest: no FIB route for {} from {in_face}", interest.name);
            return;
        };
        if let Some(best) = hops.iter().min_by_key(|h| h.cost) {
            forwarder.on_outgoing_interest(pit_node, best.face, false);
        }
    }
}

/// A longest-prefix-matched table of strategies, one per registered prefix,
/// falling back to a default installed at the root.
pub struct StrategyChoice {
    strategies: HashMap<NodeId, Box<dyn Strategy>>,
}

impl StrategyChoice {
    pub fn new(default: Box<dyn Strategy>) -> Self {
        let mut strategies = HashMap::new();
        strategies.insert(NameTree::ROOT, default);
        Self { strategies }
    }

    pub fn set_strategy(
        &mut self,
        tree: &mut NameTree,
        prefix: &udcn_common::ndn::Name,
        strategy: Box<dyn Strategy>,
    ) {
        let node = tree.lookup(prefix);
        self.strategies.insert(node, strategy);
    }

    pub fn lookup_node(&self, tree: &NameTree, name: &udcn_common::ndn::Name) -> NodeId {
        tree.find_longest_prefix_match(name, |n| self.strategies.contains_key(&n))
            .unwrap_or(NameTree::ROOT)
    }

    /// Temporarily removes the strategy at `node` so the caller can invoke
    /// it with `&mut Forwarder` without a conflicting borrow, then puts it
    /// back.
    pub fn take(&mut self, node: NodeId) -> Option<Box<dyn Strategy>> {
        self.strategies.remove(&node)
    }

    pub fn put_back(&mut self, node: NodeId, strategy: Box<dyn Strategy>) {
        self.strategies.insert(node, strategy);
    }
}
