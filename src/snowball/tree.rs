//! A modified patricia tree of snowball instances deciding a single 256-bit value.

use std::fmt;

use tracing::debug;

use crate::bag::Bag;
use crate::zfx_id::{equal_subset, first_difference_subset, Id, NUM_BITS};

use super::{BinarySnowball, Factory, Parameters, SnowballFactory, UnarySnowball};

/// The contract a single-decision consensus instance exposes to its caller.
pub trait Consensus {
    /// Fetches the currently preferred choice.
    fn preference(&self) -> Id;

    /// Introduces a new competing choice.
    fn add(&mut self, choice: Id);

    /// Records the outcome of a network poll. Returns whether the poll
    /// reached a preference majority at the root.
    fn record_poll(&mut self, votes: &Bag<Id>) -> bool;

    /// Marks the whole instance for a reset before the next poll is applied.
    fn record_unsuccessful_poll(&mut self);

    /// Whether consensus has been reached.
    fn finalized(&self) -> bool;
}

/// Snowball consensus over a growing set of 256-bit choices, arranged as a
/// modified patricia tree.
///
/// Runs of undisputed bits are unary snowball instances and every disputed
/// bit is a binary one. A poll walks the single branch that can still reach
/// a majority, and a node whose counter finalizes is replaced by its child
/// on the way back up, growing the decided prefix.
pub struct Tree<F: Factory = SnowballFactory> {
    /// The root snow instance; its decided prefix is the number of bits
    /// irrevocably agreed upon.
    root: Node,

    /// The thresholds shared by every counter in the tree.
    params: Parameters,

    /// Produces the counters attached to newly split branches.
    factory: F,

    /// Deferred reset latch. A failed poll does not traverse the tree;
    /// instead this is handed to the next `record_poll`, and the same
    /// per-node latches carry the reset further down on demand.
    should_reset: bool,
}

impl<F: Factory> Tree<F> {
    /// Creates a tree whose only tracked choice is `choice`.
    pub fn new(factory: F, params: Parameters, choice: Id) -> Self {
        let root = Node::Unary(UnaryNode {
            preference: choice,
            decided_prefix: 0,
            common_prefix: NUM_BITS,
            snow: factory.new_unary(params),
            should_reset: false,
            child: None,
        });
        Tree { root, params, factory, should_reset: false }
    }

    /// Fetches the number of leading bits of the preference that have been
    /// irrevocably decided.
    pub fn decided_prefix(&self) -> usize {
        self.root.decided_prefix()
    }

    /// Renders the tree depth-first, one node per line, children indented
    /// below their parent.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.root.render(&mut out, 0);
        out.truncate(out.trim_end_matches('\n').len());
        out
    }
}

impl<F: Factory> Consensus for Tree<F> {
    fn preference(&self) -> Id {
        self.root.preference()
    }

    fn add(&mut self, choice: Id) {
        // A choice that disagrees with the decided prefix has already been
        // decided against.
        if !equal_subset(0, self.root.decided_prefix(), &self.root.preference(), &choice) {
            debug!("dropping choice {:?}: conflicts with the decided prefix", choice);
            return;
        }
        self.root.add(choice, &self.params, &self.factory);
    }

    fn record_poll(&mut self, votes: &Bag<Id>) -> bool {
        // Votes that disagree with the decided prefix are votes for rejected
        // branches; filter them before they reach a counter.
        let decided_prefix = self.root.decided_prefix();
        let preference = self.root.preference();
        let filtered = votes.filter(|id| equal_subset(0, decided_prefix, &preference, id));

        let was_finalized = self.root.finalized();
        let successful = self.root.record_poll(&filtered, self.should_reset, &self.params);
        self.should_reset = false;

        if !was_finalized && self.root.finalized() {
            debug!("finalized on {:?}", self.root.preference());
        }
        successful
    }

    fn record_unsuccessful_poll(&mut self) {
        self.should_reset = true;
    }

    fn finalized(&self) -> bool {
        self.root.finalized()
    }
}

impl<F: Factory> fmt::Display for Tree<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// A node votes either on a run of undisputed bits (unary) or on a single
/// disputed bit (binary).
#[derive(Debug)]
enum Node {
    Unary(UnaryNode),
    Binary(BinaryNode),
}

#[derive(Debug)]
struct UnaryNode {
    /// The choice preferred at every branch of this sub-tree.
    preference: Id,

    /// Bits strictly before this index are assumed decided.
    decided_prefix: usize,

    /// Exclusive end of the run of identical bits this node votes on.
    common_prefix: usize,

    /// Wraps the unary decision logic.
    snow: UnarySnowball,

    /// Deferred reset latch, the continuation of the tree-level one.
    should_reset: bool,

    /// Votes on the bits after `common_prefix`, if any conflict arose there.
    child: Option<Box<Node>>,
}

#[derive(Debug)]
struct BinaryNode {
    /// A representative choice per branch.
    preferences: [Id; 2],

    /// The index of the bit this node decides.
    bit: usize,

    /// Wraps the binary decision logic.
    snow: BinarySnowball,

    /// Deferred reset latch per branch.
    should_reset: [bool; 2],

    /// Vote on the bits after `bit`, per branch.
    children: [Option<Box<Node>>; 2],
}

impl Default for Node {
    // A placeholder used only to take ownership during structural rewrites;
    // it is overwritten before it can be observed.
    fn default() -> Self {
        Node::Unary(UnaryNode {
            preference: Id::default(),
            decided_prefix: 0,
            common_prefix: NUM_BITS,
            snow: UnarySnowball::new(Parameters::default()),
            should_reset: false,
            child: None,
        })
    }
}

impl Node {
    fn preference(&self) -> Id {
        match self {
            Node::Unary(u) => u.preference,
            Node::Binary(b) => b.preferences[b.snow.preference()],
        }
    }

    fn decided_prefix(&self) -> usize {
        match self {
            Node::Unary(u) => u.decided_prefix,
            Node::Binary(b) => b.bit,
        }
    }

    fn finalized(&self) -> bool {
        match self {
            Node::Unary(u) => u.snow.finalized(),
            Node::Binary(b) => b.snow.finalized(),
        }
    }

    fn add(&mut self, choice: Id, params: &Parameters, factory: &dyn Factory) {
        let index = match self {
            Node::Unary(u) => {
                if u.snow.finalized() {
                    // Only a terminal leaf is ever finalized in place.
                    return;
                }
                match first_difference_subset(
                    u.decided_prefix,
                    u.common_prefix,
                    &u.preference,
                    &choice,
                ) {
                    Some(index) => index,
                    None => {
                        // The choice agrees with this whole run; any
                        // disagreement further down is the child's to
                        // resolve. No child means a duplicate add.
                        if let Some(child) = &mut u.child {
                            child.add(choice, params, factory);
                        }
                        return;
                    }
                }
            }
            Node::Binary(b) => {
                // An absent child means this node decides bit 255, where
                // both branches are already fully specified.
                let bit = choice.bit(b.bit) as usize;
                if let Some(child) = &mut b.children[bit] {
                    child.add(choice, params, factory);
                }
                return;
            }
        };
        if let Node::Unary(u) = std::mem::take(self) {
            *self = u.split(index, choice, params, factory);
        }
    }

    /// Applies a filtered poll to this sub-tree. Returns whether the votes
    /// met the preference threshold here; a node whose counter finalized is
    /// replaced by the winning child on return.
    fn record_poll(&mut self, votes: &Bag<Id>, reset: bool, params: &Parameters) -> bool {
        let (collapsed, successful) = match self {
            Node::Unary(u) => u.record_poll(votes, reset, params),
            Node::Binary(b) => b.record_poll(votes, reset, params),
        };
        if let Some(child) = collapsed {
            *self = *child;
        }
        successful
    }

    fn render(&self, out: &mut String, depth: usize) {
        use std::fmt::Write;

        let pad = "    ".repeat(depth);
        match self {
            Node::Unary(u) => {
                let _ = writeln!(
                    out,
                    "{}{} Bits = [{}, {})",
                    pad, u.snow, u.decided_prefix, u.common_prefix
                );
                if let Some(child) = &u.child {
                    child.render(out, depth + 1);
                }
            }
            Node::Binary(b) => {
                let _ = writeln!(out, "{}{} Bit = {}", pad, b.snow, b.bit);
                // Historical ordering: the bit-1 branch prints first.
                if let Some(child) = &b.children[1] {
                    child.render(out, depth + 1);
                }
                if let Some(child) = &b.children[0] {
                    child.render(out, depth + 1);
                }
            }
        }
    }
}

impl UnaryNode {
    /// Splits this run at `index`, the first bit where `choice` disagrees
    /// with the preference, placing a binary instance there.
    ///
    /// The shape of the rewrite depends on where `index` falls:
    /// - the run is a single bit: the binary takes this node's place;
    /// - the first bit: the binary is pushed above this node;
    /// - the last bit: the binary is pushed below this node;
    /// - an interior bit: the run is cut in two around the binary, the
    ///   upper half keeping a copy of the counter.
    fn split(
        mut self,
        index: usize,
        choice: Id,
        params: &Parameters,
        factory: &dyn Factory,
    ) -> Node {
        let bit = self.preference.bit(index) as usize;

        let mut preferences = [Id::default(); 2];
        preferences[bit] = self.preference;
        preferences[1 - bit] = choice;
        let mut b = BinaryNode {
            preferences,
            bit: index,
            snow: self.snow.extend(bit),
            should_reset: [self.should_reset; 2],
            children: [None, None],
        };

        let new_child = UnaryNode {
            preference: choice,
            // The new branch assumes the disputed bit resolves in its favor.
            decided_prefix: index + 1,
            common_prefix: NUM_BITS,
            snow: factory.new_unary(*params),
            should_reset: false,
            child: None,
        };

        if self.decided_prefix == self.common_prefix - 1 {
            // The run was a single bit, so the binary takes this node's
            // place. Without a child both branches are fully specified by
            // the preferences alone and no leaves are attached.
            b.children[bit] = self.child.take();
            if b.children[bit].is_some() {
                b.children[1 - bit] = Some(Box::new(Node::Unary(new_child)));
            }
            Node::Binary(b)
        } else if index == self.decided_prefix {
            // Split on the first bit of the run.
            self.decided_prefix += 1;
            b.children[bit] = Some(Box::new(Node::Unary(self)));
            b.children[1 - bit] = Some(Box::new(Node::Unary(new_child)));
            Node::Binary(b)
        } else if index == self.common_prefix - 1 {
            // Split on the last bit of the run.
            self.common_prefix -= 1;
            b.children[bit] = self.child.take();
            if b.children[bit].is_some() {
                b.children[1 - bit] = Some(Box::new(Node::Unary(new_child)));
            }
            self.child = Some(Box::new(Node::Binary(b)));
            Node::Unary(self)
        } else {
            // Split on an interior bit: the bits above the disputed one
            // become a separate run keeping a copy of the counter.
            let mut outer = UnaryNode {
                preference: self.preference,
                decided_prefix: self.decided_prefix,
                common_prefix: index,
                snow: self.snow.clone(),
                should_reset: false,
                child: None,
            };
            self.decided_prefix = index + 1;
            b.children[bit] = Some(Box::new(Node::Unary(self)));
            b.children[1 - bit] = Some(Box::new(Node::Unary(new_child)));
            outer.child = Some(Box::new(Node::Binary(b)));
            Node::Unary(outer)
        }
    }

    fn record_poll(
        &mut self,
        votes: &Bag<Id>,
        reset: bool,
        params: &Parameters,
    ) -> (Option<Box<Node>>, bool) {
        if reset {
            // The parent did not reach a majority previously, so neither
            // did this sub-tree.
            self.snow.record_unsuccessful_poll();
            self.should_reset = true;
        }

        let num_votes = votes.len();
        if num_votes < params.alpha_preference {
            self.snow.record_unsuccessful_poll();
            self.should_reset = true;
            return (None, false);
        }
        self.snow.record_poll(num_votes);

        if let Some(child) = &mut self.child {
            // The votes need no further filtering: everything under this
            // node agrees on [decided_prefix, common_prefix), and the
            // child's decided prefix equals common_prefix.
            child.record_poll(votes, self.should_reset, params);
        }
        if self.snow.finalized() {
            if let Some(child) = self.child.take() {
                // This instance has decided; the child carries the rest.
                return (Some(child), true);
            }
        } else if let Some(child) = &self.child {
            // The child may have switched preference.
            self.preference = child.preference();
        }
        self.should_reset = false;
        (None, true)
    }
}

impl BinaryNode {
    fn record_poll(
        &mut self,
        votes: &Bag<Id>,
        reset: bool,
        params: &Parameters,
    ) -> (Option<Box<Node>>, bool) {
        let split_votes = votes.split(|id| id.bit(self.bit) == 1);

        // Only the branch that can still reach a preference majority
        // matters this round.
        let bit = if split_votes[1].len() >= params.alpha_preference { 1 } else { 0 };

        if reset {
            self.snow.record_unsuccessful_poll();
            self.should_reset[bit] = true;
        }
        // The losing branch fell short of the threshold this round.
        self.should_reset[1 - bit] = true;

        let pruned_votes = &split_votes[bit];
        let num_votes = pruned_votes.len();
        if num_votes < params.alpha_preference {
            self.snow.record_unsuccessful_poll();
            self.should_reset[bit] = true;
            return (None, false);
        }
        self.snow.record_poll(num_votes, bit);

        if let Some(child) = &mut self.children[bit] {
            child.record_poll(pruned_votes, self.should_reset[bit], params);
        }
        if self.snow.finalized() {
            if let Some(child) = self.children[bit].take() {
                // Deciding here means deciding on `bit`, so that branch's
                // child carries the rest.
                return (Some(child), true);
            }
        } else if let Some(child) = &self.children[bit] {
            self.preferences[bit] = child.preference();
        }
        self.should_reset[bit] = false;
        (None, true)
    }
}
