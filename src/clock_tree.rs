//! Collection of the clock buffers that drive each scan cell
//!
//! The clock path of a scan cell is followed from the driver of its clock pin towards the clock
//! root. Single-input elements and clock gating cells are followed; any other element with
//! several inputs stops the walk with an error diagnostic, and the path found so far is kept.

use std::hash::Hash;

use fxhash::{FxHashMap, FxHashSet};

/// Kind of an element of the clock tree, with the element driving it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClockElement<N> {
    /// Single-input element such as a buffer or an inverter; `None` at the clock root
    Buffer(Option<N>),
    /// Clock gating cell, with the driver of its clock input
    GatingCell(Option<N>),
    /// Element with several inputs that is not a gating cell
    Other,
}

/// Access to the clock network of a netlist
pub trait ClockTree {
    /// Cell type of the netlist
    type Node: Hash + Eq + Clone + std::fmt::Debug;

    /// Element driving the clock pin of a scan cell
    fn clock_driver(&self, scan_cell: &Self::Node) -> Option<Self::Node>;

    /// Kind and driver of a clock tree element
    fn element(&self, node: &Self::Node) -> ClockElement<Self::Node>;

    /// Returns whether the node is a pseudo cell or a primary input, rather than a placed buffer
    fn is_pseudo(&self, node: &Self::Node) -> bool;
}

/// Collect the clock path of a scan cell, from its clock pin towards the root
///
/// The result includes pseudo cells; see [`collect_clock_buffers`] for the filtered version.
pub fn clock_path<T: ClockTree>(tree: &T, scan_cell: &T::Node) -> Vec<T::Node> {
    let mut path = Vec::new();
    let mut visited = FxHashSet::default();
    let mut next = tree.clock_driver(scan_cell);
    while let Some(node) = next.take() {
        if !visited.insert(node.clone()) {
            tracing::error!(node = ?node, "Loop in clock tree, terminating here");
            break;
        }
        path.push(node.clone());
        match tree.element(&node) {
            ClockElement::Buffer(driver) | ClockElement::GatingCell(driver) => next = driver,
            ClockElement::Other => {
                tracing::error!(node = ?node, "Found odd gate in clock tree, terminating here");
            }
        }
    }
    path
}

/// Clock buffers of the scan cells of a design
#[derive(Clone, Debug)]
pub struct ClockBufferInfo<N: Hash + Eq> {
    per_scan_cell: FxHashMap<N, Vec<N>>,
    all_buffers: Vec<N>,
}

impl<N: Hash + Eq + Clone> ClockBufferInfo<N> {
    /// Placed clock buffers driving a scan cell, from the clock pin towards the root
    pub fn buffers(&self, scan_cell: &N) -> &[N] {
        self.per_scan_cell
            .get(scan_cell)
            .map(|b| b.as_slice())
            .unwrap_or(&[])
    }

    /// All placed clock buffers, in first-seen order
    pub fn all_buffers(&self) -> &[N] {
        &self.all_buffers
    }

    /// Number of scan cells
    pub fn nb_scan_cells(&self) -> usize {
        self.per_scan_cell.len()
    }

    /// Largest number of clock buffers driving a single scan cell
    pub fn max_buffers_per_scan_cell(&self) -> usize {
        self.per_scan_cell.values().map(|b| b.len()).max().unwrap_or(0)
    }
}

/// Collect the placed clock buffers of all scan cells of the chains
pub fn collect_clock_buffers<T: ClockTree>(
    tree: &T,
    chains: &[Vec<T::Node>],
) -> ClockBufferInfo<T::Node> {
    let mut per_scan_cell = FxHashMap::default();
    let mut all_buffers = Vec::new();
    let mut seen = FxHashSet::default();
    for cell in chains.iter().flatten() {
        let mut buffers = Vec::new();
        for b in clock_path(tree, cell) {
            if tree.is_pseudo(&b) || buffers.contains(&b) {
                continue;
            }
            if seen.insert(b.clone()) {
                all_buffers.push(b.clone());
            }
            buffers.push(b);
        }
        per_scan_cell.insert(cell.clone(), buffers);
    }
    let ret = ClockBufferInfo {
        per_scan_cell,
        all_buffers,
    };
    tracing::info!(
        buffers = ret.all_buffers.len(),
        scan_cells = ret.nb_scan_cells(),
        max_per_scan_cell = ret.max_buffers_per_scan_cell(),
        "Clock buffers collected"
    );
    ret
}

#[cfg(test)]
pub(crate) mod tests {
    use fxhash::FxHashMap;

    use super::{clock_path, collect_clock_buffers, ClockElement, ClockTree};

    /// Clock network given by explicit drivers
    #[derive(Default)]
    pub struct TestTree {
        pub clock_pins: FxHashMap<&'static str, &'static str>,
        pub elements: FxHashMap<&'static str, ClockElement<&'static str>>,
        pub pseudo: Vec<&'static str>,
    }

    impl ClockTree for TestTree {
        type Node = &'static str;

        fn clock_driver(&self, scan_cell: &&'static str) -> Option<&'static str> {
            self.clock_pins.get(scan_cell).copied()
        }

        fn element(&self, node: &&'static str) -> ClockElement<&'static str> {
            self.elements
                .get(node)
                .cloned()
                .unwrap_or(ClockElement::Buffer(None))
        }

        fn is_pseudo(&self, node: &&'static str) -> bool {
            self.pseudo.contains(node)
        }
    }

    /// Two scan cells behind a gating cell, one behind an odd gate
    pub fn gated_tree() -> TestTree {
        let mut t = TestTree::default();
        t.clock_pins.insert("ff0", "b1");
        t.clock_pins.insert("ff1", "b2");
        t.clock_pins.insert("ff2", "and");
        t.elements.insert("b1", ClockElement::Buffer(Some("cg")));
        t.elements.insert("b2", ClockElement::Buffer(Some("cg")));
        t.elements.insert("cg", ClockElement::GatingCell(Some("b0")));
        t.elements.insert("b0", ClockElement::Buffer(Some("clock")));
        t.elements.insert("and", ClockElement::Other);
        t.pseudo.push("clock");
        t
    }

    #[test]
    fn test_path() {
        let t = gated_tree();
        assert_eq!(clock_path(&t, &"ff0"), vec!["b1", "cg", "b0", "clock"]);
        assert_eq!(clock_path(&t, &"ff2"), vec!["and"]);
        assert!(clock_path(&t, &"ff9").is_empty());
    }

    #[test]
    fn test_loop() {
        let mut t = TestTree::default();
        t.clock_pins.insert("ff", "a");
        t.elements.insert("a", ClockElement::Buffer(Some("b")));
        t.elements.insert("b", ClockElement::Buffer(Some("a")));
        assert_eq!(clock_path(&t, &"ff"), vec!["a", "b"]);
    }

    #[test]
    fn test_collect() {
        let t = gated_tree();
        let info = collect_clock_buffers(&t, &[vec!["ff0", "ff1"], vec!["ff2"]]);
        assert_eq!(info.buffers(&"ff0"), &["b1", "cg", "b0"]);
        assert_eq!(info.buffers(&"ff1"), &["b2", "cg", "b0"]);
        assert_eq!(info.buffers(&"ff2"), &["and"]);
        assert_eq!(info.all_buffers(), &["b1", "cg", "b0", "b2", "and"]);
        assert_eq!(info.nb_scan_cells(), 3);
        assert_eq!(info.max_buffers_per_scan_cell(), 3);
    }
}
