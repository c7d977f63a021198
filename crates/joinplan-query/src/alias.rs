//! Stable table aliases.
//!
//! An alias is derived from the table identity alone, so the same logical
//! query renders the same SQL on every build and in every process.

use std::collections::HashMap;

use joinplan_core::TableId;

use crate::graph::{NodeId, QueryGraph};

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

fn fnv1a(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(FNV_OFFSET, |hash, &b| (hash ^ u32::from(b)).wrapping_mul(FNV_PRIME))
}

/// Alias for a table identity: `t` followed by eight hex digits.
pub fn table_alias(id: &TableId) -> String {
    format!("t{:08x}", fnv1a(id.as_str().as_bytes()))
}

/// Aliases for every node of one graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    aliases: HashMap<NodeId, String>,
}

impl AliasMap {
    /// Assign aliases in node insertion order. Hash collisions get a numeric
    /// suffix.
    pub fn for_graph(graph: &QueryGraph) -> Self {
        let mut aliases = HashMap::with_capacity(graph.len());
        let mut taken: HashMap<String, usize> = HashMap::new();
        for node in graph.node_ids() {
            let base = table_alias(graph.node(node).id());
            let seen = taken.entry(base.clone()).or_insert(0);
            let alias = if *seen == 0 { base } else { format!("{}_{}", base, seen) };
            *seen += 1;
            aliases.insert(node, alias);
        }
        Self { aliases }
    }

    /// Alias of `node`.
    pub fn get(&self, node: NodeId) -> Option<&str> {
        self.aliases.get(&node).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
