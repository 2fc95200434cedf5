use crate::parser::{AccessType, DdfTree};
use crate::syncml;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// One executable MDM command, as persisted in the output catalog.
///
/// Field names are part of the output contract and must stay stable.
/// Optional source metadata serializes as the empty string when absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandRecord {
    #[serde(rename = "OMA_URI")]
    pub oma_uri: String,

    #[serde(rename = "NodeName")]
    pub node_name: String,

    #[serde(rename = "Description")]
    pub description: String,

    #[serde(rename = "MinimumOS")]
    pub minimum_os: String,

    #[serde(rename = "SourceFile")]
    pub source_file: String,

    /// Rendered SyncML <Exec> fragment, present only when payload
    /// rendering is enabled
    #[serde(rename = "Exec", skip_serializing_if = "Option::is_none")]
    pub exec_payload: Option<Vec<String>>,
}

/// Walks parsed DDF trees and produces a [`CommandRecord`] for every node
/// whose access set contains Exec.
pub struct CommandCollector {
    inherit: bool,
    payloads: bool,
}

impl CommandCollector {
    pub fn new() -> Self {
        Self {
            inherit: true,
            payloads: false,
        }
    }

    /// Inherit Description/OsBuildVersion from the nearest ancestor when a
    /// command node lacks them (on by default)
    pub fn with_inheritance(mut self, inherit: bool) -> Self {
        self.inherit = inherit;
        self
    }

    /// Attach a rendered SyncML <Exec> fragment to every record
    pub fn with_payloads(mut self, payloads: bool) -> Self {
        self.payloads = payloads;
        self
    }

    /// Append this tree's command records to the accumulator, in document
    /// order
    pub fn collect(&self, tree: &DdfTree, out: &mut Vec<CommandRecord>) {
        let before = out.len();

        // Arena order is document pre-order, which keeps first-seen
        // ordering deterministic.
        for id in 0..tree.len() {
            let node = tree.node(id);
            if !node.has_access(AccessType::Exec) {
                continue;
            }

            let oma_uri = reconstruct_uri(tree, id);
            let description = self
                .lookup(tree, id, |n| n.description.as_deref())
                .unwrap_or_default();
            let minimum_os = self
                .lookup(tree, id, |n| n.os_build.as_deref())
                .unwrap_or_default();

            let exec_payload = self.payloads.then(|| {
                let df_format = self.lookup(tree, id, |n| n.df_format.as_deref());
                let default_value = self.lookup(tree, id, |n| n.default_value.as_deref());
                syncml::build_exec_payload(&oma_uri, df_format.as_deref(), default_value.as_deref())
            });

            out.push(CommandRecord {
                oma_uri,
                node_name: node.name.clone(),
                description,
                minimum_os,
                source_file: tree.source_file.clone(),
                exec_payload,
            });
        }

        debug!(
            "Collected {} commands from {}",
            out.len() - before,
            tree.source_file
        );
    }

    /// Read a field off the node, falling back to the nearest ancestor
    /// value when inheritance is enabled
    fn lookup<'a>(
        &self,
        tree: &'a DdfTree,
        id: usize,
        field: impl Fn(&'a crate::parser::DdfNode) -> Option<&'a str>,
    ) -> Option<String> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = tree.node(current);
            if let Some(value) = field(node) {
                return Some(value.to_string());
            }
            if !self.inherit {
                return None;
            }
            cursor = node.parent;
        }
        None
    }
}

impl Default for CommandCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Rebuild a node's OMA-URI bottom-up through parent links.
///
/// DDF stores only local names and nesting; the absolute path has to be
/// reassembled by collecting name segments upward until a node that
/// declares an explicit Path (the per-document root anchor, e.g.
/// "./Device/Vendor/MSFT") or the top of the tree is reached.
fn reconstruct_uri(tree: &DdfTree, id: usize) -> String {
    let mut segments: Vec<&str> = Vec::new();
    let mut cursor = id;

    let anchor = loop {
        let node = tree.node(cursor);
        if !node.name.is_empty() {
            segments.push(&node.name);
        }
        if let Some(path) = node.path.as_deref() {
            break Some(path);
        }
        match node.parent {
            Some(parent) => cursor = parent,
            None => break None,
        }
    };

    segments.reverse();
    let joined = segments.join("/");

    match anchor {
        Some(prefix) if !prefix.is_empty() => {
            if joined.is_empty() {
                prefix.trim_end_matches('/').to_string()
            } else if prefix.ends_with('/') {
                format!("{}{}", prefix, joined)
            } else {
                format!("{}/{}", prefix, joined)
            }
        }
        _ => joined,
    }
}

/// Collapse records with identical (OMA_URI, SourceFile) pairs to their
/// first occurrence, preserving order. Records sharing a URI across
/// different source files are distinct and all survive.
pub fn dedupe(records: Vec<CommandRecord>) -> Vec<CommandRecord> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert((record.oma_uri.clone(), record.source_file.clone())))
        .collect()
}
