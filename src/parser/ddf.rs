use super::tree::{AccessType, DdfNode, DdfTree};
use miette::Diagnostic;
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::debug;

/// Per-file parse failure. The batch reports it and moves on; it never
/// aborts the run.
#[derive(Debug, Error, Diagnostic)]
pub enum DdfError {
    #[error("malformed XML in {file} near byte {position}")]
    #[diagnostic(code(ddfscan::parser::malformed))]
    Malformed {
        file: String,
        position: usize,
        #[source]
        source: quick_xml::Error,
    },
}

/// Parser for DDF XML documents.
///
/// Builds an arena tree of every `<Node>` under `<MgmtTree>`, annotated with
/// the DFProperties metadata the schema declares. Tag matching is by local
/// name, so namespace prefixes are ignored.
pub struct DdfParser;

impl DdfParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse one document into its node tree.
    ///
    /// A document without a `<MgmtTree>` element yields an empty tree;
    /// malformed markup yields [`DdfError::Malformed`].
    pub fn parse(&self, source_file: &str, contents: &str) -> Result<DdfTree, DdfError> {
        let mut reader = Reader::from_str(contents);
        reader.trim_text(true);

        let mut tree = DdfTree::new(source_file);
        // Stack of open ancestor element local names (lowercased)
        let mut elems: Vec<String> = Vec::new();
        // Stack of open <Node> arena indices
        let mut open_nodes: Vec<usize> = Vec::new();
        let mut in_tree = false;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let tag = lowercase_local_name(e.local_name().as_ref());
                    self.open_element(&tag, &elems, &mut tree, &mut open_nodes, &mut in_tree, true);
                    elems.push(tag);
                }
                Ok(Event::Empty(ref e)) => {
                    let tag = lowercase_local_name(e.local_name().as_ref());
                    self.open_element(&tag, &elems, &mut tree, &mut open_nodes, &mut in_tree, false);
                }
                Ok(Event::End(ref e)) => {
                    let tag = lowercase_local_name(e.local_name().as_ref());
                    elems.pop();
                    if tag == "node" && in_tree && is_tree_position(&elems) {
                        open_nodes.pop();
                    } else if tag == "mgmttree" {
                        in_tree = false;
                    }
                }
                Ok(Event::Text(ref t)) => {
                    let text = match t.unescape() {
                        Ok(text) => text.into_owned(),
                        Err(source) => {
                            return Err(DdfError::Malformed {
                                file: source_file.to_string(),
                                position: reader.buffer_position(),
                                source,
                            })
                        }
                    };
                    self.assign_text(&text, &elems, &mut tree, &open_nodes);
                }
                Ok(Event::CData(ref t)) => {
                    let text = String::from_utf8_lossy(t).into_owned();
                    self.assign_text(&text, &elems, &mut tree, &open_nodes);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(source) => {
                    return Err(DdfError::Malformed {
                        file: source_file.to_string(),
                        position: reader.buffer_position(),
                        source,
                    })
                }
            }
            buf.clear();
        }

        debug!("Parsed {}: {} nodes", source_file, tree.len());
        Ok(tree)
    }

    /// Handle an opening tag. `will_nest` is false for self-closing elements,
    /// which never enclose content and therefore never join the open stacks.
    fn open_element(
        &self,
        tag: &str,
        elems: &[String],
        tree: &mut DdfTree,
        open_nodes: &mut Vec<usize>,
        in_tree: &mut bool,
        will_nest: bool,
    ) {
        if tag == "mgmttree" {
            if will_nest {
                *in_tree = true;
            }
            return;
        }

        // A <Node> is a tree node only directly under MgmtTree or another
        // Node; <DFFormat><node/> reuses the same tag as a data-type leaf.
        if tag == "node" && *in_tree && is_tree_position(elems) {
            let id = tree.push(DdfNode::new(open_nodes.last().copied()));
            if will_nest {
                open_nodes.push(id);
            }
            return;
        }

        let Some(&current) = open_nodes.last() else {
            return;
        };

        // <DFProperties><AccessType><Exec/><Get/>...
        if stack_ends_with(elems, &["dfproperties", "accesstype"]) {
            if let Some(capability) = AccessType::from_token(tag) {
                let node = tree.node_mut(current);
                if !node.access.contains(&capability) {
                    node.access.push(capability);
                }
            }
            return;
        }

        // <DFFormat><chr/> encodes the data type as a leaf tag
        if stack_ends_with(elems, &["dfproperties", "dfformat"]) {
            tree.node_mut(current).df_format = Some(tag.to_string());
        }
    }

    /// Route a text payload to the field the enclosing element path selects
    fn assign_text(&self, text: &str, elems: &[String], tree: &mut DdfTree, open_nodes: &[usize]) {
        let Some(&current) = open_nodes.last() else {
            return;
        };
        let cleaned = clean_text(text);
        if cleaned.is_empty() {
            return;
        }
        let node = tree.node_mut(current);

        if stack_ends_with(elems, &["node", "nodename"]) {
            node.name = cleaned;
        } else if stack_ends_with(elems, &["node", "path"]) {
            node.path = Some(cleaned);
        } else if stack_ends_with(elems, &["dfproperties", "description"]) {
            append_text(&mut node.description, &cleaned);
        } else if stack_ends_with(elems, &["dfproperties", "applicability", "osbuildversion"]) {
            node.os_build = Some(cleaned);
        } else if stack_ends_with(elems, &["dfproperties", "defaultvalue"]) {
            node.default_value = Some(cleaned);
        } else if stack_ends_with(elems, &["dfproperties", "dfformat"]) {
            node.df_format = Some(cleaned.to_ascii_lowercase());
        } else if stack_ends_with(elems, &["dfproperties", "accesstype"]) {
            // Tolerate text-form capability lists like "Get, Exec"
            for token in cleaned.split(|c: char| c.is_whitespace() || c == ',') {
                if let Some(capability) = AccessType::from_token(token) {
                    if !node.access.contains(&capability) {
                        node.access.push(capability);
                    }
                }
            }
        }
    }
}

impl Default for DdfParser {
    fn default() -> Self {
        Self::new()
    }
}

fn lowercase_local_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).to_ascii_lowercase()
}

/// Collapse all interior whitespace runs to single spaces and trim
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Accumulate mixed Text/CDATA chunks into one normalized value
fn append_text(slot: &mut Option<String>, text: &str) {
    match slot {
        Some(existing) => {
            existing.push(' ');
            existing.push_str(text);
        }
        None => *slot = Some(text.to_string()),
    }
}

/// True when the innermost open element can directly contain tree nodes
fn is_tree_position(elems: &[String]) -> bool {
    matches!(
        elems.last().map(String::as_str),
        Some("mgmttree") | Some("node")
    )
}

fn stack_ends_with(elems: &[String], suffix: &[&str]) -> bool {
    elems.len() >= suffix.len()
        && elems[elems.len() - suffix.len()..]
            .iter()
            .zip(suffix)
            .all(|(a, b)| a == b)
}
