//! The call-tree record attached to every tracked wrapper.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One positional argument of a recorded call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HistoryArg {
    /// A literal parameter, rendered verbatim.
    Literal(String),
    /// The history of a single wrapper input.
    Node(History),
    /// The histories of a sequence input, in stream order.
    Seq(Vec<History>),
}

/// A call-tree node: operation name, positional args, keyword args.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub operation: String,
    pub args: Vec<HistoryArg>,
    pub kwargs: BTreeMap<String, String>,
}

impl History {
    /// Start a record for `operation`.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            args: Vec::new(),
            kwargs: BTreeMap::new(),
        }
    }

    /// Append the history of a single wrapper input.
    ///
    /// An input that carries no history yet is recorded as a leaf named
    /// `"<unknown>"` so the tree shape still reflects the call.
    pub fn push_input(mut self, input: Option<History>) -> Self {
        self.args.push(HistoryArg::Node(
            input.unwrap_or_else(|| History::new("<unknown>")),
        ));
        self
    }

    /// Append the histories of a sequence input.
    pub fn push_inputs(mut self, inputs: Vec<History>) -> Self {
        self.args.push(HistoryArg::Seq(inputs));
        self
    }

    /// Append a literal positional parameter.
    pub fn push_literal(mut self, value: impl fmt::Display) -> Self {
        self.args.push(HistoryArg::Literal(value.to_string()));
        self
    }

    /// Record a keyword parameter.
    pub fn push_kwarg(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.kwargs.insert(key.into(), value.to_string());
        self
    }

    /// True if `name` appears as an operation anywhere in the tree.
    pub fn mentions(&self, name: &str) -> bool {
        if self.operation == name {
            return true;
        }
        self.args.iter().any(|a| match a {
            HistoryArg::Literal(_) => false,
            HistoryArg::Node(h) => h.mentions(name),
            HistoryArg::Seq(hs) => hs.iter().any(|h| h.mentions(name)),
        })
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "    ".repeat(indent);
        if self.args.is_empty() && self.kwargs.is_empty() {
            return write!(f, "{pad}{}()", self.operation);
        }
        writeln!(f, "{pad}{}(", self.operation)?;
        for arg in &self.args {
            match arg {
                HistoryArg::Literal(v) => writeln!(f, "{pad}    {v},")?,
                HistoryArg::Node(h) => {
                    h.render(f, indent + 1)?;
                    writeln!(f, ",")?;
                }
                HistoryArg::Seq(hs) => {
                    writeln!(f, "{pad}    [")?;
                    for h in hs {
                        h.render(f, indent + 2)?;
                        writeln!(f, ",")?;
                    }
                    writeln!(f, "{pad}    ],")?;
                }
            }
        }
        for (k, v) in &self.kwargs {
            writeln!(f, "{pad}    {k}={v},")?;
        }
        write!(f, "{pad})")
    }
}

impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_tree_contains_all_operations() {
        let load_a = History::new("load").push_literal("'a.json'");
        let load_b = History::new("load").push_literal("'b.json'");
        let merged = History::new("merge").push_inputs(vec![load_a, load_b]);
        let stacked = History::new("stack")
            .push_inputs(vec![merged])
            .push_kwarg("sample", "'ttbar'");

        let rendered = stacked.to_string();
        assert!(rendered.contains("stack("));
        assert!(rendered.contains("merge("));
        assert!(rendered.contains("load("));
        assert!(rendered.contains("'b.json'"));
        assert!(rendered.contains("sample='ttbar'"));
    }

    #[test]
    fn test_mentions_walks_nested_args() {
        let h = History::new("div")
            .push_input(Some(History::new("sum")))
            .push_input(Some(History::new("integral").push_kwarg("weighted", true)));
        assert!(h.mentions("div"));
        assert!(h.mentions("sum"));
        assert!(h.mentions("integral"));
        assert!(!h.mentions("stack"));
    }

    #[test]
    fn test_missing_input_history_becomes_unknown_leaf() {
        let h = History::new("lumi").push_input(None);
        assert!(h.to_string().contains("<unknown>"));
    }

    #[test]
    fn test_leaf_renders_as_bare_call() {
        assert_eq!(History::new("load").to_string(), "load()");
    }
}
