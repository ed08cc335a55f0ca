//! Debugging and visualization tools
//!
//! - [`ChartPrinter`] dumps every column, one item per line
//! - [`TreePrinter`] renders a [`ParseTree`] as an indented outline
//! - [`ForestVisualizer`] and [`GrammarVisualizer`] emit GraphViz DOT

use super::forest::{Forest, ParseTree};
use super::grammar::Grammar;
use super::item::{ItemId, Step};
use super::parser::EarleyParser;
use hashbrown::HashSet;
use std::fmt::{self, Write};

/// Column-by-column chart dump
///
/// ```text
/// Column 1 ("a"):
/// 1.0 [ S --> a * S b ], 0, 0.0, <null>, 0
/// ```
pub struct ChartPrinter<'p, 'g> {
    parser: &'p EarleyParser<'g>,
}

impl<'p, 'g> ChartPrinter<'p, 'g> {
    /// Create a printer for `parser`'s chart
    pub fn new(parser: &'p EarleyParser<'g>) -> Self {
        Self { parser }
    }

    /// Write the dump to `sink`
    pub fn write<W: Write>(&self, sink: &mut W) -> fmt::Result {
        write!(sink, "{}", self)
    }

    /// The dump as a string
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ChartPrinter<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grammar = self.parser.grammar();
        for column in self.parser.columns() {
            match column.token() {
                Some(token) => writeln!(f, "Column {} ({:?}):", column.index(), token.text)?,
                None => writeln!(f, "Column {}:", column.index())?,
            }
            for item in column.items(self.parser.arena()) {
                writeln!(f, "{}", item.display(grammar))?;
            }
        }
        Ok(())
    }
}

/// Parse tree printer
pub struct TreePrinter<'g> {
    grammar: &'g Grammar,
    indent: String,
    max_depth: usize,
}

impl<'g> TreePrinter<'g> {
    /// Create a new tree printer
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            indent: "  ".to_string(),
            max_depth: 100,
        }
    }

    /// Set indentation string
    pub fn indent(mut self, indent: &str) -> Self {
        self.indent = indent.to_string();
        self
    }

    /// Set maximum depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Print a parse tree
    pub fn print(&self, tree: &ParseTree) -> String {
        let mut output = String::new();
        self.print_node(tree, 0, &mut output);
        output
    }

    fn print_node(&self, tree: &ParseTree, depth: usize, output: &mut String) {
        let indent = self.indent.repeat(depth);
        if depth > self.max_depth {
            output.push_str(&format!("{}...\n", indent));
            return;
        }
        match tree {
            ParseTree::Node { lhs, children, .. } => {
                output.push_str(&format!("{}{}\n", indent, self.grammar.symbol_name(*lhs)));
                for child in children {
                    self.print_node(child, depth + 1, output);
                }
            }
            ParseTree::Token { terminal, token } => output.push_str(&format!(
                "{}{} {:?} @ {}:{}\n",
                indent,
                self.grammar.symbol_name(*terminal),
                token.text,
                token.location.line,
                token.location.column
            )),
            ParseTree::Substituted { expected, found } => output.push_str(&format!(
                "{}{} <- {:?} (substituted)\n",
                indent,
                self.grammar.symbol_name(*expected),
                found.text
            )),
            ParseTree::Skipped { token } => {
                output.push_str(&format!("{}{:?} (skipped)\n", indent, token.text))
            }
        }
    }
}

/// GraphViz rendering of the item graph reachable from the roots
pub struct ForestVisualizer<'p, 'g> {
    forest: Forest<'p, 'g>,
}

impl<'p, 'g> ForestVisualizer<'p, 'g> {
    /// Create a visualizer for `forest`
    pub fn new(forest: Forest<'p, 'g>) -> Self {
        Self { forest }
    }

    /// Generate a GraphViz DOT diagram
    ///
    /// Solid edges point at predecessors, dashed edges at completed children.
    pub fn to_dot(&self) -> String {
        let grammar = self.forest.grammar();
        let mut output = String::new();
        output.push_str("digraph Forest {\n");
        output.push_str("  rankdir=RL;\n");
        output.push_str("  node [shape=box];\n");

        let roots = self.forest.roots();
        let mut seen: HashSet<ItemId> = roots.iter().copied().collect();
        let mut stack = roots.clone();
        while let Some(id) = stack.pop() {
            let Some(item) = self.forest.item(id) else {
                continue;
            };
            output.push_str(&format!(
                "  \"{}\" [label=\"{}: {}\\ncost {}\"]\n",
                id,
                id,
                grammar.dotted(item.rule, Some(item.dot)),
                item.error_cost
            ));
            for link in &item.links {
                let style = match link.step {
                    Step::Scanned | Step::Completed => "solid",
                    Step::Deleted | Step::Substituted => "dotted",
                };
                output.push_str(&format!(
                    "  \"{}\" -> \"{}\" [style={}]\n",
                    id, link.left, style
                ));
                if seen.insert(link.left) {
                    stack.push(link.left);
                }
                if let Some(right) = link.right {
                    output.push_str(&format!("  \"{}\" -> \"{}\" [style=dashed]\n", id, right));
                    if seen.insert(right) {
                        stack.push(right);
                    }
                }
            }
        }
        for root in &roots {
            output.push_str(&format!(
                "  \"{}\" [style=filled, fillcolor=lightblue]\n",
                root
            ));
        }
        output.push_str("}\n");
        output
    }
}

/// Grammar visualizer
pub struct GrammarVisualizer<'a> {
    grammar: &'a Grammar,
}

impl<'a> GrammarVisualizer<'a> {
    /// Create a new grammar visualizer
    pub fn new(grammar: &'a Grammar) -> Self {
        Self { grammar }
    }

    /// Generate a GraphViz DOT diagram
    ///
    /// Nonterminals are boxes, terminals are ellipses, and each rule is an
    /// edge from its left-hand side to every symbol it uses.
    pub fn to_dot(&self) -> String {
        let g = self.grammar;
        let mut output = String::new();
        output.push_str("digraph Grammar {\n");
        output.push_str("  rankdir=TB;\n");
        for terminal in g.terminals() {
            output.push_str(&format!(
                "  s{} [label={:?}, shape=ellipse]\n",
                terminal,
                g.symbol_name(terminal)
            ));
        }
        for nonterminal in g.nonterminals() {
            output.push_str(&format!(
                "  s{} [label={:?}, shape=box]\n",
                nonterminal,
                g.symbol_name(nonterminal)
            ));
        }
        for (index, rule) in g.rules().iter().enumerate() {
            for (pos, symbol) in rule.rhs.iter().enumerate() {
                output.push_str(&format!(
                    "  s{} -> s{} [label=\"r{}.{}\"]\n",
                    rule.lhs, symbol, index, pos
                ));
            }
        }
        output.push_str(&format!(
            "  s{} [style=filled, fillcolor=lightblue]\n",
            g.start()
        ));
        output.push_str("}\n");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TokenStream;

    fn anbn() -> Grammar {
        Grammar::builder()
            .terminals(["a", "b"])
            .rule("S", ["a", "S", "b"])
            .epsilon("S")
            .build()
            .unwrap()
    }

    #[test]
    fn test_chart_printer() {
        let g = anbn();
        let mut parser = EarleyParser::new(&g);
        let mut tokens = TokenStream::from_chars(&g, "ab").unwrap();
        parser.parse(&mut tokens).unwrap();

        let dump = ChartPrinter::new(&parser).render();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines[0], "Column 0:");
        assert_eq!(lines[1], "0.0 [ S --> * a S b ], 0, null, <null>, 0");
        assert_eq!(lines[2], "0.1 [ S --> * ], 0, null, <null>, 0");
        assert_eq!(lines[3], "Column 1 (\"a\"):");
        assert_eq!(lines[4], "1.0 [ S --> a * S b ], 0, 0.0, <null>, 0");
        assert!(dump.contains("1.3 [ S --> a S * b ], 0, 1.0, <1.2>, 0"));
        assert!(dump.contains("2.0 [ S --> a S b * ], 0, 1.3, <null>, 0"));

        let mut via_parser = String::new();
        parser.print(&mut via_parser).unwrap();
        assert_eq!(via_parser, dump);
        assert_eq!(format!("{}", ChartPrinter::new(&parser)), dump);
    }

    #[test]
    fn test_tree_printer() {
        let g = anbn();
        let mut parser = EarleyParser::new(&g);
        let mut tokens = TokenStream::from_chars(&g, "ab").unwrap();
        parser.parse(&mut tokens).unwrap();
        let tree = parser.forest().unwrap().trees(1).remove(0);

        let output = TreePrinter::new(&g).print(&tree);
        assert_eq!(
            output,
            "S\n  a \"a\" @ 1:1\n  S\n  b \"b\" @ 1:2\n"
        );
        let shallow = TreePrinter::new(&g).indent("-").max_depth(0).print(&tree);
        assert!(shallow.contains("-..."));
    }

    #[test]
    fn test_forest_visualizer() {
        let g = anbn();
        let mut parser = EarleyParser::new(&g);
        let mut tokens = TokenStream::from_chars(&g, "ab").unwrap();
        parser.parse(&mut tokens).unwrap();
        let dot = ForestVisualizer::new(parser.forest().unwrap()).to_dot();
        assert!(dot.starts_with("digraph Forest {"));
        assert!(dot.contains("\"2.0\" -> \"1.3\""));
        assert!(dot.contains("\"1.3\" -> \"1.2\" [style=dashed]"));
    }

    #[test]
    fn test_grammar_visualizer() {
        let g = anbn();
        let dot = GrammarVisualizer::new(&g).to_dot();
        assert!(dot.contains("digraph Grammar"));
        assert!(dot.contains("s3 -> s1 [label=\"r0.0\"]"));
        assert!(dot.contains("s3 [style=filled, fillcolor=lightblue]"));
    }
}
