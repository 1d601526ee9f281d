use dot_writer::{Attributes, DotWriter};

use super::Node;

/// Escape characters that are structural in record labels.
fn escape_record(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '{' | '}' | '|' | '<' | '>' | '"' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Render a parse forest into a Graphviz graph.
///
/// Each node is a record of its id and text; edges run from parent to child,
/// in child order.
pub fn render_forest(roots: &[Node]) -> Vec<u8> {
    let mut outbuf = Vec::new();
    {
        let mut writer = DotWriter::from(&mut outbuf);
        writer.set_pretty_print(false);
        let mut graph = writer.digraph();

        // Preorder walk. Names are assigned in visiting order, so a child's
        // name is known once its parent has been numbered.
        let mut next_name = 0usize;
        let mut stack: Vec<(Option<String>, &Node)> =
            roots.iter().rev().map(|root| (None, root)).collect();
        while let Some((parent, it)) = stack.pop() {
            let name = format!("n{next_name}");
            next_name += 1;

            {
                let mut node = graph.node_named(&name);
                node.set_shape(dot_writer::Shape::Record);
                node.set_label(&format!("{{{}|{}}}", it.id(), escape_record(it.text())));
            }
            if let Some(parent) = parent {
                graph.edge(&parent, &name);
            }
            for child in it.children().iter().rev() {
                stack.push((Some(name.clone()), child));
            }
        }
    }
    outbuf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Symbol, SymbolId};

    #[test]
    fn renders_nodes_and_edges() {
        let roots = vec![
            Node::branch(
                SymbolId(4),
                vec![
                    Node::leaf(Symbol::new(1, "Javier")),
                    Node::leaf(Symbol::new(2, "Carlos")),
                ],
            ),
            Node::leaf(Symbol::new(3, "Jesus")),
        ];
        let out = String::from_utf8(render_forest(&roots)).unwrap();
        assert!(out.starts_with("digraph"), "unexpected output: {out}");
        for label in ["{4|4}", "{1|Javier}", "{2|Carlos}", "{3|Jesus}"] {
            assert!(out.contains(label), "missing {label} in {out}");
        }
        let compact: String = out.split_whitespace().collect();
        assert!(compact.contains("n0->n1"), "missing edge in {out}");
        assert!(compact.contains("n0->n2"), "missing edge in {out}");
        assert!(!compact.contains("->n3"), "root should have no parent: {out}");
    }

    #[test]
    fn escapes_record_syntax() {
        assert_eq!(escape_record("a|b{c}"), r"a\|b\{c\}");
    }
}
