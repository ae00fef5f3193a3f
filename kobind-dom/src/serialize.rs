use crate::tree::{Document, Element, NodeData, NodeId, Quote};

impl Document {
    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        self.inner_html(self.root())
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &c in self.children(id) {
            self.write_node(c, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            NodeData::Document => {
                for &c in self.children(id) {
                    self.write_node(c, out);
                }
            }
            NodeData::Element(e) => {
                write_start_tag(e, out);
                if e.is_void() || e.self_closing {
                    return;
                }
                for &c in self.children(id) {
                    self.write_node(c, out);
                }
                out.push_str("</");
                out.push_str(&e.tag);
                out.push('>');
            }
            NodeData::Text(raw) => out.push_str(raw),
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::Doctype(text) => {
                out.push_str("<!");
                out.push_str(text);
                out.push('>');
            }
        }
    }
}

fn write_start_tag(e: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&e.tag);
    for a in &e.attrs {
        out.push(' ');
        out.push_str(&a.name);
        if let Some(raw) = &a.raw {
            out.push('=');
            match a.quote {
                Quote::Double => {
                    out.push('"');
                    out.push_str(raw);
                    out.push('"');
                }
                Quote::Single => {
                    out.push('\'');
                    out.push_str(raw);
                    out.push('\'');
                }
                Quote::Bare => out.push_str(raw),
            }
        }
    }
    if e.self_closing {
        out.push_str(" />");
    } else {
        out.push('>');
    }
}
