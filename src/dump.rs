//! Plain-text rendering of a computed layout

use std::fmt;

use crate::layout::{Connection, PedigreeLayout, PersonId};

fn join(ids: &[PersonId]) -> String {
    ids.iter().map(PersonId::as_str).collect::<Vec<_>>().join(", ")
}

/// Display adapter listing rows, nodes and connections, one item per line
pub struct TextDump<'a>(pub &'a PedigreeLayout);

impl fmt::Display for TextDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = self.0;
        writeln!(f, "width: {:.1}", layout.width)?;

        for (r, row) in layout.rows.iter().enumerate() {
            let slots = layout.row_slot_count.get(r).copied().unwrap_or(0);
            writeln!(f, "row {} (slots: {})", r, slots)?;
            for node in row {
                writeln!(
                    f,
                    "  [{}] {} x={:.1} size={:.1}x{:.1}",
                    node.column, node.id, node.x, node.width, node.height
                )?;
            }
        }

        if layout.connections.is_empty() {
            return writeln!(f, "connections: none");
        }
        writeln!(f, "connections:")?;
        for connection in &layout.connections {
            match connection {
                Connection::Couple(c) => {
                    write!(f, "  couple {} + {} slot {}", c.id1, c.id2, c.slot)?;
                    if let Some(slot) = c.children_slot {
                        write!(f, " children slot {}: {}", slot, join(&c.children))?;
                    }
                    writeln!(f)?;
                }
                Connection::SingleParent(s) => writeln!(
                    f,
                    "  single {} children slot {}: {}",
                    s.id1,
                    s.children_slot,
                    join(&s.children)
                )?,
            }
        }
        Ok(())
    }
}

/// List rows, nodes and connections of a layout, one item per line
pub fn render_text(layout: &PedigreeLayout) -> String {
    TextDump(layout).to_string()
}
