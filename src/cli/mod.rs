use std::borrow::Cow;

use crate::api::RouterNode;
use crate::identity::{Session, DEFAULT_ROLE};

const MAX_CELL_WIDTH: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// One table cell and the side of its column it sticks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    text: String,
    align: Align,
}

impl Cell {
    pub fn left(text: impl Into<String>) -> Self { Self { text: text.into(), align: Align::Left } }

    pub fn right(text: impl Into<String>) -> Self { Self { text: text.into(), align: Align::Right } }

    /// Numeric ids line up on the right, everything else on the left.
    pub fn auto(text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) { Self::right(text) } else { Self::left(text) }
    }

    fn width(&self) -> usize { self.text.chars().count().min(MAX_CELL_WIDTH) }

    fn render(&self, width: usize) -> String {
        let text = clip(&self.text, width);
        let pad = " ".repeat(width.saturating_sub(text.chars().count()));
        match self.align {
            Align::Left => format!("{}{}", text, pad),
            Align::Right => format!("{}{}", pad, text),
        }
    }
}

fn clip(s: &str, width: usize) -> Cow<'_, str> {
    if s.chars().nth(width).is_none() {
        return Cow::Borrowed(s);
    }
    let kept: String = s.chars().take(width.saturating_sub(1)).collect();
    Cow::Owned(kept + "…")
}

/// Session fields as a two-column table.
pub fn format_session(session: &Session) -> String {
    let yes_no = if session.is_logged_in() { "yes" } else { "no" };
    let rows = vec![
        vec![Cell::left("logged_in"), Cell::left(yes_no)],
        vec![Cell::left("user_id"), Cell::auto(session.user_id.as_str())],
        vec![Cell::left("user_name"), Cell::left(session.user_name.as_str())],
        vec![Cell::left("nick_name"), Cell::left(session.nick_name.as_str())],
        vec![Cell::left("avatar"), Cell::left(session.avatar.as_str())],
        vec![Cell::left("roles"), Cell::left(session.roles.join(", "))],
        vec![Cell::left("permissions"), Cell::left(session.permissions.join(", "))],
    ];
    format_table(&["field", "value"], &rows)
}

/// Set when the server assigned no roles and the session carries the placeholder.
pub fn default_role_notice(session: &Session) -> Option<String> {
    session
        .has_role(DEFAULT_ROLE)
        .then(|| format!("server assigned no roles to '{}'; using {}", session.user_name, DEFAULT_ROLE))
}

/// Boxed ASCII table. Header cells are left-aligned; short rows are padded with blanks.
pub fn format_table(header: &[&str], rows: &[Vec<Cell>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count().min(MAX_CELL_WIDTH)).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.width());
        }
    }

    let rule = format!("+{}+", widths.iter().map(|w| "-".repeat(w + 2)).collect::<Vec<_>>().join("+"));
    let line = |cells: Vec<String>| format!("| {} |", cells.join(" | "));

    let mut out = Vec::with_capacity(rows.len() + 4);
    out.push(rule.clone());
    out.push(line(header.iter().zip(&widths).map(|(h, w)| Cell::left(*h).render(*w)).collect()));
    out.push(rule.clone());
    for row in rows {
        out.push(line(
            widths
                .iter()
                .enumerate()
                .map(|(i, w)| row.get(i).map(|c| c.render(*w)).unwrap_or_else(|| " ".repeat(*w)))
                .collect(),
        ));
    }
    out.push(rule);
    out.join("\n")
}

/// Indented menu tree, one entry per line. Hidden entries and entries the
/// session holds none of the listed permissions for are skipped with their children.
pub fn format_routers(nodes: &[RouterNode], session: &Session) -> String {
    let mut lines = Vec::new();
    walk_routers(nodes, session, 0, &mut lines);
    lines.join("\n")
}

fn visible(node: &RouterNode, session: &Session) -> bool {
    if node.hidden {
        return false;
    }
    match node.meta.as_ref().map(|m| &m.permissions).filter(|p| !p.is_empty()) {
        Some(required) => required.iter().any(|p| session.has_permission(p)),
        None => true,
    }
}

fn walk_routers(nodes: &[RouterNode], session: &Session, depth: usize, out: &mut Vec<String>) {
    for n in nodes.iter().filter(|n| visible(n, session)) {
        out.push(format!("{}- {} [{}]", "  ".repeat(depth), n.title(), n.path));
        walk_routers(&n.children, session, depth + 1, out);
    }
}
