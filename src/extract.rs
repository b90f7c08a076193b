//! Verbatim extraction of C# method declarations.
//!
//! tree-sitter keeps exact byte spans for every node, comments included, so a
//! declaration is returned as a slice of the source text. The node span is
//! widened with the surrounding trivia the way Roslyn assigns it: leading
//! comments, blank lines and indentation belong to the member, and so does
//! the rest of the member's last line up to and including its line break.

use crate::error::QueryMiss;
use anyhow::Result;
use tree_sitter::{Node, Parser, Tree};
use tracing::warn;

/// File extensions parsed by this extractor.
pub const SOURCE_EXTENSIONS: &[&str] = &["cs", "csx"];

const TYPE_KINDS: &[&str] = &[
    "class_declaration",
    "struct_declaration",
    "interface_declaration",
    "record_declaration",
    "record_struct_declaration",
];
const METHOD_KIND: &str = "method_declaration";
const COMMENT_KIND: &str = "comment";

pub fn handles_extension(ext: &str) -> bool {
    SOURCE_EXTENSIONS
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(ext))
}

pub struct SyntaxExtractor {
    parser: Parser,
}

impl SyntaxExtractor {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_c_sharp::LANGUAGE;
        parser.set_language(&language.into())?;
        Ok(Self { parser })
    }

    pub fn parse(&mut self, source: &str) -> Option<Tree> {
        let tree = self.parser.parse(source, None);
        if tree.is_none() {
            warn!("parser produced no tree for {} bytes of source", source.len());
        }
        tree
    }

    /// Returns the exact text of the first method `member_name` declared
    /// directly in the first type named `type_name` (pre-order). Overloads
    /// and duplicate type names resolve to the first occurrence.
    pub fn extract_declaration(
        &mut self,
        source: &str,
        type_name: &str,
        member_name: &str,
    ) -> Result<String, QueryMiss> {
        let Some(tree) = self.parse(source) else {
            return Err(QueryMiss::TypeNotFound(type_name.to_string()));
        };
        let type_node = find_type(tree.root_node(), source, type_name)
            .ok_or_else(|| QueryMiss::TypeNotFound(type_name.to_string()))?;
        let method = find_method(type_node, source, member_name).ok_or_else(|| {
            QueryMiss::MemberNotFound {
                type_name: type_name.to_string(),
                member: member_name.to_string(),
            }
        })?;
        let (start, end) = full_span(method, source);
        Ok(source[start..end].to_string())
    }
}

fn find_type<'t>(node: Node<'t>, source: &str, type_name: &str) -> Option<Node<'t>> {
    if TYPE_KINDS.contains(&node.kind()) && identifier(node, source) == Some(type_name) {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if let Some(found) = find_type(child, source, type_name) {
            return Some(found);
        }
    }
    None
}

fn find_method<'t>(type_node: Node<'t>, source: &str, member_name: &str) -> Option<Node<'t>> {
    let body = type_node.child_by_field_name("body")?;
    let mut cursor = body.walk();
    let found = body
        .named_children(&mut cursor)
        .find(|child| child.kind() == METHOD_KIND && identifier(*child, source) == Some(member_name));
    found
}

fn identifier<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    node.child_by_field_name("name")
        .and_then(|name| name.utf8_text(source.as_bytes()).ok())
}

fn full_span(node: Node<'_>, source: &str) -> (usize, usize) {
    (leading_start(node, source), trailing_end(node, source))
}

fn leading_start(node: Node<'_>, source: &str) -> usize {
    let bytes = source.as_bytes();
    let mut first = node;
    let mut prev = node.prev_sibling();
    while let Some(sibling) = prev {
        if sibling.kind() != COMMENT_KIND || trails_previous_member(sibling) {
            break;
        }
        first = sibling;
        prev = sibling.prev_sibling();
    }
    let floor = match prev {
        Some(token) => token.end_byte(),
        None => node.parent().map(|parent| parent.start_byte()).unwrap_or(0),
    };
    let anchor = first.start_byte();
    let mut start = anchor;
    while start > floor && matches!(bytes[start - 1], b' ' | b'\t' | b'\r' | b'\n') {
        start -= 1;
    }
    // The previous token keeps its own line, up to and including the break.
    match first_line_break_end(&bytes[start..anchor]) {
        Some(offset) => start + offset,
        None => anchor,
    }
}

/// A comment on the same line as the end of the previous named member is
/// that member's trailing comment.
fn trails_previous_member(comment: Node<'_>) -> bool {
    comment.prev_sibling().is_some_and(|owner| {
        owner.is_named()
            && owner.kind() != COMMENT_KIND
            && owner.end_position().row == comment.start_position().row
    })
}

fn trailing_end(node: Node<'_>, source: &str) -> usize {
    let bytes = source.as_bytes();
    let last_row = node.end_position().row;
    let mut last = node;
    while let Some(next) = last.next_sibling() {
        if next.kind() != COMMENT_KIND || next.start_position().row != last_row {
            break;
        }
        last = next;
    }
    let ceiling = last
        .next_sibling()
        .map(|next| next.start_byte())
        .unwrap_or(bytes.len());
    let mut end = last.end_byte();
    while end < ceiling && matches!(bytes[end], b' ' | b'\t') {
        end += 1;
    }
    if end < ceiling && bytes[end] == b'\r' {
        end += 1;
        if end < ceiling && bytes[end] == b'\n' {
            end += 1;
        }
    } else if end < ceiling && bytes[end] == b'\n' {
        end += 1;
    }
    end
}

fn first_line_break_end(bytes: &[u8]) -> Option<usize> {
    let idx = bytes.iter().position(|b| *b == b'\n' || *b == b'\r')?;
    if bytes[idx] == b'\r' && bytes.get(idx + 1) == Some(&b'\n') {
        Some(idx + 2)
    } else {
        Some(idx + 1)
    }
}
