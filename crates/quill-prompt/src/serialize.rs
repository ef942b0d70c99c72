//! Compact tagged-text rendering of project entities
//!
//! Each entity becomes one element: identifying fields as attributes, prose
//! as the body. Attribute values are escaped; bodies are passed through as
//! written by the author.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use quill_core::text::{clip, word_count};
use quill_core::{
    Chapter, Character, Location, Outline, ProjectMeta, StyleGuideEntry, TimelineEvent, WorldbuildingDoc,
};

use crate::context::{ContextBundle, ContextScope};

/// Per-document content ceiling inside the worldbuilding tree, in characters
pub const WORLDBUILDING_CONTENT_LIMIT: usize = 2048;

/// Escape a value for use inside a double-quoted attribute
pub fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\n' | '\r' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Opening tag with the given attributes; `None` values are omitted
fn open_tag(name: &str, attrs: &[(&str, Option<&str>)]) -> String {
    let mut tag = format!("<{name}");
    for (key, value) in attrs {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            let _ = write!(tag, " {key}=\"{}\"", escape_attr(value));
        }
    }
    tag.push('>');
    tag
}

/// Element with labelled body lines; an element without body is self-closed
fn element(name: &str, attrs: &[(&str, Option<&str>)], body: &[(&str, Option<&str>)]) -> String {
    let lines: Vec<String> = body
        .iter()
        .filter_map(|(label, value)| {
            let value = value.map(str::trim).filter(|v| !v.is_empty())?;
            Some(if label.is_empty() {
                value.to_owned()
            } else {
                format!("{label}: {value}")
            })
        })
        .collect();

    let open = open_tag(name, attrs);
    if lines.is_empty() {
        let mut tag = open;
        tag.insert_str(tag.len() - 1, " /");
        return tag;
    }
    format!("{open}\n{}\n</{name}>", lines.join("\n"))
}

pub fn serialize_project(project: &ProjectMeta) -> String {
    let target = project.target_word_count.map(|n| n.to_string());
    element(
        "project",
        &[
            ("title", Some(project.title.as_str())),
            ("author", project.author.as_deref()),
            ("genre", project.genre.as_deref()),
            ("pov", project.point_of_view.as_deref()),
            ("tense", project.tense.as_deref()),
            ("target-words", target.as_deref()),
        ],
        &[("", project.synopsis.as_deref())],
    )
}

pub fn serialize_character(character: &Character) -> String {
    element(
        "character",
        &[
            ("id", Some(character.id.as_str())),
            ("name", Some(character.name.as_str())),
            ("role", character.role.as_deref()),
        ],
        &[
            ("Description", character.description.as_deref()),
            ("Backstory", character.backstory.as_deref()),
            ("Goals", character.goals.as_deref()),
            ("Notes", character.notes.as_deref()),
        ],
    )
}

pub fn serialize_location(location: &Location) -> String {
    element(
        "location",
        &[
            ("id", Some(location.id.as_str())),
            ("name", Some(location.name.as_str())),
            ("type", location.kind.as_deref()),
        ],
        &[
            ("", location.description.as_deref()),
            ("Notes", location.notes.as_deref()),
        ],
    )
}

pub fn serialize_timeline_event(event: &TimelineEvent) -> String {
    let characters = event.character_ids.join(",");
    element(
        "event",
        &[
            ("id", Some(event.id.as_str())),
            ("title", Some(event.title.as_str())),
            ("date", event.date.as_deref()),
            ("characters", Some(characters.as_str())),
            ("location", event.location_id.as_deref()),
        ],
        &[("", event.description.as_deref())],
    )
}

pub fn serialize_style_guide_entry(entry: &StyleGuideEntry) -> String {
    element(
        "style-rule",
        &[
            ("id", Some(entry.id.as_str())),
            ("title", Some(entry.title.as_str())),
            ("category", entry.category.as_deref()),
        ],
        &[("", Some(entry.content.as_str()))],
    )
}

/// Render worldbuilding documents as a nested tree
///
/// Documents whose parent is missing are treated as roots. Each document's
/// content is capped at [`WORLDBUILDING_CONTENT_LIMIT`] characters.
pub fn serialize_worldbuilding(docs: &[WorldbuildingDoc]) -> String {
    if docs.is_empty() {
        return String::new();
    }

    let ids: HashSet<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    let mut children: HashMap<&str, Vec<&WorldbuildingDoc>> = HashMap::new();
    let mut roots = Vec::new();
    for doc in docs {
        match doc.parent_id.as_deref().filter(|p| ids.contains(p) && *p != doc.id) {
            Some(parent) => children.entry(parent).or_default().push(doc),
            None => roots.push(doc),
        }
    }

    let mut out = String::from("<worldbuilding>\n");
    let mut visited = HashSet::new();
    for root in roots {
        write_doc(&mut out, root, &children, &mut visited, 1);
    }
    // Documents caught in a parent cycle are never reached from a root
    for doc in docs {
        if !visited.contains(doc.id.as_str()) {
            write_doc(&mut out, doc, &children, &mut visited, 1);
        }
    }
    out.push_str("</worldbuilding>");
    out
}

fn write_doc<'a>(
    out: &mut String,
    doc: &'a WorldbuildingDoc,
    children: &HashMap<&str, Vec<&'a WorldbuildingDoc>>,
    visited: &mut HashSet<&'a str>,
    depth: usize,
) {
    if !visited.insert(doc.id.as_str()) {
        return;
    }

    let indent = "  ".repeat(depth);
    let _ = writeln!(
        out,
        "{indent}{}",
        open_tag("doc", &[("id", Some(doc.id.as_str())), ("title", Some(doc.title.as_str()))])
    );
    // The cap counts stored characters, surrounding whitespace included
    let clipped = clip(&doc.content, WORLDBUILDING_CONTENT_LIMIT);
    let content = clipped.trim();
    if !content.is_empty() {
        let _ = writeln!(out, "{content}");
    }
    for &child in children.get(doc.id.as_str()).into_iter().flatten() {
        write_doc(out, child, children, visited, depth + 1);
    }
    let _ = writeln!(out, "{indent}</doc>");
}

/// Render the outline grid, one row per line with cells separated by `|`
pub fn serialize_outline(outline: &Outline) -> String {
    if outline.rows.is_empty() {
        return String::new();
    }

    let columns = outline.columns.join(" | ");
    let mut out = format!("{}\n", open_tag("outline", &[("columns", Some(columns.as_str()))]));
    for row in &outline.rows {
        let cells = row.cells.iter().map(|c| c.trim()).collect::<Vec<_>>().join(" | ");
        let _ = writeln!(
            out,
            "{}{cells}</row>",
            open_tag("row", &[("title", Some(row.title.as_str())), ("chapter", row.chapter_id.as_deref())])
        );
    }
    out.push_str("</outline>");
    out
}

/// Chapter list with summaries and word counts; bodies are never included
pub fn serialize_chapter_list(chapters: &[Chapter]) -> String {
    if chapters.is_empty() {
        return String::new();
    }

    let mut out = String::from("<chapters>\n");
    for chapter in chapters {
        let order = chapter.order.to_string();
        let words = word_count(&chapter.content).to_string();
        let _ = writeln!(
            out,
            "{}",
            element(
                "chapter",
                &[
                    ("id", Some(chapter.id.as_str())),
                    ("order", Some(order.as_str())),
                    ("title", Some(chapter.title.as_str())),
                    ("status", chapter.status.as_deref()),
                    ("words", Some(words.as_str())),
                ],
                &[("", chapter.summary.as_deref())],
            )
        );
    }
    out.push_str("</chapters>");
    out
}

/// Render a whole bundle inside a `<project-context>` element
pub fn serialize_context(bundle: &ContextBundle<'_>, scope: ContextScope) -> String {
    let mut sections = vec![serialize_project(bundle.project)];

    let mut push_group = |name: &str, items: Vec<String>| {
        if !items.is_empty() {
            sections.push(format!("<{name}>\n{}\n</{name}>", items.join("\n")));
        }
    };

    if scope == ContextScope::Full {
        push_group("characters", bundle.characters.iter().map(serialize_character).collect());
        push_group("locations", bundle.locations.iter().map(serialize_location).collect());
    }
    push_group("style-guide", bundle.style_guide.iter().map(serialize_style_guide_entry).collect());

    if scope == ContextScope::Full {
        push_group("timeline", bundle.timeline.iter().map(serialize_timeline_event).collect());
        sections.push(serialize_worldbuilding(bundle.worldbuilding));
        if let Some(outline) = bundle.outline {
            sections.push(serialize_outline(outline));
        }
        sections.push(serialize_chapter_list(bundle.chapters));
    }

    sections.retain(|s| !s.is_empty());
    format!("<project-context>\n{}\n</project-context>", sections.join("\n"))
}
