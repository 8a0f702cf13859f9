//! Markdown rendering for `.md` entries
//!
//! Inline HTML in the source passes through untouched. The renderer adds no
//! scripts of its own; headings get generated `id` attributes so that
//! fragment links work.

use pulldown_cmark::{html, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::collections::HashMap;

fn options() -> Options {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);
    opts.insert(Options::ENABLE_FOOTNOTES);
    opts.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    opts
}

/// Render markdown to an HTML fragment
pub fn render_fragment(source: &str) -> String {
    let mut events: Vec<Event<'_>> = Parser::new_ext(source, options()).collect();
    assign_heading_ids(&mut events);

    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// Render markdown to a complete HTML document
pub fn render_document(source: &str) -> String {
    format!(
        "<html>\n  <body>\n    {}\n  </body>\n</html>",
        render_fragment(source)
    )
}

/// Give every heading without an explicit `{#id}` a slug of its text
fn assign_heading_ids(events: &mut [Event<'_>]) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut idx = 0;
    while idx < events.len() {
        let needs_id = matches!(&events[idx], Event::Start(Tag::Heading { id: None, .. }));
        if needs_id {
            let mut text = String::new();
            for event in &events[idx + 1..] {
                match event {
                    Event::End(TagEnd::Heading(_)) => break,
                    Event::Text(t) | Event::Code(t) => text.push_str(t),
                    _ => {}
                }
            }
            let base = heading_slug(&text);
            let count = seen.entry(base.clone()).or_insert(0);
            let id = if *count == 0 { base } else { format!("{}-{}", base, count) };
            *count += 1;

            if let Event::Start(Tag::Heading { level, classes, attrs, .. }) = &events[idx] {
                let (level, classes, attrs): (HeadingLevel, _, _) =
                    (*level, classes.clone(), attrs.clone());
                events[idx] = Event::Start(Tag::Heading {
                    level,
                    id: Some(CowStr::from(id)),
                    classes,
                    attrs,
                });
            }
        }
        idx += 1;
    }
}

fn heading_slug(text: &str) -> String {
    let slug = slug::slugify(text);
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}
