use pulldown_cmark::{html, Event, Options, Parser, Tag};

/// The marker separating a post's summary from the rest of its body.
pub const FOLD_TAG: &str = "<!-- more -->";

/// Converts a post body from Markdown to HTML, appending to `out`.
pub fn to_html(out: &mut String, markdown: &str) {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    html::push_html(out, Parser::new_ext(markdown, options).map(convert));
}

/// Returns the part of a rendered body above [`FOLD_TAG`] and whether the
/// body was folded at all.
pub fn summary(body: &str) -> (&str, bool) {
    match body.find(FOLD_TAG) {
        Some(i) => (&body[..i], true),
        None => (body, false),
    }
}

fn convert(ev: Event) -> Event {
    match ev {
        Event::Start(tag) => Event::Start(convert_tag(tag)),
        Event::End(tag) => Event::End(convert_tag(tag)),
        _ => ev,
    }
}

// The post title is the page's top heading, so headings in the body are
// demoted one level (`#` becomes h2).
fn convert_tag(tag: Tag) -> Tag {
    match tag {
        Tag::Heading(level) => Tag::Heading((level + 1).min(6)),
        _ => tag,
    }
}
