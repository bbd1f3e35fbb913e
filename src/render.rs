use crate::catalog::{AdjacentChapter, Catalog, Volume};
use crate::formats::Book;

const BOTTOM_PADDING: &str = "<br /><br />";
const CLASS_BOOKS: &str = "books";
const CLASS_BUTTON: &str = "btn";
const CLASS_CHAPTER: &str = "chapter";
const CLASS_NAV_HEADING: &str = "navheading";
const CLASS_NEXT_PREV: &str = "nextprev";
const CLASS_VOLUME: &str = "volume";
const DIV_SCRIPTURES_NAVIGATOR: &str = "scripnav";
pub const TEXT_TOP_LEVEL: &str = "The Scriptures";
pub const TEXT_CHAPTER_FAILURE: &str = "Unable to retrieve chapter contents.";

pub fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn element(tag: &str, content: &str) -> String {
    format!("<{tag}>{content}</{tag}>")
}

fn div(id: Option<&str>, class: Option<&str>, content: &str) -> String {
    let id = id
        .map(|id| format!(r#" id="{}""#, html_escape(id)))
        .unwrap_or_default();
    let class = class
        .map(|class| format!(r#" class="{}""#, html_escape(class)))
        .unwrap_or_default();
    format!("<div{id}{class}>{content}</div>")
}

fn link(id: Option<&str>, class: Option<&str>, href: &str, content: &str) -> String {
    let id = id
        .map(|id| format!(r#" id="{}""#, html_escape(id)))
        .unwrap_or_default();
    let class = class
        .map(|class| format!(r#" class="{}""#, html_escape(class)))
        .unwrap_or_default();
    format!(r#"<a{id}{class} href="{}">{content}</a>"#, html_escape(href))
}

fn list_item(text: &str) -> String {
    element("li", &html_escape(text))
}

fn list_item_link(text: &str, href: &str) -> String {
    element("li", &link(None, None, href, &html_escape(text)))
}

/// Volume headings, each followed by a button per book. Renders only
/// `only` when given.
pub fn volumes_grid(catalog: &Catalog, only: Option<&Volume>) -> String {
    let mut content = String::new();
    for volume in catalog.volumes() {
        if only.is_some_and(|only| only.id != volume.id) {
            continue;
        }

        let heading = format!(
            r#"<a name="v{}" />{}"#,
            volume.id,
            element("h5", &html_escape(&volume.full_name))
        );
        content.push_str(&div(None, Some(CLASS_VOLUME), &heading));
        content.push_str(&div(None, Some(CLASS_BOOKS), &books_grid_content(catalog, volume)));
    }
    content.push_str(BOTTOM_PADDING);

    div(Some(DIV_SCRIPTURES_NAVIGATOR), None, &content)
}

fn books_grid_content(catalog: &Catalog, volume: &Volume) -> String {
    catalog
        .books_in(volume)
        .map(|book| {
            link(
                Some(&book.id.to_string()),
                Some(CLASS_BUTTON),
                &format!("#{}:{}", volume.id, book.id),
                &html_escape(&book.grid_name),
            )
        })
        .collect()
}

/// Book heading followed by a button per chapter.
pub fn chapters_grid(book: &Book) -> String {
    let chapter_class = format!("{CLASS_BUTTON} {CLASS_CHAPTER}");
    let buttons: String = (1..=book.num_chapters)
        .map(|chapter| {
            link(
                Some(&chapter.to_string()),
                Some(&chapter_class),
                &format!("#0:{}:{chapter}", book.id),
                &chapter.to_string(),
            )
        })
        .collect();

    let content = div(
        None,
        Some(CLASS_VOLUME),
        &element("h5", &html_escape(&book.full_name)),
    ) + &div(None, Some(CLASS_BOOKS), &buttons);

    div(Some(DIV_SCRIPTURES_NAVIGATOR), None, &content)
}

/// Link trail down to the deepest given level, which renders as text.
/// A chapter of `0` means the book itself is the deepest level.
pub fn breadcrumbs(volume: Option<&Volume>, book: Option<&Book>, chapter: Option<u32>) -> String {
    let mut crumbs = String::new();

    match volume {
        None => crumbs.push_str(&list_item(TEXT_TOP_LEVEL)),
        Some(volume) => {
            crumbs.push_str(&list_item_link(TEXT_TOP_LEVEL, "#"));
            match book {
                None => crumbs.push_str(&list_item(&volume.full_name)),
                Some(book) => {
                    crumbs.push_str(&list_item_link(
                        &volume.full_name,
                        &format!("#{}", volume.id),
                    ));
                    match chapter.filter(|chapter| *chapter > 0) {
                        None => crumbs.push_str(&list_item(&book.toc_name)),
                        Some(chapter) => {
                            crumbs.push_str(&list_item_link(
                                &book.toc_name,
                                &format!("#{}:{}", volume.id, book.id),
                            ));
                            crumbs.push_str(&list_item(&chapter.to_string()));
                        }
                    }
                }
            }
        }
    }

    element("ul", &crumbs)
}

pub fn next_prev_links(
    previous: Option<&AdjacentChapter>,
    next: Option<&AdjacentChapter>,
) -> Option<String> {
    if previous.is_none() && next.is_none() {
        return None;
    }

    let mut links = String::new();
    for (adjacent, text) in [(previous, "Prev"), (next, "Next")] {
        if let Some(adjacent) = adjacent {
            links.push_str(&format!(
                r#"<a href="{}" title="{}">{text}</a>"#,
                html_escape(&adjacent.hash()),
                html_escape(&adjacent.title)
            ));
        }
    }
    Some(div(None, Some(CLASS_NEXT_PREV), &links))
}

/// Appends prev/next links inside every `navheading` element of the chapter
/// markup.
pub fn inject_chapter_nav(
    chapter_html: &str,
    previous: Option<&AdjacentChapter>,
    next: Option<&AdjacentChapter>,
) -> String {
    match next_prev_links(previous, next) {
        Some(links) => append_to_class(chapter_html, CLASS_NAV_HEADING, &links),
        None => chapter_html.to_owned(),
    }
}

/// Inserts `fragment` right before the closing tag of every element whose
/// class list contains `class`.
fn append_to_class(html: &str, class: &str, fragment: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let mut insert_at = Vec::new();

    let mut pos = 0usize;
    while let Some(rel) = lower[pos..].find('<') {
        let start = pos + rel;
        let Some(tag_end_rel) = lower[start..].find('>') else {
            break;
        };
        let tag_end = start + tag_end_rel;
        pos = tag_end + 1;

        let tag = &html[start + 1..tag_end];
        let name: String = tag
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        if name.is_empty() || tag.trim_end().ends_with('/') {
            continue;
        }
        if !class_attribute(tag).is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
        {
            continue;
        }
        if let Some(close) = matching_close_tag(&lower, pos, &name) {
            insert_at.push(close);
        }
    }

    if insert_at.is_empty() {
        return html.to_owned();
    }

    insert_at.sort_unstable();
    let mut out = String::with_capacity(html.len() + insert_at.len() * fragment.len());
    let mut last = 0usize;
    for at in insert_at {
        out.push_str(&html[last..at]);
        out.push_str(fragment);
        last = at;
    }
    out.push_str(&html[last..]);
    out
}

fn class_attribute(tag: &str) -> Option<&str> {
    let lower = tag.to_ascii_lowercase();
    let mut search = 0usize;
    while let Some(rel) = lower[search..].find("class") {
        let at = search + rel;
        search = at + "class".len();
        let preceded_by_space = at > 0 && lower.as_bytes()[at - 1].is_ascii_whitespace();
        let rest = tag[search..].trim_start();
        if !preceded_by_space || !rest.starts_with('=') {
            continue;
        }
        let value = rest[1..].trim_start();
        let quote = value.chars().next()?;
        if quote == '"' || quote == '\'' {
            let end = value[1..].find(quote)?;
            return Some(&value[1..1 + end]);
        }
        let end = value
            .find(|ch: char| ch.is_whitespace() || ch == '/')
            .unwrap_or(value.len());
        return Some(&value[..end]);
    }
    None
}

/// Byte offset of the `</name>` closing the element whose content starts at
/// `from`.
fn matching_close_tag(lower: &str, from: usize, name: &str) -> Option<usize> {
    let open = format!("<{name}");
    let close = format!("</{name}");
    let mut depth = 1usize;
    let mut pos = from;

    loop {
        let next_close = pos + lower[pos..].find(&close)?;
        let next_open = lower[pos..next_close]
            .match_indices(&open)
            .map(|(idx, _)| pos + idx)
            .find(|&idx| {
                lower[idx + open.len()..]
                    .chars()
                    .next()
                    .is_some_and(|ch| ch.is_whitespace() || ch == '>' || ch == '/')
            });

        match next_open {
            Some(open_at) => {
                depth += 1;
                pos = open_at + open.len();
            }
            None => {
                depth -= 1;
                if depth == 0 {
                    return Some(next_close);
                }
                pos = next_close + close.len();
            }
        }
    }
}
