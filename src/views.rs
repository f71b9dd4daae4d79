//! Server-rendered pages.
//!
//! Titles, tags, usernames and query strings are always escaped. Note content
//! is rendered as stored in listings (notes may carry markup and are only ever
//! shown to their owner) and escaped inside form fields.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::{
    flash::Flash,
    models::{Note, NoteFilter, NoteView, SearchType},
};

fn layout(title: &str, username: Option<&str>, flashes: &[Flash], body: &str) -> String {
    let nav = match username {
        Some(name) => format!(
            r#"<a href="/">Notes</a> <a href="/saved">Saved</a> <a href="/notes/new">New note</a>
        <span class="user">{name}</span> <a href="/logout">Log out</a>"#,
            name = text(name),
        ),
        None => r#"<a href="/login">Log in</a> <a href="/register">Register</a>"#.to_string(),
    };

    let messages = flashes
        .iter()
        .map(|f| {
            format!(
                r#"<div class="flash flash-{}">{}</div>"#,
                f.category.as_str(),
                text(&f.message)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>{title} - Capture</title>
</head>
<body>
    <nav>
        {nav}
    </nav>
    {messages}
    <main>
{body}
    </main>
</body>
</html>"#,
        title = text(title),
    )
}

fn search_form(filter: &NoteFilter) -> String {
    let query = filter.query.as_deref().unwrap_or("");
    let selected = |t: SearchType| if filter.search_type == t { " selected" } else { "" };
    format!(
        r#"<form method="get" action="{action}" class="search">
    <input type="text" name="query" value="{query}" placeholder="Search">
    <select name="search_type">
        <option value="title"{title_sel}>Title</option>
        <option value="tags"{tags_sel}>Tags</option>
    </select>
    <button type="submit">Search</button>
</form>"#,
        action = filter.view.path(),
        query = attr(query),
        title_sel = selected(SearchType::Title),
        tags_sel = selected(SearchType::Tags),
    )
}

fn note_card(note: &Note, view: NoteView) -> String {
    let tags = note
        .tags
        .as_deref()
        .map(|t| format!(r#"<p class="tags">{}</p>"#, text(t)))
        .unwrap_or_default();
    let save_link = match view {
        NoteView::Home => format!(r#" <a href="/notes/save/{}">Save</a>"#, note.id),
        NoteView::Saved => String::new(),
    };
    format!(
        r#"<article class="note">
    <h2>{title}</h2>
    <div class="content">{content}</div>
    {tags}
    <p class="actions"><a href="/notes/{id}">Edit</a> <a href="/notes/delete/{id}">Delete</a>{save_link}</p>
</article>"#,
        title = text(&note.title),
        content = note.content,
        id = note.id,
    )
}

/// `/` and `/saved`.
pub fn notes_page(
    username: &str,
    filter: &NoteFilter,
    notes: &[Note],
    flashes: &[Flash],
) -> String {
    let heading = match filter.view {
        NoteView::Home => "Notes",
        NoteView::Saved => "Saved notes",
    };
    let list = if notes.is_empty() {
        r#"<p class="empty">No notes found.</p>"#.to_string()
    } else {
        notes
            .iter()
            .map(|n| note_card(n, filter.view))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let body = format!("<h1>{heading}</h1>\n{}\n{list}", search_form(filter));
    layout(heading, Some(username), flashes, &body)
}

fn note_form(action: &str, title: &str, content: &str, tags: &str, submit: &str) -> String {
    format!(
        r#"<form method="post" action="{action}">
    <label>Title <input type="text" name="title" value="{title}" maxlength="100" required></label>
    <label>Content <textarea name="content" required>{content}</textarea></label>
    <label>Tags <input type="text" name="tags" value="{tags}" maxlength="100"></label>
    <button type="submit">{submit}</button>
</form>"#,
        title = attr(title),
        content = text(content),
        tags = attr(tags),
    )
}

/// `GET /notes/new`.
pub fn new_note_page(username: &str, flashes: &[Flash]) -> String {
    let body = format!(
        "<h1>New note</h1>\n{}",
        note_form("/notes/new", "", "", "", "Create")
    );
    layout("New note", Some(username), flashes, &body)
}

/// `GET /notes/{id}`.
pub fn edit_note_page(username: &str, note: &Note, flashes: &[Flash]) -> String {
    let action = format!("/notes/{}", note.id);
    let body = format!(
        "<h1>Edit note</h1>\n{}",
        note_form(
            &action,
            &note.title,
            &note.content,
            note.tags.as_deref().unwrap_or(""),
            "Update"
        )
    );
    layout("Edit note", Some(username), flashes, &body)
}

fn credentials_page(heading: &str, action: &str, flashes: &[Flash]) -> String {
    let body = format!(
        r#"<h1>{heading}</h1>
<form method="post" action="{action}">
    <label>Username <input type="text" name="username" maxlength="150" required></label>
    <label>Password <input type="password" name="password" required></label>
    <button type="submit">{heading}</button>
</form>"#
    );
    layout(heading, None, flashes, &body)
}

pub fn login_page(flashes: &[Flash]) -> String {
    credentials_page("Log in", "/login", flashes)
}

pub fn register_page(flashes: &[Flash]) -> String {
    credentials_page("Register", "/register", flashes)
}

pub fn error_page(heading: &str, message: &str) -> String {
    let body = format!("<h1>{}</h1>\n<p>{}</p>", text(heading), text(message));
    layout(heading, None, &[], &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{flash::FlashCategory, models::SearchParams};

    fn note() -> Note {
        Note {
            id: 7,
            title: "<script>x</script>".into(),
            content: "<b>bold</b>".into(),
            tags: Some("a&b".into()),
            ..Note::default()
        }
    }

    #[test]
    fn listing_escapes_title_and_tags_but_keeps_content_markup() {
        let filter = NoteFilter::new(NoteView::Home, SearchParams::default());
        let html = notes_page("alice", &filter, &[note()], &[]);
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(html.contains("a&amp;b"));
        assert!(html.contains("<b>bold</b>"));
        assert!(html.contains("/notes/save/7"));
    }

    #[test]
    fn saved_listing_has_no_save_link() {
        let filter = NoteFilter::new(NoteView::Saved, SearchParams::default());
        let html = notes_page("alice", &filter, &[note()], &[]);
        assert!(!html.contains("/notes/save/7"));
    }

    #[test]
    fn edit_form_escapes_content() {
        let html = edit_note_page("alice", &note(), &[]);
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(html.contains(r#"action="/notes/7""#));
    }

    #[test]
    fn flashes_are_rendered_with_category() {
        let flashes = [Flash {
            category: FlashCategory::Error,
            message: "Invalid username or password.".into(),
        }];
        let html = login_page(&flashes);
        assert!(html.contains(r#"class="flash flash-error""#));
        assert!(html.contains("Invalid username or password."));
    }

    #[test]
    fn search_query_is_echoed_escaped() {
        let filter = NoteFilter::new(
            NoteView::Home,
            SearchParams {
                query: Some("\"q\"".into()),
                search_type: Some("tags".into()),
            },
        );
        let html = notes_page("alice", &filter, &[], &[]);
        assert!(html.contains(r#"value="&quot;q&quot;""#));
        assert!(html.contains(r#"<option value="tags" selected>"#));
        assert!(html.contains("No notes found."));
    }
}
