use blog_shared::{api::PostOrdering, thread::ThreadRow, Post, PostStatus, StatusFilter, Tag};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::app::{App, AuthMode, Composer, InputField, View, VimMode};

/// Columns of indentation per reply level.
const INDENT: usize = 2;

pub fn draw(f: &mut Frame, app: &App) {
    // Draw based on current view
    match app.view {
        View::Login => draw_login(f, app),
        View::VerifyingAuth => draw_loading(f, "Verifying authentication..."),
        View::PostList => draw_post_list(f, app),
        View::PostDetail => draw_post_detail(f, app),
        View::MyPosts => draw_my_posts(f, app),
        View::Profile => draw_profile(f, app),
    }

    // Draw error overlay if present
    if let Some(ref error) = app.error_message {
        draw_error_popup(f, error);
    }

    // Draw loading overlay if loading
    if app.loading {
        draw_loading_overlay(f, &app.loading_message);
    }
}

// ============ Login ============

fn draw_login(f: &mut Frame, app: &App) {
    let area = f.area();

    let is_register = app.auth_mode == AuthMode::Register;
    let fields: &[(InputField, &str)] = if is_register {
        &[
            (InputField::Username, " Username "),
            (InputField::Email, " Email "),
            (InputField::Password, " Password "),
            (InputField::ConfirmPassword, " Confirm Password "),
        ]
    } else {
        &[
            (InputField::Username, " Username "),
            (InputField::Password, " Password "),
        ]
    };
    let form_height = fields.len() as u16 * 3 + 6;

    // Center the login form
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Length(form_height),
            Constraint::Percentage(25),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(50),
            Constraint::Percentage(25),
        ])
        .split(vertical[1]);

    let form_area = horizontal[1];

    let title = if is_register { " Register " } else { " Login " };
    let form_block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = form_block.inner(form_area);
    f.render_widget(form_block, form_area);

    let mut constraints: Vec<Constraint> = fields.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Length(2)); // Submit hint
    constraints.push(Constraint::Min(0));

    let form_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(constraints)
        .split(inner);

    for (i, (field, label)) in fields.iter().enumerate() {
        let value = login_value(app, *field);
        let style = if app.login_field == *field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Gray)
        };
        let block = Block::default()
            .title(*label)
            .borders(Borders::ALL)
            .border_style(style);
        let shown = match field {
            InputField::Password | InputField::ConfirmPassword => "*".repeat(value.len()),
            _ => value.to_string(),
        };
        f.render_widget(Paragraph::new(shown).block(block), form_chunks[i]);

        // Set cursor position in insert mode
        if app.vim_mode == VimMode::Insert && app.login_field == *field {
            f.set_cursor_position((
                form_chunks[i].x + 1 + value.chars().count() as u16,
                form_chunks[i].y + 1,
            ));
        }
    }

    let mode_text = match (app.vim_mode, is_register) {
        (VimMode::Normal, false) => "'i' edit | Enter submit | 'r' register | Esc back | 'q' quit",
        (VimMode::Normal, true) => "'i' edit | Enter submit | 'l' login | Esc back | 'q' quit",
        (VimMode::Insert, _) => "Type to enter | Tab next field | Esc normal | Enter submit",
    };
    let hint = Paragraph::new(mode_text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(hint, form_chunks[fields.len()]);
}

fn login_value(app: &App, field: InputField) -> &str {
    match field {
        InputField::Username => &app.login_username,
        InputField::Email => &app.login_email,
        InputField::Password => &app.login_password,
        InputField::ConfirmPassword => &app.login_password_confirm,
    }
}

// ============ Post list ============

fn draw_post_list(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // List
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    draw_header(f, chunks[0], app, "Posts");

    if app.posts.is_empty() {
        let empty = Paragraph::new("No posts found.")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Posts "));
        f.render_widget(empty, chunks[1]);
    } else {
        let items: Vec<ListItem> = app
            .posts
            .iter()
            .map(|post| ListItem::new(post_list_lines(post)))
            .collect();

        let title = post_list_title(
            &app.search_query,
            app.tag_filter.as_ref(),
            app.ordering,
            app.post_count,
            app.page,
        );

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(title),
            )
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("> ");

        let mut state = ListState::default();
        state.select(Some(app.selected_post));
        f.render_stateful_widget(list, chunks[1], &mut state);
    }

    let hints = if app.user.is_some() {
        "Enter: open | n/p: page | /: search | t: tag | o: sort | m: my posts | P: profile | L: logout | q: quit"
    } else {
        "Enter: open | n/p: page | /: search | t: tag | o: sort | R: refresh | a: login | q: quit"
    };
    draw_status_bar(f, chunks[2], app, hints);

    if app.searching {
        draw_search_popup(f, app);
    }
}

fn post_list_title(
    search: &str,
    tag: Option<&Tag>,
    ordering: PostOrdering,
    count: u64,
    page: u32,
) -> String {
    let mut title = String::from(" Posts");
    if !search.is_empty() {
        title.push_str(&format!(" matching \"{}\"", search));
    }
    if let Some(tag) = tag {
        title.push_str(&format!(" in #{}", tag.name));
    }
    format!("{} ({}) · {} · page {} ", title, count, ordering.label(), page)
}

fn post_list_lines(post: &Post) -> Vec<Line<'_>> {
    let mut title = vec![Span::styled(
        post.title.as_str(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )];
    if post.status == PostStatus::Draft {
        title.push(Span::styled(" [draft]", Style::default().fg(Color::Yellow)));
    }
    if post.is_bookmarked {
        title.push(Span::styled(" ★", Style::default().fg(Color::Yellow)));
    }

    let meta = format!(
        "  by {} · {} min read · ♥ {} · {} comments · {} views",
        post.author.username,
        post.reading_time,
        post.likes_count,
        post.comments_count,
        post.views_count
    );

    vec![
        Line::from(title),
        Line::from(Span::styled(meta, Style::default().fg(Color::DarkGray))),
        Line::from(Span::styled(
            format!("  {}", post.summary(100)),
            Style::default().fg(Color::Gray),
        )),
    ]
}

fn draw_search_popup(f: &mut Frame, app: &App) {
    let area = centered_rect(50, 15, f.area());

    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" Search posts ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    let input = Paragraph::new(app.search_query.as_str()).block(block);
    f.render_widget(input, area);

    f.set_cursor_position((inner.x + app.search_query.chars().count() as u16, inner.y));
}

// ============ Post detail ============

fn draw_post_detail(f: &mut Frame, app: &App) {
    let Some(post) = app.current_post.as_ref() else {
        draw_loading(f, "Loading post...");
        return;
    };

    let composer_height = if app.composer.is_some() { 5 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),               // Header
            Constraint::Percentage(40),          // Post body
            Constraint::Min(5),                  // Comments
            Constraint::Length(composer_height), // Composer
            Constraint::Length(1),               // Status bar
        ])
        .split(f.area());

    draw_header(f, chunks[0], app, &post.title);
    draw_post_body(f, chunks[1], post);
    draw_comments(f, chunks[2], app);
    if let Some(composer) = app.composer {
        draw_composer(f, chunks[3], app, composer);
    }

    let hints = match app.composer {
        Some(_) => "Enter: submit | Esc: cancel",
        None if app.user.is_some() => {
            "j/k: move | l: like | r: reply | e: edit | d: delete | c: comment | L: like post | b: bookmark | R: reload | Esc: back"
        }
        None => "j/k: move | R: reload | Esc: back | q: quit",
    };
    draw_status_bar(f, chunks[4], app, hints);

    if app.confirming_delete.is_some() {
        draw_confirm_popup(f, " Delete comment ", "Delete this comment and its replies?");
    }
}

fn draw_post_body(f: &mut Frame, area: Rect, post: &Post) {
    let mut meta = vec![
        Span::styled(post.author.username.as_str(), Style::default().fg(Color::Cyan)),
        Span::raw(" · "),
        Span::styled(
            post.published_at
                .unwrap_or(post.created_at)
                .format("%b %d, %Y")
                .to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" · "),
        Span::styled(
            format!("{} min read", post.reading_time),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    for tag in &post.tags {
        meta.push(Span::raw(" "));
        meta.push(Span::styled(format!("#{}", tag.name), Style::default().fg(Color::Magenta)));
    }

    let (heart, heart_color) = if post.is_liked {
        ("♥", Color::Red)
    } else {
        ("♡", Color::DarkGray)
    };
    let bookmark = if post.is_bookmarked { "★ saved" } else { "☆" };

    let mut lines = vec![
        Line::from(meta),
        Line::from(vec![
            Span::styled(format!("{} {}", heart, post.likes_count), Style::default().fg(heart_color)),
            Span::raw("  "),
            Span::styled(bookmark, Style::default().fg(Color::Yellow)),
            Span::raw("  "),
            Span::styled(
                format!("{} views", post.views_count),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(""),
    ];
    lines.extend(post.content.lines().map(|l| Line::from(l.to_string())));

    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" Post "));

    f.render_widget(body, area);
}

fn draw_comments(f: &mut Frame, area: Rect, app: &App) {
    let Some(discussion) = app.discussion.as_ref() else {
        return;
    };

    let rows = discussion.rows(app.user.as_ref());
    let title = format!(" Comments ({}) ", rows.len());

    if rows.is_empty() {
        let empty = Paragraph::new("No comments yet.")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            let pending = discussion.is_comment_pending(row.id());
            ListItem::new(comment_lines(row, pending))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title),
        )
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(Some(app.selected_comment));
    f.render_stateful_widget(list, area, &mut state);
}

fn comment_lines<'a>(row: &ThreadRow<'a>, pending: bool) -> Vec<Line<'a>> {
    let comment = row.comment;
    let indent = " ".repeat(row.depth * INDENT);
    let branch = if row.depth > 0 { "↳ " } else { "" };

    let mut header = vec![
        Span::raw(format!("{}{}", indent, branch)),
        Span::styled(
            comment.author.username.as_str(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {}", comment.created_at.format("%b %d %H:%M")),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if row.is_edited() {
        header.push(Span::styled(
            " (edited)",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ));
    }
    let (heart, heart_color) = if comment.is_liked {
        ("♥", Color::Red)
    } else {
        ("♡", Color::DarkGray)
    };
    header.push(Span::styled(
        format!("  {} {}", heart, comment.likes_count),
        Style::default().fg(heart_color),
    ));
    if pending {
        header.push(Span::styled(" …", Style::default().fg(Color::Yellow)));
    }

    let body_indent = " ".repeat(row.depth * INDENT + branch.chars().count());
    let mut lines = vec![Line::from(header)];
    lines.extend(
        comment
            .content
            .lines()
            .map(|l| Line::from(format!("{}{}", body_indent, l))),
    );
    lines
}

fn draw_composer(f: &mut Frame, area: Rect, app: &App, composer: Composer) {
    let Some(discussion) = app.discussion.as_ref() else {
        return;
    };

    let (title, text) = match composer {
        Composer::NewComment => (" New comment ".to_string(), discussion.new_comment.as_str()),
        Composer::Reply => match discussion.replying() {
            Some(draft) => (format!(" Reply to #{} ", draft.target), draft.text.as_str()),
            None => return,
        },
        Composer::Edit => match discussion.editing() {
            Some(draft) => (format!(" Edit #{} ", draft.target), draft.text.as_str()),
            None => return,
        },
    };

    let pending = app.is_composer_pending(composer);
    let title = if pending {
        format!("{}· sending… ", title)
    } else {
        title
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if pending { Color::DarkGray } else { Color::Yellow }));

    let inner = block.inner(area);
    let input = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(block);
    f.render_widget(input, area);

    if inner.width > 0 && !pending {
        let len = text.chars().count() as u16;
        f.set_cursor_position((
            inner.x + len % inner.width,
            inner.y + (len / inner.width).min(inner.height.saturating_sub(1)),
        ));
    }
}

fn draw_confirm_popup(f: &mut Frame, title: &str, question: &str) {
    let area = centered_rect(40, 15, f.area());

    f.render_widget(Clear, area);

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let text = Paragraph::new(vec![
        Line::from(question),
        Line::from(""),
        Line::from(Span::styled(
            "y: confirm | n/Esc: cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center)
    .block(block);

    f.render_widget(text, area);
}

// ============ My posts ============

fn draw_my_posts(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Status tabs
            Constraint::Min(0),    // List
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    draw_header(f, chunks[0], app, "My posts");

    let selected_tab = StatusFilter::ALL
        .iter()
        .position(|s| *s == app.my_posts_filter)
        .unwrap_or(0);
    let tabs = Tabs::new(StatusFilter::ALL.iter().map(|s| s.label()))
        .block(Block::default().borders(Borders::ALL))
        .select(selected_tab)
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, chunks[1]);

    let posts = app.visible_my_posts();
    if posts.is_empty() {
        let empty = Paragraph::new("Nothing here yet.")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Posts "));
        f.render_widget(empty, chunks[2]);
    } else {
        let items: Vec<ListItem> = posts
            .iter()
            .map(|post| ListItem::new(post_list_lines(post)))
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(format!(" {} ({}) ", app.my_posts_filter.label(), posts.len())),
            )
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("> ");

        let mut state = ListState::default();
        state.select(Some(app.selected_my_post));
        f.render_stateful_widget(list, chunks[2], &mut state);
    }

    draw_status_bar(
        f,
        chunks[3],
        app,
        "Enter: open | Tab: status | d: delete | R: refresh | Esc: back | q: quit",
    );

    if app.confirming_post_delete.is_some() {
        draw_confirm_popup(f, " Delete post ", "Delete this post and all its comments?");
    }
}

// ============ Profile ============

fn draw_profile(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Profile
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    draw_header(f, chunks[0], app, "Profile");

    let lines = match app.user.as_ref() {
        Some(user) => vec![
            Line::from(Span::styled(
                user.username.as_str(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(user.email.as_str(), Style::default().fg(Color::Gray))),
            Line::from(""),
            Line::from(match user.bio.as_deref().filter(|b| !b.trim().is_empty()) {
                Some(bio) => Span::raw(bio),
                None => Span::styled("No bio yet.", Style::default().fg(Color::DarkGray)),
            }),
        ],
        None => vec![Line::from("Not logged in.")],
    };

    let profile = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Profile "),
        );
    f.render_widget(profile, chunks[1]);

    draw_status_bar(f, chunks[2], app, "Esc: back | q: quit");
}

// ============ Shared ============

fn draw_header(f: &mut Frame, area: Rect, app: &App, title: &str) {
    let user = app
        .user
        .as_ref()
        .map(|u| u.username.as_str())
        .unwrap_or("anonymous");

    let header = Paragraph::new(vec![Line::from(vec![
        Span::styled(
            "BLOG",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::styled(title, Style::default().fg(Color::Yellow)),
        Span::raw(" | "),
        Span::styled(user, Style::default().fg(Color::DarkGray)),
    ])])
    .block(Block::default().borders(Borders::BOTTOM));

    f.render_widget(header, area);
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App, hints: &str) {
    let confirming = app.confirming_delete.is_some() || app.confirming_post_delete.is_some();
    let (mode, mode_color) = if confirming {
        ("DELETE", Color::Red)
    } else {
        match app.vim_mode {
            VimMode::Normal => ("NORMAL", Color::Blue),
            VimMode::Insert => ("INSERT", Color::Green),
        }
    };

    let status = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", mode),
            Style::default().bg(mode_color).fg(Color::White),
        ),
        Span::raw(" "),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]));

    f.render_widget(status, area);
}

fn draw_loading(f: &mut Frame, message: &str) {
    let area = f.area();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    f.render_widget(block, area);

    let text = Paragraph::new(message)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);

    let center = centered_rect(50, 20, area);
    f.render_widget(text, center);
}

fn draw_loading_overlay(f: &mut Frame, message: &str) {
    let area = centered_rect(40, 10, f.area());

    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" Loading ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let text = Paragraph::new(message)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(block);

    f.render_widget(text, area);
}

fn draw_error_popup(f: &mut Frame, error: &str) {
    let area = centered_rect(60, 20, f.area());

    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let text = Paragraph::new(error)
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true })
        .block(block);

    f.render_widget(text, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use blog_shared::{thread::Affordances, Author, Comment};
    use chrono::{TimeZone, Utc};

    use super::*;

    fn comment(content: &str) -> Comment {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        Comment {
            id: 1,
            author: Author {
                id: 1,
                username: "ada".into(),
                profile_picture: None,
            },
            content: content.into(),
            parent_id: None,
            replies: Vec::new(),
            created_at: created,
            updated_at: created,
            can_edit: false,
            can_delete: false,
            is_liked: false,
            likes_count: 0,
        }
    }

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn replies_are_indented_by_depth() {
        let c = comment("first line\nsecond line");
        let row = ThreadRow {
            comment: &c,
            depth: 2,
            affordances: Affordances::default(),
        };

        let lines = comment_lines(&row, false);

        assert_eq!(lines.len(), 3);
        assert!(text(&lines[0]).starts_with("    ↳ ada"));
        assert_eq!(text(&lines[1]), "      first line");
        assert_eq!(text(&lines[2]), "      second line");
    }

    #[test]
    fn list_title_names_active_filters() {
        let tag = Tag {
            id: 1,
            name: "Rust".into(),
            slug: "rust".into(),
        };

        assert_eq!(
            post_list_title("", None, PostOrdering::Latest, 12, 1),
            " Posts (12) · Latest · page 1 "
        );
        assert_eq!(
            post_list_title("async", Some(&tag), PostOrdering::MostLiked, 3, 2),
            " Posts matching \"async\" in #Rust (3) · Most liked · page 2 "
        );
    }

    #[test]
    fn root_rows_are_flush_and_show_edits() {
        let mut c = comment("hello");
        c.updated_at = c.created_at + chrono::Duration::minutes(3);
        let row = ThreadRow {
            comment: &c,
            depth: 0,
            affordances: Affordances::default(),
        };

        let lines = comment_lines(&row, true);

        let header = text(&lines[0]);
        assert!(header.starts_with("ada"));
        assert!(header.contains("(edited)"));
        assert!(header.ends_with(" …"));
        assert_eq!(text(&lines[1]), "hello");
    }
}
