use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use nftvoice_core::{ChatRole, ConversationState, Status};

use crate::app::{App, InputMode};

/// Wrap text to fit within a given width, returning multiple lines
/// Uses word boundaries for wrapping (doesn't break mid-word)
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current_len == 0 {
            current_line = word.to_string();
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current_line.push(' ');
            current_line.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(current_line);
            current_line = word.to_string();
            current_len = word_len;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let [main, status_area, help_area] = Layout::vertical([
        Constraint::Min(10),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let [left, right] = Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)])
        .areas(main);
    let [collection_area, list_area] =
        Layout::vertical([Constraint::Length(8), Constraint::Min(3)]).areas(left);
    let [nft_area, chat_area] =
        Layout::vertical([Constraint::Length(9), Constraint::Min(5)]).areas(right);

    render_collection(app, frame, collection_area);
    render_nft_list(app, frame, list_area);
    render_nft(app, frame, nft_area);
    render_chat(app, frame, chat_area);
    render_status(app, frame, status_area);
    render_help(app, frame, help_area);
}

fn render_collection(app: &App, frame: &mut Frame, area: Rect) {
    let chain = app.chain.as_deref().unwrap_or("-");
    let mut lines = Vec::new();

    match &app.collection {
        Some(collection) => {
            lines.push(Line::from(collection.display_name().to_string()).bold());
            lines.push(Line::from(collection.description_or_default().to_string()).dim());
            lines.push(Line::from(format!("Floor: {}", collection.floor_price_display())));
            let count = |n: Option<u64>| n.map_or("N/A".to_string(), |n| n.to_string());
            lines.push(Line::from(format!(
                "Items: {}  Owners: {}",
                count(collection.distinct_nft_count),
                count(collection.distinct_owner_count)
            )));
            let links: Vec<String> = [
                collection.twitter_url(),
                collection.discord_url.clone(),
                collection.external_url.clone(),
            ]
            .into_iter()
            .flatten()
            .collect();
            if !links.is_empty() {
                lines.push(Line::from(links.join("  ")).fg(Color::Blue));
            }
        }
        None => lines.push(Line::from("Loading collection...").dim()),
    }
    if let Some(contract) = &app.contract {
        lines.push(Line::from(format!("Contract: {}", contract)).dim());
    }

    if let Some(notice) = &app.notice {
        lines.push(Line::from(notice.clone()).fg(Color::Red));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Collection ({}) ", chain));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_nft_list(app: &mut App, frame: &mut Frame, area: Rect) {
    let items: Vec<ListItem> = app
        .nfts
        .iter()
        .map(|nft| {
            let selected = app
                .selected_nft
                .as_ref()
                .is_some_and(|s| s.token_id == nft.token_id);
            let marker = if selected { "● " } else { "  " };
            ListItem::new(format!("{}{}", marker, nft.display_name()))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" NFTs "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, area, &mut app.nft_state);
}

fn render_nft(app: &App, frame: &mut Frame, area: Rect) {
    let mut lines = Vec::new();
    let title = match &app.selected_nft {
        Some(nft) => {
            if let Some(url) = &nft.image_url {
                lines.push(Line::from(vec![Span::raw("Image: ").dim(), Span::raw(url.clone())]));
            }
            for t in nft.visible_traits() {
                lines.push(Line::from(vec![
                    Span::styled(format!("{}: ", t.trait_type), Style::default().fg(Color::Yellow)),
                    Span::raw(t.value.clone()),
                ]));
            }
            format!(" {} ", nft.display_name())
        }
        None => {
            lines.push(Line::from("Select an NFT to talk to (Enter)").dim());
            " NFT ".to_string()
        }
    };
    if app.nft_loading {
        lines.push(Line::from("Loading metadata...").dim());
    }

    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true }),
        area,
    );
}

/// Every line of the conversation pane, already wrapped to `width`.
/// Scrolling counts these same lines.
pub fn chat_lines(app: &App, width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = Vec::new();
    for msg in &app.chat_messages {
        let (label, color) = match msg.role {
            ChatRole::User => ("You:", Color::Cyan),
            ChatRole::Nft => ("NFT:", Color::Magenta),
            ChatRole::System => ("System:", Color::Red),
        };
        lines.push(Line::from(label).fg(color).bold());
        for line in msg.content.lines() {
            for wrapped in wrap_text_to_width(line, width) {
                lines.push(Line::from(wrapped));
            }
        }
        lines.push(Line::from(""));
    }

    if app.status.state == ConversationState::Processing {
        let thinking = Status::Thinking.text(app.language());
        let dots = ".".repeat(app.animation_frame + 1);
        lines.push(Line::from("NFT:").fg(Color::Magenta).bold());
        lines.push(Line::from(format!("{}{}", thinking.trim_end_matches('.'), dots)).dim());
    }

    if let Some(text) = &app.speaking_text {
        let voice = app.speaking_voice.as_deref().unwrap_or("default voice");
        for wrapped in wrap_text_to_width(&format!("🔊 ({}) {}", voice, text), width) {
            lines.push(Line::from(wrapped).fg(Color::Green));
        }
    }

    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let inner_width = area.width.saturating_sub(2);
    app.chat_width = inner_width;
    app.chat_height = area.height.saturating_sub(2);

    let lines = chat_lines(app, inner_width as usize);
    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" Conversation "))
            .scroll((app.chat_scroll, 0)),
        area,
    );
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let status = &app.status;
    let talk_style = if status.recording {
        Style::default().fg(Color::Black).bg(Color::Red)
    } else {
        Style::default().fg(Color::Black).bg(Color::Green)
    };

    let body = match (&app.input_mode, &app.dictation) {
        (InputMode::Dictating, Some(dictation)) => {
            let dots = ".".repeat(app.animation_frame + 1);
            Line::from(vec![
                Span::styled(format!(" 🎤 {} ", dictation.language.short_label()), talk_style),
                Span::raw(format!(" {}", dictation.line.text)),
                Span::raw("▏").fg(Color::Gray),
                Span::raw(dots).dim(),
            ])
        }
        (InputMode::EditingContract, _) => Line::from(vec![
            Span::styled(" Contract ", Style::default().fg(Color::Black).bg(Color::Yellow)),
            Span::raw(format!(" {}", app.contract_input.text)),
            Span::raw("▏").fg(Color::Gray),
        ]),
        _ => Line::from(vec![
            Span::styled(format!(" {} ", status.talk_label), talk_style),
            Span::raw(format!(" {}", status.status_text)),
        ]),
    };

    let title = format!(" 🌐 {} ", status.language.short_label());
    frame.render_widget(
        Paragraph::new(body).block(Block::default().borders(Borders::ALL).title(title)),
        area,
    );
}

fn render_help(app: &App, frame: &mut Frame, area: Rect) {
    let help = match app.input_mode {
        InputMode::Dictating => "Type what you want to say · Enter send · Esc cancel",
        InputMode::EditingContract => "Contract address · Enter load · Esc cancel",
        InputMode::Normal => {
            "j/k move · Enter select · Space talk · L language · c chain · a contract · R reload · q quit"
        }
    };
    frame.render_widget(Paragraph::new(help).dim(), area);
}
