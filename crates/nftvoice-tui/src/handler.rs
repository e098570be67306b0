use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use nftvoice_core::Config;
use tracing::warn;

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Session(update) => app.on_session_update(update),
        AppEvent::Speech(event) => app.on_speech_event(event),
        AppEvent::ChainsLoaded(result) => app.on_chains_loaded(result),
        AppEvent::CollectionLoaded(result) => app.on_collection_loaded(result),
        AppEvent::NftLoaded(result) => app.on_nft_loaded(result),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Dictating => handle_dictating_mode(app, key),
        InputMode::EditingContract => handle_contract_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // NFT list
        KeyCode::Char('j') | KeyCode::Down => app.nft_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nft_up(),
        KeyCode::Enter => app.select_highlighted_nft(),

        // Talk
        KeyCode::Char(' ') | KeyCode::Char('r') => {
            app.session.record();
        }

        KeyCode::Char('L') => {
            let next = app.language().toggle();
            app.session.toggle_language();
            if let Err(e) = Config::save_language(next) {
                warn!(error = %e, "failed to save language preference");
            }
        }

        KeyCode::Char('c') => app.cycle_chain(),
        KeyCode::Char('a') => app.begin_contract_input(),
        KeyCode::Char('R') => app.load_collection(),

        // Chat scrolling
        KeyCode::PageDown => app.chat_scroll = app.chat_scroll.saturating_add(5),
        KeyCode::PageUp => app.chat_scroll = app.chat_scroll.saturating_sub(5),

        _ => {}
    }
}

fn handle_dictating_mode(app: &mut App, key: KeyEvent) {
    let Some(dictation) = app.dictation.as_mut() else {
        app.input_mode = InputMode::Normal;
        return;
    };

    match key.code {
        KeyCode::Enter => app.finish_dictation(),
        KeyCode::Esc => app.abort_dictation(),
        KeyCode::Backspace => dictation.line.backspace(),
        KeyCode::Left => dictation.line.move_left(),
        KeyCode::Right => dictation.line.move_right(),
        KeyCode::Char(c) => dictation.line.insert(c),
        _ => {}
    }
}

fn handle_contract_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_contract(),
        KeyCode::Esc => app.cancel_contract_input(),
        KeyCode::Backspace => app.contract_input.backspace(),
        KeyCode::Left => app.contract_input.move_left(),
        KeyCode::Right => app.contract_input.move_right(),
        KeyCode::Char(c) => app.contract_input.insert(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::{KeyboardRecognizer, SpeechEvent, TerminalSynthesizer};
    use nftvoice_core::{
        ChatClient, Collection, ControllerOptions, Language, NftApiClient, NftSummary, Session,
        SessionUpdate, VoiceInput,
    };
    use tokio::sync::mpsc;

    fn test_app() -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (session, handle, _updates) = Session::new(
            KeyboardRecognizer::new(tx.clone()),
            TerminalSynthesizer::new(tx.clone()),
            ChatClient::new("http://127.0.0.1:9"),
            ControllerOptions::default(),
        );
        let status = session.controller().snapshot();
        let app = App::new(
            NftApiClient::new("http://127.0.0.1:9"),
            handle,
            tx,
            status,
            None,
            None,
        );
        (app, rx)
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn summary(id: &str) -> NftSummary {
        NftSummary {
            token_id: id.to_string(),
            image_url: None,
            name: None,
        }
    }

    #[test]
    fn test_list_navigation_clamps() {
        let (mut app, _rx) = test_app();
        let collection = Collection {
            nfts: vec![summary("1"), summary("2")],
            ..Collection::default()
        };
        handle_event(&mut app, AppEvent::CollectionLoaded(Ok(collection))).unwrap();
        assert_eq!(app.nft_state.selected(), Some(0));

        for _ in 0..3 {
            handle_event(&mut app, key(KeyCode::Char('j'))).unwrap();
        }
        assert_eq!(app.nft_state.selected(), Some(1));
        handle_event(&mut app, key(KeyCode::Up)).unwrap();
        handle_event(&mut app, key(KeyCode::Up)).unwrap();
        assert_eq!(app.nft_state.selected(), Some(0));
    }

    #[test]
    fn test_collection_error_sets_notice() {
        let (mut app, _rx) = test_app();
        handle_event(&mut app, AppEvent::CollectionLoaded(Err("boom".to_string()))).unwrap();
        assert_eq!(app.notice.as_deref(), Some("Error loading NFTs: boom"));
    }

    #[test]
    fn test_dictation_keys_edit_and_escape() {
        let (mut app, _rx) = test_app();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (notice_tx, _notice_rx) = mpsc::unbounded_channel();
        let mut input = VoiceInput::new(KeyboardRecognizer::new(tx), notice_tx);
        input.start(Language::English).unwrap();
        let event = rx.try_recv().unwrap();
        handle_event(&mut app, event).unwrap();
        assert_eq!(app.input_mode, InputMode::Dictating);

        handle_event(&mut app, key(KeyCode::Char('h'))).unwrap();
        handle_event(&mut app, key(KeyCode::Char('i'))).unwrap();
        handle_event(&mut app, key(KeyCode::Char('q'))).unwrap();
        handle_event(&mut app, key(KeyCode::Backspace)).unwrap();
        assert_eq!(app.dictation.as_ref().map(|d| d.line.text.as_str()), Some("hi"));
        assert!(!app.should_quit);

        handle_event(&mut app, key(KeyCode::Esc)).unwrap();
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.dictation.is_none());
    }

    #[test]
    fn test_speaking_event_shows_text_until_cancelled() {
        let (mut app, _rx) = test_app();
        let speaking = SpeechEvent::Speaking {
            text: "Hello there.".to_string(),
            voice: Some("Terminal US English".to_string()),
        };
        handle_event(&mut app, AppEvent::Speech(speaking)).unwrap();
        assert_eq!(app.speaking_text.as_deref(), Some("Hello there."));

        handle_event(&mut app, AppEvent::Speech(SpeechEvent::Cancelled)).unwrap();
        assert!(app.speaking_text.is_none());
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c))).unwrap();
        }
    }

    fn with_chains(app: &mut App) {
        let chains = vec!["ethereum".to_string(), "polygon".to_string()];
        handle_event(app, AppEvent::ChainsLoaded(Ok(chains))).unwrap();
    }

    #[tokio::test]
    async fn test_typed_contract_loads_collection_on_chain() {
        let (mut app, _rx) = test_app();
        with_chains(&mut app);

        handle_event(&mut app, key(KeyCode::Char('a'))).unwrap();
        assert_eq!(app.input_mode, InputMode::EditingContract);
        type_text(&mut app, " 0xabcq");
        handle_event(&mut app, key(KeyCode::Backspace)).unwrap();
        assert!(!app.should_quit);

        handle_event(&mut app, key(KeyCode::Enter)).unwrap();
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.contract.as_deref(), Some("0xabc"));
        assert_eq!(app.chain.as_deref(), Some("ethereum"));
    }

    #[test]
    fn test_escape_keeps_previous_contract() {
        let (mut app, _rx) = test_app();
        app.contract = Some("0x111".to_string());

        handle_event(&mut app, key(KeyCode::Char('a'))).unwrap();
        assert_eq!(app.contract_input.text, "0x111");
        type_text(&mut app, "222");
        handle_event(&mut app, key(KeyCode::Esc)).unwrap();

        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.contract.as_deref(), Some("0x111"));
    }

    #[test]
    fn test_cycle_chain_without_contract_prompts_instead_of_reloading() {
        // No runtime here: a reload would have to spawn a request
        let (mut app, _rx) = test_app();
        with_chains(&mut app);

        handle_event(&mut app, key(KeyCode::Char('c'))).unwrap();
        assert_eq!(app.chain.as_deref(), Some("ethereum"));
        handle_event(&mut app, key(KeyCode::Char('c'))).unwrap();
        assert_eq!(app.chain.as_deref(), Some("polygon"));
        assert!(app.notice.as_deref().is_some_and(|n| n.contains("contract")));
    }

    #[test]
    fn test_chat_scroll_counts_wrapped_and_speaking_lines() {
        let (mut app, _rx) = test_app();
        app.chat_width = 10;
        app.chat_height = 3;

        // Exactly one wrapped line: label, text, blank
        let message = nftvoice_core::ChatMessage::nft("aaaa bbbbb");
        handle_event(&mut app, AppEvent::Session(SessionUpdate::Message(message))).unwrap();
        assert_eq!(app.chat_scroll, 0);

        let speaking = SpeechEvent::Speaking {
            text: "Hello".to_string(),
            voice: Some("V".to_string()),
        };
        handle_event(&mut app, AppEvent::Speech(speaking)).unwrap();
        assert_eq!(app.chat_scroll, 2);
    }

    #[test]
    fn test_chat_scroll_saturates_on_huge_log() {
        let (mut app, _rx) = test_app();
        app.chat_messages = vec![nftvoice_core::ChatMessage::user("hi"); 40_000];
        app.scroll_chat_to_bottom();
        assert_eq!(app.chat_scroll, u16::MAX);
    }

    #[test]
    fn test_ctrl_c_quits_from_any_mode() {
        let (mut app, _rx) = test_app();
        app.input_mode = InputMode::Dictating;
        let event = AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        handle_event(&mut app, event).unwrap();
        assert!(app.should_quit);
    }
}
