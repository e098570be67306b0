use ratatui::widgets::ListState;
use nftvoice_core::{
    ChatMessage, Collection, ConversationState, Language, Nft, NftApiClient, NftSummary,
    SessionHandle, SessionUpdate, StatusSnapshot,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::input::TextInput;
use crate::speech::{Dictation, SpeechEvent};
use crate::tui::AppEvent;
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Dictating,
    EditingContract,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Collection browsing
    pub chains: Vec<String>,
    pub chain: Option<String>,
    pub contract: Option<String>,
    pub collection: Option<Collection>,
    pub nfts: Vec<NftSummary>,
    pub nft_state: ListState,
    pub selected_nft: Option<Nft>,
    pub nft_loading: bool,
    pub notice: Option<String>,
    pub contract_input: TextInput,

    // Conversation
    pub status: StatusSnapshot,
    pub chat_messages: Vec<ChatMessage>,
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub dictation: Option<Dictation>,
    pub speaking_text: Option<String>,
    pub speaking_voice: Option<String>,

    // Animation frame for listening/thinking indicator
    pub animation_frame: usize,

    pub api: NftApiClient,
    pub session: SessionHandle,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        api: NftApiClient,
        session: SessionHandle,
        events: mpsc::UnboundedSender<AppEvent>,
        status: StatusSnapshot,
        chain: Option<String>,
        contract: Option<String>,
    ) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,

            chains: Vec::new(),
            chain,
            contract,
            collection: None,
            nfts: Vec::new(),
            nft_state: ListState::default(),
            selected_nft: None,
            nft_loading: false,
            notice: None,
            contract_input: TextInput::default(),

            status,
            chat_messages: Vec::new(),
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            dictation: None,
            speaking_text: None,
            speaking_voice: None,

            animation_frame: 0,

            api,
            session,
            events,
        }
    }

    pub fn language(&self) -> Language {
        self.status.language
    }

    pub fn load_chains(&self) {
        let api = self.api.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = api.chains().await.map_err(|e| e.to_string());
            let _ = tx.send(AppEvent::ChainsLoaded(result));
        });
    }

    /// Load the configured collection, or the default NFT listing when no
    /// chain/contract pair is set.
    pub fn load_collection(&mut self) {
        let api = self.api.clone();
        let tx = self.events.clone();
        self.notice = None;
        match (self.chain.clone(), self.contract.clone()) {
            (Some(chain), Some(contract)) => {
                tokio::spawn(async move {
                    let result = api.collection(&chain, &contract).await.map_err(|e| e.to_string());
                    let _ = tx.send(AppEvent::CollectionLoaded(result));
                });
            }
            _ => {
                tokio::spawn(async move {
                    let result = api
                        .nfts()
                        .await
                        .map(|nfts| Collection { nfts, ..Collection::default() })
                        .map_err(|e| e.to_string());
                    let _ = tx.send(AppEvent::CollectionLoaded(result));
                });
            }
        }
    }

    /// Switch to the next known chain. Reloads only when there is a
    /// contract to look up on it.
    pub fn cycle_chain(&mut self) {
        if self.chains.is_empty() {
            return;
        }
        let next = match self.chain.as_ref().and_then(|c| self.chains.iter().position(|x| x == c)) {
            Some(i) => (i + 1) % self.chains.len(),
            None => 0,
        };
        self.chain = Some(self.chains[next].clone());
        if self.contract.is_some() {
            self.load_collection();
        } else {
            self.notice = Some("Press 'a' to enter a contract address for this chain".to_string());
        }
    }

    pub fn begin_contract_input(&mut self) {
        self.contract_input = TextInput::with_text(self.contract.as_deref().unwrap_or(""));
        self.input_mode = InputMode::EditingContract;
    }

    /// Use the typed contract (blank clears it) and load the collection.
    pub fn submit_contract(&mut self) {
        let contract = self.contract_input.text.trim().to_string();
        self.contract = if contract.is_empty() { None } else { Some(contract) };
        if self.contract.is_some() && self.chain.is_none() {
            self.chain = self.chains.first().cloned();
        }
        self.input_mode = InputMode::Normal;
        self.load_collection();
    }

    pub fn cancel_contract_input(&mut self) {
        self.contract_input = TextInput::default();
        self.input_mode = InputMode::Normal;
    }

    pub fn select_highlighted_nft(&mut self) {
        let Some(summary) = self.nft_state.selected().and_then(|i| self.nfts.get(i)) else {
            return;
        };
        let token_id = summary.token_id.clone();
        let chain = self.chain.clone().unwrap_or_default();
        let contract = self.contract.clone().unwrap_or_default();
        let api = self.api.clone();
        let tx = self.events.clone();
        self.nft_loading = true;
        tokio::spawn(async move {
            let result = api.nft(&token_id, &chain, &contract).await.map_err(|e| e.to_string());
            let _ = tx.send(AppEvent::NftLoaded(result));
        });
    }

    pub fn on_chains_loaded(&mut self, result: Result<Vec<String>, String>) {
        match result {
            Ok(chains) => self.chains = chains,
            Err(e) => warn!(error = %e, "failed to load chains"),
        }
    }

    pub fn on_collection_loaded(&mut self, result: Result<Collection, String>) {
        match result {
            Ok(collection) => {
                self.nfts = collection.nfts.clone();
                self.nft_state.select(if self.nfts.is_empty() { None } else { Some(0) });
                self.collection = Some(collection);
            }
            Err(e) => {
                warn!(error = %e, "failed to load collection");
                self.notice = Some(format!("Error loading NFTs: {}", e));
            }
        }
    }

    pub fn on_nft_loaded(&mut self, result: Result<Nft, String>) {
        self.nft_loading = false;
        match result {
            Ok(nft) => {
                self.selected_nft = Some(nft.clone());
                self.session.select_nft(nft);
            }
            Err(e) => {
                self.session.nft_load_failed(e);
            }
        }
    }

    pub fn on_session_update(&mut self, update: SessionUpdate) {
        match update {
            SessionUpdate::Status(snapshot) => {
                if snapshot.state != ConversationState::Speaking {
                    self.speaking_text = None;
                    self.speaking_voice = None;
                }
                self.status = snapshot;
                self.scroll_chat_to_bottom();
            }
            SessionUpdate::Message(message) => {
                self.chat_messages.push(message);
                self.scroll_chat_to_bottom();
            }
        }
    }

    pub fn on_speech_event(&mut self, event: SpeechEvent) {
        match event {
            SpeechEvent::DictationStarted { sink, language } => {
                // A new session supersedes whatever was being typed
                if let Some(old) = self.dictation.take() {
                    old.abort();
                }
                self.dictation = Some(Dictation::begin(sink, language));
                self.input_mode = InputMode::Dictating;
            }
            SpeechEvent::DictationStopped => self.finish_dictation(),
            SpeechEvent::Speaking { text, voice } => {
                debug!(%text, "speaking");
                self.speaking_text = Some(text);
                self.speaking_voice = voice;
                self.scroll_chat_to_bottom();
            }
            SpeechEvent::Cancelled => {
                self.speaking_text = None;
                self.speaking_voice = None;
                self.scroll_chat_to_bottom();
            }
        }
    }

    pub fn finish_dictation(&mut self) {
        if let Some(dictation) = self.dictation.take() {
            dictation.finish();
        }
        self.input_mode = InputMode::Normal;
    }

    pub fn abort_dictation(&mut self) {
        if let Some(dictation) = self.dictation.take() {
            dictation.abort();
        }
        self.input_mode = InputMode::Normal;
    }

    pub fn nft_down(&mut self) {
        if self.nfts.is_empty() {
            return;
        }
        let i = self.nft_state.selected().map_or(0, |i| (i + 1).min(self.nfts.len() - 1));
        self.nft_state.select(Some(i));
    }

    pub fn nft_up(&mut self) {
        if self.nfts.is_empty() {
            return;
        }
        let i = self.nft_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.nft_state.select(Some(i));
    }

    pub fn tick_animation(&mut self) {
        if matches!(
            self.status.state,
            ConversationState::Listening | ConversationState::Processing
        ) {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Scroll chat so the latest line is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 { self.chat_width as usize } else { 50 };
        let total_lines = ui::chat_lines(self, wrap_width).len();

        let visible_height = if self.chat_height > 0 { self.chat_height as usize } else { 20 };
        let scroll = total_lines.saturating_sub(visible_height);
        self.chat_scroll = u16::try_from(scroll).unwrap_or(u16::MAX);
    }
}
