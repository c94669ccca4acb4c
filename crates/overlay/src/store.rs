//! The application state store the controller reads and dispatches into.

use perch_geometry::WidgetLocation;
use url::Url;

/// Synchronous read of the store fields placement depends on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateSnapshot {
	pub panel_displayed: bool,
	pub chat_detached: bool,
	/// Tab titles of the current workspace's chat.
	pub chat_tabs: Vec<String>,
	pub focusing_document_url: Option<Url>,
}

impl StateSnapshot {
	pub fn has_chat_tabs(&self) -> bool {
		!self.chat_tabs.is_empty()
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Toast {
	Error(String),
	Warning { message: String, url: Option<Url> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
	HidePanel,
	ShowPanel,
	RemoveDisplayedContent,
	SwitchEditorAndUpdateContent,
	UpdateFocusingDocumentUrl(Option<Url>),
	UpdatePanelState(WidgetLocation),
	DetachChatPanel,
	EnterFullScreen,
	ExitFullScreen,
	HideButtonClicked,
	PresentSuggestion,
	ExpandSuggestion,
	DiscardSuggestion,
	PresentChatPanel { force_detach: bool },
	Toast(Toast),
	DismissWarning,
	MarkAsProcessing(bool),
}

impl Action {
	pub fn name(&self) -> &'static str {
		match self {
			Self::HidePanel => "hide_panel",
			Self::ShowPanel => "show_panel",
			Self::RemoveDisplayedContent => "remove_displayed_content",
			Self::SwitchEditorAndUpdateContent => "switch_editor_and_update_content",
			Self::UpdateFocusingDocumentUrl(_) => "update_focusing_document_url",
			Self::UpdatePanelState(_) => "update_panel_state",
			Self::DetachChatPanel => "detach_chat_panel",
			Self::EnterFullScreen => "enter_full_screen",
			Self::ExitFullScreen => "exit_full_screen",
			Self::HideButtonClicked => "hide_button_clicked",
			Self::PresentSuggestion => "present_suggestion",
			Self::ExpandSuggestion => "expand_suggestion",
			Self::DiscardSuggestion => "discard_suggestion",
			Self::PresentChatPanel { .. } => "present_chat_panel",
			Self::Toast(_) => "toast",
			Self::DismissWarning => "dismiss_warning",
			Self::MarkAsProcessing(_) => "mark_as_processing",
		}
	}
}

/// Reactive application state owned outside the controller.
pub trait StateStore: Send + Sync + 'static {
	fn current_state(&self) -> StateSnapshot;

	fn dispatch(&self, action: Action);
}
