use lorekeeper_core::{CardDraft, PlayerId, RepositoryCard};

pub const MAX_INPUT_LEN: usize = 64;

/// Single-line text field with a character cursor.
#[derive(Debug, Clone)]
pub struct TextInput {
    input: String,
    cursor: usize,
    default: String,
}

impl TextInput {
    pub fn new(initial: &str, default: impl Into<String>) -> Self {
        Self {
            input: initial.to_string(),
            cursor: initial.chars().count(),
            default: default.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new("", "")
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn raw(&self) -> &str {
        &self.input
    }

    pub fn default_value(&self) -> &str {
        &self.default
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.len() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len) as usize;
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }

    pub fn insert(&mut self, ch: char) {
        if self.len() >= MAX_INPUT_LEN || ch.is_control() {
            return;
        }
        let at = self.byte_index(self.cursor);
        self.input.insert(at, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.input.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_index(self.cursor);
            self.input.remove(at);
        }
    }

    pub fn set(&mut self, value: &str) {
        self.input = value.chars().take(MAX_INPUT_LEN).collect();
        self.cursor = self.len();
    }

    /// Trimmed contents, or the default when blank.
    pub fn value(&self) -> String {
        let trimmed = self.input.trim();
        if trimmed.is_empty() {
            self.default.clone()
        } else {
            trimmed.to_string()
        }
    }

    fn len(&self) -> usize {
        self.input.chars().count()
    }

    fn byte_index(&self, chars: usize) -> usize {
        self.input
            .char_indices()
            .nth(chars)
            .map(|(index, _)| index)
            .unwrap_or(self.input.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Strength,
    Willpower,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Name => FormField::Strength,
            FormField::Strength => FormField::Willpower,
            FormField::Willpower => FormField::Name,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            FormField::Name => FormField::Willpower,
            FormField::Strength => FormField::Name,
            FormField::Willpower => FormField::Strength,
        }
    }
}

/// Card entry form with repository-assisted name completion.
#[derive(Debug, Clone)]
pub struct CardForm {
    pub player: PlayerId,
    pub name: TextInput,
    pub strength: u32,
    pub willpower: u32,
    pub field: FormField,
    pub suggestions: Vec<RepositoryCard>,
    pub highlighted: Option<usize>,
}

impl CardForm {
    pub fn new(player: PlayerId) -> Self {
        let draft = CardDraft::default();
        Self {
            player,
            name: TextInput::empty(),
            strength: draft.strength,
            willpower: draft.willpower,
            field: FormField::Name,
            suggestions: Vec::new(),
            highlighted: None,
        }
    }

    pub fn draft(&self) -> CardDraft {
        CardDraft::new(self.name.raw().trim(), self.strength, self.willpower)
    }

    pub fn set_suggestions(&mut self, suggestions: Vec<RepositoryCard>) {
        self.suggestions = suggestions;
        self.highlighted = None;
    }

    pub fn move_highlight(&mut self, delta: isize) {
        if self.suggestions.is_empty() {
            self.highlighted = None;
            return;
        }
        let last = self.suggestions.len() as isize - 1;
        self.highlighted = Some(match self.highlighted {
            None if delta < 0 => last as usize,
            None => 0,
            Some(current) => (current as isize + delta).clamp(0, last) as usize,
        });
    }

    /// Fill the form from the highlighted suggestion. Returns `false` when
    /// nothing is highlighted.
    pub fn apply_highlighted(&mut self) -> bool {
        let Some(card) = self.highlighted.and_then(|index| self.suggestions.get(index)) else {
            return false;
        };
        let draft = CardDraft::from_suggestion(card);
        self.name.set(&draft.name);
        self.strength = draft.strength;
        self.willpower = draft.willpower;
        self.suggestions.clear();
        self.highlighted = None;
        true
    }

    pub fn adjust_current(&mut self, delta: i32) {
        match self.field {
            FormField::Name => {}
            FormField::Strength => self.strength = self.strength.saturating_add_signed(delta),
            FormField::Willpower => {
                self.willpower = self.willpower.saturating_add_signed(delta).max(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_input_edits_multibyte_names() {
        let mut input = TextInput::new("Ea", "Player 1");
        input.move_cursor(-1);
        input.insert('é');
        assert_eq!(input.raw(), "Eéa");
        input.move_end();
        input.backspace();
        assert_eq!(input.raw(), "Eé");
        input.move_home();
        input.delete();
        assert_eq!(input.raw(), "é");
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn blank_input_falls_back_to_default() {
        let input = TextInput::new("   ", "Player 2");
        assert_eq!(input.value(), "Player 2");
    }

    #[test]
    fn suggestion_fills_the_form() {
        let mut form = CardForm::new(PlayerId::One);
        form.set_suggestions(vec![
            RepositoryCard::new("Genie".to_string(), Some("On the Job".to_string()), 3, 5),
            RepositoryCard::new("Genie".to_string(), Some("Powers Unleashed".to_string()), 0, 0),
        ]);
        form.move_highlight(1);
        form.move_highlight(1);
        assert_eq!(form.highlighted, Some(1));
        assert!(form.apply_highlighted());

        let draft = form.draft();
        assert_eq!(draft.name, "Genie - Powers Unleashed");
        assert_eq!(draft.willpower, 1);
        assert!(form.suggestions.is_empty());
        assert!(!form.apply_highlighted());
    }

    #[test]
    fn willpower_never_drops_below_one() {
        let mut form = CardForm::new(PlayerId::Two);
        form.field = FormField::Willpower;
        form.adjust_current(-3);
        assert_eq!(form.willpower, 1);
        form.field = FormField::Strength;
        form.adjust_current(-1);
        assert_eq!(form.strength, 0);
    }
}
