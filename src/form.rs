use crate::error::ValidationError;
use crate::record::NewRepository;

const GIT_SUFFIX: &str = ".git";

/// Raw input for a new repository, as typed.
///
/// A failed [`AddForm::submit`] leaves every field untouched; a successful one
/// clears them all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddForm {
    pub name: String,
    pub url: String,
    pub nickname: String,
    pub is_master: bool,
}

impl AddForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = nickname.into();
        self
    }

    pub fn master(mut self, is_master: bool) -> Self {
        self.is_master = is_master;
        self
    }

    /// Check the input without consuming it.
    pub fn validate(&self) -> Result<NewRepository, ValidationError> {
        let name = self.name.trim();
        let url = self.url.trim();

        if name.is_empty() || url.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        if !url.ends_with(GIT_SUFFIX) {
            return Err(ValidationError::InvalidUrl);
        }

        let nickname = self.nickname.trim();
        Ok(NewRepository {
            name: name.to_string(),
            url: url.to_string(),
            nickname: (!nickname.is_empty()).then(|| nickname.to_string()),
            is_master: self.is_master,
        })
    }

    /// Validate, and on success hand back the creation intent and reset the form.
    pub fn submit(&mut self) -> Result<NewRepository, ValidationError> {
        let repo = self.validate()?;
        *self = AddForm::default();
        Ok(repo)
    }
}
