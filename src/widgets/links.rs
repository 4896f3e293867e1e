//! Quick links controller.
//!
//! Links are an ordered list addressed by position. The whole list is
//! re-persisted on every mutation. Deleting is two-phase: a link is first
//! marked with [`LinksController::request_delete`], then removed by
//! [`LinksController::confirm_delete`] or released by
//! [`LinksController::cancel_delete`].

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use url::Url;

use super::ValidationError;
use crate::store::{KeyValueStore, keys, load_json, save_json};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub title: String,
    pub url: String,
}

impl Link {
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }

    /// Favicon for the link's host, served by Google's favicon service.
    #[must_use]
    pub fn favicon_url(&self) -> Option<String> {
        let url = Url::parse(&self.url).ok()?;
        let host = url.host_str()?;
        Some(format!("https://www.google.com/s2/favicons?sz=32&domain={host}"))
    }
}

/// Links seeded when nothing is persisted.
#[must_use]
pub fn default_links() -> Vec<Link> {
    vec![
        Link::new("Google", "https://google.com"),
        Link::new("YouTube", "https://www.youtube.com/"),
        Link::new("GitHub", "https://github.com"),
        Link::new("ChatGPT", "https://chat.openai.com/"),
    ]
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinksState {
    pub links: Vec<Link>,
    /// Index awaiting delete confirmation.
    pub pending_delete: Option<usize>,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct LinksController {
    store: Arc<dyn KeyValueStore>,
    state: RwLock<LinksState>,
}

fn validate(title: &str, url: &str) -> Result<Link, ValidationError> {
    let title = title.trim();
    let url = url.trim();
    if title.is_empty() || url.is_empty() {
        return Err(ValidationError::MissingLinkFields);
    }
    Url::parse(url).map_err(|_| ValidationError::InvalidUrl)?;
    Ok(Link::new(title, url))
}

impl LinksController {
    /// Hydrate from storage, seeding defaults when nothing usable is stored.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let links = load_json::<Vec<Link>>(store.as_ref(), keys::LINKS).unwrap_or_else(default_links);
        Self {
            store,
            state: RwLock::new(LinksState {
                links,
                ..LinksState::default()
            }),
        }
    }

    #[must_use]
    pub fn state(&self) -> LinksState {
        self.read().clone()
    }

    #[must_use]
    pub fn links(&self) -> Vec<Link> {
        self.read().links.clone()
    }

    /// Append a link.
    pub fn add(&self, title: &str, url: &str) -> Result<(), ValidationError> {
        let link = self.validated(title, url)?;
        let mut state = self.write();
        state.links.push(link);
        state.error = None;
        self.persist(&state.links);
        Ok(())
    }

    /// Replace the link at `index`.
    pub fn edit(&self, index: usize, title: &str, url: &str) -> Result<(), ValidationError> {
        let link = self.validated(title, url)?;
        let mut state = self.write();
        let Some(slot) = state.links.get_mut(index) else {
            drop(state);
            return Err(self.reject(ValidationError::NoSuchLink(index)));
        };
        *slot = link;
        state.error = None;
        self.persist(&state.links);
        Ok(())
    }

    /// Mark the link at `index` for deletion; nothing is removed yet.
    pub fn request_delete(&self, index: usize) -> Result<(), ValidationError> {
        let mut state = self.write();
        if index >= state.links.len() {
            drop(state);
            return Err(self.reject(ValidationError::NoSuchLink(index)));
        }
        state.pending_delete = Some(index);
        Ok(())
    }

    /// Remove the link marked by [`Self::request_delete`].
    pub fn confirm_delete(&self) -> Result<Link, ValidationError> {
        let mut state = self.write();
        let Some(index) = state.pending_delete.take() else {
            drop(state);
            return Err(self.reject(ValidationError::NoPendingDelete));
        };
        if index >= state.links.len() {
            drop(state);
            return Err(self.reject(ValidationError::NoSuchLink(index)));
        }
        let removed = state.links.remove(index);
        state.error = None;
        self.persist(&state.links);
        tracing::debug!(name: "links.deleted", index, title = %removed.title, "Link deleted");
        Ok(removed)
    }

    pub fn cancel_delete(&self) {
        self.write().pending_delete = None;
    }

    fn validated(&self, title: &str, url: &str) -> Result<Link, ValidationError> {
        validate(title, url).map_err(|e| self.reject(e))
    }

    fn reject(&self, err: ValidationError) -> ValidationError {
        tracing::debug!(name: "links.rejected", reason = %err, "Rejected link change");
        self.write().error = Some(err.to_string());
        err
    }

    fn persist(&self, links: &[Link]) {
        save_json(self.store.as_ref(), keys::LINKS, links);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, LinksState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, LinksState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn controller() -> (Arc<MemoryStore>, LinksController) {
        let store = Arc::new(MemoryStore::new());
        let links = LinksController::new(Arc::<MemoryStore>::clone(&store));
        (store, links)
    }

    #[test]
    fn test_seeds_defaults() {
        let (_, links) = controller();
        assert_eq!(links.links(), default_links());
    }

    #[test]
    fn test_invalid_url_rejected_and_list_unchanged() {
        let (store, links) = controller();
        let before = links.links();

        assert_eq!(links.add("Bad", "not a url"), Err(ValidationError::InvalidUrl));
        assert_eq!(links.links(), before);
        assert_eq!(
            links.state().error.as_deref(),
            Some("Invalid URL. Please enter a valid web address.")
        );
        assert_eq!(store.get(keys::LINKS), None);
    }

    #[test]
    fn test_blank_fields_rejected() {
        let (_, links) = controller();
        assert_eq!(
            links.add("   ", "https://example.com"),
            Err(ValidationError::MissingLinkFields)
        );
    }

    #[test]
    fn test_add_trims_and_clears_error() {
        let (_, links) = controller();
        let _ = links.add("Bad", "nope");
        links.add("  Rust ", " https://www.rust-lang.org ").unwrap();

        let state = links.state();
        assert_eq!(state.error, None);
        assert_eq!(
            state.links.last(),
            Some(&Link::new("Rust", "https://www.rust-lang.org"))
        );
    }

    #[test]
    fn test_edit_by_index() {
        let (_, links) = controller();
        links.edit(1, "Videos", "https://youtube.com").unwrap();
        assert_eq!(links.links()[1], Link::new("Videos", "https://youtube.com"));
        assert_eq!(links.edit(99, "X", "https://x.com"), Err(ValidationError::NoSuchLink(99)));
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let (_, links) = controller();
        links.request_delete(1).unwrap();
        assert_eq!(links.links().len(), 4);

        links.cancel_delete();
        assert_eq!(links.confirm_delete(), Err(ValidationError::NoPendingDelete));
        assert_eq!(links.links().len(), 4);

        links.request_delete(1).unwrap();
        let removed = links.confirm_delete().unwrap();
        assert_eq!(removed.title, "YouTube");

        let titles: Vec<_> = links.links().into_iter().map(|l| l.title).collect();
        assert_eq!(titles, vec!["Google", "GitHub", "ChatGPT"]);
    }

    #[test]
    fn test_corrupt_storage_falls_back_to_defaults() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::LINKS, "{oops");
        let links = LinksController::new(store);
        assert_eq!(links.links(), default_links());
    }

    #[test]
    fn test_favicon_url() {
        let link = Link::new("GitHub", "https://github.com/rust-lang");
        assert_eq!(
            link.favicon_url().as_deref(),
            Some("https://www.google.com/s2/favicons?sz=32&domain=github.com")
        );
    }
}
