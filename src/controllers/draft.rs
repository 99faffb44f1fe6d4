//! Load / draft / save reconciliation shared by the keyed editors.
//!
//! A [`DraftSchema`] describes one domain: how to fetch its complete keyed
//! set for a wedding, how to derive the string draft of an entity, and how
//! to turn a draft back into a write. [`DraftController`] runs the cycle:
//! canonical entries are replaced only by a successful load, edits touch
//! only the draft, and a save issues every write concurrently and then
//! reloads.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use async_trait::async_trait;
use futures::future::join_all;

use crate::controllers::edit::EditMode;
use crate::controllers::ScreenContext;
use crate::db::Gateway;
use crate::error::AppError;

#[async_trait]
pub trait DraftSchema: Send + Sync {
    type Key: Clone + Eq + Hash + Debug + Send + Sync;
    type Entity: Clone + Send + Sync;
    type Draft: Clone + Default + Send + Sync;
    type Write: Send + Sync;

    /// What the user manages here, used in notices ("budget items").
    fn noun(&self) -> &'static str;

    /// Every expected key with its entity. Keys without a stored row carry a
    /// synthesized empty entity.
    async fn fetch(
        &self,
        gateway: &dyn Gateway,
        wedding_id: &str,
    ) -> Result<Vec<(Self::Key, Self::Entity)>, AppError>;

    fn draft_of(&self, entity: &Self::Entity) -> Self::Draft;

    /// Validates and normalizes one draft. Must not perform I/O.
    fn prepare(
        &self,
        key: &Self::Key,
        entity: &Self::Entity,
        draft: &Self::Draft,
    ) -> Result<Self::Write, AppError>;

    /// Updates the stored row when the entity has an id, inserts otherwise.
    async fn persist(
        &self,
        gateway: &dyn Gateway,
        wedding_id: &str,
        entity: &Self::Entity,
        write: &Self::Write,
    ) -> Result<(), AppError>;
}

pub struct DraftController<S: DraftSchema> {
    ctx: ScreenContext,
    schema: S,
    entries: Vec<(S::Key, S::Entity)>,
    /// Wedding the entries were fetched for.
    loaded_for: Option<String>,
    drafts: HashMap<S::Key, S::Draft>,
    mode: EditMode,
    loading: bool,
}

impl<S: DraftSchema> DraftController<S> {
    pub fn new(ctx: ScreenContext, schema: S) -> Self {
        Self {
            ctx,
            schema,
            entries: Vec::new(),
            loaded_for: None,
            drafts: HashMap::new(),
            mode: EditMode::Viewing,
            loading: false,
        }
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    pub fn entries(&self) -> &[(S::Key, S::Entity)] {
        &self.entries
    }

    pub fn entity(&self, key: &S::Key) -> Option<&S::Entity> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, e)| e)
    }

    pub fn draft(&self, key: &S::Key) -> Option<&S::Draft> {
        self.drafts.get(key)
    }

    /// Mutable draft for `key`; only available while editing.
    pub fn draft_mut(&mut self, key: &S::Key) -> Option<&mut S::Draft> {
        if !self.mode.is_editing() {
            return None;
        }
        self.drafts.get_mut(key)
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.mode.is_editing()
    }

    pub fn is_saving(&self) -> bool {
        self.mode.is_saving()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// True when the entries were fetched for a wedding that is no longer
    /// active.
    pub fn is_stale(&self) -> bool {
        self.loaded_for.is_some() && self.loaded_for != self.ctx.wedding.current()
    }

    /// Fetches the keyed set for the active wedding. Without an active
    /// wedding this does nothing. On failure the previous entries stay.
    /// Loading another wedding's set ends any edit in progress.
    pub async fn load(&mut self) -> Result<(), AppError> {
        let Some(wedding_id) = self.ctx.wedding.current() else {
            return Ok(());
        };
        self.loading = true;
        let result = self.schema.fetch(self.ctx.gateway(), &wedding_id).await;
        self.loading = false;

        let entries = self.ctx.report(result, &format!("Failed to load {}", self.schema.noun()))?;
        if !self.ctx.is_current(&wedding_id) {
            tracing::debug!(wedding_id, "discarding load for a wedding that is no longer active");
            return Ok(());
        }
        if self.loaded_for.is_some() && self.loaded_for.as_deref() != Some(wedding_id.as_str()) {
            self.mode.cancel();
        }
        self.entries = entries;
        self.loaded_for = Some(wedding_id);
        if !self.mode.is_editing() {
            self.reset_drafts();
        }
        Ok(())
    }

    /// Snapshots canonical entries into the draft. Calling it again while
    /// already editing keeps the draft as it is. Refused while the entries
    /// belong to another wedding; reload first.
    pub fn start_edit(&mut self) -> bool {
        if self.is_stale() || !self.mode.begin_edit() {
            return false;
        }
        self.reset_drafts();
        true
    }

    /// Drops the draft and re-derives it from the canonical entries.
    pub fn cancel_edit(&mut self) {
        if self.mode.cancel() {
            self.reset_drafts();
        }
    }

    /// Writes every draft back, updating rows that exist and inserting the
    /// rest, then reloads. If any write fails the save fails as a whole and
    /// the draft is kept for a retry; writes that already succeeded stay.
    pub async fn save(&mut self) -> Result<(), AppError> {
        let wedding_id = self.ctx.report(
            self.ctx.require_wedding(self.schema.noun()),
            "No wedding selected",
        )?;
        if self.is_stale() {
            return self.discard_stale_edit().await;
        }
        if !self.mode.begin_save() {
            return Ok(());
        }

        let result = self.write_all(&wedding_id).await;
        let result = self.ctx.report(result, &format!("Failed to save {}", self.schema.noun()));
        if result.is_ok() {
            // Reload failures are reported by load itself; the writes landed.
            let _ = self.load().await;
        }
        self.mode.finish_save(result.is_ok());
        if result.is_ok() {
            self.reset_drafts();
        }
        result
    }

    /// The draft was made against another wedding's entries. Nothing is
    /// written; the edit ends and the active wedding's set is loaded.
    async fn discard_stale_edit(&mut self) -> Result<(), AppError> {
        tracing::warn!(
            loaded_for = ?self.loaded_for,
            "refusing to save {} loaded for another wedding",
            self.schema.noun()
        );
        let err = AppError::precondition(
            "Wedding changed",
            format!(
                "The {} were reloaded for the selected wedding. Your changes were not saved.",
                self.schema.noun()
            ),
        );
        self.mode.cancel();
        self.entries.clear();
        self.loaded_for = None;
        self.reset_drafts();
        let _ = self.load().await;
        self.ctx.report(Err(err), "Wedding changed")
    }

    async fn write_all(&self, wedding_id: &str) -> Result<(), AppError> {
        let empty = S::Draft::default();
        let mut writes = Vec::with_capacity(self.entries.len());
        for (key, entity) in &self.entries {
            let draft = self.drafts.get(key).unwrap_or(&empty);
            writes.push((entity, self.schema.prepare(key, entity, draft)?));
        }

        let gateway = self.ctx.gateway();
        let results = join_all(
            writes
                .iter()
                .map(|(entity, write)| self.schema.persist(gateway, wedding_id, entity, write)),
        )
        .await;
        results.into_iter().collect::<Result<Vec<()>, AppError>>()?;
        Ok(())
    }

    fn reset_drafts(&mut self) {
        self.drafts = self
            .entries
            .iter()
            .map(|(key, entity)| (key.clone(), self.schema.draft_of(entity)))
            .collect();
    }
}
