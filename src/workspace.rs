//! Workspace: the drawing list and the active editing session
//!
//! One drawing is open at a time. Switching away from a dirty diagram
//! requires an explicit decision: save first, discard, or stay put. A
//! failed save always aborts the switch so edits are never silently lost.

use crate::store::{AssetStore, DrawingId, DrawingMeta, StorageError, StorageResult};
use crate::topology::Editor;
use tracing::{info, warn};

/// What to do with unsaved changes when leaving a drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchDecision {
    /// Persist the current diagram, then switch
    SaveThenSwitch,
    /// Drop unsaved changes and switch
    DiscardAndSwitch,
    /// Stay on the current drawing
    Cancel,
}

/// A store plus the drawing currently being edited
pub struct Workspace<S: AssetStore> {
    store: S,
    drawings: Vec<DrawingMeta>,
    current: DrawingId,
    editor: Editor,
}

impl<S: AssetStore> Workspace<S> {
    /// Open a workspace over a store. An empty store gets a first drawing
    /// created for it; otherwise the oldest drawing is opened.
    pub fn open(store: S) -> StorageResult<Self> {
        let mut drawings = store.list_drawings()?;
        if drawings.is_empty() {
            let meta = store.create_drawing("Drawing 1")?;
            info!(drawing = %meta.id, "created initial drawing");
            drawings.push(meta);
        }
        let current = drawings[0].id.clone();
        let diagram = store.load_drawing(&current)?;
        Ok(Self {
            store,
            drawings,
            current,
            editor: Editor::with_diagram(diagram),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn drawings(&self) -> &[DrawingMeta] {
        &self.drawings
    }

    pub fn current(&self) -> &DrawingId {
        &self.current
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn is_dirty(&self) -> bool {
        self.editor.diagram().is_dirty()
    }

    fn refresh(&mut self) -> StorageResult<()> {
        self.drawings = self.store.list_drawings()?;
        Ok(())
    }

    /// Create a new drawing without leaving the current one
    pub fn create_drawing(&mut self, name: &str) -> StorageResult<DrawingId> {
        let meta = self.store.create_drawing(name)?;
        let id = meta.id.clone();
        self.refresh()?;
        Ok(id)
    }

    pub fn rename_drawing(&mut self, id: &DrawingId, name: &str) -> StorageResult<()> {
        self.store.rename_drawing(id, name)?;
        self.refresh()
    }

    /// Delete a drawing. Deleting the open drawing moves the session to the
    /// oldest remaining one, creating a fresh drawing when none is left;
    /// unsaved changes on the deleted drawing go with it.
    pub fn delete_drawing(&mut self, id: &DrawingId) -> StorageResult<bool> {
        let deleted = self.store.delete_drawing(id)?;
        self.refresh()?;
        if deleted && *id == self.current {
            warn!(drawing = %id, "open drawing deleted");
            if self.drawings.is_empty() {
                let meta = self.store.create_drawing("Drawing 1")?;
                self.drawings.push(meta);
            }
            self.current = self.drawings[0].id.clone();
            let diagram = self.store.load_drawing(&self.current)?;
            self.editor = Editor::with_diagram(diagram);
        }
        Ok(deleted)
    }

    /// Persist the open drawing and clear its dirty flag
    pub fn save(&mut self) -> StorageResult<()> {
        self.store.save_drawing(&self.current, self.editor.diagram())?;
        self.editor.diagram_mut().clear_dirty();
        self.refresh()
    }

    /// Switch the session to another drawing.
    ///
    /// Returns `true` when the switch happened. With unsaved changes the
    /// decision controls what happens first; a failing save propagates its
    /// error and leaves the session on the current drawing.
    pub fn switch_to(&mut self, id: &DrawingId, decision: SwitchDecision) -> StorageResult<bool> {
        if *id == self.current {
            return Ok(true);
        }
        if !self.drawings.iter().any(|d| d.id == *id) {
            return Err(StorageError::DrawingNotFound(id.to_string()));
        }
        if self.is_dirty() {
            match decision {
                SwitchDecision::Cancel => return Ok(false),
                SwitchDecision::SaveThenSwitch => self.save()?,
                SwitchDecision::DiscardAndSwitch => {}
            }
        }
        let diagram = self.store.load_drawing(id)?;
        self.editor = Editor::with_diagram(diagram);
        self.current = id.clone();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ShapeCatalog;
    use crate::store::{OpenStore, SqliteStore};
    use crate::geometry::Point;

    fn workspace() -> Workspace<SqliteStore> {
        Workspace::open(SqliteStore::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn test_open_creates_initial_drawing() {
        let ws = workspace();
        assert_eq!(ws.drawings().len(), 1);
        assert_eq!(ws.drawings()[0].name, "Drawing 1");
        assert!(!ws.is_dirty());
    }

    #[test]
    fn test_save_clears_dirty() {
        let mut ws = workspace();
        let catalog = ShapeCatalog::builtin();
        ws.editor_mut()
            .add_shape(&catalog, "p-tank", Point::new(0.0, 0.0))
            .unwrap();
        assert!(ws.is_dirty());
        ws.save().unwrap();
        assert!(!ws.is_dirty());
    }

    #[test]
    fn test_switch_cancel_keeps_session() {
        let mut ws = workspace();
        let other = ws.create_drawing("Area 200").unwrap();
        let catalog = ShapeCatalog::builtin();
        ws.editor_mut()
            .add_shape(&catalog, "p-tank", Point::new(0.0, 0.0))
            .unwrap();

        let switched = ws.switch_to(&other, SwitchDecision::Cancel).unwrap();
        assert!(!switched);
        assert_ne!(*ws.current(), other);
        assert_eq!(ws.editor().diagram().node_count(), 1);
    }

    #[test]
    fn test_switch_save_then_switch_persists() {
        let mut ws = workspace();
        let first = ws.current().clone();
        let other = ws.create_drawing("Area 200").unwrap();
        let catalog = ShapeCatalog::builtin();
        ws.editor_mut()
            .add_shape(&catalog, "p-tank", Point::new(0.0, 0.0))
            .unwrap();

        assert!(ws.switch_to(&other, SwitchDecision::SaveThenSwitch).unwrap());
        assert_eq!(*ws.current(), other);
        assert_eq!(ws.editor().diagram().node_count(), 0);

        // The edit reached the store before the switch.
        assert_eq!(ws.store().load_drawing(&first).unwrap().node_count(), 1);
    }

    #[test]
    fn test_switch_discard_drops_changes() {
        let mut ws = workspace();
        let first = ws.current().clone();
        let other = ws.create_drawing("Area 200").unwrap();
        let catalog = ShapeCatalog::builtin();
        ws.editor_mut()
            .add_shape(&catalog, "p-tank", Point::new(0.0, 0.0))
            .unwrap();

        assert!(ws.switch_to(&other, SwitchDecision::DiscardAndSwitch).unwrap());
        assert_eq!(ws.store().load_drawing(&first).unwrap().node_count(), 0);
    }

    #[test]
    fn test_switch_to_unknown_drawing() {
        let mut ws = workspace();
        let err = ws.switch_to(&DrawingId::from_string("nope"), SwitchDecision::DiscardAndSwitch);
        assert!(matches!(err, Err(StorageError::DrawingNotFound(_))));
    }

    #[test]
    fn test_delete_open_drawing_moves_session() {
        let mut ws = workspace();
        let first = ws.current().clone();
        let other = ws.create_drawing("Area 200").unwrap();
        assert!(ws.delete_drawing(&first).unwrap());
        assert_eq!(*ws.current(), other);
        assert_eq!(ws.drawings().len(), 1);
    }

    #[test]
    fn test_delete_last_drawing_creates_fresh_one() {
        let mut ws = workspace();
        let first = ws.current().clone();
        assert!(ws.delete_drawing(&first).unwrap());
        assert_eq!(ws.drawings().len(), 1);
        assert_ne!(*ws.current(), first);
    }
}
