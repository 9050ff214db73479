//! SQLite storage backend

use super::mapper::{self, AssetRow, PackedLayout, RelationshipRow};
use super::traits::{
    AssetLink, AssetStore, DrawingId, DrawingMeta, OpenStore, StorageError, StorageResult,
};
use crate::catalog::ShapeCatalog;
use crate::model::Diagram;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Transaction};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// SQLite-backed drawing store
///
/// A single database file holds every drawing: one row of metadata per
/// drawing, plus its flattened assets and relationships. Cross-page links
/// live in their own table, endpoints in lexicographic order so each pair
/// appears exactly once. Thread-safe via internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    catalog: ShapeCatalog,
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Drawings table
            CREATE TABLE IF NOT EXISTS drawings (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Assets table: flattened diagram nodes, scoped to a drawing.
            -- The tag is extracted from the properties so the link pass can
            -- match on it with an index.
            CREATE TABLE IF NOT EXISTS assets (
                id TEXT NOT NULL,
                drawing_id TEXT NOT NULL,
                tag TEXT,
                labels_json TEXT NOT NULL,
                layout_json TEXT,
                props_json TEXT NOT NULL,
                PRIMARY KEY (drawing_id, id)
            );

            CREATE INDEX IF NOT EXISTS idx_assets_drawing
                ON assets(drawing_id);
            CREATE INDEX IF NOT EXISTS idx_assets_tag
                ON assets(tag);

            -- Relationships table: PIPE / CONTROLS / MEASURES rows
            CREATE TABLE IF NOT EXISTS relationships (
                id TEXT NOT NULL,
                drawing_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                source_id TEXT NOT NULL,
                target_id TEXT NOT NULL,
                props_json TEXT NOT NULL,
                PRIMARY KEY (drawing_id, id)
            );

            CREATE INDEX IF NOT EXISTS idx_relationships_drawing
                ON relationships(drawing_id);

            -- Cross-page links between tagged connectors. Endpoints are
            -- stored in lexicographic order (a_id < b_id) so the pair is
            -- canonical and the primary key makes linking idempotent.
            CREATE TABLE IF NOT EXISTS links (
                a_id TEXT NOT NULL,
                b_id TEXT NOT NULL,
                tag TEXT NOT NULL,
                PRIMARY KEY (a_id, b_id)
            );

            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    /// Repair inconsistencies left by interrupted writes or external edits.
    ///
    /// Assets whose drawing row is missing get a placeholder drawing named
    /// "Recovered-<id>" so their content stays reachable. Duplicate-named
    /// drawings that are empty are dropped, keeping the oldest row.
    fn recover(conn: &Connection) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let recovered = conn.execute(
            r#"
            INSERT INTO drawings (id, name, created_at, updated_at)
            SELECT DISTINCT a.drawing_id, 'Recovered-' || a.drawing_id, ?1, ?1
            FROM assets a
            WHERE a.drawing_id NOT IN (SELECT id FROM drawings)
            "#,
            params![now],
        )?;
        if recovered > 0 {
            info!(count = recovered, "recovered orphaned drawings");
        }

        let deduped = conn.execute(
            r#"
            DELETE FROM drawings WHERE id IN (
                SELECT d.id FROM drawings d
                JOIN drawings k ON k.name = d.name AND k.created_at < d.created_at
                WHERE NOT EXISTS (SELECT 1 FROM assets WHERE drawing_id = d.id)
            )
            "#,
            [],
        )?;
        if deduped > 0 {
            info!(count = deduped, "removed empty duplicate drawings");
        }
        Ok(())
    }

    /// Use a different shape catalog when rebuilding loaded diagrams
    pub fn with_catalog(mut self, catalog: ShapeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    fn parse_date(s: &str) -> StorageResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| StorageError::DateParse(e.to_string()))
    }

    /// Rebuild the cross-page links involving the given drawing.
    ///
    /// Any link that dangles or touches this drawing is dropped, then every
    /// pair of connector assets in different drawings sharing a non-empty
    /// tag is re-inserted in canonical order. Only connector-labelled assets
    /// take part; two tanks sharing a tag are never paired. Running this
    /// twice in a row is a no-op.
    fn relink(tx: &Transaction<'_>, drawing_id: &str) -> StorageResult<()> {
        tx.execute(
            r#"
            DELETE FROM links
            WHERE a_id NOT IN (SELECT id FROM assets)
               OR b_id NOT IN (SELECT id FROM assets)
               OR a_id IN (SELECT id FROM assets WHERE drawing_id = ?1)
               OR b_id IN (SELECT id FROM assets WHERE drawing_id = ?1)
            "#,
            params![drawing_id],
        )?;
        let connector = format!("%\"{}\"%", mapper::CONNECTOR_LABEL);
        tx.execute(
            r#"
            INSERT OR IGNORE INTO links (a_id, b_id, tag)
            SELECT a.id, b.id, a.tag
            FROM assets a
            JOIN assets b
              ON b.tag = a.tag
             AND b.drawing_id <> a.drawing_id
             AND a.id < b.id
            WHERE a.tag IS NOT NULL AND a.tag <> ''
              AND a.labels_json LIKE ?2
              AND b.labels_json LIKE ?2
              AND (a.drawing_id = ?1 OR b.drawing_id = ?1)
            "#,
            params![drawing_id, connector],
        )?;
        Ok(())
    }

    fn read_rows(
        conn: &Connection,
        drawing_id: &str,
    ) -> StorageResult<(Vec<AssetRow>, Vec<RelationshipRow>)> {
        let mut stmt = conn.prepare(
            "SELECT id, labels_json, layout_json, props_json FROM assets WHERE drawing_id = ?1",
        )?;
        let assets = stmt
            .query_map(params![drawing_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|(id, labels, layout, props)| {
                Ok(AssetRow {
                    id,
                    labels: serde_json::from_str(&labels)?,
                    layout: layout
                        .map(|l| serde_json::from_str::<PackedLayout>(&l))
                        .transpose()?,
                    props: serde_json::from_str(&props)?,
                })
            })
            .collect::<StorageResult<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            "SELECT id, kind, source_id, target_id, props_json FROM relationships WHERE drawing_id = ?1",
        )?;
        let rels = stmt
            .query_map(params![drawing_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|(id, kind, source, target, props)| {
                Ok(RelationshipRow {
                    id,
                    kind,
                    source,
                    target,
                    props: serde_json::from_str(&props)?,
                })
            })
            .collect::<StorageResult<Vec<_>>>()?;

        Ok((assets, rels))
    }
}

impl AssetStore for SqliteStore {
    fn list_drawings(&self) -> StorageResult<Vec<DrawingMeta>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, created_at, updated_at FROM drawings ORDER BY created_at ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(id, name, created, updated)| {
                Ok(DrawingMeta {
                    id: DrawingId::from_string(id),
                    name,
                    created_at: Self::parse_date(&created)?,
                    updated_at: Self::parse_date(&updated)?,
                })
            })
            .collect()
    }

    fn create_drawing(&self, name: &str) -> StorageResult<DrawingMeta> {
        let meta = DrawingMeta {
            id: DrawingId::new(),
            name: name.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO drawings (id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                meta.id.as_str(),
                meta.name,
                meta.created_at.to_rfc3339(),
                meta.updated_at.to_rfc3339()
            ],
        )?;
        Ok(meta)
    }

    fn rename_drawing(&self, id: &DrawingId, name: &str) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE drawings SET name = ?1, updated_at = ?2 WHERE id = ?3",
            params![name, Utc::now().to_rfc3339(), id.as_str()],
        )?;
        if changed == 0 {
            return Err(StorageError::DrawingNotFound(id.to_string()));
        }
        Ok(())
    }

    fn delete_drawing(&self, id: &DrawingId) -> StorageResult<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM links
             WHERE a_id IN (SELECT id FROM assets WHERE drawing_id = ?1)
                OR b_id IN (SELECT id FROM assets WHERE drawing_id = ?1)",
            params![id.as_str()],
        )?;
        tx.execute("DELETE FROM relationships WHERE drawing_id = ?1", params![id.as_str()])?;
        tx.execute("DELETE FROM assets WHERE drawing_id = ?1", params![id.as_str()])?;
        let deleted = tx.execute("DELETE FROM drawings WHERE id = ?1", params![id.as_str()])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    fn save_drawing(&self, id: &DrawingId, diagram: &Diagram) -> StorageResult<()> {
        let (assets, rels) = mapper::diagram_to_rows(diagram);

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let touched = tx.execute(
            "UPDATE drawings SET updated_at = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), id.as_str()],
        )?;
        if touched == 0 {
            return Err(StorageError::DrawingNotFound(id.to_string()));
        }

        // Full replacement of this drawing's scope; other drawings are
        // untouched.
        tx.execute("DELETE FROM relationships WHERE drawing_id = ?1", params![id.as_str()])?;
        tx.execute("DELETE FROM assets WHERE drawing_id = ?1", params![id.as_str()])?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO assets (id, drawing_id, tag, labels_json, layout_json, props_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in &assets {
                let tag = row.props.get("tag").and_then(|v| v.as_str());
                let layout = row
                    .layout
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?;
                stmt.execute(params![
                    row.id,
                    id.as_str(),
                    tag,
                    serde_json::to_string(&row.labels)?,
                    layout,
                    serde_json::to_string(&row.props)?,
                ])?;
            }
        }
        {
            let mut stmt = tx.prepare(
                "INSERT INTO relationships (id, drawing_id, kind, source_id, target_id, props_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in &rels {
                stmt.execute(params![
                    row.id,
                    id.as_str(),
                    row.kind,
                    row.source,
                    row.target,
                    serde_json::to_string(&row.props)?,
                ])?;
            }
        }

        Self::relink(&tx, id.as_str())?;
        tx.commit()?;
        Ok(())
    }

    fn load_drawing(&self, id: &DrawingId) -> StorageResult<Diagram> {
        let conn = self.conn.lock().unwrap();
        let exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM drawings WHERE id = ?1",
            params![id.as_str()],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(StorageError::DrawingNotFound(id.to_string()));
        }
        let (assets, rels) = Self::read_rows(&conn, id.as_str())?;
        mapper::diagram_from_rows(&assets, &rels, &self.catalog)
    }

    fn list_links(&self) -> StorageResult<Vec<AssetLink>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT a_id, b_id, tag FROM links ORDER BY a_id, b_id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(AssetLink {
                    a: row.get(0)?,
                    b: row.get(1)?,
                    tag: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Self::recover(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            catalog: ShapeCatalog::builtin(),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Self::recover(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            catalog: ShapeCatalog::builtin(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DiagramEdge, DiagramNode, EdgeKind, Endpoint, PipeAttrs, SignalKind};

    fn test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn opc_with_tag(catalog: &ShapeCatalog, tag: &str) -> DiagramNode {
        catalog.instantiate("p-opc").unwrap().with_tag(tag)
    }

    #[test]
    fn test_create_list_rename_delete() {
        let store = test_store();
        let a = store.create_drawing("Area 100").unwrap();
        let b = store.create_drawing("Area 200").unwrap();

        let listed = store.list_drawings().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, a.id);

        store.rename_drawing(&b.id, "Area 200 rev B").unwrap();
        let listed = store.list_drawings().unwrap();
        assert_eq!(listed[1].name, "Area 200 rev B");

        assert!(store.delete_drawing(&a.id).unwrap());
        assert!(!store.delete_drawing(&a.id).unwrap());
        assert_eq!(store.list_drawings().unwrap().len(), 1);
    }

    #[test]
    fn test_rename_missing_drawing() {
        let store = test_store();
        let err = store.rename_drawing(&DrawingId::from_string("nope"), "x");
        assert!(matches!(err, Err(StorageError::DrawingNotFound(_))));
    }

    #[test]
    fn test_save_missing_drawing() {
        let store = test_store();
        let err = store.save_drawing(&DrawingId::from_string("nope"), &Diagram::new());
        assert!(matches!(err, Err(StorageError::DrawingNotFound(_))));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let store = test_store();
        let catalog = ShapeCatalog::builtin();
        let meta = store.create_drawing("Area 100").unwrap();

        let mut diagram = Diagram::new();
        let pump = diagram.add_node(
            catalog.instantiate("p-centrifugalpump").unwrap().with_position(0.0, 100.0),
        );
        let tank = diagram.add_node(
            catalog.instantiate("p-tank").unwrap().with_position(300.0, 0.0),
        );
        let tap = diagram.add_node(
            catalog.instantiate("tapping-point").unwrap().with_position(150.0, 114.0),
        );
        let inst = diagram.add_node(
            catalog.instantiate("p-inst-remote").unwrap().with_position(130.0, 300.0),
        );
        diagram
            .add_edge(
                DiagramEdge::new(
                    EdgeKind::Pipe,
                    Endpoint::port(pump.clone(), "discharge"),
                    Endpoint::node(tap.clone()),
                )
                .with_attrs(PipeAttrs {
                    fluid: "Steam".to_string(),
                    insulation: "ST".to_string(),
                    ..Default::default()
                }),
            )
            .unwrap();
        diagram
            .add_edge(DiagramEdge::new(
                EdgeKind::Pipe,
                Endpoint::node(tap.clone()),
                Endpoint::port(tank, "inlet"),
            ))
            .unwrap();
        diagram
            .add_edge(DiagramEdge::new(
                EdgeKind::Signal(SignalKind::Measures),
                Endpoint::node(tap.clone()),
                Endpoint::port(inst.clone(), "signal"),
            ))
            .unwrap();

        store.save_drawing(&meta.id, &diagram).unwrap();
        let loaded = store.load_drawing(&meta.id).unwrap();

        assert_eq!(loaded.node_count(), 4);
        assert_eq!(loaded.edge_count(), 3);
        assert!(!loaded.is_dirty());

        // Measurement direction restored to diagram convention.
        let measures = loaded
            .edges()
            .find(|e| e.kind == EdgeKind::Signal(SignalKind::Measures))
            .unwrap();
        assert_eq!(measures.source.node, tap);
        assert_eq!(measures.target.node, inst);

        // Style re-derived from fluid and insulation, not persisted.
        let steam = loaded.edges().find(|e| e.attrs.fluid == "Steam").unwrap();
        assert_eq!(steam.attrs.insulation, "ST");
        assert_eq!(steam.style.dash.as_deref(), Some("5 5"));
        assert_eq!(steam.source.port.as_deref(), Some("discharge"));
    }

    #[test]
    fn test_linker_connects_shared_tags_across_drawings() {
        let store = test_store();
        let catalog = ShapeCatalog::builtin();
        let d1 = store.create_drawing("Area 100").unwrap();
        let d2 = store.create_drawing("Area 200").unwrap();

        let mut g1 = Diagram::new();
        g1.add_node(opc_with_tag(&catalog, "TO-201"));
        let mut g2 = Diagram::new();
        g2.add_node(opc_with_tag(&catalog, "TO-201"));

        store.save_drawing(&d1.id, &g1).unwrap();
        store.save_drawing(&d2.id, &g2).unwrap();

        let links = store.list_links().unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].tag, "TO-201");
        assert!(links[0].a < links[0].b);
    }

    #[test]
    fn test_linker_is_idempotent() {
        let store = test_store();
        let catalog = ShapeCatalog::builtin();
        let d1 = store.create_drawing("Area 100").unwrap();
        let d2 = store.create_drawing("Area 200").unwrap();

        let mut g1 = Diagram::new();
        g1.add_node(opc_with_tag(&catalog, "TO-201"));
        let mut g2 = Diagram::new();
        g2.add_node(opc_with_tag(&catalog, "TO-201"));

        store.save_drawing(&d1.id, &g1).unwrap();
        store.save_drawing(&d2.id, &g2).unwrap();
        // Re-saving either side must not duplicate or flip the link.
        let before = store.list_links().unwrap();
        store.save_drawing(&d1.id, &g1).unwrap();
        store.save_drawing(&d2.id, &g2).unwrap();
        assert_eq!(store.list_links().unwrap(), before);
    }

    #[test]
    fn test_linker_ignores_empty_tags_and_same_drawing() {
        let store = test_store();
        let catalog = ShapeCatalog::builtin();
        let d1 = store.create_drawing("Area 100").unwrap();

        // Two untagged connectors plus two sharing a tag, all on one page.
        let mut g1 = Diagram::new();
        g1.add_node(catalog.instantiate("p-opc").unwrap());
        g1.add_node(catalog.instantiate("p-opc").unwrap());
        g1.add_node(opc_with_tag(&catalog, "TO-300"));
        g1.add_node(opc_with_tag(&catalog, "TO-300"));
        store.save_drawing(&d1.id, &g1).unwrap();

        assert!(store.list_links().unwrap().is_empty());
    }

    #[test]
    fn test_linker_ignores_non_connector_assets() {
        let store = test_store();
        let catalog = ShapeCatalog::builtin();
        let d1 = store.create_drawing("Area 100").unwrap();
        let d2 = store.create_drawing("Area 200").unwrap();

        // Equipment sharing a tag across pages is not a page continuation.
        let mut g1 = Diagram::new();
        g1.add_node(catalog.instantiate("p-tank").unwrap().with_tag("T-101"));
        let mut g2 = Diagram::new();
        g2.add_node(catalog.instantiate("p-tank").unwrap().with_tag("T-101"));
        store.save_drawing(&d1.id, &g1).unwrap();
        store.save_drawing(&d2.id, &g2).unwrap();

        assert!(store.list_links().unwrap().is_empty());
    }

    #[test]
    fn test_link_dropped_when_tag_changes() {
        let store = test_store();
        let catalog = ShapeCatalog::builtin();
        let d1 = store.create_drawing("Area 100").unwrap();
        let d2 = store.create_drawing("Area 200").unwrap();

        let mut g1 = Diagram::new();
        let opc = g1.add_node(opc_with_tag(&catalog, "TO-201"));
        let mut g2 = Diagram::new();
        g2.add_node(opc_with_tag(&catalog, "TO-201"));
        store.save_drawing(&d1.id, &g1).unwrap();
        store.save_drawing(&d2.id, &g2).unwrap();
        assert_eq!(store.list_links().unwrap().len(), 1);

        g1.node_mut(&opc).unwrap().tag = Some("TO-999".to_string());
        store.save_drawing(&d1.id, &g1).unwrap();
        assert!(store.list_links().unwrap().is_empty());
    }

    #[test]
    fn test_delete_drawing_drops_links() {
        let store = test_store();
        let catalog = ShapeCatalog::builtin();
        let d1 = store.create_drawing("Area 100").unwrap();
        let d2 = store.create_drawing("Area 200").unwrap();

        let mut g1 = Diagram::new();
        g1.add_node(opc_with_tag(&catalog, "TO-201"));
        let mut g2 = Diagram::new();
        g2.add_node(opc_with_tag(&catalog, "TO-201"));
        store.save_drawing(&d1.id, &g1).unwrap();
        store.save_drawing(&d2.id, &g2).unwrap();

        store.delete_drawing(&d1.id).unwrap();
        assert!(store.list_links().unwrap().is_empty());
        assert!(matches!(
            store.load_drawing(&d1.id),
            Err(StorageError::DrawingNotFound(_))
        ));
    }

    #[test]
    fn test_orphaned_assets_recovered_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flowsheet.db");

        let meta = {
            let store = SqliteStore::open(&path).unwrap();
            let catalog = ShapeCatalog::builtin();
            let meta = store.create_drawing("Area 100").unwrap();
            let mut g = Diagram::new();
            g.add_node(catalog.instantiate("p-tank").unwrap());
            store.save_drawing(&meta.id, &g).unwrap();
            meta
        };

        // Simulate a partial external edit: the drawing row vanishes but
        // its assets survive.
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute("DELETE FROM drawings WHERE id = ?1", params![meta.id.as_str()])
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let listed = store.list_drawings().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, format!("Recovered-{}", meta.id));
        assert_eq!(store.load_drawing(&listed[0].id).unwrap().node_count(), 1);
    }

    #[test]
    fn test_empty_duplicate_drawings_cleaned_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flowsheet.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            let catalog = ShapeCatalog::builtin();
            let first = store.create_drawing("Area 100").unwrap();
            let mut g = Diagram::new();
            g.add_node(catalog.instantiate("p-tank").unwrap());
            store.save_drawing(&first.id, &g).unwrap();
            // A stray empty duplicate of the same name.
            store.create_drawing("Area 100").unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let listed = store.list_drawings().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(store.load_drawing(&listed[0].id).unwrap().node_count(), 1);
    }
}
