//! Save/load orchestration: one session per save-slot lifecycle.
//!
//! The session is the explicit context object that replaces process-wide
//! state: it owns the tenant registry, the guid manager, and the slot store,
//! and it is constructed fresh for each save-slot session and dropped when
//! the session ends. The host calls [`SaveSession::save_all`] after its own
//! save completes and [`SaveSession::load_all`] after its own load; those
//! are the only two entry points.

use crate::registry::{TenantError, TenantRegistry};
use crate::store::{PersistError, SlotStore, TenantPayload};
use modsave_guid::GuidManager;
use modsave_scene::Scene;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Reserved tenant key for the identity snapshot payload.
pub const GUID_TENANT_KEY: &str = "guid_manager";

/// Per-tenant outcome of one save or load cycle.
#[derive(Debug)]
pub enum TenantOutcome {
    /// The hook ran and its payload was carried.
    Ok,
    /// The hook failed; this tenant's cycle was skipped.
    Failed(TenantError),
    /// The payload had no registered tenant (load only).
    Unknown,
}

/// Result of one save cycle: where the container landed and what happened to
/// each tenant.
#[derive(Debug)]
pub struct SaveReport {
    pub path: PathBuf,
    pub tenants: Vec<(String, TenantOutcome)>,
}

/// Result of one load cycle. `fresh` means no container existed for the
/// slot and nothing was dispatched.
#[derive(Debug)]
pub struct LoadReport {
    pub fresh: bool,
    pub tenants: Vec<(String, TenantOutcome)>,
}

/// Orchestrates every registered tenant around one save slot.
///
/// The guid tenant is registered first by the constructor, so its payload
/// leads the container by convention. The scene and manager handles are
/// shared with that tenant's hooks; everything runs on one thread and the
/// host never issues overlapping save/load calls.
pub struct SaveSession {
    slot: u32,
    store: SlotStore,
    registry: TenantRegistry,
    manager: Rc<RefCell<GuidManager>>,
}

impl SaveSession {
    /// Create a session for `slot` under the host-provided data root.
    pub fn new(root: impl AsRef<Path>, slot: u32, scene: Rc<RefCell<Scene>>) -> Self {
        let manager = Rc::new(RefCell::new(GuidManager::new()));
        let mut registry = TenantRegistry::new();
        register_guid_tenant(&mut registry, scene, Rc::clone(&manager));
        Self {
            slot,
            store: SlotStore::new(root),
            registry,
            manager,
        }
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// The registry other modules register their hooks into.
    pub fn registry_mut(&mut self) -> &mut TenantRegistry {
        &mut self.registry
    }

    /// Handle to the session's guid manager, for identity queries.
    pub fn guid_manager(&self) -> Rc<RefCell<GuidManager>> {
        Rc::clone(&self.manager)
    }

    /// Run every tenant's save hook and write the container. Invoked once
    /// after each host save.
    ///
    /// Tenants save in registration order. A failing hook is logged,
    /// recorded in the report, and skipped for this cycle; its previously
    /// persisted payload is simply not refreshed. A container-level write
    /// failure aborts this save only and is returned to the caller.
    pub fn save_all(&mut self) -> Result<SaveReport, PersistError> {
        let mut payloads = Vec::new();
        let mut tenants = Vec::new();
        for (key, tenant) in self.registry.iter_mut() {
            match tenant.save() {
                Ok(payload) => {
                    payloads.push(TenantPayload {
                        tenant_key: key.to_string(),
                        payload,
                    });
                    tenants.push((key.to_string(), TenantOutcome::Ok));
                }
                Err(err) => {
                    tracing::warn!(key, %err, "tenant save failed, skipping for this cycle");
                    tenants.push((key.to_string(), TenantOutcome::Failed(err)));
                }
            }
        }

        let path = self.store.write(self.slot, &payloads)?;
        tracing::debug!(
            path = %path.display(),
            carried = payloads.len(),
            "container written"
        );
        Ok(SaveReport { path, tenants })
    }

    /// Read the container and dispatch each payload to its tenant. Invoked
    /// once after each host load.
    ///
    /// A missing container is a fresh slot: nothing is dispatched and that
    /// is success. A read or decode failure is critical: no tenant loads at
    /// all, and every tenant stays in its pre-load state. Dispatch follows
    /// container order, not registration order; a payload whose key has no
    /// registered tenant is skipped with a warning, and one tenant's load
    /// failure never stops the rest.
    pub fn load_all(&mut self) -> Result<LoadReport, PersistError> {
        let payloads = match self.store.read(self.slot) {
            Ok(Some(payloads)) => payloads,
            Ok(None) => {
                tracing::debug!(slot = self.slot, "no container for slot, fresh session");
                return Ok(LoadReport {
                    fresh: true,
                    tenants: Vec::new(),
                });
            }
            Err(err) => {
                tracing::error!(slot = self.slot, %err, "container unreadable, skipping all tenant loads");
                return Err(err);
            }
        };

        let mut tenants = Vec::new();
        for entry in &payloads {
            let Some(tenant) = self.registry.get_mut(&entry.tenant_key) else {
                tracing::warn!(key = %entry.tenant_key, "payload for unregistered tenant, skipping");
                tenants.push((entry.tenant_key.clone(), TenantOutcome::Unknown));
                continue;
            };
            match tenant.load(&entry.payload) {
                Ok(()) => tenants.push((entry.tenant_key.clone(), TenantOutcome::Ok)),
                Err(err) => {
                    tracing::warn!(key = %entry.tenant_key, %err, "tenant load failed");
                    tenants.push((entry.tenant_key.clone(), TenantOutcome::Failed(err)));
                }
            }
        }
        Ok(LoadReport {
            fresh: false,
            tenants,
        })
    }
}

/// Register the identity tenant: its hooks close over the shared scene and
/// manager and delegate to [`GuidManager::capture`] and
/// [`GuidManager::restore`].
fn register_guid_tenant(
    registry: &mut TenantRegistry,
    scene: Rc<RefCell<Scene>>,
    manager: Rc<RefCell<GuidManager>>,
) {
    let save_scene = Rc::clone(&scene);
    let save_manager = Rc::clone(&manager);
    registry.register_fns(
        GUID_TENANT_KEY,
        move || {
            let scene = save_scene.borrow();
            save_manager
                .borrow_mut()
                .capture(scene.objects_registered_to_save())
                .map_err(|err| TenantError::new(err.to_string()))
        },
        move |payload| {
            let mut scene = scene.borrow_mut();
            manager
                .borrow_mut()
                .restore(scene.objects_registered_to_save_mut(), Some(payload))
                .map_err(|err| TenantError::new(err.to_string()))
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use modsave_common::{Guid, Transform};
    use modsave_guid::GUID_BASE;
    use modsave_scene::SceneObject;
    use std::cell::Cell;
    use std::fs;

    fn scene_of(names: &[&str]) -> Rc<RefCell<Scene>> {
        let mut scene = Scene::new();
        for name in names {
            scene.register(SceneObject::new(*name, "prop", Transform::default()));
        }
        Rc::new(RefCell::new(scene))
    }

    #[test]
    fn fresh_slot_loads_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let scene = scene_of(&["a"]);
        let mut session = SaveSession::new(tmp.path(), 1, scene);

        let report = session.load_all().unwrap();
        assert!(report.fresh);
        assert!(report.tenants.is_empty());
    }

    #[test]
    fn save_then_reload_reattaches_identities() {
        let tmp = tempfile::tempdir().unwrap();

        // First run: three untagged objects, save.
        let scene = scene_of(&["a", "b", "c"]);
        let mut session = SaveSession::new(tmp.path(), 1, Rc::clone(&scene));
        let report = session.save_all().unwrap();
        assert!(matches!(report.tenants[0], (ref k, TenantOutcome::Ok) if k == GUID_TENANT_KEY));

        // Second run: fresh session and scene, same objects in the same order.
        let scene = scene_of(&["a", "b", "c"]);
        let mut session = SaveSession::new(tmp.path(), 1, Rc::clone(&scene));
        let report = session.load_all().unwrap();
        assert!(!report.fresh);

        let scene = scene.borrow();
        let guids: Vec<Option<Guid>> = scene
            .objects_registered_to_save()
            .iter()
            .map(|o| o.guid())
            .collect();
        assert_eq!(
            guids,
            [
                Some(Guid(0x1000_0001)),
                Some(Guid(0x1000_0002)),
                Some(Guid(0x1000_0003)),
            ]
        );
        // Counter rehydrated: next allocation clears every restored guid.
        assert_eq!(
            session.guid_manager().borrow_mut().allocate(),
            Guid(0x1000_0004)
        );
    }

    #[test]
    fn tenant_save_failure_does_not_stop_the_cycle() {
        let tmp = tempfile::tempdir().unwrap();
        let scene = scene_of(&[]);
        let mut session = SaveSession::new(tmp.path(), 1, scene);

        session.registry_mut().register_fns(
            "broken",
            || Err(TenantError::new("save exploded")),
            |_| Ok(()),
        );
        session
            .registry_mut()
            .register_fns("notes", || Ok("payload".to_string()), |_| Ok(()));

        let report = session.save_all().unwrap();
        assert!(matches!(report.tenants[1].1, TenantOutcome::Failed(_)));
        assert!(matches!(report.tenants[2].1, TenantOutcome::Ok));

        // The broken tenant's payload is simply absent from the container.
        let store = SlotStore::new(tmp.path());
        let container = store.read(1).unwrap().unwrap();
        let keys: Vec<&str> = container.iter().map(|p| p.tenant_key.as_str()).collect();
        assert_eq!(keys, [GUID_TENANT_KEY, "notes"]);
    }

    #[test]
    fn tenant_load_failure_is_isolated() {
        let tmp = tempfile::tempdir().unwrap();
        let scene = scene_of(&[]);
        let mut session = SaveSession::new(tmp.path(), 1, Rc::clone(&scene));

        let loaded = Rc::new(Cell::new(false));
        let loaded_flag = Rc::clone(&loaded);
        session.registry_mut().register_fns(
            "broken",
            || Ok("x".to_string()),
            |_| Err(TenantError::new("load exploded")),
        );
        session.registry_mut().register_fns(
            "notes",
            || Ok("payload".to_string()),
            move |_| {
                loaded_flag.set(true);
                Ok(())
            },
        );

        session.save_all().unwrap();
        let report = session.load_all().unwrap();

        assert!(loaded.get());
        assert!(
            report
                .tenants
                .iter()
                .any(|(k, o)| k == "broken" && matches!(o, TenantOutcome::Failed(_)))
        );
    }

    #[test]
    fn unknown_tenant_payload_is_skipped_with_warning() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SlotStore::new(tmp.path());
        store
            .write(
                1,
                &[
                    TenantPayload {
                        tenant_key: "long_gone_mod".to_string(),
                        payload: "whatever".to_string(),
                    },
                    TenantPayload {
                        tenant_key: "notes".to_string(),
                        payload: "kept".to_string(),
                    },
                ],
            )
            .unwrap();

        let scene = scene_of(&[]);
        let mut session = SaveSession::new(tmp.path(), 1, scene);
        let seen = Rc::new(RefCell::new(String::new()));
        let seen_sink = Rc::clone(&seen);
        session.registry_mut().register_fns(
            "notes",
            || Ok(String::new()),
            move |payload| {
                *seen_sink.borrow_mut() = payload.to_string();
                Ok(())
            },
        );

        let report = session.load_all().unwrap();
        assert!(
            report
                .tenants
                .iter()
                .any(|(k, o)| k == "long_gone_mod" && matches!(o, TenantOutcome::Unknown))
        );
        assert_eq!(*seen.borrow(), "kept");
    }

    #[test]
    fn corrupt_container_skips_every_tenant_load() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SlotStore::new(tmp.path());
        fs::write(store.slot_path(1), "definitely not json\n").unwrap();

        let scene = scene_of(&["a"]);
        let mut session = SaveSession::new(tmp.path(), 1, Rc::clone(&scene));
        let called = Rc::new(Cell::new(false));
        let called_flag = Rc::clone(&called);
        session.registry_mut().register_fns(
            "notes",
            || Ok(String::new()),
            move |_| {
                called_flag.set(true);
                Ok(())
            },
        );

        assert!(matches!(session.load_all(), Err(PersistError::Decode(_))));
        assert!(!called.get());
        assert!(scene.borrow().objects_registered_to_save()[0].guid().is_none());
    }

    #[test]
    fn identity_mismatch_aborts_only_the_guid_tenant() {
        let tmp = tempfile::tempdir().unwrap();

        // Save against three objects.
        let scene = scene_of(&["a", "b", "c"]);
        let mut session = SaveSession::new(tmp.path(), 1, scene);
        session
            .registry_mut()
            .register_fns("notes", || Ok("kept".to_string()), |_| Ok(()));
        session.save_all().unwrap();

        // Reload against two: structural corruption for the guid tenant only.
        let scene = scene_of(&["a", "b"]);
        let mut session = SaveSession::new(tmp.path(), 1, Rc::clone(&scene));
        let notes_loaded = Rc::new(Cell::new(false));
        let notes_flag = Rc::clone(&notes_loaded);
        session.registry_mut().register_fns(
            "notes",
            || Ok(String::new()),
            move |_| {
                notes_flag.set(true);
                Ok(())
            },
        );

        let report = session.load_all().unwrap();
        assert!(
            report
                .tenants
                .iter()
                .any(|(k, o)| k == GUID_TENANT_KEY && matches!(o, TenantOutcome::Failed(_)))
        );
        assert!(notes_loaded.get());

        // No partial identity assignment, counter at its reset value.
        assert!(
            scene
                .borrow()
                .objects_registered_to_save()
                .iter()
                .all(|o| o.guid().is_none())
        );
        assert_eq!(
            session.guid_manager().borrow_mut().allocate(),
            Guid(GUID_BASE)
        );
    }

    #[test]
    fn guid_payload_leads_the_container() {
        let tmp = tempfile::tempdir().unwrap();
        let scene = scene_of(&["a"]);
        let mut session = SaveSession::new(tmp.path(), 1, scene);
        session
            .registry_mut()
            .register_fns("notes", || Ok(String::new()), |_| Ok(()));

        session.save_all().unwrap();
        let container = SlotStore::new(tmp.path()).read(1).unwrap().unwrap();
        assert_eq!(container[0].tenant_key, GUID_TENANT_KEY);
    }
}
