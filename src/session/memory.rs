//! In-memory session runtime.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::{debug, trace, warn};

use super::id::{DEFAULT_SID_BITS, DEFAULT_SID_LENGTH, SID_BITS_RANGE, SID_LENGTH_RANGE};
use super::option::parse_flag;
use super::{RuntimeError, RuntimeResult, SessionId, SessionOption, SessionRuntime, SessionStatus};

/// Session name used until one is configured.
pub const DEFAULT_SESSION_NAME: &str = "SESSID";

type SessionData = HashMap<String, Value>;

#[derive(Debug)]
struct Inner {
    enabled: bool,
    active: bool,
    id: Option<SessionId>,
    name: String,
    save_path: Option<PathBuf>,
    options: BTreeMap<SessionOption, String>,
    strict_mode: bool,
    sid_length: usize,
    sid_bits: u8,
    /// Data of the open session.
    data: SessionData,
    /// Data of closed sessions, by ID.
    records: HashMap<SessionId, SessionData>,
}

impl Inner {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            active: false,
            id: None,
            name: DEFAULT_SESSION_NAME.to_string(),
            save_path: None,
            options: BTreeMap::new(),
            strict_mode: false,
            sid_length: DEFAULT_SID_LENGTH,
            sid_bits: DEFAULT_SID_BITS,
            data: HashMap::new(),
            records: HashMap::new(),
        }
    }

    fn fresh_id(&self) -> SessionId {
        loop {
            let id = SessionId::generate_with(self.sid_length, self.sid_bits);
            if !self.records.contains_key(&id) {
                return id;
            }
        }
    }

    fn require_active(&self) -> RuntimeResult<()> {
        if self.active {
            Ok(())
        } else {
            Err(RuntimeError::SessionInactive)
        }
    }

    fn current_id(&self) -> RuntimeResult<SessionId> {
        self.id.clone().ok_or(RuntimeError::SessionInactive)
    }
}

/// Session runtime keeping every session in process memory.
///
/// Clones share state, so a clone handed to a second handler sees the same
/// open session. [`MemoryRuntime::global`] returns the process-wide instance.
#[derive(Debug, Clone)]
pub struct MemoryRuntime {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryRuntime {
    /// Create a new runtime with no sessions.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::new(true))),
        }
    }

    /// Create a runtime whose sessions are disabled.
    pub fn disabled() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::new(false))),
        }
    }

    /// The process-wide runtime.
    pub fn global() -> Self {
        static GLOBAL: OnceLock<MemoryRuntime> = OnceLock::new();
        GLOBAL.get_or_init(MemoryRuntime::new).clone()
    }

    /// Configured save path, if any.
    pub fn save_path(&self) -> Option<PathBuf> {
        self.read_inner().ok().and_then(|i| i.save_path.clone())
    }

    /// Check if a closed session is stored under `id`.
    pub fn has_record(&self, id: &SessionId) -> bool {
        self.read_inner()
            .map(|i| i.records.contains_key(id))
            .unwrap_or(false)
    }

    /// Number of closed sessions held.
    pub fn record_count(&self) -> usize {
        self.read_inner().map(|i| i.records.len()).unwrap_or(0)
    }

    /// All directives applied so far.
    pub fn options(&self) -> BTreeMap<SessionOption, String> {
        self.read_inner()
            .map(|i| i.options.clone())
            .unwrap_or_default()
    }

    fn read_inner(&self) -> RuntimeResult<RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| RuntimeError::LockPoisoned)
    }

    fn write_inner(&self) -> RuntimeResult<RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| RuntimeError::LockPoisoned)
    }
}

impl Default for MemoryRuntime {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_name(name: &str) -> RuntimeResult<()> {
    let valid = !name.is_empty()
        && name.bytes().all(|b| b.is_ascii_alphanumeric())
        && !name.bytes().all(|b| b.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(RuntimeError::InvalidName(name.into()))
    }
}

fn invalid_value(option: SessionOption, value: &str) -> RuntimeError {
    RuntimeError::InvalidOptionValue {
        option,
        value: value.into(),
    }
}

impl SessionRuntime for MemoryRuntime {
    fn status(&self) -> SessionStatus {
        match self.read_inner() {
            Ok(inner) if !inner.enabled => SessionStatus::Disabled,
            Ok(inner) if inner.active => SessionStatus::Active,
            Ok(_) => SessionStatus::None,
            Err(e) => {
                warn!(error = %e, "Session state unreadable, reporting sessions as disabled");
                SessionStatus::Disabled
            }
        }
    }

    fn set_option(&self, option: SessionOption, value: &str) -> RuntimeResult<()> {
        let mut inner = self.write_inner()?;
        if inner.active {
            return Err(RuntimeError::SessionActive("change directives"));
        }

        match option {
            SessionOption::Name => {
                validate_name(value)?;
                inner.name = value.to_string();
            }
            SessionOption::SavePath => {
                inner.save_path = Some(PathBuf::from(value));
            }
            SessionOption::UseStrictMode => {
                inner.strict_mode = parse_flag(value).ok_or_else(|| invalid_value(option, value))?;
            }
            SessionOption::SidLength => {
                inner.sid_length = value
                    .trim()
                    .parse()
                    .ok()
                    .filter(|len| SID_LENGTH_RANGE.contains(len))
                    .ok_or_else(|| invalid_value(option, value))?;
            }
            SessionOption::SidBitsPerCharacter => {
                inner.sid_bits = value
                    .trim()
                    .parse()
                    .ok()
                    .filter(|bits| SID_BITS_RANGE.contains(bits))
                    .ok_or_else(|| invalid_value(option, value))?;
            }
            _ => {}
        }

        inner.options.insert(option, value.to_string());
        trace!(option = %option, value = %value, "Directive applied");
        Ok(())
    }

    fn option(&self, option: SessionOption) -> Option<String> {
        self.read_inner()
            .ok()
            .and_then(|i| i.options.get(&option).cloned())
    }

    fn set_save_path(&self, path: &Path) -> RuntimeResult<()> {
        let mut inner = self.write_inner()?;
        if inner.active {
            return Err(RuntimeError::SessionActive("change the save path"));
        }
        inner.save_path = Some(path.to_path_buf());
        inner
            .options
            .insert(SessionOption::SavePath, path.display().to_string());
        Ok(())
    }

    fn start(&self) -> RuntimeResult<()> {
        let mut inner = self.write_inner()?;
        if !inner.enabled {
            return Err(RuntimeError::Disabled);
        }
        if inner.active {
            return Err(RuntimeError::SessionActive("start"));
        }

        let (id, data) = match inner.id.clone() {
            Some(id) => match inner.records.get(&id) {
                Some(data) => (id, data.clone()),
                None if inner.strict_mode => {
                    debug!(session_id = %id, "Rejecting uninitialized ID in strict mode");
                    (inner.fresh_id(), SessionData::new())
                }
                None => (id, SessionData::new()),
            },
            None => (inner.fresh_id(), SessionData::new()),
        };

        trace!(session_id = %id, keys = data.len(), "Session opened");
        inner.id = Some(id);
        inner.data = data;
        inner.active = true;
        Ok(())
    }

    fn unset_all(&self) -> RuntimeResult<()> {
        let mut inner = self.write_inner()?;
        inner.require_active()?;
        inner.data.clear();
        Ok(())
    }

    fn destroy(&self) -> RuntimeResult<()> {
        let mut inner = self.write_inner()?;
        inner.require_active()?;
        let id = inner.current_id()?;
        inner.records.remove(&id);
        inner.data.clear();
        inner.id = None;
        inner.active = false;
        Ok(())
    }

    fn write_close(&self) -> RuntimeResult<()> {
        let mut inner = self.write_inner()?;
        inner.require_active()?;
        let id = inner.current_id()?;
        let data = std::mem::take(&mut inner.data);
        inner.records.insert(id, data);
        inner.active = false;
        Ok(())
    }

    fn regenerate_id(&self, delete_old: bool) -> RuntimeResult<()> {
        let mut inner = self.write_inner()?;
        inner.require_active()?;
        let old = inner.current_id()?;
        let new = inner.fresh_id();
        if delete_old {
            inner.records.remove(&old);
        } else {
            let data = inner.data.clone();
            inner.records.insert(old.clone(), data);
        }
        trace!(old = %old, new = %new, delete_old, "Session ID replaced");
        inner.id = Some(new);
        Ok(())
    }

    fn id(&self) -> Option<SessionId> {
        self.read_inner().ok().and_then(|i| i.id.clone())
    }

    fn set_id(&self, id: &str) -> RuntimeResult<()> {
        let id: SessionId = id.parse()?;
        let mut inner = self.write_inner()?;
        if inner.active {
            return Err(RuntimeError::SessionActive("change the ID"));
        }
        inner.id = Some(id);
        Ok(())
    }

    fn name(&self) -> String {
        self.read_inner()
            .map(|i| i.name.clone())
            .unwrap_or_else(|_| DEFAULT_SESSION_NAME.to_string())
    }

    fn set_name(&self, name: &str) -> RuntimeResult<()> {
        let mut inner = self.write_inner()?;
        if inner.active {
            return Err(RuntimeError::SessionActive("change the name"));
        }
        validate_name(name)?;
        inner.name = name.to_string();
        inner
            .options
            .insert(SessionOption::Name, name.to_string());
        Ok(())
    }

    fn contains(&self, key: &str) -> RuntimeResult<bool> {
        let inner = self.read_inner()?;
        inner.require_active()?;
        Ok(inner.data.contains_key(key))
    }

    fn read(&self, key: &str) -> RuntimeResult<Option<Value>> {
        let inner = self.read_inner()?;
        inner.require_active()?;
        Ok(inner.data.get(key).cloned())
    }

    fn write(&self, key: &str, value: Value) -> RuntimeResult<()> {
        let mut inner = self.write_inner()?;
        inner.require_active()?;
        inner.data.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> RuntimeResult<Option<Value>> {
        let mut inner = self.write_inner()?;
        inner.require_active()?;
        Ok(inner.data.remove(key))
    }

    fn keys(&self) -> RuntimeResult<Vec<String>> {
        let inner = self.read_inner()?;
        inner.require_active()?;
        let mut keys: Vec<String> = inner.data.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_runtime() {
        let rt = MemoryRuntime::new();
        assert_eq!(rt.status(), SessionStatus::None);
        assert_eq!(rt.name(), DEFAULT_SESSION_NAME);
        assert!(rt.id().is_none());
        assert_eq!(rt.record_count(), 0);
    }

    #[test]
    fn test_disabled_runtime() {
        let rt = MemoryRuntime::disabled();
        assert_eq!(rt.status(), SessionStatus::Disabled);
        assert_eq!(rt.start(), Err(RuntimeError::Disabled));
    }

    #[test]
    fn test_start_assigns_id() {
        let rt = MemoryRuntime::new();
        rt.start().unwrap();
        assert_eq!(rt.status(), SessionStatus::Active);
        let id = rt.id().unwrap();
        assert_eq!(id.as_str().len(), DEFAULT_SID_LENGTH);
    }

    #[test]
    fn test_start_twice() {
        let rt = MemoryRuntime::new();
        rt.start().unwrap();
        assert!(matches!(rt.start(), Err(RuntimeError::SessionActive(_))));
    }

    #[test]
    fn test_write_close_and_resume() {
        let rt = MemoryRuntime::new();
        rt.start().unwrap();
        rt.write("cart", json!([1, 2, 3])).unwrap();
        let id = rt.id().unwrap();
        rt.write_close().unwrap();

        assert_eq!(rt.status(), SessionStatus::None);
        assert!(rt.has_record(&id));

        rt.start().unwrap();
        assert_eq!(rt.id(), Some(id));
        assert_eq!(rt.read("cart").unwrap(), Some(json!([1, 2, 3])));
    }

    #[test]
    fn test_destroy_drops_record() {
        let rt = MemoryRuntime::new();
        rt.start().unwrap();
        rt.write("k", json!(1)).unwrap();
        rt.write_close().unwrap();
        let id = rt.id().unwrap();

        rt.start().unwrap();
        rt.destroy().unwrap();
        assert_eq!(rt.status(), SessionStatus::None);
        assert!(rt.id().is_none());
        assert!(!rt.has_record(&id));
    }

    #[test]
    fn test_regenerate_keeps_data() {
        let rt = MemoryRuntime::new();
        rt.start().unwrap();
        rt.write("user", json!("ada")).unwrap();
        let old = rt.id().unwrap();

        rt.regenerate_id(false).unwrap();
        let new = rt.id().unwrap();
        assert_ne!(old, new);
        assert_eq!(rt.read("user").unwrap(), Some(json!("ada")));
    }

    #[test]
    fn test_regenerate_delete_old() {
        let rt = MemoryRuntime::new();
        rt.start().unwrap();
        rt.write_close().unwrap();
        let old = rt.id().unwrap();
        assert!(rt.has_record(&old));

        rt.start().unwrap();
        rt.regenerate_id(true).unwrap();
        assert!(!rt.has_record(&old));

        rt.write_close().unwrap();
        assert!(rt.has_record(&rt.id().unwrap()));
    }

    #[test]
    fn test_regenerate_without_delete_keeps_old_record() {
        let rt = MemoryRuntime::new();
        rt.start().unwrap();
        rt.write_close().unwrap();
        let old = rt.id().unwrap();

        rt.start().unwrap();
        rt.regenerate_id(false).unwrap();
        assert!(rt.has_record(&old));
    }

    #[test]
    fn test_regenerate_without_delete_saves_unwritten_data() {
        let rt = MemoryRuntime::new();
        rt.start().unwrap();
        rt.write("user", json!("ada")).unwrap();
        let old = rt.id().unwrap();

        // Never write-closed under the old ID
        rt.regenerate_id(false).unwrap();
        assert!(rt.has_record(&old));
        rt.write("user", json!("grace")).unwrap();
        rt.write_close().unwrap();

        rt.set_id(old.as_str()).unwrap();
        rt.start().unwrap();
        assert_eq!(rt.read("user").unwrap(), Some(json!("ada")));
    }

    #[test]
    fn test_poisoned_lock_reports_disabled() {
        let rt = MemoryRuntime::new();
        let shared = rt.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.inner.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert_eq!(rt.status(), SessionStatus::Disabled);
        assert_eq!(rt.start(), Err(RuntimeError::LockPoisoned));
    }

    #[test]
    fn test_set_id_resumes_or_adopts() {
        let rt = MemoryRuntime::new();
        rt.set_id("clientsuppliedid0123456789").unwrap();
        rt.start().unwrap();
        assert_eq!(rt.id().unwrap().as_str(), "clientsuppliedid0123456789");
    }

    #[test]
    fn test_strict_mode_rejects_unknown_id() {
        let rt = MemoryRuntime::new();
        rt.set_option(SessionOption::UseStrictMode, "1").unwrap();
        rt.set_id("attackerchosenid0123456789").unwrap();
        rt.start().unwrap();
        assert_ne!(rt.id().unwrap().as_str(), "attackerchosenid0123456789");
    }

    #[test]
    fn test_set_id_while_active() {
        let rt = MemoryRuntime::new();
        rt.start().unwrap();
        assert!(matches!(
            rt.set_id("abcdef"),
            Err(RuntimeError::SessionActive(_))
        ));
    }

    #[test]
    fn test_set_id_invalid() {
        let rt = MemoryRuntime::new();
        assert!(matches!(rt.set_id("a b"), Err(RuntimeError::InvalidId(_))));
    }

    #[test]
    fn test_set_name() {
        let rt = MemoryRuntime::new();
        rt.set_name("APPSESSID").unwrap();
        assert_eq!(rt.name(), "APPSESSID");

        assert!(matches!(rt.set_name(""), Err(RuntimeError::InvalidName(_))));
        assert!(matches!(rt.set_name("1234"), Err(RuntimeError::InvalidName(_))));
        assert!(matches!(
            rt.set_name("app.sess"),
            Err(RuntimeError::InvalidName(_))
        ));
        assert_eq!(rt.name(), "APPSESSID");
    }

    #[test]
    fn test_set_name_while_active() {
        let rt = MemoryRuntime::new();
        rt.start().unwrap();
        assert!(matches!(
            rt.set_name("OTHER"),
            Err(RuntimeError::SessionActive(_))
        ));
    }

    #[test]
    fn test_sid_options() {
        let rt = MemoryRuntime::new();
        rt.set_option(SessionOption::SidLength, "48").unwrap();
        rt.set_option(SessionOption::SidBitsPerCharacter, "6").unwrap();
        rt.start().unwrap();
        assert_eq!(rt.id().unwrap().as_str().len(), 48);
    }

    #[test]
    fn test_invalid_sid_options() {
        let rt = MemoryRuntime::new();
        assert!(rt.set_option(SessionOption::SidLength, "8").is_err());
        assert!(rt.set_option(SessionOption::SidLength, "lots").is_err());
        assert!(rt.set_option(SessionOption::SidBitsPerCharacter, "7").is_err());
        assert!(rt.set_option(SessionOption::UseStrictMode, "perhaps").is_err());
        assert!(rt.options().is_empty());
    }

    #[test]
    fn test_opaque_options_recorded() {
        let rt = MemoryRuntime::new();
        rt.set_option(SessionOption::CookieSamesite, "Strict").unwrap();
        assert_eq!(
            rt.option(SessionOption::CookieSamesite),
            Some("Strict".to_string())
        );
        assert_eq!(rt.option(SessionOption::CookiePath), None);
    }

    #[test]
    fn test_options_refused_while_active() {
        let rt = MemoryRuntime::new();
        rt.start().unwrap();
        assert!(rt
            .set_option(SessionOption::CookieSecure, "1")
            .is_err());
        assert!(rt.set_save_path(Path::new("/tmp")).is_err());
    }

    #[test]
    fn test_data_requires_active() {
        let rt = MemoryRuntime::new();
        assert_eq!(rt.contains("k"), Err(RuntimeError::SessionInactive));
        assert_eq!(rt.write("k", json!(1)), Err(RuntimeError::SessionInactive));
        assert_eq!(rt.keys(), Err(RuntimeError::SessionInactive));
    }

    #[test]
    fn test_keys_sorted() {
        let rt = MemoryRuntime::new();
        rt.start().unwrap();
        rt.write("b", json!(2)).unwrap();
        rt.write("a", json!(1)).unwrap();
        assert_eq!(rt.keys().unwrap(), vec!["a", "b"]);
        assert_eq!(rt.remove("a").unwrap(), Some(json!(1)));
        assert_eq!(rt.remove("a").unwrap(), None);
    }

    #[test]
    fn test_clones_share_state() {
        let rt = MemoryRuntime::new();
        let other = rt.clone();
        rt.start().unwrap();
        rt.write("shared", json!(true)).unwrap();

        assert_eq!(other.status(), SessionStatus::Active);
        assert_eq!(other.read("shared").unwrap(), Some(json!(true)));
    }

    #[test]
    fn test_global_is_shared() {
        let a = MemoryRuntime::global();
        let b = MemoryRuntime::global();
        assert!(Arc::ptr_eq(&a.inner, &b.inner));
    }
}
